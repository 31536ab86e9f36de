//! The identity record itself (spec §4.10): tracks which channel has been
//! verified and exposes the fully-verified transition the service checks
//! after each successful `verify_code` call.

use serde::{Deserialize, Serialize};

use money_core::identity::VerificationChannel;
use money_core::ids::UserId;
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub user_id: UserId,
    pub email_verified_at: Option<i64>,
    pub sms_verified_at: Option<i64>,
}

impl IdentityRecord {
    pub fn is_fully_verified(&self) -> bool {
        self.email_verified_at.is_some() && self.sms_verified_at.is_some()
    }
}

pub struct IdentityStore {
    rows: sled::Tree,
}

impl IdentityStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "identity_records")?,
        })
    }

    pub fn get(&self, user_id: UserId) -> Result<Option<IdentityRecord>, MoneyError> {
        get_typed(&self.rows, user_id.as_uuid().as_bytes())
    }

    fn get_or_default(&self, user_id: UserId) -> Result<IdentityRecord, MoneyError> {
        Ok(self.get(user_id)?.unwrap_or(IdentityRecord {
            user_id,
            email_verified_at: None,
            sms_verified_at: None,
        }))
    }

    /// Stamps `channel` verified at `now`. Idempotent: re-verifying an
    /// already-verified channel just overwrites the timestamp.
    pub fn mark_channel_verified(
        &self,
        user_id: UserId,
        channel: VerificationChannel,
        now: i64,
    ) -> Result<IdentityRecord, MoneyError> {
        let mut record = self.get_or_default(user_id)?;
        match channel {
            VerificationChannel::Email => record.email_verified_at = Some(now),
            VerificationChannel::Sms => record.sms_verified_at = Some(now),
        }
        put_typed(&self.rows, user_id.as_uuid().as_bytes(), &record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_fully_verified_only_once_both_channels_are() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = IdentityStore::open(&db).unwrap();
        let user = UserId::new();

        let after_email = store
            .mark_channel_verified(user, VerificationChannel::Email, 1000)
            .unwrap();
        assert!(!after_email.is_fully_verified());

        let after_sms = store
            .mark_channel_verified(user, VerificationChannel::Sms, 2000)
            .unwrap();
        assert!(after_sms.is_fully_verified());
    }
}
