//! `VerificationAttempt` storage (spec §4.10). One row per code sent, plus
//! a by-(user, channel) pointer to the most recent attempt — the same
//! "full history tree + secondary pointer" shape as
//! `money-proof::store::SubmissionStore`'s `by_task` index.

use serde::{Deserialize, Serialize};

use money_core::identity::{VerificationAttempt, VerificationChannel};
use money_core::ids::{UserId, VerificationId};
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

fn latest_key(user_id: UserId, channel: VerificationChannel) -> Vec<u8> {
    let mut key = user_id.as_uuid().as_bytes().to_vec();
    key.push(match channel {
        VerificationChannel::Email => 0,
        VerificationChannel::Sms => 1,
    });
    key
}

pub struct VerificationStore {
    rows: sled::Tree,
    latest: sled::Tree,
}

impl VerificationStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "verification_attempts")?,
            latest: money_store::db::open_tree(db, "verification_attempts_latest")?,
        })
    }

    pub fn get(&self, id: VerificationId) -> Result<Option<VerificationAttempt>, MoneyError> {
        get_typed(&self.rows, id.as_uuid().as_bytes())
    }

    pub fn latest_for(
        &self,
        user_id: UserId,
        channel: VerificationChannel,
    ) -> Result<Option<VerificationAttempt>, MoneyError> {
        let Some(id) = get_typed::<VerificationId>(&self.latest, latest_key(user_id, channel))?
        else {
            return Ok(None);
        };
        self.get(id)
    }

    pub fn put(&self, attempt: &VerificationAttempt) -> Result<(), MoneyError> {
        put_typed(&self.rows, attempt.id.as_uuid().as_bytes(), attempt)?;
        put_typed(
            &self.latest,
            latest_key(attempt.user_id, attempt.channel),
            &attempt.id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(user_id: UserId, channel: VerificationChannel) -> VerificationAttempt {
        VerificationAttempt {
            id: VerificationId::new(),
            user_id,
            channel,
            target: "a@b.com".into(),
            code_hash: "hash".into(),
            expires_at: 1600,
            attempt_count: 0,
            success: false,
            created_at: 1000,
        }
    }

    #[test]
    fn latest_for_tracks_the_most_recently_put_attempt() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = VerificationStore::open(&db).unwrap();
        let user = UserId::new();

        let first = attempt(user, VerificationChannel::Email);
        store.put(&first).unwrap();
        let second = attempt(user, VerificationChannel::Email);
        store.put(&second).unwrap();

        let latest = store.latest_for(user, VerificationChannel::Email).unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }

    #[test]
    fn channels_are_tracked_independently() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = VerificationStore::open(&db).unwrap();
        let user = UserId::new();

        store.put(&attempt(user, VerificationChannel::Email)).unwrap();
        assert!(store.latest_for(user, VerificationChannel::Sms).unwrap().is_none());
    }
}
