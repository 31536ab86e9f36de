//! SMS send-intent queue (spec §3 `SmsOutbox`). Mirrors
//! [`crate::mail::EmailOutboxStore`] exactly; kept as a distinct type since
//! the two channels have independent suppression lists and providers.

use money_core::constants::OUTBOX_MAX_ATTEMPTS;
use money_core::ids::SmsOutboxId;
use money_core::outbox::{backoff_delay_secs, SendStatus, SmsOutbox};
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

use crate::suppression::SuppressionList;

pub struct SmsOutboxStore {
    rows: sled::Tree,
    by_idempotency_key: sled::Tree,
}

impl SmsOutboxStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "sms_outbox")?,
            by_idempotency_key: money_store::db::open_tree(db, "sms_outbox_by_idempotency_key")?,
        })
    }

    pub fn enqueue(
        &self,
        to_number: impl Into<String>,
        body: impl Into<String>,
        idempotency_key: impl Into<String>,
        now: i64,
    ) -> Result<SmsOutbox, MoneyError> {
        let idempotency_key = idempotency_key.into();
        if let Some(existing_id) =
            get_typed::<SmsOutboxId>(&self.by_idempotency_key, idempotency_key.as_bytes())?
        {
            if let Some(existing) = self.get(existing_id)? {
                return Ok(existing);
            }
        }
        let row = SmsOutbox {
            id: SmsOutboxId::new(),
            to_number: to_number.into(),
            body: body.into(),
            status: SendStatus::Pending,
            provider_msg_id: None,
            attempts: 0,
            idempotency_key: idempotency_key.clone(),
            created_at: now,
            next_attempt_at: None,
        };
        put_typed(&self.rows, row.id.as_uuid().as_bytes(), &row)?;
        put_typed(&self.by_idempotency_key, idempotency_key.as_bytes(), &row.id)?;
        Ok(row)
    }

    pub fn get(&self, id: SmsOutboxId) -> Result<Option<SmsOutbox>, MoneyError> {
        get_typed(&self.rows, id.as_uuid().as_bytes())
    }

    pub fn claim_batch(
        &self,
        suppression: &SuppressionList,
        batch_size: usize,
        now: i64,
    ) -> Result<Vec<SmsOutbox>, MoneyError> {
        let mut claimed = Vec::new();
        for item in self.rows.iter() {
            if claimed.len() >= batch_size {
                break;
            }
            let (_, bytes) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
            let mut row: SmsOutbox = money_store::codec::decode(&bytes)?;
            if row.status != SendStatus::Pending {
                continue;
            }
            if row.next_attempt_at.is_some_and(|t| now < t) {
                continue;
            }
            if suppression.is_sms_suppressed(&row.to_number)? {
                row.status = SendStatus::Suppressed;
                put_typed(&self.rows, row.id.as_uuid().as_bytes(), &row)?;
                continue;
            }
            row.status = SendStatus::Sending;
            row.attempts += 1;
            put_typed(&self.rows, row.id.as_uuid().as_bytes(), &row)?;
            claimed.push(row);
        }
        Ok(claimed)
    }

    pub fn complete(&self, id: SmsOutboxId, provider_msg_id: impl Into<String>) -> Result<(), MoneyError> {
        let mut row = self
            .get(id)?
            .ok_or_else(|| MoneyError::Other(format!("sms outbox row {id} not found")))?;
        row.status = SendStatus::Sent;
        row.provider_msg_id = Some(provider_msg_id.into());
        put_typed(&self.rows, row.id.as_uuid().as_bytes(), &row)?;
        Ok(())
    }

    pub fn fail(&self, id: SmsOutboxId, base_backoff_secs: u64, max_backoff_secs: u64, now: i64) -> Result<(), MoneyError> {
        let mut row = self
            .get(id)?
            .ok_or_else(|| MoneyError::Other(format!("sms outbox row {id} not found")))?;
        if row.attempts >= OUTBOX_MAX_ATTEMPTS {
            row.status = SendStatus::Failed;
        } else {
            row.status = SendStatus::Pending;
            row.next_attempt_at =
                Some(now + backoff_delay_secs(row.attempts, base_backoff_secs, max_backoff_secs) as i64);
        }
        put_typed(&self.rows, row.id.as_uuid().as_bytes(), &row)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_send_completes() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = SmsOutboxStore::open(&db).unwrap();
        let suppression = SuppressionList::open(&db).unwrap();
        let row = store.enqueue("+15555550100", "code: 123456", "key1", 1000).unwrap();
        let claimed = store.claim_batch(&suppression, 10, 1001).unwrap();
        assert_eq!(claimed.len(), 1);
        store.complete(row.id, "provider-msg-1").unwrap();
        assert_eq!(store.get(row.id).unwrap().unwrap().status, SendStatus::Sent);
    }
}
