//! Email send-intent queue (spec §3 `EmailOutbox`). Same claim/backoff/DLQ
//! shape as [`crate::events::OutboxStore`] — kept as a separate tree/type
//! since mail rows carry recipient/body rather than a domain-event payload.

use money_core::constants::OUTBOX_MAX_ATTEMPTS;
use money_core::ids::EmailOutboxId;
use money_core::outbox::{backoff_delay_secs, EmailOutbox, SendStatus};
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

use crate::suppression::SuppressionList;

pub struct EmailOutboxStore {
    rows: sled::Tree,
    by_idempotency_key: sled::Tree,
}

impl EmailOutboxStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "email_outbox")?,
            by_idempotency_key: money_store::db::open_tree(db, "email_outbox_by_idempotency_key")?,
        })
    }

    pub fn enqueue(
        &self,
        to_address: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        idempotency_key: impl Into<String>,
        now: i64,
    ) -> Result<EmailOutbox, MoneyError> {
        let idempotency_key = idempotency_key.into();
        if let Some(existing_id) =
            get_typed::<EmailOutboxId>(&self.by_idempotency_key, idempotency_key.as_bytes())?
        {
            if let Some(existing) = self.get(existing_id)? {
                return Ok(existing);
            }
        }
        let row = EmailOutbox {
            id: EmailOutboxId::new(),
            to_address: to_address.into(),
            subject: subject.into(),
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

    pub fn get(&self, id: EmailOutboxId) -> Result<Option<EmailOutbox>, MoneyError> {
        get_typed(&self.rows, id.as_uuid().as_bytes())
    }

    pub fn claim_batch(
        &self,
        suppression: &SuppressionList,
        batch_size: usize,
        now: i64,
    ) -> Result<Vec<EmailOutbox>, MoneyError> {
        let mut claimed = Vec::new();
        for item in self.rows.iter() {
            if claimed.len() >= batch_size {
                break;
            }
            let (_, bytes) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
            let mut row: EmailOutbox = money_store::codec::decode(&bytes)?;
            if row.status != SendStatus::Pending {
                continue;
            }
            if row.next_attempt_at.is_some_and(|t| now < t) {
                continue;
            }
            if suppression.is_email_suppressed(&row.to_address)? {
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

    pub fn complete(&self, id: EmailOutboxId, provider_msg_id: impl Into<String>) -> Result<(), MoneyError> {
        let mut row = self
            .get(id)?
            .ok_or_else(|| MoneyError::Other(format!("email outbox row {id} not found")))?;
        row.status = SendStatus::Sent;
        row.provider_msg_id = Some(provider_msg_id.into());
        put_typed(&self.rows, row.id.as_uuid().as_bytes(), &row)?;
        Ok(())
    }

    pub fn fail(&self, id: EmailOutboxId, base_backoff_secs: u64, max_backoff_secs: u64, now: i64) -> Result<(), MoneyError> {
        let mut row = self
            .get(id)?
            .ok_or_else(|| MoneyError::Other(format!("email outbox row {id} not found")))?;
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
