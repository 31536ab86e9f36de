//! Transactional domain-event outbox (spec §4.8): events are written in the
//! same logical transaction as the state change that produced them (the
//! caller, `money-engine`, opens this store against the same `sled::Db` it
//! commits the ledger/lock trees on) and drained by the Worker Framework.

use money_core::constants::OUTBOX_MAX_ATTEMPTS;
use money_core::ids::OutboxEventId;
use money_core::outbox::{backoff_delay_secs, DomainEventType, OutboxEvent, OutboxStatus};
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

pub struct OutboxStore {
    events: sled::Tree,
    by_idempotency_key: sled::Tree,
}

impl OutboxStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            events: money_store::db::open_tree(db, "outbox_events")?,
            by_idempotency_key: money_store::db::open_tree(db, "outbox_events_by_idempotency_key")?,
        })
    }

    /// Insert-or-ignore on `idempotency_key`: a retried producer gets back
    /// the already-enqueued row rather than a duplicate.
    pub fn enqueue(
        &self,
        event_type: DomainEventType,
        aggregate_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        event_version: u32,
        idempotency_key: impl Into<String>,
        payload: serde_json::Value,
        queue_name: impl Into<String>,
        now: i64,
    ) -> Result<OutboxEvent, MoneyError> {
        let idempotency_key = idempotency_key.into();
        if let Some(existing_id) =
            get_typed::<OutboxEventId>(&self.by_idempotency_key, idempotency_key.as_bytes())?
        {
            if let Some(existing) = self.get(existing_id)? {
                return Ok(existing);
            }
        }

        let event = OutboxEvent {
            id: OutboxEventId::new(),
            event_type,
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
            event_version,
            idempotency_key: idempotency_key.clone(),
            payload,
            queue_name: queue_name.into(),
            status: OutboxStatus::Pending,
            attempts: 0,
            claimed_at: None,
            processed_at: None,
            created_at: now,
            next_attempt_at: None,
        };
        put_typed(&self.events, event.id.as_uuid().as_bytes(), &event)?;
        put_typed(&self.by_idempotency_key, idempotency_key.as_bytes(), &event.id)?;
        metrics::counter!("money_outbox_enqueued_total").increment(1);
        Ok(event)
    }

    pub fn get(&self, id: OutboxEventId) -> Result<Option<OutboxEvent>, MoneyError> {
        get_typed(&self.events, id.as_uuid().as_bytes())
    }

    /// Claim up to `batch_size` pending rows whose backoff window has
    /// elapsed, marking them `Claimed` with `attempts += 1`.
    pub fn claim_batch(&self, batch_size: usize, now: i64) -> Result<Vec<OutboxEvent>, MoneyError> {
        let mut claimed = Vec::new();
        for item in self.events.iter() {
            if claimed.len() >= batch_size {
                break;
            }
            let (_, bytes) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
            let mut event: OutboxEvent = money_store::codec::decode(&bytes)?;
            if event.status != OutboxStatus::Pending {
                continue;
            }
            if event.next_attempt_at.is_some_and(|t| now < t) {
                continue;
            }
            event.status = OutboxStatus::Claimed;
            event.attempts += 1;
            event.claimed_at = Some(now);
            put_typed(&self.events, event.id.as_uuid().as_bytes(), &event)?;
            claimed.push(event);
        }
        metrics::gauge!("money_outbox_claimed_batch_size").set(claimed.len() as f64);
        Ok(claimed)
    }

    pub fn complete(&self, id: OutboxEventId, now: i64) -> Result<(), MoneyError> {
        let mut event = self
            .get(id)?
            .ok_or_else(|| MoneyError::Other(format!("outbox event {id} not found")))?;
        event.status = OutboxStatus::Done;
        event.processed_at = Some(now);
        put_typed(&self.events, event.id.as_uuid().as_bytes(), &event)?;
        metrics::counter!("money_outbox_completed_total").increment(1);
        Ok(())
    }

    /// On failure, retries with exponential backoff until
    /// `OUTBOX_MAX_ATTEMPTS`, then routes to the DLQ (`status = Failed`,
    /// terminal — a human or a reconciliation job must act on it).
    pub fn fail(&self, id: OutboxEventId, base_backoff_secs: u64, max_backoff_secs: u64, now: i64) -> Result<(), MoneyError> {
        let mut event = self
            .get(id)?
            .ok_or_else(|| MoneyError::Other(format!("outbox event {id} not found")))?;
        if event.attempts >= OUTBOX_MAX_ATTEMPTS {
            event.status = OutboxStatus::Failed;
            metrics::counter!("money_outbox_dlq_total").increment(1);
            tracing::error!(event_id = %id, "outbox event exhausted retries, routed to DLQ");
        } else {
            event.status = OutboxStatus::Pending;
            event.next_attempt_at = Some(
                now + backoff_delay_secs(event.attempts, base_backoff_secs, max_backoff_secs) as i64,
            );
        }
        put_typed(&self.events, event.id.as_uuid().as_bytes(), &event)?;
        Ok(())
    }

    pub fn dlq_depth(&self) -> Result<u64, MoneyError> {
        let mut count = 0u64;
        for item in self.events.iter() {
            let (_, bytes) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
            let event: OutboxEvent = money_store::codec::decode(&bytes)?;
            if event.status == OutboxStatus::Failed {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    #[test]
    fn enqueue_is_idempotent_on_key() {
        let store = OutboxStore::open(&db()).unwrap();
        let a = store
            .enqueue(
                DomainEventType::EscrowFunded,
                "task",
                "t1",
                1,
                "escrow.funded:t1:1",
                serde_json::json!({}),
                "mail",
                1000,
            )
            .unwrap();
        let b = store
            .enqueue(
                DomainEventType::EscrowFunded,
                "task",
                "t1",
                1,
                "escrow.funded:t1:1",
                serde_json::json!({}),
                "mail",
                1000,
            )
            .unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn claim_then_complete_marks_done() {
        let store = OutboxStore::open(&db()).unwrap();
        let event = store
            .enqueue(
                DomainEventType::EscrowReleased,
                "task",
                "t2",
                1,
                "escrow.released:t2:1",
                serde_json::json!({}),
                "mail",
                1000,
            )
            .unwrap();
        let claimed = store.claim_batch(10, 1001).unwrap();
        assert_eq!(claimed.len(), 1);
        store.complete(event.id, 1002).unwrap();
        assert_eq!(store.get(event.id).unwrap().unwrap().status, OutboxStatus::Done);
    }

    #[test]
    fn failure_retries_then_routes_to_dlq() {
        let store = OutboxStore::open(&db()).unwrap();
        let event = store
            .enqueue(
                DomainEventType::DisputeOpened,
                "task",
                "t3",
                1,
                "dispute.opened:t3:1",
                serde_json::json!({}),
                "mail",
                1000,
            )
            .unwrap();
        let mut now = 1000;
        for _ in 0..OUTBOX_MAX_ATTEMPTS {
            let claimed = store.claim_batch(10, now).unwrap();
            assert_eq!(claimed.len(), 1);
            store.fail(event.id, 1, 60, now).unwrap();
            now += 100;
        }
        assert_eq!(store.get(event.id).unwrap().unwrap().status, OutboxStatus::Failed);
        assert_eq!(store.dlq_depth().unwrap(), 1);
    }
}
