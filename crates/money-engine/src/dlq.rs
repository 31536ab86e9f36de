//! Saga compensation DLQ (spec §4.1 "Compensation"): when Prepare succeeds
//! but Execute or Commit fails, the ledger transaction is marked `failed`
//! and parked here with full context for reconciliation or manual review.
//! Distinct from `money_outbox::OutboxStore`, which carries domain events
//! for downstream consumers, not saga-internal failure context.

use serde::{Deserialize, Serialize};

use money_core::escrow::MoneyEventType;
use money_core::ids::{ExternalEventId, LedgerTransactionId, TaskId};
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DlqEntry {
    pub ledger_transaction_id: LedgerTransactionId,
    pub task_id: TaskId,
    pub event_type: MoneyEventType,
    pub external_event_id: ExternalEventId,
    pub reason: String,
    pub created_at: i64,
}

pub struct SagaDlq {
    rows: sled::Tree,
}

impl SagaDlq {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "saga_dlq")?,
        })
    }

    pub fn enqueue(&self, entry: DlqEntry) -> Result<(), MoneyError> {
        tracing::error!(
            task_id = %entry.task_id,
            reason = %entry.reason,
            "saga compensation: parked in DLQ"
        );
        metrics::counter!("money_saga_dlq_total").increment(1);
        put_typed(
            &self.rows,
            entry.ledger_transaction_id.as_uuid().as_bytes(),
            &entry,
        )
    }

    pub fn get(&self, tx_id: LedgerTransactionId) -> Result<Option<DlqEntry>, MoneyError> {
        get_typed(&self.rows, tx_id.as_uuid().as_bytes())
    }

    pub fn depth(&self) -> Result<u64, MoneyError> {
        Ok(self.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueued_entry_is_retrievable_by_tx_id() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let dlq = SagaDlq::open(&db).unwrap();
        let tx_id = LedgerTransactionId::new();
        dlq.enqueue(DlqEntry {
            ledger_transaction_id: tx_id,
            task_id: TaskId::new(),
            event_type: MoneyEventType::ReleasePayout,
            external_event_id: ExternalEventId::new(),
            reason: "processor timeout".into(),
            created_at: 1000,
        })
        .unwrap();
        assert_eq!(dlq.depth().unwrap(), 1);
        assert!(dlq.get(tx_id).unwrap().is_some());
    }
}
