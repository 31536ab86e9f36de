//! `MoneyEvent(processed)` (spec §4.1 step 2, §6's unique index list) and
//! `MoneyEventAudit` (spec §4.1 step 3's "append a row"). Together these
//! give exactly-once-per-external-event-id at the engine level and a
//! durable, totally-ordered record of every committed transition.

use serde::{Deserialize, Serialize};

use money_core::escrow::{EscrowState, MoneyEventType};
use money_core::ids::{ExternalEventId, TaskId};
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessedEvent {
    pub external_event_id: ExternalEventId,
    pub task_id: TaskId,
    pub processed_at: i64,
}

pub struct ProcessedEvents {
    rows: sled::Tree,
}

impl ProcessedEvents {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "money_events_processed")?,
        })
    }

    pub fn get(&self, external_event_id: ExternalEventId) -> Result<Option<ProcessedEvent>, MoneyError> {
        get_typed(&self.rows, external_event_id.as_uuid().as_bytes())
    }

    /// Record an external event id as processed. Rejects a duplicate insert
    /// (the engine is expected to have already checked [`Self::get`] during
    /// Prepare; this is the unique-constraint safety net, mirroring the
    /// ledger's own independent `idempotency_key` check).
    pub fn mark_processed(
        &self,
        external_event_id: ExternalEventId,
        task_id: TaskId,
        now: i64,
    ) -> Result<(), MoneyError> {
        if self.get(external_event_id)?.is_some() {
            return Err(MoneyError::DuplicateIgnored {
                event_id: external_event_id.to_string(),
            });
        }
        put_typed(
            &self.rows,
            external_event_id.as_uuid().as_bytes(),
            &ProcessedEvent {
                external_event_id,
                task_id,
                processed_at: now,
            },
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRow {
    pub task_id: TaskId,
    pub event_type: MoneyEventType,
    pub from_state: EscrowState,
    pub to_state: EscrowState,
    pub external_event_id: ExternalEventId,
    pub version: u64,
    pub created_at: i64,
}

pub struct AuditLog {
    rows: sled::Tree,
}

impl AuditLog {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "money_event_audit")?,
        })
    }

    /// Appended under a compound `task_id ++ version` key so rows for a task
    /// iterate in committed order (spec §5 "totally ordered by committed
    /// version"), matching `ScoreStore::events_for_user`'s `scan_prefix` idiom.
    pub fn append(&self, row: AuditRow) -> Result<(), MoneyError> {
        let mut key = row.task_id.as_uuid().as_bytes().to_vec();
        key.extend_from_slice(&row.version.to_be_bytes());
        put_typed(&self.rows, key, &row)
    }

    pub fn for_task(&self, task_id: TaskId) -> Result<Vec<AuditRow>, MoneyError> {
        let prefix = task_id.as_uuid().as_bytes().to_vec();
        let mut out = Vec::new();
        for item in self.rows.scan_prefix(prefix) {
            let (_, bytes) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
            out.push(money_store::codec::decode(&bytes)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_external_event_id_is_rejected() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let processed = ProcessedEvents::open(&db).unwrap();
        let task = TaskId::new();
        let evt = ExternalEventId::new();
        processed.mark_processed(evt, task, 1000).unwrap();
        let err = processed.mark_processed(evt, task, 2000).unwrap_err();
        assert!(matches!(err, MoneyError::DuplicateIgnored { .. }));
    }

    #[test]
    fn audit_rows_for_task_iterate_in_version_order() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let log = AuditLog::open(&db).unwrap();
        let task = TaskId::new();
        for v in 0..3u64 {
            log.append(AuditRow {
                task_id: task,
                event_type: MoneyEventType::HoldEscrow,
                from_state: EscrowState::Initial,
                to_state: EscrowState::Held,
                external_event_id: ExternalEventId::new(),
                version: v,
                created_at: 1000 + v as i64,
            })
            .unwrap();
        }
        let rows = log.for_task(task).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].version, 0);
        assert_eq!(rows[2].version, 2);
    }
}
