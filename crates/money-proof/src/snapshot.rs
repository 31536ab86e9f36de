//! Dispute snapshot (spec §4.6): "opening a dispute creates an immutable
//! snapshot of every request, submission, event, and forensics record for
//! the task, and locks all non-terminal rows." Forensics records are
//! embedded in their owning `ProofSubmission`, so snapshotting requests +
//! submissions + events covers all four families.

use serde::{Deserialize, Serialize};

use money_core::ids::TaskId;
use money_core::proof::{ProofRequest, ProofSubmission};
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

use crate::events::ProofEvent;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisputeSnapshot {
    pub task_id: TaskId,
    pub requests: Vec<ProofRequest>,
    pub submissions: Vec<ProofSubmission>,
    pub events: Vec<ProofEvent>,
    pub taken_at: i64,
}

pub struct SnapshotStore {
    rows: sled::Tree,
}

impl SnapshotStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "proof_dispute_snapshots")?,
        })
    }

    pub fn get(&self, task_id: TaskId) -> Result<Option<DisputeSnapshot>, MoneyError> {
        get_typed(&self.rows, task_id.as_uuid().as_bytes())
    }

    /// Overwrites any prior snapshot for this task — a task can only be in
    /// one dispute at a time (`money-store::Store::has_active_dispute`
    /// enforces that at the engine level), so re-snapshotting only happens
    /// after a prior dispute resolved.
    pub fn put(&self, snapshot: &DisputeSnapshot) -> Result<(), MoneyError> {
        put_typed(&self.rows, snapshot.task_id.as_uuid().as_bytes(), snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use money_core::ids::{ProofRequestId, UserId};
    use money_core::proof::{ProofState, ProofType};

    #[test]
    fn snapshot_round_trips() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = SnapshotStore::open(&db).unwrap();
        let task = TaskId::new();
        let snapshot = DisputeSnapshot {
            task_id: task,
            requests: vec![ProofRequest {
                id: ProofRequestId::new(),
                task_id: task,
                proof_type: ProofType::Receipt,
                reason: "routine".into(),
                state: ProofState::Requested,
                requested_by: UserId::new(),
                created_at: 1000,
                locked: true,
            }],
            submissions: vec![],
            events: vec![],
            taken_at: 2000,
        };
        store.put(&snapshot).unwrap();
        let loaded = store.get(task).unwrap().unwrap();
        assert_eq!(loaded.requests.len(), 1);
    }
}
