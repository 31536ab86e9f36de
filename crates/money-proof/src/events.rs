//! Append-only proof event log (spec §4.6: "every request, submission,
//! event, and forensics record" is part of what a dispute snapshot
//! captures). One row per state transition on either a request or a
//! submission.

use serde::{Deserialize, Serialize};

use money_core::ids::{ProofRequestId, ProofSubmissionId, TaskId};
use money_core::proof::ProofState;
use money_core::MoneyError;
use money_store::codec::decode;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofEvent {
    pub task_id: TaskId,
    pub request_id: Option<ProofRequestId>,
    pub submission_id: Option<ProofSubmissionId>,
    pub from_state: ProofState,
    pub to_state: ProofState,
    pub created_at: i64,
}

pub struct ProofEventLog {
    rows: sled::Tree,
}

impl ProofEventLog {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "proof_events")?,
        })
    }

    pub fn append(&self, event: ProofEvent) -> Result<(), MoneyError> {
        let seq = money_store::codec::next_id(&self.rows, "__seq")?;
        let mut key = event.task_id.as_uuid().as_bytes().to_vec();
        key.extend_from_slice(&seq.to_be_bytes());
        money_store::codec::put_typed(&self.rows, key, &event)
    }

    pub fn for_task(&self, task_id: TaskId) -> Result<Vec<ProofEvent>, MoneyError> {
        let prefix = task_id.as_uuid().as_bytes().to_vec();
        let mut out = Vec::new();
        for item in self.rows.scan_prefix(&prefix) {
            let (_, bytes) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_for_a_task_iterate_in_append_order() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let log = ProofEventLog::open(&db).unwrap();
        let task = TaskId::new();
        for (from, to) in [
            (ProofState::None, ProofState::Requested),
            (ProofState::Requested, ProofState::Submitted),
        ] {
            log.append(ProofEvent {
                task_id: task,
                request_id: None,
                submission_id: None,
                from_state: from,
                to_state: to,
                created_at: 1000,
            })
            .unwrap();
        }
        let events = log.for_task(task).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].to_state, ProofState::Requested);
        assert_eq!(events[1].to_state, ProofState::Submitted);
    }
}
