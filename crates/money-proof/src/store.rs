//! Sled-backed storage for the Proof Engine's three append-only families:
//! requests, submissions, and the hash-binding uniqueness index (spec §4.6,
//! §6 required index `(proof_hash_bindings.file_hash, task_id)`).

use money_core::constants::MAX_PROOF_REQUESTS_PER_TASK;
use money_core::ids::{FileHash, ProofRequestId, ProofSubmissionId, TaskId, UserId};
use money_core::proof::{ProofHashBinding, ProofRequest, ProofState, ProofSubmission, ProofType};
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

pub struct RequestStore {
    rows: sled::Tree,
    by_task: sled::Tree,
}

impl RequestStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "proof_requests")?,
            by_task: money_store::db::open_tree(db, "proof_requests_by_task")?,
        })
    }

    pub fn get(&self, id: ProofRequestId) -> Result<Option<ProofRequest>, MoneyError> {
        get_typed(&self.rows, id.as_uuid().as_bytes())
    }

    pub fn put(&self, req: &ProofRequest) -> Result<(), MoneyError> {
        put_typed(&self.rows, req.id.as_uuid().as_bytes(), req)
    }

    pub fn for_task(&self, task_id: TaskId) -> Result<Vec<ProofRequest>, MoneyError> {
        let prefix = task_id.as_uuid().as_bytes().to_vec();
        let mut out = Vec::new();
        for item in self.by_task.scan_prefix(&prefix) {
            let (_, id_bytes) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
            let id: ProofRequestId = money_store::codec::decode(&id_bytes)?;
            if let Some(req) = self.get(id)? {
                out.push(req);
            }
        }
        Ok(out)
    }

    /// Rejects a sixth request per task (spec §4.6 "forbids more than a
    /// configured number of requests per task").
    pub fn create(
        &self,
        task_id: TaskId,
        proof_type: ProofType,
        reason: String,
        requested_by: UserId,
        now: i64,
    ) -> Result<ProofRequest, MoneyError> {
        let existing = self.for_task(task_id)?;
        if existing.len() as u32 >= MAX_PROOF_REQUESTS_PER_TASK {
            return Err(MoneyError::ProofRequestLimitExceeded { task_id });
        }
        let req = ProofRequest {
            id: ProofRequestId::new(),
            task_id,
            proof_type,
            reason,
            state: ProofState::Requested,
            requested_by,
            created_at: now,
            locked: false,
        };
        self.put(&req)?;
        let mut key = task_id.as_uuid().as_bytes().to_vec();
        key.extend_from_slice(req.id.as_uuid().as_bytes());
        put_typed(&self.by_task, key, &req.id)?;
        Ok(req)
    }
}

pub struct SubmissionStore {
    rows: sled::Tree,
    by_task: sled::Tree,
}

impl SubmissionStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "proof_submissions")?,
            by_task: money_store::db::open_tree(db, "proof_submissions_by_task")?,
        })
    }

    pub fn get(&self, id: ProofSubmissionId) -> Result<Option<ProofSubmission>, MoneyError> {
        get_typed(&self.rows, id.as_uuid().as_bytes())
    }

    pub fn put(&self, sub: &ProofSubmission) -> Result<(), MoneyError> {
        put_typed(&self.rows, sub.id.as_uuid().as_bytes(), sub)?;
        let mut key = sub.task_id.as_uuid().as_bytes().to_vec();
        key.extend_from_slice(sub.id.as_uuid().as_bytes());
        put_typed(&self.by_task, key, &sub.id)
    }

    pub fn for_task(&self, task_id: TaskId) -> Result<Vec<ProofSubmission>, MoneyError> {
        let prefix = task_id.as_uuid().as_bytes().to_vec();
        let mut out = Vec::new();
        for item in self.by_task.scan_prefix(&prefix) {
            let (_, id_bytes) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
            let id: ProofSubmissionId = money_store::codec::decode(&id_bytes)?;
            if let Some(sub) = self.get(id)? {
                out.push(sub);
            }
        }
        Ok(out)
    }
}

/// Unique on `file_hash` (spec §6). First binding wins; a reuse on a
/// different task is detected, never overwritten (§8 property 7).
pub struct HashBindingStore {
    bindings: sled::Tree,
}

impl HashBindingStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            bindings: money_store::db::open_tree(db, "proof_hash_bindings")?,
        })
    }

    pub fn get(&self, file_hash: FileHash) -> Result<Option<ProofHashBinding>, MoneyError> {
        get_typed(&self.bindings, file_hash.to_hex().as_bytes())
    }

    /// Binds `file_hash` to `task_id` if unbound. Returns the binding that
    /// ends up on file — the caller compares its `task_id` against its own
    /// to decide whether this is a cross-task reuse.
    pub fn bind_or_get(&self, file_hash: FileHash, task_id: TaskId, now: i64) -> Result<ProofHashBinding, MoneyError> {
        if let Some(existing) = self.get(file_hash)? {
            return Ok(existing);
        }
        let binding = ProofHashBinding {
            file_hash,
            task_id,
            created_at: now,
        };
        put_typed(&self.bindings, file_hash.to_hex().as_bytes(), &binding)?;
        Ok(binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_request_for_a_task_is_rejected() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = RequestStore::open(&db).unwrap();
        let task = TaskId::new();
        let by = UserId::new();
        for _ in 0..5 {
            store
                .create(task, ProofType::Receipt, "routine".into(), by, 1000)
                .unwrap();
        }
        let err = store
            .create(task, ProofType::Receipt, "routine".into(), by, 1000)
            .unwrap_err();
        assert!(matches!(err, MoneyError::ProofRequestLimitExceeded { .. }));
    }

    #[test]
    fn hash_binding_first_wins() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = HashBindingStore::open(&db).unwrap();
        let hash = FileHash::of_bytes(b"some file bytes");
        let t1 = TaskId::new();
        let t2 = TaskId::new();
        let first = store.bind_or_get(hash, t1, 1000).unwrap();
        let second = store.bind_or_get(hash, t2, 2000).unwrap();
        assert_eq!(first.task_id, t1);
        assert_eq!(second.task_id, t1);
    }
}
