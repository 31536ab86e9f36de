//! Proof Engine (spec §4.6): request/submission lifecycle, rule-based
//! forensics, the hash-binding uniqueness table, and dispute snapshotting.

pub mod events;
pub mod forensics;
pub mod snapshot;
pub mod store;

use money_core::ids::{FileHash, ProofRequestId, ProofSubmissionId, TaskId, UserId};
use money_core::proof::{next_proof_state, ProofMetadata, ProofRequest, ProofState, ProofSubmission, ProofType};
use money_core::MoneyError;

use events::{ProofEvent, ProofEventLog};
use snapshot::{DisputeSnapshot, SnapshotStore};
use store::{HashBindingStore, RequestStore, SubmissionStore};

pub struct ProofEngine {
    requests: RequestStore,
    submissions: SubmissionStore,
    bindings: HashBindingStore,
    events: ProofEventLog,
    snapshots: SnapshotStore,
}

impl ProofEngine {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            requests: RequestStore::open(db)?,
            submissions: SubmissionStore::open(db)?,
            bindings: HashBindingStore::open(db)?,
            events: ProofEventLog::open(db)?,
            snapshots: SnapshotStore::open(db)?,
        })
    }

    pub fn request_proof(
        &self,
        task_id: TaskId,
        proof_type: ProofType,
        reason: String,
        requested_by: UserId,
        now: i64,
    ) -> Result<ProofRequest, MoneyError> {
        let req = self.requests.create(task_id, proof_type, reason, requested_by, now)?;
        self.events.append(ProofEvent {
            task_id,
            request_id: Some(req.id),
            submission_id: None,
            from_state: ProofState::None,
            to_state: ProofState::Requested,
            created_at: now,
        })?;
        metrics::counter!("money_proof_requests_total").increment(1);
        Ok(req)
    }

    /// Submits evidence against a request: records the file hash, checks
    /// hash-binding uniqueness (§8 property 7), runs forensics, and lands
    /// in `Verified` (auto) or `Escalated` (anything uncertain or flagged).
    #[allow(clippy::too_many_arguments)]
    pub fn submit_proof(
        &self,
        request_id: ProofRequestId,
        file_bytes: &[u8],
        mime: String,
        metadata: ProofMetadata,
        now: i64,
    ) -> Result<ProofSubmission, MoneyError> {
        let request = self
            .requests
            .get(request_id)?
            .ok_or_else(|| MoneyError::Other(format!("no proof request {request_id}")))?;
        if request.locked {
            return Err(MoneyError::ProofLocked);
        }

        let file_hash = FileHash::of_bytes(file_bytes);
        let binding = self.bindings.bind_or_get(file_hash, request.task_id, now)?;
        let cross_task_reuse = binding.task_id != request.task_id;

        let mut submission = ProofSubmission {
            id: ProofSubmissionId::new(),
            request_id,
            task_id: request.task_id,
            file_hash,
            mime: mime.clone(),
            size_bytes: file_bytes.len() as u64,
            metadata: metadata.clone(),
            forensics: None,
            state: ProofState::Submitted,
            created_at: now,
            locked: false,
        };

        let analyzing = next_proof_state(submission.state, ProofState::Analyzing)?;
        submission.state = analyzing;

        let forensics_result = forensics::analyze(&metadata, &mime, now);
        let to_state = if cross_task_reuse {
            ProofState::Escalated
        } else if forensics::auto_verifies(&forensics_result) {
            ProofState::Verified
        } else {
            ProofState::Escalated
        };
        submission.forensics = Some(forensics_result);
        submission.state = next_proof_state(analyzing, to_state)?;

        self.submissions.put(&submission)?;
        self.events.append(ProofEvent {
            task_id: submission.task_id,
            request_id: Some(request_id),
            submission_id: Some(submission.id),
            from_state: analyzing,
            to_state,
            created_at: now,
        })?;

        if cross_task_reuse {
            tracing::warn!(
                task_id = %submission.task_id,
                original_task_id = %binding.task_id,
                file_hash = %file_hash,
                "proof submission auto-escalated: file hash reused across tasks"
            );
            metrics::counter!("money_proof_hash_reuse_total").increment(1);
        }

        Ok(submission)
    }

    /// Human (or Money Engine) decision on an `Escalated` submission, or
    /// the final `Verified -> Locked` step before release.
    pub fn finalize_proof(
        &self,
        submission_id: ProofSubmissionId,
        decision: ProofState,
        now: i64,
    ) -> Result<ProofSubmission, MoneyError> {
        let mut submission = self
            .submissions
            .get(submission_id)?
            .ok_or_else(|| MoneyError::Other(format!("no proof submission {submission_id}")))?;
        if submission.locked {
            return Err(MoneyError::ProofLocked);
        }
        let from = submission.state;
        let to = next_proof_state(from, decision)?;
        submission.state = to;
        self.submissions.put(&submission)?;
        self.events.append(ProofEvent {
            task_id: submission.task_id,
            request_id: Some(submission.request_id),
            submission_id: Some(submission.id),
            from_state: from,
            to_state: to,
            created_at: now,
        })?;
        Ok(submission)
    }

    /// Snapshots every request, submission, and event for `task_id`, then
    /// locks every non-terminal row so no further mutation is possible
    /// while the dispute is open (spec §4.6).
    pub fn open_dispute_snapshot(&self, task_id: TaskId, now: i64) -> Result<DisputeSnapshot, MoneyError> {
        let mut requests = self.requests.for_task(task_id)?;
        let mut submissions = self.submissions.for_task(task_id)?;
        let events = self.events.for_task(task_id)?;

        for req in requests.iter_mut() {
            if !req.locked {
                req.locked = true;
                self.requests.put(req)?;
            }
        }
        for sub in submissions.iter_mut() {
            if !sub.locked && sub.state != ProofState::Locked {
                sub.locked = true;
                self.submissions.put(sub)?;
            }
        }

        let snapshot = DisputeSnapshot {
            task_id,
            requests,
            submissions,
            events,
            taken_at: now,
        };
        self.snapshots.put(&snapshot)?;
        Ok(snapshot)
    }
}
