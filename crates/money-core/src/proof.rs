//! Proof Engine types (spec §3, §4.6): append-only evidence lifecycle that
//! gates release. `ProofState` governs both `ProofRequest` and
//! `ProofSubmission` rows, following the fixed table in spec §4.6.

use serde::{Deserialize, Serialize};

use crate::error::MoneyError;
use crate::ids::{FileHash, ProofRequestId, ProofSubmissionId, TaskId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofState {
    None,
    Requested,
    Submitted,
    Analyzing,
    Verified,
    Rejected,
    Escalated,
    Locked,
}

impl ProofState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProofState::Locked)
    }
}

/// `none -> requested -> submitted -> analyzing -> {verified, rejected,
/// escalated}; verified -> locked; locked is terminal.`
pub fn next_proof_state(from: ProofState, to: ProofState) -> Result<ProofState, MoneyError> {
    use ProofState::*;

    if from.is_terminal() {
        return Err(MoneyError::InvalidProofTransition(format!(
            "{from:?} is terminal"
        )));
    }

    let ok = matches!(
        (from, to),
        (None, Requested)
            | (Requested, Submitted)
            | (Submitted, Analyzing)
            | (Analyzing, Verified)
            | (Analyzing, Rejected)
            | (Analyzing, Escalated)
            | (Verified, Locked)
    );

    if ok {
        Ok(to)
    } else {
        Err(MoneyError::InvalidProofTransition(format!(
            "{from:?} -> {to:?} is not a legal proof transition"
        )))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    PhotoBeforeAfter,
    Receipt,
    CompletionScreenshot,
    LocationCheckIn,
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofRequest {
    pub id: ProofRequestId,
    pub task_id: TaskId,
    pub proof_type: ProofType,
    pub reason: String,
    pub state: ProofState,
    pub requested_by: UserId,
    pub created_at: i64,
    /// Set true once a dispute snapshot has locked this row (spec §4.6).
    pub locked: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProofMetadata {
    pub exif: Option<String>,
    pub resolution: Option<(u32, u32)>,
    pub capture_time: Option<i64>,
    pub gps: Option<(f64, f64)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForensicsResult {
    /// Heuristic confidence in [0, 1] that the submission is genuine.
    pub confidence: f64,
    pub is_screenshot: bool,
    pub likely_ai: bool,
    pub likely_edited: bool,
    pub timestamp_anomaly: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofSubmission {
    pub id: ProofSubmissionId,
    pub request_id: ProofRequestId,
    pub task_id: TaskId,
    pub file_hash: FileHash,
    pub mime: String,
    pub size_bytes: u64,
    pub metadata: ProofMetadata,
    pub forensics: Option<ForensicsResult>,
    pub state: ProofState,
    pub created_at: i64,
    pub locked: bool,
}

/// Unique on `file_hash`; first binding wins. Cross-task reuse of the same
/// hash auto-escalates the *new* submission while the original binding is
/// left untouched (spec §3, §8 property 7, §8 scenario S6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofHashBinding {
    pub file_hash: FileHash,
    pub task_id: TaskId,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_happy_path_transition_sequence_is_legal() {
        let mut s = ProofState::None;
        for next in [
            ProofState::Requested,
            ProofState::Submitted,
            ProofState::Analyzing,
            ProofState::Verified,
            ProofState::Locked,
        ] {
            s = next_proof_state(s, next).unwrap();
        }
        assert_eq!(s, ProofState::Locked);
    }

    #[test]
    fn locked_is_terminal() {
        let err = next_proof_state(ProofState::Locked, ProofState::Requested).unwrap_err();
        assert!(matches!(err, MoneyError::InvalidProofTransition(_)));
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let err = next_proof_state(ProofState::Requested, ProofState::Verified).unwrap_err();
        assert!(matches!(err, MoneyError::InvalidProofTransition(_)));
    }

    #[test]
    fn analyzing_can_branch_to_any_of_three_outcomes() {
        assert!(next_proof_state(ProofState::Analyzing, ProofState::Verified).is_ok());
        assert!(next_proof_state(ProofState::Analyzing, ProofState::Rejected).is_ok());
        assert!(next_proof_state(ProofState::Analyzing, ProofState::Escalated).is_ok());
    }
}
