//! Dispute entity (spec §3). Opening a dispute moves the MoneyStateLock to
//! `pending_dispute` and snapshots all proof state (see `money-proof`).

use serde::{Deserialize, Serialize};

use crate::ids::TaskId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeState {
    Open,
    UnderReview,
    Resolved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeResolution {
    Refunded,
    Upheld,
    Split,
    None,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dispute {
    pub task_id: TaskId,
    pub state: DisputeState,
    pub resolution: DisputeResolution,
    pub opened_at: i64,
    pub resolved_at: Option<i64>,
}

impl Dispute {
    pub fn open(task_id: TaskId, opened_at: i64) -> Self {
        Self {
            task_id,
            state: DisputeState::Open,
            resolution: DisputeResolution::None,
            opened_at,
            resolved_at: None,
        }
    }

    pub fn resolve(&mut self, resolution: DisputeResolution, resolved_at: i64) {
        self.state = DisputeState::Resolved;
        self.resolution = resolution;
        self.resolved_at = Some(resolved_at);
    }
}
