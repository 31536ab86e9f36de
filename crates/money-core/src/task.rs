//! Task: identity, owner, assignee, status. Mutated by the Money/Proof/
//! Dispute engines; terminal once completed/cancelled/expired.

use serde::{Deserialize, Serialize};

use crate::ids::{TaskId, UserId};
use crate::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Draft,
    Open,
    Assigned,
    InProgress,
    PendingCompletion,
    Completed,
    Cancelled,
    Expired,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Cancelled | TaskStatus::Expired
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: UserId,
    pub assignee_id: Option<UserId>,
    pub category: String,
    pub price: Money,
    pub status: TaskStatus,

    /// Extensibility field added after v1; defaults for data written
    /// before this field existed, matching `chronx_core::account::Account`'s
    /// `#[serde(default = "fn")]` versioned-field idiom.
    #[serde(default = "default_created_at")]
    pub created_at: i64,
}

fn default_created_at() -> i64 {
    0
}

impl Task {
    pub fn new(
        id: TaskId,
        owner_id: UserId,
        category: impl Into<String>,
        price: Money,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            owner_id,
            assignee_id: None,
            category: category.into(),
            price,
            status: TaskStatus::Draft,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_are_recognized() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(TaskStatus::Expired.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
    }
}
