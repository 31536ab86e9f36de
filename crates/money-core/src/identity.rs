//! Identity Verification types (spec §3, §4.10): two-channel code flow.

use serde::{Deserialize, Serialize};

use crate::ids::{UserId, VerificationId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationChannel {
    Email,
    Sms,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationAttempt {
    pub id: VerificationId,
    pub user_id: UserId,
    pub channel: VerificationChannel,
    pub target: String,
    /// bcrypt hash of the code; the raw code is never persisted.
    pub code_hash: String,
    pub expires_at: i64,
    pub attempt_count: u32,
    pub success: bool,
    pub created_at: i64,
}

impl VerificationAttempt {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    pub fn is_locked_out(&self, max_attempts: u32) -> bool {
        self.attempt_count >= max_attempts
    }
}
