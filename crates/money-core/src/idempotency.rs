//! IdempotencyRecord (spec §3): request-level guard on mutating endpoints.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: String,
    pub response_snapshot: serde_json::Value,
    pub created_at: i64,
}
