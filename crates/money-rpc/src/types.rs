//! Wire DTOs for the RPC surface (spec §6). Plain serde structs, mirroring
//! the teacher's `Rpc*` naming in `chronx_rpc::types` — every domain type
//! crosses the wire as strings (uuids, enum labels) rather than leaking its
//! internal representation.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcEscrowResult {
    pub escrow_id: String,
    pub state: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RpcProofMetadata {
    pub exif: Option<String>,
    pub resolution: Option<(u32, u32)>,
    pub capture_time: Option<i64>,
    pub gps: Option<(f64, f64)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcProofSubmission {
    pub submission_id: String,
    pub request_id: String,
    pub task_id: String,
    pub state: String,
    pub file_hash: String,
    pub cross_task_reuse_flagged: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcVerificationSent {
    pub verification_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcIdentityStatus {
    pub user_id: String,
    pub email_verified: bool,
    pub sms_verified: bool,
    pub fully_verified: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcHealth {
    pub kill_switch_active: bool,
    pub kill_switch_reason: Option<String>,
    pub outbox_dlq_depth: u64,
    pub reaper_last_run: Option<i64>,
    pub mirror_recovery_last_run: Option<i64>,
    pub backfill_last_run: Option<i64>,
}
