//! Kernel-wide constants, grouped by subsystem with section dividers —
//! matching the layout of `chronx_core::constants`.

// ── Temporal Guard / sagas ──────────────────────────────────────────────────

/// External processor calls (payment capture/transfer/refund) are bounded by
/// this deadline (spec §5: "processor default for payment").
pub const PROCESSOR_CALL_TIMEOUT_SECS: u64 = 15;

/// AI / forensics calls are bounded by the 30s hard cap spec §5 names.
pub const FORENSICS_CALL_TIMEOUT_SECS: u64 = 30;

// ── Leases ───────────────────────────────────────────────────────────────────

pub const DEFAULT_LEASE_TTL_SECS: u64 = 30;

// ── Saga Sweepers ────────────────────────────────────────────────────────────

pub const PENDING_TX_REAPER_THRESHOLD_SECS: i64 = 300;
pub const SWEEPER_INTERVAL_SECS: u64 = 60;
pub const REALITY_MIRROR_BACKFILL_WINDOW_SECS: i64 = 3600;

// ── Outbox / Worker Framework ────────────────────────────────────────────────

pub const OUTBOX_MAX_ATTEMPTS: u32 = 8;
pub const OUTBOX_BACKOFF_BASE_SECS: u64 = 2;
pub const OUTBOX_BACKOFF_MAX_SECS: u64 = 600;
pub const WORKER_CLAIM_BATCH_SIZE: usize = 64;

// ── Policy Gate / shadow score ───────────────────────────────────────────────

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;
pub const SCORE_DEFAULT: f64 = 100.0;

pub const SCORE_BAND_FULL_THRESHOLD: f64 = 75.0;
pub const SCORE_BAND_LIMITED_THRESHOLD: f64 = 50.0;
pub const SCORE_BAND_DEGRADED_THRESHOLD: f64 = 25.0;
// below SCORE_BAND_DEGRADED_THRESHOLD => INVISIBLE

pub const SCORE_DELTA_DISPUTE_LOST: f64 = -15.0;
pub const SCORE_DELTA_FRAUD_FLAG: f64 = -25.0;
pub const SCORE_DELTA_TASK_COMPLETED_5STAR: f64 = 3.0;
pub const SCORE_DELTA_DAILY_DECAY: f64 = 0.5;

// ── Proof Engine ─────────────────────────────────────────────────────────────

pub const MAX_PROOF_REQUESTS_PER_TASK: u32 = 5;
pub const FORENSICS_SCREENSHOT_CONFIDENCE_FLOOR: f64 = 0.6;

// ── Identity Verification ────────────────────────────────────────────────────

pub const VERIFICATION_CODE_TTL_SECS: i64 = 600;
pub const VERIFICATION_MAX_ATTEMPTS: u32 = 5;
pub const VERIFICATION_CODE_LENGTH: usize = 6;
pub const BCRYPT_COST: u32 = 10;

// ── XP coupling (invariant INV-1) ────────────────────────────────────────────

pub const XP_AWARD_ON_RELEASE: u64 = 500;
