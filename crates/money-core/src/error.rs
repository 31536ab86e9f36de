//! Kernel-wide error type. Every variant maps to a stable `HX###` wire code
//! (spec §6/§7) via [`MoneyError::code`], so call sites never hand-write a
//! code string. Grouped into sections the way `chronx_core::error::ChronxError`
//! is, ending in a catch-all for genuinely unexpected conditions.

use thiserror::Error;

use crate::ids::{EscrowId, TaskId};

#[derive(Debug, Error)]
pub enum MoneyError {
    // ── Amount / invariant errors (HX00x) ──────────────────────────────────
    #[error("amount must not be negative: {cents}")]
    NegativeAmount { cents: i64 },

    #[error("amount overflow")]
    AmountOverflow,

    #[error("insufficient amount: have {have}, need {need}")]
    InsufficientAmount { have: i64, need: i64 },

    #[error("escrow amount is immutable after creation")]
    AmountImmutable,

    // ── State machine / transition errors (HX1xx) ──────────────────────────
    #[error("invalid transition for escrow {escrow_id}: no transition from this state for this event")]
    InvalidTransition { escrow_id: EscrowId },

    #[error("escrow {escrow_id} is in a terminal state and accepts no further transitions")]
    TerminalState { escrow_id: EscrowId },

    #[error("event timestamp does not strictly dominate escrow {escrow_id}'s last transition")]
    TemporalGuardViolation { escrow_id: EscrowId },

    #[error("duplicate event id {event_id}: already processed, ignoring")]
    DuplicateIgnored { event_id: String },

    // ── Guard / precondition errors (HX2xx) ────────────────────────────────
    #[error("active dispute blocks release for task {task_id}")]
    ActiveDisputeBlocksRelease { task_id: TaskId },

    #[error("caller is not authorized to perform this action on task {task_id}")]
    Unauthorized { task_id: TaskId },

    #[error("conflict of interest: admin is a party to task {task_id}")]
    ConflictOfInterest { task_id: TaskId },

    // ── Ledger errors (HX3xx) ───────────────────────────────────────────────
    #[error("ledger transaction {0} is not in pending state")]
    LedgerTransactionNotPending(String),

    #[error("ledger transaction is unbalanced: debits {debits} != credits {credits}")]
    LedgerUnbalanced { debits: i64, credits: i64 },

    #[error("committed ledger transactions may never be mutated")]
    LedgerTransactionImmutable,

    #[error("duplicate idempotency key for ledger prepare: {0}")]
    DuplicateLedgerIdempotencyKey(String),

    // ── Policy gate errors (HX4xx) ──────────────────────────────────────────
    #[error("user {user_id} is not eligible for payout release: trust band {band}")]
    PolicyBlocked { user_id: String, band: String },

    // ── Lease / concurrency errors (HX5xx) ──────────────────────────────────
    #[error("resource {resource_id} is leased by another holder")]
    LeaseHeld { resource_id: String },

    #[error("row-level lock on {0} could not be acquired")]
    LockContention(String),

    // ── Kill-switch errors (HX6xx) ──────────────────────────────────────────
    #[error("kill-switch is active ({reason}); mutating operations are frozen")]
    KillSwitchActive { reason: String },

    // ── Proof engine errors (HX7xx) ──────────────────────────────────────────
    #[error("invalid proof transition: {0}")]
    InvalidProofTransition(String),

    #[error("proof request limit exceeded for task {task_id}")]
    ProofRequestLimitExceeded { task_id: TaskId },

    #[error("proof row is locked (dispute snapshot taken) and cannot be mutated")]
    ProofLocked,

    // ── Identity verification errors (HX8xx) ─────────────────────────────────
    #[error("verification code has expired")]
    VerificationCodeExpired,

    #[error("verification attempt lockout: too many incorrect attempts")]
    VerificationLockedOut,

    #[error("verification code does not match")]
    VerificationCodeMismatch,

    #[error("rate limit exceeded for channel {channel}")]
    RateLimited { channel: String },

    // ── Outbox / webhook / external errors (HX9xx) ───────────────────────────
    #[error("idempotency key is required for mutating calls")]
    IdempotencyKeyRequired,

    #[error("external processor call failed: {0}")]
    ProcessorCallFailed(String),

    #[error("webhook signature verification failed")]
    WebhookSignatureInvalid,

    #[error("unknown webhook event type: {0}")]
    UnknownWebhookType(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl MoneyError {
    /// Stable wire code per spec §6 ("textual codes HX001-HX905").
    pub fn code(&self) -> &'static str {
        match self {
            MoneyError::NegativeAmount { .. } => "HX001",
            MoneyError::AmountOverflow => "HX002",
            MoneyError::InsufficientAmount { .. } => "HX003",
            MoneyError::AmountImmutable => "HX004",
            MoneyError::InvalidTransition { .. } => "HX101",
            MoneyError::TerminalState { .. } => "HX102",
            MoneyError::TemporalGuardViolation { .. } => "HX103",
            MoneyError::DuplicateIgnored { .. } => "HX104",
            MoneyError::ActiveDisputeBlocksRelease { .. } => "HX201",
            MoneyError::Unauthorized { .. } => "HX202",
            MoneyError::ConflictOfInterest { .. } => "HX203",
            MoneyError::LedgerTransactionNotPending(_) => "HX301",
            MoneyError::LedgerUnbalanced { .. } => "HX302",
            MoneyError::LedgerTransactionImmutable => "HX303",
            MoneyError::DuplicateLedgerIdempotencyKey(_) => "HX304",
            MoneyError::PolicyBlocked { .. } => "HX401",
            MoneyError::LeaseHeld { .. } => "HX501",
            MoneyError::LockContention(_) => "HX502",
            MoneyError::KillSwitchActive { .. } => "HX601",
            MoneyError::InvalidProofTransition(_) => "HX701",
            MoneyError::ProofRequestLimitExceeded { .. } => "HX702",
            MoneyError::ProofLocked => "HX703",
            MoneyError::VerificationCodeExpired => "HX801",
            MoneyError::VerificationLockedOut => "HX802",
            MoneyError::VerificationCodeMismatch => "HX803",
            MoneyError::RateLimited { .. } => "HX804",
            MoneyError::IdempotencyKeyRequired => "HX901",
            MoneyError::ProcessorCallFailed(_) => "HX902",
            MoneyError::WebhookSignatureInvalid => "HX903",
            MoneyError::UnknownWebhookType(_) => "HX904",
            MoneyError::Storage(_) => "HX905",
            MoneyError::Other(_) => "HX000",
        }
    }

    /// True for errors that should never be retried automatically (fail
    /// closed, per spec §7's "Invariant violation" / "Guard failure" rows).
    pub fn is_fail_closed(&self) -> bool {
        matches!(
            self,
            MoneyError::AmountImmutable
                | MoneyError::InvalidTransition { .. }
                | MoneyError::TerminalState { .. }
                | MoneyError::ActiveDisputeBlocksRelease { .. }
                | MoneyError::Unauthorized { .. }
                | MoneyError::ConflictOfInterest { .. }
                | MoneyError::PolicyBlocked { .. }
                | MoneyError::KillSwitchActive { .. }
        )
    }
}
