//! Process-level tunables. Constructed from CLI flags in `money-node` (see
//! its `clap::Parser` `Args`, grounded on `chronx_node::main::Args`) or
//! from defaults in tests — never read from ambient global state.

use std::time::Duration;

use crate::constants::*;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub lease_ttl: Duration,
    pub processor_call_timeout: Duration,
    pub forensics_call_timeout: Duration,
    pub outbox_max_attempts: u32,
    pub outbox_backoff_base: Duration,
    pub outbox_backoff_max: Duration,
    pub sweeper_interval: Duration,
    pub pending_tx_reaper_threshold: Duration,
    pub worker_claim_batch_size: usize,
    pub max_proof_requests_per_task: u32,
    pub verification_code_ttl: Duration,
    pub verification_max_attempts: u32,
    /// Non-production only: log verification codes in cleartext. Defaults
    /// to false; must be explicitly enabled, never inferred from env.
    pub insecure_log_raw_codes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lease_ttl: Duration::from_secs(DEFAULT_LEASE_TTL_SECS),
            processor_call_timeout: Duration::from_secs(PROCESSOR_CALL_TIMEOUT_SECS),
            forensics_call_timeout: Duration::from_secs(FORENSICS_CALL_TIMEOUT_SECS),
            outbox_max_attempts: OUTBOX_MAX_ATTEMPTS,
            outbox_backoff_base: Duration::from_secs(OUTBOX_BACKOFF_BASE_SECS),
            outbox_backoff_max: Duration::from_secs(OUTBOX_BACKOFF_MAX_SECS),
            sweeper_interval: Duration::from_secs(SWEEPER_INTERVAL_SECS),
            pending_tx_reaper_threshold: Duration::from_secs(
                PENDING_TX_REAPER_THRESHOLD_SECS as u64,
            ),
            worker_claim_batch_size: WORKER_CLAIM_BATCH_SIZE,
            max_proof_requests_per_task: MAX_PROOF_REQUESTS_PER_TASK,
            verification_code_ttl: Duration::from_secs(VERIFICATION_CODE_TTL_SECS as u64),
            verification_max_attempts: VERIFICATION_MAX_ATTEMPTS,
            insecure_log_raw_codes: false,
        }
    }
}
