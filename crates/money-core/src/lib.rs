//! Shared domain types for the money-flow kernel: ids, monetary amounts,
//! the escrow/proof/dispute/ledger/outbox/identity/score entities, the
//! kernel-wide error type, constants and process-level config.
//!
//! No I/O lives here — persistence is `money-store`, orchestration is
//! `money-engine` and its sibling crates.

pub mod clock;
pub mod config;
pub mod constants;
pub mod dispute;
pub mod error;
pub mod escrow;
pub mod ids;
pub mod idempotency;
pub mod identity;
pub mod lease;
pub mod ledger;
pub mod money;
pub mod outbox;
pub mod proof;
pub mod score;
pub mod task;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::MoneyError;
pub use money::Money;
