//! Saga Sweepers (spec §4.5): three independent periodic jobs that clean up
//! after crashes the three-phase saga in `money-engine` can't fully recover
//! from by itself. Each is a plain batch-scan-and-act pass; the run loop
//! that schedules them on an interval lives in `money-node`.

pub mod backfill;
pub mod mirror_recovery;
pub mod reaper;

pub use backfill::{BackfillReport, RealityMirrorBackfill};
pub use mirror_recovery::{MirrorRecoveryReport, MirrorRecoverySweeper};
pub use reaper::{PendingTransactionReaper, ReaperReport};
