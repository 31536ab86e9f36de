//! Saga sweeper run loop (spec §4.5): schedules the three independent
//! batch-scan-and-act jobs in `money-sweepers` on a fixed interval, updating
//! the shared health snapshot `getHealth` reports from after each pass.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use money_core::clock::Clock;
use money_sweepers::{MirrorRecoverySweeper, PendingTransactionReaper, RealityMirrorBackfill};

use money_rpc::SweeperHealth;

pub struct Sweepers {
    pub reaper: PendingTransactionReaper,
    pub mirror_recovery: MirrorRecoverySweeper,
    pub backfill: RealityMirrorBackfill,
}

pub async fn run(sweepers: Sweepers, health: Arc<RwLock<SweeperHealth>>, clock: Arc<dyn Clock>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let now = clock.now_unix();

        match sweepers.reaper.sweep() {
            Ok(report) => {
                tracing::debug!(scanned = report.scanned, reaped = report.reaped.len(), "reaper swept");
                health.write().expect("sweeper health lock poisoned").reaper_last_run = Some(now);
            }
            Err(e) => tracing::error!(error = %e, "pending-transaction reaper failed"),
        }

        match sweepers.mirror_recovery.sweep() {
            Ok(report) => {
                tracing::debug!(scanned = report.scanned, recovered = report.recovered.len(), "mirror recovery swept");
                health.write().expect("sweeper health lock poisoned").mirror_recovery_last_run = Some(now);
            }
            Err(e) => tracing::error!(error = %e, "mirror recovery sweeper failed"),
        }

        match sweepers.backfill.sweep() {
            Ok(report) => {
                if !report.unconfirmed.is_empty() {
                    tracing::error!(unconfirmed = ?report.unconfirmed, "reality-mirror backfill found unconfirmed events");
                }
                health.write().expect("sweeper health lock poisoned").backfill_last_run = Some(now);
            }
            Err(e) => tracing::error!(error = %e, "reality-mirror backfill failed"),
        }
    }
}
