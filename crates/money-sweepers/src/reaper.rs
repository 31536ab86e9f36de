//! Pending-transaction Reaper (spec §4.5): a ledger transaction stuck in
//! `pending` past `PENDING_TX_REAPER_THRESHOLD_SECS` with no recorded
//! processor side-effect never made it past Prepare before the engine
//! crashed — failing it is safe because balances are untouched until
//! Commit. Same batch-scan-and-act shape as `OutboxStore::claim_batch`.

use std::sync::Arc;

use money_core::clock::Clock;
use money_core::ids::LedgerTransactionId;
use money_core::MoneyError;
use money_engine::mirror::OutboundMirror;
use money_ledger::transactions::LedgerStore;

pub struct ReaperReport {
    pub scanned: usize,
    pub reaped: Vec<LedgerTransactionId>,
}

pub struct PendingTransactionReaper {
    ledger: Arc<LedgerStore>,
    mirror: Arc<OutboundMirror>,
    threshold_secs: i64,
    clock: Arc<dyn Clock>,
}

impl PendingTransactionReaper {
    pub fn new(
        ledger: Arc<LedgerStore>,
        mirror: Arc<OutboundMirror>,
        threshold_secs: i64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            mirror,
            threshold_secs,
            clock,
        }
    }

    pub fn sweep(&self) -> Result<ReaperReport, MoneyError> {
        let now = self.clock.now_unix();
        let pending = self.ledger.pending()?;
        let mut reaped = Vec::new();

        for tx in &pending {
            if now - tx.created_at < self.threshold_secs {
                continue;
            }
            if self.mirror.get(&tx.idempotency_key)?.is_some() {
                // A processor call did land; the Mirror-recovery Sweeper
                // owns finishing this one, not the reaper.
                continue;
            }
            self.ledger.fail_transaction(
                tx.id,
                format!(
                    "pending_transaction_reaper: no processor side-effect recorded after {}s",
                    now - tx.created_at
                ),
            )?;
            tracing::warn!(tx_id = %tx.id, age_secs = now - tx.created_at, "reaped stuck pending transaction");
            reaped.push(tx.id);
        }

        metrics::counter!("money_sweeper_reaper_reaped_total").increment(reaped.len() as u64);
        metrics::gauge!("money_sweeper_reaper_scanned").set(pending.len() as f64);
        Ok(ReaperReport {
            scanned: pending.len(),
            reaped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use money_core::clock::FixedClock;
    use money_core::escrow::MoneyEventType;
    use money_core::ledger::{Direction, LedgerEntry, LedgerTxStatus};
    use money_core::money::Money;

    fn balanced_entries() -> Vec<LedgerEntry> {
        vec![
            LedgerEntry {
                account_id: money_core::ids::LedgerAccountId::new(),
                direction: Direction::Debit,
                amount: Money::from_cents(500).unwrap(),
            },
            LedgerEntry {
                account_id: money_core::ids::LedgerAccountId::new(),
                direction: Direction::Credit,
                amount: Money::from_cents(500).unwrap(),
            },
        ]
    }

    #[test]
    fn pending_transaction_past_threshold_with_no_mirror_row_is_reaped() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let ledger = Arc::new(LedgerStore::open(&db).unwrap());
        let mirror = Arc::new(OutboundMirror::open(&db).unwrap());
        let clock = Arc::new(FixedClock::at(chrono::Utc.timestamp_opt(2000, 0).unwrap()));

        let tx = ledger
            .prepare_transaction(MoneyEventType::HoldEscrow, "evt_stuck".into(), balanced_entries(), 1000)
            .unwrap();

        let reaper = PendingTransactionReaper::new(ledger.clone(), mirror, 300, clock);
        let report = reaper.sweep().unwrap();

        assert_eq!(report.reaped, vec![tx.id]);
        assert_eq!(ledger.get(tx.id).unwrap().unwrap().status, LedgerTxStatus::Failed);
    }

    #[test]
    fn pending_transaction_with_a_mirror_row_is_left_for_recovery() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let ledger = Arc::new(LedgerStore::open(&db).unwrap());
        let mirror = Arc::new(OutboundMirror::open(&db).unwrap());
        let clock = Arc::new(FixedClock::at(chrono::Utc.timestamp_opt(2000, 0).unwrap()));

        let tx = ledger
            .prepare_transaction(MoneyEventType::HoldEscrow, "evt_recorded".into(), balanced_entries(), 1000)
            .unwrap();
        mirror
            .record(
                "evt_recorded",
                &money_engine::processor::ProcessorEffect {
                    payment_intent_id: Some("pi_1".into()),
                    charge_id: None,
                    transfer_id: None,
                },
                1500,
            )
            .unwrap();

        let reaper = PendingTransactionReaper::new(ledger.clone(), mirror, 300, clock);
        let report = reaper.sweep().unwrap();

        assert!(report.reaped.is_empty());
        assert_eq!(ledger.get(tx.id).unwrap().unwrap().status, LedgerTxStatus::Pending);
    }
}
