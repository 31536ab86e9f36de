//! Mirror-recovery Sweeper (spec §4.5): a ledger transaction stuck in
//! `pending` that DOES have an `OutboundMirror` row means the processor
//! call landed and was recorded, but the engine crashed before the Commit
//! phase flipped the transaction to `committed`. Finishing the commit with
//! the recorded effect is safe — `commit_transaction` is itself idempotent
//! on a transaction already past Pending (spec §8 property 4).

use std::sync::Arc;

use money_core::ids::LedgerTransactionId;
use money_core::MoneyError;
use money_engine::mirror::OutboundMirror;
use money_ledger::transactions::LedgerStore;

pub struct MirrorRecoveryReport {
    pub scanned: usize,
    pub recovered: Vec<LedgerTransactionId>,
}

pub struct MirrorRecoverySweeper {
    ledger: Arc<LedgerStore>,
    mirror: Arc<OutboundMirror>,
}

impl MirrorRecoverySweeper {
    pub fn new(ledger: Arc<LedgerStore>, mirror: Arc<OutboundMirror>) -> Self {
        Self { ledger, mirror }
    }

    pub fn sweep(&self) -> Result<MirrorRecoveryReport, MoneyError> {
        let pending = self.ledger.pending()?;
        let mut recovered = Vec::new();

        for tx in &pending {
            let Some(row) = self.mirror.get(&tx.idempotency_key)? else {
                continue;
            };
            self.ledger.commit_transaction(tx.id, row.as_effect())?;
            tracing::info!(tx_id = %tx.id, "recovered pending transaction from mirror row");
            recovered.push(tx.id);
        }

        metrics::counter!("money_sweeper_mirror_recovery_total").increment(recovered.len() as u64);
        Ok(MirrorRecoveryReport {
            scanned: pending.len(),
            recovered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use money_core::escrow::MoneyEventType;
    use money_core::ledger::{Direction, LedgerEntry, LedgerTxStatus};
    use money_core::money::Money;
    use money_engine::processor::ProcessorEffect;

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
    fn pending_transaction_with_a_mirror_row_is_committed() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let ledger = Arc::new(LedgerStore::open(&db).unwrap());
        let mirror = Arc::new(OutboundMirror::open(&db).unwrap());

        let tx = ledger
            .prepare_transaction(MoneyEventType::HoldEscrow, "evt_1".into(), balanced_entries(), 1000)
            .unwrap();
        mirror
            .record(
                "evt_1",
                &ProcessorEffect {
                    payment_intent_id: Some("pi_1".into()),
                    charge_id: None,
                    transfer_id: None,
                },
                1001,
            )
            .unwrap();

        let sweeper = MirrorRecoverySweeper::new(ledger.clone(), mirror);
        let report = sweeper.sweep().unwrap();

        assert_eq!(report.recovered, vec![tx.id]);
        let committed = ledger.get(tx.id).unwrap().unwrap();
        assert_eq!(committed.status, LedgerTxStatus::Committed);
        assert_eq!(committed.payment_intent_id.as_deref(), Some("pi_1"));
    }

    #[test]
    fn pending_transaction_without_a_mirror_row_is_left_alone() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let ledger = Arc::new(LedgerStore::open(&db).unwrap());
        let mirror = Arc::new(OutboundMirror::open(&db).unwrap());

        let tx = ledger
            .prepare_transaction(MoneyEventType::HoldEscrow, "evt_2".into(), balanced_entries(), 1000)
            .unwrap();

        let sweeper = MirrorRecoverySweeper::new(ledger.clone(), mirror);
        let report = sweeper.sweep().unwrap();

        assert!(report.recovered.is_empty());
        assert_eq!(ledger.get(tx.id).unwrap().unwrap().status, LedgerTxStatus::Pending);
    }
}
