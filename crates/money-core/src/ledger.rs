//! Shared double-entry ledger types (spec §3, §4.2). The prepare/commit/
//! fail API itself lives in `money-ledger`; this crate only owns the wire/
//! storage shapes so every crate can refer to them without depending on the
//! engine that mutates them.

use serde::{Deserialize, Serialize};

use crate::ids::{LedgerAccountId, LedgerTransactionId, UserId};
use crate::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerAccountType {
    UserReceivable,
    UserPayable,
    TaskEscrow,
    PlatformDisputeHold,
    PlatformRevenue,
    FeeAccount,
}

impl LedgerAccountType {
    /// Asset-like accounts compute balance as debits − credits; liability-
    /// like accounts compute credits − debits (spec §3).
    pub fn is_liability(&self) -> bool {
        matches!(
            self,
            LedgerAccountType::UserPayable | LedgerAccountType::PlatformRevenue
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: LedgerAccountId,
    pub owner_id: Option<UserId>,
    pub account_type: LedgerAccountType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Debit,
    Credit,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub account_id: LedgerAccountId,
    pub direction: Direction,
    pub amount: Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerTxStatus {
    Pending,
    Executing,
    Committed,
    Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: LedgerTransactionId,
    pub tx_type: crate::escrow::MoneyEventType,
    pub idempotency_key: String,
    pub status: LedgerTxStatus,
    pub entries: Vec<LedgerEntry>,
    pub payment_intent_id: Option<String>,
    pub charge_id: Option<String>,
    pub transfer_id: Option<String>,
    pub created_at: i64,
    pub fail_reason: Option<String>,
}

impl LedgerTransaction {
    /// Σdebits = Σcredits, the double-entry invariant (spec §3, §8 property 3).
    pub fn is_balanced(&self) -> bool {
        let debits: i64 = self
            .entries
            .iter()
            .filter(|e| e.direction == Direction::Debit)
            .map(|e| e.amount.cents())
            .sum();
        let credits: i64 = self
            .entries
            .iter()
            .filter(|e| e.direction == Direction::Credit)
            .map(|e| e.amount.cents())
            .sum();
        debits == credits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(account: LedgerAccountId, dir: Direction, cents: i64) -> LedgerEntry {
        LedgerEntry {
            account_id: account,
            direction: dir,
            amount: Money::from_cents(cents).unwrap(),
        }
    }

    #[test]
    fn balanced_transaction_reports_balanced() {
        let a = LedgerAccountId::new();
        let b = LedgerAccountId::new();
        let tx = LedgerTransaction {
            id: LedgerTransactionId::new(),
            tx_type: crate::escrow::MoneyEventType::HoldEscrow,
            idempotency_key: "evt_1".into(),
            status: LedgerTxStatus::Pending,
            entries: vec![
                entry(a, Direction::Debit, 5000),
                entry(b, Direction::Credit, 5000),
            ],
            payment_intent_id: None,
            charge_id: None,
            transfer_id: None,
            created_at: 0,
            fail_reason: None,
        };
        assert!(tx.is_balanced());
    }

    #[test]
    fn unbalanced_transaction_reports_unbalanced() {
        let a = LedgerAccountId::new();
        let b = LedgerAccountId::new();
        let tx = LedgerTransaction {
            id: LedgerTransactionId::new(),
            tx_type: crate::escrow::MoneyEventType::HoldEscrow,
            idempotency_key: "evt_2".into(),
            status: LedgerTxStatus::Pending,
            entries: vec![
                entry(a, Direction::Debit, 5000),
                entry(b, Direction::Credit, 4000),
            ],
            payment_intent_id: None,
            charge_id: None,
            transfer_id: None,
            created_at: 0,
            fail_reason: None,
        };
        assert!(!tx.is_balanced());
    }
}
