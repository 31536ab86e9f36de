//! XP coupling (invariant INV-1, spec §4.1): when a transition reaches
//! `released`, the engine awards XP to the hustler exactly once, keyed by
//! escrow id. `XpLedger` is a trait boundary so the Money Engine does not
//! depend on however the gamification system stores XP — only on the
//! uniqueness guarantee it must provide.

use money_core::ids::{EscrowId, UserId};
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

pub trait XpLedger: Send + Sync {
    /// Awards `amount` XP to `user_id` for `escrow_id`. Must be a no-op
    /// (not an error) on a duplicate call for the same `escrow_id` — the
    /// Money Engine calls this at-least-once from its own retry paths and
    /// relies on the ledger's own unique constraint to make it exactly-once.
    fn award(&self, escrow_id: EscrowId, user_id: UserId, amount: u64, now: i64) -> Result<bool, MoneyError>;
}

/// `sled`-backed ledger: a unique row per `escrow_id` is the INV-1 guard.
pub struct SledXpLedger {
    awards: sled::Tree,
}

impl SledXpLedger {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            awards: money_store::db::open_tree(db, "xp_awards")?,
        })
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct XpAward {
    user_id: UserId,
    amount: u64,
    awarded_at: i64,
}

impl XpLedger for SledXpLedger {
    fn award(&self, escrow_id: EscrowId, user_id: UserId, amount: u64, now: i64) -> Result<bool, MoneyError> {
        let key = escrow_id.as_uuid();
        if get_typed::<XpAward>(&self.awards, key.as_bytes())?.is_some() {
            return Ok(false);
        }
        put_typed(
            &self.awards,
            key.as_bytes(),
            &XpAward {
                user_id,
                amount,
                awarded_at: now,
            },
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_award_for_same_escrow_is_a_no_op() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let ledger = SledXpLedger::open(&db).unwrap();
        let escrow = EscrowId::new();
        let hustler = UserId::new();
        assert!(ledger.award(escrow, hustler, 500, 1000).unwrap());
        assert!(!ledger.award(escrow, hustler, 500, 2000).unwrap());
    }
}
