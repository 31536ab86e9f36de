//! Converts a raw signed running sum into a spec §3 account balance:
//! "debits − credits for asset accounts and credits − debits for
//! liability accounts." Balance queries read committed rows only, which
//! holds automatically here since [`LedgerStore::commit_transaction`] is
//! the only writer to the balances tree.

use money_core::ledger::LedgerAccountType;

pub fn signed_balance_to_account_balance(account_type: LedgerAccountType, raw_signed: i64) -> i64 {
    if account_type.is_liability() {
        -raw_signed
    } else {
        raw_signed
    }
}
