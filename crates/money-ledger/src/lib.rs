//! Double-entry ledger (spec §4.2): accounts, prepare/commit/fail
//! transactions, balance reporting. Built on `money-store`'s shared
//! `sled::Db`, opening its own `ledger_accounts`/`ledger_transactions`/
//! `ledger_balances` trees the way `money-proof`/`money-outbox` open
//! theirs — see DESIGN.md.

pub mod accounts;
pub mod balance;
pub mod transactions;

pub use accounts::AccountsStore;
pub use transactions::{ExternalRefs, LedgerStore};
