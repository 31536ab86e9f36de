//! sled-backed persistence for the money-flow kernel. [`Store`] owns the
//! entity families shared across every crate (tasks, money locks, disputes,
//! leases, idempotency records); sibling crates open their own named trees
//! on the same underlying `sled::Db` via [`Store::db`].

pub mod codec;
pub mod db;
pub mod lease;

pub use db::Store;
pub use lease::{LeaseGuard, LeaseManager};
