//! Policy Gate / shadow-score (spec §4.7): append-only score events,
//! deterministic deltas, and band/eligibility queries consumed by the
//! Money Engine's release pre-check and by feed queries.

pub mod query;
pub mod score;

pub use query::PolicyQuery;
pub use score::ScoreStore;
