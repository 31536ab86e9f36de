//! Read-side policy decisions, mirroring `chronx_recovery::query::RecoveryQuery`'s
//! shape: a thin wrapper holding a borrowed store, exposing yes/no and
//! filter-predicate queries instead of raw rows.

use money_core::ids::UserId;
use money_core::score::{band_for_score, TrustBand};
use money_core::MoneyError;

use crate::score::ScoreStore;

pub struct PolicyQuery<'a> {
    scores: &'a ScoreStore,
}

impl<'a> PolicyQuery<'a> {
    pub fn new(scores: &'a ScoreStore) -> Self {
        Self { scores }
    }

    pub fn band_for(&self, user_id: UserId) -> Result<TrustBand, MoneyError> {
        Ok(band_for_score(self.scores.current_score(user_id)?))
    }

    /// The Money Engine's release pre-check (spec §4.1, §4.7): a hustler
    /// banded below FULL is not eligible to receive a payout release.
    pub fn eligible_for_release(&self, hustler_id: UserId) -> Result<bool, MoneyError> {
        Ok(self.band_for(hustler_id)? == TrustBand::Full)
    }

    /// Feed-query filter predicate: anything below LIMITED is excluded from
    /// normal surfaces entirely.
    pub fn visible_in_feed(&self, user_id: UserId) -> Result<bool, MoneyError> {
        Ok(!matches!(self.band_for(user_id)?, TrustBand::Invisible))
    }
}
