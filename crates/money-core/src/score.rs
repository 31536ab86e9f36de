//! Policy Gate / shadow-score types (spec §3, §4.7).

use serde::{Deserialize, Serialize};

use crate::constants::{
    SCORE_BAND_DEGRADED_THRESHOLD, SCORE_BAND_FULL_THRESHOLD, SCORE_BAND_LIMITED_THRESHOLD,
    SCORE_MAX, SCORE_MIN,
};
use crate::ids::UserId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustBand {
    Full,
    Limited,
    Degraded,
    Invisible,
}

impl std::fmt::Display for TrustBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrustBand::Full => "FULL",
            TrustBand::Limited => "LIMITED",
            TrustBand::Degraded => "DEGRADED",
            TrustBand::Invisible => "INVISIBLE",
        };
        write!(f, "{s}")
    }
}

/// Band thresholds transition exactly at 25/50/75 (spec §8 property 10).
/// A score exactly at a threshold belongs to the higher band (`>=`).
pub fn band_for_score(score: f64) -> TrustBand {
    if score >= SCORE_BAND_FULL_THRESHOLD {
        TrustBand::Full
    } else if score >= SCORE_BAND_LIMITED_THRESHOLD {
        TrustBand::Limited
    } else if score >= SCORE_BAND_DEGRADED_THRESHOLD {
        TrustBand::Degraded
    } else {
        TrustBand::Invisible
    }
}

/// Clamp a score into [SCORE_MIN, SCORE_MAX] — the score is bounded per
/// spec §4.7 ("A bounded score per user in [0, 100]").
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(SCORE_MIN, SCORE_MAX)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreEventSource {
    DisputeLost,
    FraudFlag,
    TaskCompleted5Star,
    DailyDecay,
    Manual,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShadowScoreEvent {
    pub user_id: UserId,
    pub delta: f64,
    pub reason: String,
    pub source: ScoreEventSource,
    pub score_before: f64,
    pub score_after: f64,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_transition_exactly_at_thresholds() {
        assert_eq!(band_for_score(75.0), TrustBand::Full);
        assert_eq!(band_for_score(74.999), TrustBand::Limited);
        assert_eq!(band_for_score(50.0), TrustBand::Limited);
        assert_eq!(band_for_score(49.999), TrustBand::Degraded);
        assert_eq!(band_for_score(25.0), TrustBand::Degraded);
        assert_eq!(band_for_score(24.999), TrustBand::Invisible);
    }

    #[test]
    fn clamp_bounds_to_zero_and_hundred() {
        assert_eq!(clamp_score(-10.0), 0.0);
        assert_eq!(clamp_score(250.0), 100.0);
        assert_eq!(clamp_score(42.0), 42.0);
    }
}
