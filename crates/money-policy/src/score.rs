//! Shadow-score ledger (spec §4.7): a bounded score per user with an
//! append-only event log. Deltas are deterministic per
//! [`ScoreEventSource`] and drawn from `money-core::constants`, mirroring
//! how `chronx_core::constants::RECOVERY_VERIFIER_THRESHOLD` is the single
//! source of truth `chronx-recovery` reads from rather than hand-coding
//! `3` at call sites.

use money_core::constants::{
    SCORE_DEFAULT, SCORE_DELTA_DAILY_DECAY, SCORE_DELTA_DISPUTE_LOST, SCORE_DELTA_FRAUD_FLAG,
    SCORE_DELTA_TASK_COMPLETED_5STAR,
};
use money_core::ids::UserId;
use money_core::score::{clamp_score, ScoreEventSource, ShadowScoreEvent};
use money_core::MoneyError;
use money_store::codec::{get_typed, next_id, put_typed};

pub struct ScoreStore {
    current: sled::Tree,
    events: sled::Tree,
}

fn delta_for_source(source: ScoreEventSource, manual_delta: Option<f64>) -> Result<f64, MoneyError> {
    match source {
        ScoreEventSource::DisputeLost => Ok(SCORE_DELTA_DISPUTE_LOST),
        ScoreEventSource::FraudFlag => Ok(SCORE_DELTA_FRAUD_FLAG),
        ScoreEventSource::TaskCompleted5Star => Ok(SCORE_DELTA_TASK_COMPLETED_5STAR),
        ScoreEventSource::DailyDecay => Ok(SCORE_DELTA_DAILY_DECAY),
        ScoreEventSource::Manual => manual_delta.ok_or_else(|| {
            MoneyError::Other("manual score event requires an explicit delta".into())
        }),
    }
}

impl ScoreStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            current: money_store::db::open_tree(db, "shadow_score_current")?,
            events: money_store::db::open_tree(db, "shadow_score_events")?,
        })
    }

    /// Current score, defaulting every user in at `SCORE_DEFAULT` the way
    /// `MoneyStateLock` is absent (not zero) before a task is ever funded.
    pub fn current_score(&self, user_id: UserId) -> Result<f64, MoneyError> {
        Ok(get_typed::<f64>(&self.current, user_id.as_uuid().as_bytes())?.unwrap_or(SCORE_DEFAULT))
    }

    pub fn apply_event(
        &self,
        user_id: UserId,
        source: ScoreEventSource,
        reason: impl Into<String>,
        manual_delta: Option<f64>,
        now: i64,
    ) -> Result<ShadowScoreEvent, MoneyError> {
        let delta = delta_for_source(source, manual_delta)?;
        let before = self.current_score(user_id)?;
        let after = clamp_score(before + delta);

        let event = ShadowScoreEvent {
            user_id,
            delta,
            reason: reason.into(),
            source,
            score_before: before,
            score_after: after,
            created_at: now,
        };

        put_typed(&self.current, user_id.as_uuid().as_bytes(), &after)?;
        let event_id = next_id(&self.events, "next_score_event_id")?;
        let mut key = user_id.as_uuid().as_bytes().to_vec();
        key.extend_from_slice(&event_id.to_be_bytes());
        put_typed(&self.events, key, &event)?;

        tracing::info!(
            user_id = %user_id,
            delta,
            before,
            after,
            reason = %event.reason,
            "shadow score event applied"
        );
        Ok(event)
    }

    pub fn events_for_user(&self, user_id: UserId) -> Result<Vec<ShadowScoreEvent>, MoneyError> {
        let prefix = user_id.as_uuid().as_bytes().to_vec();
        let mut out = Vec::new();
        for item in self.events.scan_prefix(prefix) {
            let (_, bytes) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
            out.push(money_store::codec::decode(&bytes)?);
        }
        Ok(out)
    }

    /// All current scores, used by the daily-decay sweeper to iterate every
    /// user who has ever had a score event recorded.
    pub fn all_scored_users(&self) -> Result<Vec<UserId>, MoneyError> {
        let mut out = Vec::new();
        for item in self.current.iter() {
            let (key, _) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
            if key.len() == 16 {
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(&key);
                out.push(UserId::from_uuid(uuid::Uuid::from_bytes(bytes)));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    #[test]
    fn new_user_defaults_to_score_default() {
        let store = ScoreStore::open(&db()).unwrap();
        assert_eq!(store.current_score(UserId::new()).unwrap(), SCORE_DEFAULT);
    }

    #[test]
    fn dispute_lost_applies_fixed_negative_delta() {
        let store = ScoreStore::open(&db()).unwrap();
        let user = UserId::new();
        let event = store
            .apply_event(user, ScoreEventSource::DisputeLost, "dispute #1 lost", None, 1000)
            .unwrap();
        assert_eq!(event.delta, SCORE_DELTA_DISPUTE_LOST);
        assert_eq!(store.current_score(user).unwrap(), SCORE_DEFAULT - 15.0);
    }

    #[test]
    fn score_clamps_at_zero_after_repeated_penalties() {
        let store = ScoreStore::open(&db()).unwrap();
        let user = UserId::new();
        for i in 0..10 {
            store
                .apply_event(
                    user,
                    ScoreEventSource::FraudFlag,
                    format!("flag {i}"),
                    None,
                    1000 + i,
                )
                .unwrap();
        }
        assert_eq!(store.current_score(user).unwrap(), 0.0);
    }

    #[test]
    fn manual_event_without_delta_is_rejected() {
        let store = ScoreStore::open(&db()).unwrap();
        let err = store
            .apply_event(UserId::new(), ScoreEventSource::Manual, "admin note", None, 1000)
            .unwrap_err();
        assert!(matches!(err, MoneyError::Other(_)));
    }

    #[test]
    fn events_for_user_are_appended_in_order() {
        let store = ScoreStore::open(&db()).unwrap();
        let user = UserId::new();
        store
            .apply_event(user, ScoreEventSource::TaskCompleted5Star, "r1", None, 1000)
            .unwrap();
        store
            .apply_event(user, ScoreEventSource::TaskCompleted5Star, "r2", None, 1001)
            .unwrap();
        let events = store.events_for_user(user).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].reason, "r1");
        assert_eq!(events[1].reason, "r2");
    }
}
