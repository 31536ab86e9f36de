//! Kill-Switch (spec §4.9): process-wide freeze mirrored to a durable
//! store with a local in-process fallback. `is_active()` returns true if
//! either is set, so a brief storage hiccup never un-freezes a live
//! incident. Grounded in the teacher's `once_cell` static pattern for
//! process-wide state (`chronx_core`'s various `OnceCell` lookups) and in
//! `AuthPolicy`'s small-state-struct-with-explicit-transitions shape.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillSwitchReason {
    LedgerDrift,
    StripeOutage,
    IdentityFraudSpike,
    ManualOverride,
    SagaRetryExhaustion,
}

impl KillSwitchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            KillSwitchReason::LedgerDrift => "LEDGER_DRIFT",
            KillSwitchReason::StripeOutage => "STRIPE_OUTAGE",
            KillSwitchReason::IdentityFraudSpike => "IDENTITY_FRAUD_SPIKE",
            KillSwitchReason::ManualOverride => "MANUAL_OVERRIDE",
            KillSwitchReason::SagaRetryExhaustion => "SAGA_RETRY_EXHAUSTION",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KillSwitchState {
    pub active: bool,
    pub reason: Option<KillSwitchReason>,
    pub triggered_at: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KillSwitchAuditEvent {
    pub active: bool,
    pub reason: Option<KillSwitchReason>,
    pub at: i64,
}

/// Process-wide local fallback. A `sled` write can fail or stall during an
/// outage; the local flag is the one piece of legitimate global mutable
/// state this kernel carries (spec §9).
static LOCAL_FLAG: AtomicBool = AtomicBool::new(false);
static LOCAL_REASON: Lazy<RwLock<Option<KillSwitchReason>>> = Lazy::new(|| RwLock::new(None));

const META_KEY: &str = "kill_switch_state";

pub struct KillSwitch {
    meta: sled::Tree,
    audit: sled::Tree,
}

impl KillSwitch {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            meta: money_store::db::open_tree(db, "kill_switch_meta")?,
            audit: money_store::db::open_tree(db, "kill_switch_audit")?,
        })
    }

    pub fn is_active(&self) -> bool {
        if LOCAL_FLAG.load(Ordering::SeqCst) {
            return true;
        }
        match get_typed::<KillSwitchState>(&self.meta, META_KEY) {
            Ok(Some(state)) => state.active,
            _ => false,
        }
    }

    pub fn trigger(&self, reason: KillSwitchReason, now: i64) -> Result<(), MoneyError> {
        LOCAL_FLAG.store(true, Ordering::SeqCst);
        *LOCAL_REASON.write().expect("lock poisoned") = Some(reason);

        let state = KillSwitchState {
            active: true,
            reason: Some(reason),
            triggered_at: Some(now),
        };
        put_typed(&self.meta, META_KEY, &state)?;
        self.append_audit(true, Some(reason), now)?;
        metrics::counter!("money_killswitch_triggered_total").increment(1);
        tracing::warn!(reason = reason.as_str(), "kill-switch triggered");
        Ok(())
    }

    pub fn resolve(&self, now: i64) -> Result<(), MoneyError> {
        LOCAL_FLAG.store(false, Ordering::SeqCst);
        *LOCAL_REASON.write().expect("lock poisoned") = None;

        let state = KillSwitchState {
            active: false,
            reason: None,
            triggered_at: None,
        };
        put_typed(&self.meta, META_KEY, &state)?;
        self.append_audit(false, None, now)?;
        metrics::counter!("money_killswitch_resolved_total").increment(1);
        tracing::info!("kill-switch resolved");
        Ok(())
    }

    fn append_audit(
        &self,
        active: bool,
        reason: Option<KillSwitchReason>,
        at: i64,
    ) -> Result<(), MoneyError> {
        let id = money_store::codec::next_id(&self.audit, "next_audit_id")?;
        let event = KillSwitchAuditEvent {
            active,
            reason,
            at,
        };
        put_typed(&self.audit, id.to_be_bytes(), &event)
    }

    pub fn current_reason(&self) -> Option<KillSwitchReason> {
        *LOCAL_REASON.read().expect("lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    #[test]
    fn trigger_then_resolve_round_trips_active_flag() {
        let db = db();
        let ks = KillSwitch::open(&db).unwrap();
        assert!(!ks.is_active());
        ks.trigger(KillSwitchReason::ManualOverride, 1000).unwrap();
        assert!(ks.is_active());
        ks.resolve(1000).unwrap();
        assert!(!ks.is_active());
    }

    #[test]
    fn reason_is_retrievable_while_active() {
        let db = db();
        let ks = KillSwitch::open(&db).unwrap();
        ks.trigger(KillSwitchReason::StripeOutage, 1000).unwrap();
        assert_eq!(ks.current_reason(), Some(KillSwitchReason::StripeOutage));
        ks.resolve(1000).unwrap();
    }
}
