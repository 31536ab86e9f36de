//! MoneyStateLock: the single row that authoritatively represents a task's
//! escrow state (spec §3, §4.1). Terminal-state handling follows the
//! `is_terminal()` idiom of `chronx_core::account::TimeLockStatus`.

use serde::{Deserialize, Serialize};

use crate::error::MoneyError;
use crate::ids::TaskId;
use crate::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowState {
    Initial,
    Held,
    Released,
    Refunded,
    PartialRefund,
    /// Reserved, not reachable by any transition in this kernel — see
    /// SPEC_FULL.md §4's Open Question resolution. Kept so data written
    /// under a predecessor policy remains readable.
    LockedDispute,
    PendingDispute,
    Upheld,
}

impl EscrowState {
    /// Terminal states accept no further transitions (spec §3 invariant).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EscrowState::Released
                | EscrowState::Refunded
                | EscrowState::PartialRefund
                | EscrowState::Upheld
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoneyEventType {
    HoldEscrow,
    ReleasePayout,
    RefundEscrow,
    ForceRefund,
    DisputeOpen,
    ResolveRefund,
    ResolveUpheld,
}

/// The fixed transition table from spec §4.1. Returns the destination state,
/// or an error if `(from, event)` has no entry (fail-closed invariant
/// violation) or `from` is already terminal.
pub fn next_state(
    task_id: TaskId,
    from: EscrowState,
    event: MoneyEventType,
    full_refund: bool,
) -> Result<EscrowState, MoneyError> {
    use EscrowState::*;
    use MoneyEventType::*;

    if from.is_terminal() {
        return Err(MoneyError::TerminalState {
            escrow_id: task_id_to_escrow(task_id),
        });
    }

    let to = match (from, event) {
        (Initial, HoldEscrow) => Held,
        (Held, ReleasePayout) => Released,
        (Held, RefundEscrow) => {
            if full_refund {
                Refunded
            } else {
                PartialRefund
            }
        }
        (Held, DisputeOpen) => PendingDispute,
        (PendingDispute, ResolveRefund) => Refunded,
        (PendingDispute, ResolveUpheld) => Upheld,
        (Released, ForceRefund) => Refunded,
        _ => {
            return Err(MoneyError::InvalidTransition {
                escrow_id: task_id_to_escrow(task_id),
            })
        }
    };
    Ok(to)
}

/// The set of events legal from a given state — surfaced to callers as
/// `next_allowed` on `MoneyStateLock` (spec §3).
pub fn allowed_events(from: EscrowState) -> &'static [MoneyEventType] {
    use EscrowState::*;
    use MoneyEventType::*;

    match from {
        Initial => &[HoldEscrow],
        Held => &[ReleasePayout, RefundEscrow, DisputeOpen],
        PendingDispute => &[ResolveRefund, ResolveUpheld],
        Released => &[ForceRefund],
        Refunded | PartialRefund | Upheld | LockedDispute => &[],
    }
}

// EscrowId is a distinct id type in `crate::ids`, but the escrow is
// 1:1 with its task (spec §3: "one per Task"), so lock rows are keyed by
// TaskId and this helper produces the matching EscrowId for error reporting.
fn task_id_to_escrow(task_id: TaskId) -> crate::ids::EscrowId {
    crate::ids::EscrowId::from_uuid(task_id.as_uuid())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoneyStateLock {
    pub task_id: TaskId,
    pub state: EscrowState,
    pub payment_intent_id: Option<String>,
    pub charge_id: Option<String>,
    pub transfer_id: Option<String>,
    pub refund_id: Option<String>,
    /// Monotonically increasing; only ever incremented (spec §3 invariant).
    pub version: u64,
    pub last_transition_at: i64,
    /// Frozen at creation; immutable thereafter (spec §3 invariant).
    pub amount: Money,
}

impl MoneyStateLock {
    pub fn new(task_id: TaskId, amount: Money, created_at: i64) -> Self {
        Self {
            task_id,
            state: EscrowState::Initial,
            payment_intent_id: None,
            charge_id: None,
            transfer_id: None,
            refund_id: None,
            version: 0,
            last_transition_at: created_at,
            amount,
        }
    }

    pub fn next_allowed(&self) -> &'static [MoneyEventType] {
        allowed_events(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid() -> TaskId {
        TaskId::new()
    }

    #[test]
    fn initial_hold_escrow_reaches_held() {
        let t = tid();
        let to = next_state(t, EscrowState::Initial, MoneyEventType::HoldEscrow, true).unwrap();
        assert_eq!(to, EscrowState::Held);
    }

    #[test]
    fn held_release_payout_reaches_released() {
        let t = tid();
        let to = next_state(t, EscrowState::Held, MoneyEventType::ReleasePayout, true).unwrap();
        assert_eq!(to, EscrowState::Released);
    }

    #[test]
    fn held_refund_full_reaches_refunded_partial_reaches_partial_refund() {
        let t = tid();
        let full = next_state(t, EscrowState::Held, MoneyEventType::RefundEscrow, true).unwrap();
        assert_eq!(full, EscrowState::Refunded);
        let partial =
            next_state(t, EscrowState::Held, MoneyEventType::RefundEscrow, false).unwrap();
        assert_eq!(partial, EscrowState::PartialRefund);
    }

    #[test]
    fn dispute_then_resolve_refund_or_uphold() {
        let t = tid();
        let pd = next_state(t, EscrowState::Held, MoneyEventType::DisputeOpen, true).unwrap();
        assert_eq!(pd, EscrowState::PendingDispute);
        let refunded =
            next_state(t, pd, MoneyEventType::ResolveRefund, true).unwrap();
        assert_eq!(refunded, EscrowState::Refunded);
        let upheld = next_state(t, pd, MoneyEventType::ResolveUpheld, true).unwrap();
        assert_eq!(upheld, EscrowState::Upheld);
    }

    #[test]
    fn released_force_refund_reaches_refunded() {
        let t = tid();
        let to =
            next_state(t, EscrowState::Released, MoneyEventType::ForceRefund, true).unwrap();
        assert_eq!(to, EscrowState::Refunded);
    }

    #[test]
    fn terminal_states_reject_every_event() {
        let t = tid();
        for terminal in [
            EscrowState::Released,
            EscrowState::Refunded,
            EscrowState::PartialRefund,
            EscrowState::Upheld,
        ] {
            let err = next_state(t, terminal, MoneyEventType::ReleasePayout, true).unwrap_err();
            assert!(matches!(err, MoneyError::TerminalState { .. }));
        }
    }

    #[test]
    fn unlisted_pair_is_invalid_transition() {
        let t = tid();
        let err =
            next_state(t, EscrowState::Initial, MoneyEventType::ReleasePayout, true).unwrap_err();
        assert!(matches!(err, MoneyError::InvalidTransition { .. }));
    }

    #[test]
    fn allowed_events_matches_transition_table() {
        assert_eq!(
            allowed_events(EscrowState::Held),
            &[
                MoneyEventType::ReleasePayout,
                MoneyEventType::RefundEscrow,
                MoneyEventType::DisputeOpen
            ]
        );
        assert!(allowed_events(EscrowState::Refunded).is_empty());
        assert!(allowed_events(EscrowState::LockedDispute).is_empty());
    }
}
