//! Outbox Event Publisher + mail/SMS send-intent types (spec §3, §4.8).

use serde::{Deserialize, Serialize};

use crate::ids::{EmailOutboxId, OutboxEventId, SmsOutboxId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxStatus {
    Pending,
    Claimed,
    Done,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEventType {
    EscrowFunded,
    EscrowReleased,
    EscrowRefunded,
    DisputeOpened,
    IdentityVerified,
}

impl DomainEventType {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            DomainEventType::EscrowFunded => "escrow.funded",
            DomainEventType::EscrowReleased => "escrow.released",
            DomainEventType::EscrowRefunded => "escrow.refunded",
            DomainEventType::DisputeOpened => "dispute.opened",
            DomainEventType::IdentityVerified => "identity.verified",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: OutboxEventId,
    pub event_type: DomainEventType,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_version: u32,
    /// Unique per (event_type, aggregate_id, version) — spec §4.8.
    pub idempotency_key: String,
    pub payload: serde_json::Value,
    pub queue_name: String,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub claimed_at: Option<i64>,
    pub processed_at: Option<i64>,
    pub created_at: i64,
    /// Earliest time a failed row may be reclaimed, set by the Worker
    /// Framework's backoff policy. Absent for rows never yet retried.
    #[serde(default)]
    pub next_attempt_at: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendStatus {
    Pending,
    Sending,
    Sent,
    Failed,
    Suppressed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailOutbox {
    pub id: EmailOutboxId,
    pub to_address: String,
    pub subject: String,
    pub body: String,
    pub status: SendStatus,
    pub provider_msg_id: Option<String>,
    pub attempts: u32,
    pub idempotency_key: String,
    pub created_at: i64,
    #[serde(default)]
    pub next_attempt_at: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmsOutbox {
    pub id: SmsOutboxId,
    pub to_number: String,
    pub body: String,
    pub status: SendStatus,
    pub provider_msg_id: Option<String>,
    pub attempts: u32,
    pub idempotency_key: String,
    pub created_at: i64,
    #[serde(default)]
    pub next_attempt_at: Option<i64>,
}

/// Exponential backoff with a cap, used by the Worker Framework before
/// retrying a failed outbox/email/SMS row.
pub fn backoff_delay_secs(attempts: u32, base_secs: u64, max_secs: u64) -> u64 {
    let exp = base_secs.saturating_mul(1u64 << attempts.min(20));
    exp.min(max_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_then_caps() {
        assert_eq!(backoff_delay_secs(0, 2, 600), 2);
        assert_eq!(backoff_delay_secs(1, 2, 600), 4);
        assert_eq!(backoff_delay_secs(2, 2, 600), 8);
        assert_eq!(backoff_delay_secs(20, 2, 600), 600);
    }

    #[test]
    fn event_type_wire_strings_match_spec() {
        assert_eq!(DomainEventType::EscrowFunded.as_wire_str(), "escrow.funded");
        assert_eq!(
            DomainEventType::EscrowReleased.as_wire_str(),
            "escrow.released"
        );
    }
}
