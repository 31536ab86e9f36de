//! Outbox Event Publisher + Worker Framework (spec §4.8): domain events are
//! captured transactionally alongside the state change producing them and
//! drained by claim-based workers with exponential backoff and a DLQ.
//! Email/SMS send-intent queues share the same claim/backoff/DLQ shape.

pub mod events;
pub mod mail;
pub mod sms;
pub mod suppression;

pub use events::OutboxStore;
pub use mail::EmailOutboxStore;
pub use sms::SmsOutboxStore;
pub use suppression::SuppressionList;
