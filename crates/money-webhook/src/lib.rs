//! Webhook Ingestor (spec §4.4, §6): signature verification, the atomic
//! claim pattern over `processor_events`, and per-event-type dispatch.

pub mod dispatch;
pub mod store;

pub use dispatch::{DispatchOutcome, ProcessorEventType, WebhookHandler, WebhookIngestor};
pub use store::{DispatchResult, ProcessorEventRow, ProcessorEventStore};
