//! Per-event-type dispatch (spec §4.4). `WebhookHandler` is the trait
//! boundary the ingestor calls through — it knows nothing about the Money
//! Engine's internals, only that a claimed event of a known type gets
//! handed to whoever wires this crate up (`money-node`), the same pattern
//! as `money_engine::processor::PaymentProcessor`.

use std::sync::Arc;

use money_core::MoneyError;

use crate::store::{DispatchResult, ProcessorEventStore};

/// Event types this kernel's webhook surface actually dispatches.
/// Billing-style events (`subscription.*`, `checkout.session.completed`)
/// from the source this spec was distilled from are out of scope — this
/// kernel's domain is escrow funding/release/refund, not subscriptions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessorEventType {
    PaymentIntentSucceeded,
    PaymentIntentPaymentFailed,
    ChargeRefunded,
    TransferCreated,
    Unknown(String),
}

impl ProcessorEventType {
    pub fn parse(wire: &str) -> Self {
        match wire {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentPaymentFailed,
            "charge.refunded" => Self::ChargeRefunded,
            "transfer.created" => Self::TransferCreated,
            other => Self::Unknown(other.to_string()),
        }
    }
}

pub trait WebhookHandler: Send + Sync {
    fn handle(&self, event_type: &ProcessorEventType, payload: &serde_json::Value, now: i64) -> Result<(), MoneyError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched,
    Skipped,
    AlreadyClaimed,
}

pub struct WebhookIngestor {
    events: ProcessorEventStore,
    handler: Arc<dyn WebhookHandler>,
}

impl WebhookIngestor {
    pub fn new(db: &sled::Db, handler: Arc<dyn WebhookHandler>) -> Result<Self, MoneyError> {
        Ok(Self {
            events: ProcessorEventStore::open(db)?,
            handler,
        })
    }

    /// Verifies the signature, ingests (insert-or-ignore), atomically
    /// claims, and — on a fresh claim of a known type — dispatches.
    pub fn ingest_and_dispatch(
        &self,
        event_id: &str,
        event_type: &str,
        payload: serde_json::Value,
        signature_valid: bool,
        now: i64,
    ) -> Result<DispatchOutcome, MoneyError> {
        if !signature_valid {
            return Err(MoneyError::WebhookSignatureInvalid);
        }

        self.events.ingest(event_id, event_type, payload, now)?;
        let Some(claimed) = self.events.claim(event_id, now)? else {
            metrics::counter!("money_webhook_already_claimed_total").increment(1);
            return Ok(DispatchOutcome::AlreadyClaimed);
        };

        let parsed = ProcessorEventType::parse(event_type);
        if let ProcessorEventType::Unknown(wire) = &parsed {
            tracing::warn!(event_id, event_type = %wire, "unknown webhook type, skipping");
            self.events.mark_processed(event_id, DispatchResult::Skipped, now)?;
            return Ok(DispatchOutcome::Skipped);
        }

        match self.handler.handle(&parsed, &claimed.payload, now) {
            Ok(()) => {
                self.events.mark_processed(event_id, DispatchResult::Success, now)?;
                metrics::counter!("money_webhook_dispatched_total").increment(1);
                Ok(DispatchOutcome::Dispatched)
            }
            Err(e) => {
                self.events
                    .mark_processed(event_id, DispatchResult::Failed(e.to_string()), now)?;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CountingHandler {
        calls: Mutex<usize>,
    }

    impl WebhookHandler for CountingHandler {
        fn handle(&self, _event_type: &ProcessorEventType, _payload: &serde_json::Value, _now: i64) -> Result<(), MoneyError> {
            *self.calls.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn five_concurrent_deliveries_dispatch_exactly_once() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let handler = Arc::new(CountingHandler { calls: Mutex::new(0) });
        let ingestor = WebhookIngestor::new(&db, handler.clone()).unwrap();

        let mut outcomes = Vec::new();
        for _ in 0..5 {
            outcomes.push(
                ingestor
                    .ingest_and_dispatch(
                        "evt_1",
                        "payment_intent.succeeded",
                        serde_json::json!({"id": "pi_1"}),
                        true,
                        1000,
                    )
                    .unwrap(),
            );
        }
        assert_eq!(outcomes.iter().filter(|o| **o == DispatchOutcome::Dispatched).count(), 1);
        assert_eq!(*handler.calls.lock().unwrap(), 1);
    }

    #[test]
    fn unknown_event_type_is_skipped_not_retried() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let handler = Arc::new(CountingHandler { calls: Mutex::new(0) });
        let ingestor = WebhookIngestor::new(&db, handler.clone()).unwrap();
        let outcome = ingestor
            .ingest_and_dispatch("evt_2", "customer.subscription.created", serde_json::json!({}), true, 1000)
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert_eq!(*handler.calls.lock().unwrap(), 0);
    }

    #[test]
    fn invalid_signature_is_rejected_before_anything_is_persisted() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let handler = Arc::new(CountingHandler { calls: Mutex::new(0) });
        let ingestor = WebhookIngestor::new(&db, handler).unwrap();
        let err = ingestor
            .ingest_and_dispatch("evt_3", "payment_intent.succeeded", serde_json::json!({}), false, 1000)
            .unwrap_err();
        assert!(matches!(err, MoneyError::WebhookSignatureInvalid));
        assert!(ingestor.events.get("evt_3").unwrap().is_none());
    }
}
