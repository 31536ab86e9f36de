//! Reality-mirror Backfill (spec §4.5): lists processor events delivered in
//! the last `REALITY_MIRROR_BACKFILL_WINDOW_SECS`, and for each one the
//! webhook ingestor finished dispatching, verifies the corresponding Money
//! Engine side recorded it as processed. A processor event with no matching
//! `money_events_processed` row means the engine's own copy of reality
//! diverged from the processor's — a page-worthy critical, not a retry.
//!
//! Correlation has no shared id to join on directly: the processor names
//! its events by its own id (`evt_...`), while the engine's `ExternalEventId`
//! is only ever recorded against the ledger transaction's `idempotency_key`
//! and mirrored into `OutboundMirror` under the processor reference
//! (payment intent / charge / transfer id) the engine itself received back.
//! So the join path is processor event id → payload's processor reference →
//! `OutboundMirror` row (keyed by that reference) → its `idempotency_key`,
//! which *is* the engine's `ExternalEventId` in string form.

use std::collections::HashMap;
use std::sync::Arc;

use money_core::clock::Clock;
use money_core::ids::ExternalEventId;
use money_core::MoneyError;
use money_engine::mirror::OutboundMirror;
use money_engine::processed::ProcessedEvents;
use money_webhook::store::ProcessorEventStore;

pub struct BackfillReport {
    pub scanned: usize,
    /// Processor event ids that could not be confirmed as recorded on the
    /// engine side — every one of these is an operator-facing critical.
    pub unconfirmed: Vec<String>,
}

pub struct RealityMirrorBackfill {
    processor_events: Arc<ProcessorEventStore>,
    mirror: Arc<OutboundMirror>,
    processed: Arc<ProcessedEvents>,
    window_secs: i64,
    clock: Arc<dyn Clock>,
}

impl RealityMirrorBackfill {
    pub fn new(
        processor_events: Arc<ProcessorEventStore>,
        mirror: Arc<OutboundMirror>,
        processed: Arc<ProcessedEvents>,
        window_secs: i64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            processor_events,
            mirror,
            processed,
            window_secs,
            clock,
        }
    }

    /// Index every mirror row by whichever processor reference it carries,
    /// so each processor event can be looked up in one pass.
    fn mirror_index(&self) -> Result<HashMap<String, String>, MoneyError> {
        let mut idx = HashMap::new();
        for row in self.mirror.all()? {
            for reference in [&row.payment_intent_id, &row.charge_id, &row.transfer_id] {
                if let Some(reference) = reference {
                    idx.insert(reference.clone(), row.idempotency_key.clone());
                }
            }
        }
        Ok(idx)
    }

    pub fn sweep(&self) -> Result<BackfillReport, MoneyError> {
        let now = self.clock.now_unix();
        let since = now - self.window_secs;
        let events = self.processor_events.recent_since(since)?;
        let idx = self.mirror_index()?;
        let mut unconfirmed = Vec::new();

        for event in &events {
            if event.processed_at.is_none() {
                // Still in flight or parked unclaimed; not this sweeper's job.
                continue;
            }
            let reference = event.payload.get("id").and_then(|v| v.as_str());
            let confirmed = reference
                .and_then(|r| idx.get(r))
                .and_then(|idem_key| ExternalEventId::parse(idem_key).ok())
                .map(|external_event_id| self.processed.get(external_event_id))
                .transpose()?
                .flatten()
                .is_some();

            if !confirmed {
                tracing::error!(event_id = %event.event_id, event_type = %event.event_type, "reality-mirror backfill: no matching processed row for dispatched processor event");
                unconfirmed.push(event.event_id.clone());
            }
        }

        metrics::gauge!("money_sweeper_backfill_unconfirmed").set(unconfirmed.len() as f64);
        Ok(BackfillReport {
            scanned: events.len(),
            unconfirmed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use money_core::clock::FixedClock;
    use money_core::ids::TaskId;
    use money_engine::processor::ProcessorEffect;
    use money_webhook::store::DispatchResult;

    fn clock_at(secs: i64) -> Arc<dyn Clock> {
        Arc::new(FixedClock::at(chrono::Utc.timestamp_opt(secs, 0).unwrap()))
    }

    #[test]
    fn dispatched_event_with_a_processed_row_is_confirmed() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let events = Arc::new(ProcessorEventStore::open(&db).unwrap());
        let mirror = Arc::new(OutboundMirror::open(&db).unwrap());
        let processed = Arc::new(ProcessedEvents::open(&db).unwrap());

        events
            .ingest("evt_1", "payment_intent.succeeded", serde_json::json!({"id": "pi_1"}), 1000)
            .unwrap();
        events.claim("evt_1", 1000).unwrap();
        events.mark_processed("evt_1", DispatchResult::Success, 1000).unwrap();

        let external_event_id = ExternalEventId::new();
        mirror
            .record(
                &external_event_id.to_string(),
                &ProcessorEffect {
                    payment_intent_id: Some("pi_1".into()),
                    charge_id: None,
                    transfer_id: None,
                },
                1000,
            )
            .unwrap();
        processed.mark_processed(external_event_id, TaskId::new(), 1000).unwrap();

        let sweeper = RealityMirrorBackfill::new(events, mirror, processed, 3600, clock_at(2000));
        let report = sweeper.sweep().unwrap();

        assert_eq!(report.scanned, 1);
        assert!(report.unconfirmed.is_empty());
    }

    #[test]
    fn dispatched_event_with_no_processed_row_is_flagged() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let events = Arc::new(ProcessorEventStore::open(&db).unwrap());
        let mirror = Arc::new(OutboundMirror::open(&db).unwrap());
        let processed = Arc::new(ProcessedEvents::open(&db).unwrap());

        events
            .ingest("evt_2", "payment_intent.succeeded", serde_json::json!({"id": "pi_orphan"}), 1000)
            .unwrap();
        events.claim("evt_2", 1000).unwrap();
        events.mark_processed("evt_2", DispatchResult::Success, 1000).unwrap();

        let sweeper = RealityMirrorBackfill::new(events, mirror, processed, 3600, clock_at(2000));
        let report = sweeper.sweep().unwrap();

        assert_eq!(report.unconfirmed, vec!["evt_2".to_string()]);
    }

    #[test]
    fn events_outside_the_lookback_window_are_not_scanned() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let events = Arc::new(ProcessorEventStore::open(&db).unwrap());
        let mirror = Arc::new(OutboundMirror::open(&db).unwrap());
        let processed = Arc::new(ProcessedEvents::open(&db).unwrap());

        events
            .ingest("evt_old", "payment_intent.succeeded", serde_json::json!({"id": "pi_old"}), 100)
            .unwrap();
        events.claim("evt_old", 100).unwrap();
        events.mark_processed("evt_old", DispatchResult::Success, 100).unwrap();

        let sweeper = RealityMirrorBackfill::new(events, mirror, processed, 3600, clock_at(10_000));
        let report = sweeper.sweep().unwrap();

        assert_eq!(report.scanned, 0);
    }
}
