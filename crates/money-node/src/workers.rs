//! Worker Framework (spec §4.8): claim-based drain loops for the domain
//! event outbox and the mail/SMS send-intent queues, each with the same
//! claim → act → complete/fail-with-backoff shape the stores already
//! implement. This node links to no real mail/SMS provider; sending means
//! logging the delivery and marking the row complete, the way a sandboxed
//! worker would in the teacher's own dev-mode wiring.

use std::sync::Arc;
use std::time::Duration;

use money_core::clock::Clock;
use money_core::constants::{OUTBOX_BACKOFF_BASE_SECS, OUTBOX_BACKOFF_MAX_SECS, WORKER_CLAIM_BATCH_SIZE};
use money_outbox::{EmailOutboxStore, OutboxStore, SmsOutboxStore, SuppressionList};

pub struct Workers {
    pub outbox: Arc<OutboxStore>,
    pub mail: Arc<EmailOutboxStore>,
    pub sms: Arc<SmsOutboxStore>,
    pub suppression: Arc<SuppressionList>,
}

pub async fn run(workers: Workers, clock: Arc<dyn Clock>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let now = clock.now_unix();
        drain_domain_events(&workers, now);
        drain_mail(&workers, now);
        drain_sms(&workers, now);
    }
}

fn drain_domain_events(workers: &Workers, now: i64) {
    let claimed = match workers.outbox.claim_batch(WORKER_CLAIM_BATCH_SIZE, now) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!(error = %e, "outbox claim failed");
            return;
        }
    };
    for event in claimed {
        tracing::info!(event_id = %event.id, event_type = ?event.event_type, queue = %event.queue_name, "domain event dispatched");
        if let Err(e) = workers.outbox.complete(event.id, now) {
            tracing::error!(error = %e, event_id = %event.id, "outbox complete failed");
            let _ = workers
                .outbox
                .fail(event.id, OUTBOX_BACKOFF_BASE_SECS, OUTBOX_BACKOFF_MAX_SECS, now);
        }
    }
}

fn drain_mail(workers: &Workers, now: i64) {
    let claimed = match workers.mail.claim_batch(&workers.suppression, WORKER_CLAIM_BATCH_SIZE, now) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!(error = %e, "mail claim failed");
            return;
        }
    };
    for row in claimed {
        tracing::info!(to = %row.to_address, subject = %row.subject, "email sent");
        if let Err(e) = workers.mail.complete(row.id, format!("sandbox-{}", row.id)) {
            tracing::error!(error = %e, row_id = %row.id, "mail complete failed");
            let _ = workers
                .mail
                .fail(row.id, OUTBOX_BACKOFF_BASE_SECS, OUTBOX_BACKOFF_MAX_SECS, now);
        }
    }
}

fn drain_sms(workers: &Workers, now: i64) {
    let claimed = match workers.sms.claim_batch(&workers.suppression, WORKER_CLAIM_BATCH_SIZE, now) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!(error = %e, "sms claim failed");
            return;
        }
    };
    for row in claimed {
        tracing::info!(to = %row.to_number, "sms sent");
        if let Err(e) = workers.sms.complete(row.id, format!("sandbox-{}", row.id)) {
            tracing::error!(error = %e, row_id = %row.id, "sms complete failed");
            let _ = workers
                .sms
                .fail(row.id, OUTBOX_BACKOFF_BASE_SECS, OUTBOX_BACKOFF_MAX_SECS, now);
        }
    }
}
