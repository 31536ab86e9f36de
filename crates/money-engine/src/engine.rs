//! The Money Engine (spec §4.1): `handle()` runs the fixed transition table
//! through Saga 3.0's three phases — Prepare (guards + ledger prepare under
//! a batch lease), Execute (the Outbound-Mirror-guarded processor call),
//! Commit (ledger commit, state lock update, processed-event + audit
//! insert, domain event emission, XP coupling). Mirrors the teacher's
//! `StateEngine::apply`'s staged-mutations-then-atomic-commit shape,
//! generalized to an external side-effect in the middle.

use std::sync::Arc;

use money_core::constants::XP_AWARD_ON_RELEASE;
use money_core::escrow::{next_state, EscrowState, MoneyEventType, MoneyStateLock};
use money_core::ids::{EscrowId, ExternalEventId, LedgerTransactionId, TaskId, UserId};
use money_core::ledger::{Direction, LedgerAccountType, LedgerEntry};
use money_core::money::Money;
use money_core::outbox::DomainEventType;
use money_core::{Clock, EngineConfig, MoneyError};

use money_killswitch::KillSwitch;
use money_ledger::accounts::AccountsStore;
use money_ledger::transactions::{ExternalRefs, LedgerStore};
use money_outbox::OutboxStore;
use money_policy::query::PolicyQuery;
use money_policy::score::ScoreStore;
use money_store::db::Store;
use money_store::lease::LeaseManager;

use crate::dlq::{DlqEntry, SagaDlq};
use crate::mirror::OutboundMirror;
use crate::processed::{AuditLog, AuditRow, ProcessedEvents};
use crate::processor::{HoldRequest, PaymentProcessor, ProcessorEffect, ReleaseRequest, RefundRequest};
use crate::xp::XpLedger;

/// Everything the caller of `handle()` knows that isn't already durable —
/// amounts, parties, authorization, and the event's logical time for the
/// Temporal Guard.
#[derive(Clone, Debug)]
pub struct HandleContext {
    pub actor_id: UserId,
    pub is_admin: bool,
    pub poster_id: UserId,
    pub hustler_id: Option<UserId>,
    /// Required on `HOLD_ESCROW`; on any other event, if present, must equal
    /// the lock's immutable amount (spec §3 invariant, §8 property 2).
    pub amount: Option<Money>,
    pub payout_amount: Option<Money>,
    /// `None` on a refund event means "full remaining amount".
    pub refund_amount: Option<Money>,
    pub payment_method_ref: Option<String>,
    pub event_time: i64,
}

#[derive(Clone, Debug)]
pub enum HandleOutcome {
    Success {
        state: EscrowState,
        lock: MoneyStateLock,
    },
    DuplicateIgnored,
}

pub struct MoneyEngine {
    store: Arc<Store>,
    accounts: AccountsStore,
    ledger: LedgerStore,
    killswitch: KillSwitch,
    scores: ScoreStore,
    outbox: OutboxStore,
    mirror: OutboundMirror,
    processed: ProcessedEvents,
    audit: AuditLog,
    dlq: SagaDlq,
    xp: Arc<dyn XpLedger>,
    processor: Arc<dyn PaymentProcessor>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl MoneyEngine {
    pub fn new(
        store: Arc<Store>,
        processor: Arc<dyn PaymentProcessor>,
        xp: Arc<dyn XpLedger>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MoneyError> {
        let db = store.db();
        Ok(Self {
            accounts: AccountsStore::open(&db)?,
            ledger: LedgerStore::open(&db)?,
            killswitch: KillSwitch::open(&db)?,
            scores: ScoreStore::open(&db)?,
            outbox: OutboxStore::open(&db)?,
            mirror: OutboundMirror::open(&db)?,
            processed: ProcessedEvents::open(&db)?,
            audit: AuditLog::open(&db)?,
            dlq: SagaDlq::open(&db)?,
            store,
            processor,
            xp,
            config,
            clock,
        })
    }

    pub fn dlq(&self) -> &SagaDlq {
        &self.dlq
    }

    pub async fn handle(
        &self,
        task_id: TaskId,
        event_type: MoneyEventType,
        ctx: HandleContext,
        external_event_id: ExternalEventId,
    ) -> Result<HandleOutcome, MoneyError> {
        if self.killswitch.is_active() {
            let reason = self
                .killswitch
                .current_reason()
                .map(|r| r.as_str().to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(MoneyError::KillSwitchActive { reason });
        }
        if self.processed.get(external_event_id)?.is_some() {
            return Ok(HandleOutcome::DuplicateIgnored);
        }

        let holder = format!("engine:{external_event_id}");
        let leases = LeaseManager::new(&self.store);
        let guards = leases.acquire_task_batch(
            task_id,
            ctx.poster_id,
            ctx.hustler_id,
            &holder,
            self.config.lease_ttl.as_secs(),
            &*self.clock,
        )?;

        let result = self.handle_leased(task_id, event_type, &ctx, external_event_id).await;

        for guard in &guards {
            let _ = leases.release(guard);
        }
        result
    }

    async fn handle_leased(
        &self,
        task_id: TaskId,
        event_type: MoneyEventType,
        ctx: &HandleContext,
        external_event_id: ExternalEventId,
    ) -> Result<HandleOutcome, MoneyError> {
        let now = self.clock.now_unix();
        let existing = self.store.get_money_lock(task_id)?;

        let (lock, is_new) = match existing {
            Some(l) => (l, false),
            None => {
                let amount = ctx
                    .amount
                    .ok_or_else(|| MoneyError::Other("amount required to open escrow".into()))?;
                (MoneyStateLock::new(task_id, amount, ctx.event_time), true)
            }
        };
        let from_state = lock.state;

        if !is_new && ctx.event_time <= lock.last_transition_at {
            return Err(MoneyError::TemporalGuardViolation {
                escrow_id: EscrowId::from_uuid(task_id.as_uuid()),
            });
        }

        self.check_authorization(task_id, event_type, ctx)?;

        if event_type == MoneyEventType::ReleasePayout {
            if self.store.has_active_dispute(task_id)? {
                return Err(MoneyError::ActiveDisputeBlocksRelease { task_id });
            }
            let hustler = ctx
                .hustler_id
                .ok_or_else(|| MoneyError::Other("hustler required for RELEASE_PAYOUT".into()))?;
            let query = PolicyQuery::new(&self.scores);
            if !query.eligible_for_release(hustler)? {
                let band = query.band_for(hustler)?;
                return Err(MoneyError::PolicyBlocked {
                    user_id: hustler.to_string(),
                    band: band.to_string(),
                });
            }
        }

        if !is_new {
            if let Some(amount) = ctx.amount {
                if amount != lock.amount {
                    return Err(MoneyError::AmountImmutable);
                }
            }
        }

        let full_refund = ctx.refund_amount.map(|a| a == lock.amount).unwrap_or(true);
        let to_state = next_state(task_id, from_state, event_type, full_refund)?;

        let entries = self.build_entries(event_type, ctx, &lock)?;
        let idem_key = external_event_id.to_string();
        let tx = self
            .ledger
            .prepare_transaction(event_type, idem_key.clone(), entries, now)?;

        match self
            .execute_and_commit(task_id, event_type, ctx, external_event_id, &lock, to_state, tx.id, &idem_key, now)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let _ = self.ledger.fail_transaction(tx.id, e.to_string());
                let _ = self.dlq.enqueue(DlqEntry {
                    ledger_transaction_id: tx.id,
                    task_id,
                    event_type,
                    external_event_id,
                    reason: e.to_string(),
                    created_at: now,
                });
                Err(e)
            }
        }
    }

    fn check_authorization(
        &self,
        task_id: TaskId,
        event_type: MoneyEventType,
        ctx: &HandleContext,
    ) -> Result<(), MoneyError> {
        use MoneyEventType::*;
        match event_type {
            HoldEscrow => {
                if ctx.actor_id != ctx.poster_id {
                    return Err(MoneyError::Unauthorized { task_id });
                }
            }
            DisputeOpen => {
                let is_party = ctx.actor_id == ctx.poster_id || Some(ctx.actor_id) == ctx.hustler_id;
                if !is_party && !ctx.is_admin {
                    return Err(MoneyError::Unauthorized { task_id });
                }
            }
            ReleasePayout | RefundEscrow => {
                if ctx.actor_id != ctx.poster_id && !ctx.is_admin {
                    return Err(MoneyError::Unauthorized { task_id });
                }
            }
            ForceRefund | ResolveRefund | ResolveUpheld => {
                if !ctx.is_admin {
                    return Err(MoneyError::Unauthorized { task_id });
                }
                let is_party = ctx.actor_id == ctx.poster_id || Some(ctx.actor_id) == ctx.hustler_id;
                if is_party {
                    return Err(MoneyError::ConflictOfInterest { task_id });
                }
            }
        }
        Ok(())
    }

    /// Entries per event, exactly as spec §4.1 lists them. `RESOLVE_UPHOLD`
    /// is not in the spec's bullet list (only state transition is named for
    /// it); it is treated as the dispute-hold account releasing to the
    /// hustler, the symmetric counterpart of `RESOLVE_REFUND` releasing the
    /// same hold back to the poster — see DESIGN.md.
    fn build_entries(
        &self,
        event_type: MoneyEventType,
        ctx: &HandleContext,
        lock: &MoneyStateLock,
    ) -> Result<Vec<LedgerEntry>, MoneyError> {
        use MoneyEventType::*;

        let poster_acc = self.accounts.get_or_create(Some(ctx.poster_id), LedgerAccountType::UserReceivable)?;
        let task_escrow_acc = self.accounts.get_or_create(None, LedgerAccountType::TaskEscrow)?;
        let dispute_hold_acc = self.accounts.get_or_create(None, LedgerAccountType::PlatformDisputeHold)?;

        match event_type {
            HoldEscrow => {
                let amount = ctx
                    .amount
                    .ok_or_else(|| MoneyError::Other("amount required for HOLD_ESCROW".into()))?;
                Ok(vec![
                    LedgerEntry { account_id: poster_acc.id, direction: Direction::Debit, amount },
                    LedgerEntry { account_id: task_escrow_acc.id, direction: Direction::Credit, amount },
                ])
            }
            ReleasePayout => {
                let hustler = ctx
                    .hustler_id
                    .ok_or_else(|| MoneyError::Other("hustler required for RELEASE_PAYOUT".into()))?;
                let hustler_acc = self.accounts.get_or_create(Some(hustler), LedgerAccountType::UserReceivable)?;
                let amount = ctx
                    .payout_amount
                    .ok_or_else(|| MoneyError::Other("payout_amount required for RELEASE_PAYOUT".into()))?;
                Ok(vec![
                    LedgerEntry { account_id: task_escrow_acc.id, direction: Direction::Debit, amount },
                    LedgerEntry { account_id: hustler_acc.id, direction: Direction::Credit, amount },
                ])
            }
            RefundEscrow | ForceRefund | ResolveRefund => {
                let amount = ctx.refund_amount.unwrap_or(lock.amount);
                Ok(vec![
                    LedgerEntry { account_id: task_escrow_acc.id, direction: Direction::Credit, amount },
                    LedgerEntry { account_id: poster_acc.id, direction: Direction::Debit, amount },
                ])
            }
            DisputeOpen => Ok(vec![
                LedgerEntry { account_id: task_escrow_acc.id, direction: Direction::Debit, amount: lock.amount },
                LedgerEntry { account_id: dispute_hold_acc.id, direction: Direction::Credit, amount: lock.amount },
            ]),
            ResolveUpheld => {
                let hustler = ctx
                    .hustler_id
                    .ok_or_else(|| MoneyError::Other("hustler required for RESOLVE_UPHOLD".into()))?;
                let hustler_acc = self.accounts.get_or_create(Some(hustler), LedgerAccountType::UserReceivable)?;
                Ok(vec![
                    LedgerEntry { account_id: dispute_hold_acc.id, direction: Direction::Debit, amount: lock.amount },
                    LedgerEntry { account_id: hustler_acc.id, direction: Direction::Credit, amount: lock.amount },
                ])
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_and_commit(
        &self,
        task_id: TaskId,
        event_type: MoneyEventType,
        ctx: &HandleContext,
        external_event_id: ExternalEventId,
        lock: &MoneyStateLock,
        to_state: EscrowState,
        tx_id: LedgerTransactionId,
        idem_key: &str,
        now: i64,
    ) -> Result<HandleOutcome, MoneyError> {
        let effect = if needs_processor_call(event_type) {
            if let Some(existing) = self.mirror.get(idem_key)? {
                existing.as_effect()
            } else {
                let fresh = self.call_processor(event_type, ctx, lock, idem_key).await?;
                self.mirror.record(idem_key, &fresh, now)?;
                fresh
            }
        } else {
            ProcessorEffect::default()
        };

        let refs = ExternalRefs {
            payment_intent_id: effect.payment_intent_id.clone(),
            charge_id: effect.charge_id.clone(),
            transfer_id: effect.transfer_id.clone(),
        };
        self.ledger.commit_transaction(tx_id, refs)?;

        let mut new_lock = lock.clone();
        new_lock.state = to_state;
        new_lock.version += 1;
        new_lock.last_transition_at = ctx.event_time;
        if let Some(pid) = effect.payment_intent_id.clone() {
            new_lock.payment_intent_id = Some(pid);
        }
        if let Some(cid) = effect.charge_id.clone() {
            if is_refund_event(event_type) {
                new_lock.refund_id = Some(cid.clone());
            }
            new_lock.charge_id = Some(cid);
        }
        if let Some(tid) = effect.transfer_id.clone() {
            new_lock.transfer_id = Some(tid);
        }
        self.store.put_money_lock(&new_lock)?;

        if let Err(e) = self.processed.mark_processed(external_event_id, task_id, now) {
            tracing::debug!(error = %e, "processed-event already recorded, continuing");
        }

        self.audit.append(AuditRow {
            task_id,
            event_type,
            from_state: lock.state,
            to_state,
            external_event_id,
            version: new_lock.version,
            created_at: now,
        })?;

        if let Some(domain_event) = domain_event_for(event_type) {
            let payload = serde_json::json!({
                "task_id": task_id.to_string(),
                "state": format!("{to_state:?}"),
                "amount_cents": lock.amount.cents(),
            });
            self.outbox.enqueue(
                domain_event,
                "task",
                task_id.to_string(),
                new_lock.version as u32,
                format!("{}:{}:{}", domain_event.as_wire_str(), task_id, new_lock.version),
                payload,
                "domain",
                now,
            )?;
        }

        if to_state == EscrowState::Released {
            if let Some(hustler) = ctx.hustler_id {
                let escrow_id = EscrowId::from_uuid(task_id.as_uuid());
                self.xp.award(escrow_id, hustler, XP_AWARD_ON_RELEASE, now)?;
            }
        }

        metrics::counter!("money_engine_transitions_total").increment(1);
        Ok(HandleOutcome::Success { state: to_state, lock: new_lock })
    }

    async fn call_processor(
        &self,
        event_type: MoneyEventType,
        ctx: &HandleContext,
        lock: &MoneyStateLock,
        idem_key: &str,
    ) -> Result<ProcessorEffect, MoneyError> {
        match event_type {
            MoneyEventType::HoldEscrow => {
                let amount = ctx
                    .amount
                    .ok_or_else(|| MoneyError::Other("amount required for HOLD_ESCROW".into()))?;
                let payment_method_ref = ctx
                    .payment_method_ref
                    .clone()
                    .ok_or_else(|| MoneyError::Other("payment_method_ref required for HOLD_ESCROW".into()))?;
                self.processor
                    .hold(HoldRequest {
                        idempotency_key: idem_key.to_string(),
                        amount,
                        payment_method_ref,
                    })
                    .await
            }
            MoneyEventType::ReleasePayout => {
                let amount = ctx
                    .payout_amount
                    .ok_or_else(|| MoneyError::Other("payout_amount required for RELEASE_PAYOUT".into()))?;
                self.processor
                    .release(ReleaseRequest {
                        idempotency_key: idem_key.to_string(),
                        payout_amount: amount,
                        payment_intent_id: lock.payment_intent_id.clone(),
                    })
                    .await
            }
            MoneyEventType::RefundEscrow | MoneyEventType::ForceRefund | MoneyEventType::ResolveRefund => {
                let amount = ctx.refund_amount.unwrap_or(lock.amount);
                self.processor
                    .refund(RefundRequest {
                        idempotency_key: idem_key.to_string(),
                        amount,
                        payment_intent_id: lock.payment_intent_id.clone(),
                        transfer_id: lock.transfer_id.clone(),
                    })
                    .await
            }
            MoneyEventType::DisputeOpen | MoneyEventType::ResolveUpheld => {
                unreachable!("guarded by needs_processor_call")
            }
        }
    }
}

fn needs_processor_call(event_type: MoneyEventType) -> bool {
    !matches!(event_type, MoneyEventType::DisputeOpen | MoneyEventType::ResolveUpheld)
}

fn is_refund_event(event_type: MoneyEventType) -> bool {
    matches!(
        event_type,
        MoneyEventType::RefundEscrow | MoneyEventType::ForceRefund | MoneyEventType::ResolveRefund
    )
}

fn domain_event_for(event_type: MoneyEventType) -> Option<DomainEventType> {
    match event_type {
        MoneyEventType::HoldEscrow => Some(DomainEventType::EscrowFunded),
        MoneyEventType::ReleasePayout => Some(DomainEventType::EscrowReleased),
        MoneyEventType::RefundEscrow | MoneyEventType::ForceRefund | MoneyEventType::ResolveRefund => {
            Some(DomainEventType::EscrowRefunded)
        }
        MoneyEventType::DisputeOpen => Some(DomainEventType::DisputeOpened),
        MoneyEventType::ResolveUpheld => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::FakeProcessor;
    use crate::xp::SledXpLedger;
    use money_core::FixedClock;

    fn engine_with_fake_processor() -> (MoneyEngine, Arc<FakeProcessor>) {
        let store = Arc::new(Store::open_temporary().unwrap());
        let db = store.db();
        let processor = Arc::new(FakeProcessor::new());
        let xp = Arc::new(SledXpLedger::open(&db).unwrap());
        let clock = Arc::new(FixedClock::at(
            chrono::DateTime::<chrono::Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let engine = MoneyEngine::new(
            store,
            processor.clone() as Arc<dyn PaymentProcessor>,
            xp,
            EngineConfig::default(),
            clock,
        )
        .unwrap();
        (engine, processor)
    }

    fn base_ctx(poster: UserId, hustler: UserId) -> HandleContext {
        HandleContext {
            actor_id: poster,
            is_admin: false,
            poster_id: poster,
            hustler_id: Some(hustler),
            amount: None,
            payout_amount: None,
            refund_amount: None,
            payment_method_ref: None,
            event_time: 1000,
        }
    }

    #[tokio::test]
    async fn happy_path_fund_then_release_awards_xp_once() {
        let (engine, processor) = engine_with_fake_processor();
        let task = TaskId::new();
        let poster = UserId::new();
        let hustler = UserId::new();

        let mut fund_ctx = base_ctx(poster, hustler);
        fund_ctx.amount = Some(Money::from_cents(5000).unwrap());
        fund_ctx.payment_method_ref = Some("pm_card_visa".into());
        fund_ctx.event_time = 1000;
        let funded = engine
            .handle(task, MoneyEventType::HoldEscrow, fund_ctx, ExternalEventId::new())
            .await
            .unwrap();
        assert!(matches!(funded, HandleOutcome::Success { state: EscrowState::Held, .. }));

        let mut release_ctx = base_ctx(poster, hustler);
        release_ctx.payout_amount = Some(Money::from_cents(5000).unwrap());
        release_ctx.event_time = 2000;
        let released = engine
            .handle(task, MoneyEventType::ReleasePayout, release_ctx, ExternalEventId::new())
            .await
            .unwrap();
        match released {
            HandleOutcome::Success { state, .. } => assert_eq!(state, EscrowState::Released),
            _ => panic!("expected success"),
        }

        assert_eq!(processor.call_count(), 2);
    }

    #[tokio::test]
    async fn duplicate_external_event_id_is_ignored() {
        let (engine, _processor) = engine_with_fake_processor();
        let task = TaskId::new();
        let poster = UserId::new();
        let hustler = UserId::new();
        let evt = ExternalEventId::new();

        let mut ctx = base_ctx(poster, hustler);
        ctx.amount = Some(Money::from_cents(1000).unwrap());
        ctx.payment_method_ref = Some("pm_card_visa".into());
        engine.handle(task, MoneyEventType::HoldEscrow, ctx.clone(), evt).await.unwrap();

        let again = engine.handle(task, MoneyEventType::HoldEscrow, ctx, evt).await.unwrap();
        assert!(matches!(again, HandleOutcome::DuplicateIgnored));
    }

    #[tokio::test]
    async fn non_poster_cannot_fund() {
        let (engine, _processor) = engine_with_fake_processor();
        let task = TaskId::new();
        let poster = UserId::new();
        let hustler = UserId::new();

        let mut ctx = base_ctx(poster, hustler);
        ctx.actor_id = hustler;
        ctx.amount = Some(Money::from_cents(1000).unwrap());
        ctx.payment_method_ref = Some("pm_card_visa".into());
        let err = engine
            .handle(task, MoneyEventType::HoldEscrow, ctx, ExternalEventId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MoneyError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn party_admin_force_refund_is_conflict_of_interest() {
        let (engine, _processor) = engine_with_fake_processor();
        let task = TaskId::new();
        let poster = UserId::new();
        let hustler = UserId::new();

        let mut fund_ctx = base_ctx(poster, hustler);
        fund_ctx.amount = Some(Money::from_cents(1000).unwrap());
        fund_ctx.payment_method_ref = Some("pm_card_visa".into());
        engine
            .handle(task, MoneyEventType::HoldEscrow, fund_ctx, ExternalEventId::new())
            .await
            .unwrap();

        let mut release_ctx = base_ctx(poster, hustler);
        release_ctx.payout_amount = Some(Money::from_cents(1000).unwrap());
        release_ctx.event_time = 1500;
        engine
            .handle(task, MoneyEventType::ReleasePayout, release_ctx, ExternalEventId::new())
            .await
            .unwrap();

        let mut refund_ctx = base_ctx(poster, hustler);
        refund_ctx.actor_id = poster;
        refund_ctx.is_admin = true;
        refund_ctx.event_time = 2000;
        let err = engine
            .handle(task, MoneyEventType::ForceRefund, refund_ctx, ExternalEventId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MoneyError::ConflictOfInterest { .. }));
    }

    /// Twenty callers race `ReleasePayout` on the same held escrow with
    /// distinct idempotency keys. The lease + row-lock + version check in
    /// `handle_leased` must let exactly one through to `Released`; the rest
    /// see a non-`Held` source state and fail rather than double-releasing.
    #[tokio::test]
    async fn twenty_concurrent_releases_exactly_one_succeeds() {
        let (engine, _processor) = engine_with_fake_processor();
        let engine = Arc::new(engine);
        let task = TaskId::new();
        let poster = UserId::new();
        let hustler = UserId::new();

        let mut fund_ctx = base_ctx(poster, hustler);
        fund_ctx.amount = Some(Money::from_cents(5000).unwrap());
        fund_ctx.payment_method_ref = Some("pm_card_visa".into());
        engine
            .handle(task, MoneyEventType::HoldEscrow, fund_ctx, ExternalEventId::new())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let engine = engine.clone();
            let mut ctx = base_ctx(poster, hustler);
            ctx.payout_amount = Some(Money::from_cents(5000).unwrap());
            ctx.event_time = 2000;
            handles.push(tokio::spawn(async move {
                engine
                    .handle(task, MoneyEventType::ReleasePayout, ctx, ExternalEventId::new())
                    .await
            }));
        }

        let mut succeeded = 0;
        let mut failed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(HandleOutcome::Success { state: EscrowState::Released, .. }) => succeeded += 1,
                Ok(_) => panic!("unexpected non-released success"),
                Err(_) => failed += 1,
            }
        }
        assert_eq!(succeeded, 1, "exactly one concurrent release should transition to Released");
        assert_eq!(failed, 19);
    }
}
