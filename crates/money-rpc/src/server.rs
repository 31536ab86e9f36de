//! The RPC server: `RpcServerState` holds `Arc` handles to every domain
//! service a method needs, `rpc_err` maps a `MoneyError` to a jsonrpsee
//! `ErrorObject` carrying its stable `HX###` wire code (spec §6, §7), and
//! `RpcServer::start` wires CORS the way `chronx_rpc::server::RpcServer`
//! does (`tower::ServiceBuilder` layered into jsonrpsee's http middleware).

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::{Any, CorsLayer};

use money_core::dispute::DisputeResolution;
use money_core::escrow::MoneyEventType;
use money_core::idempotency::IdempotencyRecord;
use money_core::identity::VerificationChannel;
use money_core::ids::{EscrowId, ExternalEventId, ProofRequestId, ProofSubmissionId, TaskId, UserId};
use money_core::money::Money;
use money_core::proof::{ProofMetadata, ProofState};
use money_core::{Clock, MoneyError};
use money_engine::{HandleContext, HandleOutcome, MoneyEngine};
use money_identity::IdentityVerificationService;
use money_killswitch::{KillSwitch, KillSwitchReason};
use money_outbox::OutboxStore;
use money_proof::ProofEngine;
use money_store::db::Store;

use crate::api::MoneyApiServer;
use crate::types::{
    RpcEscrowResult, RpcHealth, RpcIdentityStatus, RpcProofMetadata, RpcProofSubmission, RpcVerificationSent,
};

/// Last-run timestamps for the three saga sweepers (spec §4.5), updated by
/// `money-node`'s sweeper loop after each pass and surfaced read-only by
/// `getHealth`.
#[derive(Clone, Debug, Default)]
pub struct SweeperHealth {
    pub reaper_last_run: Option<i64>,
    pub mirror_recovery_last_run: Option<i64>,
    pub backfill_last_run: Option<i64>,
}

pub struct RpcServerState {
    engine: Arc<MoneyEngine>,
    proof: Arc<ProofEngine>,
    identity: Arc<IdentityVerificationService>,
    killswitch: Arc<KillSwitch>,
    outbox: Arc<OutboxStore>,
    sweeper_health: Arc<RwLock<SweeperHealth>>,
    clock: Arc<dyn Clock>,
    store: Arc<Store>,
}

impl RpcServerState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Arc<MoneyEngine>,
        proof: Arc<ProofEngine>,
        identity: Arc<IdentityVerificationService>,
        killswitch: Arc<KillSwitch>,
        outbox: Arc<OutboxStore>,
        sweeper_health: Arc<RwLock<SweeperHealth>>,
        clock: Arc<dyn Clock>,
        store: Arc<Store>,
    ) -> Self {
        Self {
            engine,
            proof,
            identity,
            killswitch,
            outbox,
            sweeper_health,
            clock,
            store,
        }
    }
}

/// Request-level idempotency (spec §2 component 1, §3 `IdempotencyRecord`,
/// §8 property 5): the first call for a given key runs `fut` and snapshots
/// its response; every later call with the same key returns that snapshot
/// verbatim without touching the engine at all, rather than racing it again
/// and surfacing whatever `DuplicateIgnored` happens to map to.
async fn with_idempotency<T, Fut>(store: &Store, idempotency_key: String, clock: &dyn Clock, fut: Fut) -> RpcResult<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
    Fut: std::future::Future<Output = RpcResult<T>>,
{
    if let Some(record) = store.get_idempotency_record(&idempotency_key).map_err(rpc_err)? {
        let snapshot: T = serde_json::from_value(record.response_snapshot)
            .map_err(|e| rpc_err(MoneyError::Other(format!("corrupt idempotency snapshot for {idempotency_key}: {e}"))))?;
        return Ok(snapshot);
    }

    let result = fut.await?;
    let snapshot = serde_json::to_value(&result)
        .map_err(|e| rpc_err(MoneyError::Other(format!("failed to snapshot response for {idempotency_key}: {e}"))))?;
    store
        .put_idempotency_record(&IdempotencyRecord {
            key: idempotency_key,
            response_snapshot: snapshot,
            created_at: clock.now_unix(),
        })
        .map_err(rpc_err)?;
    Ok(result)
}

pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any);
        let middleware = tower::ServiceBuilder::new().layer(cors);

        let server = Server::builder()
            .set_http_middleware(middleware)
            .build(addr)
            .await?;

        let module = self.into_rpc();
        let handle = server.start(module);
        tracing::info!(%addr, "rpc server listening");
        Ok(handle)
    }
}

/// Maps a domain error to its stable wire code rather than a generic
/// JSON-RPC error number (spec §6: "each surfaces with a stable code").
fn rpc_err(err: MoneyError) -> ErrorObject<'static> {
    ErrorObject::owned(-32000, format!("{}: {err}", err.code()), None::<()>)
}

fn parse_uuid_id<F, T>(raw: &str, ctor: F) -> RpcResult<T>
where
    F: Fn(uuid::Uuid) -> T,
{
    uuid::Uuid::from_str(raw)
        .map(ctor)
        .map_err(|e| rpc_err(MoneyError::Other(format!("invalid id {raw:?}: {e}"))))
}

fn require_idempotency_key(key: &str) -> RpcResult<()> {
    if key.trim().is_empty() {
        return Err(rpc_err(MoneyError::IdempotencyKeyRequired));
    }
    Ok(())
}

#[async_trait]
impl MoneyApiServer for RpcServer {
    async fn fund_escrow(
        &self,
        task_id: String,
        poster_id: String,
        payment_method_ref: String,
        amount_cents: i64,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult> {
        require_idempotency_key(&idempotency_key)?;
        let key = idempotency_key.clone();
        with_idempotency(&self.state.store, key, self.state.clock.as_ref(), async move {
            let task_id: TaskId = parse_uuid_id(&task_id, TaskId::from_uuid)?;
            let poster_id: UserId = parse_uuid_id(&poster_id, UserId::from_uuid)?;
            let amount = Money::from_cents(amount_cents).map_err(rpc_err)?;
            let now = self.state.clock.now_unix();

            let ctx = HandleContext {
                actor_id: poster_id,
                is_admin: false,
                poster_id,
                hustler_id: None,
                amount: Some(amount),
                payout_amount: None,
                refund_amount: None,
                payment_method_ref: Some(payment_method_ref),
                event_time: now,
            };
            let external_event_id = external_event_id_for(&idempotency_key)?;
            let outcome = self.state
                .engine
                .handle(task_id, MoneyEventType::HoldEscrow, ctx, external_event_id)
                .await
                .map_err(rpc_err)?;
            escrow_result(task_id, outcome)
        })
        .await
    }

    async fn release_escrow(
        &self,
        escrow_id: String,
        actor_id: String,
        is_admin: bool,
        poster_id: String,
        hustler_id: String,
        transfer_ref: Option<String>,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult> {
        require_idempotency_key(&idempotency_key)?;
        let key = idempotency_key.clone();
        with_idempotency(&self.state.store, key, self.state.clock.as_ref(), async move {
            let task_id = task_id_from_escrow(&escrow_id)?;
            let actor_id: UserId = parse_uuid_id(&actor_id, UserId::from_uuid)?;
            let poster_id: UserId = parse_uuid_id(&poster_id, UserId::from_uuid)?;
            let hustler_id: UserId = parse_uuid_id(&hustler_id, UserId::from_uuid)?;
            let now = self.state.clock.now_unix();

            let ctx = HandleContext {
                actor_id,
                is_admin,
                poster_id,
                hustler_id: Some(hustler_id),
                amount: None,
                payout_amount: None,
                refund_amount: None,
                payment_method_ref: transfer_ref,
                event_time: now,
            };
            let external_event_id = external_event_id_for(&idempotency_key)?;
            let outcome = self.state
                .engine
                .handle(task_id, MoneyEventType::ReleasePayout, ctx, external_event_id)
                .await
                .map_err(rpc_err)?;
            escrow_result(task_id, outcome)
        })
        .await
    }

    async fn refund_escrow(
        &self,
        escrow_id: String,
        actor_id: String,
        is_admin: bool,
        poster_id: String,
        hustler_id: Option<String>,
        amount_cents: Option<i64>,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult> {
        require_idempotency_key(&idempotency_key)?;
        let key = idempotency_key.clone();
        with_idempotency(&self.state.store, key, self.state.clock.as_ref(), async move {
            let task_id = task_id_from_escrow(&escrow_id)?;
            let actor_id: UserId = parse_uuid_id(&actor_id, UserId::from_uuid)?;
            let poster_id: UserId = parse_uuid_id(&poster_id, UserId::from_uuid)?;
            let hustler_id = hustler_id.map(|h| parse_uuid_id(&h, UserId::from_uuid)).transpose()?;
            let refund_amount = amount_cents.map(Money::from_cents).transpose().map_err(rpc_err)?;
            let now = self.state.clock.now_unix();

            let ctx = HandleContext {
                actor_id,
                is_admin,
                poster_id,
                hustler_id,
                amount: None,
                payout_amount: None,
                refund_amount,
                payment_method_ref: None,
                event_time: now,
            };
            let external_event_id = external_event_id_for(&idempotency_key)?;
            let outcome = self.state
                .engine
                .handle(task_id, MoneyEventType::RefundEscrow, ctx, external_event_id)
                .await
                .map_err(rpc_err)?;
            escrow_result(task_id, outcome)
        })
        .await
    }

    async fn open_dispute(
        &self,
        task_id: String,
        actor_id: String,
        poster_id: String,
        hustler_id: Option<String>,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult> {
        require_idempotency_key(&idempotency_key)?;
        let key = idempotency_key.clone();
        with_idempotency(&self.state.store, key, self.state.clock.as_ref(), async move {
            let task_id: TaskId = parse_uuid_id(&task_id, TaskId::from_uuid)?;
            let actor_id: UserId = parse_uuid_id(&actor_id, UserId::from_uuid)?;
            let poster_id: UserId = parse_uuid_id(&poster_id, UserId::from_uuid)?;
            let hustler_id = hustler_id.map(|h| parse_uuid_id(&h, UserId::from_uuid)).transpose()?;
            let now = self.state.clock.now_unix();

            let ctx = HandleContext {
                actor_id,
                is_admin: false,
                poster_id,
                hustler_id,
                amount: None,
                payout_amount: None,
                refund_amount: None,
                payment_method_ref: None,
                event_time: now,
            };
            let external_event_id = external_event_id_for(&idempotency_key)?;
            let outcome = self.state
                .engine
                .handle(task_id, MoneyEventType::DisputeOpen, ctx, external_event_id)
                .await
                .map_err(rpc_err)?;
            escrow_result(task_id, outcome)
        })
        .await
    }

    async fn resolve_dispute(
        &self,
        task_id: String,
        actor_id: String,
        poster_id: String,
        hustler_id: Option<String>,
        resolution: String,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult> {
        require_idempotency_key(&idempotency_key)?;
        let key = idempotency_key.clone();
        with_idempotency(&self.state.store, key, self.state.clock.as_ref(), async move {
            let task_id: TaskId = parse_uuid_id(&task_id, TaskId::from_uuid)?;
            let actor_id: UserId = parse_uuid_id(&actor_id, UserId::from_uuid)?;
            let poster_id: UserId = parse_uuid_id(&poster_id, UserId::from_uuid)?;
            let hustler_id = hustler_id.map(|h| parse_uuid_id(&h, UserId::from_uuid)).transpose()?;
            let now = self.state.clock.now_unix();

            let event_type = match parse_resolution(&resolution)? {
                DisputeResolution::Upheld => MoneyEventType::ResolveUpheld,
                DisputeResolution::Refunded | DisputeResolution::Split => MoneyEventType::ResolveRefund,
                DisputeResolution::None => {
                    return Err(rpc_err(MoneyError::Other("resolution must not be none".into())))
                }
            };

            let ctx = HandleContext {
                actor_id,
                is_admin: true,
                poster_id,
                hustler_id,
                amount: None,
                payout_amount: None,
                refund_amount: None,
                payment_method_ref: None,
                event_time: now,
            };
            let external_event_id = external_event_id_for(&idempotency_key)?;
            let outcome = self.state.engine.handle(task_id, event_type, ctx, external_event_id).await.map_err(rpc_err)?;
            escrow_result(task_id, outcome)
        })
        .await
    }

    async fn submit_proof(
        &self,
        request_id: String,
        file_base64: String,
        mime: String,
        metadata: RpcProofMetadata,
    ) -> RpcResult<RpcProofSubmission> {
        let request_id: ProofRequestId = parse_uuid_id(&request_id, ProofRequestId::from_uuid)?;
        let file_bytes = decode_base64(&file_base64)?;
        let now = self.state.clock.now_unix();

        let submission = self.state
            .proof
            .submit_proof(
                request_id,
                &file_bytes,
                mime,
                ProofMetadata {
                    exif: metadata.exif,
                    resolution: metadata.resolution,
                    capture_time: metadata.capture_time,
                    gps: metadata.gps,
                },
                now,
            )
            .map_err(rpc_err)?;
        Ok(proof_submission_dto(&submission))
    }

    async fn finalize_proof(&self, submission_id: String, decision: String) -> RpcResult<RpcProofSubmission> {
        let submission_id: ProofSubmissionId = parse_uuid_id(&submission_id, ProofSubmissionId::from_uuid)?;
        let decision = parse_proof_state(&decision)?;
        let now = self.state.clock.now_unix();
        let submission = self.state.proof.finalize_proof(submission_id, decision, now).map_err(rpc_err)?;
        Ok(proof_submission_dto(&submission))
    }

    async fn send_verification_code(&self, user_id: String, channel: String, target: String) -> RpcResult<RpcVerificationSent> {
        let user_id: UserId = parse_uuid_id(&user_id, UserId::from_uuid)?;
        let channel = parse_channel(&channel)?;
        let id = self.state.identity.send_code(user_id, channel, &target).map_err(rpc_err)?;
        Ok(RpcVerificationSent {
            verification_id: id.to_string(),
        })
    }

    async fn verify_code(&self, user_id: String, channel: String, code: String) -> RpcResult<RpcIdentityStatus> {
        let user_id: UserId = parse_uuid_id(&user_id, UserId::from_uuid)?;
        let channel = parse_channel(&channel)?;
        let record = self.state.identity.verify_code(user_id, channel, &code).map_err(rpc_err)?;
        Ok(RpcIdentityStatus {
            user_id: record.user_id.to_string(),
            email_verified: record.email_verified_at.is_some(),
            sms_verified: record.sms_verified_at.is_some(),
            fully_verified: record.is_fully_verified(),
        })
    }

    async fn trigger_kill_switch(&self, reason: String) -> RpcResult<()> {
        let reason = parse_killswitch_reason(&reason)?;
        let now = self.state.clock.now_unix();
        self.state.killswitch.trigger(reason, now).map_err(rpc_err)
    }

    async fn resolve_kill_switch(&self) -> RpcResult<()> {
        let now = self.state.clock.now_unix();
        self.state.killswitch.resolve(now).map_err(rpc_err)
    }

    async fn force_refund(
        &self,
        escrow_id: String,
        actor_id: String,
        poster_id: String,
        hustler_id: Option<String>,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult> {
        require_idempotency_key(&idempotency_key)?;
        let key = idempotency_key.clone();
        with_idempotency(&self.state.store, key, self.state.clock.as_ref(), async move {
            let task_id = task_id_from_escrow(&escrow_id)?;
            let actor_id: UserId = parse_uuid_id(&actor_id, UserId::from_uuid)?;
            let poster_id: UserId = parse_uuid_id(&poster_id, UserId::from_uuid)?;
            let hustler_id = hustler_id.map(|h| parse_uuid_id(&h, UserId::from_uuid)).transpose()?;
            let now = self.state.clock.now_unix();

            let ctx = HandleContext {
                actor_id,
                is_admin: true,
                poster_id,
                hustler_id,
                amount: None,
                payout_amount: None,
                refund_amount: None,
                payment_method_ref: None,
                event_time: now,
            };
            let external_event_id = external_event_id_for(&idempotency_key)?;
            let outcome = self.state
                .engine
                .handle(task_id, MoneyEventType::ForceRefund, ctx, external_event_id)
                .await
                .map_err(rpc_err)?;
            escrow_result(task_id, outcome)
        })
        .await
    }

    async fn get_health(&self) -> RpcResult<RpcHealth> {
        let sweepers = self.state.sweeper_health.read().expect("lock poisoned").clone();
        Ok(RpcHealth {
            kill_switch_active: self.state.killswitch.is_active(),
            kill_switch_reason: self.state.killswitch.current_reason().map(|r| r.as_str().to_string()),
            outbox_dlq_depth: self.state.outbox.dlq_depth().map_err(rpc_err)?,
            reaper_last_run: sweepers.reaper_last_run,
            mirror_recovery_last_run: sweepers.mirror_recovery_last_run,
            backfill_last_run: sweepers.backfill_last_run,
        })
    }
}

fn task_id_from_escrow(escrow_id: &str) -> RpcResult<TaskId> {
    let escrow_id: EscrowId = parse_uuid_id(escrow_id, EscrowId::from_uuid)?;
    Ok(TaskId::from_uuid(escrow_id.as_uuid()))
}

fn escrow_result(task_id: TaskId, outcome: HandleOutcome) -> RpcResult<RpcEscrowResult> {
    let escrow_id = EscrowId::from_uuid(task_id.as_uuid());
    match outcome {
        HandleOutcome::Success { state, .. } => Ok(RpcEscrowResult {
            escrow_id: escrow_id.to_string(),
            state: format!("{state:?}"),
        }),
        HandleOutcome::DuplicateIgnored => Ok(RpcEscrowResult {
            escrow_id: escrow_id.to_string(),
            state: "duplicate_ignored".to_string(),
        }),
    }
}

fn proof_submission_dto(submission: &money_core::proof::ProofSubmission) -> RpcProofSubmission {
    RpcProofSubmission {
        submission_id: submission.id.to_string(),
        request_id: submission.request_id.to_string(),
        task_id: submission.task_id.to_string(),
        state: format!("{:?}", submission.state),
        file_hash: submission.file_hash.to_hex(),
        cross_task_reuse_flagged: submission.state == ProofState::Escalated,
    }
}

/// Idempotency keys and external event ids are the same string throughout
/// this kernel (see `money_engine::engine`'s `idem_key = external_event_id.to_string()`),
/// so an RPC-supplied key can be parsed straight into one.
fn external_event_id_for(idempotency_key: &str) -> RpcResult<ExternalEventId> {
    uuid::Uuid::from_str(idempotency_key)
        .map(ExternalEventId::from_uuid)
        .or_else(|_| Ok(ExternalEventId::from_uuid(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, idempotency_key.as_bytes()))))
}

fn parse_channel(raw: &str) -> RpcResult<VerificationChannel> {
    match raw {
        "email" => Ok(VerificationChannel::Email),
        "sms" => Ok(VerificationChannel::Sms),
        other => Err(rpc_err(MoneyError::Other(format!("unknown channel {other:?}")))),
    }
}

fn parse_resolution(raw: &str) -> RpcResult<DisputeResolution> {
    match raw {
        "refunded" => Ok(DisputeResolution::Refunded),
        "upheld" => Ok(DisputeResolution::Upheld),
        "split" => Ok(DisputeResolution::Split),
        other => Err(rpc_err(MoneyError::Other(format!("unknown resolution {other:?}")))),
    }
}

fn parse_proof_state(raw: &str) -> RpcResult<ProofState> {
    match raw {
        "verified" => Ok(ProofState::Verified),
        "rejected" => Ok(ProofState::Rejected),
        "locked" => Ok(ProofState::Locked),
        other => Err(rpc_err(MoneyError::Other(format!("unknown proof decision {other:?}")))),
    }
}

fn parse_killswitch_reason(raw: &str) -> RpcResult<KillSwitchReason> {
    match raw {
        "LEDGER_DRIFT" => Ok(KillSwitchReason::LedgerDrift),
        "STRIPE_OUTAGE" => Ok(KillSwitchReason::StripeOutage),
        "IDENTITY_FRAUD_SPIKE" => Ok(KillSwitchReason::IdentityFraudSpike),
        "MANUAL_OVERRIDE" => Ok(KillSwitchReason::ManualOverride),
        "SAGA_RETRY_EXHAUSTION" => Ok(KillSwitchReason::SagaRetryExhaustion),
        other => Err(rpc_err(MoneyError::Other(format!("unknown kill-switch reason {other:?}")))),
    }
}

fn decode_base64(raw: &str) -> RpcResult<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(raw)
        .map_err(|e| rpc_err(MoneyError::Other(format!("invalid base64 file payload: {e}"))))
}
