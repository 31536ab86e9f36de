//! The business-verb RPC trait (spec §6). Mirrors `chronx_rpc::api::ChronxApi`'s
//! shape: one `#[rpc(server, ...)]` trait, every method returning `RpcResult`,
//! with jsonrpsee generating the server dispatch and OpenRPC-ish method names.
//!
//! The spec's verb signatures are the business-level sketch; a real caller
//! also has to supply the parties a call concerns (actor, poster, hustler)
//! since this kernel has no session/identity layer of its own — the same
//! way `money_engine::HandleContext` already requires them. Every mutating
//! call carries an explicit `idempotency_key`, satisfying the "missing key
//! yields IDEMPOTENCY_KEY_REQUIRED" requirement without needing a
//! header-extraction layer.

use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcEscrowResult, RpcHealth, RpcIdentityStatus, RpcProofMetadata, RpcProofSubmission, RpcVerificationSent};

#[rpc(server, namespace = "money")]
pub trait MoneyApi {
    #[method(name = "fundEscrow")]
    async fn fund_escrow(
        &self,
        task_id: String,
        poster_id: String,
        payment_method_ref: String,
        amount_cents: i64,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult>;

    #[method(name = "releaseEscrow")]
    #[allow(clippy::too_many_arguments)]
    async fn release_escrow(
        &self,
        escrow_id: String,
        actor_id: String,
        is_admin: bool,
        poster_id: String,
        hustler_id: String,
        transfer_ref: Option<String>,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult>;

    #[method(name = "refundEscrow")]
    #[allow(clippy::too_many_arguments)]
    async fn refund_escrow(
        &self,
        escrow_id: String,
        actor_id: String,
        is_admin: bool,
        poster_id: String,
        hustler_id: Option<String>,
        amount_cents: Option<i64>,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult>;

    #[method(name = "openDispute")]
    async fn open_dispute(
        &self,
        task_id: String,
        actor_id: String,
        poster_id: String,
        hustler_id: Option<String>,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult>;

    #[method(name = "resolveDispute")]
    #[allow(clippy::too_many_arguments)]
    async fn resolve_dispute(
        &self,
        task_id: String,
        actor_id: String,
        poster_id: String,
        hustler_id: Option<String>,
        resolution: String,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult>;

    #[method(name = "submitProof")]
    async fn submit_proof(
        &self,
        request_id: String,
        file_base64: String,
        mime: String,
        metadata: RpcProofMetadata,
    ) -> RpcResult<RpcProofSubmission>;

    #[method(name = "finalizeProof")]
    async fn finalize_proof(&self, submission_id: String, decision: String) -> RpcResult<RpcProofSubmission>;

    #[method(name = "sendVerificationCode")]
    async fn send_verification_code(&self, user_id: String, channel: String, target: String) -> RpcResult<RpcVerificationSent>;

    #[method(name = "verifyCode")]
    async fn verify_code(&self, user_id: String, channel: String, code: String) -> RpcResult<RpcIdentityStatus>;

    #[method(name = "triggerKillSwitch")]
    async fn trigger_kill_switch(&self, reason: String) -> RpcResult<()>;

    #[method(name = "resolveKillSwitch")]
    async fn resolve_kill_switch(&self) -> RpcResult<()>;

    #[method(name = "forceRefund")]
    async fn force_refund(
        &self,
        escrow_id: String,
        actor_id: String,
        poster_id: String,
        hustler_id: Option<String>,
        idempotency_key: String,
    ) -> RpcResult<RpcEscrowResult>;

    #[method(name = "getHealth")]
    async fn get_health(&self) -> RpcResult<RpcHealth>;
}
