//! The Stripe-effect boundary (spec §4.1 Execute phase). `PaymentProcessor`
//! is the one trait a saga crosses a process boundary through; production
//! wiring uses [`SandboxProcessor`], a lean hand-rolled `reqwest` client in
//! the style of `chronx_wallet::rpc_client::WalletRpcClient` rather than the
//! full `jsonrpsee` client stack, since the processor speaks its own REST
//! API, not our JSON-RPC dialect.

use async_trait::async_trait;

use money_core::money::Money;
use money_core::MoneyError;

/// The three effects the Execute phase can ask the processor for, one per
/// saga transition (spec §4.1).
#[derive(Clone, Debug, Default)]
pub struct ProcessorEffect {
    pub payment_intent_id: Option<String>,
    pub charge_id: Option<String>,
    pub transfer_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct HoldRequest {
    pub idempotency_key: String,
    pub amount: Money,
    pub payment_method_ref: String,
}

#[derive(Clone, Debug)]
pub struct ReleaseRequest {
    pub idempotency_key: String,
    pub payout_amount: Money,
    pub payment_intent_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RefundRequest {
    pub idempotency_key: String,
    pub amount: Money,
    pub payment_intent_id: Option<String>,
    pub transfer_id: Option<String>,
}

/// Create+confirm a manual-capture PaymentIntent (hold), capture+transfer
/// (release), or cancel/reverse+refund (refund) — each called exactly once
/// per idempotency key by the Outbound Mirror (spec §4.1, §4.3).
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn hold(&self, req: HoldRequest) -> Result<ProcessorEffect, MoneyError>;
    async fn release(&self, req: ReleaseRequest) -> Result<ProcessorEffect, MoneyError>;
    async fn refund(&self, req: RefundRequest) -> Result<ProcessorEffect, MoneyError>;
}

/// Talks to a sandbox payment-processor REST endpoint over plain
/// `reqwest::Client` JSON POSTs, bounded by `processor_call_timeout`
/// (spec §5's "processor default for payment" deadline).
pub struct SandboxProcessor {
    base_url: String,
    client: reqwest::Client,
}

impl SandboxProcessor {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with a fixed timeout");
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<serde_json::Value, MoneyError> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| MoneyError::ProcessorCallFailed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(MoneyError::ProcessorCallFailed(format!(
                "processor returned {}",
                resp.status()
            )));
        }
        resp.json::<serde_json::Value>()
            .await
            .map_err(|e| MoneyError::ProcessorCallFailed(e.to_string()))
    }
}

#[async_trait]
impl PaymentProcessor for SandboxProcessor {
    async fn hold(&self, req: HoldRequest) -> Result<ProcessorEffect, MoneyError> {
        let body = self
            .post(
                "/v1/payment_intents",
                serde_json::json!({
                    "idempotency_key": req.idempotency_key,
                    "amount_cents": req.amount.cents(),
                    "payment_method": req.payment_method_ref,
                    "capture_method": "manual",
                    "confirm": true,
                }),
            )
            .await?;
        Ok(ProcessorEffect {
            payment_intent_id: body["id"].as_str().map(str::to_string),
            charge_id: None,
            transfer_id: None,
        })
    }

    async fn release(&self, req: ReleaseRequest) -> Result<ProcessorEffect, MoneyError> {
        let body = self
            .post(
                "/v1/payment_intents/capture_and_transfer",
                serde_json::json!({
                    "idempotency_key": req.idempotency_key,
                    "amount_cents": req.payout_amount.cents(),
                    "payment_intent_id": req.payment_intent_id,
                }),
            )
            .await?;
        Ok(ProcessorEffect {
            payment_intent_id: req.payment_intent_id,
            charge_id: body["charge_id"].as_str().map(str::to_string),
            transfer_id: body["transfer_id"].as_str().map(str::to_string),
        })
    }

    async fn refund(&self, req: RefundRequest) -> Result<ProcessorEffect, MoneyError> {
        let body = self
            .post(
                "/v1/refunds",
                serde_json::json!({
                    "idempotency_key": req.idempotency_key,
                    "amount_cents": req.amount.cents(),
                    "payment_intent_id": req.payment_intent_id,
                    "transfer_id": req.transfer_id,
                }),
            )
            .await?;
        Ok(ProcessorEffect {
            payment_intent_id: req.payment_intent_id,
            charge_id: body["charge_id"].as_str().map(str::to_string),
            transfer_id: req.transfer_id,
        })
    }
}

/// Deterministic in-memory processor for tests: never touches the network,
/// hands back a stable synthetic ref derived from the idempotency key so
/// assertions can check "called exactly once" by counting invocations.
pub struct FakeProcessor {
    pub calls: std::sync::Mutex<Vec<String>>,
}

impl FakeProcessor {
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls mutex poisoned").len()
    }

    fn record(&self, idempotency_key: &str) {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(idempotency_key.to_string());
    }
}

impl Default for FakeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn hold(&self, req: HoldRequest) -> Result<ProcessorEffect, MoneyError> {
        self.record(&req.idempotency_key);
        Ok(ProcessorEffect {
            payment_intent_id: Some(format!("pi_fake_{}", req.idempotency_key)),
            charge_id: None,
            transfer_id: None,
        })
    }

    async fn release(&self, req: ReleaseRequest) -> Result<ProcessorEffect, MoneyError> {
        self.record(&req.idempotency_key);
        Ok(ProcessorEffect {
            payment_intent_id: req.payment_intent_id,
            charge_id: Some(format!("ch_fake_{}", req.idempotency_key)),
            transfer_id: Some(format!("tr_fake_{}", req.idempotency_key)),
        })
    }

    async fn refund(&self, req: RefundRequest) -> Result<ProcessorEffect, MoneyError> {
        self.record(&req.idempotency_key);
        Ok(ProcessorEffect {
            payment_intent_id: req.payment_intent_id,
            charge_id: Some(format!("re_fake_{}", req.idempotency_key)),
            transfer_id: req.transfer_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_processor_records_idempotency_key_once_per_call() {
        let proc = FakeProcessor::new();
        proc.hold(HoldRequest {
            idempotency_key: "evt_1".into(),
            amount: Money::from_cents(5000).unwrap(),
            payment_method_ref: "pm_card_visa".into(),
        })
        .await
        .unwrap();
        assert_eq!(proc.call_count(), 1);
    }
}
