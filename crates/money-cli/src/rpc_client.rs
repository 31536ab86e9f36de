//! Simple JSON-RPC 2.0 client used by the operator CLI to talk to a running
//! `money-node`. Uses raw HTTP POST with serde_json rather than the full
//! jsonrpsee client to keep this binary lean and dependency-minimal, the
//! same call as `money_engine::processor::SandboxProcessor` makes against
//! the payment processor.

use anyhow::{bail, Context};

pub struct MoneyRpcClient {
    url: String,
    client: reqwest::Client,
}

impl MoneyRpcClient {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Calls a JSON-RPC method with positional params and returns the
    /// `result` field.
    pub async fn call(&self, method: &str, params: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to money-node at {}", self.url))?;

        let json: serde_json::Value = resp.json().await.context("parsing RPC response")?;

        if let Some(err) = json.get("error") {
            bail!("RPC error: {}", err);
        }

        Ok(json["result"].clone())
    }
}
