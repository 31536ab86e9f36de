//! money-node — the money-flow kernel's node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the persistent state database
//!   2. Construct the domain services (engine, proof, identity, kill-switch)
//!   3. Start the JSON-RPC 2.0 business-verb server
//!   4. Start the webhook HTTP route
//!   5. Run the sweeper and worker interval loops

mod sweep;
mod webhook;
mod workers;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use money_core::clock::{Clock, SystemClock};
use money_core::config::EngineConfig;
use money_engine::{FakeProcessor, MoneyEngine, PaymentProcessor, SandboxProcessor, SledXpLedger, XpLedger};
use money_identity::{IdentityStore, IdentityVerificationService, VerificationStore};
use money_killswitch::KillSwitch;
use money_outbox::{EmailOutboxStore, OutboxStore, SmsOutboxStore, SuppressionList};
use money_proof::ProofEngine;
use money_rpc::{RpcServer, RpcServerState, SweeperHealth};
use money_store::db::Store;
use money_sweepers::{MirrorRecoverySweeper, PendingTransactionReaper, RealityMirrorBackfill};
use money_webhook::WebhookIngestor;

use sweep::Sweepers;
use webhook::{ReconciliationWebhookHandler, WebhookState};
use workers::Workers;

#[derive(Parser, Debug)]
#[command(
    name = "money-node",
    version,
    about = "Money-flow kernel node — escrow, ledger, outbox, proof, and identity services"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8645")]
    rpc_addr: SocketAddr,

    /// Webhook HTTP listen address.
    #[arg(long, default_value = "127.0.0.1:8646")]
    webhook_addr: SocketAddr,

    /// Shared secret used to verify inbound processor webhook signatures.
    #[arg(long, env = "MONEY_WEBHOOK_SIGNING_SECRET")]
    webhook_signing_secret: String,

    /// Base URL of the sandbox payment-processor REST API. When absent, a
    /// deterministic in-memory fake processor is used (local dev/demo only).
    #[arg(long)]
    processor_base_url: Option<String>,

    /// Interval, in seconds, between sweeper passes.
    #[arg(long, default_value_t = money_core::constants::SWEEPER_INTERVAL_SECS)]
    sweeper_interval_secs: u64,

    /// Interval, in seconds, between worker drain passes.
    #[arg(long, default_value_t = 5)]
    worker_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,money=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("money-node starting");

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("creating data dir {}", args.data_dir.display()))?;

    // ── Storage ──────────────────────────────────────────────────────────────
    let store = Arc::new(Store::open(&args.data_dir).context("opening state database")?);
    let db = store.db();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // ── Domain services ──────────────────────────────────────────────────────
    let processor: Arc<dyn PaymentProcessor> = match &args.processor_base_url {
        Some(base_url) => {
            info!(base_url, "using sandbox payment processor");
            Arc::new(SandboxProcessor::new(
                base_url.clone(),
                Duration::from_secs(money_core::constants::PROCESSOR_CALL_TIMEOUT_SECS),
            ))
        }
        None => {
            tracing::warn!("no --processor-base-url given, using in-memory fake processor (dev/demo only)");
            Arc::new(FakeProcessor::new())
        }
    };
    let xp: Arc<dyn XpLedger> = Arc::new(SledXpLedger::open(&db).context("opening xp ledger")?);
    let engine_config = EngineConfig {
        sweeper_interval: Duration::from_secs(args.sweeper_interval_secs),
        ..EngineConfig::default()
    };
    let engine = Arc::new(
        MoneyEngine::new(store.clone(), processor, xp, engine_config, clock.clone()).context("constructing money engine")?,
    );

    let proof = Arc::new(ProofEngine::open(&db).context("opening proof engine")?);

    let identity = Arc::new(IdentityVerificationService::new(
        IdentityStore::open(&db).context("opening identity store")?,
        VerificationStore::open(&db).context("opening verification store")?,
        EmailOutboxStore::open(&db).context("opening mail outbox")?,
        SmsOutboxStore::open(&db).context("opening sms outbox")?,
        OutboxStore::open(&db).context("opening domain outbox")?,
        clock.clone(),
    ));

    let killswitch = Arc::new(KillSwitch::open(&db).context("opening kill-switch")?);
    let outbox = Arc::new(OutboxStore::open(&db).context("opening domain outbox")?);
    let sweeper_health = Arc::new(RwLock::new(SweeperHealth::default()));

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState::new(
        engine.clone(),
        proof.clone(),
        identity.clone(),
        killswitch.clone(),
        outbox.clone(),
        sweeper_health.clone(),
        clock.clone(),
        store.clone(),
    ));
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;
    info!(addr = %args.rpc_addr, "RPC server listening");

    // ── Webhook HTTP route ────────────────────────────────────────────────────
    let webhook_ingestor = Arc::new(
        WebhookIngestor::new(&db, Arc::new(ReconciliationWebhookHandler)).context("constructing webhook ingestor")?,
    );
    let webhook_state = WebhookState {
        ingestor: webhook_ingestor,
        signing_secret: Arc::from(args.webhook_signing_secret.as_str()),
        clock: clock.clone(),
    };
    let webhook_addr = args.webhook_addr;
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(webhook_addr).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "failed to bind webhook listener");
                return;
            }
        };
        info!(addr = %webhook_addr, "webhook server listening");
        if let Err(e) = axum::serve(listener, webhook::router(webhook_state)).await {
            tracing::error!(error = %e, "webhook server stopped");
        }
    });

    // ── Sweeper loop (spec §4.5) ──────────────────────────────────────────────
    let ledger = Arc::new(money_ledger::transactions::LedgerStore::open(&db).context("opening ledger store")?);
    let mirror = Arc::new(money_engine::mirror::OutboundMirror::open(&db).context("opening outbound mirror")?);
    let processed = Arc::new(money_engine::processed::ProcessedEvents::open(&db).context("opening processed events")?);
    let processor_events = Arc::new(money_webhook::ProcessorEventStore::open(&db).context("opening processor events")?);

    let sweepers = Sweepers {
        reaper: PendingTransactionReaper::new(
            ledger.clone(),
            mirror.clone(),
            money_core::constants::PENDING_TX_REAPER_THRESHOLD_SECS,
            clock.clone(),
        ),
        mirror_recovery: MirrorRecoverySweeper::new(ledger.clone(), mirror.clone()),
        backfill: RealityMirrorBackfill::new(
            processor_events,
            mirror,
            processed,
            money_core::constants::REALITY_MIRROR_BACKFILL_WINDOW_SECS,
            clock.clone(),
        ),
    };
    let sweep_health = sweeper_health.clone();
    let sweep_clock = clock.clone();
    let sweep_interval = Duration::from_secs(args.sweeper_interval_secs);
    tokio::spawn(async move {
        sweep::run(sweepers, sweep_health, sweep_clock, sweep_interval).await;
    });

    // ── Worker loop (spec §4.8) ───────────────────────────────────────────────
    let workers = Workers {
        outbox,
        mail: Arc::new(EmailOutboxStore::open(&db).context("opening mail outbox")?),
        sms: Arc::new(SmsOutboxStore::open(&db).context("opening sms outbox")?),
        suppression: Arc::new(SuppressionList::open(&db).context("opening suppression list")?),
    };
    let worker_clock = clock.clone();
    let worker_interval = Duration::from_secs(args.worker_interval_secs);
    tokio::spawn(async move {
        workers::run(workers, worker_clock, worker_interval).await;
    });

    info!("money-node ready");
    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutting down");
    store.flush().context("flushing store on shutdown")?;
    Ok(())
}
