//! money-cli — operator CLI for a running `money-node`.
//!
//! Usage:
//!   money-cli fund-escrow      --task <id> --poster <id> --payment-method-ref <ref> --amount-cents <n> [--idempotency-key <key>]
//!   money-cli release-escrow   --escrow <id> --actor <id> --poster <id> --hustler <id> [--admin] [--transfer-ref <ref>] [--idempotency-key <key>]
//!   money-cli refund-escrow    --escrow <id> --actor <id> --poster <id> [--hustler <id>] [--admin] [--amount-cents <n>] [--idempotency-key <key>]
//!   money-cli open-dispute     --task <id> --actor <id> --poster <id> [--hustler <id>] [--idempotency-key <key>]
//!   money-cli resolve-dispute  --task <id> --actor <id> --poster <id> [--hustler <id>] --resolution <upheld|refunded|split> [--idempotency-key <key>]
//!   money-cli trigger-kill-switch --reason <reason>
//!   money-cli resolve-kill-switch
//!   money-cli force-refund     --escrow <id> --actor <id> --poster <id> [--hustler <id>] [--idempotency-key <key>]
//!   money-cli health

use clap::{Parser, Subcommand};
use tracing::info;

mod rpc_client;
use rpc_client::MoneyRpcClient;

#[derive(Parser, Debug)]
#[command(name = "money-cli", version, about = "Operator CLI for the money-flow kernel")]
struct Args {
    /// Node RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8645")]
    rpc: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    FundEscrow {
        #[arg(long)]
        task: String,
        #[arg(long)]
        poster: String,
        #[arg(long)]
        payment_method_ref: String,
        #[arg(long)]
        amount_cents: i64,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    ReleaseEscrow {
        #[arg(long)]
        escrow: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        poster: String,
        #[arg(long)]
        hustler: String,
        #[arg(long, default_value_t = false)]
        admin: bool,
        #[arg(long)]
        transfer_ref: Option<String>,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    RefundEscrow {
        #[arg(long)]
        escrow: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        poster: String,
        #[arg(long)]
        hustler: Option<String>,
        #[arg(long, default_value_t = false)]
        admin: bool,
        #[arg(long)]
        amount_cents: Option<i64>,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    OpenDispute {
        #[arg(long)]
        task: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        poster: String,
        #[arg(long)]
        hustler: Option<String>,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    ResolveDispute {
        #[arg(long)]
        task: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        poster: String,
        #[arg(long)]
        hustler: Option<String>,
        /// One of upheld, refunded, split.
        #[arg(long)]
        resolution: String,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    TriggerKillSwitch {
        #[arg(long)]
        reason: String,
    },
    ResolveKillSwitch,
    ForceRefund {
        #[arg(long)]
        escrow: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        poster: String,
        #[arg(long)]
        hustler: Option<String>,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    Health,
}

fn idem_key(given: Option<String>) -> String {
    given.unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".parse().unwrap()))
        .init();

    let args = Args::parse();
    let client = MoneyRpcClient::new(&args.rpc);

    let result = match args.command {
        Command::FundEscrow {
            task,
            poster,
            payment_method_ref,
            amount_cents,
            idempotency_key,
        } => {
            client
                .call(
                    "money_fundEscrow",
                    serde_json::json!([task, poster, payment_method_ref, amount_cents, idem_key(idempotency_key)]),
                )
                .await?
        }
        Command::ReleaseEscrow {
            escrow,
            actor,
            poster,
            hustler,
            admin,
            transfer_ref,
            idempotency_key,
        } => {
            client
                .call(
                    "money_releaseEscrow",
                    serde_json::json!([escrow, actor, admin, poster, hustler, transfer_ref, idem_key(idempotency_key)]),
                )
                .await?
        }
        Command::RefundEscrow {
            escrow,
            actor,
            poster,
            hustler,
            admin,
            amount_cents,
            idempotency_key,
        } => {
            client
                .call(
                    "money_refundEscrow",
                    serde_json::json!([escrow, actor, admin, poster, hustler, amount_cents, idem_key(idempotency_key)]),
                )
                .await?
        }
        Command::OpenDispute {
            task,
            actor,
            poster,
            hustler,
            idempotency_key,
        } => {
            client
                .call(
                    "money_openDispute",
                    serde_json::json!([task, actor, poster, hustler, idem_key(idempotency_key)]),
                )
                .await?
        }
        Command::ResolveDispute {
            task,
            actor,
            poster,
            hustler,
            resolution,
            idempotency_key,
        } => {
            client
                .call(
                    "money_resolveDispute",
                    serde_json::json!([task, actor, poster, hustler, resolution, idem_key(idempotency_key)]),
                )
                .await?
        }
        Command::TriggerKillSwitch { reason } => client.call("money_triggerKillSwitch", serde_json::json!([reason])).await?,
        Command::ResolveKillSwitch => client.call("money_resolveKillSwitch", serde_json::json!([])).await?,
        Command::ForceRefund {
            escrow,
            actor,
            poster,
            hustler,
            idempotency_key,
        } => {
            client
                .call(
                    "money_forceRefund",
                    serde_json::json!([escrow, actor, poster, hustler, idem_key(idempotency_key)]),
                )
                .await?
        }
        Command::Health => client.call("money_getHealth", serde_json::json!([])).await?,
    };

    info!("ok");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
