//! validator-dashboard: full-node core for the validator operator dashboard

use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use validator_dashboard::{
    beacon::BeaconStateCache,
    committee::CommitteeLookup,
    config::{Args, Command, LogFormat},
    db::{MongoClient, MongoNodeStore, NodeStore},
    rpc::NodeRpcClient,
    services::{spawn_reconcile_task, Reconciler, RewardResolver},
    ValidatorError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!(
        rpc = %args.rpc_url,
        beacon_cache_ttl_ms = args.beacon_cache_ttl_ms,
        command = ?args.command,
        "validator-dashboard starting"
    );

    let rpc = NodeRpcClient::new(args.rpc_config())?;
    let cache = BeaconStateCache::new(rpc, args.cache_config());
    let lookup = CommitteeLookup::new(cache.clone());
    let rewards = RewardResolver::new(cache.clone());

    match &args.command {
        Command::Status => {
            let snapshot = cache.get_snapshot().await?;
            print_json(&json!({ "snapshot": snapshot.summary(), "cache": cache.stats() }))?;
        }
        Command::Role { mining_key } => {
            let role = lookup.resolve_role(mining_key).await?;
            print_json(&json!({ "mining_key": mining_key, "role": role }))?;
        }
        Command::PublicKey { mining_key } => {
            let public_key = lookup.resolve_public_key(mining_key).await?;
            print_json(&json!({ "mining_key": mining_key, "public_key": public_key }))?;
        }
        Command::RewardAddress { account_key } => {
            let address = rewards.resolve_reward_address(account_key).await?;
            print_json(&json!({ "account_key": account_key, "reward_address": address }))?;
        }
        Command::RewardAmount { address } => match rewards.get_node_reward_amount(address).await {
            Ok(amounts) => {
                let prv = amounts.as_ref().map(|a| a.prv());
                print_json(&json!({ "address": address, "prv": prv, "amounts": amounts }))?;
            }
            Err(ValidatorError::InvalidKey(msg)) => {
                warn!(address = %address, "Node rejected the payment address: {}", msg);
                std::process::exit(2);
            }
            Err(e) => return Err(e.into()),
        },
        Command::Overview { mining_key } => {
            let overview = lookup.overview(mining_key).await?;
            print_json(&overview)?;
        }
        Command::Run | Command::Reconcile => {
            let mongo = MongoClient::connect(&args.mongodb_uri, &args.mongodb_db).await?;
            let store: Arc<dyn NodeStore> = Arc::new(MongoNodeStore::new(&mongo).await?);
            let reconciler = Arc::new(Reconciler::new(lookup, rewards, store));
            run_reconciliation(&args, reconciler).await?;
        }
    }

    Ok(())
}

async fn run_reconciliation(args: &Args, reconciler: Arc<Reconciler>) -> anyhow::Result<()> {
    if args.command == Command::Reconcile {
        let report = reconciler.reconcile_missing_keys().await?;
        return print_json(&report);
    }

    let handle = spawn_reconcile_task(reconciler, args.reconcile_config().interval);
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = handle => {
            if let Err(e) = result {
                error!(error = %e, "Reconciliation loop stopped unexpectedly");
            }
        }
    }
    Ok(())
}

fn init_tracing(args: &Args) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("validator_dashboard={},info", args.log_level).into());

    // stdout carries command output, so logs go to stderr
    let json = args.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
