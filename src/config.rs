//! Configuration for the dashboard core
//!
//! CLI arguments and environment variables via clap. A `.env` file is
//! loaded by the binary before parsing.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::beacon::BeaconCacheConfig;
use crate::rpc::RpcConfig;
use crate::services::ReconcileConfig;

/// Validator dashboard full-node core
#[derive(Parser, Debug, Clone)]
#[command(name = "validator-dashboard")]
#[command(about = "Beacon state lookups and reward reconciliation for validator operators")]
pub struct Args {
    /// Full-node JSON-RPC endpoint
    #[arg(long, env = "FULLNODE_RPC_URL", default_value = "http://127.0.0.1:9334")]
    pub rpc_url: String,

    /// Per-call RPC timeout in milliseconds (unset waits indefinitely)
    #[arg(long, env = "RPC_TIMEOUT_MS")]
    pub rpc_timeout_ms: Option<u64>,

    /// How long a beacon snapshot is served before refetching, in milliseconds
    #[arg(long, env = "BEACON_CACHE_TTL_MS", default_value = "12000")]
    pub beacon_cache_ttl_ms: u64,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "validator_dashboard")]
    pub mongodb_db: String,

    /// Seconds between reconciliation batches in `run` mode
    #[arg(long, env = "RECONCILE_INTERVAL_SECS", default_value = "300")]
    pub reconcile_interval_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reconcile node records on a fixed interval until stopped
    Run,
    /// Run a single reconciliation batch
    Reconcile,
    /// Summarise the current beacon snapshot
    Status,
    /// Role held by a validator
    Role { mining_key: String },
    /// Account public key of a validator
    PublicKey { mining_key: String },
    /// Reward address from the staking transaction of an account
    RewardAddress { account_key: String },
    /// Pending rewards for a payment address
    RewardAmount { address: String },
    /// Everything the beacon snapshot says about a validator
    Overview { mining_key: String },
}

impl Args {
    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            url: self.rpc_url.clone(),
            timeout: self.rpc_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn cache_config(&self) -> BeaconCacheConfig {
        BeaconCacheConfig {
            freshness_window: Duration::from_millis(self.beacon_cache_ttl_ms),
        }
    }

    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig {
            interval: Duration::from_secs(self.reconcile_interval_secs),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        reqwest::Url::parse(&self.rpc_url)
            .map_err(|e| format!("FULLNODE_RPC_URL is not a valid URL: {}", e))?;

        if self.beacon_cache_ttl_ms == 0 {
            return Err("BEACON_CACHE_TTL_MS must be greater than zero".to_string());
        }

        if self.reconcile_interval_secs == 0 {
            return Err("RECONCILE_INTERVAL_SECS must be greater than zero".to_string());
        }

        if self.rpc_timeout_ms == Some(0) {
            return Err("RPC_TIMEOUT_MS must be greater than zero when set".to_string());
        }

        Ok(())
    }
}
