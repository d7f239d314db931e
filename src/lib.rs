//! Validator dashboard core
//!
//! Everything the operator dashboard needs from a full node:
//!
//! - **RPC**: JSON-RPC transport to a single full-node endpoint
//! - **Beacon**: the beacon best state snapshot and its freshness cache
//! - **Committee**: role and public key lookup with fixed precedence
//! - **Services**: transaction decoding, reward resolution, reconciliation
//! - **DB**: the node record store the reconciliation job backfills

pub mod beacon;
pub mod committee;
pub mod config;
pub mod db;
pub mod rpc;
pub mod services;
pub mod types;

pub use config::Args;
pub use types::{FetchError, Result, ValidatorError};
