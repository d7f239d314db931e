//! Full-node RPC transport
//!
//! One endpoint, three methods. Every call is a POST carrying a JSON-RPC
//! body; the node replies with a `{Result, Error}` envelope.

pub mod client;
pub mod dto;

pub use client::{NodeRpcClient, RpcConfig};

/// Beacon best state snapshot, no params
pub const METHOD_BEACON_BEST_STATE: &str = "getbeaconbeststatedetail";

/// Transaction by hash, params: `[hash]`
pub const METHOD_TRANSACTION_BY_HASH: &str = "gettransactionbyhash";

/// Pending reward amounts, params: `[payment_address]`
pub const METHOD_REWARD_AMOUNT: &str = "getrewardamount";
