//! Services built on the beacon cache and the RPC transport
//!
//! - **transaction**: fetch a transaction and decode its embedded metadata
//! - **rewards**: reward address resolution and pending reward amounts
//! - **reconcile**: periodic backfill of node public keys and reward addresses

pub mod reconcile;
pub mod rewards;
pub mod transaction;

pub use reconcile::{spawn_reconcile_task, ReconcileConfig, ReconcileReport, Reconciler};
pub use rewards::{classify_reward_error, RewardAmounts, RewardResolver, INVALID_KEY_MARKERS};
pub use transaction::{RawTransaction, Transaction, TransactionDecoder, TxMetadata};
