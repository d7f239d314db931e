//! Reward resolution
//!
//! The reward address of a validator lives in the metadata of the
//! transaction that staked it. Resolution walks account key -> `StakingTx` hash -> transaction ->
//! `RewardReceiverPaymentAddress`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::transaction::TransactionDecoder;
use crate::beacon::BeaconStateCache;
use crate::rpc::{NodeRpcClient, METHOD_REWARD_AMOUNT};
use crate::types::{FetchError, Result, ValidatorError};

/// Token id of the native coin in reward maps
pub const PRV_TOKEN_ID: &str = "0000000000000000000000000000000000000000000000000000000000000004";

/// Substrings the node uses when a payment address fails to deserialize.
/// The node only reports these as free text.
pub const INVALID_KEY_MARKERS: &[&str] = &[
    "Serialized key type is invalid",
    "Serialized key is invalid",
];

/// Pending reward per token id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardAmounts(pub BTreeMap<String, u64>);

impl RewardAmounts {
    /// Native coin reward, under either its token id or the `PRV` alias
    pub fn prv(&self) -> u64 {
        self.0
            .get(PRV_TOKEN_ID)
            .or_else(|| self.0.get("PRV"))
            .copied()
            .unwrap_or(0)
    }
}

/// Map a `getrewardamount` error string to the error callers should act on
pub fn classify_reward_error(message: String) -> ValidatorError {
    if INVALID_KEY_MARKERS.iter().any(|m| message.contains(m)) {
        ValidatorError::InvalidKey(message)
    } else {
        ValidatorError::Fetch(FetchError::Rpc(message))
    }
}

/// Resolves reward addresses and pending amounts
#[derive(Clone)]
pub struct RewardResolver {
    cache: BeaconStateCache,
    decoder: TransactionDecoder,
    rpc: NodeRpcClient,
}

impl RewardResolver {
    pub fn new(cache: BeaconStateCache) -> Self {
        let rpc = cache.rpc().clone();
        Self {
            decoder: TransactionDecoder::new(rpc.clone()),
            cache,
            rpc,
        }
    }

    pub fn decoder(&self) -> &TransactionDecoder {
        &self.decoder
    }

    /// Reward address from the staking transaction of `account_key`.
    /// `None` when the account never staked or the transaction names no receiver.
    pub async fn resolve_reward_address(
        &self,
        account_key: &str,
    ) -> std::result::Result<Option<String>, FetchError> {
        let snapshot = self.cache.get_snapshot().await?;
        let Some(tx_hash) = snapshot.staking_tx_hash(account_key) else {
            debug!(account_key = %account_key, "No staking transaction recorded");
            return Ok(None);
        };

        let tx = self.decoder.fetch_transaction(tx_hash).await?;
        let address = tx.reward_receiver().map(str::to_string);
        if address.is_none() {
            warn!(
                account_key = %account_key,
                tx_hash = %tx_hash,
                "Staking transaction carries no reward receiver"
            );
        }
        Ok(address)
    }

    /// Pending rewards for a payment address. `None` when the node has nothing.
    pub async fn get_node_reward_amount(&self, reward_address: &str) -> Result<Option<RewardAmounts>> {
        match self
            .rpc
            .call_optional::<RewardAmounts>(METHOD_REWARD_AMOUNT, vec![Value::from(reward_address)])
            .await
        {
            Ok(amounts) => Ok(amounts),
            Err(FetchError::Rpc(message)) => Err(classify_reward_error(message)),
            Err(e) => Err(e.into()),
        }
    }
}
