//! Transaction decoder
//!
//! `gettransactionbyhash` returns the transaction with its metadata packed
//! as a JSON string. [`RawTransaction`] is the envelope as received;
//! [`Transaction`] is the same envelope with the metadata decoded. The
//! conversion between them is the only place the second decode pass happens.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::rpc::{NodeRpcClient, METHOD_TRANSACTION_BY_HASH};
use crate::types::FetchError;

/// Transaction envelope exactly as the node returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "Hash", default)]
    pub hash: String,

    #[serde(rename = "BlockHash", default)]
    pub block_hash: String,

    #[serde(rename = "BlockHeight", default)]
    pub block_height: u64,

    #[serde(rename = "ShardID", default)]
    pub shard_id: u8,

    #[serde(rename = "IsInBlock", default)]
    pub is_in_block: bool,

    /// Embedded JSON, still encoded
    #[serde(rename = "Metadata", default)]
    pub metadata: Option<Value>,

    /// Every other envelope field, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decoded transaction metadata. Staking transactions fill in the reward
/// receiver; other transaction types leave it empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxMetadata {
    #[serde(rename = "Type", default)]
    pub metadata_type: i64,

    #[serde(rename = "RewardReceiverPaymentAddress", default)]
    pub reward_receiver_payment_address: Option<String>,

    #[serde(rename = "FunderPaymentAddress", default)]
    pub funder_payment_address: Option<String>,

    #[serde(rename = "CommitteePublicKey", default)]
    pub committee_public_key: Option<String>,

    #[serde(rename = "StakingAmountShard", default)]
    pub staking_amount_shard: Option<u64>,

    #[serde(rename = "AutoReStaking", default)]
    pub auto_re_staking: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Transaction with decoded metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub hash: String,
    pub block_hash: String,
    pub block_height: u64,
    pub shard_id: u8,
    pub is_in_block: bool,
    /// `None` when the transaction carries no metadata at all
    pub metadata: Option<TxMetadata>,
    pub extra: Map<String, Value>,
}

impl Transaction {
    /// Reward address from staking metadata, if present
    pub fn reward_receiver(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.reward_receiver_payment_address.as_deref())
            .filter(|addr| !addr.is_empty())
    }
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = FetchError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        let metadata = decode_metadata(raw.metadata)
            .map_err(|e| FetchError::Decode(format!("transaction {} metadata: {}", raw.hash, e)))?;

        Ok(Self {
            hash: raw.hash,
            block_hash: raw.block_hash,
            block_height: raw.block_height,
            shard_id: raw.shard_id,
            is_in_block: raw.is_in_block,
            metadata,
            extra: raw.extra,
        })
    }
}

/// Empty string or null means no metadata. Anything else must be valid JSON.
fn decode_metadata(value: Option<Value>) -> Result<Option<TxMetadata>, serde_json::Error> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => serde_json::from_str(&text).map(Some),
        Some(other) => serde_json::from_value(other).map(Some),
    }
}

/// Fetches transactions by hash and decodes their metadata
#[derive(Debug, Clone)]
pub struct TransactionDecoder {
    rpc: NodeRpcClient,
}

impl TransactionDecoder {
    pub fn new(rpc: NodeRpcClient) -> Self {
        Self { rpc }
    }

    pub async fn fetch_transaction(&self, hash: &str) -> Result<Transaction, FetchError> {
        let raw: RawTransaction = self
            .rpc
            .call(METHOD_TRANSACTION_BY_HASH, vec![Value::from(hash)])
            .await?;
        debug!(hash = %hash, block_height = raw.block_height, "Transaction fetched");
        Transaction::try_from(raw)
    }
}
