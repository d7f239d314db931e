//! Validator node document schema

use bson::{doc, oid::ObjectId, DateTime};
use mongodb::{options::IndexOptions, IndexModel};
use serde::{Deserialize, Serialize};

use crate::db::store::NodeRecord;

/// Collection name for validator nodes
pub const NODE_COLLECTION: &str = "nodes";

/// Soft-delete flag maintained by the dashboard front end
pub const DELETED_FIELD: &str = "metadata.is_deleted";

/// Stamped on every write made by reconciliation
pub const UPDATED_AT_FIELD: &str = "metadata.updated_at";

/// Bookkeeping carried by every node document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NodeMetadata {
    /// Removed by the operator; never returned to reconciliation
    #[serde(default)]
    pub is_deleted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

/// Validator node as stored by the dashboard
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NodeDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: NodeMetadata,

    /// Operator-facing label
    #[serde(default)]
    pub name: String,

    /// BLS mining key the node validates with
    pub validator_mining_key: String,

    /// Account public key, once resolved from the beacon state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Reward payment address, once resolved from the staking transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_address: Option<String>,
}

impl NodeDoc {
    /// Documents without an id cannot be addressed for updates
    pub fn into_record(self) -> Option<NodeRecord> {
        let id = self.id?;
        Some(NodeRecord {
            id: id.to_hex(),
            name: self.name,
            validator_mining_key: self.validator_mining_key,
            public_key: self.public_key.filter(|k| !k.is_empty()),
            reward_address: self.reward_address.filter(|a| !a.is_empty()),
        })
    }

    /// Lookups go by mining key; the public key index only covers resolved nodes
    pub fn indexes() -> Vec<IndexModel> {
        vec![
            IndexModel::builder()
                .keys(doc! { "validator_mining_key": 1 })
                .options(Some(
                    IndexOptions::builder()
                        .name("validator_mining_key_index".to_string())
                        .build(),
                ))
                .build(),
            IndexModel::builder()
                .keys(doc! { "public_key": 1 })
                .options(Some(
                    IndexOptions::builder()
                        .name("public_key_index".to_string())
                        .sparse(true)
                        .build(),
                ))
                .build(),
        ]
    }
}
