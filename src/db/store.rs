//! Node record store
//!
//! The reconciliation job only needs two things from storage: a filtered
//! read and a per-record partial update. [`NodeStore`] is that seam;
//! [`MongoNodeStore`] backs it in production and [`MemoryNodeStore`] in
//! tests and dry runs.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::TryStreamExt;
use mongodb::Collection;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::mongo::MongoClient;
use super::schemas::{NodeDoc, DELETED_FIELD, NODE_COLLECTION, UPDATED_AT_FIELD};
use crate::types::{Result, ValidatorError};

/// A validator node as the core sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub name: String,
    pub validator_mining_key: String,
    pub public_key: Option<String>,
    pub reward_address: Option<String>,
}

/// Which records a query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFilter {
    All,
    /// Records lacking a public key or a reward address
    MissingKeys,
}

impl NodeFilter {
    pub fn matches(self, record: &NodeRecord) -> bool {
        match self {
            Self::All => true,
            Self::MissingKeys => record.public_key.is_none() || record.reward_address.is_none(),
        }
    }

    fn to_document(self) -> Document {
        match self {
            Self::All => doc! {},
            Self::MissingKeys => doc! {
                "$or": [
                    { "public_key": null },
                    { "public_key": "" },
                    { "reward_address": null },
                    { "reward_address": "" },
                ]
            },
        }
    }
}

/// Fields to set on a record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    pub public_key: Option<String>,
    pub reward_address: Option<String>,
}

impl NodePatch {
    pub fn public_key(key: impl Into<String>) -> Self {
        Self {
            public_key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn reward_address(address: impl Into<String>) -> Self {
        Self {
            reward_address: Some(address.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.public_key.is_none() && self.reward_address.is_none()
    }

    pub fn apply(&self, record: &mut NodeRecord) {
        if let Some(key) = &self.public_key {
            record.public_key = Some(key.clone());
        }
        if let Some(address) = &self.reward_address {
            record.reward_address = Some(address.clone());
        }
    }
}

/// Storage seam for node records
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn query_nodes(&self, filter: NodeFilter) -> Result<Vec<NodeRecord>>;

    async fn update_node(&self, id: &str, patch: NodePatch) -> Result<()>;
}

/// Node records in a MongoDB collection
pub struct MongoNodeStore {
    nodes: Collection<NodeDoc>,
}

impl MongoNodeStore {
    /// Open the node collection, creating its indexes if needed
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let nodes = client.database().collection::<NodeDoc>(NODE_COLLECTION);
        nodes
            .create_indexes(NodeDoc::indexes())
            .await
            .map_err(|e| ValidatorError::Database(format!("Failed to create node indexes: {}", e)))?;
        Ok(Self { nodes })
    }
}

/// Query document for `filter`, excluding soft-deleted nodes
fn query_document(filter: NodeFilter) -> Document {
    let mut query = filter.to_document();
    query.insert(DELETED_FIELD, doc! { "$ne": true });
    query
}

/// `$set` document for `patch`, or `None` when there is nothing to write
fn update_document(patch: NodePatch) -> Option<Document> {
    if patch.is_empty() {
        return None;
    }

    let mut set = Document::new();
    set.insert(UPDATED_AT_FIELD, DateTime::now());
    if let Some(key) = patch.public_key {
        set.insert("public_key", key);
    }
    if let Some(address) = patch.reward_address {
        set.insert("reward_address", address);
    }
    Some(doc! { "$set": set })
}

#[async_trait]
impl NodeStore for MongoNodeStore {
    async fn query_nodes(&self, filter: NodeFilter) -> Result<Vec<NodeRecord>> {
        let mut cursor = self.nodes.find(query_document(filter)).await?;

        let mut records = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            match doc.into_record() {
                Some(record) => records.push(record),
                None => warn!("Node document without _id skipped"),
            }
        }
        Ok(records)
    }

    async fn update_node(&self, id: &str, patch: NodePatch) -> Result<()> {
        let Some(update) = update_document(patch) else {
            return Ok(());
        };

        let object_id = ObjectId::parse_str(id)?;
        let result = self
            .nodes
            .update_one(doc! { "_id": object_id }, update)
            .await?;

        if result.matched_count == 0 {
            return Err(ValidatorError::Database(format!("node {} not found", id)));
        }
        debug!(node_id = %id, "Node record updated");
        Ok(())
    }
}

/// Node records held in memory, in insertion order
#[derive(Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<Vec<NodeRecord>>,
}

impl MemoryNodeStore {
    pub fn new(records: Vec<NodeRecord>) -> Self {
        Self {
            nodes: RwLock::new(records),
        }
    }

    pub async fn get(&self, id: &str) -> Option<NodeRecord> {
        self.nodes.read().await.iter().find(|n| n.id == id).cloned()
    }

    pub async fn all(&self) -> Vec<NodeRecord> {
        self.nodes.read().await.clone()
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn query_nodes(&self, filter: NodeFilter) -> Result<Vec<NodeRecord>> {
        let nodes = self.nodes.read().await;
        Ok(nodes.iter().filter(|n| filter.matches(n)).cloned().collect())
    }

    async fn update_node(&self, id: &str, patch: NodePatch) -> Result<()> {
        let mut nodes = self.nodes.write().await;
        let node = nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ValidatorError::Database(format!("node {} not found", id)))?;
        patch.apply(node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, public_key: Option<&str>, reward_address: Option<&str>) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            name: format!("node-{}", id),
            validator_mining_key: format!("bls-{}", id),
            public_key: public_key.map(str::to_string),
            reward_address: reward_address.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_missing_keys_filter() {
        let store = MemoryNodeStore::new(vec![
            record("1", Some("pk"), Some("addr")),
            record("2", None, Some("addr")),
            record("3", Some("pk"), None),
        ]);

        let missing = store.query_nodes(NodeFilter::MissingKeys).await.unwrap();
        let ids: Vec<_> = missing.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);

        assert_eq!(store.query_nodes(NodeFilter::All).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_patch_only_sets_given_fields() {
        let store = MemoryNodeStore::new(vec![record("1", None, Some("old"))]);

        store
            .update_node("1", NodePatch::public_key("pk-1"))
            .await
            .unwrap();

        let node = store.get("1").await.unwrap();
        assert_eq!(node.public_key.as_deref(), Some("pk-1"));
        assert_eq!(node.reward_address.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_update_unknown_node_fails() {
        let store = MemoryNodeStore::default();
        let err = store
            .update_node("nope", NodePatch::reward_address("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidatorError::Database(_)));
    }

    #[test]
    fn test_missing_keys_document() {
        let filter = NodeFilter::MissingKeys.to_document();
        assert_eq!(filter.get_array("$or").unwrap().len(), 4);
        assert!(NodeFilter::All.to_document().is_empty());
    }

    #[test]
    fn test_queries_skip_deleted_nodes() {
        let query = query_document(NodeFilter::All);
        assert_eq!(
            query.get_document(DELETED_FIELD).unwrap(),
            &doc! { "$ne": true }
        );

        let query = query_document(NodeFilter::MissingKeys);
        assert!(query.contains_key("$or"));
        assert!(query.contains_key(DELETED_FIELD));
    }

    #[test]
    fn test_update_sets_only_patched_fields() {
        assert!(update_document(NodePatch::default()).is_none());

        let update = update_document(NodePatch::reward_address("addr")).unwrap();
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("reward_address").unwrap(), "addr");
        assert!(set.get_datetime(UPDATED_AT_FIELD).is_ok());
        assert!(!set.contains_key("public_key"));
    }
}
