//! Reconciliation job
//!
//! Fills in the public key and reward address of stored nodes that are
//! missing them. Records are processed one at a time; a record that fails
//! or cannot be resolved yet is logged and left for the next run.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::rewards::RewardResolver;
use crate::committee::CommitteeLookup;
use crate::db::{NodeFilter, NodePatch, NodeRecord, NodeStore};
use crate::types::Result;

/// Reconciliation schedule
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub interval: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

/// Outcome of one batch
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Records returned by the store query
    pub scanned: usize,
    pub public_keys_resolved: usize,
    pub reward_addresses_resolved: usize,
    /// Records left incomplete because the chain has no answer yet
    pub skipped: usize,
    /// Records whose resolution or update failed
    pub failed: usize,
}

impl ReconcileReport {
    fn begin() -> Self {
        Self {
            started_at: Utc::now(),
            duration_ms: 0,
            scanned: 0,
            public_keys_resolved: 0,
            reward_addresses_resolved: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

enum NodeOutcome {
    Complete,
    Incomplete,
}

/// Resolves missing node keys against the chain and persists them
pub struct Reconciler {
    lookup: CommitteeLookup,
    rewards: RewardResolver,
    store: Arc<dyn NodeStore>,
}

impl Reconciler {
    pub fn new(lookup: CommitteeLookup, rewards: RewardResolver, store: Arc<dyn NodeStore>) -> Self {
        Self {
            lookup,
            rewards,
            store,
        }
    }

    /// Run one batch over every node missing a public key or reward address.
    ///
    /// Only a failure to read the store fails the batch. Per-node errors are
    /// counted in the report.
    pub async fn reconcile_missing_keys(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::begin();
        let nodes = self.store.query_nodes(NodeFilter::MissingKeys).await?;
        report.scanned = nodes.len();

        for node in &nodes {
            match self.reconcile_node(node, &mut report).await {
                Ok(NodeOutcome::Complete) => {}
                Ok(NodeOutcome::Incomplete) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        node_id = %node.id,
                        mining_key = %node.validator_mining_key,
                        error = %e,
                        "Node reconciliation failed, continuing with next node"
                    );
                }
            }
        }

        report.duration_ms = (Utc::now() - report.started_at)
            .num_milliseconds()
            .max(0) as u64;
        info!(
            scanned = report.scanned,
            public_keys = report.public_keys_resolved,
            reward_addresses = report.reward_addresses_resolved,
            skipped = report.skipped,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Reconciliation finished"
        );
        Ok(report)
    }

    async fn reconcile_node(
        &self,
        node: &NodeRecord,
        report: &mut ReconcileReport,
    ) -> Result<NodeOutcome> {
        let public_key = match &node.public_key {
            Some(key) => key.clone(),
            None => match self
                .lookup
                .resolve_public_key(&node.validator_mining_key)
                .await?
            {
                Some(key) => {
                    self.store
                        .update_node(&node.id, NodePatch::public_key(key.as_str()))
                        .await?;
                    report.public_keys_resolved += 1;
                    debug!(node_id = %node.id, "Public key resolved");
                    key
                }
                None => {
                    debug!(node_id = %node.id, "Mining key not found in beacon state");
                    return Ok(NodeOutcome::Incomplete);
                }
            },
        };

        if node.reward_address.is_none() {
            match self.rewards.resolve_reward_address(&public_key).await? {
                Some(address) => {
                    self.store
                        .update_node(&node.id, NodePatch::reward_address(address))
                        .await?;
                    report.reward_addresses_resolved += 1;
                    debug!(node_id = %node.id, "Reward address resolved");
                }
                None => return Ok(NodeOutcome::Incomplete),
            }
        }

        Ok(NodeOutcome::Complete)
    }
}

/// Run reconciliation immediately and then once per `interval`
pub fn spawn_reconcile_task(reconciler: Arc<Reconciler>, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Starting reconciliation loop");

    tokio::spawn(async move {
        loop {
            if let Err(e) = reconciler.reconcile_missing_keys().await {
                error!(error = %e, "Reconciliation batch could not start");
            }
            tokio::time::sleep(interval).await;
        }
    })
}
