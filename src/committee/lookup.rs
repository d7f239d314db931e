//! Committee lookups against the cached beacon snapshot

use serde::Serialize;
use tracing::debug;

use super::precedence::{classify_role, find_public_key, RoleStatus};
use crate::beacon::{BeaconStateCache, MissingSignature, SignaturePenalty};
use crate::types::FetchError;

/// Answers role and identity questions about a validator
#[derive(Clone)]
pub struct CommitteeLookup {
    cache: BeaconStateCache,
}

impl CommitteeLookup {
    pub fn new(cache: BeaconStateCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &BeaconStateCache {
        &self.cache
    }

    /// Role held by the validator with this BLS mining key
    pub async fn resolve_role(&self, mining_key: &str) -> Result<RoleStatus, FetchError> {
        let snapshot = self.cache.get_snapshot().await?;
        let (status, shard_id) = classify_role(&snapshot, mining_key);
        debug!(mining_key = %mining_key, status = %status, shard_id = ?shard_id, "Role resolved");
        Ok(status)
    }

    /// Account public key for the validator with this BLS mining key
    pub async fn resolve_public_key(&self, mining_key: &str) -> Result<Option<String>, FetchError> {
        let snapshot = self.cache.get_snapshot().await?;
        Ok(find_public_key(&snapshot, mining_key).map(str::to_string))
    }

    /// Everything the snapshot says about one validator
    pub async fn overview(&self, mining_key: &str) -> Result<ValidatorOverview, FetchError> {
        let snapshot = self.cache.get_snapshot().await?;
        let (role, shard_id) = classify_role(&snapshot, mining_key);
        let account_key = find_public_key(&snapshot, mining_key);

        Ok(ValidatorOverview {
            mining_key: mining_key.to_string(),
            epoch: snapshot.epoch,
            beacon_height: snapshot.beacon_height,
            role,
            shard_id,
            public_key: account_key.map(str::to_string),
            reward_receiver: account_key
                .and_then(|k| snapshot.reward_receiver_of(k))
                .map(str::to_string),
            staking_tx: account_key
                .and_then(|k| snapshot.staking_tx_hash(k))
                .map(str::to_string),
            missing_signature: account_key
                .and_then(|k| snapshot.missing_signature.get(k))
                .cloned(),
            penalty: account_key
                .and_then(|k| snapshot.missing_signature_penalty.get(k))
                .cloned(),
        })
    }
}

/// Snapshot-wide view of one validator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorOverview {
    pub mining_key: String,
    pub epoch: u64,
    pub beacon_height: u64,
    pub role: RoleStatus,
    pub shard_id: Option<u8>,
    pub public_key: Option<String>,
    /// Reward address as recorded in the snapshot, not the staking transaction
    pub reward_receiver: Option<String>,
    pub staking_tx: Option<String>,
    pub missing_signature: Option<MissingSignature>,
    pub penalty: Option<SignaturePenalty>,
}
