//! Beacon best state snapshot
//!
//! Mirrors the `getbeaconbeststatedetail` result. Only the fields the
//! dashboard reads are modelled; everything else in the payload is ignored.
//! A snapshot is never mutated after decoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Validator signing keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningPublicKey {
    #[serde(default, alias = "Bls", alias = "BLS")]
    pub bls: String,
    #[serde(default, alias = "Dsa", alias = "DSA")]
    pub dsa: String,
}

/// One entry of a committee or candidate pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    /// Account (staking/reward) public key
    #[serde(rename = "IncPubKey", alias = "AccountPublicKey", default)]
    pub account_public_key: String,

    #[serde(rename = "MiningPubKey", alias = "MiningPublicKey", default)]
    pub mining_public_key: MiningPublicKey,

    /// Only present on `AutoStaking` entries
    #[serde(rename = "IsAutoStake", default, skip_serializing_if = "Option::is_none")]
    pub auto_stake: Option<bool>,
}

impl CommitteeMember {
    /// Lookup identity is the BLS mining key alone
    pub fn matches_mining_key(&self, mining_key: &str) -> bool {
        !mining_key.is_empty() && self.mining_public_key.bls == mining_key
    }
}

/// Signature participation counters for one validator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingSignature {
    #[serde(rename = "ActualTotal", default)]
    pub actual_total: u64,
    #[serde(rename = "Missing", default)]
    pub missing: u64,
}

/// Penalty applied for missing signatures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePenalty {
    #[serde(rename = "MinPercent", default)]
    pub min_percent: u64,
    #[serde(rename = "Time", default)]
    pub time: i64,
    #[serde(rename = "ForceUnstake", default)]
    pub force_unstake: bool,
}

/// Root coordination snapshot of the chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeaconBestState {
    #[serde(rename = "BestBlockHash", default)]
    pub best_block_hash: String,

    #[serde(rename = "BeaconHeight", default)]
    pub beacon_height: u64,

    #[serde(rename = "Epoch", default)]
    pub epoch: u64,

    #[serde(rename = "ActiveShards", default)]
    pub active_shards: u32,

    #[serde(rename = "MinShardCommitteeSize", default)]
    pub min_shard_committee_size: u32,

    #[serde(rename = "MaxShardCommitteeSize", default)]
    pub max_shard_committee_size: u32,

    #[serde(
        rename = "BestShardHeight",
        alias = "ShardHeight",
        default,
        deserialize_with = "null_as_default"
    )]
    pub shard_height: BTreeMap<u8, u64>,

    #[serde(rename = "BeaconCommittee", default, deserialize_with = "members_from_seq_or_map")]
    pub beacon_committee: Vec<CommitteeMember>,

    #[serde(
        rename = "CandidateShardWaitingForCurrentRandom",
        default,
        deserialize_with = "members_from_seq_or_map"
    )]
    pub candidate_shard_waiting_for_current_random: Vec<CommitteeMember>,

    #[serde(
        rename = "CandidateShardWaitingForNextRandom",
        default,
        deserialize_with = "members_from_seq_or_map"
    )]
    pub candidate_shard_waiting_for_next_random: Vec<CommitteeMember>,

    #[serde(rename = "ShardCommittee", default, deserialize_with = "null_as_default")]
    pub shard_committee: BTreeMap<u8, Vec<CommitteeMember>>,

    #[serde(rename = "ShardPendingValidator", default, deserialize_with = "null_as_default")]
    pub shard_pending_validator: BTreeMap<u8, Vec<CommitteeMember>>,

    #[serde(rename = "SyncingValidator", default, deserialize_with = "null_as_default")]
    pub syncing_validator: BTreeMap<u8, Vec<CommitteeMember>>,

    #[serde(rename = "AutoStaking", default, deserialize_with = "null_as_default")]
    pub auto_staking: Vec<CommitteeMember>,

    /// Account key -> reward payment address
    #[serde(rename = "RewardReceiver", default, deserialize_with = "null_as_default")]
    pub reward_receiver: BTreeMap<String, String>,

    /// Account key -> staking transaction hash
    #[serde(rename = "StakingTx", default, deserialize_with = "null_as_default")]
    pub staking_tx: BTreeMap<String, String>,

    #[serde(rename = "MissingSignature", default, deserialize_with = "null_as_default")]
    pub missing_signature: BTreeMap<String, MissingSignature>,

    #[serde(rename = "MissingSignaturePenalty", default, deserialize_with = "null_as_default")]
    pub missing_signature_penalty: BTreeMap<String, SignaturePenalty>,
}

/// Headline numbers for a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub epoch: u64,
    pub beacon_height: u64,
    pub best_block_hash: String,
    pub active_shards: u32,
    pub min_shard_committee_size: u32,
    pub max_shard_committee_size: u32,
    pub beacon_committee: usize,
    pub shard_committee: usize,
    pub shard_pending: usize,
    pub syncing: usize,
    pub waiting_current_random: usize,
    pub waiting_next_random: usize,
    pub auto_staking: usize,
}

impl BeaconBestState {
    /// Staking transaction hash recorded for an account key
    pub fn staking_tx_hash(&self, account_key: &str) -> Option<&str> {
        self.staking_tx.get(account_key).map(String::as_str)
    }

    /// Reward address recorded for an account key
    pub fn reward_receiver_of(&self, account_key: &str) -> Option<&str> {
        self.reward_receiver.get(account_key).map(String::as_str)
    }

    pub fn summary(&self) -> SnapshotSummary {
        fn count(pools: &BTreeMap<u8, Vec<CommitteeMember>>) -> usize {
            pools.values().map(Vec::len).sum()
        }

        SnapshotSummary {
            epoch: self.epoch,
            beacon_height: self.beacon_height,
            best_block_hash: self.best_block_hash.clone(),
            active_shards: self.active_shards,
            min_shard_committee_size: self.min_shard_committee_size,
            max_shard_committee_size: self.max_shard_committee_size,
            beacon_committee: self.beacon_committee.len(),
            shard_committee: count(&self.shard_committee),
            shard_pending: count(&self.shard_pending_validator),
            syncing: count(&self.syncing_validator),
            waiting_current_random: self.candidate_shard_waiting_for_current_random.len(),
            waiting_next_random: self.candidate_shard_waiting_for_next_random.len(),
            auto_staking: self.auto_staking.len(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Some pools arrive as a list, others as an object keyed by account key.
/// Both decode to a flat list; a keyed entry without its own account key
/// inherits the map key.
fn members_from_seq_or_map<'de, D>(deserializer: D) -> Result<Vec<CommitteeMember>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pool {
        List(Vec<CommitteeMember>),
        Keyed(BTreeMap<String, CommitteeMember>),
    }

    let members = match Option::<Pool>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Pool::List(list)) => list,
        Some(Pool::Keyed(map)) => map
            .into_iter()
            .map(|(account_key, mut member)| {
                if member.account_public_key.is_empty() {
                    member.account_public_key = account_key;
                }
                member
            })
            .collect(),
    };
    Ok(members)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn member(account: &str, bls: &str) -> CommitteeMember {
        CommitteeMember {
            account_public_key: account.to_string(),
            mining_public_key: MiningPublicKey {
                bls: bls.to_string(),
                dsa: format!("dsa-{}", bls),
            },
            auto_stake: None,
        }
    }

    #[test]
    fn test_decode_detail_payload() {
        let state: BeaconBestState = serde_json::from_value(json!({
            "BestBlockHash": "abc",
            "BeaconHeight": 1200,
            "Epoch": 34,
            "ActiveShards": 8,
            "MinShardCommitteeSize": 4,
            "MaxShardCommitteeSize": 32,
            "BestShardHeight": { "0": 500, "1": 501 },
            "BeaconCommittee": [
                { "IncPubKey": "acct-b", "MiningPubKey": { "bls": "bls-b", "dsa": "dsa-b" } }
            ],
            "ShardCommittee": {
                "1": [ { "IncPubKey": "acct-1", "MiningPubKey": { "bls": "bls-1", "dsa": "d" } } ],
                "0": []
            },
            "SyncingValidator": null,
            "AutoStaking": [
                { "IncPubKey": "acct-a", "MiningPubKey": { "bls": "bls-a", "dsa": "d" }, "IsAutoStake": true }
            ],
            "StakingTx": { "acct-a": "tx-a" },
            "RewardReceiver": { "acct-a": "addr-a" },
            "MissingSignature": { "acct-a": { "ActualTotal": 100, "Missing": 3 } },
            "SomethingElse": { "ignored": true }
        }))
        .unwrap();

        assert_eq!(state.epoch, 34);
        assert_eq!(state.shard_height.get(&1), Some(&501));
        assert_eq!(state.beacon_committee[0].mining_public_key.bls, "bls-b");
        assert_eq!(state.shard_committee.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert!(state.syncing_validator.is_empty());
        assert_eq!(state.auto_staking[0].auto_stake, Some(true));
        assert_eq!(state.staking_tx_hash("acct-a"), Some("tx-a"));
        assert_eq!(state.reward_receiver_of("acct-a"), Some("addr-a"));
        assert_eq!(state.missing_signature["acct-a"].missing, 3);
    }

    #[test]
    fn test_keyed_pool_inherits_account_key() {
        let state: BeaconBestState = serde_json::from_value(json!({
            "CandidateShardWaitingForNextRandom": {
                "acct-x": { "MiningPubKey": { "bls": "bls-x", "dsa": "d" } }
            }
        }))
        .unwrap();

        let pool = &state.candidate_shard_waiting_for_next_random;
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].account_public_key, "acct-x");
        assert!(pool[0].matches_mining_key("bls-x"));
    }

    #[test]
    fn test_empty_mining_key_never_matches() {
        let m = member("acct", "");
        assert!(!m.matches_mining_key(""));
    }

    #[test]
    fn test_summary_counts() {
        let mut state = BeaconBestState {
            epoch: 7,
            ..Default::default()
        };
        state.shard_committee.insert(0, vec![member("a", "1"), member("b", "2")]);
        state.shard_committee.insert(3, vec![member("c", "3")]);
        state.candidate_shard_waiting_for_current_random.push(member("d", "4"));

        let summary = state.summary();
        assert_eq!(summary.epoch, 7);
        assert_eq!(summary.shard_committee, 3);
        assert_eq!(summary.waiting_current_random, 1);
        assert_eq!(summary.syncing, 0);
    }
}
