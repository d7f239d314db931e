//! Ordered search across the snapshot's committee and candidate pools
//!
//! Each lookup is a list of steps evaluated in order; the first member whose
//! BLS key matches wins. Flat steps name one pool. A per-shard step walks the
//! shards in ascending id and, inside each shard, tries its pools in the
//! listed order before moving to the next shard.

use serde::{Deserialize, Serialize};

use crate::beacon::{BeaconBestState, CommitteeMember};

/// Role a validator holds in the current snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleStatus {
    Waiting,
    Committee,
    Pending,
    Syncing,
    NotStaked,
}

impl std::fmt::Display for RoleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Waiting => "WAITING",
            Self::Committee => "COMMITTEE",
            Self::Pending => "PENDING",
            Self::Syncing => "SYNCING",
            Self::NotStaked => "NOT_STAKED",
        };
        f.write_str(label)
    }
}

/// Pools that are not split by shard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatPool {
    AutoStaking,
    BeaconCommittee,
    CandidateShardWaitingForCurrentRandom,
    CandidateShardWaitingForNextRandom,
}

impl FlatPool {
    pub fn members(self, state: &BeaconBestState) -> &[CommitteeMember] {
        match self {
            Self::AutoStaking => &state.auto_staking,
            Self::BeaconCommittee => &state.beacon_committee,
            Self::CandidateShardWaitingForCurrentRandom => {
                &state.candidate_shard_waiting_for_current_random
            }
            Self::CandidateShardWaitingForNextRandom => {
                &state.candidate_shard_waiting_for_next_random
            }
        }
    }
}

/// Pools indexed by shard id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardPool {
    ShardCommittee,
    ShardPendingValidator,
    SyncingValidator,
}

impl ShardPool {
    pub fn members(self, state: &BeaconBestState, shard_id: u8) -> &[CommitteeMember] {
        let pools = match self {
            Self::ShardCommittee => &state.shard_committee,
            Self::ShardPendingValidator => &state.shard_pending_validator,
            Self::SyncingValidator => &state.syncing_validator,
        };
        pools.get(&shard_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One step of a precedence list, tagged with what a match in it means
#[derive(Debug, Clone, Copy)]
pub enum SearchStep<T: 'static> {
    Flat(FlatPool, T),
    PerShard(&'static [(ShardPool, T)]),
}

/// Member found by a search, with the tag of the step that found it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit<'a, T> {
    pub member: &'a CommitteeMember,
    pub tag: T,
    /// Shard the member was found in, for per-shard steps
    pub shard_id: Option<u8>,
}

const SHARD_POOLS_BY_ROLE: &[(ShardPool, RoleStatus)] = &[
    (ShardPool::ShardCommittee, RoleStatus::Committee),
    (ShardPool::ShardPendingValidator, RoleStatus::Pending),
    (ShardPool::SyncingValidator, RoleStatus::Syncing),
];

/// Role classification order. No hit means `NotStaked`.
pub const ROLE_PRECEDENCE: &[SearchStep<RoleStatus>] = &[
    SearchStep::Flat(
        FlatPool::CandidateShardWaitingForCurrentRandom,
        RoleStatus::Waiting,
    ),
    SearchStep::Flat(
        FlatPool::CandidateShardWaitingForNextRandom,
        RoleStatus::Waiting,
    ),
    SearchStep::PerShard(SHARD_POOLS_BY_ROLE),
];

const SHARD_POOLS: &[(ShardPool, ())] = &[
    (ShardPool::ShardCommittee, ()),
    (ShardPool::ShardPendingValidator, ()),
    (ShardPool::SyncingValidator, ()),
];

/// Account public key resolution order
pub const PUBLIC_KEY_PRECEDENCE: &[SearchStep<()>] = &[
    SearchStep::Flat(FlatPool::AutoStaking, ()),
    SearchStep::Flat(FlatPool::BeaconCommittee, ()),
    SearchStep::Flat(FlatPool::CandidateShardWaitingForCurrentRandom, ()),
    SearchStep::Flat(FlatPool::CandidateShardWaitingForNextRandom, ()),
    SearchStep::PerShard(SHARD_POOLS),
];

/// Walk `steps` in order and return the first member matching `mining_key`
pub fn search<'a, T: Copy>(
    state: &'a BeaconBestState,
    steps: &[SearchStep<T>],
    mining_key: &str,
) -> Option<Hit<'a, T>> {
    for step in steps {
        match *step {
            SearchStep::Flat(pool, tag) => {
                if let Some(member) = find(pool.members(state), mining_key) {
                    return Some(Hit {
                        member,
                        tag,
                        shard_id: None,
                    });
                }
            }
            SearchStep::PerShard(pools) => {
                for shard_id in shard_ids(state) {
                    for &(pool, tag) in pools {
                        if let Some(member) = find(pool.members(state, shard_id), mining_key) {
                            return Some(Hit {
                                member,
                                tag,
                                shard_id: Some(shard_id),
                            });
                        }
                    }
                }
            }
        }
    }
    None
}

/// Role held by `mining_key`, and the shard it holds it in
pub fn classify_role(state: &BeaconBestState, mining_key: &str) -> (RoleStatus, Option<u8>) {
    search(state, ROLE_PRECEDENCE, mining_key)
        .map(|hit| (hit.tag, hit.shard_id))
        .unwrap_or((RoleStatus::NotStaked, None))
}

/// Account public key registered for `mining_key`
pub fn find_public_key<'a>(state: &'a BeaconBestState, mining_key: &str) -> Option<&'a str> {
    search(state, PUBLIC_KEY_PRECEDENCE, mining_key)
        .map(|hit| hit.member.account_public_key.as_str())
        .filter(|key| !key.is_empty())
}

fn find<'a>(members: &'a [CommitteeMember], mining_key: &str) -> Option<&'a CommitteeMember> {
    members.iter().find(|m| m.matches_mining_key(mining_key))
}

/// Every shard id present in any shard-indexed pool, ascending
fn shard_ids(state: &BeaconBestState) -> Vec<u8> {
    let mut ids: Vec<u8> = state
        .shard_committee
        .keys()
        .chain(state.shard_pending_validator.keys())
        .chain(state.syncing_validator.keys())
        .copied()
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::state::tests::member;

    #[test]
    fn test_waiting_outranks_shard_committee() {
        let mut state = BeaconBestState::default();
        state
            .candidate_shard_waiting_for_current_random
            .push(member("acct-w", "bls-1"));
        state.shard_committee.insert(2, vec![member("acct-c", "bls-1")]);

        assert_eq!(classify_role(&state, "bls-1"), (RoleStatus::Waiting, None));
    }

    #[test]
    fn test_next_random_is_waiting() {
        let mut state = BeaconBestState::default();
        state
            .candidate_shard_waiting_for_next_random
            .push(member("acct", "bls-n"));

        assert_eq!(classify_role(&state, "bls-n").0, RoleStatus::Waiting);
    }

    #[test]
    fn test_shard_pools_map_to_statuses() {
        let mut state = BeaconBestState::default();
        state.shard_committee.insert(0, vec![member("a", "bls-c")]);
        state.shard_pending_validator.insert(1, vec![member("b", "bls-p")]);
        state.syncing_validator.insert(5, vec![member("c", "bls-s")]);

        assert_eq!(classify_role(&state, "bls-c"), (RoleStatus::Committee, Some(0)));
        assert_eq!(classify_role(&state, "bls-p"), (RoleStatus::Pending, Some(1)));
        assert_eq!(classify_role(&state, "bls-s"), (RoleStatus::Syncing, Some(5)));
    }

    #[test]
    fn test_lower_shard_wins_over_pool_order() {
        // Shard 0 syncing is checked before shard 1 committee
        let mut state = BeaconBestState::default();
        state.syncing_validator.insert(0, vec![member("a", "bls-x")]);
        state.shard_committee.insert(1, vec![member("b", "bls-x")]);

        assert_eq!(classify_role(&state, "bls-x"), (RoleStatus::Syncing, Some(0)));
    }

    #[test]
    fn test_shard_ids_iterate_numerically() {
        let mut state = BeaconBestState::default();
        state.shard_committee.insert(10, vec![member("ten", "bls-d")]);
        state.shard_pending_validator.insert(2, vec![member("two", "bls-d")]);

        assert_eq!(find_public_key(&state, "bls-d"), Some("two"));
        assert_eq!(classify_role(&state, "bls-d"), (RoleStatus::Pending, Some(2)));
    }

    #[test]
    fn test_unknown_key_is_not_staked() {
        let mut state = BeaconBestState::default();
        state.beacon_committee.push(member("acct-b", "bls-b"));

        // Beacon committee is not part of role classification
        assert_eq!(classify_role(&state, "bls-b"), (RoleStatus::NotStaked, None));
        assert_eq!(classify_role(&state, "nobody"), (RoleStatus::NotStaked, None));
    }

    #[test]
    fn test_auto_staking_outranks_beacon_committee() {
        let mut state = BeaconBestState::default();
        state.auto_staking.push(member("acct-auto", "bls-1"));
        state.beacon_committee.push(member("acct-beacon", "bls-1"));

        assert_eq!(find_public_key(&state, "bls-1"), Some("acct-auto"));
    }

    #[test]
    fn test_public_key_from_candidate_and_shard_pools() {
        let mut state = BeaconBestState::default();
        state
            .candidate_shard_waiting_for_next_random
            .push(member("acct-next", "bls-n"));
        state.syncing_validator.insert(3, vec![member("acct-sync", "bls-s")]);

        assert_eq!(find_public_key(&state, "bls-n"), Some("acct-next"));
        assert_eq!(find_public_key(&state, "bls-s"), Some("acct-sync"));
        assert_eq!(find_public_key(&state, "bls-missing"), None);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let mut state = BeaconBestState::default();
        state.beacon_committee.push(member("first", "dup"));
        state.beacon_committee.push(member("second", "dup"));

        assert_eq!(find_public_key(&state, "dup"), Some("first"));
    }

    #[test]
    fn test_hit_reports_matching_step() {
        let mut state = BeaconBestState::default();
        state.shard_committee.insert(4, vec![member("acct", "bls")]);

        let hit = search(&state, ROLE_PRECEDENCE, "bls").unwrap();
        assert_eq!(hit.tag, RoleStatus::Committee);
        assert_eq!(hit.shard_id, Some(4));
        assert_eq!(hit.member.account_public_key, "acct");
    }

    #[test]
    fn test_role_status_labels() {
        assert_eq!(RoleStatus::NotStaked.to_string(), "NOT_STAKED");
        assert_eq!(
            serde_json::to_value(RoleStatus::Committee).unwrap(),
            serde_json::json!("COMMITTEE")
        );
    }
}
