//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use validator_dashboard::beacon::{BeaconCacheConfig, BeaconStateCache};
use validator_dashboard::rpc::{NodeRpcClient, RpcConfig};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn client(server: &MockServer) -> NodeRpcClient {
    NodeRpcClient::new(RpcConfig {
        url: server.uri(),
        timeout: Some(Duration::from_secs(5)),
    })
    .unwrap()
}

pub fn cache(server: &MockServer, freshness_window: Duration) -> BeaconStateCache {
    BeaconStateCache::new(client(server), BeaconCacheConfig { freshness_window })
}

pub fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "Result": result, "Error": null }))
}

pub fn rpc_error(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "Result": null,
        "Error": { "Code": -1, "Message": message, "StackTrace": "" }
    }))
}

/// Mock matching any POST for `rpc_method`
pub fn on(rpc_method: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST")).and(body_partial_json(json!({ "method": rpc_method })))
}

/// Mock matching a POST for `rpc_method` with exactly these params
pub fn on_params(rpc_method: &str, params: Value) -> wiremock::MockBuilder {
    Mock::given(method("POST")).and(body_partial_json(
        json!({ "method": rpc_method, "params": params }),
    ))
}

pub fn member(account: &str, bls: &str) -> Value {
    json!({ "IncPubKey": account, "MiningPubKey": { "bls": bls, "dsa": "" } })
}

/// Snapshot where each pool holds one distinct validator, plus a key
/// (`bls-dup`) present in both the waiting list and a shard committee.
pub fn beacon_state() -> Value {
    json!({
        "BestBlockHash": "beacon-best",
        "BeaconHeight": 1200,
        "Epoch": 3,
        "ActiveShards": 2,
        "MinShardCommitteeSize": 4,
        "MaxShardCommitteeSize": 8,
        "BestShardHeight": { "0": 500, "1": 510 },
        "BeaconCommittee": [member("acc-beacon", "bls-beacon")],
        "CandidateShardWaitingForCurrentRandom": [
            member("acc-current", "bls-current"),
            member("acc-dup-waiting", "bls-dup")
        ],
        "CandidateShardWaitingForNextRandom": [member("acc-next", "bls-next")],
        "ShardCommittee": {
            "0": [member("acc-committee", "bls-committee"), member("acc-dup-shard", "bls-dup")],
            "1": [member("acc-committee-1", "bls-committee-1")]
        },
        "ShardPendingValidator": { "1": [member("acc-pending", "bls-pending")] },
        "SyncingValidator": { "0": [member("acc-syncing", "bls-syncing")] },
        "AutoStaking": [member("acc-auto", "bls-auto")],
        "RewardReceiver": { "acc-committee": "addr-snapshot" },
        "StakingTx": {
            "acc-committee": "txhash1",
            "acc-pending": "txhash2",
            "acc-syncing": "txhash3"
        },
        "MissingSignature": { "acc-committee": { "ActualTotal": 100, "Missing": 2 } },
        "MissingSignaturePenalty": null
    })
}

pub fn staking_tx(hash: &str, receiver: &str) -> Value {
    let metadata = json!({
        "Type": 63,
        "FunderPaymentAddress": "funder",
        "RewardReceiverPaymentAddress": receiver,
        "StakingAmountShard": 1_750_000_000_000u64,
        "AutoReStaking": true
    });
    json!({
        "Hash": hash,
        "BlockHash": "blk",
        "BlockHeight": 77,
        "ShardID": 0,
        "IsInBlock": true,
        "Metadata": metadata.to_string()
    })
}
