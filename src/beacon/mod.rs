//! Beacon best state: the snapshot model and the cache that serves it

pub mod cache;
pub mod state;

pub use cache::{BeaconCacheConfig, BeaconStateCache, CacheStats, DEFAULT_FRESHNESS_WINDOW};
pub use state::{
    BeaconBestState, CommitteeMember, MiningPublicKey, MissingSignature, SignaturePenalty,
    SnapshotSummary,
};
