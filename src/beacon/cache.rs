//! Beacon state cache
//!
//! Holds the most recent snapshot together with the instant it was fetched.
//! Within the freshness window the snapshot is served as-is. Once stale, the
//! next caller starts a refresh on a background task and every caller that
//! arrives while it is running waits on the same result.
//!
//! ```text
//! get_snapshot ──fresh──▶ cached Arc
//!      │ stale
//!      ▼
//! refresh in flight? ──yes──▶ subscribe, await shared result
//!      │ no
//!      ▼
//! spawn refresh ──▶ getbeaconbeststatedetail ──▶ store + broadcast
//! ```
//!
//! A failed refresh leaves the previous entry untouched but does not make it
//! fresh again: callers keep triggering refreshes until one succeeds. A
//! refresh task that dies without finishing releases its waiters with
//! `NoResponse` and frees the slot for the next caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::state::BeaconBestState;
use crate::rpc::{NodeRpcClient, METHOD_BEACON_BEST_STATE};
use crate::types::FetchError;

/// Default freshness window for the beacon snapshot
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(12);

type RefreshResult = Result<Arc<BeaconBestState>, FetchError>;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct BeaconCacheConfig {
    /// How long a fetched snapshot is served without asking the node again
    pub freshness_window: Duration,
}

impl Default for BeaconCacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
        }
    }
}

/// Snapshot plus the instant it was fetched
struct CacheEntry {
    fetched_at: Instant,
    snapshot: Arc<BeaconBestState>,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    refreshes: AtomicU64,
    failures: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub has_snapshot: bool,
    pub age_ms: Option<u64>,
    pub hits: u64,
    pub misses: u64,
    /// Callers that joined a refresh already in flight
    pub coalesced: u64,
    pub refreshes: u64,
    pub failures: u64,
}

struct CacheInner {
    rpc: NodeRpcClient,
    config: BeaconCacheConfig,
    entry: RwLock<Option<CacheEntry>>,
    in_flight: InFlight,
    counters: Counters,
}

/// Process-wide beacon snapshot cache. Cloning shares the same state.
#[derive(Clone)]
pub struct BeaconStateCache {
    inner: Arc<CacheInner>,
}

impl BeaconStateCache {
    pub fn new(rpc: NodeRpcClient, config: BeaconCacheConfig) -> Self {
        info!(
            freshness_ms = config.freshness_window.as_millis() as u64,
            endpoint = %rpc.endpoint(),
            "Beacon state cache initialized"
        );

        Self {
            inner: Arc::new(CacheInner {
                rpc,
                config,
                entry: RwLock::new(None),
                in_flight: Mutex::new(None),
                counters: Counters::default(),
            }),
        }
    }

    /// RPC client the cache refreshes through
    pub fn rpc(&self) -> &NodeRpcClient {
        &self.inner.rpc
    }

    /// Current snapshot, refreshing it first if the window has elapsed
    pub async fn get_snapshot(&self) -> Result<Arc<BeaconBestState>, FetchError> {
        if let Some(snapshot) = self.inner.fresh_snapshot() {
            self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Beacon state served from cache");
            return Ok(snapshot);
        }

        let mut receiver = {
            let mut in_flight = lock(&self.inner.in_flight);

            // A refresh may have landed between the check above and the lock
            if let Some(snapshot) = self.inner.fresh_snapshot() {
                self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(snapshot);
            }

            match in_flight.as_ref() {
                Some(sender) => {
                    self.inner.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                    debug!("Joining beacon state refresh already in flight");
                    sender.subscribe()
                }
                None => {
                    self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                    let (sender, receiver) = broadcast::channel(1);
                    *in_flight = Some(sender);

                    let inner = Arc::clone(&self.inner);
                    tokio::spawn(async move {
                        inner.refresh().await;
                    });
                    receiver
                }
            }
        };

        match receiver.recv().await {
            Ok(result) => result,
            Err(_) => Err(FetchError::NoResponse(format!(
                "{} (refresh aborted)",
                METHOD_BEACON_BEST_STATE
            ))),
        }
    }

    /// Drop the cached snapshot so the next call refreshes
    pub fn invalidate(&self) {
        *write(&self.inner.entry) = None;
        debug!("Beacon state cache invalidated");
    }

    pub fn stats(&self) -> CacheStats {
        let entry = read(&self.inner.entry);
        let counters = &self.inner.counters;

        CacheStats {
            has_snapshot: entry.is_some(),
            age_ms: entry
                .as_ref()
                .map(|e| e.fetched_at.elapsed().as_millis() as u64),
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            coalesced: counters.coalesced.load(Ordering::Relaxed),
            refreshes: counters.refreshes.load(Ordering::Relaxed),
            failures: counters.failures.load(Ordering::Relaxed),
        }
    }
}

impl CacheInner {
    fn fresh_snapshot(&self) -> Option<Arc<BeaconBestState>> {
        let entry = read(&self.entry);
        entry
            .as_ref()
            .filter(|e| e.fetched_at.elapsed() < self.config.freshness_window)
            .map(|e| Arc::clone(&e.snapshot))
    }

    async fn refresh(&self) {
        let slot = InFlightSlot::new(&self.in_flight);
        let started = Instant::now();
        let result: RefreshResult = self
            .rpc
            .call::<BeaconBestState>(METHOD_BEACON_BEST_STATE, Vec::new())
            .await
            .map(Arc::new);

        match &result {
            Ok(snapshot) => {
                *write(&self.entry) = Some(CacheEntry {
                    fetched_at: Instant::now(),
                    snapshot: Arc::clone(snapshot),
                });
                self.counters.refreshes.fetch_add(1, Ordering::Relaxed);
                info!(
                    epoch = snapshot.epoch,
                    beacon_height = snapshot.beacon_height,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Beacon state refreshed"
                );
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Beacon state refresh failed");
            }
        }

        // Entry is written before the slot is cleared, so a caller that finds
        // no refresh in flight also finds the new snapshot.
        slot.complete(result);
    }
}

type InFlight = Mutex<Option<broadcast::Sender<RefreshResult>>>;

/// Owns the in-flight slot for the lifetime of one refresh.
///
/// If the refresh future is dropped before completing (panic, runtime
/// shutdown) the slot is cleared on drop. Dropping the sender closes the
/// channel, so waiters wake with an error instead of hanging, and the next
/// stale caller starts a fresh refresh.
struct InFlightSlot<'a> {
    slot: &'a InFlight,
    armed: bool,
}

impl<'a> InFlightSlot<'a> {
    fn new(slot: &'a InFlight) -> Self {
        Self { slot, armed: true }
    }

    fn complete(mut self, result: RefreshResult) {
        self.armed = false;
        let sender = lock(self.slot).take();
        if let Some(sender) = sender {
            // No receivers left is fine: the entry is already stored
            let _ = sender.send(result);
        }
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            let abandoned = lock(self.slot).take();
            drop(abandoned);
            warn!("Beacon state refresh abandoned before completion");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::RpcConfig;

    fn cache() -> BeaconStateCache {
        let rpc = NodeRpcClient::new(RpcConfig::default()).unwrap();
        BeaconStateCache::new(rpc, BeaconCacheConfig::default())
    }

    #[test]
    fn test_default_window_is_twelve_seconds() {
        assert_eq!(
            BeaconCacheConfig::default().freshness_window,
            Duration::from_secs(12)
        );
    }

    #[tokio::test]
    async fn test_new_cache_is_empty() {
        let cache = cache();
        let stats = cache.stats();
        assert!(!stats.has_snapshot);
        assert_eq!(stats.age_ms, None);
        assert_eq!(stats.hits + stats.misses + stats.refreshes, 0);
    }

    #[tokio::test]
    async fn test_fresh_entry_is_served() {
        let cache = cache();
        *write(&cache.inner.entry) = Some(CacheEntry {
            fetched_at: Instant::now(),
            snapshot: Arc::new(BeaconBestState {
                epoch: 9,
                ..Default::default()
            }),
        });

        let snapshot = cache.get_snapshot().await.unwrap();
        assert_eq!(snapshot.epoch, 9);
        assert_eq!(cache.stats().hits, 1);

        cache.invalidate();
        assert!(!cache.stats().has_snapshot);
    }

    #[tokio::test]
    async fn test_abandoned_refresh_frees_slot() {
        let cache = cache();
        let (sender, mut receiver) = broadcast::channel(1);
        *lock(&cache.inner.in_flight) = Some(sender);

        drop(InFlightSlot::new(&cache.inner.in_flight));

        assert!(lock(&cache.inner.in_flight).is_none());
        assert!(matches!(
            receiver.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_completed_refresh_delivers_result() {
        let cache = cache();
        let (first, mut first_rx) = broadcast::channel(1);
        *lock(&cache.inner.in_flight) = Some(first);

        let slot = InFlightSlot::new(&cache.inner.in_flight);
        slot.complete(Err(FetchError::HttpStatus(502)));
        assert_eq!(first_rx.recv().await.unwrap(), Err(FetchError::HttpStatus(502)));
        assert!(lock(&cache.inner.in_flight).is_none());
    }
}
