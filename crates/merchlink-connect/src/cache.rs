//! # Inventory Cache
//!
//! Read-through, TTL-bounded cache in front of inventory list queries.
//!
//! ## Lookup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cache Lookup Flow                                   │
//! │                                                                         │
//! │  get(filter) ──► fingerprint ──► fresh entry? ──yes──► shared snapshot │
//! │                                       │                                 │
//! │                                       no                                │
//! │                                       ▼                                 │
//! │                     per-fingerprint flight lock (coalesce)             │
//! │                                       │                                 │
//! │                      re-check ──fresh now?──yes──► snapshot            │
//! │                                       │                                 │
//! │                                       no                                │
//! │                                       ▼                                 │
//! │                            upstream fetch (one caller)                 │
//! │                             │                    │                      │
//! │                          success              failure                   │
//! │                             │                    │                      │
//! │                     store + return     stale entry? ──yes──► serve it  │
//! │                                              │        (last resort)    │
//! │                                              no ──► surface error      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries are immutable snapshots replaced wholesale on refresh - never
//! mutated in place. Concurrent misses for one fingerprint coalesce into a
//! single upstream call; all waiters receive the same result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use merchlink_core::{ConnectorResult, InventoryItem, ItemFilter};

/// Shared, immutable result snapshot.
pub type ItemsSnapshot = Arc<Vec<InventoryItem>>;

// =============================================================================
// Cache Entry
// =============================================================================

/// One cached query result. Immutable: refresh replaces the whole entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: ItemsSnapshot,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.inserted_at) <= ttl
    }
}

// =============================================================================
// Cache Statistics
// =============================================================================

/// Counters for cache observability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Fresh-entry hits (including coalesced waiters).
    pub hits: u64,
    /// Misses that went upstream.
    pub misses: u64,
    /// Upstream failures served from an expired entry.
    pub stale_fallbacks: u64,
    /// Whole-cache invalidations.
    pub invalidations: u64,
}

#[derive(Debug, Default)]
struct StatCells {
    hits: AtomicU64,
    misses: AtomicU64,
    stale_fallbacks: AtomicU64,
    invalidations: AtomicU64,
}

// =============================================================================
// Inventory Cache
// =============================================================================

/// Coalescing, bounded-staleness cache keyed by filter fingerprint.
pub struct InventoryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,

    /// Per-fingerprint flight locks. A miss acquires its fingerprint's lock
    /// before fetching, so concurrent misses for the same filter make one
    /// upstream call and share the result.
    flights: Mutex<HashMap<String, Arc<Mutex<()>>>>,

    stats: StatCells,
}

impl InventoryCache {
    /// Creates a cache with the given entry TTL.
    pub fn new(ttl: Duration) -> Self {
        InventoryCache {
            ttl,
            entries: RwLock::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
            stats: StatCells::default(),
        }
    }

    /// The configured entry TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read-through lookup.
    ///
    /// Returns the cached snapshot when fresh; otherwise invokes `fetch`
    /// (coalesced per fingerprint) and stores the result. If the fetch fails
    /// after the retry policy is exhausted upstream, an expired entry is
    /// served as a last resort - except for cancellation, which is terminal
    /// and never answered from the cache.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        filter: &ItemFilter,
        fetch: F,
    ) -> ConnectorResult<ItemsSnapshot>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ConnectorResult<Vec<InventoryItem>>>,
    {
        let key = filter.fingerprint();

        if let Some(snapshot) = self.lookup_fresh(&key).await {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            debug!(fingerprint = %key, "cache hit");
            return Ok(snapshot);
        }

        // Coalesce: one flight per fingerprint.
        let flight = self.flight_lock(&key).await;
        let _in_flight = flight.lock().await;

        // A coalesced waiter finds the entry the leader just stored.
        if let Some(snapshot) = self.lookup_fresh(&key).await {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            debug!(fingerprint = %key, "cache hit after coalesced refresh");
            return Ok(snapshot);
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        debug!(fingerprint = %key, "cache miss, fetching upstream");

        match fetch().await {
            Ok(items) => {
                let snapshot: ItemsSnapshot = Arc::new(items);
                let entry = CacheEntry {
                    snapshot: snapshot.clone(),
                    inserted_at: Instant::now(),
                };
                self.entries.write().await.insert(key, entry);
                Ok(snapshot)
            }
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                // Last resort: the previous (possibly expired) snapshot.
                if let Some(stale) = self.lookup_any(&key).await {
                    self.stats.stale_fallbacks.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        fingerprint = %key,
                        error = %err,
                        "upstream fetch failed, serving stale entry"
                    );
                    Ok(stale)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Clears all entries. Called explicitly and after every successful
    /// write operation.
    pub async fn invalidate(&self) {
        self.entries.write().await.clear();
        // Drop flight locks nobody is holding; held ones stay valid.
        self.flights
            .lock()
            .await
            .retain(|_, flight| Arc::strong_count(flight) > 1);
        self.stats.invalidations.fetch_add(1, Ordering::Relaxed);
        info!("inventory cache invalidated");
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            stale_fallbacks: self.stats.stale_fallbacks.load(Ordering::Relaxed),
            invalidations: self.stats.invalidations.load(Ordering::Relaxed),
        }
    }

    async fn lookup_fresh(&self, key: &str) -> Option<ItemsSnapshot> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        entry
            .is_fresh(self.ttl, Instant::now())
            .then(|| entry.snapshot.clone())
    }

    async fn lookup_any(&self, key: &str) -> Option<ItemsSnapshot> {
        self.entries
            .read()
            .await
            .get(key)
            .map(|entry| entry.snapshot.clone())
    }

    async fn flight_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.flights
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .clone()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use merchlink_core::{ConnectorError, Environment, PriceType};
    use std::sync::atomic::AtomicU32;

    fn item(id: &str) -> InventoryItem {
        InventoryItem {
            id: id.to_string(),
            name: format!("Item {id}"),
            price_cents: 100,
            price_type: PriceType::Fixed,
            category_id: None,
            product_code: None,
            hidden: false,
            modified_at: chrono::Utc::now(),
        }
    }

    fn binding_err() -> ConnectorError {
        ConnectorError::Binding {
            environment: Environment::Sandbox,
            reason: "host absent".into(),
        }
    }

    #[tokio::test]
    async fn test_second_read_within_ttl_is_served_from_cache() {
        let cache = InventoryCache::new(Duration::from_secs(300));
        let fetches = AtomicU32::new(0);
        let filter = ItemFilter::by_category("electronics");

        let first = cache
            .get_or_fetch(&filter, || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec![item("a")]) }
            })
            .await
            .unwrap();

        let second = cache
            .get_or_fetch(&filter, || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec![item("b")]) }
            })
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_refetches() {
        let cache = InventoryCache::new(Duration::from_secs(300));
        let fetches = AtomicU32::new(0);
        let filter = ItemFilter::all();

        cache
            .get_or_fetch(&filter, || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec![item("a")]) }
            })
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(301)).await;

        let refreshed = cache
            .get_or_fetch(&filter, || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec![item("b")]) }
            })
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed[0].id, "b");
    }

    #[tokio::test]
    async fn test_concurrent_misses_coalesce() {
        let cache = Arc::new(InventoryCache::new(Duration::from_secs(300)));
        let fetches = Arc::new(AtomicU32::new(0));
        let gate = Arc::new(tokio::sync::Notify::new());
        let filter = ItemFilter::by_category("drinks");

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let fetches = fetches.clone();
            let gate = gate.clone();
            let filter = filter.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(&filter, move || {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        async move {
                            gate.notified().await;
                            Ok(vec![item("shared")])
                        }
                    })
                    .await
            }));
        }

        // Let every task reach the flight lock, then release the one fetch.
        tokio::task::yield_now().await;
        gate.notify_waiters();
        gate.notify_one();

        let mut snapshots = Vec::new();
        for task in tasks {
            snapshots.push(task.await.unwrap().unwrap());
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        for pair in snapshots.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fallback_after_upstream_failure() {
        let cache = InventoryCache::new(Duration::from_secs(300));
        let filter = ItemFilter::all();

        cache
            .get_or_fetch(&filter, || async { Ok(vec![item("old")]) })
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(301)).await;

        let served = cache
            .get_or_fetch(&filter, || async { Err(binding_err()) })
            .await
            .unwrap();

        assert_eq!(served[0].id, "old");
        assert_eq!(cache.stats().stale_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_failure_without_fallback_surfaces_error() {
        let cache = InventoryCache::new(Duration::from_secs(300));
        let result = cache
            .get_or_fetch(&ItemFilter::all(), || async { Err(binding_err()) })
            .await;
        assert!(matches!(result, Err(ConnectorError::Binding { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_is_never_answered_from_stale_entry() {
        let cache = InventoryCache::new(Duration::from_secs(300));
        let filter = ItemFilter::all();

        cache
            .get_or_fetch(&filter, || async { Ok(vec![item("old")]) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;

        let result = cache
            .get_or_fetch(&filter, || async { Err(ConnectorError::Cancelled) })
            .await;
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache = InventoryCache::new(Duration::from_secs(300));
        let fetches = AtomicU32::new(0);
        let filter = ItemFilter::all();

        cache
            .get_or_fetch(&filter, || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec![item("a")]) }
            })
            .await
            .unwrap();

        cache.invalidate().await;

        cache
            .get_or_fetch(&filter, || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec![item("a")]) }
            })
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().invalidations, 1);
    }
}
