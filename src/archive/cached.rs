//! Gateway response cache
//!
//! LRU cache in front of another gateway, keyed by the full query
//! coordinates. Supports:
//! - O(1) eviction via the `lru` crate
//! - TTL-based expiration for freshness
//! - Clone-out semantics: every caller gets its own copy, so no two requests
//!   ever share a table instance
//!
//! Errors are never cached.

use super::{ArchiveGateway, QueryCoordinates};
use crate::config::CacheConfig;
use crate::error::{GatewayError, Result};
use crate::metrics;
use crate::table::ReportData;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cached response with its insertion time
struct CacheEntry {
    data: ReportData,
    cached_at: Instant,
}

impl CacheEntry {
    fn new(data: ReportData) -> Self {
        Self {
            data,
            cached_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Cache statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups forwarded to the inner gateway
    pub misses: u64,
    /// Entries currently held
    pub entries: usize,
}

/// Memoizing gateway decorator
pub struct CachedGateway<G> {
    inner: G,
    entries: Mutex<LruCache<QueryCoordinates, CacheEntry>>,
    ttl: Duration,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<G: ArchiveGateway> CachedGateway<G> {
    /// Wrap a gateway
    ///
    /// Fails with a configuration error when the cache is enabled with no
    /// room for entries.
    pub fn new(inner: G, config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        // a disabled cache never stores entries
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl(),
            enabled: config.enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// The wrapped gateway
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Current statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().len(),
        }
    }

    fn lookup(&self, coords: &QueryCoordinates) -> Option<ReportData> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(coords) {
            Some(entry) if !entry.is_expired(self.ttl) => return Some(entry.data.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(coords);
        }
        None
    }
}

#[async_trait]
impl<G: ArchiveGateway> ArchiveGateway for CachedGateway<G> {
    async fn fetch(&self, coords: &QueryCoordinates) -> std::result::Result<ReportData, GatewayError> {
        if !self.enabled {
            return self.inner.fetch(coords).await;
        }

        if let Some(data) = self.lookup(coords) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_lookup(true);
            debug!("Cache hit for {} subtable={:?}", coords.dataset(), coords.subtable_id());
            return Ok(data);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_lookup(false);

        let data = self.inner.fetch(coords).await?;
        self.entries
            .lock()
            .put(coords.clone(), CacheEntry::new(data.clone()));
        Ok(data)
    }
}
