//! In-memory LRU tier with per-entry expiry.

use std::any::Any;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use tokio::time::Instant;
use tonearm_core::{
    Artist, Catalog, CatalogEntity, CatalogResult, EntityKind, Record, Release, ReleaseGroup,
    RequestContext, SearchReleaseGroupRequest, SearchReleaseGroupResult, SearchReleaseRequest,
    SearchReleaseResult,
};
use tracing::debug;

use crate::stats::{CacheStats, Counters};
use crate::CacheKey;

struct Entry {
    record: Box<dyn Any + Send + Sync>,
    inserted_at: Instant,
}

/// Bounded in-memory cache in front of `inner`.
///
/// An entry is served while its age is at most the TTL, and a hit refreshes
/// its recency but not its age. Expired entries are dropped on access.
/// The lock is never held while the inner catalog runs, so concurrent misses
/// on the same key each reach `inner` and the last insert wins.
pub struct MemoryCache<C> {
    inner: C,
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
    counters: Counters,
}

impl<C: Catalog> MemoryCache<C> {
    pub fn new(inner: C, capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            counters: Counters::default(),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a live entry exists, without touching recency or counters.
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        let Ok(key) = CacheKey::new(kind, id) else {
            return false;
        };
        self.entries()
            .peek(&key.memory_key())
            .is_some_and(|entry| entry.inserted_at.elapsed() <= self.ttl)
    }

    pub fn stats(&self) -> CacheStats {
        let entry_count = self.len();
        self.counters.snapshot(entry_count)
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get<T: CatalogEntity>(&self, key: &str) -> Option<Record<T>> {
        let mut entries = self.entries();

        let expired = entries.peek(key)?.inserted_at.elapsed() > self.ttl;
        if expired {
            entries.pop(key);
            self.counters.expiration();
            return None;
        }

        entries
            .get(key)
            .and_then(|entry| entry.record.downcast_ref::<Record<T>>())
            .cloned()
    }

    fn insert<T: CatalogEntity>(&self, key: String, record: Record<T>) {
        let entry = Entry {
            record: Box::new(record),
            inserted_at: Instant::now(),
        };
        let mut entries = self.entries();
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                self.counters.eviction();
                debug!(key = %evicted, "Evicted least recently used entry");
            }
        }
    }

    async fn lookup<T, F, Fut>(&self, id: &str, fetch: F) -> CatalogResult<Record<T>>
    where
        T: CatalogEntity,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CatalogResult<Record<T>>>,
    {
        let key = CacheKey::new(T::KIND, id)?.memory_key();

        if let Some(record) = self.get::<T>(&key) {
            self.counters.hit();
            debug!(kind = %T::KIND, id, "Memory cache hit");
            return Ok(record);
        }

        self.counters.miss();
        debug!(kind = %T::KIND, id, "Memory cache miss");
        let record = fetch().await?;
        self.insert(key, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl<C: Catalog> Catalog for MemoryCache<C> {
    async fn artist(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Artist>> {
        self.lookup(id, || self.inner.artist(ctx, id)).await
    }

    async fn release(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Release>> {
        self.lookup(id, || self.inner.release(ctx, id)).await
    }

    async fn release_group(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CatalogResult<Record<ReleaseGroup>> {
        self.lookup(id, || self.inner.release_group(ctx, id)).await
    }

    async fn search_release(
        &self,
        ctx: &RequestContext,
        request: &SearchReleaseRequest,
    ) -> CatalogResult<SearchReleaseResult> {
        self.inner.search_release(ctx, request).await
    }

    async fn search_release_group(
        &self,
        ctx: &RequestContext,
        request: &SearchReleaseGroupRequest,
    ) -> CatalogResult<SearchReleaseGroupResult> {
        self.inner.search_release_group(ctx, request).await
    }
}

impl<C> std::fmt::Debug for MemoryCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
