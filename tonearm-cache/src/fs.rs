//! Durable filesystem tier.
//!
//! Each entity lives in its own file at `{base}/{namespace}/{id}.json`,
//! holding the pretty-printed [`Record`] envelope. Files are written to a
//! temporary sibling and renamed into place, so a reader never sees a
//! partial entry. A write runs on the blocking pool and finishes even when
//! the caller is cancelled, ending with either the entry in place or the
//! temporary file removed. Entries are never expired or revalidated.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tonearm_core::{
    Artist, Catalog, CatalogEntity, CatalogError, CatalogResult, Record, Release, ReleaseGroup,
    RequestContext, SearchReleaseGroupRequest, SearchReleaseGroupResult, SearchReleaseRequest,
    SearchReleaseResult,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::CacheKey;

/// Filesystem cache in front of `inner`.
#[derive(Debug, Clone)]
pub struct FsCache<C> {
    inner: C,
    base_dir: PathBuf,
}

impl<C: Catalog> FsCache<C> {
    /// Directories are created on first write.
    pub fn new(inner: C, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            base_dir: base_dir.into(),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    async fn lookup<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        id: &str,
        fetch: F,
    ) -> CatalogResult<Record<T>>
    where
        T: CatalogEntity,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CatalogResult<Record<T>>>,
    {
        let path = CacheKey::new(T::KIND, id)?.file_path(&self.base_dir);

        if let Some(record) = ctx.run(read_entry::<T>(&path)).await? {
            debug!(kind = %T::KIND, id, "Filesystem cache hit");
            return Ok(record);
        }

        debug!(kind = %T::KIND, id, "Filesystem cache miss");
        let record = fetch().await?.restamp();

        if let Err(err) = ctx.run(write_entry(&path, &record)).await {
            if !err.is_cancelled() {
                warn!(kind = %T::KIND, id, error = %err, "Failed to write cache entry");
            }
            return Err(err);
        }
        Ok(record)
    }
}

fn io_error(path: &Path, err: impl std::fmt::Display) -> CatalogError {
    CatalogError::cache_io(path.display(), err)
}

/// `Ok(None)` when no entry exists.
async fn read_entry<T: DeserializeOwned>(path: &Path) -> CatalogResult<Option<Record<T>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| io_error(path, format!("Corrupt cache entry: {}", e)))
}

async fn write_entry<T: Serialize>(path: &Path, record: &Record<T>) -> CatalogResult<()> {
    let bytes = serde_json::to_vec_pretty(record).map_err(|e| io_error(path, e))?;
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || persist(&target, &bytes))
        .await
        .map_err(|e| io_error(path, e))?
}

/// Write `bytes` to a temporary sibling of `path` and rename it into place.
/// On any failure the temporary file is removed.
fn persist(path: &Path, bytes: &[u8]) -> CatalogResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io_error(path, "Cache entry has no parent directory"))?;
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{}.{}.tmp", file_name, Uuid::now_v7()));

    if let Err(e) = std::fs::write(&tmp, bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_error(&tmp, e));
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_error(path, e));
    }
    Ok(())
}

#[async_trait]
impl<C: Catalog> Catalog for FsCache<C> {
    async fn artist(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Artist>> {
        self.lookup(ctx, id, || self.inner.artist(ctx, id)).await
    }

    async fn release(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Release>> {
        self.lookup(ctx, id, || self.inner.release(ctx, id)).await
    }

    async fn release_group(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CatalogResult<Record<ReleaseGroup>> {
        self.lookup(ctx, id, || self.inner.release_group(ctx, id))
            .await
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

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tonearm_core::EntityKind;
    use tonearm_test_utils::{assertions, fixtures, MockCatalog};

    fn setup() -> (TempDir, Arc<MockCatalog>, FsCache<Arc<MockCatalog>>) {
        let dir = tempfile::tempdir().unwrap();
        let inner = Arc::new(fixtures::air_catalog());
        let cache = FsCache::new(inner.clone(), dir.path());
        (dir, inner, cache)
    }

    #[tokio::test]
    async fn test_miss_writes_pretty_envelope() {
        let (dir, inner, cache) = setup();
        let ctx = RequestContext::new();

        let record = cache
            .release_group(&ctx, fixtures::MOON_SAFARI_GROUP_ID)
            .await
            .unwrap();

        let path = dir
            .path()
            .join("releasegroup")
            .join(format!("{}.json", fixtures::MOON_SAFARI_GROUP_ID));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'), "entry should be pretty-printed");

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("date").is_some());
        assert_eq!(value["data"]["title"], "Moon Safari");

        let stored: Record<ReleaseGroup> = serde_json::from_str(&text).unwrap();
        assert_eq!(stored, record);
        assert_eq!(
            inner.calls_for(EntityKind::ReleaseGroup, fixtures::MOON_SAFARI_GROUP_ID),
            1
        );
    }

    #[tokio::test]
    async fn test_hit_returns_stored_record_verbatim() {
        let (dir, inner, cache) = setup();
        let stored = Record::new(
            fixtures::artist(fixtures::AIR_ID, "Air (from disk)"),
            fixtures::fetched_long_ago(),
        );
        let artist_dir = dir.path().join("artist");
        std::fs::create_dir_all(&artist_dir).unwrap();
        std::fs::write(
            artist_dir.join(format!("{}.json", fixtures::AIR_ID)),
            serde_json::to_vec_pretty(&stored).unwrap(),
        )
        .unwrap();

        let record = cache
            .artist(&RequestContext::new(), fixtures::AIR_ID)
            .await
            .unwrap();

        assert_eq!(record, stored);
        assert_eq!(inner.lookup_calls(), 0);
    }

    #[tokio::test]
    async fn test_second_lookup_served_from_disk() {
        let (_dir, inner, cache) = setup();
        let ctx = RequestContext::new();

        let first = cache.release(&ctx, fixtures::MOON_SAFARI_ID).await.unwrap();
        let second = cache.release(&ctx, fixtures::MOON_SAFARI_ID).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls_for(EntityKind::Release, fixtures::MOON_SAFARI_ID), 1);
    }

    #[tokio::test]
    async fn test_miss_restamps_fetched_at() {
        let dir = tempfile::tempdir().unwrap();
        let inner = Arc::new(
            MockCatalog::new().with_artist(fixtures::artist(fixtures::AIR_ID, "Air")),
        );
        let cache = FsCache::new(inner, dir.path());
        let before = chrono::Utc::now();

        let record = cache
            .artist(&RequestContext::new(), fixtures::AIR_ID)
            .await
            .unwrap();

        assert!(record.fetched_at >= before);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_cache_io_without_remote_call() {
        let (dir, inner, cache) = setup();
        let artist_dir = dir.path().join("artist");
        std::fs::create_dir_all(&artist_dir).unwrap();
        std::fs::write(
            artist_dir.join(format!("{}.json", fixtures::AIR_ID)),
            b"{ not json",
        )
        .unwrap();

        let result = cache.artist(&RequestContext::new(), fixtures::AIR_ID).await;

        assertions::assert_cache_io(&result);
        assert_eq!(inner.lookup_calls(), 0);
    }

    #[tokio::test]
    async fn test_not_found_writes_nothing() {
        let (dir, inner, cache) = setup();
        let ctx = RequestContext::new();

        for _ in 0..2 {
            let result = cache.artist(&ctx, fixtures::MISSING_ID).await;
            assertions::assert_not_found(&result, EntityKind::Artist, fixtures::MISSING_ID);
        }

        assert!(!dir.path().join("artist").exists());
        assert_eq!(inner.calls_for(EntityKind::Artist, fixtures::MISSING_ID), 2);
    }

    #[tokio::test]
    async fn test_unwritable_base_is_cache_io() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the base directory should be.
        let base = dir.path().join("blocked");
        std::fs::write(&base, b"").unwrap();
        let cache = FsCache::new(Arc::new(fixtures::air_catalog()), &base);

        let result = cache.artist(&RequestContext::new(), fixtures::AIR_ID).await;

        assertions::assert_cache_io(&result);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let (dir, _inner, cache) = setup();
        cache
            .artist(&RequestContext::new(), fixtures::AIR_ID)
            .await
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path().join("artist"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![format!("{}.json", fixtures::AIR_ID)]);
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                    .filter(|name| name.ends_with(".tmp"))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory squatting on the entry path makes the rename fail.
        let squatter = dir.path().join("artist").join("a-1.json");
        std::fs::create_dir_all(squatter.join("occupied")).unwrap();

        let err = persist(&squatter, b"{}").unwrap_err();

        assert!(matches!(err, CatalogError::CacheIo { .. }));
        assert!(leftovers(&dir.path().join("artist")).is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_write_finishes_without_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = CacheKey::new(EntityKind::Artist, fixtures::AIR_ID)
            .unwrap()
            .file_path(dir.path());
        let record = Record::now(fixtures::artist(fixtures::AIR_ID, "Air"));
        let ctx = RequestContext::new();
        let canceller = ctx.clone();

        let (result, ()) = tokio::join!(ctx.run(write_entry(&path, &record)), async {
            canceller.cancel()
        });
        assert_eq!(result, Err(CatalogError::Cancelled));

        // The write was already handed off and lands on its own.
        let mut waited = 0;
        while !path.exists() && waited < 200 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            waited += 1;
        }
        let stored: Record<Artist> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored, record);
        assert!(leftovers(path.parent().unwrap()).is_empty());
    }

    #[tokio::test]
    async fn test_search_passes_through() {
        let (dir, inner, cache) = setup();
        let result = cache
            .search_release(&RequestContext::new(), &SearchReleaseRequest::default())
            .await
            .unwrap();

        assert_eq!(result.releases.len(), 1);
        assert_eq!(inner.search_calls(), 1);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_invalid_id_touches_nothing() {
        let (dir, inner, cache) = setup();
        let err = cache
            .artist(&RequestContext::new(), "../escape")
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::InvalidId { .. }));
        assert_eq!(inner.lookup_calls(), 0);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_everything() {
        let (_dir, inner, cache) = setup();
        let ctx = RequestContext::new();
        ctx.cancel();

        let err = cache.artist(&ctx, fixtures::AIR_ID).await.unwrap_err();

        assert_eq!(err, CatalogError::Cancelled);
        assert_eq!(inner.lookup_calls(), 0);
    }
}
