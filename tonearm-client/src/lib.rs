//! tonearm Client - Catalog Assembly
//!
//! Builds the layered catalog from a [`CatalogConfig`]. Layers, innermost
//! first:
//!
//! 1. [`RemoteCatalog`] over an [`HttpRequester`] (or a supplied requester)
//! 2. [`RateLimitedCatalog`], always present
//! 3. [`FsCache`], when `fs_cache.base_dir` is set
//! 4. [`MemoryCache`], when `memory_cache.capacity > 0`
//!
//! The result is a [`SharedCatalog`]; callers cannot tell which tier
//! answered.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tonearm_cache::{FsCache, MemoryCache};
use tonearm_remote::{HttpRequester, RateLimitedCatalog, RemoteCatalog, Requester};
use tracing::info;

pub mod telemetry;

pub use tonearm_core::*;

/// Assembles a catalog stack from configuration.
pub struct CatalogBuilder {
    config: CatalogConfig,
    requester: Option<Arc<dyn Requester>>,
}

impl CatalogBuilder {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            requester: None,
        }
    }

    /// Use `requester` instead of an HTTP client built from the config.
    pub fn requester(mut self, requester: Arc<dyn Requester>) -> Self {
        self.requester = Some(requester);
        self
    }

    pub fn build(self) -> CatalogResult<SharedCatalog> {
        let config = self.config;
        config.validate()?;

        let requester = match self.requester {
            Some(requester) => requester,
            None => Arc::new(HttpRequester::from_config(&config)?),
        };
        info!(base_url = %config.base_url, "Using remote catalog");

        let limited = RateLimitedCatalog::new(
            RemoteCatalog::new(requester),
            config.rate_limit,
            config.rate_burst,
        )?;
        info!(
            rate_limit = config.rate_limit,
            burst = config.rate_burst,
            "Rate limiting enabled"
        );
        let mut catalog: SharedCatalog = Arc::new(limited);

        if let Some(base_dir) = config.fs_cache.enabled_dir() {
            info!(base_dir = %base_dir.display(), "Filesystem cache enabled");
            catalog = Arc::new(FsCache::new(catalog, base_dir.clone()));
        }

        if let Some(capacity) = NonZeroUsize::new(config.memory_cache.capacity) {
            info!(
                capacity,
                ttl_secs = config.memory_cache.ttl.as_secs(),
                "Memory cache enabled"
            );
            catalog = Arc::new(MemoryCache::new(
                catalog,
                capacity,
                config.memory_cache.ttl,
            ));
        }

        Ok(catalog)
    }
}

/// Assemble the stack described by `config` over HTTP.
pub fn build_catalog(config: &CatalogConfig) -> CatalogResult<SharedCatalog> {
    CatalogBuilder::new(config.clone()).build()
}
