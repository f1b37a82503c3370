//! Token-bucket admission in front of any catalog.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tonearm_core::{
    validate_id, Artist, Catalog, CatalogResult, ConfigError, Record, Release, ReleaseGroup,
    RequestContext, SearchReleaseGroupRequest, SearchReleaseGroupResult, SearchReleaseRequest,
    SearchReleaseResult,
};
use tracing::trace;

/// Build a quota admitting `per_second` events on average with bursts of up
/// to `burst`.
pub fn quota(per_second: f64, burst: u32) -> Result<Quota, ConfigError> {
    let invalid_rate = || ConfigError::InvalidValue {
        field: "rate_limit".to_string(),
        value: per_second.to_string(),
        reason: "must be a positive, finite number of events per second".to_string(),
    };

    if !per_second.is_finite() || per_second <= 0.0 {
        return Err(invalid_rate());
    }
    let period = Duration::try_from_secs_f64(1.0 / per_second).map_err(|_| invalid_rate())?;
    let burst = NonZeroU32::new(burst).ok_or_else(|| ConfigError::InvalidValue {
        field: "rate_burst".to_string(),
        value: burst.to_string(),
        reason: "must be at least 1".to_string(),
    })?;

    Quota::with_period(period)
        .map(|quota| quota.allow_burst(burst))
        .ok_or_else(invalid_rate)
}

/// Waits for a rate-limit token before every call to the inner catalog.
///
/// The limiter is shared by all clones and concurrent callers. A cancelled
/// wait never reaches the inner catalog. Lookups with an invalid id fail
/// before taking a token.
#[derive(Clone)]
pub struct RateLimitedCatalog<C> {
    inner: C,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<C: Catalog> RateLimitedCatalog<C> {
    pub fn new(inner: C, per_second: f64, burst: u32) -> CatalogResult<Self> {
        let quota = quota(per_second, burst)?;
        Ok(Self::with_limiter(inner, Arc::new(RateLimiter::direct(quota))))
    }

    /// Share an existing limiter, e.g. between catalogs hitting the same host.
    pub fn with_limiter(inner: C, limiter: Arc<DefaultDirectRateLimiter>) -> Self {
        Self { inner, limiter }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn admit(&self, ctx: &RequestContext) -> CatalogResult<()> {
        ctx.run(async {
            self.limiter.until_ready().await;
            Ok(())
        })
        .await?;
        trace!("Rate limit token acquired");
        Ok(())
    }
}

#[async_trait]
impl<C: Catalog> Catalog for RateLimitedCatalog<C> {
    async fn artist(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Artist>> {
        validate_id(id)?;
        self.admit(ctx).await?;
        self.inner.artist(ctx, id).await
    }

    async fn release(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Release>> {
        validate_id(id)?;
        self.admit(ctx).await?;
        self.inner.release(ctx, id).await
    }

    async fn release_group(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CatalogResult<Record<ReleaseGroup>> {
        validate_id(id)?;
        self.admit(ctx).await?;
        self.inner.release_group(ctx, id).await
    }

    async fn search_release(
        &self,
        ctx: &RequestContext,
        request: &SearchReleaseRequest,
    ) -> CatalogResult<SearchReleaseResult> {
        self.admit(ctx).await?;
        self.inner.search_release(ctx, request).await
    }

    async fn search_release_group(
        &self,
        ctx: &RequestContext,
        request: &SearchReleaseGroupRequest,
    ) -> CatalogResult<SearchReleaseGroupResult> {
        self.admit(ctx).await?;
        self.inner.search_release_group(ctx, request).await
    }
}

impl<C> std::fmt::Debug for RateLimitedCatalog<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedCatalog").finish_non_exhaustive()
    }
}
