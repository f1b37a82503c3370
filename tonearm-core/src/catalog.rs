//! The catalog contract shared by the remote fetcher and every decorator.
//!
//! Layers are composed by delegation: each one holds an inner `Catalog` and
//! either answers from its own store or forwards the call. Because every
//! layer implements the same trait, the stack can be assembled in any order
//! and callers cannot tell which tier answered.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Artist, CatalogResult, Record, Release, ReleaseGroup, RequestContext,
    SearchReleaseGroupRequest, SearchReleaseGroupResult, SearchReleaseRequest,
    SearchReleaseResult,
};

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn artist(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Artist>>;

    async fn release(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Release>>;

    async fn release_group(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CatalogResult<Record<ReleaseGroup>>;

    /// Search releases. Results are never cached.
    async fn search_release(
        &self,
        ctx: &RequestContext,
        request: &SearchReleaseRequest,
    ) -> CatalogResult<SearchReleaseResult>;

    /// Search release groups. Results are never cached.
    async fn search_release_group(
        &self,
        ctx: &RequestContext,
        request: &SearchReleaseGroupRequest,
    ) -> CatalogResult<SearchReleaseGroupResult>;
}

/// Shared handle to an assembled catalog stack.
pub type SharedCatalog = Arc<dyn Catalog>;

macro_rules! forward_catalog {
    ($wrapper:ty) => {
        #[async_trait]
        impl<C: Catalog + ?Sized> Catalog for $wrapper {
            async fn artist(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Artist>> {
                (**self).artist(ctx, id).await
            }

            async fn release(
                &self,
                ctx: &RequestContext,
                id: &str,
            ) -> CatalogResult<Record<Release>> {
                (**self).release(ctx, id).await
            }

            async fn release_group(
                &self,
                ctx: &RequestContext,
                id: &str,
            ) -> CatalogResult<Record<ReleaseGroup>> {
                (**self).release_group(ctx, id).await
            }

            async fn search_release(
                &self,
                ctx: &RequestContext,
                request: &SearchReleaseRequest,
            ) -> CatalogResult<SearchReleaseResult> {
                (**self).search_release(ctx, request).await
            }

            async fn search_release_group(
                &self,
                ctx: &RequestContext,
                request: &SearchReleaseGroupRequest,
            ) -> CatalogResult<SearchReleaseGroupResult> {
                (**self).search_release_group(ctx, request).await
            }
        }
    };
}

forward_catalog!(Arc<C>);
forward_catalog!(Box<C>);
