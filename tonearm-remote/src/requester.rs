//! The transport seam under [`RemoteCatalog`](crate::RemoteCatalog).

use std::sync::Arc;

use async_trait::async_trait;
use tonearm_core::{CatalogResult, RequestContext};

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a GET against the catalog service.
///
/// `path` is relative to the service base URL. Any response that arrives,
/// whatever its status, is returned as `Ok`; only transport failures (and
/// cancellation) are errors, as `CatalogError::Client` with no status.
#[async_trait]
pub trait Requester: Send + Sync {
    async fn get(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &[(&str, String)],
    ) -> CatalogResult<RawResponse>;
}

#[async_trait]
impl<R: Requester + ?Sized> Requester for Arc<R> {
    async fn get(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &[(&str, String)],
    ) -> CatalogResult<RawResponse> {
        (**self).get(ctx, path, query).await
    }
}
