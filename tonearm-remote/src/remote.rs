//! Catalog backed by the remote web service.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use tonearm_core::{
    validate_id, Artist, Catalog, CatalogEntity, CatalogError, CatalogResult, EntityKind, Record,
    Release, ReleaseGroup, RequestContext, SearchReleaseGroupRequest, SearchReleaseGroupResult,
    SearchReleaseRequest, SearchReleaseResult,
};
use tracing::debug;

use crate::{RawResponse, Requester};

/// Error body returned by the service alongside non-success statuses.
#[derive(Debug, Deserialize)]
struct ServiceError {
    error: String,
}

/// The innermost [`Catalog`]: every call is one request through `R`.
#[derive(Debug, Clone)]
pub struct RemoteCatalog<R> {
    requester: R,
}

impl<R: Requester> RemoteCatalog<R> {
    pub fn new(requester: R) -> Self {
        Self { requester }
    }

    pub fn requester(&self) -> &R {
        &self.requester
    }

    async fn lookup<T: CatalogEntity>(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CatalogResult<Record<T>> {
        validate_id(id)?;
        let kind = T::KIND;
        let path = format!("{}/{}", kind.path(), id);
        let query = [
            ("inc", kind.includes().join("+")),
            ("fmt", "json".to_string()),
        ];

        debug!(%kind, id, "Remote lookup");
        let response = self.requester.get(ctx, &path, &query).await?;

        match response.status {
            404 => Err(CatalogError::NotFound {
                kind,
                id: id.to_string(),
            }),
            _ => decode::<T>(kind, &response).map(Record::now),
        }
    }

    async fn search<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        kind: EntityKind,
        query: String,
    ) -> CatalogResult<T> {
        debug!(%kind, query = %query, "Remote search");
        let params = [("query", query), ("fmt", "json".to_string())];
        let response = self.requester.get(ctx, kind.path(), &params).await?;
        decode(kind, &response)
    }
}

/// Decode a successful response body, or turn the status into an error.
fn decode<T: DeserializeOwned>(kind: EntityKind, response: &RawResponse) -> CatalogResult<T> {
    if !response.is_success() {
        return Err(CatalogError::status(
            response.status,
            error_message(response),
        ));
    }

    serde_json::from_str(&response.body).map_err(|e| {
        CatalogError::client(format!("Failed to parse {} response: {}", kind, e))
    })
}

fn error_message(response: &RawResponse) -> String {
    if let Ok(service_error) = serde_json::from_str::<ServiceError>(&response.body) {
        return service_error.error;
    }
    reqwest::StatusCode::from_u16(response.status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| "Unexpected response".to_string())
}

#[async_trait]
impl<R: Requester> Catalog for RemoteCatalog<R> {
    async fn artist(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Artist>> {
        self.lookup(ctx, id).await
    }

    async fn release(&self, ctx: &RequestContext, id: &str) -> CatalogResult<Record<Release>> {
        self.lookup(ctx, id).await
    }

    async fn release_group(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CatalogResult<Record<ReleaseGroup>> {
        self.lookup(ctx, id).await
    }

    async fn search_release(
        &self,
        ctx: &RequestContext,
        request: &SearchReleaseRequest,
    ) -> CatalogResult<SearchReleaseResult> {
        self.search(ctx, EntityKind::Release, request.query()).await
    }

    async fn search_release_group(
        &self,
        ctx: &RequestContext,
        request: &SearchReleaseGroupRequest,
    ) -> CatalogResult<SearchReleaseGroupResult> {
        self.search(ctx, EntityKind::ReleaseGroup, request.query())
            .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
