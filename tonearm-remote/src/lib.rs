//! tonearm Remote - Fetching from the Catalog Service
//!
//! [`RemoteCatalog`] turns [`Catalog`](tonearm_core::Catalog) calls into
//! lookups and searches against the remote web service through a
//! [`Requester`]. [`HttpRequester`] is the production transport (reqwest,
//! retries with backoff). [`RateLimitedCatalog`] gates any catalog behind a
//! shared token bucket.

pub mod http;
pub mod limiter;
pub mod remote;
pub mod requester;

pub use http::{HttpRequester, RetryPolicy};
pub use limiter::{quota, RateLimitedCatalog};
pub use remote::RemoteCatalog;
pub use requester::{RawResponse, Requester};

#[cfg(test)]
pub(crate) mod testing {
    //! Canned transport for unit tests in this crate.

    use std::sync::Mutex;

    use async_trait::async_trait;
    use tonearm_core::{CatalogResult, RequestContext};

    use crate::{RawResponse, Requester};

    /// Answers every request with the same status and body and records the
    /// path and query of each call.
    pub struct StaticRequester {
        status: u16,
        body: String,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl StaticRequester {
        pub fn new(status: u16, body: impl Into<String>) -> Self {
            Self {
                status,
                body: body.into(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Requester for StaticRequester {
        async fn get(
            &self,
            ctx: &RequestContext,
            path: &str,
            query: &[(&str, String)],
        ) -> CatalogResult<RawResponse> {
            ctx.run(async {
                self.calls.lock().unwrap().push((
                    path.to_string(),
                    query
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.clone()))
                        .collect(),
                ));
                Ok(RawResponse {
                    status: self.status,
                    body: self.body.clone(),
                })
            })
            .await
        }
    }
}
