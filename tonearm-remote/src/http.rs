//! reqwest transport with retry and backoff

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, StatusCode};
use tonearm_core::{CatalogConfig, CatalogError, CatalogResult, RequestContext};
use tracing::{debug, warn};

use crate::{RawResponse, Requester};

/// How failed exchanges are retried.
///
/// Transport errors, `429` and `5xx` responses are retried up to
/// `max_retries` times. The wait before retry `n` (zero-based) is
/// `initial_wait * 2^n`, or the server's `Retry-After` when present, and never
/// exceeds `max_wait`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 20,
            initial_wait: Duration::from_secs(5),
            max_wait: Duration::from_secs(60),
        }
    }
}

/// Outcome of one exchange, before the retry decision.
#[derive(Debug)]
pub(crate) enum Attempt {
    Done(RawResponse),
    Retry {
        reason: String,
        retry_after: Option<Duration>,
        last: Option<RawResponse>,
    },
}

impl RetryPolicy {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            initial_wait: config.retry_wait,
            max_wait: config.retry_max_wait,
        }
    }

    /// Wait before retry number `retry` (zero-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_wait.saturating_mul(factor).min(self.max_wait)
    }

    fn wait_for(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .unwrap_or_else(|| self.backoff(retry))
            .min(self.max_wait)
    }

    /// Drive `attempt` until it yields a final response or retries run out.
    ///
    /// When retries are exhausted on an error status, that last response is
    /// returned so the caller can map its status.
    pub(crate) async fn run<F, Fut>(
        &self,
        ctx: &RequestContext,
        path: &str,
        mut attempt: F,
    ) -> CatalogResult<RawResponse>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt>,
    {
        let mut retries = 0u32;
        loop {
            let outcome = ctx.run(async { Ok(attempt().await) }).await?;
            match outcome {
                Attempt::Done(response) => return Ok(response),
                Attempt::Retry {
                    reason,
                    retry_after,
                    last,
                } => {
                    if retries >= self.max_retries {
                        return match last {
                            Some(response) => Ok(response),
                            None => Err(CatalogError::client(reason)),
                        };
                    }
                    let wait = self.wait_for(retries, retry_after);
                    retries += 1;
                    warn!(
                        path,
                        attempt = retries,
                        wait_ms = wait.as_millis() as u64,
                        reason = %reason,
                        "Retrying catalog request"
                    );
                    ctx.sleep(wait).await?;
                }
            }
        }
    }
}

/// Production [`Requester`] backed by a reqwest client.
#[derive(Clone)]
pub struct HttpRequester {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpRequester {
    pub fn new(client: Client, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    /// Build a client with the configured timeout and `User-Agent`.
    pub fn from_config(config: &CatalogConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CatalogError::client(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::new(
            client,
            config.base_url.clone(),
            RetryPolicy::from_config(config),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send_once(&self, url: &str, query: &[(&str, String)]) -> Attempt {
        let response = match self.client.get(url).query(query).send().await {
            Ok(response) => response,
            Err(e) => {
                return Attempt::Retry {
                    reason: format!("HTTP request failed: {}", e),
                    retry_after: None,
                    last: None,
                }
            }
        };

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Attempt::Retry {
                    reason: format!("Failed to read response body: {}", e),
                    retry_after,
                    last: None,
                }
            }
        };

        debug!(url, status = status.as_u16(), "Catalog response");
        let raw = RawResponse {
            status: status.as_u16(),
            body,
        };

        if is_retryable(status) {
            Attempt::Retry {
                reason: status.to_string(),
                retry_after,
                last: Some(raw),
            }
        } else {
            Attempt::Done(raw)
        }
    }
}

#[async_trait]
impl Requester for HttpRequester {
    async fn get(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &[(&str, String)],
    ) -> CatalogResult<RawResponse> {
        let url = self.url(path);
        self.retry
            .run(ctx, path, || self.send_once(&url, query))
            .await
    }
}

impl std::fmt::Debug for HttpRequester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequester")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
}

// =============================================================================
// TESTS
// =============================================================================
