//! Request context threaded through every catalog call.
//!
//! Carries a cancellation token and an optional deadline. Every layer that
//! can suspend (rate-limit waits, HTTP calls, backoff sleeps, filesystem I/O)
//! runs that work through [`RequestContext::run`], which aborts with
//! [`CatalogError::Cancelled`] as soon as either signal fires.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context driven by an externally owned cancellation token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a context that also expires after `timeout`.
    ///
    /// An existing earlier deadline is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            token: self.token.clone(),
            deadline: Some(match self.deadline {
                Some(existing) if existing < deadline => existing,
                _ => deadline,
            }),
        }
    }

    /// Derive a context that is cancelled together with this one, but can
    /// also be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drive `fut` to completion unless the context fires first.
    pub async fn run<F, T>(&self, fut: F) -> CatalogResult<T>
    where
        F: Future<Output = CatalogResult<T>>,
    {
        if self.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(CatalogError::Cancelled),
            _ = expired => Err(CatalogError::Cancelled),
            result = fut => result,
        }
    }

    /// Sleep for `duration`, waking early with `Cancelled` if the context fires.
    pub async fn sleep(&self, duration: Duration) -> CatalogResult<()> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes_when_not_cancelled() {
        let ctx = RequestContext::new();
        let value = ctx.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_short_circuits_when_already_cancelled() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let result = ctx
            .run(async { Err::<(), _>(CatalogError::client("polled")) })
            .await;
        assert_eq!(result, Err(CatalogError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_pending_work() {
        let ctx = RequestContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result = ctx.sleep(Duration::from_secs(3600)).await;
        assert_eq!(result, Err(CatalogError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_pending_work() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(100));
        let started = Instant::now();
        let result = ctx.sleep(Duration::from_secs(10)).await;
        assert_eq!(result, Err(CatalogError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_child_follows_parent_but_not_the_reverse() {
        let parent = RequestContext::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let other_child = parent.child();
        parent.cancel();
        assert!(other_child.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_keeps_earlier_deadline() {
        let short = RequestContext::new().with_timeout(Duration::from_secs(1));
        let longer = short.with_timeout(Duration::from_secs(60));
        assert_eq!(short.deadline(), longer.deadline());
    }
}
