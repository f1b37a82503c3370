//! The envelope every fetch-by-id returns and every cache tier stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payload paired with the moment it was obtained from the remote catalog.
///
/// `fetched_at` is stamped when the payload arrives from the remote fetcher
/// (or when the filesystem tier persists it) and is carried unchanged through
/// every cache hit afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(rename = "date")]
    pub fetched_at: DateTime<Utc>,
    pub data: T,
}

impl<T> Record<T> {
    pub fn new(data: T, fetched_at: DateTime<Utc>) -> Self {
        Self { fetched_at, data }
    }

    /// Wrap a payload that was obtained just now.
    pub fn now(data: T) -> Self {
        Self::new(data, Utc::now())
    }

    /// Replace the timestamp with the current time.
    pub fn restamp(mut self) -> Self {
        self.fetched_at = Utc::now();
        self
    }
}
