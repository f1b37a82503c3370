//! Catalog configuration.
//!
//! Values are loaded from environment variables with defaults suitable for
//! the public MusicBrainz web service. Each cache tier is toggled by its own
//! section: an empty filesystem directory or a zero memory capacity disables
//! that tier.

use std::path::PathBuf;
use std::time::Duration;

use crate::ConfigError;

// ============================================================================
// CACHE SECTIONS
// ============================================================================

/// Filesystem cache settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsCacheConfig {
    /// Root directory of the durable cache. `None` or empty disables the tier.
    pub base_dir: Option<PathBuf>,
}

impl FsCacheConfig {
    /// The configured directory, if the tier is enabled.
    pub fn enabled_dir(&self) -> Option<&PathBuf> {
        self.base_dir
            .as_ref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

/// In-memory cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCacheConfig {
    /// Maximum number of records. Zero disables the tier.
    pub capacity: usize,
    /// Time-to-live of each record from insertion.
    pub ttl: Duration,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl: Duration::from_secs(10 * 60),
        }
    }
}

// ============================================================================
// CATALOG CONFIGURATION
// ============================================================================

/// Configuration of the full catalog stack.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Base URL of the remote catalog web service.
    pub base_url: String,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Per-request transport timeout.
    pub timeout: Duration,
    /// Number of retries after the first attempt.
    pub retry_count: u32,
    /// Initial backoff between retries.
    pub retry_wait: Duration,
    /// Upper bound on a single backoff.
    pub retry_max_wait: Duration,
    /// Steady admission rate in events per second.
    pub rate_limit: f64,
    /// Token bucket size.
    pub rate_burst: u32,
    pub memory_cache: MemoryCacheConfig,
    pub fs_cache: FsCacheConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://musicbrainz.org/ws/2".to_string(),
            user_agent: concat!("tonearm/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            retry_count: 20,
            retry_wait: Duration::from_secs(5),
            retry_max_wait: Duration::from_secs(60),
            rate_limit: 1.0,
            rate_burst: 3,
            memory_cache: MemoryCacheConfig::default(),
            fs_cache: FsCacheConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

impl CatalogConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create CatalogConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TONEARM_BASE_URL`: Remote catalog base URL
    /// - `TONEARM_USER_AGENT`: User-Agent header
    /// - `TONEARM_TIMEOUT_SECS`: Request timeout (default: 30)
    /// - `TONEARM_RETRY_COUNT`: Retries after the first attempt (default: 20)
    /// - `TONEARM_RETRY_WAIT_MS`: Initial backoff (default: 5000)
    /// - `TONEARM_RETRY_MAX_WAIT_MS`: Maximum backoff (default: 60000)
    /// - `TONEARM_RATE_LIMIT`: Requests per second (default: 1.0)
    /// - `TONEARM_RATE_BURST`: Burst size (default: 3)
    /// - `TONEARM_CACHE_SIZE`: In-memory capacity, 0 or negative disables (default: 1000)
    /// - `TONEARM_CACHE_TTL_SECS`: In-memory TTL (default: 600)
    /// - `TONEARM_CACHE_DIR`: Filesystem cache directory (default: disabled)
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("TONEARM_BASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.base_url);

        let user_agent = std::env::var("TONEARM_USER_AGENT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.user_agent);

        let timeout = env_parse::<u64>("TONEARM_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let retry_count = env_parse("TONEARM_RETRY_COUNT").unwrap_or(defaults.retry_count);

        let retry_wait = env_parse::<u64>("TONEARM_RETRY_WAIT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_wait);

        let retry_max_wait = env_parse::<u64>("TONEARM_RETRY_MAX_WAIT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_max_wait);

        let rate_limit = env_parse("TONEARM_RATE_LIMIT").unwrap_or(defaults.rate_limit);
        let rate_burst = env_parse("TONEARM_RATE_BURST").unwrap_or(defaults.rate_burst);

        let capacity = env_parse::<i64>("TONEARM_CACHE_SIZE")
            .map(|size| size.max(0) as usize)
            .unwrap_or(defaults.memory_cache.capacity);

        let ttl = env_parse::<u64>("TONEARM_CACHE_TTL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.memory_cache.ttl);

        let base_dir = std::env::var("TONEARM_CACHE_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            base_url,
            user_agent,
            timeout,
            retry_count,
            retry_wait,
            retry_max_wait,
            rate_limit,
            rate_burst,
            memory_cache: MemoryCacheConfig { capacity, ttl },
            fs_cache: FsCacheConfig { base_dir },
        }
    }

    /// Check that the values can drive a working stack.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "base_url".to_string(),
            });
        }
        if !self.rate_limit.is_finite() || self.rate_limit <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "rate_limit".to_string(),
                value: self.rate_limit.to_string(),
                reason: "must be a positive number of events per second".to_string(),
            });
        }
        if self.rate_burst == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rate_burst".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "timeout".to_string(),
                value: "0s".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.retry_wait > self.retry_max_wait {
            return Err(ConfigError::InvalidValue {
                field: "retry_wait".to_string(),
                value: format!("{:?}", self.retry_wait),
                reason: format!("exceeds retry_max_wait ({:?})", self.retry_max_wait),
            });
        }
        Ok(())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry count and the backoff bounds.
    pub fn with_retry(mut self, count: u32, wait: Duration, max_wait: Duration) -> Self {
        self.retry_count = count;
        self.retry_wait = wait;
        self.retry_max_wait = max_wait;
        self
    }

    pub fn with_rate_limit(mut self, per_second: f64, burst: u32) -> Self {
        self.rate_limit = per_second;
        self.rate_burst = burst;
        self
    }

    /// Set the in-memory tier. A capacity of zero disables it.
    pub fn with_memory_cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.memory_cache = MemoryCacheConfig { capacity, ttl };
        self
    }

    pub fn with_fs_cache(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.fs_cache.base_dir = Some(base_dir.into());
        self
    }

    pub fn without_fs_cache(mut self) -> Self {
        self.fs_cache.base_dir = None;
        self
    }
}
