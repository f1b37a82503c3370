//! Error types for catalog operations

use crate::EntityKind;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for every catalog layer.
///
/// Layers propagate inner errors unchanged; a layer only produces a new
/// variant for failures that originate in its own store or transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The remote catalog reported that the entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Transport failure, non-success status, or undecodable response.
    #[error("Catalog client error{}: {message}", status_suffix(.status))]
    Client {
        status: Option<u16>,
        message: String,
    },

    /// Filesystem read, write, or (de)serialization failure in the durable tier.
    #[error("Cache I/O error at {path}: {reason}")]
    CacheIo { path: String, reason: String },

    /// The request context was cancelled or its deadline passed.
    #[error("Operation cancelled")]
    Cancelled,

    /// The identifier cannot be used as a lookup or cache key.
    #[error("Invalid identifier: {id:?}")]
    InvalidId { id: String },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl CatalogError {
    /// Build a client error without an HTTP status.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            status: None,
            message: message.into(),
        }
    }

    /// Build a client error carrying the HTTP status that caused it.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Client {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build a cache I/O error for the given path.
    pub fn cache_io(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::CacheIo {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {})", s)).unwrap_or_default()
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// TESTS
// =============================================================================
