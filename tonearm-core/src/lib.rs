//! tonearm Core - Catalog Types and Contract
//!
//! Everything the other tonearm crates share: the entity kinds and their
//! descriptors, the domain records returned by the remote catalog, the
//! [`Record`] envelope, search criteria, the error taxonomy, configuration,
//! the [`RequestContext`] threaded through every call, and the [`Catalog`]
//! trait implemented by the remote fetcher and every cache decorator.

pub mod catalog;
pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod kind;
pub mod record;
pub mod search;

pub use catalog::{Catalog, SharedCatalog};
pub use config::{CatalogConfig, FsCacheConfig, MemoryCacheConfig};
pub use context::RequestContext;
pub use entities::{
    Area, Artist, ArtistCredit, Genre, Label, LabelInfo, LifeSpan, Media, Recording, Relation,
    RelationDetail, Release, ReleaseGroup, ReleaseType, SecondaryReleaseType, Tag,
    TextRepresentation, Track,
};
pub use error::{CatalogError, CatalogResult, ConfigError};
pub use kind::{validate_id, CatalogEntity, EntityKind};
pub use record::Record;
pub use search::{
    SearchReleaseGroupRequest, SearchReleaseGroupResult, SearchReleaseRequest,
    SearchReleaseResult,
};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
