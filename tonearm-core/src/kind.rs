//! Entity kinds and the per-kind descriptor used by every catalog layer.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

use crate::{CatalogError, CatalogResult};

/// Entity kind discriminator.
///
/// Identifies both the remote resource path and the cache namespace, so two
/// entities of different kinds never share a cache slot even when their ids
/// are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Artist,
    Release,
    ReleaseGroup,
}

impl EntityKind {
    /// All kinds, in declaration order.
    pub const ALL: [EntityKind; 3] = [Self::Artist, Self::Release, Self::ReleaseGroup];

    /// Path segment of the remote resource (`{base}/{path}/{id}`).
    pub fn path(&self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Release => "release",
            Self::ReleaseGroup => "release-group",
        }
    }

    /// Namespace used by the cache tiers for keys and directories.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Release => "release",
            Self::ReleaseGroup => "releasegroup",
        }
    }

    /// Sub-resources expanded on every lookup of this kind.
    pub fn includes(&self) -> &'static [&'static str] {
        match self {
            Self::Artist => &["tags", "url-rels"],
            Self::Release => &[
                "artists",
                "labels",
                "recordings",
                "release-groups",
                "url-rels",
            ],
            Self::ReleaseGroup => &["artists", "genres", "url-rels"],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Check that `id` is usable both as a URL path segment and as a cache file
/// name. Only unreserved URL characters (ASCII alphanumerics and `-._~`) are
/// accepted, and `.` or `..` runs are rejected.
pub fn validate_id(id: &str) -> CatalogResult<()> {
    let invalid = id.is_empty()
        || id == "."
        || id.contains("..")
        || !id.chars().all(is_unreserved);
    if invalid {
        return Err(CatalogError::InvalidId { id: id.to_string() });
    }
    Ok(())
}

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

/// A payload type that can be fetched by id and cached.
///
/// Binds each domain record to its [`EntityKind`] so the fetch and cache
/// helpers can be written once and parameterized by the payload type.
pub trait CatalogEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;
}

impl CatalogEntity for crate::Artist {
    const KIND: EntityKind = EntityKind::Artist;
}

impl CatalogEntity for crate::Release {
    const KIND: EntityKind = EntityKind::Release;
}

impl CatalogEntity for crate::ReleaseGroup {
    const KIND: EntityKind = EntityKind::ReleaseGroup;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Artist, Release, ReleaseGroup};

    #[test]
    fn test_namespaces_are_distinct() {
        let mut namespaces: Vec<_> = EntityKind::ALL.iter().map(|k| k.namespace()).collect();
        namespaces.sort();
        namespaces.dedup();
        assert_eq!(namespaces.len(), EntityKind::ALL.len());
    }

    #[test]
    fn test_paths_and_includes() {
        assert_eq!(EntityKind::ReleaseGroup.path(), "release-group");
        assert_eq!(EntityKind::ReleaseGroup.namespace(), "releasegroup");
        assert_eq!(EntityKind::Artist.includes().join("+"), "tags+url-rels");
        assert!(EntityKind::Release.includes().contains(&"recordings"));
    }

    #[test]
    fn test_entity_kind_binding() {
        assert_eq!(Artist::KIND, EntityKind::Artist);
        assert_eq!(Release::KIND, EntityKind::Release);
        assert_eq!(ReleaseGroup::KIND, EntityKind::ReleaseGroup);
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("b10bbbfc-cf9e-42e0-be17-e2c3e1d2600d").is_ok());
        assert!(validate_id("nonexistent-id").is_ok());
        assert!(validate_id("rg_1.v2~x").is_ok());
        for bad in [
            "", "  ", ".", "..", "../etc/passwd", "a/b", "a\\b", "a\0b", "a?b", "a#b", "a%2Fb",
            "a b", "a&inc=x", "caf\u{e9}",
        ] {
            assert!(
                matches!(validate_id(bad), Err(CatalogError::InvalidId { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&EntityKind::ReleaseGroup).unwrap();
        assert_eq!(json, "\"release-group\"");
    }
}
