//! Namespaced cache keys.

use std::path::{Path, PathBuf};

use tonearm_core::{validate_id, CatalogResult, EntityKind};

/// Cache key for one entity.
///
/// Can only be built through [`CacheKey::new`], which rejects ids that are
/// unsafe as file names, so every key maps to a path inside the cache root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: EntityKind,
    id: String,
}

impl CacheKey {
    pub fn new(kind: EntityKind, id: &str) -> CatalogResult<Self> {
        validate_id(id)?;
        Ok(Self {
            kind,
            id: id.to_string(),
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `{namespace}_{id}`, the in-memory form.
    pub fn memory_key(&self) -> String {
        format!("{}_{}", self.kind.namespace(), self.id)
    }

    /// `{base}/{namespace}/{id}.json`, the on-disk form.
    pub fn file_path(&self, base: &Path) -> PathBuf {
        base.join(self.kind.namespace())
            .join(format!("{}.json", self.id))
    }
}
