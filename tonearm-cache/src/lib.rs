//! tonearm Cache - Caching Decorators
//!
//! Two [`Catalog`](tonearm_core::Catalog) decorators that answer lookups
//! from their own store and fall back to the wrapped catalog on a miss:
//!
//! - [`FsCache`]: one pretty-printed JSON file per entity under
//!   `{base}/{namespace}/{id}.json`. Entries never expire.
//! - [`MemoryCache`]: bounded LRU with a per-entry time-to-live.
//!
//! Searches always pass straight through. Failed lookups are never cached.

mod key;
mod stats;

pub mod fs;
pub mod memory;

pub use fs::FsCache;
pub use key::CacheKey;
pub use memory::MemoryCache;
pub use stats::CacheStats;
