//! Cache layer
//!
//! In-process TTL cache used for hot read paths (title detail lookups).
//! Values are stored as JSON so any serializable model can be cached.
//! Read-through callers pair `generation` with `fill` so a load that raced an
//! invalidation is never left behind.
//!
//! ```rust,ignore
//! use yamdb::cache::{create_cache, CacheLayer};
//! use yamdb::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("title:id:1", &title, Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache handle shared by services
pub type Cache = MemoryCache;

/// Cache layer trait
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete every key starting with `prefix`
    async fn delete_prefix(&self, prefix: &str) -> Result<()>;

    /// Invalidation counter, bumped by every `delete` and `delete_prefix`
    fn generation(&self) -> u64;

    /// Store a value that was loaded after reading `generation`.
    ///
    /// If any invalidation ran since then the value may predate it, so the
    /// entry is removed again and `false` is returned.
    async fn fill<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        generation: u64,
    ) -> Result<bool>;
}

/// Create the cache described by `config`
pub fn create_cache(config: &CacheConfig) -> Arc<Cache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    Arc::new(MemoryCache::with_capacity_and_ttl(config.max_capacity, ttl))
}
