use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::SchemaProvider;
use crate::error::Result;
use crate::types::SchemaNode;

/// Configuration for the provider-level schema cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached lookups, including "not found" answers
    pub ttl: Duration,
    /// Maximum number of type names kept
    pub max_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_size: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn new(ttl: Duration, max_size: u64) -> Self {
        Self { ttl, max_size }
    }
}

/// A process-wide cache in front of another [`SchemaProvider`].
///
/// Unlike the per-run `SchemaCache`, this one is shared between concurrent
/// validations. Provider errors are never cached.
pub struct CachedSchemaProvider {
    inner: Arc<dyn SchemaProvider>,
    cache: Cache<String, Option<Arc<SchemaNode>>>,
}

impl CachedSchemaProvider {
    pub fn new(inner: Arc<dyn SchemaProvider>, config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_size)
            .build();

        Self { inner, cache }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        CacheStats {
            entry_count: self.cache.entry_count(),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: u64,
}

#[async_trait]
impl SchemaProvider for CachedSchemaProvider {
    async fn get_schema(&self, type_name: &str) -> Result<Option<Arc<SchemaNode>>> {
        if let Some(cached) = self.cache.get(type_name).await {
            return Ok(cached);
        }

        let schema = self.inner.get_schema(type_name).await?;
        self.cache
            .insert(type_name.to_string(), schema.clone())
            .await;
        Ok(schema)
    }
}
