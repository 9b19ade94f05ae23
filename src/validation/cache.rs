use std::collections::HashMap;
use std::sync::Arc;

use super::Cancellation;
use crate::error::{Result, ShapeCheckError};
use crate::provider::SchemaProvider;
use crate::types::SchemaNode;

/// Per-run memo of type name to resolved schema.
///
/// Entries are written once, including negative answers, so each type is
/// requested from the provider at most once per validation call. The cache
/// is owned by a single run and passed down the walk explicitly.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: HashMap<String, Option<Arc<SchemaNode>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached answer, if the type was already looked up in this run.
    pub fn get(&self, type_name: &str) -> Option<Option<Arc<SchemaNode>>> {
        self.entries.get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the schema for `type_name`, fetching it on first use.
    ///
    /// A fetch is a suspension point, so cancellation is checked before it.
    pub async fn resolve(
        &mut self,
        type_name: &str,
        provider: &dyn SchemaProvider,
        cancellation: Option<&Cancellation>,
    ) -> Result<Option<Arc<SchemaNode>>> {
        if let Some(cached) = self.entries.get(type_name) {
            return Ok(cached.clone());
        }

        if cancellation.is_some_and(Cancellation::is_cancelled) {
            return Err(ShapeCheckError::Cancelled);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Schema cache miss for {}", type_name);
        let schema = provider.get_schema(type_name).await?;
        #[cfg(feature = "tracing")]
        if schema.is_none() {
            tracing::debug!("No schema available for {}", type_name);
        }

        Ok(self
            .entries
            .entry(type_name.to_string())
            .or_insert(schema)
            .clone())
    }
}
