//! External collaborators consumed by the walker.
//!
//! - **[`SchemaProvider`]** - type name to schema tree lookup (async)
//! - **[`VersionCompatibilityTable`]** - per-field version availability hints
//!
//! # Schema providers
//!
//! - [`InMemorySchemaProvider`] - schemas registered in code
//! - [`FileSystemSchemaProvider`] - one `<TypeName>.json` file per type
//! - [`CachedSchemaProvider`] - process-wide TTL cache around any provider
//!
//! ```ignore
//! use octofhir_shapecheck::provider::{CachedSchemaProvider, CacheConfig, FileSystemSchemaProvider};
//! use std::sync::Arc;
//!
//! let inner = Arc::new(FileSystemSchemaProvider::new("schemas/r4"));
//! let provider = Arc::new(CachedSchemaProvider::new(inner, CacheConfig::default()));
//! ```

pub mod cached;
pub mod filesystem;
pub mod version;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::types::SchemaNode;

pub use cached::{CacheConfig, CacheStats, CachedSchemaProvider};
pub use filesystem::FileSystemSchemaProvider;
pub use version::{NoVersionTable, StaticVersionTable, VersionCompatibilityTable, VersionEntry};

/// Source of schema trees, keyed by record type or datatype name.
///
/// `Ok(None)` means the type is unknown to the provider; the walker then
/// skips schema-relative checks below it. `Err` is reserved for provider
/// failures (I/O, undecodable schema files). Implementations must tolerate
/// repeated calls for the same name.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn get_schema(&self, type_name: &str) -> Result<Option<Arc<SchemaNode>>>;
}

/// Schemas registered up front, typically from tests or embedded data.
#[derive(Debug, Default, Clone)]
pub struct InMemorySchemaProvider {
    schemas: HashMap<String, Arc<SchemaNode>>,
}

impl InMemorySchemaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `schema` under its root `schema_path`.
    pub fn with_schema(mut self, schema: SchemaNode) -> Self {
        self.add_schema(schema);
        self
    }

    pub fn add_schema(&mut self, schema: SchemaNode) {
        self.schemas
            .insert(schema.schema_path.clone(), Arc::new(schema));
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[async_trait]
impl SchemaProvider for InMemorySchemaProvider {
    async fn get_schema(&self, type_name: &str) -> Result<Option<Arc<SchemaNode>>> {
        Ok(self.schemas.get(type_name).cloned())
    }
}
