use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::SchemaProvider;
use crate::error::{Result, ShapeCheckError};
use crate::types::SchemaNode;

/// Loads `<root>/<TypeName>.json` files, each holding one [`SchemaNode`] tree.
#[derive(Debug, Clone)]
pub struct FileSystemSchemaProvider {
    root: PathBuf,
}

impl FileSystemSchemaProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn schema_file(&self, type_name: &str) -> Option<PathBuf> {
        // Type names become file names; anything that could escape the root is unknown.
        let acceptable = !type_name.is_empty()
            && type_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !type_name.starts_with('.');
        acceptable.then(|| self.root.join(format!("{type_name}.json")))
    }
}

#[async_trait]
impl SchemaProvider for FileSystemSchemaProvider {
    async fn get_schema(&self, type_name: &str) -> Result<Option<Arc<SchemaNode>>> {
        let Some(path) = self.schema_file(type_name) else {
            #[cfg(feature = "tracing")]
            tracing::debug!("Refusing schema lookup for unusable type name {:?}", type_name);
            return Ok(None);
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                #[cfg(feature = "tracing")]
                tracing::debug!("No schema file for {} at {}", type_name, path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(ShapeCheckError::schema_provider(
                    type_name.to_string(),
                    format!("failed to read {}: {e}", path.display()),
                ));
            }
        };

        let schema: SchemaNode = serde_json::from_slice(&bytes).map_err(|e| {
            ShapeCheckError::invalid_schema(type_name.to_string(), format!("{}: {e}", path.display()))
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Loaded schema {} from {}", type_name, path.display());
        Ok(Some(Arc::new(schema)))
    }
}
