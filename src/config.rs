use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ShapeCheckError};

/// Property names that give a bundle document its shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocumentLayout {
    /// Type discriminator carried by the container and by every record
    pub discriminator: String,
    /// Array of contained entries on the container
    pub collection: String,
    /// Property of an entry that holds the record itself
    pub record: String,
}

impl DocumentLayout {
    pub fn new(
        discriminator: impl Into<String>,
        collection: impl Into<String>,
        record: impl Into<String>,
    ) -> Self {
        Self {
            discriminator: discriminator.into(),
            collection: collection.into(),
            record: record.into(),
        }
    }
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self::new("resourceType", "entry", "resource")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeCheckConfig {
    pub layout: DocumentLayout,
    /// Prefix of primitive-extension siblings such as `_birthDate`
    pub extension_prefix: String,
}

impl Default for ShapeCheckConfig {
    fn default() -> Self {
        Self {
            layout: DocumentLayout::default(),
            extension_prefix: "_".to_string(),
        }
    }
}

impl ShapeCheckConfig {
    pub fn with_layout(mut self, layout: DocumentLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        for (name, value) in [
            ("layout.discriminator", &layout.discriminator),
            ("layout.collection", &layout.collection),
            ("layout.record", &layout.record),
            ("extensionPrefix", &self.extension_prefix),
        ] {
            if value.trim().is_empty() {
                return Err(ShapeCheckError::configuration(format!(
                    "{name} cannot be empty"
                )));
            }
        }
        Ok(())
    }
}
