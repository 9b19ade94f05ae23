use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Per-field version availability, keyed by (record type, property).
///
/// The table contents are maintained outside this crate; the walker only
/// asks questions about the declared version tag of the document.
pub trait VersionCompatibilityTable: Send + Sync {
    /// The property exists only in versions newer than `version_tag`.
    fn is_newer_version_only(&self, version_tag: &str, record_type: &str, property: &str) -> bool;

    /// Property to use instead when the field is not yet available.
    fn alternative_for(&self, record_type: &str, property: &str) -> Option<String>;

    fn is_deprecated(&self, version_tag: &str, record_type: &str, property: &str) -> bool;

    fn replacement_for(&self, record_type: &str, property: &str) -> Option<String>;
}

/// A table with no entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVersionTable;

impl VersionCompatibilityTable for NoVersionTable {
    fn is_newer_version_only(&self, _: &str, _: &str, _: &str) -> bool {
        false
    }

    fn alternative_for(&self, _: &str, _: &str) -> Option<String> {
        None
    }

    fn is_deprecated(&self, _: &str, _: &str, _: &str) -> bool {
        false
    }

    fn replacement_for(&self, _: &str, _: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub record_type: String,
    pub property: String,
    /// Version tags in which the property does not exist yet
    #[serde(default)]
    pub unavailable_in: Vec<String>,
    /// Version tags in which the property is deprecated
    #[serde(default)]
    pub deprecated_in: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

/// Version table held in memory, built in code or loaded from a JSON array
/// of [`VersionEntry`] objects. Version tags compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticVersionTable {
    entries: HashMap<(String, String), VersionEntry>,
}

impl StaticVersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: VersionEntry) -> Self {
        self.entries
            .insert((entry.record_type.clone(), entry.property.clone()), entry);
        self
    }

    pub fn from_entries(entries: impl IntoIterator<Item = VersionEntry>) -> Self {
        entries.into_iter().fold(Self::new(), Self::with_entry)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let entries: Vec<VersionEntry> = serde_json::from_str(text)?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, record_type: &str, property: &str) -> Option<&VersionEntry> {
        self.entries
            .get(&(record_type.to_string(), property.to_string()))
    }
}

fn lists_version(versions: &[String], version_tag: &str) -> bool {
    versions.iter().any(|v| v.eq_ignore_ascii_case(version_tag))
}

impl VersionCompatibilityTable for StaticVersionTable {
    fn is_newer_version_only(&self, version_tag: &str, record_type: &str, property: &str) -> bool {
        self.entry(record_type, property)
            .is_some_and(|e| lists_version(&e.unavailable_in, version_tag))
    }

    fn alternative_for(&self, record_type: &str, property: &str) -> Option<String> {
        self.entry(record_type, property)
            .and_then(|e| e.alternative.clone())
    }

    fn is_deprecated(&self, version_tag: &str, record_type: &str, property: &str) -> bool {
        self.entry(record_type, property)
            .is_some_and(|e| lists_version(&e.deprecated_in, version_tag))
    }

    fn replacement_for(&self, record_type: &str, property: &str) -> Option<String> {
        self.entry(record_type, property)
            .and_then(|e| e.replacement.clone())
    }
}
