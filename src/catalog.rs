//! Static rule metadata and the only constructor of [`Finding`]s.
//!
//! Every finding the walker emits references a [`RuleDefinition`] by id.
//! The catalog is built once per process and never mutated afterwards.

use once_cell::sync::Lazy;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use crate::paths::{DocumentPointer, LogicalPath};
use crate::types::{Category, Confidence, Finding, Severity};

pub mod rule_ids {
    pub const EMPTY_INPUT: &str = "EMPTY_INPUT";
    pub const INVALID_DOCUMENT: &str = "INVALID_DOCUMENT";
    pub const ROOT_NOT_OBJECT: &str = "ROOT_NOT_OBJECT";
    pub const MISSING_DISCRIMINATOR: &str = "MISSING_DISCRIMINATOR";
    pub const ENTRY_NOT_ARRAY: &str = "ENTRY_NOT_ARRAY";
    pub const ENTRY_NOT_OBJECT: &str = "ENTRY_NOT_OBJECT";
    pub const RECORD_NOT_OBJECT: &str = "RECORD_NOT_OBJECT";
    pub const RECORD_MISSING_TYPE: &str = "RECORD_MISSING_TYPE";
    pub const UNKNOWN_ELEMENT: &str = "UNKNOWN_ELEMENT";
    pub const MISSING_REQUIRED_FIELD: &str = "MISSING_REQUIRED_FIELD";
    pub const EXPECTED_ARRAY: &str = "EXPECTED_ARRAY";
    pub const EXPECTED_OBJECT: &str = "EXPECTED_OBJECT";
    pub const INVALID_DATE: &str = "INVALID_DATE";
    pub const INVALID_DATETIME: &str = "INVALID_DATETIME";
    pub const BOOLEAN_AS_STRING: &str = "BOOLEAN_AS_STRING";
    pub const FIELD_NEWER_VERSION: &str = "FIELD_NEWER_VERSION";
    pub const FIELD_DEPRECATED: &str = "FIELD_DEPRECATED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Text carried by the panic raised for an unregistered rule id.
pub const UNREGISTERED_RULE_PANIC: &str = "is not registered in the rule catalog";

const ADVISORY_DISCLAIMER: &str = "This is a best-effort structural pre-check. The authoritative \
     conformance validator makes the final accept/reject decision.";
const INPUT_DISCLAIMER: &str =
    "The document could not be examined further; no structural checks were run.";
const VERSION_DISCLAIMER: &str = "Version compatibility hints come from a static table and may \
     not reflect every published version of the standard.";
const INTERNAL_DISCLAIMER: &str = "The pre-check stopped early because of an internal problem. \
     Findings reported before it are still valid; the document itself may be fine.";

#[derive(Debug, Clone, PartialEq)]
pub struct RuleDefinition {
    pub id: &'static str,
    pub category: Category,
    pub severity: Severity,
    pub confidence: Confidence,
    pub title: &'static str,
    pub description: &'static str,
    pub disclaimer: &'static str,
}

static RULES: Lazy<HashMap<&'static str, RuleDefinition>> = Lazy::new(|| {
    use rule_ids::*;

    let rule = |id, category, severity, confidence, title, description, disclaimer| {
        RuleDefinition {
            id,
            category,
            severity,
            confidence,
            title,
            description,
            disclaimer,
        }
    };

    [
        rule(
            EMPTY_INPUT,
            Category::Input,
            Severity::Error,
            Confidence::High,
            "Empty input",
            "The submitted text is empty or contains only whitespace.",
            INPUT_DISCLAIMER,
        ),
        rule(
            INVALID_DOCUMENT,
            Category::Input,
            Severity::Error,
            Confidence::High,
            "Invalid JSON document",
            "The submitted text could not be parsed as JSON.",
            INPUT_DISCLAIMER,
        ),
        rule(
            ROOT_NOT_OBJECT,
            Category::Structure,
            Severity::Error,
            Confidence::High,
            "Top-level value is not an object",
            "A bundle document must be a JSON object.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            MISSING_DISCRIMINATOR,
            Category::Structure,
            Severity::Error,
            Confidence::High,
            "Missing type discriminator",
            "The top-level object does not declare its type.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            ENTRY_NOT_ARRAY,
            Category::Structure,
            Severity::Error,
            Confidence::High,
            "Record collection is not an array",
            "The contained-records property must be a JSON array.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            ENTRY_NOT_OBJECT,
            Category::Structure,
            Severity::Error,
            Confidence::High,
            "Collection entry is not an object",
            "Every member of the record collection must be a JSON object.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            RECORD_NOT_OBJECT,
            Category::Structure,
            Severity::Error,
            Confidence::High,
            "Entry has no record object",
            "A collection entry must wrap its record in a JSON object.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            RECORD_MISSING_TYPE,
            Category::Structure,
            Severity::Error,
            Confidence::High,
            "Record does not declare its type",
            "A record must carry a string type discriminator.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            UNKNOWN_ELEMENT,
            Category::UnknownElement,
            Severity::Error,
            Confidence::Medium,
            "Unknown element",
            "The property is not declared by the schema of the enclosing type.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            MISSING_REQUIRED_FIELD,
            Category::Cardinality,
            Severity::Error,
            Confidence::Medium,
            "Missing required field",
            "The schema requires at least one occurrence of this field.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            EXPECTED_ARRAY,
            Category::CollectionShape,
            Severity::Error,
            Confidence::High,
            "Expected an array",
            "The schema allows repetitions of this field, so it must be encoded as an array.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            EXPECTED_OBJECT,
            Category::CollectionShape,
            Severity::Error,
            Confidence::High,
            "Unexpected array",
            "The schema allows a single occurrence of this field, so it must not be an array.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            INVALID_DATE,
            Category::PrimitiveFormat,
            Severity::Error,
            Confidence::Medium,
            "Invalid date",
            "Date values must be real calendar dates formatted as YYYY-MM-DD.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            INVALID_DATETIME,
            Category::PrimitiveFormat,
            Severity::Error,
            Confidence::Medium,
            "Invalid date-time",
            "Date-time values must carry a date, a time and a timezone offset.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            BOOLEAN_AS_STRING,
            Category::PrimitiveFormat,
            Severity::Error,
            Confidence::Medium,
            "Boolean encoded as string",
            "Boolean values must be JSON true or false, not strings.",
            ADVISORY_DISCLAIMER,
        ),
        rule(
            FIELD_NEWER_VERSION,
            Category::VersionCompatibility,
            Severity::Warning,
            Confidence::Medium,
            "Field from a newer version",
            "The field is only defined in a later version than the one declared.",
            VERSION_DISCLAIMER,
        ),
        rule(
            FIELD_DEPRECATED,
            Category::VersionCompatibility,
            Severity::Information,
            Confidence::Medium,
            "Deprecated field",
            "The field is deprecated in the declared version.",
            VERSION_DISCLAIMER,
        ),
        rule(
            INTERNAL_ERROR,
            Category::Internal,
            Severity::Warning,
            Confidence::Low,
            "Pre-check incomplete",
            "An unexpected internal error interrupted the structural pre-check.",
            INTERNAL_DISCLAIMER,
        ),
    ]
    .into_iter()
    .map(|definition| (definition.id, definition))
    .collect()
});

pub struct RuleCatalog;

impl RuleCatalog {
    pub fn get(rule_id: &str) -> Option<&'static RuleDefinition> {
        RULES.get(rule_id)
    }

    pub fn contains(rule_id: &str) -> bool {
        RULES.contains_key(rule_id)
    }

    /// All registered definitions, ordered by id.
    pub fn all() -> Vec<&'static RuleDefinition> {
        let mut rules: Vec<_> = RULES.values().collect();
        rules.sort_by_key(|r| r.id);
        rules
    }
}

pub struct FindingFactory;

impl FindingFactory {
    /// Builds a finding from the catalog entry for `rule_id`.
    ///
    /// # Panics
    ///
    /// Panics when `rule_id` is not registered. That is a defect in this
    /// crate, never in the validated document, and must surface immediately.
    pub fn create(
        rule_id: &str,
        message: impl Into<String>,
        pointer: Option<&DocumentPointer>,
        path: Option<&LogicalPath>,
        record_type: Option<&str>,
        details: Option<Map<String, JsonValue>>,
    ) -> Finding {
        let Some(rule) = RuleCatalog::get(rule_id) else {
            panic!("finding rule {rule_id:?} {UNREGISTERED_RULE_PANIC}");
        };

        Finding {
            rule_id: rule.id.to_string(),
            category: rule.category,
            severity: rule.severity,
            confidence: rule.confidence,
            title: rule.title.to_string(),
            description: rule.description.to_string(),
            contextual_message: message.into(),
            disclaimer: rule.disclaimer.to_string(),
            document_pointer: pointer.map(ToString::to_string),
            logical_path: path.filter(|p| !p.is_root()).map(ToString::to_string),
            record_type: record_type.map(str::to_string),
            details,
        }
    }
}
