use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Information => write!(f, "information"),
        }
    }
}

/// How sure a heuristic check is that it found a real defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Empty or unparsable text
    Input,
    /// Container and record shape
    Structure,
    UnknownElement,
    Cardinality,
    CollectionShape,
    PrimitiveFormat,
    VersionCompatibility,
    Internal,
}

/// One reported issue. Findings are advisory; the authoritative
/// conformance engine has the final say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub category: Category,
    pub severity: Severity,
    pub confidence: Confidence,
    pub title: String,
    pub description: String,
    #[serde(rename = "message")]
    pub contextual_message: String,
    pub disclaimer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_pointer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, JsonValue>>,
}

impl Finding {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn detail(&self, key: &str) -> Option<&JsonValue> {
        self.details.as_ref().and_then(|d| d.get(key))
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.rule_id, self.contextual_message)?;
        if let Some(pointer) = &self.document_pointer {
            write!(f, " at {pointer}")?;
        }
        Ok(())
    }
}

/// Per-severity counts over a finding list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FindingSummary {
    pub errors: usize,
    pub warnings: usize,
    pub information: usize,
}

impl FindingSummary {
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.information
    }
}

pub fn summarize(findings: &[Finding]) -> FindingSummary {
    findings
        .iter()
        .fold(FindingSummary::default(), |mut summary, finding| {
            match finding.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Information => summary.information += 1,
            }
            summary
        })
}
