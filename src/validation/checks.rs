//! The independent checks run at each node of a walk.
//!
//! Every check is a pure function of the node, its schema context and its
//! location, and returns the findings it produced. No check can stop or
//! skip another.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;

use crate::catalog::{FindingFactory, rule_ids};
use crate::config::ShapeCheckConfig;
use crate::paths::{DocumentPointer, LogicalPath};
use crate::provider::VersionCompatibilityTable;
use crate::types::{Finding, SchemaNode};

/// Extension slots allowed on every element, whatever its schema says.
static UNIVERSAL_EXTENSION_SLOTS: &[&str] = &["extension", "modifierExtension"];

/// Metadata every record may carry at its root. Inside nested datatypes
/// these names are checked like any other property.
static RECORD_ROOT_METADATA: &[&str] = &[
    "id",
    "meta",
    "implicitRules",
    "language",
    "text",
    "contained",
];

static BOOLEAN_NAMES: &[&str] = &["active", "experimental", "immutable", "abstract"];

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("date pattern is a valid regex")
});

static DATETIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2})(?::(\d{2})(?:\.\d{1,9})?)?(Z|[+-](\d{2}):(\d{2}))$",
    )
    .expect("date-time pattern is a valid regex")
});

/// Where a node sits: both addresses plus the owning record type.
#[derive(Debug, Clone, Copy)]
pub struct NodeLocation<'a> {
    pub pointer: &'a DocumentPointer,
    pub path: &'a LogicalPath,
    pub record_type: &'a str,
}

impl NodeLocation<'_> {
    fn finding(&self, rule_id: &str, message: String, details: JsonValue) -> Finding {
        let details = match details {
            JsonValue::Object(map) => Some(map),
            _ => None,
        };
        FindingFactory::create(
            rule_id,
            message,
            Some(self.pointer),
            Some(self.path),
            Some(self.record_type),
            details,
        )
    }
}

pub struct CheckSet {
    discriminator: String,
    extension_prefix: String,
    versions: Arc<dyn VersionCompatibilityTable>,
}

impl CheckSet {
    pub fn new(config: &ShapeCheckConfig, versions: Arc<dyn VersionCompatibilityTable>) -> Self {
        Self {
            discriminator: config.layout.discriminator.clone(),
            extension_prefix: config.extension_prefix.clone(),
            versions,
        }
    }

    fn is_record_root_metadata(&self, name: &str) -> bool {
        name == self.discriminator || RECORD_ROOT_METADATA.contains(&name)
    }

    fn is_primitive_extension(&self, name: &str) -> bool {
        name.starts_with(&self.extension_prefix)
    }

    /// Reports a property that the current schema context does not declare.
    ///
    /// `location.path` is the path of the property itself.
    pub fn check_unknown_element(
        &self,
        name: &str,
        context: Option<&SchemaNode>,
        at_record_root: bool,
        location: NodeLocation<'_>,
    ) -> Option<Finding> {
        let context = context?;

        if UNIVERSAL_EXTENSION_SLOTS.contains(&name)
            || self.is_primitive_extension(name)
            || (at_record_root && self.is_record_root_metadata(name))
        {
            return None;
        }
        if context.child(name).is_some() {
            return None;
        }

        let schema_type = schema_label(context);
        Some(location.finding(
            rule_ids::UNKNOWN_ELEMENT,
            format!(
                "Property '{name}' is not defined on {schema_type} (path '{}')",
                location.path
            ),
            json!({
                "property": name,
                "schemaType": schema_type,
                "logicalPath": location.path.to_string(),
            }),
        ))
    }

    /// Reports schema children with `minOccurs > 0` absent from `value`.
    ///
    /// `location` addresses the object itself.
    pub fn check_missing_required_fields(
        &self,
        value: &JsonValue,
        context: Option<&SchemaNode>,
        location: NodeLocation<'_>,
    ) -> Vec<Finding> {
        let (Some(context), JsonValue::Object(object)) = (context, value) else {
            return Vec::new();
        };
        let in_extension = location
            .path
            .last()
            .is_some_and(|segment| UNIVERSAL_EXTENSION_SLOTS.contains(&segment));

        context
            .children
            .iter()
            .filter(|child| child.min_occurs > 0)
            .filter(|child| !self.is_record_root_metadata(&child.element_name))
            .filter(|child| !self.is_primitive_extension(&child.element_name))
            .filter(|child| !child.is_choice_placeholder())
            .filter(|child| !(in_extension && is_polymorphic_value_slot(child)))
            .filter(|child| !has_key_ignore_case(object, &child.element_name))
            .map(|child| {
                let field_path = location.path.child(&child.element_name);
                let field_location = NodeLocation {
                    path: &field_path,
                    ..location
                };
                field_location.finding(
                    rule_ids::MISSING_REQUIRED_FIELD,
                    format!(
                        "Required field '{}' ({}) is missing",
                        child.element_name,
                        child.cardinality()
                    ),
                    json!({
                        "field": child.element_name,
                        "schemaMin": child.min_occurs,
                        "schemaMax": child.max_occurs.to_string(),
                        "schemaPath": child.schema_path,
                    }),
                )
            })
            .collect()
    }

    /// Compares declared repetition with the actual JSON array-ness.
    ///
    /// The element is located by its exact schema path under `context`;
    /// properties without a declaration are left to the unknown-element check.
    pub fn check_collection_shape(
        &self,
        value: &JsonValue,
        context: Option<&SchemaNode>,
        location: NodeLocation<'_>,
    ) -> Option<Finding> {
        let element = locate_element(context?, location.path)?;
        let is_array = value.is_array();

        let (rule_id, message) = match (element.is_array(), is_array) {
            (true, false) => (
                rule_ids::EXPECTED_ARRAY,
                format!(
                    "'{}' repeats ({}) and must be an array",
                    location.path,
                    element.cardinality()
                ),
            ),
            (false, true) => (
                rule_ids::EXPECTED_OBJECT,
                format!(
                    "'{}' allows a single value ({}) but an array was found",
                    location.path,
                    element.cardinality()
                ),
            ),
            _ => return None,
        };

        Some(location.finding(
            rule_id,
            message,
            json!({
                "declaredCardinality": element.cardinality(),
                "schemaPath": element.schema_path,
            }),
        ))
    }

    /// Name-driven format heuristics for dates, date-times and booleans.
    pub fn check_primitive_format(
        &self,
        name: &str,
        value: &JsonValue,
        location: NodeLocation<'_>,
    ) -> Option<Finding> {
        let JsonValue::String(text) = value else {
            return None;
        };

        if is_date_like(name) {
            if is_valid_date(text) {
                return None;
            }
            return Some(location.finding(
                rule_ids::INVALID_DATE,
                format!("'{text}' is not a valid calendar date (YYYY-MM-DD) for '{name}'"),
                json!({ "value": text, "expectedFormat": "YYYY-MM-DD" }),
            ));
        }

        if is_datetime_like(name) {
            if is_valid_datetime(text) {
                return None;
            }
            return Some(location.finding(
                rule_ids::INVALID_DATETIME,
                format!(
                    "'{text}' is not a valid date-time with timezone for '{name}'"
                ),
                json!({ "value": text, "expectedFormat": "YYYY-MM-DDThh:mm[:ss[.fff]](Z|+hh:mm)" }),
            ));
        }

        if is_boolean_like(name) {
            let hint = match text.trim().to_ascii_lowercase().as_str() {
                "true" => " (use true without quotes)",
                "false" => " (use false without quotes)",
                _ => "",
            };
            return Some(location.finding(
                rule_ids::BOOLEAN_AS_STRING,
                format!("'{name}' is a boolean but holds the string \"{text}\"{hint}"),
                json!({ "value": text }),
            ));
        }

        None
    }

    /// Field availability against the document's declared version.
    pub fn check_version_compatibility(
        &self,
        version_tag: &str,
        name: &str,
        location: NodeLocation<'_>,
    ) -> Vec<Finding> {
        let record_type = location.record_type;
        let mut findings = Vec::new();

        if self
            .versions
            .is_newer_version_only(version_tag, record_type, name)
        {
            let alternative = self.versions.alternative_for(record_type, name);
            let suffix = alternative
                .as_ref()
                .map(|alt| format!("; use '{alt}' instead"))
                .unwrap_or_default();
            findings.push(location.finding(
                rule_ids::FIELD_NEWER_VERSION,
                format!(
                    "'{record_type}.{name}' is not available in version {version_tag}{suffix}"
                ),
                json!({ "versionTag": version_tag, "alternative": alternative }),
            ));
        }

        if self.versions.is_deprecated(version_tag, record_type, name) {
            let replacement = self.versions.replacement_for(record_type, name);
            let suffix = replacement
                .as_ref()
                .map(|r| format!("; replaced by '{r}'"))
                .unwrap_or_default();
            findings.push(location.finding(
                rule_ids::FIELD_DEPRECATED,
                format!("'{record_type}.{name}' is deprecated in version {version_tag}{suffix}"),
                json!({ "versionTag": version_tag, "replacement": replacement }),
            ));
        }

        findings
    }
}

fn schema_label(context: &SchemaNode) -> &str {
    if context.is_backbone || context.datatype.is_empty() {
        &context.schema_path
    } else {
        &context.datatype
    }
}

fn locate_element<'a>(context: &'a SchemaNode, path: &LogicalPath) -> Option<&'a SchemaNode> {
    let name = path.last()?;
    let expected = format!("{}.{}", context.schema_path, name);
    context
        .children
        .iter()
        .find(|child| child.element_name == name && child.schema_path == expected)
        .map(Arc::as_ref)
}

fn has_key_ignore_case(object: &Map<String, JsonValue>, name: &str) -> bool {
    object.keys().any(|key| key.eq_ignore_ascii_case(name))
}

/// The `value[x]` slot of an extension, whose presence rules live elsewhere.
fn is_polymorphic_value_slot(child: &SchemaNode) -> bool {
    child.element_name == "value[x]" || (child.is_choice && child.element_name.starts_with("value"))
}

fn is_date_like(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with("date") && !lower.ends_with("datetime")
}

fn is_datetime_like(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with("datetime") || lower.ends_with("instant")
}

fn is_boolean_like(name: &str) -> bool {
    if BOOLEAN_NAMES.contains(&name) || name.ends_with("Boolean") {
        return true;
    }
    ["is", "has"].iter().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_uppercase())
    })
}

fn calendar_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn is_valid_date(text: &str) -> bool {
    DATE_PATTERN
        .captures(text)
        .is_some_and(|caps| calendar_date(&caps[1], &caps[2], &caps[3]).is_some())
}

fn is_valid_datetime(text: &str) -> bool {
    let Some(caps) = DATETIME_PATTERN.captures(text) else {
        return false;
    };
    if calendar_date(&caps[1], &caps[2], &caps[3]).is_none() {
        return false;
    }

    let field = |i: usize| caps.get(i).map_or(Some(0), |m| m.as_str().parse::<u32>().ok());
    let time = match (field(4), field(5), field(6)) {
        (Some(h), Some(m), Some(s)) => NaiveTime::from_hms_opt(h, m, s),
        _ => None,
    };
    let offset_ok = match (field(8), field(9)) {
        (Some(h), Some(m)) => (h < 14 && m < 60) || (h == 14 && m == 0),
        _ => false,
    };
    time.is_some() && offset_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{NoVersionTable, StaticVersionTable, VersionEntry};

    fn checks() -> CheckSet {
        CheckSet::new(&ShapeCheckConfig::default(), Arc::new(NoVersionTable))
    }

    fn subject() -> SchemaNode {
        SchemaNode::root("Subject")
            .with_child(SchemaNode::element("identifier", "Identifier").required().repeating())
            .with_child(SchemaNode::element("name", "HumanName").repeating())
            .with_child(SchemaNode::element("gender", "code"))
            .with_child(SchemaNode::element("meta", "Meta").required())
            .with_child(SchemaNode::element("value[x]", "").choice().required())
    }

    macro_rules! at {
        ($pointer:expr, $path:expr) => {
            NodeLocation {
                pointer: &$pointer,
                path: &$path,
                record_type: "Subject",
            }
        };
    }

    #[test]
    fn test_unknown_element_exemptions() {
        let checks = checks();
        let schema = subject();
        let human_name = SchemaNode::root("HumanName");
        let pointer = DocumentPointer::root().key("x");
        let path = LogicalPath::root().child("x");

        assert!(checks.check_unknown_element("name", Some(&schema), true, at!(pointer, path)).is_none());
        assert!(checks.check_unknown_element("text", Some(&schema), true, at!(pointer, path)).is_none());
        assert!(checks.check_unknown_element("resourceType", Some(&schema), true, at!(pointer, path)).is_none());
        assert!(checks.check_unknown_element("extension", Some(&human_name), false, at!(pointer, path)).is_none());
        assert!(checks.check_unknown_element("_family", Some(&human_name), false, at!(pointer, path)).is_none());
        assert!(checks.check_unknown_element("bogus", None, false, at!(pointer, path)).is_none());

        let finding = checks
            .check_unknown_element("text", Some(&human_name), false, at!(pointer, path))
            .unwrap();
        assert_eq!(finding.rule_id, rule_ids::UNKNOWN_ELEMENT);
        assert_eq!(*finding.detail("schemaType").unwrap(), "HumanName");
    }

    #[test]
    fn test_missing_required_fields() {
        let checks = checks();
        let schema = subject();
        let pointer = DocumentPointer::root();
        let path = LogicalPath::root();

        let findings = checks.check_missing_required_fields(
            &json!({"resourceType": "Subject", "gender": "male"}),
            Some(&schema),
            at!(pointer, path),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(*findings[0].detail("field").unwrap(), "identifier");
        assert_eq!(*findings[0].detail("schemaMin").unwrap(), 1);
        assert_eq!(*findings[0].detail("schemaMax").unwrap(), "*");
        assert_eq!(findings[0].logical_path.as_deref(), Some("identifier"));

        let present_other_case = checks.check_missing_required_fields(
            &json!({"Identifier": []}),
            Some(&schema),
            at!(pointer, path),
        );
        assert!(present_other_case.is_empty());

        assert!(checks.check_missing_required_fields(&json!([]), Some(&schema), at!(pointer, path)).is_empty());
    }

    #[test]
    fn test_extension_value_slot_is_exempt() {
        let checks = checks();
        let extension = SchemaNode::root("Extension")
            .with_child(SchemaNode::element("url", "uri").required())
            .with_child(SchemaNode::element("valueString", "string").choice().required());
        let pointer = DocumentPointer::root().key("extension").index(0);
        let path = LogicalPath::root().child("extension");

        let findings =
            checks.check_missing_required_fields(&json!({}), Some(&extension), at!(pointer, path));
        assert_eq!(findings.len(), 1);
        assert_eq!(*findings[0].detail("field").unwrap(), "url");

        let elsewhere = LogicalPath::root().child("other");
        let findings = checks.check_missing_required_fields(
            &json!({}),
            Some(&extension),
            at!(pointer, elsewhere),
        );
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_collection_shape() {
        let checks = checks();
        let schema = subject();
        let pointer = DocumentPointer::root().key("name");
        let name_path = LogicalPath::root().child("name");
        let gender_path = LogicalPath::root().child("gender");
        let unknown_path = LogicalPath::root().child("bogus");

        let finding = checks
            .check_collection_shape(&json!({"family": "Doe"}), Some(&schema), at!(pointer, name_path))
            .unwrap();
        assert_eq!(finding.rule_id, rule_ids::EXPECTED_ARRAY);
        assert_eq!(*finding.detail("declaredCardinality").unwrap(), "0..*");

        let finding = checks
            .check_collection_shape(&json!(["male"]), Some(&schema), at!(pointer, gender_path))
            .unwrap();
        assert_eq!(finding.rule_id, rule_ids::EXPECTED_OBJECT);

        assert!(checks.check_collection_shape(&json!([]), Some(&schema), at!(pointer, name_path)).is_none());
        assert!(checks.check_collection_shape(&json!({}), Some(&schema), at!(pointer, unknown_path)).is_none());
        assert!(checks.check_collection_shape(&json!({}), None, at!(pointer, name_path)).is_none());
    }

    #[test]
    fn test_date_and_datetime_formats() {
        assert!(is_valid_date("1990-01-31"));
        assert!(!is_valid_date("1990-13-40"));
        assert!(!is_valid_date("1990-02-30"));
        assert!(!is_valid_date("1990-1-1"));
        assert!(!is_valid_date("1990"));

        assert!(is_valid_datetime("2024-05-01T10:30:00Z"));
        assert!(is_valid_datetime("2024-05-01T10:30+02:00"));
        assert!(is_valid_datetime("2024-05-01T10:30:00.123-05:00"));
        assert!(!is_valid_datetime("2024-05-01T10:30:00"));
        assert!(!is_valid_datetime("2024-05-01T25:30:00Z"));
        assert!(!is_valid_datetime("2024-05-01"));

        assert!(is_date_like("birthDate"));
        assert!(is_date_like("date"));
        assert!(!is_date_like("effectiveDateTime"));
        assert!(is_datetime_like("effectiveDateTime"));
        assert!(is_boolean_like("active"));
        assert!(is_boolean_like("isPrimary"));
        assert!(is_boolean_like("deceasedBoolean"));
        assert!(!is_boolean_like("issuer"));
    }

    #[test]
    fn test_datetime_offset_bounds() {
        assert!(is_valid_datetime("2024-05-01T10:30:00+14:00"));
        assert!(is_valid_datetime("2024-05-01T10:30:00-13:45"));
        assert!(!is_valid_datetime("2024-05-01T10:30:00+14:59"));
        assert!(!is_valid_datetime("2024-05-01T10:30:00-14:30"));
        assert!(!is_valid_datetime("2024-05-01T10:30:00+15:00"));
        assert!(!is_valid_datetime("2024-05-01T10:30:00+05:60"));
    }

    #[test]
    fn test_primitive_format_findings() {
        let checks = checks();
        let pointer = DocumentPointer::root().key("birthDate");
        let path = LogicalPath::root().child("birthDate");

        let finding = checks
            .check_primitive_format("birthDate", &json!("1990-13-40"), at!(pointer, path))
            .unwrap();
        assert_eq!(finding.rule_id, rule_ids::INVALID_DATE);
        assert!(checks.check_primitive_format("birthDate", &json!("1990-12-31"), at!(pointer, path)).is_none());
        assert!(checks.check_primitive_format("birthDate", &json!(1990), at!(pointer, path)).is_none());

        let finding = checks
            .check_primitive_format("active", &json!("true"), at!(pointer, path))
            .unwrap();
        assert_eq!(finding.rule_id, rule_ids::BOOLEAN_AS_STRING);
        assert!(checks.check_primitive_format("active", &json!(true), at!(pointer, path)).is_none());

        let finding = checks
            .check_primitive_format("recordedDateTime", &json!("2020-01-01"), at!(pointer, path))
            .unwrap();
        assert_eq!(finding.rule_id, rule_ids::INVALID_DATETIME);
    }

    #[test]
    fn test_version_compatibility() {
        let table = StaticVersionTable::new()
            .with_entry(VersionEntry {
                record_type: "Subject".into(),
                property: "pronouns".into(),
                unavailable_in: vec!["R4".into()],
                alternative: Some("extension".into()),
                ..Default::default()
            })
            .with_entry(VersionEntry {
                record_type: "Subject".into(),
                property: "animal".into(),
                deprecated_in: vec!["R4".into()],
                ..Default::default()
            });
        let checks = CheckSet::new(&ShapeCheckConfig::default(), Arc::new(table));
        let pointer = DocumentPointer::root();
        let path = LogicalPath::root();

        let findings = checks.check_version_compatibility("R4", "pronouns", at!(pointer, path));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, rule_ids::FIELD_NEWER_VERSION);
        assert_eq!(*findings[0].detail("alternative").unwrap(), "extension");

        let findings = checks.check_version_compatibility("R4", "animal", at!(pointer, path));
        assert_eq!(findings[0].rule_id, rule_ids::FIELD_DEPRECATED);
        assert!(findings[0].detail("replacement").unwrap().is_null());

        assert!(checks.check_version_compatibility("R5", "pronouns", at!(pointer, path)).is_empty());
        assert!(checks.check_version_compatibility("R4", "gender", at!(pointer, path)).is_empty());
    }
}
