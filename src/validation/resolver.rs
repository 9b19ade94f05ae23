//! Expected-shape context switching while descending a record.
//!
//! Given the schema node of the value being walked and one of its property
//! names, [`SchemaResolver::resolve_child`] returns the schema context to use
//! for that property's value: an inline backbone element, a named datatype
//! schema fetched through the per-run cache, or nothing for primitives and
//! undeclared properties.

use std::sync::Arc;

use super::{Cancellation, SchemaCache};
use crate::error::Result;
use crate::provider::SchemaProvider;
use crate::types::SchemaNode;

/// Alternate datatype spellings found in schema trees, mapped to canonical names.
static DATATYPE_ALIASES: &[(&str, &str)] = &[
    ("System.String", "string"),
    ("System.Boolean", "boolean"),
    ("System.Integer", "integer"),
    ("System.Long", "integer64"),
    ("System.Decimal", "decimal"),
    ("System.Date", "date"),
    ("System.DateTime", "dateTime"),
    ("System.Time", "time"),
    ("http://hl7.org/fhirpath/System.String", "string"),
    ("http://hl7.org/fhirpath/System.Boolean", "boolean"),
    ("http://hl7.org/fhirpath/System.Integer", "integer"),
    ("http://hl7.org/fhirpath/System.Decimal", "decimal"),
    ("http://hl7.org/fhirpath/System.Date", "date"),
    ("http://hl7.org/fhirpath/System.DateTime", "dateTime"),
    ("http://hl7.org/fhirpath/System.Time", "time"),
    ("datetime", "dateTime"),
    ("base64binary", "base64Binary"),
    ("unsignedint", "unsignedInt"),
    ("positiveint", "positiveInt"),
];

/// Leaf datatypes; values of these types have no schema context below them.
static PRIMITIVE_TYPES: &[&str] = &[
    "boolean",
    "integer",
    "integer64",
    "string",
    "decimal",
    "uri",
    "url",
    "canonical",
    "base64Binary",
    "instant",
    "date",
    "dateTime",
    "time",
    "code",
    "oid",
    "id",
    "markdown",
    "unsignedInt",
    "positiveInt",
    "uuid",
    "xhtml",
];

pub fn canonical_datatype(datatype: &str) -> &str {
    DATATYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == datatype)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(datatype)
}

pub fn is_primitive_type(datatype: &str) -> bool {
    PRIMITIVE_TYPES.contains(&canonical_datatype(datatype))
}

pub struct SchemaResolver {
    provider: Arc<dyn SchemaProvider>,
}

impl SchemaResolver {
    pub fn new(provider: Arc<dyn SchemaProvider>) -> Self {
        Self { provider }
    }

    /// Schema of a record or datatype, memoized in `cache`.
    pub async fn resolve_type(
        &self,
        type_name: &str,
        cache: &mut SchemaCache,
        cancellation: Option<&Cancellation>,
    ) -> Result<Option<Arc<SchemaNode>>> {
        cache
            .resolve(type_name, self.provider.as_ref(), cancellation)
            .await
    }

    /// Schema context for the value of `property_name` inside `schema`.
    ///
    /// `Ok(None)` means "no context": the parent has no schema, the property
    /// is undeclared, or its type is a primitive leaf. None of those are
    /// errors here; unknown properties are reported by a separate check.
    pub async fn resolve_child(
        &self,
        schema: Option<&Arc<SchemaNode>>,
        property_name: &str,
        cache: &mut SchemaCache,
        cancellation: Option<&Cancellation>,
    ) -> Result<Option<Arc<SchemaNode>>> {
        let Some(schema) = schema else {
            return Ok(None);
        };
        let Some(element) = schema.child(property_name) else {
            return Ok(None);
        };
        if element.datatype.is_empty() {
            return Ok(None);
        }

        let datatype = canonical_datatype(&element.datatype);
        if PRIMITIVE_TYPES.contains(&datatype) {
            return Ok(None);
        }

        if element.is_backbone && element.has_children() {
            return Ok(Some(Arc::clone(element)));
        }

        self.resolve_type(datatype, cache, cancellation).await
    }
}
