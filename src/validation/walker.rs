//! Structural walk over a bundle document.
//!
//! The walker parses the raw text, checks the container shape, and then
//! walks every contained record depth-first, left to right. At each property
//! it runs the [`CheckSet`] against the current schema context and asks the
//! [`SchemaResolver`] for the context of the property's value before
//! descending. Findings are appended in traversal order, so the result is
//! deterministic whatever the latency of the schema provider.
//!
//! The walk is advisory: `validate` never fails. A schema lookup that fails
//! leaves the affected subtree without schema context and the walk goes on;
//! the first such failure is reported as a single `INTERNAL_ERROR` finding
//! after everything else. A panic raised below the walker (for instance by a
//! schema provider) is reported the same way, except the rule-catalog panic,
//! which is re-raised.

use async_recursion::async_recursion;
use futures::FutureExt;
use serde_json::{Map, Value as JsonValue, json};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::{Cancellation, CheckSet, NodeLocation, SchemaCache, SchemaResolver};
use crate::catalog::{FindingFactory, UNREGISTERED_RULE_PANIC, rule_ids};
use crate::config::ShapeCheckConfig;
use crate::error::{Result, ShapeCheckError};
use crate::paths::{DocumentPointer, LogicalPath};
use crate::provider::{NoVersionTable, SchemaProvider, VersionCompatibilityTable};
use crate::types::{Finding, SchemaNode};

/// Mutable state of one validation call. Never shared between calls.
struct WalkState {
    cache: SchemaCache,
    findings: Vec<Finding>,
    version_tag: String,
    cancellation: Option<Cancellation>,
    /// First schema lookup failure, reported after the walk
    failure: Option<ShapeCheckError>,
    failed_lookups: usize,
}

impl WalkState {
    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(Cancellation::is_cancelled)
    }

    /// Maps a failed lookup to "no schema context". Cancellation still propagates.
    fn absorb_lookup(
        &mut self,
        lookup: Result<Option<Arc<SchemaNode>>>,
    ) -> Result<Option<Arc<SchemaNode>>> {
        match lookup {
            Err(e) if !e.is_cancellation() => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Schema lookup failed, continuing without schema context: {}", e);
                self.failed_lookups += 1;
                self.failure.get_or_insert(e);
                Ok(None)
            }
            other => other,
        }
    }
}

/// Position of a value inside a record plus the schema context it is read against.
#[derive(Clone, Copy)]
struct Scope<'a> {
    record_type: &'a str,
    pointer: &'a DocumentPointer,
    path: &'a LogicalPath,
    context: Option<&'a Arc<SchemaNode>>,
}

impl<'a> Scope<'a> {
    fn location(&self) -> NodeLocation<'a> {
        NodeLocation {
            pointer: self.pointer,
            path: self.path,
            record_type: self.record_type,
        }
    }

    fn context_node(&self) -> Option<&'a SchemaNode> {
        self.context.map(Arc::as_ref)
    }
}

pub struct StructuralWalker {
    config: ShapeCheckConfig,
    resolver: SchemaResolver,
    checks: CheckSet,
}

impl StructuralWalker {
    pub fn new(
        provider: Arc<dyn SchemaProvider>,
        versions: Arc<dyn VersionCompatibilityTable>,
        config: ShapeCheckConfig,
    ) -> Self {
        let checks = CheckSet::new(&config, versions);
        Self {
            config,
            resolver: SchemaResolver::new(provider),
            checks,
        }
    }

    /// Walker with the default layout and no version table.
    pub fn with_provider(provider: Arc<dyn SchemaProvider>) -> Self {
        Self::new(provider, Arc::new(NoVersionTable), ShapeCheckConfig::default())
    }

    pub fn config(&self) -> &ShapeCheckConfig {
        &self.config
    }

    /// Validates `raw_text` and returns every finding in traversal order.
    pub async fn validate(&self, raw_text: &str, version_tag: &str) -> Vec<Finding> {
        self.validate_with_cancellation(raw_text, version_tag, None)
            .await
    }

    /// Like [`validate`](Self::validate), stopping early once `cancellation`
    /// is set. A cancelled run returns the findings gathered up to that point.
    pub async fn validate_with_cancellation(
        &self,
        raw_text: &str,
        version_tag: &str,
        cancellation: Option<&Cancellation>,
    ) -> Vec<Finding> {
        if raw_text.trim().is_empty() {
            return vec![FindingFactory::create(
                rule_ids::EMPTY_INPUT,
                "The document is empty",
                None,
                None,
                None,
                None,
            )];
        }

        let document: JsonValue = match serde_json::from_str(raw_text) {
            Ok(document) => document,
            Err(e) => {
                return vec![FindingFactory::create(
                    rule_ids::INVALID_DOCUMENT,
                    format!("The document is not valid JSON: {e}"),
                    None,
                    None,
                    None,
                    object(json!({ "line": e.line(), "column": e.column() })),
                )];
            }
        };

        self.validate_document(&document, version_tag, cancellation)
            .await
    }

    /// Validates an already parsed document.
    ///
    /// # Panics
    ///
    /// Re-raises the panic of [`FindingFactory::create`] for an unregistered
    /// rule id. Any other panic during the walk becomes an `INTERNAL_ERROR`
    /// finding.
    pub async fn validate_document(
        &self,
        document: &JsonValue,
        version_tag: &str,
        cancellation: Option<&Cancellation>,
    ) -> Vec<Finding> {
        let mut state = WalkState {
            cache: SchemaCache::new(),
            findings: Vec::new(),
            version_tag: version_tag.to_string(),
            cancellation: cancellation.cloned(),
            failure: None,
            failed_lookups: 0,
        };

        let outcome = AssertUnwindSafe(self.walk_document(document, &mut state))
            .catch_unwind()
            .await;

        let aborted = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) if e.is_cancellation() => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "Structural pre-check cancelled after {} findings",
                    state.findings.len()
                );
                None
            }
            Ok(Err(e)) => Some(e),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                if message.contains(UNREGISTERED_RULE_PANIC) {
                    std::panic::resume_unwind(payload);
                }
                Some(ShapeCheckError::internal(format!(
                    "structural walk panicked: {message}"
                )))
            }
        };

        if let Some(e) = state.failure.take().or(aborted) {
            #[cfg(feature = "tracing")]
            tracing::warn!("Structural pre-check incomplete: {}", e);
            state.findings.push(FindingFactory::create(
                rule_ids::INTERNAL_ERROR,
                format!("The structural pre-check is incomplete: {e}"),
                None,
                None,
                None,
                object(json!({
                    "error": e.to_string(),
                    "failedLookups": state.failed_lookups,
                })),
            ));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Structural pre-check finished with {} findings ({} schema types looked up)",
            state.findings.len(),
            state.cache.len()
        );
        state.findings
    }

    async fn walk_document(&self, document: &JsonValue, state: &mut WalkState) -> Result<()> {
        let layout = &self.config.layout;
        let root_pointer = DocumentPointer::root();

        let JsonValue::Object(root) = document else {
            state.findings.push(FindingFactory::create(
                rule_ids::ROOT_NOT_OBJECT,
                format!(
                    "The document must be a JSON object, found {}",
                    json_type_name(document)
                ),
                Some(&root_pointer),
                None,
                None,
                object(json!({ "actualType": json_type_name(document) })),
            ));
            return Ok(());
        };

        if discriminator_of(root, &layout.discriminator).is_none() {
            state.findings.push(FindingFactory::create(
                rule_ids::MISSING_DISCRIMINATOR,
                format!(
                    "The document does not declare its type in '{}'",
                    layout.discriminator
                ),
                Some(&root_pointer),
                None,
                None,
                object(json!({ "property": layout.discriminator })),
            ));
        }

        let collection_pointer = root_pointer.key(&layout.collection);
        let entries = match root.get(&layout.collection) {
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Document has no '{}' collection", layout.collection);
                return Ok(());
            }
            Some(JsonValue::Array(entries)) => entries,
            Some(other) => {
                state.findings.push(FindingFactory::create(
                    rule_ids::ENTRY_NOT_ARRAY,
                    format!(
                        "'{}' must be an array, found {}",
                        layout.collection,
                        json_type_name(other)
                    ),
                    Some(&collection_pointer),
                    None,
                    None,
                    object(json!({ "actualType": json_type_name(other) })),
                ));
                return Ok(());
            }
        };

        for (index, entry) in entries.iter().enumerate() {
            if state.is_cancelled() {
                return Err(ShapeCheckError::Cancelled);
            }
            self.walk_record(entry, &collection_pointer.index(index), state)
                .await?;
        }

        Ok(())
    }

    async fn walk_record(
        &self,
        entry: &JsonValue,
        entry_pointer: &DocumentPointer,
        state: &mut WalkState,
    ) -> Result<()> {
        let layout = &self.config.layout;

        let JsonValue::Object(entry_object) = entry else {
            state.findings.push(FindingFactory::create(
                rule_ids::ENTRY_NOT_OBJECT,
                format!("Entry must be a JSON object, found {}", json_type_name(entry)),
                Some(entry_pointer),
                None,
                None,
                object(json!({ "actualType": json_type_name(entry) })),
            ));
            return Ok(());
        };

        let record_pointer = entry_pointer.key(&layout.record);
        let (record_value, record) = match entry_object.get(&layout.record) {
            Some(value @ JsonValue::Object(record)) => (value, record),
            other => {
                let (pointer, actual) = match other {
                    Some(value) => (&record_pointer, json_type_name(value)),
                    None => (entry_pointer, "nothing"),
                };
                state.findings.push(FindingFactory::create(
                    rule_ids::RECORD_NOT_OBJECT,
                    format!(
                        "Entry must hold its record in an object '{}', found {actual}",
                        layout.record
                    ),
                    Some(pointer),
                    None,
                    None,
                    object(json!({ "property": layout.record, "actualType": actual })),
                ));
                return Ok(());
            }
        };
        let Some(record_type) = discriminator_of(record, &layout.discriminator) else {
            state.findings.push(FindingFactory::create(
                rule_ids::RECORD_MISSING_TYPE,
                format!(
                    "Record does not declare a string '{}'",
                    layout.discriminator
                ),
                Some(&record_pointer),
                None,
                None,
                object(json!({ "property": layout.discriminator })),
            ));
            return Ok(());
        };

        let lookup = self
            .resolver
            .resolve_type(record_type, &mut state.cache, state.cancellation.as_ref())
            .await;
        let root_schema = state.absorb_lookup(lookup)?;
        #[cfg(feature = "tracing")]
        if root_schema.is_none() {
            tracing::debug!(
                "No schema for record type {}; schema-relative checks skipped at {}",
                record_type,
                record_pointer
            );
        }

        let root_path = LogicalPath::root();
        let scope = Scope {
            record_type,
            pointer: &record_pointer,
            path: &root_path,
            context: root_schema.as_ref(),
        };

        let missing =
            self.checks
                .check_missing_required_fields(record_value, scope.context_node(), scope.location());
        state.findings.extend(missing);

        for (name, value) in record {
            self.validate_property(name, value, scope, true, state)
                .await?;
        }

        Ok(())
    }

    /// Runs every check for one property, then descends into its value.
    #[async_recursion]
    async fn validate_property<'a>(
        &'a self,
        name: &'a str,
        value: &'a JsonValue,
        parent: Scope<'a>,
        at_record_root: bool,
        state: &'a mut WalkState,
    ) -> Result<()> {
        let pointer = parent.pointer.key(name);
        let path = parent.path.child(name);
        let location = NodeLocation {
            pointer: &pointer,
            path: &path,
            record_type: parent.record_type,
        };
        let context = parent.context_node();

        if let Some(finding) =
            self.checks
                .check_unknown_element(name, context, at_record_root, location)
        {
            state.findings.push(finding);
        }

        let version_findings =
            self.checks
                .check_version_compatibility(&state.version_tag, name, location);
        state.findings.extend(version_findings);

        if let Some(finding) = self.checks.check_primitive_format(name, value, location) {
            state.findings.push(finding);
        }

        if let Some(finding) = self.checks.check_collection_shape(value, context, location) {
            state.findings.push(finding);
        }

        let lookup = self
            .resolver
            .resolve_child(
                parent.context,
                name,
                &mut state.cache,
                state.cancellation.as_ref(),
            )
            .await;
        let child_context = state.absorb_lookup(lookup)?;

        let scope = Scope {
            record_type: parent.record_type,
            pointer: &pointer,
            path: &path,
            context: child_context.as_ref(),
        };
        self.descend(value, scope, state).await
    }

    /// Walks a property value. Objects get the required-field check and
    /// per-property recursion; array members are walked with their index
    /// added to the pointer while the logical path stays unchanged.
    #[async_recursion]
    async fn descend<'a>(
        &'a self,
        value: &'a JsonValue,
        scope: Scope<'a>,
        state: &'a mut WalkState,
    ) -> Result<()> {
        match value {
            JsonValue::Object(properties) => {
                let missing = self.checks.check_missing_required_fields(
                    value,
                    scope.context_node(),
                    scope.location(),
                );
                state.findings.extend(missing);

                for (name, child) in properties {
                    self.validate_property(name, child, scope, false, state)
                        .await?;
                }
            }
            JsonValue::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let item_pointer = scope.pointer.index(index);
                    let item_scope = Scope {
                        pointer: &item_pointer,
                        ..scope
                    };
                    self.descend(item, item_scope, state).await?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn discriminator_of<'a>(object: &'a Map<String, JsonValue>, property: &str) -> Option<&'a str> {
    object
        .get(property)
        .and_then(JsonValue::as_str)
        .filter(|value| !value.trim().is_empty())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn object(value: JsonValue) -> Option<Map<String, JsonValue>> {
    match value {
        JsonValue::Object(map) => Some(map),
        _ => None,
    }
}
