//! Common test utilities for structural pre-check tests.
//!
//! Provides schema fixtures, walker constructors and instrumented providers.

#![allow(dead_code)]

use async_trait::async_trait;
use octofhir_shapecheck::{
    DocumentLayout, Finding, InMemorySchemaProvider, NoVersionTable, Result, SchemaNode,
    SchemaProvider, ShapeCheckConfig, ShapeCheckError, StructuralWalker,
    VersionCompatibilityTable,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// `Subject` record schema; `identifier` is 1..* when `require_identifier` is set.
pub fn subject_schema(require_identifier: bool) -> SchemaNode {
    let identifier = SchemaNode::element("identifier", "Identifier").repeating();
    let identifier = if require_identifier {
        identifier.required()
    } else {
        identifier
    };

    SchemaNode::root("Subject")
        .with_child(identifier)
        .with_child(SchemaNode::element("name", "HumanName").repeating())
        .with_child(SchemaNode::element("birthDate", "date"))
        .with_child(SchemaNode::element("gender", "code"))
        .with_child(SchemaNode::element("active", "boolean"))
        .with_child(SchemaNode::element("managingOrganization", "Reference"))
        .with_child(SchemaNode::element("extension", "Extension").repeating())
        .with_child(
            SchemaNode::element("contact", "")
                .backbone()
                .repeating()
                .with_child(SchemaNode::element("name", "HumanName"))
                .with_child(SchemaNode::element("relationship", "string")),
        )
}

pub fn human_name_schema() -> SchemaNode {
    SchemaNode::root("HumanName")
        .with_child(SchemaNode::element("use", "code"))
        .with_child(SchemaNode::element("family", "string"))
        .with_child(SchemaNode::element("given", "string").repeating())
        .with_child(SchemaNode::element("period", "Period"))
}

pub fn identifier_schema() -> SchemaNode {
    SchemaNode::root("Identifier")
        .with_child(SchemaNode::element("system", "uri"))
        .with_child(SchemaNode::element("value", "string").required())
}

pub fn period_schema() -> SchemaNode {
    SchemaNode::root("Period")
        .with_child(SchemaNode::element("start", "dateTime"))
        .with_child(SchemaNode::element("end", "dateTime"))
}

pub fn extension_schema() -> SchemaNode {
    SchemaNode::root("Extension")
        .with_child(SchemaNode::element("url", "uri").required())
        .with_child(SchemaNode::element("value[x]", "").choice().required())
        .with_child(SchemaNode::element("valueString", "string").choice())
}

pub fn schema_provider(require_identifier: bool) -> InMemorySchemaProvider {
    InMemorySchemaProvider::new()
        .with_schema(subject_schema(require_identifier))
        .with_schema(human_name_schema())
        .with_schema(identifier_schema())
        .with_schema(period_schema())
        .with_schema(extension_schema())
}

/// Layout used by the bundle scenarios: `kind` / `items` / `item`.
pub fn scenario_config() -> ShapeCheckConfig {
    ShapeCheckConfig::default().with_layout(DocumentLayout::new("kind", "items", "item"))
}

pub fn scenario_walker(require_identifier: bool) -> StructuralWalker {
    walker_with(Arc::new(schema_provider(require_identifier)))
}

pub fn walker_with(provider: Arc<dyn SchemaProvider>) -> StructuralWalker {
    StructuralWalker::new(provider, Arc::new(NoVersionTable), scenario_config())
}

pub fn walker_with_versions(
    provider: Arc<dyn SchemaProvider>,
    versions: Arc<dyn VersionCompatibilityTable>,
) -> StructuralWalker {
    StructuralWalker::new(provider, versions, scenario_config())
}

/// Wraps records into a `kind: Bundle` document.
pub fn bundle(records: Vec<serde_json::Value>) -> String {
    let items: Vec<_> = records
        .into_iter()
        .map(|record| serde_json::json!({ "item": record }))
        .collect();
    serde_json::json!({ "kind": "Bundle", "items": items }).to_string()
}

pub fn finding_ids(findings: &[Finding]) -> Vec<&str> {
    findings.iter().map(|f| f.rule_id.as_str()).collect()
}

pub fn with_rule<'a>(findings: &'a [Finding], rule_id: &str) -> Vec<&'a Finding> {
    findings.iter().filter(|f| f.rule_id == rule_id).collect()
}

/// Counts provider calls per run.
pub struct CountingProvider {
    inner: InMemorySchemaProvider,
    calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new(inner: InMemorySchemaProvider) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaProvider for CountingProvider {
    async fn get_schema(&self, type_name: &str) -> Result<Option<Arc<SchemaNode>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_schema(type_name).await
    }
}

/// Answers after a per-type delay so fetch completion order differs from request order.
pub struct SlowProvider {
    inner: InMemorySchemaProvider,
}

impl SlowProvider {
    pub fn new(inner: InMemorySchemaProvider) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SchemaProvider for SlowProvider {
    async fn get_schema(&self, type_name: &str) -> Result<Option<Arc<SchemaNode>>> {
        let delay = (type_name.len() as u64 % 5) * 3;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.inner.get_schema(type_name).await
    }
}

/// Fails for one type name, delegating everything else.
pub struct FailingProvider {
    inner: InMemorySchemaProvider,
    failing_type: String,
}

impl FailingProvider {
    pub fn new(inner: InMemorySchemaProvider, failing_type: impl Into<String>) -> Self {
        Self {
            inner,
            failing_type: failing_type.into(),
        }
    }
}

#[async_trait]
impl SchemaProvider for FailingProvider {
    async fn get_schema(&self, type_name: &str) -> Result<Option<Arc<SchemaNode>>> {
        if type_name == self.failing_type {
            return Err(ShapeCheckError::schema_provider(
                type_name.to_string(),
                "backend unavailable".to_string(),
            ));
        }
        self.inner.get_schema(type_name).await
    }
}
