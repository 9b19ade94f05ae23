//! octofhir-shapecheck - best-effort structural pre-validation of bundle documents.
//!
//! This crate walks a JSON bundle of typed records against schema trees and
//! reports, in one pass, what a full conformance validator is likely to
//! reject: unknown properties, missing required fields, array/object shape
//! mismatches, malformed dates and booleans, and fields unavailable in the
//! declared version. Its findings are advisory. It never fails on document
//! input; an authoritative validator still makes the final decision.
//!
//! # Quick Start
//!
//! ```ignore
//! use octofhir_shapecheck::{FileSystemSchemaProvider, StructuralWalker};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(FileSystemSchemaProvider::new("schemas/r4"));
//! let walker = StructuralWalker::with_provider(provider);
//! let findings = walker.validate(&bundle_json, "R4").await;
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - [`SchemaNode`] and [`Finding`]
//! - [`catalog`] - rule metadata and the finding factory
//! - [`paths`] - logical paths and document pointers
//! - [`provider`] - schema providers and version tables
//! - [`validation`] - the walker, resolver, checks and per-run cache
//! - [`config`] - document layout and other settings

pub mod catalog;
pub mod config;
pub mod error;
pub mod paths;
pub mod provider;
pub mod types;
pub mod validation;

// Error exports
pub use error::{Result, ShapeCheckError};

// Type exports
pub use types::{
    Category, Confidence, Finding, FindingSummary, MaxOccurs, SchemaNode, Severity, summarize,
};

pub use catalog::{FindingFactory, RuleCatalog, RuleDefinition, rule_ids};
pub use config::{DocumentLayout, ShapeCheckConfig};
pub use paths::{DocumentPointer, LogicalPath};

// Provider exports
pub use provider::{
    CacheConfig, CacheStats, CachedSchemaProvider, FileSystemSchemaProvider,
    InMemorySchemaProvider, NoVersionTable, SchemaProvider, StaticVersionTable,
    VersionCompatibilityTable, VersionEntry,
};

// Validation exports
pub use validation::{Cancellation, SchemaCache, SchemaResolver, StructuralWalker};
