//! Schema-driven structural validation.
//!
//! - **[`walker`]** - [`StructuralWalker`], the entry point
//! - **[`resolver`]** - schema context switching while descending
//! - **[`checks`]** - the independent per-node checks
//! - **[`cache`]** - per-run schema memo
//!
//! # Example
//!
//! ```ignore
//! use octofhir_shapecheck::{InMemorySchemaProvider, StructuralWalker};
//! use std::sync::Arc;
//!
//! let walker = StructuralWalker::with_provider(Arc::new(provider));
//! let findings = walker.validate(&raw_json, "R4").await;
//! for finding in &findings {
//!     println!("{finding}");
//! }
//! ```

pub mod cache;
pub mod cancellation;
pub mod checks;
pub mod resolver;
pub mod walker;

pub use cache::SchemaCache;
pub use cancellation::Cancellation;
pub use checks::{CheckSet, NodeLocation};
pub use resolver::{SchemaResolver, canonical_datatype, is_primitive_type};
pub use walker::StructuralWalker;
