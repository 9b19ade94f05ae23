pub mod finding;
pub mod schema;

pub use finding::{Category, Confidence, Finding, FindingSummary, Severity, summarize};
pub use schema::{MaxOccurs, SchemaNode};
