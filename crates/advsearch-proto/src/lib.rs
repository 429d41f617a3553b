//! Shared types for the advsearch crates.
//!
//! This crate holds the data model that flows between the catalog, the
//! query parser, the executor and the formatters. It has no I/O.
//!
//! # Modules
//!
//! - [`value`] - Runtime values read from and sent to the record service
//! - [`schema`] - Record type and field descriptors
//! - [`query`] - Query intents, filters, join steps and compiled domains
//! - [`result`] - Search requests, formatted responses and diagnostics
//! - [`error`] - Path and filter validation errors
//!
//! # Serialization
//!
//! Every type derives serde. Descriptors accept the field type names used by
//! ERP-style catalog services (`char`, `many2one`, `one2many`, ...), and
//! record values use plain JSON shapes:
//!
//! ```
//! use advsearch_proto::{FieldDescriptor, FieldType};
//!
//! let field: FieldDescriptor = serde_json::from_str(
//!     r#"{"name": "partner_id", "type": "many2one", "relation": "res.partner"}"#,
//! )
//! .unwrap();
//! assert_eq!(field.field_type, FieldType::SingleReference);
//! ```

pub mod error;
pub mod query;
pub mod result;
pub mod schema;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use query::{
    Cardinality, Condition, DomainCondition, DomainOperator, FieldPath, FilterClause,
    FilterOperator, JoinStep, OrderSpec, QueryIntent, RelatedQuery, SchemaLookup, SortDirection,
};
pub use result::{
    Diagnostic, Record, ResultBody, ResultGroup, Row, SearchRequest, SearchResponse,
};
pub use schema::{FieldDescriptor, FieldType, ModelDescriptor, ModelSummary, SelectionChoice};
pub use value::{RecordRef, Value};
