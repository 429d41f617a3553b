//! advsearch core - schema catalog, relation resolution and search execution.
//!
//! This crate holds everything between a parsed query and a formatted
//! response:
//!
//! - [`catalog`]: memoized, single-flight schema reflection
//! - [`classify`]: field role heuristics
//! - [`relation`]: join path resolution over relational fields
//! - [`query`]: planning, batched related fetches and hash joins
//! - [`format`]: table and grouped rendering
//!
//! Record data comes from a [`backend::RecordService`]; schemas come from a
//! [`backend::CatalogService`]. [`backend::MemoryBackend`] implements both
//! over a JSON fixture.

pub mod backend;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod format;
pub mod query;
pub mod relation;

pub use backend::{CatalogService, Fixture, FixtureModel, MemoryBackend, RecordService};
pub use catalog::{CatalogSnapshot, CatalogStats, ModelCatalog};
pub use classify::{Classification, FieldCategory, FieldClassifier};
pub use config::SearchConfig;
pub use error::Error;
pub use format::ResultFormatter;
pub use query::{ExecutionResult, QueryPlan, QueryPlanner, RelatedRows, SearchExecutor};
pub use relation::RelationshipHandler;

/// Re-export protocol types.
pub use advsearch_proto as proto;
