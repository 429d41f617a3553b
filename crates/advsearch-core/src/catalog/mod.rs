//! Schema catalog.
//!
//! The catalog discovers record types at runtime through a
//! [`CatalogService`](crate::backend::CatalogService) and keeps their
//! descriptors behind a read-through, single-flight cache. Parsing and
//! relation resolution work on immutable [`CatalogSnapshot`]s taken from it.

mod catalog;
mod snapshot;

pub use catalog::{CatalogStats, ModelCatalog};
pub use snapshot::CatalogSnapshot;
