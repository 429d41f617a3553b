//! advsearch - natural-language advanced search.
//!
//! Ask for business records in plain English and get a table back:
//!
//! ```text
//! List all unpaid bills with vendor details
//! List all sales orders for customer Example Corp
//! ```
//!
//! [`AdvancedSearch`] wires the pieces together: the schema catalog and
//! executor from `advsearch-core` and the question parser from
//! `advsearch-lang`. Record data and schemas come from any
//! [`CatalogService`] and [`RecordService`]; [`MemoryBackend`] serves JSON
//! fixtures.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use advsearch::{AdvancedSearch, MemoryBackend, SearchConfig, SearchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = Arc::new(MemoryBackend::load("demos/accounting.json")?);
//!     let search = AdvancedSearch::with_backend(backend, SearchConfig::default());
//!
//!     let response = search
//!         .search(SearchRequest::new("List all unpaid bills with vendor details"))
//!         .await?;
//!     println!("{}", response.summary);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod search;

pub use error::Error;
pub use search::AdvancedSearch;

pub use advsearch_core::{CatalogService, MemoryBackend, RecordService, SearchConfig};
pub use advsearch_lang::ParseError;
pub use advsearch_proto::{Diagnostic, ResultBody, SearchRequest, SearchResponse};

/// Re-export protocol types.
pub use advsearch_proto as proto;
