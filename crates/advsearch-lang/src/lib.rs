//! advsearch question language
//!
//! This crate turns a plain-English question about business records into a
//! structured [`ParsedQuery`]: the record type to search, filters, requested
//! fields, related record types and an optional limit and ordering.
//!
//! # Recognized phrases
//!
//! ```text
//! unpaid bills                        status keyword on a selection field
//! bills not paid                      negated status keyword
//! orders over 1,000                   comparison on the main amount field
//! bills between 100 and 500           amount range
//! bills from last month               calendar period on the main date field
//! orders in the last 30 days          trailing period
//! bills since 2026-09-01              open date range
//! orders for customer Example Corp    match on a related record's name
//! bills with vendor details           related record columns
//! top 5 largest bills                 limit and ordering
//! ```
//!
//! Fragments no rule recognizes are dropped. Only model selection can fail.
//!
//! # Usage
//!
//! ```rust
//! use advsearch_core::CatalogSnapshot;
//! use advsearch_lang::{parse, ParseOptions};
//! use advsearch_proto::{FieldDescriptor, FieldType, ModelDescriptor, ModelSummary};
//! use chrono::NaiveDate;
//!
//! let snapshot = CatalogSnapshot::from_models(
//!     vec![ModelSummary::new("sale.order").with_label("Sales Order")],
//!     vec![ModelDescriptor::from_fields(
//!         "sale.order",
//!         vec![
//!             FieldDescriptor::new("name", FieldType::Text),
//!             FieldDescriptor::new("amount_total", FieldType::Float),
//!         ],
//!     )],
//! );
//! let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
//!
//! let parsed = parse("sales orders over 500", &snapshot, &ParseOptions::new(today)).unwrap();
//! assert_eq!(parsed.primary.model, "sale.order");
//! assert_eq!(parsed.primary.filters.len(), 1);
//! ```

pub mod dates;
pub mod error;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod span;
pub mod vocabulary;

pub use error::ParseError;
pub use normalize::{normalize, Fragment, Term};
pub use parser::{parse, select_model, ParseOptions, ParsedQuery};
pub use span::Span;

/// Tokenize a question (for debugging/testing).
///
/// # Example
///
/// ```rust
/// use advsearch_lang::tokenize;
///
/// let tokens = tokenize("unpaid bills over 1,000");
/// assert_eq!(tokens.len(), 4);
/// ```
pub fn tokenize(source: &str) -> Vec<lexer::SpannedToken> {
    lexer::tokenize(source)
}
