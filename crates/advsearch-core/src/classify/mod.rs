//! Semantic classification of fields.
//!
//! Fields are grouped into coarse categories (identity, temporal, financial,
//! status, contact, relational, descriptive) from their type and name so the
//! parser can attach filters and pick output columns without knowing the
//! schema in advance.

mod classifier;
mod vocabulary;

pub use classifier::{Classification, FieldCategory, FieldClassifier};
pub use vocabulary::{is_audit_field, name_tokens};
