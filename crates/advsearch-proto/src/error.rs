//! Validation errors for intents and join steps.

use thiserror::Error;

/// Errors raised while checking a field path or compiling a filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The path has no segments.
    #[error("empty field path on model '{model}'")]
    EmptyPath { model: String },

    /// A path segment names a field the model does not have.
    #[error("unknown field '{field}' on model '{model}'")]
    UnknownField { model: String, field: String },

    /// A non-terminal path segment is not a relational field.
    #[error("field '{field}' on model '{model}' is not relational")]
    NotRelational { model: String, field: String },

    /// A relational field points at a type missing from the catalog.
    #[error("field '{field}' on model '{model}' targets unknown model '{target}'")]
    UnknownTarget {
        model: String,
        field: String,
        target: String,
    },

    /// The condition cannot be expressed as a domain.
    #[error("invalid condition on '{field}': {reason}")]
    InvalidCondition { field: String, reason: String },
}

impl Error {
    /// Name of the offending field, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::EmptyPath { .. } => None,
            Error::UnknownField { field, .. }
            | Error::NotRelational { field, .. }
            | Error::UnknownTarget { field, .. }
            | Error::InvalidCondition { field, .. } => Some(field),
        }
    }
}
