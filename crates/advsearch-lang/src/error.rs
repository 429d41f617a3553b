//! Parse error types.

use thiserror::Error;

/// Errors raised while interpreting a question.
///
/// Unrecognized fragments are dropped, so only model selection can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The question has no meaningful words.
    #[error("empty query")]
    EmptyQuery,

    /// Several record types match the question equally well.
    #[error("query matches several models equally: {}", .candidates.join(", "))]
    AmbiguousModel { candidates: Vec<String> },

    /// No record type matches the question.
    #[error("no model matches query '{query}'")]
    NoMatchingModel { query: String },

    /// A requested record type is not in the catalog.
    #[error("model '{model}' not found in catalog")]
    UnknownModel { model: String },
}
