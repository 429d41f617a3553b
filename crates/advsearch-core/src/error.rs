//! Core error types.

use thiserror::Error;

/// Errors raised by the catalog, relation resolver and executor.
#[derive(Debug, Error)]
pub enum Error {
    /// The catalog service reports no such record type.
    #[error("model '{model}' not found in catalog")]
    ModelNotFound { model: String },

    /// No relation path connects the two types within the hop cap.
    #[error("no relation from '{origin}' to '{target}' within {max_hops} hop(s)")]
    UnsupportedRelation {
        origin: String,
        target: String,
        max_hops: usize,
    },

    /// A backend call failed or timed out.
    #[error("backend unavailable during {operation} on '{model}': {reason}")]
    BackendUnavailable {
        model: String,
        operation: String,
        reason: String,
    },

    /// A filter does not fit the schema.
    #[error("invalid filter on '{model}.{field}': {reason}")]
    InvalidFilter {
        model: String,
        field: String,
        reason: String,
    },

    /// A join step does not fit the schema.
    #[error("invalid join through '{model}.{field}'")]
    InvalidJoin { model: String, field: String },

    /// A fixture file could not be loaded.
    #[error("fixture error: {0}")]
    Fixture(String),
}

impl Error {
    /// Build a `BackendUnavailable` error.
    pub fn backend(
        model: impl Into<String>,
        operation: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Error::BackendUnavailable {
            model: model.into(),
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Map a path validation error raised while compiling an intent on `model`.
    pub fn from_proto(model: &str, err: advsearch_proto::Error) -> Self {
        match err {
            advsearch_proto::Error::NotRelational { model, field } => {
                Error::InvalidJoin { model, field }
            }
            other => Error::InvalidFilter {
                model: model.to_string(),
                field: other.field().unwrap_or_default().to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Check if the error is a backend failure.
    pub fn is_backend(&self) -> bool {
        matches!(self, Error::BackendUnavailable { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Fixture(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Fixture(err.to_string())
    }
}
