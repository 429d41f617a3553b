//! Search error types.

use thiserror::Error;

/// Errors returned by [`AdvancedSearch::search`](crate::AdvancedSearch::search).
#[derive(Debug, Error)]
pub enum Error {
    /// The question could not be mapped to a record type.
    #[error(transparent)]
    Parse(#[from] advsearch_lang::ParseError),

    /// Catalog, relation or backend failure.
    #[error(transparent)]
    Core(#[from] advsearch_core::Error),
}

impl Error {
    /// Check if the error is a backend failure.
    pub fn is_backend(&self) -> bool {
        matches!(self, Error::Core(e) if e.is_backend())
    }
}
