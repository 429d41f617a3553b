//! Interfaces to the external record system.
//!
//! The catalog service reports which record types exist and what their fields
//! look like; the record service runs filtered reads. Both are consumed
//! through async traits so callers can plug in a remote ERP client, while
//! [`MemoryBackend`] serves fixtures for the CLI and tests.

mod memory;

pub use memory::{Fixture, FixtureModel, MemoryBackend};

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use advsearch_proto::{DomainCondition, ModelDescriptor, ModelSummary, OrderSpec, Record};

use crate::error::Error;

/// Directory and schema reflection of the record system.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// List the record types the caller may search.
    async fn list_models(&self) -> Result<Vec<ModelSummary>, Error>;

    /// Describe the fields of a record type.
    ///
    /// Returns `Ok(None)` when the type does not exist.
    async fn describe(&self, model: &str) -> Result<Option<ModelDescriptor>, Error>;
}

/// Filtered reads against the record system.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Read the records of `model` matching every condition of `domain`.
    ///
    /// `fields` restricts the returned values (all fields when empty), in the
    /// given order.
    async fn search_read(
        &self,
        model: &str,
        domain: &[DomainCondition],
        fields: &[String],
        limit: Option<u32>,
        order: &[OrderSpec],
    ) -> Result<Vec<Record>, Error>;
}

/// Run a backend call under `timeout`, mapping expiry to `BackendUnavailable`.
pub(crate) async fn with_timeout<T, F>(
    timeout: Duration,
    model: &str,
    operation: &str,
    call: F,
) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(model, operation, timeout_ms = timeout.as_millis() as u64, "backend call timed out");
            Err(Error::backend(
                model,
                operation,
                format!("timed out after {}ms", timeout.as_millis()),
            ))
        }
    }
}
