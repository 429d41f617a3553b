//! Search configuration.

use std::time::Duration;

/// Default maximum number of relation hops between two types.
pub const DEFAULT_MAX_HOPS: usize = 2;

/// Default timeout for a single backend call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of ids fetched per related batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 200;

/// Default number of batches fetched per relation.
pub const DEFAULT_MAX_BATCHES_PER_RELATION: usize = 5;

/// Default row limit when the query gives none.
pub const DEFAULT_LIMIT: u32 = 80;

/// Default maximum characters per formatted cell.
pub const DEFAULT_MAX_CELL_WIDTH: usize = 60;

/// Number of curated fields shown for the primary type when none are requested.
pub const DEFAULT_PRIMARY_FIELDS: usize = 6;

/// Number of curated fields shown for a related type when none are requested.
pub const DEFAULT_RELATED_FIELDS: usize = 4;

/// Search configuration shared by the catalog, executor and formatter.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum relation hops a related query may span.
    pub max_hops: usize,

    /// Timeout applied to each backend call.
    pub call_timeout: Duration,

    /// Ids per related fetch.
    pub max_batch_size: usize,

    /// Related fetches per relation; ids beyond the cap are dropped.
    pub max_batches_per_relation: usize,

    /// Row limit for the primary intent when none is requested.
    pub default_limit: u32,

    /// Maximum characters per formatted cell.
    pub max_cell_width: usize,

    /// Age after which cached descriptors are re-fetched (`None` keeps them
    /// for the process lifetime).
    pub catalog_ttl: Option<Duration>,
}

impl SearchConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_batches_per_relation: DEFAULT_MAX_BATCHES_PER_RELATION,
            default_limit: DEFAULT_LIMIT,
            max_cell_width: DEFAULT_MAX_CELL_WIDTH,
            catalog_ttl: None,
        }
    }

    /// Set the relation hop cap.
    pub fn with_max_hops(mut self, hops: usize) -> Self {
        self.max_hops = hops;
        self
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set the related batch size.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.max(1);
        self
    }

    /// Set the number of related batches per relation.
    pub fn with_max_batches_per_relation(mut self, count: usize) -> Self {
        self.max_batches_per_relation = count;
        self
    }

    /// Set the default row limit.
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the maximum cell width.
    pub fn with_max_cell_width(mut self, width: usize) -> Self {
        self.max_cell_width = width;
        self
    }

    /// Set the catalog entry time-to-live.
    pub fn with_catalog_ttl(mut self, ttl: Duration) -> Self {
        self.catalog_ttl = Some(ttl);
        self
    }

    /// Largest number of related ids fetched per relation.
    pub fn max_related_ids(&self) -> usize {
        self.max_batch_size
            .saturating_mul(self.max_batches_per_relation)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new()
    }
}
