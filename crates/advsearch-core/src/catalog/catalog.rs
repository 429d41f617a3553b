//! Read-through model catalog.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use advsearch_proto::{Diagnostic, ModelDescriptor, ModelSummary};

use super::snapshot::CatalogSnapshot;
use crate::backend::{with_timeout, CatalogService};
use crate::config::SearchConfig;
use crate::error::Error;

/// A fetched descriptor and when it was fetched.
#[derive(Debug)]
struct CachedModel {
    descriptor: Arc<ModelDescriptor>,
    fetched_at: Instant,
}

/// Per-type cache slot; concurrent callers share one initialization.
type Slot = Arc<OnceCell<CachedModel>>;

/// Catalog statistics.
#[derive(Debug, Default)]
pub struct CatalogStats {
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
}

impl CatalogStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    /// Get miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(AtomicOrdering::Relaxed)
    }

    /// Get backend fetch count.
    pub fn fetches(&self) -> u64 {
        self.fetches.load(AtomicOrdering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

/// Runtime directory of record types backed by a [`CatalogService`].
///
/// Descriptors are fetched on first use and cached for the process lifetime,
/// or until the configured TTL elapses. Concurrent first-time requests for
/// the same type trigger a single backend call. Failed fetches are not
/// cached.
pub struct ModelCatalog {
    service: Arc<dyn CatalogService>,
    entries: DashMap<String, Slot>,
    summaries: RwLock<Option<Arc<Vec<ModelSummary>>>>,
    call_timeout: Duration,
    ttl: Option<Duration>,
    stats: CatalogStats,
}

impl ModelCatalog {
    /// Create a catalog over `service`.
    pub fn new(service: Arc<dyn CatalogService>, config: &SearchConfig) -> Self {
        Self {
            service,
            entries: DashMap::new(),
            summaries: RwLock::new(None),
            call_timeout: config.call_timeout,
            ttl: config.catalog_ttl,
            stats: CatalogStats::default(),
        }
    }

    /// Describe a record type.
    ///
    /// Fails with [`Error::ModelNotFound`] when the service knows no such
    /// type and [`Error::BackendUnavailable`] when the call fails or times out.
    pub async fn describe(&self, model: &str) -> Result<Arc<ModelDescriptor>, Error> {
        let slot = self.slot(model);

        if let Some(cached) = slot.get() {
            self.stats.hits.fetch_add(1, AtomicOrdering::Relaxed);
            return Ok(cached.descriptor.clone());
        }

        self.stats.misses.fetch_add(1, AtomicOrdering::Relaxed);
        match slot.get_or_try_init(|| self.fetch(model)).await {
            Ok(cached) => Ok(cached.descriptor.clone()),
            Err(e) => {
                // Failed lookups leave no slot behind.
                self.entries.remove_if(model, |_, current| {
                    Arc::ptr_eq(current, &slot) && current.get().is_none()
                });
                Err(e)
            }
        }
    }

    /// List the record types known to the service.
    ///
    /// The list is fetched once and kept until [`ModelCatalog::refresh_all`].
    pub async fn list_models(&self) -> Result<Arc<Vec<ModelSummary>>, Error> {
        let cached = self.summaries.read().clone();
        if let Some(summaries) = cached {
            return Ok(summaries);
        }

        let summaries = Arc::new(
            with_timeout(self.call_timeout, "*", "list_models", self.service.list_models())
                .await?,
        );
        debug!(count = summaries.len(), "catalog listed models");
        *self.summaries.write() = Some(summaries.clone());
        Ok(summaries)
    }

    /// Drop the cached descriptor of `model`.
    pub fn refresh(&self, model: &str) {
        if self.entries.remove(model).is_some() {
            debug!(model, "catalog entry invalidated");
        }
    }

    /// Drop every cached descriptor and the type list.
    pub fn refresh_all(&self) {
        self.entries.clear();
        *self.summaries.write() = None;
        debug!("catalog cleared");
    }

    /// Check if a descriptor for `model` is cached and fresh.
    pub fn is_cached(&self, model: &str) -> bool {
        self.entries
            .get(model)
            .is_some_and(|slot| slot.get().is_some() && !self.is_expired(&slot))
    }

    /// Get catalog statistics.
    pub fn stats(&self) -> &CatalogStats {
        &self.stats
    }

    /// Describe `primary` and every type reachable within `hops` relations.
    ///
    /// Only a failure to describe `primary` aborts the snapshot. Relation
    /// targets the service does not know are skipped with a warning; targets
    /// that fail to describe are skipped too and noted on the snapshot as
    /// [`Diagnostic::PartialResult`].
    pub async fn snapshot_around(&self, primary: &str, hops: usize) -> Result<CatalogSnapshot, Error> {
        let summaries = self.list_models().await?;
        let mut snapshot = CatalogSnapshot::new(summaries.as_ref().clone());

        let root = self.describe(primary).await?;
        let mut seen: HashSet<String> = HashSet::from([primary.to_string()]);
        let mut queue: VecDeque<(Arc<ModelDescriptor>, usize)> = VecDeque::from([(root, 0)]);

        while let Some((model, depth)) = queue.pop_front() {
            if depth < hops {
                let targets: Vec<String> = model
                    .relational_fields()
                    .filter_map(|f| f.target())
                    .filter(|target| seen.insert(target.to_string()))
                    .map(String::from)
                    .collect();

                let described = join_all(targets.iter().map(|t| self.describe(t))).await;
                for (target, result) in targets.into_iter().zip(described) {
                    match result {
                        Ok(descriptor) => queue.push_back((descriptor, depth + 1)),
                        Err(Error::ModelNotFound { .. }) => {
                            warn!(
                                model = %model.name,
                                relation_target = %target,
                                "relation target missing from catalog, skipping"
                            );
                        }
                        Err(e) => {
                            warn!(
                                model = %model.name,
                                relation_target = %target,
                                error = %e,
                                "relation target unavailable, skipping"
                            );
                            snapshot.note(Diagnostic::PartialResult {
                                model: target,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
            }
            snapshot.insert(model);
        }

        debug!(primary, hops, models = snapshot.len(), "catalog snapshot taken");
        Ok(snapshot)
    }

    fn slot(&self, model: &str) -> Slot {
        let existing = self.entries.get(model).map(|entry| entry.value().clone());
        if let Some(slot) = existing {
            if !self.is_expired(&slot) {
                return slot;
            }
            self.entries
                .remove_if(model, |_, current| Arc::ptr_eq(current, &slot));
            debug!(model, "catalog entry expired");
        }

        self.entries
            .entry(model.to_string())
            .or_default()
            .value()
            .clone()
    }

    fn is_expired(&self, slot: &Slot) -> bool {
        match (self.ttl, slot.get()) {
            (Some(ttl), Some(cached)) => cached.fetched_at.elapsed() >= ttl,
            _ => false,
        }
    }

    async fn fetch(&self, model: &str) -> Result<CachedModel, Error> {
        self.stats.fetches.fetch_add(1, AtomicOrdering::Relaxed);
        debug!(model, "catalog miss, describing");

        let described =
            with_timeout(self.call_timeout, model, "describe", self.service.describe(model))
                .await?;

        match described {
            Some(descriptor) => Ok(CachedModel {
                descriptor: Arc::new(descriptor),
                fetched_at: Instant::now(),
            }),
            None => Err(Error::ModelNotFound {
                model: model.to_string(),
            }),
        }
    }
}
