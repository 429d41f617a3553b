//! Immutable catalog snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use advsearch_proto::{Diagnostic, ModelDescriptor, ModelSummary, SchemaLookup};

/// Point-in-time view of part of the catalog.
///
/// Holds the type directory and the descriptors fetched around one primary
/// type, plus notes on types that could not be described. Snapshots are
/// plain data: reading one never calls the backend.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    summaries: Vec<ModelSummary>,
    models: HashMap<String, Arc<ModelDescriptor>>,
    diagnostics: Vec<Diagnostic>,
}

impl CatalogSnapshot {
    /// Create a snapshot with a type directory and no descriptors.
    pub fn new(summaries: Vec<ModelSummary>) -> Self {
        Self {
            summaries,
            models: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Build a snapshot directly from descriptors.
    ///
    /// Types without a summary get one derived from the descriptor label.
    pub fn from_models(summaries: Vec<ModelSummary>, models: Vec<ModelDescriptor>) -> Self {
        let mut snapshot = Self::new(summaries);
        for model in models {
            snapshot.insert(Arc::new(model));
        }
        snapshot
    }

    /// Add a descriptor.
    pub fn insert(&mut self, model: Arc<ModelDescriptor>) {
        if self.summary(&model.name).is_none() {
            let summary = ModelSummary::new(model.name.clone());
            self.summaries.push(match &model.label {
                Some(label) => summary.with_label(label.clone()),
                None => summary,
            });
        }
        self.models.insert(model.name.clone(), model);
    }

    /// Record a note about the snapshot.
    pub fn note(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Notes recorded while the snapshot was taken.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The type directory.
    pub fn summaries(&self) -> &[ModelSummary] {
        &self.summaries
    }

    /// Directory entry of one type.
    pub fn summary(&self, name: &str) -> Option<&ModelSummary> {
        self.summaries.iter().find(|s| s.name == name)
    }

    /// Check if a type's descriptor is present.
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Iterate over the descriptors present.
    pub fn models(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.values().map(|m| m.as_ref())
    }

    /// Number of descriptors present.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if no descriptor is present.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl SchemaLookup for CatalogSnapshot {
    fn model(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.get(name).map(|m| m.as_ref())
    }
}
