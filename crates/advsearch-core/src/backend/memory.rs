//! In-memory catalog and record service loaded from JSON fixtures.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use advsearch_proto::{
    DomainCondition, DomainOperator, FieldDescriptor, FieldType, ModelDescriptor, ModelSummary,
    OrderSpec, Record, RecordRef, Value,
};

use super::{CatalogService, RecordService};
use crate::catalog::CatalogSnapshot;
use crate::classify::FieldClassifier;
use crate::error::Error;

/// A record type as written in a fixture file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureModel {
    /// Type name.
    pub name: String,
    /// Human label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Extra words naming the type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    /// Fields in schema order.
    pub fields: Vec<FieldDescriptor>,
}

impl FixtureModel {
    /// Create a fixture model from fields.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            label: None,
            synonyms: Vec::new(),
            fields,
        }
    }

    /// Set the human label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add synonyms.
    pub fn with_synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms.extend(synonyms.iter().map(|s| s.to_string()));
        self
    }

    /// Directory entry for this type.
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            name: self.name.clone(),
            label: self.label.clone(),
            synonyms: self.synonyms.clone(),
        }
    }

    /// Full descriptor for this type.
    pub fn descriptor(&self) -> ModelDescriptor {
        let model = ModelDescriptor::from_fields(self.name.clone(), self.fields.clone());
        match &self.label {
            Some(label) => model.with_label(label.clone()),
            None => model,
        }
    }
}

/// Fixture file layout: `{"models": [...], "records": {"type": [...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    /// Record types.
    pub models: Vec<FixtureModel>,
    /// Rows per type name.
    #[serde(default)]
    pub records: IndexMap<String, Vec<Record>>,
}

impl Fixture {
    /// Snapshot holding every fixture type, without going through a catalog.
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot::from_models(
            self.models.iter().map(FixtureModel::summary).collect(),
            self.models.iter().map(FixtureModel::descriptor).collect(),
        )
    }
}

struct ModelEntry {
    summary: ModelSummary,
    descriptor: ModelDescriptor,
}

/// Catalog and record service over in-memory fixtures.
///
/// Besides serving data, the backend counts calls and can inject latency or
/// per-type failures so that caching, timeouts and partial results can be
/// observed.
pub struct MemoryBackend {
    models: IndexMap<String, ModelEntry>,
    records: HashMap<String, Vec<Record>>,
    latency: Option<Duration>,
    failing: RwLock<HashSet<String>>,
    failing_describe: RwLock<HashSet<String>>,
    describe_calls: AtomicU64,
    search_calls: Mutex<HashMap<String, u64>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self {
            models: IndexMap::new(),
            records: HashMap::new(),
            latency: None,
            failing: RwLock::new(HashSet::new()),
            failing_describe: RwLock::new(HashSet::new()),
            describe_calls: AtomicU64::new(0),
            search_calls: Mutex::new(HashMap::new()),
        }
    }

    /// Build a backend from a parsed fixture.
    pub fn from_fixture(fixture: Fixture) -> Self {
        let backend = fixture
            .models
            .into_iter()
            .fold(Self::new(), |backend, model| backend.with_model(model));

        fixture
            .records
            .into_iter()
            .fold(backend, |backend, (model, rows)| backend.with_records(model, rows))
    }

    /// Parse a fixture from JSON text.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    /// Load a fixture file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Fixture(format!("{}: {}", path.display(), e)))?;
        let backend = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            models = backend.models.len(),
            "loaded fixture"
        );
        Ok(backend)
    }

    /// Add a record type.
    pub fn with_model(mut self, model: FixtureModel) -> Self {
        let entry = ModelEntry {
            summary: model.summary(),
            descriptor: model.descriptor(),
        };
        self.models.insert(model.name, entry);
        self
    }

    /// Add rows for a record type.
    pub fn with_records(mut self, model: impl Into<String>, rows: Vec<Record>) -> Self {
        self.records.entry(model.into()).or_default().extend(rows);
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make reads of `model` fail until [`MemoryBackend::recover_model`].
    pub fn fail_model(&self, model: impl Into<String>) {
        self.failing.write().insert(model.into());
    }

    /// Stop failing reads of `model`.
    pub fn recover_model(&self, model: &str) {
        self.failing.write().remove(model);
    }

    /// Make `describe` of `model` fail until [`MemoryBackend::recover_describe`].
    pub fn fail_describe(&self, model: impl Into<String>) {
        self.failing_describe.write().insert(model.into());
    }

    /// Stop failing `describe` of `model`.
    pub fn recover_describe(&self, model: &str) {
        self.failing_describe.write().remove(model);
    }

    /// Number of `describe` calls served.
    pub fn describe_calls(&self) -> u64 {
        self.describe_calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of `search_read` calls served for `model`.
    pub fn search_calls(&self, model: &str) -> u64 {
        self.search_calls.lock().get(model).copied().unwrap_or(0)
    }

    /// Number of `search_read` calls served across all types.
    pub fn total_search_calls(&self) -> u64 {
        self.search_calls.lock().values().sum()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn entry(&self, model: &str) -> Result<&ModelEntry, Error> {
        self.models.get(model).ok_or_else(|| Error::ModelNotFound {
            model: model.to_string(),
        })
    }

    fn rows(&self, model: &str) -> &[Record] {
        self.records.get(model).map(Vec::as_slice).unwrap_or_default()
    }

    fn find(&self, model: &str, id: i64) -> Option<&Record> {
        self.rows(model).iter().find(|r| r.id == id)
    }

    fn field_value(record: &Record, field: &str) -> Value {
        record.value(field)
    }

    /// Values reached by following `segments` from `record`.
    ///
    /// Paths crossing a collection yield one value per reached record.
    fn path_values(
        &self,
        model: &str,
        record: &Record,
        segments: &[&str],
    ) -> Result<Vec<Value>, Error> {
        let Some((head, rest)) = segments.split_first() else {
            return Ok(Vec::new());
        };

        let descriptor = &self.entry(model)?.descriptor;
        let field = descriptor.field(head);
        if field.is_none() && *head != "id" {
            return Err(Error::InvalidFilter {
                model: model.to_string(),
                field: head.to_string(),
                reason: "unknown field".to_string(),
            });
        }

        let value = Self::field_value(record, head);
        if rest.is_empty() {
            return Ok(vec![value]);
        }

        let target = field.and_then(FieldDescriptor::target).ok_or_else(|| {
            Error::InvalidJoin {
                model: model.to_string(),
                field: head.to_string(),
            }
        })?;

        let mut values = Vec::new();
        for id in value.ref_ids() {
            if let Some(related) = self.find(target, id) {
                values.extend(self.path_values(target, related, rest)?);
            }
        }
        Ok(values)
    }

    fn matches(
        &self,
        model: &str,
        record: &Record,
        domain: &[DomainCondition],
    ) -> Result<bool, Error> {
        for condition in domain {
            let segments: Vec<&str> = condition.field.split('.').collect();
            let values = self.path_values(model, record, &segments)?;
            if !evaluate(condition.operator, &values, &condition.value) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn display_name(&self, model: &str, id: i64) -> String {
        let display = self.models.get(model).and_then(|entry| {
            let field = FieldClassifier::display_field(&entry.descriptor)?;
            let record = self.find(model, id)?;
            record.get(&field.name).map(Value::display)
        });
        display.unwrap_or_else(|| format!("{},{}", model, id))
    }

    /// Project a stored row onto `fields`, expanding bare reference ids.
    fn project(
        &self,
        descriptor: &ModelDescriptor,
        record: &Record,
        fields: &[String],
    ) -> Result<Record, Error> {
        let names: Vec<&str> = if fields.is_empty() {
            descriptor.fields.keys().map(String::as_str).collect()
        } else {
            fields.iter().map(String::as_str).filter(|f| *f != "id").collect()
        };

        let mut row = Record::new(record.id);
        for name in names {
            let field = descriptor.field(name).ok_or_else(|| Error::InvalidFilter {
                model: descriptor.name.clone(),
                field: name.to_string(),
                reason: "unknown field requested".to_string(),
            })?;

            let value = match (Self::field_value(record, name), field.field_type, field.target()) {
                (Value::Int(id), FieldType::SingleReference, Some(target)) => {
                    Value::Ref(RecordRef::new(id, self.display_name(target, id)))
                }
                (value, _, _) => value,
            };
            row.fields.insert(name.to_string(), value);
        }
        Ok(row)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogService for MemoryBackend {
    async fn list_models(&self) -> Result<Vec<ModelSummary>, Error> {
        self.simulate_latency().await;
        Ok(self.models.values().map(|e| e.summary.clone()).collect())
    }

    async fn describe(&self, model: &str) -> Result<Option<ModelDescriptor>, Error> {
        self.describe_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.simulate_latency().await;

        if self.failing_describe.read().contains(model) {
            return Err(Error::backend(model, "describe", "injected failure"));
        }
        Ok(self.models.get(model).map(|e| e.descriptor.clone()))
    }
}

#[async_trait]
impl RecordService for MemoryBackend {
    async fn search_read(
        &self,
        model: &str,
        domain: &[DomainCondition],
        fields: &[String],
        limit: Option<u32>,
        order: &[OrderSpec],
    ) -> Result<Vec<Record>, Error> {
        *self.search_calls.lock().entry(model.to_string()).or_default() += 1;
        self.simulate_latency().await;

        if self.failing.read().contains(model) {
            return Err(Error::backend(model, "search_read", "injected failure"));
        }

        let descriptor = &self.entry(model)?.descriptor;
        let mut matched = Vec::new();
        for record in self.rows(model) {
            if self.matches(model, record, domain)? {
                matched.push(record);
            }
        }

        matched.sort_by(|a, b| a.cmp_by(b, order));
        if let Some(limit) = limit {
            matched.truncate(limit as usize);
        }

        trace!(model, conditions = domain.len(), rows = matched.len(), "search_read");

        matched
            .into_iter()
            .map(|record| self.project(descriptor, record, fields))
            .collect()
    }
}

fn evaluate(operator: DomainOperator, values: &[Value], operand: &Value) -> bool {
    match operator {
        DomainOperator::Eq => values.iter().any(|v| contains_or_equals(v, operand)),
        DomainOperator::Ne => !values.iter().any(|v| contains_or_equals(v, operand)),
        DomainOperator::Ilike => {
            let needle = operand.display().trim_matches('%').to_lowercase();
            values
                .iter()
                .any(|v| v.display().to_lowercase().contains(&needle))
        }
        DomainOperator::In => any_member(values, operand),
        DomainOperator::NotIn => !any_member(values, operand),
        DomainOperator::Ge => values
            .iter()
            .any(|v| matches!(v.compare(operand), Some(Ordering::Greater | Ordering::Equal))),
        DomainOperator::Le => values
            .iter()
            .any(|v| matches!(v.compare(operand), Some(Ordering::Less | Ordering::Equal))),
    }
}

fn contains_or_equals(value: &Value, operand: &Value) -> bool {
    match value {
        Value::Refs(ids) => operand.ref_id().is_some_and(|id| ids.contains(&id)),
        other => other.loose_eq(operand),
    }
}

fn members(value: &Value) -> Vec<Value> {
    match value {
        Value::Refs(ids) => ids.iter().map(|id| Value::Int(*id)).collect(),
        Value::List(values) => values.clone(),
        other => vec![other.clone()],
    }
}

fn any_member(values: &[Value], operand: &Value) -> bool {
    let candidates = members(operand);
    values
        .iter()
        .flat_map(members)
        .any(|v| candidates.iter().any(|c| v.loose_eq(c)))
}
