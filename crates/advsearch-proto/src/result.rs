//! Search requests, formatted responses and diagnostics.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::query::{OrderSpec, QueryIntent, RelatedQuery, SortDirection};
use crate::value::Value;

/// One row as returned by the record service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record id.
    pub id: i64,
    /// Field values in requested order.
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
}

impl Record {
    /// Create a record with no field values.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: IndexMap::new(),
        }
    }

    /// Add a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Value of `name`, with `id` readable as a field and absent fields null.
    pub fn value(&self, name: &str) -> Value {
        if name == "id" {
            return Value::Int(self.id);
        }
        self.get(name).cloned().unwrap_or(Value::Null)
    }

    /// Compare two records by `order`.
    ///
    /// Empty values (null or `false`) sort last in either direction; ties
    /// fall back to the id.
    pub fn cmp_by(&self, other: &Record, order: &[OrderSpec]) -> Ordering {
        for spec in order {
            let left = self.value(&spec.field);
            let right = other.value(&spec.field);

            let ordering = match (is_blank(&left), is_blank(&right)) {
                (true, true) => Ordering::Equal,
                (true, false) => return Ordering::Greater,
                (false, true) => return Ordering::Less,
                (false, false) => {
                    let ordering = left.compare(&right).unwrap_or(Ordering::Equal);
                    match spec.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                }
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.id.cmp(&other.id)
    }
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

/// A formatted output row: column name to value.
pub type Row = IndexMap<String, Value>;

/// A natural-language search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text.
    pub query: String,
    /// Row limit override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Skip model selection and search this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_hint: Option<String>,
}

impl SearchRequest {
    /// Create a request for the given text.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
            model_hint: None,
        }
    }

    /// Override the row limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Force the target type.
    pub fn with_model_hint(mut self, model: impl Into<String>) -> Self {
        self.model_hint = Some(model.into());
        self
    }
}

/// A parent row with the related rows merged under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultGroup {
    /// The primary row.
    pub parent: Row,
    /// Related rows, each tagged with the relation it came through.
    pub children: Vec<Row>,
}

/// Shape of a formatted result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultBody {
    /// Flat rows with an explicit column order.
    Table { columns: Vec<String>, rows: Vec<Row> },
    /// Parent rows with nested child rows.
    Grouped { groups: Vec<ResultGroup> },
}

impl ResultBody {
    /// Number of top-level rows.
    pub fn len(&self) -> usize {
        match self {
            ResultBody::Table { rows, .. } => rows.len(),
            ResultBody::Grouped { groups } => groups.len(),
        }
    }

    /// Check if the body has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Non-fatal condition attached to a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A secondary fetch failed; the primary rows are still returned.
    PartialResult { model: String, reason: String },
    /// A cell value was shortened for display.
    Truncated { model: String, field: String },
    /// A later filter replaced an earlier one on the same field.
    FilterOverridden { model: String, field: String },
    /// Related ids were dropped by the fetch batch limits.
    ChildrenCapped { model: String, dropped: usize },
}

impl Diagnostic {
    /// Check if this diagnostic reports missing data.
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            Diagnostic::PartialResult { .. } | Diagnostic::ChildrenCapped { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::PartialResult { model, reason } => {
                write!(f, "{} rows missing: {}", model, reason)
            }
            Diagnostic::Truncated { model, field } => {
                write!(f, "values of {}.{} truncated", model, field)
            }
            Diagnostic::FilterOverridden { model, field } => {
                write!(f, "earlier filter on {}.{} replaced", model, field)
            }
            Diagnostic::ChildrenCapped { model, dropped } => {
                write!(f, "{} related {} record(s) not fetched", dropped, model)
            }
        }
    }
}

/// The formatted answer to a search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Table or grouped rows.
    #[serde(flatten)]
    pub body: ResultBody,
    /// The primary intent that was executed.
    pub intent: QueryIntent,
    /// Related intents that were executed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedQuery>,
    /// One-line description of what was searched.
    pub summary: String,
    /// Non-fatal conditions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl SearchResponse {
    /// Check if any diagnostic reports missing data.
    pub fn is_partial(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_partial)
    }
}
