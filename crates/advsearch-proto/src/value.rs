//! Runtime value types for filters and result rows.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A reference to a single related record, `[id, display]` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRef(pub i64, pub String);

impl RecordRef {
    /// Create a new reference.
    pub fn new(id: i64, display: impl Into<String>) -> Self {
        Self(id, display.into())
    }

    /// The referenced record id.
    pub fn id(&self) -> i64 {
        self.0
    }

    /// The display text of the referenced record.
    pub fn display(&self) -> &str {
        &self.1
    }
}

/// A value read from or sent to the record service.
///
/// Serialized untagged so that plain JSON (`null`, `12`, `"text"`,
/// `[7, "Acme"]`, `[1, 2, 3]`) maps directly onto variants. Variant order
/// matters for deserialization: date-times and dates are tried before text,
/// single references before id lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Date and time without timezone.
    DateTime(NaiveDateTime),
    /// Calendar date.
    Date(NaiveDate),
    /// UTF-8 text.
    Text(String),
    /// Single-reference value.
    Ref(RecordRef),
    /// Collection-reference value (related ids).
    Refs(Vec<i64>),
    /// Heterogeneous list, used for `in` filter operands.
    List(Vec<Value>),
}

impl Value {
    /// Check if this value is null.
    ///
    /// `false` on a relational field is the record service's spelling of an
    /// empty reference, so callers resolving references should use
    /// [`Value::ref_id`] rather than this check.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64 (integers are widened).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Id of a single reference (or a bare integer id).
    pub fn ref_id(&self) -> Option<i64> {
        match self {
            Value::Ref(r) => Some(r.id()),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// All ids carried by a relational value.
    pub fn ref_ids(&self) -> Vec<i64> {
        match self {
            Value::Ref(r) => vec![r.id()],
            Value::Int(i) => vec![*i],
            Value::Refs(ids) => ids.clone(),
            Value::List(values) => values.iter().filter_map(Value::ref_id).collect(),
            _ => Vec::new(),
        }
    }

    /// Human readable rendering used by formatters.
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Text(s) => s.clone(),
            Value::Ref(r) => r.display().to_string(),
            Value::Refs(ids) => ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            Value::List(values) => values
                .iter()
                .map(Value::display)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Loose equality used by domain evaluation.
    ///
    /// Integers and floats compare numerically, references compare by id,
    /// dates compare against date-times by calendar day.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Ref(a), Value::Ref(b)) => a.id() == b.id(),
            (Value::Ref(r), Value::Int(i)) | (Value::Int(i), Value::Ref(r)) => r.id() == *i,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }

    /// Ordering between two values of compatible kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::Date(b)) => Some(a.date().cmp(b)),
            (Value::Date(a), Value::DateTime(b)) => Some(a.cmp(&b.date())),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Ref(a), Value::Ref(b)) => Some(a.display().cmp(b.display())),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.2}", f)
    } else {
        let s = format!("{:.4}", f);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<RecordRef> for Value {
    fn from(v: RecordRef) -> Self {
        Value::Ref(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::Refs(v)
    }
}
