//! Record type and field descriptors reported by the catalog service.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::query::Cardinality;

/// Field data types known to the record system.
///
/// The aliases accept the type names used by ERP-style catalog services
/// (`char`, `many2one`, ...), so descriptors can be fed in unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text.
    #[serde(alias = "char", alias = "html")]
    Text,
    /// Integer number.
    Integer,
    /// Floating point number (including monetary amounts).
    #[serde(alias = "monetary")]
    Float,
    /// Boolean flag.
    Boolean,
    /// Calendar date.
    Date,
    /// Date and time.
    #[serde(rename = "datetime", alias = "date_time")]
    DateTime,
    /// One value out of a fixed list of choices.
    Selection,
    /// Reference to one record of another type.
    #[serde(alias = "many2one")]
    SingleReference,
    /// Collection of records of another type pointing back at this one.
    #[serde(alias = "one2many")]
    CollectionReference,
    /// Collection of records shared with other parents.
    #[serde(alias = "many2many")]
    SharedCollectionReference,
}

impl FieldType {
    /// Check if this type points at another record type.
    pub fn is_relational(&self) -> bool {
        self.cardinality().is_some()
    }

    /// Check if this type holds a collection of related ids.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            FieldType::CollectionReference | FieldType::SharedCollectionReference
        )
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    /// Check if this type is a date or date-time.
    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::DateTime)
    }

    /// Join cardinality implied by a relational type.
    pub fn cardinality(&self) -> Option<Cardinality> {
        match self {
            FieldType::SingleReference => Some(Cardinality::OneToOne),
            FieldType::CollectionReference => Some(Cardinality::OneToMany),
            FieldType::SharedCollectionReference => Some(Cardinality::ManyToMany),
            _ => None,
        }
    }
}

/// One allowed choice of a selection field, `[value, label]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionChoice(pub String, pub String);

impl SelectionChoice {
    /// Create a new choice.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self(value.into(), label.into())
    }

    /// Stored value.
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Human label.
    pub fn label(&self) -> &str {
        &self.1
    }
}

/// A field definition within a record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Field data type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Human label, if the catalog reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Target type name for relational fields.
    #[serde(default, alias = "relation_target", skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    /// Whether the field is required.
    #[serde(default)]
    pub required: bool,
    /// Whether the field is read-only.
    #[serde(default)]
    pub readonly: bool,
    /// Allowed choices for selection fields.
    #[serde(default, alias = "selection_values", skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<SelectionChoice>,
}

impl FieldDescriptor {
    /// Create a new optional field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: None,
            relation: None,
            required: false,
            readonly: false,
            selection: Vec::new(),
        }
    }

    /// Create a relational field pointing at `target`.
    pub fn reference(
        name: impl Into<String>,
        field_type: FieldType,
        target: impl Into<String>,
    ) -> Self {
        Self {
            relation: Some(target.into()),
            ..Self::new(name, field_type)
        }
    }

    /// Create a selection field with `(value, label)` choices.
    pub fn selection(name: impl Into<String>, choices: &[(&str, &str)]) -> Self {
        Self {
            selection: choices
                .iter()
                .map(|(value, label)| SelectionChoice::new(*value, *label))
                .collect(),
            ..Self::new(name, FieldType::Selection)
        }
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field as read-only.
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Set the human label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Check if this field points at another record type.
    pub fn is_relational(&self) -> bool {
        self.field_type.is_relational()
    }

    /// Join cardinality of a relational field.
    pub fn cardinality(&self) -> Option<Cardinality> {
        self.field_type.cardinality()
    }

    /// Target type of a relational field.
    pub fn target(&self) -> Option<&str> {
        if self.is_relational() {
            self.relation.as_deref()
        } else {
            None
        }
    }

    /// Label if present, otherwise the field name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Schema of one record type: its name and ordered fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Type name (e.g. `sale.order`).
    pub name: String,
    /// Human label, if the catalog reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Fields in schema order.
    pub fields: IndexMap<String, FieldDescriptor>,
}

impl ModelDescriptor {
    /// Create an empty descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            fields: IndexMap::new(),
        }
    }

    /// Build a descriptor from a field list, keeping schema order.
    pub fn from_fields(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        fields
            .into_iter()
            .fold(Self::new(name), |model, field| model.with_field(field))
    }

    /// Add a field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Set the human label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Iterate over fields in schema order.
    pub fn iter_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// Iterate over relational fields in schema order.
    pub fn relational_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values().filter(|f| f.is_relational())
    }

    /// Label if present, otherwise the type name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Directory entry for one record type, used for model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Type name.
    pub name: String,
    /// Human label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Extra words users employ for this type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

impl ModelSummary {
    /// Create a summary with no label or synonyms.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            synonyms: Vec::new(),
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

    /// Lowercase words naming this type: name parts, label words and synonyms.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut words: Vec<String> = self
            .name
            .split(['.', '_'])
            .chain(self.label.iter().flat_map(|l| l.split_whitespace()))
            .chain(self.synonyms.iter().flat_map(|s| s.split_whitespace()))
            .map(|w| w.to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        words.sort();
        words.dedup();
        words
    }
}
