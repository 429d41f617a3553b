//! Query intent types: filters, join steps and compiled domain conditions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::schema::{FieldDescriptor, ModelDescriptor};
use crate::value::Value;

/// Read access to record type descriptors.
///
/// Implemented by catalog snapshots; plain maps work for fixtures.
pub trait SchemaLookup {
    /// Look up a model descriptor by type name.
    fn model(&self, name: &str) -> Option<&ModelDescriptor>;
}

impl SchemaLookup for HashMap<String, ModelDescriptor> {
    fn model(&self, name: &str) -> Option<&ModelDescriptor> {
        self.get(name)
    }
}

/// Cardinality of a join between two record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    /// Single reference: one related row per source row.
    OneToOne,
    /// Collection reference: many related rows per source row.
    OneToMany,
    /// Shared collection reference: many rows, shared between parents.
    ManyToMany,
}

impl Cardinality {
    /// Check if the target side is a collection per source row.
    pub fn is_collection(&self) -> bool {
        !matches!(self, Cardinality::OneToOne)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::OneToOne => write!(f, "one-to-one"),
            Cardinality::OneToMany => write!(f, "one-to-many"),
            Cardinality::ManyToMany => write!(f, "many-to-many"),
        }
    }
}

/// A dotted sequence of field names, possibly crossing relations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Path made of a single field.
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Path from explicit segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted path (`partner_id.name`).
    pub fn parse(dotted: &str) -> Self {
        Self(
            dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    /// Path segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// First segment (the field on the root model).
    pub fn head(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Last segment (the concrete field).
    pub fn terminal(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Check if the path crosses at least one relation.
    pub fn is_nested(&self) -> bool {
        self.0.len() > 1
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for FieldPath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let path = FieldPath::parse(&value);
        if path.is_empty() {
            Err(format!("empty field path '{}'", value))
        } else {
            Ok(path)
        }
    }
}

/// Operator of a filter clause, as reported in audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Equality.
    Equals,
    /// Inequality.
    NotEquals,
    /// Case-insensitive substring match.
    Ilike,
    /// Membership.
    In,
    /// Non-membership.
    NotIn,
    /// Inclusive range.
    Range,
}

/// Operator and operand of a filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Condition {
    /// Field equals value (on collections: contains the id).
    Equals(Value),
    /// Field differs from value.
    NotEquals(Value),
    /// Field contains the text, ignoring case.
    Ilike(String),
    /// Field is one of the values.
    In(Vec<Value>),
    /// Field is none of the values.
    NotIn(Vec<Value>),
    /// Field lies within inclusive bounds; a missing bound is open.
    Range {
        min: Option<Value>,
        max: Option<Value>,
    },
}

impl Condition {
    /// The operator of this condition.
    pub fn operator(&self) -> FilterOperator {
        match self {
            Condition::Equals(_) => FilterOperator::Equals,
            Condition::NotEquals(_) => FilterOperator::NotEquals,
            Condition::Ilike(_) => FilterOperator::Ilike,
            Condition::In(_) => FilterOperator::In,
            Condition::NotIn(_) => FilterOperator::NotIn,
            Condition::Range { .. } => FilterOperator::Range,
        }
    }
}

/// One restriction of a query intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    /// Field path from the intent's model to the filtered field.
    pub path: FieldPath,
    /// Operator and operand.
    #[serde(flatten)]
    pub condition: Condition,
}

impl FilterClause {
    /// Create a new clause.
    pub fn new(path: FieldPath, condition: Condition) -> Self {
        Self { path, condition }
    }

    /// `field = value`.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(FieldPath::field(field), Condition::Equals(value.into()))
    }

    /// `path ilike text`.
    pub fn ilike(path: FieldPath, text: impl Into<String>) -> Self {
        Self::new(path, Condition::Ilike(text.into()))
    }

    /// Inclusive range on a field.
    pub fn range(field: impl Into<String>, min: Option<Value>, max: Option<Value>) -> Self {
        Self::new(FieldPath::field(field), Condition::Range { min, max })
    }

    /// The operator of this clause.
    pub fn operator(&self) -> FilterOperator {
        self.condition.operator()
    }

    /// Walk the path from `root` and return the terminal field descriptor.
    ///
    /// Every non-terminal segment must be a relational field whose target
    /// type exists in `schema`; the terminal segment must be a field of the
    /// type reached.
    pub fn resolve<'a, S>(&self, schema: &'a S, root: &str) -> Result<&'a FieldDescriptor, Error>
    where
        S: SchemaLookup + ?Sized,
    {
        let segments = self.path.segments();
        let (terminal, hops) = segments.split_last().ok_or_else(|| Error::EmptyPath {
            model: root.to_string(),
        })?;

        let mut model = lookup_model(schema, root, root, terminal)?;
        for hop in hops {
            let field = model.field(hop).ok_or_else(|| Error::UnknownField {
                model: model.name.clone(),
                field: hop.clone(),
            })?;
            let target = field.target().ok_or_else(|| Error::NotRelational {
                model: model.name.clone(),
                field: hop.clone(),
            })?;
            model = lookup_model(schema, target, &model.name, hop)?;
        }

        model.field(terminal).ok_or_else(|| Error::UnknownField {
            model: model.name.clone(),
            field: terminal.clone(),
        })
    }

    /// Check the path invariant without compiling.
    pub fn validate<S>(&self, schema: &S, root: &str) -> Result<(), Error>
    where
        S: SchemaLookup + ?Sized,
    {
        self.resolve(schema, root).map(|_| ())
    }

    /// Compile this clause into domain conditions for the record service.
    ///
    /// A single-reference terminal compiles equality to `=` on the id; a
    /// collection-reference terminal compiles equality and membership
    /// ("contains") to `in` over the resolved ids. Ranges compile to up to
    /// two bound conditions.
    pub fn compile<S>(&self, schema: &S, root: &str) -> Result<Vec<DomainCondition>, Error>
    where
        S: SchemaLookup + ?Sized,
    {
        let terminal = self.resolve(schema, root)?;
        let field = self.path.to_string();
        let cardinality = terminal.cardinality();

        let conditions = match (&self.condition, cardinality) {
            (Condition::Equals(v), Some(c)) if c.is_collection() => {
                vec![DomainCondition::new(&field, DomainOperator::In, ids_of(&field, &[v.clone()])?)]
            }
            (Condition::In(vs), Some(c)) if c.is_collection() => {
                vec![DomainCondition::new(&field, DomainOperator::In, ids_of(&field, vs)?)]
            }
            (Condition::NotEquals(v), Some(c)) if c.is_collection() => {
                vec![DomainCondition::new(&field, DomainOperator::NotIn, ids_of(&field, &[v.clone()])?)]
            }
            (Condition::NotIn(vs), Some(c)) if c.is_collection() => {
                vec![DomainCondition::new(&field, DomainOperator::NotIn, ids_of(&field, vs)?)]
            }
            (Condition::Equals(v), Some(_)) => {
                let id = v.ref_id().ok_or_else(|| Error::InvalidCondition {
                    field: field.clone(),
                    reason: format!("expected a record id, got '{}'", v),
                })?;
                vec![DomainCondition::new(&field, DomainOperator::Eq, Value::Int(id))]
            }
            (Condition::In(vs), Some(_)) => {
                vec![DomainCondition::new(&field, DomainOperator::In, ids_of(&field, vs)?)]
            }
            (Condition::Equals(v), None) => {
                vec![DomainCondition::new(&field, DomainOperator::Eq, v.clone())]
            }
            (Condition::NotEquals(v), _) => {
                vec![DomainCondition::new(&field, DomainOperator::Ne, v.clone())]
            }
            (Condition::Ilike(text), _) => {
                vec![DomainCondition::new(&field, DomainOperator::Ilike, Value::Text(text.clone()))]
            }
            (Condition::In(vs), None) => {
                vec![DomainCondition::new(&field, DomainOperator::In, Value::List(vs.clone()))]
            }
            (Condition::NotIn(vs), _) => {
                vec![DomainCondition::new(&field, DomainOperator::NotIn, Value::List(vs.clone()))]
            }
            (Condition::Range { min, max }, _) => {
                if min.is_none() && max.is_none() {
                    return Err(Error::InvalidCondition {
                        field,
                        reason: "range has no bounds".to_string(),
                    });
                }
                min.iter()
                    .map(|v| DomainCondition::new(&field, DomainOperator::Ge, v.clone()))
                    .chain(
                        max.iter()
                            .map(|v| DomainCondition::new(&field, DomainOperator::Le, v.clone())),
                    )
                    .collect()
            }
        };

        Ok(conditions)
    }
}

fn lookup_model<'a, S>(
    schema: &'a S,
    name: &str,
    from_model: &str,
    via_field: &str,
) -> Result<&'a ModelDescriptor, Error>
where
    S: SchemaLookup + ?Sized,
{
    schema.model(name).ok_or_else(|| Error::UnknownTarget {
        model: from_model.to_string(),
        field: via_field.to_string(),
        target: name.to_string(),
    })
}

fn ids_of(field: &str, values: &[Value]) -> Result<Value, Error> {
    let mut ids = Vec::new();
    for value in values {
        let found = value.ref_ids();
        if found.is_empty() {
            return Err(Error::InvalidCondition {
                field: field.to_string(),
                reason: format!("expected record ids, got '{}'", value),
            });
        }
        ids.extend(found);
    }
    Ok(Value::Refs(ids))
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            Condition::Equals(v) => write!(f, "{} = {}", self.path, v),
            Condition::NotEquals(v) => write!(f, "{} != {}", self.path, v),
            Condition::Ilike(text) => write!(f, "{} ilike '{}'", self.path, text),
            Condition::In(vs) => write!(f, "{} in ({})", self.path, join_values(vs)),
            Condition::NotIn(vs) => write!(f, "{} not in ({})", self.path, join_values(vs)),
            Condition::Range { min: Some(lo), max: Some(hi) } => {
                write!(f, "{} between {} and {}", self.path, lo, hi)
            }
            Condition::Range { min: Some(lo), max: None } => write!(f, "{} >= {}", self.path, lo),
            Condition::Range { min: None, max: Some(hi) } => write!(f, "{} <= {}", self.path, hi),
            Condition::Range { min: None, max: None } => write!(f, "{} (unbounded)", self.path),
        }
    }
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::display)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Ordering specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Field to sort by.
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl OrderSpec {
    /// Ascending order on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending order on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Asc => write!(f, "{} asc", self.field),
            SortDirection::Desc => write!(f, "{} desc", self.field),
        }
    }
}

/// A structured search against one record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    /// Target type name.
    pub model: String,
    /// Filters, in parse order.
    pub filters: Vec<FilterClause>,
    /// Requested fields, in output order.
    pub fields: Vec<String>,
    /// Maximum number of rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Ordering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<OrderSpec>,
}

impl QueryIntent {
    /// Create an unfiltered intent with no fields.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            filters: Vec::new(),
            fields: Vec::new(),
            limit: None,
            order: Vec::new(),
        }
    }

    /// Add a filter.
    pub fn with_filter(mut self, filter: FilterClause) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the requested fields.
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Set the row limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Add an ordering.
    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order.push(order);
        self
    }

    /// Add a filter, replacing any earlier filter on the same path.
    ///
    /// Returns the replaced filter. The replacement keeps the position of the
    /// original so audit output stays stable.
    pub fn upsert_filter(&mut self, filter: FilterClause) -> Option<FilterClause> {
        match self.filters.iter_mut().find(|f| f.path == filter.path) {
            Some(existing) => Some(std::mem::replace(existing, filter)),
            None => {
                self.filters.push(filter);
                None
            }
        }
    }

    /// Add a requested field unless already present.
    pub fn request_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }

    /// Filter on a given path, if any.
    pub fn filter_on(&self, path: &FieldPath) -> Option<&FilterClause> {
        self.filters.iter().find(|f| &f.path == path)
    }

    /// Compile all filters into one conjunctive domain.
    pub fn compile<S>(&self, schema: &S) -> Result<Vec<DomainCondition>, Error>
    where
        S: SchemaLookup + ?Sized,
    {
        let mut domain = Vec::new();
        for filter in &self.filters {
            domain.extend(filter.compile(schema, &self.model)?);
        }
        Ok(domain)
    }
}

/// One resolved relation hop used to merge two types' rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinStep {
    /// Source type name.
    pub source: String,
    /// Relational field on the source type.
    pub field: String,
    /// Target type name.
    pub target: String,
    /// Join cardinality, always equal to the field's relation type.
    pub cardinality: Cardinality,
}

impl JoinStep {
    /// Build a step from a relational field of `source`.
    ///
    /// Fails if the field is not relational or has no target, so a step's
    /// cardinality always matches its field descriptor.
    pub fn from_field(source: &str, field: &FieldDescriptor) -> Result<Self, Error> {
        let cardinality = field.cardinality().ok_or_else(|| Error::NotRelational {
            model: source.to_string(),
            field: field.name.clone(),
        })?;
        let target = field.target().ok_or_else(|| Error::UnknownTarget {
            model: source.to_string(),
            field: field.name.clone(),
            target: String::new(),
        })?;

        Ok(Self {
            source: source.to_string(),
            field: field.name.clone(),
            target: target.to_string(),
            cardinality,
        })
    }

    /// Check if the target side is a collection per source row.
    pub fn is_collection(&self) -> bool {
        self.cardinality.is_collection()
    }
}

impl fmt::Display for JoinStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {} ({})",
            self.source, self.field, self.target, self.cardinality
        )
    }
}

/// A secondary intent reached from the primary type through a join path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedQuery {
    /// Join steps from the primary type to `intent.model`.
    pub path: Vec<JoinStep>,
    /// The intent against the related type.
    pub intent: QueryIntent,
}

impl RelatedQuery {
    /// Create a related query.
    pub fn new(path: Vec<JoinStep>, intent: QueryIntent) -> Self {
        Self { path, intent }
    }

    /// Dotted relation field names from the primary type (`partner_id`).
    pub fn relation_path(&self) -> FieldPath {
        FieldPath::from_segments(self.path.iter().map(|s| s.field.clone()))
    }

    /// Dotted path of the parent relation, for nested related queries.
    pub fn parent_path(&self) -> Option<FieldPath> {
        if self.path.len() > 1 {
            Some(FieldPath::from_segments(
                self.path[..self.path.len() - 1]
                    .iter()
                    .map(|s| s.field.clone()),
            ))
        } else {
            None
        }
    }

    /// Number of relation hops.
    pub fn hops(&self) -> usize {
        self.path.len()
    }
}

/// Comparison operator of a compiled domain condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainOperator {
    /// Equality.
    #[serde(rename = "=")]
    Eq,
    /// Inequality.
    #[serde(rename = "!=")]
    Ne,
    /// Case-insensitive substring match.
    #[serde(rename = "ilike")]
    Ilike,
    /// Membership.
    #[serde(rename = "in")]
    In,
    /// Non-membership.
    #[serde(rename = "not in")]
    NotIn,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Ge,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Le,
}

impl fmt::Display for DomainOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DomainOperator::Eq => "=",
            DomainOperator::Ne => "!=",
            DomainOperator::Ilike => "ilike",
            DomainOperator::In => "in",
            DomainOperator::NotIn => "not in",
            DomainOperator::Ge => ">=",
            DomainOperator::Le => "<=",
        };
        f.write_str(s)
    }
}

/// A `(field, operator, value)` triple understood by the record service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(String, DomainOperator, Value)",
    into = "(String, DomainOperator, Value)"
)]
pub struct DomainCondition {
    /// Field name, dotted when crossing relations.
    pub field: String,
    /// Comparison operator.
    pub operator: DomainOperator,
    /// Operand.
    pub value: Value,
}

impl DomainCondition {
    /// Create a new condition.
    pub fn new(field: impl Into<String>, operator: DomainOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

impl From<(String, DomainOperator, Value)> for DomainCondition {
    fn from((field, operator, value): (String, DomainOperator, Value)) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }
}

impl From<DomainCondition> for (String, DomainOperator, Value) {
    fn from(c: DomainCondition) -> Self {
        (c.field, c.operator, c.value)
    }
}

impl fmt::Display for DomainCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.field, self.operator, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use crate::value::RecordRef;

    fn schema() -> HashMap<String, ModelDescriptor> {
        let order = ModelDescriptor::from_fields(
            "sale.order",
            vec![
                FieldDescriptor::new("name", FieldType::Text).required(),
                FieldDescriptor::new("amount_total", FieldType::Float),
                FieldDescriptor::reference("partner_id", FieldType::SingleReference, "res.partner")
                    .required(),
                FieldDescriptor::reference("tag_ids", FieldType::SharedCollectionReference, "crm.tag"),
                FieldDescriptor::reference("user_id", FieldType::SingleReference, "res.users"),
            ],
        );
        let partner = ModelDescriptor::from_fields(
            "res.partner",
            vec![FieldDescriptor::new("name", FieldType::Text)],
        );
        let tag = ModelDescriptor::from_fields(
            "crm.tag",
            vec![FieldDescriptor::new("name", FieldType::Text)],
        );

        [order, partner, tag]
            .into_iter()
            .map(|m| (m.name.clone(), m))
            .collect()
    }

    #[test]
    fn test_single_reference_compiles_to_equality() {
        let clause = FilterClause::equals("partner_id", RecordRef::new(7, "Acme"));
        let domain = clause.compile(&schema(), "sale.order").unwrap();

        assert_eq!(
            domain,
            vec![DomainCondition::new("partner_id", DomainOperator::Eq, Value::Int(7))]
        );
    }

    #[test]
    fn test_collection_contains_compiles_to_in() {
        let clause = FilterClause::equals("tag_ids", Value::Int(3));
        let domain = clause.compile(&schema(), "sale.order").unwrap();

        assert_eq!(
            domain,
            vec![DomainCondition::new("tag_ids", DomainOperator::In, Value::Refs(vec![3]))]
        );

        let clause = FilterClause::new(
            FieldPath::field("tag_ids"),
            Condition::In(vec![Value::Int(3), Value::Int(4)]),
        );
        let domain = clause.compile(&schema(), "sale.order").unwrap();
        assert_eq!(domain[0].operator, DomainOperator::In);
        assert_eq!(domain[0].value, Value::Refs(vec![3, 4]));
    }

    #[test]
    fn test_nested_path_resolves_through_relation() {
        let clause = FilterClause::ilike(FieldPath::parse("partner_id.name"), "Example Corp");
        let domain = clause.compile(&schema(), "sale.order").unwrap();

        assert_eq!(domain[0].field, "partner_id.name");
        assert_eq!(domain[0].operator, DomainOperator::Ilike);
    }

    #[test]
    fn test_path_invariants() {
        let schema = schema();

        let not_relational = FilterClause::ilike(FieldPath::parse("name.foo"), "x");
        assert!(matches!(
            not_relational.validate(&schema, "sale.order"),
            Err(Error::NotRelational { .. })
        ));

        let missing_target = FilterClause::ilike(FieldPath::parse("user_id.login"), "x");
        assert!(matches!(
            missing_target.validate(&schema, "sale.order"),
            Err(Error::UnknownTarget { ref target, .. }) if target == "res.users"
        ));

        let unknown = FilterClause::ilike(FieldPath::parse("partner_id.vat"), "x");
        let err = unknown.validate(&schema, "sale.order").unwrap_err();
        assert_eq!(err.field(), Some("vat"));
    }

    #[test]
    fn test_range_compiles_to_bounds() {
        let clause = FilterClause::range("amount_total", Some(Value::Int(1000)), None);
        let domain = clause.compile(&schema(), "sale.order").unwrap();
        assert_eq!(
            domain,
            vec![DomainCondition::new("amount_total", DomainOperator::Ge, Value::Int(1000))]
        );

        let empty = FilterClause::range("amount_total", None, None);
        assert!(empty.compile(&schema(), "sale.order").is_err());
    }

    #[test]
    fn test_upsert_filter_overrides_same_path() {
        let mut intent = QueryIntent::new("sale.order")
            .with_filter(FilterClause::equals("name", "SO001"));

        let replaced = intent.upsert_filter(FilterClause::equals("name", "SO002"));

        assert_eq!(replaced, Some(FilterClause::equals("name", "SO001")));
        assert_eq!(intent.filters.len(), 1);
        assert_eq!(intent.filters[0], FilterClause::equals("name", "SO002"));
    }

    #[test]
    fn test_join_step_matches_field_cardinality() {
        let schema = schema();
        let order = schema.model("sale.order").unwrap();

        let step = JoinStep::from_field("sale.order", order.field("tag_ids").unwrap()).unwrap();
        assert_eq!(step.cardinality, Cardinality::ManyToMany);
        assert!(step.is_collection());

        let err = JoinStep::from_field("sale.order", order.field("name").unwrap()).unwrap_err();
        assert!(matches!(err, Error::NotRelational { .. }));
    }

    #[test]
    fn test_domain_condition_serializes_as_triple() {
        let condition = DomainCondition::new("state", DomainOperator::NotIn, Value::Refs(vec![1]));
        let json = serde_json::to_string(&condition).unwrap();
        assert_eq!(json, r#"["state","not in",[1]]"#);
    }
}
