//! Execution planning for a primary intent and its related queries.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use advsearch_proto::{JoinStep, QueryIntent, RelatedQuery, SchemaLookup};

use crate::classify::FieldClassifier;
use crate::config::{DEFAULT_PRIMARY_FIELDS, DEFAULT_RELATED_FIELDS};
use crate::error::Error;
use crate::relation::RelationshipHandler;

/// Plan for fetching the rows of one relation level.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    /// Dotted relation path from the primary type (e.g. `invoice_line_ids.product_id`).
    pub path: String,
    /// The last join step of the path.
    pub step: JoinStep,
    /// Intent against the target type (filters, order, output fields).
    pub intent: QueryIntent,
    /// Fields to read: output fields plus relation fields children need.
    pub fetch_fields: Vec<String>,
    /// Index of the related query this level answers, if it is output.
    pub output: Option<usize>,
}

impl FetchPlan {
    /// Get the depth of this level (1 for a direct relation).
    pub fn depth(&self) -> usize {
        self.path.matches('.').count() + 1
    }

    /// Get the parent path for nested levels.
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }

    /// Get the target type name.
    pub fn target(&self) -> &str {
        &self.step.target
    }
}

/// Validated execution plan.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// The primary intent.
    pub primary: QueryIntent,
    /// Output columns of the primary type.
    pub columns: Vec<String>,
    /// Fields to read on the primary type.
    pub primary_fields: Vec<String>,
    /// Related levels in dependency order (parents before children).
    pub fetches: Vec<FetchPlan>,
}

/// Builds [`QueryPlan`]s.
pub struct QueryPlanner;

impl QueryPlanner {
    /// Validate the join paths of `related` and order the fetches.
    ///
    /// Every path must start at the primary type, chain source to target and
    /// follow relational fields present in `schema`. Intermediate levels that
    /// no related query asks for are planned as hidden fetches.
    pub fn plan<S>(
        schema: &S,
        primary: &QueryIntent,
        related: &[RelatedQuery],
        relations: &RelationshipHandler,
    ) -> Result<QueryPlan, Error>
    where
        S: SchemaLookup + ?Sized,
    {
        let mut levels: Vec<FetchPlan> = Vec::new();
        let mut by_path: HashMap<String, usize> = HashMap::new();

        for (index, query) in related.iter().enumerate() {
            relations.check_hops(&query.path)?;
            validate_path(schema, &primary.model, &query.path)?;

            for depth in 1..=query.path.len() {
                let path = dotted(&query.path[..depth]);
                let is_last = depth == query.path.len();

                match by_path.get(&path) {
                    Some(&existing) if is_last => {
                        // A hidden level becomes visible when a query asks for it.
                        let level = &mut levels[existing];
                        if level.output.is_none() {
                            level.output = Some(index);
                            level.intent = query.intent.clone();
                        }
                    }
                    Some(_) => {}
                    None => {
                        let step = query.path[depth - 1].clone();
                        let (intent, output) = if is_last {
                            (query.intent.clone(), Some(index))
                        } else {
                            (QueryIntent::new(step.target.clone()), None)
                        };
                        by_path.insert(path.clone(), levels.len());
                        levels.push(FetchPlan {
                            path,
                            step,
                            intent,
                            fetch_fields: Vec::new(),
                            output,
                        });
                    }
                }
            }
        }

        let mut primary_fields = primary.fields.clone();
        if primary_fields.is_empty() {
            if let Some(model) = schema.model(&primary.model) {
                primary_fields = FieldClassifier::default_fields(model, DEFAULT_PRIMARY_FIELDS);
            }
        }

        let columns = primary_fields.clone();
        for level in levels.iter_mut() {
            if level.output.is_some() && level.intent.fields.is_empty() {
                if let Some(model) = schema.model(level.target()) {
                    level.intent.fields = FieldClassifier::default_fields(model, DEFAULT_RELATED_FIELDS);
                }
            }
            level.fetch_fields = level.intent.fields.clone();
        }

        // Each level must read the relation field its children follow.
        let links: Vec<(Option<String>, String)> = levels
            .iter()
            .map(|l| (l.parent_path().map(String::from), l.step.field.clone()))
            .collect();
        for (parent, field) in links {
            let fields = match parent {
                Some(parent) => match by_path.get(&parent) {
                    Some(&i) => &mut levels[i].fetch_fields,
                    None => continue,
                },
                None => &mut primary_fields,
            };
            if !fields.contains(&field) {
                fields.push(field);
            }
        }

        let fetches = order_levels(levels);
        for fetch in &fetches {
            trace!(
                path = %fetch.path,
                model = fetch.target(),
                output = fetch.output.is_some(),
                "planned fetch"
            );
        }

        Ok(QueryPlan {
            primary: primary.clone(),
            columns,
            primary_fields,
            fetches,
        })
    }
}

fn dotted(steps: &[JoinStep]) -> String {
    steps
        .iter()
        .map(|s| s.field.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

fn validate_path<S>(schema: &S, primary: &str, path: &[JoinStep]) -> Result<(), Error>
where
    S: SchemaLookup + ?Sized,
{
    let mut expected_source = primary;
    for step in path {
        let invalid = || Error::InvalidJoin {
            model: step.source.clone(),
            field: step.field.clone(),
        };

        if step.source != expected_source {
            return Err(invalid());
        }

        let field = schema
            .model(&step.source)
            .and_then(|m| m.field(&step.field))
            .ok_or_else(invalid)?;
        if field.target() != Some(step.target.as_str()) || field.cardinality() != Some(step.cardinality) {
            return Err(invalid());
        }
        expected_source = &step.target;
    }
    Ok(())
}

/// Order levels so every parent precedes its children, keeping input order
/// among levels whose dependencies are satisfied.
fn order_levels(levels: Vec<FetchPlan>) -> Vec<FetchPlan> {
    let mut remaining: Vec<FetchPlan> = levels;
    let mut sorted: Vec<FetchPlan> = Vec::with_capacity(remaining.len());
    let mut done: HashSet<String> = HashSet::new();

    while !remaining.is_empty() {
        let available = remaining.iter().position(|level| match level.parent_path() {
            Some(parent) => done.contains(parent),
            None => true,
        });

        match available {
            Some(index) => {
                let level = remaining.remove(index);
                done.insert(level.path.clone());
                sorted.push(level);
            }
            // Orphaned levels go last.
            None => {
                sorted.append(&mut remaining);
            }
        }
    }

    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSnapshot;
    use advsearch_proto::{Cardinality, FieldDescriptor, FieldType, ModelDescriptor};

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::from_models(
            Vec::new(),
            vec![
                ModelDescriptor::from_fields(
                    "account.move",
                    vec![
                        FieldDescriptor::new("name", FieldType::Text),
                        FieldDescriptor::reference("partner_id", FieldType::SingleReference, "res.partner"),
                        FieldDescriptor::reference(
                            "invoice_line_ids",
                            FieldType::CollectionReference,
                            "account.move.line",
                        ),
                    ],
                ),
                ModelDescriptor::from_fields(
                    "account.move.line",
                    vec![
                        FieldDescriptor::new("name", FieldType::Text),
                        FieldDescriptor::reference("product_id", FieldType::SingleReference, "product.product"),
                    ],
                ),
                ModelDescriptor::from_fields(
                    "product.product",
                    vec![FieldDescriptor::new("name", FieldType::Text)],
                ),
                ModelDescriptor::from_fields(
                    "res.partner",
                    vec![FieldDescriptor::new("name", FieldType::Text)],
                ),
            ],
        )
    }

    fn step(source: &str, field: &str, target: &str, cardinality: Cardinality) -> JoinStep {
        JoinStep {
            source: source.into(),
            field: field.into(),
            target: target.into(),
            cardinality,
        }
    }

    fn lines() -> JoinStep {
        step("account.move", "invoice_line_ids", "account.move.line", Cardinality::OneToMany)
    }

    fn product() -> JoinStep {
        step("account.move.line", "product_id", "product.product", Cardinality::OneToOne)
    }

    #[test]
    fn test_unrequested_fields_use_curated_defaults() {
        let snapshot = snapshot();
        let primary = QueryIntent::new("account.move");
        let related = vec![RelatedQuery::new(
            vec![step("account.move", "partner_id", "res.partner", Cardinality::OneToOne)],
            QueryIntent::new("res.partner"),
        )];

        let plan = QueryPlanner::plan(&snapshot, &primary, &related, &RelationshipHandler::new(2))
            .unwrap();

        let bill = snapshot.model("account.move").unwrap();
        let partner = snapshot.model("res.partner").unwrap();
        assert_eq!(plan.columns, FieldClassifier::default_fields(bill, DEFAULT_PRIMARY_FIELDS));
        assert_eq!(
            plan.fetches[0].intent.fields,
            FieldClassifier::default_fields(partner, DEFAULT_RELATED_FIELDS)
        );
    }

    #[test]
    fn test_nested_query_gets_hidden_parent() {
        let primary = QueryIntent::new("account.move").with_fields(vec!["name".into()]);
        let related = vec![RelatedQuery::new(
            vec![lines(), product()],
            QueryIntent::new("product.product").with_fields(vec!["name".into()]),
        )];

        let plan = QueryPlanner::plan(&snapshot(), &primary, &related, &RelationshipHandler::new(2))
            .unwrap();

        let paths: Vec<&str> = plan.fetches.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["invoice_line_ids", "invoice_line_ids.product_id"]);
        assert_eq!(plan.fetches[0].output, None);
        assert_eq!(plan.fetches[0].fetch_fields, vec!["product_id"]);
        assert_eq!(plan.fetches[1].output, Some(0));
        assert_eq!(plan.columns, vec!["name"]);
        assert_eq!(plan.primary_fields, vec!["name", "invoice_line_ids"]);
    }

    #[test]
    fn test_children_ordered_after_parents() {
        let primary = QueryIntent::new("account.move").with_fields(vec!["name".into()]);
        let related = vec![
            RelatedQuery::new(
                vec![lines(), product()],
                QueryIntent::new("product.product").with_fields(vec!["name".into()]),
            ),
            RelatedQuery::new(
                vec![lines()],
                QueryIntent::new("account.move.line").with_fields(vec!["name".into()]),
            ),
        ];

        let plan = QueryPlanner::plan(&snapshot(), &primary, &related, &RelationshipHandler::new(2))
            .unwrap();

        assert_eq!(plan.fetches[0].path, "invoice_line_ids");
        assert_eq!(plan.fetches[0].output, Some(1));
        assert_eq!(plan.fetches[0].fetch_fields, vec!["name", "product_id"]);
        assert_eq!(plan.fetches[1].depth(), 2);
    }

    #[test]
    fn test_rejects_broken_chain() {
        let primary = QueryIntent::new("account.move");
        let related = vec![RelatedQuery::new(
            vec![product()],
            QueryIntent::new("product.product"),
        )];

        let err = QueryPlanner::plan(&snapshot(), &primary, &related, &RelationshipHandler::new(2))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidJoin { ref field, .. } if field == "product_id"));
    }

    #[test]
    fn test_rejects_mismatched_cardinality() {
        let primary = QueryIntent::new("account.move");
        let related = vec![RelatedQuery::new(
            vec![step("account.move", "partner_id", "res.partner", Cardinality::OneToMany)],
            QueryIntent::new("res.partner"),
        )];

        assert!(QueryPlanner::plan(&snapshot(), &primary, &related, &RelationshipHandler::new(2)).is_err());
    }

    #[test]
    fn test_rejects_paths_over_hop_cap() {
        let primary = QueryIntent::new("account.move");
        let related = vec![RelatedQuery::new(
            vec![lines(), product()],
            QueryIntent::new("product.product"),
        )];

        let err = QueryPlanner::plan(&snapshot(), &primary, &related, &RelationshipHandler::new(1))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedRelation { max_hops: 1, .. }));
    }

    #[test]
    fn test_empty_primary_fields_use_defaults() {
        let primary = QueryIntent::new("res.partner");
        let plan = QueryPlanner::plan(&snapshot(), &primary, &[], &RelationshipHandler::default())
            .unwrap();
        assert_eq!(plan.primary_fields, vec!["name"]);
        assert!(plan.fetches.is_empty());
    }
}
