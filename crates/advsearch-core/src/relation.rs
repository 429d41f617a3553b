//! Relation path resolution between record types.
//!
//! Paths are found with an iterative breadth-first search over relational
//! fields. A visited set and a hop cap bound the search, so self-referential
//! and cyclic schemas terminate and unrelated types fail fast instead of
//! exploring the whole catalog.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, trace};

use advsearch_proto::{FieldDescriptor, JoinStep, ModelDescriptor, SchemaLookup};

use crate::classify::name_tokens;
use crate::config::DEFAULT_MAX_HOPS;
use crate::error::Error;

/// Resolves join paths between record types.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipHandler {
    max_hops: usize,
}

impl RelationshipHandler {
    /// Create a handler with a hop cap.
    pub fn new(max_hops: usize) -> Self {
        Self { max_hops }
    }

    /// The hop cap.
    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    /// Shortest join path from `source` to `target`.
    ///
    /// `vocabulary` holds lowercase query words; when several fields connect
    /// the same two types, a field whose name or label contains one of them
    /// wins, then the first required field, then the first in schema order.
    /// Resolving a type to itself yields an empty path.
    pub fn resolve<S>(
        &self,
        schema: &S,
        source: &str,
        target: &str,
        vocabulary: &[String],
    ) -> Result<Vec<JoinStep>, Error>
    where
        S: SchemaLookup + ?Sized,
    {
        for model in [source, target] {
            if schema.model(model).is_none() {
                return Err(Error::ModelNotFound {
                    model: model.to_string(),
                });
            }
        }
        if source == target {
            return Ok(Vec::new());
        }

        let mut visited: HashSet<&str> = HashSet::from([source]);
        let mut queue: VecDeque<(&str, Vec<JoinStep>)> = VecDeque::from([(source, Vec::new())]);

        while let Some((current, path)) = queue.pop_front() {
            if path.len() >= self.max_hops {
                continue;
            }
            let Some(model) = schema.model(current) else {
                continue;
            };

            for (next, fields) in fields_by_target(model) {
                if visited.contains(next) {
                    continue;
                }

                let Some(field) = pick_field(&fields, vocabulary) else {
                    continue;
                };
                let step = JoinStep::from_field(current, field)
                    .map_err(|e| Error::from_proto(current, e))?;
                trace!(step = %step, depth = path.len() + 1, "relation candidate");

                let mut extended = path.clone();
                extended.push(step);

                if next == target {
                    debug!(
                        source,
                        destination = target,
                        hops = extended.len(),
                        via = %extended[0].field,
                        "relation resolved"
                    );
                    return Ok(extended);
                }

                visited.insert(next);
                queue.push_back((next, extended));
            }
        }

        debug!(source, destination = target, max_hops = self.max_hops, "no relation path");
        Err(Error::UnsupportedRelation {
            origin: source.to_string(),
            target: target.to_string(),
            max_hops: self.max_hops,
        })
    }

    /// Direct relation edges leaving `model`, in schema order.
    pub fn neighbors<S>(&self, schema: &S, model: &str) -> Result<Vec<JoinStep>, Error>
    where
        S: SchemaLookup + ?Sized,
    {
        let descriptor = schema.model(model).ok_or_else(|| Error::ModelNotFound {
            model: model.to_string(),
        })?;

        descriptor
            .relational_fields()
            .map(|f| JoinStep::from_field(model, f).map_err(|e| Error::from_proto(model, e)))
            .collect()
    }

    /// Check a path against the hop cap.
    pub fn check_hops(&self, path: &[JoinStep]) -> Result<(), Error> {
        if path.len() > self.max_hops {
            let origin = path.first().map(|s| s.source.clone()).unwrap_or_default();
            let target = path.last().map(|s| s.target.clone()).unwrap_or_default();
            return Err(Error::UnsupportedRelation {
                origin,
                target,
                max_hops: self.max_hops,
            });
        }
        Ok(())
    }
}

impl Default for RelationshipHandler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HOPS)
    }
}

/// Relational fields grouped by target type, both in schema order.
fn fields_by_target(model: &ModelDescriptor) -> IndexMap<&str, Vec<&FieldDescriptor>> {
    let mut grouped: IndexMap<&str, Vec<&FieldDescriptor>> = IndexMap::new();
    for field in model.relational_fields() {
        if let Some(target) = field.target() {
            grouped.entry(target).or_default().push(field);
        }
    }
    grouped
}

fn pick_field<'a>(
    fields: &[&'a FieldDescriptor],
    vocabulary: &[String],
) -> Option<&'a FieldDescriptor> {
    let mentioned = fields.iter().find(|f| {
        name_tokens(&f.name, f.label.as_deref())
            .iter()
            .any(|token| vocabulary.contains(token))
    });

    mentioned
        .or_else(|| fields.iter().find(|f| f.required))
        .or_else(|| fields.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSnapshot;
    use advsearch_proto::{Cardinality, FieldType};

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::from_models(
            Vec::new(),
            vec![
                ModelDescriptor::from_fields(
                    "account.move",
                    vec![
                        FieldDescriptor::new("name", FieldType::Text),
                        FieldDescriptor::reference(
                            "commercial_partner_id",
                            FieldType::SingleReference,
                            "res.partner",
                        )
                        .with_label("Commercial Entity"),
                        FieldDescriptor::reference("partner_id", FieldType::SingleReference, "res.partner")
                            .with_label("Vendor"),
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
                        FieldDescriptor::reference("move_id", FieldType::SingleReference, "account.move")
                            .required(),
                        FieldDescriptor::reference("product_id", FieldType::SingleReference, "product.product"),
                    ],
                ),
                ModelDescriptor::from_fields(
                    "product.product",
                    vec![FieldDescriptor::new("name", FieldType::Text)],
                ),
                ModelDescriptor::from_fields(
                    "res.partner",
                    vec![
                        FieldDescriptor::new("name", FieldType::Text),
                        FieldDescriptor::reference("parent_id", FieldType::SingleReference, "res.partner"),
                        FieldDescriptor::reference("child_ids", FieldType::CollectionReference, "res.partner"),
                        FieldDescriptor::reference("country_id", FieldType::SingleReference, "res.country"),
                    ],
                ),
                ModelDescriptor::from_fields(
                    "res.country",
                    vec![FieldDescriptor::new("name", FieldType::Text)],
                ),
                ModelDescriptor::from_fields(
                    "hr.leave",
                    vec![FieldDescriptor::new("name", FieldType::Text)],
                ),
            ],
        )
    }

    fn words(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_direct_relation_prefers_vocabulary() {
        let handler = RelationshipHandler::default();
        let path = handler
            .resolve(&snapshot(), "account.move", "res.partner", &words(&["vendor"]))
            .unwrap();

        assert_eq!(path.len(), 1);
        assert_eq!(path[0].field, "partner_id");
        assert_eq!(path[0].cardinality, Cardinality::OneToOne);
    }

    #[test]
    fn test_without_vocabulary_falls_back_to_schema_order() {
        let handler = RelationshipHandler::default();
        let path = handler
            .resolve(&snapshot(), "account.move", "res.partner", &[])
            .unwrap();

        assert_eq!(path[0].field, "commercial_partner_id");
    }

    #[test]
    fn test_two_hop_chain() {
        let handler = RelationshipHandler::new(2);
        let path = handler
            .resolve(&snapshot(), "account.move", "product.product", &[])
            .unwrap();

        let fields: Vec<&str> = path.iter().map(|s| s.field.as_str()).collect();
        assert_eq!(fields, vec!["invoice_line_ids", "product_id"]);
        assert_eq!(path[0].cardinality, Cardinality::OneToMany);
        assert_eq!(path[1].source, "account.move.line");
    }

    #[test]
    fn test_hop_cap_is_respected() {
        let handler = RelationshipHandler::new(1);
        let err = handler
            .resolve(&snapshot(), "account.move", "res.country", &[])
            .unwrap_err();

        assert!(matches!(
            err,
            Error::UnsupportedRelation { ref origin, ref target, max_hops: 1 }
                if origin == "account.move" && target == "res.country"
        ));

        let path = RelationshipHandler::new(2)
            .resolve(&snapshot(), "account.move", "res.country", &[])
            .unwrap();
        assert!(path.len() <= 2);
    }

    #[test]
    fn test_unrelated_types_fail() {
        let handler = RelationshipHandler::new(5);
        let err = handler
            .resolve(&snapshot(), "res.partner", "hr.leave", &[])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedRelation { .. }));
    }

    #[test]
    fn test_cyclic_schema_terminates() {
        // res.partner points at itself through parent_id and child_ids
        let handler = RelationshipHandler::new(10);
        let err = handler
            .resolve(&snapshot(), "res.partner", "account.move", &[])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedRelation { max_hops: 10, .. }));
    }

    #[test]
    fn test_same_type_is_empty_path() {
        let handler = RelationshipHandler::default();
        let path = handler
            .resolve(&snapshot(), "res.partner", "res.partner", &[])
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_unknown_type() {
        let handler = RelationshipHandler::default();
        let err = handler
            .resolve(&snapshot(), "account.move", "stock.picking", &[])
            .unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { ref model } if model == "stock.picking"));
    }

    #[test]
    fn test_neighbors() {
        let handler = RelationshipHandler::default();
        let edges = handler.neighbors(&snapshot(), "res.partner").unwrap();

        let targets: Vec<&str> = edges.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["res.partner", "res.partner", "res.country"]);
        assert_eq!(edges[1].cardinality, Cardinality::OneToMany);
    }

    #[test]
    fn test_check_hops() {
        let handler = RelationshipHandler::new(1);
        let path = RelationshipHandler::new(2)
            .resolve(&snapshot(), "account.move", "product.product", &[])
            .unwrap();
        assert!(handler.check_hops(&path).is_err());
        assert!(handler.check_hops(&path[..1]).is_ok());
    }
}
