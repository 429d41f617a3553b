//! Merging related rows into primary rows.
//!
//! Related rows are fetched by id, so merging is a hash join:
//! 1. Build phase: index the fetched rows by id
//! 2. Probe phase: for each parent row, look up the ids held in its relation
//!    field and attach the matches to the parent's primary row
//!
//! Levels are keyed by primary row id, so multi-step paths keep the grouping
//! of the primary row they started from.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use advsearch_proto::{JoinStep, OrderSpec, Record};

/// Rows reached at one relation level, grouped by primary row id.
pub type GroupedRows = IndexMap<i64, Vec<Record>>;

/// Hash join over relation ids.
pub struct HashJoin;

impl HashJoin {
    /// The primary level: every primary row grouped under its own id.
    pub fn root(rows: &[Record]) -> GroupedRows {
        rows.iter().map(|r| (r.id, vec![r.clone()])).collect()
    }

    /// Distinct related ids held in `field` across a level, in first-seen order.
    pub fn collect_ids(level: &GroupedRows, field: &str) -> Vec<i64> {
        let mut seen = HashSet::new();
        level
            .values()
            .flatten()
            .filter_map(|row| row.get(field))
            .flat_map(|value| value.ref_ids())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Index fetched rows by id.
    pub fn build(rows: Vec<Record>) -> HashMap<i64, Record> {
        rows.into_iter().map(|r| (r.id, r)).collect()
    }

    /// Attach the rows reached through `step` to each primary row.
    ///
    /// A one-to-one step yields at most one row per parent row; collection
    /// steps yield every fetched member. Ids missing from `table` (filtered
    /// out or dropped by batch caps) are skipped. Each primary row keeps a
    /// given related row once. Children follow `order` when it is given,
    /// otherwise the order of the ids in the relation field.
    pub fn probe(
        level: &GroupedRows,
        step: &JoinStep,
        table: &HashMap<i64, Record>,
        order: &[OrderSpec],
    ) -> GroupedRows {
        level
            .iter()
            .map(|(primary_id, parents)| {
                let mut seen = HashSet::new();
                let mut children: Vec<Record> = parents
                    .iter()
                    .filter_map(|parent| parent.get(&step.field))
                    .flat_map(|value| {
                        let ids = value.ref_ids();
                        if step.is_collection() {
                            ids
                        } else {
                            ids.into_iter().take(1).collect()
                        }
                    })
                    .filter(|id| seen.insert(*id))
                    .filter_map(|id| table.get(&id).cloned())
                    .collect();
                if !order.is_empty() {
                    children.sort_by(|a, b| a.cmp_by(b, order));
                }
                (*primary_id, children)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advsearch_proto::{Cardinality, RecordRef, Value};

    fn bills() -> Vec<Record> {
        vec![
            Record::new(1)
                .with_field("partner_id", RecordRef::new(10, "Acme"))
                .with_field("invoice_line_ids", vec![100_i64, 101]),
            Record::new(2)
                .with_field("partner_id", RecordRef::new(10, "Acme"))
                .with_field("invoice_line_ids", vec![102_i64]),
            Record::new(3)
                .with_field("partner_id", Value::Bool(false))
                .with_field("invoice_line_ids", Vec::<i64>::new()),
        ]
    }

    fn child_ids(level: &GroupedRows, primary: i64) -> Vec<i64> {
        level
            .get(&primary)
            .map(|rows| rows.iter().map(|r| r.id).collect())
            .unwrap_or_default()
    }

    fn step(field: &str, cardinality: Cardinality) -> JoinStep {
        JoinStep {
            source: "account.move".into(),
            field: field.into(),
            target: "x".into(),
            cardinality,
        }
    }

    #[test]
    fn test_collect_ids_dedups_in_order() {
        let level = HashJoin::root(&bills());
        assert_eq!(HashJoin::collect_ids(&level, "partner_id"), vec![10]);
        assert_eq!(
            HashJoin::collect_ids(&level, "invoice_line_ids"),
            vec![100, 101, 102]
        );
    }

    #[test]
    fn test_one_to_one_attaches_single_row() {
        let level = HashJoin::root(&bills());
        let table = HashJoin::build(vec![Record::new(10).with_field("name", "Acme")]);

        let joined = HashJoin::probe(&level, &step("partner_id", Cardinality::OneToOne), &table, &[]);

        assert_eq!(child_ids(&joined, 1), vec![10]);
        assert_eq!(child_ids(&joined, 2), vec![10]);
        assert!(child_ids(&joined, 3).is_empty());
    }

    #[test]
    fn test_collection_groups_per_parent() {
        let level = HashJoin::root(&bills());
        let table = HashJoin::build(vec![Record::new(100), Record::new(102)]);

        let joined =
            HashJoin::probe(&level, &step("invoice_line_ids", Cardinality::OneToMany), &table, &[]);

        assert_eq!(child_ids(&joined, 1), vec![100]);
        assert_eq!(child_ids(&joined, 2), vec![102]);
        assert_eq!(joined.keys().copied().collect::<Vec<i64>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_multi_step_keeps_primary_grouping() {
        let level = HashJoin::root(&bills());
        let lines = HashJoin::build(vec![
            Record::new(100).with_field("product_id", RecordRef::new(7, "Desk")),
            Record::new(101).with_field("product_id", RecordRef::new(7, "Desk")),
            Record::new(102).with_field("product_id", RecordRef::new(8, "Chair")),
        ]);
        let line_level =
            HashJoin::probe(&level, &step("invoice_line_ids", Cardinality::OneToMany), &lines, &[]);

        let products = HashJoin::build(vec![Record::new(7), Record::new(8)]);
        let product_level =
            HashJoin::probe(&line_level, &step("product_id", Cardinality::OneToOne), &products, &[]);

        assert_eq!(child_ids(&product_level, 1), vec![7]);
        assert_eq!(child_ids(&product_level, 2), vec![8]);
    }

    #[test]
    fn test_children_follow_requested_order() {
        let level = HashJoin::root(&bills());
        let table = HashJoin::build(vec![
            Record::new(100).with_field("price_subtotal", 20.0),
            Record::new(101).with_field("price_subtotal", 300.0),
        ]);
        let lines = step("invoice_line_ids", Cardinality::OneToMany);

        let unordered = HashJoin::probe(&level, &lines, &table, &[]);
        assert_eq!(child_ids(&unordered, 1), vec![100, 101]);

        let ordered =
            HashJoin::probe(&level, &lines, &table, &[OrderSpec::desc("price_subtotal")]);
        assert_eq!(child_ids(&ordered, 1), vec![101, 100]);
    }
}
