//! Field classifier.

use std::cmp::Reverse;
use std::fmt;

use serde::{Deserialize, Serialize};

use advsearch_proto::{FieldDescriptor, FieldType, ModelDescriptor};

use super::vocabulary::{
    is_audit_field, name_tokens, CONTACT, FINANCIAL, IDENTITY, STATE_FLAGS, STATUS, TEMPORAL,
};

/// Semantic category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    /// Names, codes and references that identify a record.
    Identity,
    /// Dates and date-times.
    Temporal,
    /// Amounts, prices and balances.
    Financial,
    /// States, stages and state flags.
    Status,
    /// Email, phone and address data.
    Contact,
    /// References to other record types.
    Relational,
    /// Everything else.
    Descriptive,
}

impl FieldCategory {
    /// Rank used when picking default output columns.
    fn column_rank(&self) -> Option<u8> {
        match self {
            FieldCategory::Identity => Some(0),
            FieldCategory::Status => Some(1),
            FieldCategory::Temporal => Some(2),
            FieldCategory::Financial => Some(3),
            FieldCategory::Contact => Some(4),
            FieldCategory::Relational | FieldCategory::Descriptive => None,
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldCategory::Identity => "identity",
            FieldCategory::Temporal => "temporal",
            FieldCategory::Financial => "financial",
            FieldCategory::Status => "status",
            FieldCategory::Contact => "contact",
            FieldCategory::Relational => "relational",
            FieldCategory::Descriptive => "descriptive",
        };
        f.write_str(s)
    }
}

/// Category and confidence of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Assigned category.
    pub category: FieldCategory,
    /// Vocabulary hits; higher is a better representative of the category.
    pub score: u32,
}

impl Classification {
    fn new(category: FieldCategory, score: u32) -> Self {
        Self { category, score }
    }
}

/// Classifies fields by type first and name second.
pub struct FieldClassifier;

impl FieldClassifier {
    /// Classify a field.
    ///
    /// Type rules take precedence: temporal types are always temporal,
    /// references always relational and selections always status. Name
    /// vocabularies decide the rest and set the score. Audit fields
    /// (`create_date`, `write_uid`, ...) keep their category with score 0.
    pub fn classify(field: &FieldDescriptor) -> Classification {
        let name = field.name.as_str();
        let tokens = name_tokens(name, field.label.as_deref());

        let classification = match field.field_type {
            FieldType::Date | FieldType::DateTime => {
                Classification::new(FieldCategory::Temporal, 1 + TEMPORAL.score(name, &tokens))
            }
            FieldType::SingleReference
            | FieldType::CollectionReference
            | FieldType::SharedCollectionReference => {
                Classification::new(FieldCategory::Relational, 1 + field.required as u32)
            }
            FieldType::Selection => {
                Classification::new(FieldCategory::Status, 1 + STATUS.score(name, &tokens))
            }
            FieldType::Boolean => {
                let flags = tokens
                    .iter()
                    .filter(|t| STATE_FLAGS.contains(&t.as_str()))
                    .count() as u32;
                if flags > 0 {
                    Classification::new(FieldCategory::Status, flags + STATUS.score(name, &tokens))
                } else {
                    Classification::new(FieldCategory::Descriptive, 0)
                }
            }
            FieldType::Integer | FieldType::Float => {
                best_of(&[
                    (FieldCategory::Financial, FINANCIAL.score(name, &tokens)),
                    (FieldCategory::Identity, IDENTITY.score(name, &tokens)),
                ])
            }
            FieldType::Text => best_of(&[
                (FieldCategory::Identity, IDENTITY.score(name, &tokens)),
                (FieldCategory::Contact, CONTACT.score(name, &tokens)),
                (FieldCategory::Status, STATUS.score(name, &tokens)),
            ]),
        };

        if is_audit_field(name) {
            Classification::new(classification.category, 0)
        } else {
            classification
        }
    }

    /// The field best representing `category` on `model`.
    ///
    /// Ties on score go to required fields, then shorter names, then lexical
    /// order, so the choice is stable across calls.
    pub fn best_field(model: &ModelDescriptor, category: FieldCategory) -> Option<&FieldDescriptor> {
        Self::fields_in(model, category).into_iter().next()
    }

    /// All fields of `category` on `model`, best first.
    pub fn fields_in(model: &ModelDescriptor, category: FieldCategory) -> Vec<&FieldDescriptor> {
        let mut fields: Vec<(&FieldDescriptor, u32)> = model
            .iter_fields()
            .filter_map(|f| {
                let c = Self::classify(f);
                (c.category == category).then_some((f, c.score))
            })
            .collect();

        fields.sort_by_key(|(f, score)| {
            (Reverse(*score), !f.required, f.name.len(), f.name.clone())
        });
        fields.into_iter().map(|(f, _)| f).collect()
    }

    /// The field holding a record's display name.
    pub fn display_field(model: &ModelDescriptor) -> Option<&FieldDescriptor> {
        let is_text = |f: &&FieldDescriptor| f.field_type == FieldType::Text;

        model
            .field("name")
            .filter(is_text)
            .or_else(|| model.field("display_name").filter(is_text))
            .or_else(|| {
                Self::fields_in(model, FieldCategory::Identity)
                    .into_iter()
                    .find(is_text)
            })
            .or_else(|| model.iter_fields().find(is_text))
    }

    /// Up to `limit` non-relational fields worth showing by default.
    ///
    /// The display field comes first, then identity, status, temporal,
    /// financial and contact fields, best first within each category.
    pub fn default_fields(model: &ModelDescriptor, limit: usize) -> Vec<String> {
        let mut ranked: Vec<(u8, u32, usize, &FieldDescriptor)> = model
            .iter_fields()
            .enumerate()
            .filter(|(_, f)| !f.is_relational() && !is_audit_field(&f.name))
            .filter_map(|(position, f)| {
                let c = Self::classify(f);
                c.category
                    .column_rank()
                    .map(|rank| (rank, c.score, position, f))
            })
            .collect();
        ranked.sort_by_key(|(rank, score, position, _)| (*rank, Reverse(*score), *position));

        let mut fields: Vec<String> = Vec::with_capacity(limit);
        if let Some(display) = Self::display_field(model) {
            fields.push(display.name.clone());
        }
        for (_, _, _, f) in ranked {
            if fields.len() >= limit {
                break;
            }
            if !fields.contains(&f.name) {
                fields.push(f.name.clone());
            }
        }
        fields.truncate(limit);
        fields
    }
}

fn best_of(candidates: &[(FieldCategory, u32)]) -> Classification {
    candidates
        .iter()
        .filter(|(_, score)| *score > 0)
        .fold(None::<(FieldCategory, u32)>, |best, &(category, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((category, score)),
        })
        .map(|(category, score)| Classification::new(category, score))
        .unwrap_or(Classification::new(FieldCategory::Descriptive, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bill() -> ModelDescriptor {
        ModelDescriptor::from_fields(
            "account.move",
            vec![
                FieldDescriptor::new("name", FieldType::Text).required(),
                FieldDescriptor::new("ref", FieldType::Text),
                FieldDescriptor::reference("partner_id", FieldType::SingleReference, "res.partner")
                    .with_label("Vendor"),
                FieldDescriptor::new("invoice_date", FieldType::Date),
                FieldDescriptor::new("invoice_date_due", FieldType::Date).with_label("Due Date"),
                FieldDescriptor::new("amount_total", FieldType::Float),
                FieldDescriptor::new("amount_residual", FieldType::Float).with_label("Amount Due"),
                FieldDescriptor::selection("state", &[("draft", "Draft"), ("posted", "Posted")])
                    .required(),
                FieldDescriptor::selection(
                    "payment_state",
                    &[("not_paid", "Not Paid"), ("paid", "Paid")],
                ),
                FieldDescriptor::new("narration", FieldType::Text),
                FieldDescriptor::new("create_date", FieldType::DateTime).readonly(),
            ],
        )
    }

    #[test]
    fn test_type_rules_take_precedence() {
        let model = bill();
        let category = |name: &str| FieldClassifier::classify(model.field(name).unwrap()).category;

        assert_eq!(category("invoice_date"), FieldCategory::Temporal);
        assert_eq!(category("partner_id"), FieldCategory::Relational);
        assert_eq!(category("payment_state"), FieldCategory::Status);
        assert_eq!(category("amount_residual"), FieldCategory::Financial);
        assert_eq!(category("name"), FieldCategory::Identity);
        assert_eq!(category("narration"), FieldCategory::Descriptive);
    }

    #[test]
    fn test_boolean_state_flags() {
        let active = FieldDescriptor::new("active", FieldType::Boolean);
        let flag = FieldDescriptor::new("is_company", FieldType::Boolean);

        assert_eq!(FieldClassifier::classify(&active).category, FieldCategory::Status);
        assert_eq!(FieldClassifier::classify(&flag).category, FieldCategory::Descriptive);
    }

    #[test]
    fn test_audit_fields_score_zero() {
        let model = bill();
        let created = FieldClassifier::classify(model.field("create_date").unwrap());
        assert_eq!(created.category, FieldCategory::Temporal);
        assert_eq!(created.score, 0);
    }

    #[test]
    fn test_best_field_is_deterministic() {
        let model = bill();

        let temporal = FieldClassifier::best_field(&model, FieldCategory::Temporal).unwrap();
        assert_eq!(temporal.name, "invoice_date");

        let financial = FieldClassifier::best_field(&model, FieldCategory::Financial).unwrap();
        assert_eq!(financial.name, "amount_total");

        let status = FieldClassifier::best_field(&model, FieldCategory::Status).unwrap();
        assert_eq!(status.name, "payment_state");
    }

    #[test]
    fn test_tie_break_prefers_required() {
        let model = ModelDescriptor::from_fields(
            "x",
            vec![
                FieldDescriptor::new("date", FieldType::Date),
                FieldDescriptor::new("date_order", FieldType::Date).required(),
            ],
        );

        let best = FieldClassifier::best_field(&model, FieldCategory::Temporal).unwrap();
        assert_eq!(best.name, "date_order");
    }

    #[test]
    fn test_tie_break_prefers_shorter_then_lexical() {
        let model = ModelDescriptor::from_fields(
            "x",
            vec![
                FieldDescriptor::new("total_b", FieldType::Float),
                FieldDescriptor::new("total_aa", FieldType::Float),
                FieldDescriptor::new("total_a", FieldType::Float),
            ],
        );

        let names: Vec<&str> = FieldClassifier::fields_in(&model, FieldCategory::Financial)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["total_a", "total_b", "total_aa"]);
    }

    #[test]
    fn test_display_field() {
        let model = bill();
        assert_eq!(FieldClassifier::display_field(&model).unwrap().name, "name");

        let line = ModelDescriptor::from_fields(
            "account.move.line",
            vec![
                FieldDescriptor::new("quantity", FieldType::Float),
                FieldDescriptor::new("label_text", FieldType::Text),
            ],
        );
        assert_eq!(FieldClassifier::display_field(&line).unwrap().name, "label_text");
    }

    #[test]
    fn test_default_fields_order() {
        let model = bill();
        let fields = FieldClassifier::default_fields(&model, 6);

        assert_eq!(
            fields,
            vec!["name", "ref", "payment_state", "state", "invoice_date", "invoice_date_due"]
        );
        assert!(!fields.contains(&"partner_id".to_string()));
        assert!(!fields.contains(&"create_date".to_string()));
    }
}
