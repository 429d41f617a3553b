//! Parser tests against the accounting demo catalog.

use advsearch_core::{CatalogSnapshot, Fixture};
use advsearch_lang::{parse, select_model, ParseError, ParseOptions, ParsedQuery};
use advsearch_proto::{Condition, FieldPath, SortDirection, Value};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

const DEMO_FIXTURE: &str = include_str!("../../../demos/accounting.json");

struct TestContext {
    snapshot: CatalogSnapshot,
    options: ParseOptions,
}

impl TestContext {
    fn new() -> Self {
        let fixture: Fixture = serde_json::from_str(DEMO_FIXTURE).expect("demo fixture");
        Self {
            snapshot: fixture.snapshot(),
            options: ParseOptions::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
        }
    }

    fn parse(&self, text: &str) -> ParsedQuery {
        parse(text, &self.snapshot, &self.options).unwrap()
    }
}

fn condition(parsed: &ParsedQuery, path: &str) -> Condition {
    parsed
        .primary
        .filter_on(&FieldPath::parse(path))
        .map(|f| f.condition.clone())
        .unwrap_or_else(|| panic!("no filter on {}", path))
}

fn date(y: i32, m: u32, d: u32) -> Value {
    Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

#[test]
fn test_unpaid_bills_with_vendor_details() {
    let ctx = TestContext::new();
    let parsed = ctx.parse("List all unpaid bills with vendor details");

    assert_eq!(parsed.primary.model, "account.move");
    assert_eq!(parsed.primary.filters.len(), 1);
    assert_eq!(
        condition(&parsed, "payment_state"),
        Condition::Equals(Value::from("not_paid"))
    );

    assert_eq!(parsed.related.len(), 1);
    assert_eq!(parsed.related[0].intent.model, "res.partner");
    assert_eq!(parsed.related[0].relation_path().to_string(), "partner_id");

    let fields = parsed.requested_fields();
    assert!(fields.contains(&"partner_id".to_string()));
    assert!(fields.contains(&"partner_id.name".to_string()));
    assert!(fields.contains(&"payment_state".to_string()));
}

#[test]
fn test_sales_orders_for_customer() {
    let ctx = TestContext::new();
    let parsed = ctx.parse("List all sales orders for customer Example Corp");

    assert_eq!(parsed.primary.model, "sale.order");
    assert_eq!(parsed.primary.filters.len(), 1);
    assert_eq!(
        condition(&parsed, "partner_id.name"),
        Condition::Ilike("Example Corp".into())
    );
    assert!(parsed.primary.fields.contains(&"partner_id".to_string()));
    assert!(parsed.related.is_empty());
    assert!(parsed.notes.is_empty());
}

#[test]
fn test_two_hop_details() {
    let ctx = TestContext::new();
    let parsed = ctx.parse("bills with product details");

    assert_eq!(parsed.primary.model, "account.move");
    assert_eq!(parsed.related.len(), 1);

    let related = &parsed.related[0];
    assert_eq!(related.hops(), 2);
    assert_eq!(related.intent.model, "product.product");
    assert_eq!(
        related.relation_path().to_string(),
        "invoice_line_ids.product_id"
    );
    assert!(parsed
        .requested_fields()
        .contains(&"invoice_line_ids.product_id.name".to_string()));
    assert!(parsed.primary.fields.contains(&"invoice_line_ids".to_string()));
}

#[test]
fn test_bare_anchor_uses_single_reference() {
    let ctx = TestContext::new();
    let parsed = ctx.parse("unpaid bills from Acme");

    assert_eq!(condition(&parsed, "partner_id.name"), Condition::Ilike("Acme".into()));
    assert_eq!(
        condition(&parsed, "payment_state"),
        Condition::Equals(Value::from("not_paid"))
    );
}

#[test]
fn test_amount_and_month() {
    let ctx = TestContext::new();
    let parsed = ctx.parse("quotations over 1,000 in September");

    assert_eq!(parsed.primary.model, "sale.order");
    assert_eq!(
        condition(&parsed, "amount_total"),
        Condition::Range {
            min: Some(Value::Float(1000.0)),
            max: None,
        }
    );
    assert_eq!(
        condition(&parsed, "date_order"),
        Condition::Range {
            min: Some(date(2026, 9, 1)),
            max: Some(date(2026, 9, 30)),
        }
    );
}

#[test]
fn test_ordering_and_limit() {
    let ctx = TestContext::new();
    let parsed = ctx.parse("latest 3 bills");
    assert_eq!(parsed.primary.order.len(), 1);
    assert_eq!(parsed.primary.order[0].field, "invoice_date");
    assert_eq!(parsed.primary.order[0].direction, SortDirection::Desc);

    let parsed = ctx.parse("first 3 bills");
    assert_eq!(parsed.primary.limit, Some(3));
}

#[test]
fn test_model_selection() {
    let ctx = TestContext::new();
    let summaries = ctx.snapshot.summaries();

    assert_eq!(select_model("vendor bills", summaries, None), Ok("account.move".into()));
    assert_eq!(select_model("Quotations", summaries, None), Ok("sale.order".into()));
    assert_eq!(
        select_model("items", summaries, None),
        Err(ParseError::AmbiguousModel {
            candidates: vec!["account.move.line".into(), "product.product".into()],
        })
    );
    assert_eq!(
        select_model("anything", summaries, Some("res.country")),
        Ok("res.country".into())
    );
}
