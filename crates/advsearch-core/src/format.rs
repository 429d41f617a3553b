//! Rendering execution results as search responses.

use indexmap::IndexSet;
use tracing::debug;

use advsearch_proto::{
    Diagnostic, Record, ResultBody, ResultGroup, Row, SchemaLookup, SearchResponse, Value,
};

use crate::catalog::CatalogSnapshot;
use crate::config::DEFAULT_MAX_CELL_WIDTH;
use crate::query::ExecutionResult;

/// Column tagging each child row with the relation it came through.
pub const VIA_COLUMN: &str = "_via";

const ELLIPSIS: char = '…';

/// Formats [`ExecutionResult`]s into [`SearchResponse`]s.
#[derive(Debug, Clone, Copy)]
pub struct ResultFormatter {
    max_cell_width: usize,
}

impl ResultFormatter {
    /// Create a formatter truncating cells to `max_cell_width` characters.
    pub fn new(max_cell_width: usize) -> Self {
        Self {
            max_cell_width: max_cell_width.max(1),
        }
    }

    /// Get the cell width limit.
    pub fn max_cell_width(&self) -> usize {
        self.max_cell_width
    }

    /// Format a result.
    ///
    /// Results without related queries render as a table whose columns are
    /// exactly the requested fields, in order. Results with related queries
    /// render as groups: each primary row with its related rows underneath.
    pub fn format(&self, snapshot: &CatalogSnapshot, result: ExecutionResult) -> SearchResponse {
        let mut truncated: IndexSet<(String, String)> = IndexSet::new();
        let model = result.intent.model.clone();

        let body = if result.is_grouped() {
            let groups = result
                .rows
                .iter()
                .map(|record| {
                    let parent = self.row(&model, record, &result.columns, &mut truncated);
                    let mut children = Vec::new();
                    for related in &result.related {
                        let Some(rows) = related.rows.get(&record.id) else {
                            continue;
                        };
                        let target = related
                            .query
                            .path
                            .last()
                            .map(|s| s.target.as_str())
                            .unwrap_or_default();
                        for child in rows {
                            let mut row = Row::new();
                            row.insert(VIA_COLUMN.to_string(), Value::Text(related.path.clone()));
                            row.extend(self.row(target, child, &related.columns, &mut truncated));
                            children.push(row);
                        }
                    }
                    ResultGroup { parent, children }
                })
                .collect();
            ResultBody::Grouped { groups }
        } else {
            let rows = result
                .rows
                .iter()
                .map(|record| self.row(&model, record, &result.columns, &mut truncated))
                .collect();
            ResultBody::Table {
                columns: result.columns.clone(),
                rows,
            }
        };

        let summary = summarize(snapshot, &result);
        let mut diagnostics = result.diagnostics;
        for (model, field) in truncated {
            debug!(model = %model, field = %field, "cell values truncated");
            diagnostics.push(Diagnostic::Truncated { model, field });
        }

        SearchResponse {
            body,
            intent: result.intent,
            related: result.requested,
            summary,
            diagnostics,
        }
    }

    fn row(
        &self,
        model: &str,
        record: &Record,
        columns: &[String],
        truncated: &mut IndexSet<(String, String)>,
    ) -> Row {
        columns
            .iter()
            .map(|column| {
                let value = record.get(column).cloned().unwrap_or(Value::Null);
                let (value, cut) = self.cell(value);
                if cut {
                    truncated.insert((model.to_string(), column.clone()));
                }
                (column.clone(), value)
            })
            .collect()
    }

    /// Render one cell: references become their display text, long text is
    /// cut at a char boundary with a trailing ellipsis.
    fn cell(&self, value: Value) -> (Value, bool) {
        let text = match value {
            Value::Ref(r) => r.1,
            Value::Text(text) => text,
            other => return (other, false),
        };
        if text.chars().count() <= self.max_cell_width {
            return (Value::Text(text), false);
        }
        let mut cut: String = text.chars().take(self.max_cell_width - 1).collect();
        cut.push(ELLIPSIS);
        (Value::Text(cut), true)
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CELL_WIDTH)
    }
}

/// One-line description: `"3 Bill record(s) where state = posted, with Contact details"`.
pub fn summarize(snapshot: &CatalogSnapshot, result: &ExecutionResult) -> String {
    let mut summary = format!(
        "{} {} record(s)",
        result.rows.len(),
        label(snapshot, &result.intent.model)
    );

    if !result.intent.filters.is_empty() {
        let filters: Vec<String> = result.intent.filters.iter().map(|f| f.to_string()).collect();
        summary.push_str(" where ");
        summary.push_str(&filters.join(" and "));
    }

    let related: Vec<&str> = result
        .requested
        .iter()
        .filter_map(|q| q.path.last())
        .map(|step| label(snapshot, &step.target))
        .collect();
    if !related.is_empty() {
        summary.push_str(", with ");
        summary.push_str(&related.join(", "));
        summary.push_str(" details");
    }

    summary
}

fn label<'a>(snapshot: &'a CatalogSnapshot, model: &'a str) -> &'a str {
    snapshot
        .summary(model)
        .and_then(|s| s.label.as_deref())
        .or_else(|| snapshot.model(model).and_then(|m| m.label.as_deref()))
        .unwrap_or(model)
}
