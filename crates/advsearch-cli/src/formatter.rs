//! Output formatters for search responses.

use std::slice;

use clap::ValueEnum;
use comfy_table::{Cell, Table};

use advsearch::proto::{FieldType, ModelDescriptor, ModelSummary, ResultBody, Row, SearchResponse};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a search response.
    fn format_response(&self, response: &SearchResponse) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;

    /// Format the type directory.
    fn format_models(&self, models: &[ModelSummary]) -> String;

    /// Format one type's fields.
    fn format_model(&self, model: &ModelDescriptor) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_response(&self, response: &SearchResponse) -> String {
        let mut output = response.summary.clone();

        match &response.body {
            body if body.is_empty() => output.push_str("\nNo results"),
            ResultBody::Table { columns, rows } => {
                let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                output.push('\n');
                output.push_str(&rows_table(&columns, rows).to_string());
            }
            ResultBody::Grouped { groups } => {
                for group in groups {
                    let parent = slice::from_ref(&group.parent);
                    output.push('\n');
                    output.push_str(&rows_table(&columns_of(parent), parent).to_string());
                    if !group.children.is_empty() {
                        output.push('\n');
                        output.push_str(
                            &rows_table(&columns_of(&group.children), &group.children).to_string(),
                        );
                    }
                }
            }
        }

        for diagnostic in &response.diagnostics {
            output.push_str(&format!("\nnote: {}", diagnostic));
        }
        output
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }

    fn format_models(&self, models: &[ModelSummary]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Model", "Label", "Synonyms"]);

        for model in models {
            table.add_row(vec![
                model.name.clone(),
                model.label.clone().unwrap_or_default(),
                model.synonyms.join(", "),
            ]);
        }

        format!("{}\n{} model(s)", table, models.len())
    }

    fn format_model(&self, model: &ModelDescriptor) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Field", "Type", "Label", "Target", "Required"]);

        for field in model.iter_fields() {
            table.add_row(vec![
                field.name.clone(),
                type_name(field.field_type),
                field.label.clone().unwrap_or_default(),
                field.target().unwrap_or_default().to_string(),
                if field.required { "yes" } else { "" }.to_string(),
            ]);
        }

        format!("{} ({})\n{}", model.display_label(), model.name, table)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_response(&self, response: &SearchResponse) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|e| self.format_error(&e.to_string()))
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({
            "error": error
        })
        .to_string()
    }

    fn format_models(&self, models: &[ModelSummary]) -> String {
        serde_json::to_string_pretty(models).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_model(&self, model: &ModelDescriptor) -> String {
        serde_json::to_string_pretty(model).unwrap_or_else(|_| "{}".to_string())
    }
}

/// CSV formatter.
///
/// Grouped results are flattened to one line per parent and child pair.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format_response(&self, response: &SearchResponse) -> String {
        match &response.body {
            ResultBody::Table { columns, rows } => {
                let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                let mut output = csv_line(columns.iter().map(|c| c.to_string()));
                for row in rows {
                    output.push_str(&csv_line(cells(&columns, row)));
                }
                output
            }
            ResultBody::Grouped { groups } => {
                let parents: Vec<Row> = groups.iter().map(|g| g.parent.clone()).collect();
                let children: Vec<Row> = groups.iter().flat_map(|g| g.children.clone()).collect();
                let parent_columns = columns_of(&parents);
                let child_columns = columns_of(&children);

                let mut output = csv_line(
                    parent_columns
                        .iter()
                        .chain(child_columns.iter())
                        .map(|c| c.to_string()),
                );
                for group in groups {
                    let parent = cells(&parent_columns, &group.parent);
                    if group.children.is_empty() {
                        let blanks = child_columns.iter().map(|_| String::new());
                        output.push_str(&csv_line(parent.into_iter().chain(blanks)));
                        continue;
                    }
                    for child in &group.children {
                        let line = parent.iter().cloned().chain(cells(&child_columns, child));
                        output.push_str(&csv_line(line));
                    }
                }
                output
            }
        }
    }

    fn format_error(&self, error: &str) -> String {
        format!("error\n\"{}\"", escape_csv(error))
    }

    fn format_models(&self, models: &[ModelSummary]) -> String {
        let mut output = csv_line(["model", "label"].map(String::from));
        for model in models {
            output.push_str(&csv_line([
                model.name.clone(),
                model.label.clone().unwrap_or_default(),
            ]));
        }
        output
    }

    fn format_model(&self, model: &ModelDescriptor) -> String {
        let mut output = csv_line(["field", "type", "target"].map(String::from));
        for field in model.iter_fields() {
            output.push_str(&csv_line([
                field.name.clone(),
                type_name(field.field_type),
                field.target().unwrap_or_default().to_string(),
            ]));
        }
        output
    }
}

/// Column names of `rows`, in first-seen order.
fn columns_of(rows: &[Row]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for key in rows.iter().flat_map(|row| row.keys()) {
        if !columns.contains(&key.as_str()) {
            columns.push(key);
        }
    }
    columns
}

/// Display strings of `row` for `columns`; missing columns are blank.
fn cells(columns: &[&str], row: &Row) -> Vec<String> {
    columns
        .iter()
        .map(|c| row.get(*c).map(|v| v.display()).unwrap_or_default())
        .collect()
}

fn rows_table(columns: &[&str], rows: &[Row]) -> Table {
    let mut table = Table::new();
    table.set_header(columns.iter().map(Cell::new).collect::<Vec<_>>());
    for row in rows {
        table.add_row(cells(columns, row));
    }
    table
}

fn type_name(field_type: FieldType) -> String {
    serde_json::to_value(field_type)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

fn csv_line(cells: impl IntoIterator<Item = String>) -> String {
    let mut line = cells
        .into_iter()
        .map(|cell| {
            if cell.contains([',', '"', '\n']) {
                format!("\"{}\"", escape_csv(&cell))
            } else {
                cell
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Escape a string for CSV.
fn escape_csv(s: &str) -> String {
    s.replace('"', "\"\"")
}
