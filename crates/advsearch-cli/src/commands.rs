//! REPL dot-command handling.

use advsearch::AdvancedSearch;

use crate::formatter::{self, OutputFormat};

/// Result of executing a command.
#[derive(Debug)]
pub enum CommandResult {
    /// Exit the REPL.
    Exit,
    /// Output to display.
    Output(String),
    /// Change the output format.
    SetFormat(OutputFormat),
    /// Show history.
    ShowHistory,
    /// Clear screen.
    Clear,
}

/// Parse and execute a dot-command.
pub async fn handle_command(
    line: &str,
    search: &AdvancedSearch,
    format: OutputFormat,
) -> CommandResult {
    let line = line.trim();
    let mut parts = line.splitn(2, ' ');
    let command = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());
    let formatter = formatter::create_formatter(format);

    match command.as_str() {
        ".exit" | ".quit" | ".q" => CommandResult::Exit,

        ".help" | ".h" | ".?" => CommandResult::Output(get_help()),

        ".clear" | ".cls" => CommandResult::Clear,

        ".history" => CommandResult::ShowHistory,

        ".format" => match arg {
            Some(fmt) => match fmt.to_lowercase().as_str() {
                "table" => CommandResult::SetFormat(OutputFormat::Table),
                "json" => CommandResult::SetFormat(OutputFormat::Json),
                "csv" => CommandResult::SetFormat(OutputFormat::Csv),
                _ => CommandResult::Output(format!(
                    "Unknown format '{}'. Use: table, json, csv",
                    fmt
                )),
            },
            None => CommandResult::Output(format!("Current format: {}", format)),
        },

        ".models" => match search.catalog().list_models().await {
            Ok(models) => CommandResult::Output(formatter.format_models(&models)),
            Err(e) => CommandResult::Output(formatter.format_error(&e.to_string())),
        },

        ".describe" => match arg {
            Some(model) => match search.catalog().describe(model).await {
                Ok(descriptor) => CommandResult::Output(formatter.format_model(&descriptor)),
                Err(e) => CommandResult::Output(formatter.format_error(&e.to_string())),
            },
            None => CommandResult::Output("Usage: .describe <model>".to_string()),
        },

        ".refresh" => {
            match arg {
                Some(model) => search.catalog().refresh(model),
                None => search.catalog().refresh_all(),
            }
            CommandResult::Output("Schema cache cleared".to_string())
        }

        ".stats" => {
            let stats = search.catalog().stats();
            CommandResult::Output(format!(
                "Schema cache: {} hit(s), {} miss(es), {} fetch(es), hit rate {:.0}%",
                stats.hits(),
                stats.misses(),
                stats.fetches(),
                stats.hit_rate() * 100.0
            ))
        }

        _ => CommandResult::Output(format!("Unknown command: {}", command)),
    }
}

/// Check if a line is a dot-command.
pub fn is_command(line: &str) -> bool {
    line.trim().starts_with('.')
}

/// Get help text for REPL commands.
fn get_help() -> String {
    r#"REPL Commands
=============

.models               List the searchable record types
.describe <model>     Show the fields of a record type
.refresh [model]      Drop cached schemas
.stats                Show schema cache statistics
.format [type]        Get or set output format (table, json, csv)
.history              Show question history
.clear                Clear the screen
.help                 Show this help message
.exit / .quit         Exit the REPL

Anything else is asked as a question:
  List all unpaid bills with vendor details
  List all sales orders for customer Example Corp
  quotations over 1,000 in September
"#
    .to_string()
}
