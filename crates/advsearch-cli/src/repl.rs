//! Interactive REPL implementation.

use std::path::PathBuf;

use advsearch::AdvancedSearch;
use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History};
use rustyline::{Config, Editor};

use crate::commands::{self, CommandResult};
use crate::executor::{self, QueryOptions};
use crate::formatter::{self, OutputFormat};

/// Get the history file path.
fn history_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".advsearch_history")
}

/// Run the interactive REPL.
pub async fn run(
    search: AdvancedSearch,
    options: QueryOptions,
    initial_format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut format = initial_format;

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(rl_config)?;

    let hist_path = history_path();
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    println!("advsearch - Ask a question, .help for commands, .exit to quit\n");

    loop {
        match rl.readline("advsearch> ") {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                if commands::is_command(line) {
                    match commands::handle_command(line, &search, format).await {
                        CommandResult::Exit => {
                            println!("Goodbye!");
                            break;
                        }
                        CommandResult::Output(msg) => {
                            println!("{}", msg);
                        }
                        CommandResult::SetFormat(fmt) => {
                            format = fmt;
                            println!("Output format set to {}", format);
                        }
                        CommandResult::ShowHistory => {
                            let history = rl.history();
                            let start = history.len().saturating_sub(20);
                            for (i, entry) in history.iter().skip(start).enumerate() {
                                println!("{:4}  {}", start + i + 1, entry);
                            }
                        }
                        CommandResult::Clear => {
                            print!("\x1B[2J\x1B[1;1H");
                        }
                    }
                    continue;
                }

                let formatter = formatter::create_formatter(format);
                match executor::execute(&search, line, &options, &*formatter).await {
                    Ok(output) => println!("{}", output),
                    Err(e) => println!("{}", formatter.format_error(&e.to_string())),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);
    Ok(())
}
