//! advsearch Command-Line Client
//!
//! Ask natural-language questions against a JSON fixture of records.

mod commands;
mod executor;
mod formatter;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use advsearch::{AdvancedSearch, MemoryBackend, SearchConfig};
use chrono::NaiveDate;
use clap::Parser;
use executor::QueryOptions;
use formatter::OutputFormat;
use tracing_subscriber::EnvFilter;

/// advsearch Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "advsearch")]
#[command(version, about = "Natural-language search over business records")]
pub struct Args {
    /// Fixture file with record types and rows
    #[arg(long)]
    pub fixture: PathBuf,

    /// Ask a single question and exit
    #[arg(short = 'c', long)]
    pub command: Option<String>,

    /// Ask the questions in a file, one per line
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Search this record type instead of guessing it
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum number of rows
    #[arg(long)]
    pub limit: Option<u32>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Backend call timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// How many relations deep related records are followed
    #[arg(long)]
    pub max_hops: Option<usize>,

    /// Truncate cell text to this many characters
    #[arg(long)]
    pub cell_width: Option<usize>,

    /// Reference date for relative dates (YYYY-MM-DD)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

impl Args {
    fn search_config(&self) -> SearchConfig {
        let mut config = SearchConfig::default().with_call_timeout(Duration::from_secs(self.timeout));
        if let Some(hops) = self.max_hops {
            config = config.with_max_hops(hops);
        }
        if let Some(width) = self.cell_width {
            config = config.with_max_cell_width(width);
        }
        config
    }

    fn query_options(&self) -> QueryOptions {
        QueryOptions {
            model: self.model.clone(),
            limit: self.limit,
        }
    }
}

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("advsearch=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = run(args).await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Arc::new(MemoryBackend::load(&args.fixture)?);
    let mut search = AdvancedSearch::with_backend(backend, args.search_config());
    if let Some(today) = args.today {
        search = search.with_today(today);
    }
    let options = args.query_options();

    if let Some(command) = &args.command {
        run_command_mode(&search, command, &options, args.format).await
    } else if let Some(file) = &args.file {
        run_script_mode(&search, file, &options, args.format).await
    } else {
        repl::run(search, options, args.format).await
    }
}

/// Ask a single question and exit.
async fn run_command_mode(
    search: &AdvancedSearch,
    question: &str,
    options: &QueryOptions,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let formatter = formatter::create_formatter(format);

    match executor::execute(search, question, options, &*formatter).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e.to_string()));
            std::process::exit(1);
        }
    }
}

/// Ask the questions in a file.
async fn run_script_mode(
    search: &AdvancedSearch,
    file: &PathBuf,
    options: &QueryOptions,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)?;
    let formatter = formatter::create_formatter(format);

    // Skip blank lines and comments
    let questions: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with("//") && !l.starts_with('#'))
        .collect();

    for question in questions {
        match executor::execute(search, question, options, &*formatter).await {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("Error asking '{}': {}", question, e);
            }
        }
    }

    Ok(())
}
