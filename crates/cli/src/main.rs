// stocksight CLI - inventory analysis over CSV snapshots

mod analyze;
mod exit_codes;
mod export;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "stocksight")]
#[command(about = "Inventory intelligence: coverage, ABC/XYZ, reorder and transfer suggestions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze stock and sales snapshots
    #[command(after_help = "\
Examples:
  stocksight analyze --stock stock.csv --sales sales.csv
  stocksight analyze --stock stock.csv --sales sales.csv --config analysis.toml --json
  stocksight analyze --stock stock.csv --sales sales.csv --window-days 90 --as-of 2026-03-31
  stocksight analyze --stock stock.csv --sales sales.csv --purchases-csv buy.csv --transfers-csv move.csv

Environment:
  RUST_LOG=debug   log pipeline stages to stderr (default: warn)")]
    Analyze(analyze::AnalyzeArgs),

    /// Validate an analysis config without running
    #[command(after_help = "\
Examples:
  stocksight validate analysis.toml")]
    Validate {
        /// Path to the analysis TOML file
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand = show usage
            eprintln!("Usage: stocksight <command> [options]");
            eprintln!("       stocksight --help for more information");
            Err(CliError {
                code: EXIT_USAGE,
                message: String::new(),
                hint: None,
            })
        }
        Some(Commands::Analyze(args)) => analyze::cmd_analyze(args),
        Some(Commands::Validate { config }) => analyze::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}
