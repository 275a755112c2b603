use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};

use sapledger::config::TableKind;
use sapledger::table::TABLE_TIME_FORMAT;

#[derive(Parser, Debug)]
#[command(name = "sapledger")]
#[command(about = "SAP batch-job log ledger", long_about = None)]
pub struct Cli {
    /// Configuration file (overrides SAPLEDGER_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one log file into the single-day jobs table
    Ingest(IngestArgs),
    /// Process every log file in a folder into the combined jobs table
    Batch(BatchArgs),
    /// Watch a folder and append new log files to the live jobs table
    Watch(WatchArgs),
    /// Concurrency timeline and longest-job diagnosis over a jobs table
    Analyze(AnalyzeArgs),
    /// Remove table rows whose timestamps fall inside a date range
    Purge(PurgeArgs),
}

#[derive(clap::Args, Debug)]
pub struct IngestArgs {
    /// Log file to process
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// Folder holding the log files (defaults to paths.logs_dir)
    pub folder: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct WatchArgs {
    /// Folder to watch (defaults to paths.live_logs_dir)
    pub folder: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Which jobs table to analyze
    #[arg(long, value_enum, default_value_t = TableChoice::Combined)]
    pub table: TableChoice,
}

#[derive(clap::Args, Debug)]
pub struct PurgeArgs {
    /// Which jobs table to purge
    #[arg(long, value_enum, default_value_t = TableChoice::Combined)]
    pub table: TableChoice,

    /// Start of the purge range, inclusive (YYYY-MM-DD HH:MM:SS)
    #[arg(long, value_parser = parse_table_datetime)]
    pub from: NaiveDateTime,

    /// End of the purge range, inclusive (YYYY-MM-DD HH:MM:SS)
    #[arg(long, value_parser = parse_table_datetime)]
    pub to: NaiveDateTime,

    /// Skip the pre-purge backup snapshot
    #[arg(long)]
    pub no_backup: bool,

    /// Purge without asking; otherwise only the plan is printed
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableChoice {
    Single,
    Combined,
    Live,
}

impl From<TableChoice> for TableKind {
    fn from(choice: TableChoice) -> Self {
        match choice {
            TableChoice::Single => TableKind::Single,
            TableChoice::Combined => TableKind::Combined,
            TableChoice::Live => TableKind::Live,
        }
    }
}

fn parse_table_datetime(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, TABLE_TIME_FORMAT)
        .map_err(|_| format!("invalid date-time {value:?}, expected YYYY-MM-DD HH:MM:SS"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_purge_command() {
        let cli = Cli::parse_from([
            "sapledger",
            "purge",
            "--table",
            "live",
            "--from",
            "2024-01-01 00:00:00",
            "--to",
            "2024-01-31 23:59:59",
            "--yes",
        ]);
        let Commands::Purge(args) = cli.command else {
            panic!("expected purge command");
        };
        assert_eq!(args.table, TableChoice::Live);
        assert!(args.yes);
        assert!(!args.no_backup);
        assert!(args.from < args.to);
    }

    #[test]
    fn rejects_malformed_purge_dates() {
        let result = Cli::try_parse_from([
            "sapledger",
            "purge",
            "--from",
            "01/15/2024",
            "--to",
            "2024-01-31 23:59:59",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn ingest_requires_a_file() {
        assert!(Cli::try_parse_from(["sapledger", "ingest"]).is_err());
        let cli = Cli::parse_from(["sapledger", "ingest", "day.LOG.txt"]);
        assert!(matches!(cli.command, Commands::Ingest(_)));
    }
}
