//! CLI interface for cupstat
//!
//! Three subcommands: `serve` runs the HTTP API (and is the default when no
//! subcommand is given), `report` prints an aggregate to the terminal, and
//! `export` writes a CSV report.
//!
//! # Example
//!
//! ```bash
//! # Serve the API on the default port
//! cupstat serve
//!
//! # June's per-user report as a table
//! cupstat report users --since 2024-06-01 --until 2024-06-30
//!
//! # Full CSV report to a file
//! cupstat export complete --output june.csv
//! ```

use crate::cost::DEFAULT_COSTS_PATH;
use crate::data_loader::{DEFAULT_LOG_PATH, FALLBACK_LOG_PATH};
use crate::error::{CupstatError, Result};
use crate::export::ReportKind;
use crate::server::DEFAULT_PORT;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CUPS page_log usage and cost analytics
#[derive(Parser, Debug, Clone)]
#[command(name = "cupstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Subcommand to execute; defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Where the page_log comes from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Path to the CUPS page_log
    #[arg(long, default_value = DEFAULT_LOG_PATH)]
    pub log_path: PathBuf,

    /// Sample log used when the primary path does not exist
    #[arg(long, default_value = FALLBACK_LOG_PATH)]
    pub fallback_path: PathBuf,
}

/// Timezone selection shared by all subcommands
#[derive(Args, Debug, Clone)]
pub struct TimezoneArgs {
    /// Timezone for date grouping (e.g. "America/New_York"); defaults to the
    /// system timezone
    #[arg(long, short = 'z')]
    pub timezone: Option<String>,

    /// Use UTC for date grouping (overrides --timezone)
    #[arg(long)]
    pub utc: bool,
}

/// Reports available on the terminal
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTarget {
    /// Headline counters
    Summary,
    /// Per-user aggregates
    Users,
    /// Per-printer aggregates
    Printers,
    /// Per-day aggregates
    Daily,
    /// Per-hour aggregates
    Hourly,
    /// Cost analysis
    Costs,
}

/// Reports available for CSV export
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// Raw job list
    Jobs,
    /// Per-user aggregates
    Users,
    /// Per-printer aggregates
    Printers,
    /// Per-day aggregates
    Daily,
    /// Per-hour aggregates
    Hourly,
    /// Per-printer costs
    Costs,
    /// Everything in one file
    Complete,
}

impl From<ExportTarget> for ReportKind {
    fn from(target: ExportTarget) -> Self {
        match target {
            ExportTarget::Jobs => ReportKind::Jobs,
            ExportTarget::Users => ReportKind::Users,
            ExportTarget::Printers => ReportKind::Printers,
            ExportTarget::Daily => ReportKind::Daily,
            ExportTarget::Hourly => ReportKind::Hourly,
            ExportTarget::Costs => ReportKind::Costs,
            ExportTarget::Complete => ReportKind::Complete,
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, short = 'p', default_value_t = DEFAULT_PORT, env = "CUPSTAT_PORT")]
        port: u16,

        /// Cost configuration file
        #[arg(long, default_value = DEFAULT_COSTS_PATH)]
        costs_path: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        timezone_args: TimezoneArgs,
    },

    /// Print a usage report to the terminal
    Report {
        /// Report to print
        #[arg(value_enum)]
        kind: ReportTarget,

        /// Filter by start date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Filter by end date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Only include jobs from this user
        #[arg(long)]
        user: Option<String>,

        /// Only include jobs on this printer
        #[arg(long)]
        printer: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Cost configuration file (used by the costs report)
        #[arg(long, default_value = DEFAULT_COSTS_PATH)]
        costs_path: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        timezone_args: TimezoneArgs,
    },

    /// Write a CSV report
    Export {
        /// Report to export
        #[arg(value_enum)]
        kind: ExportTarget,

        /// Filter by start date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Filter by end date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Cost configuration file (used by the costs sections)
        #[arg(long, default_value = DEFAULT_COSTS_PATH)]
        costs_path: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        timezone_args: TimezoneArgs,
    },
}

/// Parse a YYYY-MM-DD date argument
pub fn parse_date_filter(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CupstatError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_filter() {
        assert_eq!(
            parse_date_filter("2024-06-03").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
        );
        assert_eq!(
            parse_date_filter(" 2024-06-03 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
        );
        assert!(parse_date_filter("03/06/2024").is_err());
        assert!(parse_date_filter("yesterday").is_err());
    }

    #[test]
    fn test_cli_parses_serve_defaults() {
        let cli = Cli::try_parse_from(["cupstat", "serve"]).unwrap();
        match cli.command {
            Some(Command::Serve { port, source, .. }) => {
                assert_eq!(port, DEFAULT_PORT);
                assert_eq!(source.log_path, PathBuf::from(DEFAULT_LOG_PATH));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_report_filters() {
        let cli = Cli::try_parse_from([
            "cupstat", "report", "users", "--since", "2024-06-01", "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Report {
                kind, since, json, ..
            }) => {
                assert_eq!(kind, ReportTarget::Users);
                assert_eq!(since.as_deref(), Some("2024-06-01"));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_export_kind() {
        let cli = Cli::try_parse_from(["cupstat", "export", "complete"]).unwrap();
        match cli.command {
            Some(Command::Export { kind, .. }) => {
                assert_eq!(ReportKind::from(kind), ReportKind::Complete)
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
