//! cupstat - CUPS page_log usage and cost analytics
//!
//! This library provides functionality to:
//! - Parse CUPS page_log accounting lines into structured job records
//! - Aggregate records into per-user, per-printer, daily and hourly statistics
//! - Attribute costs from a configurable per-printer page rate table
//! - Serve the aggregates over an HTTP query API with CSV export
//! - Rebuild the in-memory snapshot whenever the log file changes
//!
//! # Examples
//!
//! ```no_run
//! use cupstat::{
//!     aggregation::Aggregator,
//!     data_loader::{DEFAULT_LOG_PATH, FALLBACK_LOG_PATH, LogSource},
//!     timezone::TimezoneConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> cupstat::Result<()> {
//!     let tz = TimezoneConfig::default();
//!     let source = LogSource::new(DEFAULT_LOG_PATH, FALLBACK_LOG_PATH, tz.tz);
//!     let aggregator = Aggregator::new(tz);
//!
//!     let jobs = source.load_jobs().await;
//!     let snapshot = aggregator.aggregate(jobs);
//!     println!("{} prints in {} jobs", snapshot.total_prints, snapshot.jobs.len());
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod cost;
pub mod data_loader;
pub mod error;
pub mod export;
pub mod filters;
pub mod output;
pub mod parser;
pub mod server;
pub mod timezone;
pub mod types;
pub mod watcher;

// Re-export commonly used types
pub use error::{CupstatError, Result};
pub use types::{JobId, JobRecord, LogTimestamp, OrderedSet, PrinterName, UserName};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
