//! Common test utilities for cupstat integration tests
//!
//! Provides a builder for in-memory job records and a renderer for raw
//! page_log lines, so tests can exercise either the parsed or the textual
//! side of the pipeline.
//!
//! Each integration binary uses a different subset of these helpers.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use cupstat::types::{JobId, JobRecord, LogTimestamp, PrinterName, UserName};

/// Printers used across tests
pub const TEST_PRINTERS: &[&str] = &["HP-LaserJet-4050", "Canon-Pixma-G3110", "Brother-HL-L2350"];

/// Users used across tests
pub const TEST_USERS: &[&str] = &["alice", "bob", "carol", "dave"];

/// Builder for test [`JobRecord`] instances
pub struct JobRecordBuilder {
    printer: String,
    user: String,
    job_id: String,
    timestamp: DateTime<Utc>,
    page_number: u32,
    num_copies: u32,
    job_name: String,
}

impl JobRecordBuilder {
    /// Create a builder with sensible defaults
    pub fn new() -> Self {
        Self {
            printer: "HP-LaserJet-4050".to_string(),
            user: "alice".to_string(),
            job_id: "1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
            page_number: 1,
            num_copies: 1,
            job_name: "doc.pdf".to_string(),
        }
    }

    pub fn with_printer(mut self, printer: &str) -> Self {
        self.printer = printer.to_string();
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    pub fn with_job_id(mut self, id: &str) -> Self {
        self.job_id = id.to_string();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_copies(mut self, copies: u32) -> Self {
        self.num_copies = copies;
        self
    }

    pub fn with_job_name(mut self, name: &str) -> Self {
        self.job_name = name.to_string();
        self
    }

    pub fn build(self) -> JobRecord {
        JobRecord {
            printer: PrinterName::new(self.printer),
            user: UserName::new(self.user),
            job_id: JobId::new(self.job_id),
            date_time: LogTimestamp::new(self.timestamp),
            page_number: self.page_number,
            num_copies: self.num_copies,
            job_billing: "-".to_string(),
            host_name: "ws-test.lan".to_string(),
            job_name: self.job_name,
            media: "A4".to_string(),
            sides: "one-sided".to_string(),
            ingested_at: self.timestamp,
        }
    }
}

impl Default for JobRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one well-formed page_log line
pub fn page_log_line(
    printer: &str,
    user: &str,
    job_id: u32,
    timestamp: &str,
    page: u32,
    copies: u32,
) -> String {
    format!(
        "{printer} {user} {job_id} [{timestamp}] {page} {copies} - ws-{user}.lan doc-{job_id}.pdf A4 one-sided"
    )
}
