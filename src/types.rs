//! Core domain types for cupstat
//!
//! Strong typing for the identifiers that flow through the whole pipeline
//! (printer names, user names, job ids) plus the parsed job record itself.
//! The newtypes serialize transparently as plain strings, so the JSON the
//! API emits looks exactly like the underlying log values.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strongly-typed printer queue name
///
/// # Examples
/// ```
/// use cupstat::types::PrinterName;
///
/// let printer = PrinterName::new("HP-LaserJet-4050");
/// assert_eq!(printer.as_str(), "HP-LaserJet-4050");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrinterName(String);

impl PrinterName {
    /// Create a new PrinterName from any string-like type
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrinterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PrinterName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strongly-typed account (user) name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    /// Create a new UserName
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strongly-typed print-job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Create a new JobId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp of a logged print job
///
/// Stored in UTC; the display timezone is applied only when deriving
/// calendar buckets (daily date, hour of day) or formatting output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogTimestamp(DateTime<Utc>);

impl LogTimestamp {
    /// Create a new LogTimestamp
    pub fn new(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the inner DateTime
    pub fn inner(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Calendar day in the given timezone
    pub fn date_in(&self, tz: &Tz) -> NaiveDate {
        self.0.with_timezone(tz).date_naive()
    }

    /// Hour of day (0-23) in the given timezone
    pub fn hour_in(&self, tz: &Tz) -> u32 {
        self.0.with_timezone(tz).hour()
    }

    /// Format in the given timezone
    pub fn format_in(&self, tz: &Tz, fmt: &str) -> String {
        self.0.with_timezone(tz).format(fmt).to_string()
    }
}

impl AsRef<DateTime<Utc>> for LogTimestamp {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.0
    }
}

/// Insertion-ordered string set
///
/// Used for the "printers used by this user" / "users of this printer"
/// collections: uniqueness is enforced on insert, iteration order is first
/// insertion order, and serialization is a plain JSON array.
///
/// # Examples
/// ```
/// use cupstat::types::OrderedSet;
///
/// let mut set = OrderedSet::new();
/// assert!(set.insert("laser"));
/// assert!(set.insert("inkjet"));
/// assert!(!set.insert("laser"));
/// assert_eq!(set.join(", "), "laser, inkjet");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedSet(Vec<String>);

impl OrderedSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning false if it was already present
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.0.iter().any(|existing| *existing == value) {
            false
        } else {
            self.0.push(value);
            true
        }
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the set holds no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Join values in insertion order
    pub fn join(&self, sep: &str) -> String {
        self.0.join(sep)
    }
}

impl<S: Into<String>> FromIterator<S> for OrderedSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

/// One normalized print-job entry from the page_log
///
/// Immutable once parsed. Field names on the wire are camelCase to match
/// the dashboard API contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Printer queue the job was accounted to
    pub printer: PrinterName,
    /// Submitting user
    pub user: UserName,
    /// CUPS job id
    pub job_id: JobId,
    /// Job timestamp from the bracketed log token
    pub date_time: LogTimestamp,
    /// Page number within the job
    pub page_number: u32,
    /// Number of copies; the quantity counted as "prints"
    pub num_copies: u32,
    /// job-billing attribute ("-" when absent)
    pub job_billing: String,
    /// Originating host ("-" when absent)
    pub host_name: String,
    /// Job title ("-" when absent)
    pub job_name: String,
    /// Media / paper size ("-" when absent)
    pub media: String,
    /// Sides attribute ("-" when absent)
    pub sides: String,
    /// Wall-clock time this record was parsed, informational only
    pub ingested_at: DateTime<Utc>,
}
