//! Job filtering
//!
//! Restricts a job collection to an inclusive calendar-day window, and
//! optionally to a single user and/or printer, before aggregation. The
//! window covers `[start 00:00:00.000, end 23:59:59.999]` in the display
//! timezone, which is exactly a comparison on the job's local calendar day.
//! When a window is active, a missing bound takes its default: epoch start
//! for the lower bound, the end of the current day for the upper, so a job
//! stamped in the future is excluded from any dated query. Filtering is
//! applied fresh on every query; nothing is cached.

use crate::types::JobRecord;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

/// Filter over parsed job records
///
/// All criteria are optional; with none set the filter is the identity.
///
/// # Examples
/// ```
/// use cupstat::filters::JobFilter;
/// use chrono::NaiveDate;
///
/// let filter = JobFilter::new(chrono_tz::UTC)
///     .with_since(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
///     .with_until(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
///     .with_user("alice");
/// ```
#[derive(Debug, Clone)]
pub struct JobFilter {
    /// Start date (inclusive)
    pub since: Option<NaiveDate>,
    /// End date (inclusive)
    pub until: Option<NaiveDate>,
    /// Exact-match user filter
    pub user: Option<String>,
    /// Exact-match printer filter
    pub printer: Option<String>,
    tz: Tz,
}

impl JobFilter {
    /// Create an unrestricted filter for the given display timezone
    pub fn new(tz: Tz) -> Self {
        Self {
            since: None,
            until: None,
            user: None,
            printer: None,
            tz,
        }
    }

    /// Set the start date (inclusive)
    pub fn with_since(mut self, date: NaiveDate) -> Self {
        self.since = Some(date);
        self
    }

    /// Set the end date (inclusive)
    pub fn with_until(mut self, date: NaiveDate) -> Self {
        self.until = Some(date);
        self
    }

    /// Keep only jobs from this user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Keep only jobs on this printer
    pub fn with_printer(mut self, printer: impl Into<String>) -> Self {
        self.printer = Some(printer.into());
        self
    }

    /// True when no criterion is set
    pub fn is_identity(&self) -> bool {
        self.since.is_none()
            && self.until.is_none()
            && self.user.is_none()
            && self.printer.is_none()
    }

    /// Check whether a job passes the filter
    pub fn matches(&self, job: &JobRecord) -> bool {
        if self.since.is_some() || self.until.is_some() {
            let day = job.date_time.date_in(&self.tz);
            if let Some(since) = self.since
                && day < since
            {
                return false;
            }
            let until = self
                .until
                .unwrap_or_else(|| Utc::now().with_timezone(&self.tz).date_naive());
            if day > until {
                return false;
            }
        }

        if let Some(user) = &self.user
            && job.user.as_str() != user
        {
            return false;
        }
        if let Some(printer) = &self.printer
            && job.printer.as_str() != printer
        {
            return false;
        }

        true
    }

    /// Select the matching subset, preserving log order
    pub fn apply<'a>(&self, jobs: &'a [JobRecord]) -> Vec<&'a JobRecord> {
        jobs.iter().filter(|job| self.matches(job)).collect()
    }
}
