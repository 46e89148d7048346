//! page_log line parsing
//!
//! Converts one raw CUPS page_log line into a [`JobRecord`], or rejects it.
//! A line is rejected when it is blank, contains the `total` trailer marker,
//! or splits into fewer than ten whitespace-separated fields. Everything
//! else goes through parse-or-default: numeric tokens that fail to parse
//! fall back to 1, a missing or unparseable bracketed timestamp falls back
//! to "now". Rejection is never an error; the caller just skips the line.

use crate::types::{JobId, JobRecord, LogTimestamp, PrinterName, UserName};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use tracing::debug;

/// Minimum whitespace-separated fields for a well-formed accounting row
const MIN_FIELDS: usize = 10;

/// Substring that marks trailer/summary rows appended by accounting tools
const TRAILER_MARKER: &str = "total";

/// Timestamp formats carrying an explicit UTC offset
const OFFSET_FORMATS: &[&str] = &["%d/%b/%Y:%H:%M:%S %z", "%Y-%m-%dT%H:%M:%S%z"];

/// Offset-less timestamp formats, interpreted as wall-clock time in the
/// configured timezone
const NAIVE_FORMATS: &[&str] = &["%d/%b/%Y:%H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a token or fall back to a default
///
/// The single coercion helper used for every numeric field and query
/// parameter: a negative copies count fails the unsigned parse and takes
/// the default, exactly like a non-numeric token.
///
/// # Examples
/// ```
/// use cupstat::parser::parse_or;
///
/// assert_eq!(parse_or("3", 1u32), 3);
/// assert_eq!(parse_or("abc", 1u32), 1);
/// assert_eq!(parse_or("-2", 1u32), 1);
/// ```
pub fn parse_or<T: FromStr>(token: &str, default: T) -> T {
    token.trim().parse().unwrap_or(default)
}

/// Parser for CUPS page_log lines
///
/// Holds the timezone used to anchor offset-less timestamps.
#[derive(Debug, Clone)]
pub struct LineParser {
    tz: Tz,
}

impl LineParser {
    /// Create a parser anchored to the given timezone
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse one log line into a job record, or reject it with `None`
    pub fn parse(&self, line: &str) -> Option<JobRecord> {
        self.parse_at(line, Utc::now())
    }

    /// Like [`parse`](Self::parse) with an injected clock; `now` is both the
    /// fallback timestamp and the ingest stamp.
    pub fn parse_at(&self, line: &str, now: DateTime<Utc>) -> Option<JobRecord> {
        let line = line.trim();
        if line.is_empty() || line.contains(TRAILER_MARKER) {
            return None;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            debug!("dropping short page_log line ({} fields)", fields.len());
            return None;
        }

        // The positional timestamp field (index 3) is ignored; the job time
        // comes from a bracket scan over the whole line.
        let date_time = extract_bracketed(line)
            .and_then(|token| self.parse_timestamp(token))
            .unwrap_or(now);

        Some(JobRecord {
            printer: PrinterName::new(fields[0]),
            user: UserName::new(fields[1]),
            job_id: JobId::new(fields[2]),
            date_time: LogTimestamp::new(date_time),
            page_number: parse_or(fields[4], 1),
            num_copies: parse_or(fields[5], 1),
            job_billing: text_field(fields.get(6)),
            host_name: text_field(fields.get(7)),
            job_name: text_field(fields.get(8)),
            media: text_field(fields.get(9)),
            sides: text_field(fields.get(10)),
            ingested_at: now,
        })
    }

    fn parse_timestamp(&self, token: &str) -> Option<DateTime<Utc>> {
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(token, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(token, fmt)
                && let Some(local) = self.tz.from_local_datetime(&naive).earliest()
            {
                return Some(local.with_timezone(&Utc));
            }
        }
        debug!("unparseable page_log timestamp {token:?}");
        None
    }
}

/// Content of the first `[...]` group in the line, if any
fn extract_bracketed(line: &str) -> Option<&str> {
    let start = line.find('[')? + 1;
    let end = line[start..].find(']')? + start;
    Some(&line[start..end])
}

/// Free-text field with the log's `-` placeholder as default
fn text_field(field: Option<&&str>) -> String {
    match field {
        Some(value) if !value.is_empty() => (*value).to_string(),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parser() -> LineParser {
        LineParser::new(Tz::UTC)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    const LINE: &str =
        "HP-LaserJet-4050 alice 101 [03/Jun/2024:08:12:45] 1 2 - ws-alice.lan report-q2.pdf A4 one-sided";

    #[test]
    fn test_parses_well_formed_line() {
        let job = parser().parse_at(LINE, now()).unwrap();
        assert_eq!(job.printer.as_str(), "HP-LaserJet-4050");
        assert_eq!(job.user.as_str(), "alice");
        assert_eq!(job.job_id.as_str(), "101");
        assert_eq!(job.page_number, 1);
        assert_eq!(job.num_copies, 2);
        assert_eq!(job.job_billing, "-");
        assert_eq!(job.host_name, "ws-alice.lan");
        assert_eq!(job.job_name, "report-q2.pdf");
        assert_eq!(job.media, "A4");
        assert_eq!(job.sides, "one-sided");
        assert_eq!(
            *job.date_time.inner(),
            Utc.with_ymd_and_hms(2024, 6, 3, 8, 12, 45).unwrap()
        );
    }

    #[test]
    fn test_rejects_blank_and_trailer_lines() {
        assert!(parser().parse_at("", now()).is_none());
        assert!(parser().parse_at("   \t ", now()).is_none());
        assert!(
            parser()
                .parse_at("printer total 55 [03/Jun/2024:08:00:00] 1 1 - - - - -", now())
                .is_none()
        );
    }

    #[test]
    fn test_rejects_short_lines() {
        assert!(
            parser()
                .parse_at("HP alice 1 [03/Jun/2024:08:00:00] 1 2 - host job", now())
                .is_none()
        );
    }

    #[test]
    fn test_non_numeric_counts_default_to_one() {
        let line = "HP alice 1 [03/Jun/2024:08:00:00] x y - host job A4 two-sided";
        let job = parser().parse_at(line, now()).unwrap();
        assert_eq!(job.page_number, 1);
        assert_eq!(job.num_copies, 1);
    }

    #[test]
    fn test_negative_copies_take_default() {
        let line = "HP alice 1 [03/Jun/2024:08:00:00] 1 -3 - host job A4 two-sided";
        let job = parser().parse_at(line, now()).unwrap();
        assert_eq!(job.num_copies, 1);
    }

    #[test]
    fn test_missing_sides_defaults_to_dash() {
        let line = "HP alice 1 [03/Jun/2024:08:00:00] 1 2 - host job A4";
        let job = parser().parse_at(line, now()).unwrap();
        assert_eq!(job.sides, "-");
    }

    #[test]
    fn test_unparseable_timestamp_falls_back_to_now() {
        let line = "HP alice 1 [not-a-date] 1 2 - host job A4 one-sided";
        let job = parser().parse_at(line, now()).unwrap();
        assert_eq!(*job.date_time.inner(), now());
    }

    #[test]
    fn test_missing_brackets_fall_back_to_now() {
        let line = "HP alice 1 1717400000 1 2 - host job A4 one-sided";
        let job = parser().parse_at(line, now()).unwrap();
        assert_eq!(*job.date_time.inner(), now());
    }

    #[test]
    fn test_timestamp_with_offset() {
        let line = "HP alice 1 [03/Jun/2024:08:12:45 +0200] 1 2 - host job A4 one-sided";
        let job = parser().parse_at(line, now()).unwrap();
        assert_eq!(
            *job.date_time.inner(),
            Utc.with_ymd_and_hms(2024, 6, 3, 6, 12, 45).unwrap()
        );
    }

    #[test]
    fn test_offsetless_timestamp_uses_configured_zone() {
        let lisbon = LineParser::new("Europe/Lisbon".parse().unwrap());
        let line = "HP alice 1 [03/Jan/2024:08:00:00] 1 2 - host job A4 one-sided";
        let job = lisbon.parse_at(line, now()).unwrap();
        // Lisbon is UTC+0 in January.
        assert_eq!(
            *job.date_time.inner(),
            Utc.with_ymd_and_hms(2024, 1, 3, 8, 0, 0).unwrap()
        );
    }
}
