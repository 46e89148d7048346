//! Aggregation engine for print-usage statistics
//!
//! Folds a sequence of [`JobRecord`]s into grouped statistics: per user, per
//! printer, per calendar day and per hour of day, plus running totals. Two
//! entry points share the same single-pass accumulation:
//!
//! - [`Aggregator::aggregate`] builds the process-wide [`UsageSnapshot`]
//!   (the store rebuilt wholesale on every log (re)load);
//! - the `*_usage` / [`Aggregator::summary`] methods recompute transient
//!   aggregates over an already-filtered subset, which every query does —
//!   there is no incremental update path.
//!
//! Output ordering is not intrinsic to the aggregator; callers impose their
//! own sort (descending by prints for the API, map order for exports).

use crate::timezone::TimezoneConfig;
use crate::types::{JobRecord, OrderedSet, PrinterName, UserName};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Hours in the fixed hourly histogram
pub const HOURS_PER_DAY: u32 = 24;

/// Usage accumulated for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUsage {
    /// User name
    pub name: UserName,
    /// Sum of copies across the user's jobs
    pub total_prints: u64,
    /// Number of jobs
    pub jobs: u64,
    /// Printers this user touched, in first-use order
    pub printers: OrderedSet,
}

/// Usage accumulated for one printer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterUsage {
    /// Printer name
    pub name: PrinterName,
    /// Sum of copies across the printer's jobs
    pub total_prints: u64,
    /// Number of jobs
    pub jobs: u64,
    /// Users who printed here, in first-use order
    pub users: OrderedSet,
}

/// Usage accumulated for one calendar day (display timezone)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    /// Calendar day
    pub date: NaiveDate,
    /// Sum of copies
    pub prints: u64,
    /// Number of jobs
    pub jobs: u64,
}

/// Usage accumulated for one hour of day (display timezone)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyUsage {
    /// Hour of day, 0-23
    pub hour: u32,
    /// Sum of copies
    pub prints: u64,
    /// Number of jobs
    pub jobs: u64,
}

impl HourlyUsage {
    fn empty(hour: u32) -> Self {
        Self {
            hour,
            prints: 0,
            jobs: 0,
        }
    }
}

/// Headline counters for a (possibly filtered) job subset
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Sum of copies
    pub total_prints: u64,
    /// Distinct users
    pub total_users: usize,
    /// Distinct printers
    pub total_printers: usize,
    /// Number of jobs
    pub total_jobs: usize,
    /// When the backing snapshot was last rebuilt
    pub last_update: DateTime<Utc>,
}

/// The process-wide aggregate store
///
/// Built in full by one aggregation pass and published as an immutable
/// snapshot; it is replaced wholesale on every log (re)load and never
/// patched in place, so a reader always sees one fully-formed store.
#[derive(Debug, Clone)]
pub struct UsageSnapshot {
    /// Sum of copies across all kept records
    pub total_prints: u64,
    /// All job records in log-file order
    pub jobs: Vec<JobRecord>,
    /// Per-user aggregates
    pub users: BTreeMap<UserName, UserUsage>,
    /// Per-printer aggregates
    pub printers: BTreeMap<PrinterName, PrinterUsage>,
    /// Per-day aggregates
    pub daily: BTreeMap<NaiveDate, DailyUsage>,
    /// Per-hour aggregates (only hours with data)
    pub hourly: BTreeMap<u32, HourlyUsage>,
    /// When this snapshot was built
    pub last_update: DateTime<Utc>,
}

impl UsageSnapshot {
    /// A snapshot with no data, used before the first load completes
    pub fn empty() -> Self {
        Self {
            total_prints: 0,
            jobs: Vec::new(),
            users: BTreeMap::new(),
            printers: BTreeMap::new(),
            daily: BTreeMap::new(),
            hourly: BTreeMap::new(),
            last_update: Utc::now(),
        }
    }
}

/// Main aggregation engine
#[derive(Debug, Clone)]
pub struct Aggregator {
    tz: TimezoneConfig,
}

impl Aggregator {
    /// Create an aggregator grouping by the given display timezone
    pub fn new(tz: TimezoneConfig) -> Self {
        Self { tz }
    }

    /// The configured display timezone
    pub fn timezone(&self) -> &TimezoneConfig {
        &self.tz
    }

    /// Build a complete snapshot from the full job sequence
    ///
    /// O(n) single pass; buckets are created with zero counters on first
    /// sight and the printer/user sets are built by membership insertion.
    pub fn aggregate(&self, jobs: Vec<JobRecord>) -> UsageSnapshot {
        let users = self.users_map(&jobs);
        let printers = self.printers_map(&jobs);
        let daily = self.daily_map(&jobs);
        let hourly = self.hourly_map(&jobs);
        let total_prints = jobs.iter().map(|job| u64::from(job.num_copies)).sum();

        UsageSnapshot {
            total_prints,
            jobs,
            users,
            printers,
            daily,
            hourly,
            last_update: Utc::now(),
        }
    }

    /// Headline counters for a job subset
    pub fn summary<'a, I>(&self, jobs: I, last_update: DateTime<Utc>) -> SummaryStats
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        let mut total_prints = 0u64;
        let mut total_jobs = 0usize;
        let mut users: HashSet<&str> = HashSet::new();
        let mut printers: HashSet<&str> = HashSet::new();

        for job in jobs {
            total_prints += u64::from(job.num_copies);
            total_jobs += 1;
            users.insert(job.user.as_str());
            printers.insert(job.printer.as_str());
        }

        SummaryStats {
            total_prints,
            total_users: users.len(),
            total_printers: printers.len(),
            total_jobs,
            last_update,
        }
    }

    /// Per-user aggregates for a job subset, unsorted
    pub fn user_usage<'a, I>(&self, jobs: I) -> Vec<UserUsage>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        self.users_map(jobs).into_values().collect()
    }

    /// Per-printer aggregates for a job subset, unsorted
    pub fn printer_usage<'a, I>(&self, jobs: I) -> Vec<PrinterUsage>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        self.printers_map(jobs).into_values().collect()
    }

    /// Per-day aggregates for a job subset, ascending by date
    pub fn daily_usage<'a, I>(&self, jobs: I) -> Vec<DailyUsage>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        self.daily_map(jobs).into_values().collect()
    }

    /// Per-hour aggregates for a job subset
    ///
    /// Always exactly 24 entries indexed by hour, zero-filled where no job
    /// landed.
    pub fn hourly_usage<'a, I>(&self, jobs: I) -> Vec<HourlyUsage>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        let map = self.hourly_map(jobs);
        (0..HOURS_PER_DAY)
            .map(|hour| {
                map.get(&hour)
                    .cloned()
                    .unwrap_or_else(|| HourlyUsage::empty(hour))
            })
            .collect()
    }

    fn users_map<'a, I>(&self, jobs: I) -> BTreeMap<UserName, UserUsage>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        let mut map: BTreeMap<UserName, UserUsage> = BTreeMap::new();
        for job in jobs {
            let bucket = map.entry(job.user.clone()).or_insert_with(|| UserUsage {
                name: job.user.clone(),
                total_prints: 0,
                jobs: 0,
                printers: OrderedSet::new(),
            });
            bucket.total_prints += u64::from(job.num_copies);
            bucket.jobs += 1;
            bucket.printers.insert(job.printer.as_str());
        }
        map
    }

    fn printers_map<'a, I>(&self, jobs: I) -> BTreeMap<PrinterName, PrinterUsage>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        let mut map: BTreeMap<PrinterName, PrinterUsage> = BTreeMap::new();
        for job in jobs {
            let bucket = map
                .entry(job.printer.clone())
                .or_insert_with(|| PrinterUsage {
                    name: job.printer.clone(),
                    total_prints: 0,
                    jobs: 0,
                    users: OrderedSet::new(),
                });
            bucket.total_prints += u64::from(job.num_copies);
            bucket.jobs += 1;
            bucket.users.insert(job.user.as_str());
        }
        map
    }

    fn daily_map<'a, I>(&self, jobs: I) -> BTreeMap<NaiveDate, DailyUsage>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        let mut map: BTreeMap<NaiveDate, DailyUsage> = BTreeMap::new();
        for job in jobs {
            let date = job.date_time.date_in(&self.tz.tz);
            let bucket = map.entry(date).or_insert_with(|| DailyUsage {
                date,
                prints: 0,
                jobs: 0,
            });
            bucket.prints += u64::from(job.num_copies);
            bucket.jobs += 1;
        }
        map
    }

    fn hourly_map<'a, I>(&self, jobs: I) -> BTreeMap<u32, HourlyUsage>
    where
        I: IntoIterator<Item = &'a JobRecord>,
    {
        let mut map: BTreeMap<u32, HourlyUsage> = BTreeMap::new();
        for job in jobs {
            let hour = job.date_time.hour_in(&self.tz.tz);
            let bucket = map.entry(hour).or_insert_with(|| HourlyUsage::empty(hour));
            bucket.prints += u64::from(job.num_copies);
            bucket.jobs += 1;
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobId, LogTimestamp};
    use chrono::TimeZone;

    fn job(user: &str, printer: &str, copies: u32, hour: u32) -> JobRecord {
        let ts = Utc.with_ymd_and_hms(2024, 6, 3, hour, 15, 0).unwrap();
        JobRecord {
            printer: PrinterName::new(printer),
            user: UserName::new(user),
            job_id: JobId::new("1"),
            date_time: LogTimestamp::new(ts),
            page_number: 1,
            num_copies: copies,
            job_billing: "-".into(),
            host_name: "-".into(),
            job_name: "-".into(),
            media: "-".into(),
            sides: "-".into(),
            ingested_at: ts,
        }
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(TimezoneConfig { tz: chrono_tz::UTC })
    }

    fn sample_jobs() -> Vec<JobRecord> {
        vec![
            job("alice", "laser", 2, 8),
            job("bob", "laser", 3, 9),
            job("alice", "inkjet", 5, 8),
            job("carol", "laser", 1, 23),
        ]
    }

    #[test]
    fn test_snapshot_totals() {
        let snapshot = aggregator().aggregate(sample_jobs());
        assert_eq!(snapshot.total_prints, 11);
        assert_eq!(snapshot.jobs.len(), 4);
        assert_eq!(snapshot.users.len(), 3);
        assert_eq!(snapshot.printers.len(), 2);
        assert_eq!(snapshot.daily.len(), 1);
    }

    #[test]
    fn test_user_and_printer_prints_balance() {
        let jobs = sample_jobs();
        let agg = aggregator();
        let total: u64 = jobs.iter().map(|j| u64::from(j.num_copies)).sum();
        let by_user: u64 = agg.user_usage(&jobs).iter().map(|u| u.total_prints).sum();
        let by_printer: u64 = agg
            .printer_usage(&jobs)
            .iter()
            .map(|p| p.total_prints)
            .sum();
        assert_eq!(by_user, total);
        assert_eq!(by_printer, total);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let agg = aggregator();
        let first = agg.aggregate(sample_jobs());
        let second = agg.aggregate(sample_jobs());
        assert_eq!(first.total_prints, second.total_prints);
        assert_eq!(first.users, second.users);
        assert_eq!(first.printers, second.printers);
        assert_eq!(first.daily, second.daily);
        assert_eq!(first.hourly, second.hourly);
    }

    #[test]
    fn test_hourly_always_24_entries() {
        let agg = aggregator();
        let hours = agg.hourly_usage(&sample_jobs());
        assert_eq!(hours.len(), 24);
        for (i, bucket) in hours.iter().enumerate() {
            assert_eq!(bucket.hour, i as u32);
        }
        assert_eq!(hours[8].prints, 7);
        assert_eq!(hours[8].jobs, 2);
        assert_eq!(hours[23].jobs, 1);
        assert_eq!(hours[0].jobs, 0);

        let empty = agg.hourly_usage(&[]);
        assert_eq!(empty.len(), 24);
        assert!(empty.iter().all(|b| b.prints == 0 && b.jobs == 0));
    }

    #[test]
    fn test_sets_track_first_use_order() {
        let agg = aggregator();
        let users = agg.users_map(&sample_jobs());
        let alice = &users[&UserName::new("alice")];
        assert_eq!(alice.printers.iter().collect::<Vec<_>>(), vec![
            "laser", "inkjet"
        ]);
        let printers = agg.printers_map(&sample_jobs());
        let laser = &printers[&PrinterName::new("laser")];
        assert_eq!(laser.users.iter().collect::<Vec<_>>(), vec![
            "alice", "bob", "carol"
        ]);
    }

    #[test]
    fn test_summary_counts_distinct() {
        let agg = aggregator();
        let jobs = sample_jobs();
        let now = Utc::now();
        let stats = agg.summary(&jobs, now);
        assert_eq!(stats.total_prints, 11);
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_printers, 2);
        assert_eq!(stats.total_jobs, 4);
        assert_eq!(stats.last_update, now);
    }
}
