//! CSV report rendering
//!
//! Turns any aggregate collection into a delimited text table for download:
//! a fixed header line, one line per row, currency fixed at 2 decimals and
//! page rates at 4. Free-text fields are double-quoted with embedded quotes
//! doubled. The `complete` kind concatenates a summary block and every other
//! table, each under a section banner.

use crate::aggregation::{
    Aggregator, DailyUsage, HourlyUsage, PrinterUsage, SummaryStats, UserUsage,
};
use crate::cost::{CostAnalysis, CostConfig, Period, PrinterCost, analyze_costs};
use crate::error::CupstatError;
use crate::types::JobRecord;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::fmt::Write;
use std::str::FromStr;

/// Byte-order mark prepended to CSV downloads so spreadsheet tools detect
/// UTF-8
pub const UTF8_BOM: &str = "\u{feff}";

/// The report kinds the formatter can render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
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
    /// Everything, with a summary block and section banners
    Complete,
}

impl ReportKind {
    /// All kinds in their `complete`-report order
    pub const ALL: [ReportKind; 7] = [
        ReportKind::Jobs,
        ReportKind::Users,
        ReportKind::Printers,
        ReportKind::Daily,
        ReportKind::Hourly,
        ReportKind::Costs,
        ReportKind::Complete,
    ];
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportKind::Jobs => "jobs",
            ReportKind::Users => "users",
            ReportKind::Printers => "printers",
            ReportKind::Daily => "daily",
            ReportKind::Hourly => "hourly",
            ReportKind::Costs => "costs",
            ReportKind::Complete => "complete",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ReportKind {
    type Err = CupstatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jobs" => Ok(ReportKind::Jobs),
            "users" => Ok(ReportKind::Users),
            "printers" => Ok(ReportKind::Printers),
            "daily" => Ok(ReportKind::Daily),
            "hourly" => Ok(ReportKind::Hourly),
            "costs" => Ok(ReportKind::Costs),
            "complete" => Ok(ReportKind::Complete),
            other => Err(CupstatError::UnknownReport(other.to_string())),
        }
    }
}

/// Download filename for a report generated on `date`
pub fn filename(kind: ReportKind, date: NaiveDate) -> String {
    format!("{kind}_{}.csv", date.format("%Y-%m-%d"))
}

/// Quote a free-text field, doubling embedded quotes
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Everything the `complete` report needs in one place
#[derive(Debug, Clone)]
pub struct CompleteReport {
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// The requested date window
    pub period: Period,
    /// Headline counters
    pub summary: SummaryStats,
    /// Per-user table rows
    pub users: Vec<UserUsage>,
    /// Per-printer table rows
    pub printers: Vec<PrinterUsage>,
    /// Per-day table rows
    pub daily: Vec<DailyUsage>,
    /// Per-hour table rows (24 entries)
    pub hourly: Vec<HourlyUsage>,
    /// Per-printer cost rows
    pub costs: Vec<PrinterCost>,
}

/// Renders aggregate collections as CSV text
#[derive(Debug, Clone)]
pub struct CsvExporter {
    tz: Tz,
}

impl CsvExporter {
    /// Create an exporter formatting timestamps in the given timezone
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Job list table
    pub fn jobs(&self, jobs: &[&JobRecord]) -> String {
        let mut out = String::from("Job ID,User,Printer,DateTime,Pages,Copies,Job Name,Media,Sides\n");
        for job in jobs {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{},{}",
                job.job_id,
                csv_field(job.user.as_str()),
                csv_field(job.printer.as_str()),
                csv_field(&job.date_time.format_in(&self.tz, "%Y-%m-%d %H:%M:%S")),
                job.page_number,
                job.num_copies,
                csv_field(&job.job_name),
                csv_field(&job.media),
                csv_field(&job.sides),
            );
        }
        out
    }

    /// Per-user table
    pub fn users(&self, users: &[UserUsage]) -> String {
        let mut out = String::from("User,Total Prints,Total Jobs,Printers Used\n");
        for user in users {
            let _ = writeln!(
                out,
                "{},{},{},{}",
                csv_field(user.name.as_str()),
                user.total_prints,
                user.jobs,
                csv_field(&user.printers.join(", ")),
            );
        }
        out
    }

    /// Per-printer table
    pub fn printers(&self, printers: &[PrinterUsage]) -> String {
        let mut out = String::from("Printer,Total Prints,Total Jobs,Users\n");
        for printer in printers {
            let _ = writeln!(
                out,
                "{},{},{},{}",
                csv_field(printer.name.as_str()),
                printer.total_prints,
                printer.jobs,
                csv_field(&printer.users.join(", ")),
            );
        }
        out
    }

    /// Per-day table
    pub fn daily(&self, daily: &[DailyUsage]) -> String {
        let mut out = String::from("Date,Prints,Jobs\n");
        for day in daily {
            let _ = writeln!(
                out,
                "{},{},{}",
                day.date.format("%Y-%m-%d"),
                day.prints,
                day.jobs
            );
        }
        out
    }

    /// Per-hour table; callers pass the zero-filled 24-entry collection
    pub fn hourly(&self, hourly: &[HourlyUsage]) -> String {
        let mut out = String::from("Hour,Prints,Jobs\n");
        for bucket in hourly {
            let _ = writeln!(out, "{}:00,{},{}", bucket.hour, bucket.prints, bucket.jobs);
        }
        out
    }

    /// Per-printer cost table
    pub fn costs(&self, costs: &[PrinterCost]) -> String {
        let mut out = String::from("Printer,Total Prints,Cost/Page,Total Cost\n");
        for cost in costs {
            let _ = writeln!(
                out,
                "{},{},{:.4},{:.2}",
                csv_field(cost.name.as_str()),
                cost.total_prints,
                cost.cost_per_page,
                cost.total_cost,
            );
        }
        out
    }

    /// The full report: banner, summary block, then every table
    pub fn complete(&self, report: &CompleteReport) -> String {
        let mut out = String::from("=== CUPS PAGE LOG REPORT ===\n");
        let _ = writeln!(
            out,
            "Generated: {}",
            report
                .generated_at
                .with_timezone(&self.tz)
                .format("%Y-%m-%d %H:%M:%S %Z")
        );
        if report.period.start_date.is_some() || report.period.end_date.is_some() {
            let _ = writeln!(
                out,
                "Period: {} to {}",
                report.period.start_date.as_deref().unwrap_or("beginning"),
                report.period.end_date.as_deref().unwrap_or("today"),
            );
        }
        out.push('\n');

        out.push_str("=== SUMMARY ===\n");
        let _ = writeln!(out, "Total Prints,{}", report.summary.total_prints);
        let _ = writeln!(out, "Total Users,{}", report.summary.total_users);
        let _ = writeln!(out, "Total Printers,{}", report.summary.total_printers);
        let _ = writeln!(out, "Total Jobs,{}", report.summary.total_jobs);
        out.push('\n');

        out.push_str("=== USERS ===\n");
        out.push_str(&self.users(&report.users));
        out.push('\n');

        out.push_str("=== PRINTERS ===\n");
        out.push_str(&self.printers(&report.printers));
        out.push('\n');

        out.push_str("=== DAILY ===\n");
        out.push_str(&self.daily(&report.daily));
        out.push('\n');

        out.push_str("=== HOURLY ===\n");
        out.push_str(&self.hourly(&report.hourly));
        out.push('\n');

        out.push_str("=== COSTS ===\n");
        out.push_str(&self.costs(&report.costs));
        out
    }
}

/// Render one report kind over an already-filtered job subset
///
/// Shared by the HTTP export endpoints and the CLI `export` command. Job
/// rows are sorted newest first; the other tables keep the aggregator's
/// map order, and costs are sorted descending like the analysis endpoint.
pub fn render_report(
    kind: ReportKind,
    exporter: &CsvExporter,
    aggregator: &Aggregator,
    jobs: &[&JobRecord],
    config: &CostConfig,
    period: Period,
    last_update: DateTime<Utc>,
) -> String {
    let copied = || jobs.iter().copied();
    match kind {
        ReportKind::Jobs => {
            let mut sorted: Vec<&JobRecord> = jobs.to_vec();
            sorted.sort_by(|a, b| b.date_time.cmp(&a.date_time));
            exporter.jobs(&sorted)
        }
        ReportKind::Users => exporter.users(&aggregator.user_usage(copied())),
        ReportKind::Printers => exporter.printers(&aggregator.printer_usage(copied())),
        ReportKind::Daily => exporter.daily(&aggregator.daily_usage(copied())),
        ReportKind::Hourly => exporter.hourly(&aggregator.hourly_usage(copied())),
        ReportKind::Costs => {
            let analysis: CostAnalysis = analyze_costs(copied(), config, period);
            exporter.costs(&analysis.printer_costs)
        }
        ReportKind::Complete => {
            let analysis = analyze_costs(copied(), config, period.clone());
            let report = CompleteReport {
                generated_at: Utc::now(),
                period,
                summary: aggregator.summary(copied(), last_update),
                users: aggregator.user_usage(copied()),
                printers: aggregator.printer_usage(copied()),
                daily: aggregator.daily_usage(copied()),
                hourly: aggregator.hourly_usage(copied()),
                costs: analysis.printer_costs,
            };
            exporter.complete(&report)
        }
    }
}
