//! Terminal output formatting for the `report` command
//!
//! Two formatters behind one trait: an ASCII table for humans and JSON for
//! scripts. CSV lives in [`crate::export`]; this module is only the
//! interactive surface.

use crate::aggregation::{DailyUsage, HourlyUsage, PrinterUsage, SummaryStats, UserUsage};
use crate::cost::CostAnalysis;
use prettytable::{Table, format, row};
use serde_json::json;

/// Trait for report formatters
pub trait OutputFormatter {
    /// Format the headline counters
    fn format_summary(&self, stats: &SummaryStats) -> String;

    /// Format per-user aggregates
    fn format_users(&self, users: &[UserUsage]) -> String;

    /// Format per-printer aggregates
    fn format_printers(&self, printers: &[PrinterUsage]) -> String;

    /// Format per-day aggregates
    fn format_daily(&self, daily: &[DailyUsage]) -> String;

    /// Format per-hour aggregates
    fn format_hourly(&self, hourly: &[HourlyUsage]) -> String;

    /// Format a cost analysis
    fn format_costs(&self, analysis: &CostAnalysis) -> String;
}

/// Table formatter for human-readable terminal output
pub struct TableFormatter;

impl TableFormatter {
    fn table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }

    fn format_currency(amount: f64) -> String {
        format!("${amount:.2}")
    }
}

impl OutputFormatter for TableFormatter {
    fn format_summary(&self, stats: &SummaryStats) -> String {
        let mut table = Self::table();
        table.set_titles(row![b -> "Metric", b -> "Value"]);
        table.add_row(row!["Total Prints", stats.total_prints]);
        table.add_row(row!["Total Users", stats.total_users]);
        table.add_row(row!["Total Printers", stats.total_printers]);
        table.add_row(row!["Total Jobs", stats.total_jobs]);
        table.add_row(row![
            "Last Update",
            stats.last_update.format("%Y-%m-%d %H:%M:%S UTC")
        ]);
        table.to_string()
    }

    fn format_users(&self, users: &[UserUsage]) -> String {
        let mut table = Self::table();
        table.set_titles(row![b -> "User", b -> "Prints", b -> "Jobs", b -> "Printers Used"]);
        for user in users {
            table.add_row(row![
                user.name,
                r -> user.total_prints,
                r -> user.jobs,
                user.printers.join(", ")
            ]);
        }
        table.to_string()
    }

    fn format_printers(&self, printers: &[PrinterUsage]) -> String {
        let mut table = Self::table();
        table.set_titles(row![b -> "Printer", b -> "Prints", b -> "Jobs", b -> "Users"]);
        for printer in printers {
            table.add_row(row![
                printer.name,
                r -> printer.total_prints,
                r -> printer.jobs,
                printer.users.join(", ")
            ]);
        }
        table.to_string()
    }

    fn format_daily(&self, daily: &[DailyUsage]) -> String {
        let mut table = Self::table();
        table.set_titles(row![b -> "Date", b -> "Prints", b -> "Jobs"]);
        for day in daily {
            table.add_row(row![
                day.date.format("%Y-%m-%d"),
                r -> day.prints,
                r -> day.jobs
            ]);
        }
        table.to_string()
    }

    fn format_hourly(&self, hourly: &[HourlyUsage]) -> String {
        let mut table = Self::table();
        table.set_titles(row![b -> "Hour", b -> "Prints", b -> "Jobs"]);
        for bucket in hourly {
            table.add_row(row![
                format!("{}:00", bucket.hour),
                r -> bucket.prints,
                r -> bucket.jobs
            ]);
        }
        table.to_string()
    }

    fn format_costs(&self, analysis: &CostAnalysis) -> String {
        let mut out = String::new();

        let mut printers = Self::table();
        printers.set_titles(
            row![b -> "Printer", b -> "Prints", b -> "Jobs", b -> "Cost/Page", b -> "Cost"],
        );
        for cost in &analysis.printer_costs {
            printers.add_row(row![
                cost.name,
                r -> cost.total_prints,
                r -> cost.jobs,
                r -> format!("${:.4}", cost.cost_per_page),
                r -> Self::format_currency(cost.total_cost)
            ]);
        }
        out.push_str(&printers.to_string());
        out.push('\n');

        let mut users = Self::table();
        users.set_titles(row![b -> "User", b -> "Prints", b -> "Jobs", b -> "Cost"]);
        for cost in &analysis.user_costs {
            users.add_row(row![
                cost.name,
                r -> cost.total_prints,
                r -> cost.jobs,
                r -> Self::format_currency(cost.total_cost)
            ]);
        }
        out.push_str(&users.to_string());

        out.push_str(&format!(
            "\nTOTAL: {} prints, {}\n",
            analysis.total_prints,
            Self::format_currency(analysis.total_cost)
        ));
        out
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    fn pretty(value: serde_json::Value) -> String {
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_summary(&self, stats: &SummaryStats) -> String {
        Self::pretty(json!(stats))
    }

    fn format_users(&self, users: &[UserUsage]) -> String {
        Self::pretty(json!(users))
    }

    fn format_printers(&self, printers: &[PrinterUsage]) -> String {
        Self::pretty(json!(printers))
    }

    fn format_daily(&self, daily: &[DailyUsage]) -> String {
        Self::pretty(json!(daily))
    }

    fn format_hourly(&self, hourly: &[HourlyUsage]) -> String {
        Self::pretty(json!(hourly))
    }

    fn format_costs(&self, analysis: &CostAnalysis) -> String {
        Self::pretty(json!(analysis))
    }
}

/// Pick a formatter for the requested output mode
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderedSet, UserName};

    fn users() -> Vec<UserUsage> {
        vec![UserUsage {
            name: UserName::new("alice"),
            total_prints: 12,
            jobs: 4,
            printers: ["laser"].into_iter().collect::<OrderedSet>(),
        }]
    }

    #[test]
    fn test_table_formatter_users() {
        let output = TableFormatter.format_users(&users());
        assert!(output.contains("alice"));
        assert!(output.contains("12"));
        assert!(output.contains("laser"));
    }

    #[test]
    fn test_json_formatter_users() {
        let output = JsonFormatter.format_users(&users());
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["name"], "alice");
        assert_eq!(parsed[0]["totalPrints"], 12);
        assert_eq!(parsed[0]["printers"][0], "laser");
    }
}
