//! Integration tests for the parse → filter → aggregate → cost pipeline

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::JobRecordBuilder;
use cupstat::{
    aggregation::Aggregator,
    cost::{CostConfig, Period, PrinterRate, analyze_costs},
    filters::JobFilter,
    parser::LineParser,
    timezone::TimezoneConfig,
    types::JobRecord,
};

fn aggregator() -> Aggregator {
    Aggregator::new(TimezoneConfig { tz: chrono_tz::UTC })
}

fn sample_jobs() -> Vec<JobRecord> {
    vec![
        JobRecordBuilder::new()
            .with_user("alice")
            .with_printer("HP-LaserJet-4050")
            .with_copies(2)
            .with_timestamp(Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap())
            .build(),
        JobRecordBuilder::new()
            .with_user("bob")
            .with_printer("HP-LaserJet-4050")
            .with_copies(3)
            .with_timestamp(Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap())
            .build(),
        JobRecordBuilder::new()
            .with_user("alice")
            .with_printer("Canon-Pixma-G3110")
            .with_copies(5)
            .with_timestamp(Utc.with_ymd_and_hms(2024, 6, 4, 9, 30, 0).unwrap())
            .build(),
        JobRecordBuilder::new()
            .with_user("carol")
            .with_printer("Brother-HL-L2350")
            .with_copies(1)
            .with_timestamp(Utc.with_ymd_and_hms(2024, 6, 5, 16, 45, 0).unwrap())
            .build(),
    ]
}

#[test]
fn test_prints_balance_across_groupings() {
    let jobs = sample_jobs();
    let agg = aggregator();

    let total: u64 = jobs.iter().map(|j| u64::from(j.num_copies)).sum();
    let by_user: u64 = agg.user_usage(&jobs).iter().map(|u| u.total_prints).sum();
    let by_printer: u64 = agg
        .printer_usage(&jobs)
        .iter()
        .map(|p| p.total_prints)
        .sum();
    let by_day: u64 = agg.daily_usage(&jobs).iter().map(|d| d.prints).sum();
    let by_hour: u64 = agg.hourly_usage(&jobs).iter().map(|h| h.prints).sum();

    assert_eq!(by_user, total);
    assert_eq!(by_printer, total);
    assert_eq!(by_day, total);
    assert_eq!(by_hour, total);
}

#[test]
fn test_invariant_holds_for_filtered_subsets() {
    let jobs = sample_jobs();
    let agg = aggregator();
    let filter = JobFilter::new(chrono_tz::UTC)
        .with_since(NaiveDate::from_ymd_opt(2024, 6, 4).unwrap())
        .with_until(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap());

    let subset = filter.apply(&jobs);
    assert_eq!(subset.len(), 2);

    let total: u64 = subset.iter().map(|j| u64::from(j.num_copies)).sum();
    let by_user: u64 = agg
        .user_usage(subset.iter().copied())
        .iter()
        .map(|u| u.total_prints)
        .sum();
    let by_printer: u64 = agg
        .printer_usage(subset.iter().copied())
        .iter()
        .map(|p| p.total_prints)
        .sum();
    assert_eq!(by_user, total);
    assert_eq!(by_printer, total);
    assert_eq!(total, 6);
}

#[test]
fn test_cost_analysis_over_filtered_subset() {
    let jobs = sample_jobs();
    let mut config = CostConfig::default();
    config.replace_printers(
        [
            ("HP-LaserJet-4050".to_string(), PrinterRate::new(0.05)),
            ("Canon-Pixma-G3110".to_string(), PrinterRate::new(0.20)),
        ]
        .into_iter()
        .collect(),
    );

    let filter =
        JobFilter::new(chrono_tz::UTC).with_until(NaiveDate::from_ymd_opt(2024, 6, 4).unwrap());
    let subset = filter.apply(&jobs);
    assert_eq!(subset.len(), 3);

    let analysis = analyze_costs(subset.iter().copied(), &config, Period::default());
    // 2 * 0.05 + 3 * 0.05 + 5 * 0.20 = 1.25
    assert!((analysis.total_cost - 1.25).abs() < 1e-9);
    assert_eq!(analysis.total_prints, 10);
    // Canon leads on cost despite fewer prints than the HP.
    assert_eq!(analysis.printer_costs[0].name.as_str(), "Canon-Pixma-G3110");
    // alice paid for both printers.
    assert_eq!(analysis.user_costs[0].name.as_str(), "alice");
    assert_eq!(
        analysis.user_costs[0].printers.iter().collect::<Vec<_>>(),
        vec!["HP-LaserJet-4050", "Canon-Pixma-G3110"]
    );
}

#[test]
fn test_parsed_lines_feed_the_same_pipeline() {
    let parser = LineParser::new(chrono_tz::UTC);
    let lines = [
        common::page_log_line(
            "HP-LaserJet-4050",
            "alice",
            101,
            "03/Jun/2024:08:12:45",
            1,
            2,
        ),
        common::page_log_line(
            "HP-LaserJet-4050",
            "bob",
            102,
            "03/Jun/2024:09:30:00",
            1,
            4,
        ),
        "noise".to_string(),
        common::page_log_line(
            "Canon-Pixma-G3110",
            "alice",
            103,
            "04/Jun/2024:10:00:00",
            1,
            1,
        ),
    ];

    let jobs: Vec<JobRecord> = lines.iter().filter_map(|l| parser.parse(l)).collect();
    assert_eq!(jobs.len(), 3);

    let snapshot = aggregator().aggregate(jobs);
    assert_eq!(snapshot.total_prints, 7);
    assert_eq!(snapshot.users.len(), 2);
    assert_eq!(snapshot.printers.len(), 2);
    assert_eq!(snapshot.daily.len(), 2);
}

#[test]
fn test_identity_filter_returns_everything() {
    let jobs = sample_jobs();
    let filter = JobFilter::new(chrono_tz::UTC);
    assert!(filter.is_identity());
    assert_eq!(filter.apply(&jobs).len(), jobs.len());
}
