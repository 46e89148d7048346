//! cupstat - CUPS page_log usage and cost analytics

use clap::Parser;
use cupstat::{
    aggregation::Aggregator,
    cli::{Cli, Command, ReportTarget, SourceArgs, TimezoneArgs, parse_date_filter},
    cost::{CostStore, DEFAULT_COSTS_PATH, Period, analyze_costs},
    data_loader::{DEFAULT_LOG_PATH, FALLBACK_LOG_PATH, LogSource},
    error::Result,
    export::{CsvExporter, render_report},
    filters::JobFilter,
    output::get_formatter,
    server::{AppState, DEFAULT_PORT, Server},
    timezone::TimezoneConfig,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Resolve timezone from CLI arguments and log the choice
fn resolve_timezone(args: &TimezoneArgs) -> Result<TimezoneConfig> {
    let tz = TimezoneConfig::from_cli(args.timezone.as_deref(), args.utc)?;
    info!("using timezone {}", tz.display_name());
    Ok(tz)
}

/// Build the date/user/printer filter for one-shot commands
fn build_filter(
    tz: &TimezoneConfig,
    since: Option<&str>,
    until: Option<&str>,
    user: Option<&str>,
    printer: Option<&str>,
) -> Result<JobFilter> {
    let mut filter = JobFilter::new(tz.tz);
    if let Some(value) = since {
        filter = filter.with_since(parse_date_filter(value)?);
    }
    if let Some(value) = until {
        filter = filter.with_until(parse_date_filter(value)?);
    }
    if let Some(value) = user {
        filter = filter.with_user(value);
    }
    if let Some(value) = printer {
        filter = filter.with_printer(value);
    }
    Ok(filter)
}

fn log_source(source: &SourceArgs, tz: &TimezoneConfig) -> LogSource {
    LogSource::new(&source.log_path, &source.fallback_path, tz.tz)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. The --quiet flag overrides RUST_LOG.
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cupstat=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Some(Command::Serve {
            port,
            costs_path,
            source,
            timezone_args,
        }) => {
            let tz = resolve_timezone(&timezone_args)?;
            let state = Arc::new(AppState::new(
                log_source(&source, &tz),
                Aggregator::new(tz),
                CostStore::new(costs_path),
            ));
            Server::run(state, port).await?;
        }

        Some(Command::Report {
            kind,
            since,
            until,
            user,
            printer,
            json,
            costs_path,
            source,
            timezone_args,
        }) => {
            let tz = resolve_timezone(&timezone_args)?;
            let aggregator = Aggregator::new(tz);
            let jobs = log_source(&source, &tz).load_jobs().await;
            let filter = build_filter(
                &tz,
                since.as_deref(),
                until.as_deref(),
                user.as_deref(),
                printer.as_deref(),
            )?;
            let subset = filter.apply(&jobs);
            let formatter = get_formatter(json);

            let output = match kind {
                ReportTarget::Summary => {
                    let stats = aggregator.summary(subset.iter().copied(), chrono::Utc::now());
                    formatter.format_summary(&stats)
                }
                ReportTarget::Users => {
                    let mut users = aggregator.user_usage(subset.iter().copied());
                    users.sort_by(|a, b| b.total_prints.cmp(&a.total_prints));
                    formatter.format_users(&users)
                }
                ReportTarget::Printers => {
                    let mut printers = aggregator.printer_usage(subset.iter().copied());
                    printers.sort_by(|a, b| b.total_prints.cmp(&a.total_prints));
                    formatter.format_printers(&printers)
                }
                ReportTarget::Daily => {
                    formatter.format_daily(&aggregator.daily_usage(subset.iter().copied()))
                }
                ReportTarget::Hourly => {
                    formatter.format_hourly(&aggregator.hourly_usage(subset.iter().copied()))
                }
                ReportTarget::Costs => {
                    let config = CostStore::new(costs_path).load();
                    let analysis = analyze_costs(
                        subset.iter().copied(),
                        &config,
                        Period {
                            start_date: since.clone(),
                            end_date: until.clone(),
                        },
                    );
                    formatter.format_costs(&analysis)
                }
            };
            println!("{output}");
        }

        Some(Command::Export {
            kind,
            since,
            until,
            output,
            costs_path,
            source,
            timezone_args,
        }) => {
            let tz = resolve_timezone(&timezone_args)?;
            let aggregator = Aggregator::new(tz);
            let jobs = log_source(&source, &tz).load_jobs().await;
            let filter = build_filter(&tz, since.as_deref(), until.as_deref(), None, None)?;
            let subset = filter.apply(&jobs);

            let config = CostStore::new(costs_path).load();
            let csv = render_report(
                kind.into(),
                &CsvExporter::new(tz.tz),
                &aggregator,
                &subset,
                &config,
                Period {
                    start_date: since.clone(),
                    end_date: until.clone(),
                },
                chrono::Utc::now(),
            );

            match output {
                Some(path) => {
                    std::fs::write(&path, &csv)?;
                    info!("wrote {}", path.display());
                }
                None => print!("{csv}"),
            }
        }

        None => {
            // Bare `cupstat` serves with all defaults.
            let tz = TimezoneConfig::default();
            info!("using timezone {}", tz.display_name());
            let state = Arc::new(AppState::new(
                LogSource::new(DEFAULT_LOG_PATH, FALLBACK_LOG_PATH, tz.tz),
                Aggregator::new(tz),
                CostStore::new(DEFAULT_COSTS_PATH),
            ));
            Server::run(state, DEFAULT_PORT).await?;
        }
    }

    Ok(())
}
