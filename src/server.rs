//! HTTP query API
//!
//! Thin plumbing over the core: every handler takes the current snapshot,
//! applies the request's filter, re-runs the aggregation over the subset and
//! serializes the result. The snapshot itself is only ever replaced
//! wholesale — [`AppState::rebuild`] builds a complete store and swaps one
//! `Arc` pointer under the write lock, so a request always reads a
//! fully-formed store, old or new, never a mix.

use crate::aggregation::{Aggregator, UsageSnapshot};
use crate::cli::parse_date_filter;
use crate::cost::{CostConfig, CostStore, Period, PrinterRate, analyze_costs};
use crate::data_loader::LogSource;
use crate::error::Result;
use crate::export::{CsvExporter, ReportKind, UTF8_BOM, filename, render_report};
use crate::filters::JobFilter;
use crate::parser::parse_or;
use crate::types::JobRecord;
use crate::watcher::LogWatcher;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use warp::Filter;

/// Default API port
pub const DEFAULT_PORT: u16 = 3001;

/// Default page size for the jobs endpoint
const DEFAULT_PAGE_LIMIT: usize = 50;

/// Shared state behind the HTTP surface
pub struct AppState {
    snapshot: RwLock<Arc<UsageSnapshot>>,
    costs: RwLock<CostConfig>,
    cost_store: CostStore,
    aggregator: Aggregator,
    source: LogSource,
}

impl AppState {
    /// Create the state; the cost config is loaded once here
    pub fn new(source: LogSource, aggregator: Aggregator, cost_store: CostStore) -> Self {
        let costs = cost_store.load();
        Self {
            snapshot: RwLock::new(Arc::new(UsageSnapshot::empty())),
            costs: RwLock::new(costs),
            cost_store,
            aggregator,
            source,
        }
    }

    /// The current snapshot; cheap, clones only the Arc
    pub async fn snapshot(&self) -> Arc<UsageSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Re-read the log and publish a fresh snapshot
    ///
    /// The new store is built completely before the write lock is taken;
    /// the lock covers only the pointer swap. Idempotent under repeated
    /// fire from the file watcher.
    pub async fn rebuild(&self) {
        let jobs = self.source.load_jobs().await;
        let snapshot = Arc::new(self.aggregator.aggregate(jobs));
        info!(
            "aggregate store rebuilt: {} jobs, {} prints",
            snapshot.jobs.len(),
            snapshot.total_prints
        );
        *self.snapshot.write().await = snapshot;
    }

    /// A copy of the current cost configuration
    pub async fn cost_config(&self) -> CostConfig {
        self.costs.read().await.clone()
    }

    /// Replace the rate table wholesale and persist it
    ///
    /// A failed write is logged and the in-memory table stays replaced.
    pub async fn replace_cost_config(&self, printers: BTreeMap<String, PrinterRate>) {
        let mut config = self.costs.write().await;
        config.replace_printers(printers);
        if let Err(e) = self.cost_store.save(&config) {
            error!(
                "failed to persist cost config to {}: {e}",
                self.cost_store.path().display()
            );
        }
    }

    /// The aggregation engine
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// The log source feeding rebuilds
    pub fn source(&self) -> &LogSource {
        &self.source
    }
}

/// Optional date window shared by every read endpoint
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    /// ISO start date (inclusive)
    pub start_date: Option<String>,
    /// ISO end date (inclusive)
    pub end_date: Option<String>,
}

/// Query parameters for the jobs and export endpoints
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsQuery {
    /// 1-based page number; non-numeric values coerce to 1
    pub page: Option<String>,
    /// Page size; non-numeric values coerce to 50
    pub limit: Option<String>,
    /// Exact-match user filter
    pub user: Option<String>,
    /// Exact-match printer filter
    pub printer: Option<String>,
    /// ISO start date (inclusive)
    pub start_date: Option<String>,
    /// ISO end date (inclusive)
    pub end_date: Option<String>,
}

/// Build a date filter from query strings
///
/// A malformed date is treated as an absent bound, never a client error.
fn date_filter(state: &AppState, start: Option<&str>, end: Option<&str>) -> JobFilter {
    let mut filter = JobFilter::new(state.aggregator.timezone().tz);
    if let Some(value) = start {
        match parse_date_filter(value) {
            Ok(date) => filter = filter.with_since(date),
            Err(_) => warn!("ignoring malformed startDate {value:?}"),
        }
    }
    if let Some(value) = end {
        match parse_date_filter(value) {
            Ok(date) => filter = filter.with_until(date),
            Err(_) => warn!("ignoring malformed endDate {value:?}"),
        }
    }
    filter
}

/// Coerce page/limit query strings, clamping both to at least 1
fn page_params(query: &JobsQuery) -> (usize, usize) {
    let page = parse_or(query.page.as_deref().unwrap_or(""), 1usize).max(1);
    let limit = parse_or(query.limit.as_deref().unwrap_or(""), DEFAULT_PAGE_LIMIT).max(1);
    (page, limit)
}

async fn stats_handler(
    query: RangeQuery,
    state: Arc<AppState>,
) -> std::result::Result<impl warp::Reply, Infallible> {
    let snapshot = state.snapshot().await;
    let filter = date_filter(&state, query.start_date.as_deref(), query.end_date.as_deref());
    let jobs = filter.apply(&snapshot.jobs);
    let stats = state
        .aggregator
        .summary(jobs.iter().copied(), snapshot.last_update);
    Ok(warp::reply::json(&stats))
}

async fn users_handler(
    query: RangeQuery,
    state: Arc<AppState>,
) -> std::result::Result<impl warp::Reply, Infallible> {
    let snapshot = state.snapshot().await;
    let filter = date_filter(&state, query.start_date.as_deref(), query.end_date.as_deref());
    let jobs = filter.apply(&snapshot.jobs);
    let mut users = state.aggregator.user_usage(jobs.iter().copied());
    users.sort_by(|a, b| b.total_prints.cmp(&a.total_prints));
    Ok(warp::reply::json(&users))
}

async fn printers_handler(
    query: RangeQuery,
    state: Arc<AppState>,
) -> std::result::Result<impl warp::Reply, Infallible> {
    let snapshot = state.snapshot().await;
    let filter = date_filter(&state, query.start_date.as_deref(), query.end_date.as_deref());
    let jobs = filter.apply(&snapshot.jobs);
    let mut printers = state.aggregator.printer_usage(jobs.iter().copied());
    printers.sort_by(|a, b| b.total_prints.cmp(&a.total_prints));
    Ok(warp::reply::json(&printers))
}

async fn jobs_handler(
    query: JobsQuery,
    state: Arc<AppState>,
) -> std::result::Result<impl warp::Reply, Infallible> {
    let snapshot = state.snapshot().await;
    let mut filter = date_filter(&state, query.start_date.as_deref(), query.end_date.as_deref());
    if let Some(user) = &query.user {
        filter = filter.with_user(user.clone());
    }
    if let Some(printer) = &query.printer {
        filter = filter.with_printer(printer.clone());
    }

    let mut jobs = filter.apply(&snapshot.jobs);
    jobs.sort_by(|a, b| b.date_time.cmp(&a.date_time));

    let (page, limit) = page_params(&query);
    let total = jobs.len();
    let total_pages = total.div_ceil(limit);
    let page_jobs: Vec<&JobRecord> = jobs
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Ok(warp::reply::json(&json!({
        "jobs": page_jobs,
        "total": total,
        "page": page,
        "totalPages": total_pages,
    })))
}

async fn daily_handler(
    query: RangeQuery,
    state: Arc<AppState>,
) -> std::result::Result<impl warp::Reply, Infallible> {
    let snapshot = state.snapshot().await;
    let filter = date_filter(&state, query.start_date.as_deref(), query.end_date.as_deref());
    let jobs = filter.apply(&snapshot.jobs);
    let daily = state.aggregator.daily_usage(jobs.iter().copied());
    Ok(warp::reply::json(&daily))
}

async fn hourly_handler(
    query: RangeQuery,
    state: Arc<AppState>,
) -> std::result::Result<impl warp::Reply, Infallible> {
    let snapshot = state.snapshot().await;
    let filter = date_filter(&state, query.start_date.as_deref(), query.end_date.as_deref());
    let jobs = filter.apply(&snapshot.jobs);
    let hourly = state.aggregator.hourly_usage(jobs.iter().copied());
    Ok(warp::reply::json(&hourly))
}

async fn cost_config_handler(
    state: Arc<AppState>,
) -> std::result::Result<impl warp::Reply, Infallible> {
    let config = state.cost_config().await;
    Ok(warp::reply::json(&config))
}

/// Body of `POST /api/costs/config`
#[derive(Debug, Deserialize)]
struct CostConfigUpdate {
    #[serde(default)]
    printers: BTreeMap<String, PrinterRate>,
}

async fn update_cost_config_handler(
    update: CostConfigUpdate,
    state: Arc<AppState>,
) -> std::result::Result<impl warp::Reply, Infallible> {
    state.replace_cost_config(update.printers).await;
    Ok(warp::reply::json(&json!({ "success": true })))
}

async fn cost_analysis_handler(
    query: RangeQuery,
    state: Arc<AppState>,
) -> std::result::Result<impl warp::Reply, Infallible> {
    let snapshot = state.snapshot().await;
    let filter = date_filter(&state, query.start_date.as_deref(), query.end_date.as_deref());
    let jobs = filter.apply(&snapshot.jobs);
    let config = state.cost_config().await;
    let period = Period {
        start_date: query.start_date.clone(),
        end_date: query.end_date.clone(),
    };
    let analysis = analyze_costs(jobs.iter().copied(), &config, period);
    Ok(warp::reply::json(&analysis))
}

async fn export_handler(
    kind: ReportKind,
    query: JobsQuery,
    state: Arc<AppState>,
) -> std::result::Result<impl warp::Reply, Infallible> {
    let snapshot = state.snapshot().await;
    let mut filter = date_filter(&state, query.start_date.as_deref(), query.end_date.as_deref());
    if kind == ReportKind::Jobs {
        if let Some(user) = &query.user {
            filter = filter.with_user(user.clone());
        }
        if let Some(printer) = &query.printer {
            filter = filter.with_printer(printer.clone());
        }
    }
    let jobs = filter.apply(&snapshot.jobs);

    let tz = state.aggregator.timezone().tz;
    let config = state.cost_config().await;
    let period = Period {
        start_date: query.start_date.clone(),
        end_date: query.end_date.clone(),
    };
    let csv = render_report(
        kind,
        &CsvExporter::new(tz),
        &state.aggregator,
        &jobs,
        &config,
        period,
        snapshot.last_update,
    );

    let today = chrono::Utc::now().with_timezone(&tz).date_naive();
    let disposition = format!("attachment; filename=\"{}\"", filename(kind, today));
    let reply = warp::reply::with_header(
        format!("{UTF8_BOM}{csv}"),
        "Content-Type",
        "text/csv; charset=utf-8",
    );
    Ok(warp::reply::with_header(
        reply,
        "Content-Disposition",
        disposition,
    ))
}

async fn health_handler() -> std::result::Result<impl warp::Reply, Infallible> {
    Ok(warp::reply::json(&json!({ "status": "ok" })))
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Assemble the full route tree
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let stats = warp::path!("api" / "stats")
        .and(warp::get())
        .and(warp::query::<RangeQuery>())
        .and(with_state(state.clone()))
        .and_then(stats_handler);

    let users = warp::path!("api" / "users")
        .and(warp::get())
        .and(warp::query::<RangeQuery>())
        .and(with_state(state.clone()))
        .and_then(users_handler);

    let printers = warp::path!("api" / "printers")
        .and(warp::get())
        .and(warp::query::<RangeQuery>())
        .and(with_state(state.clone()))
        .and_then(printers_handler);

    let jobs = warp::path!("api" / "jobs")
        .and(warp::get())
        .and(warp::query::<JobsQuery>())
        .and(with_state(state.clone()))
        .and_then(jobs_handler);

    let daily = warp::path!("api" / "daily-stats")
        .and(warp::get())
        .and(warp::query::<RangeQuery>())
        .and(with_state(state.clone()))
        .and_then(daily_handler);

    let hourly = warp::path!("api" / "hourly-stats")
        .and(warp::get())
        .and(warp::query::<RangeQuery>())
        .and(with_state(state.clone()))
        .and_then(hourly_handler);

    let cost_config = warp::path!("api" / "costs" / "config")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(cost_config_handler);

    let cost_config_update = warp::path!("api" / "costs" / "config")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(update_cost_config_handler);

    let cost_analysis = warp::path!("api" / "costs" / "analysis")
        .and(warp::get())
        .and(warp::query::<RangeQuery>())
        .and(with_state(state.clone()))
        .and_then(cost_analysis_handler);

    let export = warp::path!("api" / "export" / ReportKind)
        .and(warp::get())
        .and(warp::query::<JobsQuery>())
        .and(with_state(state.clone()))
        .and_then(export_handler);

    let health = warp::path!("health").and(warp::get()).and_then(health_handler);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "OPTIONS"]);

    stats
        .or(users)
        .or(printers)
        .or(jobs)
        .or(daily)
        .or(hourly)
        .or(cost_config)
        .or(cost_config_update)
        .or(cost_analysis)
        .or(export)
        .or(health)
        .with(cors)
        .with(warp::trace::request())
}

/// The long-running API server
pub struct Server;

impl Server {
    /// Load the log, start watching it, and serve until interrupted
    pub async fn run(state: Arc<AppState>, port: u16) -> Result<()> {
        state.rebuild().await;

        let watcher = match state.source().watch_path() {
            Some(path) => Some(LogWatcher::spawn(path, state.clone())),
            None => {
                info!("no log file to watch; data is static until restart");
                None
            }
        };

        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        info!("cupstat API listening on http://{addr}");

        tokio::select! {
            _ = warp::serve(routes(state.clone())).run(addr) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
            }
        }

        if let Some(watcher) = watcher {
            watcher.shutdown().await;
        }
        Ok(())
    }
}
