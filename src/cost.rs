//! Cost attribution
//!
//! Joins job records against the configured per-printer page rate to produce
//! monetary totals per printer and per user. The rate table is replaced
//! wholesale (never merged) and persisted to a JSON file on every update;
//! printers absent from the table cost 0 per page.

use crate::error::Result;
use crate::types::{JobRecord, OrderedSet, PrinterName, UserName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default location of the persisted rate table
pub const DEFAULT_COSTS_PATH: &str = "./costs-config.json";

/// Per-printer page rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterRate {
    /// Cost per printed page, non-negative
    #[serde(default, deserialize_with = "lenient_rate")]
    pub cost_per_page: f64,
}

impl PrinterRate {
    /// Create a rate, coercing negative or non-finite values to 0
    pub fn new(cost_per_page: f64) -> Self {
        Self {
            cost_per_page: sanitize_rate(cost_per_page),
        }
    }
}

/// Accept numbers and numeric strings; anything else becomes rate 0
fn lenient_rate<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let rate = match &value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(sanitize_rate(rate))
}

fn sanitize_rate(rate: f64) -> f64 {
    if rate.is_finite() && rate >= 0.0 {
        rate
    } else {
        0.0
    }
}

/// The persisted cost configuration: printer name → page rate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostConfig {
    /// Rate table keyed by printer name
    #[serde(default)]
    pub printers: BTreeMap<String, PrinterRate>,
    /// When the table was last replaced
    #[serde(default = "Utc::now")]
    pub last_update: DateTime<Utc>,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            printers: BTreeMap::new(),
            last_update: Utc::now(),
        }
    }
}

impl CostConfig {
    /// Page rate for a printer, 0 when not configured
    pub fn rate_for(&self, printer: &PrinterName) -> f64 {
        self.printers
            .get(printer.as_str())
            .map(|rate| rate.cost_per_page)
            .unwrap_or(0.0)
    }

    /// Replace the whole rate table and stamp the update time
    ///
    /// Rates are sanitized again here so callers constructing
    /// [`PrinterRate`] values directly get the same coercion as the API.
    pub fn replace_printers(&mut self, printers: BTreeMap<String, PrinterRate>) {
        self.printers = printers;
        for rate in self.printers.values_mut() {
            rate.cost_per_page = sanitize_rate(rate.cost_per_page);
        }
        self.last_update = Utc::now();
    }
}

/// Loads and saves the cost configuration file
#[derive(Debug, Clone)]
pub struct CostStore {
    path: PathBuf,
}

impl CostStore {
    /// Create a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, falling back to the empty default
    ///
    /// A missing file is the normal first-run case; an unreadable or
    /// malformed file is logged and also yields the default. Never fatal.
    pub fn load(&self) -> CostConfig {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(config) => {
                    debug!("loaded cost config from {}", self.path.display());
                    config
                }
                Err(e) => {
                    warn!(
                        "malformed cost config {}: {e}; starting with empty rates",
                        self.path.display()
                    );
                    CostConfig::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CostConfig::default(),
            Err(e) => {
                warn!(
                    "cannot read cost config {}: {e}; starting with empty rates",
                    self.path.display()
                );
                CostConfig::default()
            }
        }
    }

    /// Persist the configuration as pretty-printed JSON
    pub fn save(&self, config: &CostConfig) -> Result<()> {
        let data = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Cost accumulated for one printer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterCost {
    /// Printer name
    pub name: PrinterName,
    /// Sum of copies
    pub total_prints: u64,
    /// Attributed cost
    pub total_cost: f64,
    /// Configured page rate (0 when unconfigured)
    pub cost_per_page: f64,
    /// Number of jobs
    pub jobs: u64,
}

/// Cost accumulated for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCost {
    /// User name
    pub name: UserName,
    /// Sum of copies
    pub total_prints: u64,
    /// Attributed cost
    pub total_cost: f64,
    /// Number of jobs
    pub jobs: u64,
    /// Printers this user touched, in first-use order
    pub printers: OrderedSet,
}

/// The date window a cost analysis covers, echoed back verbatim
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// Requested start date, if any
    pub start_date: Option<String>,
    /// Requested end date, if any
    pub end_date: Option<String>,
}

/// Full cost breakdown for a (filtered) job subset
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostAnalysis {
    /// Sum of all job costs
    pub total_cost: f64,
    /// Sum of copies
    pub total_prints: u64,
    /// Per-printer costs, descending by cost
    pub printer_costs: Vec<PrinterCost>,
    /// Per-user costs, descending by cost
    pub user_costs: Vec<UserCost>,
    /// The analyzed window
    pub period: Period,
}

/// Attribute costs to a job subset
///
/// Each job contributes `num_copies × rate(printer)`. Grouping preserves
/// encounter order and the final stable sort is descending by cost, so
/// ties keep encounter order.
pub fn analyze_costs<'a, I>(jobs: I, config: &CostConfig, period: Period) -> CostAnalysis
where
    I: IntoIterator<Item = &'a JobRecord>,
{
    let mut printer_costs: Vec<PrinterCost> = Vec::new();
    let mut printer_index: HashMap<&'a str, usize> = HashMap::new();
    let mut user_costs: Vec<UserCost> = Vec::new();
    let mut user_index: HashMap<&'a str, usize> = HashMap::new();
    let mut total_cost = 0.0;
    let mut total_prints = 0u64;

    for job in jobs {
        let copies = u64::from(job.num_copies);
        let rate = config.rate_for(&job.printer);
        let job_cost = copies as f64 * rate;

        let p = *printer_index
            .entry(job.printer.as_str())
            .or_insert_with(|| {
                printer_costs.push(PrinterCost {
                    name: job.printer.clone(),
                    total_prints: 0,
                    total_cost: 0.0,
                    cost_per_page: rate,
                    jobs: 0,
                });
                printer_costs.len() - 1
            });
        printer_costs[p].total_prints += copies;
        printer_costs[p].total_cost += job_cost;
        printer_costs[p].jobs += 1;

        let u = *user_index.entry(job.user.as_str()).or_insert_with(|| {
            user_costs.push(UserCost {
                name: job.user.clone(),
                total_prints: 0,
                total_cost: 0.0,
                jobs: 0,
                printers: OrderedSet::new(),
            });
            user_costs.len() - 1
        });
        user_costs[u].total_prints += copies;
        user_costs[u].total_cost += job_cost;
        user_costs[u].jobs += 1;
        user_costs[u].printers.insert(job.printer.as_str());

        total_cost += job_cost;
        total_prints += copies;
    }

    printer_costs.sort_by(|a, b| cost_desc(a.total_cost, b.total_cost));
    user_costs.sort_by(|a, b| cost_desc(a.total_cost, b.total_cost));

    CostAnalysis {
        total_cost,
        total_prints,
        printer_costs,
        user_costs,
        period,
    }
}

fn cost_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
