//! Shared domain types.
//!
//! These types are plain values: every pipeline stage takes them by reference
//! and returns fresh ones, so each stage can be exercised on its own.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

/// First day of the reference study window.
pub const REFERENCE_START: &str = "2020-12-01";
/// Last day of the reference study window.
pub const REFERENCE_END: &str = "2021-08-11";
/// Days added to every search-interest date before window filtering.
pub const DEFAULT_SEARCH_OFFSET_DAYS: i64 = 2;

/// One row of the daily per-location dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub location: String,
    pub date: NaiveDate,
    /// Fraction of tests returning positive, in `[0, 1]`.
    pub positive_rate: Option<f64>,
    pub vaccinated_per_hundred: Option<f64>,
}

/// One week of search interest (0–100, relative to the range maximum).
///
/// `hits` is `None` when the provider's value for the week was unreadable; the
/// week still occupies its position in the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklySearchRecord {
    pub date: NaiveDate,
    pub hits: Option<u32>,
}

/// Search interest for one keyword in one region, in provider order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSeries {
    pub keyword: String,
    pub region: String,
    pub records: Vec<WeeklySearchRecord>,
}

/// Mean daily values for one `(location, week)` group.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyAggregate {
    pub location: String,
    pub week: u32,
    /// `None` when every daily positive rate in the week was missing.
    pub avg_positive: Option<f64>,
    /// Mean of people fully vaccinated per hundred, missing days counted as 0.
    pub vaccination: f64,
}

/// A joined week of epidemiological and search data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub week: u32,
    pub location: String,
    pub avg_positive: Option<f64>,
    pub vaccination: f64,
    pub hits: Option<u32>,
    pub hit_vac: Option<f64>,
    pub hit_vac_lag: Option<f64>,
    pub hits_lag: Option<u32>,
    /// `Some` exactly when the previous week is in the table.
    pub vac_lag: Option<f64>,
}

/// A merged row whose previous week is known.
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedRecord {
    pub week: u32,
    pub location: String,
    pub avg_positive: Option<f64>,
    pub vaccination: f64,
    pub hits: Option<u32>,
    pub hit_vac: Option<f64>,
    pub hit_vac_lag: Option<f64>,
    pub hits_lag: Option<u32>,
    pub vac_lag: f64,
}

/// Inclusive date range applied to both input sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Provider timeframe string, `"YYYY-MM-DD YYYY-MM-DD"`.
    pub fn timeframe(&self) -> String {
        format!("{} {}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}

/// The location whose series is modeled, and the search region that covers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub location: String,
    /// Region code used by the search provider (e.g. `GB`).
    ///
    /// A search series matches the target when its region equals this code or
    /// the location name (exports label the region by name).
    pub region: String,
}

/// Arguments handed to a search-interest provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub region: String,
    pub timeframe: String,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>, region: impl Into<String>, window: &DateWindow) -> Self {
        Self {
            keyword: keyword.into(),
            region: region.into(),
            timeframe: window.timeframe(),
        }
    }
}

/// Which regression(s) to fit against weekly positivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ModelSpec {
    /// `avg_positive ~ hits`
    Hits,
    /// `avg_positive ~ hit_vac`
    HitVac,
    /// `avg_positive ~ hit_vac_lag`
    HitVacLag,
    /// `avg_positive ~ hits_lag + vac_lag`
    ComponentsLag,
}

impl ModelSpec {
    pub const ALL: [ModelSpec; 4] = [
        ModelSpec::Hits,
        ModelSpec::HitVac,
        ModelSpec::HitVacLag,
        ModelSpec::ComponentsLag,
    ];

    pub fn formula(self) -> &'static str {
        match self {
            ModelSpec::Hits => "avg_positive ~ hits",
            ModelSpec::HitVac => "avg_positive ~ hit_vac",
            ModelSpec::HitVacLag => "avg_positive ~ hit_vac_lag",
            ModelSpec::ComponentsLag => "avg_positive ~ hits_lag + vac_lag",
        }
    }

    /// Whether the model reads from the lagged view (first week dropped).
    pub fn uses_lag(self) -> bool {
        matches!(self, ModelSpec::HitVacLag | ModelSpec::ComponentsLag)
    }

    /// Regressor names, intercept excluded.
    pub fn regressors(self) -> &'static [&'static str] {
        match self {
            ModelSpec::Hits => &["hits"],
            ModelSpec::HitVac => &["hit_vac"],
            ModelSpec::HitVacLag => &["hit_vac_lag"],
            ModelSpec::ComponentsLag => &["hits_lag", "vac_lag"],
        }
    }
}

/// One estimated coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
}

/// OLS output for a single model.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFit {
    pub n: usize,
    pub coefficients: Vec<Coefficient>,
    pub sse: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_path: PathBuf,
    pub target: Target,
    pub keyword: String,
    pub window: DateWindow,
    /// Applied to search dates before filtering; see `data::prepare_search_series`.
    pub search_offset_days: i64,
    /// Read search interest from a CSV export instead of the HTTP provider.
    pub search_csv: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub models: Vec<ModelSpec>,
}
