//! Shared pipeline logic.
//!
//! Keeping the workflow in one place:
//! daily CSV -> weekly aggregates -> search series -> merged table -> models
//!
//! Each step is a plain function from `crate::{io, align, data, features, fit}`;
//! this module only wires them together.

use chrono::Duration;
use tracing::info;

use crate::align::aggregate_weekly;
use crate::data::{CsvSearchSource, SearchProvider, TrendsClient, prepare_search_series};
use crate::domain::{DateWindow, MergedRecord, PipelineConfig, SearchQuery, SearchSeries, WeeklyAggregate};
use crate::error::AppError;
use crate::features::build_merged;
use crate::fit::{ModelReport, fit_models};
use crate::io::ingest::{DailyData, load_daily_records};

/// All computed outputs of a single `hitvac run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub daily: DailyData,
    pub weekly: Vec<WeeklyAggregate>,
    /// Search series after the date offset and window filter.
    pub search: SearchSeries,
    pub merged: Vec<MergedRecord>,
    pub models: ModelReport,
}

/// Pick the search source named by the config.
pub fn search_provider(config: &PipelineConfig) -> Result<Box<dyn SearchProvider>, AppError> {
    let provider: Box<dyn SearchProvider> = match &config.search_csv {
        Some(path) => Box::new(CsvSearchSource::new(path)),
        None => Box::new(TrendsClient::from_env()?),
    };
    Ok(provider)
}

/// Execute the full pipeline with the configured search source.
pub fn run(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let provider = search_provider(config)?;
    run_with_provider(config, provider.as_ref())
}

/// Execute the pipeline against an explicit search provider.
pub fn run_with_provider(config: &PipelineConfig, provider: &dyn SearchProvider) -> Result<RunOutput, AppError> {
    // 1) Daily dataset, already restricted to the window.
    let daily = load_daily_records(&config.data_path, &config.window)?;

    // 2) Search interest. The request starts `offset` days early so that the
    //    shifted dates still cover the window start.
    let query = SearchQuery::new(&config.keyword, &config.target.region, &search_window(config));
    let raw_search = provider.fetch(&query)?;

    Ok(run_stages(config, daily, &raw_search))
}

/// The pure part of the pipeline: everything after both sources are loaded.
pub fn run_stages(config: &PipelineConfig, daily: DailyData, raw_search: &SearchSeries) -> RunOutput {
    // 3) Weekly aggregates per location.
    let weekly = aggregate_weekly(&daily.records, config.window.end);

    // 4) Offset + window on the search series; order is kept for positional weeks.
    let search = prepare_search_series(raw_search, config.search_offset_days, &config.window);

    // 5) Join on week and derive covariates.
    let merged = build_merged(&weekly, &config.target, &search);

    // 6) Regressions. An empty `merged` yields an all-skipped report.
    let models = fit_models(&merged, &config.models);

    info!(
        location = %config.target.location,
        weekly = weekly.len(),
        search_weeks = search.records.len(),
        merged = merged.len(),
        fitted = models.fits.len(),
        "Pipeline finished"
    );

    RunOutput {
        daily,
        weekly,
        search,
        merged,
        models,
    }
}

/// Date range requested from the search provider.
pub fn search_window(config: &PipelineConfig) -> DateWindow {
    let start = config
        .window
        .start
        .checked_sub_signed(Duration::days(config.search_offset_days))
        .unwrap_or(config.window.start);
    DateWindow::new(start, config.window.end)
}
