//! Command-line parsing.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline stages.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::{DEFAULT_SEARCH_OFFSET_DAYS, ModelSpec, REFERENCE_END, REFERENCE_START};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "hitvac", version, about = "Does symptom search interest predict test positivity?")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Align, join, fit the regressions and print the results.
    ///
    /// Weeks present in only one of the two series are dropped by the join.
    Run(RunArgs),
    /// Print weekly aggregates of the daily dataset.
    Weekly(WeeklyArgs),
}

/// Daily dataset location and study window.
#[derive(Debug, Parser, Clone)]
pub struct DataArgs {
    /// Daily per-location CSV (location, date, positive_rate, people_fully_vaccinated_per_hundred).
    #[arg(short = 'd', long, value_name = "CSV")]
    pub data: PathBuf,

    /// First day of the window (YYYY-MM-DD); week 1 starts here.
    #[arg(long, default_value = REFERENCE_START)]
    pub start: NaiveDate,

    /// Last day of the window (YYYY-MM-DD).
    #[arg(long, default_value = REFERENCE_END)]
    pub end: NaiveDate,
}

/// Options for the full pipeline.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Location to model, as spelled in the dataset.
    #[arg(short = 'l', long, default_value = "United Kingdom")]
    pub location: String,

    /// Search region code covering the location.
    #[arg(short = 'r', long, default_value = "GB")]
    pub region: String,

    /// Search phrase.
    #[arg(short = 'k', long, default_value = "loss of smell")]
    pub keyword: String,

    /// Read search interest from an exported CSV instead of TRENDS_API_URL.
    #[arg(long, value_name = "CSV")]
    pub search_csv: Option<PathBuf>,

    /// Days added to every search-interest date before window filtering.
    #[arg(long, default_value_t = DEFAULT_SEARCH_OFFSET_DAYS, allow_hyphen_values = true)]
    pub search_offset_days: i64,

    /// Models to fit (repeatable). Defaults to all.
    #[arg(short = 'm', long = "model", value_enum)]
    pub models: Vec<ModelSpec>,

    /// Export the merged weekly table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// Options for the weekly aggregate listing.
#[derive(Debug, Parser, Clone)]
pub struct WeeklyArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Only show this location.
    #[arg(short = 'l', long)]
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_match_reference_study() {
        let cli = Cli::parse_from(["hitvac", "run", "--data", "owid.csv"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.data.start, NaiveDate::from_ymd_opt(2020, 12, 1).unwrap());
        assert_eq!(args.data.end, NaiveDate::from_ymd_opt(2021, 8, 11).unwrap());
        assert_eq!(args.search_offset_days, 2);
        assert_eq!(args.region, "GB");
        assert!(args.models.is_empty());
    }

    #[test]
    fn run_accepts_models_and_negative_offset() {
        let cli = Cli::parse_from([
            "hitvac",
            "run",
            "-d",
            "owid.csv",
            "--model",
            "hit-vac-lag",
            "--model",
            "components-lag",
            "--search-offset-days",
            "-1",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.models, vec![ModelSpec::HitVacLag, ModelSpec::ComponentsLag]);
        assert_eq!(args.search_offset_days, -1);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
