//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the pipeline (`pipeline`)
//! - prints tables and model summaries
//! - writes the optional export

use clap::Parser;
use tracing::info;

use crate::cli::{Command, RunArgs, WeeklyArgs};
use crate::domain::{DateWindow, ModelSpec, PipelineConfig, Target};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `hitvac` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Weekly(args) => handle_weekly(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args)?;
    let run = pipeline::run(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&config, run.weekly.len(), run.merged.len())
    );
    println!("{}", crate::report::format_merged_table(&run.merged));
    println!("{}", crate::report::format_model_report(&run.models));

    if let Some(path) = &config.export {
        crate::io::export::write_merged_csv(path, &run.merged)?;
    }

    if run.models.is_empty() {
        return Err(AppError::no_data(format!(
            "No model could be fitted: {} joined weeks for {}.",
            run.merged.len(),
            config.target.location
        )));
    }
    Ok(())
}

fn handle_weekly(args: WeeklyArgs) -> Result<(), AppError> {
    let window = window_from_args(&args.data)?;
    let daily = crate::io::ingest::load_daily_records(&args.data.data, &window)?;
    let mut weekly = crate::align::aggregate_weekly(&daily.records, window.end);

    if let Some(location) = &args.location {
        weekly.retain(|w| &w.location == location);
        if weekly.is_empty() {
            info!(%location, "No weekly rows for location");
        }
    }

    println!("{}", crate::report::format_weekly_table(&weekly));
    Ok(())
}

pub fn pipeline_config_from_args(args: &RunArgs) -> Result<PipelineConfig, AppError> {
    let models = if args.models.is_empty() {
        ModelSpec::ALL.to_vec()
    } else {
        args.models.clone()
    };

    Ok(PipelineConfig {
        data_path: args.data.data.clone(),
        target: Target {
            location: args.location.clone(),
            region: args.region.clone(),
        },
        keyword: args.keyword.clone(),
        window: window_from_args(&args.data)?,
        search_offset_days: args.search_offset_days,
        search_csv: args.search_csv.clone(),
        export: args.export.clone(),
        models,
    })
}

fn window_from_args(args: &crate::cli::DataArgs) -> Result<DateWindow, AppError> {
    if args.end < args.start {
        return Err(AppError::input(format!(
            "--end ({}) is before --start ({}).",
            args.end, args.start
        )));
    }
    Ok(DateWindow::new(args.start, args.end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["hitvac", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Run(args) => args,
            Command::Weekly(_) => panic!("expected run"),
        }
    }

    #[test]
    fn config_defaults_to_all_models() {
        let config = pipeline_config_from_args(&run_args(&["-d", "owid.csv", "-l", "France", "-r", "FR"])).unwrap();
        assert_eq!(config.models, ModelSpec::ALL.to_vec());
        assert_eq!(config.target.location, "France");
        assert_eq!(config.target.region, "FR");
        assert_eq!(config.window.timeframe(), "2020-12-01 2021-08-11");
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = pipeline_config_from_args(&run_args(&[
            "-d",
            "owid.csv",
            "--start",
            "2021-08-11",
            "--end",
            "2020-12-01",
        ]))
        .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
