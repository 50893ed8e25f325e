//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw inputs (`DailyRecord`, `SearchSeries`)
//! - derived weekly rows (`WeeklyAggregate`, `MergedRecord`, `LaggedRecord`)
//! - run configuration (`PipelineConfig`, `DateWindow`, `ModelSpec`)
//! - regression outputs (`RegressionFit`)

pub mod types;

pub use types::*;
