//! `hitvac` library crate.
//!
//! Pipeline: daily dataset (`io`) -> weekly alignment (`align`) -> search
//! interest (`data`) -> week join and covariates (`features`) -> regressions
//! (`fit`, `math`) -> text output (`report`).
//!
//! The binary (`hitvac`) is a thin wrapper around this library so that every
//! stage is testable without spawning processes.

pub mod align;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod fit;
pub mod io;
pub mod math;
pub mod report;
