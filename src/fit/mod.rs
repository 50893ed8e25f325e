//! Regression stage.
//!
//! Responsibilities:
//!
//! - build each model's design from the merged table or its lagged view
//! - fit with OLS, collecting models that cannot be fitted as skipped

pub mod models;

pub use models::*;
