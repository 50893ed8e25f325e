//! Mathematical utilities: least squares and OLS summaries.

pub mod ols;

pub use ols::*;
