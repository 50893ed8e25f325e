//! Temporal alignment of daily records onto a per-location week index.

pub mod weekly;

pub use weekly::*;
