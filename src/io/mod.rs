//! Input/output helpers.
//!
//! - daily dataset CSV ingest (`ingest`)
//! - merged table export (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
