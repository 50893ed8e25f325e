//! Feature building: week-indexed join, `hit_vac`, and the lagged view.

pub mod merge;

pub use merge::*;
