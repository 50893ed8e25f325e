//! External search-interest data.

pub mod trends;

pub use trends::*;
