pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod model;
pub mod recency;
pub mod report;
pub mod scan;
pub mod tally;

pub use error::{Result, ScanError};
