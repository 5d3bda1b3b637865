//! Sample file parsers
//!
//! Loggers export their channels as delimited text with one row per
//! acquisition instant. Parsers here turn such files into a [`SampleSeries`].
//!
//! [`SampleSeries`]: crate::types::SampleSeries

pub mod csv;

// Re-export parser entry points
pub use csv::{parse_sample_csv, read_sample_csv, DATE_COLUMN, TIME_COLUMN};
