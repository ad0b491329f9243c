//! Core data structures for sampled astronomical measurements.

mod time_series;

pub use time_series::TimeSeries;
