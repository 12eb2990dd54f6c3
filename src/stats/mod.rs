//! Numeric primitives used by the aggregate functions
//!
//! These work on plain slices of present values; missing-value handling
//! happens before the data reaches this module.

pub mod descriptive;

pub use descriptive::{mean, median, percentile, sample_variance, std_dev, sum};
