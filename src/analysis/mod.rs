//! Analysis engines running on a (filtered) dataset: single-column
//! statistics and multi-column correlation.

pub mod correlation;
mod moments;
pub mod statistics;

pub use correlation::{correlate, CorrelationMatrix};
pub use statistics::{compute_stat, compute_stat_named, Chart, StatOutcome, StatResult, Statistic, Summary};
