//! Error taxonomy shared by the loader, the filter engine and the analysis
//! engines.
//!
//! Every variant is recoverable: the session layer converts it into a status
//! message and an empty or absent result.

use thiserror::Error;

use crate::data::classify::ColumnCategory;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Unsupported file type '{0}'. Please upload a CSV or Excel file.")]
    UnsupportedFileType(String),

    #[error("Failed to load file: {0}")]
    ParseFailure(String),

    #[error("Selected statistical analysis '{0}' is not supported.")]
    UnsupportedStatistic(String),

    #[error("'{statistic}' is not available for {category} columns")]
    StatisticNotApplicable {
        statistic: String,
        category: ColumnCategory,
    },

    #[error("Please select at least two numerical columns for correlation analysis (got {0}).")]
    InsufficientColumns(usize),

    #[error("Error calculating {0}")]
    ComputationFailure(String),

    #[error("Column '{0}' does not exist")]
    UnknownColumn(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("Column '{column}' has {actual} values, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

impl From<csv::Error> for AnalysisError {
    fn from(err: csv::Error) -> Self {
        AnalysisError::ParseFailure(format!("CSV: {err}"))
    }
}

impl From<calamine::Error> for AnalysisError {
    fn from(err: calamine::Error) -> Self {
        AnalysisError::ParseFailure(format!("Excel: {err}"))
    }
}

/// Result type alias for the data and analysis layers.
pub type Result<T> = std::result::Result<T, AnalysisError>;
