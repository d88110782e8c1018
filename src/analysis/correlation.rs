//! Pairwise Pearson correlation across numeric columns.

use super::moments;
use crate::data::classify::{category_of, ColumnCategory};
use crate::data::model::{CellValue, Dataset};
use crate::error::{AnalysisError, Result};

/// Square, symmetric matrix of correlation coefficients; `values[i][j]`
/// belongs to `columns[i]` × `columns[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied()
    }

    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.get(i, j)
    }
}

/// Correlate the chosen columns, in the order given.
///
/// Each pair uses only rows where both values are present. At least two
/// columns are required, each must be numeric, and every pair needs two
/// complete rows with non-zero variance on both sides.
pub fn correlate(dataset: &Dataset, columns: &[String]) -> Result<CorrelationMatrix> {
    if columns.len() < 2 {
        return Err(AnalysisError::InsufficientColumns(columns.len()));
    }

    let mut series: Vec<&[CellValue]> = Vec::with_capacity(columns.len());
    for name in columns {
        let col = dataset.try_column(name)?;
        if category_of(col) != ColumnCategory::Numeric {
            return Err(AnalysisError::NotNumeric(name.clone()));
        }
        series.push(&col.values);
    }

    let n = columns.len();
    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let (xs, ys): (Vec<f64>, Vec<f64>) = series[i]
                .iter()
                .zip(series[j])
                .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
                .unzip();
            let r = moments::pearson(&xs, &ys).ok_or_else(|| {
                AnalysisError::ComputationFailure(format!(
                    "correlation between '{}' and '{}': needs two complete rows with varying values",
                    columns[i], columns[j]
                ))
            })?;
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    log::debug!("Correlated {n} columns over {} rows", dataset.row_count());
    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}
