//! Named single-column statistics.
//!
//! Each [`Statistic`] variant has exactly one handler in [`compute_stat`];
//! which variants a column may use is decided by its [`ColumnCategory`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};

use super::moments;
use crate::data::classify::{category_of, ColumnCategory};
use crate::data::model::{CellValue, Column, ColumnType, Dataset};
use crate::error::{AnalysisError, Result};

/// Number of entries reported by [`Statistic::TopFiveCommonValues`].
const TOP_N: usize = 5;

// ---------------------------------------------------------------------------
// Statistic registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Summary,
    Frequency,
    Mean,
    Median,
    Mode,
    StandardDeviation,
    Variance,
    NormalityTest,
    UniqueValues,
    TopFiveCommonValues,
    Skewness,
    TextLengthSummary,
}

impl Statistic {
    pub const ALL: [Statistic; 12] = [
        Statistic::Summary,
        Statistic::Frequency,
        Statistic::Mean,
        Statistic::Median,
        Statistic::Mode,
        Statistic::StandardDeviation,
        Statistic::Variance,
        Statistic::NormalityTest,
        Statistic::UniqueValues,
        Statistic::TopFiveCommonValues,
        Statistic::Skewness,
        Statistic::TextLengthSummary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Statistic::Summary => "Summary",
            Statistic::Frequency => "Frequency",
            Statistic::Mean => "Mean",
            Statistic::Median => "Median",
            Statistic::Mode => "Mode",
            Statistic::StandardDeviation => "Standard Deviation",
            Statistic::Variance => "Variance",
            Statistic::NormalityTest => "Normality Test",
            Statistic::UniqueValues => "Unique Values",
            Statistic::TopFiveCommonValues => "Top 5 Common Values",
            Statistic::Skewness => "Skewness",
            Statistic::TextLengthSummary => "Text Length Summary",
        }
    }

    /// Statistics offered for a column category, in menu order.
    pub fn available_for(category: ColumnCategory) -> &'static [Statistic] {
        use Statistic::*;
        match category {
            ColumnCategory::Numeric => &[
                Summary,
                Mean,
                Median,
                Mode,
                StandardDeviation,
                Variance,
                NormalityTest,
                Skewness,
            ],
            ColumnCategory::Categorical => &[Summary, Frequency, TopFiveCommonValues],
            ColumnCategory::Text => &[TextLengthSummary, Frequency, UniqueValues, TopFiveCommonValues],
            ColumnCategory::Datetime => &[Summary],
        }
    }

    /// Whether the engine can compute this statistic on a column of the given
    /// category. Wider than [`Statistic::available_for`], which only shapes
    /// the menu.
    pub fn applies_to(self, category: ColumnCategory) -> bool {
        match self {
            Statistic::Summary
            | Statistic::Frequency
            | Statistic::Mode
            | Statistic::UniqueValues
            | Statistic::TopFiveCommonValues => true,
            Statistic::Mean
            | Statistic::Median
            | Statistic::StandardDeviation
            | Statistic::Variance
            | Statistic::NormalityTest
            | Statistic::Skewness => category == ColumnCategory::Numeric,
            Statistic::TextLengthSummary => {
                matches!(category, ColumnCategory::Text | ColumnCategory::Categorical)
            }
        }
    }

    /// Statistics whose chart shows the raw column values rather than the result.
    fn charts_raw_values(self) -> bool {
        matches!(
            self,
            Statistic::Mean | Statistic::Median | Statistic::StandardDeviation | Statistic::Variance
        )
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "Top-5 Common Values" {
            return Ok(Statistic::TopFiveCommonValues);
        }
        Statistic::ALL
            .into_iter()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| AnalysisError::UnsupportedStatistic(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Descriptive summary, shaped by the kind of column summarised.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Numeric {
        count: usize,
        mean: f64,
        /// Sample standard deviation; NaN for a single value.
        std: f64,
        min: f64,
        q25: f64,
        median: f64,
        q75: f64,
        max: f64,
    },
    Object {
        count: usize,
        unique: usize,
        top: CellValue,
        freq: usize,
    },
    Datetime {
        count: usize,
        mean: NaiveDateTime,
        min: NaiveDateTime,
        q25: NaiveDateTime,
        median: NaiveDateTime,
        q75: NaiveDateTime,
        max: NaiveDateTime,
    },
}

impl Summary {
    /// `(label, value)` rows for tabular display.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        match self {
            Summary::Numeric {
                count,
                mean,
                std,
                min,
                q25,
                median,
                q75,
                max,
            } => vec![
                ("count", count.to_string()),
                ("mean", format!("{mean:.6}")),
                ("std", format!("{std:.6}")),
                ("min", format!("{min:.6}")),
                ("25%", format!("{q25:.6}")),
                ("50%", format!("{median:.6}")),
                ("75%", format!("{q75:.6}")),
                ("max", format!("{max:.6}")),
            ],
            Summary::Object {
                count,
                unique,
                top,
                freq,
            } => vec![
                ("count", count.to_string()),
                ("unique", unique.to_string()),
                ("top", top.to_string()),
                ("freq", freq.to_string()),
            ],
            Summary::Datetime {
                count,
                mean,
                min,
                q25,
                median,
                q75,
                max,
            } => {
                let fmt = |d: &NaiveDateTime| d.format("%Y-%m-%d %H:%M:%S").to_string();
                vec![
                    ("count", count.to_string()),
                    ("mean", fmt(mean)),
                    ("min", fmt(min)),
                    ("25%", fmt(q25)),
                    ("50%", fmt(median)),
                    ("75%", fmt(q75)),
                    ("max", fmt(max)),
                ]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatResult {
    Summary(Summary),
    Scalar(f64),
    Count(usize),
    /// Several values, e.g. every mode of a column.
    Values(Vec<CellValue>),
    /// Value → count, most frequent first.
    Frequencies(Vec<(CellValue, usize)>),
    NormalTest { statistic: f64, p_value: f64 },
}

/// Bar chart hint for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub bars: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatOutcome {
    pub statistic: Statistic,
    pub column: String,
    pub result: StatResult,
    pub chart: Option<Chart>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Parse `name` and compute it; unknown names are `UnsupportedStatistic`.
pub fn compute_stat_named(dataset: &Dataset, column: &str, name: &str) -> Result<StatOutcome> {
    compute_stat(dataset, column, name.parse()?)
}

/// Compute one statistic over one column, nulls excluded.
pub fn compute_stat(dataset: &Dataset, column: &str, statistic: Statistic) -> Result<StatOutcome> {
    let col = dataset.try_column(column)?;
    let category = category_of(col);
    if !statistic.applies_to(category) {
        return Err(AnalysisError::StatisticNotApplicable {
            statistic: statistic.name().to_string(),
            category,
        });
    }

    let result = match statistic {
        Statistic::Summary => StatResult::Summary(summarize(col)?),
        Statistic::Frequency => StatResult::Frequencies(value_counts(col)),
        Statistic::Mean => StatResult::Scalar(numeric_scalar(col, "mean", moments::mean)?),
        Statistic::Median => StatResult::Scalar(numeric_scalar(col, "median", moments::median)?),
        Statistic::Mode => StatResult::Values(mode(col)),
        Statistic::StandardDeviation => StatResult::Scalar(numeric_scalar(col, "standard deviation", |xs| {
            moments::variance(xs, 0).map(f64::sqrt)
        })?),
        Statistic::Variance => StatResult::Scalar(numeric_scalar(col, "variance", |xs| {
            moments::variance(xs, 0)
        })?),
        Statistic::NormalityTest => {
            let (statistic, p_value) = moments::normal_test(&col.numeric_values())?;
            StatResult::NormalTest { statistic, p_value }
        }
        Statistic::UniqueValues => StatResult::Count(col.n_unique()),
        Statistic::TopFiveCommonValues => {
            let mut counts = value_counts(col);
            counts.truncate(TOP_N);
            StatResult::Frequencies(counts)
        }
        Statistic::Skewness => StatResult::Scalar(numeric_scalar(col, "skewness", moments::skewness)?),
        Statistic::TextLengthSummary => {
            let lengths: Vec<f64> = col
                .non_null()
                .map(|v| match v {
                    CellValue::Text(s) => s.chars().count() as f64,
                    other => other.to_string().chars().count() as f64,
                })
                .collect();
            StatResult::Summary(numeric_summary(&lengths, "text length summary")?)
        }
    };

    let chart = chart_for(statistic, col, &result);
    log::debug!("Computed {statistic} of {column}");
    Ok(StatOutcome {
        statistic,
        column: column.to_string(),
        result,
        chart,
    })
}

fn numeric_scalar(col: &Column, what: &str, f: impl Fn(&[f64]) -> Option<f64>) -> Result<f64> {
    let xs = col.numeric_values();
    if xs.is_empty() {
        return Err(AnalysisError::ComputationFailure(format!(
            "{what} of '{}': no non-null numeric values",
            col.name
        )));
    }
    f(&xs).ok_or_else(|| {
        AnalysisError::ComputationFailure(format!(
            "{what} of '{}': not enough values ({})",
            col.name,
            xs.len()
        ))
    })
}

/// Value → count over non-null cells, descending count; ties keep the order
/// in which values first appear.
pub fn value_counts(col: &Column) -> Vec<(CellValue, usize)> {
    let mut index: HashMap<&CellValue, usize> = HashMap::new();
    let mut counts: Vec<(CellValue, usize)> = Vec::new();
    for v in col.non_null() {
        match index.get(v) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(v, counts.len());
                counts.push((v.clone(), 1));
            }
        }
    }
    // stable sort keeps first-appearance order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Every most-frequent value, ascending.
fn mode(col: &Column) -> Vec<CellValue> {
    let counts = value_counts(col);
    let Some(&(_, top)) = counts.first() else {
        return Vec::new();
    };
    let mut modes: Vec<CellValue> = counts
        .into_iter()
        .take_while(|(_, n)| *n == top)
        .map(|(v, _)| v)
        .collect();
    modes.sort();
    modes
}

fn summarize(col: &Column) -> Result<Summary> {
    match (category_of(col), col.dtype) {
        (ColumnCategory::Numeric, ColumnType::Boolean) => object_summary(col),
        (ColumnCategory::Numeric, _) => numeric_summary(&col.numeric_values(), "summary"),
        (ColumnCategory::Datetime, _) => datetime_summary(col),
        (ColumnCategory::Categorical | ColumnCategory::Text, _) => object_summary(col),
    }
}

fn numeric_summary(xs: &[f64], what: &str) -> Result<Summary> {
    let sorted = moments::sorted(xs);
    let q = |p: f64| moments::quantile(&sorted, p);
    match (moments::mean(xs), q(0.0), q(0.25), q(0.5), q(0.75), q(1.0)) {
        (Some(mean), Some(min), Some(q25), Some(median), Some(q75), Some(max)) => Ok(Summary::Numeric {
            count: xs.len(),
            mean,
            std: moments::variance(xs, 1).map_or(f64::NAN, f64::sqrt),
            min,
            q25,
            median,
            q75,
            max,
        }),
        _ => Err(AnalysisError::ComputationFailure(format!(
            "{what}: no non-null values"
        ))),
    }
}

fn object_summary(col: &Column) -> Result<Summary> {
    let counts = value_counts(col);
    let (top, freq) = counts.first().cloned().ok_or_else(|| {
        AnalysisError::ComputationFailure(format!("summary of '{}': no non-null values", col.name))
    })?;
    Ok(Summary::Object {
        count: counts.iter().map(|(_, n)| n).sum(),
        unique: counts.len(),
        top,
        freq,
    })
}

fn datetime_summary(col: &Column) -> Result<Summary> {
    let dates: Vec<NaiveDateTime> = col.values.iter().filter_map(CellValue::as_datetime).collect();
    let Some(&origin) = dates.iter().min() else {
        return Err(AnalysisError::ComputationFailure(format!(
            "summary of '{}': no non-null values",
            col.name
        )));
    };

    // Work in microseconds from the earliest value to keep f64 precision.
    let offsets: Vec<f64> = dates
        .iter()
        .map(|d| (*d - origin).num_microseconds().unwrap_or(i64::MAX) as f64)
        .collect();
    let sorted = moments::sorted(&offsets);
    let at = |micros: Option<f64>| origin + Duration::microseconds(micros.unwrap_or(0.0).round() as i64);

    Ok(Summary::Datetime {
        count: dates.len(),
        mean: at(moments::mean(&offsets)),
        min: at(moments::quantile(&sorted, 0.0)),
        q25: at(moments::quantile(&sorted, 0.25)),
        median: at(moments::quantile(&sorted, 0.5)),
        q75: at(moments::quantile(&sorted, 0.75)),
        max: at(moments::quantile(&sorted, 1.0)),
    })
}

fn chart_for(statistic: Statistic, col: &Column, result: &StatResult) -> Option<Chart> {
    if statistic.charts_raw_values() {
        let bars = col
            .values
            .iter()
            .enumerate()
            .filter_map(|(row, v)| v.as_f64().map(|x| (row.to_string(), x)))
            .collect();
        return Some(Chart {
            title: col.name.clone(),
            bars,
        });
    }
    match (statistic, result) {
        (Statistic::Frequency | Statistic::TopFiveCommonValues, StatResult::Frequencies(counts)) => {
            Some(Chart {
                title: format!("{statistic} of {}", col.name),
                bars: counts
                    .iter()
                    .map(|(v, n)| (v.to_string(), *n as f64))
                    .collect(),
            })
        }
        _ => None,
    }
}
