use std::borrow::Cow;
use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use super::classify::{category_of, ColumnCategory};
use super::model::{CellValue, Column, Dataset};
use crate::error::Result;

/// Columns with fewer distinct non-null values than this get a membership
/// filter whatever their type.
pub const LOW_CARDINALITY_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// Which widget / predicate a column gets. Decided per column, in order:
/// categorical or low-cardinality → membership, numeric → range,
/// datetime → date range, anything else → substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Membership,
    Range,
    DateRange,
    Contains,
}

impl FilterKind {
    pub fn for_column(column: &Column) -> Self {
        let category = category_of(column);
        if category == ColumnCategory::Categorical || column.n_unique() < LOW_CARDINALITY_LIMIT {
            return FilterKind::Membership;
        }
        match category {
            ColumnCategory::Numeric => FilterKind::Range,
            ColumnCategory::Datetime => FilterKind::DateRange,
            ColumnCategory::Categorical | ColumnCategory::Text => FilterKind::Contains,
        }
    }
}

/// Predicate applied to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    /// Keep rows whose value is in the set. `Null` matches only when selected.
    Membership(BTreeSet<CellValue>),
    /// Inclusive numeric bounds; nulls never match.
    Range { min: f64, max: f64 },
    /// Inclusive datetime bounds; nulls and unparseable values never match.
    DateRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Case-sensitive literal substring; empty text keeps every row.
    Contains(String),
}

impl ColumnFilter {
    /// Whether a single cell passes the predicate.
    pub fn matches(&self, value: &CellValue) -> bool {
        match self {
            ColumnFilter::Membership(selected) => selected.contains(value),
            ColumnFilter::Range { min, max } => value
                .as_f64()
                .is_some_and(|v| *min <= v && v <= *max),
            ColumnFilter::DateRange { start, end } => value
                .as_datetime()
                .is_some_and(|v| *start <= v && v <= *end),
            ColumnFilter::Contains(needle) => {
                needle.is_empty() || value.as_text().is_some_and(|s| s.contains(needle.as_str()))
            }
        }
    }
}

/// Numeric `(min, max)` of a column, ignoring nulls.
pub fn numeric_bounds(column: &Column) -> Option<(f64, f64)> {
    column.values.iter().filter_map(CellValue::as_f64).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Datetime `(min, max)` of a column, ignoring nulls.
pub fn datetime_bounds(column: &Column) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let mut dates = column.values.iter().filter_map(CellValue::as_datetime);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

/// The predicate a column gets before the operator touches its widget. It
/// selects everything present, so on its own it removes nothing but nulls
/// from range and date-range columns.
pub fn default_filter(column: &Column) -> ColumnFilter {
    match FilterKind::for_column(column) {
        FilterKind::Membership => ColumnFilter::Membership(column.distinct_values()),
        FilterKind::Range => {
            let (min, max) = numeric_bounds(column).unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
            ColumnFilter::Range { min, max }
        }
        FilterKind::DateRange => match datetime_bounds(column) {
            Some((start, end)) => ColumnFilter::DateRange { start, end },
            None => ColumnFilter::DateRange {
                start: NaiveDateTime::MIN,
                end: NaiveDateTime::MAX,
            },
        },
        FilterKind::Contains => ColumnFilter::Contains(String::new()),
    }
}

// ---------------------------------------------------------------------------
// Filter configuration
// ---------------------------------------------------------------------------

/// Session-scoped filter input: whether filtering is on and one predicate per
/// chosen column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterConfig {
    pub enabled: bool,
    pub columns: Vec<(String, ColumnFilter)>,
}

impl FilterConfig {
    /// Enabled config with the default predicate for each named column.
    pub fn with_defaults(dataset: &Dataset, names: &[String]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| Ok((name.clone(), default_filter(dataset.try_column(name)?))))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            enabled: true,
            columns,
        })
    }

    pub fn get(&self, column: &str) -> Option<&ColumnFilter> {
        self.columns.iter().find(|(c, _)| c == column).map(|(_, f)| f)
    }

    pub fn get_mut(&mut self, column: &str) -> Option<&mut ColumnFilter> {
        self.columns
            .iter_mut()
            .find(|(c, _)| c == column)
            .map(|(_, f)| f)
    }
}

/// Return indices of rows that pass every column filter (logical AND).
pub fn filtered_indices(dataset: &Dataset, config: &FilterConfig) -> Result<Vec<usize>> {
    let predicates = config
        .columns
        .iter()
        .map(|(name, filter)| Ok((dataset.try_column(name)?, filter)))
        .collect::<Result<Vec<_>>>()?;

    Ok((0..dataset.row_count())
        .filter(|&row| {
            predicates
                .iter()
                .all(|(column, filter)| filter.matches(&column.values[row]))
        })
        .collect())
}

/// Narrow the dataset to rows passing the configured filters.
///
/// Disabled filtering hands back the input itself; otherwise the result is a
/// new dataset and the input is left untouched.
pub fn filter<'a>(dataset: &'a Dataset, config: &FilterConfig) -> Result<Cow<'a, Dataset>> {
    if !config.enabled {
        return Ok(Cow::Borrowed(dataset));
    }
    let keep = filtered_indices(dataset, config)?;
    log::debug!(
        "Filter kept {} of {} rows across {} column(s)",
        keep.len(),
        dataset.row_count(),
        config.columns.len()
    );
    Ok(Cow::Owned(dataset.select_rows(&keep)))
}
