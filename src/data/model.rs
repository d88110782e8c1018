use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common DataFrame dtypes.
/// Using `BTreeSet` / `HashMap` downstream so `CellValue` must be `Ord + Hash`.
#[derive(Debug, Clone)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                Text(_) => 3,
                DateTime(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Mixed numbers order by value, integers first on ties.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (Text(a), Text(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Null => {}
            CellValue::Bool(b) => b.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Text(s) => s.hash(state),
            CellValue::DateTime(d) => d.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "<null>"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Interpret the value as an `f64`. Booleans count as 1/0.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Normalize to a datetime: datetime cells directly, text cells through
    /// the shared datetime parser.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(d) => Some(*d),
            CellValue::Text(s) => super::dates::parse_datetime(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnType – storage dtype of a column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    DateTime,
    /// Explicitly typed as a category by the operator.
    Categorical,
    /// Object column; may hold values of mixed kinds.
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "int64",
            ColumnType::Float => "float64",
            ColumnType::Boolean => "bool",
            ColumnType::DateTime => "datetime64",
            ColumnType::Categorical => "category",
            ColumnType::Text => "object",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Column – one named, typed sequence of cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: ColumnType, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterator over the non-null cells.
    pub fn non_null(&self) -> impl Iterator<Item = &CellValue> {
        self.values.iter().filter(|v| !v.is_null())
    }

    /// Number of distinct non-null values.
    pub fn n_unique(&self) -> usize {
        self.non_null().collect::<HashSet<_>>().len()
    }

    /// Sorted set of every distinct value, `Null` included when present.
    pub fn distinct_values(&self) -> BTreeSet<CellValue> {
        self.values.iter().cloned().collect()
    }

    /// Non-null numeric values, in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(CellValue::as_f64).collect()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Ordered collection of equally long columns. Rows are positionally aligned.
/// `Dataset::default()` is the empty dataset (no columns, no rows).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset, rejecting columns whose lengths differ.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(AnalysisError::ShapeMismatch {
                    column: bad.name.clone(),
                    expected,
                    actual: bad.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`Dataset::column`] but reports a missing column as an error.
    pub fn try_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| AnalysisError::UnknownColumn(name.to_string()))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// A dataset without rows or without columns counts as empty.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.columns.is_empty()
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// Copy of the dataset restricted to the given row indices (same schema).
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                dtype: c.dtype,
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();
        Dataset { columns }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Dataset {
        let upto: Vec<usize> = (0..self.row_count().min(n)).collect();
        self.select_rows(&upto)
    }

    /// Replace the column with the same name.
    pub fn replace_column(&mut self, column: Column) -> Result<()> {
        let actual = column.len();
        if !self.columns.is_empty() && actual != self.row_count() {
            return Err(AnalysisError::ShapeMismatch {
                column: column.name,
                expected: self.row_count(),
                actual,
            });
        }
        let slot = self
            .columns
            .iter_mut()
            .find(|c| c.name == column.name)
            .ok_or_else(|| AnalysisError::UnknownColumn(column.name.clone()))?;
        *slot = column;
        Ok(())
    }

    /// Explicitly type a column as categorical, keeping its values.
    pub fn as_categorical(&mut self, name: &str) -> Result<()> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| AnalysisError::UnknownColumn(name.to_string()))?;
        column.dtype = ColumnType::Categorical;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(name: &str, vals: &[i64]) -> Column {
        Column::new(
            name,
            ColumnType::Integer,
            vals.iter().map(|&v| CellValue::Integer(v)).collect(),
        )
    }

    #[test]
    fn rejects_unequal_column_lengths() {
        let err = Dataset::new(vec![ints("a", &[1, 2]), ints("b", &[1])]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::ShapeMismatch {
                column: "b".into(),
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn select_rows_keeps_schema() {
        let ds = Dataset::new(vec![ints("a", &[1, 2, 3]), ints("b", &[4, 5, 6])]).unwrap();
        let sub = ds.select_rows(&[0, 2]);
        assert_eq!(sub.column_names(), vec!["a", "b"]);
        assert_eq!(sub.row_count(), 2);
        assert_eq!(sub.column("b").unwrap().values, vec![CellValue::Integer(4), CellValue::Integer(6)]);
        // original untouched
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    fn empty_dataset_has_no_rows_or_columns() {
        let ds = Dataset::default();
        assert!(ds.is_empty());
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.width(), 0);
        assert!(ds.row(0).is_none());
    }

    #[test]
    fn n_unique_ignores_nulls() {
        let col = Column::new(
            "x",
            ColumnType::Float,
            vec![
                CellValue::Float(1.0),
                CellValue::Float(1.0),
                CellValue::Float(2.0),
                CellValue::Null,
            ],
        );
        assert_eq!(col.n_unique(), 2);
        assert_eq!(col.distinct_values().len(), 3);
    }

    #[test]
    fn mixed_numbers_order_by_value() {
        let mut set = BTreeSet::new();
        set.insert(CellValue::Float(2.5));
        set.insert(CellValue::Integer(3));
        set.insert(CellValue::Integer(1));
        set.insert(CellValue::Null);
        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                CellValue::Null,
                CellValue::Integer(1),
                CellValue::Float(2.5),
                CellValue::Integer(3)
            ]
        );
    }

    #[test]
    fn replace_column_checks_length_and_name() {
        let mut ds = Dataset::new(vec![ints("a", &[1, 2]), ints("b", &[3, 4])]).unwrap();
        assert_eq!(
            ds.replace_column(ints("a", &[9])).unwrap_err(),
            AnalysisError::ShapeMismatch {
                column: "a".into(),
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(
            ds.replace_column(ints("z", &[1, 2])).unwrap_err(),
            AnalysisError::UnknownColumn("z".into())
        );
        ds.replace_column(ints("a", &[7, 8])).unwrap();
        assert_eq!(ds.column("a").unwrap().values, vec![CellValue::Integer(7), CellValue::Integer(8)]);
        assert_eq!(ds.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn as_categorical_changes_only_dtype() {
        let mut ds = Dataset::new(vec![ints("a", &[1, 2])]).unwrap();
        ds.as_categorical("a").unwrap();
        let col = ds.column("a").unwrap();
        assert_eq!(col.dtype, ColumnType::Categorical);
        assert_eq!(col.len(), 2);
        assert!(ds.as_categorical("missing").is_err());
    }
}
