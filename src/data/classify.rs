//! Semantic column categories.
//!
//! The category decides which filter widget and which statistics apply to a
//! column. It is derived from the storage dtype every time it is asked for and
//! never cached on the dataset.

use std::fmt;

use super::model::{Column, ColumnType, Dataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnCategory {
    Numeric,
    Datetime,
    Categorical,
    Text,
}

impl fmt::Display for ColumnCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnCategory::Numeric => "numeric",
            ColumnCategory::Datetime => "datetime",
            ColumnCategory::Categorical => "categorical",
            ColumnCategory::Text => "text",
        };
        f.write_str(name)
    }
}

/// Category of a single column: numeric, then datetime, then explicitly
/// categorical, else text.
pub fn category_of(column: &Column) -> ColumnCategory {
    match column.dtype {
        ColumnType::Integer | ColumnType::Float | ColumnType::Boolean => ColumnCategory::Numeric,
        ColumnType::DateTime => ColumnCategory::Datetime,
        ColumnType::Categorical => ColumnCategory::Categorical,
        ColumnType::Text => ColumnCategory::Text,
    }
}

/// Category of every column, in dataset order.
pub fn classify(dataset: &Dataset) -> Vec<(String, ColumnCategory)> {
    dataset
        .columns()
        .iter()
        .map(|c| (c.name.clone(), category_of(c)))
        .collect()
}

/// Names of the numeric columns, in dataset order.
pub fn numeric_columns(dataset: &Dataset) -> Vec<String> {
    classify(dataset)
        .into_iter()
        .filter(|(_, cat)| *cat == ColumnCategory::Numeric)
        .map(|(name, _)| name)
        .collect()
}
