//! Datetime parsing and operator-requested text → datetime conversion.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::{CellValue, Column, ColumnType, Dataset};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// Parse a datetime in one of the common textual layouts. Date-only input
/// maps to midnight. Offsets in RFC 3339 input are dropped after conversion
/// to UTC.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Convert the named text columns to datetime columns.
///
/// Parseable cells convert; unparseable non-null cells become `Null` and are
/// therefore excluded by any later date-range filter. A column with no
/// parseable cell at all is left untouched. Non-text columns and unknown names
/// are skipped.
pub fn convert_dates(dataset: &Dataset, columns: &[String]) -> Dataset {
    let mut out = dataset.clone();
    for name in columns {
        let Some(column) = dataset.column(name) else {
            log::warn!("Failed to convert {name} to datetime: no such column");
            continue;
        };
        if !matches!(column.dtype, ColumnType::Text | ColumnType::Categorical) {
            log::debug!("Skipping datetime conversion of {name} ({})", column.dtype);
            continue;
        }

        let converted: Vec<CellValue> = column
            .values
            .iter()
            .map(|v| match v.as_datetime() {
                Some(dt) => CellValue::DateTime(dt),
                None => CellValue::Null,
            })
            .collect();

        let parsed = converted.iter().filter(|v| !v.is_null()).count();
        if parsed == 0 {
            log::warn!("Failed to convert {name} to datetime: no parseable values");
            continue;
        }
        let dropped = column.non_null().count() - parsed;
        if dropped > 0 {
            log::warn!("{dropped} value(s) in {name} could not be parsed as datetime and became null");
        }

        // Same name and length as the column it replaces.
        if let Err(e) = out.replace_column(Column::new(name.clone(), ColumnType::DateTime, converted)) {
            log::error!("Failed to convert {name} to datetime: {e}");
        }
    }
    out
}
