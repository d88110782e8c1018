use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader};

use super::dates::parse_datetime;
use super::model::{CellValue, Column, ColumnType, Dataset};
use crate::error::{AnalysisError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Delimiters tried by the sniffer, in order of preference.
const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Lines inspected when sniffing the delimiter.
const SNIFF_LINES: usize = 10;

/// Cell spellings read as missing values.
const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>",
    "#N/A", "#NA",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Outcome of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    Dataset(Dataset),
    /// The workbook has several sheets and none was chosen yet.
    NeedsSheet(Vec<String>),
}

/// Parse uploaded bytes into a dataset. Dispatch by file name extension.
///
/// Supported formats:
/// * `.csv`          – delimiter sniffed, UTF-8 with or without BOM
/// * `.xlsx` / `.xls` – one sheet per load; `sheet` picks it when the
///   workbook holds several
pub fn load(bytes: &[u8], file_name: &str, sheet: Option<&str>) -> Result<Loaded> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(bytes).map(Loaded::Dataset),
        "xlsx" | "xls" => load_spreadsheet(bytes, sheet),
        _ => Err(AnalysisError::UnsupportedFileType(file_name.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Short records are padded with missing values; a record with more fields
/// than the header is a parse failure.
fn load_csv(bytes: &[u8]) -> Result<Dataset> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AnalysisError::ParseFailure(format!("CSV is not valid UTF-8: {e}")))?;
    if text.trim().is_empty() {
        return Err(AnalysisError::ParseFailure(
            "No columns to parse from file".to_string(),
        ));
    }

    let delimiter = sniff_delimiter(text);
    log::debug!("Sniffed CSV delimiter {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = unique_headers(reader.headers()?.iter().map(str::to_string).collect());
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| AnalysisError::ParseFailure(format!("CSV row {}: {e}", row_no + 1)))?;
        if record.len() > headers.len() {
            return Err(AnalysisError::ParseFailure(format!(
                "CSV row {}: expected {} fields, saw {}",
                row_no + 1,
                headers.len(),
                record.len()
            )));
        }
        // missing trailing fields read as empty, i.e. null
        for (i, col) in cells.iter_mut().enumerate() {
            col.push(record.get(i).unwrap_or("").to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| infer_csv_column(name, raw))
        .collect();
    Dataset::new(columns)
}

/// Pick the candidate delimiter that appears the same non-zero number of
/// times on every sampled line, preferring the highest such count. Falls back
/// to the most frequent candidate on the first line, then to a comma.
fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let counts = |delim: u8| -> Vec<usize> {
        lines.iter().map(|l| count_unquoted(l, delim)).collect()
    };

    let consistent = DELIMITER_CANDIDATES
        .iter()
        .filter_map(|&d| {
            let c = counts(d);
            let first = *c.first()?;
            (first > 0 && c.iter().all(|&n| n == first)).then_some((d, first))
        })
        // max_by_key keeps the last maximum; reverse so preference order wins ties
        .rev()
        .max_by_key(|&(_, n)| n);

    if let Some((d, _)) = consistent {
        return d;
    }

    DELIMITER_CANDIDATES
        .iter()
        .rev()
        .map(|&d| (d, lines.first().map_or(0, |l| count_unquoted(l, d))))
        .filter(|&(_, n)| n > 0)
        .max_by_key(|&(_, n)| n)
        .map_or(b',', |(d, _)| d)
}

fn count_unquoted(line: &str, delim: u8) -> usize {
    let mut in_quotes = false;
    let mut n = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delim && !in_quotes {
            n += 1;
        }
    }
    n
}

fn is_null_token(s: &str) -> bool {
    NULL_TOKENS.contains(&s.trim())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Type a CSV column from its raw strings: integer, then float, then boolean,
/// else text. A column with no non-null cell is float.
fn infer_csv_column(name: String, raw: Vec<String>) -> Column {
    let cells: Vec<Option<String>> = raw
        .into_iter()
        .map(|s| if is_null_token(&s) { None } else { Some(s) })
        .collect();
    let present = || cells.iter().flatten();

    let build = |dtype: ColumnType, f: &dyn Fn(&str) -> CellValue| {
        let values = cells
            .iter()
            .map(|c| c.as_deref().map_or(CellValue::Null, f))
            .collect();
        Column::new(name.clone(), dtype, values)
    };

    if present().all(|s| s.trim().parse::<i64>().is_ok()) && present().next().is_some() {
        build(ColumnType::Integer, &|s: &str| {
            s.trim().parse().map_or(CellValue::Null, CellValue::Integer)
        })
    } else if present().all(|s| s.trim().parse::<f64>().is_ok()) {
        build(ColumnType::Float, &|s: &str| {
            s.trim().parse().map_or(CellValue::Null, CellValue::Float)
        })
    } else if present().all(|s| parse_bool(s).is_some()) {
        build(ColumnType::Boolean, &|s: &str| {
            parse_bool(s).map_or(CellValue::Null, CellValue::Bool)
        })
    } else {
        build(ColumnType::Text, &|s: &str| CellValue::Text(s.to_string()))
    }
}

/// Blank header cells become `Unnamed: {i}`; repeated names get `.1`, `.2`, …
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut existing_names = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            };
            let mut cleaned = base.clone();
            let mut counter = 1;
            while !existing_names.insert(cleaned.clone()) {
                cleaned = format!("{base}.{counter}");
                counter += 1;
            }
            cleaned
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Open an `.xlsx` / `.xls` workbook. A single sheet loads directly; with
/// several sheets the caller must name one.
fn load_spreadsheet(bytes: &[u8], sheet: Option<&str>) -> Result<Loaded> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    log::info!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

    let chosen = match (sheet_names.as_slice(), sheet) {
        ([], _) => {
            return Err(AnalysisError::ParseFailure(
                "workbook contains no sheets".to_string(),
            ))
        }
        (names, Some(wanted)) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| AnalysisError::ParseFailure(format!("no sheet named '{wanted}'")))?,
        ([only], None) => only.clone(),
        (_, None) => return Ok(Loaded::NeedsSheet(sheet_names.clone())),
    };

    let range = workbook.worksheet_range(&chosen)?;
    dataset_from_range(&range).map(Loaded::Dataset)
}

/// Build a dataset from a worksheet range whose first row is the header.
pub(crate) fn dataset_from_range(range: &Range<Data>) -> Result<Dataset> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Dataset::default());
    };

    let headers = unique_headers(
        header_row
            .iter()
            .map(|cell| match cell {
                Data::Empty => String::new(),
                other => other.to_string(),
            })
            .collect(),
    );

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (idx, col) in cells.iter_mut().enumerate() {
            col.push(row.get(idx).map_or(CellValue::Null, cell_value));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| type_sheet_column(name, values))
        .collect();
    Dataset::new(columns)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(d) => d.as_datetime().map_or(CellValue::Null, CellValue::DateTime),
        Data::DateTimeIso(s) => {
            parse_datetime(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::DateTime)
        }
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

/// Type a sheet column from its cell kinds. Whole numbers make an integer
/// column, any fraction a float one; mixed kinds stay as-is in a text column.
fn type_sheet_column(name: String, values: Vec<CellValue>) -> Column {
    let present: Vec<&CellValue> = values.iter().filter(|v| !v.is_null()).collect();

    if present.is_empty() {
        return Column::new(name, ColumnType::Float, values);
    }

    let all = |pred: fn(&CellValue) -> bool| present.iter().all(|v| pred(v));

    if all(|v| matches!(v, CellValue::Integer(_) | CellValue::Float(_))) {
        let whole = present.iter().all(|v| match v {
            CellValue::Float(f) => f.fract() == 0.0 && f.abs() < i64::MAX as f64,
            _ => true,
        });
        let (dtype, values) = if whole {
            let ints = values
                .into_iter()
                .map(|v| match v {
                    CellValue::Float(f) => CellValue::Integer(f as i64),
                    other => other,
                })
                .collect();
            (ColumnType::Integer, ints)
        } else {
            let floats = values
                .into_iter()
                .map(|v| match v {
                    CellValue::Integer(i) => CellValue::Float(i as f64),
                    other => other,
                })
                .collect();
            (ColumnType::Float, floats)
        };
        Column::new(name, dtype, values)
    } else if all(|v| matches!(v, CellValue::DateTime(_))) {
        Column::new(name, ColumnType::DateTime, values)
    } else if all(|v| matches!(v, CellValue::Bool(_))) {
        Column::new(name, ColumnType::Boolean, values)
    } else {
        Column::new(name, ColumnType::Text, values)
    }
}
