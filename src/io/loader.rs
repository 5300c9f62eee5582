//! CSV load and type inference.
//!
//! This module turns an uploaded CSV stream into a typed `Frame`:
//!
//! - **Strict parsing**: a stream that is not valid delimited text is a
//!   `Parse` error, not a partially-loaded table
//! - **One inference pass**: each column gets exactly one `ColumnType` tag at
//!   load time, so downstream schema mapping is a pure function over tags
//! - **`Date` coercion**: the column literally named `Date` must parse as a
//!   timestamp in every non-empty cell (`TypeCoercion` otherwise)
//!
//! Presence of `Close`/`Volume` is NOT validated here; their absence surfaces
//! in the chart layer as an empty series.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::{Column, ColumnType, DATE_COLUMN, Frame, Value};
use crate::error::AppError;

/// Load a CSV file into a typed `Frame`.
pub fn load_frame(path: &Path) -> Result<Frame, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::Parse(format!("Failed to open CSV '{}': {e}", path.display())))?;
    load_frame_from_reader(file, &path.display().to_string())
}

/// Load a CSV byte stream into a typed `Frame`.
///
/// `source` is only used in error messages.
pub fn load_frame_from_reader<R: Read>(reader: R, source: &str) -> Result<Frame, AppError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| AppError::Parse(format!("Failed to read CSV headers from '{source}': {e}")))?
        .clone();

    if headers.is_empty() {
        return Err(AppError::Parse(format!("CSV '{source}' has no header row.")));
    }

    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    let n_cols = names.len();

    // First pass: collect raw cells. Every row must have one cell per column;
    // the csv reader rejects ragged records for us (non-flexible mode).
    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (idx, result) in csv_reader.records().enumerate() {
        // +2: records() starts after the header row, and lines are 1-based.
        let line = idx + 2;
        let record = result
            .map_err(|e| AppError::Parse(format!("CSV parse error in '{source}' line {line}: {e}")))?;
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    // Second pass: infer one type tag per column over the full column.
    let mut columns = Vec::with_capacity(n_cols);
    for (col, name) in names.iter().enumerate() {
        let ty = if name == DATE_COLUMN {
            ColumnType::Timestamp
        } else {
            infer_column_type(raw_rows.iter().map(|row| row[col].as_str()))
        };
        columns.push(Column {
            name: name.clone(),
            ty,
        });
    }

    // Third pass: coerce cells under their column tag.
    let mut rows = Vec::with_capacity(raw_rows.len());
    for (idx, raw) in raw_rows.iter().enumerate() {
        let line = idx + 2;
        let mut row = Vec::with_capacity(n_cols);
        for (cell, column) in raw.iter().zip(&columns) {
            row.push(coerce_cell(cell, column, source, line)?);
        }
        rows.push(row);
    }

    Ok(Frame { columns, rows })
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿Date"). If we don't strip it, the `Date` column
    // would not be recognized and coercion would silently not happen.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// Infer a column tag from all non-empty cells.
///
/// All-integer wins over all-float; anything that is not uniformly numeric
/// falls back to `Text`. Empty cells don't vote. A column with no values at
/// all is `Text` (it will materialize as VARCHAR full of NULLs).
fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut saw_value = false;
    let mut all_int = true;
    let mut all_float = true;

    for cell in cells {
        if cell.is_empty() {
            continue;
        }
        saw_value = true;
        if cell.parse::<i64>().is_err() {
            all_int = false;
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => {}
            _ => all_float = false,
        }
        if !all_int && !all_float {
            return ColumnType::Text;
        }
    }

    match (saw_value, all_int) {
        (false, _) => ColumnType::Text,
        (true, true) => ColumnType::Integer,
        (true, false) => ColumnType::Float,
    }
}

fn coerce_cell(cell: &str, column: &Column, source: &str, line: usize) -> Result<Value, AppError> {
    if cell.is_empty() {
        return Ok(Value::Null);
    }

    match column.ty {
        ColumnType::Timestamp => parse_timestamp(cell).map(Value::Timestamp).ok_or_else(|| {
            AppError::TypeCoercion(format!(
                "Invalid `{}` value '{cell}' in '{source}' line {line}. \
                 Expected a date like YYYY-MM-DD (optionally with HH:MM:SS).",
                column.name
            ))
        }),
        // Inference already proved these parse; a failure here would mean the
        // tag and the data disagree, which we treat as a loader bug surface.
        ColumnType::Integer => cell
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| AppError::Parse(format!("Invalid integer '{cell}' in '{source}' line {line}: {e}"))),
        ColumnType::Float => cell
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| AppError::Parse(format!("Invalid number '{cell}' in '{source}' line {line}: {e}"))),
        ColumnType::Text => Ok(Value::Text(cell.to_string())),
    }
}

/// Parse a timestamp from the small set of formats we accept.
///
/// We recommend ISO dates (`YYYY-MM-DD`), but market-data exports often use
/// `DD/MM/YYYY` or carry a time component. Parsing stays deterministic: the
/// first matching format wins, bare dates land at midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Result<Frame, AppError> {
        load_frame_from_reader(csv.as_bytes(), "test.csv")
    }

    #[test]
    fn infers_tags_and_coerces_date() {
        let frame = load(
            "Date,Close,Volume,Note\n\
             2024-01-01,101.5,1000,ok\n\
             2024-01-02,102.25,1100,\n",
        )
        .unwrap();

        let tags: Vec<ColumnType> = frame.columns.iter().map(|c| c.ty).collect();
        assert_eq!(
            tags,
            vec![
                ColumnType::Timestamp,
                ColumnType::Float,
                ColumnType::Integer,
                ColumnType::Text,
            ]
        );

        assert_eq!(frame.n_rows(), 2);
        assert_eq!(
            frame.rows[0][0],
            Value::Timestamp(
                NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
        // Empty Note cell is Null, and every row still has one cell per column.
        assert_eq!(frame.rows[1][3], Value::Null);
        assert!(frame.rows.iter().all(|r| r.len() == frame.n_cols()));
    }

    #[test]
    fn mixed_numeric_column_is_float() {
        let frame = load("Date,Close\n2024-01-01,100\n2024-01-02,100.5\n").unwrap();
        assert_eq!(frame.columns[1].ty, ColumnType::Float);
        assert_eq!(frame.rows[0][1], Value::Float(100.0));
    }

    #[test]
    fn mixed_content_column_is_text() {
        let frame = load("Date,Flag\n2024-01-01,true\n2024-01-02,7\n").unwrap();
        assert_eq!(frame.columns[1].ty, ColumnType::Text);
    }

    #[test]
    fn bad_date_is_type_coercion_error() {
        let err = load("Date,Close\n2024-01-01,1.0\nnot-a-date,2.0\n").unwrap_err();
        assert!(matches!(err, AppError::TypeCoercion(_)), "got {err:?}");
        assert!(err.to_string().contains("not-a-date"));
    }

    #[test]
    fn ragged_row_is_parse_error() {
        let err = load("Date,Close\n2024-01-01,1.0,extra\n").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn bom_on_first_header_is_stripped() {
        let frame = load("\u{feff}Date,Close\n2024-01-01,1.0\n").unwrap();
        assert_eq!(frame.columns[0].name, "Date");
        assert_eq!(frame.columns[0].ty, ColumnType::Timestamp);
    }

    #[test]
    fn accepts_datetime_and_slash_formats() {
        let frame = load("Date,Close\n2024-01-01 09:30:00,1.0\n").unwrap();
        let Value::Timestamp(ts) = &frame.rows[0][0] else {
            panic!("expected timestamp");
        };
        assert_eq!(ts.format("%H:%M").to_string(), "09:30");

        let frame = load("Date,Close\n31/01/2024,1.0\n").unwrap();
        let Value::Timestamp(ts) = &frame.rows[0][0] else {
            panic!("expected timestamp");
        };
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn missing_close_volume_is_not_an_error() {
        // Chart columns are a presentation concern; the loader stays agnostic.
        let frame = load("Date,Whatever\n2024-01-01,x\n").unwrap();
        assert!(frame.column_index("Close").is_none());
        assert!(frame.numeric_series("Close").is_empty());
    }
}
