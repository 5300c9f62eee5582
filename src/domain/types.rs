//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built once at load time and passed around by reference
//! - rendered in the preview table and the TUI
//! - mapped deterministically onto warehouse column types

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Closed set of column type tags, assigned once at load time.
///
/// The schema mapper is a total function over this set; inference never
/// leaves a column untagged (anything non-numeric falls back to `Text`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Timestamp without timezone (the coerced `Date` column).
    Timestamp,
    /// 64-bit floating point.
    Float,
    /// 64-bit integer.
    Integer,
    /// Everything else: free text, booleans, mixed content.
    Text,
}

/// A single cell. Every cell carries the tag of its column; `Null` is valid
/// under any tag (empty CSV fields).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Timestamp(NaiveDateTime),
    Float(f64),
    Integer(i64),
    Text(String),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Cell contents for preview rendering (empty string for nulls).
    pub fn display(&self) -> String {
        match self {
            Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Float(v) => format!("{v}"),
            Value::Integer(v) => format!("{v}"),
            Value::Text(s) => s.clone(),
            Value::Null => String::new(),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// In-memory table: ordered columns plus ordered rows.
///
/// Invariant: every row has exactly `columns.len()` values (possibly `Null`).
/// The loader enforces this; all other code may rely on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// First `n` rows (for previews). Column order is preserved.
    pub fn head(&self, n: usize) -> Frame {
        Frame {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Finite f64 series for a column, in row order (nulls and non-numeric
    /// cells are skipped). Used by the chart layers.
    pub fn numeric_series(&self, name: &str) -> Vec<f64> {
        let Some(idx) = self.column_index(name) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| match &row[idx] {
                Value::Float(v) if v.is_finite() => Some(*v),
                Value::Integer(v) => Some(*v as f64),
                _ => None,
            })
            .collect()
    }
}

/// The name of the column that is coerced to a timestamp on load.
pub const DATE_COLUMN: &str = "Date";

/// Warehouse connection credentials.
///
/// Five opaque strings. Fields missing from the credential file stay `None`
/// (that is not an error); empty manual inputs are also valid and simply fail
/// later at connect time. Never persisted beyond the process lifetime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub account: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

impl Credentials {
    /// Build credentials from five free-text fields (manual entry mode).
    ///
    /// Blank fields become `None`; no further validation happens here.
    pub fn manual(account: &str, user: &str, password: &str, database: &str, schema: &str) -> Self {
        fn opt(s: &str) -> Option<String> {
            let s = s.trim();
            if s.is_empty() { None } else { Some(s.to_string()) }
        }
        Self {
            account: opt(account),
            user: opt(user),
            password: opt(password),
            database: opt(database),
            schema: opt(schema),
        }
    }
}

/// Fully-qualified target for materialization.
///
/// `name` is the user-facing table name; case normalization to upper-case
/// happens when the qualified identifier is built, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTable {
    pub database: String,
    pub schema: String,
    pub name: String,
}

/// A resolved one-shot run configuration (derived from CLI flags).
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub csv_path: PathBuf,
    /// Path to the JSON credential file, if credentials come from a file.
    pub creds_path: Option<PathBuf>,
    /// Manual credentials (used when no file path is given).
    pub manual_creds: Credentials,
    /// Closed date interval; `None` means the full range of the loaded data.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Table name override; `None` derives the name from the CSV file stem.
    pub table_name: Option<String>,
}
