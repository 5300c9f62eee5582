//! Shared upload pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> date filter -> (preview/charts) and, on save, -> materialize
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::Path;

use chrono::NaiveDate;

use crate::domain::{Credentials, Frame, PushConfig, TargetTable};
use crate::error::AppError;
use crate::frame::{date_bounds, day_interval, filter_by_date};
use crate::io::{creds, loader};
use crate::warehouse::{self, materialize};

/// A loaded CSV plus its derived filtered view.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub frame: Frame,
    pub filtered: Frame,
    /// Default table name derived from the file stem.
    pub default_table: String,
}

/// Load a CSV and apply the (optional) date interval.
///
/// With no interval given, the filtered view is the full range — identical to
/// the loaded frame.
pub fn run_load(path: &Path, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Loaded, AppError> {
    let frame = loader::load_frame(path)?;

    let filtered = match resolve_interval(&frame, start, end) {
        Some((s, e)) => filter_by_date(&frame, s, e),
        None => frame.clone(),
    };

    Ok(Loaded {
        frame,
        filtered,
        default_table: materialize::default_table_name(path),
    })
}

fn resolve_interval(
    frame: &Frame,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Option<(chrono::NaiveDateTime, chrono::NaiveDateTime)> {
    if start.is_none() && end.is_none() {
        return None;
    }
    let bounds = date_bounds(frame);
    let start = start
        .map(|d| day_interval(d, d).0)
        .or(bounds.map(|(min, _)| min))?;
    let end = end
        .map(|d| day_interval(d, d).1)
        .or(bounds.map(|(_, max)| max))?;
    Some((start, end))
}

/// Resolve credentials per the configured mode: file path if given, manual
/// fields otherwise.
pub fn resolve_credentials(config: &PushConfig) -> Result<Credentials, AppError> {
    match &config.creds_path {
        Some(path) => creds::load_credentials(path),
        None => Ok(config.manual_creds.clone()),
    }
}

/// Output of a one-shot push.
#[derive(Debug, Clone)]
pub struct PushOutput {
    pub rows_written: usize,
    pub target: TargetTable,
}

/// Execute the full one-shot push: load, filter, connect, materialize.
pub fn run_push(config: &PushConfig) -> Result<PushOutput, AppError> {
    let loaded = run_load(&config.csv_path, config.start, config.end)?;

    let credentials = resolve_credentials(config)?;
    let mut session = warehouse::connect(&credentials)?;

    let target = target_from(&credentials, config.table_name.as_deref(), &loaded.default_table)?;
    let rows_written = materialize::save(&mut session, &loaded.filtered, &target)?;

    Ok(PushOutput {
        rows_written,
        target,
    })
}

/// Build the target descriptor from the connected credentials and the chosen
/// table name (user override or file-derived default).
pub fn target_from(
    credentials: &Credentials,
    override_name: Option<&str>,
    default_table: &str,
) -> Result<TargetTable, AppError> {
    let database = credentials
        .database
        .clone()
        .ok_or_else(|| AppError::Materialization("No database in credentials.".to_string()))?;
    let schema = credentials
        .schema
        .clone()
        .ok_or_else(|| AppError::Materialization("No schema in credentials.".to_string()))?;

    let name = override_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default_table)
        .to_string();

    Ok(TargetTable {
        database,
        schema,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_prefers_override_then_default() {
        let creds = Credentials {
            database: Some("ANALYTICS".to_string()),
            schema: Some("PUBLIC".to_string()),
            ..Default::default()
        };
        let t = target_from(&creds, Some("custom"), "aapl_daily").unwrap();
        assert_eq!(t.name, "custom");

        let t = target_from(&creds, Some("   "), "aapl_daily").unwrap();
        assert_eq!(t.name, "aapl_daily");

        let t = target_from(&creds, None, "aapl_daily").unwrap();
        assert_eq!(t.name, "aapl_daily");
    }

    #[test]
    fn target_requires_database_and_schema() {
        let err = target_from(&Credentials::default(), None, "t").unwrap_err();
        assert!(matches!(err, AppError::Materialization(_)), "got {err:?}");
    }
}
