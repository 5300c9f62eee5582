//! Schema mapping and table materialization.
//!
//! "Materialize" means: create the target table if it does not exist, then
//! bulk-insert the frame's current contents. The column schema is derived
//! from the frame's type tags by a total mapping — no column is ever left
//! unmapped.
//!
//! The protocol is deliberately non-atomic: if the create succeeds and the
//! insert fails, the table is left created-but-empty (or partially populated,
//! depending on warehouse transaction semantics) and the whole operation
//! reports failure. Re-running is safe only because the create step is
//! idempotent; re-running after a *successful* save appends duplicate rows —
//! there are no upsert/merge semantics here.

use std::path::Path;

use crate::domain::{ColumnType, Frame, TargetTable, Value};
use crate::error::AppError;
use crate::warehouse::Session;

/// Map a column tag to its warehouse column type.
///
/// Total and deterministic over the closed tag set; `Text` is the catch-all.
pub fn warehouse_type(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Timestamp => "TIMESTAMP",
        ColumnType::Float => "FLOAT",
        ColumnType::Integer => "INTEGER",
        ColumnType::Text => "VARCHAR",
    }
}

/// Column definitions in the frame's original column order.
///
/// Each name is individually double-quoted so arbitrary characters and case
/// survive the warehouse's identifier folding.
pub fn column_defs(frame: &Frame) -> Vec<String> {
    frame
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), warehouse_type(c.ty)))
        .collect()
}

/// Fully-qualified, triple-quoted identifier:
/// `"database"."schema"."TABLE_NAME_UPPERCASED"`.
///
/// Only the table name is case-normalized; database and schema are quoted
/// as given.
pub fn qualified_name(target: &TargetTable) -> String {
    format!(
        "{}.{}.{}",
        quote_ident(&target.database),
        quote_ident(&target.schema),
        quote_ident(&target.name.to_uppercase()),
    )
}

fn quote_ident(name: &str) -> String {
    // Embedded double quotes double up, per SQL identifier quoting.
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Idempotent create statement for the target table.
///
/// `IF NOT EXISTS` makes re-runs safe; it does NOT verify that an existing
/// table's schema matches the derived columns — a mismatch surfaces later as
/// an insert failure, not here.
pub fn create_table_sql(target: &TargetTable, frame: &Frame) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified_name(target),
        column_defs(frame).join(", "),
    )
}

/// SQL literal for a single cell.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
        Value::Float(v) => format!("{v}"),
        Value::Integer(v) => format!("{v}"),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Null => "NULL".to_string(),
    }
}

/// Multi-row insert statement for a batch of rows.
pub fn insert_sql<'a>(target: &TargetTable, frame: &Frame, rows: impl Iterator<Item = &'a Vec<Value>>) -> String {
    let cols = frame
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let values = rows
        .map(|row| {
            let cells = row.iter().map(sql_literal).collect::<Vec<_>>().join(", ");
            format!("({cells})")
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("INSERT INTO {} ({cols}) VALUES {values}", qualified_name(target))
}

/// Default table name: the CSV file's base name with spaces replaced by
/// underscores. Upper-casing happens in `qualified_name`, not here, so the
/// user-visible default keeps the file's casing.
pub fn default_table_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UPLOAD")
        .replace(' ', "_")
}

/// Materialize `frame` into `target`: derive the schema, create the table if
/// absent, bulk-insert every row, and report the count of rows written.
///
/// Any step failing surfaces as a single `Materialization` error carrying the
/// underlying diagnostic; no rollback or cleanup is attempted.
pub fn save(session: &mut dyn Session, frame: &Frame, target: &TargetTable) -> Result<usize, AppError> {
    let create = create_table_sql(target, frame);
    session.execute(&create).map_err(|e| {
        AppError::Materialization(format!(
            "Failed to create table {}: {e}",
            qualified_name(target)
        ))
    })?;

    if frame.is_empty() {
        return Ok(0);
    }

    session.insert_rows(target, frame).map_err(|e| {
        AppError::Materialization(format!(
            "Failed to write rows to {}: {e}",
            qualified_name(target)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_frame_from_reader;

    /// Records statements and rows instead of talking to a warehouse.
    #[derive(Default)]
    struct RecordingSession {
        statements: Vec<String>,
        rows_by_table: std::collections::HashMap<String, usize>,
        fail_insert: bool,
    }

    impl Session for RecordingSession {
        fn execute(&mut self, sql: &str) -> Result<(), AppError> {
            self.statements.push(sql.to_string());
            Ok(())
        }

        fn insert_rows(&mut self, target: &TargetTable, frame: &Frame) -> Result<usize, AppError> {
            if self.fail_insert {
                return Err(AppError::Connection("insert rejected".to_string()));
            }
            let n = frame.n_rows();
            *self.rows_by_table.entry(qualified_name(target)).or_insert(0) += n;
            Ok(n)
        }
    }

    fn price_frame() -> Frame {
        load_frame_from_reader(
            "Date,Close,Volume,Note\n\
             2024-01-01,101.5,1000,it's fine\n\
             2024-01-02,102.25,1100,\n"
                .as_bytes(),
            "aapl daily.csv",
        )
        .unwrap()
    }

    fn target() -> TargetTable {
        TargetTable {
            database: "ANALYTICS".to_string(),
            schema: "PUBLIC".to_string(),
            name: "aapl_daily".to_string(),
        }
    }

    #[test]
    fn mapping_is_total_and_deterministic() {
        for ty in [
            ColumnType::Timestamp,
            ColumnType::Float,
            ColumnType::Integer,
            ColumnType::Text,
        ] {
            assert_eq!(warehouse_type(ty), warehouse_type(ty));
            assert!(!warehouse_type(ty).is_empty());
        }
        assert_eq!(warehouse_type(ColumnType::Float), "FLOAT");
        assert_eq!(warehouse_type(ColumnType::Text), "VARCHAR");
        assert_eq!(warehouse_type(ColumnType::Timestamp), "TIMESTAMP");
        assert_eq!(warehouse_type(ColumnType::Integer), "INTEGER");
    }

    #[test]
    fn column_defs_follow_frame_order_and_quote_names() {
        let defs = column_defs(&price_frame());
        assert_eq!(
            defs,
            vec![
                "\"Date\" TIMESTAMP",
                "\"Close\" FLOAT",
                "\"Volume\" INTEGER",
                "\"Note\" VARCHAR",
            ]
        );
    }

    #[test]
    fn qualified_name_uppercases_only_the_table() {
        assert_eq!(
            qualified_name(&target()),
            "\"ANALYTICS\".\"PUBLIC\".\"AAPL_DAILY\""
        );

        let mixed = TargetTable {
            database: "analytics".to_string(),
            schema: "raw".to_string(),
            name: "My Table".to_string(),
        };
        assert_eq!(qualified_name(&mixed), "\"analytics\".\"raw\".\"MY TABLE\"");
    }

    #[test]
    fn create_statement_is_idempotent_form() {
        let sql = create_table_sql(&target(), &price_frame());
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"ANALYTICS\".\"PUBLIC\".\"AAPL_DAILY\""));
        assert!(sql.contains("\"Close\" FLOAT"));
    }

    #[test]
    fn literals_escape_quotes_and_encode_null() {
        let frame = price_frame();
        assert_eq!(sql_literal(&frame.rows[0][3]), "'it''s fine'");
        assert_eq!(sql_literal(&frame.rows[1][3]), "NULL");
        assert_eq!(sql_literal(&frame.rows[0][0]), "'2024-01-01 00:00:00'");
        assert_eq!(sql_literal(&Value::Integer(1000)), "1000");
    }

    #[test]
    fn default_table_name_replaces_spaces() {
        assert_eq!(default_table_name(Path::new("my stock data.csv")), "my_stock_data");
        assert_eq!(default_table_name(Path::new("/tmp/AAPL.csv")), "AAPL");
    }

    #[test]
    fn save_reports_rows_written() {
        let mut session = RecordingSession::default();
        let n = save(&mut session, &price_frame(), &target()).unwrap();
        assert_eq!(n, 2);
        assert_eq!(session.statements.len(), 1);
        assert!(session.statements[0].contains("IF NOT EXISTS"));
    }

    #[test]
    fn create_is_idempotent_insert_is_not() {
        let mut session = RecordingSession::default();
        let frame = price_frame();
        let t = target();

        // Two saves with an empty frame in between never error on "exists".
        let empty = Frame {
            columns: frame.columns.clone(),
            rows: Vec::new(),
        };
        save(&mut session, &frame, &t).unwrap();
        save(&mut session, &empty, &t).unwrap();
        save(&mut session, &frame, &t).unwrap();

        // The doubling is the documented contract, not a bug: no dedup.
        assert_eq!(session.rows_by_table[&qualified_name(&t)], 4);
    }

    #[test]
    fn insert_failure_is_materialization_error_without_cleanup() {
        let mut session = RecordingSession {
            fail_insert: true,
            ..Default::default()
        };
        let err = save(&mut session, &price_frame(), &target()).unwrap_err();
        assert!(matches!(err, AppError::Materialization(_)), "got {err:?}");
        assert!(err.to_string().contains("insert rejected"));
        // The create already ran; nothing rolls it back.
        assert_eq!(session.statements.len(), 1);
    }

    #[test]
    fn insert_sql_lists_columns_and_rows() {
        let frame = price_frame();
        let sql = insert_sql(&target(), &frame, frame.rows.iter());
        assert!(sql.starts_with("INSERT INTO \"ANALYTICS\".\"PUBLIC\".\"AAPL_DAILY\""));
        assert!(sql.contains("(\"Date\", \"Close\", \"Volume\", \"Note\")"));
        assert!(sql.contains("('2024-01-01 00:00:00', 101.5, 1000, 'it''s fine')"));
        assert!(sql.ends_with("('2024-01-02 00:00:00', 102.25, 1100, NULL)"));
    }
}
