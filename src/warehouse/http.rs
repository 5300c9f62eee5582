//! Blocking SQL-over-HTTP warehouse session.
//!
//! The warehouse exposes a statements endpoint: one POST per SQL statement,
//! JSON in and out. This module owns the only network code in the crate —
//! everything above it talks to the `Session` trait.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::domain::{Credentials, Frame, TargetTable};
use crate::error::AppError;
use crate::warehouse::{Session, materialize};

const STATEMENTS_PATH: &str = "/api/v2/statements";

/// Rows per INSERT statement. Multi-row VALUES lists keep the request count
/// low without hitting statement-size limits on typical uploads.
const INSERT_BATCH_ROWS: usize = 500;

/// A live connection to the warehouse.
///
/// Holds the resolved account endpoint and credentials for the lifetime of
/// the interactive session. There is no explicit close: dropping the session
/// drops the handle (accepted for a short-lived interactive process).
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    base_url: String,
    user: String,
    password: String,
    database: String,
    schema: String,
}

/// Open a session using the five credential fields.
///
/// Fails with `Connection` on any missing field, unreachable network, or
/// warehouse-side rejection. No retry is attempted — the caller re-invokes
/// explicitly. Calling `connect` again simply replaces the prior session.
pub fn connect(creds: &Credentials) -> Result<HttpSession, AppError> {
    let account = required(&creds.account, "account")?;
    let user = required(&creds.user, "user")?;
    let password = required(&creds.password, "password")?;
    let database = required(&creds.database, "database")?;
    let schema = required(&creds.schema, "schema")?;

    let mut session = HttpSession {
        client: Client::new(),
        base_url: account_base_url(&account),
        user,
        password,
        database,
        schema,
    };

    // Probe the connection so bad credentials fail at connect time rather
    // than at the first save.
    session
        .post_statement("SELECT 1")
        .map_err(|e| AppError::Connection(format!("Failed to connect to warehouse: {e}")))?;

    Ok(session)
}

fn required(field: &Option<String>, name: &str) -> Result<String, AppError> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Connection(format!("Missing credential field: {name}")))
}

fn account_base_url(account: &str) -> String {
    // Accept either a bare account identifier or a full URL.
    if account.starts_with("http://") || account.starts_with("https://") {
        account.trim_end_matches('/').to_string()
    } else {
        format!("https://{account}.snowflakecomputing.com")
    }
}

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    database: &'a str,
    schema: &'a str,
}

#[derive(Debug, Deserialize)]
struct StatementError {
    message: Option<String>,
}

impl HttpSession {
    fn post_statement(&mut self, sql: &str) -> Result<(), AppError> {
        let body = StatementRequest {
            statement: sql,
            database: &self.database,
            schema: &self.schema,
        };

        let resp = self
            .client
            .post(format!("{}{STATEMENTS_PATH}", self.base_url))
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .map_err(|e| AppError::Connection(format!("Warehouse request failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        // Prefer the server's diagnostic when the error body is decodable.
        let detail = resp
            .json::<StatementError>()
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("status {status}"));
        Err(AppError::Connection(format!(
            "Warehouse rejected statement: {detail}"
        )))
    }
}

impl Session for HttpSession {
    fn execute(&mut self, sql: &str) -> Result<(), AppError> {
        self.post_statement(sql)
    }

    fn insert_rows(&mut self, target: &TargetTable, frame: &Frame) -> Result<usize, AppError> {
        let mut written = 0usize;
        for batch in frame.rows.chunks(INSERT_BATCH_ROWS) {
            let sql = materialize::insert_sql(target, frame, batch.iter());
            self.post_statement(&sql)?;
            written += batch.len();
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_from_bare_account_or_full_url() {
        assert_eq!(
            account_base_url("acme-xy12345"),
            "https://acme-xy12345.snowflakecomputing.com"
        );
        assert_eq!(
            account_base_url("https://warehouse.internal:8443/"),
            "https://warehouse.internal:8443"
        );
    }

    #[test]
    fn missing_field_fails_at_connect_not_later() {
        let creds = Credentials {
            account: Some("acme".to_string()),
            user: Some("loader".to_string()),
            password: None,
            database: Some("ANALYTICS".to_string()),
            schema: Some("PUBLIC".to_string()),
        };
        let err = connect(&creds).unwrap_err();
        assert!(matches!(err, AppError::Connection(_)), "got {err:?}");
        assert!(err.to_string().contains("password"));
    }
}
