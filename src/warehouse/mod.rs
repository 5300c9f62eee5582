//! Warehouse session and materialization.
//!
//! The wire protocol lives behind the `Session` trait so the materializer can
//! be exercised against a recording fake in tests; `http` provides the one
//! real implementation (blocking SQL-over-HTTP). `materialize` is the core:
//! schema mapping plus the create-and-bulk-insert protocol.

pub mod http;
pub mod materialize;

pub use http::{HttpSession, connect};
pub use materialize::*;

use crate::domain::{Frame, TargetTable};
use crate::error::AppError;

/// A live warehouse session.
///
/// The contract with the connector is deliberately small: run one statement,
/// or bulk-load one frame into one target. The session is an explicit value —
/// callers decide its lifetime, and reconnecting simply replaces the old
/// session without closing it (short-lived interactive process).
pub trait Session {
    /// Execute a single SQL statement, discarding any result rows.
    fn execute(&mut self, sql: &str) -> Result<(), AppError>;

    /// Bulk-insert every row of `frame` into `target`, returning the number
    /// of rows written.
    fn insert_rows(&mut self, target: &TargetTable, frame: &Frame) -> Result<usize, AppError>;
}
