//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the column type tag set (`ColumnType`) and cell values (`Value`)
//! - the in-memory table (`Frame`)
//! - warehouse credentials and the target table descriptor
//! - the resolved push configuration (`PushConfig`)

pub mod types;

pub use types::*;
