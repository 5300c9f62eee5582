//! Input/output helpers.
//!
//! - CSV load + type inference (`loader`)
//! - credential file resolution (`creds`)

pub mod creds;
pub mod loader;

pub use creds::*;
pub use loader::*;
