//! Frame-level derivations: the date-range filter and its helpers.

pub mod filter;

pub use filter::*;
