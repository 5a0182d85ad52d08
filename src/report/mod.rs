//! Reporting utilities: formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the data/AI code stays clean and testable
//! - output changes are localized

pub mod format;

pub use format::*;
