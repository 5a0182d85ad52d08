//! Indicator acquisition: providers, normalization, and the session loader.

pub mod cache;
pub mod export_csv;
pub mod loader;
pub mod reshape;
pub mod source;
pub mod worldbank;

pub use export_csv::CsvExportSource;
pub use loader::{IndicatorLoader, LoadOutcome};
pub use source::IndicatorSource;
pub use worldbank::WorldBankSource;
