//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - request inputs (`IndicatorSpec`, `CountrySet`, `YearRange`, `LoadRequest`)
//! - raw provider observations (`ObservationRecord`, `WideRecord`, `RawObservations`)
//! - the canonical per-country/per-year table (`IndicatorTable`)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
