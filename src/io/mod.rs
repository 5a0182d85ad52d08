//! Input/output helpers.
//!
//! - canonical table -> CSV (`export`)
//! - latest-year slice + narrative -> Markdown brief (`brief`)

pub mod brief;
pub mod export;

pub use brief::*;
pub use export::*;
