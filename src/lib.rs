//! `econ-monitor` library crate.
//!
//! The binary (`econ`) is a thin wrapper around this library so that:
//!
//! - loading, reshaping, and narrative generation are testable without
//!   spawning processes or touching the network
//! - the CLI and the dashboard share one session workflow

pub mod ai;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod tui;
