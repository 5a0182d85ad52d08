//! Command-line parsing for the indicator dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! data and narrative code; `config.rs` turns these flags into a
//! `DashboardConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{CountryCodeFormat, DEFAULT_START_YEAR};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "econ", version, about = "Global Econ Monitor (World Bank indicators + AI narrative)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the per-country/per-year indicator table.
    Table(TableArgs),
    /// Draw one indicator over time as an ASCII chart.
    Chart(ChartArgs),
    /// Ask the generative model for a short comparison of the latest year.
    Narrate(NarrateArgs),
    /// List text-generation models and show which one would be used.
    Models(DashboardArgs),
    /// Launch the interactive dashboard.
    Tui(DashboardArgs),
}

/// Options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct DashboardArgs {
    /// Comma-separated country codes (format set by --country-format).
    #[arg(short = 'c', long, value_delimiter = ',')]
    pub countries: Option<Vec<String>>,

    /// Country-code alphabet expected by the provider.
    #[arg(long, value_enum, default_value_t = CountryCodeFormat::Iso3)]
    pub country_format: CountryCodeFormat,

    /// First year to request.
    #[arg(long, default_value_t = DEFAULT_START_YEAR)]
    pub start_year: i32,

    /// Last year to request (defaults to the current year).
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Read a wide indicator export (economy,series,YR2010,...) instead of calling the API.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Model marker substrings in preference order (repeatable).
    #[arg(long = "model-marker", value_name = "MARKER")]
    pub model_markers: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct TableArgs {
    #[command(flatten)]
    pub dashboard: DashboardArgs,

    /// Write the table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    #[command(flatten)]
    pub dashboard: DashboardArgs,

    /// Indicator label to chart (defaults to the first indicator).
    #[arg(short = 'i', long)]
    pub indicator: Option<String>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct NarrateArgs {
    #[command(flatten)]
    pub dashboard: DashboardArgs,

    /// Year to describe (defaults to the latest year with data).
    #[arg(long)]
    pub year: Option<i32>,

    /// Also write a Markdown brief (latest-year table + narrative).
    #[arg(long, value_name = "MD")]
    pub brief: Option<PathBuf>,
}
