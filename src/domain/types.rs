//! Request and raw-observation types.
//!
//! Request types validate on construction so the loader never sees an empty
//! country set, an empty indicator mapping, or an inverted year range. They
//! derive `Hash`/`Eq` so a `LoadRequest` can key the session cache
//! structurally.

use chrono::{Datelike, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// World Bank code for consumer-price inflation (annual %).
pub const INFLATION_CODE: &str = "FP.CPI.TOTL.ZG";
/// World Bank code for real GDP growth (annual %).
pub const GDP_GROWTH_CODE: &str = "NY.GDP.MKTP.KD.ZG";
/// World Bank code for unemployment (% of labor force, ILO estimate).
pub const UNEMPLOYMENT_CODE: &str = "SL.UEM.TOTL.ZS";

/// Countries compared on the dashboard (ISO 3166-1 alpha-3).
pub const DEFAULT_COUNTRIES_ISO3: [&str; 6] = ["JPN", "USA", "CHN", "DEU", "GBR", "IND"];

/// First year requested when the caller does not override it.
pub const DEFAULT_START_YEAR: i32 = 2010;

/// Ordered mapping of provider indicator code -> human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorSpec {
    entries: Vec<(String, String)>,
}

impl IndicatorSpec {
    pub fn new<C, L>(entries: impl IntoIterator<Item = (C, L)>) -> Result<Self, AppError>
    where
        C: Into<String>,
        L: Into<String>,
    {
        let mut out: Vec<(String, String)> = Vec::new();
        for (code, label) in entries {
            let code = code.into().trim().to_string();
            let label = label.into().trim().to_string();
            if code.is_empty() || label.is_empty() {
                return Err(AppError::new(2, "Indicator codes and labels must be non-empty."));
            }
            if out.iter().any(|(c, _)| *c == code) {
                return Err(AppError::new(2, format!("Duplicate indicator code '{code}'.")));
            }
            if out.iter().any(|(_, l)| *l == label) {
                return Err(AppError::new(2, format!("Duplicate indicator label '{label}'.")));
            }
            out.push((code, label));
        }
        if out.is_empty() {
            return Err(AppError::new(2, "At least one indicator is required."));
        }
        Ok(Self { entries: out })
    }

    /// Inflation, GDP growth, and unemployment.
    pub fn macro_default() -> Self {
        Self {
            entries: vec![
                (INFLATION_CODE.to_string(), "Inflation".to_string()),
                (GDP_GROWTH_CODE.to_string(), "GDP Growth".to_string()),
                (UNEMPLOYMENT_CODE.to_string(), "Unemployment".to_string()),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, l)| l.as_str())
    }

    /// Column position of an indicator code.
    pub fn position(&self, code: &str) -> Option<usize> {
        self.entries.iter().position(|(c, _)| c == code)
    }
}

/// Country-code alphabet expected by the active provider version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CountryCodeFormat {
    /// ISO 3166-1 alpha-2 (`JP`).
    Iso2,
    /// ISO 3166-1 alpha-3 (`JPN`).
    Iso3,
}

impl CountryCodeFormat {
    pub fn code_len(self) -> usize {
        match self {
            CountryCodeFormat::Iso2 => 2,
            CountryCodeFormat::Iso3 => 3,
        }
    }
}

/// Ordered, de-duplicated country codes in a declared format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountrySet {
    format: CountryCodeFormat,
    codes: Vec<String>,
}

impl CountrySet {
    pub fn new<S: AsRef<str>>(
        format: CountryCodeFormat,
        codes: impl IntoIterator<Item = S>,
    ) -> Result<Self, AppError> {
        let mut out: Vec<String> = Vec::new();
        for code in codes {
            let code = code.as_ref().trim().to_ascii_uppercase();
            if code.len() != format.code_len() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(AppError::new(
                    2,
                    format!(
                        "Country code '{code}' does not match format {:?} ({} characters).",
                        format,
                        format.code_len()
                    ),
                ));
            }
            if out.contains(&code) {
                return Err(AppError::new(2, format!("Duplicate country code '{code}'.")));
            }
            out.push(code);
        }
        if out.is_empty() {
            return Err(AppError::new(2, "At least one country is required."));
        }
        Ok(Self { format, codes: out })
    }

    /// Builds a set without the alphabet check.
    ///
    /// Used for synthetic providers/tests whose identifiers are not ISO codes.
    pub fn unchecked<S: Into<String>>(
        format: CountryCodeFormat,
        codes: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            format,
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn format(&self) -> CountryCodeFormat {
        self.format
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn position(&self, code: &str) -> Option<usize> {
        self.codes.iter().position(|c| c == code)
    }
}

/// Inclusive `[start, end]` calendar-year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::new(
                2,
                format!("Invalid year range: start {start} is after end {end}."),
            ));
        }
        Ok(Self { start, end })
    }

    /// `[start, current calendar year]`, evaluated at call time.
    pub fn through_current_year(start: i32) -> Result<Self, AppError> {
        Self::new(start, current_year())
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Everything that identifies one indicator load (and its cache entry).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadRequest {
    pub indicators: IndicatorSpec,
    pub countries: CountrySet,
    pub years: YearRange,
}

impl LoadRequest {
    pub fn new(indicators: IndicatorSpec, countries: CountrySet, years: YearRange) -> Self {
        Self {
            indicators,
            countries,
            years,
        }
    }
}

/// One raw long-shape observation as delivered by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub country: String,
    pub indicator: String,
    /// Period token, e.g. `"2010"` or `"YR2010"`.
    pub period: String,
    pub value: Option<f64>,
}

impl ObservationRecord {
    pub fn new(
        country: impl Into<String>,
        indicator: impl Into<String>,
        period: impl Into<String>,
        value: Option<f64>,
    ) -> Self {
        Self {
            country: country.into(),
            indicator: indicator.into(),
            period: period.into(),
            value,
        }
    }
}

/// One raw wide-shape row: a (country, indicator) series with years as columns.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRecord {
    pub country: String,
    pub indicator: String,
    pub cells: Vec<(String, Option<f64>)>,
}

/// Whatever shape the provider returned.
#[derive(Debug, Clone, PartialEq)]
pub enum RawObservations {
    Long(Vec<ObservationRecord>),
    Wide(Vec<WideRecord>),
}
