//! Explicit run configuration.
//!
//! Everything the core needs (indicator request inputs, provider endpoints,
//! the API key) is gathered here once, from `.env`/environment and CLI flags,
//! and passed into constructors. Nothing below this layer reads the
//! environment.

use std::path::PathBuf;

use crate::ai::catalog::{ModelPreference, FALLBACK_MODEL};
use crate::ai::prompt::PromptTemplate;
use crate::cli::DashboardArgs;
use crate::domain::{
    current_year, CountryCodeFormat, CountrySet, IndicatorSpec, LoadRequest, YearRange,
};
use crate::error::AppError;

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];
const WORLDBANK_URL_VAR: &str = "ECON_WORLDBANK_URL";
const GEMINI_URL_VAR: &str = "ECON_GEMINI_URL";

/// Where indicator observations come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    WorldBank { base_url: String },
    CsvExport { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub preference: ModelPreference,
    pub template: PromptTemplate,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub indicators: IndicatorSpec,
    pub countries: CountrySet,
    pub start_year: i32,
    /// `None` means "through the current calendar year", resolved per load.
    pub end_year: Option<i32>,
    pub source: SourceConfig,
    pub ai: AiConfig,
}

impl DashboardConfig {
    /// Build from CLI flags plus `.env` / process environment.
    pub fn from_args(args: &DashboardArgs) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let api_key = API_KEY_VARS.iter().find_map(|name| env(*name));
        Self::from_parts(
            args,
            api_key,
            env(WORLDBANK_URL_VAR),
            env(GEMINI_URL_VAR),
        )
    }

    /// Build from flags and explicitly supplied environment values.
    pub fn from_parts(
        args: &DashboardArgs,
        api_key: Option<String>,
        worldbank_url: Option<String>,
        gemini_url: Option<String>,
    ) -> Result<Self, AppError> {
        let countries = match &args.countries {
            Some(list) => CountrySet::new(args.country_format, list.iter())?,
            None => default_countries(args.country_format)?,
        };

        if let Some(end) = args.end_year {
            YearRange::new(args.start_year, end)?;
        } else if args.start_year > current_year() {
            return Err(AppError::new(
                2,
                format!("Start year {} is in the future.", args.start_year),
            ));
        }

        let source = match &args.csv {
            Some(path) => SourceConfig::CsvExport { path: path.clone() },
            None => SourceConfig::WorldBank {
                base_url: worldbank_url
                    .unwrap_or_else(|| crate::data::worldbank::DEFAULT_BASE_URL.to_string()),
            },
        };

        let preference = if args.model_markers.is_empty() {
            ModelPreference::default()
        } else {
            ModelPreference::new(args.model_markers.iter().cloned(), FALLBACK_MODEL)
        };

        Ok(Self {
            indicators: IndicatorSpec::macro_default(),
            countries,
            start_year: args.start_year,
            end_year: args.end_year,
            source,
            ai: AiConfig {
                api_key,
                base_url: gemini_url.unwrap_or_else(|| crate::ai::gemini::DEFAULT_BASE_URL.to_string()),
                preference,
                template: PromptTemplate::default(),
            },
        })
    }

    /// The load request for "now"; an open end year resolves to the current year.
    pub fn request(&self) -> Result<LoadRequest, AppError> {
        let years = match self.end_year {
            Some(end) => YearRange::new(self.start_year, end)?,
            None => YearRange::through_current_year(self.start_year)?,
        };
        Ok(LoadRequest::new(
            self.indicators.clone(),
            self.countries.clone(),
            years,
        ))
    }
}

fn default_countries(format: CountryCodeFormat) -> Result<CountrySet, AppError> {
    match format {
        CountryCodeFormat::Iso3 => CountrySet::new(format, crate::domain::DEFAULT_COUNTRIES_ISO3),
        CountryCodeFormat::Iso2 => CountrySet::new(format, ["JP", "US", "CN", "DE", "GB", "IN"]),
    }
}
