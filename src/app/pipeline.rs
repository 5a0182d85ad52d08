//! Shared session workflow used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core flow:
//! load table (cached) -> pick target year -> select model -> generate
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::ai::{GeminiClient, GenerationResult, ModelCatalog, NarrativeGenerator, select_model};
use crate::config::{DashboardConfig, SourceConfig};
use crate::data::{CsvExportSource, IndicatorLoader, IndicatorSource, LoadOutcome, WorldBankSource};
use crate::domain::IndicatorTable;
use crate::error::AppError;

pub type DynSource = Box<dyn IndicatorSource>;

/// One user session: configuration, the cached loader, and the generator.
pub struct Session<S = DynSource, P = GeminiClient> {
    config: DashboardConfig,
    loader: IndicatorLoader<S>,
    generator: NarrativeGenerator<P>,
}

impl Session {
    /// Wire the configured providers.
    pub fn from_config(config: DashboardConfig) -> Result<Self, AppError> {
        let source: DynSource = match &config.source {
            SourceConfig::WorldBank { base_url } => Box::new(WorldBankSource::new(base_url.clone())?),
            SourceConfig::CsvExport { path } => Box::new(CsvExportSource::new(path.clone())),
        };
        let provider = GeminiClient::new(config.ai.base_url.clone(), config.ai.api_key.clone())?;
        Ok(Self::with_parts(config, source, provider))
    }
}

impl<S: IndicatorSource, P: crate::ai::GenerativeProvider> Session<S, P> {
    pub fn with_parts(config: DashboardConfig, source: S, provider: P) -> Self {
        let generator = NarrativeGenerator::new(provider, config.ai.preference.clone());
        Self {
            config,
            loader: IndicatorLoader::new(source),
            generator,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn generator(&self) -> &NarrativeGenerator<P> {
        &self.generator
    }

    /// Load the table for the current request (never faults; see `LoadOutcome`).
    pub fn load(&self) -> Result<LoadOutcome, AppError> {
        let request = self.config.request()?;
        Ok(self.loader.load(&request))
    }

    /// Drop cached tables so the next `load` hits the provider again.
    pub fn refresh(&self) {
        self.loader.invalidate();
    }

    /// Year a narrative should describe: explicit, else the latest year with data,
    /// else the end of the requested range.
    pub fn target_year(&self, table: &IndicatorTable, explicit: Option<i32>) -> Result<i32, AppError> {
        if let Some(year) = explicit {
            return Ok(year);
        }
        match table.latest_observed_year() {
            Some(year) => Ok(year),
            None => Ok(self.config.request()?.years.end()),
        }
    }

    pub fn narrate(&mut self, table: &IndicatorTable, year: i32) -> GenerationResult {
        let template = self.config.ai.template.clone();
        self.generator.narrate(table, year, &template)
    }

    /// The live catalog and the model that selection would pick from it.
    pub fn model_choice(&mut self) -> (ModelCatalog, String) {
        let catalog = self.generator.catalog();
        let chosen = select_model(&catalog, &self.config.ai.preference);
        (catalog, chosen)
    }
}
