//! `NarrativeGenerator`: model selection + one generation call per action.
//!
//! Lifecycle per invocation:
//!
//! ```text
//! Idle -> ModelSelecting -> Generating -> Succeeded | Failed
//! Idle -> Failed                          (no credential; nothing is called)
//! ```
//!
//! There is no retry edge; the next user action starts again from `Idle`.

use tracing::{info, warn};

use crate::ai::catalog::{select_model, ModelCatalog, ModelPreference};
use crate::ai::prompt::PromptTemplate;
use crate::ai::provider::GenerativeProvider;
use crate::domain::IndicatorTable;
use crate::error::GenerationError;

/// Generated text plus what produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub model: String,
    pub year: i32,
    pub text: String,
}

pub type GenerationResult = Result<Narrative, GenerationError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeState {
    Idle,
    ModelSelecting,
    Generating { model: String },
    Succeeded,
    Failed,
}

impl NarrativeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NarrativeState::Succeeded | NarrativeState::Failed)
    }
}

pub struct NarrativeGenerator<P> {
    provider: P,
    preference: ModelPreference,
    catalog: Option<ModelCatalog>,
    state: NarrativeState,
}

impl<P: GenerativeProvider> NarrativeGenerator<P> {
    pub fn new(provider: P, preference: ModelPreference) -> Self {
        Self {
            provider,
            preference,
            catalog: None,
            state: NarrativeState::Idle,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn state(&self) -> &NarrativeState {
        &self.state
    }

    /// Live catalog, listed once per session.
    ///
    /// A listing fault is logged and treated as an empty catalog so selection
    /// falls through to the fixed fallback. Faulted listings are not kept.
    pub fn catalog(&mut self) -> ModelCatalog {
        if let Some(catalog) = &self.catalog {
            return catalog.clone();
        }
        match self.provider.list_models() {
            Ok(models) => {
                let catalog = ModelCatalog::from_models(&models);
                self.catalog = Some(catalog.clone());
                catalog
            }
            Err(err) => {
                warn!(error = %err, "model catalog unavailable; using fallback");
                ModelCatalog::default()
            }
        }
    }

    pub fn select_model(&mut self) -> String {
        let catalog = self.catalog();
        select_model(&catalog, &self.preference)
    }

    /// Generate a narrative over the rows of `target_year` using `model`.
    ///
    /// An absent year yields an empty slice; the prompt still renders and the
    /// call is still made.
    pub fn generate(
        &self,
        model: &str,
        table: &IndicatorTable,
        target_year: i32,
        template: &PromptTemplate,
    ) -> GenerationResult {
        let slice = table.for_year(target_year);
        let prompt = template.render(&slice);
        let text = self.provider.generate_content(model, &prompt)?;
        info!(model, year = target_year, chars = text.len(), "narrative generated");
        Ok(Narrative {
            model: model.to_string(),
            year: target_year,
            text,
        })
    }

    /// Run one full user action: credential check, selection, generation.
    pub fn narrate(
        &mut self,
        table: &IndicatorTable,
        target_year: i32,
        template: &PromptTemplate,
    ) -> GenerationResult {
        self.state = NarrativeState::Idle;
        if !self.provider.is_configured() {
            self.state = NarrativeState::Failed;
            return Err(GenerationError::MissingCredential);
        }

        self.state = NarrativeState::ModelSelecting;
        let model = self.select_model();

        self.state = NarrativeState::Generating {
            model: model.clone(),
        };
        let result = self.generate(&model, table, target_year, template);

        self.state = match &result {
            Ok(_) => NarrativeState::Succeeded,
            Err(err) => {
                warn!(model = %model, error = %err, "narrative generation failed");
                NarrativeState::Failed
            }
        };
        result
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::ai::provider::ModelInfo;
    use crate::domain::{
        CountryCodeFormat, CountrySet, IndicatorSpec, LoadRequest, ObservationRecord, RawObservations,
        YearRange,
    };

    struct FakeProvider {
        configured: bool,
        models: Result<Vec<ModelInfo>, GenerationError>,
        reply: Result<String, GenerationError>,
        list_calls: Cell<usize>,
        generate_calls: Cell<usize>,
        last: RefCell<Option<(String, String)>>,
    }

    impl FakeProvider {
        fn new(models: Result<Vec<ModelInfo>, GenerationError>, reply: Result<String, GenerationError>) -> Self {
            Self {
                configured: true,
                models,
                reply,
                list_calls: Cell::new(0),
                generate_calls: Cell::new(0),
                last: RefCell::new(None),
            }
        }
    }

    impl GenerativeProvider for FakeProvider {
        fn is_configured(&self) -> bool {
            self.configured
        }

        fn list_models(&self) -> Result<Vec<ModelInfo>, GenerationError> {
            self.list_calls.set(self.list_calls.get() + 1);
            self.models.clone()
        }

        fn generate_content(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
            self.generate_calls.set(self.generate_calls.get() + 1);
            *self.last.borrow_mut() = Some((model.to_string(), prompt.to_string()));
            self.reply.clone()
        }
    }

    fn table() -> IndicatorTable {
        let request = LoadRequest::new(
            IndicatorSpec::new([("X.1", "Inflation")]).unwrap(),
            CountrySet::new(CountryCodeFormat::Iso3, ["JPN", "USA"]).unwrap(),
            YearRange::new(2020, 2021).unwrap(),
        );
        let raw = RawObservations::Long(vec![
            ObservationRecord::new("JPN", "X.1", "2021", Some(-0.23)),
            ObservationRecord::new("USA", "X.1", "2021", Some(4.7)),
            ObservationRecord::new("USA", "X.1", "2020", Some(1.23)),
        ]);
        crate::data::reshape::normalize(raw, &request).unwrap()
    }

    fn listed() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new("models/gemini-1.5-pro", ["generateContent"]),
            ModelInfo::new("models/gemini-1.5-flash", ["generateContent"]),
        ]
    }

    #[test]
    fn narrate_selects_flash_and_embeds_latest_rows() {
        let provider = FakeProvider::new(Ok(listed()), Ok("Japan is calmer.".into()));
        let mut generator = NarrativeGenerator::new(provider, ModelPreference::default());

        let narrative = generator.narrate(&table(), 2021, &PromptTemplate::default()).unwrap();
        assert_eq!(narrative.model, "gemini-1.5-flash");
        assert_eq!(narrative.text, "Japan is calmer.");
        assert_eq!(generator.state(), &NarrativeState::Succeeded);

        let last = generator.provider().last.borrow().clone().unwrap();
        assert!(last.1.contains("- JPN: Inflation=-0.23"));
        assert!(last.1.contains("- USA: Inflation=4.70"));
        assert!(!last.1.contains("1.23"));
    }

    #[test]
    fn catalog_is_listed_once_per_session() {
        let provider = FakeProvider::new(Ok(listed()), Ok("ok".into()));
        let mut generator = NarrativeGenerator::new(provider, ModelPreference::default());
        let t = table();
        generator.narrate(&t, 2021, &PromptTemplate::default()).unwrap();
        generator.narrate(&t, 2021, &PromptTemplate::default()).unwrap();
        assert_eq!(generator.provider().list_calls.get(), 1);
        assert_eq!(generator.provider().generate_calls.get(), 2);
    }

    #[test]
    fn catalog_fault_falls_back() {
        let provider = FakeProvider::new(Err(GenerationError::Generation("503".into())), Ok("ok".into()));
        let mut generator = NarrativeGenerator::new(provider, ModelPreference::default());
        let narrative = generator.narrate(&table(), 2021, &PromptTemplate::default()).unwrap();
        assert_eq!(narrative.model, crate::ai::catalog::FALLBACK_MODEL);
    }

    #[test]
    fn absent_year_still_issues_call() {
        let provider = FakeProvider::new(Ok(listed()), Ok("nothing to compare".into()));
        let generator = NarrativeGenerator::new(provider, ModelPreference::default());

        let result = generator.generate("gemini-1.5-flash", &table(), 1990, &PromptTemplate::default());
        assert!(result.is_ok());
        assert_eq!(generator.provider().generate_calls.get(), 1);
        let prompt = generator.provider().last.borrow().clone().unwrap().1;
        assert!(prompt.contains("no observations available for 1990"));
    }

    #[test]
    fn provider_fault_is_returned_without_retry() {
        let provider = FakeProvider::new(Ok(listed()), Err(GenerationError::Generation("quota".into())));
        let mut generator = NarrativeGenerator::new(provider, ModelPreference::default());

        let err = generator.narrate(&table(), 2021, &PromptTemplate::default()).unwrap_err();
        assert_eq!(err, GenerationError::Generation("quota".into()));
        assert_eq!(generator.state(), &NarrativeState::Failed);
        assert_eq!(generator.provider().generate_calls.get(), 1);
    }

    #[test]
    fn missing_credential_makes_no_calls() {
        let mut provider = FakeProvider::new(Ok(listed()), Ok("ok".into()));
        provider.configured = false;
        let mut generator = NarrativeGenerator::new(provider, ModelPreference::default());

        let err = generator.narrate(&table(), 2021, &PromptTemplate::default()).unwrap_err();
        assert_eq!(err, GenerationError::MissingCredential);
        assert_eq!(generator.state(), &NarrativeState::Failed);
        assert_eq!(generator.provider().list_calls.get(), 0);
        assert_eq!(generator.provider().generate_calls.get(), 0);
    }
}
