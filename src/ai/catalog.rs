//! Model catalog and ranked model selection.

use crate::ai::provider::ModelInfo;

/// Capability a model must declare to be usable for narratives.
pub const TEXT_GENERATION_METHOD: &str = "generateContent";

/// Used when the live catalog is empty or unreachable.
pub const FALLBACK_MODEL: &str = "gemini-1.5-flash";

/// Default marker ranking: fast/lightweight tier first, then general purpose.
pub const DEFAULT_MARKERS: [&str; 2] = ["flash", "pro"];

/// Provider resource prefix on model names (`models/gemini-1.5-pro`).
const MODEL_PREFIX: &str = "models/";

/// Model identifiers the provider reports as invokable, in reported order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    models: Vec<String>,
}

impl ModelCatalog {
    pub fn new<S: Into<String>>(models: impl IntoIterator<Item = S>) -> Self {
        Self {
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    /// Keep only text-generation models, stripping the `models/` prefix.
    pub fn from_models(models: &[ModelInfo]) -> Self {
        let models = models
            .iter()
            .filter(|m| m.supports(TEXT_GENERATION_METHOD))
            .map(|m| strip_model_prefix(&m.name).to_string())
            .collect();
        Self { models }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Ranked marker substrings plus the identifier used when nothing is listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPreference {
    pub markers: Vec<String>,
    pub fallback: String,
}

impl ModelPreference {
    pub fn new<S: Into<String>>(markers: impl IntoIterator<Item = S>, fallback: impl Into<String>) -> Self {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
            fallback: fallback.into(),
        }
    }
}

impl Default for ModelPreference {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS, FALLBACK_MODEL)
    }
}

/// Pick a model identifier; never fails.
///
/// Markers are tried in rank order and, within a marker, catalog order breaks
/// ties. With no marker match the first catalog entry wins; with an empty
/// catalog the preference fallback is returned.
pub fn select_model(catalog: &ModelCatalog, preference: &ModelPreference) -> String {
    for marker in &preference.markers {
        if let Some(hit) = catalog.models.iter().find(|m| m.contains(marker.as_str())) {
            return hit.clone();
        }
    }
    catalog
        .models
        .first()
        .cloned()
        .unwrap_or_else(|| preference.fallback.clone())
}

pub fn strip_model_prefix(name: &str) -> &str {
    name.strip_prefix(MODEL_PREFIX).unwrap_or(name)
}
