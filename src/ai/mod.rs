//! Narrative generation: model catalog, selection, prompt, provider client.

pub mod catalog;
pub mod gemini;
pub mod narrative;
pub mod prompt;
pub mod provider;

pub use catalog::{select_model, ModelCatalog, ModelPreference};
pub use gemini::GeminiClient;
pub use narrative::{GenerationResult, Narrative, NarrativeGenerator, NarrativeState};
pub use prompt::PromptTemplate;
pub use provider::{GenerativeProvider, ModelInfo};
