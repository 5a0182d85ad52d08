//! Provider seam for generative-model calls.

use crate::error::GenerationError;

/// A model as reported by the provider's list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub supported_methods: Vec<String>,
}

impl ModelInfo {
    pub fn new<S: Into<String>>(name: impl Into<String>, methods: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            supported_methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn supports(&self, method: &str) -> bool {
        self.supported_methods.iter().any(|m| m == method)
    }
}

pub trait GenerativeProvider {
    /// Whether a credential is present. Checked before any call is attempted.
    fn is_configured(&self) -> bool;

    fn list_models(&self) -> Result<Vec<ModelInfo>, GenerationError>;

    /// Blocking text generation for one prompt.
    fn generate_content(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;
}
