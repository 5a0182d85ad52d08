//! Google Generative Language API (Gemini) integration.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ai::catalog::strip_model_prefix;
use crate::ai::provider::{GenerativeProvider, ModelInfo};
use crate::error::GenerationError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const LIST_PAGE_SIZE: &str = "1000";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Build a client; a missing key is reported per call, not here.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Generation(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn key(&self) -> Result<&str, GenerationError> {
        self.api_key.as_deref().ok_or(GenerationError::MissingCredential)
    }
}

impl GenerativeProvider for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn list_models(&self) -> Result<Vec<ModelInfo>, GenerationError> {
        let key = self.key()?;
        let url = format!("{}/models", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("key", key), ("pageSize", LIST_PAGE_SIZE)])
            .send()
            .map_err(|e| GenerationError::Generation(format!("Model list request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| GenerationError::Generation(format!("Failed to read model list: {e}")))?;
        let models = parse_model_list(status.is_success(), &body)?;
        debug!(count = models.len(), "listed Gemini models");
        Ok(models)
    }

    fn generate_content(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let key = self.key()?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            strip_model_prefix(model)
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        info!(model, prompt_chars = prompt.len(), "requesting narrative");
        let resp = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&request)
            .send()
            .map_err(|e| GenerationError::Generation(format!("Generation request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| GenerationError::Generation(format!("Failed to read generation response: {e}")))?;
        parse_generation(status.is_success(), &body)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<RemoteModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Message from a provider error body, or the raw body when it has none.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) if !env.error.status.is_empty() => format!("{} ({})", env.error.message, env.error.status),
        Ok(env) => env.error.message,
        Err(_) => body.trim().to_string(),
    }
}

fn parse_model_list(success: bool, body: &str) -> Result<Vec<ModelInfo>, GenerationError> {
    if !success {
        return Err(GenerationError::Generation(format!(
            "Model list failed: {}",
            error_message(body)
        )));
    }
    let list: ModelList = serde_json::from_str(body)
        .map_err(|e| GenerationError::Generation(format!("Invalid model list: {e}")))?;
    Ok(list
        .models
        .into_iter()
        .map(|m| ModelInfo {
            name: m.name,
            supported_methods: m.supported_generation_methods,
        })
        .collect())
}

fn parse_generation(success: bool, body: &str) -> Result<String, GenerationError> {
    if !success {
        return Err(GenerationError::Generation(error_message(body)));
    }
    let resp: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Generation(format!("Invalid generation response: {e}")))?;

    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Err(GenerationError::Generation("Model returned no candidates.".to_string()));
    };
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(GenerationError::Generation(format!(
            "Model returned no text (finish reason: {reason})."
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ModelPreference, NarrativeGenerator, NarrativeState, PromptTemplate};
    use crate::domain::{
        CountryCodeFormat, CountrySet, IndicatorSpec, LoadRequest, ObservationRecord, RawObservations,
        YearRange,
    };
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn extracts_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Japan "},{"text":"lags."}],"role":"model"},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_generation(true, body).unwrap(), "Japan lags.");
    }

    #[test]
    fn empty_candidate_reports_finish_reason() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        match parse_generation(true, body) {
            Err(GenerationError::Generation(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_generation(true, r#"{"candidates":[]}"#).is_err());
    }

    #[test]
    fn error_body_message_is_surfaced() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            parse_generation(false, body).unwrap_err(),
            GenerationError::Generation("Quota exceeded (RESOURCE_EXHAUSTED)".to_string())
        );
        assert_eq!(
            parse_generation(false, "bad gateway").unwrap_err(),
            GenerationError::Generation("bad gateway".to_string())
        );
    }

    #[test]
    fn parses_model_list() {
        let body = r#"{"models":[{"name":"models/gemini-1.5-flash","supportedGenerationMethods":["generateContent","countTokens"]},{"name":"models/text-embedding-004","supportedGenerationMethods":["embedContent"]}]}"#;
        let models = parse_model_list(true, body).unwrap();
        assert_eq!(models.len(), 2);
        assert!(models[0].supports("generateContent"));
        assert!(!models[1].supports("generateContent"));
    }

    #[test]
    fn lists_then_generates_against_server() {
        let server = MockServer::start();
        let list = server.mock(|when, then| {
            when.method(GET)
                .path("/models")
                .query_param("key", "test-key")
                .query_param("pageSize", "1000");
            then.status(200).json_body(json!({
                "models": [
                    {"name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"]},
                    {"name": "models/gemini-1.5-pro", "supportedGenerationMethods": ["generateContent"]},
                    {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]}
                ]
            }));
        });
        let generate = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-1.5-flash:generateContent")
                .query_param("key", "test-key");
            then.status(200).json_body(json!({
                "candidates": [{"content": {"parts": [{"text": "Japan's inflation stayed low."}]}, "finishReason": "STOP"}]
            }));
        });

        let request = LoadRequest::new(
            IndicatorSpec::new([("X.1", "Inflation")]).unwrap(),
            CountrySet::new(CountryCodeFormat::Iso3, ["JPN"]).unwrap(),
            YearRange::new(2022, 2022).unwrap(),
        );
        let raw = RawObservations::Long(vec![ObservationRecord::new("JPN", "X.1", "2022", Some(2.5))]);
        let table = crate::data::reshape::normalize(raw, &request).unwrap();

        let client = GeminiClient::new(server.base_url(), Some("test-key".to_string())).unwrap();
        let mut generator = NarrativeGenerator::new(client, ModelPreference::default());
        let narrative = generator.narrate(&table, 2022, &PromptTemplate::default()).unwrap();

        list.assert();
        generate.assert();
        assert_eq!(narrative.model, "gemini-1.5-flash");
        assert_eq!(narrative.text, "Japan's inflation stayed low.");
        assert_eq!(generator.state(), &NarrativeState::Succeeded);
    }

    #[test]
    fn generation_error_status_is_surfaced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/models/gemini-1.5-pro:generateContent");
            then.status(429).json_body(json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            }));
        });

        let client = GeminiClient::new(server.base_url(), Some("k".to_string())).unwrap();
        assert_eq!(
            client.generate_content("models/gemini-1.5-pro", "hi").unwrap_err(),
            GenerationError::Generation("Quota exceeded (RESOURCE_EXHAUSTED)".to_string())
        );
    }

    #[test]
    fn missing_key_never_calls_out() {
        let client = GeminiClient::new(DEFAULT_BASE_URL, Some("   ".to_string())).unwrap();
        assert!(!client.is_configured());
        assert_eq!(client.list_models().unwrap_err(), GenerationError::MissingCredential);
        assert_eq!(
            client.generate_content("gemini-1.5-flash", "hi").unwrap_err(),
            GenerationError::MissingCredential
        );
    }
}
