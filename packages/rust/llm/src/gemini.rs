//! Gemini HTTP adapter implementing [`LlmClient`].
//!
//! Talks to the `generateContent` REST endpoint. The adapter owns lenient
//! extraction of the JSON payload from the model's text answer: markdown
//! fences are stripped and, failing a direct parse, each embedded JSON object
//! is tried in turn. A response that yields no JSON at all is surfaced as
//! `Ok(None)` and left for the calling stage to interpret.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use fieldscope_shared::{AppConfig, FieldscopeError, Result};

use crate::LlmClient;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("fieldscope/", env!("CARGO_PKG_VERSION"));

/// Sampling temperature for classification calls. Low on purpose: the task is
/// selection from a fixed candidate list, not generation.
const TEMPERATURE: f64 = 0.2;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

/// Gemini-backed LLM client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client from the application config, reading the API key from
    /// the configured environment variable.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        fieldscope_shared::validate_api_key(config)?;
        let api_key = std::env::var(&config.gemini.api_key_env)
            .map_err(|_| FieldscopeError::config("Gemini API key env var unreadable"))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| FieldscopeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.gemini.model.clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate_structured(&self, prompt: &str) -> Result<Option<Value>> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FieldscopeError::Network(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FieldscopeError::Network(format!(
                "Gemini returned {status}: {detail}"
            )));
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| FieldscopeError::Network(format!("Gemini response unreadable: {e}")))?;

        let Some(text) = candidate_text(&envelope) else {
            warn!("Gemini response carried no candidate text");
            return Ok(None);
        };

        debug!(chars = text.len(), "received model text");
        Ok(extract_json(&text))
    }
}

/// Pull the first candidate's concatenated part text out of the API envelope.
fn candidate_text(envelope: &Value) -> Option<String> {
    let parts = envelope
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() { None } else { Some(text) }
}

/// Strip a surrounding ```json ... ``` fence if present.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the model text into a JSON value, falling back to embedded JSON
/// objects when the whole text does not parse. Returns `None` when no JSON
/// can be recovered at all.
fn extract_json(text: &str) -> Option<Value> {
    let cleaned = strip_fences(text);

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return Some(value);
    }

    // Prose around the payload. Try each balanced top-level span in turn and
    // keep the first that parses.
    for span in balanced_object_spans(cleaned) {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            return Some(value);
        }
    }

    None
}

/// Top-level `{...}` spans with balanced braces. Brace characters inside
/// string values can skew the depth count; a skewed span simply fails to
/// parse and the caller moves on.
fn balanced_object_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, b) in text.bytes().enumerate() {
        match b {
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    spans
}
