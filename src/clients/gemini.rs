use crate::config::KeyFromEnv;
use crate::core::LowLevelClient;
use crate::error::{AIError, ConfigError, GeminiError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
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
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// Configuration for the Gemini client
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.4,
            max_output_tokens: 8192,
        }
    }
}

impl GeminiConfig {
    /// Default settings with the key taken from `GOOGLE_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: GeminiClient::require_key()?,
            ..Default::default()
        })
    }

    /// The first few characters of the key, safe to print.
    pub fn key_preview(&self) -> String {
        let head: String = self.api_key.chars().take(5).collect();
        format!("{head}...")
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.key_preview())
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

/// Client for the Generative Language REST API.
#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.config.base_url)
            .field("key", &self.config.key_preview())
            .finish()
    }
}

impl KeyFromEnv for GeminiClient {
    const KEY_NAME: &'static str = "GOOGLE_API_KEY";
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        info!(base_url = %config.base_url, "Creating new Gemini client");
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Build a client from `GOOGLE_API_KEY`; a missing key is fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }
}

/// Map a non-success HTTP status and body to a typed error.
fn classify_error(status: StatusCode, body: &str) -> GeminiError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let message = parsed
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());
    let key_invalid = parsed.as_ref().is_some_and(|e| {
        e.details
            .iter()
            .any(|d| d.get("reason").and_then(|r| r.as_str()) == Some("API_KEY_INVALID"))
    });

    if status == StatusCode::TOO_MANY_REQUESTS
        || parsed.as_ref().is_some_and(|e| e.status == "RESOURCE_EXHAUSTED")
    {
        return GeminiError::RateLimit;
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN || key_invalid {
        return GeminiError::Authentication(message);
    }
    GeminiError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Pull the generated text out of a successful response body.
fn extract_text(body: &str) -> Result<String, GeminiError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GeminiError::Http(format!("bad response JSON: {e}")))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GeminiError::Safety(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(GeminiError::EmptyResponse)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if matches!(reason, "SAFETY" | "RECITATION" | "PROHIBITED_CONTENT" | "BLOCKLIST") {
            return Err(GeminiError::Safety(reason.to_string()));
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(GeminiError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl LowLevelClient for GeminiClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), model = %model))]
    async fn ask_raw(&self, model: &str, prompt: String) -> Result<String, AIError> {
        let url = format!(
            "{}/{}:generateContent",
            self.config.base_url,
            Self::model_path(model)
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                response_mime_type: "application/json",
            },
        };

        debug!("Sending request to Gemini API");
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                GeminiError::Http(e.to_string())
            })?;

        let status = response.status();
        debug!(status = %status, "Received response from Gemini API");
        let body = response
            .text()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        if !status.is_success() {
            let err = classify_error(status, &body);
            match &err {
                GeminiError::RateLimit => warn!("Gemini API rate limit exceeded"),
                other => error!(error = %other, "Gemini API error"),
            }
            return Err(err.into());
        }

        let text = extract_text(&body).map_err(|e| {
            warn!(error = %e, "Gemini response had no usable text");
            e
        })?;
        info!(response_len = text.len(), "Successfully received Gemini response");
        Ok(text)
    }

    #[instrument(skip(self))]
    async fn list_models(&self) -> Result<Vec<String>, AIError> {
        let url = format!("{}/models", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .query(&[("pageSize", "1000")])
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(classify_error(status, &body).into());
        }

        let list: ModelList = serde_json::from_str(&body)
            .map_err(|e| GeminiError::Http(format!("bad model list JSON: {e}")))?;
        let names: Vec<String> = list
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods.is_empty()
                    || m.supported_generation_methods.iter().any(|g| g == "generateContent")
            })
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect();
        debug!(count = names.len(), "Listed Gemini models");
        Ok(names)
    }

}
