use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::prompt::{build_prompt, PromptContext, DEFAULT_DESCRIPTION_LIMIT};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Please set your Gemini API key with `leetassist key set`.")]
    MissingKey,

    #[error("Failed to reach the completion API: {0}")]
    NetworkFailure(String),

    #[error("No response generated")]
    EmptyResponse,

    #[error("{0}")]
    RemoteError(String),
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 8192,
        }
    }
}

/// Anything that can answer a question about the current problem.
#[async_trait::async_trait]
pub trait Assistant: Send + Sync {
    async fn ask(
        &self,
        api_key: &str,
        question: &str,
        context: &PromptContext,
    ) -> Result<String, GatewayError>;
}

/// Client for the Gemini `generateContent` endpoint.
///
/// One HTTP request per [`ask`](Assistant::ask), no retries. The response
/// text is returned untouched; rendering is up to the caller.
pub struct GeminiGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    generation: GenerationConfig,
    description_limit: usize,
}

impl GeminiGateway {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            generation: GenerationConfig::default(),
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_description_limit(mut self, limit: usize) -> Self {
        self.description_limit = limit;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request_body(&self, prompt: &str) -> Value {
        serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": self.generation,
        })
    }
}

impl Default for GeminiGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

fn remote_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| "Failed to get response".to_string())
}

#[async_trait::async_trait]
impl Assistant for GeminiGateway {
    async fn ask(
        &self,
        api_key: &str,
        question: &str,
        context: &PromptContext,
    ) -> Result<String, GatewayError> {
        if api_key.trim().is_empty() {
            return Err(GatewayError::MissingKey);
        }

        let (prompt, intent) = build_prompt(context, question, self.description_limit);
        tracing::debug!("Sending {:?} prompt ({} chars) to {}", intent, prompt.len(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key.trim())])
            .header("content-type", "application/json")
            .json(&self.build_request_body(&prompt))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("API fetch error: {}", e);
                GatewayError::NetworkFailure(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::NetworkFailure(e.to_string()))?;

        if !status.is_success() {
            let message = remote_error_message(&body);
            tracing::error!("Completion API returned {}: {}", status, message);
            return Err(GatewayError::RemoteError(message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::NetworkFailure(format!("Failed to parse response: {e}")))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(GatewayError::EmptyResponse)
    }
}
