//! AI Summarizer Integration
//!
//! Boundary contract with the external LLM service: free-text prompt
//! in, strict JSON summary out. The production client talks to an
//! OpenAI-compatible chat completions endpoint; anything that is not
//! the expected JSON shape is a failure the facade recovers from.

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SummarizerError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Summarizer call timed out")]
    Timeout,
}

/// Summarizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Chat completions base URL
    pub api_url: String,
    /// Bearer token for the LLM service
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Request timeout in seconds
    pub timeout_sec: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_sec: 10,
        }
    }
}

/// Seam for the external summarizer. Generic dispatch; tests plug in
/// deterministic fakes.
pub trait Summarizer: Send + Sync {
    fn summarize(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, SummarizerError>> + Send;
}

/// Expected summary payload from the LLM. Any response that fails to
/// deserialize into this shape triggers the fallback policy.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryPayload {
    pub overall_safety_score: i64,
    pub risk_factors: Vec<String>,
    pub danger_zones: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub alternative_suggestions: Vec<String>,
}

impl SummaryPayload {
    /// Parse raw summarizer output, tolerating a fenced code block
    /// around the JSON body.
    pub fn parse(raw: &str) -> Result<Self, SummarizerError> {
        let trimmed = raw
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        serde_json::from_str(trimmed).map_err(|e| SummarizerError::ParseError(e.to_string()))
    }

    /// Score clamped into the documented 0-100 range.
    pub fn clamped_score(&self) -> u8 {
        self.overall_safety_score.clamp(0, 100) as u8
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

const SYSTEM_PROMPT: &str = "You are a tourist safety analyst. Respond with a \
single JSON object and no surrounding prose.";

/// Production summarizer backed by an OpenAI-compatible endpoint.
pub struct LlmSummarizer {
    config: SummarizerConfig,
    client: reqwest::Client,
}

impl LlmSummarizer {
    pub fn new(config: SummarizerConfig) -> Result<Self, SummarizerError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_sec))
            .build()
            .map_err(|e| SummarizerError::RequestFailed(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Read endpoint settings from `LLM_API_URL`, `LLM_API_KEY` and
    /// `LLM_MODEL`, falling back to defaults where unset.
    pub fn from_env() -> Result<Self, SummarizerError> {
        let defaults = SummarizerConfig::default();
        let config = SummarizerConfig {
            api_url: std::env::var("LLM_API_URL").unwrap_or(defaults.api_url),
            api_key: std::env::var("LLM_API_KEY").unwrap_or_default(),
            model: std::env::var("LLM_MODEL").unwrap_or(defaults.model),
            timeout_sec: defaults.timeout_sec,
        };
        Self::new(config)
    }
}

impl Summarizer for LlmSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizerError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SummarizerError::Timeout
                } else {
                    SummarizerError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(SummarizerError::ApiError(format!(
                "LLM endpoint returned status: {}",
                response.status()
            )));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::ParseError(e.to_string()))?;

        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SummarizerError::ParseError("empty choices array".to_string()))
    }
}
