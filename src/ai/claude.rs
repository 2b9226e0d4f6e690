//! Claude API client
//!
//! Sends prompts to the Anthropic Messages API, walking an ordered list of
//! model names until one of them exists.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{ModelClient, ModelError};

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODELS: &[&str] = &[
    "claude-sonnet-4-20250514",
    "claude-3-5-sonnet-latest",
    "claude-3-5-haiku-latest",
];
const DEFAULT_MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Claude API Client
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    models: Vec<String>,
    max_tokens: u32,
    temperature: Option<f32>,
    request_timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    User,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: Role,
    content: &'a str,
}

/// Request body for Claude API
#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Response from Claude API
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// Error response from Claude API
#[derive(Debug, Deserialize)]
struct ClaudeError {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

impl ClaudeClient {
    /// Create a new Claude client
    pub fn new(api_key: String) -> Result<Self, ModelError> {
        Self::with_timeout(
            api_key,
            DEFAULT_API_KEY_ENV,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Create a client whose HTTP requests give up after `timeout`.
    /// `key_env` names where the key should have come from if it is blank.
    pub fn with_timeout(
        api_key: String,
        key_env: &str,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        if api_key.trim().is_empty() {
            return Err(ModelError::MissingApiKey(key_env.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("code-companion/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ModelError::Unavailable(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            request_timeout: timeout,
        })
    }

    /// Models to try, in order. An empty list keeps the defaults.
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        if !models.is_empty() {
            self.models = models;
        }
        self
    }

    /// Set max tokens for response
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// One request against one model
    async fn complete_with_model(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
        let request = ClaudeRequest {
            model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: Role::User,
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();

        if status.is_success() {
            let claude_response: ClaudeResponse = response
                .json()
                .await
                .map_err(|e| ModelError::Unavailable(format!("unreadable response: {}", e)))?;

            debug!(
                "Claude {} answered (stop reason: {:?})",
                claude_response.model, claude_response.stop_reason
            );
            extract_text(&claude_response)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(classify_error(status, &error_text, model))
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout(self.request_timeout)
        } else {
            ModelError::Unavailable(format!("request failed: {}", e))
        }
    }
}

#[async_trait]
impl ModelClient for ClaudeClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        complete_with_fallback(&self.models, |model| self.complete_with_model(model, prompt)).await
    }

    fn describe(&self) -> String {
        format!("Claude ({})", self.models.join(" → "))
    }
}

/// Try each model in order; only "model not found" moves on to the next one.
async fn complete_with_fallback<'a, F, Fut>(
    models: &'a [String],
    mut attempt: F,
) -> Result<String, ModelError>
where
    F: FnMut(&'a str) -> Fut,
    Fut: std::future::Future<Output = Result<String, ModelError>>,
{
    let mut last_error = ModelError::Unavailable("no models configured".to_string());

    for model in models {
        match attempt(model.as_str()).await {
            Err(ModelError::NotFound(missing)) => {
                warn!("Model {} not found, trying next", missing);
                last_error = ModelError::NotFound(missing);
            }
            result => return result,
        }
    }

    Err(last_error)
}

fn extract_text(response: &ClaudeResponse) -> Result<String, ModelError> {
    let text = response
        .content
        .iter()
        .filter_map(|block| block.text.as_deref())
        .collect::<Vec<&str>>()
        .join("");

    if text.trim().is_empty() {
        Err(ModelError::EmptyResponse)
    } else {
        Ok(text)
    }
}

/// Map an API error status and body onto the error taxonomy
fn classify_error(status: StatusCode, body: &str, model: &str) -> ModelError {
    let (error_type, message) = match serde_json::from_str::<ClaudeError>(body) {
        Ok(parsed) => (parsed.error.error_type, parsed.error.message),
        Err(_) => (String::new(), body.trim().to_string()),
    };
    let detail = if message.is_empty() {
        status.to_string()
    } else {
        message
    };

    match (status, error_type.as_str()) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _)
        | (_, "authentication_error" | "permission_error") => ModelError::Auth(detail),
        (StatusCode::TOO_MANY_REQUESTS, _) | (_, "rate_limit_error") => ModelError::Quota(detail),
        _ if detail.to_lowercase().contains("credit balance") => ModelError::Quota(detail),
        (StatusCode::NOT_FOUND, _) | (_, "not_found_error") => ModelError::NotFound(model.to_string()),
        _ => ModelError::Unavailable(format!("{}: {}", status, detail)),
    }
}

/// System prompts
pub mod prompts {
    /// System prompt for workspace-aware chat
    pub const CODING_ASSISTANT: &str = r#"You are a coding assistant embedded in the user's editor.

You are given context from the user's workspace: the file they have open and/or
files selected for their question. Use it.

Guidelines:
- Answer from the provided context and say so when it is not enough
- Reference files and functions by name
- Be direct and concise
- Use markdown code blocks for code
- If you're unsure, say so honestly"#;
}
