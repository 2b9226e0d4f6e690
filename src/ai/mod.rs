//! Language model access
//!
//! The rest of the crate only sees [`ModelClient`]: one prompt in, one
//! completion out, with failures classified by [`ModelError`].

pub mod claude;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use claude::ClaudeClient;

/// Why a completion failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("no API key configured (set {0} or ai.api_key in the config file)")]
    MissingApiKey(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("quota or rate limit exceeded: {0}")]
    Quota(String),

    #[error("model not found: {0}")]
    NotFound(String),

    #[error("model unavailable: {0}")]
    Unavailable(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model did not answer within {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ModelError {
    /// Notice shown in the conversation in place of an answer
    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey(var) => format!(
                "No API key found. Set {} or add `api_key` under [ai] in your config.",
                var
            ),
            ModelError::Auth(_) => {
                "The API key was rejected. Check that it is valid and has not been revoked."
                    .to_string()
            }
            ModelError::Quota(_) => {
                "Your API quota or rate limit is exhausted. Wait a moment or check your plan."
                    .to_string()
            }
            ModelError::NotFound(model) => format!(
                "None of the configured models are available (last tried: {}).",
                model
            ),
            ModelError::Unavailable(reason) => format!(
                "The model service is temporarily unavailable ({}). Try again shortly.",
                reason
            ),
            ModelError::EmptyResponse => {
                "The model returned an empty answer. Try rephrasing your question.".to_string()
            }
            ModelError::Timeout(limit) => format!(
                "The model did not answer within {} seconds. Try again or narrow the context.",
                limit.as_secs()
            ),
        }
    }
}

/// A chat completion backend
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;

    /// Human-readable backend name for status output
    fn describe(&self) -> String;
}

/// Stands in for a real backend when no API key is configured. Every turn
/// fails with [`ModelError::MissingApiKey`] but the session keeps working.
pub struct MissingKeyClient {
    env_var: String,
}

impl MissingKeyClient {
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }
}

#[async_trait]
impl ModelClient for MissingKeyClient {
    async fn complete(&self, _prompt: &str) -> Result<String, ModelError> {
        Err(ModelError::MissingApiKey(self.env_var.clone()))
    }

    fn describe(&self) -> String {
        format!("not configured (set {})", self.env_var)
    }
}
