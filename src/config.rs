//! Configuration management for Code Companion

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::ai::claude::{DEFAULT_API_KEY_ENV, DEFAULT_MODELS};
use crate::context::assembler::{DEFAULT_MAX_CONTEXT_FILES, DEFAULT_REFERENCE_PHRASES};
use crate::context::ContextMode;

/// Prepended to the model list when set
const MODEL_OVERRIDE_ENV: &str = "COMPANION_MODEL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ai: AiConfig,
    pub context: ContextConfig,
    #[serde(skip)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline key; takes precedence over `api_key_env`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Tried in order until one exists
    pub models: Vec<String>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// One of current, selected, auto, whole
    pub default_mode: String,
    pub max_context_files: usize,
    /// Phrases that make `auto` mode stick to the open file
    pub reference_phrases: Vec<String>,
    /// Ignore patterns on top of the defaults and `.gitignore`
    pub extra_ignore: Vec<String>,
    /// Earlier messages included in each prompt
    pub history_messages: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            max_tokens: 4096,
            temperature: None,
            timeout_secs: 120,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_mode: ContextMode::Auto.name().to_string(),
            max_context_files: DEFAULT_MAX_CONTEXT_FILES,
            reference_phrases: DEFAULT_REFERENCE_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            extra_ignore: Vec::new(),
            history_messages: 10,
        }
    }
}

impl AiConfig {
    /// Inline key first, then the configured environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Model call timeout, never below one second
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Configured models, with the environment override first
    pub fn model_list(&self) -> Vec<String> {
        let mut models = self.models.clone();
        if let Ok(model) = std::env::var(MODEL_OVERRIDE_ENV) {
            let model = model.trim().to_string();
            if !model.is_empty() {
                models.retain(|m| m != &model);
                models.insert(0, model);
            }
        }
        models
    }
}

impl ContextConfig {
    /// Parsed default mode; unknown values fall back to `auto`
    pub fn mode(&self) -> ContextMode {
        self.default_mode.parse().unwrap_or_else(|e| {
            warn!("{}; using auto", e);
            ContextMode::Auto
        })
    }
}

/// Get the configuration file path
fn config_path() -> Result<PathBuf> {
    let config_dir = directories::ProjectDirs::from("com", "companion", "code-companion")
        .context("Failed to determine config directory")?
        .config_dir()
        .to_path_buf();

    Ok(config_dir.join("config.toml"))
}

/// Directory the config file lives in, for display
pub fn config_dir_display() -> String {
    config_path()
        .ok()
        .and_then(|p| p.parent().map(|d| d.display().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Load configuration from file or use defaults
pub fn load_config(custom_path: Option<&str>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        PathBuf::from(p)
    } else {
        config_path()?
    };

    if path.exists() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        parse_config(&content).with_context(|| format!("Failed to parse config from {:?}", path))
    } else {
        Ok(Config::default())
    }
}

fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

/// Initialize configuration file with defaults
pub fn init_config() -> Result<()> {
    let path = config_path()?;

    if path.exists() {
        println!("Configuration file already exists at {:?}", path);
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }

    let content = toml::to_string_pretty(&Config::default())
        .context("Failed to serialize default config")?;

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config to {:?}", path))?;

    println!("Configuration initialized at {:?}", path);
    Ok(())
}

/// Show current configuration, with the API key masked
pub fn show_config(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if shown.ai.api_key.is_some() {
        shown.ai.api_key = Some("********".to_string());
    }
    let content = toml::to_string_pretty(&shown).context("Failed to serialize config")?;
    println!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(
            r#"
            [context]
            default_mode = "whole"
            max_context_files = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.context.mode(), ContextMode::Whole);
        assert_eq!(config.context.max_context_files, 3);
        assert_eq!(config.context.history_messages, 10);
        assert_eq!(config.ai.api_key_env, "ANTHROPIC_API_KEY");
        assert!(!config.ai.models.is_empty());
    }

    #[test]
    fn test_unknown_mode_falls_back_to_auto() {
        let mut config = ContextConfig::default();
        config.default_mode = "everything".to_string();
        assert_eq!(config.mode(), ContextMode::Auto);
    }

    #[test]
    fn test_inline_api_key_wins() {
        let config = AiConfig {
            api_key: Some("sk-inline".to_string()),
            api_key_env: "COMPANION_TEST_UNSET_KEY_VAR".to_string(),
            ..AiConfig::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-inline"));

        let blank = AiConfig {
            api_key: Some("   ".to_string()),
            api_key_env: "COMPANION_TEST_UNSET_KEY_VAR".to_string(),
            ..AiConfig::default()
        };
        assert_eq!(blank.resolve_api_key(), None);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = parse_config("[ai]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(config.ai.timeout(), Duration::from_secs(1));
        assert_eq!(AiConfig::default().timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed = parse_config(&text).unwrap();
        assert_eq!(parsed.ai.models, Config::default().ai.models);
        assert_eq!(
            parsed.context.reference_phrases,
            Config::default().context.reference_phrases
        );
    }
}
