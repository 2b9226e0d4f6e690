//! CLI command implementations

pub mod ask;
pub mod chat;
pub mod connection;
pub mod files;
pub mod info;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::ai::{ClaudeClient, MissingKeyClient, ModelClient};
use crate::config::Config;
use crate::context::ActiveFile;
use crate::session::ChatSession;

/// Where the session runs and what the editor has open
pub struct Workspace {
    pub root: Option<PathBuf>,
    pub current: Option<ActiveFile>,
}

impl Workspace {
    /// Resolve `--workspace` (default: the current directory) and `--current`
    pub fn resolve(workspace: Option<&str>, current: Option<&str>) -> Self {
        let root = match workspace {
            Some(path) => Some(PathBuf::from(path)),
            None => std::env::current_dir().ok(),
        };
        if let Some(root) = &root {
            if !root.is_dir() {
                warn!("Workspace {} is not a directory; no files will be found", root.display());
            }
        }

        let current = current.and_then(|path| load_active_file(Path::new(path), root.as_deref()));
        Self { root, current }
    }
}

/// Open a file as the editor's current file, warning instead of failing
pub fn load_active_file(path: &Path, root: Option<&Path>) -> Option<ActiveFile> {
    let resolved = match root {
        Some(root) if path.is_relative() && !path.exists() => root.join(path),
        _ => path.to_path_buf(),
    };
    match ActiveFile::load(&resolved, root) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!("Cannot open {}: {}", resolved.display(), e);
            None
        }
    }
}

/// The configured model backend; without an API key every turn reports it
pub fn build_client(config: &Config) -> Result<Box<dyn ModelClient>> {
    let Some(api_key) = config.ai.resolve_api_key() else {
        warn!("No API key found in {} or the config file", config.ai.api_key_env);
        return Ok(Box::new(MissingKeyClient::new(config.ai.api_key_env.clone())));
    };

    let client = ClaudeClient::with_timeout(api_key, &config.ai.api_key_env, config.ai.timeout())
        .context("Failed to create Claude client")?
        .with_models(config.ai.model_list())
        .with_max_tokens(config.ai.max_tokens)
        .with_temperature(config.ai.temperature);

    Ok(Box::new(client))
}

/// Session for `workspace` with its current file opened
pub fn build_session(config: &Config, workspace: Workspace) -> Result<ChatSession> {
    let client = build_client(config)?;
    let mut session = ChatSession::new(client, workspace.root, config);
    session.set_active_file(workspace.current);
    Ok(session)
}
