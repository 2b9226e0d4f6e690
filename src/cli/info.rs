//! Info command - show version, config location and key status

use anyhow::Result;

use crate::config::{self, Config};

pub fn run(config: &Config) -> Result<()> {
    println!("Code Companion v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("System Information:");
    println!("  OS: {} {}", std::env::consts::OS, std::env::consts::ARCH);

    println!();
    println!("Configuration:");
    println!("  Config dir: {}", config::config_dir_display());
    println!("  Context mode: {}", config.context.mode());
    println!("  Models: {}", config.ai.model_list().join(", "));

    println!();
    println!("API Key:");
    let status = if config.ai.resolve_api_key().is_some() {
        "configured"
    } else {
        "not configured"
    };
    println!("  {}: {}", config.ai.api_key_env, status);

    Ok(())
}
