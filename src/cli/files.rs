//! Files command - show what the context engine can see
//!
//! Runs discovery (and optionally ranking) without touching the model, so it
//! works without an API key.

use anyhow::{Context, Result};

use super::Workspace;
use crate::config::Config;
use crate::context::{FileDiscovery, IgnoreMatcher, RelevanceScorer};
use crate::ui::style::{colors, format_size, print_muted, print_warning, symbols};

pub fn run(config: &Config, workspace: &Workspace, rank: Option<&str>) -> Result<()> {
    let root = workspace.root.as_deref();
    let matcher = IgnoreMatcher::new(root, &config.context.extra_ignore);
    let files = FileDiscovery::new(matcher)
        .discover(root)
        .context("Failed to scan workspace")?;

    if files.is_empty() {
        print_warning("No files found in the workspace");
        return Ok(());
    }

    let total = files.len();
    match rank {
        Some(query) => {
            for scored in RelevanceScorer.rank(files, query) {
                println!(
                    "{}{:>5}  {}{}  {}{}{}",
                    colors::AI_ACCENT, scored.score, colors::FG, scored.file.path,
                    colors::MUTED, format_size(scored.file.size), colors::RESET
                );
            }
        }
        None => {
            for file in &files {
                println!(
                    "{}{} {}{}  {}{}{}",
                    colors::MUTED, symbols::FILE, colors::FG, file.path,
                    colors::MUTED, format_size(file.size), colors::RESET
                );
            }
        }
    }

    print_muted(&format!("{} files available", total));
    Ok(())
}
