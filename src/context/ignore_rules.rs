//! Ignore rules for workspace discovery
//!
//! Built-in exclusions plus the project's `.gitignore`, matched with
//! gitignore semantics.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

/// Patterns that apply to every workspace
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    // Dependencies
    "node_modules/",
    "bower_components/",
    "vendor/",
    ".venv/",
    "venv/",
    // Build output
    "dist/",
    "build/",
    "out/",
    "target/",
    "coverage/",
    ".next/",
    "__pycache__/",
    // VCS and editor metadata
    ".git/",
    ".svn/",
    ".hg/",
    ".vscode/",
    ".idea/",
    // Lockfiles
    "*.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    // OS artifacts
    ".DS_Store",
    "Thumbs.db",
    // Minified assets
    "*.min.js",
    "*.min.css",
    "*.map",
    // Logs and secrets
    "*.log",
    ".env",
    ".env.*",
];

const PROJECT_IGNORE_FILE: &str = ".gitignore";

/// Compiled ignore rule set for one workspace
pub struct IgnoreMatcher {
    rules: Gitignore,
}

impl IgnoreMatcher {
    /// Build the rule set for `root`: defaults, then `<root>/.gitignore`,
    /// then `extra` patterns. Later rules win, so `!pattern` can re-include.
    pub fn new(root: Option<&Path>, extra: &[String]) -> Self {
        let base = root.unwrap_or_else(|| Path::new(""));
        let mut builder = GitignoreBuilder::new(base);

        for pattern in DEFAULT_IGNORE_PATTERNS {
            add_rule(&mut builder, pattern, "defaults");
        }

        if let Some(root) = root {
            load_project_rules(&mut builder, root);
        }

        for pattern in extra {
            add_rule(&mut builder, pattern, "config");
        }

        let rules = match builder.build() {
            Ok(rules) => rules,
            Err(e) => {
                warn!("Failed to compile ignore rules, using defaults only: {}", e);
                Self::defaults_only(base)
            }
        };

        debug!("Loaded {} ignore rules", rules.len());
        Self { rules }
    }

    /// Only the built-in rules
    pub fn with_defaults() -> Self {
        Self {
            rules: Self::defaults_only(Path::new("")),
        }
    }

    fn defaults_only(base: &Path) -> Gitignore {
        let mut builder = GitignoreBuilder::new(base);
        for pattern in DEFAULT_IGNORE_PATTERNS {
            add_rule(&mut builder, pattern, "defaults");
        }
        builder.build().unwrap_or_else(|_| Gitignore::empty())
    }

    /// Is this workspace-relative path excluded? A trailing `/` marks a directory.
    pub fn ignores(&self, relative_path: &str) -> bool {
        let normalized = relative_path.replace('\\', "/");
        let is_dir = normalized.ends_with('/');
        self.is_ignored(Path::new(normalized.trim_end_matches('/')), is_dir)
    }

    /// Is this path, or any directory above it, excluded?
    pub fn is_ignored(&self, relative_path: &Path, is_dir: bool) -> bool {
        if relative_path.as_os_str().is_empty() || relative_path.has_root() {
            return false;
        }
        self.rules
            .matched_path_or_any_parents(relative_path, is_dir)
            .is_ignore()
    }
}

fn load_project_rules(builder: &mut GitignoreBuilder, root: &Path) {
    let path = root.join(PROJECT_IGNORE_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No {} in {}", PROJECT_IGNORE_FILE, root.display());
            return;
        }
        Err(e) => {
            warn!("Could not read {}: {} (using defaults)", path.display(), e);
            return;
        }
    };

    for line in content.lines() {
        if let Err(e) = builder.add_line(Some(path.clone()), line) {
            warn!("Skipping ignore pattern {:?} in {}: {}", line, path.display(), e);
        }
    }
}

fn add_rule(builder: &mut GitignoreBuilder, pattern: &str, origin: &str) {
    if let Err(e) = builder.add_line(None, pattern) {
        warn!("Skipping {} ignore pattern {:?}: {}", origin, pattern, e);
    }
}
