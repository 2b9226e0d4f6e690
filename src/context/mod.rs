//! Context gathering for chat turns
//!
//! Discovers workspace files, ranks them against the user's query and
//! assembles a bounded text block for the model.

pub mod assembler;
pub mod discovery;
pub mod ignore_rules;
pub mod scorer;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

pub use assembler::{ContextAssembler, ContextRequest};
pub use discovery::FileDiscovery;
pub use ignore_rules::IgnoreMatcher;
pub use scorer::RelevanceScorer;

/// Files at or above this many characters are never discovered.
pub const MAX_FILE_CHARS: usize = 50_000;

/// A source file read during one discovery pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFile {
    /// Workspace-relative, `/`-separated
    pub path: String,
    pub content: String,
    /// Character count of `content`
    pub size: usize,
}

impl CodeFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let size = content.chars().count();
        Self {
            path: path.into(),
            content,
            size,
        }
    }

    /// Extension without the leading dot, lowercased
    pub fn extension(&self) -> String {
        Path::new(&self.path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

/// A discovered file with its relevance score for one query
#[derive(Debug, Clone)]
pub struct ScoredFile {
    pub file: CodeFile,
    pub score: u32,
}

/// The file open in the editor surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFile {
    pub name: String,
    pub content: String,
}

impl ActiveFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk, naming it relative to `root` when possible
    pub fn load(path: &Path, root: Option<&Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let name = root
            .and_then(|r| path.strip_prefix(r).ok())
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        Ok(Self { name, content })
    }

    /// Final path component of `name`
    pub fn basename(&self) -> &str {
        self.name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.name)
    }
}

/// Strategy for choosing which files populate the context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextMode {
    /// Only the active file
    Current,
    /// Only the files the user picked
    Selected,
    /// Active file plus the best-scoring files for the query
    #[default]
    Auto,
    /// A capped overview of the whole workspace
    Whole,
}

impl ContextMode {
    pub const ALL: [ContextMode; 4] = [
        ContextMode::Current,
        ContextMode::Selected,
        ContextMode::Auto,
        ContextMode::Whole,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ContextMode::Current => "current",
            ContextMode::Selected => "selected",
            ContextMode::Auto => "auto",
            ContextMode::Whole => "whole",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ContextMode::Current => "Only the file you have open",
            ContextMode::Selected => "Only the files you picked",
            ContextMode::Auto => "Open file plus the most relevant files for your question",
            ContextMode::Whole => "An overview of up to 20 files from the workspace",
        }
    }
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ContextMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" => Ok(ContextMode::Current),
            "selected" => Ok(ContextMode::Selected),
            "auto" => Ok(ContextMode::Auto),
            "whole" => Ok(ContextMode::Whole),
            other => Err(format!(
                "unknown context mode '{}' (expected current, selected, auto or whole)",
                other
            )),
        }
    }
}

/// Session-scoped context choice, changed only by explicit user action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSelection {
    pub mode: ContextMode,
    pub selected_files: Vec<String>,
}

impl ContextSelection {
    pub fn with_mode(mode: ContextMode) -> Self {
        Self {
            mode,
            selected_files: Vec::new(),
        }
    }

    /// Replace the selection, keeping first-seen order and dropping duplicates
    pub fn set_selected<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_files.clear();
        for path in paths {
            let path = path.into();
            if !self.selected_files.contains(&path) {
                self.selected_files.push(path);
            }
        }
    }

    /// Flip one path in or out of the selection
    pub fn toggle(&mut self, path: &str) {
        if let Some(pos) = self.selected_files.iter().position(|p| p == path) {
            self.selected_files.remove(pos);
        } else {
            self.selected_files.push(path.to_string());
        }
    }
}

/// Failures that can reach the assembler boundary
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("cannot read workspace root {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}
