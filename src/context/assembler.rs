//! Context assembly
//!
//! Turns a context mode, a query and the editor state into one bounded text
//! block. Assembly never fails: errors become a fallback notice.

use std::path::Path;

use tracing::{debug, warn};

use super::{
    ActiveFile, CodeFile, ContextError, ContextMode, FileDiscovery, RelevanceScorer,
};

pub const NO_CURRENT_FILE: &str = "No file is currently open in the editor.";
pub const NO_FILES_SELECTED: &str =
    "No files selected. Pick files with /select or switch to another context mode.";
pub const NO_CONTEXT_FALLBACK: &str = "No relevant context found. Providing general assistance.";
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

const FOCUS_INSTRUCTION: &str =
    "The question refers to the current file. Focus your answer on this file.";

/// Hard cap on related files in `auto` mode, whatever the configuration says
pub const AUTO_MAX_FILES: usize = 2;
pub const AUTO_TRUNCATE_CHARS: usize = 2_000;
pub const WHOLE_MAX_FILES: usize = 20;
pub const WHOLE_TRUNCATE_CHARS: usize = 1_500;

pub const DEFAULT_MAX_CONTEXT_FILES: usize = 5;

/// Phrases that point a query at the open file
pub const DEFAULT_REFERENCE_PHRASES: &[&str] = &[
    "this file",
    "current file",
    "explain this",
    "fix this",
    "this function",
    "this code",
    "this class",
    "this method",
    "what does this do",
];

/// Everything one assembly depends on
#[derive(Debug, Clone, Copy)]
pub struct ContextRequest<'a> {
    pub mode: ContextMode,
    pub query: &'a str,
    pub selected_files: &'a [String],
    pub active_file: Option<&'a ActiveFile>,
    pub root: Option<&'a Path>,
}

/// Builds the context block for a chat turn
pub struct ContextAssembler {
    discovery: FileDiscovery,
    scorer: RelevanceScorer,
    max_context_files: usize,
    reference_phrases: Vec<String>,
}

impl ContextAssembler {
    pub fn new(discovery: FileDiscovery) -> Self {
        Self {
            discovery,
            scorer: RelevanceScorer::new(),
            max_context_files: DEFAULT_MAX_CONTEXT_FILES,
            reference_phrases: DEFAULT_REFERENCE_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Upper bound on related files in `auto` mode (still capped at 2)
    pub fn with_max_context_files(mut self, max: usize) -> Self {
        self.max_context_files = max;
        self
    }

    pub fn with_reference_phrases(mut self, phrases: Vec<String>) -> Self {
        self.reference_phrases = phrases.into_iter().map(|p| p.to_lowercase()).collect();
        self
    }

    pub fn discovery(&self) -> &FileDiscovery {
        &self.discovery
    }

    /// Assemble the context text. Never empty, never an error.
    pub fn assemble(&self, request: &ContextRequest<'_>) -> String {
        match self.try_assemble(request) {
            Ok(context) if context.trim().is_empty() => NO_CONTEXT_FALLBACK.to_string(),
            Ok(context) => {
                debug!(
                    "Assembled {} context: {} chars",
                    request.mode,
                    context.chars().count()
                );
                context
            }
            Err(e) => {
                warn!("Context assembly failed: {}", e);
                format!("Context unavailable ({}). Providing general assistance.", e)
            }
        }
    }

    fn try_assemble(&self, request: &ContextRequest<'_>) -> Result<String, ContextError> {
        match request.mode {
            ContextMode::Current => Ok(current_context(request.active_file)),
            ContextMode::Selected => self.selected_context(request),
            ContextMode::Auto => self.auto_context(request),
            ContextMode::Whole => self.whole_context(request.root),
        }
    }

    fn selected_context(&self, request: &ContextRequest<'_>) -> Result<String, ContextError> {
        if request.selected_files.is_empty() {
            return Ok(NO_FILES_SELECTED.to_string());
        }

        let files = self.discovery.discover(request.root)?;
        let mut context = String::new();
        for path in request.selected_files {
            match files.iter().find(|f| &f.path == path) {
                Some(file) => push_file_block(&mut context, &file.path, &file.content),
                None => debug!("Selected file {} is no longer available", path),
            }
        }
        Ok(context)
    }

    fn auto_context(&self, request: &ContextRequest<'_>) -> Result<String, ContextError> {
        let mut context = String::new();

        if let Some(active) = request.active_file {
            context.push_str(&active_block(active));

            if self.references_active_file(request.query, active) {
                debug!("Query refers to {}, skipping workspace search", active.name);
                context.push('\n');
                context.push_str(FOCUS_INSTRUCTION);
                context.push('\n');
                return Ok(context);
            }
        }

        let limit = self.max_context_files.min(AUTO_MAX_FILES);
        let active_basename = request.active_file.map(|a| a.basename());
        let files = self.discovery.discover(request.root)?;

        let related: Vec<CodeFile> = self
            .scorer
            .rank(files, request.query)
            .into_iter()
            .map(|scored| scored.file)
            .take(limit)
            // A duplicate of the open file uses up its slot
            .filter(|file| match active_basename {
                Some(name) if !name.is_empty() => !file.path.contains(name),
                _ => true,
            })
            .collect();

        if !related.is_empty() {
            if !context.is_empty() {
                context.push('\n');
            }
            context.push_str("Related files:\n\n");
            for file in &related {
                push_file_block(
                    &mut context,
                    &file.path,
                    &truncate(&file.content, AUTO_TRUNCATE_CHARS),
                );
            }
        }

        Ok(context)
    }

    fn whole_context(&self, root: Option<&Path>) -> Result<String, ContextError> {
        let files = self.discovery.discover(root)?;
        let ranked = self.scorer.rank(files, "");
        let included = ranked.len().min(WHOLE_MAX_FILES);
        if included == 0 {
            return Ok(String::new());
        }

        let mut context = format!("Workspace overview ({} files):\n\n", included);
        for scored in ranked.iter().take(WHOLE_MAX_FILES) {
            push_file_block(
                &mut context,
                &scored.file.path,
                &truncate(&scored.file.content, WHOLE_TRUNCATE_CHARS),
            );
        }
        Ok(context)
    }

    /// Does the query point at the open file rather than the workspace?
    pub fn references_active_file(&self, query: &str, active: &ActiveFile) -> bool {
        let query = query.to_lowercase();
        let basename = active.basename().to_lowercase();

        (!basename.is_empty() && query.contains(&basename))
            || self
                .reference_phrases
                .iter()
                .any(|phrase| !phrase.is_empty() && query.contains(phrase.as_str()))
    }
}

fn current_context(active: Option<&ActiveFile>) -> String {
    match active {
        Some(active) => active_block(active),
        None => NO_CURRENT_FILE.to_string(),
    }
}

fn active_block(active: &ActiveFile) -> String {
    format!("Current file: {}\n\n{}\n", active.name, active.content)
}

fn push_file_block(context: &mut String, path: &str, content: &str) {
    context.push_str(&format!("--- File: {} ---\n{}\n\n", path, content));
}

/// First `max_chars` characters, with a marker when anything was cut
pub fn truncate(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &content[..cut], TRUNCATION_MARKER),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::IgnoreMatcher;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn assembler(root: &Path) -> ContextAssembler {
        ContextAssembler::new(FileDiscovery::new(IgnoreMatcher::new(Some(root), &[])))
    }

    fn request<'a>(
        mode: ContextMode,
        query: &'a str,
        selected: &'a [String],
        active: Option<&'a ActiveFile>,
        root: &'a Path,
    ) -> ContextRequest<'a> {
        ContextRequest {
            mode,
            query,
            selected_files: selected,
            active_file: active,
            root: Some(root),
        }
    }

    fn block_count(context: &str) -> usize {
        context.matches("--- File: ").count()
    }

    #[test]
    fn test_current_mode() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "other.rs", "fn other() {}");
        let assembler = assembler(dir.path());
        let active = ActiveFile::new("src/main.rs", "fn main() {}");

        let with_file = assembler.assemble(&request(
            ContextMode::Current,
            "anything",
            &[],
            Some(&active),
            dir.path(),
        ));
        assert!(with_file.contains("src/main.rs"));
        assert!(with_file.contains("fn main() {}"));
        assert!(!with_file.contains("other.rs"));

        let without = assembler.assemble(&request(
            ContextMode::Current,
            "anything",
            &[],
            None,
            dir.path(),
        ));
        assert_eq!(without, NO_CURRENT_FILE);
    }

    #[test]
    fn test_selected_mode_skips_stale_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.ts", "export const a = 1;");
        write(dir.path(), "src/b.ts", "export const b = 2;");
        let assembler = assembler(dir.path());
        let selected = vec![
            "src/b.ts".to_string(),
            "src/deleted.ts".to_string(),
            "src/a.ts".to_string(),
        ];

        let context = assembler.assemble(&request(
            ContextMode::Selected,
            "",
            &selected,
            None,
            dir.path(),
        ));

        assert_eq!(block_count(&context), 2);
        let b = context.find("--- File: src/b.ts ---").unwrap();
        let a = context.find("--- File: src/a.ts ---").unwrap();
        assert!(b < a);
        assert!(!context.contains("deleted.ts"));
    }

    #[test]
    fn test_selected_mode_empty_selection() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.ts", "export const a = 1;");

        let context = assembler(dir.path()).assemble(&request(
            ContextMode::Selected,
            "what is a",
            &[],
            None,
            dir.path(),
        ));

        assert_eq!(context, NO_FILES_SELECTED);
    }

    #[test]
    fn test_selected_mode_all_stale_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let selected = vec!["gone.rs".to_string()];

        let context = assembler(dir.path()).assemble(&request(
            ContextMode::Selected,
            "",
            &selected,
            None,
            dir.path(),
        ));

        assert_eq!(context, NO_CONTEXT_FALLBACK);
    }

    #[test]
    fn test_auto_mode_focuses_on_referenced_file() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            write(
                dir.path(),
                &format!("src/function{}.ts", i),
                "explain this function function function",
            );
        }
        let assembler = assembler(dir.path());
        let active = ActiveFile::new("src/open.ts", "export function open() {}");

        let context = assembler.assemble(&request(
            ContextMode::Auto,
            "explain this function",
            &[],
            Some(&active),
            dir.path(),
        ));

        assert!(context.starts_with("Current file: src/open.ts"));
        assert!(context.contains("export function open() {}"));
        assert!(context.contains(FOCUS_INSTRUCTION));
        assert_eq!(block_count(&context), 0);
    }

    #[test]
    fn test_auto_mode_basename_reference() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/router.ts", "router router");
        let assembler = assembler(dir.path());
        let active = ActiveFile::new("src/server.ts", "listen()");

        let context = assembler.assemble(&request(
            ContextMode::Auto,
            "why does SERVER.TS crash on the router",
            &[],
            Some(&active),
            dir.path(),
        ));

        assert_eq!(block_count(&context), 0);
    }

    #[test]
    fn test_auto_mode_ranks_by_relevance() {
        let dir = tempfile::tempdir().unwrap();
        let mut small = "const a = foo;".to_string();
        small.push_str(&" ".repeat(50 - small.len()));
        let mut large = "foo\n".repeat(20);
        large.push_str(&"x".repeat(10_000 - large.len()));
        write(dir.path(), "a.ts", &small);
        write(dir.path(), "b.ts", &large);
        write(dir.path(), "c.ts", "unrelated");

        let context = assembler(dir.path()).assemble(&request(
            ContextMode::Auto,
            "foo",
            &[],
            None,
            dir.path(),
        ));

        let b = context.find("--- File: b.ts ---").unwrap();
        let a = context.find("--- File: a.ts ---").unwrap();
        assert!(b < a);
        assert_eq!(block_count(&context), 2);
        assert!(context.contains(TRUNCATION_MARKER));
        assert!(!context.contains("c.ts"));
    }

    #[test]
    fn test_auto_mode_respects_smaller_configured_max() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.ts", "foo");
        write(dir.path(), "b.ts", "foo foo");
        let assembler = assembler(dir.path()).with_max_context_files(1);

        let context = assembler.assemble(&request(
            ContextMode::Auto,
            "foo",
            &[],
            None,
            dir.path(),
        ));

        assert_eq!(block_count(&context), 1);
        assert!(context.contains("--- File: b.ts ---"));
    }

    #[test]
    fn test_auto_mode_skips_duplicate_of_active_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/parser.rs", "parse parse parse");
        write(dir.path(), "src/lexer.rs", "parse tokens");
        let assembler = assembler(dir.path());
        let active = ActiveFile::new("src/parser.rs", "parse parse parse");

        let context = assembler.assemble(&request(
            ContextMode::Auto,
            "how does parse work",
            &[],
            Some(&active),
            dir.path(),
        ));

        assert!(context.starts_with("Current file: src/parser.rs"));
        assert!(!context.contains("--- File: src/parser.rs ---"));
        assert!(context.contains("--- File: src/lexer.rs ---"));
    }

    #[test]
    fn test_auto_mode_duplicate_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/parser.rs", "parse parse parse");
        write(dir.path(), "src/lexer.rs", "parse tokens, parse idents");
        write(dir.path(), "src/util.rs", "parse once");
        let assembler = assembler(dir.path());
        let active = ActiveFile::new("src/parser.rs", "parse parse parse");

        let context = assembler.assemble(&request(
            ContextMode::Auto,
            "how does parse work",
            &[],
            Some(&active),
            dir.path(),
        ));

        // parser.rs and lexer.rs are the top two; parser.rs is dropped
        assert_eq!(block_count(&context), 1);
        assert!(context.contains("--- File: src/lexer.rs ---"));
        assert!(!context.contains("src/util.rs"));
    }

    #[test]
    fn test_whole_mode_caps_files_and_length() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..25 {
            write(dir.path(), &format!("file{:02}.md", i), &"z".repeat(3_000));
        }

        let context = assembler(dir.path()).assemble(&request(
            ContextMode::Whole,
            "ignored query",
            &[],
            None,
            dir.path(),
        ));

        assert_eq!(block_count(&context), WHOLE_MAX_FILES);
        assert!(context.starts_with("Workspace overview (20 files)"));
        for block in context.split("--- File: ").skip(1) {
            let body = block.split_once(" ---\n").unwrap().1.trim_end();
            let body = body.strip_suffix(TRUNCATION_MARKER).unwrap_or(body);
            assert!(body.chars().count() <= WHOLE_TRUNCATE_CHARS);
        }
    }

    #[test]
    fn test_empty_workspace_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = assembler(dir.path());

        for mode in [ContextMode::Auto, ContextMode::Whole] {
            let context = assembler.assemble(&request(mode, "hello", &[], None, dir.path()));
            assert_eq!(context, NO_CONTEXT_FALLBACK);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_root_becomes_notice() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("locked");
        fs::create_dir(&root).unwrap();
        fs::set_permissions(&root, fs::Permissions::from_mode(0o000)).unwrap();
        // Root can read anything; nothing to assert in that case.
        if fs::read_dir(&root).is_ok() {
            return;
        }

        let context = assembler(&root).assemble(&request(
            ContextMode::Whole,
            "",
            &[],
            None,
            &root,
        ));
        fs::set_permissions(&root, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(!context.trim().is_empty());
        assert!(context.contains("general assistance"));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("héllo", 10), "héllo");
        assert_eq!(truncate("héllo", 2), format!("hé{}", TRUNCATION_MARKER));
        assert_eq!(truncate("abc", 3), "abc");
    }
}
