//! Workspace file discovery
//!
//! Walks the workspace depth-first and reads every allowed source file that
//! is not ignored and is small enough to hand to the model.

use std::path::{Component, Path};

use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

use super::{CodeFile, ContextError, IgnoreMatcher, MAX_FILE_CHARS};

/// Extensions worth reading, lowercase without the dot
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    // Code
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "py", "rb", "go", "rs", "java", "kt", "kts",
    "scala", "swift", "c", "h", "cc", "cpp", "hpp", "cs", "php", "lua", "dart", "r", "sql",
    "sh", "bash", "zsh", "ps1",
    // Markup and styles
    "html", "htm", "css", "scss", "sass", "less", "vue", "svelte",
    // Config
    "json", "yaml", "yml", "toml", "xml", "ini", "cfg", "conf",
    // Docs
    "md", "mdx", "txt", "rst",
];

/// UTF-8 needs at most 4 bytes per char, so anything larger is over the cap.
const MAX_FILE_BYTES: u64 = (MAX_FILE_CHARS as u64) * 4;

/// Collects the candidate files for one request
pub struct FileDiscovery {
    matcher: IgnoreMatcher,
}

impl FileDiscovery {
    pub fn new(matcher: IgnoreMatcher) -> Self {
        Self { matcher }
    }

    /// Read every eligible file under `root`, in depth-first, name-sorted order.
    ///
    /// A missing root yields no files. Unreadable entries are skipped; only a
    /// failure to read the root directory itself is returned.
    pub fn discover(&self, root: Option<&Path>) -> Result<Vec<CodeFile>, ContextError> {
        let Some(root) = root else {
            debug!("No workspace root, nothing to discover");
            return Ok(Vec::new());
        };
        if !root.is_dir() {
            debug!("Workspace root {} is not a directory", root.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut skipped = 0usize;

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.entry_ignored(root, e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(ContextError::Discovery {
                        path: root.to_path_buf(),
                        source: e,
                    });
                }
                Err(e) => {
                    if let Some(ancestor) = e.loop_ancestor() {
                        warn!("Skipping symlink loop back to {}", ancestor.display());
                    } else {
                        warn!("Skipping unreadable entry: {}", e);
                    }
                    skipped += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() || !has_allowed_extension(entry.path()) {
                continue;
            }

            let relative = relative_path(root, entry.path());
            match read_code_file(&entry, relative) {
                Some(file) => {
                    trace!("Discovered {} ({} chars)", file.path, file.size);
                    files.push(file);
                }
                None => skipped += 1,
            }
        }

        debug!(
            "Discovered {} files under {} ({} skipped)",
            files.len(),
            root.display(),
            skipped
        );
        Ok(files)
    }

    fn entry_ignored(&self, root: &Path, entry: &DirEntry) -> bool {
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        self.matcher.is_ignored(relative, entry.file_type().is_dir())
    }
}

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// `/`-separated path of `path` under `root`
fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn read_code_file(entry: &DirEntry, relative: String) -> Option<CodeFile> {
    if let Ok(meta) = entry.metadata() {
        if meta.len() > MAX_FILE_BYTES {
            debug!("Skipping {}: {} bytes", relative, meta.len());
            return None;
        }
    }

    let content = match std::fs::read_to_string(entry.path()) {
        Ok(content) => content,
        Err(e) => {
            debug!("Skipping {}: {}", relative, e);
            return None;
        }
    };

    let file = CodeFile::new(relative, content);
    if file.size >= MAX_FILE_CHARS {
        debug!("Skipping {}: {} chars", file.path, file.size);
        return None;
    }
    Some(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn discover(root: &Path) -> Vec<CodeFile> {
        let discovery = FileDiscovery::new(IgnoreMatcher::new(Some(root), &[]));
        discovery.discover(Some(root)).unwrap()
    }

    fn paths(files: &[CodeFile]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_discovers_allowed_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/main.rs", "fn main() {}");
        write(dir.path(), "src/lib/util.ts", "export const x = 1;");
        write(dir.path(), "README.md", "# readme");
        write(dir.path(), "logo.png", "not really a png");
        write(dir.path(), "Makefile", "all:");

        let files = discover(dir.path());

        assert_eq!(paths(&files), vec!["README.md", "src/lib/util.ts", "src/main.rs"]);
    }

    #[test]
    fn test_ignored_paths_never_returned() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".gitignore", "secret/\n");
        write(dir.path(), "node_modules/pkg/index.js", "module.exports = 1;");
        write(dir.path(), "secret/keys.json", "{}");
        write(dir.path(), "dist/app.js", "bundled");
        write(dir.path(), "app.min.js", "minified");
        write(dir.path(), "src/app.js", "real code");

        let matcher = IgnoreMatcher::new(Some(dir.path()), &[]);
        let files = discover(dir.path());

        assert_eq!(paths(&files), vec!["src/app.js"]);
        for file in &files {
            assert!(!matcher.ignores(&file.path));
        }
    }

    #[test]
    fn test_size_cap_and_size_invariant() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "big.txt", &"a".repeat(MAX_FILE_CHARS));
        write(dir.path(), "almost.txt", &"a".repeat(MAX_FILE_CHARS - 1));
        write(dir.path(), "huge.txt", &"a".repeat(MAX_FILE_CHARS * 5));

        let files = discover(dir.path());

        assert_eq!(paths(&files), vec!["almost.txt"]);
        for file in &files {
            assert_eq!(file.size, file.content.chars().count());
            assert!(file.size < MAX_FILE_CHARS);
        }
    }

    #[test]
    fn test_non_utf8_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("binary.txt"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();
        write(dir.path(), "ok.txt", "fine");

        let files = discover(dir.path());

        assert_eq!(paths(&files), vec!["ok.txt"]);
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let discovery = FileDiscovery::new(IgnoreMatcher::with_defaults());

        assert!(discovery.discover(None).unwrap().is_empty());
        let missing = PathBuf::from("/definitely/not/a/workspace");
        assert!(discovery.discover(Some(&missing)).unwrap().is_empty());
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b/one.py", "print(1)");
        write(dir.path(), "a/two.py", "print(2)");
        write(dir.path(), "three.py", "print(3)");

        let first = discover(dir.path());
        let second = discover(dir.path());

        assert_eq!(paths(&first), paths(&second));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_does_not_hang() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.rs", "fn a() {}");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("src/loop")).unwrap();

        let files = discover(dir.path());

        assert_eq!(paths(&files), vec!["src/a.rs"]);
    }
}
