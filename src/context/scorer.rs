//! Lexical relevance scoring
//!
//! A cheap heuristic: path hits, extension hints, capped keyword counts and a
//! bonus for small files. Deterministic and side-effect free.

use super::{CodeFile, ScoredFile};

const PATH_MATCH_WEIGHT: u32 = 10;
const EXTENSION_MATCH_WEIGHT: u32 = 5;
/// Per-token cap on content hits
const MAX_CONTENT_HITS: u32 = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceScorer;

impl RelevanceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Lowercased query words longer than two characters
    pub fn tokenize(query: &str) -> Vec<String> {
        query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .filter(|w| w.chars().count() > 2)
            .collect()
    }

    /// Relevance of `file` for `query`; higher is better
    pub fn score(&self, file: &CodeFile, query: &str) -> u32 {
        let tokens = Self::tokenize(query);
        let path = file.path.to_lowercase();
        let extension = file.extension();
        let content = file.content.to_lowercase();

        let mut score = 0;
        for token in &tokens {
            if path.contains(token.as_str()) {
                score += PATH_MATCH_WEIGHT;
            }

            // "python" in a query hints at .py files
            if !extension.is_empty() && token.contains(extension.as_str()) {
                score += EXTENSION_MATCH_WEIGHT;
            }

            let hits = content.matches(token.as_str()).count();
            score += (hits as u32).min(MAX_CONTENT_HITS);
        }

        score + size_bonus(file.size)
    }

    /// Score every file and order by score, highest first.
    /// Equal scores keep their discovery order.
    pub fn rank(&self, files: Vec<CodeFile>, query: &str) -> Vec<ScoredFile> {
        let mut scored: Vec<ScoredFile> = files
            .into_iter()
            .map(|file| {
                let score = self.score(&file, query);
                ScoredFile { file, score }
            })
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }
}

fn size_bonus(size: usize) -> u32 {
    if size < 1_000 {
        2
    } else if size < 5_000 {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_short_words() {
        assert_eq!(
            RelevanceScorer::tokenize("How do I Fix the  JSON parser?"),
            vec!["how", "fix", "the", "json", "parser?"]
        );
        assert!(RelevanceScorer::tokenize("a an to").is_empty());
    }

    #[test]
    fn test_path_and_content_score() {
        let content = "import json from 'json';\nconst data = json.load();\n";
        let file = CodeFile::new("config/parser.ts", content);

        let score = RelevanceScorer::new().score(&file, "parse json config");

        // "parse" and "config" hit the path, "json" appears three times
        assert!(score >= 13);
        assert_eq!(score, 10 + 10 + 3 + 2);
    }

    #[test]
    fn test_extension_hint() {
        let file = CodeFile::new("tool.py", &"x".repeat(6_000));

        assert_eq!(RelevanceScorer::new().score(&file, "fix my python code"), 5);
    }

    #[test]
    fn test_content_hits_are_capped() {
        let file = CodeFile::new("notes.md", &"foo ".repeat(2_000));

        assert_eq!(RelevanceScorer::new().score(&file, "FOO"), 5);
    }

    #[test]
    fn test_size_bonus_tiers() {
        let scorer = RelevanceScorer::new();

        assert_eq!(scorer.score(&CodeFile::new("a.txt", "x".repeat(999)), ""), 2);
        assert_eq!(scorer.score(&CodeFile::new("a.txt", "x".repeat(1_000)), ""), 1);
        assert_eq!(scorer.score(&CodeFile::new("a.txt", "x".repeat(4_999)), ""), 1);
        assert_eq!(scorer.score(&CodeFile::new("a.txt", "x".repeat(5_000)), ""), 0);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let file = CodeFile::new("a.c", &format!("{}{}", "y".repeat(6_000), "(*p)++ (*p)++"));

        assert_eq!(RelevanceScorer::new().score(&file, "(*p)++"), 2);
    }

    #[test]
    fn test_score_is_deterministic() {
        let file = CodeFile::new("src/auth/session.rs", "fn session() { auth(); }");
        let scorer = RelevanceScorer::new();

        let first = scorer.score(&file, "auth session handling");
        for _ in 0..5 {
            assert_eq!(scorer.score(&file, "auth session handling"), first);
        }
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let files = vec![
            CodeFile::new("one.txt", "alpha"),
            CodeFile::new("two.txt", "beta"),
            CodeFile::new("three.txt", "beta beta"),
            CodeFile::new("four.txt", "gamma"),
        ];

        let ranked = RelevanceScorer::new().rank(files, "beta");
        let order: Vec<&str> = ranked.iter().map(|s| s.file.path.as_str()).collect();

        assert_eq!(order, vec!["three.txt", "two.txt", "one.txt", "four.txt"]);
        assert_eq!(ranked[0].score, 4);
        assert_eq!(ranked[2].score, 2);
    }
}
