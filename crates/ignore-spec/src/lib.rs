//! Path normalisation and gitwildmatch-style ignore evaluation.
//!
//! An [`IgnoreSpec`] is the deduplicated union of a global pattern list and a
//! project's `.augmentoriumignore` file, plus the always-on
//! `**/.augmentorium/**` pattern that keeps the indexer out of its own
//! project directory. The spec is immutable once built; callers rebuild it
//! when either source changes.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ALWAYS_IGNORED: &str = "**/.augmentorium/**";

#[derive(Debug, Error)]
pub enum IgnoreError {
    #[error("invalid ignore pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: ignore::Error,
    },
}

pub type Result<T> = std::result::Result<T, IgnoreError>;

/// Compiled ignore rules for one project.
#[derive(Clone)]
pub struct IgnoreSpec {
    root: PathBuf,
    matcher: Gitignore,
}

impl IgnoreSpec {
    /// Build a spec from the union of global patterns and a project ignore
    /// file's raw contents (may be `None` if the file does not exist).
    pub fn compile(
        project_root: impl AsRef<Path>,
        global_patterns: &[String],
        project_ignore_contents: Option<&str>,
    ) -> Result<Self> {
        let root = project_root.as_ref().to_path_buf();
        let mut builder = GitignoreBuilder::new(&root);

        builder
            .add_line(None, ALWAYS_IGNORED)
            .map_err(|source| IgnoreError::InvalidPattern {
                pattern: ALWAYS_IGNORED.to_string(),
                source,
            })?;

        let mut patterns: Vec<&str> = Vec::new();
        for p in global_patterns {
            patterns.push(p.as_str());
        }
        let project_lines: Vec<String> = project_ignore_contents
            .map(parse_ignore_file)
            .unwrap_or_default();
        for p in &project_lines {
            patterns.push(p.as_str());
        }

        // Deduplicate while preserving first-seen order.
        let mut seen = std::collections::HashSet::new();
        for pattern in patterns {
            if seen.insert(pattern) {
                builder
                    .add_line(None, pattern)
                    .map_err(|source| IgnoreError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })?;
            }
        }

        let matcher = builder.build().map_err(|source| IgnoreError::InvalidPattern {
            pattern: "<build>".to_string(),
            source,
        })?;

        Ok(Self { root, matcher })
    }

    /// Empty spec carrying only the always-on pattern, for callers that have
    /// no global config and no project ignore file yet.
    pub fn empty(project_root: impl AsRef<Path>) -> Result<Self> {
        Self::compile(project_root, &[], None)
    }

    /// Evaluate a candidate path, relative or absolute, against this spec.
    /// Directories should pass `is_dir = true` so directory-only patterns
    /// apply and so callers can use the result to prune a recursive walk.
    pub fn should_ignore(&self, candidate: impl AsRef<Path>, is_dir: bool) -> bool {
        let candidate = candidate.as_ref();
        let relative = candidate.strip_prefix(&self.root).unwrap_or(candidate);
        matches!(
            self.matcher.matched(relative, is_dir),
            ignore::Match::Ignore(_)
        )
    }
}

/// Parse ignore-file contents into a pattern list, skipping blank lines and
/// `#`-prefixed comments, matching gitignore conventions.
pub fn parse_ignore_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Normalise a path to a forward-slash relative string for cross-platform
/// stable identity (hash cache keys, chunk metadata, ignore matching).
pub fn normalise_relative(root: impl AsRef<Path>, path: impl AsRef<Path>) -> String {
    let relative = path.as_ref().strip_prefix(root.as_ref()).unwrap_or(path.as_ref());
    relative.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn always_ignores_internal_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spec = IgnoreSpec::empty(dir.path()).unwrap();
        let internal = dir.path().join(".augmentorium").join("chroma").join("index.bin");
        assert!(spec.should_ignore(&internal, false));
    }

    #[test]
    fn parses_ignore_file_skipping_comments_and_blanks() {
        let contents = "# a comment\n\n*.log\nbuild/\n  # indented comment\n";
        let lines = parse_ignore_file(contents);
        assert_eq!(lines, vec!["*.log".to_string(), "build/".to_string()]);
    }

    #[test]
    fn unions_global_and_project_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let spec = IgnoreSpec::compile(dir.path(), &["*.log".to_string()], Some("build/\n")).unwrap();

        assert!(spec.should_ignore(dir.path().join("debug.log"), false));
        assert!(spec.should_ignore(dir.path().join("build"), true));
        assert!(!spec.should_ignore(dir.path().join("src/main.rs"), false));
    }

    #[test]
    fn normalises_to_forward_slashes() {
        let root = Path::new("/proj");
        let p = root.join("src").join("lib.rs");
        assert_eq!(normalise_relative(root, &p), "src/lib.rs");
    }

    #[test]
    fn reads_real_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let ignore_path = dir.path().join(".augmentoriumignore");
        fs::write(&ignore_path, "*.tmp\n").unwrap();
        let contents = fs::read_to_string(&ignore_path).unwrap();
        let spec = IgnoreSpec::compile(dir.path(), &[], Some(&contents)).unwrap();
        assert!(spec.should_ignore(dir.path().join("a.tmp"), false));
    }
}
