//! Grammar Registry (C3): extension -> language id, language id -> parser
//! handle or permanent "unavailable".

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Java,
    C,
    Cpp,
    Go,
    Rust,
    Php,
    Ruby,
    Kotlin,
    Scala,
    Dart,
    Swift,
    Bash,
    R,
    Perl,
    Groovy,
    CSharp,
    Json,
    Yaml,
    Markdown,
    PlainText,
}

impl Language {
    /// Map a file extension (without leading dot, lowercased) to a language
    /// id. Returns `None` when the extension is unrecognised.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext {
            "py" | "pyi" => Self::Python,
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            "ts" | "mts" | "cts" => Self::TypeScript,
            "tsx" => Self::Tsx,
            "java" => Self::Java,
            "c" | "h" => Self::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Self::Cpp,
            "go" => Self::Go,
            "rs" => Self::Rust,
            "php" => Self::Php,
            "rb" => Self::Ruby,
            "kt" | "kts" => Self::Kotlin,
            "scala" => Self::Scala,
            "dart" => Self::Dart,
            "swift" => Self::Swift,
            "sh" | "bash" => Self::Bash,
            "r" => Self::R,
            "pl" | "pm" => Self::Perl,
            "groovy" | "gradle" => Self::Groovy,
            "cs" => Self::CSharp,
            "json" | "jsonc" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "md" | "markdown" => Self::Markdown,
            _ => return None,
        })
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.file_name().and_then(|n| n.to_str()) {
            Some("Dockerfile") => return Some(Self::Bash),
            Some("Makefile") => return Some(Self::Bash),
            _ => {}
        }
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::from_extension(&ext)
    }

    /// Whether a tree-sitter grammar is linked in for this language. Only
    /// these languages get full `CodeStructure` extraction (C4); all others
    /// fall back to import-line scanning plus sliding-window chunking.
    pub fn has_ast_grammar(self) -> bool {
        matches!(
            self,
            Self::Python | Self::JavaScript | Self::TypeScript | Self::Tsx | Self::Rust
        )
    }

    /// Python and the JS/TS family get module/class/function/method
    /// structure extraction per spec; Rust's grammar is used only for
    /// relationship extraction (C6), not C4 structure rules.
    pub fn has_structure_rules(self) -> bool {
        matches!(
            self,
            Self::Python | Self::JavaScript | Self::TypeScript | Self::Tsx
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Kotlin => "kotlin",
            Self::Scala => "scala",
            Self::Dart => "dart",
            Self::Swift => "swift",
            Self::Bash => "bash",
            Self::R => "r",
            Self::Perl => "perl",
            Self::Groovy => "groovy",
            Self::CSharp => "csharp",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Markdown => "markdown",
            Self::PlainText => "plaintext",
        }
    }

    fn tree_sitter_language(self) -> Option<tree_sitter::Language> {
        match self {
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Self::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Self::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Self::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            _ => None,
        }
    }
}

/// Failures are permanent for the process lifetime (spec C3): once a
/// language's grammar fails to load, every later `load` call short-circuits
/// without retrying tree-sitter construction.
static PERMANENTLY_UNAVAILABLE: Lazy<Mutex<HashSet<Language>>> =
    Lazy::new(|| Mutex::new(HashSet::new()));

#[derive(Default)]
pub struct GrammarRegistry;

impl GrammarRegistry {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, path: &Path) -> Option<Language> {
        Language::from_path(path)
    }

    /// Build a fresh `tree_sitter::Parser` for `language`, or report
    /// unavailability. Parsers are never cached across calls (design note:
    /// treat parser handles as opaque, call-scoped capabilities).
    pub fn load(&self, language: Language) -> crate::error::Result<tree_sitter::Parser> {
        if PERMANENTLY_UNAVAILABLE.lock().unwrap().contains(&language) {
            return Err(crate::error::ChunkerError::ParseUnavailable(language));
        }
        let Some(ts_lang) = language.tree_sitter_language() else {
            PERMANENTLY_UNAVAILABLE.lock().unwrap().insert(language);
            return Err(crate::error::ChunkerError::ParseUnavailable(language));
        };
        let mut parser = tree_sitter::Parser::new();
        if parser.set_language(&ts_lang).is_err() {
            PERMANENTLY_UNAVAILABLE.lock().unwrap().insert(language);
            return Err(crate::error::ChunkerError::ParseUnavailable(language));
        }
        Ok(parser)
    }
}
