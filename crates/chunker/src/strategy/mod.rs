//! Chunking Strategies (C5): polymorphic over {AST, sliding-window,
//! JSON-object, YAML-document, Markdown-section, plaintext-fallback}.

mod ast;
mod json_object;
mod markdown_section;
mod plaintext;
mod sliding_window;
mod yaml_document;

pub use ast::{scan_imports_only, AstStrategy};
pub use json_object::JsonObjectStrategy;
pub use markdown_section::MarkdownSectionStrategy;
pub use plaintext::PlaintextStrategy;
pub use sliding_window::{SlidingWindowParams, SlidingWindowStrategy};
pub use yaml_document::YamlDocumentStrategy;

use crate::chunk::CodeChunk;
use crate::error::Result;
use crate::language::Language;

pub trait ChunkStrategy {
    fn chunk(&self, file_path: &str, content: &str) -> Result<Vec<CodeChunk>>;
}

/// Named strategy, as configurable per extension in the root config
/// (`indexer.ignore_patterns` siblings not covered here; chunking strategy
/// selection is a language-config concern per spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Ast,
    SlidingWindow,
    JsonObject,
    YamlDocument,
    MarkdownSection,
    Plaintext,
}

/// Selection rule (spec §4.5): explicit per-extension config wins; else AST
/// if a grammar is available; else a format-specific strategy; else
/// sliding-window.
pub fn select_strategy_kind(language: Language, configured: Option<StrategyKind>) -> StrategyKind {
    if let Some(kind) = configured {
        return kind;
    }
    if language.has_ast_grammar() {
        return StrategyKind::Ast;
    }
    match language {
        Language::Json => StrategyKind::JsonObject,
        Language::Yaml => StrategyKind::YamlDocument,
        Language::Markdown => StrategyKind::MarkdownSection,
        _ => StrategyKind::SlidingWindow,
    }
}

pub(crate) fn extract_lines(content: &str, start_line: usize, end_line: usize) -> String {
    content
        .lines()
        .skip(start_line.saturating_sub(1))
        .take(end_line.saturating_sub(start_line) + 1)
        .collect::<Vec<_>>()
        .join("\n")
}
