//! Grammar registry, structure extraction, content hashing, and chunking
//! strategies (C2-C5).

pub mod chunk;
mod contextual_imports;
pub mod error;
pub mod hasher;
pub mod language;
pub mod strategy;
pub mod structure;

pub use chunk::{compute_chunk_id, flatten_metadata, ChunkMetadata, CodeChunk, NodeType, Relationship};
pub use contextual_imports::{extract_identifiers_from_import, extract_imports_from_lines, filter_relevant_imports};
pub use error::{ChunkerError, Result};
pub use hasher::{hash_bytes, hash_file, HashCache};
pub use language::{GrammarRegistry, Language};
pub use strategy::{
    scan_imports_only, AstStrategy, ChunkStrategy, JsonObjectStrategy, MarkdownSectionStrategy,
    PlaintextStrategy, SlidingWindowParams, SlidingWindowStrategy, StrategyKind, YamlDocumentStrategy,
};
pub use structure::{extract_structure, CodeStructure};

use std::path::Path;

/// Top-level entry point combining C3 detection with C5 selection: chunk a
/// file's contents given its path, falling back to plaintext when no
/// grammar is available or AST parsing fails (spec §4.3, §7
/// `ParseUnavailable`/`ParseFailure`).
pub struct Chunker {
    registry: GrammarRegistry,
    sliding_window: SlidingWindowParams,
}

impl Chunker {
    pub fn new(sliding_window: SlidingWindowParams) -> Self {
        Self {
            registry: GrammarRegistry::new(),
            sliding_window,
        }
    }

    pub fn chunk_file(&self, path: &Path, content: &str) -> Result<Vec<CodeChunk>> {
        let file_path = path.to_string_lossy().to_string();
        let Some(language) = self.registry.detect(path) else {
            return PlaintextStrategy.chunk(&file_path, content);
        };

        let kind = strategy::select_strategy_kind(language, None);
        let chunks = match kind {
            StrategyKind::Ast => match AstStrategy::new(language).chunk(&file_path, content) {
                Ok(chunks) => chunks,
                Err(ChunkerError::ParseUnavailable(_)) => {
                    log::warn!("grammar unavailable for {file_path}, falling back to plaintext");
                    self.sliding_window_with_imports(language, &file_path, content)?
                }
                Err(err) => {
                    log::warn!("parse failed for {file_path} ({err}), falling back to plaintext");
                    self.sliding_window_with_imports(language, &file_path, content)?
                }
            },
            StrategyKind::JsonObject => JsonObjectStrategy.chunk(&file_path, content).or_else(|err| {
                log::warn!("lenient json parse failed for {file_path} ({err}), falling back to plaintext");
                PlaintextStrategy.chunk(&file_path, content)
            })?,
            StrategyKind::YamlDocument => YamlDocumentStrategy.chunk(&file_path, content)?,
            StrategyKind::MarkdownSection => MarkdownSectionStrategy.chunk(&file_path, content)?,
            StrategyKind::SlidingWindow => self.sliding_window_with_imports(language, &file_path, content)?,
            StrategyKind::Plaintext => PlaintextStrategy.chunk(&file_path, content)?,
        };
        Ok(chunks)
    }

    /// Sliding-window body chunks enriched with whatever imports a grammar
    /// (if any) can scan, per spec §4.4 "other languages: imports only;
    /// body chunks come from the sliding-window strategy".
    fn sliding_window_with_imports(&self, language: Language, file_path: &str, content: &str) -> Result<Vec<CodeChunk>> {
        let mut chunks = SlidingWindowStrategy::new(self.sliding_window).chunk(file_path, content)?;
        if language.has_ast_grammar() {
            if let Ok(imports) = scan_imports_only(language, content) {
                if let Some(first) = chunks.first_mut() {
                    first.metadata.imports = imports;
                }
            }
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn unknown_extension_falls_back_to_plaintext() {
        let chunker = Chunker::new(SlidingWindowParams::default());
        let chunks = chunker
            .chunk_file(&PathBuf::from("README.weird"), "hello\nworld\n")
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].node_type.as_str(), "plaintext");
    }

    #[test]
    fn python_file_routes_to_ast() {
        let chunker = Chunker::new(SlidingWindowParams::default());
        let chunks = chunker
            .chunk_file(&PathBuf::from("a.py"), "def f():\n    pass\n")
            .unwrap();
        assert!(chunks.iter().any(|c| c.node_type.as_str() == "function"));
    }

    #[test]
    fn java_file_routes_to_sliding_window() {
        let chunker = Chunker::new(SlidingWindowParams::default());
        let chunks = chunker
            .chunk_file(&PathBuf::from("A.java"), "import java.util.List;\nclass A {}\n")
            .unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.node_type.as_str() == "sliding_window"));
    }
}
