use super::{extract_lines, ChunkStrategy};
use crate::chunk::{ChunkMetadata, CodeChunk};
use crate::error::{ChunkerError, Result};
use crate::language::{GrammarRegistry, Language};
use crate::structure::{extract_structure, scan_imports, CodeStructure};

/// Emits one chunk per `CodeStructure` node (module, class, function,
/// method); parent chunk id is recorded on children (spec §4.5).
pub struct AstStrategy {
    language: Language,
}

impl AstStrategy {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl ChunkStrategy for AstStrategy {
    fn chunk(&self, file_path: &str, content: &str) -> Result<Vec<CodeChunk>> {
        let registry = GrammarRegistry::new();
        let mut parser = registry.load(self.language)?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ChunkerError::ParseFailure {
                path: file_path.to_string(),
                reason: "tree-sitter returned no tree".to_string(),
            })?;

        if tree.root_node().has_error() {
            log::warn!("parse tree for {file_path} contains error nodes; structure may be partial");
        }

        let module = extract_structure(self.language, content, &tree);
        let mut chunks = Vec::new();
        emit(file_path, content, &module, None, self.language, &mut chunks);
        Ok(chunks)
    }
}

fn emit(
    file_path: &str,
    content: &str,
    node: &CodeStructure,
    parent_id: Option<String>,
    language: Language,
    out: &mut Vec<CodeChunk>,
) {
    let text = extract_lines(content, node.start_line, node.end_line);
    let mut metadata = ChunkMetadata {
        docstring: node.docstring.clone(),
        imports: node.imports.clone(),
        ..Default::default()
    };
    metadata.extra.insert(
        "has_children".to_string(),
        (!node.children.is_empty()).to_string(),
    );

    let chunk = CodeChunk::new(
        file_path.to_string(),
        node.start_line,
        node.end_line,
        node.node_type,
        node.name.clone(),
        Some(language.as_str().to_string()),
        text,
        metadata,
    );
    let mut chunk = chunk;
    chunk.parent_chunk_id = parent_id.clone();
    let this_id = chunk.id.clone();
    out.push(chunk);

    for child in &node.children {
        emit(file_path, content, child, Some(this_id.clone()), language, out);
    }
}

/// For languages without structure rules, only import scanning applies; the
/// body is left to the sliding-window strategy (spec §4.4 "other
/// languages"). Exposed so the indexer can still record imports on the
/// sliding-window chunks it produces for such files.
pub fn scan_imports_only(language: Language, content: &str) -> Result<Vec<String>> {
    let registry = GrammarRegistry::new();
    let mut parser = registry.load(language)?;
    let tree = parser.parse(content, None).ok_or_else(|| ChunkerError::ParseFailure {
        path: String::new(),
        reason: "tree-sitter returned no tree".to_string(),
    })?;
    Ok(scan_imports(tree.root_node(), content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_class_yields_module_class_two_methods() {
        let strategy = AstStrategy::new(Language::Python);
        let source = "class Foo:\n  def bar(self): pass\n  def baz(self): pass\n";
        let chunks = strategy.chunk("a.py", source).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].node_type.as_str(), "module");
        assert_eq!(chunks[1].node_type.as_str(), "class");
        assert_eq!(chunks[2].node_type.as_str(), "method");
        assert_eq!(chunks[3].node_type.as_str(), "method");
        assert_eq!(chunks[1].parent_chunk_id.as_deref(), Some(chunks[0].id.as_str()));
        assert_eq!(chunks[2].parent_chunk_id.as_deref(), Some(chunks[1].id.as_str()));
    }

    #[test]
    fn rust_without_structure_rules_yields_only_module() {
        let strategy = AstStrategy::new(Language::Rust);
        let chunks = strategy.chunk("a.rs", "use std::fmt;\nfn main() {}\n").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.imports, vec!["use std::fmt;"]);
    }
}
