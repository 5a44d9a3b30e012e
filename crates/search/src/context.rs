//! Result shape and context assembly (spec §4.12 steps 4 and 6).

use codecortex_graph::{GraphEdge, GraphNode};
use codecortex_vector_store::Metadata;

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub file_path: String,
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
    /// Outgoing edges for this file's graph nodes, each with its resolved
    /// target node, attached under `metadata.graph_relationships` (spec
    /// §4.12 step 5).
    pub graph_relationships: Vec<(GraphNode, Vec<(GraphEdge, GraphNode)>)>,
    /// Distinct file paths reached via the "related files" full-text
    /// containment heuristic (spec §4.12 step 5, §9 "treat it as a
    /// heuristic hint, not a correctness-critical path").
    pub related_files: Vec<String>,
}

impl SearchResult {
    pub fn file_name(&self) -> &str {
        self.file_path.rsplit('/').next().unwrap_or(&self.file_path)
    }
}

/// Renders the preamble, then one block per result in score order, each
/// `--- <file_path> ---\n<text>\n\n` plus an optional metadata block,
/// stopping before the result that would exceed `max_context_size` and
/// appending a truncation notice (spec §4.12 step 6).
pub fn assemble_context(query: &str, results: &[SearchResult], max_context_size: usize, include_metadata: bool) -> String {
    let mut context = format!("Query: {query}\n\nRelevant code:\n\n");

    for (index, result) in results.iter().enumerate() {
        let mut block = format!("--- {} ---\n{}\n\n", result.file_path, result.text);
        if include_metadata {
            block.push_str(&metadata_block(result));
        }

        if context.len() + block.len() > max_context_size && !context.ends_with("Relevant code:\n\n") {
            let remaining = results.len() - index;
            context.push_str(&format!("... (truncated {remaining} more results)"));
            return context;
        }
        context.push_str(&block);
    }

    context
}

fn metadata_block(result: &SearchResult) -> String {
    let mut block = String::new();
    if let Some(name) = result.metadata.get("name") {
        block.push_str(&format!("Name: {name}\n"));
    }
    if let Some(chunk_type) = result.metadata.get("chunk_type") {
        block.push_str(&format!("Type: {chunk_type}\n"));
    }
    if let Some(docstring) = result.metadata.get("docstring") {
        block.push_str(&format!("Docstring: {docstring}\n"));
    }
    if let Some(imports) = result.metadata.get("imports") {
        if !imports.is_empty() {
            block.push_str(&format!("Imports: {imports}\n"));
        }
    }
    if !result.related_files.is_empty() {
        block.push_str(&format!("Related files: {}\n", result.related_files.join(", ")));
    }
    if !block.is_empty() {
        block.push('\n');
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(file_path: &str, text: &str, score: f32) -> SearchResult {
        SearchResult {
            id: file_path.to_string(),
            file_path: file_path.to_string(),
            text: text.to_string(),
            metadata: BTreeMap::new(),
            score,
            graph_relationships: Vec::new(),
            related_files: Vec::new(),
        }
    }

    #[test]
    fn assembles_preamble_and_blocks_in_order() {
        let results = vec![result("a.py", "def f(): pass", 0.9), result("b.py", "def g(): pass", 0.8)];
        let context = assemble_context("find f", &results, 10_000, false);
        assert!(context.starts_with("Query: find f\n\nRelevant code:\n\n"));
        assert!(context.contains("--- a.py ---\ndef f(): pass\n\n"));
        assert!(context.contains("--- b.py ---\ndef g(): pass\n\n"));
    }

    #[test]
    fn truncates_when_budget_exceeded() {
        let results = vec![result("a.py", "x".repeat(50).as_str(), 0.9), result("b.py", "y".repeat(50).as_str(), 0.8)];
        let context = assemble_context("q", &results, 80, false);
        assert!(context.contains("truncated 1 more results"));
        assert!(!context.contains("b.py"));
    }

    #[test]
    fn first_result_is_always_included_even_if_oversized() {
        let results = vec![result("a.py", "x".repeat(1000).as_str(), 0.9)];
        let context = assemble_context("q", &results, 10, false);
        assert!(context.contains("a.py"));
    }
}
