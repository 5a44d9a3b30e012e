//! `CodeChunk`, the unit persisted into the vector store, and the
//! deterministic id scheme from spec Data Model §3.

use crate::hasher::hash_bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[default]
    Module,
    Class,
    Function,
    Method,
    Plaintext,
    JsonObject,
    JsonArrayItem,
    YamlDocument,
    MarkdownSection,
    MarkdownDocument,
    SlidingWindow,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
            Self::Method => "method",
            Self::Plaintext => "plaintext",
            Self::JsonObject => "json_object",
            Self::JsonArrayItem => "json_array_item",
            Self::YamlDocument => "yaml_document",
            Self::MarkdownSection => "markdown_section",
            Self::MarkdownDocument => "markdown_document",
            Self::SlidingWindow => "sliding_window",
        }
    }
}

/// A typed reference extracted by the relationship extractor (C6). `target`
/// is the raw textual reference, never resolved to an id at extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub target: String,
    pub relation_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub docstring: Option<String>,
    pub imports: Vec<String>,
    pub references: Vec<Relationship>,
    pub file_name: String,
    pub file_size: u64,
    pub last_modified: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub json_path: Option<String>,
    pub parent_path: Option<String>,
    pub header_level: Option<u32>,
    /// Strategy-specific or caller-supplied scalar fields not worth a named
    /// field above (kept scalar already, so no flattening needed for these).
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChunk {
    pub id: String,
    pub text: String,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub node_type: NodeType,
    pub name: Option<String>,
    pub language: Option<String>,
    pub parent_chunk_id: Option<String>,
    pub metadata: ChunkMetadata,
}

impl CodeChunk {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file_path: String,
        start_line: usize,
        end_line: usize,
        node_type: NodeType,
        name: Option<String>,
        language: Option<String>,
        text: String,
        metadata: ChunkMetadata,
    ) -> Self {
        let id = compute_chunk_id(&file_path, name.as_deref(), node_type, start_line, end_line);
        Self {
            id,
            text,
            file_path,
            start_line,
            end_line,
            node_type,
            name,
            language,
            parent_chunk_id: None,
            metadata,
        }
    }

    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// `id` is deterministic from `(basename(file), name?, node_type,
/// start_line, end_line)` so re-indexes of unchanged regions converge to the
/// same id and the generation timestamp never enters it (spec §9).
pub fn compute_chunk_id(
    file_path: &str,
    name: Option<&str>,
    node_type: NodeType,
    start_line: usize,
    end_line: usize,
) -> String {
    let basename = Path::new(file_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_path);
    let key = format!(
        "{basename}|{}|{}|{start_line}|{end_line}",
        name.unwrap_or(""),
        node_type.as_str()
    );
    hash_bytes(key.as_bytes())
}

/// Flatten metadata to a scalar string map at the vector-store write
/// boundary (spec §9 Design Notes: "Metadata flattening"). Lists are
/// comma-joined; empty lists become `""`.
pub fn flatten_metadata(chunk: &CodeChunk) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert("file_path".to_string(), chunk.file_path.clone());
    map.insert("file_name".to_string(), chunk.metadata.file_name.clone());
    map.insert("file_size".to_string(), chunk.metadata.file_size.to_string());
    map.insert("last_modified".to_string(), chunk.metadata.last_modified.clone());
    map.insert("chunk_index".to_string(), chunk.metadata.chunk_index.to_string());
    map.insert("total_chunks".to_string(), chunk.metadata.total_chunks.to_string());
    map.insert("chunk_type".to_string(), chunk.node_type.as_str().to_string());
    map.insert("imports".to_string(), chunk.metadata.imports.join(", "));
    map.insert(
        "references".to_string(),
        chunk
            .metadata
            .references
            .iter()
            .map(|r| r.target.clone())
            .collect::<Vec<_>>()
            .join(", "),
    );
    if let Some(name) = &chunk.name {
        map.insert("name".to_string(), name.clone());
    }
    if let Some(language) = &chunk.language {
        map.insert("language".to_string(), language.clone());
    }
    if let Some(parent) = &chunk.parent_chunk_id {
        map.insert("parent_chunk_id".to_string(), parent.clone());
    }
    if let Some(docstring) = &chunk.metadata.docstring {
        map.insert("docstring".to_string(), docstring.clone());
    }
    if let Some(json_path) = &chunk.metadata.json_path {
        map.insert("json_path".to_string(), json_path.clone());
    }
    if let Some(parent_path) = &chunk.metadata.parent_path {
        map.insert("parent_path".to_string(), parent_path.clone());
    }
    if let Some(header_level) = chunk.metadata.header_level {
        map.insert("header_level".to_string(), header_level.to_string());
    }
    for (k, v) in &chunk.metadata.extra {
        map.entry(k.clone()).or_insert_with(|| v.clone());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stable_for_same_inputs() {
        let a = compute_chunk_id("src/a.py", Some("Foo"), NodeType::Class, 1, 10);
        let b = compute_chunk_id("src/a.py", Some("Foo"), NodeType::Class, 1, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn id_depends_only_on_basename_not_full_path() {
        let a = compute_chunk_id("src/a.py", Some("Foo"), NodeType::Class, 1, 10);
        let b = compute_chunk_id("other/dir/a.py", Some("Foo"), NodeType::Class, 1, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn id_changes_with_line_range() {
        let a = compute_chunk_id("a.py", Some("Foo"), NodeType::Class, 1, 10);
        let b = compute_chunk_id("a.py", Some("Foo"), NodeType::Class, 1, 11);
        assert_ne!(a, b);
    }

    #[test]
    fn flatten_joins_lists_with_comma_space() {
        let mut metadata = ChunkMetadata {
            imports: vec!["os".to_string(), "sys".to_string()],
            ..Default::default()
        };
        metadata.file_name = "a.py".to_string();
        let chunk = CodeChunk::new(
            "a.py".to_string(),
            1,
            5,
            NodeType::Module,
            None,
            Some("python".to_string()),
            "import os\nimport sys\n".to_string(),
            metadata,
        );
        let flat = flatten_metadata(&chunk);
        assert_eq!(flat.get("imports").unwrap(), "os, sys");
    }

    #[test]
    fn flatten_empty_list_becomes_empty_string() {
        let chunk = CodeChunk::new(
            "a.py".to_string(),
            1,
            5,
            NodeType::Module,
            None,
            None,
            String::new(),
            ChunkMetadata::default(),
        );
        let flat = flatten_metadata(&chunk);
        assert_eq!(flat.get("imports").unwrap(), "");
    }
}
