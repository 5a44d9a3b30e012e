//! Graph Node/Edge data model (spec Data Model §3): `Graph Node (id, type,
//! name, file_path, start_line, end_line, metadata_json)` and
//! `Graph Edge (source_id, target_id, relation_type, metadata_json)`.

use serde_json::Value;

pub const EXTERNAL_NODE_TYPE: &str = "external";

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub node_type: String,
    pub name: Option<String>,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub metadata: Value,
}

impl GraphNode {
    pub fn from_chunk(chunk: &codecortex_chunker::CodeChunk) -> Self {
        Self {
            id: chunk.id.clone(),
            node_type: chunk.node_type.as_str().to_string(),
            name: chunk.name.clone(),
            file_path: chunk.file_path.clone(),
            start_line: chunk.start_line,
            end_line: chunk.end_line,
            metadata: Value::Object(Default::default()),
        }
    }

    /// An unresolved edge target materialised lazily on read (spec Data
    /// Model §3: "edge targets that are unresolved references become
    /// 'external' nodes created lazily on read by the query layer").
    pub fn external(target_id: &str) -> Self {
        Self {
            id: target_id.to_string(),
            node_type: EXTERNAL_NODE_TYPE.to_string(),
            name: Some(target_id.to_string()),
            file_path: String::new(),
            start_line: 0,
            end_line: 0,
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn is_external(&self) -> bool {
        self.node_type == EXTERNAL_NODE_TYPE
    }
}

/// `relation_type ∈ {import, include, inherits, references, source, …}`
/// (spec Data Model §3); kept open-ended via `Other` since the extractor's
/// language set and edge vocabulary is meant to grow without a schema
/// change (spec §4.6 "…").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Import,
    Include,
    Inherits,
    References,
    Source,
    Other(String),
}

impl RelationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Import => "import",
            Self::Include => "include",
            Self::Inherits => "inherits",
            Self::References => "references",
            Self::Source => "source",
            Self::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "import" => Self::Import,
            "include" => Self::Include,
            "inherits" => Self::Inherits,
            "references" => Self::References,
            "source" => Self::Source,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub source_id: String,
    pub target_id: String,
    pub relation_type: String,
    pub metadata: Value,
}
