//! Record and result shapes for the Vector Store Adapter (spec §4.7).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar metadata, already flattened by the caller
/// (`codecortex_chunker::flatten_metadata`) before it reaches the store.
pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub doc: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

/// Scalar-equality filter over metadata keys (spec §4.7: "`where` is a
/// scalar-equality filter over metadata keys").
pub type Where = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub ids: Vec<String>,
    pub docs: Vec<String>,
    pub metadatas: Vec<Metadata>,
    pub distances: Vec<f32>,
}

impl QueryResult {
    /// `score = 1 - distance` (spec §4.7).
    pub fn scores(&self) -> Vec<f32> {
        self.distances.iter().map(|d| 1.0 - d).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetResult {
    pub ids: Vec<String>,
    pub docs: Vec<String>,
    pub metadatas: Vec<Metadata>,
}

pub(crate) fn matches_where(metadata: &Metadata, where_filter: &Where) -> bool {
    where_filter
        .iter()
        .all(|(k, v)| metadata.get(k).map(|existing| existing == v).unwrap_or(false))
}
