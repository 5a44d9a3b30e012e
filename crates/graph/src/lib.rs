//! Relationship Extractor (C6) and Graph Store Adapter (C8).
//!
//! Nodes and edges are kept in a relational SQLite schema (spec §4.8)
//! rather than an in-process graph structure, so the query layer can read
//! neighbours without holding the writer's state in memory. Edge targets
//! are never resolved at extraction or write time; an unresolved target
//! becomes an `external` node the first time something reads it.

mod builder;
mod error;
mod store;
mod types;

pub use builder::{node_and_edges_for_chunk, RelationshipExtractor};
pub use error::{GraphError, Result};
pub use store::GraphStore;
pub use types::{GraphEdge, GraphNode, RelationKind, EXTERNAL_NODE_TYPE};
