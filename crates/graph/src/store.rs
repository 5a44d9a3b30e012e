//! Graph Store Adapter (C8): relational schema over SQLite, matching spec
//! §4.8 exactly (two tables, indices on `edges(source_id)`,
//! `edges(target_id)`, `edges(relation_type)`).

use crate::error::Result;
use crate::types::{GraphEdge, GraphNode};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub struct GraphStore {
    conn: Connection,
}

impl GraphStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                name TEXT,
                file_path TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                metadata TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS edges (
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                relation_type TEXT NOT NULL,
                metadata TEXT NOT NULL,
                PRIMARY KEY (source_id, target_id, relation_type)
            );
            CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);
            CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);
            CREATE INDEX IF NOT EXISTS idx_edges_relation ON edges(relation_type);
            CREATE INDEX IF NOT EXISTS idx_nodes_file_path ON nodes(file_path);
            ",
        )?;
        Ok(())
    }

    pub fn upsert_node(&self, node: &GraphNode) -> Result<()> {
        self.conn.execute(
            "INSERT INTO nodes (id, type, name, file_path, start_line, end_line, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                type = excluded.type,
                name = excluded.name,
                file_path = excluded.file_path,
                start_line = excluded.start_line,
                end_line = excluded.end_line,
                metadata = excluded.metadata",
            params![
                node.id,
                node.node_type,
                node.name,
                node.file_path,
                node.start_line as i64,
                node.end_line as i64,
                node.metadata.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn insert_edge(&self, edge: &GraphEdge) -> Result<()> {
        self.conn.execute(
            "INSERT INTO edges (source_id, target_id, relation_type, metadata)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(source_id, target_id, relation_type) DO UPDATE SET
                metadata = excluded.metadata",
            params![edge.source_id, edge.target_id, edge.relation_type, edge.metadata.to_string()],
        )?;
        Ok(())
    }

    /// Cascades to incident edges (spec §4.8 `delete_node`).
    pub fn delete_node(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM edges WHERE source_id = ?1 OR target_id = ?1", params![id])?;
        self.conn.execute("DELETE FROM nodes WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn node_by_id(&self, id: &str) -> Result<Option<GraphNode>> {
        self.conn
            .query_row("SELECT id, type, name, file_path, start_line, end_line, metadata FROM nodes WHERE id = ?1", params![id], row_to_node)
            .optional()
            .map_err(Into::into)
    }

    pub fn nodes_by_file_path(&self, file_path: &str) -> Result<Vec<GraphNode>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, type, name, file_path, start_line, end_line, metadata FROM nodes WHERE file_path = ?1")?;
        let rows = stmt.query_map(params![file_path], row_to_node)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn edges_for(&self, node_id: &str, relation_type: Option<&str>) -> Result<Vec<GraphEdge>> {
        let mut stmt = match relation_type {
            Some(_) => self.conn.prepare(
                "SELECT source_id, target_id, relation_type, metadata FROM edges WHERE source_id = ?1 AND relation_type = ?2",
            )?,
            None => self
                .conn
                .prepare("SELECT source_id, target_id, relation_type, metadata FROM edges WHERE source_id = ?1")?,
        };
        let rows = if let Some(rel) = relation_type {
            stmt.query_map(params![node_id, rel], row_to_edge)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            stmt.query_map(params![node_id], row_to_edge)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
    }

    pub fn incoming_edges_for(&self, node_id: &str) -> Result<Vec<GraphEdge>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source_id, target_id, relation_type, metadata FROM edges WHERE target_id = ?1")?;
        let rows = stmt.query_map(params![node_id], row_to_edge)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Re-index of file F: delete all nodes/incident edges for F, then
    /// insert the freshly extracted set, as one transaction (spec §4.8
    /// "writes are transactional per file").
    pub fn replace_file(&mut self, file_path: &str, nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let existing: Vec<String> = {
                let mut stmt = tx.prepare("SELECT id FROM nodes WHERE file_path = ?1")?;
                let ids = stmt
                    .query_map(params![file_path], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                ids
            };
            for id in existing {
                tx.execute("DELETE FROM edges WHERE source_id = ?1 OR target_id = ?1", params![id])?;
                tx.execute("DELETE FROM nodes WHERE id = ?1", params![id])?;
            }
            for node in nodes {
                tx.execute(
                    "INSERT INTO nodes (id, type, name, file_path, start_line, end_line, metadata)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(id) DO UPDATE SET
                        type = excluded.type, name = excluded.name, file_path = excluded.file_path,
                        start_line = excluded.start_line, end_line = excluded.end_line, metadata = excluded.metadata",
                    params![
                        node.id,
                        node.node_type,
                        node.name,
                        node.file_path,
                        node.start_line as i64,
                        node.end_line as i64,
                        node.metadata.to_string(),
                    ],
                )?;
            }
            for edge in edges {
                tx.execute(
                    "INSERT INTO edges (source_id, target_id, relation_type, metadata)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(source_id, target_id, relation_type) DO UPDATE SET metadata = excluded.metadata",
                    params![edge.source_id, edge.target_id, edge.relation_type, edge.metadata.to_string()],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Lazily materialise the target of an edge: a real node when present,
    /// otherwise a synthetic `external` node (spec Data Model §3).
    pub fn resolve_node(&self, id: &str) -> Result<GraphNode> {
        Ok(self.node_by_id(id)?.unwrap_or_else(|| GraphNode::external(id)))
    }

    /// Graph enrichment for one file (spec §4.12 step 5): its nodes, each
    /// with its outgoing edges and resolved target node.
    pub fn enrich_file(&self, file_path: &str) -> Result<Vec<(GraphNode, Vec<(GraphEdge, GraphNode)>)>> {
        let nodes = self.nodes_by_file_path(file_path)?;
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            let edges = self.edges_for(&node.id, None)?;
            let mut resolved = Vec::with_capacity(edges.len());
            for edge in edges {
                let target = self.resolve_node(&edge.target_id)?;
                resolved.push((edge, target));
            }
            out.push((node, resolved));
        }
        Ok(out)
    }

    /// All nodes and edges for the `/api/graph/` dump (spec §6): unresolved
    /// targets materialised as `external` nodes.
    pub fn full_graph(&self) -> Result<(Vec<GraphNode>, Vec<GraphEdge>)> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, type, name, file_path, start_line, end_line, metadata FROM nodes")?;
        let mut nodes = stmt
            .query_map([], row_to_node)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut edge_stmt = self
            .conn
            .prepare("SELECT source_id, target_id, relation_type, metadata FROM edges")?;
        let edges = edge_stmt
            .query_map([], row_to_edge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let known: std::collections::HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut externals: Vec<GraphNode> = edges
            .iter()
            .filter(|e| !known.contains(e.target_id.as_str()))
            .map(|e| GraphNode::external(&e.target_id))
            .collect();
        externals.sort_by(|a, b| a.id.cmp(&b.id));
        externals.dedup_by(|a, b| a.id == b.id);
        nodes.extend(externals);
        Ok((nodes, edges))
    }
}

fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<GraphNode> {
    let metadata_text: String = row.get(6)?;
    Ok(GraphNode {
        id: row.get(0)?,
        node_type: row.get(1)?,
        name: row.get(2)?,
        file_path: row.get(3)?,
        start_line: row.get::<_, i64>(4)? as usize,
        end_line: row.get::<_, i64>(5)? as usize,
        metadata: serde_json::from_str(&metadata_text).unwrap_or_default(),
    })
}

fn row_to_edge(row: &rusqlite::Row) -> rusqlite::Result<GraphEdge> {
    let metadata_text: String = row.get(3)?;
    Ok(GraphEdge {
        source_id: row.get(0)?,
        target_id: row.get(1)?,
        relation_type: row.get(2)?,
        metadata: serde_json::from_str(&metadata_text).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str, file_path: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            node_type: "function".to_string(),
            name: Some(id.to_string()),
            file_path: file_path.to_string(),
            start_line: 1,
            end_line: 2,
            metadata: json!({}),
        }
    }

    fn edge(source: &str, target: &str, rel: &str) -> GraphEdge {
        GraphEdge {
            source_id: source.to_string(),
            target_id: target.to_string(),
            relation_type: rel.to_string(),
            metadata: json!({}),
        }
    }

    #[test]
    fn upsert_and_fetch_node() {
        let store = GraphStore::open_in_memory().unwrap();
        store.upsert_node(&node("a", "f.py")).unwrap();
        let fetched = store.node_by_id("a").unwrap().unwrap();
        assert_eq!(fetched.file_path, "f.py");
    }

    #[test]
    fn delete_node_cascades_to_edges() {
        let store = GraphStore::open_in_memory().unwrap();
        store.upsert_node(&node("a", "f.py")).unwrap();
        store.upsert_node(&node("b", "f.py")).unwrap();
        store.insert_edge(&edge("a", "b", "import")).unwrap();
        store.delete_node("a").unwrap();
        assert!(store.edges_for("a", None).unwrap().is_empty());
    }

    #[test]
    fn resolve_node_materialises_external_for_unresolved_target() {
        let store = GraphStore::open_in_memory().unwrap();
        let resolved = store.resolve_node("some::unresolved::Target").unwrap();
        assert!(resolved.is_external());
    }

    #[test]
    fn replace_file_is_transactional_delete_then_insert() {
        let mut store = GraphStore::open_in_memory().unwrap();
        store.upsert_node(&node("old", "f.py")).unwrap();
        store
            .replace_file("f.py", &[node("new", "f.py")], &[])
            .unwrap();
        assert!(store.node_by_id("old").unwrap().is_none());
        assert!(store.node_by_id("new").unwrap().is_some());
    }

    #[test]
    fn enrich_file_attaches_outgoing_edges_and_resolved_targets() {
        let store = GraphStore::open_in_memory().unwrap();
        store.upsert_node(&node("a", "f.py")).unwrap();
        store.insert_edge(&edge("a", "os", "import")).unwrap();
        let enriched = store.enrich_file("f.py").unwrap();
        assert_eq!(enriched.len(), 1);
        let (_node, edges) = &enriched[0];
        assert_eq!(edges.len(), 1);
        assert!(edges[0].1.is_external());
    }

    #[test]
    fn full_graph_materialises_external_nodes_for_unresolved_targets() {
        let store = GraphStore::open_in_memory().unwrap();
        store.upsert_node(&node("a", "f.py")).unwrap();
        store.insert_edge(&edge("a", "unresolved::Target", "inherits")).unwrap();
        let (nodes, edges) = store.full_graph().unwrap();
        assert_eq!(edges.len(), 1);
        assert!(nodes.iter().any(|n| n.id == "unresolved::Target" && n.is_external()));
    }

    #[test]
    fn edges_for_filters_by_relation_type() {
        let store = GraphStore::open_in_memory().unwrap();
        store.upsert_node(&node("a", "f.py")).unwrap();
        store.insert_edge(&edge("a", "os", "import")).unwrap();
        store.insert_edge(&edge("a", "Base", "inherits")).unwrap();
        assert_eq!(store.edges_for("a", Some("import")).unwrap().len(), 1);
        assert_eq!(store.edges_for("a", None).unwrap().len(), 2);
    }
}
