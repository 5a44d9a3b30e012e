//! Vector Store Adapter (C7, spec §4.7): `upsert`/`query`/`get`/`delete` of
//! `(id, text, metadata, embedding)` tuples in a named collection.
//!
//! No vector-database dependency is in the retained stack (the teacher's
//! embedding path was local ONNX, not a vector DB), so collections are kept
//! as brute-force in-memory record sets, persisted to one JSON file per
//! collection under the store's root directory. `ndarray` does the distance
//! arithmetic; at the record counts a single project indexes, a linear scan
//! is the right trade rather than standing up an external index.

use crate::error::{Result, VectorStoreError};
use crate::types::{matches_where, GetResult, Metadata, QueryResult, Record, Where};
use ndarray::Array1;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Default)]
struct Collection {
    records: Vec<Record>,
    dim: Option<usize>,
}

impl Collection {
    fn index_of(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

pub struct VectorStore {
    root: PathBuf,
    collections: HashMap<String, Collection>,
}

impl VectorStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let mut collections = HashMap::new();
        if root.is_dir() {
            for entry in fs::read_dir(&root)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let records: Vec<Record> = serde_json::from_str(&fs::read_to_string(&path)?)?;
                let dim = records.first().map(|r| r.embedding.len());
                collections.insert(name.to_string(), Collection { records, dim });
            }
        }
        Ok(Self { root, collections })
    }

    pub fn open_in_memory() -> Self {
        Self {
            root: PathBuf::new(),
            collections: HashMap::new(),
        }
    }

    fn persist(&self, name: &str) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Ok(());
        }
        let collection = self
            .collections
            .get(name)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(name.to_string()))?;
        let path = self.collection_path(name);
        fs::write(path, serde_json::to_vec_pretty(&collection.records)?)?;
        Ok(())
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Idempotent; duplicates within one batch are deduplicated by id before
    /// the call per spec §4.7 — this only guards the invariant, it does not
    /// silently dedup on the caller's behalf.
    pub fn upsert(
        &mut self,
        collection: &str,
        ids: &[String],
        docs: &[String],
        metadatas: &[Metadata],
        embeddings: &[Vec<f32>],
    ) -> Result<()> {
        if ids.len() != docs.len() || ids.len() != metadatas.len() || ids.len() != embeddings.len() {
            return Err(VectorStoreError::BatchLengthMismatch {
                ids: ids.len(),
                docs: docs.len(),
                metadatas: metadatas.len(),
                embeddings: embeddings.len(),
            });
        }
        for metadata in metadatas {
            for (key, _) in metadata.iter() {
                if key.is_empty() {
                    return Err(VectorStoreError::NonScalarMetadata(key.clone()));
                }
            }
        }
        let entry = self.collections.entry(collection.to_string()).or_default();
        for (((id, doc), metadata), embedding) in ids.iter().zip(docs).zip(metadatas).zip(embeddings) {
            if let Some(dim) = entry.dim {
                if dim != embedding.len() {
                    return Err(VectorStoreError::DimensionMismatch {
                        expected: dim,
                        actual: embedding.len(),
                    });
                }
            } else if !embedding.is_empty() {
                entry.dim = Some(embedding.len());
            }
            let record = Record {
                id: id.clone(),
                doc: doc.clone(),
                metadata: metadata.clone(),
                embedding: embedding.clone(),
            };
            match entry.index_of(id) {
                Some(idx) => entry.records[idx] = record,
                None => entry.records.push(record),
            }
        }
        self.persist(collection)
    }

    pub fn query(
        &self,
        collection: &str,
        query_embedding: &[f32],
        k: usize,
        where_filter: Option<&Where>,
    ) -> Result<QueryResult> {
        let Some(entry) = self.collections.get(collection) else {
            return Ok(QueryResult::default());
        };
        let query = Array1::from_vec(query_embedding.to_vec());
        let mut scored: Vec<(f32, &Record)> = entry
            .records
            .iter()
            .filter(|r| where_filter.map(|w| matches_where(&r.metadata, w)).unwrap_or(true))
            .map(|r| (cosine_distance(&query, r), r))
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        let mut out = QueryResult::default();
        for (distance, record) in scored {
            out.ids.push(record.id.clone());
            out.docs.push(record.doc.clone());
            out.metadatas.push(record.metadata.clone());
            out.distances.push(distance);
        }
        Ok(out)
    }

    pub fn get(
        &self,
        collection: &str,
        where_filter: Option<&Where>,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<GetResult> {
        let Some(entry) = self.collections.get(collection) else {
            return Ok(GetResult::default());
        };
        let mut out = GetResult::default();
        let matching = entry
            .records
            .iter()
            .filter(|r| where_filter.map(|w| matches_where(&r.metadata, w)).unwrap_or(true))
            .skip(offset);
        let matching: Box<dyn Iterator<Item = &Record>> = match limit {
            Some(limit) => Box::new(matching.take(limit)),
            None => Box::new(matching),
        };
        for record in matching {
            out.ids.push(record.id.clone());
            out.docs.push(record.doc.clone());
            out.metadatas.push(record.metadata.clone());
        }
        Ok(out)
    }

    pub fn delete(&mut self, collection: &str, ids: &[String]) -> Result<()> {
        if let Some(entry) = self.collections.get_mut(collection) {
            entry.records.retain(|r| !ids.contains(&r.id));
        }
        self.persist(collection)
    }

    /// Remove every record whose `file_path` metadata key equals `file_path`
    /// (the vector-store side of spec §4.10 step 2, file deletion).
    pub fn delete_by_file_path(&mut self, collection: &str, file_path: &str) -> Result<()> {
        if let Some(entry) = self.collections.get_mut(collection) {
            entry
                .records
                .retain(|r| r.metadata.get("file_path").map(|p| p.as_str()) != Some(file_path));
        }
        self.persist(collection)
    }
}

fn cosine_distance(query: &Array1<f32>, record: &Record) -> f32 {
    if record.embedding.is_empty() || query.len() != record.embedding.len() {
        return 1.0;
    }
    let candidate = Array1::from_vec(record.embedding.clone());
    let dot = query.dot(&candidate);
    let norm_q = query.dot(query).sqrt();
    let norm_c = candidate.dot(&candidate).sqrt();
    if norm_q == 0.0 || norm_c == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (norm_q * norm_c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn upsert_then_query_returns_nearest_first() {
        let mut store = VectorStore::open_in_memory();
        store
            .upsert(
                "chunks",
                &["a".into(), "b".into()],
                &["doc a".into(), "doc b".into()],
                &[meta(&[]), meta(&[])],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .unwrap();
        let result = store.query("chunks", &[1.0, 0.0], 2, None).unwrap();
        assert_eq!(result.ids[0], "a");
        assert!(result.distances[0] < result.distances[1]);
    }

    #[test]
    fn upsert_is_idempotent_by_id() {
        let mut store = VectorStore::open_in_memory();
        store
            .upsert("chunks", &["a".into()], &["v1".into()], &[meta(&[])], &[vec![1.0, 0.0]])
            .unwrap();
        store
            .upsert("chunks", &["a".into()], &["v2".into()], &[meta(&[])], &[vec![1.0, 0.0]])
            .unwrap();
        let result = store.get("chunks", None, None, 0).unwrap();
        assert_eq!(result.ids, vec!["a"]);
        assert_eq!(result.docs, vec!["v2"]);
    }

    #[test]
    fn query_applies_where_filter() {
        let mut store = VectorStore::open_in_memory();
        store
            .upsert(
                "chunks",
                &["a".into(), "b".into()],
                &["doc a".into(), "doc b".into()],
                &[meta(&[("language", "python")]), meta(&[("language", "rust")])],
                &[vec![1.0, 0.0], vec![1.0, 0.0]],
            )
            .unwrap();
        let mut filter: Where = BTreeMap::new();
        filter.insert("language".to_string(), "rust".to_string());
        let result = store.query("chunks", &[1.0, 0.0], 10, Some(&filter)).unwrap();
        assert_eq!(result.ids, vec!["b"]);
    }

    #[test]
    fn delete_removes_record() {
        let mut store = VectorStore::open_in_memory();
        store
            .upsert("chunks", &["a".into()], &["doc".into()], &[meta(&[])], &[vec![1.0]])
            .unwrap();
        store.delete("chunks", &["a".to_string()]).unwrap();
        let result = store.get("chunks", None, None, 0).unwrap();
        assert!(result.ids.is_empty());
    }

    #[test]
    fn delete_by_file_path_removes_matching_only() {
        let mut store = VectorStore::open_in_memory();
        store
            .upsert(
                "chunks",
                &["a".into(), "b".into()],
                &["doc a".into(), "doc b".into()],
                &[meta(&[("file_path", "x.py")]), meta(&[("file_path", "y.py")])],
                &[vec![1.0], vec![1.0]],
            )
            .unwrap();
        store.delete_by_file_path("chunks", "x.py").unwrap();
        let result = store.get("chunks", None, None, 0).unwrap();
        assert_eq!(result.ids, vec!["b"]);
    }

    #[test]
    fn batch_length_mismatch_is_rejected() {
        let mut store = VectorStore::open_in_memory();
        let err = store
            .upsert("chunks", &["a".into()], &[], &[meta(&[])], &[vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::BatchLengthMismatch { .. }));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut store = VectorStore::open_in_memory();
        store
            .upsert("chunks", &["a".into()], &["doc".into()], &[meta(&[])], &[vec![1.0, 0.0]])
            .unwrap();
        let err = store
            .upsert("chunks", &["b".into()], &["doc".into()], &[meta(&[])], &[vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::DimensionMismatch { .. }));
    }

    #[test]
    fn persists_and_reloads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = VectorStore::open(dir.path()).unwrap();
            store
                .upsert("chunks", &["a".into()], &["doc".into()], &[meta(&[])], &[vec![1.0, 0.0]])
                .unwrap();
        }
        let store = VectorStore::open(dir.path()).unwrap();
        let result = store.get("chunks", None, None, 0).unwrap();
        assert_eq!(result.ids, vec!["a"]);
    }

    #[test]
    fn get_supports_limit_and_offset() {
        let mut store = VectorStore::open_in_memory();
        store
            .upsert(
                "chunks",
                &["a".into(), "b".into(), "c".into()],
                &["a".into(), "b".into(), "c".into()],
                &[meta(&[]), meta(&[]), meta(&[])],
                &[vec![1.0], vec![1.0], vec![1.0]],
            )
            .unwrap();
        let result = store.get("chunks", None, Some(1), 1).unwrap();
        assert_eq!(result.ids.len(), 1);
        assert_eq!(result.ids[0], "b");
    }
}
