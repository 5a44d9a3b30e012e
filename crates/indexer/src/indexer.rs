//! Per-Project Indexer (C10, spec §4.10): end-to-end processing of one
//! `FileEvent`, plus `full_index()` for initial/forced scans.

use crate::error::{IndexerError, Result};
use crate::event::{FileEvent, FileEventKind};
use crate::scanner::scan_project;
use crate::stats::IndexStats;
use crate::status::IndexerStatus;
use codecortex_chunker::{flatten_metadata, hash_bytes, CodeChunk, Chunker, HashCache, Language};
use codecortex_embeddings::EmbeddingClient;
use codecortex_graph::{node_and_edges_for_chunk, GraphStore, RelationshipExtractor};
use codecortex_ignore::{normalise_relative, IgnoreSpec};
use codecortex_vector_store::VectorStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Chunks are embedded in groups this large; a failure to embed one group
/// is logged and the remaining groups for the file still proceed (spec
/// §4.10: "a failure to embed a batch logs the error and continues with
/// remaining batches").
const EMBED_BATCH_SIZE: usize = 16;

pub struct ProjectIndexer {
    name: String,
    project_root: PathBuf,
    collection: String,
    chunker: Chunker,
    relationships: RelationshipExtractor,
    vector_store: Arc<Mutex<VectorStore>>,
    graph_store: Arc<Mutex<GraphStore>>,
    embedding_client: Arc<dyn EmbeddingClient>,
    hash_cache: Mutex<HashCache>,
    hash_cache_path: PathBuf,
    ignore_spec: IgnoreSpec,
    status: Mutex<IndexerStatus>,
}

impl ProjectIndexer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        project_root: impl Into<PathBuf>,
        collection: impl Into<String>,
        chunker: Chunker,
        vector_store: Arc<Mutex<VectorStore>>,
        graph_store: Arc<Mutex<GraphStore>>,
        embedding_client: Arc<dyn EmbeddingClient>,
        hash_cache_path: PathBuf,
        ignore_spec: IgnoreSpec,
    ) -> Self {
        let hash_cache = HashCache::load(&hash_cache_path);
        let name = name.into();
        let project_root = project_root.into();
        let status = IndexerStatus::new(name.clone(), project_root.clone());
        Self {
            name,
            project_root,
            collection: collection.into(),
            chunker,
            relationships: RelationshipExtractor::new(),
            vector_store,
            graph_store,
            embedding_client,
            hash_cache: Mutex::new(hash_cache),
            hash_cache_path,
            ignore_spec,
            status: Mutex::new(status),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// spec Data Model §3 "Indexer Status": readable on demand, also
    /// published every 5s by the coordinator's status task.
    pub async fn status(&self) -> IndexerStatus {
        self.status.lock().await.clone()
    }

    pub async fn set_pending_events(&self, pending: usize) {
        self.status.lock().await.set_pending_events(pending);
    }

    /// spec §4.10, steps 1-3. Ignore-filtering is also applied by the
    /// dispatcher before an event reaches the channel; checking again here
    /// keeps `process_event` safe to call directly (e.g. from `full_index`).
    pub async fn process_event(&self, event: &FileEvent) -> Result<()> {
        if self.ignore_spec.should_ignore(&event.path, event.is_directory) {
            return Ok(());
        }
        let relative = normalise_relative(&self.project_root, &event.path);

        if event.kind == FileEventKind::Deleted {
            self.vector_store.lock().await.delete_by_file_path(&self.collection, &relative)?;
            self.graph_store.lock().await.replace_file(&relative, &[], &[])?;
            self.hash_cache.lock().await.remove(&relative);
            self.persist_hash_cache().await?;
            return Ok(());
        }

        let content = match tokio::fs::read_to_string(&event.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        let digest = hash_bytes(content.as_bytes());
        let unchanged = self.hash_cache.lock().await.get(&relative).map(|d| d == digest).unwrap_or(false);
        if unchanged {
            return Ok(());
        }

        self.reindex_file(&event.path, &relative, &content).await?;
        self.hash_cache.lock().await.has_changed(&relative, &digest);
        self.persist_hash_cache().await?;
        Ok(())
    }

    /// chunk -> enrich with relationships -> batch-embed -> upsert chunks ->
    /// upsert nodes & edges (spec §4.10 step 3).
    async fn reindex_file(&self, path: &Path, relative: &str, content: &str) -> Result<()> {
        let mut chunks = self.chunker.chunk_file(Path::new(relative), content)?;
        if chunks.is_empty() {
            self.graph_store.lock().await.replace_file(relative, &[], &[])?;
            return Ok(());
        }

        if let Some(language) = Language::from_path(path) {
            let relationships = self.relationships.extract(language, content);
            for chunk in &mut chunks {
                chunk.metadata.references = relationships.clone();
            }
        }

        let mut embedded: Vec<(CodeChunk, Vec<f32>)> = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            match self.embedding_client.embed_batch(&texts).await {
                Ok(vectors) => {
                    for (chunk, vector) in batch.iter().zip(vectors) {
                        match vector {
                            Some(vector) => embedded.push((chunk.clone(), vector)),
                            None => log::warn!("no embedding returned for chunk {}", chunk.id),
                        }
                    }
                }
                Err(err) => {
                    log::error!("embedding batch failed for {relative}: {err}");
                }
            }
        }

        if !embedded.is_empty() {
            let ids: Vec<String> = embedded.iter().map(|(c, _)| c.id.clone()).collect();
            let docs: Vec<String> = embedded.iter().map(|(c, _)| c.text.clone()).collect();
            let metadatas = embedded.iter().map(|(c, _)| flatten_metadata(c)).collect::<Vec<_>>();
            let vectors: Vec<Vec<f32>> = embedded.into_iter().map(|(_, v)| v).collect();
            self.vector_store
                .lock()
                .await
                .upsert(&self.collection, &ids, &docs, &metadatas, &vectors)?;
        }

        let mut nodes = Vec::with_capacity(chunks.len());
        let mut edges = Vec::new();
        for chunk in &chunks {
            let (node, chunk_edges) = node_and_edges_for_chunk(chunk);
            nodes.push(node);
            edges.extend(chunk_edges);
        }
        self.graph_store.lock().await.replace_file(relative, &nodes, &edges)?;

        Ok(())
    }

    async fn persist_hash_cache(&self) -> Result<()> {
        let cache = self.hash_cache.lock().await;
        let path = self.hash_cache_path.clone();
        let cache = cache.clone();
        tokio::task::spawn_blocking(move || cache.save(&path))
            .await
            .map_err(|err| IndexerError::Other(format!("hash cache save task panicked: {err}")))??;
        Ok(())
    }

    /// Walks the tree via C11's scan routine, processes every file
    /// sequentially as a synthetic `modified` event, and persists the hash
    /// cache once at the end (spec §4.10: "safe to re-enter after failure:
    /// unchanged files are skipped by hash").
    pub async fn full_index(&self) -> Result<IndexStats> {
        let start = Instant::now();
        log::info!("starting full index of {:?} at {}", self.name, self.project_root.display());
        self.status.lock().await.begin_pass();
        let mut stats = IndexStats::new();
        let files = scan_project(&self.project_root, &self.ignore_spec);

        for path in files {
            let event = FileEvent {
                kind: FileEventKind::Modified,
                is_directory: false,
                project_root: self.project_root.clone(),
                timestamp: std::time::SystemTime::now(),
                path: path.clone(),
            };
            let relative = normalise_relative(&self.project_root, &path);
            let before = self.hash_cache.lock().await.get(&relative).map(str::to_string);
            match self.process_event(&event).await {
                Ok(()) => {
                    let after = self.hash_cache.lock().await.get(&relative).map(str::to_string);
                    if before == after {
                        stats.files_skipped_unchanged += 1;
                    } else {
                        stats.files_processed += 1;
                    }
                }
                Err(err) => {
                    log::warn!("failed to index {}: {err}", path.display());
                    stats.add_error(format!("{}: {err}", path.display()));
                }
            }
        }

        stats.time_ms = start.elapsed().as_millis() as u64;
        let size_bytes = total_size_bytes(&self.project_root, &self.ignore_spec);
        let error = stats.errors.last().cloned();
        self.status.lock().await.finish_pass(stats.files_processed, size_bytes, start.elapsed(), error);
        Ok(stats)
    }
}

fn total_size_bytes(root: &Path, ignore_spec: &IgnoreSpec) -> u64 {
    scan_project(root, ignore_spec)
        .iter()
        .filter_map(|path| std::fs::metadata(path).ok())
        .map(|metadata| metadata.len())
        .sum()
}
