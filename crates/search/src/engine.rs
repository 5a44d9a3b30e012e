//! Query Engine (C12, spec §4.12): preprocess, expand (logging only),
//! embed, vector search, graph-enrich, cache, assemble context.

use crate::cache::QueryCache;
use crate::context::{assemble_context, SearchResult};
use crate::error::{Result, SearchError};
use crate::related_files;
use crate::synonyms;
use codecortex_embeddings::{preprocess, EmbeddingClient};
use codecortex_graph::GraphStore;
use codecortex_vector_store::{VectorStore, Where};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub n_results: usize,
    pub min_score: f32,
    /// Scalar-equality `where` filter, plus the special `file_name` key
    /// (matched by full-path or basename equality as a post-filter, per
    /// spec §4.12 step 4).
    pub filters: Where,
    pub include_metadata: bool,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            n_results: 10,
            min_score: 0.0,
            filters: Where::new(),
            include_metadata: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub context: String,
    pub results: Vec<SearchResult>,
}

pub struct QueryEngine {
    collection: String,
    vector_store: Arc<Mutex<VectorStore>>,
    graph_store: Arc<Mutex<GraphStore>>,
    embedding_client: Arc<dyn EmbeddingClient>,
    max_context_size: usize,
    cache: Mutex<QueryCache<QueryResponse>>,
}

impl QueryEngine {
    pub fn new(
        collection: impl Into<String>,
        vector_store: Arc<Mutex<VectorStore>>,
        graph_store: Arc<Mutex<GraphStore>>,
        embedding_client: Arc<dyn EmbeddingClient>,
        max_context_size: usize,
        cache_size: usize,
    ) -> Self {
        Self {
            collection: collection.into(),
            vector_store,
            graph_store,
            embedding_client,
            max_context_size,
            cache: Mutex::new(QueryCache::new(cache_size)),
        }
    }

    /// spec §4.12: "Cache is invalidated on demand (`clear_cache`)".
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear_cache();
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        if request.query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if request.n_results == 0 {
            return Err(SearchError::InvalidNResults);
        }

        if let Some(cached) = self
            .cache
            .lock()
            .await
            .get(&request.query, request.n_results, request.min_score, &request.filters)
        {
            return Ok(cached);
        }

        // step 1: preprocess (pure function, applying it twice equals once).
        let preprocessed = preprocess(&request.query);

        // step 2: expand for logging/debug only; the embedding below is of
        // the preprocessed original, never an expanded form (spec §9).
        let expansions = synonyms::expand(&preprocessed);
        log::debug!("query '{}' expanded to {} textual forms", request.query, expansions.len());

        // step 3: embed the preprocessed original query.
        let embedding = match self.embedding_client.embed(&preprocessed).await {
            Ok(Some(embedding)) => embedding,
            Ok(None) => {
                log::warn!("embedding provider returned no vector for query '{}'", request.query);
                return Ok(QueryResponse {
                    context: assemble_context(&request.query, &[], self.max_context_size, request.include_metadata),
                    results: Vec::new(),
                });
            }
            Err(err) => {
                log::error!("query embedding failed: {err}");
                return Ok(QueryResponse {
                    context: assemble_context(&request.query, &[], self.max_context_size, request.include_metadata),
                    results: Vec::new(),
                });
            }
        };

        let (where_filter, file_name_filter) = split_file_name_filter(&request.filters);

        // step 4: vector search, then post-filter by file_name/min_score.
        let vector_results = {
            let store = self.vector_store.lock().await;
            store.query(&self.collection, &embedding, request.n_results, Some(&where_filter))?
        };

        let mut results = Vec::new();
        for (((id, doc), metadata), score) in vector_results
            .ids
            .iter()
            .zip(vector_results.docs.iter())
            .zip(vector_results.metadatas.iter())
            .zip(vector_results.scores())
        {
            if score < request.min_score {
                continue;
            }
            let file_path = metadata.get("file_path").cloned().unwrap_or_default();
            if let Some(file_name) = &file_name_filter {
                let basename = metadata.get("file_name").map(String::as_str).unwrap_or("");
                if &file_path != file_name && basename != file_name {
                    continue;
                }
            }
            results.push(SearchResult {
                id: id.clone(),
                file_path,
                text: doc.clone(),
                metadata: metadata.clone(),
                score,
                graph_relationships: Vec::new(),
                related_files: Vec::new(),
            });
        }

        // step 5: graph enrichment per unique file, plus the related-files heuristic.
        self.enrich(&mut results).await?;

        // step 6: context assembly.
        let context = assemble_context(&request.query, &results, self.max_context_size, request.include_metadata);
        let response = QueryResponse { context, results };

        self.cache
            .lock()
            .await
            .put(&request.query, request.n_results, request.min_score, &request.filters, response.clone());

        Ok(response)
    }

    async fn enrich(&self, results: &mut [SearchResult]) -> Result<()> {
        let graph = self.graph_store.lock().await;
        let store = self.vector_store.lock().await;

        for result in results.iter_mut() {
            if result.file_path.is_empty() {
                continue;
            }
            result.graph_relationships = graph.enrich_file(&result.file_path)?;

            let mut references: Vec<String> = Vec::new();
            if let Some(imports) = result.metadata.get("imports") {
                references.extend(imports.split(", ").filter(|s| !s.is_empty()).map(str::to_string));
            }
            if let Some(refs) = result.metadata.get("references") {
                references.extend(refs.split(", ").filter(|s| !s.is_empty()).map(str::to_string));
            }
            result.related_files = related_files::find_related_files(&store, &self.collection, &references, &result.file_path)?;
        }
        Ok(())
    }
}

fn split_file_name_filter(filters: &Where) -> (Where, Option<String>) {
    let mut remaining = filters.clone();
    let file_name = remaining.remove("file_name");
    (remaining, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codecortex_chunker::flatten_metadata;
    use codecortex_chunker::{ChunkMetadata, CodeChunk, NodeType};
    use codecortex_embeddings::FakeEmbeddingClient;
    use codecortex_graph::GraphStore;

    async fn seed(collection: &str, vector_store: &Arc<Mutex<VectorStore>>, graph_store: &Arc<Mutex<GraphStore>>) {
        let chunk = CodeChunk::new(
            "util.py".to_string(),
            1,
            3,
            NodeType::Function,
            Some("helper".to_string()),
            Some("python".to_string()),
            "def helper():\n    return 1\n".to_string(),
            ChunkMetadata {
                file_name: "util.py".to_string(),
                ..ChunkMetadata::default()
            },
        );
        let metadata = flatten_metadata(&chunk);
        vector_store
            .lock()
            .await
            .upsert(collection, &[chunk.id.clone()], &[chunk.text.clone()], &[metadata], &[vec![1.0, 0.0, 0.0]])
            .unwrap();
        graph_store.lock().await.replace_file("util.py", &[], &[]).unwrap();
    }

    fn engine(collection: &str, vector_store: Arc<Mutex<VectorStore>>, graph_store: Arc<Mutex<GraphStore>>) -> QueryEngine {
        QueryEngine::new(collection, vector_store, graph_store, Arc::new(FakeEmbeddingClient::new(3)), 10_000, 10)
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let vector_store = Arc::new(Mutex::new(VectorStore::open_in_memory()));
        let graph_store = Arc::new(Mutex::new(GraphStore::open_in_memory().unwrap()));
        let engine = engine("chunks", vector_store, graph_store);
        let request = QueryRequest {
            query: "   ".to_string(),
            ..QueryRequest::default()
        };
        assert!(matches!(engine.query(&request).await, Err(SearchError::EmptyQuery)));
    }

    #[tokio::test]
    async fn returns_matching_result_with_context() {
        let vector_store = Arc::new(Mutex::new(VectorStore::open_in_memory()));
        let graph_store = Arc::new(Mutex::new(GraphStore::open_in_memory().unwrap()));
        seed("chunks", &vector_store, &graph_store).await;
        let engine = engine("chunks", vector_store, graph_store);

        let request = QueryRequest {
            query: "helper".to_string(),
            ..QueryRequest::default()
        };
        let response = engine.query(&request).await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert!(response.context.contains("util.py"));
    }

    #[tokio::test]
    async fn second_identical_query_is_served_from_cache() {
        let vector_store = Arc::new(Mutex::new(VectorStore::open_in_memory()));
        let graph_store = Arc::new(Mutex::new(GraphStore::open_in_memory().unwrap()));
        seed("chunks", &vector_store, &graph_store).await;
        let embedding_client = Arc::new(FakeEmbeddingClient::new(3));
        let engine = QueryEngine::new("chunks", vector_store, graph_store, embedding_client.clone(), 10_000, 10);

        let request = QueryRequest {
            query: "helper".to_string(),
            ..QueryRequest::default()
        };
        let first = engine.query(&request).await.unwrap();
        let calls_after_first = embedding_client.calls.load(std::sync::atomic::Ordering::SeqCst);
        let second = engine.query(&request).await.unwrap();

        assert_eq!(embedding_client.calls.load(std::sync::atomic::Ordering::SeqCst), calls_after_first);
        assert_eq!(first.context, second.context);
    }

    #[tokio::test]
    async fn file_name_filter_matches_basename() {
        let vector_store = Arc::new(Mutex::new(VectorStore::open_in_memory()));
        let graph_store = Arc::new(Mutex::new(GraphStore::open_in_memory().unwrap()));
        seed("chunks", &vector_store, &graph_store).await;
        let engine = engine("chunks", vector_store, graph_store);

        let mut filters = Where::new();
        filters.insert("file_name".to_string(), "other.py".to_string());
        let request = QueryRequest {
            query: "helper".to_string(),
            filters,
            ..QueryRequest::default()
        };
        let response = engine.query(&request).await.unwrap();
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn min_score_discards_low_scoring_results() {
        let vector_store = Arc::new(Mutex::new(VectorStore::open_in_memory()));
        let graph_store = Arc::new(Mutex::new(GraphStore::open_in_memory().unwrap()));
        seed("chunks", &vector_store, &graph_store).await;
        let engine = engine("chunks", vector_store, graph_store);

        let request = QueryRequest {
            query: "helper".to_string(),
            min_score: 1.1,
            ..QueryRequest::default()
        };
        let response = engine.query(&request).await.unwrap();
        assert!(response.results.is_empty());
    }
}
