//! HTTP API handlers (spec §6): the REST surface the coordinator sits
//! behind. Each handler borrows the shared [`AppState`] and maps domain
//! results onto JSON responses or an [`ApiError`].

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use codecortex_search::QueryRequest;
use codecortex_vector_store::Where;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Project lifecycle
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ProjectSummary {
    name: String,
    state: &'static str,
    file_count: usize,
    chunk_count: usize,
}

pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    let statuses = state.coordinator.status_snapshot().await;
    Ok(Json(
        statuses
            .into_iter()
            .map(|status| ProjectSummary {
                name: status.name,
                state: match status.state {
                    codecortex_registry::ProjectState::Active => "active",
                    codecortex_registry::ProjectState::Paused => "paused",
                },
                file_count: status.file_count,
                chunk_count: status.chunk_count,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct RegisterProjectRequest {
    path: std::path::PathBuf,
    name: Option<String>,
}

pub async fn register_project(
    State(state): State<AppState>,
    Json(request): Json<RegisterProjectRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let name = request.name.unwrap_or_else(|| {
        request
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("project")
            .to_string()
    });
    state.coordinator.register_project(&name, &request.path, true).await?;
    Ok(Json(serde_json::json!({ "name": name })))
}

pub async fn remove_project(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    state.coordinator.remove_project(&name).await?;
    Ok(Json(serde_json::json!({ "removed": name })))
}

pub async fn reindex_project(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.coordinator.reindex_project(&name).await?;
    Ok(Json(serde_json::json!({
        "files_processed": stats.files_processed,
        "files_skipped_unchanged": stats.files_skipped_unchanged,
        "time_ms": stats.time_ms,
    })))
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct QueryApiRequest {
    project: String,
    query: String,
    #[serde(default = "default_n_results")]
    n_results: usize,
    #[serde(default)]
    min_score: f32,
    #[serde(default)]
    filters: Where,
    #[serde(default)]
    include_metadata: bool,
}

fn default_n_results() -> usize {
    10
}

#[derive(Serialize)]
pub struct QueryApiResponse {
    context: String,
    results: Vec<SearchResultJson>,
}

#[derive(Serialize)]
pub struct SearchResultJson {
    id: String,
    file_path: String,
    text: String,
    metadata: BTreeMap<String, String>,
    score: f32,
}

pub async fn query(State(state): State<AppState>, Json(request): Json<QueryApiRequest>) -> Result<Json<QueryApiResponse>, ApiError> {
    let engine = state.coordinator.query_engine(&request.project).await?;
    let response = engine
        .query(&QueryRequest {
            query: request.query,
            n_results: request.n_results,
            min_score: request.min_score,
            filters: request.filters,
            include_metadata: request.include_metadata,
        })
        .await?;
    Ok(Json(QueryApiResponse {
        context: response.context,
        results: response
            .results
            .into_iter()
            .map(|r| SearchResultJson {
                id: r.id,
                file_path: r.file_path,
                text: r.text,
                metadata: r.metadata,
                score: r.score,
            })
            .collect(),
    }))
}

#[derive(Deserialize)]
pub struct ClearCacheQuery {
    project: String,
}

pub async fn clear_query_cache(State(state): State<AppState>, Query(q): Query<ClearCacheQuery>) -> Result<Json<serde_json::Value>, ApiError> {
    let engine = state.coordinator.query_engine(&q.project).await?;
    engine.clear_cache().await;
    Ok(Json(serde_json::json!({ "cleared": true })))
}

#[derive(Deserialize)]
pub struct ChunkSearchRequest {
    project: String,
    query: String,
    #[serde(default = "default_n_results")]
    n_results: usize,
    file_name: Option<String>,
}

pub async fn search_chunks(State(state): State<AppState>, Json(request): Json<ChunkSearchRequest>) -> Result<Json<Vec<SearchResultJson>>, ApiError> {
    let engine = state.coordinator.query_engine(&request.project).await?;
    let mut filters = Where::new();
    if let Some(file_name) = request.file_name {
        filters.insert("file_name".to_string(), file_name);
    }
    let response = engine
        .query(&QueryRequest {
            query: request.query,
            n_results: request.n_results,
            filters,
            ..QueryRequest::default()
        })
        .await?;
    Ok(Json(
        response
            .results
            .into_iter()
            .map(|r| SearchResultJson {
                id: r.id,
                file_path: r.file_path,
                text: r.text,
                metadata: r.metadata,
                score: r.score,
            })
            .collect(),
    ))
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct GraphNodeJson {
    id: String,
    #[serde(rename = "type")]
    node_type: String,
    name: Option<String>,
    file_path: String,
    group: String,
}

#[derive(Serialize)]
pub struct GraphLinkJson {
    source: String,
    target: String,
    relation_type: String,
}

#[derive(Serialize)]
pub struct GraphDump {
    nodes: Vec<GraphNodeJson>,
    links: Vec<GraphLinkJson>,
}

#[derive(Deserialize)]
pub struct ProjectQuery {
    project: String,
}

pub async fn graph_dump(State(state): State<AppState>, Query(q): Query<ProjectQuery>) -> Result<Json<GraphDump>, ApiError> {
    let graph_store = state.coordinator.graph_store(&q.project).await?;
    let (nodes, edges) = graph_store.lock().await.full_graph()?;
    Ok(Json(GraphDump {
        nodes: nodes
            .into_iter()
            .map(|n| GraphNodeJson {
                group: if n.is_external() { "external".to_string() } else { n.node_type.clone() },
                id: n.id,
                node_type: n.node_type,
                name: n.name,
                file_path: n.file_path,
            })
            .collect(),
        links: edges
            .into_iter()
            .map(|e| GraphLinkJson {
                source: e.source_id,
                target: e.target_id,
                relation_type: e.relation_type,
            })
            .collect(),
    }))
}

#[derive(Deserialize)]
pub struct GraphNeighborsRequest {
    project: String,
    node_id: Option<String>,
    file_name: Option<String>,
}

#[derive(Serialize)]
pub struct NeighborJson {
    edge: GraphLinkJson,
    node: GraphNodeJson,
}

pub async fn graph_neighbors(State(state): State<AppState>, Json(request): Json<GraphNeighborsRequest>) -> Result<Json<Vec<NeighborJson>>, ApiError> {
    let graph_store = state.coordinator.graph_store(&request.project).await?;
    let store = graph_store.lock().await;

    let node_ids: Vec<String> = if let Some(node_id) = request.node_id {
        vec![node_id]
    } else if let Some(file_name) = request.file_name {
        store.nodes_by_file_path(&file_name)?.into_iter().map(|n| n.id).collect()
    } else {
        return Err(ApiError::bad_request("one of node_id or file_name is required"));
    };

    let mut neighbors = Vec::new();
    for node_id in node_ids {
        for edge in store.edges_for(&node_id, None)? {
            let target = store.resolve_node(&edge.target_id)?;
            neighbors.push(NeighborJson {
                node: GraphNodeJson {
                    group: if target.is_external() { "external".to_string() } else { target.node_type.clone() },
                    id: target.id,
                    node_type: target.node_type,
                    name: target.name,
                    file_path: target.file_path,
                },
                edge: GraphLinkJson {
                    source: edge.source_id,
                    target: edge.target_id,
                    relation_type: edge.relation_type,
                },
            });
        }
    }
    Ok(Json(neighbors))
}

// ---------------------------------------------------------------------------
// Files and stats
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct FilesQuery {
    project: String,
    max_files: Option<usize>,
}

pub async fn list_files(State(state): State<AppState>, Query(q): Query<FilesQuery>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.coordinator.project_files(&q.project, q.max_files).await?))
}

#[derive(Serialize)]
pub struct StatsResponse {
    name: String,
    state: &'static str,
    file_count: usize,
    chunk_count: usize,
}

pub async fn stats(State(state): State<AppState>, Query(q): Query<ProjectQuery>) -> Result<Json<StatsResponse>, ApiError> {
    let status = state.coordinator.project_status(&q.project).await?;
    Ok(Json(StatsResponse {
        name: status.name,
        state: match status.state {
            codecortex_registry::ProjectState::Active => "active",
            codecortex_registry::ProjectState::Paused => "paused",
        },
        file_count: status.file_count,
        chunk_count: status.chunk_count,
    }))
}

// ---------------------------------------------------------------------------
// Indexer status
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct IndexerStatusResponse {
    name: String,
    path: std::path::PathBuf,
    state: &'static str,
    last_indexed: Option<String>,
    size_bytes: u64,
    error: Option<String>,
    consecutive_failures: u32,
    last_duration_ms: u64,
    pending_events: usize,
    last_throughput_files_per_sec: f64,
    alerts: Vec<String>,
}

impl From<codecortex_indexer::IndexerStatus> for IndexerStatusResponse {
    fn from(status: codecortex_indexer::IndexerStatus) -> Self {
        Self {
            name: status.name,
            path: status.path,
            state: match status.state {
                codecortex_indexer::IndexerState::Idle => "idle",
                codecortex_indexer::IndexerState::Indexing => "indexing",
                codecortex_indexer::IndexerState::Error => "error",
            },
            last_indexed: status.last_indexed,
            size_bytes: status.size_bytes,
            error: status.error,
            consecutive_failures: status.consecutive_failures,
            last_duration_ms: status.last_duration_ms,
            pending_events: status.pending_events,
            last_throughput_files_per_sec: status.last_throughput_files_per_sec,
            alerts: status.alerts.into_iter().collect(),
        }
    }
}

pub async fn indexer_status(State(state): State<AppState>, Query(q): Query<ProjectQuery>) -> Result<Json<IndexerStatusResponse>, ApiError> {
    let status = state.coordinator.indexer_status(&q.project).await?;
    Ok(Json(status.into()))
}

#[derive(Deserialize)]
pub struct IndexerStatusPush {
    project: String,
    pending_events: usize,
}

pub async fn push_indexer_status(State(state): State<AppState>, Json(push): Json<IndexerStatusPush>) -> Result<Json<serde_json::Value>, ApiError> {
    state.coordinator.set_indexer_pending_events(&push.project, push.pending_events).await?;
    Ok(Json(serde_json::json!({ "accepted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_request_defaults_n_results_to_ten_with_no_filters() {
        let request: QueryApiRequest = serde_json::from_str(r#"{"project":"demo","query":"helper"}"#).unwrap();
        assert_eq!(request.n_results, 10);
        assert_eq!(request.min_score, 0.0);
        assert!(request.filters.is_empty());
        assert!(!request.include_metadata);
    }

    #[test]
    fn register_project_request_accepts_an_omitted_name() {
        let request: RegisterProjectRequest = serde_json::from_str(r#"{"path":"/srv/demo"}"#).unwrap();
        assert!(request.name.is_none());
        assert_eq!(request.path, std::path::PathBuf::from("/srv/demo"));
    }

    #[test]
    fn chunk_search_request_parses_optional_file_name() {
        let request: ChunkSearchRequest = serde_json::from_str(r#"{"project":"demo","query":"helper","file_name":"util.py"}"#).unwrap();
        assert_eq!(request.file_name.as_deref(), Some("util.py"));
        assert_eq!(request.n_results, 10);
    }
}
