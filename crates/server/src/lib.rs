//! HTTP façade over the [`codecortex_registry::Coordinator`] (spec §6):
//! project lifecycle, query, graph, and status endpoints.

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{delete, get, post};
use axum::Router;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/projects/", get(routes::list_projects).post(routes::register_project))
        .route("/api/projects/:name", delete(routes::remove_project))
        .route("/api/projects/:name/reindex", post(routes::reindex_project))
        .route("/api/query/", post(routes::query))
        .route("/api/query/cache", delete(routes::clear_query_cache))
        .route("/api/chunks/search", post(routes::search_chunks))
        .route("/api/graph/neighbors/", post(routes::graph_neighbors))
        .route("/api/graph/", get(routes::graph_dump))
        .route("/api/files/", get(routes::list_files))
        .route("/api/stats/", get(routes::stats))
        .route("/api/indexer/status", get(routes::indexer_status).post(routes::push_indexer_status))
        .with_state(state)
}
