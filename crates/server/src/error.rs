//! Error-to-HTTP-status mapping at the API boundary (spec §7): `NotFound`
//! surfaces as 404, `BadRequest` as 400, everything else as 500 with the
//! cause logged server-side rather than leaked to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use codecortex_registry::RegistryError;
use codecortex_search::SearchError;
use serde_json::json;

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal(err) => {
                log::error!("request failed: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownProject(name) => Self::NotFound(format!("project {name:?} is not registered")),
            RegistryError::DuplicateProject(name) => Self::BadRequest(format!("project {name:?} is already registered")),
            RegistryError::ProjectPaused(name) => Self::BadRequest(format!("project {name:?} is paused")),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::EmptyQuery => Self::BadRequest("query must not be empty".to_string()),
            SearchError::InvalidNResults => Self::BadRequest("n_results must be greater than zero".to_string()),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<codecortex_graph::GraphError> for ApiError {
    fn from(err: codecortex_graph::GraphError) -> Self {
        Self::Internal(err.into())
    }
}

impl From<codecortex_vector_store::VectorStoreError> for ApiError {
    fn from(err: codecortex_vector_store::VectorStoreError) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn status_of(error: ApiError) -> StatusCode {
        error.into_response().status()
    }

    #[tokio::test]
    async fn unknown_project_maps_to_404() {
        let status = status_of(RegistryError::UnknownProject("demo".to_string()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_project_maps_to_400() {
        let status = status_of(RegistryError::DuplicateProject("demo".to_string()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_query_maps_to_400() {
        let status = status_of(SearchError::EmptyQuery.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn internal_error_maps_to_500_without_leaking_the_cause() {
        let response = ApiError::Internal(anyhow::anyhow!("sqlite is on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("sqlite is on fire"));
    }
}
