use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed after {attempts} attempt(s): {source}")]
    RequestFailed {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("embedding provider returned no vector for this input")]
    EmptyResponse,
    #[error("embedding service unreachable at startup ({url}): {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("warm-up timed out after {0:?} waiting for model {1:?}")]
    WarmUpTimedOut(std::time::Duration, String),
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;
