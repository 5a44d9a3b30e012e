use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("grammar unavailable for language {0:?}")]
    ParseUnavailable(crate::language::Language),

    #[error("parse failed for {path}: {reason}")]
    ParseFailure { path: String, reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid strategy configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ChunkerError>;
