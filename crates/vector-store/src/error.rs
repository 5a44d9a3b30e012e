use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
    #[error("upsert batch has mismatched lengths: ids={ids}, docs={docs}, metadatas={metadatas}, embeddings={embeddings}")]
    BatchLengthMismatch {
        ids: usize,
        docs: usize,
        metadatas: usize,
        embeddings: usize,
    },
    #[error("embedding dimension mismatch: collection has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("metadata value for key {0:?} is not scalar")]
    NonScalarMetadata(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VectorStoreError>;
