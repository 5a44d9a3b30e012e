use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunker error: {0}")]
    Chunker(#[from] codecortex_chunker::ChunkerError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] codecortex_vector_store::VectorStoreError),

    #[error("graph store error: {0}")]
    Graph(#[from] codecortex_graph::GraphError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid project path: {0}")]
    InvalidPath(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
