//! Project Registry & Coordinator (C13) error kinds.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("project {0:?} is already registered")]
    DuplicateProject(String),
    #[error("project {0:?} is not registered")]
    UnknownProject(String),
    #[error("project {0:?} is paused")]
    ProjectPaused(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Indexer(#[from] codecortex_indexer::IndexerError),
    #[error(transparent)]
    Graph(#[from] codecortex_graph::GraphError),
    #[error(transparent)]
    VectorStore(#[from] codecortex_vector_store::VectorStoreError),
    #[error(transparent)]
    Embedding(#[from] codecortex_embeddings::EmbeddingError),
    #[error("failed to start filesystem watcher: {0}")]
    Watch(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
