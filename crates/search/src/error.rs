//! Query Engine error kinds (spec §7: "the Query Engine returns empty
//! results on internal failure rather than raising, except for argument
//! validation which returns structured errors to the caller").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("n_results must be greater than zero")]
    InvalidNResults,
    #[error("vector store error: {0}")]
    VectorStore(#[from] codecortex_vector_store::VectorStoreError),
    #[error("graph store error: {0}")]
    Graph(#[from] codecortex_graph::GraphError),
    #[error("embedding error: {0}")]
    Embedding(#[from] codecortex_embeddings::EmbeddingError),
}

pub type Result<T> = std::result::Result<T, SearchError>;
