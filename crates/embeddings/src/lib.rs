//! Embedding Client (C9, spec §4.9) and the shared preprocessor (§4.12
//! step 1) document and query embedding both go through.

mod client;
mod error;
mod fake;
mod preprocess;

pub use client::{EmbeddingClient, EmbeddingConfig, OllamaEmbeddingClient};
pub use error::{EmbeddingError, Result};
pub use fake::FakeEmbeddingClient;
pub use preprocess::preprocess;
