//! A deterministic stand-in for `OllamaEmbeddingClient`, used by `search`'s
//! and `indexer`'s own test suites so they don't need a live Ollama server.

use crate::client::EmbeddingClient;
use crate::error::Result;
use crate::preprocess::preprocess;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Embeds by hashing the preprocessed text into a small fixed-size vector.
/// Deterministic: the same text always yields the same vector, so tests can
/// assert on similarity ordering without a real model.
pub struct FakeEmbeddingClient {
    dim: usize,
    pub calls: AtomicUsize,
}

impl FakeEmbeddingClient {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            calls: AtomicUsize::new(0),
        }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let preprocessed = preprocess(text);
        let mut vector = vec![0.0f32; self.dim];
        for (i, byte) in preprocessed.bytes().enumerate() {
            vector[i % self.dim] += byte as f32;
        }
        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingClient for FakeEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(self.vector_for(text)))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_yields_same_vector() {
        let client = FakeEmbeddingClient::new(8);
        let a = client.embed("fn main() {}").await.unwrap();
        let b = client.embed("fn main() {}").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_text_yields_different_vector() {
        let client = FakeEmbeddingClient::new(8);
        let a = client.embed("alpha").await.unwrap();
        let b = client.embed("beta").await.unwrap();
        assert_ne!(a, b);
    }
}
