//! Embedding Client (C9, spec §4.9): `embed`/`embed_batch` against an
//! Ollama-shaped HTTP provider, with linear-backoff retry and a startup
//! warm-up probe against `GET /api/tags`.
//!
//! Grounded on `original_source/indexer/embedder.py`'s `OllamaEmbedder`:
//! same endpoint shapes (`/api/embeddings`, `/api/tags`), same
//! verify-at-construction-or-exit policy (spec §4.9: "If the service is
//! unreachable at startup, indexing MUST NOT proceed — the process exits"),
//! same warm-up polling loop.

use crate::error::{EmbeddingError, Result};
use crate::preprocess::preprocess;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub warmup_timeout: Duration,
    pub warmup_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "bge-m3:latest".to_string(),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            warmup_timeout: Duration::from_secs(120),
            warmup_interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: Option<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Option<Vec<f32>>,
}

/// `embed`/`embed_batch` over text already run through the shared
/// preprocessor, so a document embedding and a query embedding of the same
/// underlying text are comparable (spec §4.9).
#[async_trait::async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>>;
}

pub struct OllamaEmbeddingClient {
    http: Client,
    config: EmbeddingConfig,
    embed_url: String,
    tags_url: String,
}

impl OllamaEmbeddingClient {
    /// Verifies the provider is reachable before returning — spec §4.9's
    /// "MUST NOT proceed" is enforced by the caller treating `Err` here as
    /// fatal at process startup, matching `OllamaEmbedder._verify_ollama`'s
    /// `sys.exit(1)` on an unreachable server.
    pub async fn connect(config: EmbeddingConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("reqwest client builder with static config never fails");
        let base = config.base_url.trim_end_matches('/').to_string();
        let client = Self {
            embed_url: format!("{base}/api/embeddings"),
            tags_url: format!("{base}/api/tags"),
            http,
            config,
        };
        client.list_models().await.map_err(|source| EmbeddingError::Unreachable {
            url: client.tags_url.clone(),
            source,
        })?;
        Ok(client)
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, reqwest::Error> {
        let response = self.http.get(&self.tags_url).send().await?.error_for_status()?;
        let parsed: TagsResponse = response.json().await?;
        Ok(parsed.models.into_iter().filter_map(|m| m.name).collect())
    }

    /// Polls `GET /api/tags` until the configured model appears or
    /// `warmup_timeout` elapses (spec §4.9, `warm_up()`).
    pub async fn warm_up(&self) -> Result<()> {
        let start = std::time::Instant::now();
        loop {
            if let Ok(models) = self.list_models().await {
                if models.iter().any(|m| m == &self.config.model) {
                    log::info!("embedding model '{}' is loaded and ready", self.config.model);
                    return Ok(());
                }
            }
            if start.elapsed() > self.config.warmup_timeout {
                return Err(EmbeddingError::WarmUpTimedOut(self.config.warmup_timeout, self.config.model.clone()));
            }
            tokio::time::sleep(self.config.warmup_interval).await;
        }
    }

    async fn embed_one(&self, text: &str) -> Result<Option<Vec<f32>>> {
        let body = serde_json::json!({ "model": self.config.model, "prompt": text });
        let mut last_err = None;
        for attempt in 0..self.config.max_retries {
            match self.http.post(&self.embed_url).json(&body).send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(response) => match response.json::<EmbeddingResponse>().await {
                        Ok(parsed) if parsed.embedding.is_some() => return Ok(parsed.embedding),
                        Ok(_) => {
                            log::warn!("embedding response had no vector (attempt {})", attempt + 1);
                        }
                        Err(err) => last_err = Some(err),
                    },
                    Err(err) => last_err = Some(err),
                },
                Err(err) => last_err = Some(err),
            }
            tokio::time::sleep(self.config.retry_delay * (attempt + 1)).await;
        }
        match last_err {
            Some(source) => Err(EmbeddingError::RequestFailed {
                attempts: self.config.max_retries,
                source,
            }),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingClient for OllamaEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>> {
        self.embed_one(&preprocess(text)).await
    }

    /// Sequential, like `OllamaEmbedder.get_embeddings_batch`: one slow
    /// request should not starve the process's single embedding connection
    /// pool (batching here is a logical grouping for callers, not
    /// concurrency).
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

    #[test]
    fn default_config_matches_documented_ollama_defaults() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "bge-m3:latest");
        assert_eq!(config.max_retries, 3);
    }
}
