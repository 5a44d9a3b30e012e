//! Root configuration (spec §6): a single YAML file naming the ambient
//! engineering settings and the `name -> absolute_path` project map.
//! Grounded on `original_source/config/defaults.py`'s
//! `DEFAULT_GLOBAL_CONFIG` for the key names and default values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    dirs_home().join(".codecortex").join("logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexerSettings {
    #[serde(default = "default_polling_interval")]
    pub polling_interval: f64,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: String,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_indexer_host")]
    pub host: String,
    #[serde(default = "default_indexer_port")]
    pub port: u16,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            polling_interval: default_polling_interval(),
            max_workers: default_max_workers(),
            hash_algorithm: default_hash_algorithm(),
            ignore_patterns: Vec::new(),
            host: default_indexer_host(),
            port: default_indexer_port(),
        }
    }
}

fn default_polling_interval() -> f64 {
    1.0
}
fn default_max_workers() -> usize {
    4
}
fn default_hash_algorithm() -> String {
    "md5".to_string()
}
fn default_indexer_host() -> String {
    "localhost".to_string()
}
fn default_indexer_port() -> u16 {
    6656
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cache_size: default_cache_size(),
        }
    }
}

fn default_server_host() -> String {
    "localhost".to_string()
}
fn default_server_port() -> u16 {
    6655
}
fn default_cache_size() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaSettings {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            embedding_model: default_embedding_model(),
            embedding_batch_size: default_embedding_batch_size(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_embedding_model() -> String {
    "bge-m3:latest".to_string()
}
fn default_embedding_batch_size() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RootConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub indexer: IndexerSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub ollama: OllamaSettings,
    /// `name -> absolute_path` (spec §6).
    #[serde(default)]
    pub projects: BTreeMap<String, PathBuf>,
}

impl RootConfig {
    /// Reads and parses the root config file. A malformed file falls back
    /// to defaults (logged), per spec §7 `ConfigInvalid`. A missing file
    /// also yields defaults, since a fresh install has none yet.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!("root config {} unreadable ({err}), using defaults", path.display());
                return Self::default();
            }
        };
        match serde_yaml::from_str::<RootConfig>(&contents) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("root config {} is malformed ({err}), falling back to defaults with an empty project list", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).expect("RootConfig always serialises");
        std::fs::write(path, yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RootConfig::default();
        assert_eq!(config.indexer.max_workers, 4);
        assert_eq!(config.indexer.hash_algorithm, "md5");
        assert_eq!(config.server.cache_size, 100);
        assert_eq!(config.server.port, 6655);
        assert!(config.projects.is_empty());
    }

    #[test]
    fn malformed_yaml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "projects: [this is not a map]\n").unwrap();
        let config = RootConfig::load(&path);
        assert!(config.projects.is_empty());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RootConfig::load(&dir.path().join("missing.yaml"));
        assert_eq!(config, RootConfig::default());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = RootConfig::default();
        config.projects.insert("demo".to_string(), PathBuf::from("/srv/demo"));
        config.save(&path).unwrap();

        let reloaded = RootConfig::load(&path);
        assert_eq!(reloaded, config);
    }
}
