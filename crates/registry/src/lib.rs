//! Project Registry & Coordinator (C13, spec §6): a single root config,
//! lifecycle management for per-project databases, hot-reload of
//! newly-added/removed projects, and status aggregation.

mod config;
mod coordinator;
mod error;
mod project;

pub use config::{GeneralConfig, IndexerSettings, OllamaSettings, RootConfig, ServerSettings};
pub use coordinator::Coordinator;
pub use error::{RegistryError, Result};
pub use project::{Project, ProjectState, ProjectStatus, CHUNK_COLLECTION, PROJECT_DIR_NAME};
