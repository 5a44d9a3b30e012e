//! Project Registry & Coordinator (C13): owns the root config, the
//! process-global embedding client, and one running `ProjectRuntime` per
//! registered project. Mediates each project's lifecycle so the
//! Indexer/Watcher/Coordinator ownership stays message-passing rather than
//! cyclic (spec §9).

use crate::config::RootConfig;
use crate::error::{RegistryError, Result};
use crate::project::{Project, ProjectState, ProjectStatus, CHUNK_COLLECTION};
use codecortex_chunker::{Chunker, SlidingWindowParams};
use codecortex_embeddings::{EmbeddingClient, EmbeddingConfig, OllamaEmbeddingClient};
use codecortex_graph::GraphStore;
use codecortex_ignore::IgnoreSpec;
use codecortex_indexer::{IndexStats, ProjectIndexer, StreamingIndexer, StreamingIndexerConfig};
use codecortex_search::QueryEngine;
use codecortex_vector_store::VectorStore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

struct ProjectRuntime {
    project: Project,
    state: ProjectState,
    vector_store: Arc<Mutex<VectorStore>>,
    graph_store: Arc<Mutex<GraphStore>>,
    indexer: Option<Arc<ProjectIndexer>>,
    streaming: Option<StreamingIndexer>,
    query_engine: Option<Arc<QueryEngine>>,
}

pub struct Coordinator {
    config_path: PathBuf,
    config: Mutex<RootConfig>,
    embedding_client: Arc<dyn EmbeddingClient>,
    projects: Mutex<HashMap<String, ProjectRuntime>>,
}

impl Coordinator {
    /// Loads the root config and verifies the embedding provider is
    /// reachable. An `Err` here is fatal at process startup (spec §4.9:
    /// "indexing MUST NOT proceed") — the caller (the server binary's
    /// `main`) must exit rather than continue with no embedding provider.
    pub async fn connect(config_path: PathBuf) -> Result<Arc<Self>> {
        let config = RootConfig::load(&config_path);
        let embedding_config = EmbeddingConfig {
            base_url: config.ollama.base_url.clone(),
            model: config.ollama.embedding_model.clone(),
            ..EmbeddingConfig::default()
        };
        let embedding_client = OllamaEmbeddingClient::connect(embedding_config).await?;
        let coordinator = Self::from_parts(config_path, config, Arc::new(embedding_client));

        let registered: Vec<(String, PathBuf)> = coordinator
            .config
            .lock()
            .await
            .projects
            .iter()
            .map(|(name, path)| (name.clone(), path.clone()))
            .collect();
        for (name, path) in registered {
            if let Err(err) = coordinator.register_project(&name, &path, false).await {
                log::error!("failed to restore project {name:?} from root config: {err}");
            }
        }

        Ok(coordinator)
    }

    /// Bypasses the live Ollama connect step so tests can inject a
    /// [`codecortex_embeddings::FakeEmbeddingClient`].
    fn from_parts(config_path: PathBuf, config: RootConfig, embedding_client: Arc<dyn EmbeddingClient>) -> Arc<Self> {
        Arc::new(Self {
            config_path,
            embedding_client,
            projects: Mutex::new(HashMap::new()),
            config: Mutex::new(config),
        })
    }

    /// Registers a new project under a unique name, creates its
    /// `.augmentorium/` layout, runs an initial full index, and starts its
    /// watcher. `persist` is false only when restoring projects already
    /// present in the root config at startup.
    pub async fn register_project(&self, name: &str, root: &std::path::Path, persist: bool) -> Result<()> {
        {
            let projects = self.projects.lock().await;
            if projects.contains_key(name) {
                return Err(RegistryError::DuplicateProject(name.to_string()));
            }
        }

        let project = Project::new(name, root);
        project.ensure_layout()?;

        let runtime = self.start_runtime(project.clone()).await?;
        self.projects.lock().await.insert(name.to_string(), runtime);

        if persist {
            let mut config = self.config.lock().await;
            config.projects.insert(name.to_string(), root.to_path_buf());
            if let Err(err) = config.save(&self.config_path) {
                log::warn!("failed to persist root config after registering {name:?}: {err}");
            }
        }
        Ok(())
    }

    async fn start_runtime(&self, project: Project) -> Result<ProjectRuntime> {
        let config = self.config.lock().await.clone();
        let ignore_spec = IgnoreSpec::compile(&project.root, &config.indexer.ignore_patterns, project.read_ignore_file().as_deref())
            .map_err(|err| RegistryError::Watch(err.to_string()))?;

        let vector_store = Arc::new(Mutex::new(VectorStore::open(project.vector_store_dir())?));
        let graph_store = Arc::new(Mutex::new(GraphStore::open(project.graph_db_path())?));

        let indexer = Arc::new(ProjectIndexer::new(
            project.name.clone(),
            project.root.clone(),
            CHUNK_COLLECTION.to_string(),
            Chunker::new(SlidingWindowParams::default()),
            vector_store.clone(),
            graph_store.clone(),
            self.embedding_client.clone(),
            project.hash_cache_path(),
            ignore_spec.clone(),
        ));

        let stats = indexer.full_index().await?;
        log::info!(
            "initial index of {:?} processed {} files, skipped {} unchanged",
            project.name,
            stats.files_processed,
            stats.files_skipped_unchanged
        );

        let streaming = StreamingIndexer::spawn(indexer.clone(), Arc::new(ignore_spec), StreamingIndexerConfig {
            max_workers: config.indexer.max_workers,
            ..StreamingIndexerConfig::default()
        })
        .map_err(|err| RegistryError::Watch(err.to_string()))?;

        let query_engine = Arc::new(QueryEngine::new(
            CHUNK_COLLECTION,
            vector_store.clone(),
            graph_store.clone(),
            self.embedding_client.clone(),
            8_000,
            config.server.cache_size,
        ));

        Ok(ProjectRuntime {
            project,
            state: ProjectState::Active,
            vector_store,
            graph_store,
            indexer: Some(indexer),
            streaming: Some(streaming),
            query_engine: Some(query_engine),
        })
    }

    /// Unregisters a project. Its on-disk `.augmentorium/` data is left in
    /// place; only the in-memory runtime and the root config entry go away.
    pub async fn remove_project(&self, name: &str) -> Result<()> {
        let runtime = self
            .projects
            .lock()
            .await
            .remove(name)
            .ok_or_else(|| RegistryError::UnknownProject(name.to_string()))?;
        if let Some(streaming) = runtime.streaming {
            streaming.stop(Duration::from_secs(5)).await;
        }

        let mut config = self.config.lock().await;
        config.projects.remove(name);
        if let Err(err) = config.save(&self.config_path) {
            log::warn!("failed to persist root config after removing {name:?}: {err}");
        }
        Ok(())
    }

    /// spec §5 "Pause releases file handles and store connections without
    /// removing project registration".
    pub async fn pause_project(&self, name: &str) -> Result<()> {
        let mut projects = self.projects.lock().await;
        let runtime = projects.get_mut(name).ok_or_else(|| RegistryError::UnknownProject(name.to_string()))?;
        if let Some(streaming) = runtime.streaming.take() {
            streaming.stop(Duration::from_secs(5)).await;
        }
        runtime.indexer = None;
        runtime.query_engine = None;
        runtime.state = ProjectState::Paused;
        Ok(())
    }

    /// spec §5 "'resume' re-opens them".
    pub async fn resume_project(&self, name: &str) -> Result<()> {
        let project = {
            let projects = self.projects.lock().await;
            let runtime = projects.get(name).ok_or_else(|| RegistryError::UnknownProject(name.to_string()))?;
            runtime.project.clone()
        };
        let runtime = self.start_runtime(project).await?;
        self.projects.lock().await.insert(name.to_string(), runtime);
        Ok(())
    }

    /// spec §6 `POST /api/projects/{name}/reindex`: "wipe hash cache and
    /// trigger full re-index".
    pub async fn reindex_project(&self, name: &str) -> Result<IndexStats> {
        let projects = self.projects.lock().await;
        let runtime = projects.get(name).ok_or_else(|| RegistryError::UnknownProject(name.to_string()))?;
        let indexer = runtime.indexer.as_ref().ok_or_else(|| RegistryError::ProjectPaused(name.to_string()))?;
        std::fs::remove_file(runtime.project.hash_cache_path()).ok();
        Ok(indexer.full_index().await?)
    }

    pub async fn query_engine(&self, name: &str) -> Result<Arc<QueryEngine>> {
        let projects = self.projects.lock().await;
        let runtime = projects.get(name).ok_or_else(|| RegistryError::UnknownProject(name.to_string()))?;
        runtime.query_engine.clone().ok_or_else(|| RegistryError::ProjectPaused(name.to_string()))
    }

    pub async fn graph_store(&self, name: &str) -> Result<Arc<Mutex<GraphStore>>> {
        let projects = self.projects.lock().await;
        let runtime = projects.get(name).ok_or_else(|| RegistryError::UnknownProject(name.to_string()))?;
        Ok(runtime.graph_store.clone())
    }

    /// Backs `GET/POST /api/indexer/status`: the full per-project indexer
    /// health record, not just the coarse active/paused state.
    pub async fn indexer_status(&self, name: &str) -> Result<codecortex_indexer::IndexerStatus> {
        let projects = self.projects.lock().await;
        let runtime = projects.get(name).ok_or_else(|| RegistryError::UnknownProject(name.to_string()))?;
        let indexer = runtime.indexer.as_ref().ok_or_else(|| RegistryError::ProjectPaused(name.to_string()))?;
        Ok(indexer.status().await)
    }

    /// Backs `POST /api/indexer/status`: the push side, reporting the
    /// watcher's current event backlog for a project.
    pub async fn set_indexer_pending_events(&self, name: &str, pending: usize) -> Result<()> {
        let projects = self.projects.lock().await;
        let runtime = projects.get(name).ok_or_else(|| RegistryError::UnknownProject(name.to_string()))?;
        let indexer = runtime.indexer.as_ref().ok_or_else(|| RegistryError::ProjectPaused(name.to_string()))?;
        indexer.set_pending_events(pending).await;
        Ok(())
    }

    pub async fn list_projects(&self) -> Vec<String> {
        self.projects.lock().await.keys().cloned().collect()
    }

    pub async fn server_settings(&self) -> crate::config::ServerSettings {
        self.config.lock().await.server.clone()
    }

    pub async fn project_root(&self, name: &str) -> Result<PathBuf> {
        let projects = self.projects.lock().await;
        let runtime = projects.get(name).ok_or_else(|| RegistryError::UnknownProject(name.to_string()))?;
        Ok(runtime.project.root.clone())
    }

    /// Single-project status, used by `GET /api/stats/?project=…`.
    pub async fn project_status(&self, name: &str) -> Result<ProjectStatus> {
        self.status_snapshot()
            .await
            .into_iter()
            .find(|status| status.name == name)
            .ok_or_else(|| RegistryError::UnknownProject(name.to_string()))
    }

    /// Every distinct file path currently indexed for a project, used by
    /// `GET /api/files/?project=…&max_files=…`.
    pub async fn project_files(&self, name: &str, max_files: Option<usize>) -> Result<Vec<String>> {
        let graph_store = self.graph_store(name).await?;
        let (nodes, _edges) = graph_store.lock().await.full_graph()?;
        let mut files: Vec<String> = nodes
            .into_iter()
            .filter(|node| !node.is_external())
            .map(|node| node.file_path)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        if let Some(max_files) = max_files {
            files.truncate(max_files);
        }
        Ok(files)
    }

    /// Status aggregation (spec §5: "A single background task per process
    /// aggregates status across projects").
    pub async fn status_snapshot(&self) -> Vec<ProjectStatus> {
        let projects = self.projects.lock().await;
        let mut out = Vec::with_capacity(projects.len());
        for (name, runtime) in projects.iter() {
            let chunk_count = runtime
                .vector_store
                .lock()
                .await
                .get(CHUNK_COLLECTION, None, None, 0)
                .map(|r| r.ids.len())
                .unwrap_or(0);
            let (nodes, _edges) = runtime.graph_store.lock().await.full_graph().unwrap_or_default();
            out.push(ProjectStatus {
                name: name.clone(),
                state: runtime.state,
                file_count: nodes.iter().map(|n| n.file_path.clone()).collect::<std::collections::HashSet<_>>().len(),
                chunk_count,
            });
        }
        out
    }

    /// Periodically re-reads the root config file to pick up projects
    /// added or removed by another process (spec §5: "A separate task
    /// periodically re-reads the root config to detect newly added/removed
    /// projects").
    pub fn spawn_config_reloader(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let on_disk = RootConfig::load(&coordinator.config_path);
                let known: Vec<String> = coordinator.list_projects().await;

                for (name, path) in &on_disk.projects {
                    if !known.contains(name) {
                        log::info!("root config added project {name:?}, registering");
                        if let Err(err) = coordinator.register_project(name, path, false).await {
                            log::error!("failed to register newly configured project {name:?}: {err}");
                        }
                    }
                }
                for name in &known {
                    if !on_disk.projects.contains_key(name) {
                        log::info!("root config dropped project {name:?}, unregistering");
                        if let Err(err) = coordinator.remove_project(name).await {
                            log::error!("failed to unregister project {name:?}: {err}");
                        }
                    }
                }
            }
        })
    }

    /// Publishes an aggregated status snapshot every 5s (spec §5).
    pub fn spawn_status_publisher(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(5)).await;
                for status in coordinator.status_snapshot().await {
                    log::info!(
                        "project {:?}: {:?}, {} files, {} chunks",
                        status.name,
                        status.state,
                        status.file_count,
                        status.chunk_count
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codecortex_embeddings::FakeEmbeddingClient;

    fn coordinator(config_path: PathBuf) -> Arc<Coordinator> {
        Coordinator::from_parts(config_path, RootConfig::default(), Arc::new(FakeEmbeddingClient::new(8)))
    }

    #[tokio::test]
    async fn registers_and_lists_a_project() {
        let root_dir = tempfile::tempdir().unwrap();
        let config_dir = tempfile::tempdir().unwrap();
        std::fs::write(root_dir.path().join("a.py"), "def f(): pass\n").unwrap();
        let coordinator = coordinator(config_dir.path().join("config.yaml"));

        coordinator.register_project("demo", root_dir.path(), true).await.unwrap();

        assert_eq!(coordinator.list_projects().await, vec!["demo".to_string()]);
        assert!(coordinator.config.lock().await.projects.contains_key("demo"));
    }

    #[tokio::test]
    async fn registering_the_same_name_twice_is_rejected() {
        let root_dir = tempfile::tempdir().unwrap();
        let config_dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(config_dir.path().join("config.yaml"));

        coordinator.register_project("demo", root_dir.path(), false).await.unwrap();
        let err = coordinator.register_project("demo", root_dir.path(), false).await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateProject(_)));
    }

    #[tokio::test]
    async fn remove_project_unregisters_but_keeps_files() {
        let root_dir = tempfile::tempdir().unwrap();
        let config_dir = tempfile::tempdir().unwrap();
        std::fs::write(root_dir.path().join("a.py"), "def f(): pass\n").unwrap();
        let coordinator = coordinator(config_dir.path().join("config.yaml"));
        coordinator.register_project("demo", root_dir.path(), true).await.unwrap();

        coordinator.remove_project("demo").await.unwrap();

        assert!(coordinator.list_projects().await.is_empty());
        assert!(root_dir.path().join("a.py").exists());
        assert!(!coordinator.config.lock().await.projects.contains_key("demo"));
    }

    #[tokio::test]
    async fn reindex_project_wipes_hash_cache_and_reprocesses() {
        let root_dir = tempfile::tempdir().unwrap();
        let config_dir = tempfile::tempdir().unwrap();
        std::fs::write(root_dir.path().join("a.py"), "def f(): pass\n").unwrap();
        let coordinator = coordinator(config_dir.path().join("config.yaml"));
        coordinator.register_project("demo", root_dir.path(), false).await.unwrap();

        let stats = coordinator.reindex_project("demo").await.unwrap();
        assert_eq!(stats.files_processed, 1);
    }

    #[tokio::test]
    async fn paused_project_rejects_queries_until_resumed() {
        let root_dir = tempfile::tempdir().unwrap();
        let config_dir = tempfile::tempdir().unwrap();
        std::fs::write(root_dir.path().join("a.py"), "def f(): pass\n").unwrap();
        let coordinator = coordinator(config_dir.path().join("config.yaml"));
        coordinator.register_project("demo", root_dir.path(), false).await.unwrap();

        coordinator.pause_project("demo").await.unwrap();
        assert!(matches!(coordinator.query_engine("demo").await, Err(RegistryError::ProjectPaused(_))));

        coordinator.resume_project("demo").await.unwrap();
        assert!(coordinator.query_engine("demo").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_project_is_reported() {
        let config_dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(config_dir.path().join("config.yaml"));
        assert!(matches!(coordinator.query_engine("ghost").await, Err(RegistryError::UnknownProject(_))));
    }
}
