//! Per-project `<root>/.augmentorium/` directory layout (spec §6).

use std::path::{Path, PathBuf};

pub const PROJECT_DIR_NAME: &str = ".augmentorium";

/// Identity and on-disk layout for one registered project. Does not hold
/// any open handles; [`crate::coordinator::Coordinator`] owns those.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub root: PathBuf,
}

impl Project {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR_NAME)
    }

    pub fn vector_store_dir(&self) -> PathBuf {
        self.data_dir().join("chroma")
    }

    pub fn graph_db_path(&self) -> PathBuf {
        self.data_dir().join("code_graph.db")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir().join("cache")
    }

    pub fn hash_cache_path(&self) -> PathBuf {
        self.data_dir().join("metadata").join("hash_cache.json")
    }

    pub fn ignore_file_path(&self) -> PathBuf {
        self.root.join(".augmentoriumignore")
    }

    /// Creates every directory this project's layout needs. Idempotent.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.vector_store_dir())?;
        std::fs::create_dir_all(self.cache_dir())?;
        if let Some(parent) = self.hash_cache_path().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn read_ignore_file(&self) -> Option<String> {
        std::fs::read_to_string(self.ignore_file_path()).ok()
    }
}

/// The single vector-store collection name used for a project's chunks. A
/// fixed name because each project owns its own vector-store root
/// directory (one collection is all a project needs).
pub const CHUNK_COLLECTION: &str = "chunks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectState {
    Active,
    Paused,
}

#[derive(Debug, Clone)]
pub struct ProjectStatus {
    pub name: String,
    pub state: ProjectState,
    pub file_count: usize,
    pub chunk_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_under_the_project_dir() {
        let project = Project::new("demo", "/srv/demo");
        assert_eq!(project.vector_store_dir(), PathBuf::from("/srv/demo/.augmentorium/chroma"));
        assert_eq!(project.graph_db_path(), PathBuf::from("/srv/demo/.augmentorium/code_graph.db"));
        assert_eq!(project.hash_cache_path(), PathBuf::from("/srv/demo/.augmentorium/metadata/hash_cache.json"));
        assert_eq!(project.ignore_file_path(), PathBuf::from("/srv/demo/.augmentoriumignore"));
    }

    #[test]
    fn ensure_layout_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::new("demo", dir.path());
        project.ensure_layout().unwrap();
        assert!(project.vector_store_dir().is_dir());
        assert!(project.cache_dir().is_dir());
        assert!(project.hash_cache_path().parent().unwrap().is_dir());
    }
}
