//! Content Hasher (C2): stable digest of file contents with a persistent
//! cache keyed by normalised relative path.

use md5::{Digest, Md5};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const READ_BLOCK: usize = 4096;

/// Digest a file's contents by streaming 4 KiB blocks, per C2's contract.
pub fn hash_file(path: &Path) -> crate::error::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Md5::new();
    let mut buf = [0u8; READ_BLOCK];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Persistent per-project map of normalised relative path to content digest.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct HashCache {
    entries: HashMap<String, String>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; corruption is treated as an empty cache with a
    /// warning, never a hard error, per spec C2.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(cache) => cache,
                Err(err) => {
                    log::warn!("hash cache at {} is corrupt ({err}); starting empty", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Returns `true` when `digest` differs from the stored entry for
    /// `relative_path` (or no entry exists), and updates the cache in place.
    pub fn has_changed(&mut self, relative_path: &str, digest: &str) -> bool {
        match self.entries.get(relative_path) {
            Some(existing) if existing == digest => false,
            _ => {
                self.entries.insert(relative_path.to_string(), digest.to_string());
                true
            }
        }
    }

    pub fn remove(&mut self, relative_path: &str) {
        self.entries.remove(relative_path);
    }

    pub fn get(&self, relative_path: &str) -> Option<&str> {
        self.entries.get(relative_path).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn streaming_hash_matches_whole_buffer_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        let content = "hello world".repeat(1000);
        std::fs::write(&path, &content).unwrap();

        let streamed = hash_file(&path).unwrap();
        let whole = hash_bytes(content.as_bytes());
        assert_eq!(streamed, whole);
    }

    #[test]
    fn has_changed_detects_new_and_unchanged() {
        let mut cache = HashCache::new();
        assert!(cache.has_changed("a.py", "digest1"));
        assert!(!cache.has_changed("a.py", "digest1"));
        assert!(cache.has_changed("a.py", "digest2"));
    }

    #[test]
    fn corrupt_cache_file_loads_as_empty_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hash_cache.json");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"{not valid json").unwrap();

        let cache = HashCache::load(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata").join("hash_cache.json");
        let mut cache = HashCache::new();
        cache.has_changed("src/a.py", "abc");
        cache.save(&path).unwrap();

        let reloaded = HashCache::load(&path);
        assert_eq!(reloaded.get("src/a.py"), Some("abc"));
    }

    #[test]
    fn remove_clears_entry() {
        let mut cache = HashCache::new();
        cache.has_changed("a.py", "abc");
        cache.remove("a.py");
        assert!(cache.get("a.py").is_none());
    }
}
