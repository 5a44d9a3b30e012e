//! Directory-pruning scan routine (spec §4.11: "Scanning a project for
//! initial indexing walks the tree with directory-level pruning: a
//! directory matching the ignore spec is not entered").

use codecortex_ignore::IgnoreSpec;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walk `root` depth-first, pruning any directory the ignore spec matches,
/// and return every non-ignored file path.
pub fn scan_project(root: &Path, ignore: &IgnoreSpec) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        !ignore.should_ignore(entry.path(), entry.file_type().is_dir())
    });
    for entry in walker.filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn prunes_ignored_directories_without_descending() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("src/a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "module.exports = {}\n").unwrap();

        let ignore = IgnoreSpec::compile(dir.path(), &["node_modules/".to_string()], None).unwrap();
        let files = scan_project(dir.path(), &ignore);

        assert!(files.iter().any(|p| p.ends_with("src/a.py")));
        assert!(!files.iter().any(|p| p.to_string_lossy().contains("node_modules")));
    }
}
