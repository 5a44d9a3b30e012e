//! `FileEvent` (spec Data Model §3) and the raw-event expansion rule that
//! turns a filesystem "moved" notification into a `(deleted, created)` pair.

use codecortex_ignore::IgnoreSpec;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub path: PathBuf,
    pub is_directory: bool,
    pub project_root: PathBuf,
    pub timestamp: SystemTime,
}

/// A raw filesystem notification, before C1 (ignore) and the move-expansion
/// rule are applied. `Moved` carries both endpoints since whether it
/// expands into zero, one, or two `FileEvent`s depends on whether each
/// endpoint is ignored (spec §4.11).
#[derive(Debug, Clone)]
pub enum RawEvent {
    Created { path: PathBuf, is_directory: bool },
    Modified { path: PathBuf, is_directory: bool },
    Deleted { path: PathBuf, is_directory: bool },
    Moved {
        from: PathBuf,
        to: PathBuf,
        is_directory: bool,
    },
}

/// Apply C1 (ignore matching) and the moved-event expansion rule (spec
/// §4.11: "'Moved' events become `(deleted, created)` pairs unless both
/// endpoints are ignored"). Directories never reach the indexer as events
/// of their own; only the recursive watch triggers on contained files.
pub fn expand_raw_event(
    raw: RawEvent,
    project_root: &Path,
    ignore: &IgnoreSpec,
    timestamp: SystemTime,
) -> Vec<FileEvent> {
    let mk = |kind: FileEventKind, path: PathBuf| FileEvent {
        kind,
        path,
        is_directory: false,
        project_root: project_root.to_path_buf(),
        timestamp,
    };
    match raw {
        RawEvent::Created { path, is_directory } if !is_directory && !ignore.should_ignore(&path, false) => {
            vec![mk(FileEventKind::Created, path)]
        }
        RawEvent::Modified { path, is_directory } if !is_directory && !ignore.should_ignore(&path, false) => {
            vec![mk(FileEventKind::Modified, path)]
        }
        RawEvent::Deleted { path, is_directory } if !is_directory && !ignore.should_ignore(&path, false) => {
            vec![mk(FileEventKind::Deleted, path)]
        }
        RawEvent::Moved { from, to, is_directory } if !is_directory => {
            let from_ignored = ignore.should_ignore(&from, false);
            let to_ignored = ignore.should_ignore(&to, false);
            let mut out = Vec::new();
            if !from_ignored {
                out.push(mk(FileEventKind::Deleted, from));
            }
            if !to_ignored {
                out.push(mk(FileEventKind::Created, to));
            }
            out
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn spec(root: &Path) -> IgnoreSpec {
        IgnoreSpec::empty(root).unwrap()
    }

    #[test]
    fn created_event_passes_through_when_not_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let events = expand_raw_event(
            RawEvent::Created {
                path: dir.path().join("a.py"),
                is_directory: false,
            },
            dir.path(),
            &spec(dir.path()),
            SystemTime::now(),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FileEventKind::Created);
    }

    #[test]
    fn directory_events_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let events = expand_raw_event(
            RawEvent::Created {
                path: dir.path().join("sub"),
                is_directory: true,
            },
            dir.path(),
            &spec(dir.path()),
            SystemTime::now(),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn moved_event_expands_to_delete_and_create() {
        let dir = tempfile::tempdir().unwrap();
        let events = expand_raw_event(
            RawEvent::Moved {
                from: dir.path().join("old.py"),
                to: dir.path().join("new.py"),
                is_directory: false,
            },
            dir.path(),
            &spec(dir.path()),
            SystemTime::now(),
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, FileEventKind::Deleted);
        assert_eq!(events[1].kind, FileEventKind::Created);
    }

    #[test]
    fn moved_event_drops_both_endpoints_when_both_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let ignore_all = IgnoreSpec::compile(dir.path(), &["*".to_string()], None).unwrap();
        let events = expand_raw_event(
            RawEvent::Moved {
                from: dir.path().join("old.py"),
                to: dir.path().join("new.py"),
                is_directory: false,
            },
            dir.path(),
            &ignore_all,
            SystemTime::now(),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn moved_event_keeps_only_non_ignored_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let ignore_new = IgnoreSpec::compile(dir.path(), &["new.py".to_string()], None).unwrap();
        let events = expand_raw_event(
            RawEvent::Moved {
                from: dir.path().join("old.py"),
                to: dir.path().join("new.py"),
                is_directory: false,
            },
            dir.path(),
            &ignore_new,
            SystemTime::now(),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FileEventKind::Deleted);
    }
}
