//! Watcher / Event Queue (C11, spec §4.11): a recursive filesystem watcher
//! feeds a per-project bounded channel; a dispatcher applies C1 and the
//! moved-event expansion rule and routes `FileEvent`s onto a fixed-size
//! worker pool, serialising same-file events onto the same worker by
//! hashing the path (spec §5 ordering guarantee).

use crate::event::{expand_raw_event, FileEvent, RawEvent};
use crate::indexer::ProjectIndexer;
use codecortex_ignore::IgnoreSpec;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct StreamingIndexerConfig {
    pub max_workers: usize,
    pub channel_capacity: usize,
}

impl Default for StreamingIndexerConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            channel_capacity: 1024,
        }
    }
}

/// Owns the watcher thread, the dispatcher task, and the worker pool for one
/// project. Dropping the handle does not stop anything; call [`Self::stop`].
pub struct StreamingIndexer {
    _fs_watcher: RecommendedWatcher,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl StreamingIndexer {
    /// Spawns the watcher, dispatcher, and `config.max_workers` worker
    /// tasks consuming `indexer`'s events.
    pub fn spawn(
        indexer: Arc<ProjectIndexer>,
        ignore_spec: Arc<IgnoreSpec>,
        config: StreamingIndexerConfig,
    ) -> notify::Result<Self> {
        let project_root = indexer.project_root().to_path_buf();
        let (raw_tx, raw_rx) = mpsc::channel::<RawEvent>(config.channel_capacity);

        let fs_watcher = spawn_fs_watcher(project_root.clone(), raw_tx)?;

        let mut worker_txs = Vec::with_capacity(config.max_workers);
        let mut workers = Vec::with_capacity(config.max_workers);
        for worker_id in 0..config.max_workers {
            let (tx, mut rx) = mpsc::channel::<FileEvent>(config.channel_capacity);
            worker_txs.push(tx);
            let worker_indexer = indexer.clone();
            workers.push(tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    if let Err(err) = worker_indexer.process_event(&event).await {
                        log::error!("worker {worker_id} failed to process {:?}: {err}", event.path);
                    }
                }
            }));
        }

        let dispatcher = tokio::spawn(dispatch_loop(raw_rx, project_root, ignore_spec, worker_txs));

        Ok(Self {
            _fs_watcher: fs_watcher,
            dispatcher,
            workers,
        })
    }

    /// Halts the watcher, closes the event channel, and waits (with a
    /// bounded timeout) for in-flight workers to drain (spec §5
    /// "Cancellation").
    pub async fn stop(self, drain_timeout: std::time::Duration) {
        self.dispatcher.abort();
        for worker in self.workers {
            let _ = tokio::time::timeout(drain_timeout, worker).await;
        }
    }
}

fn spawn_fs_watcher(root: PathBuf, raw_tx: mpsc::Sender<RawEvent>) -> notify::Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        let Ok(event) = result else {
            return;
        };
        for raw in translate_notify_event(event) {
            // `blocking_send` because notify invokes this callback from its
            // own watcher thread, not an async context.
            if raw_tx.blocking_send(raw).is_err() {
                break;
            }
        }
    })?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

fn translate_notify_event(event: Event) -> Vec<RawEvent> {
    let is_directory = event.paths.iter().any(|p| p.is_dir());
    match event.kind {
        EventKind::Create(_) => event
            .paths
            .into_iter()
            .map(|path| RawEvent::Created { path, is_directory })
            .collect(),
        EventKind::Modify(notify::event::ModifyKind::Name(_)) if event.paths.len() == 2 => {
            vec![RawEvent::Moved {
                from: event.paths[0].clone(),
                to: event.paths[1].clone(),
                is_directory,
            }]
        }
        EventKind::Modify(_) => event
            .paths
            .into_iter()
            .map(|path| RawEvent::Modified { path, is_directory })
            .collect(),
        EventKind::Remove(_) => event
            .paths
            .into_iter()
            .map(|path| RawEvent::Deleted { path, is_directory })
            .collect(),
        _ => Vec::new(),
    }
}

async fn dispatch_loop(
    mut raw_rx: mpsc::Receiver<RawEvent>,
    project_root: PathBuf,
    ignore_spec: Arc<IgnoreSpec>,
    worker_txs: Vec<mpsc::Sender<FileEvent>>,
) {
    while let Some(raw) = raw_rx.recv().await {
        let events = expand_raw_event(raw, &project_root, &ignore_spec, SystemTime::now());
        for event in events {
            let worker = route_to_worker(&event.path, worker_txs.len());
            if worker_txs[worker].send(event).await.is_err() {
                log::warn!("worker {worker} channel closed, dropping event");
            }
        }
    }
}

/// Same `(project, file_path)` always lands on the same worker, preserving
/// the create/modify/delete ordering guarantee for that file (spec §5).
fn route_to_worker(path: &std::path::Path, worker_count: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    (hasher.finish() as usize) % worker_count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn routing_is_deterministic_for_the_same_path() {
        let path = PathBuf::from("/project/src/a.py");
        assert_eq!(route_to_worker(&path, 4), route_to_worker(&path, 4));
    }

    #[test]
    fn routing_distributes_across_workers() {
        let paths: Vec<PathBuf> = (0..50).map(|i| PathBuf::from(format!("/project/src/f{i}.py"))).collect();
        let buckets: std::collections::HashSet<usize> = paths.iter().map(|p| route_to_worker(p, 4)).collect();
        assert!(buckets.len() > 1);
    }
}
