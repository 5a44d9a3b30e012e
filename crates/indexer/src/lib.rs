//! Per-Project Indexer (C10) and Watcher / Event Queue (C11).
//!
//! One `ProjectIndexer` owns a project's hash cache, vector-store handle,
//! and graph-store handle, and knows how to process a single `FileEvent`
//! end to end (spec §4.10). `StreamingIndexer` wires a recursive filesystem
//! watcher and a fixed-size worker pool in front of it (spec §4.11).

mod error;
mod event;
mod indexer;
mod scanner;
mod stats;
mod status;
mod watcher;

pub use error::{IndexerError, Result};
pub use event::{expand_raw_event, FileEvent, FileEventKind, RawEvent};
pub use indexer::ProjectIndexer;
pub use scanner::scan_project;
pub use stats::IndexStats;
pub use status::{IndexerState, IndexerStatus};
pub use watcher::{StreamingIndexer, StreamingIndexerConfig};
