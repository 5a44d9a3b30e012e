//! Per-run counters for one `full_index()` pass.

#[derive(Debug, Default, Clone)]
pub struct IndexStats {
    pub files_processed: usize,
    pub files_skipped_unchanged: usize,
    pub chunks_upserted: usize,
    pub embedding_failures: usize,
    pub errors: Vec<String>,
    pub time_ms: u64,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}
