use super::ChunkStrategy;
use crate::chunk::{ChunkMetadata, CodeChunk, NodeType};
use crate::error::Result;

/// One chunk for the entire file (spec §4.5); also used when a grammar is
/// reported unavailable (spec §4.3/§7 `ParseUnavailable`).
pub struct PlaintextStrategy;

impl ChunkStrategy for PlaintextStrategy {
    fn chunk(&self, file_path: &str, content: &str) -> Result<Vec<CodeChunk>> {
        if content.is_empty() {
            return Ok(Vec::new());
        }
        let end_line = content.lines().count().max(1);
        Ok(vec![CodeChunk::new(
            file_path.to_string(),
            1,
            end_line,
            NodeType::Plaintext,
            None,
            None,
            content.to_string(),
            ChunkMetadata::default(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_file_single_chunk() {
        let chunks = PlaintextStrategy.chunk("f.txt", "line one\nline two\n").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 2);
    }

    #[test]
    fn empty_file_yields_no_chunks() {
        let chunks = PlaintextStrategy.chunk("f.txt", "").unwrap();
        assert!(chunks.is_empty());
    }
}
