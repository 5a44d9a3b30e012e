use super::ChunkStrategy;
use crate::chunk::{ChunkMetadata, CodeChunk, NodeType};
use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct SlidingWindowParams {
    pub max_chunk_size: usize,
    pub overlap: usize,
    pub min_chunk_size: usize,
}

impl Default for SlidingWindowParams {
    fn default() -> Self {
        Self {
            max_chunk_size: 2000,
            overlap: 200,
            min_chunk_size: 100,
        }
    }
}

pub struct SlidingWindowStrategy {
    params: SlidingWindowParams,
}

impl SlidingWindowStrategy {
    pub fn new(params: SlidingWindowParams) -> Self {
        Self { params }
    }
}

impl ChunkStrategy for SlidingWindowStrategy {
    fn chunk(&self, file_path: &str, content: &str) -> Result<Vec<CodeChunk>> {
        let chars: Vec<char> = content.chars().collect();
        if chars.is_empty() {
            return Ok(Vec::new());
        }

        let windows = compute_windows(&chars, self.params);
        let total = windows.len();
        let mut chunks = Vec::new();
        for (index, (start, end)) in windows.into_iter().enumerate() {
            let text: String = chars[start..end].iter().collect();
            let is_final = index + 1 == total;
            if text.trim().len() < self.params.min_chunk_size && !is_final {
                continue;
            }
            let start_line = 1 + chars[..start].iter().filter(|c| **c == '\n').count();
            let end_line = 1 + chars[..end].iter().filter(|c| **c == '\n').count().max(start_line - 1);
            chunks.push(CodeChunk::new(
                file_path.to_string(),
                start_line,
                end_line.max(start_line),
                NodeType::SlidingWindow,
                None,
                None,
                text,
                ChunkMetadata::default(),
            ));
        }
        Ok(chunks)
    }
}

/// Returns `(start, end)` char-index windows. Each window ends at a line
/// boundary at or after `max_chunk_size` characters past its start; the
/// next window starts at `end - overlap`, forced forward by one full window
/// when that would not advance, guaranteeing termination (spec §4.5).
fn compute_windows(chars: &[char], params: SlidingWindowParams) -> Vec<(usize, usize)> {
    let total = chars.len();
    let mut windows = Vec::new();
    let mut start = 0usize;

    while start < total {
        let target_end = (start + params.max_chunk_size).min(total);
        let end = if target_end >= total {
            total
        } else {
            match chars[target_end..].iter().position(|c| *c == '\n') {
                Some(rel) => target_end + rel + 1,
                None => total,
            }
        };
        windows.push((start, end));
        if end >= total {
            break;
        }
        let candidate = end.saturating_sub(params.overlap);
        start = if candidate <= start {
            start + params.max_chunk_size
        } else {
            candidate
        };
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminates_and_covers_whole_input() {
        let content = "x".repeat(10_000);
        let params = SlidingWindowParams {
            max_chunk_size: 500,
            overlap: 50,
            min_chunk_size: 10,
        };
        let windows = compute_windows(&content.chars().collect::<Vec<_>>(), params);
        assert!(!windows.is_empty());
        assert_eq!(windows.last().unwrap().1, 10_000);
    }

    #[test]
    fn forces_advance_when_overlap_would_stall() {
        // overlap >= max_chunk_size would stall without the force-advance guarantee.
        let content = "line\n".repeat(1000);
        let chars: Vec<char> = content.chars().collect();
        let params = SlidingWindowParams {
            max_chunk_size: 20,
            overlap: 1000,
            min_chunk_size: 1,
        };
        let windows = compute_windows(&chars, params);
        // Must terminate in a bounded number of steps despite overlap > max_chunk_size.
        assert!(windows.len() < chars.len());
        assert_eq!(windows.last().unwrap().1, chars.len());
    }

    #[test]
    fn short_non_final_chunks_are_dropped() {
        let strategy = SlidingWindowStrategy::new(SlidingWindowParams {
            max_chunk_size: 10,
            overlap: 0,
            min_chunk_size: 8,
        });
        let content = "a\nbb\nccccccccc\n";
        let chunks = strategy.chunk("f.txt", content).unwrap();
        assert!(chunks.iter().all(|c| c.text.trim().len() >= 8 || c.end_line == chunks.last().unwrap().end_line));
    }
}
