use super::ChunkStrategy;
use crate::chunk::{ChunkMetadata, CodeChunk, NodeType};
use crate::error::Result;

/// Splits on ATX headers (`#…` followed by a space); a file without headers
/// yields a single `markdown_document` chunk (spec §4.5).
pub struct MarkdownSectionStrategy;

impl ChunkStrategy for MarkdownSectionStrategy {
    fn chunk(&self, file_path: &str, content: &str) -> Result<Vec<CodeChunk>> {
        let lines: Vec<&str> = content.lines().collect();
        let header_indices: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| is_atx_header(line))
            .map(|(i, _)| i)
            .collect();

        if header_indices.is_empty() {
            if content.trim().is_empty() {
                return Ok(Vec::new());
            }
            return Ok(vec![CodeChunk::new(
                file_path.to_string(),
                1,
                lines.len().max(1),
                NodeType::MarkdownDocument,
                None,
                Some("markdown".to_string()),
                content.to_string(),
                ChunkMetadata::default(),
            )]);
        }

        let mut chunks = Vec::new();
        for (pos, &start) in header_indices.iter().enumerate() {
            let end = header_indices.get(pos + 1).copied().unwrap_or(lines.len());
            let section_lines = &lines[start..end];
            let text = section_lines.join("\n");
            let (level, title) = parse_header(section_lines[0]);
            let mut metadata = ChunkMetadata {
                header_level: Some(level),
                ..Default::default()
            };
            metadata.extra.insert("title".to_string(), title.clone());
            chunks.push(CodeChunk::new(
                file_path.to_string(),
                start + 1,
                end,
                NodeType::MarkdownSection,
                Some(title),
                Some("markdown".to_string()),
                text,
                metadata,
            ));
        }
        Ok(chunks)
    }
}

fn is_atx_header(line: &str) -> bool {
    let trimmed = line.trim_start();
    let hashes: usize = trimmed.chars().take_while(|c| *c == '#').count();
    hashes > 0 && hashes <= 6 && trimmed.as_bytes().get(hashes).is_some_and(u8::is_ascii_whitespace)
}

fn parse_header(line: &str) -> (u32, String) {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count() as u32;
    let title = trimmed.trim_start_matches('#').trim().to_string();
    (level, title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_headers() {
        let content = "# Title\nintro\n## Section A\nbody a\n## Section B\nbody b\n";
        let chunks = MarkdownSectionStrategy.chunk("f.md", content).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].name.as_deref(), Some("Section A"));
        assert_eq!(chunks[1].metadata.header_level, Some(2));
    }

    #[test]
    fn no_headers_yields_single_document_chunk() {
        let content = "just some text\nmore text\n";
        let chunks = MarkdownSectionStrategy.chunk("f.md", content).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].node_type.as_str(), "markdown_document");
    }

    #[test]
    fn hash_without_space_is_not_a_header() {
        assert!(!is_atx_header("#tag"));
        assert!(is_atx_header("# Title"));
    }
}
