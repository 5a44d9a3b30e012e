use super::ChunkStrategy;
use crate::chunk::{ChunkMetadata, CodeChunk, NodeType};
use crate::error::Result;

/// Splits on lines equal to `---`; empty documents are skipped (spec §4.5).
pub struct YamlDocumentStrategy;

impl ChunkStrategy for YamlDocumentStrategy {
    fn chunk(&self, file_path: &str, content: &str) -> Result<Vec<CodeChunk>> {
        let lines: Vec<&str> = content.lines().collect();
        let mut chunks = Vec::new();
        let mut doc_start = 0usize;

        let mut boundaries: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.trim_end() == "---")
            .map(|(i, _)| i)
            .collect();
        boundaries.push(lines.len());

        for boundary in boundaries {
            let doc_lines = &lines[doc_start..boundary];
            let text = doc_lines.join("\n");
            if !text.trim().is_empty() {
                chunks.push(CodeChunk::new(
                    file_path.to_string(),
                    doc_start + 1,
                    boundary.max(doc_start + 1),
                    NodeType::YamlDocument,
                    None,
                    Some("yaml".to_string()),
                    text,
                    ChunkMetadata::default(),
                ));
            }
            doc_start = boundary + 1;
        }

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_multi_document_file() {
        let content = "a: 1\n---\nb: 2\n---\nc: 3\n";
        let chunks = YamlDocumentStrategy.chunk("f.yaml", content).unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].text.contains("a: 1"));
        assert!(chunks[2].text.contains("c: 3"));
    }

    #[test]
    fn skips_empty_documents() {
        let content = "a: 1\n---\n---\nb: 2\n";
        let chunks = YamlDocumentStrategy.chunk("f.yaml", content).unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn single_document_without_separator() {
        let content = "a: 1\nb: 2\n";
        let chunks = YamlDocumentStrategy.chunk("f.yaml", content).unwrap();
        assert_eq!(chunks.len(), 1);
    }
}
