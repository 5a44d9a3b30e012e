use super::ChunkStrategy;
use crate::chunk::{ChunkMetadata, CodeChunk, NodeType};
use crate::error::{ChunkerError, Result};
use serde_json::Value;

const MIN_SERIALIZED_LEN: usize = 50;

/// Walks a leniently-parsed JSON document, emitting a chunk for every
/// nested object or array whose serialised length exceeds 50 characters
/// (spec §4.5).
pub struct JsonObjectStrategy;

impl ChunkStrategy for JsonObjectStrategy {
    fn chunk(&self, file_path: &str, content: &str) -> Result<Vec<CodeChunk>> {
        let cleaned = strip_comments_and_trailing_commas(content);
        let value: Value = serde_json::from_str(&cleaned).map_err(|err| ChunkerError::ParseFailure {
            path: file_path.to_string(),
            reason: err.to_string(),
        })?;

        let mut chunks = Vec::new();
        walk(&value, "$", None, file_path, &mut chunks);
        Ok(chunks)
    }
}

fn walk(value: &Value, path: &str, parent_path: Option<&str>, file_path: &str, out: &mut Vec<CodeChunk>) {
    match value {
        Value::Object(map) => {
            emit_if_large(value, path, parent_path, NodeType::JsonObject, file_path, out);
            for (key, child) in map {
                let child_path = format!("{path}.{key}");
                walk(child, &child_path, Some(path), file_path, out);
            }
        }
        Value::Array(items) => {
            emit_if_large(value, path, parent_path, NodeType::JsonArrayItem, file_path, out);
            for (index, item) in items.iter().enumerate() {
                let child_path = format!("{path}[{index}]");
                walk(item, &child_path, Some(path), file_path, out);
            }
        }
        _ => {}
    }
}

fn emit_if_large(
    value: &Value,
    path: &str,
    parent_path: Option<&str>,
    node_type: NodeType,
    file_path: &str,
    out: &mut Vec<CodeChunk>,
) {
    let serialized = serde_json::to_string(value).unwrap_or_default();
    if serialized.len() <= MIN_SERIALIZED_LEN {
        return;
    }
    let pretty = serde_json::to_string_pretty(value).unwrap_or(serialized);
    let end_line = pretty.lines().count().max(1);
    let mut metadata = ChunkMetadata {
        json_path: Some(path.to_string()),
        parent_path: parent_path.map(str::to_string),
        ..Default::default()
    };
    metadata
        .extra
        .insert("serialized_length".to_string(), pretty.len().to_string());
    out.push(CodeChunk::new(
        file_path.to_string(),
        1,
        end_line,
        node_type,
        Some(path.to_string()),
        Some("json".to_string()),
        pretty,
        metadata,
    ));
}

/// Strip `//` and `/* */` comments and trailing commas before `}`/`]`, so
/// common "JSON with comments" config files parse (spec §4.5 "lenient").
/// Operates outside string literals to avoid corrupting string content.
fn strip_comments_and_trailing_commas(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let bytes = content.as_bytes();
    let mut i = 0;
    let mut in_string = false;
    let mut escaped = false;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            '/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            '/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
            }
            ',' => {
                let mut j = i + 1;
                while j < bytes.len() && (bytes[j] as char).is_whitespace() {
                    j += 1;
                }
                if j < bytes.len() && (bytes[j] == b'}' || bytes[j] == b']') {
                    // drop the trailing comma
                } else {
                    out.push(c);
                }
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}
