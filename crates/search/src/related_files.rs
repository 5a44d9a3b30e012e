//! "Related files" heuristic (spec §4.12 step 5, §9): full-text containment
//! search over free-form reference strings. A heuristic hint, not a
//! correctness-critical path — prefer graph enrichment for exact neighbours.

use codecortex_vector_store::VectorStore;
use std::collections::HashSet;

/// For each of `references`, scans every chunk in `collection` for text
/// containing that reference string and collects distinct file paths,
/// excluding `origin_file_path`.
pub fn find_related_files(
    store: &VectorStore,
    collection: &str,
    references: &[String],
    origin_file_path: &str,
) -> codecortex_vector_store::Result<Vec<String>> {
    if references.is_empty() {
        return Ok(Vec::new());
    }

    let all = store.get(collection, None, None, 0)?;
    let mut seen = HashSet::new();
    let mut related = Vec::new();

    for (doc, metadata) in all.docs.iter().zip(all.metadatas.iter()) {
        let Some(file_path) = metadata.get("file_path") else {
            continue;
        };
        if file_path == origin_file_path || seen.contains(file_path) {
            continue;
        }
        if references.iter().any(|reference| !reference.is_empty() && doc.contains(reference.as_str())) {
            seen.insert(file_path.clone());
            related.push(file_path.clone());
        }
    }

    Ok(related)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn metadata(file_path: &str) -> BTreeMap<String, String> {
        let mut m = BTreeMap::new();
        m.insert("file_path".to_string(), file_path.to_string());
        m
    }

    #[test]
    fn finds_files_whose_text_contains_the_reference() {
        let mut store = VectorStore::open_in_memory();
        store
            .upsert(
                "chunks",
                &["a".to_string(), "b".to_string()],
                &["import os\ndef f(): pass".to_string(), "print('unrelated')".to_string()],
                &[metadata("a.py"), metadata("b.py")],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .unwrap();

        let related = find_related_files(&store, "chunks", &["import os".to_string()], "origin.py").unwrap();
        assert_eq!(related, vec!["a.py".to_string()]);
    }

    #[test]
    fn excludes_the_origin_file() {
        let mut store = VectorStore::open_in_memory();
        store
            .upsert(
                "chunks",
                &["a".to_string()],
                &["import os".to_string()],
                &[metadata("a.py")],
                &[vec![1.0, 0.0]],
            )
            .unwrap();

        let related = find_related_files(&store, "chunks", &["import os".to_string()], "a.py").unwrap();
        assert!(related.is_empty());
    }

    #[test]
    fn empty_references_short_circuits() {
        let store = VectorStore::open_in_memory();
        let related = find_related_files(&store, "chunks", &[], "a.py").unwrap();
        assert!(related.is_empty());
    }
}
