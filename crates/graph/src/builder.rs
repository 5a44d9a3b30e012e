//! Relationship Extractor (C6): per-language traversal of the parse tree
//! producing typed `{target, type}` records (spec §4.6). Extraction never
//! resolves targets to graph-node ids — that happens lazily on read
//! (`GraphStore::resolve_node`).

use codecortex_chunker::{CodeChunk, GrammarRegistry, Language, Relationship};
use tree_sitter::Node;

pub struct RelationshipExtractor {
    registry: GrammarRegistry,
}

impl Default for RelationshipExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipExtractor {
    pub fn new() -> Self {
        Self {
            registry: GrammarRegistry::new(),
        }
    }

    /// Returns an empty vec, never an error, when the parse tree is
    /// unavailable for `language` (spec §4.6: "the chunker must not fail").
    pub fn extract(&self, language: Language, content: &str) -> Vec<Relationship> {
        let Ok(mut parser) = self.registry.load(language) else {
            return Vec::new();
        };
        let Some(tree) = parser.parse(content, None) else {
            return Vec::new();
        };
        let root = tree.root_node();
        match language {
            Language::Python => extract_python(root, content),
            Language::JavaScript | Language::TypeScript | Language::Tsx => extract_js(root, content),
            Language::Rust => extract_rust(root, content),
            _ => Vec::new(),
        }
    }
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

fn extract_python(root: Node, source: &str) -> Vec<Relationship> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => {
                out.push(Relationship {
                    target: node_text(node, source).trim().to_string(),
                    relation_type: "import".to_string(),
                });
                continue;
            }
            "import_from_statement" => {
                out.extend(python_from_import(node, source));
                continue;
            }
            "class_definition" => {
                out.extend(python_superclasses(node, source));
            }
            _ => {}
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    out
}

/// `from a import b, c as d` -> `[{target:"a.b", ...}, {target:"a.c", ...}]`
/// (spec §8 scenario 2).
fn python_from_import(node: Node, source: &str) -> Vec<Relationship> {
    let Some(module) = node.child_by_field_name("module_name") else {
        return Vec::new();
    };
    let module_text = node_text(module, source);
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" if child.id() != module.id() => {
                out.push(Relationship {
                    target: format!("{module_text}.{}", node_text(child, source)),
                    relation_type: "import".to_string(),
                });
            }
            "aliased_import" => {
                if let Some(name) = child.child_by_field_name("name") {
                    out.push(Relationship {
                        target: format!("{module_text}.{}", node_text(name, source)),
                        relation_type: "import".to_string(),
                    });
                }
            }
            _ => {}
        }
    }
    out
}

fn python_superclasses(node: Node, source: &str) -> Vec<Relationship> {
    let Some(bases) = node.child_by_field_name("superclasses") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = bases.walk();
    for child in bases.children(&mut cursor) {
        if matches!(child.kind(), "identifier" | "attribute") {
            out.push(Relationship {
                target: node_text(child, source).to_string(),
                relation_type: "inherits".to_string(),
            });
        }
    }
    out
}

fn extract_js(root: Node, source: &str) -> Vec<Relationship> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => {
                out.push(Relationship {
                    target: node_text(node, source).trim().to_string(),
                    relation_type: "import".to_string(),
                });
                continue;
            }
            "class_declaration" | "class" => {
                if let Some(heritage) = find_descendant(node, "class_heritage") {
                    if let Some(superclass) = find_descendant(heritage, "identifier") {
                        out.push(Relationship {
                            target: node_text(superclass, source).to_string(),
                            relation_type: "inherits".to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    out
}

fn find_descendant<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == kind {
            return Some(current);
        }
        let mut cursor = current.walk();
        for child in current.children(&mut cursor) {
            stack.push(child);
        }
    }
    None
}

fn extract_rust(root: Node, source: &str) -> Vec<Relationship> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "use_declaration" {
            out.push(Relationship {
                target: node_text(node, source).trim().to_string(),
                relation_type: "import".to_string(),
            });
            continue;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    out
}

/// Turn a chunk and its already-extracted relationships (`chunk.metadata
/// .references`, populated by the caller from `RelationshipExtractor`) into
/// the `GraphNode`/`GraphEdge` pair the store expects. Edge targets are
/// carried verbatim as `target_id`; resolution to a real node or a
/// synthetic `external` one happens on read (spec Data Model §3).
pub fn node_and_edges_for_chunk(chunk: &CodeChunk) -> (crate::types::GraphNode, Vec<crate::types::GraphEdge>) {
    let node = crate::types::GraphNode::from_chunk(chunk);
    let edges = chunk
        .metadata
        .references
        .iter()
        .map(|rel| crate::types::GraphEdge {
            source_id: chunk.id.clone(),
            target_id: rel.target.clone(),
            relation_type: rel.relation_type.clone(),
            metadata: serde_json::json!({}),
        })
        .collect();
    (node, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_plain_and_from_imports() {
        let extractor = RelationshipExtractor::new();
        let rels = extractor.extract(Language::Python, "import os\nfrom a import b\n");
        assert!(rels.contains(&Relationship {
            target: "import os".to_string(),
            relation_type: "import".to_string(),
        }));
        assert!(rels.contains(&Relationship {
            target: "a.b".to_string(),
            relation_type: "import".to_string(),
        }));
    }

    #[test]
    fn python_class_inheritance() {
        let extractor = RelationshipExtractor::new();
        let rels = extractor.extract(Language::Python, "class Foo(Base):\n    pass\n");
        assert!(rels.contains(&Relationship {
            target: "Base".to_string(),
            relation_type: "inherits".to_string(),
        }));
    }

    #[test]
    fn unavailable_grammar_yields_empty_not_error() {
        let extractor = RelationshipExtractor::new();
        let rels = extractor.extract(Language::Java, "class Foo extends Bar {}");
        assert!(rels.is_empty());
    }

    #[test]
    fn rust_use_declarations() {
        let extractor = RelationshipExtractor::new();
        let rels = extractor.extract(Language::Rust, "use std::fmt;\nfn main() {}\n");
        assert_eq!(
            rels,
            vec![Relationship {
                target: "use std::fmt;".to_string(),
                relation_type: "import".to_string(),
            }]
        );
    }
}
