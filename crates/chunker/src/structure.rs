//! Parser & Structure Extractor (C4): builds a tree of `CodeStructure`
//! nodes from a concrete parse tree, purely read-only.

use crate::chunk::NodeType;
use crate::language::Language;
use tree_sitter::Node;

/// Node types that introduce an import/include/use edge across every
/// language this extractor has a grammar for (spec §4.4).
const IMPORT_NODE_KINDS: &[&str] = &[
    "import_statement",
    "import_from_statement",
    "import_declaration",
    "use_declaration",
    "preproc_include",
    "namespace_use_declaration",
    "import_header",
    "import_spec",
    "source_command",
    "library_call",
    "using_directive",
];

#[derive(Debug, Clone, Default)]
pub struct CodeStructure {
    pub node_type: NodeType,
    pub name: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub docstring: Option<String>,
    pub imports: Vec<String>,
    pub children: Vec<CodeStructure>,
}

impl CodeStructure {
    fn leaf(node_type: NodeType, name: Option<String>, start_line: usize, end_line: usize) -> Self {
        Self {
            node_type,
            name,
            start_line,
            end_line,
            docstring: None,
            imports: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Depth-first flattening of this tree into a `Vec`, parent before
    /// children, matching the order chunks should be emitted in (C5 AST
    /// strategy emits one chunk per node).
    pub fn flatten(&self) -> Vec<&CodeStructure> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }
}

fn line_range(node: Node) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

fn find_child_by_field<'a>(node: Node<'a>, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}

/// Extract the full `CodeStructure` tree for languages with structure rules
/// (Python, JS/TS/TSX/JSX). Other languages only get import scanning; the
/// caller falls back to sliding-window chunking for their bodies.
pub fn extract_structure(language: Language, source: &str, tree: &tree_sitter::Tree) -> CodeStructure {
    let root = tree.root_node();
    let (start, end) = line_range(root);
    let mut module = CodeStructure::leaf(NodeType::Module, None, start, end);
    module.imports = scan_imports(root, source);

    if language.has_structure_rules() {
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if let Some(structure) = extract_top_level(language, child, source) {
                module.children.push(structure);
            }
        }
    }

    module
}

fn extract_top_level(language: Language, node: Node, source: &str) -> Option<CodeStructure> {
    match language {
        Language::Python => extract_python_top_level(node, source),
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            extract_js_top_level(node, source)
        }
        _ => None,
    }
}

fn extract_python_top_level(node: Node, source: &str) -> Option<CodeStructure> {
    match node.kind() {
        "class_definition" => {
            let name = find_child_by_field(node, "name").map(|n| node_text(n, source).to_string());
            let (start, end) = line_range(node);
            let mut class = CodeStructure::leaf(NodeType::Class, name, start, end);
            class.docstring = python_docstring(node, source);
            if let Some(body) = find_child_by_field(node, "body") {
                let mut cursor = body.walk();
                for member in body.children(&mut cursor) {
                    if member.kind() == "function_definition" {
                        class.children.push(python_method(member, source));
                    }
                }
            }
            Some(class)
        }
        "function_definition" => Some(python_function(node, source)),
        _ => None,
    }
}

fn python_function(node: Node, source: &str) -> CodeStructure {
    let name = find_child_by_field(node, "name").map(|n| node_text(n, source).to_string());
    let (start, end) = line_range(node);
    let mut func = CodeStructure::leaf(NodeType::Function, name, start, end);
    func.docstring = python_docstring(node, source);
    func
}

fn python_method(node: Node, source: &str) -> CodeStructure {
    let name = find_child_by_field(node, "name").map(|n| node_text(n, source).to_string());
    let (start, end) = line_range(node);
    let mut method = CodeStructure::leaf(NodeType::Method, name, start, end);
    method.docstring = python_docstring(node, source);
    method
}

/// First string-only expression statement in the body, quotes stripped.
fn python_docstring(node: Node, source: &str) -> Option<String> {
    let body = find_child_by_field(node, "body")?;
    let mut cursor = body.walk();
    for stmt in body.children(&mut cursor) {
        if stmt.kind() == "expression_statement" {
            let mut inner = stmt.walk();
            let children: Vec<Node> = stmt.children(&mut inner).collect();
            if children.len() == 1 && children[0].kind() == "string" {
                let text = node_text(children[0], source);
                return Some(strip_string_quotes(text));
            }
            return None;
        }
    }
    None
}

fn strip_string_quotes(text: &str) -> String {
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(stripped) = text.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return stripped.trim().to_string();
        }
    }
    text.trim().to_string()
}

fn extract_js_top_level(node: Node, source: &str) -> Option<CodeStructure> {
    match node.kind() {
        "class_declaration" => {
            let name = find_child_by_field(node, "name").map(|n| node_text(n, source).to_string());
            let (start, end) = line_range(node);
            let mut class = CodeStructure::leaf(NodeType::Class, name, start, end);
            if let Some(body) = find_child_by_field(node, "body") {
                let mut cursor = body.walk();
                for member in body.children(&mut cursor) {
                    if member.kind() == "method_definition" {
                        let mname =
                            find_child_by_field(member, "name").map(|n| node_text(n, source).to_string());
                        let (mstart, mend) = line_range(member);
                        class
                            .children
                            .push(CodeStructure::leaf(NodeType::Method, mname, mstart, mend));
                    }
                }
            }
            Some(class)
        }
        "function_declaration" | "generator_function_declaration" => {
            let name = find_child_by_field(node, "name").map(|n| node_text(n, source).to_string());
            let (start, end) = line_range(node);
            Some(CodeStructure::leaf(NodeType::Function, name, start, end))
        }
        _ => None,
    }
}

/// Scan the whole tree (not just top level) for import-shaped node kinds,
/// per spec §4.4: "imports are extracted by scanning for language-specific
/// import node types", independent of structure-rule support.
pub fn scan_imports(root: Node, source: &str) -> Vec<String> {
    let mut imports = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if IMPORT_NODE_KINDS.contains(&node.kind()) {
            imports.push(node_text(node, source).trim().to_string());
            continue; // do not descend into an import node's internals
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::GrammarRegistry;

    fn parse(language: Language, source: &str) -> tree_sitter::Tree {
        let registry = GrammarRegistry::new();
        let mut parser = registry.load(language).unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn python_class_with_two_methods() {
        let source = "class Foo:\n    def bar(self): pass\n    def baz(self): pass\n";
        let tree = parse(Language::Python, source);
        let module = extract_structure(Language::Python, source, &tree);
        assert_eq!(module.node_type, NodeType::Module);
        assert_eq!(module.children.len(), 1);
        let class = &module.children[0];
        assert_eq!(class.node_type, NodeType::Class);
        assert_eq!(class.name.as_deref(), Some("Foo"));
        assert_eq!(class.children.len(), 2);
        assert!(class.children.iter().all(|m| m.node_type == NodeType::Method));

        let flat = module.flatten();
        assert_eq!(flat.len(), 4);
    }

    #[test]
    fn python_module_docstring_and_imports() {
        let source = "import os\nfrom a import b\n\ndef f():\n    \"\"\"doc\"\"\"\n    pass\n";
        let tree = parse(Language::Python, source);
        let module = extract_structure(Language::Python, source, &tree);
        assert_eq!(module.imports, vec!["import os", "from a import b"]);
        assert_eq!(module.children[0].docstring.as_deref(), Some("doc"));
    }

    #[test]
    fn js_class_and_function_declarations() {
        let source = "class Foo {\n  bar() {}\n}\nfunction baz() {}\n";
        let tree = parse(Language::JavaScript, source);
        let module = extract_structure(Language::JavaScript, source, &tree);
        assert_eq!(module.children.len(), 2);
        assert_eq!(module.children[0].node_type, NodeType::Class);
        assert_eq!(module.children[0].children[0].node_type, NodeType::Method);
        assert_eq!(module.children[1].node_type, NodeType::Function);
    }

    #[test]
    fn languages_without_structure_rules_only_scan_imports() {
        let source = "use std::fmt;\nfn main() {}\n";
        let tree = parse(Language::Rust, source);
        let module = extract_structure(Language::Rust, source, &tree);
        assert!(module.children.is_empty());
        assert_eq!(module.imports, vec!["use std::fmt;"]);
    }
}
