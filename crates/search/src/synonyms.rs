//! Synonym expansion (spec §4.12 step 2, §9): an orthogonal capability
//! exposed for diversifying textual forms in logging/debugging. The
//! embedding itself is always taken from the preprocessed original query,
//! never from an expanded form (spec §9 "open question").

use std::collections::HashMap;
use std::sync::OnceLock;

type Dict = HashMap<&'static str, &'static [&'static str]>;

fn dictionary() -> &'static Dict {
    static DICT: OnceLock<Dict> = OnceLock::new();
    DICT.get_or_init(|| {
        let mut d: Dict = HashMap::new();
        d.insert("function", &["method", "routine", "procedure", "lambda", "callback", "subroutine"]);
        d.insert("functions", &["methods", "routines", "procedures", "lambdas", "callbacks"]);
        d.insert("method", &["function", "routine", "procedure"]);
        d.insert("class", &["type", "object", "struct", "record"]);
        d.insert("classes", &["types", "objects", "structs", "records"]);
        d.insert("struct", &["structure", "record", "object"]);
        d.insert("interface", &["protocol", "contract", "trait", "api"]);
        d.insert("trait", &["interface", "mixin"]);
        d.insert("module", &["package", "namespace", "library", "crate"]);
        d.insert("package", &["module", "library", "namespace", "crate"]);
        d.insert("variable", &["parameter", "argument", "field", "property", "attribute"]);
        d.insert("variables", &["parameters", "arguments", "fields", "properties"]);
        d.insert("parameter", &["argument", "variable", "input"]);
        d.insert("argument", &["parameter", "variable", "input"]);
        d.insert("field", &["property", "attribute", "member"]);
        d.insert("property", &["field", "attribute", "member"]);
        d.insert("constant", &["const", "final", "static", "literal"]);
        d.insert("loop", &["iteration", "for", "while", "repeat"]);
        d.insert("array", &["list", "vector", "sequence", "slice"]);
        d.insert("list", &["array", "vector", "sequence"]);
        d.insert("map", &["dictionary", "hash", "table"]);
        d.insert("dictionary", &["map", "hash", "table", "dict"]);
        d.insert("string", &["text", "char array", "str"]);
        d.insert("integer", &["int", "number", "whole number"]);
        d.insert("boolean", &["bool", "flag"]);
        d.insert("null", &["none", "nil", "undefined", "void"]);
        d.insert("error", &["exception", "failure", "fault"]);
        d.insert("exception", &["error", "failure", "fault"]);
        d.insert("test", &["spec", "assertion", "unit test"]);
        d.insert("component", &["element", "widget", "module"]);
        d.insert("event", &["signal", "trigger", "callback"]);
        d.insert("handler", &["listener", "callback"]);
        d.insert("listener", &["handler", "callback"]);
        d.insert("config", &["configuration", "settings", "options"]);
        d.insert("configuration", &["config", "settings", "options"]);
        d.insert("api", &["endpoint", "service", "interface"]);
        d.insert("endpoint", &["api", "route", "url"]);
        d.insert("route", &["endpoint", "path", "url"]);
        d.insert("request", &["call", "invocation", "query"]);
        d.insert("response", &["result", "reply", "output"]);
        d.insert("server", &["backend", "service", "host"]);
        d.insert("client", &["frontend", "consumer", "caller"]);
        d.insert("database", &["db", "store", "datastore"]);
        d.insert("table", &["relation", "dataset"]);
        d.insert("query", &["search", "request", "lookup"]);
        d.insert("cache", &["buffer", "memo"]);
        d.insert("thread", &["worker", "process"]);
        d.insert("worker", &["thread", "process", "job"]);
        d.insert("queue", &["buffer", "channel"]);
        d.insert("lock", &["mutex", "semaphore"]);
        d.insert("parser", &["analyzer", "reader"]);
        d.insert("token", &["symbol", "lexeme"]);
        d.insert("graph", &["tree", "network"]);
        d.insert("node", &["vertex", "element"]);
        d.insert("edge", &["link", "connection"]);
        d.insert("vector", &["embedding", "array"]);
        d.insert("embedding", &["vector", "representation"]);
        d.insert("chunk", &["segment", "block", "section"]);
        d.insert("index", &["key", "pointer", "idx"]);
        d.insert("file", &["document", "script", "resource"]);
        d.insert("import", &["require", "include", "use"]);
        d.insert("constructor", &["initializer", "ctor", "init"]);
        d
    })
}

/// Tokenises on whitespace and returns, for each token, `{original} ∪
/// synonyms` in insertion order with the original first.
fn token_options(token: &str) -> Vec<&str> {
    let mut options = vec![token];
    if let Some(synonyms) = dictionary().get(token) {
        for synonym in *synonyms {
            if !options.contains(synonym) {
                options.push(synonym);
            }
        }
    }
    options
}

/// Cartesian product of per-token synonym options, each flattened to a
/// lowercased single-space-normalised string, duplicates removed (spec
/// §4.12 step 2, §8 "synonym expansion of a query with `t` tokens each
/// having `s_i` options returns exactly `∏ s_i` unique normalised strings").
pub fn expand(preprocessed_query: &str) -> Vec<String> {
    let tokens: Vec<&str> = preprocessed_query.split_whitespace().collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut combinations: Vec<Vec<&str>> = vec![Vec::new()];
    for token in &tokens {
        let options = token_options(token);
        let mut next = Vec::with_capacity(combinations.len() * options.len());
        for combo in &combinations {
            for option in &options {
                let mut extended = combo.clone();
                extended.push(*option);
                next.push(extended);
            }
        }
        combinations = next;
    }

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for combo in combinations {
        let joined = combo.join(" ");
        if seen.insert(joined.clone()) {
            out.push(joined);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_single_token_with_synonyms() {
        let expanded = expand("function");
        assert!(expanded.contains(&"function".to_string()));
        assert!(expanded.contains(&"method".to_string()));
    }

    #[test]
    fn product_size_matches_per_token_option_counts() {
        let expanded = expand("class method");
        let class_options = token_options("class").len();
        let method_options = token_options("method").len();
        assert_eq!(expanded.len(), class_options * method_options);
    }

    #[test]
    fn unknown_tokens_pass_through_unexpanded() {
        let expanded = expand("frobnicate");
        assert_eq!(expanded, vec!["frobnicate".to_string()]);
    }

    #[test]
    fn empty_query_expands_to_nothing() {
        assert!(expand("").is_empty());
    }
}
