//! Embedding text preprocessor (spec §4.12 step 1): lowercase, strip
//! comments/docstrings, collapse whitespace. Shared identically by document
//! and query embedding so both sides of a vector-search comparison are built
//! from the same representation (spec §4.9: "Text is first passed through
//! the preprocessor... so document and query embeddings share the same
//! representation").
//!
//! Ported from the behaviour of `utils/text_preprocessing.py`'s
//! `preprocess_text`, minus its unused stopword-removal path (never called
//! with `remove_stopwords_flag=True` anywhere in the original indexing or
//! query path).

use once_cell::sync::Lazy;
use regex::Regex;

static TRIPLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:"""[\s\S]*?"""|'''[\s\S]*?''')"#).unwrap());
static PYTHON_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"#.*").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*[\s\S]*?\*/").unwrap());
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//.*").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase, strip `"""…"""`/`'''…'''`, `#…`, `/*…*/`, `//…`, then collapse
/// runs of whitespace to a single space and trim. Markdown and code text
/// otherwise pass through untouched (spec §4.12 step 1).
pub fn preprocess(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_docstrings = TRIPLE_QUOTED.replace_all(&lowered, "");
    let no_py_comments = PYTHON_COMMENT.replace_all(&no_docstrings, "");
    let no_block_comments = BLOCK_COMMENT.replace_all(&no_py_comments, "");
    let no_line_comments = LINE_COMMENT.replace_all(&no_block_comments, "");
    WHITESPACE.replace_all(&no_line_comments, " ").trim().to_string()
}
