//! Query Engine (C12, spec §4.12): preprocess, expand, embed, vector
//! search, graph-enrich, cache, and assemble context for one user query.

mod cache;
mod context;
mod engine;
mod error;
mod related_files;
mod synonyms;

pub use cache::QueryCache;
pub use context::{assemble_context, SearchResult};
pub use engine::{QueryEngine, QueryRequest, QueryResponse};
pub use error::{Result, SearchError};
pub use related_files::find_related_files;
pub use synonyms::expand as expand_query;
