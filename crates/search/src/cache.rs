//! Per-project LRU query cache (spec §4.12: "An LRU cache of size
//! `cache_size` keys on `(query_text, n_results, min_score, filters)`.
//! Cache is invalidated on demand (`clear_cache`) and is per-project.").

use codecortex_vector_store::Where;
use lru::LruCache;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QueryKey {
    query_text: String,
    n_results: usize,
    min_score_bits: u32,
    filters: Where,
}

impl QueryKey {
    fn new(query_text: &str, n_results: usize, min_score: f32, filters: &Where) -> Self {
        Self {
            query_text: query_text.to_string(),
            n_results,
            min_score_bits: min_score.to_bits(),
            filters: filters.clone(),
        }
    }
}

pub struct QueryCache<V: Clone> {
    cache: LruCache<QueryKey, V>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size.max(1)).expect("clamped to at least 1");
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, query_text: &str, n_results: usize, min_score: f32, filters: &Where) -> Option<V> {
        let key = QueryKey::new(query_text, n_results, min_score, filters);
        self.cache.get(&key).cloned()
    }

    pub fn put(&mut self, query_text: &str, n_results: usize, min_score: f32, filters: &Where, value: V) {
        let key = QueryKey::new(query_text, n_results, min_score, filters);
        self.cache.put(key, value);
    }

    /// spec §4.12: "Cache is invalidated on demand (`clear_cache`)".
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_on_identical_key() {
        let mut cache: QueryCache<String> = QueryCache::new(10);
        let filters = Where::new();
        cache.put("find foo", 5, 0.2, &filters, "cached".to_string());
        assert_eq!(cache.get("find foo", 5, 0.2, &filters), Some("cached".to_string()));
    }

    #[test]
    fn misses_on_different_n_results() {
        let mut cache: QueryCache<String> = QueryCache::new(10);
        let filters = Where::new();
        cache.put("find foo", 5, 0.2, &filters, "cached".to_string());
        assert_eq!(cache.get("find foo", 6, 0.2, &filters), None);
    }

    #[test]
    fn clear_cache_evicts_everything() {
        let mut cache: QueryCache<String> = QueryCache::new(10);
        let filters = Where::new();
        cache.put("find foo", 5, 0.2, &filters, "cached".to_string());
        cache.clear_cache();
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_least_recently_used_past_capacity() {
        let mut cache: QueryCache<String> = QueryCache::new(1);
        let filters = Where::new();
        cache.put("a", 5, 0.2, &filters, "a-result".to_string());
        cache.put("b", 5, 0.2, &filters, "b-result".to_string());
        assert_eq!(cache.get("a", 5, 0.2, &filters), None);
        assert_eq!(cache.get("b", 5, 0.2, &filters), Some("b-result".to_string()));
    }
}
