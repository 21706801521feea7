use std::sync::Arc;

use moka::sync::Cache;

use crate::error::GrammarResult;
use crate::manifest::{ExtensionType, Grammar};

/// Cached load outcome: `None` records that no grammar exists for the type
pub type CachedGrammar = Option<Arc<Grammar>>;

/// In-memory cache of parsed grammar documents, one entry per extension type
///
/// Backed by `moka`, so concurrent checks asking for the same type wait for
/// a single load instead of each parsing the document. Failed loads are not
/// cached and are retried on the next request.
pub struct GrammarCache {
    cache: Cache<ExtensionType, CachedGrammar>,
}

impl GrammarCache {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();

        Self { cache }
    }

    /// Get a grammar from the cache, or load it if missing.
    ///
    /// The `loader` closure only runs if the key is missing.
    pub fn get_or_load<F>(&self, key: ExtensionType, loader: F) -> GrammarResult<CachedGrammar>
    where
        F: FnOnce() -> GrammarResult<CachedGrammar>,
    {
        self.cache
            .try_get_with(key, loader)
            .map_err(|e| (*e).clone())
    }

    pub fn get(&self, key: &ExtensionType) -> Option<CachedGrammar> {
        self.cache.get(key)
    }

    pub fn contains(&self, key: &ExtensionType) -> bool {
        self.cache.contains_key(key)
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        CacheStats {
            entry_count: self.cache.entry_count(),
        }
    }
}

impl Default for GrammarCache {
    fn default() -> Self {
        Self::new(ExtensionType::ALL.len() as u64)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: u64,
}
