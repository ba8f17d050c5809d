//! Short-TTL cache for selector query results.
//!
//! Scoped to one page's processing: the same selector is often consulted by
//! several extraction passes (text, price, variation synthesis), and the
//! cache avoids re-walking the DOM for each. Entries expire after a short
//! window and the whole cache is dropped with its extractor.

use std::collections::HashMap;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(5);

struct CacheEntry {
    texts: Vec<String>,
    at: Instant,
}

pub(crate) struct ElementCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ElementCache {
    pub(crate) fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub(crate) fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Returns the cached result for `selector` if it is still fresh.
    pub(crate) fn get(&self, selector: &str) -> Option<Vec<String>> {
        let entry = self.entries.get(selector)?;
        if entry.at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.texts.clone())
    }

    pub(crate) fn put(&mut self, selector: &str, texts: Vec<String>) {
        self.entries.insert(
            selector.to_string(),
            CacheEntry {
                texts,
                at: Instant::now(),
            },
        );
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
