//! Content-digest cache for parsed files.
//!
//! Included files rarely change between rebuilds. The host parses a file
//! once per distinct content and reuses the result until the content digest
//! changes or the file is invalidated on write.

use std::hash::Hasher;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHasher};

use crate::base::FileId;

/// Digest of a file's bytes.
pub fn content_digest(content: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(content);
    hasher.write_usize(content.len());
    hasher.finish()
}

struct CacheEntry<T> {
    digest: u64,
    value: Arc<T>,
}

/// Cache keyed by `(FileId, content digest)`, one live version per file.
pub struct ParseCache<T> {
    entries: FxHashMap<FileId, CacheEntry<T>>,
    hits: u64,
    misses: u64,
}

impl<T> Default for ParseCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ParseCache<T> {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached value for this exact content of `file`.
    pub fn get(&self, file: FileId, content: &str) -> Option<Arc<T>> {
        let entry = self.entries.get(&file)?;
        (entry.digest == content_digest(content.as_bytes())).then(|| entry.value.clone())
    }

    pub fn insert(&mut self, file: FileId, content: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.entries.insert(
            file,
            CacheEntry {
                digest: content_digest(content.as_bytes()),
                value: value.clone(),
            },
        );
        value
    }

    /// Return the cached parse of `content`, parsing on a miss.
    pub fn get_or_parse(
        &mut self,
        file: FileId,
        content: &str,
        parse: impl FnOnce(&str) -> T,
    ) -> Arc<T> {
        if let Some(value) = self.get(file, content) {
            self.hits += 1;
            return value;
        }
        self.misses += 1;
        tracing::trace!("[CACHE] parsing {file}");
        self.insert(file, content, parse(content))
    }

    /// Drop the entry for `file`; called when the file is written.
    pub fn invalidate(&mut self, file: FileId) -> bool {
        self.entries.remove(&file).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
