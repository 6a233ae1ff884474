//! Memoized source loading
//!
//! Parsed tables and list files are cached per path and reused while the file's SHA-256
//! digest is unchanged. A cache belongs to exactly one session.

use sha2::{Digest, Sha256};
use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::Result;

struct Entry {
    digest: [u8; 32],
    value: Arc<dyn Any + Send + Sync>,
}

/// Content-addressed cache of parsed source files
#[derive(Default)]
pub struct SourceCache {
    entries: HashMap<PathBuf, Entry>,
    hits: u64,
    misses: u64,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached parse of `path`, re-parsing only when the content changed
    ///
    /// A cached value of a different type under the same path is treated as a miss.
    pub fn load<T, F>(&mut self, path: &Path, parse: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce(&[u8]) -> Result<T>,
    {
        let bytes = std::fs::read(path)?;
        let digest: [u8; 32] = Sha256::digest(&bytes).into();

        if let Some(entry) = self.entries.get(path) {
            if entry.digest == digest {
                if let Ok(value) = Arc::clone(&entry.value).downcast::<T>() {
                    self.hits += 1;
                    debug!(path = %path.display(), "source cache hit");
                    return Ok(value);
                }
            }
        }

        self.misses += 1;
        debug!(path = %path.display(), "source cache miss, parsing");
        let value = Arc::new(parse(&bytes)?);
        self.entries.insert(
            path.to_path_buf(),
            Entry {
                digest,
                value: value.clone(),
            },
        );
        Ok(value)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse_lines(bytes: &[u8]) -> Result<Vec<String>> {
        Ok(String::from_utf8_lossy(bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }

    #[test]
    fn test_unchanged_file_is_parsed_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.csv");
        fs::write(&path, "x\ny\n").unwrap();

        let mut cache = SourceCache::new();
        let first = cache.load(&path, parse_lines).unwrap();
        let second = cache.load(&path, parse_lines).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_changed_content_is_reparsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.csv");
        fs::write(&path, "x\n").unwrap();

        let mut cache = SourceCache::new();
        let first = cache.load(&path, parse_lines).unwrap();
        fs::write(&path, "x\nz\n").unwrap();
        let second = cache.load(&path, parse_lines).unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut cache = SourceCache::new();
        assert!(cache.load(&dir.path().join("nope.csv"), parse_lines).is_err());
    }
}
