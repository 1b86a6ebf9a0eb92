//! Access to auxiliary image assets such as overlay sources.
//!
//! This crate never touches the filesystem. Callers supply an
//! [`AssetLoader`]; `foldimg-io` provides one backed by a directory.

use std::collections::HashMap;
use std::io;

/// Synchronous, byte-level read access to named assets.
pub trait AssetLoader: Send + Sync {
    /// Read the full contents of the asset at `path`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error that prevented the read, including
    /// [`io::ErrorKind::NotFound`] for unknown assets.
    fn load(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Assets held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    /// Create an empty asset set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `path`, replacing any previous entry.
    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(path.into(), bytes);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl AssetLoader for MemoryAssets {
    fn load(&self, path: &str) -> io::Result<Vec<u8>> {
        self.assets.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no asset named `{path}`"))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn registered_asset_is_returned() {
        let assets = MemoryAssets::new().with("logo.png", vec![1, 2, 3]);
        assert_eq!(assets.load("logo.png").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn unknown_asset_is_not_found() {
        let err = MemoryAssets::new().load("missing.png").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let mut assets = MemoryAssets::new();
        assets.insert("a", vec![1]);
        assets.insert("a", vec![2]);
        assert_eq!(assets.load("a").unwrap(), vec![2]);
    }
}
