//! Overlay assets read from the local filesystem.

use std::io;
use std::path::{Path, PathBuf};

use foldimg_pipeline::AssetLoader;
use tracing::trace;

/// Reads assets from disk, resolving relative paths against a root.
///
/// Absolute asset paths are used as given.
#[derive(Debug, Clone, Default)]
pub struct FsAssets {
    root: Option<PathBuf>,
}

impl FsAssets {
    /// Resolve relative asset paths against the current directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Resolve relative asset paths against `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// The directory relative asset paths resolve against, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Full path an asset name resolves to.
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl AssetLoader for FsAssets {
    fn load(&self, path: &str) -> io::Result<Vec<u8>> {
        let resolved = self.resolve(path);
        trace!(path = %resolved.display(), "reading asset");
        std::fs::read(resolved)
    }
}
