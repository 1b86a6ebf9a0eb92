//! Filter chain configuration files.
//!
//! A chain is declared as JSON:
//!
//! ```json
//! {
//!   "asset_root": "assets",
//!   "filters": [
//!     { "name": "overlayImage", "args": ["logo.png", 0.8, "SE", 0, 10, 10, 0] },
//!     { "name": "crop", "args": [400, 300, "north"] }
//!   ]
//! }
//! ```
//!
//! `asset_root` is optional. When it is relative, it is resolved against
//! the directory holding the configuration file.

use std::path::{Path, PathBuf};

use foldimg_pipeline::{FilterChain, FilterDecl, FilterError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fs_assets::FsAssets;

/// Errors raised while loading or compiling a chain configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON or has the wrong shape.
    #[error("invalid chain configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A filter declaration was rejected.
    #[error("invalid filter chain: {0}")]
    Compile(#[from] FilterError),
}

/// A declared filter chain plus where its assets live.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Directory overlay paths are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_root: Option<PathBuf>,

    /// Filters in the order they apply.
    #[serde(default)]
    pub filters: Vec<FilterDecl>,
}

impl ChainConfig {
    /// Parse a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compile the declared filters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Compile`] if any declaration is rejected; no
    /// partial chain is produced.
    pub fn compile(&self) -> Result<FilterChain, ConfigError> {
        Ok(FilterChain::compile(&self.filters)?)
    }

    /// Asset loader rooted at [`asset_root`](Self::asset_root).
    #[must_use]
    pub fn assets(&self) -> FsAssets {
        self.asset_root
            .as_ref()
            .map_or_else(FsAssets::new, FsAssets::with_root)
    }
}

/// Load a chain configuration from `path`.
///
/// A relative `asset_root` is rebased onto the configuration file's
/// directory.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read and
/// [`ConfigError::Parse`] if its contents are invalid.
pub fn load_config(path: &Path) -> Result<ChainConfig, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = ChainConfig::from_json(&json)?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    config.asset_root = Some(match config.asset_root.take() {
        Some(root) if root.is_relative() => base.join(root),
        Some(root) => root,
        None => base.to_path_buf(),
    });

    debug!(asset_root = ?config.asset_root, "resolved asset root");
    info!(
        path = %path.display(),
        filters = config.filters.len(),
        "loaded chain configuration"
    );
    Ok(config)
}
