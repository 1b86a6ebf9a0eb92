//! foldimg-io: filesystem collaborators for the foldimg pipeline.
//!
//! Reads overlay assets from disk and loads filter chain configuration
//! files. All image logic lives in `foldimg-pipeline`.

pub mod config;
pub mod fs_assets;

pub use config::{ChainConfig, ConfigError, load_config};
pub use fs_assets::FsAssets;
