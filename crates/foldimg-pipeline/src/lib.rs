//! foldimg-pipeline: image filter operations and the stage merge engine
//! (sans-IO).
//!
//! A filter chain such as `overlayImage(...) -> crop(...)` is compiled once
//! into a [`FilterChain`]. For every image it serves, the chain is grouped
//! into the fewest [`TransformStage`]s that still render exactly what
//! applying each filter in turn would, and those stages are handed to a
//! [`StageExecutor`].
//!
//! This crate never touches the filesystem. Overlay assets are read through
//! an [`AssetLoader`] supplied by the caller; `foldimg-io` provides one
//! backed by a directory.

pub mod args;
pub mod assets;
pub mod compose;
pub mod crop;
pub mod filter;
pub mod gravity;
pub mod operation;
pub mod overlay;
pub mod raster;
pub mod source;
pub mod stage;
pub mod transform;
pub mod types;

pub use args::Arg;
pub use assets::{AssetLoader, MemoryAssets};
pub use compose::{StageComposer, compose_stages};
pub use crop::Crop;
pub use filter::{FilterChain, FilterDecl, FilterKind};
pub use gravity::{CropAnchor, Gravity, HorizontalAlign, OverlayGravity, VerticalAlign};
pub use operation::{DeriveContext, ImageOperation};
pub use overlay::{Margins, OverlayImage};
pub use raster::{RasterExecutor, StageExecutor};
pub use source::SourceImage;
pub use stage::{Overlay, TransformStage};
pub use types::{Dimensions, FilterError, ImageRole};
