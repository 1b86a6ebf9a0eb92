//! The capability interface every filter implements.
//!
//! # Strategy pattern
//!
//! The merge engine sees filters only through [`ImageOperation`]. Each
//! filter type owns its own compatibility rule, so new filters can be
//! added without touching the engine.

use std::fmt;

use crate::assets::AssetLoader;
use crate::source::SourceImage;
use crate::stage::TransformStage;
use crate::types::FilterError;

/// What an operation may consult while deriving its desired stage.
///
/// Scoped to a single request.
#[derive(Clone, Copy)]
pub struct DeriveContext<'a> {
    /// The image the operation will be applied to.
    pub source: &'a SourceImage,
    /// Where auxiliary assets are read from.
    pub assets: &'a dyn AssetLoader,
}

impl<'a> DeriveContext<'a> {
    /// Bundle a source image with an asset loader.
    #[must_use]
    pub const fn new(source: &'a SourceImage, assets: &'a dyn AssetLoader) -> Self {
        Self { source, assets }
    }
}

impl fmt::Debug for DeriveContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeriveContext")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// One configured filter.
///
/// Implementations are immutable after construction and are shared
/// read-only between all requests served by a chain.
pub trait ImageOperation: fmt::Debug + Send + Sync {
    /// Filter name as it appears in a chain declaration.
    fn name(&self) -> &'static str;

    /// Describe what this operation wants done, as a stage of its own.
    ///
    /// # Errors
    ///
    /// Returns a request-time [`FilterError`] if an asset or the source
    /// image cannot be read.
    fn desired_stage(&self, ctx: &DeriveContext<'_>) -> Result<TransformStage, FilterError>;

    /// Whether `desired` can be folded into `accumulated` without changing
    /// the rendered result. Must return `false` whenever in doubt.
    fn can_merge(&self, accumulated: &TransformStage, desired: &TransformStage) -> bool;

    /// Fold `desired` into `accumulated`.
    ///
    /// Only called after [`can_merge`](Self::can_merge) returned `true`, or
    /// with an empty `accumulated`.
    fn merge(&self, accumulated: &mut TransformStage, desired: TransformStage);
}
