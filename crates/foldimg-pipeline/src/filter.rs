//! Filter registry and compiled filter chains.
//!
//! [`FilterKind`] is the only place that knows which concrete filter types
//! exist. A chain declaration is compiled once into an immutable
//! [`FilterChain`] that can be shared across threads and reused for every
//! request it serves.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::args::Arg;
use crate::assets::AssetLoader;
use crate::compose::compose_stages;
use crate::crop::Crop;
use crate::operation::ImageOperation;
use crate::overlay::OverlayImage;
use crate::raster::StageExecutor;
use crate::source::SourceImage;
use crate::stage::TransformStage;
use crate::transform;
use crate::types::FilterError;

/// Selects which filter a declaration refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    /// `crop(width, height[, anchor])`
    #[serde(rename = "crop")]
    Crop,
    /// `overlayImage(path, opacity, gravity[, top, right, bottom, left])`
    #[serde(rename = "overlayImage")]
    OverlayImage,
}

impl FilterKind {
    /// Every registered filter.
    pub const ALL: [Self; 2] = [Self::Crop, Self::OverlayImage];

    /// Name used in chain declarations.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Crop => Crop::NAME,
            Self::OverlayImage => OverlayImage::NAME,
        }
    }

    /// Construct a configured operation from positional arguments.
    ///
    /// # Errors
    ///
    /// Returns the construction error reported by the filter.
    pub fn build(self, args: &[Arg]) -> Result<Arc<dyn ImageOperation>, FilterError> {
        let operation: Arc<dyn ImageOperation> = match self {
            Self::Crop => Arc::new(Crop::from_args(args)?),
            Self::OverlayImage => Arc::new(OverlayImage::from_args(args)?),
        };
        Ok(operation)
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FilterError::UnknownFilter(s.to_string()))
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One filter declaration: a name and its positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDecl {
    /// Registered filter name, e.g. `crop`.
    pub name: String,
    /// Positional arguments, already tokenized.
    #[serde(default)]
    pub args: Vec<Arg>,
}

impl FilterDecl {
    /// Create a declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// An ordered, compiled list of operations.
///
/// Cloning is cheap; clones share the same operations.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    operations: Arc<[Arc<dyn ImageOperation>]>,
}

impl FilterChain {
    /// Compile declarations into a chain.
    ///
    /// Compilation is all-or-nothing: the first bad declaration fails the
    /// whole chain.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownFilter`] for an unregistered name, or
    /// the filter's own construction error.
    pub fn compile(decls: &[FilterDecl]) -> Result<Self, FilterError> {
        let operations = decls
            .iter()
            .map(|decl| {
                let kind: FilterKind = decl.name.parse()?;
                kind.build(&decl.args)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(filters = operations.len(), "compiled filter chain");
        Ok(Self::from_operations(operations))
    }

    /// Wrap already constructed operations.
    #[must_use]
    pub fn from_operations(operations: Vec<Arc<dyn ImageOperation>>) -> Self {
        Self {
            operations: operations.into(),
        }
    }

    /// The operations in declared order.
    #[must_use]
    pub fn operations(&self) -> &[Arc<dyn ImageOperation>] {
        &self.operations
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if the chain has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Group this chain into stages for `source`. See [`compose_stages`].
    ///
    /// # Errors
    ///
    /// Propagates the first derivation error.
    pub fn compose(
        &self,
        source: &SourceImage,
        assets: &dyn AssetLoader,
    ) -> Result<Vec<TransformStage>, FilterError> {
        compose_stages(&self.operations, source, assets)
    }

    /// Apply this chain to `image`. See [`transform::apply`].
    ///
    /// # Errors
    ///
    /// Propagates derivation and execution errors.
    pub fn apply(
        &self,
        image: Vec<u8>,
        assets: &dyn AssetLoader,
        executor: &dyn StageExecutor,
    ) -> Result<Vec<u8>, FilterError> {
        transform::apply(&self.operations, image, assets, executor)
    }

    /// Apply this chain progressively. See [`transform::apply_progressive`].
    ///
    /// # Errors
    ///
    /// Propagates derivation and execution errors.
    pub fn apply_progressive(
        &self,
        image: Vec<u8>,
        assets: &dyn AssetLoader,
        executor: &dyn StageExecutor,
    ) -> Result<Vec<u8>, FilterError> {
        transform::apply_progressive(&self.operations, image, assets, executor)
    }
}
