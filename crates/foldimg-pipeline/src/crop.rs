//! `crop(width, height[, anchor])`: cut the image to a fixed size.

use tracing::debug;

use crate::args::{Arg, ArgReader};
use crate::gravity::CropAnchor;
use crate::operation::{DeriveContext, ImageOperation};
use crate::stage::TransformStage;
use crate::types::FilterError;

/// Configured crop filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    width: u32,
    height: u32,
    anchor: CropAnchor,
}

impl Crop {
    /// Name used in chain declarations.
    pub const NAME: &'static str = "crop";

    /// Create a crop filter directly from typed values.
    #[must_use]
    pub const fn new(width: u32, height: u32, anchor: CropAnchor) -> Self {
        Self {
            width,
            height,
            anchor,
        }
    }

    /// Build a crop filter from positional arguments:
    /// `width, height[, anchor]`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidParameterCount`] unless given 2 or 3
    /// arguments, [`FilterError::InvalidParameterType`] if width or height
    /// is not a non-negative integer, and [`FilterError::InvalidEnumValue`]
    /// for an unknown anchor token.
    pub fn from_args(args: &[Arg]) -> Result<Self, FilterError> {
        let reader = ArgReader::new(Self::NAME, args);
        reader.require_count(&[2, 3], "2 or 3")?;

        let width = reader.dimension(0)?;
        let height = reader.dimension(1)?;
        let anchor = if reader.len() == 3 {
            let token = reader.string(2)?;
            CropAnchor::from_token(token).ok_or_else(|| reader.enum_error("anchor", token))?
        } else {
            CropAnchor::default()
        };

        Ok(Self::new(width, height, anchor))
    }

    /// Target width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Target height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Which part of the image is kept.
    #[must_use]
    pub const fn anchor(&self) -> CropAnchor {
        self.anchor
    }
}

impl ImageOperation for Crop {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn desired_stage(&self, _ctx: &DeriveContext<'_>) -> Result<TransformStage, FilterError> {
        debug!(width = self.width, height = self.height, anchor = ?self.anchor, "crop options");
        Ok(TransformStage {
            width: self.width,
            height: self.height,
            gravity: self.anchor.gravity(),
            crop: true,
            overlay: None,
        })
    }

    fn can_merge(&self, accumulated: &TransformStage, desired: &TransformStage) -> bool {
        let unconstrained = !accumulated.has_dimensions() && !accumulated.crop;
        let identical = accumulated.width == desired.width
            && accumulated.height == desired.height
            && accumulated.crop == desired.crop;
        unconstrained || identical
    }

    fn merge(&self, accumulated: &mut TransformStage, desired: TransformStage) {
        accumulated.width = desired.width;
        accumulated.height = desired.height;
        accumulated.gravity = desired.gravity;
        accumulated.crop = desired.crop;
    }
}
