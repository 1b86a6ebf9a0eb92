//! The accumulated description of one stage executor invocation.

use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::gravity::Gravity;

/// Desired configuration for one native processing pass.
///
/// Every field uses its zero value to mean "no constraint". Operations
/// describe what they want as a `TransformStage` and the merge engine folds
/// compatible descriptions into a shared one.
///
/// Within one stage the executor composites the overlay first and then
/// applies the crop.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformStage {
    /// Target width in pixels, `0` when unconstrained.
    pub width: u32,
    /// Target height in pixels, `0` when unconstrained.
    pub height: u32,
    /// Whether the target size is reached by cropping.
    pub crop: bool,
    /// Which part of the image a crop keeps.
    pub gravity: Gravity,
    /// Image composited on top, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Overlay>,
}

impl TransformStage {
    /// Returns `true` when no field asserts anything.
    ///
    /// Gravity alone does not count: it only qualifies a crop.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.has_dimensions() && !self.crop && self.overlay.is_none()
    }

    /// Returns `true` when a target width or height is asserted.
    #[must_use]
    pub const fn has_dimensions(&self) -> bool {
        self.width != 0 || self.height != 0
    }
}

/// An image composited onto the stage output at an absolute offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    /// Encoded overlay image.
    #[serde(rename = "byte_len", serialize_with = "serialize_byte_len")]
    pub bytes: Arc<[u8]>,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Horizontal offset of the overlay's left edge.
    pub left: i64,
    /// Vertical offset of the overlay's top edge.
    pub top: i64,
}

impl Overlay {
    /// Loose equality used when deciding whether two overlays are the same.
    ///
    /// Compares opacity, position and content length. Two different assets
    /// of identical length at the same spot compare equal.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, other: &Self) -> bool {
        self.opacity == other.opacity
            && self.top == other.top
            && self.left == other.left
            && self.bytes.len() == other.bytes.len()
    }
}

fn serialize_byte_len<S: Serializer>(bytes: &Arc<[u8]>, serializer: S) -> Result<S::Ok, S::Error> {
    bytes.len().serialize(serializer)
}
