//! `overlayImage(path, opacity, gravity[, top, right, bottom, left])`:
//! composite an image asset on top of the response image.
//!
//! The overlay's absolute position depends on the size of the image it is
//! placed on, so this is the one filter whose desired stage has to be
//! derived per request.

use std::sync::Arc;

use tracing::debug;

use crate::args::{Arg, ArgReader};
use crate::gravity::{HorizontalAlign, OverlayGravity, VerticalAlign};
use crate::operation::{DeriveContext, ImageOperation};
use crate::source::query_dimensions;
use crate::stage::{Overlay, TransformStage};
use crate::types::{Dimensions, FilterError, ImageRole};

/// Margins kept between the overlay and the image edges, in pixels.
///
/// Offsets are computed in `i64`, which holds any combination of `i32`
/// margins and `u32` image sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Margins {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

/// Configured overlay filter.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayImage {
    path: String,
    opacity: f64,
    gravity: OverlayGravity,
    margins: Margins,
}

impl OverlayImage {
    /// Name used in chain declarations.
    pub const NAME: &'static str = "overlayImage";

    /// Create an overlay filter from typed values. `opacity` is clamped
    /// into `[0, 1]`.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        opacity: f64,
        gravity: OverlayGravity,
        margins: Margins,
    ) -> Self {
        Self {
            path: path.into(),
            opacity: opacity.clamp(0.0, 1.0),
            gravity,
            margins,
        }
    }

    /// Build an overlay filter from positional arguments.
    ///
    /// Accepts `path, opacity, gravity` optionally followed by four margins
    /// consumed in the order top, right, bottom, left. Out-of-range
    /// opacity is clamped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidParameterCount`] unless given 3 or 7
    /// arguments, [`FilterError::InvalidParameterType`] for a mistyped
    /// argument, and [`FilterError::InvalidEnumValue`] for an unknown
    /// gravity token.
    pub fn from_args(args: &[Arg]) -> Result<Self, FilterError> {
        let reader = ArgReader::new(Self::NAME, args);
        reader.require_count(&[3, 7], "3 or 7")?;

        let path = reader.string(0)?;
        let opacity = reader.float(1)?;
        let token = reader.string(2)?;
        let gravity =
            OverlayGravity::from_token(token).ok_or_else(|| reader.enum_error("gravity", token))?;

        let margins = if reader.len() == 7 {
            Margins {
                top: reader.offset(3)?,
                right: reader.offset(4)?,
                bottom: reader.offset(5)?,
                left: reader.offset(6)?,
            }
        } else {
            Margins::default()
        };

        Ok(Self::new(path, opacity, gravity, margins))
    }

    /// Asset path the overlay is read from.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Opacity after clamping.
    #[must_use]
    pub const fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Placement relative to the image edges.
    #[must_use]
    pub const fn gravity(&self) -> OverlayGravity {
        self.gravity
    }

    /// Configured edge margins.
    #[must_use]
    pub const fn margins(&self) -> Margins {
        self.margins
    }

    /// Absolute `(left, top)` offset of an overlay of size `overlay` placed
    /// on an image of size `base`.
    #[must_use]
    pub fn offset(&self, base: Dimensions, overlay: Dimensions) -> (i64, i64) {
        let (top, right, bottom, left) = (
            i64::from(self.margins.top),
            i64::from(self.margins.right),
            i64::from(self.margins.bottom),
            i64::from(self.margins.left),
        );
        let (base_w, base_h) = (i64::from(base.width), i64::from(base.height));
        let (over_w, over_h) = (i64::from(overlay.width), i64::from(overlay.height));

        let top = match self.gravity.vertical {
            VerticalAlign::North => top,
            VerticalAlign::Center => {
                top + (base_h - top - bottom).div_euclid(2) - over_h.div_euclid(2)
            }
            VerticalAlign::South => base_h - bottom - over_h,
        };
        let left = match self.gravity.horizontal {
            HorizontalAlign::West => left,
            HorizontalAlign::Center => {
                left + (base_w - left - right).div_euclid(2) - over_w.div_euclid(2)
            }
            HorizontalAlign::East => base_w - right - over_w,
        };
        (left, top)
    }
}

impl ImageOperation for OverlayImage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn desired_stage(&self, ctx: &DeriveContext<'_>) -> Result<TransformStage, FilterError> {
        let base = ctx.source.dimensions()?;
        let bytes = ctx
            .assets
            .load(&self.path)
            .map_err(|source| FilterError::ResourceUnavailable {
                path: self.path.clone(),
                source,
            })?;
        let overlay_size = query_dimensions(&bytes, ImageRole::Overlay)?;
        let (left, top) = self.offset(base, overlay_size);

        debug!(
            path = %self.path,
            base = ?base,
            overlay = ?overlay_size,
            left,
            top,
            "overlay options"
        );

        Ok(TransformStage {
            overlay: Some(Overlay {
                bytes: Arc::from(bytes),
                opacity: self.opacity,
                left,
                top,
            }),
            ..TransformStage::default()
        })
    }

    fn can_merge(&self, accumulated: &TransformStage, desired: &TransformStage) -> bool {
        if accumulated.has_dimensions() {
            return false;
        }
        match (&accumulated.overlay, &desired.overlay) {
            (None, _) => true,
            (Some(existing), Some(wanted)) => existing.matches(wanted),
            (Some(_), None) => false,
        }
    }

    fn merge(&self, accumulated: &mut TransformStage, desired: TransformStage) {
        accumulated.overlay = desired.overlay;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::source::SourceImage;
    use crate::source::tests::png;

    fn gravity(token: &str) -> OverlayGravity {
        OverlayGravity::from_token(token).unwrap()
    }

    fn args3(opacity: f64, token: &str) -> Vec<Arg> {
        vec![Arg::from("logo.png"), Arg::Float(opacity), Arg::from(token)]
    }

    #[test]
    fn opacity_is_clamped_into_unit_range() {
        let low = OverlayImage::from_args(&args3(-0.5, "CC")).unwrap();
        let high = OverlayImage::from_args(&args3(1.7, "CC")).unwrap();
        let mid = OverlayImage::from_args(&args3(0.42, "CC")).unwrap();
        assert!(low.opacity().abs() < f64::EPSILON);
        assert!((high.opacity() - 1.0).abs() < f64::EPSILON);
        assert!((mid.opacity() - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn three_args_default_margins_to_zero() {
        let overlay = OverlayImage::from_args(&args3(1.0, "NE")).unwrap();
        assert_eq!(overlay.margins(), Margins::default());
        assert_eq!(overlay.path(), "logo.png");
    }

    #[test]
    fn seven_args_read_margins_top_right_bottom_left() {
        let mut args = args3(1.0, "NE");
        args.extend([Arg::Int(1), Arg::Int(2), Arg::Int(3), Arg::Int(4)]);
        let overlay = OverlayImage::from_args(&args).unwrap();
        assert_eq!(
            overlay.margins(),
            Margins {
                top: 1,
                right: 2,
                bottom: 3,
                left: 4,
            }
        );
    }

    #[test]
    fn other_argument_counts_are_rejected() {
        let mut four = args3(1.0, "NE");
        four.push(Arg::Int(1));
        for args in [vec![], four, vec![Arg::from("logo.png"), Arg::Float(1.0)]] {
            assert!(matches!(
                OverlayImage::from_args(&args),
                Err(FilterError::InvalidParameterCount {
                    filter: "overlayImage",
                    ..
                })
            ));
        }
    }

    #[test]
    fn unknown_gravity_is_rejected() {
        let err = OverlayImage::from_args(&args3(1.0, "north-east")).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidEnumValue {
                kind: "gravity",
                ..
            }
        ));
    }

    #[test]
    fn mistyped_arguments_are_rejected() {
        let err =
            OverlayImage::from_args(&[Arg::Int(3), Arg::Float(1.0), Arg::from("CC")]).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidParameterType { index: 0, .. }
        ));

        let err = OverlayImage::from_args(&[Arg::from("a.png"), Arg::from("opaque"), Arg::from("CC")])
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidParameterType { index: 1, .. }
        ));

        let mut args = args3(1.0, "CC");
        args.extend([Arg::Int(0), Arg::from("x"), Arg::Int(0), Arg::Int(0)]);
        assert!(matches!(
            OverlayImage::from_args(&args),
            Err(FilterError::InvalidParameterType { index: 4, .. })
        ));
    }

    #[test]
    fn centered_offset_without_margins() {
        let overlay = OverlayImage::new("logo.png", 1.0, gravity("CC"), Margins::default());
        let offset = overlay.offset(Dimensions::new(1000, 500), Dimensions::new(100, 50));
        assert_eq!(offset, (450, 225));
    }

    #[test]
    fn corner_offsets_respect_margins() {
        let margins = Margins {
            top: 10,
            right: 20,
            bottom: 30,
            left: 40,
        };
        let base = Dimensions::new(1000, 500);
        let over = Dimensions::new(100, 50);

        let nw = OverlayImage::new("a", 1.0, gravity("NW"), margins);
        assert_eq!(nw.offset(base, over), (40, 10));

        let se = OverlayImage::new("a", 1.0, gravity("SE"), margins);
        assert_eq!(se.offset(base, over), (1000 - 20 - 100, 500 - 30 - 50));
    }

    #[test]
    fn centered_offset_with_margins_uses_the_inner_box() {
        let margins = Margins {
            top: 10,
            right: 0,
            bottom: 30,
            left: 100,
        };
        let overlay = OverlayImage::new("a", 1.0, gravity("CC"), margins);
        let (left, top) = overlay.offset(Dimensions::new(1000, 500), Dimensions::new(101, 51));
        // top = 10 + floor(460 / 2) - floor(51 / 2) = 10 + 230 - 25
        assert_eq!(top, 215);
        // left = 100 + floor(900 / 2) - floor(101 / 2) = 100 + 450 - 50
        assert_eq!(left, 500);
    }

    #[test]
    fn margins_beyond_i32_are_rejected() {
        let mut args = args3(1.0, "CC");
        args.extend([Arg::Int(i64::MAX), Arg::Int(0), Arg::Int(i64::MAX), Arg::Int(0)]);
        assert!(matches!(
            OverlayImage::from_args(&args),
            Err(FilterError::InvalidParameterType { index: 3, .. })
        ));
    }

    #[test]
    fn extreme_margins_do_not_overflow() {
        let margins = Margins {
            top: i32::MAX,
            right: i32::MIN,
            bottom: i32::MAX,
            left: i32::MIN,
        };
        let max = Dimensions::new(u32::MAX, u32::MAX);
        for token in ["NW", "CC", "SE"] {
            let overlay = OverlayImage::new("a", 1.0, gravity(token), margins);
            let (left, top) = overlay.offset(Dimensions::new(100, 100), max);
            assert!(left.abs() < 1 << 34 && top.abs() < 1 << 34, "{token}");
            let (left, top) = overlay.offset(max, Dimensions::new(10, 10));
            assert!(left.abs() < 1 << 34 && top.abs() < 1 << 34, "{token}");
        }
        let cc = OverlayImage::new("a", 1.0, gravity("CC"), margins);
        // top = MAX + floor((100 - 2 * MAX) / 2) - 5 = 50 - 5
        assert_eq!(cc.offset(Dimensions::new(100, 100), Dimensions::new(10, 10)).1, 45);
    }

    #[test]
    fn oversized_overlay_gets_negative_offset() {
        let overlay = OverlayImage::new("a", 1.0, gravity("SE"), Margins::default());
        let offset = overlay.offset(Dimensions::new(10, 10), Dimensions::new(20, 30));
        assert_eq!(offset, (-10, -20));
    }

    #[test]
    fn desired_stage_places_overlay_on_source() {
        let logo = png(100, 50, [255, 0, 0, 255]);
        let assets = MemoryAssets::new().with("logo.png", logo.clone());
        let source = SourceImage::new(png(1000, 500, [0, 0, 0, 255]));
        let overlay = OverlayImage::new("logo.png", 0.42, gravity("CC"), Margins::default());

        let stage = overlay
            .desired_stage(&DeriveContext::new(&source, &assets))
            .unwrap();

        assert!(!stage.has_dimensions());
        assert!(!stage.crop);
        let placed = stage.overlay.unwrap();
        assert_eq!((placed.left, placed.top), (450, 225));
        assert!((placed.opacity - 0.42).abs() < f64::EPSILON);
        assert_eq!(&*placed.bytes, logo.as_slice());
    }

    #[test]
    fn missing_asset_is_resource_unavailable() {
        let source = SourceImage::new(png(10, 10, [0, 0, 0, 255]));
        let overlay = OverlayImage::new("gone.png", 1.0, gravity("CC"), Margins::default());
        let err = overlay
            .desired_stage(&DeriveContext::new(&source, &MemoryAssets::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::ResourceUnavailable { ref path, .. } if path == "gone.png"
        ));
    }

    #[test]
    fn undecodable_asset_is_size_query_failure() {
        let assets = MemoryAssets::new().with("bad.png", vec![1, 2, 3]);
        let source = SourceImage::new(png(10, 10, [0, 0, 0, 255]));
        let overlay = OverlayImage::new("bad.png", 1.0, gravity("CC"), Margins::default());
        let err = overlay
            .desired_stage(&DeriveContext::new(&source, &assets))
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::SizeQueryFailure {
                role: ImageRole::Overlay,
                ..
            }
        ));
    }

    #[test]
    fn undecodable_source_is_size_query_failure() {
        let assets = MemoryAssets::new().with("logo.png", png(1, 1, [0, 0, 0, 255]));
        let source = SourceImage::new(vec![9, 9, 9]);
        let overlay = OverlayImage::new("logo.png", 1.0, gravity("CC"), Margins::default());
        let err = overlay
            .desired_stage(&DeriveContext::new(&source, &assets))
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::SizeQueryFailure {
                role: ImageRole::Source,
                ..
            }
        ));
    }

    fn overlay_stage(len: usize, left: i64, top: i64) -> TransformStage {
        TransformStage {
            overlay: Some(Overlay {
                bytes: Arc::from(vec![0u8; len]),
                opacity: 1.0,
                left,
                top,
            }),
            ..TransformStage::default()
        }
    }

    #[test]
    fn merges_into_empty_or_matching_overlay() {
        let overlay = OverlayImage::new("a", 1.0, gravity("CC"), Margins::default());
        let desired = overlay_stage(8, 1, 2);
        assert!(overlay.can_merge(&TransformStage::default(), &desired));
        assert!(overlay.can_merge(&overlay_stage(8, 1, 2), &desired));
    }

    #[test]
    fn refuses_different_overlay() {
        let overlay = OverlayImage::new("a", 1.0, gravity("CC"), Margins::default());
        let desired = overlay_stage(8, 1, 2);
        assert!(!overlay.can_merge(&overlay_stage(9, 1, 2), &desired));
        assert!(!overlay.can_merge(&overlay_stage(8, 0, 2), &desired));
    }

    #[test]
    fn refuses_stage_with_dimensions() {
        let overlay = OverlayImage::new("a", 1.0, gravity("CC"), Margins::default());
        let cropped = TransformStage {
            width: 10,
            height: 10,
            crop: true,
            ..TransformStage::default()
        };
        assert!(!overlay.can_merge(&cropped, &overlay_stage(8, 1, 2)));
    }

    #[test]
    fn merge_copies_overlay_and_leaves_crop_untouched() {
        let overlay = OverlayImage::new("a", 1.0, gravity("CC"), Margins::default());
        let mut accumulated = TransformStage {
            crop: true,
            ..TransformStage::default()
        };
        let desired = overlay_stage(4, 5, 6);
        overlay.merge(&mut accumulated, desired.clone());
        assert!(accumulated.crop);
        assert_eq!(accumulated.overlay, desired.overlay);
    }
}
