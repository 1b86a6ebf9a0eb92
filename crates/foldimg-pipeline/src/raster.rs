//! Stage execution.
//!
//! [`StageExecutor`] is the seam to whatever native engine turns a
//! [`TransformStage`] into pixels. [`RasterExecutor`] is a reference
//! implementation on top of the `image` crate.

use std::io::Cursor;

use image::error::{LimitError, LimitErrorKind};
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat, RgbaImage};
use tracing::debug;

use crate::gravity::Gravity;
use crate::stage::{Overlay, TransformStage};
use crate::types::FilterError;

/// Largest RGBA buffer the executor will allocate, matching the `image`
/// crate's default decoder allocation limit.
const MAX_BUFFER_BYTES: u64 = 512 * 1024 * 1024;

/// Executes one stage against encoded image bytes.
pub trait StageExecutor: Send + Sync {
    /// Apply `stage` to the encoded `image` and return the encoded result.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Execution`] if the image cannot be decoded,
    /// processed or re-encoded.
    fn execute(&self, stage: &TransformStage, image: &[u8]) -> Result<Vec<u8>, FilterError>;
}

/// Reference executor backed by the `image` crate.
///
/// Within one stage the overlay is composited first, then the crop is
/// applied. A crop scales the image to cover the target size and cuts the
/// window selected by the stage gravity. Output keeps the input format.
#[derive(Debug, Clone, Copy)]
pub struct RasterExecutor {
    filter: FilterType,
}

impl Default for RasterExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterExecutor {
    /// Executor using bilinear resampling.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }

    /// Executor using the given resampling filter.
    #[must_use]
    pub const fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl StageExecutor for RasterExecutor {
    fn execute(&self, stage: &TransformStage, image: &[u8]) -> Result<Vec<u8>, FilterError> {
        let format = image::guess_format(image).map_err(FilterError::Execution)?;
        let mut canvas = image::load_from_memory_with_format(image, format)
            .map_err(FilterError::Execution)?
            .to_rgba8();

        if let Some(overlay) = &stage.overlay {
            composite(&mut canvas, overlay)?;
        }
        if stage.crop {
            canvas = crop_to_fill(&canvas, stage.width, stage.height, stage.gravity, self.filter)?;
        } else if stage.has_dimensions() {
            canvas = resize_exact(&canvas, stage.width, stage.height, self.filter)?;
        }

        debug!(
            width = canvas.width(),
            height = canvas.height(),
            ?format,
            "executed stage"
        );
        encode(canvas, format)
    }
}

/// Blend `overlay` onto `canvas` at its absolute offset.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn composite(canvas: &mut RgbaImage, overlay: &Overlay) -> Result<(), FilterError> {
    let mut top = image::load_from_memory(&overlay.bytes)
        .map_err(FilterError::Execution)?
        .to_rgba8();
    if overlay.opacity < 1.0 {
        for pixel in top.pixels_mut() {
            let alpha = f64::from(pixel.0[3]) * overlay.opacity;
            pixel.0[3] = alpha.round().clamp(0.0, 255.0) as u8;
        }
    }
    image::imageops::overlay(canvas, &top, overlay.left, overlay.top);
    Ok(())
}

/// Fail with a limit error unless a `width` x `height` RGBA buffer fits
/// [`MAX_BUFFER_BYTES`].
fn check_buffer(width: u32, height: u32) -> Result<(), FilterError> {
    let bytes = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(4));
    match bytes {
        Some(bytes) if bytes <= MAX_BUFFER_BYTES => Ok(()),
        _ => Err(FilterError::Execution(ImageError::Limits(
            LimitError::from_kind(LimitErrorKind::DimensionError),
        ))),
    }
}

/// Scale `image` to cover `width` x `height`, then cut that window at
/// `gravity`. A zero target dimension keeps the source aspect ratio.
///
/// Both the target and the intermediate scaled buffer are checked against
/// [`MAX_BUFFER_BYTES`] before anything is allocated.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn crop_to_fill(
    image: &RgbaImage,
    width: u32,
    height: u32,
    gravity: Gravity,
    filter: FilterType,
) -> Result<RgbaImage, FilterError> {
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return Ok(image.clone());
    }
    let (width, height) = fill_missing(src_w, src_h, width, height);
    check_buffer(width, height)?;

    let scale = (f64::from(width) / f64::from(src_w)).max(f64::from(height) / f64::from(src_h));
    let scaled_w = ((f64::from(src_w) * scale).ceil() as u32).max(width);
    let scaled_h = ((f64::from(src_h) * scale).ceil() as u32).max(height);
    check_buffer(scaled_w, scaled_h)?;
    let scaled = if (scaled_w, scaled_h) == (src_w, src_h) {
        image.clone()
    } else {
        image::imageops::resize(image, scaled_w, scaled_h, filter)
    };

    let spare_w = scaled_w - width;
    let spare_h = scaled_h - height;
    let x = match gravity {
        Gravity::West => 0,
        Gravity::East => spare_w,
        Gravity::Center | Gravity::North | Gravity::South => spare_w / 2,
    };
    let y = match gravity {
        Gravity::North => 0,
        Gravity::South => spare_h,
        Gravity::Center | Gravity::East | Gravity::West => spare_h / 2,
    };
    Ok(image::imageops::crop_imm(&scaled, x, y, width, height).to_image())
}

fn resize_exact(
    image: &RgbaImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<RgbaImage, FilterError> {
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return Ok(image.clone());
    }
    let (width, height) = fill_missing(src_w, src_h, width, height);
    check_buffer(width, height)?;
    Ok(image::imageops::resize(image, width, height, filter))
}

/// Replace a zero target dimension with the one that keeps the aspect
/// ratio of `src_w` x `src_h`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fill_missing(src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
    let ratio = f64::from(src_w) / f64::from(src_h);
    match (width, height) {
        (0, 0) => (src_w, src_h),
        (0, h) => (((f64::from(h) * ratio).round() as u32).max(1), h),
        (w, 0) => (w, ((f64::from(w) / ratio).round() as u32).max(1)),
        (w, h) => (w, h),
    }
}

fn encode(canvas: RgbaImage, format: ImageFormat) -> Result<Vec<u8>, FilterError> {
    let output = match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8()),
        _ => DynamicImage::ImageRgba8(canvas),
    };
    let mut buf = Cursor::new(Vec::new());
    output
        .write_to(&mut buf, format)
        .map_err(FilterError::Execution)?;
    Ok(buf.into_inner())
}
