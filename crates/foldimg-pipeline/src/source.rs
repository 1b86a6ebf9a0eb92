//! Handle to the image carried in a response body.

use std::cell::OnceCell;
use std::io::Cursor;

use crate::types::{Dimensions, FilterError, ImageRole};

/// Encoded image bytes plus lazily measured dimensions.
///
/// One `SourceImage` lives for the duration of a single request. The size
/// is read from the image header the first time it is asked for and cached
/// for the remaining operations of that request.
#[derive(Debug)]
pub struct SourceImage {
    bytes: Vec<u8>,
    dimensions: OnceCell<Dimensions>,
}

impl SourceImage {
    /// Wrap encoded image bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            dimensions: OnceCell::new(),
        }
    }

    /// The encoded image bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the handle and return the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Pixel dimensions of the image.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::SizeQueryFailure`] if the header cannot be
    /// decoded.
    pub fn dimensions(&self) -> Result<Dimensions, FilterError> {
        if let Some(dimensions) = self.dimensions.get() {
            return Ok(*dimensions);
        }
        let dimensions = query_dimensions(&self.bytes, ImageRole::Source)?;
        Ok(*self.dimensions.get_or_init(|| dimensions))
    }
}

/// Read pixel dimensions from an encoded image header without decoding
/// the pixel data.
///
/// # Errors
///
/// Returns [`FilterError::SizeQueryFailure`] tagged with `role` if the
/// format is unrecognized or the header is corrupt.
pub fn query_dimensions(bytes: &[u8], role: ImageRole) -> Result<Dimensions, FilterError> {
    let size_error = |source| FilterError::SizeQueryFailure { role, source };
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| size_error(image::ImageError::IoError(e)))?
        .into_dimensions()
        .map_err(size_error)?;
    Ok(Dimensions { width, height })
}
