//! Shared types for the foldimg filter pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new dimensions value.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Which image a size query was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    /// The image carried in the response body.
    Source,
    /// An auxiliary asset composited on top of the source.
    Overlay,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Overlay => f.write_str("overlay"),
        }
    }
}

/// Errors raised while compiling a filter chain or transforming a response.
///
/// The first four variants are construction-time errors: they surface when
/// a chain is compiled and prevent it from ever serving traffic. The rest
/// are request-time errors and abort only the transformation in progress.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// A filter received the wrong number of positional arguments.
    #[error("{filter}: expected {expected} arguments, got {actual}")]
    InvalidParameterCount {
        /// Filter name as declared.
        filter: &'static str,
        /// Human-readable accepted counts (e.g. "2 or 3").
        expected: &'static str,
        /// Number of arguments supplied.
        actual: usize,
    },

    /// A positional argument could not be read as the declared type.
    #[error("{filter}: argument {index} must be {expected}, got {actual}")]
    InvalidParameterType {
        /// Filter name as declared.
        filter: &'static str,
        /// Zero-based argument position.
        index: usize,
        /// Description of the accepted type.
        expected: &'static str,
        /// Rendering of the offending value.
        actual: String,
    },

    /// An anchor or gravity token is not part of the closed token set.
    #[error("{filter}: unrecognized {kind} `{value}`")]
    InvalidEnumValue {
        /// Filter name as declared.
        filter: &'static str,
        /// Which token set was consulted ("anchor", "gravity").
        kind: &'static str,
        /// The rejected token.
        value: String,
    },

    /// No filter is registered under the declared name.
    #[error("unknown filter `{0}`")]
    UnknownFilter(String),

    /// An overlay asset could not be read.
    #[error("overlay asset `{path}` is unavailable: {source}")]
    ResourceUnavailable {
        /// Asset path as configured on the filter.
        path: String,
        /// Underlying read failure.
        #[source]
        source: std::io::Error,
    },

    /// Reading the pixel dimensions of an image failed.
    #[error("failed to query {role} image size: {source}")]
    SizeQueryFailure {
        /// Which image was being measured.
        role: ImageRole,
        /// Underlying decoder failure.
        #[source]
        source: image::ImageError,
    },

    /// The stage executor failed to process the image.
    #[error("stage execution failed: {0}")]
    Execution(#[source] image::ImageError),
}

impl FilterError {
    /// Whether this error can only occur while compiling a chain.
    #[must_use]
    pub const fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameterCount { .. }
                | Self::InvalidParameterType { .. }
                | Self::InvalidEnumValue { .. }
                | Self::UnknownFilter(_)
        )
    }
}
