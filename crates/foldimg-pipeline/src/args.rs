//! Typed positional filter arguments.
//!
//! The argument parser in front of this crate hands each filter a list of
//! already-tokenized values. Filters read them through [`ArgReader`],
//! which turns shape mismatches into the matching [`FilterError`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::FilterError;

/// A single positional filter argument.
///
/// Deserializes untagged, so a JSON chain config can list arguments as
/// plain values: `[200, 100, "north"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// String literal or bare token.
    Str(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// Reads positional arguments on behalf of one filter.
pub(crate) struct ArgReader<'a> {
    filter: &'static str,
    args: &'a [Arg],
}

impl<'a> ArgReader<'a> {
    pub(crate) const fn new(filter: &'static str, args: &'a [Arg]) -> Self {
        Self { filter, args }
    }

    pub(crate) const fn len(&self) -> usize {
        self.args.len()
    }

    /// Fail with [`FilterError::InvalidParameterCount`] unless the argument
    /// count is one of `accepted`.
    pub(crate) fn require_count(
        &self,
        accepted: &[usize],
        expected: &'static str,
    ) -> Result<(), FilterError> {
        if accepted.contains(&self.args.len()) {
            Ok(())
        } else {
            Err(FilterError::InvalidParameterCount {
                filter: self.filter,
                expected,
                actual: self.args.len(),
            })
        }
    }

    /// Read an integer. Floats with no fractional part are accepted, since
    /// some front-ends only produce one numeric type.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub(crate) fn int(&self, index: usize) -> Result<i64, FilterError> {
        // 2^63; `i64::MAX as f64` rounds up to this value.
        const UPPER: f64 = 9_223_372_036_854_775_808.0;
        match self.get(index)? {
            Arg::Int(v) => Ok(*v),
            Arg::Float(v)
                if v.is_finite() && v.fract() == 0.0 && *v >= -UPPER && *v < UPPER =>
            {
                Ok(*v as i64)
            }
            other => Err(self.type_error(index, "an integer", other)),
        }
    }

    /// Read a non-negative integer that fits a pixel dimension.
    pub(crate) fn dimension(&self, index: usize) -> Result<u32, FilterError> {
        let value = self.int(index)?;
        u32::try_from(value).map_err(|_| FilterError::InvalidParameterType {
            filter: self.filter,
            index,
            expected: "a non-negative integer",
            actual: value.to_string(),
        })
    }

    /// Read a signed pixel offset such as a margin.
    pub(crate) fn offset(&self, index: usize) -> Result<i32, FilterError> {
        let value = self.int(index)?;
        i32::try_from(value).map_err(|_| FilterError::InvalidParameterType {
            filter: self.filter,
            index,
            expected: "a 32-bit integer",
            actual: value.to_string(),
        })
    }

    /// Read a float. Integers are widened.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn float(&self, index: usize) -> Result<f64, FilterError> {
        match self.get(index)? {
            Arg::Float(v) if !v.is_nan() => Ok(*v),
            Arg::Int(v) => Ok(*v as f64),
            other => Err(self.type_error(index, "a number", other)),
        }
    }

    pub(crate) fn string(&self, index: usize) -> Result<&'a str, FilterError> {
        match self.get(index)? {
            Arg::Str(s) => Ok(s.as_str()),
            other => Err(self.type_error(index, "a string", other)),
        }
    }

    /// Build a [`FilterError::InvalidEnumValue`] for this filter.
    pub(crate) fn enum_error(&self, kind: &'static str, value: &str) -> FilterError {
        FilterError::InvalidEnumValue {
            filter: self.filter,
            kind,
            value: value.to_string(),
        }
    }

    fn get(&self, index: usize) -> Result<&'a Arg, FilterError> {
        self.args
            .get(index)
            .ok_or(FilterError::InvalidParameterCount {
                filter: self.filter,
                expected: "more",
                actual: self.args.len(),
            })
    }

    fn type_error(&self, index: usize, expected: &'static str, actual: &Arg) -> FilterError {
        FilterError::InvalidParameterType {
            filter: self.filter,
            index,
            expected,
            actual: actual.to_string(),
        }
    }
}
