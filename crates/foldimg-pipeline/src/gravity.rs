//! Anchor and gravity tokens.
//!
//! Filters accept positions as short textual tokens. Each token set is a
//! closed enum resolved by an exhaustive `match`, so there are no lookup
//! tables to build or share.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Gravity understood by the stage executor when cutting a crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    /// Keep the middle of the image.
    #[default]
    Center,
    /// Keep the top edge.
    North,
    /// Keep the right edge.
    East,
    /// Keep the bottom edge.
    South,
    /// Keep the left edge.
    West,
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Center => "center",
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(s)
    }
}

/// Crop anchor token: `north`, `south`, `east`, `west` or `center`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropAnchor {
    North,
    South,
    East,
    West,
    #[default]
    Center,
}

impl CropAnchor {
    /// Parse a crop anchor token. Tokens are case-sensitive.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "north" => Some(Self::North),
            "south" => Some(Self::South),
            "east" => Some(Self::East),
            "west" => Some(Self::West),
            "center" => Some(Self::Center),
            _ => None,
        }
    }

    /// The executor gravity this anchor maps to.
    #[must_use]
    pub const fn gravity(self) -> Gravity {
        match self {
            Self::North => Gravity::North,
            Self::South => Gravity::South,
            Self::East => Gravity::East,
            Self::West => Gravity::West,
            Self::Center => Gravity::Center,
        }
    }
}

/// Vertical component of an overlay gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    North,
    Center,
    South,
}

/// Horizontal component of an overlay gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    West,
    Center,
    East,
}

/// Compound overlay gravity such as `NE` (north-east) or `CC` (centered).
///
/// The first letter picks the vertical class (`N`, `C`, `S`), the second
/// the horizontal class (`E`, `C`, `W`). Both resolve independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayGravity {
    pub vertical: VerticalAlign,
    pub horizontal: HorizontalAlign,
}

impl OverlayGravity {
    /// Parse one of the nine two-letter gravity tokens.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        use HorizontalAlign as H;
        use VerticalAlign as V;

        let (vertical, horizontal) = match token {
            "NE" => (V::North, H::East),
            "NC" => (V::North, H::Center),
            "NW" => (V::North, H::West),
            "CE" => (V::Center, H::East),
            "CC" => (V::Center, H::Center),
            "CW" => (V::Center, H::West),
            "SE" => (V::South, H::East),
            "SC" => (V::South, H::Center),
            "SW" => (V::South, H::West),
            _ => return None,
        };
        Some(Self {
            vertical,
            horizontal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_anchor_defaults_to_center() {
        assert_eq!(CropAnchor::default(), CropAnchor::Center);
        assert_eq!(CropAnchor::default().gravity(), Gravity::Center);
    }

    #[test]
    fn crop_anchor_tokens_map_to_matching_gravity() {
        for (token, gravity) in [
            ("north", Gravity::North),
            ("south", Gravity::South),
            ("east", Gravity::East),
            ("west", Gravity::West),
            ("center", Gravity::Center),
        ] {
            let anchor = CropAnchor::from_token(token);
            assert_eq!(anchor.map(CropAnchor::gravity), Some(gravity), "{token}");
        }
    }

    #[test]
    fn crop_anchor_rejects_unknown_and_wrong_case() {
        assert_eq!(CropAnchor::from_token("top"), None);
        assert_eq!(CropAnchor::from_token("North"), None);
        assert_eq!(CropAnchor::from_token(""), None);
    }

    #[test]
    fn overlay_gravity_splits_into_axes() {
        let g = OverlayGravity::from_token("SW");
        assert_eq!(
            g,
            Some(OverlayGravity {
                vertical: VerticalAlign::South,
                horizontal: HorizontalAlign::West,
            })
        );
    }

    #[test]
    fn all_nine_overlay_tokens_parse() {
        let tokens = ["NE", "NC", "NW", "CE", "CC", "CW", "SE", "SC", "SW"];
        for token in tokens {
            assert!(OverlayGravity::from_token(token).is_some(), "{token}");
        }
    }

    #[test]
    fn overlay_gravity_rejects_partial_and_reversed_tokens() {
        for token in ["N", "EN", "ne", "NNE", "XX", ""] {
            assert!(OverlayGravity::from_token(token).is_none(), "{token}");
        }
    }

    #[test]
    fn gravity_serializes_lowercase() {
        let json = serde_json::to_string(&Gravity::North);
        assert_eq!(json.ok().as_deref(), Some("\"north\""));
    }
}
