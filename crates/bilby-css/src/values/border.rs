//! Border and shadow declaration values.

use serde::Serialize;
use strum_macros::{Display as StrumDisplay, EnumString};

use super::color::ColorValue;
use super::dimension::Dimension;

/// Border line styles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, StrumDisplay, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BorderStyle {
    /// No border line.
    #[default]
    None,
    /// Like `none`, but wins border-conflict resolution in tables.
    Hidden,
    /// A dotted line.
    Dotted,
    /// A dashed line.
    Dashed,
    /// A solid line.
    Solid,
    /// Two parallel solid lines.
    Double,
    /// A carved groove.
    Groove,
    /// A raised ridge.
    Ridge,
    /// An inset frame.
    Inset,
    /// An outset frame.
    Outset,
}

/// One border edge: width, line style and color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BorderValue {
    /// Line width.
    pub width: Dimension,
    /// Line style.
    pub style: BorderStyle,
    /// Line color.
    pub color: ColorValue,
}

impl Default for BorderValue {
    /// The documented fallback for malformed border values: zero width,
    /// no style, transparent color.
    fn default() -> Self {
        Self {
            width: Dimension::ZERO,
            style: BorderStyle::None,
            color: ColorValue::TRANSPARENT,
        }
    }
}

/// One shadow: offsets, blur/spread radii and color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShadowValue {
    /// True for `inset` shadows.
    pub inset: bool,
    /// Horizontal offset in pixels.
    pub h_offset: f64,
    /// Vertical offset in pixels.
    pub v_offset: f64,
    /// Blur radius in pixels.
    pub blur: f64,
    /// Spread radius in pixels.
    pub spread: f64,
    /// Shadow color.
    pub color: ColorValue,
}

impl Default for ShadowValue {
    fn default() -> Self {
        Self {
            inset: false,
            h_offset: 0.0,
            v_offset: 0.0,
            blur: 0.0,
            spread: 0.0,
            color: ColorValue::BLACK,
        }
    }
}
