//! Dimensioned numbers: lengths, angles and times with their units.

use core::fmt;

use serde::Serialize;

use crate::tokenizer::Unit;

/// Reference font size used to resolve font-relative lengths when no live
/// font metrics are available.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// A number with a unit, e.g. `12px` or `0.25s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimension {
    /// The numeric value as written.
    pub value: f64,
    /// The unit it was written in.
    pub unit: Unit,
}

impl Dimension {
    /// A zero-length pixel dimension — the documented fallback for
    /// malformed length values.
    pub const ZERO: Self = Self {
        value: 0.0,
        unit: Unit::Px,
    };

    /// A pixel length.
    #[must_use]
    pub const fn px(value: f64) -> Self {
        Self {
            value,
            unit: Unit::Px,
        }
    }

    /// Resolve a length to pixels. Font-relative units use
    /// [`DEFAULT_FONT_SIZE`]; physical units assume 96 px per inch.
    /// Non-length units return their raw value.
    #[must_use]
    pub fn to_px(&self) -> f64 {
        match self.unit {
            Unit::Px | Unit::Dpx => self.value,
            Unit::Em | Unit::Rem => self.value * DEFAULT_FONT_SIZE,
            Unit::Pt => self.value * 96.0 / 72.0,
            Unit::In => self.value * 96.0,
            Unit::Cm => self.value * 96.0 / 2.54,
            Unit::Mm => self.value * 96.0 / 25.4,
            _ => self.value,
        }
    }

    /// Resolve a time to seconds. Non-time units return their raw value.
    #[must_use]
    pub fn to_seconds(&self) -> f64 {
        match self.unit {
            Unit::Ms => self.value / 1000.0,
            _ => self.value,
        }
    }

    /// Resolve an angle to radians. Plain numbers are taken as degrees
    /// (SVG transform convention). Non-angle units return their raw value.
    #[must_use]
    pub fn to_radians(&self) -> f64 {
        match self.unit {
            Unit::Deg => self.value.to_radians(),
            Unit::Grad => self.value * core::f64::consts::PI / 200.0,
            _ => self.value,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}
