//! Geometric declaration values: sizes, edge offsets and affine transforms.

use serde::Serialize;

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SizeValue {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl SizeValue {
    /// A size with equal width and height.
    #[must_use]
    pub const fn square(side: f64) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

/// Per-edge offsets (insets) in pixels, in CSS top/right/bottom/left order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OffsetsValue {
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
    /// Left edge.
    pub left: f64,
}

impl OffsetsValue {
    /// Offsets with the same value on every edge.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// A 2D affine transform in the usual `[a b c d tx ty]` form:
///
/// ```text
/// | a  b  0 |
/// | c  d  0 |
/// | tx ty 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AffineTransform {
    /// Row 1, column 1.
    pub a: f64,
    /// Row 1, column 2.
    pub b: f64,
    /// Row 2, column 1.
    pub c: f64,
    /// Row 2, column 2.
    pub d: f64,
    /// Translation x.
    pub tx: f64,
    /// Translation y.
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    /// The identity transform — the documented fallback for malformed
    /// transform values.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// A translation.
    #[must_use]
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    /// A scale.
    #[must_use]
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// A rotation by `angle` radians about the origin.
    #[must_use]
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// A horizontal skew by `angle` radians.
    #[must_use]
    pub fn skew_x(angle: f64) -> Self {
        Self {
            c: angle.tan(),
            ..Self::IDENTITY
        }
    }

    /// A vertical skew by `angle` radians.
    #[must_use]
    pub fn skew_y(angle: f64) -> Self {
        Self {
            b: angle.tan(),
            ..Self::IDENTITY
        }
    }

    /// Concatenate: the returned transform applies `self` first, then
    /// `other`.
    #[must_use]
    pub fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.tx * other.a + self.ty * other.c + other.tx,
            ty: self.tx * other.b + self.ty * other.d + other.ty,
        }
    }
}
