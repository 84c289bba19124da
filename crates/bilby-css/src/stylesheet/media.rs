//! Media groups and media query evaluation.
//!
//! A media group bundles rule sets behind a query expression; its rules only
//! take part in matching while the query holds against the embedder-supplied
//! [`MediaContext`]. Queries are a small boolean-evaluable expression tree:
//! comma = any-of, `and` = all-of, leaves are media types or `(feature:
//! value)` terms.

use std::str::FromStr;

use strum_macros::{Display as StrumDisplay, EnumString};

use super::{Origin, RuleSet};

/// Display orientation, as exposed to `(orientation: ...)` queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, StrumDisplay)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Orientation {
    /// Wider than tall.
    #[default]
    Landscape,
    /// Taller than wide.
    Portrait,
}

/// The display metrics media queries are evaluated against.
///
/// The embedder owns these values and pushes updates into the style engine
/// when the display changes (rotation, window resize, monitor move).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaContext {
    /// Viewport width in points.
    pub width: f64,
    /// Viewport height in points.
    pub height: f64,
    /// Physical device width in points.
    pub device_width: f64,
    /// Physical device height in points.
    pub device_height: f64,
    /// Device pixels per point.
    pub device_pixel_ratio: f64,
    /// Current orientation.
    pub orientation: Orientation,
}

impl Default for MediaContext {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
            device_width: 1024.0,
            device_height: 768.0,
            device_pixel_ratio: 1.0,
            orientation: Orientation::Landscape,
        }
    }
}

/// The value side of a `(feature: value)` media term.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaFeatureValue {
    /// A bare number (e.g. a pixel ratio).
    Number(f64),
    /// A length, normalized to points.
    Length(f64),
    /// An identifier (e.g. `portrait`).
    Ident(String),
}

impl MediaFeatureValue {
    /// The numeric value, when there is one.
    #[must_use]
    pub const fn number(&self) -> Option<f64> {
        match self {
            Self::Number(value) | Self::Length(value) => Some(*value),
            Self::Ident(_) => None,
        }
    }
}

/// A boolean-evaluable media query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaExpression {
    /// Comma list: true when any branch is.
    AnyOf(Vec<MediaExpression>),
    /// `and` chain: true when every branch is.
    AllOf(Vec<MediaExpression>),
    /// A media type such as `screen`. `all` and `screen` hold; anything
    /// else (print, speech, …) does not apply to an interactive UI.
    MediaType(String),
    /// A `(feature)` or `(feature: value)` term. Unknown features never
    /// hold, so an unrecognized query disables its group rather than
    /// enabling it everywhere.
    Feature {
        /// The feature name, lowercased (`min-width`, `orientation`, …).
        name: String,
        /// The declared value, if any.
        value: Option<MediaFeatureValue>,
    },
}

impl MediaExpression {
    /// Evaluate the expression against the current display metrics.
    #[must_use]
    pub fn evaluate(&self, context: &MediaContext) -> bool {
        match self {
            Self::AnyOf(branches) => branches.iter().any(|b| b.evaluate(context)),
            Self::AllOf(branches) => branches.iter().all(|b| b.evaluate(context)),
            Self::MediaType(name) => {
                name.eq_ignore_ascii_case("all") || name.eq_ignore_ascii_case("screen")
            }
            Self::Feature { name, value } => evaluate_feature(name, value.as_ref(), context),
        }
    }
}

/// Evaluate one `(feature: value)` term.
fn evaluate_feature(
    name: &str,
    value: Option<&MediaFeatureValue>,
    context: &MediaContext,
) -> bool {
    let number = value.and_then(MediaFeatureValue::number);
    match name {
        "width" => number.is_some_and(|v| approx_eq(context.width, v)),
        "min-width" => number.is_some_and(|v| context.width >= v),
        "max-width" => number.is_some_and(|v| context.width <= v),
        "height" => number.is_some_and(|v| approx_eq(context.height, v)),
        "min-height" => number.is_some_and(|v| context.height >= v),
        "max-height" => number.is_some_and(|v| context.height <= v),
        "device-width" => number.is_some_and(|v| approx_eq(context.device_width, v)),
        "min-device-width" => number.is_some_and(|v| context.device_width >= v),
        "max-device-width" => number.is_some_and(|v| context.device_width <= v),
        "device-height" => number.is_some_and(|v| approx_eq(context.device_height, v)),
        "min-device-height" => number.is_some_and(|v| context.device_height >= v),
        "max-device-height" => number.is_some_and(|v| context.device_height <= v),
        "device-pixel-ratio" => number.is_some_and(|v| approx_eq(context.device_pixel_ratio, v)),
        "min-device-pixel-ratio" => number.is_some_and(|v| context.device_pixel_ratio >= v),
        "max-device-pixel-ratio" => number.is_some_and(|v| context.device_pixel_ratio <= v),
        "orientation" => match value {
            Some(MediaFeatureValue::Ident(ident)) => Orientation::from_str(ident)
                .is_ok_and(|orientation| orientation == context.orientation),
            _ => false,
        },
        _ => false,
    }
}

/// Float comparison loose enough for point metrics.
fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.5
}

/// A conditionally active bundle of rule sets.
#[derive(Debug, Clone)]
pub struct MediaGroup {
    query: MediaExpression,
    rule_sets: Vec<RuleSet>,
    origin: Origin,
}

impl MediaGroup {
    /// Create an empty group for a query.
    #[must_use]
    pub const fn new(query: MediaExpression, origin: Origin) -> Self {
        Self {
            query,
            rule_sets: Vec::new(),
            origin,
        }
    }

    /// The group's query expression.
    #[must_use]
    pub const fn query(&self) -> &MediaExpression {
        &self.query
    }

    /// The origin tier of the owning stylesheet.
    #[must_use]
    pub const fn origin(&self) -> Origin {
        self.origin
    }

    /// The rule sets inside this group, in source order.
    #[must_use]
    pub fn rule_sets(&self) -> &[RuleSet] {
        &self.rule_sets
    }

    /// Iterator form of [`MediaGroup::rule_sets`].
    pub fn rule_sets_iter(&self) -> std::slice::Iter<'_, RuleSet> {
        self.rule_sets.iter()
    }

    /// Append a rule set to the group.
    pub fn add_rule_set(&mut self, rule_set: RuleSet) {
        self.rule_sets.push(rule_set);
    }

    /// Does the group's query currently hold?
    #[must_use]
    pub fn is_active(&self, context: &MediaContext) -> bool {
        self.query.evaluate(context)
    }
}
