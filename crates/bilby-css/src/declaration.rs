//! Declarations: one property/value pair of a rule set.
//!
//! A declaration keeps its value as the raw lexeme slice the parser captured
//! and converts it on demand. Each typed accessor decodes the lexemes the
//! first time it is called and memoizes the result, so repeated style
//! application does not re-parse values. A malformed value never fails the
//! accessor: it reports to the diagnostic sink and returns the accessor's
//! documented fallback, leaving sibling declarations untouched.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use bilby_common::diagnostics;

use crate::cascade::CachePolicy;
use crate::tokenizer::Lexeme;
use crate::values::{
    AffineTransform, BorderStyle, BorderValue, ColorValue, Dimension, OffsetsValue, ShadowValue,
    SizeValue, decode, raw_text,
};

/// Where a declaration came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// The stylesheet file, when known.
    pub file: Option<String>,
    /// 1-indexed line in the source.
    pub line: u32,
}

/// Which typed accessor produced a memoized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ValueKind {
    Float,
    FloatList,
    Seconds,
    SecondsList,
    String,
    NameList,
    Boolean,
    Color,
    Length,
    Size,
    Offsets,
    Border,
    BorderRadii,
    BorderStyle,
    BorderStyleList,
    Shadow,
    ShadowList,
    Url,
    Transform,
    CachePolicy,
}

/// A decoded declaration value, boxed uniformly so one cache holds them all.
#[derive(Debug, Clone, PartialEq)]
enum DecodedValue {
    Float(f64),
    FloatList(Vec<f64>),
    String(String),
    NameList(Vec<String>),
    Boolean(bool),
    Color(ColorValue),
    Length(Dimension),
    Size(SizeValue),
    Offsets(OffsetsValue),
    Border(BorderValue),
    BorderRadii(Vec<SizeValue>),
    BorderStyle(BorderStyle),
    BorderStyleList(Vec<BorderStyle>),
    Shadow(ShadowValue),
    ShadowList(Vec<ShadowValue>),
    Transform(AffineTransform),
    CachePolicy(CachePolicy),
}

/// One property/value pair inside a rule set.
///
/// Immutable after construction except for the internal decoded-value memo.
#[derive(Debug)]
pub struct Declaration {
    name: String,
    lexemes: Vec<Lexeme>,
    important: bool,
    location: SourceLocation,
    decoded: Mutex<HashMap<ValueKind, DecodedValue>>,
}

impl Clone for Declaration {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            lexemes: self.lexemes.clone(),
            important: self.important,
            location: self.location.clone(),
            decoded: Mutex::new(HashMap::new()),
        }
    }
}

impl PartialEq for Declaration {
    fn eq(&self, other: &Self) -> bool {
        // The memo is derived state; two declarations are equal when their
        // source parts are.
        self.name == other.name
            && self.lexemes == other.lexemes
            && self.important == other.important
    }
}

impl Declaration {
    /// Create a declaration from a property name and its raw value lexemes.
    #[must_use]
    pub fn new(name: impl Into<String>, lexemes: Vec<Lexeme>, important: bool) -> Self {
        Self {
            name: name.into(),
            lexemes,
            important,
            location: SourceLocation::default(),
            decoded: Mutex::new(HashMap::new()),
        }
    }

    /// Create a declaration by lexing a value string, mainly for tests and
    /// programmatic styles.
    #[must_use]
    pub fn from_source(name: impl Into<String>, value: &str) -> Self {
        let lexemes: Vec<Lexeme> = crate::tokenizer::Lexer::new(value)
            .filter(|lx| !lx.is_eof())
            .collect();
        Self::new(name, lexemes, false)
    }

    /// Attach the source location for diagnostics.
    pub fn set_location(&mut self, location: SourceLocation) {
        self.location = location;
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw, unparsed value lexemes.
    #[must_use]
    pub fn lexemes(&self) -> &[Lexeme] {
        &self.lexemes
    }

    /// Whether the declaration carried `!important`.
    #[must_use]
    pub const fn important(&self) -> bool {
        self.important
    }

    /// Where the declaration was written, for diagnostics.
    #[must_use]
    pub const fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Decode-and-memoize plumbing shared by every accessor.
    ///
    /// # Panics
    /// Panics if the memo mutex is poisoned.
    fn decode_memoized<T>(
        &self,
        kind: ValueKind,
        decode_fn: impl FnOnce(&[Lexeme]) -> Result<DecodedValue, crate::values::ValueConversionError>,
        extract: impl FnOnce(&DecodedValue) -> Option<T>,
    ) -> Option<T> {
        let mut cache = self.decoded.lock().unwrap();
        if let Some(value) = cache.get(&kind) {
            return extract(value);
        }
        match decode_fn(&self.lexemes) {
            Ok(value) => {
                let extracted = extract(&value);
                let _ = cache.insert(kind, value);
                extracted
            }
            Err(error) => {
                diagnostics::report(
                    "value",
                    &format!("{error} in '{}'{}", self.name, self.location_suffix()),
                );
                None
            }
        }
    }

    fn location_suffix(&self) -> String {
        match &self.location.file {
            Some(file) => format!(" ({}:{})", file, self.location.line),
            None if self.location.line > 0 => format!(" (line {})", self.location.line),
            None => String::new(),
        }
    }

    /// The value as a number. Fallback: `0.0`.
    #[must_use]
    pub fn float_value(&self) -> f64 {
        self.decode_memoized(
            ValueKind::Float,
            |lx| decode::float(lx).map(DecodedValue::Float),
            |v| match v {
                DecodedValue::Float(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or(0.0)
    }

    /// The value as a comma-delimited number list. Fallback: empty list.
    #[must_use]
    pub fn float_list_value(&self) -> Vec<f64> {
        self.decode_memoized(
            ValueKind::FloatList,
            |lx| decode::float_list(lx).map(DecodedValue::FloatList),
            |v| match v {
                DecodedValue::FloatList(list) => Some(list.clone()),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as a time in seconds. Fallback: `0.0`.
    #[must_use]
    pub fn seconds_value(&self) -> f64 {
        self.decode_memoized(
            ValueKind::Seconds,
            |lx| decode::seconds(lx).map(DecodedValue::Float),
            |v| match v {
                DecodedValue::Float(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or(0.0)
    }

    /// The value as a comma-delimited list of seconds. Fallback: empty list.
    #[must_use]
    pub fn seconds_list_value(&self) -> Vec<f64> {
        self.decode_memoized(
            ValueKind::SecondsList,
            |lx| decode::seconds_list(lx).map(DecodedValue::FloatList),
            |v| match v {
                DecodedValue::FloatList(list) => Some(list.clone()),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as a plain string (quotes stripped). Fallback: empty string.
    #[must_use]
    pub fn string_value(&self) -> String {
        self.decode_memoized(
            ValueKind::String,
            |lx| decode::string(lx).map(DecodedValue::String),
            |v| match v {
                DecodedValue::String(value) => Some(value.clone()),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as a comma-delimited list of names. Fallback: empty list.
    #[must_use]
    pub fn name_list_value(&self) -> Vec<String> {
        self.decode_memoized(
            ValueKind::NameList,
            |lx| decode::name_list(lx).map(DecodedValue::NameList),
            |v| match v {
                DecodedValue::NameList(list) => Some(list.clone()),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as a boolean (`true`/`yes`). Fallback: `false`.
    #[must_use]
    pub fn boolean_value(&self) -> bool {
        self.decode_memoized(
            ValueKind::Boolean,
            |lx| decode::boolean(lx).map(DecodedValue::Boolean),
            |v| match v {
                DecodedValue::Boolean(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or(false)
    }

    /// The value as a color. Fallback: transparent.
    #[must_use]
    pub fn color_value(&self) -> ColorValue {
        self.decode_memoized(
            ValueKind::Color,
            |lx| decode::color(lx).map(DecodedValue::Color),
            |v| match v {
                DecodedValue::Color(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or(ColorValue::TRANSPARENT)
    }

    /// The value as a length. Fallback: zero pixels.
    #[must_use]
    pub fn length_value(&self) -> Dimension {
        self.decode_memoized(
            ValueKind::Length,
            |lx| decode::length(lx).map(DecodedValue::Length),
            |v| match v {
                DecodedValue::Length(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or(Dimension::ZERO)
    }

    /// The value as a width/height pair. Fallback: zero size.
    #[must_use]
    pub fn size_value(&self) -> SizeValue {
        self.decode_memoized(
            ValueKind::Size,
            |lx| decode::size(lx).map(DecodedValue::Size),
            |v| match v {
                DecodedValue::Size(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as per-edge offsets with 1/2/4 expansion. Fallback: zero
    /// offsets.
    #[must_use]
    pub fn offsets_value(&self) -> OffsetsValue {
        self.decode_memoized(
            ValueKind::Offsets,
            |lx| decode::offsets(lx).map(DecodedValue::Offsets),
            |v| match v {
                DecodedValue::Offsets(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as a border (width, style, color). Fallback: zero-width,
    /// no-style, transparent border.
    #[must_use]
    pub fn border_value(&self) -> BorderValue {
        self.decode_memoized(
            ValueKind::Border,
            |lx| decode::border(lx).map(DecodedValue::Border),
            |v| match v {
                DecodedValue::Border(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as four corner radii with 1/2/4 expansion. Fallback: empty
    /// list.
    #[must_use]
    pub fn border_radii_list(&self) -> Vec<SizeValue> {
        self.decode_memoized(
            ValueKind::BorderRadii,
            |lx| decode::border_radii(lx).map(DecodedValue::BorderRadii),
            |v| match v {
                DecodedValue::BorderRadii(list) => Some(list.clone()),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as a border style keyword. Fallback: [`BorderStyle::None`].
    #[must_use]
    pub fn border_style_value(&self) -> BorderStyle {
        self.decode_memoized(
            ValueKind::BorderStyle,
            |lx| decode::border_style(lx).map(DecodedValue::BorderStyle),
            |v| match v {
                DecodedValue::BorderStyle(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as four border styles with 1/2/4 expansion. Fallback:
    /// empty list.
    #[must_use]
    pub fn border_style_list(&self) -> Vec<BorderStyle> {
        self.decode_memoized(
            ValueKind::BorderStyleList,
            |lx| decode::border_style_list(lx).map(DecodedValue::BorderStyleList),
            |v| match v {
                DecodedValue::BorderStyleList(list) => Some(list.clone()),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as a single shadow. Fallback: zeroed shadow.
    #[must_use]
    pub fn shadow_value(&self) -> ShadowValue {
        self.decode_memoized(
            ValueKind::Shadow,
            |lx| decode::shadow(lx).map(DecodedValue::Shadow),
            |v| match v {
                DecodedValue::Shadow(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as a comma-delimited shadow list. Fallback: empty list.
    #[must_use]
    pub fn shadow_list_value(&self) -> Vec<ShadowValue> {
        self.decode_memoized(
            ValueKind::ShadowList,
            |lx| decode::shadow_list(lx).map(DecodedValue::ShadowList),
            |v| match v {
                DecodedValue::ShadowList(list) => Some(list.clone()),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as a URL (from `url(...)` or a string). Fallback: empty
    /// string.
    #[must_use]
    pub fn url_value(&self) -> String {
        self.decode_memoized(
            ValueKind::Url,
            |lx| decode::url(lx).map(DecodedValue::String),
            |v| match v {
                DecodedValue::String(value) => Some(value.clone()),
                _ => None,
            },
        )
        .unwrap_or_default()
    }

    /// The value as an affine transform in SVG transform-list syntax.
    /// Fallback: identity.
    #[must_use]
    pub fn affine_transform_value(&self) -> AffineTransform {
        self.decode_memoized(
            ValueKind::Transform,
            |lx| decode::transform(lx).map(DecodedValue::Transform),
            |v| match v {
                DecodedValue::Transform(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or(AffineTransform::IDENTITY)
    }

    /// The value as a cache policy keyword set. Fallback:
    /// [`CachePolicy::NONE`].
    #[must_use]
    pub fn cache_policy_value(&self) -> CachePolicy {
        self.decode_memoized(
            ValueKind::CachePolicy,
            |lx| decode::cache_policy(lx).map(DecodedValue::CachePolicy),
            |v| match v {
                DecodedValue::CachePolicy(value) => Some(*value),
                _ => None,
            },
        )
        .unwrap_or(CachePolicy::NONE)
    }

    /// The value parsed as any keyword enum, e.g. a text alignment or any
    /// other `strum`-derived keyword set. No memoization beyond the string
    /// form; parsing a keyword is cheap. Fallback: `T::default()`.
    #[must_use]
    pub fn keyword_value<T>(&self) -> T
    where
        T: FromStr + Default,
    {
        T::from_str(self.string_value().trim()).unwrap_or_default()
    }

    /// The raw value text, whitespace-collapsed.
    #[must_use]
    pub fn value_text(&self) -> String {
        raw_text(&self.lexemes)
    }
}
