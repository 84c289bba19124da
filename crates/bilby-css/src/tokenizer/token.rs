//! Lexeme types produced by the stylesheet tokenizer.
//!
//! The lexeme set covers the selector grammar (identifiers, ids, classes,
//! combinator punctuation, attribute operators, pseudo-class keywords) and
//! the declaration value grammar (numbers with units, percentages, strings,
//! hex colors, urls, functions). Every lexeme carries its raw source text and
//! position so deferred value decoding and diagnostics can point back at the
//! stylesheet.

use core::fmt;
use std::str::FromStr;

use serde::Serialize;
use strum_macros::{Display as StrumDisplay, EnumString};

/// A position in stylesheet source text.
///
/// Lines and columns are 1-indexed; `offset` is the byte-independent char
/// offset from the start of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourcePosition {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
    /// 0-indexed char offset from the start of the source.
    pub offset: usize,
}

impl SourcePosition {
    /// The start of the source.
    #[must_use]
    pub const fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Dimension units recognized by the tokenizer: lengths, angles, times and
/// frequencies. Percentages are a separate lexeme kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, StrumDisplay, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Unit {
    /// Device-independent pixels.
    Px,
    /// Font-relative length (current font size).
    Em,
    /// Font-relative length (root font size).
    Rem,
    /// Points (1/72 inch).
    Pt,
    /// Centimeters.
    Cm,
    /// Millimeters.
    Mm,
    /// Inches.
    In,
    /// Device pixels (scale-dependent).
    Dpx,
    /// Angle in degrees.
    Deg,
    /// Angle in radians.
    Rad,
    /// Angle in gradians.
    Grad,
    /// Time in seconds.
    S,
    /// Time in milliseconds.
    Ms,
    /// Frequency in hertz.
    Hz,
    /// Frequency in kilohertz.
    Khz,
}

impl Unit {
    /// True for length units (px, em, rem, pt, cm, mm, in, dpx).
    #[must_use]
    pub const fn is_length(self) -> bool {
        matches!(
            self,
            Self::Px | Self::Em | Self::Rem | Self::Pt | Self::Cm | Self::Mm | Self::In | Self::Dpx
        )
    }

    /// True for time units (s, ms).
    #[must_use]
    pub const fn is_time(self) -> bool {
        matches!(self, Self::S | Self::Ms)
    }

    /// True for angle units (deg, rad, grad).
    #[must_use]
    pub const fn is_angle(self) -> bool {
        matches!(self, Self::Deg | Self::Rad | Self::Grad)
    }
}

/// The kind of a [`Lexeme`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LexemeKind {
    /// An identifier, e.g. `solid` or `background-color`.
    Ident(String),
    /// A function name followed by `(`, e.g. `rgb(`.
    Function(String),
    /// An `@` keyword, e.g. `@media` (value excludes the `@`).
    AtKeyword(String),
    /// `#` followed by 3/4/6/8 hex digits: a hex color in value position,
    /// and also a legal id selector in selector position.
    HexColor(String),
    /// `#` followed by a non-hex-shaped identifier: an id selector.
    Hash(String),
    /// A class selector fragment: `.` followed by an identifier.
    Class(String),
    /// A quoted string with quotes removed and escapes resolved.
    QuotedString(String),
    /// A `url(...)` value with the wrapper removed.
    Url(String),
    /// A unitless number.
    Number {
        /// The numeric value.
        value: f64,
        /// The integer value, when the source had no fraction or exponent.
        int_value: Option<i64>,
    },
    /// A number with a unit, e.g. `12px` or `250ms`.
    Dimension {
        /// The numeric value.
        value: f64,
        /// The integer value, when the source had no fraction or exponent.
        int_value: Option<i64>,
        /// The unit as written, lowercased (may be unknown, e.g. the `n` of
        /// an `nth-child` argument).
        unit: String,
    },
    /// A number followed by `%`.
    Percentage(f64),
    /// A known non-functional pseudo-class keyword, e.g. `:hover`.
    PseudoClass(String),
    /// A pseudo-element, e.g. `::before`.
    PseudoElement(String),
    /// A functional pseudo-class with its `(` consumed, e.g. `:nth-child(`.
    PseudoFunction(String),
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `;`
    Semicolon,
    /// `:` (not introducing a known pseudo-class)
    Colon,
    /// `,`
    Comma,
    /// `>` (child combinator)
    Greater,
    /// `+` (adjacent sibling combinator)
    Plus,
    /// `~` (general sibling combinator)
    Tilde,
    /// `*` (universal selector)
    Star,
    /// `|` (namespace separator)
    Pipe,
    /// `=` (attribute equals operator)
    Equal,
    /// `~=` (attribute whitespace-list-contains operator)
    ListContains,
    /// `|=` (attribute hyphen-prefix operator)
    DashMatch,
    /// `^=` (attribute starts-with operator)
    StartsWith,
    /// `$=` (attribute ends-with operator)
    EndsWith,
    /// `*=` (attribute contains-substring operator)
    Contains,
    /// One or more whitespace characters (significant between selectors:
    /// it is the descendant combinator).
    Whitespace,
    /// Any other single character.
    Delim(char),
    /// An unrecognized character the tokenizer could not form a lexeme from.
    /// Never fatal: the parser decides how to recover.
    Error(char),
    /// End of input sentinel. Emitted exactly once, as the last lexeme.
    Eof,
}

/// One token of stylesheet source: kind, raw text and position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lexeme {
    /// What was recognized.
    pub kind: LexemeKind,
    /// The raw source text this lexeme covers.
    pub text: String,
    /// Where the lexeme starts.
    pub position: SourcePosition,
}

impl Lexeme {
    /// Returns true if this is the end-of-input sentinel.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, LexemeKind::Eof)
    }

    /// Returns true if this is a whitespace lexeme.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self.kind, LexemeKind::Whitespace)
    }

    /// The numeric value of a number, dimension or percentage lexeme.
    #[must_use]
    pub fn number_value(&self) -> Option<f64> {
        match &self.kind {
            LexemeKind::Number { value, .. } | LexemeKind::Dimension { value, .. } => Some(*value),
            LexemeKind::Percentage(value) => Some(*value),
            _ => None,
        }
    }

    /// The recognized [`Unit`] of a dimension lexeme, if its unit is known.
    #[must_use]
    pub fn unit(&self) -> Option<Unit> {
        match &self.kind {
            LexemeKind::Dimension { unit, .. } => Unit::from_str(unit).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LexemeKind::Ident(v) => write!(f, "<ident:{v}>"),
            LexemeKind::Function(v) => write!(f, "<function:{v}(>"),
            LexemeKind::AtKeyword(v) => write!(f, "<at-keyword:@{v}>"),
            LexemeKind::HexColor(v) => write!(f, "<hex-color:#{v}>"),
            LexemeKind::Hash(v) => write!(f, "<id:#{v}>"),
            LexemeKind::Class(v) => write!(f, "<class:.{v}>"),
            LexemeKind::QuotedString(v) => write!(f, "<string:\"{v}\">"),
            LexemeKind::Url(v) => write!(f, "<url:{v}>"),
            LexemeKind::Number { value, .. } => write!(f, "<number:{value}>"),
            LexemeKind::Dimension { value, unit, .. } => write!(f, "<dimension:{value}{unit}>"),
            LexemeKind::Percentage(value) => write!(f, "<percentage:{value}%>"),
            LexemeKind::PseudoClass(v) => write!(f, "<pseudo-class::{v}>"),
            LexemeKind::PseudoElement(v) => write!(f, "<pseudo-element:::{v}>"),
            LexemeKind::PseudoFunction(v) => write!(f, "<pseudo-function::{v}(>"),
            LexemeKind::LBrace => write!(f, "<{{>"),
            LexemeKind::RBrace => write!(f, "<}}>"),
            LexemeKind::LParen => write!(f, "<(>"),
            LexemeKind::RParen => write!(f, "<)>"),
            LexemeKind::LBracket => write!(f, "<[>"),
            LexemeKind::RBracket => write!(f, "<]>"),
            LexemeKind::Semicolon => write!(f, "<;>"),
            LexemeKind::Colon => write!(f, "<:>"),
            LexemeKind::Comma => write!(f, "<,>"),
            LexemeKind::Greater => write!(f, "<>>"),
            LexemeKind::Plus => write!(f, "<+>"),
            LexemeKind::Tilde => write!(f, "<~>"),
            LexemeKind::Star => write!(f, "<*>"),
            LexemeKind::Pipe => write!(f, "<|>"),
            LexemeKind::Equal => write!(f, "<=>"),
            LexemeKind::ListContains => write!(f, "<~=>"),
            LexemeKind::DashMatch => write!(f, "<|=>"),
            LexemeKind::StartsWith => write!(f, "<^=>"),
            LexemeKind::EndsWith => write!(f, "<$=>"),
            LexemeKind::Contains => write!(f, "<*=>"),
            LexemeKind::Whitespace => write!(f, "<whitespace>"),
            LexemeKind::Delim(c) => write!(f, "<delim:{c}>"),
            LexemeKind::Error(c) => write!(f, "<error:{c}@{}>", self.position),
            LexemeKind::Eof => write!(f, "<EOF>"),
        }
    }
}
