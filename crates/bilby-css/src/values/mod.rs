//! Typed declaration values and their decoders.
//!
//! Declaration values stay as raw lexeme slices until one of the typed
//! accessors on [`crate::declaration::Declaration`] asks for them. The
//! decoders here are pure functions from a lexeme slice to a typed value:
//! deterministic, no I/O, no globals. Failures are a normal outcome — every
//! accessor has a documented fallback — so decoders return
//! [`ValueConversionError`] and never panic.

mod border;
mod color;
mod dimension;
mod geometry;

pub(crate) mod decode;

use thiserror::Error;

use crate::tokenizer::Lexeme;

pub use border::{BorderStyle, BorderValue, ShadowValue};
pub use color::ColorValue;
pub use dimension::Dimension;
pub use geometry::{AffineTransform, OffsetsValue, SizeValue};

/// A declaration value that could not be converted to the requested type.
///
/// Always recoverable: the accessor that produced it substitutes its
/// documented fallback and reports the failure to the diagnostic sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {expected} value \"{text}\"")]
pub struct ValueConversionError {
    /// The value type that was requested.
    pub expected: &'static str,
    /// The raw source text that failed to convert.
    pub text: String,
}

impl ValueConversionError {
    /// Build an error quoting the offending lexemes.
    #[must_use]
    pub fn new(expected: &'static str, lexemes: &[Lexeme]) -> Self {
        Self {
            expected,
            text: raw_text(lexemes),
        }
    }
}

/// Join the raw text of a lexeme run, collapsing whitespace to single spaces.
#[must_use]
pub fn raw_text(lexemes: &[Lexeme]) -> String {
    let mut out = String::new();
    for lexeme in lexemes {
        if lexeme.is_whitespace() {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
        } else {
            out.push_str(&lexeme.text);
        }
    }
    out.trim().to_string()
}
