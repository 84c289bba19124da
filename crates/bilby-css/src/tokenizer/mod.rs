//! Stylesheet tokenizer module.
//!
//! Turns raw stylesheet text into a lazy sequence of typed lexemes.

/// The pull-based lexer implementation.
pub mod lexer;
/// Lexeme types and source positions.
pub mod token;

pub use lexer::Lexer;
pub use token::{Lexeme, LexemeKind, SourcePosition, Unit};
