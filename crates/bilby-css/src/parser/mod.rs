//! Stylesheet parser module.
//!
//! Two-phase parsing: selectors become a full AST up front, declaration
//! values stay raw lexeme slices until a typed accessor asks for them.

/// Stylesheet parser implementation.
pub mod css_parser;

pub use css_parser::{ImportLoader, Parser, parse_selector};
