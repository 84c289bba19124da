//! CSS tokenizer, parser, selector matching, cascade, and style resolution
//! for the Bilby styling engine.
//!
//! # Scope
//!
//! This crate decides *what values apply* to a node of an application's
//! element tree; it never draws anything. It implements:
//!
//! - **Tokenizer** — a lazy, restartable lexeme sequence over stylesheet
//!   text: identifiers, dimensioned numbers, strings, hex colors, urls,
//!   attribute operators, pseudo-class keywords, and an error lexeme for
//!   anything unrecognized.
//!
//! - **Parser** — two-phase: selectors become a full AST up front while
//!   declaration values stay raw lexeme slices; `@media`, `@import` (with
//!   cycle rejection), `@font-face`, `@keyframes` and `@namespace`; error
//!   recovery to the next rule boundary with problems accumulated on the
//!   stylesheet.
//!
//! - **Selectors** — a closed tagged union with per-variant matching and
//!   specificity accumulation: types (namespaced/universal), all four
//!   combinators, attribute operators (`= ~= |= ^= $= *=`), structural
//!   pseudo-classes including the functional `nth-*(an+b)` family, and
//!   negation.
//!
//! - **Cascade & cache** — per-origin stylesheet stacking, (origin,
//!   specificity, source order) merging with an `!important` tier, the
//!   per-node/state resolution cache with generation-counter invalidation,
//!   and subtree-propagation and image-cache policies.
//!
//! - **Declaration values** — lazy, memoized typed accessors (colors,
//!   lengths, borders, shadows, offsets, transforms, lists) with documented
//!   fallbacks on malformed input.
//!
//! # Not in scope
//!
//! Rendering, animation playback, platform widget bindings, image decoding,
//! and stylesheet acquisition (file/network) all live with the embedder.
//! The [`parser::ImportLoader`] trait and the [`bilby_tree::Styleable`]
//! trait are the seams they plug into.

/// Cascade ordering, the matching engine and the style caches.
pub mod cascade;
/// Declarations and their typed, lazily decoded values.
pub mod declaration;
/// Stylesheet parser.
pub mod parser;
/// Selector model, matching and specificity.
pub mod selector;
/// Stylesheets, rule sets, media groups and keyframes.
pub mod stylesheet;
/// Stylesheet tokenizer.
pub mod tokenizer;
/// Typed declaration values and decoders.
pub mod values;

// Re-exports for convenience
pub use cascade::{AssetKey, CachePolicy, ImageCache, StyleCache, StyleEngine, StyleInfo};
pub use declaration::{Declaration, SourceLocation};
pub use parser::{ImportLoader, Parser, parse_selector};
pub use selector::{
    AttributeExpression, AttributeOperator, CombinatorKind, CombinatorSelector,
    PseudoClassFunction, PseudoClassFunctionKind, PseudoClassPredicate, Selector, Specificity,
    SpecificityType, TypeSelector,
};
pub use stylesheet::{
    FontFace, Keyframe, KeyframeBlock, MediaContext, MediaExpression, MediaFeatureValue,
    MediaGroup, Orientation, Origin, ParseError, ParseErrorKind, RuleSet, Stylesheet,
};
pub use tokenizer::{Lexeme, LexemeKind, Lexer, SourcePosition, Unit};
pub use values::{
    AffineTransform, BorderStyle, BorderValue, ColorValue, Dimension, OffsetsValue, ShadowValue,
    SizeValue, ValueConversionError,
};

use std::sync::Arc;

/// Parse a stylesheet and wrap it for the engine's stylesheet stack.
///
/// Equivalent to `Arc::new(Stylesheet::parse(source, origin))`; exists
/// because every embedder ends up writing exactly this line.
#[must_use]
pub fn load_stylesheet(source: &str, origin: Origin) -> Arc<Stylesheet> {
    Arc::new(Stylesheet::parse(source, origin))
}
