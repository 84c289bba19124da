//! Stylesheets, rule sets, and cascade ordering inputs.
//!
//! A [`Stylesheet`] is produced by a single parse call and immutable
//! afterwards except for the explicit append operations the parser uses while
//! it runs. Rule sets keep their source-order index so the cascade can break
//! specificity ties deterministically.

mod media;

pub mod keyframe;

use core::fmt;
use std::collections::HashMap;

use bilby_tree::Styleable;
use thiserror::Error;

use crate::declaration::Declaration;
use crate::selector::{Selector, Specificity, SpecificityType};
use crate::tokenizer::SourcePosition;

pub use keyframe::{Keyframe, KeyframeBlock};
pub use media::{MediaContext, MediaExpression, MediaFeatureValue, MediaGroup, Orientation};

/// The precedence tier a stylesheet belongs to.
///
/// Tiers are strictly increasing: view styles beat application styles, which
/// beat library defaults, regardless of selector weights within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Origin {
    /// Library-provided defaults, the lowest tier.
    #[default]
    Default,
    /// Application-provided stylesheets.
    Application,
    /// Per-view / inline styles, the highest tier.
    View,
}

impl Origin {
    /// The weight this origin contributes to the specificity origin slot.
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Default => 0,
            Self::Application => 1,
            Self::View => 2,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Application => write!(f, "application"),
            Self::View => write!(f, "view"),
        }
    }
}

/// What went wrong while lexing or parsing a stylesheet.
///
/// Errors are accumulated on the [`Stylesheet`], never thrown: every rule
/// that parsed cleanly still applies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The lexer hit a character no lexeme can start with.
    #[error("unrecognized character '{0}'")]
    UnrecognizedCharacter(char),
    /// The parser found a lexeme that cannot appear here.
    #[error("unexpected {0}")]
    UnexpectedToken(String),
    /// A construct ran into end-of-input before its closing delimiter.
    #[error("unterminated {0}")]
    Unterminated(&'static str),
    /// An `@import` referenced a file already on the import path.
    #[error("cyclic @import of \"{0}\" skipped")]
    ImportCycle(String),
    /// An `@import` could not be resolved by the configured loader.
    #[error("unresolved @import \"{0}\"")]
    UnresolvedImport(String),
    /// A selector could not be parsed; the rule set was dropped.
    #[error("invalid selector \"{0}\"")]
    InvalidSelector(String),
}

/// A recorded lex/parse problem with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Where it went wrong.
    pub position: SourcePosition,
    /// The file the source came from, when known.
    pub file: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {} at {}", file, self.kind, self.position),
            None => write!(f, "{} at {}", self.kind, self.position),
        }
    }
}

impl std::error::Error for ParseError {}

/// One CSS rule set: a selector list sharing a declaration list.
///
/// The rule set's specificity is derived from its most specific selector
/// alternative, with the origin slot filled in from the owning stylesheet.
#[derive(Debug, Clone)]
pub struct RuleSet {
    selectors: Vec<Selector>,
    declarations: Vec<Declaration>,
    specificity: Specificity,
    origin: Origin,
    source_index: usize,
}

impl RuleSet {
    /// Build a rule set, deriving its specificity from the most specific
    /// selector alternative.
    #[must_use]
    pub fn new(
        selectors: Vec<Selector>,
        declarations: Vec<Declaration>,
        origin: Origin,
        source_index: usize,
    ) -> Self {
        let mut specificity = selectors
            .iter()
            .map(Selector::specificity)
            .max()
            .unwrap_or_default();
        specificity.set(SpecificityType::Origin, origin.weight());
        Self {
            selectors,
            declarations,
            specificity,
            origin,
            source_index,
        }
    }

    /// The selector alternatives of this rule set.
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// The declarations of this rule set, in source order.
    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// The derived specificity (origin slot already filled).
    #[must_use]
    pub const fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// The origin tier of the owning stylesheet.
    #[must_use]
    pub const fn origin(&self) -> Origin {
        self.origin
    }

    /// Position of this rule set in its stylesheet's source order.
    #[must_use]
    pub const fn source_index(&self) -> usize {
        self.source_index
    }

    /// True if any selector alternative structurally matches the node,
    /// ignoring state qualifiers.
    pub fn matches<N: Styleable>(&self, node: &N) -> bool {
        self.selectors.iter().any(|selector| selector.matches(node))
    }

    /// True if some alternative structurally matches the node *and* is
    /// compatible with the given interaction state. An alternative with no
    /// state qualifier applies to every state; a qualified alternative only
    /// to its own. Alternatives targeting a pseudo-element never apply to
    /// the node's base style.
    pub fn matches_with_state<N: Styleable>(&self, node: &N, state: &str) -> bool {
        self.selectors.iter().any(|selector| {
            selector.pseudo_element().is_none()
                && selector
                    .declared_state()
                    .is_none_or(|declared| declared == state)
                && selector.matches(node)
        })
    }

    /// True if any alternative carries an interaction-state qualifier,
    /// i.e. the styling outcome depends on the node's state.
    #[must_use]
    pub fn is_state_dependent(&self) -> bool {
        self.selectors
            .iter()
            .any(|selector| selector.declared_state().is_some())
    }
}

/// A `@font-face` block: declarations describing one font resource, handed
/// to the (external) font machinery untouched.
#[derive(Debug, Clone)]
pub struct FontFace {
    /// The block's declarations (`font-family`, `src`, …).
    pub declarations: Vec<Declaration>,
}

/// A parsed stylesheet: ordered rule sets and media groups, namespace
/// mappings, keyframes and the errors accumulated while parsing.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    origin: Origin,
    rule_sets: Vec<RuleSet>,
    media_groups: Vec<MediaGroup>,
    namespaces: HashMap<String, String>,
    keyframes: HashMap<String, Keyframe>,
    font_faces: Vec<FontFace>,
    errors: Vec<ParseError>,
    source_path: Option<String>,
    next_index: usize,
}

impl Stylesheet {
    /// Create an empty stylesheet with the given origin.
    #[must_use]
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }

    /// The origin tier of this stylesheet.
    #[must_use]
    pub const fn origin(&self) -> Origin {
        self.origin
    }

    /// Rule sets outside any media group, in source order.
    #[must_use]
    pub fn rule_sets(&self) -> &[RuleSet] {
        &self.rule_sets
    }

    /// Media groups in source order.
    #[must_use]
    pub fn media_groups(&self) -> &[MediaGroup] {
        &self.media_groups
    }

    /// `@font-face` blocks in source order.
    #[must_use]
    pub fn font_faces(&self) -> &[FontFace] {
        &self.font_faces
    }

    /// The lex/parse errors accumulated while this stylesheet was parsed.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// The file path this stylesheet was parsed from, when known.
    #[must_use]
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Set the source path (used for declaration diagnostics).
    pub fn set_source_path(&mut self, path: impl Into<String>) {
        self.source_path = Some(path.into());
    }

    /// Record a parse error against this stylesheet.
    pub fn record_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Allocate the next source-order index. Indices are shared between
    /// direct rule sets and those inside media groups, preserving overall
    /// document order for cascade tie-breaks.
    pub fn allocate_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Append a rule set.
    pub fn add_rule_set(&mut self, rule_set: RuleSet) {
        self.rule_sets.push(rule_set);
    }

    /// Append a media group.
    pub fn add_media_group(&mut self, group: MediaGroup) {
        self.media_groups.push(group);
    }

    /// Append a `@font-face` block.
    pub fn add_font_face(&mut self, font_face: FontFace) {
        self.font_faces.push(font_face);
    }

    /// Bind a namespace prefix to a URI. Prefixes are unique: rebinding a
    /// prefix replaces the previous URI. The default namespace uses the
    /// empty prefix.
    pub fn set_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let _ = self.namespaces.insert(prefix.into(), uri.into());
    }

    /// Look up the URI bound to a namespace prefix.
    #[must_use]
    pub fn namespace_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Register a named keyframe sequence. A later `@keyframes` with the
    /// same name replaces the earlier one.
    pub fn add_keyframe(&mut self, keyframe: Keyframe) {
        let _ = self.keyframes.insert(keyframe.name.clone(), keyframe);
    }

    /// Look up a keyframe sequence by name.
    #[must_use]
    pub fn keyframe_for_name(&self, name: &str) -> Option<&Keyframe> {
        self.keyframes.get(name)
    }

    /// Number of registered keyframe sequences.
    #[must_use]
    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    /// All rule sets that are currently active: the directly attached ones
    /// plus those inside media groups whose query holds for `media`.
    pub fn active_rule_sets<'sheet>(
        &'sheet self,
        media: &MediaContext,
    ) -> impl Iterator<Item = &'sheet RuleSet> {
        let from_media = self
            .media_groups
            .iter()
            .filter(|group| group.is_active(media))
            .flat_map(MediaGroup::rule_sets_iter);
        self.rule_sets.iter().chain(from_media)
    }

    /// Active rule sets that structurally match the node (state ignored).
    pub fn rule_sets_matching<'sheet, N: Styleable>(
        &'sheet self,
        node: &N,
        media: &MediaContext,
    ) -> Vec<&'sheet RuleSet> {
        self.active_rule_sets(media)
            .filter(|rule_set| rule_set.matches(node))
            .collect()
    }
}
