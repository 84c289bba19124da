//! Selector model and matching.
//!
//! Selectors form a closed tagged union: every variant knows how to test a
//! [`Styleable`] node and how to contribute to a [`Specificity`]. Matching is
//! purely structural — it walks parents and siblings through the `Styleable`
//! navigation methods and never mutates anything, so repeated calls with an
//! unchanged tree give identical answers.
//!
//! Interaction-state qualifiers (`button:pressed`) are carried on the type
//! selector but deliberately not checked by [`Selector::matches`]: the
//! matching engine filters rule sets by state *after* structural matching, so
//! one rule set can describe several states of the same element.

mod specificity;

use core::fmt;

use bilby_tree::{ChildrenInfo, Styleable, children_info};
use strum_macros::{Display as StrumDisplay, EnumString};

pub use specificity::{Specificity, SpecificityType};

/// A parsed selector: one alternative of a rule set's selector list.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// A compound simple-selector sequence anchored on an element type
    /// (possibly universal), e.g. `ns|button.primary#save:hover`.
    Type(TypeSelector),
    /// Two selectors related by a combinator, e.g. `div > p`.
    Combinator(CombinatorSelector),
    /// An attribute expression, e.g. `[href^="https"]`.
    Attribute(AttributeExpression),
    /// A non-functional structural pseudo-class, e.g. `:first-child`.
    PseudoClassPredicate(PseudoClassPredicate),
    /// A functional structural pseudo-class, e.g. `:nth-child(2n+1)`.
    PseudoClassFunction(PseudoClassFunction),
    /// Negation of an inner selector, e.g. `:not(.disabled)`.
    Not(Box<Selector>),
}

impl Selector {
    /// Test this selector against a node.
    ///
    /// Deterministic and side-effect-free: the same node and tree state give
    /// the same answer on every call.
    pub fn matches<N: Styleable>(&self, node: &N) -> bool {
        match self {
            Self::Type(type_selector) => type_selector.matches(node),
            Self::Combinator(combinator) => combinator.matches(node),
            Self::Attribute(expression) => expression.matches(node),
            Self::PseudoClassPredicate(predicate) => predicate.matches(node),
            Self::PseudoClassFunction(function) => function.matches(node),
            Self::Not(inner) => !inner.matches(node),
        }
    }

    /// Accumulate this selector's specificity contribution into `spec`.
    pub fn add_specificity(&self, spec: &mut Specificity) {
        match self {
            Self::Type(type_selector) => type_selector.add_specificity(spec),
            Self::Combinator(combinator) => {
                combinator.left.add_specificity(spec);
                combinator.right.add_specificity(spec);
            }
            Self::Attribute(_) => spec.increment(SpecificityType::ClassOrAttribute),
            Self::PseudoClassPredicate(_) => spec.increment(SpecificityType::ClassOrAttribute),
            // Functional structural pseudo-classes carry no weight of their
            // own; their position arithmetic is not a style hook.
            Self::PseudoClassFunction(_) => {}
            Self::Not(inner) => inner.add_specificity(spec),
        }
    }

    /// The specificity of this selector with an empty origin slot.
    /// The owning rule set fills the origin slot from its stylesheet.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        let mut spec = Specificity::new();
        self.add_specificity(&mut spec);
        spec
    }

    /// The interaction state this selector is qualified with, if any.
    /// For combinator chains this is the state of the rightmost compound.
    #[must_use]
    pub fn declared_state(&self) -> Option<&str> {
        match self {
            Self::Type(type_selector) => type_selector.state.as_deref(),
            Self::Combinator(combinator) => combinator.right.declared_state(),
            _ => None,
        }
    }

    /// The pseudo-element this selector targets, if any.
    /// For combinator chains this is the rightmost compound's pseudo-element.
    #[must_use]
    pub fn pseudo_element(&self) -> Option<&str> {
        match self {
            Self::Type(type_selector) => type_selector.pseudo_element.as_deref(),
            Self::Combinator(combinator) => combinator.right.pseudo_element(),
            _ => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(type_selector) => type_selector.fmt(f),
            Self::Combinator(combinator) => combinator.fmt(f),
            Self::Attribute(expression) => expression.fmt(f),
            Self::PseudoClassPredicate(predicate) => write!(f, ":{predicate}"),
            Self::PseudoClassFunction(function) => function.fmt(f),
            Self::Not(inner) => write!(f, ":not({inner})"),
        }
    }
}

/// A compound selector: element type constraint plus attached expressions.
///
/// `.primary` parses to a universal type selector with one class; a bare
/// `button` has a name and nothing attached.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeSelector {
    /// Namespace URI (or unresolved prefix) this type is constrained to.
    /// `None` with `universal_namespace == false` matches any namespace.
    pub namespace: Option<String>,
    /// The element type name; `None` means the universal type `*`.
    pub name: Option<String>,
    /// True when the namespace was written as `*|`.
    pub universal_namespace: bool,
    /// The id this compound requires, from `#id`.
    pub style_id: Option<String>,
    /// Classes this compound requires, from `.class` fragments.
    pub style_classes: Vec<String>,
    /// Attached attribute expressions, structural pseudo-classes and
    /// negations, tested against the same node.
    pub expressions: Vec<Selector>,
    /// Interaction-state qualifier (e.g. `hover`). Not checked by
    /// [`TypeSelector::matches`]; the engine filters by state.
    pub state: Option<String>,
    /// Pseudo-element this compound targets (e.g. `before`). Rule sets with
    /// a pseudo-element are excluded from base style resolution.
    pub pseudo_element: Option<String>,
}

impl TypeSelector {
    /// A universal type selector (`*`) with nothing attached.
    #[must_use]
    pub fn universal() -> Self {
        Self::default()
    }

    /// A type selector for the given element type name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// True when this selector matches any element type.
    #[must_use]
    pub const fn has_universal_type(&self) -> bool {
        self.name.is_none()
    }

    /// Test every constraint of this compound against one node
    /// (except the state qualifier and pseudo-element).
    pub fn matches<N: Styleable>(&self, node: &N) -> bool {
        if let Some(name) = &self.name {
            if !node.type_name().eq_ignore_ascii_case(name) {
                return false;
            }
        }

        if !self.universal_namespace {
            if let Some(namespace) = &self.namespace {
                if node.namespace_uri() != Some(namespace.as_str()) {
                    return false;
                }
            }
        }

        if let Some(style_id) = &self.style_id {
            if node.style_id() != Some(style_id.as_str()) {
                return false;
            }
        }

        if !self.style_classes.is_empty() {
            let classes = node.style_classes();
            if !self
                .style_classes
                .iter()
                .all(|class| classes.contains(class.as_str()))
            {
                return false;
            }
        }

        self.expressions.iter().all(|expr| expr.matches(node))
    }

    /// Accumulate specificity: the type name and pseudo-element count as
    /// elements, the id as an id, classes as classes, and attached
    /// expressions contribute their own weights. Universal parts contribute
    /// nothing.
    pub fn add_specificity(&self, spec: &mut Specificity) {
        if self.name.is_some() {
            spec.increment(SpecificityType::Element);
        }
        if self.pseudo_element.is_some() {
            spec.increment(SpecificityType::Element);
        }
        if self.style_id.is_some() {
            spec.increment(SpecificityType::Id);
        }
        for _ in &self.style_classes {
            spec.increment(SpecificityType::ClassOrAttribute);
        }
        if self.state.is_some() {
            spec.increment(SpecificityType::ClassOrAttribute);
        }
        for expression in &self.expressions {
            expression.add_specificity(spec);
        }
    }
}

impl fmt::Display for TypeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.universal_namespace {
            write!(f, "*|")?;
        } else if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}|")?;
        }
        match &self.name {
            Some(name) => write!(f, "{name}")?,
            None => write!(f, "*")?,
        }
        if let Some(style_id) = &self.style_id {
            write!(f, "#{style_id}")?;
        }
        for class in &self.style_classes {
            write!(f, ".{class}")?;
        }
        for expression in &self.expressions {
            write!(f, "{expression}")?;
        }
        if let Some(state) = &self.state {
            write!(f, ":{state}")?;
        }
        if let Some(pseudo_element) = &self.pseudo_element {
            write!(f, "::{pseudo_element}")?;
        }
        Ok(())
    }
}

/// The structural relationship between the two sides of a combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorKind {
    /// `A B` — B with some strict ancestor matching A.
    Descendant,
    /// `A > B` — B whose parent matches A.
    Child,
    /// `A + B` — B immediately preceded by a sibling matching A.
    AdjacentSibling,
    /// `A ~ B` — B preceded (anywhere) by a sibling matching A.
    GeneralSibling,
}

/// Two selectors related by a combinator. The right side must match the
/// candidate node; the left side is then tested against the related node(s).
#[derive(Debug, Clone, PartialEq)]
pub struct CombinatorSelector {
    /// Which structural relationship the two sides are in.
    pub kind: CombinatorKind,
    /// The ancestor/sibling side. May itself be a combinator, which is how
    /// chains like `a b > c` nest.
    pub left: Box<Selector>,
    /// The candidate side, always a compound.
    pub right: Box<Selector>,
}

impl CombinatorSelector {
    /// Test the combinator against a candidate node.
    pub fn matches<N: Styleable>(&self, node: &N) -> bool {
        if !self.right.matches(node) {
            return false;
        }
        match self.kind {
            CombinatorKind::Descendant => {
                let mut current = node.parent();
                while let Some(ancestor) = current {
                    if self.left.matches(&ancestor) {
                        return true;
                    }
                    current = ancestor.parent();
                }
                false
            }
            CombinatorKind::Child => node
                .parent()
                .is_some_and(|parent| self.left.matches(&parent)),
            CombinatorKind::AdjacentSibling => node
                .previous_sibling()
                .is_some_and(|sibling| self.left.matches(&sibling)),
            CombinatorKind::GeneralSibling => {
                let mut current = node.previous_sibling();
                while let Some(sibling) = current {
                    if self.left.matches(&sibling) {
                        return true;
                    }
                    current = sibling.previous_sibling();
                }
                false
            }
        }
    }
}

impl fmt::Display for CombinatorSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.kind {
            CombinatorKind::Descendant => " ",
            CombinatorKind::Child => " > ",
            CombinatorKind::AdjacentSibling => " + ",
            CombinatorKind::GeneralSibling => " ~ ",
        };
        write!(f, "{}{symbol}{}", self.left, self.right)
    }
}

/// How an attribute expression compares the declared value with the node's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `[attr]` — the attribute is present, any value.
    Exists,
    /// `[attr=v]` — exact match.
    Equals,
    /// `[attr~=v]` — the value, split on whitespace, contains `v`.
    ListContains,
    /// `[attr|=v]` — the value is `v` or starts with `v-`.
    DashMatch,
    /// `[attr^=v]` — the value starts with `v`.
    StartsWith,
    /// `[attr$=v]` — the value ends with `v`.
    EndsWith,
    /// `[attr*=v]` — the value contains `v` as a substring.
    Contains,
}

/// An attribute expression: `[name]` or `[name op value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeExpression {
    /// The attribute name looked up on the node.
    pub name: String,
    /// The comparison operator.
    pub operator: AttributeOperator,
    /// The declared value; `None` only for [`AttributeOperator::Exists`].
    pub value: Option<String>,
}

impl AttributeExpression {
    /// Test the expression against a node's attribute.
    pub fn matches<N: Styleable>(&self, node: &N) -> bool {
        let Some(actual) = node.attribute_value(&self.name) else {
            return false;
        };
        let Some(expected) = self.value.as_deref() else {
            return true;
        };
        match self.operator {
            AttributeOperator::Exists => true,
            AttributeOperator::Equals => actual == expected,
            AttributeOperator::ListContains => {
                actual.split_ascii_whitespace().any(|word| word == expected)
            }
            AttributeOperator::DashMatch => {
                actual == expected
                    || (actual.starts_with(expected)
                        && actual[expected.len()..].starts_with('-'))
            }
            AttributeOperator::StartsWith => actual.starts_with(expected),
            AttributeOperator::EndsWith => actual.ends_with(expected),
            AttributeOperator::Contains => actual.contains(expected),
        }
    }
}

impl fmt::Display for AttributeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.operator {
            AttributeOperator::Exists => return write!(f, "[{}]", self.name),
            AttributeOperator::Equals => "=",
            AttributeOperator::ListContains => "~=",
            AttributeOperator::DashMatch => "|=",
            AttributeOperator::StartsWith => "^=",
            AttributeOperator::EndsWith => "$=",
            AttributeOperator::Contains => "*=",
        };
        write!(
            f,
            "[{}{symbol}\"{}\"]",
            self.name,
            self.value.as_deref().unwrap_or_default()
        )
    }
}

/// Non-functional structural pseudo-classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, StrumDisplay)]
#[strum(serialize_all = "kebab-case")]
pub enum PseudoClassPredicate {
    /// `:root` — a node with no parent.
    Root,
    /// `:first-child` — 1st among its siblings.
    FirstChild,
    /// `:last-child` — last among its siblings.
    LastChild,
    /// `:first-of-type` — 1st among same-type siblings.
    FirstOfType,
    /// `:last-of-type` — last among same-type siblings.
    LastOfType,
    /// `:only-child` — no siblings.
    OnlyChild,
    /// `:only-of-type` — no same-type siblings.
    OnlyOfType,
    /// `:empty` — no children.
    Empty,
}

impl PseudoClassPredicate {
    /// Test the predicate against a node's tree position.
    pub fn matches<N: Styleable>(&self, node: &N) -> bool {
        match self {
            Self::Root => node.parent().is_none(),
            Self::Empty => node.children().is_empty(),
            Self::FirstChild => children_info(node).index == 1,
            Self::LastChild => {
                let info = children_info(node);
                info.index == info.count
            }
            Self::FirstOfType => children_info(node).index_of_type == 1,
            Self::LastOfType => {
                let info = children_info(node);
                info.index_of_type == info.count_of_type
            }
            Self::OnlyChild => children_info(node).count == 1,
            Self::OnlyOfType => children_info(node).count_of_type == 1,
        }
    }
}

/// Which position sequence a functional pseudo-class runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, StrumDisplay)]
#[strum(serialize_all = "kebab-case")]
pub enum PseudoClassFunctionKind {
    /// `:nth-child(an+b)` — position among all siblings.
    NthChild,
    /// `:nth-last-child(an+b)` — position counted from the end.
    NthLastChild,
    /// `:nth-of-type(an+b)` — position among same-type siblings.
    NthOfType,
    /// `:nth-last-of-type(an+b)` — same-type position from the end.
    NthLastOfType,
}

/// A functional structural pseudo-class with its `an+b` argument stored as
/// modulus (`a`) and remainder (`b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoClassFunction {
    /// Which sibling sequence is tested.
    pub kind: PseudoClassFunctionKind,
    /// The `a` of `an+b`. Zero means "exactly at `remainder`".
    pub modulus: i64,
    /// The `b` of `an+b`.
    pub remainder: i64,
}

impl PseudoClassFunction {
    /// Test `an+b` membership of the node's 1-indexed sibling position:
    /// the position must equal `modulus * n + remainder` for some `n >= 0`.
    pub fn matches<N: Styleable>(&self, node: &N) -> bool {
        let info = children_info(node);
        let position = self.position(info);
        let position = i64::try_from(position).unwrap_or(i64::MAX);

        if self.modulus == 0 {
            return position == self.remainder;
        }
        let delta = position - self.remainder;
        delta % self.modulus == 0 && delta / self.modulus >= 0
    }

    /// The 1-indexed position this function's kind inspects.
    const fn position(&self, info: ChildrenInfo) -> usize {
        match self.kind {
            PseudoClassFunctionKind::NthChild => info.index,
            PseudoClassFunctionKind::NthLastChild => info.count + 1 - info.index,
            PseudoClassFunctionKind::NthOfType => info.index_of_type,
            PseudoClassFunctionKind::NthLastOfType => info.count_of_type + 1 - info.index_of_type,
        }
    }
}

impl fmt::Display for PseudoClassFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modulus == 0 {
            return write!(f, ":{}({})", self.kind, self.remainder);
        }
        if self.remainder == 0 {
            return write!(f, ":{}({}n)", self.kind, self.modulus);
        }
        write!(f, ":{}({}n{:+})", self.kind, self.modulus, self.remainder)
    }
}
