//! Integration tests for selector parsing, matching and specificity.

use bilby_css::selector::{
    CombinatorKind, PseudoClassPredicate, Selector, Specificity, TypeSelector,
};
use bilby_css::parse_selector;
use bilby_tree::{ElementData, ElementTree, NodeId};

/// Helper to create element data with optional id and classes.
fn make_element(tag: &str, id: Option<&str>, classes: &[&str]) -> ElementData {
    let mut data = ElementData::new(tag);
    if let Some(id_value) = id {
        let _ = data.attrs.insert("id".to_string(), id_value.to_string());
    }
    if !classes.is_empty() {
        let _ = data.attrs.insert("class".to_string(), classes.join(" "));
    }
    data
}

/// Helper: a window with a panel containing three labels and a button.
///
/// ```text
/// window > panel#body.wide > [label, label, label, button#save.primary]
/// ```
fn make_tree() -> (ElementTree, NodeId, Vec<NodeId>) {
    let mut tree = ElementTree::new("window");
    let panel = tree.alloc(make_element("panel", Some("body"), &["wide"]));
    tree.append_child(NodeId::ROOT, panel);

    let mut children = Vec::new();
    for _ in 0..3 {
        let label = tree.alloc(make_element("label", None, &[]));
        tree.append_child(panel, label);
        children.push(label);
    }
    let button = tree.alloc(make_element("button", Some("save"), &["primary"]));
    tree.append_child(panel, button);
    children.push(button);

    (tree, panel, children)
}

#[test]
fn parse_type_selector() {
    let selector = parse_selector("button").unwrap();
    assert_eq!(selector.specificity(), Specificity::with_values(0, 0, 0, 1));
    match &selector {
        Selector::Type(compound) => assert_eq!(compound.name.as_deref(), Some("button")),
        other => panic!("expected type selector, got {other:?}"),
    }
}

#[test]
fn parse_class_selector() {
    let selector = parse_selector(".primary").unwrap();
    assert_eq!(selector.specificity(), Specificity::with_values(0, 0, 1, 0));
}

#[test]
fn parse_id_selector() {
    let selector = parse_selector("#save").unwrap();
    assert_eq!(selector.specificity(), Specificity::with_values(0, 1, 0, 0));
}

#[test]
fn parse_universal_selector() {
    let selector = parse_selector("*").unwrap();
    assert_eq!(selector.specificity(), Specificity::with_values(0, 0, 0, 0));
    match &selector {
        Selector::Type(compound) => assert!(compound.has_universal_type()),
        other => panic!("expected universal selector, got {other:?}"),
    }
}

#[test]
fn parse_compound_selector() {
    let selector = parse_selector("button.primary#save").unwrap();
    assert_eq!(selector.specificity(), Specificity::with_values(0, 1, 1, 1));
}

#[test]
fn parse_hex_shaped_id() {
    // #abc is hex-color-shaped but must still work as an id selector.
    let selector = parse_selector("#abc").unwrap();
    let mut tree = ElementTree::new("window");
    let node = tree.alloc(make_element("label", Some("abc"), &[]));
    tree.append_child(NodeId::ROOT, node);
    assert!(selector.matches(&tree.element(node)));
}

#[test]
fn parse_rejects_garbage() {
    assert!(parse_selector("").is_err());
    assert!(parse_selector("div >").is_err());
    assert!(parse_selector("[unclosed").is_err());
    assert!(parse_selector("div p,").is_err());
}

#[test]
fn matching_is_deterministic() {
    let (tree, panel, _) = make_tree();
    let selector = parse_selector("window > panel.wide").unwrap();
    let element = tree.element(panel);
    let first = selector.matches(&element);
    for _ in 0..10 {
        assert_eq!(selector.matches(&element), first);
    }
    assert!(first);
}

#[test]
fn descendant_combinator() {
    let (tree, _, children) = make_tree();
    let selector = parse_selector("window button").unwrap();
    assert!(selector.matches(&tree.element(children[3])));

    // Not a descendant of a `panel`-less path.
    let selector = parse_selector("missing button").unwrap();
    assert!(!selector.matches(&tree.element(children[3])));
}

#[test]
fn child_combinator_requires_immediate_parent() {
    let (tree, _, children) = make_tree();
    let button = tree.element(children[3]);

    assert!(parse_selector("panel > button").unwrap().matches(&button));
    // window is a grandparent, not a parent.
    assert!(!parse_selector("window > button").unwrap().matches(&button));
}

#[test]
fn child_with_first_child_pseudo() {
    // `div > p:first-child` semantics: the candidate must be the first
    // element child *and* its parent must match.
    let (tree, _, children) = make_tree();
    let selector = parse_selector("panel > label:first-child").unwrap();
    assert!(selector.matches(&tree.element(children[0])));
    assert!(!selector.matches(&tree.element(children[1])));

    let wrong_parent = parse_selector("window > label:first-child").unwrap();
    assert!(!wrong_parent.matches(&tree.element(children[0])));
}

#[test]
fn sibling_combinators() {
    let (tree, _, children) = make_tree();

    // button is immediately preceded by the third label.
    assert!(parse_selector("label + button")
        .unwrap()
        .matches(&tree.element(children[3])));
    // ...and generally preceded by any label.
    assert!(parse_selector("label ~ button")
        .unwrap()
        .matches(&tree.element(children[3])));
    // The second label is not immediately preceded by a button.
    assert!(!parse_selector("button + label")
        .unwrap()
        .matches(&tree.element(children[1])));
}

#[test]
fn combinator_chain_kinds() {
    let selector = parse_selector("window panel > button").unwrap();
    let Selector::Combinator(outer) = &selector else {
        panic!("expected combinator");
    };
    assert_eq!(outer.kind, CombinatorKind::Child);
    let Selector::Combinator(inner) = outer.left.as_ref() else {
        panic!("expected nested combinator");
    };
    assert_eq!(inner.kind, CombinatorKind::Descendant);
}

#[test]
fn attribute_operators_match() {
    let mut tree = ElementTree::new("window");
    let field = tree.alloc(make_element("field", None, &[]));
    tree.append_child(NodeId::ROOT, field);
    tree.set_attribute(field, "kind", "secure-text");
    tree.set_attribute(field, "hints", "dark compact");

    let element = tree.element(field);
    let matches = |source: &str| parse_selector(source).unwrap().matches(&element);

    assert!(matches("[kind]"));
    assert!(matches("[kind=secure-text]"));
    assert!(!matches("[kind=text]"));
    assert!(matches("[hints~=compact]"));
    assert!(!matches("[hints~=comp]"));
    assert!(matches("[kind|=secure]"));
    assert!(matches("[kind^=sec]"));
    assert!(matches("[kind$=text]"));
    assert!(matches("[kind*=ure-t]"));
    assert!(!matches("[missing]"));
}

#[test]
fn structural_predicates() {
    let (tree, panel, children) = make_tree();

    assert!(parse_selector(":root").unwrap().matches(&tree.element(NodeId::ROOT)));
    assert!(!parse_selector(":root").unwrap().matches(&tree.element(panel)));

    assert!(parse_selector("label:first-child")
        .unwrap()
        .matches(&tree.element(children[0])));
    assert!(parse_selector("button:last-child")
        .unwrap()
        .matches(&tree.element(children[3])));
    assert!(parse_selector("button:first-of-type")
        .unwrap()
        .matches(&tree.element(children[3])));
    assert!(parse_selector("button:only-of-type")
        .unwrap()
        .matches(&tree.element(children[3])));
    assert!(!parse_selector("label:only-of-type")
        .unwrap()
        .matches(&tree.element(children[0])));
    assert!(parse_selector(":empty").unwrap().matches(&tree.element(children[0])));
    assert!(!parse_selector(":empty").unwrap().matches(&tree.element(panel)));
}

#[test]
fn nth_child_odd_positions() {
    // :nth-child(2n+1) matches 1-indexed positions 1, 3, 5, ...
    let mut tree = ElementTree::new("list");
    let mut items = Vec::new();
    for _ in 0..6 {
        let item = tree.alloc(make_element("item", None, &[]));
        tree.append_child(NodeId::ROOT, item);
        items.push(item);
    }

    let selector = parse_selector(":nth-child(2n+1)").unwrap();
    let matched: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|&(_, &id)| selector.matches(&tree.element(id)))
        .map(|(index, _)| index + 1)
        .collect();
    assert_eq!(matched, vec![1, 3, 5]);
}

#[test]
fn nth_child_forms() {
    let mut tree = ElementTree::new("list");
    let mut items = Vec::new();
    for _ in 0..6 {
        let item = tree.alloc(make_element("item", None, &[]));
        tree.append_child(NodeId::ROOT, item);
        items.push(item);
    }
    let positions = |source: &str| -> Vec<usize> {
        let selector = parse_selector(source).unwrap();
        items
            .iter()
            .enumerate()
            .filter(|&(_, &id)| selector.matches(&tree.element(id)))
            .map(|(index, _)| index + 1)
            .collect()
    };

    assert_eq!(positions(":nth-child(odd)"), vec![1, 3, 5]);
    assert_eq!(positions(":nth-child(even)"), vec![2, 4, 6]);
    assert_eq!(positions(":nth-child(3)"), vec![3]);
    assert_eq!(positions(":nth-child(2n)"), vec![2, 4, 6]);
    assert_eq!(positions(":nth-child(n+4)"), vec![4, 5, 6]);
    assert_eq!(positions(":nth-child(-n+3)"), vec![1, 2, 3]);
    assert_eq!(positions(":nth-last-child(1)"), vec![6]);
    assert_eq!(positions(":nth-child(2n + 1)"), vec![1, 3, 5]);
}

#[test]
fn nth_of_type_counts_same_type_only() {
    let mut tree = ElementTree::new("panel");
    let first_label = tree.alloc(make_element("label", None, &[]));
    tree.append_child(NodeId::ROOT, first_label);
    let button = tree.alloc(make_element("button", None, &[]));
    tree.append_child(NodeId::ROOT, button);
    let second_label = tree.alloc(make_element("label", None, &[]));
    tree.append_child(NodeId::ROOT, second_label);

    let selector = parse_selector("label:nth-of-type(2)").unwrap();
    assert!(selector.matches(&tree.element(second_label)));
    assert!(!selector.matches(&tree.element(first_label)));
}

#[test]
fn negation() {
    let (tree, _, children) = make_tree();
    let selector = parse_selector("panel > :not(.primary)").unwrap();
    assert!(selector.matches(&tree.element(children[0])));
    assert!(!selector.matches(&tree.element(children[3])));
}

#[test]
fn negation_contributes_inner_specificity() {
    let selector = parse_selector(":not(.primary)").unwrap();
    assert_eq!(selector.specificity(), Specificity::with_values(0, 0, 1, 0));
}

#[test]
fn state_qualifier_is_ignored_by_structural_match() {
    // `button:pressed` matches any button structurally; the state filter
    // is the cascade engine's job.
    let (tree, _, children) = make_tree();
    let selector = parse_selector("button:pressed").unwrap();
    assert_eq!(selector.declared_state(), Some("pressed"));
    assert!(selector.matches(&tree.element(children[3])));
}

#[test]
fn pseudo_element_is_parsed_and_surfaced() {
    let selector = parse_selector("label::before").unwrap();
    assert_eq!(selector.pseudo_element(), Some("before"));
    // Pseudo-elements weigh like type selectors.
    assert_eq!(selector.specificity(), Specificity::with_values(0, 0, 0, 2));
}

#[test]
fn reserialized_selector_matches_identically() {
    // Re-serializing and re-parsing yields identical matching behavior.
    let (tree, panel, children) = make_tree();
    let sources = [
        "window > panel.wide button#save",
        "label + button.primary",
        "panel :not(.primary):first-child",
        "button:nth-of-type(2n+1)",
        "[hints~=dark]",
    ];

    let mut nodes = vec![NodeId::ROOT, panel];
    nodes.extend(&children);

    for source in sources {
        let parsed = parse_selector(source).unwrap();
        let reparsed = parse_selector(&parsed.to_string()).unwrap();
        for &node in &nodes {
            let element = tree.element(node);
            assert_eq!(
                parsed.matches(&element),
                reparsed.matches(&element),
                "behavior diverged for {source} (rendered as {parsed})"
            );
        }
    }
}

#[test]
fn specificity_totals_across_chain() {
    let selector = parse_selector("panel#body .wide button:first-child").unwrap();
    // 1 id, 1 class + 1 predicate, 2 types.
    assert_eq!(selector.specificity(), Specificity::with_values(0, 1, 2, 2));
}

#[test]
fn universal_contributes_nothing() {
    let universal = Selector::Type(TypeSelector::universal());
    assert_eq!(universal.specificity(), Specificity::new());
}

#[test]
fn predicate_keyword_roundtrip() {
    // The predicate keywords render back to their selector form.
    assert_eq!(PseudoClassPredicate::FirstChild.to_string(), "first-child");
    assert_eq!(PseudoClassPredicate::OnlyOfType.to_string(), "only-of-type");
}
