//! Integration tests for cascade ordering and declaration merging.

use std::sync::Arc;

use bilby_css::{ColorValue, MediaContext, Origin, StyleEngine, Stylesheet, load_stylesheet};
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

/// Engine with a single application stylesheet.
fn engine_with(css: &str) -> StyleEngine {
    let engine = StyleEngine::new();
    engine.set_active_stylesheets(vec![load_stylesheet(css, Origin::Application)]);
    engine
}

#[test]
fn specificity_orders_the_merge() {
    // The class selector outweighs the type selector.
    let engine = engine_with("label { color: red; } .highlight { color: green; }");
    let mut tree = ElementTree::new("window");
    let label = tree.alloc(make_element("label", None, &["highlight"]));
    tree.append_child(NodeId::ROOT, label);

    let info = engine.resolve_style(&tree.element(label), "");
    let color = info.declaration("color").expect("color resolved");
    assert_eq!(color.color_value(), ColorValue::rgb(0, 128, 0));
}

#[test]
fn important_beats_higher_specificity() {
    // `.b { color: blue !important; }` wins over `#a { color: red; }`
    // even though the id selector is more specific.
    let engine = engine_with("#a { color: red; } .b { color: blue !important; }");
    let mut tree = ElementTree::new("window");
    let node = tree.alloc(make_element("label", Some("a"), &["b"]));
    tree.append_child(NodeId::ROOT, node);

    let info = engine.resolve_style(&tree.element(node), "");
    let color = info.declaration("color").expect("color resolved");
    assert_eq!(color.color_value(), ColorValue::rgb(0, 0, 255));
}

#[test]
fn source_order_breaks_specificity_ties() {
    // Rules A and B have the same specificity and origin; the later one
    // in source order wins.
    let engine = engine_with("label { width: 10px; } label { width: 20px; }");
    let mut tree = ElementTree::new("window");
    let label = tree.alloc(make_element("label", None, &[]));
    tree.append_child(NodeId::ROOT, label);

    let info = engine.resolve_style(&tree.element(label), "");
    let width = info.declaration("width").expect("width resolved");
    assert!((width.length_value().value - 20.0).abs() < f64::EPSILON);
}

#[test]
fn origin_tiers_beat_specificity() {
    // A bare type selector at view origin beats an id selector at
    // application origin.
    let engine = StyleEngine::new();
    engine.set_active_stylesheets(vec![
        load_stylesheet("#save { color: red; }", Origin::Application),
        load_stylesheet("button { color: green; }", Origin::View),
    ]);

    let mut tree = ElementTree::new("window");
    let button = tree.alloc(make_element("button", Some("save"), &[]));
    tree.append_child(NodeId::ROOT, button);

    let info = engine.resolve_style(&tree.element(button), "");
    let color = info.declaration("color").expect("color resolved");
    assert_eq!(color.color_value(), ColorValue::rgb(0, 128, 0));
}

#[test]
fn later_stack_position_wins_within_origin() {
    let engine = StyleEngine::new();
    engine.set_active_stylesheets(vec![
        load_stylesheet("label { color: red; }", Origin::Application),
        load_stylesheet("label { color: blue; }", Origin::Application),
    ]);

    let mut tree = ElementTree::new("window");
    let label = tree.alloc(make_element("label", None, &[]));
    tree.append_child(NodeId::ROOT, label);

    let info = engine.resolve_style(&tree.element(label), "");
    assert_eq!(
        info.declaration("color").expect("color").color_value(),
        ColorValue::rgb(0, 0, 255)
    );
}

#[test]
fn important_tier_still_ordered_among_itself() {
    let engine = engine_with(
        "label { color: red !important; } .late { color: blue !important; }",
    );
    let mut tree = ElementTree::new("window");
    let label = tree.alloc(make_element("label", None, &["late"]));
    tree.append_child(NodeId::ROOT, label);

    let info = engine.resolve_style(&tree.element(label), "");
    assert_eq!(
        info.declaration("color").expect("color").color_value(),
        ColorValue::rgb(0, 0, 255)
    );
}

#[test]
fn no_match_is_a_normal_outcome() {
    let engine = engine_with("button { color: red; }");
    let mut tree = ElementTree::new("window");
    let label = tree.alloc(make_element("label", None, &[]));
    tree.append_child(NodeId::ROOT, label);

    let info = engine.resolve_style(&tree.element(label), "");
    assert!(info.is_empty());
    assert!(info.declaration("color").is_none());
}

#[test]
fn state_qualified_rules_filter_by_state() {
    let engine = engine_with(
        "button { color: red; } button:hover { color: green; }",
    );
    let mut tree = ElementTree::new("window");
    let button = tree.alloc(make_element("button", None, &[]));
    tree.append_child(NodeId::ROOT, button);
    let element = tree.element(button);

    let default_info = engine.resolve_style(&element, "");
    assert_eq!(
        default_info.declaration("color").expect("color").color_value(),
        ColorValue::rgb(255, 0, 0)
    );
    // The hover rule only participates when resolving the hover state.
    let hover_info = engine.resolve_style(&element, "hover");
    assert_eq!(
        hover_info.declaration("color").expect("color").color_value(),
        ColorValue::rgb(0, 128, 0)
    );

    // Both resolutions saw a state-dependent rule set.
    assert!(default_info.changeable());
    assert!(hover_info.changeable());
}

#[test]
fn custom_states_work_like_known_ones() {
    let engine = engine_with("button:pressed { color: blue; }");
    let mut tree = ElementTree::new("window");
    let button = tree.alloc(make_element("button", None, &[]));
    tree.append_child(NodeId::ROOT, button);
    let element = tree.element(button);

    assert!(engine.resolve_style(&element, "").is_empty());
    assert!(!engine.resolve_style(&element, "pressed").is_empty());
}

#[test]
fn changeable_is_false_without_state_rules() {
    let engine = engine_with("button { color: red; }");
    let mut tree = ElementTree::new("window");
    let button = tree.alloc(make_element("button", None, &[]));
    tree.append_child(NodeId::ROOT, button);

    assert!(!engine.resolve_style(&tree.element(button), "").changeable());
}

#[test]
fn pseudo_element_rules_do_not_apply_to_base_style() {
    let engine = engine_with("label::before { color: red; }");
    let mut tree = ElementTree::new("window");
    let label = tree.alloc(make_element("label", None, &[]));
    tree.append_child(NodeId::ROOT, label);

    assert!(engine.resolve_style(&tree.element(label), "").is_empty());
}

#[test]
fn media_groups_toggle_with_context() {
    let css = "label { color: red; } \
               @media (min-width: 800px) { label { color: blue; } }";
    let engine = engine_with(css);
    let mut tree = ElementTree::new("window");
    let label = tree.alloc(make_element("label", None, &[]));
    tree.append_child(NodeId::ROOT, label);
    let element = tree.element(label);

    // Default context is 1024 points wide: the media rule applies and,
    // being later in source order at equal specificity, wins.
    assert_eq!(
        engine.resolve_style(&element, "").declaration("color").expect("color").color_value(),
        ColorValue::rgb(0, 0, 255)
    );

    // Shrink the display below the query threshold.
    engine.set_media_context(MediaContext {
        width: 320.0,
        height: 480.0,
        device_width: 320.0,
        device_height: 480.0,
        ..MediaContext::default()
    });
    assert_eq!(
        engine.resolve_style(&element, "").declaration("color").expect("color").color_value(),
        ColorValue::rgb(255, 0, 0)
    );
}

#[test]
fn inline_styles_outrank_everything_unimportant() {
    let engine = StyleEngine::new();
    engine.set_active_stylesheets(vec![
        load_stylesheet("#save { color: red; }", Origin::Application),
        Arc::new(Stylesheet::parse_inline("color: green;")),
    ]);

    let mut tree = ElementTree::new("window");
    let button = tree.alloc(make_element("button", Some("save"), &[]));
    tree.append_child(NodeId::ROOT, button);

    assert_eq!(
        engine
            .resolve_style(&tree.element(button), "")
            .declaration("color")
            .expect("color")
            .color_value(),
        ColorValue::rgb(0, 128, 0)
    );
}

#[test]
fn stack_snapshot_survives_swap() {
    // A snapshot taken before a stack swap keeps answering; the next
    // resolution sees the new stack.
    let engine = engine_with("label { color: red; }");
    let snapshot = engine.active_stylesheets();

    engine.set_active_stylesheets(vec![load_stylesheet("label { color: blue; }", Origin::Application)]);

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].rule_sets().len(), 1);

    let mut tree = ElementTree::new("window");
    let label = tree.alloc(make_element("label", None, &[]));
    tree.append_child(NodeId::ROOT, label);
    assert_eq!(
        engine
            .resolve_style(&tree.element(label), "")
            .declaration("color")
            .expect("color")
            .color_value(),
        ColorValue::rgb(0, 0, 255)
    );
}

#[test]
fn comma_alternatives_share_declarations() {
    let engine = engine_with("label, button { color: red; }");
    let mut tree = ElementTree::new("window");
    let label = tree.alloc(make_element("label", None, &[]));
    let button = tree.alloc(make_element("button", None, &[]));
    tree.append_child(NodeId::ROOT, label);
    tree.append_child(NodeId::ROOT, button);

    for id in [label, button] {
        assert_eq!(
            engine
                .resolve_style(&tree.element(id), "")
                .declaration("color")
                .expect("color")
                .color_value(),
            ColorValue::rgb(255, 0, 0)
        );
    }
}
