//! Integration tests for the stylesheet parser: structure, at-rules, and
//! error recovery.

use std::collections::HashMap;

use bilby_css::parser::ImportLoader;
use bilby_css::{LexemeKind, Origin, ParseErrorKind, Stylesheet};

fn parse(css: &str) -> Stylesheet {
    Stylesheet::parse(css, Origin::Application)
}

#[test]
fn basic_rule_set_structure() {
    let sheet = parse("button.primary { color: red; padding: 4px 8px; }");
    assert_eq!(sheet.rule_sets().len(), 1);
    assert!(sheet.errors().is_empty());

    let rule_set = &sheet.rule_sets()[0];
    assert_eq!(rule_set.selectors().len(), 1);
    assert_eq!(rule_set.declarations().len(), 2);
    assert_eq!(rule_set.origin(), Origin::Application);
    assert_eq!(rule_set.source_index(), 0);
}

#[test]
fn declaration_values_stay_raw() {
    // Two-phase parsing: the value is an unparsed lexeme run.
    let sheet = parse("label { margin: 1px 2px 3px 4px; }");
    let declaration = &sheet.rule_sets()[0].declarations()[0];
    assert_eq!(declaration.name(), "margin");
    let dimensions = declaration
        .lexemes()
        .iter()
        .filter(|lx| matches!(lx.kind, LexemeKind::Dimension { .. }))
        .count();
    assert_eq!(dimensions, 4);
}

#[test]
fn important_flag_is_stripped_from_value() {
    let sheet = parse("label { color: red !important; width: 2px; }");
    let declarations = sheet.rule_sets()[0].declarations();
    assert!(declarations[0].important());
    assert!(
        !declarations[0]
            .lexemes()
            .iter()
            .any(|lx| matches!(&lx.kind, LexemeKind::Ident(word) if word == "important")),
        "!important must not leak into the value lexemes"
    );
    assert!(!declarations[1].important());
}

#[test]
fn selector_list_shares_declarations() {
    let sheet = parse("label, button, .wide { color: red; }");
    let rule_set = &sheet.rule_sets()[0];
    assert_eq!(rule_set.selectors().len(), 3);
    assert_eq!(rule_set.declarations().len(), 1);
}

#[test]
fn source_indices_are_stable_across_media_groups() {
    let sheet = parse(
        "a { color: red; } \
         @media screen { b { color: green; } } \
         c { color: blue; }",
    );
    assert_eq!(sheet.rule_sets()[0].source_index(), 0);
    assert_eq!(sheet.media_groups()[0].rule_sets()[0].source_index(), 1);
    assert_eq!(sheet.rule_sets()[1].source_index(), 2);
}

#[test]
fn declaration_locations_point_at_the_source() {
    let sheet = parse("label {\n  color: red;\n  width: 2px;\n}");
    let declarations = sheet.rule_sets()[0].declarations();
    assert_eq!(declarations[0].location().line, 2);
    assert_eq!(declarations[1].location().line, 3);
}

#[test]
fn error_recovery_keeps_later_rules() {
    // The first rule's selector is invalid; its whole block is skipped and
    // the rule after it must still parse and apply.
    let sheet = parse("12px { color: red; } button { color: green; }");
    assert!(!sheet.errors().is_empty());
    assert_eq!(sheet.rule_sets().len(), 1);
    assert_eq!(sheet.rule_sets()[0].selectors()[0].to_string(), "button");
}

#[test]
fn bad_declaration_skips_to_boundary() {
    let sheet = parse("label { color: red; 12px: no; width: 3px; }");
    assert_eq!(sheet.errors().len(), 1);
    let declarations = sheet.rule_sets()[0].declarations();
    assert_eq!(declarations.len(), 2);
    assert_eq!(declarations[0].name(), "color");
    assert_eq!(declarations[1].name(), "width");
}

#[test]
fn unrecognized_characters_are_recorded_not_fatal() {
    let sheet = parse("? label { color: red; }");
    assert!(sheet
        .errors()
        .iter()
        .any(|e| matches!(e.kind, ParseErrorKind::UnrecognizedCharacter('?'))));
    assert_eq!(sheet.rule_sets().len(), 1);
}

#[test]
fn unterminated_rule_set_is_recorded() {
    let sheet = parse("label { color: red;");
    assert!(sheet
        .errors()
        .iter()
        .any(|e| matches!(e.kind, ParseErrorKind::Unterminated(_))));
    // The parsed prefix still applies.
    assert_eq!(sheet.rule_sets().len(), 1);
    assert_eq!(sheet.rule_sets()[0].declarations().len(), 1);
}

#[test]
fn namespace_rule_registers_prefix() {
    let sheet = parse("@namespace ui \"http://example.com/ui\"; ui|button { color: red; }");
    assert_eq!(
        sheet.namespace_for_prefix("ui"),
        Some("http://example.com/ui")
    );
    // The selector resolved the prefix at parse time.
    let selector = &sheet.rule_sets()[0].selectors()[0];
    assert!(selector.to_string().contains("http://example.com/ui"));
}

#[test]
fn default_namespace_uses_empty_prefix() {
    let sheet = parse("@namespace \"http://example.com/ui\";");
    assert_eq!(
        sheet.namespace_for_prefix(""),
        Some("http://example.com/ui")
    );
}

#[test]
fn font_face_blocks_are_collected() {
    let sheet = parse("@font-face { font-family: \"Inter\"; src: url(fonts/inter.ttf); }");
    assert_eq!(sheet.font_faces().len(), 1);
    assert_eq!(sheet.font_faces()[0].declarations.len(), 2);
}

#[test]
fn keyframes_blocks_come_back_offset_ordered() {
    let sheet = parse(
        "@keyframes fade { to { opacity: 1; } from { opacity: 0; } 50% { opacity: 0.5; } }",
    );
    let keyframe = sheet.keyframe_for_name("fade").expect("keyframe registered");
    let starts: Vec<f64> = keyframe
        .blocks()
        .iter()
        .map(bilby_css::KeyframeBlock::start_offset)
        .collect();
    assert_eq!(starts, vec![0.0, 0.5, 1.0]);
}

#[test]
fn keyframe_block_with_offset_list() {
    let sheet = parse("@keyframes blink { 0%, 100% { opacity: 1; } 50% { opacity: 0; } }");
    let keyframe = sheet.keyframe_for_name("blink").expect("keyframe");
    assert_eq!(keyframe.blocks()[0].offsets, vec![0.0, 1.0]);
}

#[test]
fn media_query_expression_trees() {
    let sheet = parse(
        "@media screen and (min-width: 320px), (orientation: portrait) { a { color: red; } }",
    );
    assert_eq!(sheet.media_groups().len(), 1);
    // One group, one rule set, query parsed to an evaluable tree
    // (evaluation semantics are covered by the cascade tests).
    assert_eq!(sheet.media_groups()[0].rule_sets().len(), 1);
}

#[test]
fn import_without_loader_is_recorded_and_skipped() {
    let sheet = parse("@import \"theme.css\"; label { color: red; }");
    assert!(sheet
        .errors()
        .iter()
        .any(|e| matches!(e.kind, ParseErrorKind::UnresolvedImport(_))));
    assert_eq!(sheet.rule_sets().len(), 1);
}

/// An in-memory loader backed by a path → source map.
struct MapLoader {
    sources: HashMap<String, String>,
}

impl ImportLoader for MapLoader {
    fn load(&self, path: &str) -> Option<String> {
        self.sources.get(path).cloned()
    }
}

#[test]
fn imports_splice_rules_in_order() {
    let mut sources = HashMap::new();
    let _ = sources.insert(
        "theme.css".to_string(),
        "button { color: green; }".to_string(),
    );
    let loader = MapLoader { sources };

    let sheet = Stylesheet::parse_with_loader(
        "a { color: red; } @import \"theme.css\"; b { color: blue; }",
        Origin::Application,
        &loader,
        "main.css",
    );

    assert!(sheet.errors().is_empty());
    assert_eq!(sheet.rule_sets().len(), 3);
    // Imported rules keep one global source order.
    let selectors: Vec<String> = sheet
        .rule_sets()
        .iter()
        .map(|rs| rs.selectors()[0].to_string())
        .collect();
    assert_eq!(selectors, vec!["a", "button", "b"]);
    assert_eq!(sheet.rule_sets()[1].source_index(), 1);
}

#[test]
fn import_cycles_are_skipped_not_fatal() {
    // a.css imports b.css which imports a.css again.
    let mut sources = HashMap::new();
    let _ = sources.insert(
        "b.css".to_string(),
        "@import \"a.css\"; button { color: green; }".to_string(),
    );
    let loader = MapLoader { sources };

    let sheet = Stylesheet::parse_with_loader(
        "@import \"b.css\"; label { color: red; }",
        Origin::Application,
        &loader,
        "a.css",
    );

    // The cycle is reported once, the non-cyclic rules all survive.
    let cycles = sheet
        .errors()
        .iter()
        .filter(|e| matches!(e.kind, ParseErrorKind::ImportCycle(_)))
        .count();
    assert_eq!(cycles, 1);
    assert_eq!(sheet.rule_sets().len(), 2);
}

#[test]
fn inline_css_parses_to_a_view_rule() {
    let sheet = Stylesheet::parse_inline("color: red; width: 10px;");
    assert_eq!(sheet.origin(), Origin::View);
    assert_eq!(sheet.rule_sets().len(), 1);
    let rule_set = &sheet.rule_sets()[0];
    assert_eq!(rule_set.declarations().len(), 2);
    assert_eq!(rule_set.selectors()[0].to_string(), "*");
}

#[test]
fn unknown_at_rules_are_skipped_with_an_error() {
    let sheet = parse("@supports (display: grid) { a { color: red; } } b { color: blue; }");
    assert!(!sheet.errors().is_empty());
    assert_eq!(sheet.rule_sets().len(), 1);
    assert_eq!(sheet.rule_sets()[0].selectors()[0].to_string(), "b");
}

#[test]
fn state_keyword_as_declaration_value() {
    // The lexer fuses `:hover`; the parser must still read this as a
    // declaration with value `hover`.
    let sheet = parse("button { default-state:hover; }");
    assert!(sheet.errors().is_empty());
    let declaration = &sheet.rule_sets()[0].declarations()[0];
    assert_eq!(declaration.name(), "default-state");
    assert_eq!(declaration.string_value(), "hover");
}

#[test]
fn errors_carry_positions_and_file() {
    let loader = MapLoader {
        sources: HashMap::new(),
    };
    let sheet = Stylesheet::parse_with_loader(
        "label {\n  @@;\n}",
        Origin::Application,
        &loader,
        "broken.css",
    );
    let error = sheet.errors().first().expect("an error");
    assert_eq!(error.file.as_deref(), Some("broken.css"));
    assert_eq!(error.position.line, 2);
}
