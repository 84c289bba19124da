//! Integration tests for the lazy declaration value decoder.

use std::str::FromStr;

use bilby_css::{BorderStyle, CachePolicy, ColorValue, Declaration, Unit};
use strum_macros::EnumString;

fn declaration(name: &str, value: &str) -> Declaration {
    Declaration::from_source(name, value)
}

#[test]
fn hex_colors() {
    assert_eq!(
        declaration("color", "#ff0000").color_value(),
        ColorValue::rgb(255, 0, 0)
    );
    // Short form replicates digits.
    assert_eq!(
        declaration("color", "#fff").color_value(),
        ColorValue::WHITE
    );
    // Eight digits carry alpha.
    assert_eq!(
        declaration("color", "#00000080").color_value().a,
        0x80
    );
}

#[test]
fn named_colors() {
    assert_eq!(
        declaration("color", "blue").color_value(),
        ColorValue::rgb(0, 0, 255)
    );
    assert!(declaration("color", "transparent")
        .color_value()
        .is_transparent());
}

#[test]
fn functional_colors() {
    assert_eq!(
        declaration("color", "rgb(10, 20, 30)").color_value(),
        ColorValue::rgb(10, 20, 30)
    );
    let with_alpha = declaration("color", "rgba(10, 20, 30, 0.5)").color_value();
    assert_eq!(with_alpha.a, 128);

    // hsl(0, 100%, 50%) is pure red.
    assert_eq!(
        declaration("color", "hsl(0, 100%, 50%)").color_value(),
        ColorValue::rgb(255, 0, 0)
    );
    // hsl(120, 100%, 25%) is css `green`.
    assert_eq!(
        declaration("color", "hsl(120, 100%, 25%)").color_value(),
        ColorValue::rgb(0, 128, 0)
    );
}

#[test]
fn malformed_color_falls_back_to_transparent() {
    let declaration = declaration("color", "rgb(1, 2)");
    assert_eq!(declaration.color_value(), ColorValue::TRANSPARENT);
    // The failure never poisons other accessors of the same declaration.
    assert!(!declaration.string_value().is_empty());
}

#[test]
fn lengths_and_units() {
    let length = declaration("width", "12px").length_value();
    assert!((length.value - 12.0).abs() < f64::EPSILON);
    assert_eq!(length.unit, Unit::Px);

    // Unitless numbers are taken as pixels.
    assert!((declaration("width", "7").length_value().to_px() - 7.0).abs() < f64::EPSILON);
    // Font-relative units resolve against the default font size.
    assert!((declaration("width", "2em").length_value().to_px() - 32.0).abs() < f64::EPSILON);
    // Physical units assume 96 px/inch.
    assert!((declaration("width", "1in").length_value().to_px() - 96.0).abs() < f64::EPSILON);
    // Malformed lengths fall back to zero.
    assert!((declaration("width", "wide").length_value().to_px()).abs() < f64::EPSILON);
}

#[test]
fn times_decode_to_seconds() {
    assert!((declaration("delay", "250ms").seconds_value() - 0.25).abs() < 1e-9);
    assert!((declaration("delay", "1.5s").seconds_value() - 1.5).abs() < 1e-9);
    assert_eq!(
        declaration("delays", "100ms, 2s").seconds_list_value(),
        vec![0.1, 2.0]
    );
}

#[test]
fn float_lists_split_on_commas() {
    assert_eq!(
        declaration("dashes", "1, 2.5, 3").float_list_value(),
        vec![1.0, 2.5, 3.0]
    );
    assert!((declaration("opacity", "0.4").float_value() - 0.4).abs() < 1e-9);
}

#[test]
fn offsets_expand_sides() {
    // 1 value: all sides.
    let uniform = declaration("padding", "4px").offsets_value();
    assert_eq!(
        (uniform.top, uniform.right, uniform.bottom, uniform.left),
        (4.0, 4.0, 4.0, 4.0)
    );
    // 2 values: vertical / horizontal.
    let pair = declaration("padding", "4px 8px").offsets_value();
    assert_eq!(
        (pair.top, pair.right, pair.bottom, pair.left),
        (4.0, 8.0, 4.0, 8.0)
    );
    // 4 values: top/right/bottom/left.
    let all = declaration("padding", "1px 2px 3px 4px").offsets_value();
    assert_eq!((all.top, all.right, all.bottom, all.left), (1.0, 2.0, 3.0, 4.0));
    // 3 values are not a documented form: fall back to zero offsets.
    let bad = declaration("padding", "1px 2px 3px").offsets_value();
    assert_eq!((bad.top, bad.right, bad.bottom, bad.left), (0.0, 0.0, 0.0, 0.0));
}

#[test]
fn border_shorthand() {
    let border = declaration("border", "1px solid #dddddd").border_value();
    assert!((border.width.value - 1.0).abs() < f64::EPSILON);
    assert_eq!(border.style, BorderStyle::Solid);
    assert_eq!(border.color, ColorValue::rgb(0xdd, 0xdd, 0xdd));

    // Order is flexible.
    let reversed = declaration("border", "red dashed 2px").border_value();
    assert_eq!(reversed.style, BorderStyle::Dashed);
    assert_eq!(reversed.color, ColorValue::rgb(255, 0, 0));

    // Fallback: zero width, no style, transparent.
    let fallback = declaration("border", "what even").border_value();
    assert_eq!(fallback.style, BorderStyle::None);
    assert!(fallback.color.is_transparent());
}

#[test]
fn border_radii_expand() {
    let radii = declaration("border-radius", "2px 4px").border_radii_list();
    assert_eq!(radii.len(), 4);
    assert!((radii[0].width - 2.0).abs() < f64::EPSILON);
    assert!((radii[1].width - 4.0).abs() < f64::EPSILON);
    assert!((radii[2].width - 2.0).abs() < f64::EPSILON);
    assert!((radii[3].width - 4.0).abs() < f64::EPSILON);
}

#[test]
fn border_style_lists() {
    assert_eq!(
        declaration("border-style", "solid").border_style_value(),
        BorderStyle::Solid
    );
    assert_eq!(
        declaration("border-style", "solid dotted").border_style_list(),
        vec![
            BorderStyle::Solid,
            BorderStyle::Dotted,
            BorderStyle::Solid,
            BorderStyle::Dotted
        ]
    );
}

#[test]
fn shadows_decode_per_comma_group() {
    let shadow = declaration("shadow", "inset 1px 2px 3px 4px black").shadow_value();
    assert!(shadow.inset);
    assert_eq!(
        (shadow.h_offset, shadow.v_offset, shadow.blur, shadow.spread),
        (1.0, 2.0, 3.0, 4.0)
    );
    assert_eq!(shadow.color, ColorValue::BLACK);

    let list = declaration("shadow", "1px 1px red, 2px 2px 4px blue").shadow_list_value();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].color, ColorValue::rgb(255, 0, 0));
    assert!((list[1].blur - 4.0).abs() < f64::EPSILON);
    assert!(!list[1].inset);
}

#[test]
fn sizes() {
    let size = declaration("size", "10px 20px").size_value();
    assert_eq!((size.width, size.height), (10.0, 20.0));
    let square = declaration("size", "8px").size_value();
    assert_eq!((square.width, square.height), (8.0, 8.0));
}

#[test]
fn urls() {
    assert_eq!(
        declaration("background-image", "url(images/bg.png)").url_value(),
        "images/bg.png"
    );
    assert_eq!(
        declaration("background-image", "url(\"images/bg.png\")").url_value(),
        "images/bg.png"
    );
    assert_eq!(declaration("background-image", "12px").url_value(), "");
}

#[test]
fn transforms_compose_left_to_right() {
    let transform = declaration("transform", "translate(10, 5) scale(2)")
        .affine_transform_value();
    // SVG semantics: the scale happens inside the translated frame, so the
    // origin lands at (10, 5) and the scale factor stays on the diagonal.
    assert!((transform.tx - 10.0).abs() < 1e-9);
    assert!((transform.ty - 5.0).abs() < 1e-9);
    assert!((transform.a - 2.0).abs() < 1e-9);
    assert!((transform.d - 2.0).abs() < 1e-9);

    let rotate = declaration("transform", "rotate(90)").affine_transform_value();
    assert!((rotate.a).abs() < 1e-9);
    assert!((rotate.b - 1.0).abs() < 1e-9);

    // Malformed transforms fall back to identity.
    let identity = declaration("transform", "spin(1)").affine_transform_value();
    assert_eq!(identity, bilby_css::AffineTransform::IDENTITY);
}

#[test]
fn booleans_and_names() {
    assert!(declaration("enabled", "true").boolean_value());
    assert!(!declaration("enabled", "maybe").boolean_value());
    assert_eq!(
        declaration("animation-name", "fade, slide-in").name_list_value(),
        vec!["fade".to_string(), "slide-in".to_string()]
    );
}

#[test]
fn cache_policy_keywords() {
    assert_eq!(
        declaration("cache-styles", "none").cache_policy_value(),
        CachePolicy::NONE
    );
    let combined = declaration("cache-styles", "style-once images").cache_policy_value();
    assert!(combined.contains(CachePolicy::STYLE_ONCE));
    assert!(combined.contains(CachePolicy::IMAGES));
    assert!(!combined.contains(CachePolicy::SAVE_FOR_SUBTREE));
    assert_eq!(
        declaration("cache-styles", "all").cache_policy_value(),
        CachePolicy::ALL
    );
    // Unknown keywords fall back to NONE.
    assert_eq!(
        declaration("cache-styles", "sometimes").cache_policy_value(),
        CachePolicy::NONE
    );
}

/// A keyword enum the way embedders declare them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[test]
fn keyword_accessor_uses_strum() {
    assert_eq!(
        declaration("text-align", "center").keyword_value::<TextAlign>(),
        TextAlign::Center
    );
    // Unknown keywords fall back to the enum default.
    assert_eq!(
        declaration("text-align", "justified").keyword_value::<TextAlign>(),
        TextAlign::Left
    );
    // FromStr stays usable directly.
    assert_eq!(TextAlign::from_str("right"), Ok(TextAlign::Right));
}

#[test]
fn decoding_is_memoized_and_repeatable() {
    let declaration = declaration("color", "#336699");
    let first = declaration.color_value();
    let second = declaration.color_value();
    assert_eq!(first, second);
    // A clone starts with a fresh memo but decodes to the same value.
    assert_eq!(declaration.clone().color_value(), first);
}

#[test]
fn important_flag_does_not_change_decoding() {
    let sheet = bilby_css::Stylesheet::parse(
        "a { width: 5px !important; }",
        bilby_css::Origin::Application,
    );
    let declaration = &sheet.rule_sets()[0].declarations()[0];
    assert!(declaration.important());
    assert!((declaration.length_value().to_px() - 5.0).abs() < f64::EPSILON);
}
