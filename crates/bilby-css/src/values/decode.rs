//! Lexeme-slice decoders for the typed declaration accessors.
//!
//! Each function converts the raw value lexemes of one declaration into a
//! typed value, or reports a [`ValueConversionError`] the accessor will turn
//! into its documented fallback. Decoding is pure: same lexemes in, same
//! value out.

use std::str::FromStr;

use crate::cascade::CachePolicy;
use crate::tokenizer::{Lexeme, LexemeKind};

use super::{
    AffineTransform, BorderStyle, BorderValue, ColorValue, Dimension, OffsetsValue, ShadowValue,
    SizeValue, ValueConversionError,
};

type Result<T> = core::result::Result<T, ValueConversionError>;

/// Strip whitespace lexemes.
fn significant(lexemes: &[Lexeme]) -> Vec<&Lexeme> {
    lexemes.iter().filter(|lx| !lx.is_whitespace()).collect()
}

/// Split significant lexemes into comma-delimited groups.
fn comma_groups(lexemes: &[Lexeme]) -> Vec<Vec<&Lexeme>> {
    let mut groups = vec![Vec::new()];
    for lexeme in significant(lexemes) {
        if matches!(lexeme.kind, LexemeKind::Comma) {
            groups.push(Vec::new());
        } else {
            groups.last_mut().expect("groups is never empty").push(lexeme);
        }
    }
    groups.retain(|group| !group.is_empty());
    groups
}

/// Interpret a lexeme as a length: a dimension with a length unit, or a
/// bare number taken as pixels.
fn length_of(lexeme: &Lexeme) -> Option<Dimension> {
    match &lexeme.kind {
        LexemeKind::Number { value, .. } => Some(Dimension::px(*value)),
        LexemeKind::Dimension { value, .. } => {
            let unit = lexeme.unit()?;
            unit.is_length().then(|| Dimension { value: *value, unit })
        }
        _ => None,
    }
}

/// CSS 1/2/4 side expansion: one value for all sides, two for
/// vertical/horizontal, four for top/right/bottom/left.
fn expand_sides<T: Copy>(values: &[T]) -> Option<[T; 4]> {
    match values {
        [all] => Some([*all; 4]),
        [vertical, horizontal] => Some([*vertical, *horizontal, *vertical, *horizontal]),
        [top, right, bottom, left] => Some([*top, *right, *bottom, *left]),
        _ => None,
    }
}

/// Decode a color at the start of a lexeme run; returns the color and how
/// many lexemes it consumed. Handles hex, named, and `rgb`/`hsl` forms.
fn color_from(lexemes: &[&Lexeme]) -> Option<(ColorValue, usize)> {
    let first = lexemes.first()?;
    match &first.kind {
        LexemeKind::HexColor(hex) => ColorValue::from_hex(hex).map(|c| (c, 1)),
        LexemeKind::Ident(name) => ColorValue::from_named(name).map(|c| (c, 1)),
        LexemeKind::Function(name) => {
            let mut args = Vec::new();
            let mut consumed = 1;
            for lexeme in &lexemes[1..] {
                consumed += 1;
                match &lexeme.kind {
                    LexemeKind::RParen => break,
                    LexemeKind::Comma => {}
                    _ => args.push(*lexeme),
                }
            }
            let color = match name.to_ascii_lowercase().as_str() {
                "rgb" | "rgba" => rgb_from_args(&args)?,
                "hsl" | "hsla" => hsl_from_args(&args)?,
                _ => return None,
            };
            Some((color, consumed))
        }
        _ => None,
    }
}

/// `rgb(r, g, b [, a])` with channels as 0-255 numbers or percentages.
fn rgb_from_args(args: &[&Lexeme]) -> Option<ColorValue> {
    if args.len() < 3 {
        return None;
    }
    let channel = |lexeme: &Lexeme| -> Option<u8> {
        match lexeme.kind {
            LexemeKind::Percentage(pct) => Some((pct / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8),
            LexemeKind::Number { value, .. } => Some(value.round().clamp(0.0, 255.0) as u8),
            _ => None,
        }
    };
    let alpha = match args.get(3) {
        Some(lexeme) => match lexeme.kind {
            LexemeKind::Percentage(pct) => (pct / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8,
            LexemeKind::Number { value, .. } => (value * 255.0).round().clamp(0.0, 255.0) as u8,
            _ => return None,
        },
        None => 255,
    };
    Some(ColorValue {
        r: channel(args[0])?,
        g: channel(args[1])?,
        b: channel(args[2])?,
        a: alpha,
    })
}

/// `hsl(h, s%, l% [, a])`.
fn hsl_from_args(args: &[&Lexeme]) -> Option<ColorValue> {
    if args.len() < 3 {
        return None;
    }
    let hue = args[0].number_value()?;
    let fraction = |lexeme: &Lexeme| -> Option<f64> {
        match lexeme.kind {
            LexemeKind::Percentage(pct) => Some(pct / 100.0),
            LexemeKind::Number { value, .. } => Some(value),
            _ => None,
        }
    };
    let saturation = fraction(args[1])?;
    let lightness = fraction(args[2])?;
    let alpha = match args.get(3) {
        Some(lexeme) => fraction(lexeme)?,
        None => 1.0,
    };
    Some(ColorValue::from_hsla(hue, saturation, lightness, alpha))
}

pub(crate) fn color(lexemes: &[Lexeme]) -> Result<ColorValue> {
    let sig = significant(lexemes);
    color_from(&sig)
        .map(|(color, _)| color)
        .ok_or_else(|| ValueConversionError::new("color", lexemes))
}

pub(crate) fn float(lexemes: &[Lexeme]) -> Result<f64> {
    significant(lexemes)
        .first()
        .and_then(|lx| lx.number_value())
        .ok_or_else(|| ValueConversionError::new("number", lexemes))
}

pub(crate) fn float_list(lexemes: &[Lexeme]) -> Result<Vec<f64>> {
    comma_groups(lexemes)
        .iter()
        .map(|group| {
            group
                .first()
                .and_then(|lx| lx.number_value())
                .ok_or_else(|| ValueConversionError::new("number list", lexemes))
        })
        .collect()
}

/// A time value in seconds: `0.25s`, `250ms`, or a bare number of seconds.
fn seconds_of(lexeme: &Lexeme) -> Option<f64> {
    match &lexeme.kind {
        LexemeKind::Number { value, .. } => Some(*value),
        LexemeKind::Dimension { value, .. } => {
            let unit = lexeme.unit()?;
            unit.is_time().then(|| Dimension { value: *value, unit }.to_seconds())
        }
        _ => None,
    }
}

pub(crate) fn seconds(lexemes: &[Lexeme]) -> Result<f64> {
    significant(lexemes)
        .first()
        .and_then(|lx| seconds_of(lx))
        .ok_or_else(|| ValueConversionError::new("time", lexemes))
}

pub(crate) fn seconds_list(lexemes: &[Lexeme]) -> Result<Vec<f64>> {
    comma_groups(lexemes)
        .iter()
        .map(|group| {
            group
                .first()
                .and_then(|lx| seconds_of(lx))
                .ok_or_else(|| ValueConversionError::new("time list", lexemes))
        })
        .collect()
}

pub(crate) fn string(lexemes: &[Lexeme]) -> Result<String> {
    let sig = significant(lexemes);
    if sig.is_empty() {
        return Err(ValueConversionError::new("string", lexemes));
    }
    let words: Vec<&str> = sig
        .iter()
        .map(|lx| match &lx.kind {
            LexemeKind::QuotedString(inner) => inner.as_str(),
            _ => lx.text.as_str(),
        })
        .collect();
    Ok(words.join(" "))
}

pub(crate) fn name_list(lexemes: &[Lexeme]) -> Result<Vec<String>> {
    let groups = comma_groups(lexemes);
    if groups.is_empty() {
        return Err(ValueConversionError::new("name list", lexemes));
    }
    Ok(groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|lx| match &lx.kind {
                    LexemeKind::QuotedString(inner) => inner.clone(),
                    _ => lx.text.clone(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect())
}

pub(crate) fn boolean(lexemes: &[Lexeme]) -> Result<bool> {
    match significant(lexemes).first().map(|lx| &lx.kind) {
        Some(LexemeKind::Ident(word)) => match word.to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            _ => Err(ValueConversionError::new("boolean", lexemes)),
        },
        _ => Err(ValueConversionError::new("boolean", lexemes)),
    }
}

pub(crate) fn length(lexemes: &[Lexeme]) -> Result<Dimension> {
    significant(lexemes)
        .first()
        .and_then(|lx| length_of(lx))
        .ok_or_else(|| ValueConversionError::new("length", lexemes))
}

pub(crate) fn size(lexemes: &[Lexeme]) -> Result<SizeValue> {
    let lengths: Vec<f64> = significant(lexemes)
        .iter()
        .filter_map(|lx| length_of(lx))
        .map(|d| d.to_px())
        .collect();
    match lengths.as_slice() {
        [side] => Ok(SizeValue::square(*side)),
        [width, height] => Ok(SizeValue {
            width: *width,
            height: *height,
        }),
        _ => Err(ValueConversionError::new("size", lexemes)),
    }
}

pub(crate) fn offsets(lexemes: &[Lexeme]) -> Result<OffsetsValue> {
    let lengths: Vec<f64> = significant(lexemes)
        .iter()
        .filter_map(|lx| length_of(lx))
        .map(|d| d.to_px())
        .collect();
    let [top, right, bottom, left] = expand_sides(&lengths)
        .ok_or_else(|| ValueConversionError::new("offsets", lexemes))?;
    Ok(OffsetsValue {
        top,
        right,
        bottom,
        left,
    })
}

pub(crate) fn border(lexemes: &[Lexeme]) -> Result<BorderValue> {
    let sig = significant(lexemes);
    if sig.is_empty() {
        return Err(ValueConversionError::new("border", lexemes));
    }

    let mut border = BorderValue::default();
    let mut index = 0;
    while index < sig.len() {
        let lexeme = sig[index];
        if let Some(width) = length_of(lexeme) {
            border.width = width;
            index += 1;
        } else if let LexemeKind::Ident(word) = &lexeme.kind
            && let Ok(style) = BorderStyle::from_str(word)
        {
            border.style = style;
            index += 1;
        } else if let Some((color, consumed)) = color_from(&sig[index..]) {
            border.color = color;
            index += consumed;
        } else {
            return Err(ValueConversionError::new("border", lexemes));
        }
    }
    Ok(border)
}

pub(crate) fn border_radii(lexemes: &[Lexeme]) -> Result<Vec<SizeValue>> {
    let radii: Vec<f64> = significant(lexemes)
        .iter()
        .filter_map(|lx| length_of(lx))
        .map(|d| d.to_px())
        .collect();
    let expanded = expand_sides(&radii)
        .ok_or_else(|| ValueConversionError::new("border radii", lexemes))?;
    Ok(expanded.iter().map(|&r| SizeValue::square(r)).collect())
}

pub(crate) fn border_style(lexemes: &[Lexeme]) -> Result<BorderStyle> {
    match significant(lexemes).first().map(|lx| &lx.kind) {
        Some(LexemeKind::Ident(word)) => BorderStyle::from_str(word)
            .map_err(|_| ValueConversionError::new("border style", lexemes)),
        _ => Err(ValueConversionError::new("border style", lexemes)),
    }
}

pub(crate) fn border_style_list(lexemes: &[Lexeme]) -> Result<Vec<BorderStyle>> {
    let styles: Vec<BorderStyle> = significant(lexemes)
        .iter()
        .filter_map(|lx| match &lx.kind {
            LexemeKind::Ident(word) => BorderStyle::from_str(word).ok(),
            _ => None,
        })
        .collect();
    let expanded = expand_sides(&styles)
        .ok_or_else(|| ValueConversionError::new("border style list", lexemes))?;
    Ok(expanded.to_vec())
}

/// Decode one comma group as a shadow: `[inset] h v [blur [spread]] [color]`.
fn shadow_group(group: &[&Lexeme], all: &[Lexeme]) -> Result<ShadowValue> {
    let mut shadow = ShadowValue::default();
    let mut lengths = Vec::new();
    let mut index = 0;

    while index < group.len() {
        let lexeme = group[index];
        if let LexemeKind::Ident(word) = &lexeme.kind
            && word.eq_ignore_ascii_case("inset")
        {
            shadow.inset = true;
            index += 1;
        } else if let Some(length) = length_of(lexeme) {
            lengths.push(length.to_px());
            index += 1;
        } else if let Some((color, consumed)) = color_from(&group[index..]) {
            shadow.color = color;
            index += consumed;
        } else {
            return Err(ValueConversionError::new("shadow", all));
        }
    }

    match lengths.as_slice() {
        [h, v] => {
            (shadow.h_offset, shadow.v_offset) = (*h, *v);
        }
        [h, v, blur] => {
            (shadow.h_offset, shadow.v_offset, shadow.blur) = (*h, *v, *blur);
        }
        [h, v, blur, spread] => {
            (shadow.h_offset, shadow.v_offset, shadow.blur, shadow.spread) =
                (*h, *v, *blur, *spread);
        }
        _ => return Err(ValueConversionError::new("shadow", all)),
    }
    Ok(shadow)
}

pub(crate) fn shadow(lexemes: &[Lexeme]) -> Result<ShadowValue> {
    let groups = comma_groups(lexemes);
    let first = groups
        .first()
        .ok_or_else(|| ValueConversionError::new("shadow", lexemes))?;
    shadow_group(first, lexemes)
}

pub(crate) fn shadow_list(lexemes: &[Lexeme]) -> Result<Vec<ShadowValue>> {
    let groups = comma_groups(lexemes);
    if groups.is_empty() {
        return Err(ValueConversionError::new("shadow list", lexemes));
    }
    groups
        .iter()
        .map(|group| shadow_group(group, lexemes))
        .collect()
}

pub(crate) fn url(lexemes: &[Lexeme]) -> Result<String> {
    let sig = significant(lexemes);
    match sig.first().map(|lx| &lx.kind) {
        Some(LexemeKind::Url(target)) => Ok(target.clone()),
        Some(LexemeKind::QuotedString(target)) => Ok(target.clone()),
        Some(LexemeKind::Function(name)) if name.eq_ignore_ascii_case("url") => sig
            .iter()
            .find_map(|lx| match &lx.kind {
                LexemeKind::QuotedString(target) => Some(target.clone()),
                _ => None,
            })
            .ok_or_else(|| ValueConversionError::new("url", lexemes)),
        _ => Err(ValueConversionError::new("url", lexemes)),
    }
}

/// An angle argument: dimensions use their unit, bare numbers are degrees
/// (SVG transform convention).
fn radians_of(lexeme: &Lexeme) -> Option<f64> {
    match &lexeme.kind {
        LexemeKind::Number { value, .. } => Some(value.to_radians()),
        LexemeKind::Dimension { value, .. } => {
            let unit = lexeme.unit()?;
            unit.is_angle().then(|| Dimension { value: *value, unit }.to_radians())
        }
        _ => None,
    }
}

pub(crate) fn transform(lexemes: &[Lexeme]) -> Result<AffineTransform> {
    let sig = significant(lexemes);
    let error = || ValueConversionError::new("transform", lexemes);

    let mut result = AffineTransform::IDENTITY;
    let mut index = 0;
    while index < sig.len() {
        let LexemeKind::Function(name) = &sig[index].kind else {
            return Err(error());
        };
        let mut args: Vec<&Lexeme> = Vec::new();
        index += 1;
        while index < sig.len() && !matches!(sig[index].kind, LexemeKind::RParen) {
            if !matches!(sig[index].kind, LexemeKind::Comma) {
                args.push(sig[index]);
            }
            index += 1;
        }
        if index >= sig.len() {
            return Err(error());
        }
        index += 1; // skip RParen

        let numbers: Vec<f64> = args.iter().filter_map(|lx| lx.number_value()).collect();
        let step = match name.to_ascii_lowercase().as_str() {
            "translate" => match numbers.as_slice() {
                [tx] => AffineTransform::translation(*tx, 0.0),
                [tx, ty] => AffineTransform::translation(*tx, *ty),
                _ => return Err(error()),
            },
            "scale" => match numbers.as_slice() {
                [s] => AffineTransform::scale(*s, *s),
                [sx, sy] => AffineTransform::scale(*sx, *sy),
                _ => return Err(error()),
            },
            "rotate" => {
                let angle = args.first().and_then(|lx| radians_of(lx)).ok_or_else(error)?;
                match numbers.as_slice() {
                    [_] => AffineTransform::rotation(angle),
                    [_, cx, cy] => AffineTransform::translation(-cx, -cy)
                        .then(&AffineTransform::rotation(angle))
                        .then(&AffineTransform::translation(*cx, *cy)),
                    _ => return Err(error()),
                }
            }
            "skewx" => {
                let angle = args.first().and_then(|lx| radians_of(lx)).ok_or_else(error)?;
                AffineTransform::skew_x(angle)
            }
            "skewy" => {
                let angle = args.first().and_then(|lx| radians_of(lx)).ok_or_else(error)?;
                AffineTransform::skew_y(angle)
            }
            "matrix" => match numbers.as_slice() {
                [a, b, c, d, tx, ty] => AffineTransform {
                    a: *a,
                    b: *b,
                    c: *c,
                    d: *d,
                    tx: *tx,
                    ty: *ty,
                },
                _ => return Err(error()),
            },
            _ => return Err(error()),
        };

        // Transform lists apply left-to-right: the leftmost function is the
        // outermost coordinate change.
        result = step.then(&result);
    }
    Ok(result)
}

pub(crate) fn cache_policy(lexemes: &[Lexeme]) -> Result<CachePolicy> {
    let sig = significant(lexemes);
    if sig.is_empty() {
        return Err(ValueConversionError::new("cache policy", lexemes));
    }
    let mut policy = CachePolicy::NONE;
    for lexeme in sig {
        let LexemeKind::Ident(word) = &lexeme.kind else {
            return Err(ValueConversionError::new("cache policy", lexemes));
        };
        policy = policy
            | match word.to_ascii_lowercase().as_str() {
                "none" => CachePolicy::NONE,
                "style-once" => CachePolicy::STYLE_ONCE,
                "save-for-subtree" => CachePolicy::SAVE_FOR_SUBTREE,
                "images" => CachePolicy::IMAGES,
                "all" => CachePolicy::ALL,
                _ => return Err(ValueConversionError::new("cache policy", lexemes)),
            };
    }
    Ok(policy)
}
