//! CSS font shorthand parsing.
//!
//! Overlays describe their font as `"{weight} {size}px {family-list}"`, e.g.
//! `"600 48px Segoe UI, Arial, sans-serif"`. This module splits such strings
//! into the pieces cosmic-text needs.

use crate::error::{Canvas2dError, Canvas2dResult};
use cosmic_text::{Style, Weight};

/// Parsed font specification from a CSS font string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFont {
    pub style: Style,
    pub weight: Weight,
    /// Font size in pixels.
    pub size_px: f32,
    /// Font families in order of preference.
    pub families: Vec<String>,
}

impl Default for ParsedFont {
    fn default() -> Self {
        Self {
            style: Style::Normal,
            weight: Weight::NORMAL,
            size_px: 10.0,
            families: vec!["sans-serif".to_string()],
        }
    }
}

/// Parse a CSS font string: `[style] [weight] size[/line-height] family[, family]*`.
pub fn parse_font(font_str: &str) -> Canvas2dResult<ParsedFont> {
    let font_str = font_str.trim();
    if font_str.is_empty() {
        return Ok(ParsedFont::default());
    }

    let mut result = ParsedFont::default();
    let mut remaining = font_str;

    // Style and weight keywords may appear in any order before the size.
    loop {
        let trimmed = remaining.trim_start();
        let (token, rest) = split_token(trimmed);
        match token {
            "italic" => result.style = Style::Italic,
            "oblique" => result.style = Style::Oblique,
            "normal" | "small-caps" => {}
            "bold" => result.weight = Weight::BOLD,
            "bolder" => result.weight = Weight::EXTRA_BOLD,
            "lighter" => result.weight = Weight::LIGHT,
            _ => match parse_numeric_weight(token) {
                Some(weight) => result.weight = weight,
                None => break,
            },
        }
        remaining = rest;
    }

    let (size, rest) = parse_font_size(remaining.trim_start())?;
    result.size_px = size;
    remaining = rest.trim_start();

    if let Some(rest) = remaining.strip_prefix('/') {
        let (_, rest) = split_token(rest);
        remaining = rest.trim_start();
    }

    if !remaining.is_empty() {
        result.families = parse_font_families(remaining);
    }

    Ok(result)
}

fn split_token(s: &str) -> (&str, &str) {
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    (&s[..end], &s[end..])
}

/// Numeric weights accept any integer in 1..=1000, like CSS Fonts 4.
fn parse_numeric_weight(token: &str) -> Option<Weight> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let weight: u16 = token.parse().ok()?;
    (1..=1000).contains(&weight).then_some(Weight(weight))
}

fn parse_font_size(s: &str) -> Canvas2dResult<(f32, &str)> {
    let num_end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    if num_end == 0 {
        return Err(Canvas2dError::FontParseError(format!(
            "Expected font size, got: {}",
            s
        )));
    }

    let (num_str, rest) = s.split_at(num_end);
    let size: f32 = num_str.parse().map_err(|_| {
        Canvas2dError::FontParseError(format!("Invalid font size number: {}", num_str))
    })?;

    let (multiplier, unit_len) = if rest.starts_with("px") {
        (1.0, 2)
    } else if rest.starts_with("pt") {
        (4.0 / 3.0, 2)
    } else if rest.starts_with("rem") {
        (16.0, 3)
    } else if rest.starts_with("em") {
        (16.0, 2)
    } else {
        (1.0, 0)
    };

    if size <= 0.0 {
        return Err(Canvas2dError::FontParseError(format!(
            "Font size must be positive: {}",
            num_str
        )));
    }

    Ok((size * multiplier, &rest[unit_len..]))
}

fn parse_font_families(s: &str) -> Vec<String> {
    let families: Vec<String> = s
        .split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();

    if families.is_empty() {
        vec!["sans-serif".to_string()]
    } else {
        families
    }
}
