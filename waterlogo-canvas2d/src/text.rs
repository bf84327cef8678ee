//! Text shaping and measurement using cosmic-text.

use crate::font_parser::ParsedFont;
use crate::style::{TextAlign, TextBaseline};
use cosmic_text::{Attrs, Buffer, CacheKeyFlags, Family, FontSystem, Metrics, Shaping};

/// Text metrics returned by `measure_text`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    /// Advance width of the text in pixels.
    pub width: f32,
    /// Distance from the alphabetic baseline to the top of the line box.
    pub ascent: f32,
    /// Distance from the alphabetic baseline to the bottom of the line box.
    pub descent: f32,
}

/// A font family picked from a CSS family list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ResolvedFamily {
    Named(String),
    SansSerif,
    Serif,
    Monospace,
}

impl ResolvedFamily {
    pub(crate) fn as_family(&self) -> Family<'_> {
        match self {
            ResolvedFamily::Named(name) => Family::Name(name),
            ResolvedFamily::SansSerif => Family::SansSerif,
            ResolvedFamily::Serif => Family::Serif,
            ResolvedFamily::Monospace => Family::Monospace,
        }
    }
}

/// Walk the family list and take the first entry the database can serve.
///
/// Generic names always match. Named families are compared case-insensitively
/// against installed faces. An exhausted list falls back to sans-serif.
pub(crate) fn resolve_family(font_system: &FontSystem, families: &[String]) -> ResolvedFamily {
    for family in families {
        match family.to_ascii_lowercase().as_str() {
            "sans-serif" | "system-ui" => return ResolvedFamily::SansSerif,
            "serif" => return ResolvedFamily::Serif,
            "monospace" => return ResolvedFamily::Monospace,
            _ => {}
        }
        let installed = font_system.db().faces().find_map(|face| {
            face.families
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(family))
                .map(|(name, _)| name.clone())
        });
        if let Some(name) = installed {
            return ResolvedFamily::Named(name);
        }
    }
    ResolvedFamily::SansSerif
}

/// A shaped single-line layout along with its measurements.
pub(crate) struct ShapedText {
    pub buffer: Buffer,
    pub metrics: TextMetrics,
}

/// Shape `text` with the given font. `None` when the database has no faces.
pub(crate) fn shape_text(
    font_system: &mut FontSystem,
    text: &str,
    font: &ParsedFont,
    hinting_enabled: bool,
) -> Option<ShapedText> {
    if font_system.db().is_empty() {
        return None;
    }
    let metrics = Metrics::new(font.size_px, font.size_px * 1.2);
    let mut buffer = Buffer::new(font_system, metrics);

    let family = resolve_family(font_system, &font.families);
    let flags = if hinting_enabled {
        CacheKeyFlags::empty()
    } else {
        CacheKeyFlags::DISABLE_HINTING
    };
    let attrs = Attrs::new()
        .family(family.as_family())
        .weight(font.weight)
        .style(font.style)
        .cache_key_flags(flags);

    buffer.set_text(font_system, text, &attrs, Shaping::Advanced, None);
    buffer.shape_until_scroll(font_system, false);

    let mut width: f32 = 0.0;
    let mut ascent: f32 = 0.0;
    let mut descent: f32 = 0.0;
    for run in buffer.layout_runs() {
        width = width.max(run.line_w);
        ascent = ascent.max(run.line_y - run.line_top);
        descent = descent.max((run.line_top + run.line_height) - run.line_y);
    }
    if ascent == 0.0 && descent == 0.0 {
        ascent = font.size_px * 0.8;
        descent = font.size_px * 0.2;
    }

    Some(ShapedText {
        buffer,
        metrics: TextMetrics {
            width,
            ascent,
            descent,
        },
    })
}

/// X offset from the anchor to the start of the text.
pub(crate) fn calculate_text_x_offset(width: f32, align: TextAlign) -> f32 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Right => -width,
        TextAlign::Center => -width / 2.0,
    }
}

/// Y offset from the anchor to the alphabetic baseline.
pub(crate) fn calculate_text_y_offset(ascent: f32, descent: f32, baseline: TextBaseline) -> f32 {
    match baseline {
        TextBaseline::Top => ascent,
        TextBaseline::Middle => (ascent - descent) / 2.0,
        TextBaseline::Alphabetic => 0.0,
        TextBaseline::Bottom => -descent,
    }
}
