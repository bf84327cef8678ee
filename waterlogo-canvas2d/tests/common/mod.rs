//! Shared helpers for waterlogo-canvas2d integration tests.

use std::sync::OnceLock;
use waterlogo_canvas2d::{FontConfig, ResolvedFontConfig};

/// System fonts, resolved once for the whole test binary.
pub fn resolved_fonts() -> &'static ResolvedFontConfig {
    static FONTS: OnceLock<ResolvedFontConfig> = OnceLock::new();
    FONTS.get_or_init(|| FontConfig::default().resolve())
}

/// Whether the machine running the tests has any font installed.
pub fn fonts_available() -> bool {
    resolved_fonts().face_count() > 0
}

/// Skip a test when glyph rendering is impossible on this machine.
macro_rules! skip_if_no_fonts {
    () => {
        if !crate::common::fonts_available() {
            eprintln!("Skipping test: no system fonts available");
            return;
        }
    };
}
pub(crate) use skip_if_no_fonts;

/// Bounding box `(min_x, min_y, max_x, max_y)` of pixels that differ from `bg`.
pub fn changed_bounds(data: &[u8], width: u32, bg: [u8; 4]) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (i, px) in data.chunks_exact(4).enumerate() {
        if px == bg {
            continue;
        }
        let (x, y) = (i as u32 % width, i as u32 / width);
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}
