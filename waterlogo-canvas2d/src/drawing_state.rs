//! Drawing state that can be saved and restored.

use crate::font_parser::ParsedFont;
use crate::style::{ImageSmoothingQuality, TextAlign, TextBaseline};
use tiny_skia::{Color, Transform};

/// Drawing state that can be saved and restored.
#[derive(Debug, Clone)]
pub struct DrawingState {
    /// Current fill color.
    pub fill_style: Color,
    /// Current font specification.
    pub font: ParsedFont,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
    /// Opacity applied to every fill and image draw.
    pub global_alpha: f32,
    /// Current transform matrix.
    pub transform: Transform,
    /// Clipping path in device space (if any).
    pub clip_path: Option<tiny_skia::Path>,
    /// Shadow color used by text fills. Transparent disables the shadow.
    pub shadow_color: Color,
    /// Shadow blur amount in pixels, not affected by the transform.
    pub shadow_blur: f32,
    pub image_smoothing_quality: ImageSmoothingQuality,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            fill_style: Color::BLACK,
            font: ParsedFont::default(),
            text_align: TextAlign::default(),
            text_baseline: TextBaseline::default(),
            global_alpha: 1.0,
            transform: Transform::identity(),
            clip_path: None,
            shadow_color: Color::TRANSPARENT,
            shadow_blur: 0.0,
            image_smoothing_quality: ImageSmoothingQuality::default(),
        }
    }
}

impl DrawingState {
    /// Whether a text fill should also paint a shadow.
    pub(crate) fn has_shadow(&self) -> bool {
        self.shadow_color.alpha() > 0.0 && self.shadow_blur > 0.0
    }
}
