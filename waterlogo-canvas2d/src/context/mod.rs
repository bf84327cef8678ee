//! Canvas 2D rendering context implementation.

mod drawing;
mod image_ops;
mod text_rendering;
mod transform;

use crate::drawing_state::DrawingState;
use crate::error::{Canvas2dError, Canvas2dResult};
use crate::font_config::{FontConfig, ResolvedFontConfig};
use crate::style::ImageSmoothingQuality;
use cosmic_text::{FontSystem, SwashCache};
use tiny_skia::Pixmap;

/// Maximum surface dimension (same as Chrome).
const MAX_DIMENSION: u32 = 32767;

/// An owned RGBA raster surface with a Canvas 2D style drawing API.
pub struct Canvas2dContext {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Premultiplied pixel buffer.
    pub(crate) pixmap: Pixmap,
    pub(crate) font_system: FontSystem,
    /// Glyph outline cache.
    pub(crate) swash_cache: SwashCache,
    pub(crate) state: DrawingState,
    state_stack: Vec<DrawingState>,
    pub(crate) hinting_enabled: bool,
}

impl Canvas2dContext {
    /// Create a surface that loads the default font configuration.
    ///
    /// This scans system fonts. Batches should resolve a [`FontConfig`] once and
    /// use [`Canvas2dContext::with_resolved`] instead.
    pub fn new(width: u32, height: u32) -> Canvas2dResult<Self> {
        Self::with_resolved(width, height, &FontConfig::default().resolve())
    }

    /// Create a surface sharing a pre-resolved font database.
    pub fn with_resolved(
        width: u32,
        height: u32,
        resolved: &ResolvedFontConfig,
    ) -> Canvas2dResult<Self> {
        Self::new_internal(width, height, resolved.fontdb.clone(), resolved.hinting_enabled)
    }

    /// Create a surface with an empty font database.
    ///
    /// Suitable for image-only work such as crops, resizes and icon layouts
    /// where no text is drawn.
    pub fn without_fonts(width: u32, height: u32) -> Canvas2dResult<Self> {
        Self::new_internal(width, height, fontdb::Database::new(), false)
    }

    /// Create a surface holding a copy of non-premultiplied RGBA pixels.
    pub fn from_rgba(
        data: &[u8],
        width: u32,
        height: u32,
        resolved: Option<&ResolvedFontConfig>,
    ) -> Canvas2dResult<Self> {
        let mut ctx = match resolved {
            Some(resolved) => Self::with_resolved(width, height, resolved)?,
            None => Self::without_fonts(width, height)?,
        };
        ctx.put_image_data(data, width, height, 0, 0)?;
        Ok(ctx)
    }

    /// Wrap an already rendered premultiplied pixmap, such as a resvg output.
    pub fn from_pixmap(pixmap: Pixmap) -> Canvas2dResult<Self> {
        let mut ctx = Self::without_fonts(pixmap.width(), pixmap.height())?;
        ctx.pixmap = pixmap;
        Ok(ctx)
    }

    fn new_internal(
        width: u32,
        height: u32,
        font_db: fontdb::Database,
        hinting_enabled: bool,
    ) -> Canvas2dResult<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Canvas2dError::InvalidDimensions { width, height });
        }

        let pixmap =
            Pixmap::new(width, height).ok_or(Canvas2dError::InvalidDimensions { width, height })?;
        let font_system = FontSystem::new_with_locale_and_db("en".to_string(), font_db);

        Ok(Self {
            width,
            height,
            pixmap,
            font_system,
            swash_cache: SwashCache::new(),
            state: DrawingState::default(),
            state_stack: Vec::new(),
            hinting_enabled,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current drawing state.
    pub fn state(&self) -> &DrawingState {
        &self.state
    }

    /// Save the current drawing state.
    pub fn save(&mut self) {
        log::debug!(target: "canvas", "save");
        self.state_stack.push(self.state.clone());
    }

    /// Restore the previously saved drawing state. Unbalanced calls are ignored.
    pub fn restore(&mut self) {
        log::debug!(target: "canvas", "restore");
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }

    // --- Style setters ---

    /// Set the fill style from a CSS color string.
    pub fn set_fill_style(&mut self, style: &str) -> Canvas2dResult<()> {
        self.state.fill_style = parse_color(style)?;
        Ok(())
    }

    /// Set the global alpha. Non-finite values or values outside [0, 1] are ignored.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    /// Set the shadow color from a CSS color string.
    pub fn set_shadow_color(&mut self, color: &str) -> Canvas2dResult<()> {
        self.state.shadow_color = parse_color(color)?;
        Ok(())
    }

    /// Set the shadow blur. Negative or non-finite values are ignored.
    pub fn set_shadow_blur(&mut self, blur: f32) {
        if blur.is_finite() && blur >= 0.0 {
            self.state.shadow_blur = blur;
        }
    }

    // --- Image smoothing ---

    pub fn set_image_smoothing_quality(&mut self, quality: ImageSmoothingQuality) {
        self.state.image_smoothing_quality = quality;
    }

    pub(crate) fn get_image_filter_quality(&self) -> tiny_skia::FilterQuality {
        self.state.image_smoothing_quality.into()
    }
}

impl std::fmt::Debug for Canvas2dContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas2dContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Parse a CSS color string into a tiny_skia::Color.
pub(crate) fn parse_color(s: &str) -> Canvas2dResult<tiny_skia::Color> {
    let parsed = csscolorparser::parse(s)
        .map_err(|e| Canvas2dError::ColorParseError(format!("{}: {}", s, e)))?;

    let [r, g, b, a] = parsed.to_array();
    Ok(tiny_skia::Color::from_rgba(r, g, b, a).unwrap_or(tiny_skia::Color::BLACK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RectParams;

    fn blank(width: u32, height: u32) -> Canvas2dContext {
        Canvas2dContext::without_fonts(width, height).unwrap()
    }

    #[test]
    fn test_new_context_defaults() {
        let ctx = blank(200, 150);
        assert_eq!(ctx.width(), 200);
        assert_eq!(ctx.height(), 150);
        assert_eq!(ctx.state.global_alpha, 1.0);
        assert!(ctx.state.clip_path.is_none());
        assert!(!ctx.state.has_shadow());
        assert!(ctx.pixmap.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_pixmap_keeps_pixels() {
        let mut pixmap = Pixmap::new(4, 3).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(0, 0, 255, 255));
        let ctx = Canvas2dContext::from_pixmap(pixmap).unwrap();
        assert_eq!((ctx.width(), ctx.height()), (4, 3));
        assert_eq!(&ctx.get_image_data(2, 1, 1, 1), &[0, 0, 255, 255]);
    }

    #[test]
    fn test_text_without_fonts_draws_nothing() {
        let mut ctx = blank(40, 20);
        assert!(!ctx.has_fonts());
        ctx.set_font("600 16px sans-serif").unwrap();
        ctx.set_fill_style("#000000").unwrap();
        assert_eq!(ctx.measure_text("abc").width, 0.0);
        ctx.fill_text("abc", 20.0, 10.0);
        assert!(ctx.pixmap.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Canvas2dContext::without_fonts(0, 100),
            Err(Canvas2dError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Canvas2dContext::without_fonts(100, 40000),
            Err(Canvas2dError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_global_alpha_ignore_invalid() {
        let mut ctx = blank(10, 10);
        ctx.set_global_alpha(0.25);
        assert_eq!(ctx.state.global_alpha, 0.25);

        ctx.set_global_alpha(2.0);
        ctx.set_global_alpha(-0.5);
        ctx.set_global_alpha(f32::NAN);
        assert_eq!(ctx.state.global_alpha, 0.25);

        ctx.set_global_alpha(0.0);
        assert_eq!(ctx.state.global_alpha, 0.0);
    }

    #[test]
    fn test_shadow_setters() {
        let mut ctx = blank(10, 10);
        ctx.set_shadow_color("#000000").unwrap();
        ctx.set_shadow_blur(6.0);
        assert!(ctx.state.has_shadow());

        ctx.set_shadow_blur(-1.0);
        assert_eq!(ctx.state.shadow_blur, 6.0);

        ctx.set_shadow_color("transparent").unwrap();
        assert!(!ctx.state.has_shadow());
        assert!(ctx.set_shadow_color("not-a-color").is_err());
    }

    #[test]
    fn test_save_restore() {
        let mut ctx = blank(100, 100);
        ctx.set_global_alpha(0.7);
        ctx.translate(10.0, 20.0);
        ctx.save();

        ctx.set_global_alpha(0.3);
        ctx.translate(30.0, 40.0);
        ctx.set_fill_style("#ff0000").unwrap();
        assert_eq!(ctx.get_transform().tx, 40.0);

        ctx.restore();
        assert_eq!(ctx.state.global_alpha, 0.7);
        assert_eq!(ctx.get_transform().tx, 10.0);
        assert_eq!(ctx.get_transform().ty, 20.0);
        assert_eq!(ctx.state.fill_style, tiny_skia::Color::BLACK);

        // Extra restores leave the state alone.
        ctx.restore();
        assert_eq!(ctx.state.global_alpha, 0.7);
    }

    #[test]
    fn test_fill_rect_pixels() {
        let mut ctx = blank(100, 100);
        ctx.set_fill_style("#ff0000").unwrap();
        ctx.fill_rect(&RectParams {
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 50.0,
        });

        let data = ctx.get_image_data(0, 0, 100, 100);
        let idx = (30 * 100 + 30) * 4;
        assert_eq!(&data[idx..idx + 4], &[255, 0, 0, 255]);
        let idx_out = (5 * 100 + 5) * 4;
        assert_eq!(data[idx_out + 3], 0);
    }

    #[test]
    fn test_parse_color() {
        let c = parse_color("#ffffff").unwrap();
        assert_eq!(c, tiny_skia::Color::WHITE);
        assert!(matches!(
            parse_color("nope"),
            Err(Canvas2dError::ColorParseError(_))
        ));
    }
}
