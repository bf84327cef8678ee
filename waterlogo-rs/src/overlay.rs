//! Draws one text or image overlay onto a surface.
//!
//! Every placement is `translate` to the placement point followed by
//! `rotate`, so rotated overlays turn in place instead of orbiting the canvas
//! origin.

use crate::encode::DecodedImage;
use crate::error::{WaterlogoError, WaterlogoResult};
use crate::geometry::{
    image_tile_floor, overlay_size, resolve_anchor, text_tile_floor, tile_origins, Resolved,
};
use crate::settings::{ImageOverlay, TextOverlay, WatermarkSettings};
use waterlogo_canvas2d::{Canvas2dContext, CanvasImageDataRef, TextAlign, TextBaseline};

/// How an overlay pass was placed.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayReport {
    Tiled { count: usize },
    Anchored(Resolved<(f32, f32)>),
    /// Image overlay without a source.
    Skipped,
}

/// An overlay image decoded once and sized for drawing.
pub struct PreparedOverlay {
    surface: Canvas2dContext,
    width: u32,
    height: u32,
}

impl PreparedOverlay {
    /// Drawn size of the overlay in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixels the overlay is drawn from.
    pub fn surface(&self) -> &Canvas2dContext {
        &self.surface
    }
}

impl std::fmt::Debug for PreparedOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedOverlay")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Size an overlay image and apply the optional grayscale pass.
///
/// Grayscale runs on an offscreen surface at the drawn size, never on the
/// natural-size pixels.
pub fn prepare_image_overlay(
    decoded: &DecodedImage,
    overlay: &ImageOverlay,
) -> WaterlogoResult<PreparedOverlay> {
    let (width, height) = overlay_size(decoded.width, decoded.height, overlay.scale);
    let image = CanvasImageDataRef {
        data: &decoded.rgba,
        width: decoded.width,
        height: decoded.height,
    };
    let surface = if overlay.grayscale {
        let mut offscreen = Canvas2dContext::without_fonts(width, height)?;
        offscreen.draw_image_data_scaled(&image, 0.0, 0.0, width as f32, height as f32)?;
        offscreen.grayscale();
        offscreen
    } else {
        Canvas2dContext::from_rgba(&decoded.rgba, decoded.width, decoded.height, None)?
    };
    log::debug!(target: "overlay", "prepared overlay {}x{} grayscale={}", width, height, overlay.grayscale);
    Ok(PreparedOverlay {
        surface,
        width,
        height,
    })
}

/// Draw a text overlay. The surface state is restored afterwards.
///
/// Fails with [`WaterlogoError::InvalidConfiguration`] when the surface has no
/// fonts to draw non-empty text with.
pub fn render_text(
    surface: &mut Canvas2dContext,
    settings: &WatermarkSettings,
    text: &TextOverlay,
) -> WaterlogoResult<OverlayReport> {
    if !text.text.is_empty() && !surface.has_fonts() {
        return Err(WaterlogoError::InvalidConfiguration(
            "no fonts available for the text watermark".to_string(),
        ));
    }
    surface.save();
    let result = draw_text(surface, settings, text);
    surface.restore();
    result
}

fn draw_text(
    surface: &mut Canvas2dContext,
    settings: &WatermarkSettings,
    text: &TextOverlay,
) -> WaterlogoResult<OverlayReport> {
    surface.set_global_alpha(settings.opacity);
    surface.set_fill_style(&text.color)?;
    surface.set_text_align(TextAlign::Center);
    surface.set_text_baseline(TextBaseline::Middle);
    surface.set_font(&text.font())?;
    if let Some(shadow) = &text.shadow {
        surface.set_shadow_color(&shadow.color)?;
        surface.set_shadow_blur(shadow.blur);
    }

    let rad = settings.angle.to_radians();
    let (w, h) = (surface.width() as f32, surface.height() as f32);

    if settings.tile {
        let floor = text_tile_floor(text.font_size);
        let grid = tile_origins(w, h, settings.spacing.x, settings.spacing.y, floor, floor);
        for (x, y) in grid.origins() {
            surface.save();
            surface.translate(x, y);
            surface.rotate(rad);
            surface.fill_text(&text.text, 0.0, 0.0);
            surface.restore();
        }
        log::debug!(target: "overlay", "tiled text {} times at step {}x{}", grid.len(), grid.step_x, grid.step_y);
        Ok(OverlayReport::Tiled { count: grid.len() })
    } else {
        let width = surface.measure_text(&text.text).width;
        let resolved = resolve_anchor(&settings.position, w, h, width, text.font_size);
        let (x, y) = resolved.value;
        surface.translate(x, y);
        surface.rotate(rad);
        surface.fill_text(&text.text, 0.0, 0.0);
        Ok(OverlayReport::Anchored(resolved))
    }
}

/// Draw a prepared image overlay. The surface state is restored afterwards.
pub fn render_image(
    surface: &mut Canvas2dContext,
    settings: &WatermarkSettings,
    overlay: &PreparedOverlay,
) -> OverlayReport {
    let (ow, oh) = (overlay.width as f32, overlay.height as f32);
    let rad = settings.angle.to_radians();
    let (w, h) = (surface.width() as f32, surface.height() as f32);

    surface.save();
    surface.set_global_alpha(settings.opacity);
    let report = if settings.tile {
        let grid = tile_origins(
            w,
            h,
            settings.spacing.x,
            settings.spacing.y,
            image_tile_floor(ow),
            image_tile_floor(oh),
        );
        for (x, y) in grid.origins() {
            surface.save();
            surface.translate(x, y);
            surface.rotate(rad);
            surface.draw_canvas_scaled(&overlay.surface, -ow / 2.0, -oh / 2.0, ow, oh);
            surface.restore();
        }
        OverlayReport::Tiled { count: grid.len() }
    } else {
        let resolved = resolve_anchor(&settings.position, w, h, ow, oh);
        let (x, y) = resolved.value;
        surface.translate(x, y);
        surface.rotate(rad);
        surface.draw_canvas_scaled(&overlay.surface, -ow / 2.0, -oh / 2.0, ow, oh);
        OverlayReport::Anchored(resolved)
    };
    surface.restore();
    report
}
