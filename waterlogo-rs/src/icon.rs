//! Icon layout: an image fitted onto a square-ish canvas with background,
//! rounded corners, and free offset, rotation and zoom.

use crate::encode::{encode_rgba, DecodedImage, RasterFormat};
use crate::error::{WaterlogoError, WaterlogoResult};
use crate::settings::DEFAULT_QUALITY;
use serde::{Deserialize, Serialize};
use waterlogo_canvas2d::{Canvas2dContext, CanvasImageDataRef, ImageSmoothingQuality, RectParams};

pub const MIN_ICON_SCALE: f32 = 0.1;
pub const MAX_ICON_SCALE: f32 = 5.0;
pub const ZOOM_STEP: f32 = 0.1;

/// RGB distance below which a pixel matches the sampled corner color.
pub const CORNER_TOLERANCE: f32 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IconSettings {
    pub width: u32,
    pub height: u32,
    /// CSS color.
    pub background: String,
    pub background_opacity: f32,
    /// Corner radius as a percentage of half the shorter side.
    pub border_radius: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
    /// Degrees.
    pub rotation: f32,
    pub quality: f32,
}

impl Default for IconSettings {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            background: "#ffffff".to_string(),
            background_opacity: 1.0,
            border_radius: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl IconSettings {
    /// Corner radius in pixels.
    pub fn radius_px(&self) -> f32 {
        let min_dim = self.width.min(self.height) as f32;
        (self.border_radius.clamp(0.0, 100.0) / 100.0) * (min_dim / 2.0)
    }
}

/// Lay out the icon onto a fresh surface.
///
/// The image is contain-fitted, centred, then moved by the offset, rotated
/// and zoomed about its own centre.
pub fn render_icon(
    image: Option<&DecodedImage>,
    settings: &IconSettings,
) -> WaterlogoResult<Canvas2dContext> {
    let (w, h) = (settings.width as f32, settings.height as f32);
    let mut ctx = Canvas2dContext::without_fonts(settings.width, settings.height)?;
    let full = RectParams {
        x: 0.0,
        y: 0.0,
        width: w,
        height: h,
    };
    ctx.clear_rect(&full);

    ctx.save();
    if settings.border_radius > 0.0 {
        ctx.clip_round_rect(&full, settings.radius_px());
    }

    if settings.background_opacity > 0.0 {
        ctx.save();
        ctx.set_global_alpha(settings.background_opacity.min(1.0));
        ctx.set_fill_style(&settings.background)?;
        ctx.fill_rect(&full);
        ctx.restore();
    }

    if let Some(image) = image {
        let fit = (w / image.width as f32).min(h / image.height as f32);
        let (sw, sh) = (image.width as f32 * fit, image.height as f32 * fit);
        ctx.save();
        ctx.set_image_smoothing_quality(ImageSmoothingQuality::High);
        ctx.translate(w / 2.0 + settings.offset_x, h / 2.0 + settings.offset_y);
        ctx.rotate(settings.rotation.to_radians());
        ctx.scale(settings.scale, settings.scale);
        let data = CanvasImageDataRef {
            data: &image.rgba,
            width: image.width,
            height: image.height,
        };
        ctx.draw_image_data_scaled(&data, -sw / 2.0, -sh / 2.0, sw, sh)?;
        ctx.restore();
    }
    ctx.restore();
    Ok(ctx)
}

/// One wheel or button zoom step, clamped and rounded to two decimals.
pub fn step_zoom(scale: f32, delta: f32) -> f32 {
    let next = (scale + delta).clamp(MIN_ICON_SCALE, MAX_ICON_SCALE);
    (next * 100.0).round() / 100.0
}

/// Wheel zoom: scrolling up zooms in by one step.
pub fn wheel_zoom(scale: f32, delta_y: f32) -> f32 {
    step_zoom(scale, if delta_y < 0.0 { ZOOM_STEP } else { -ZOOM_STEP })
}

/// Offset after dragging the pointer from `from` to `to`, starting at `start`.
pub fn drag_offset(start: (f32, f32), from: (f32, f32), to: (f32, f32)) -> (f32, f32) {
    (start.0 + (to.0 - from.0), start.1 + (to.1 - from.1))
}

/// Make pixels close to the average corner color transparent.
pub fn remove_corner_background(image: &mut DecodedImage, tolerance: f32) {
    let (w, h) = (image.width as usize, image.height as usize);
    if w == 0 || h == 0 {
        return;
    }
    let corners = [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)];
    let mut total = [0u32; 3];
    for (x, y) in corners {
        let idx = (y * w + x) * 4;
        for (c, sum) in total.iter_mut().enumerate() {
            *sum += image.rgba[idx + c] as u32;
        }
    }
    let bg = total.map(|t| (t as f32 / 4.0).round());
    log::debug!(target: "icon", "corner background {:?}", bg);

    for px in image.rgba.chunks_exact_mut(4) {
        let dist = (0..3)
            .map(|c| (px[c] as f32 - bg[c]).powi(2))
            .sum::<f32>()
            .sqrt();
        if dist < tolerance {
            px[3] = 0;
        }
    }
}

/// Render and encode an icon. ICO containers are assembled elsewhere from
/// the PNG output.
pub fn export_icon(
    image: Option<&DecodedImage>,
    settings: &IconSettings,
    format: RasterFormat,
) -> WaterlogoResult<Vec<u8>> {
    if image.is_none() && settings.background_opacity == 0.0 {
        return Err(WaterlogoError::InvalidConfiguration(
            "upload an image first".to_string(),
        ));
    }
    let ctx = render_icon(image, settings)?;
    let (w, h) = (ctx.width(), ctx.height());
    encode_rgba(&ctx.into_rgba(), w, h, format, settings.quality)
}
