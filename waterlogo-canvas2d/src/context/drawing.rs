//! Fill, clear, and clip operations for Canvas2dContext.

use super::Canvas2dContext;
use crate::geometry::RectParams;
use tiny_skia::{PathBuilder, Transform};

/// Cubic Bezier handle length for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

impl Canvas2dContext {
    /// Fill a rectangle with the current fill color.
    pub fn fill_rect(&mut self, params: &RectParams) {
        log::debug!(target: "canvas", "fillRect {} {} {} {}", params.x, params.y, params.width, params.height);
        let Some(path) = rect_path(params) else {
            return;
        };
        let paint = self.fill_paint();
        let clip_mask = self.create_clip_mask();
        self.pixmap.fill_path(
            &path,
            &paint,
            tiny_skia::FillRule::Winding,
            self.state.transform,
            clip_mask.as_ref(),
        );
    }

    /// Clear a rectangle (set pixels to transparent).
    pub fn clear_rect(&mut self, params: &RectParams) {
        log::debug!(target: "canvas", "clearRect {} {} {} {}", params.x, params.y, params.width, params.height);
        let Some(path) = rect_path(params) else {
            return;
        };
        let paint = tiny_skia::Paint {
            blend_mode: tiny_skia::BlendMode::Clear,
            ..Default::default()
        };
        let clip_mask = self.create_clip_mask();
        self.pixmap.fill_path(
            &path,
            &paint,
            tiny_skia::FillRule::Winding,
            self.state.transform,
            clip_mask.as_ref(),
        );
    }

    /// Clip subsequent drawing to a rounded rectangle.
    ///
    /// The radius is clamped to half the shorter side. The clip is captured in
    /// device space and is restored along with the rest of the drawing state.
    pub fn clip_round_rect(&mut self, params: &RectParams, radius: f32) {
        log::debug!(target: "canvas", "clip roundRect r={}", radius);
        let Some(path) = round_rect_path(params, radius) else {
            return;
        };
        if let Some(device_path) = path.transform(self.state.transform) {
            self.state.clip_path = Some(device_path);
        }
    }

    pub(crate) fn create_clip_mask(&self) -> Option<tiny_skia::Mask> {
        self.state.clip_path.as_ref().and_then(|clip_path| {
            let mut mask = tiny_skia::Mask::new(self.width, self.height)?;
            mask.fill_path(
                clip_path,
                tiny_skia::FillRule::Winding,
                true,
                Transform::identity(),
            );
            Some(mask)
        })
    }

    /// Solid paint for the current fill color with global alpha applied.
    pub(crate) fn fill_paint(&self) -> tiny_skia::Paint<'static> {
        let mut color = self.state.fill_style;
        if self.state.global_alpha < 1.0 {
            color.set_alpha((color.alpha() * self.state.global_alpha).clamp(0.0, 1.0));
        }
        let mut paint = tiny_skia::Paint {
            anti_alias: true,
            ..Default::default()
        };
        paint.set_color(color);
        paint
    }
}

fn rect_path(params: &RectParams) -> Option<tiny_skia::Path> {
    let rect = tiny_skia::Rect::from_xywh(params.x, params.y, params.width, params.height)?;
    Some(PathBuilder::from_rect(rect))
}

fn round_rect_path(params: &RectParams, radius: f32) -> Option<tiny_skia::Path> {
    let RectParams {
        x,
        y,
        width,
        height,
    } = *params;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let r = radius.clamp(0.0, width.min(height) / 2.0);
    if r == 0.0 {
        return rect_path(params);
    }
    let k = r * KAPPA;
    let (right, bottom) = (x + width, y + height);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use crate::{Canvas2dContext, RectParams};

    fn full(ctx: &Canvas2dContext) -> RectParams {
        RectParams {
            x: 0.0,
            y: 0.0,
            width: ctx.width() as f32,
            height: ctx.height() as f32,
        }
    }

    fn alpha_at(data: &[u8], width: u32, x: u32, y: u32) -> u8 {
        data[((y * width + x) * 4 + 3) as usize]
    }

    #[test]
    fn test_global_alpha_applies_to_fill() {
        let mut ctx = Canvas2dContext::without_fonts(10, 10).unwrap();
        ctx.set_global_alpha(0.5);
        ctx.set_fill_style("#0000ff").unwrap();
        let rect = full(&ctx);
        ctx.fill_rect(&rect);
        let data = ctx.get_image_data(0, 0, 10, 10);
        let a = alpha_at(&data, 10, 5, 5);
        assert!((126..=129).contains(&a), "alpha was {}", a);
    }

    #[test]
    fn test_clear_rect() {
        let mut ctx = Canvas2dContext::without_fonts(20, 20).unwrap();
        let rect = full(&ctx);
        ctx.fill_rect(&rect);
        ctx.clear_rect(&RectParams {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 20.0,
        });
        let data = ctx.get_image_data(0, 0, 20, 20);
        assert_eq!(alpha_at(&data, 20, 5, 10), 0);
        assert_eq!(alpha_at(&data, 20, 15, 10), 255);
    }

    #[test]
    fn test_round_rect_clip_masks_corners() {
        let mut ctx = Canvas2dContext::without_fonts(100, 100).unwrap();
        let rect = full(&ctx);
        ctx.save();
        ctx.clip_round_rect(&rect, 50.0);
        ctx.fill_rect(&rect);
        ctx.restore();

        let data = ctx.get_image_data(0, 0, 100, 100);
        assert_eq!(alpha_at(&data, 100, 1, 1), 0);
        assert_eq!(alpha_at(&data, 100, 98, 98), 0);
        assert_eq!(alpha_at(&data, 100, 50, 50), 255);
        assert_eq!(alpha_at(&data, 100, 50, 1), 255);

        // The clip went away with restore.
        assert!(ctx.state().clip_path.is_none());
    }
}
