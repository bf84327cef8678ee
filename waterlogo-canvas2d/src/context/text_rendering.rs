//! Text rendering operations for Canvas2dContext.

use super::Canvas2dContext;
use crate::error::Canvas2dResult;
use crate::font_parser::parse_font;
use crate::shadow::{blur_margin, blur_rgba8_premul, sigma_for_blur};
use crate::style::{TextAlign, TextBaseline};
use crate::text::{calculate_text_x_offset, calculate_text_y_offset, shape_text, TextMetrics};
use cosmic_text::{Buffer, Command};
use tiny_skia::{FillRule, Mask, Pixmap, PixmapPaint, Transform};

impl Canvas2dContext {
    /// Set the font from a CSS font string.
    pub fn set_font(&mut self, font: &str) -> Canvas2dResult<()> {
        self.state.font = parse_font(font)?;
        Ok(())
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.state.text_align = align;
    }

    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.text_baseline = baseline;
    }

    /// Whether the surface's font database has any face to draw text with.
    pub fn has_fonts(&self) -> bool {
        !self.font_system.db().is_empty()
    }

    /// Measure text with the current font. Zero metrics without fonts.
    pub fn measure_text(&mut self, text: &str) -> TextMetrics {
        shape_text(
            &mut self.font_system,
            text,
            &self.state.font,
            self.hinting_enabled,
        )
        .map(|shaped| shaped.metrics)
        .unwrap_or_default()
    }

    /// Fill text at the specified position, painting the shadow first when one is set.
    ///
    /// Draws nothing when the surface has no fonts.
    pub fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        log::debug!(target: "canvas", "fillText \"{}\" {} {}", text, x, y);
        if text.is_empty() {
            return;
        }

        let Some(shaped) = shape_text(
            &mut self.font_system,
            text,
            &self.state.font,
            self.hinting_enabled,
        ) else {
            log::warn!(target: "canvas", "no fonts loaded, skipping fillText");
            return;
        };
        let metrics = shaped.metrics;
        let base_x = x + calculate_text_x_offset(metrics.width, self.state.text_align);
        let base_y = y + calculate_text_y_offset(
            metrics.ascent,
            metrics.descent,
            self.state.text_baseline,
        );

        let paths = self.glyph_paths(&shaped.buffer, base_x, base_y);
        if paths.is_empty() {
            return;
        }

        let clip_mask = self.create_clip_mask();
        if self.state.has_shadow() {
            self.draw_shadow(&paths, clip_mask.as_ref());
        }

        let paint = self.fill_paint();
        for path in &paths {
            self.pixmap.fill_path(
                path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                clip_mask.as_ref(),
            );
        }
    }

    /// Glyph outlines of a shaped buffer, positioned and mapped to device space.
    fn glyph_paths(&mut self, buffer: &Buffer, base_x: f32, base_y: f32) -> Vec<tiny_skia::Path> {
        let transform = self.state.transform;
        let mut paths = Vec::new();

        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                let physical_glyph = glyph.physical((base_x, base_y), 1.0);
                let glyph_x = base_x + glyph.x + glyph.font_size * glyph.x_offset;
                let glyph_y = base_y + glyph.y - glyph.font_size * glyph.y_offset;

                let Some(commands) = self
                    .swash_cache
                    .get_outline_commands(&mut self.font_system, physical_glyph.cache_key)
                else {
                    continue;
                };

                // Font outlines are y-up.
                let mut path_builder = tiny_skia::PathBuilder::new();
                for cmd in commands {
                    match cmd {
                        Command::MoveTo(p) => path_builder.move_to(p.x, -p.y),
                        Command::LineTo(p) => path_builder.line_to(p.x, -p.y),
                        Command::QuadTo(ctrl, end) => {
                            path_builder.quad_to(ctrl.x, -ctrl.y, end.x, -end.y)
                        }
                        Command::CurveTo(c1, c2, end) => {
                            path_builder.cubic_to(c1.x, -c1.y, c2.x, -c2.y, end.x, -end.y)
                        }
                        Command::Close => path_builder.close(),
                    }
                }

                let glyph_transform =
                    Transform::from_translate(glyph_x, glyph_y).post_concat(transform);
                if let Some(path) = path_builder
                    .finish()
                    .and_then(|path| path.transform(glyph_transform))
                {
                    paths.push(path);
                }
            }
        }
        paths
    }

    /// Paint a blurred copy of the glyphs in the shadow color.
    ///
    /// The blur runs on a layer covering only the glyph bounds plus the blur
    /// spread, so tiled overlays do not blur the whole surface once per tile.
    fn draw_shadow(&mut self, paths: &[tiny_skia::Path], clip_mask: Option<&Mask>) {
        let sigma = sigma_for_blur(self.state.shadow_blur);
        let margin = blur_margin(sigma) as f32 + 1.0;

        let (mut left, mut top) = (f32::MAX, f32::MAX);
        let (mut right, mut bottom) = (f32::MIN, f32::MIN);
        for path in paths {
            let b = path.bounds();
            left = left.min(b.left());
            top = top.min(b.top());
            right = right.max(b.right());
            bottom = bottom.max(b.bottom());
        }

        let left = (left - margin).floor().max(-margin);
        let top = (top - margin).floor().max(-margin);
        let right = (right + margin).ceil().min(self.width as f32 + margin);
        let bottom = (bottom + margin).ceil().min(self.height as f32 + margin);
        if right <= left || bottom <= top {
            return;
        }

        let (w, h) = ((right - left) as u32, (bottom - top) as u32);
        let Some(mut layer) = Pixmap::new(w, h) else {
            return;
        };

        let mut color = self.state.shadow_color;
        color.set_alpha((color.alpha() * self.state.global_alpha).clamp(0.0, 1.0));
        let mut paint = tiny_skia::Paint {
            anti_alias: true,
            ..Default::default()
        };
        paint.set_color(color);

        let to_layer = Transform::from_translate(-left, -top);
        for path in paths {
            layer.fill_path(path, &paint, FillRule::Winding, to_layer, None);
        }
        blur_rgba8_premul(layer.data_mut(), w, h, sigma);

        self.pixmap.draw_pixmap(
            left as i32,
            top as i32,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            clip_mask,
        );
    }
}
