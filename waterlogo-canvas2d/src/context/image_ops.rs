//! Image drawing, pixel access and resampling for Canvas2dContext.

use super::Canvas2dContext;
use crate::error::{Canvas2dError, Canvas2dResult};
use crate::geometry::CanvasImageDataRef;
use tiny_skia::{Pixmap, PixmapPaint, PixmapRef, Transform};

impl Canvas2dContext {
    // --- Internal image drawing ---

    fn image_paint(&self) -> PixmapPaint {
        PixmapPaint {
            opacity: self.state.global_alpha,
            blend_mode: tiny_skia::BlendMode::SourceOver,
            quality: self.get_image_filter_quality(),
        }
    }

    /// Draw a premultiplied pixmap scaled into the destination rectangle.
    fn draw_pixmap_scaled(&mut self, pixmap: PixmapRef, dx: f32, dy: f32, dw: f32, dh: f32) {
        log::debug!(target: "canvas", "drawImage {}x{} -> {} {} {} {}", pixmap.width(), pixmap.height(), dx, dy, dw, dh);
        if dw <= 0.0 || dh <= 0.0 {
            return;
        }
        let paint = self.image_paint();
        let transform = self
            .state
            .transform
            .pre_translate(dx, dy)
            .pre_scale(dw / pixmap.width() as f32, dh / pixmap.height() as f32);

        let clip_mask = self.create_clip_mask();
        self.pixmap
            .draw_pixmap(0, 0, pixmap, &paint, transform, clip_mask.as_ref());
    }

    // --- Public draw methods ---

    /// Draw another surface scaled to the destination rectangle.
    pub fn draw_canvas_scaled(
        &mut self,
        source: &Canvas2dContext,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) {
        self.draw_pixmap_scaled(source.pixmap.as_ref(), dx, dy, dw, dh);
    }

    /// Draw non-premultiplied RGBA pixels scaled to the destination rectangle.
    pub fn draw_image_data_scaled(
        &mut self,
        image: &CanvasImageDataRef<'_>,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) -> Canvas2dResult<()> {
        let pixmap = premultiplied_pixmap(image)?;
        self.draw_pixmap_scaled(pixmap.as_ref(), dx, dy, dw, dh);
        Ok(())
    }

    // --- New surfaces ---

    /// Copy a pixel region into a new surface without fonts.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Canvas2dResult<Canvas2dContext> {
        let fits = x.checked_add(width).is_some_and(|r| r <= self.width)
            && y.checked_add(height).is_some_and(|b| b <= self.height);
        if !fits {
            return Err(Canvas2dError::InvalidDimensions { width, height });
        }
        let rect = tiny_skia::IntRect::from_xywh(x as i32, y as i32, width, height)
            .ok_or(Canvas2dError::InvalidDimensions { width, height })?;
        let pixmap = self
            .pixmap
            .clone_rect(rect)
            .ok_or(Canvas2dError::InvalidDimensions { width, height })?;
        let mut out = Canvas2dContext::without_fonts(pixmap.width(), pixmap.height())?;
        out.pixmap = pixmap;
        Ok(out)
    }

    /// Resample the whole surface to exactly `width` x `height` pixels.
    ///
    /// Large reductions are done in successive halvings before the final
    /// bicubic pass so that detail averages out instead of aliasing.
    pub fn resample(&self, width: u32, height: u32) -> Canvas2dResult<Canvas2dContext> {
        let mut current: Option<Pixmap> = None;
        loop {
            let src = current.as_ref().map_or(self.pixmap.as_ref(), |p| p.as_ref());
            let (half_w, half_h) = (src.width() / 2, src.height() / 2);
            if half_w < width || half_h < height {
                break;
            }
            let halved = scale_pixmap(src, half_w, half_h, tiny_skia::FilterQuality::Bilinear)?;
            current = Some(halved);
        }

        let src = current.as_ref().map_or(self.pixmap.as_ref(), |p| p.as_ref());
        let pixmap = scale_pixmap(src, width, height, tiny_skia::FilterQuality::Bicubic)?;
        let mut out = Canvas2dContext::without_fonts(width, height)?;
        out.pixmap = pixmap;
        Ok(out)
    }

    // --- Pixel operations ---

    /// Convert every pixel to luma `0.299 R + 0.587 G + 0.114 B`.
    ///
    /// Alpha is untouched and the conversion is idempotent.
    pub fn grayscale(&mut self) {
        log::debug!(target: "canvas", "grayscale {}x{}", self.width, self.height);
        for px in self.pixmap.data_mut().chunks_exact_mut(4) {
            let luma = (299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32 + 500) / 1000;
            let luma = luma.min(px[3] as u32) as u8;
            px[0] = luma;
            px[1] = luma;
            px[2] = luma;
        }
    }

    /// Read a region as non-premultiplied RGBA. Pixels outside the surface read as zero.
    pub fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0u8; width as usize * height as usize * 4];
        let src = self.pixmap.data();

        for dy in 0..height {
            let src_y = y + dy as i32;
            if src_y < 0 || src_y >= self.height as i32 {
                continue;
            }
            for dx in 0..width {
                let src_x = x + dx as i32;
                if src_x < 0 || src_x >= self.width as i32 {
                    continue;
                }
                let src_idx = (src_y as usize * self.width as usize + src_x as usize) * 4;
                let dst_idx = (dy as usize * width as usize + dx as usize) * 4;
                let px = &src[src_idx..src_idx + 4];
                data[dst_idx..dst_idx + 4].copy_from_slice(&unpremultiply(px));
            }
        }

        data
    }

    /// Write non-premultiplied RGBA pixels, bypassing compositing.
    ///
    /// Pixels falling outside the surface are ignored.
    pub fn put_image_data(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        dx: i32,
        dy: i32,
    ) -> Canvas2dResult<()> {
        CanvasImageDataRef {
            data,
            width,
            height,
        }
        .validate()?;

        let canvas_width = self.width as i32;
        let canvas_height = self.height as i32;
        let pixmap_data = self.pixmap.data_mut();

        for sy in 0..height as i32 {
            let dst_row = dy + sy;
            if dst_row < 0 || dst_row >= canvas_height {
                continue;
            }
            for sx in 0..width as i32 {
                let dst_col = dx + sx;
                if dst_col < 0 || dst_col >= canvas_width {
                    continue;
                }
                let src_idx = ((sy as u32 * width + sx as u32) * 4) as usize;
                let dst_idx = ((dst_row * canvas_width + dst_col) * 4) as usize;
                pixmap_data[dst_idx..dst_idx + 4]
                    .copy_from_slice(&premultiply(&data[src_idx..src_idx + 4]));
            }
        }
        Ok(())
    }

    // --- Hand-off ---

    /// Consume the surface and return its non-premultiplied RGBA pixels.
    pub fn into_rgba(self) -> Vec<u8> {
        self.get_image_data(0, 0, self.width, self.height)
    }
}

fn scale_pixmap(
    src: PixmapRef,
    width: u32,
    height: u32,
    quality: tiny_skia::FilterQuality,
) -> Canvas2dResult<Pixmap> {
    let mut out = Pixmap::new(width, height).ok_or(Canvas2dError::InvalidDimensions { width, height })?;
    let paint = PixmapPaint {
        quality,
        ..PixmapPaint::default()
    };
    let transform = Transform::from_scale(
        width as f32 / src.width() as f32,
        height as f32 / src.height() as f32,
    );
    out.draw_pixmap(0, 0, src, &paint, transform, None);
    Ok(out)
}

fn premultiplied_pixmap(image: &CanvasImageDataRef<'_>) -> Canvas2dResult<Pixmap> {
    image.validate()?;
    let mut pixmap = Pixmap::new(image.width, image.height).ok_or(
        Canvas2dError::InvalidDimensions {
            width: image.width,
            height: image.height,
        },
    )?;
    for (dst, src) in pixmap
        .data_mut()
        .chunks_exact_mut(4)
        .zip(image.data.chunks_exact(4))
    {
        dst.copy_from_slice(&premultiply(src));
    }
    Ok(pixmap)
}

/// Straight to premultiplied alpha with `(c * a + 127) / 255` rounding.
fn premultiply(px: &[u8]) -> [u8; 4] {
    let a = px[3];
    match a {
        255 => [px[0], px[1], px[2], 255],
        0 => [0, 0, 0, 0],
        _ => {
            let a16 = a as u16;
            [
                ((px[0] as u16 * a16 + 127) / 255) as u8,
                ((px[1] as u16 * a16 + 127) / 255) as u8,
                ((px[2] as u16 * a16 + 127) / 255) as u8,
                a,
            ]
        }
    }
}

fn unpremultiply(px: &[u8]) -> [u8; 4] {
    let a = px[3];
    match a {
        255 => [px[0], px[1], px[2], 255],
        0 => [0, 0, 0, 0],
        _ => {
            let a32 = a as u32;
            let channel = |c: u8| ((c as u32 * 255 + a32 / 2) / a32).min(255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2]), a]
        }
    }
}
