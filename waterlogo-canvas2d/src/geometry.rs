//! Parameter structs for drawing operations.

use crate::error::{Canvas2dError, Canvas2dResult};

/// Parameters for a rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectParams {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A reference to non-premultiplied RGBA image data, as produced by image decoders.
#[derive(Debug, Clone, Copy)]
pub struct CanvasImageDataRef<'a> {
    /// RGBA pixel data, 4 bytes per pixel.
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
}

impl CanvasImageDataRef<'_> {
    /// Check that the buffer holds exactly `width * height` pixels.
    pub fn validate(&self) -> Canvas2dResult<()> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() != expected {
            return Err(Canvas2dError::ImageDataError {
                width: self.width,
                height: self.height,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}
