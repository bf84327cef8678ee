//! Style enums for text and image drawing.

/// Horizontal text alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
}

/// Vertical text alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    /// Top of the em square.
    Top,
    /// Middle of the em square.
    Middle,
    #[default]
    Alphabetic,
    /// Bottom of the em square.
    Bottom,
}

/// Image smoothing quality levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSmoothingQuality {
    Low,
    #[default]
    Medium,
    /// Bicubic filtering, used when resampling exports to their target size.
    High,
}

impl From<ImageSmoothingQuality> for tiny_skia::FilterQuality {
    fn from(quality: ImageSmoothingQuality) -> Self {
        match quality {
            ImageSmoothingQuality::Low | ImageSmoothingQuality::Medium => {
                tiny_skia::FilterQuality::Bilinear
            }
            ImageSmoothingQuality::High => tiny_skia::FilterQuality::Bicubic,
        }
    }
}
