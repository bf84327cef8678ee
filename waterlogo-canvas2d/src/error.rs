//! Error types for waterlogo-canvas2d.

use thiserror::Error;

/// Result type alias using Canvas2dError.
pub type Canvas2dResult<T> = Result<T, Canvas2dError>;

/// Errors that can occur while drawing on a surface.
#[derive(Debug, Error)]
pub enum Canvas2dError {
    /// Surface dimensions are zero or above the supported maximum.
    #[error("Invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to parse font string: {0}")]
    FontParseError(String),

    #[error("Failed to parse color: {0}")]
    ColorParseError(String),

    /// Pixel buffer length does not match the declared dimensions.
    #[error("Image data is {actual} bytes, expected {expected} for {width}x{height}")]
    ImageDataError {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}
