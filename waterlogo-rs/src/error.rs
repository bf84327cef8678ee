//! Error types for waterlogo-rs.

use thiserror::Error;
use waterlogo_canvas2d::Canvas2dError;

/// Result type alias using WaterlogoError.
pub type WaterlogoResult<T> = Result<T, WaterlogoError>;

/// Failures surfaced to the caller as a single human-readable message.
#[derive(Debug, Error)]
pub enum WaterlogoError {
    /// A source image, overlay image or page could not be decoded.
    #[error("Failed to decode {name}: {message}")]
    Decode { name: String, message: String },

    /// Settings that make the requested operation impossible. Reported before
    /// any work starts.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to encode {format}: {message}")]
    Encode { format: String, message: String },

    #[error(transparent)]
    Canvas(#[from] Canvas2dError),

    /// The vector path of an SVG export failed. Recovered by the region
    /// pipeline, which falls back to an embedded raster.
    #[error("Vector serialization failed: {0}")]
    VectorSerialization(String),

    #[error("Failed to render page {page}: {message}")]
    PageRender { page: u32, message: String },

    #[error("Failed to fetch {location}: {message}")]
    Fetch { location: String, message: String },

    #[error("Worker failure: {0}")]
    Worker(String),
}

impl WaterlogoError {
    pub(crate) fn decode(name: impl Into<String>, message: impl ToString) -> Self {
        WaterlogoError::Decode {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn encode(format: impl Into<String>, message: impl ToString) -> Self {
        WaterlogoError::Encode {
            format: format.into(),
            message: message.to_string(),
        }
    }
}
