//! Raster drawing surface for the waterlogo compositor.
//!
//! A small Canvas 2D style API on top of:
//! - `tiny-skia` for rasterization and compositing
//! - `cosmic-text` for text shaping and glyph outlines
//! - `fontdb` for the font database
//!
//! Every surface owns its pixels outright. Handing off the pixels consumes the
//! surface, so a finished render can only leave a drawing stage as bytes.
//!
//! # Example
//!
//! ```rust,ignore
//! use waterlogo_canvas2d::{Canvas2dContext, RectParams};
//!
//! let mut ctx = Canvas2dContext::new(400, 300)?;
//! ctx.set_fill_style("#ff0000")?;
//! ctx.fill_rect(&RectParams { x: 10.0, y: 10.0, width: 100.0, height: 50.0 });
//! let rgba = ctx.into_rgba();
//! ```

mod context;
mod drawing_state;
mod error;
mod font_config;
mod font_parser;
mod geometry;
mod shadow;
mod style;
mod text;

pub use context::Canvas2dContext;
pub use drawing_state::DrawingState;
pub use error::{Canvas2dError, Canvas2dResult};
pub use font_config::{font_config_to_fontdb, CustomFont, FontConfig, ResolvedFontConfig};
pub use font_parser::{parse_font, ParsedFont};
pub use geometry::{CanvasImageDataRef, RectParams};
pub use style::{ImageSmoothingQuality, TextAlign, TextBaseline};
pub use text::TextMetrics;
