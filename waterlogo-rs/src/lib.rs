#![allow(clippy::uninlined_format_args)]
#![doc = include_str!("../README.md")]

pub mod archive;
pub mod compositor;
pub mod encode;
pub mod error;
pub mod fetch;
pub mod geometry;
pub mod icon;
pub mod overlay;
pub mod page;
pub mod preset;
pub mod region;
pub mod selection;
pub mod settings;
pub mod task;

#[macro_use]
extern crate lazy_static;

pub use archive::ArchiveEntry;
pub use compositor::{BatchReport, CompositeOutput, Compositor, SourceImage};
pub use encode::{ExportFormat, RasterFormat};
pub use error::{WaterlogoError, WaterlogoResult};
pub use fetch::{AssetFetcher, HttpFetcher};
pub use icon::IconSettings;
pub use page::{PageArea, PageRenderer, PdfPageContext, SvgPage};
pub use preset::load_preset_manifest;
pub use region::{export_region, ExportPath, ExportReport, PageRegion, RasterRegion, RegionSource};
pub use selection::{SelectionRect, SelectionTool};
pub use settings::{ExportSettings, WatermarkSettings};
pub use task::{CancelFlag, PreviewOutcome, PreviewWorker, RequestTracker};
pub use waterlogo_canvas2d;
