//! Per-file watermarking: decode, draw one overlay pass, re-encode.

use crate::archive::ArchiveEntry;
use crate::encode::{decode_image, encode_rgba, RasterFormat};
use crate::error::{WaterlogoError, WaterlogoResult};
use crate::fetch::{AssetFetcher, HttpFetcher};
use crate::overlay::{prepare_image_overlay, render_image, render_text, OverlayReport, PreparedOverlay};
use crate::settings::{ImageSource, OverlayKind, WatermarkSettings, DEFAULT_QUALITY};
use crate::task::CancelFlag;
use std::sync::Arc;
use waterlogo_canvas2d::{Canvas2dContext, FontConfig, ResolvedFontConfig};

/// A file to watermark.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub name: String,
    /// MIME type reported for the file, if any.
    pub mime: Option<String>,
    pub bytes: Arc<Vec<u8>>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, mime: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.map(str::to_string),
            bytes: Arc::new(bytes),
        }
    }
}

/// A watermarked file, keeping the source name.
#[derive(Debug, Clone)]
pub struct CompositeOutput {
    pub name: String,
    pub format: RasterFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
    pub overlay: OverlayReport,
}

impl CompositeOutput {
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    pub fn into_entry(self) -> ArchiveEntry {
        ArchiveEntry {
            path: self.name,
            bytes: self.bytes,
        }
    }
}

#[derive(Debug)]
pub struct BatchFailure {
    pub name: String,
    pub error: WaterlogoError,
}

/// Result of a batch. Per-file failures do not stop the batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outputs: Vec<CompositeOutput>,
    pub failures: Vec<BatchFailure>,
    /// The cancel flag was raised before every file was processed.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn into_entries(self) -> Vec<ArchiveEntry> {
        self.outputs.into_iter().map(CompositeOutput::into_entry).collect()
    }
}

/// Applies watermarks with a font database resolved once.
#[derive(Clone)]
pub struct Compositor {
    fonts: ResolvedFontConfig,
    fetcher: Arc<dyn AssetFetcher>,
}

impl Compositor {
    pub fn new(fonts: ResolvedFontConfig) -> Self {
        Self {
            fonts,
            fetcher: Arc::new(HttpFetcher),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn AssetFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Decode and size the overlay image, if the settings call for one.
    pub fn load_overlay(&self, settings: &WatermarkSettings) -> WaterlogoResult<Option<PreparedOverlay>> {
        let OverlayKind::Image(image) = &settings.overlay else {
            return Ok(None);
        };
        let Some(source) = &image.source else {
            return Ok(None);
        };
        let decoded = match source {
            ImageSource::File { name, bytes } => decode_image(name, bytes)?,
            ImageSource::Url(url) => decode_image(url, &self.fetcher.fetch(url)?)?,
        };
        log::debug!(target: "compositor", "loaded overlay {}", source.label());
        prepare_image_overlay(&decoded, image).map(Some)
    }

    /// Watermark a single file.
    pub fn composite(
        &self,
        source: &SourceImage,
        settings: &WatermarkSettings,
    ) -> WaterlogoResult<CompositeOutput> {
        settings.validate()?;
        let overlay = self.load_overlay(settings)?;
        self.composite_with(source, settings, overlay.as_ref())
    }

    /// Watermark a single file with an overlay loaded by [`Compositor::load_overlay`].
    pub fn composite_with(
        &self,
        source: &SourceImage,
        settings: &WatermarkSettings,
        overlay: Option<&PreparedOverlay>,
    ) -> WaterlogoResult<CompositeOutput> {
        let decoded = decode_image(&source.name, &source.bytes)?;
        let fonts = match settings.overlay {
            OverlayKind::Text(_) => Some(&self.fonts),
            OverlayKind::Image(_) => None,
        };
        let mut surface =
            Canvas2dContext::from_rgba(&decoded.rgba, decoded.width, decoded.height, fonts)?;

        let report = match (&settings.overlay, overlay) {
            (OverlayKind::Text(text), _) => render_text(&mut surface, settings, text)?,
            (OverlayKind::Image(_), Some(overlay)) => render_image(&mut surface, settings, overlay),
            (OverlayKind::Image(_), None) => OverlayReport::Skipped,
        };

        let format = RasterFormat::for_source(&source.name, source.mime.as_deref());
        let (width, height) = (surface.width(), surface.height());
        let rgba = surface.into_rgba();
        let bytes = encode_rgba(&rgba, width, height, format, DEFAULT_QUALITY)?;
        log::info!(target: "compositor", "watermarked {} ({}x{}, {})", source.name, width, height, format.mime());
        Ok(CompositeOutput {
            name: source.name.clone(),
            format,
            width,
            height,
            bytes,
            overlay: report,
        })
    }

    /// Watermark files one after another.
    ///
    /// Configuration is checked and the overlay loaded before the first file;
    /// failures there fail the whole batch. A file that fails to decode is
    /// recorded and skipped. `cancel` is checked before each file.
    pub fn composite_batch(
        &self,
        sources: &[SourceImage],
        settings: &WatermarkSettings,
        cancel: &CancelFlag,
    ) -> WaterlogoResult<BatchReport> {
        settings.validate_for_batch()?;
        let overlay = self.load_overlay(settings)?;

        let mut report = BatchReport::default();
        for source in sources {
            if cancel.is_cancelled() {
                log::info!(target: "compositor", "batch cancelled after {} files", report.outputs.len() + report.failures.len());
                report.cancelled = true;
                break;
            }
            match self.composite_with(source, settings, overlay.as_ref()) {
                Ok(output) => report.outputs.push(output),
                Err(error) => {
                    log::error!(target: "compositor", "{}: {}", source.name, error);
                    report.failures.push(BatchFailure {
                        name: source.name.clone(),
                        error,
                    });
                }
            }
        }
        Ok(report)
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(FontConfig::default().resolve())
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}
