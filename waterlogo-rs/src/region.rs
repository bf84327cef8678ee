//! Region crop/resize export.
//!
//! A selected region is exported once per (edge length, format) pair. Each
//! edge length gets one freshly rendered surface of exactly the target size;
//! every format requested for that size is encoded from it before the next
//! size is started. The order is always crop, resize, then the optional
//! background removal.

use crate::archive::ArchiveEntry;
use crate::encode::{embedded_raster_svg, encode_rgba_at_dpi, ExportFormat, RasterFormat};
use crate::error::{WaterlogoError, WaterlogoResult};
use crate::page::{PageArea, PageRenderer, PdfPageContext};
use crate::selection::SelectionRect;
use crate::settings::ExportSettings;
use crate::task::CancelFlag;
use waterlogo_canvas2d::Canvas2dContext;

/// Channel value above which a pixel counts as background white.
pub const WHITE_THRESHOLD: u8 = 240;

/// A rectangle in backing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Map a displayed-space selection onto a surface of `native_w` x `native_h`.
///
/// Coordinates are floored and then clamped so the rectangle always lies
/// inside the surface and is at least one pixel on each side.
pub fn displayed_to_native(
    selection: &SelectionRect,
    displayed_w: f32,
    displayed_h: f32,
    native_w: u32,
    native_h: u32,
) -> PixelRect {
    let scale_x = native_w as f32 / if displayed_w > 0.0 { displayed_w } else { native_w as f32 };
    let scale_y = native_h as f32 / if displayed_h > 0.0 { displayed_h } else { native_h as f32 };

    let x = (selection.left() * scale_x).floor() as i64;
    let y = (selection.top() * scale_y).floor() as i64;
    let w = (selection.width() * scale_x).floor() as i64;
    let h = (selection.height() * scale_y).floor() as i64;

    let (nw, nh) = (native_w.max(1) as i64, native_h.max(1) as i64);
    let x = x.clamp(0, nw - 1);
    let y = y.clamp(0, nh - 1);
    PixelRect {
        x: x as u32,
        y: y as u32,
        width: w.min(nw - x).max(1) as u32,
        height: h.min(nh - y).max(1) as u32,
    }
}

/// Output size for a region whose longer edge is normalized to `edge`.
pub fn target_dimensions(region_w: f32, region_h: f32, edge: u32) -> (u32, u32) {
    let longest = region_w.max(region_h);
    if longest <= 0.0 {
        return (edge.max(1), edge.max(1));
    }
    let scale = edge as f32 / longest;
    let side = |v: f32| ((v * scale).round() as u32).clamp(1, edge.max(1));
    if region_w >= region_h {
        (edge.max(1), side(region_h))
    } else {
        (side(region_w), edge.max(1))
    }
}

/// Unique ascending edge lengths from the selected presets and a comma
/// separated manual list. Entries that do not start with a positive integer
/// are dropped.
pub fn parse_sizes(selected: &[u32], manual: &str) -> Vec<u32> {
    let mut sizes: Vec<u32> = selected
        .iter()
        .copied()
        .chain(manual.split(',').filter_map(parse_leading_int))
        .filter(|&n| n > 0)
        .collect();
    sizes.sort_unstable();
    sizes.dedup();
    sizes
}

/// Integer prefix of a trimmed entry: `" 256px"` is 256, `"1e3"` is 1.
fn parse_leading_int(entry: &str) -> Option<u32> {
    let entry = entry.trim();
    let digits = entry.strip_prefix('+').unwrap_or(entry);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// One (edge length, format) pair of an export batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportJob {
    pub edge: u32,
    pub format: ExportFormat,
}

/// The product of unique positive sizes and unique formats, size-major.
pub fn export_jobs(sizes: &[u32], formats: &[ExportFormat]) -> Vec<ExportJob> {
    let mut sizes: Vec<u32> = sizes.iter().copied().filter(|&s| s > 0).collect();
    sizes.sort_unstable();
    sizes.dedup();

    let mut unique = Vec::new();
    for &format in formats {
        if !unique.contains(&format) {
            unique.push(format);
        }
    }

    sizes
        .into_iter()
        .flat_map(|edge| unique.iter().map(move |&format| ExportJob { edge, format }))
        .collect()
}

/// Make near-white pixels fully transparent in straight-alpha RGBA.
pub fn remove_white_background(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        if px[0] > WHITE_THRESHOLD && px[1] > WHITE_THRESHOLD && px[2] > WHITE_THRESHOLD {
            px[3] = 0;
        }
    }
}

/// How an output was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportPath {
    Raster,
    Vector,
    /// The vector path was attempted and failed.
    RasterFallback { reason: String },
}

/// Something a region can be exported from.
pub trait RegionSource {
    fn page_number(&self) -> u32;

    /// Region size in the source's own units. Only the ratio matters.
    fn region_size(&self) -> (f32, f32);

    /// Pixels of the region at exactly `width` x `height`.
    fn render_region(&self, width: u32, height: u32) -> WaterlogoResult<Canvas2dContext>;

    /// SVG document of the region at `width` x `height`.
    fn region_svg(&self, _width: u32, _height: u32) -> WaterlogoResult<String> {
        Err(WaterlogoError::VectorSerialization(
            "source has no vector form".to_string(),
        ))
    }
}

/// A region cropped out of an already rasterized surface.
#[derive(Debug)]
pub struct RasterRegion {
    page_number: u32,
    cropped: Canvas2dContext,
}

impl RasterRegion {
    pub fn new(page_number: u32, surface: &Canvas2dContext, rect: PixelRect) -> WaterlogoResult<Self> {
        let cropped = surface.crop(rect.x, rect.y, rect.width, rect.height)?;
        log::debug!(target: "region", "cropped {:?} from {}x{}", rect, surface.width(), surface.height());
        Ok(Self {
            page_number,
            cropped,
        })
    }

    /// Crop the region under a displayed selection from the backing surface.
    pub fn from_selection(
        page: &PdfPageContext,
        backing: &Canvas2dContext,
        selection: &SelectionRect,
    ) -> WaterlogoResult<Self> {
        let (dw, dh) = page.displayed_size();
        let rect = displayed_to_native(selection, dw as f32, dh as f32, backing.width(), backing.height());
        Self::new(page.page_number, backing, rect)
    }
}

impl RegionSource for RasterRegion {
    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn region_size(&self) -> (f32, f32) {
        (self.cropped.width() as f32, self.cropped.height() as f32)
    }

    fn render_region(&self, width: u32, height: u32) -> WaterlogoResult<Canvas2dContext> {
        Ok(self.cropped.resample(width, height)?)
    }
}

/// A region of a page that is re-rendered for every target size.
pub struct PageRegion<'a> {
    page: &'a dyn PageRenderer,
    area: PageArea,
}

impl<'a> PageRegion<'a> {
    pub fn new(page: &'a dyn PageRenderer, area: PageArea) -> Self {
        Self { page, area }
    }

    /// The page area under a displayed selection.
    pub fn from_selection(
        page: &'a dyn PageRenderer,
        context: &PdfPageContext,
        selection: &SelectionRect,
    ) -> Self {
        let (dw, dh) = context.displayed_size();
        let rect = displayed_to_native(selection, dw as f32, dh as f32, dw, dh);
        let (fx, fy) = context.displayed_to_native();
        Self::new(
            page,
            PageArea {
                x: rect.x as f32 * fx,
                y: rect.y as f32 * fy,
                width: rect.width as f32 * fx,
                height: rect.height as f32 * fy,
            },
        )
    }

    pub fn area(&self) -> PageArea {
        self.area
    }

    /// Oversampling scale for a target: `max(2 * target_scale, 2)`.
    pub fn render_scale(&self, width: u32, height: u32) -> f32 {
        let target_scale = width.max(height) as f32 / self.area.width.max(self.area.height);
        (target_scale * 2.0).max(2.0)
    }
}

impl RegionSource for PageRegion<'_> {
    fn page_number(&self) -> u32 {
        self.page.page_number()
    }

    fn region_size(&self) -> (f32, f32) {
        (self.area.width, self.area.height)
    }

    fn render_region(&self, width: u32, height: u32) -> WaterlogoResult<Canvas2dContext> {
        if !(self.area.width > 0.0 && self.area.height > 0.0) {
            return Err(WaterlogoError::InvalidConfiguration(format!(
                "empty page area {:?}",
                self.area
            )));
        }
        let scale = self.render_scale(width, height);
        let oversampled = self.page.render(scale, Some(self.area))?;
        log::debug!(
            target: "region",
            "page {} oversampled at {} to {}x{} for {}x{}",
            self.page.page_number(),
            scale,
            oversampled.width(),
            oversampled.height(),
            width,
            height
        );
        Ok(oversampled.resample(width, height)?)
    }

    fn region_svg(&self, width: u32, height: u32) -> WaterlogoResult<String> {
        let page_svg = self.page.to_svg()?;
        let inner = strip_xml_declaration(&page_svg);
        let a = self.area;
        let svg = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="{} {} {} {}" preserveAspectRatio="none">{inner}</svg>"#,
            a.x, a.y, a.width, a.height
        );
        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default())
            .map_err(|e| WaterlogoError::VectorSerialization(e.to_string()))?;
        let size = tree.size();
        if size.width().round() as u32 != width || size.height().round() as u32 != height {
            return Err(WaterlogoError::VectorSerialization(format!(
                "document is {}x{}, expected {}x{}",
                size.width(),
                size.height(),
                width,
                height
            )));
        }
        Ok(svg)
    }
}

fn strip_xml_declaration(svg: &str) -> &str {
    let trimmed = svg.trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            return trimmed[end + 2..].trim_start();
        }
    }
    trimmed
}

/// One encoded export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    /// `<kind>/page-<n>-<w>x<h>.<ext>`
    pub path: String,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
    pub export_path: ExportPath,
}

#[derive(Debug)]
pub struct JobFailure {
    pub job: ExportJob,
    pub error: WaterlogoError,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub outputs: Vec<ExportOutput>,
    pub failures: Vec<JobFailure>,
    pub cancelled: bool,
}

impl ExportReport {
    pub fn into_entries(self) -> Vec<ArchiveEntry> {
        self.outputs
            .into_iter()
            .map(|o| ArchiveEntry {
                path: o.path,
                bytes: o.bytes,
            })
            .collect()
    }
}

pub fn output_path(format: ExportFormat, page_number: u32, width: u32, height: u32) -> String {
    format!(
        "{}/page-{}-{}x{}.{}",
        format.dir(),
        page_number,
        width,
        height,
        format.extension()
    )
}

/// Validate the export settings and expand them into jobs.
pub fn plan_export(settings: &ExportSettings) -> WaterlogoResult<Vec<ExportJob>> {
    let sizes = settings.edge_lengths();
    if sizes.is_empty() {
        return Err(WaterlogoError::InvalidConfiguration(
            "enter or choose export sizes, such as 256,512,1024".to_string(),
        ));
    }
    if settings.formats.is_empty() {
        return Err(WaterlogoError::InvalidConfiguration(
            "choose at least one export format (PNG/WEBP/JPG/SVG)".to_string(),
        ));
    }
    if !settings.dpi.is_finite() || settings.dpi <= 0.0 {
        return Err(WaterlogoError::InvalidConfiguration(format!(
            "export dpi must be positive, got {}",
            settings.dpi
        )));
    }
    Ok(export_jobs(&sizes, &settings.formats))
}

/// Export a region at every requested size and format.
///
/// Settings are validated before anything is rendered. Jobs run one after
/// another; a failed job is recorded and the rest continue. `cancel` is
/// checked before each size.
pub fn export_region(
    source: &dyn RegionSource,
    settings: &ExportSettings,
    cancel: &CancelFlag,
) -> WaterlogoResult<ExportReport> {
    let jobs = plan_export(settings)?;
    let (region_w, region_h) = source.region_size();
    let page_number = source.page_number();
    let mut report = ExportReport::default();

    let mut index = 0;
    while index < jobs.len() {
        let edge = jobs[index].edge;
        let size_jobs: Vec<ExportJob> = jobs[index..]
            .iter()
            .take_while(|job| job.edge == edge)
            .copied()
            .collect();
        index += size_jobs.len();

        if cancel.is_cancelled() {
            log::info!(target: "region", "export cancelled before size {}", edge);
            report.cancelled = true;
            break;
        }

        let (width, height) = target_dimensions(region_w, region_h, edge);
        let rgba = match source.render_region(width, height) {
            Ok(surface) => {
                let mut rgba = surface.into_rgba();
                if settings.remove_background {
                    remove_white_background(&mut rgba);
                }
                rgba
            }
            Err(error) => {
                log::error!(target: "region", "rendering {}x{} failed: {}", width, height, error);
                let message = error.to_string();
                report.failures.extend(size_jobs.iter().map(|&job| JobFailure {
                    job,
                    error: WaterlogoError::PageRender {
                        page: page_number,
                        message: message.clone(),
                    },
                }));
                continue;
            }
        };

        for job in size_jobs {
            match encode_job(source, settings, job.format, &rgba, width, height) {
                Ok((bytes, export_path)) => report.outputs.push(ExportOutput {
                    path: output_path(job.format, page_number, width, height),
                    format: job.format,
                    width,
                    height,
                    bytes,
                    export_path,
                }),
                Err(error) => {
                    log::error!(target: "region", "{:?} at {}x{} failed: {}", job.format, width, height, error);
                    report.failures.push(JobFailure { job, error });
                }
            }
        }
    }

    log::info!(
        target: "region",
        "exported {} files from page {} ({} failed)",
        report.outputs.len(),
        page_number,
        report.failures.len()
    );
    Ok(report)
}

fn encode_job(
    source: &dyn RegionSource,
    settings: &ExportSettings,
    format: ExportFormat,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> WaterlogoResult<(Vec<u8>, ExportPath)> {
    let dpi = Some(settings.dpi);
    if let Some(raster) = format.raster() {
        let bytes = encode_rgba_at_dpi(rgba, width, height, raster, settings.quality, dpi)?;
        return Ok((bytes, ExportPath::Raster));
    }

    // A vector document cannot carry the removed background.
    if settings.remove_background {
        let png = encode_rgba_at_dpi(rgba, width, height, RasterFormat::Png, 1.0, dpi)?;
        return Ok((embedded_raster_svg(&png, width, height).into_bytes(), ExportPath::Raster));
    }

    match source.region_svg(width, height) {
        Ok(svg) => Ok((svg.into_bytes(), ExportPath::Vector)),
        Err(error) => {
            log::warn!(target: "region", "vector export of {}x{} failed, embedding raster: {}", width, height, error);
            let png = encode_rgba_at_dpi(rgba, width, height, RasterFormat::Png, 1.0, dpi)?;
            Ok((
                embedded_raster_svg(&png, width, height).into_bytes(),
                ExportPath::RasterFallback {
                    reason: error.to_string(),
                },
            ))
        }
    }
}
