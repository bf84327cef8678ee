//! Page geometry and the page rendering seam.

use crate::error::{WaterlogoError, WaterlogoResult};
use tiny_skia::{Pixmap, Transform};
use waterlogo_canvas2d::Canvas2dContext;

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 4.0;

/// Points per inch of page units.
const PAGE_UNITS_PER_INCH: f32 = 72.0;

pub fn clamp_zoom(zoom: f32) -> f32 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Geometry of the page currently on screen.
///
/// Immutable: changing the page, DPI or zoom produces a new context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPageContext {
    pub page_number: u32,
    /// Page width at scale 1, in page units.
    pub native_width: f32,
    pub native_height: f32,
    pub dpi: f32,
    pub zoom: f32,
    pub device_pixel_ratio: f32,
}

impl PdfPageContext {
    pub fn new(page_number: u32, native_size: (f32, f32), dpi: f32, zoom: f32, device_pixel_ratio: f32) -> Self {
        Self {
            page_number,
            native_width: native_size.0,
            native_height: native_size.1,
            dpi,
            zoom: clamp_zoom(zoom),
            device_pixel_ratio: if device_pixel_ratio > 0.0 { device_pixel_ratio } else { 1.0 },
        }
    }

    pub fn for_page(page: &dyn PageRenderer, dpi: f32, zoom: f32, device_pixel_ratio: f32) -> Self {
        Self::new(page.page_number(), page.page_size(), dpi, zoom, device_pixel_ratio)
    }

    pub fn with_zoom(&self, zoom: f32) -> Self {
        Self {
            zoom: clamp_zoom(zoom),
            ..*self
        }
    }

    pub fn with_dpi(&self, dpi: f32) -> Self {
        Self { dpi, ..*self }
    }

    pub fn with_page(&self, page: &dyn PageRenderer) -> Self {
        Self::for_page(page, self.dpi, self.zoom, self.device_pixel_ratio)
    }

    pub fn base_scale(&self) -> f32 {
        self.dpi / PAGE_UNITS_PER_INCH
    }

    /// Page units to displayed pixels.
    pub fn display_scale(&self) -> f32 {
        self.base_scale() * self.zoom
    }

    /// Page units to backing pixels.
    pub fn render_scale(&self) -> f32 {
        self.display_scale() * self.device_pixel_ratio
    }

    pub fn displayed_size(&self) -> (u32, u32) {
        scaled_size(self.native_width, self.native_height, self.display_scale())
    }

    pub fn backing_size(&self) -> (u32, u32) {
        scaled_size(self.native_width, self.native_height, self.render_scale())
    }

    /// Backing pixels per displayed pixel, per axis.
    pub fn displayed_to_backing(&self) -> (f32, f32) {
        let (dw, dh) = self.displayed_size();
        let (bw, bh) = self.backing_size();
        (bw as f32 / dw.max(1) as f32, bh as f32 / dh.max(1) as f32)
    }

    /// Page units per displayed pixel, per axis.
    pub fn displayed_to_native(&self) -> (f32, f32) {
        let (dw, dh) = self.displayed_size();
        (
            self.native_width / dw.max(1) as f32,
            self.native_height / dh.max(1) as f32,
        )
    }
}

fn scaled_size(w: f32, h: f32, scale: f32) -> (u32, u32) {
    ((w * scale).floor() as u32, (h * scale).floor() as u32)
}

/// A rectangle in page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A page that can be rasterized at any scale.
pub trait PageRenderer {
    fn page_number(&self) -> u32;

    /// Page size at scale 1, in page units.
    fn page_size(&self) -> (f32, f32);

    fn viewport(&self, scale: f32) -> (f32, f32) {
        let (w, h) = self.page_size();
        (w * scale, h * scale)
    }

    /// Rasterize the page at `scale`.
    ///
    /// With `area`, only that part is drawn, onto a surface of
    /// `ceil(area * scale)` pixels. Without it the whole page is drawn onto
    /// `floor(page * scale)` pixels.
    fn render(&self, scale: f32, area: Option<PageArea>) -> WaterlogoResult<Canvas2dContext>;

    /// Serialize the page as an SVG document.
    fn to_svg(&self) -> WaterlogoResult<String> {
        Err(WaterlogoError::VectorSerialization(format!(
            "page {} has no vector form",
            self.page_number()
        )))
    }
}

/// A page backed by an SVG document, rendered with resvg.
pub struct SvgPage {
    page_number: u32,
    source: String,
    tree: usvg::Tree,
}

impl SvgPage {
    pub fn from_svg(page_number: u32, svg: &str) -> WaterlogoResult<Self> {
        let tree = usvg::Tree::from_str(svg, &usvg::Options::default())
            .map_err(|e| WaterlogoError::decode(format!("page {page_number}"), e))?;
        Ok(Self {
            page_number,
            source: svg.to_string(),
            tree,
        })
    }

    pub fn from_data(page_number: u32, data: &[u8]) -> WaterlogoResult<Self> {
        let svg = std::str::from_utf8(data)
            .map_err(|e| WaterlogoError::decode(format!("page {page_number}"), e))?;
        Self::from_svg(page_number, svg)
    }
}

impl PageRenderer for SvgPage {
    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self) -> (f32, f32) {
        let size = self.tree.size();
        (size.width(), size.height())
    }

    fn render(&self, scale: f32, area: Option<PageArea>) -> WaterlogoResult<Canvas2dContext> {
        let (page_w, page_h) = self.page_size();
        let area = area.unwrap_or(PageArea {
            x: 0.0,
            y: 0.0,
            width: page_w,
            height: page_h,
        });
        let (width, height) = if area.x == 0.0 && area.y == 0.0 && area.width == page_w && area.height == page_h {
            scaled_size(page_w, page_h, scale)
        } else {
            (
                (area.width * scale).ceil() as u32,
                (area.height * scale).ceil() as u32,
            )
        };
        let render_error = |message: String| WaterlogoError::PageRender {
            page: self.page_number,
            message,
        };
        let mut pixmap = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| render_error(format!("cannot allocate {width}x{height} pixels")))?;

        let transform = Transform::from_scale(scale, scale).pre_translate(-area.x, -area.y);
        resvg::render(&self.tree, transform, &mut pixmap.as_mut());
        log::debug!(target: "region", "rendered page {} at scale {} into {}x{}", self.page_number, scale, width, height);
        Ok(Canvas2dContext::from_pixmap(pixmap)?)
    }

    fn to_svg(&self) -> WaterlogoResult<String> {
        Ok(self.source.clone())
    }
}
