//! Decoding of source images and encoding of finished pixels.

use crate::error::{WaterlogoError, WaterlogoResult};
use base64::Engine as _;
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raster encodings the compositor can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Webp,
}

impl RasterFormat {
    pub fn from_mime(mime: &str) -> Option<RasterFormat> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(RasterFormat::Png),
            "image/jpeg" | "image/jpg" => Some(RasterFormat::Jpeg),
            "image/webp" => Some(RasterFormat::Webp),
            _ => None,
        }
    }

    /// Output format for a source: its MIME type when it is a supported
    /// `image/*` type, else the type implied by the file name, else PNG.
    pub fn for_source(name: &str, mime: Option<&str>) -> RasterFormat {
        if let Some(mime) = mime.filter(|m| m.starts_with("image/")) {
            return RasterFormat::from_mime(mime).unwrap_or(RasterFormat::Png);
        }
        match ImageFormat::from_path(Path::new(name)) {
            Ok(ImageFormat::Jpeg) => RasterFormat::Jpeg,
            Ok(ImageFormat::WebP) => RasterFormat::Webp,
            _ => RasterFormat::Png,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Webp => "image/webp",
        }
    }
}

/// Formats offered by the region export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Webp,
    Jpg,
    Svg,
}

impl ExportFormat {
    /// Archive directory, which is also the file extension.
    pub fn dir(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Webp => "webp",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.dir()
    }

    /// Raster encoding, `None` for the SVG container.
    pub fn raster(&self) -> Option<RasterFormat> {
        match self {
            ExportFormat::Png => Some(RasterFormat::Png),
            ExportFormat::Webp => Some(RasterFormat::Webp),
            ExportFormat::Jpg => Some(RasterFormat::Jpeg),
            ExportFormat::Svg => None,
        }
    }
}

/// Straight-alpha RGBA pixels of a decoded image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decode any supported image format at its natural size.
pub fn decode_image(name: &str, bytes: &[u8]) -> WaterlogoResult<DecodedImage> {
    let img = image::load_from_memory(bytes).map_err(|e| WaterlogoError::decode(name, e))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(WaterlogoError::decode(name, "image has no pixels"));
    }
    log::debug!(target: "compositor", "decoded {} at {}x{}", name, width, height);
    Ok(DecodedImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

/// Encode straight-alpha RGBA pixels.
///
/// `quality` in [0, 1] applies to JPEG only. JPEG has no alpha channel, so
/// pixels are composited onto white first. WebP output is lossless.
pub fn encode_rgba(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: RasterFormat,
    quality: f32,
) -> WaterlogoResult<Vec<u8>> {
    encode_rgba_at_dpi(rgba, width, height, format, quality, None)
}

/// Like [`encode_rgba`], recording `dpi` as the pixel density when given.
///
/// PNG gets a pHYs chunk and JPEG a JFIF density; WebP has no field for it.
pub fn encode_rgba_at_dpi(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: RasterFormat,
    quality: f32,
    dpi: Option<f32>,
) -> WaterlogoResult<Vec<u8>> {
    let mut buf = Vec::new();
    let result = match format {
        RasterFormat::Png => match dpi {
            Some(dpi) => {
                return write_png_with_density(&mut buf, rgba, width, height, dpi)
                    .map(|()| buf)
                    .map_err(|e| WaterlogoError::encode(format.mime(), e));
            }
            None => PngEncoder::new(&mut buf).write_image(
                rgba,
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
        },
        RasterFormat::Jpeg => {
            let rgb = flatten_onto_white(rgba);
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
            if let Some(dpi) = dpi {
                encoder.set_pixel_density(PixelDensity::dpi(dpi.round().clamp(1.0, u16::MAX as f32) as u16));
            }
            encoder.write_image(&rgb, width, height, ExtendedColorType::Rgb8)
        }
        RasterFormat::Webp => WebPEncoder::new_lossless(&mut buf).write_image(
            rgba,
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    };
    result.map_err(|e| WaterlogoError::encode(format.mime(), e))?;
    Ok(buf)
}

/// Pixels per metre for a density in dots per inch.
fn pixels_per_metre(dpi: f32) -> u32 {
    (dpi as f64 / 0.0254).round().clamp(1.0, u32::MAX as f64) as u32
}

fn write_png_with_density(
    buf: &mut Vec<u8>,
    rgba: &[u8],
    width: u32,
    height: u32,
    dpi: f32,
) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(buf, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let ppm = pixels_per_metre(dpi);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgba)?;
    writer.finish()
}

fn jpeg_quality(quality: f32) -> u8 {
    let q = if quality.is_finite() { quality } else { 0.92 };
    (q.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Composite straight-alpha RGBA onto an opaque white background.
pub(crate) fn flatten_onto_white(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u32;
        for &c in &px[..3] {
            rgb.push(((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8);
        }
    }
    rgb
}

/// SVG document holding one PNG image of exactly `width` x `height`.
pub fn embedded_raster_svg(png: &[u8], width: u32, height: u32) -> String {
    let data = base64::engine::general_purpose::STANDARD.encode(png);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><image href="data:image/png;base64,{data}" x="0" y="0" width="{w}" height="{h}"/></svg>"#,
        w = width,
        h = height,
        data = data,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn checker(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| {
                if i % 2 == 0 {
                    [255, 0, 0, 255]
                } else {
                    [0, 0, 255, 128]
                }
            })
            .collect()
    }

    #[rstest]
    #[case("a.png", Some("image/png"), RasterFormat::Png)]
    #[case("a.jpg", Some("image/jpeg"), RasterFormat::Jpeg)]
    #[case("a.webp", Some("image/webp"), RasterFormat::Webp)]
    #[case("a.gif", Some("image/gif"), RasterFormat::Png)]
    #[case("a.png", Some("application/octet-stream"), RasterFormat::Png)]
    #[case("photo.JPEG", None, RasterFormat::Jpeg)]
    #[case("noext", None, RasterFormat::Png)]
    fn test_format_for_source(
        #[case] name: &str,
        #[case] mime: Option<&str>,
        #[case] expected: RasterFormat,
    ) {
        assert_eq!(RasterFormat::for_source(name, mime), expected);
    }

    #[rstest]
    #[case(RasterFormat::Png, ImageFormat::Png)]
    #[case(RasterFormat::Jpeg, ImageFormat::Jpeg)]
    #[case(RasterFormat::Webp, ImageFormat::WebP)]
    fn test_encode_produces_format(#[case] format: RasterFormat, #[case] expected: ImageFormat) {
        let bytes = encode_rgba(&checker(6, 4), 6, 4, format, 0.92).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), expected);
        let decoded = decode_image("out", &bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (6, 4));
    }

    #[test]
    fn test_png_and_webp_are_lossless() {
        let pixels = checker(5, 3);
        for format in [RasterFormat::Png, RasterFormat::Webp] {
            let bytes = encode_rgba(&pixels, 5, 3, format, 0.1).unwrap();
            assert_eq!(decode_image("out", &bytes).unwrap().rgba, pixels);
        }
    }

    #[test]
    fn test_jpeg_flattens_onto_white() {
        let transparent = vec![0u8; 8 * 8 * 4];
        let bytes = encode_rgba(&transparent, 8, 8, RasterFormat::Jpeg, 1.0).unwrap();
        let decoded = decode_image("out", &bytes).unwrap();
        assert!(decoded.rgba.chunks_exact(4).all(|px| px[0] > 250 && px[3] == 255));

        assert_eq!(flatten_onto_white(&[0, 0, 0, 255, 0, 0, 0, 0]), vec![0, 0, 0, 255, 255, 255]);
        assert_eq!(jpeg_quality(0.92), 92);
        assert_eq!(jpeg_quality(0.0), 1);
    }

    #[test]
    fn test_png_records_density() {
        let bytes =
            encode_rgba_at_dpi(&checker(4, 4), 4, 4, RasterFormat::Png, 1.0, Some(300.0)).unwrap();
        let reader = png::Decoder::new(std::io::Cursor::new(&bytes)).read_info().unwrap();
        let dims = reader.info().pixel_dims.unwrap();
        assert_eq!((dims.xppu, dims.yppu), (11811, 11811));
        assert_eq!(dims.unit, png::Unit::Meter);
        assert_eq!(decode_image("out", &bytes).unwrap().rgba, checker(4, 4));

        let plain = encode_rgba(&checker(4, 4), 4, 4, RasterFormat::Png, 1.0).unwrap();
        let reader = png::Decoder::new(std::io::Cursor::new(&plain)).read_info().unwrap();
        assert!(reader.info().pixel_dims.is_none());
    }

    #[test]
    fn test_jpeg_and_webp_accept_density() {
        for format in [RasterFormat::Jpeg, RasterFormat::Webp] {
            let bytes = encode_rgba_at_dpi(&checker(4, 4), 4, 4, format, 0.9, Some(144.0)).unwrap();
            let decoded = decode_image("out", &bytes).unwrap();
            assert_eq!((decoded.width, decoded.height), (4, 4));
        }
        assert_eq!(pixels_per_metre(72.0), 2835);
    }

    #[test]
    fn test_decode_failure() {
        let err = decode_image("broken.png", b"not an image").unwrap_err();
        assert!(matches!(err, WaterlogoError::Decode { ref name, .. } if name == "broken.png"));
    }

    #[test]
    fn test_embedded_svg_dimensions() {
        let png = encode_rgba(&checker(3, 2), 3, 2, RasterFormat::Png, 1.0).unwrap();
        let svg = embedded_raster_svg(&png, 3, 2);
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><svg"#));
        assert!(svg.contains(r#"width="3" height="2" viewBox="0 0 3 2""#));
        assert!(svg.contains("data:image/png;base64,"));
        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default()).unwrap();
        assert_eq!(tree.size().width(), 3.0);
        assert_eq!(tree.size().height(), 2.0);
    }

    #[test]
    fn test_export_format_serde() {
        let formats: Vec<ExportFormat> = serde_json::from_str(r#"["png","webp","jpg","svg"]"#).unwrap();
        assert_eq!(
            formats.iter().map(|f| f.dir()).collect::<Vec<_>>(),
            vec!["png", "webp", "jpg", "svg"]
        );
        assert_eq!(ExportFormat::Svg.raster(), None);
        assert_eq!(ExportFormat::Jpg.raster(), Some(RasterFormat::Jpeg));
    }
}
