#![allow(dead_code)]

use std::sync::Once;
use waterlogo_rs::encode::{decode_image, encode_rgba, DecodedImage, RasterFormat};

static INIT: Once = Once::new();

pub fn initialize() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let pixels = rgba.repeat((width * height) as usize);
    encode_rgba(&pixels, width, height, RasterFormat::Png, 1.0).expect("Failed to encode test image")
}

pub fn decode_png(bytes: &[u8]) -> DecodedImage {
    decode_image("output.png", bytes).expect("Failed to decode output")
}

pub fn pixel(image: &DecodedImage, x: u32, y: u32) -> [u8; 4] {
    let idx = ((y * image.width + x) * 4) as usize;
    [
        image.rgba[idx],
        image.rgba[idx + 1],
        image.rgba[idx + 2],
        image.rgba[idx + 3],
    ]
}

/// A page with a white background and a black block in the middle.
pub fn page_svg(width: u32, height: u32) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="#ffffff"/><rect x="{bx}" y="{by}" width="{bw}" height="{bh}" fill="#000000"/></svg>"##,
        w = width,
        h = height,
        bx = width / 4,
        by = height / 4,
        bw = width / 2,
        bh = height / 2,
    )
}
