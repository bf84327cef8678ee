mod common;

use common::{decode_png, initialize, pixel, solid_png};
use rstest::rstest;
use waterlogo_canvas2d::{Canvas2dContext, FontConfig};
use waterlogo_rs::overlay::{render_text, OverlayReport};
use waterlogo_rs::settings::{ImageOverlay, ImageSource, OverlayKind, Spacing, TextOverlay};
use waterlogo_rs::{CancelFlag, Compositor, SourceImage, WaterlogoError, WatermarkSettings};

fn text_settings(text: &str, font_size: f32) -> WatermarkSettings {
    WatermarkSettings {
        overlay: OverlayKind::Text(TextOverlay {
            text: text.to_string(),
            font_size,
            color: "#ff0000".to_string(),
            shadow: None,
            ..Default::default()
        }),
        opacity: 1.0,
        angle: 0.0,
        tile: false,
        position: "center".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_centered_text_changes_only_the_center() {
    initialize();
    let fonts = FontConfig::default().resolve();
    if fonts.face_count() == 0 {
        eprintln!("no system fonts available, skipping");
        return;
    }

    let source = SourceImage::new("square.png", Some("image/png"), solid_png(100, 100, [255, 255, 255, 255]));
    let output = Compositor::new(fonts)
        .composite(&source, &text_settings("X", 40.0))
        .unwrap();
    assert_eq!((output.width, output.height), (100, 100));
    assert_eq!(output.name, "square.png");
    assert_eq!(output.mime(), "image/png");
    assert!(matches!(output.overlay, OverlayReport::Anchored(_)));

    let image = decode_png(&output.bytes);
    let mut changed = 0;
    for y in 0..100 {
        for x in 0..100 {
            if pixel(&image, x, y) != [255, 255, 255, 255] {
                changed += 1;
                assert!(
                    (15..85).contains(&x) && (15..85).contains(&y),
                    "pixel ({x}, {y}) outside the glyph region changed"
                );
            }
        }
    }
    assert!(changed > 0);
}

#[test]
fn test_tiled_text_origin_count() {
    initialize();
    let fonts = FontConfig::default().resolve();
    if fonts.face_count() == 0 {
        eprintln!("no system fonts available, skipping");
        return;
    }
    let mut surface = Canvas2dContext::with_resolved(800, 600, &fonts).unwrap();
    let settings = WatermarkSettings {
        tile: true,
        spacing: Spacing { x: 200.0, y: 200.0 },
        ..text_settings("TILE", 48.0)
    };
    let OverlayKind::Text(text) = &settings.overlay else {
        unreachable!()
    };
    let report = render_text(&mut surface, &settings, text).unwrap();
    assert_eq!(report, OverlayReport::Tiled { count: 6 * 5 });
}

#[test]
fn test_text_watermark_without_fonts_fails_per_file() {
    initialize();
    let no_fonts = FontConfig {
        load_system_fonts: false,
        ..Default::default()
    };
    let compositor = Compositor::new(no_fonts.resolve());
    let sources = vec![
        SourceImage::new("a.png", None, solid_png(100, 100, [255, 255, 255, 255])),
        SourceImage::new("b.png", None, solid_png(50, 50, [255, 255, 255, 255])),
    ];

    let err = compositor
        .composite(&sources[0], &WatermarkSettings::default())
        .unwrap_err();
    assert!(matches!(err, WaterlogoError::InvalidConfiguration(_)));

    let report = compositor
        .composite_batch(&sources, &WatermarkSettings::default(), &CancelFlag::new())
        .unwrap();
    assert!(report.outputs.is_empty());
    let failed: Vec<_> = report.failures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(failed, vec!["a.png", "b.png"]);
}

#[rstest]
#[case("photo.jpg", Some("image/jpeg"), "image/jpeg")]
#[case("photo.webp", None, "image/webp")]
#[case("photo.png", None, "image/png")]
fn test_output_keeps_source_format(
    #[case] name: &str,
    #[case] mime: Option<&str>,
    #[case] expected: &str,
) {
    initialize();
    let source = SourceImage::new(name, mime, solid_png(32, 24, [10, 20, 30, 255]));
    let settings = WatermarkSettings {
        overlay: OverlayKind::Image(ImageOverlay {
            source: Some(ImageSource::file("logo.png", solid_png(8, 8, [255, 0, 0, 255]))),
            ..Default::default()
        }),
        ..Default::default()
    };
    let output = Compositor::new(FontConfig::default().resolve())
        .composite(&source, &settings)
        .unwrap();
    assert_eq!(output.mime(), expected);
    assert_eq!((output.width, output.height), (32, 24));
}

#[test]
fn test_batch_continues_past_undecodable_file() {
    initialize();
    let logo = solid_png(20, 20, [0, 0, 255, 255]);
    let settings = WatermarkSettings {
        overlay: OverlayKind::Image(ImageOverlay {
            source: Some(ImageSource::file("logo.png", logo)),
            scale: 0.5,
            grayscale: true,
        }),
        opacity: 1.0,
        tile: true,
        ..Default::default()
    };
    let sources = vec![
        SourceImage::new("a.png", Some("image/png"), solid_png(300, 200, [255, 255, 255, 255])),
        SourceImage::new("broken.png", Some("image/png"), b"not an image".to_vec()),
        SourceImage::new("b.png", Some("image/png"), solid_png(120, 80, [255, 255, 255, 255])),
    ];

    let report = Compositor::new(FontConfig::default().resolve())
        .composite_batch(&sources, &settings, &CancelFlag::new())
        .unwrap();
    assert!(!report.cancelled);
    let names: Vec<_> = report.outputs.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["a.png", "b.png"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "broken.png");
    assert!(matches!(report.failures[0].error, WaterlogoError::Decode { .. }));

    // Grayscale blue lands on an even gray, away from the white background.
    let first = decode_png(&report.outputs[0].bytes);
    let gray = (0..first.height)
        .flat_map(|y| (0..first.width).map(move |x| (x, y)))
        .map(|(x, y)| pixel(&first, x, y))
        .find(|p| p[0] < 200);
    let gray = gray.expect("overlay was not drawn");
    assert!((gray[0] as i32 - gray[2] as i32).abs() <= 2);
}

#[test]
fn test_batch_requires_overlay_source() {
    initialize();
    let settings = WatermarkSettings {
        overlay: OverlayKind::Image(ImageOverlay::default()),
        ..Default::default()
    };
    let sources = vec![SourceImage::new("a.png", None, solid_png(10, 10, [0, 0, 0, 255]))];
    let err = Compositor::new(FontConfig::default().resolve())
        .composite_batch(&sources, &settings, &CancelFlag::new())
        .unwrap_err();
    assert!(matches!(err, WaterlogoError::InvalidConfiguration(_)));
}

#[test]
fn test_cancelled_batch_stops() {
    initialize();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let sources = vec![SourceImage::new("a.png", None, solid_png(10, 10, [0, 0, 0, 255]))];
    let report = Compositor::new(FontConfig::default().resolve())
        .composite_batch(&sources, &WatermarkSettings::default(), &cancel)
        .unwrap();
    assert!(report.cancelled);
    assert!(report.outputs.is_empty());
}
