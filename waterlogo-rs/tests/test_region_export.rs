mod common;

use common::{decode_png, initialize, page_svg, pixel};
use rstest::rstest;
use waterlogo_canvas2d::Canvas2dContext;
use waterlogo_rs::region::ExportOutput;
use waterlogo_rs::selection::PointerButton;
use waterlogo_rs::{
    export_region, CancelFlag, ExportFormat, ExportPath, ExportSettings, PageArea, PageRegion,
    PageRenderer, PdfPageContext, SelectionTool, SvgPage, WaterlogoResult,
};

fn settings(sizes: &[u32], formats: &[ExportFormat]) -> ExportSettings {
    ExportSettings {
        sizes: sizes.to_vec(),
        formats: formats.to_vec(),
        ..Default::default()
    }
}

/// Rasterizes like the wrapped page but has no vector form.
struct RasterOnlyPage(SvgPage);

impl PageRenderer for RasterOnlyPage {
    fn page_number(&self) -> u32 {
        self.0.page_number()
    }

    fn page_size(&self) -> (f32, f32) {
        self.0.page_size()
    }

    fn render(&self, scale: f32, area: Option<PageArea>) -> WaterlogoResult<Canvas2dContext> {
        self.0.render(scale, area)
    }
}

fn svg_dimensions(output: &ExportOutput) -> (String, String) {
    let svg = std::str::from_utf8(&output.bytes).unwrap();
    let tree = usvg::Tree::from_str(svg, &usvg::Options::default()).unwrap();
    (
        format!("{}", tree.size().width()),
        format!("{}", tree.size().height()),
    )
}

/// 1000x800 page; 40% of each side, then 40% of the page area.
#[rstest]
#[case((100.0, 100.0), (500.0, 420.0), ["png/page-1-256x205.png", "png/page-1-512x410.png"])]
#[case((100.0, 200.0), (900.0, 600.0), ["png/page-1-256x128.png", "png/page-1-512x256.png"])]
fn test_selection_exports_each_size(
    #[case] from: (f32, f32),
    #[case] to: (f32, f32),
    #[case] expected: [&str; 2],
) {
    initialize();
    let page = SvgPage::from_svg(1, &page_svg(1000, 800)).unwrap();
    let context = PdfPageContext::for_page(&page, 72.0, 1.0, 1.0);
    assert_eq!(context.displayed_size(), (1000, 800));

    let mut tool = SelectionTool::new(context, (1000.0, 800.0));
    tool.pointer_down(PointerButton::Primary, from);
    tool.pointer_move(to);
    tool.pointer_up();
    let selection = tool.committed_selection().unwrap();

    let region = PageRegion::from_selection(&page, tool.page(), &selection);
    let (sel_w, sel_h) = (to.0 - from.0, to.1 - from.1);
    assert_eq!(
        region.area(),
        PageArea {
            x: from.0,
            y: from.1,
            width: sel_w,
            height: sel_h
        }
    );

    let report = export_region(
        &region,
        &settings(&[256, 512], &[ExportFormat::Png]),
        &CancelFlag::new(),
    )
    .unwrap();
    assert!(report.failures.is_empty());
    let paths: Vec<_> = report.outputs.iter().map(|o| o.path.as_str()).collect();
    assert_eq!(paths, expected);

    for (output, edge) in report.outputs.iter().zip([256u32, 512]) {
        let image = decode_png(&output.bytes);
        assert_eq!((image.width, image.height), (output.width, output.height));
        assert_eq!(image.width.max(image.height), edge);
        let aspect = image.width as f32 / image.height as f32;
        assert!((aspect - sel_w / sel_h).abs() < 0.01);
        assert_eq!(output.export_path, ExportPath::Raster);
    }
}

#[test]
fn test_vector_failure_falls_back_per_size() {
    initialize();
    let page = RasterOnlyPage(SvgPage::from_svg(3, &page_svg(200, 100)).unwrap());
    let region = PageRegion::new(
        &page,
        PageArea {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 100.0,
        },
    );

    let report = export_region(
        &region,
        &settings(&[64, 128, 300], &[ExportFormat::Svg, ExportFormat::Png]),
        &CancelFlag::new(),
    )
    .unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.outputs.len(), 6);

    let svgs: Vec<_> = report
        .outputs
        .iter()
        .filter(|o| o.format == ExportFormat::Svg)
        .collect();
    assert_eq!(svgs.len(), 3);
    for (output, edge) in svgs.iter().zip([64u32, 128, 300]) {
        assert!(matches!(output.export_path, ExportPath::RasterFallback { .. }));
        assert_eq!((output.width, output.height), (edge, edge / 2));
        assert_eq!(
            output.path,
            format!("svg/page-3-{}x{}.svg", edge, edge / 2)
        );
        assert_eq!(
            svg_dimensions(output),
            (edge.to_string(), (edge / 2).to_string())
        );
        let svg = std::str::from_utf8(&output.bytes).unwrap();
        assert!(svg.contains("data:image/png;base64,"));
    }
}

#[test]
fn test_vector_export_when_available() {
    initialize();
    let page = SvgPage::from_svg(2, &page_svg(400, 400)).unwrap();
    let region = PageRegion::new(
        &page,
        PageArea {
            x: 50.0,
            y: 100.0,
            width: 200.0,
            height: 100.0,
        },
    );
    let report = export_region(
        &region,
        &settings(&[100], &[ExportFormat::Svg]),
        &CancelFlag::new(),
    )
    .unwrap();
    let output = &report.outputs[0];
    assert_eq!(output.export_path, ExportPath::Vector);
    assert_eq!(output.path, "svg/page-2-100x50.svg");
    assert_eq!(svg_dimensions(output), ("100".to_string(), "50".to_string()));
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_background_removal(#[case] remove_background: bool) {
    initialize();
    let page = SvgPage::from_svg(1, &page_svg(100, 100)).unwrap();
    let region = PageRegion::new(
        &page,
        PageArea {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        },
    );
    let export = ExportSettings {
        remove_background,
        ..settings(&[100], &[ExportFormat::Png])
    };
    let report = export_region(&region, &export, &CancelFlag::new()).unwrap();
    let image = decode_png(&report.outputs[0].bytes);

    let corner = pixel(&image, 5, 5);
    let centre = pixel(&image, 50, 50);
    assert!(centre[0] < 5 && centre[3] > 250, "{:?}", centre);
    if remove_background {
        assert_eq!(corner[3], 0);
    } else {
        assert!(corner[0] > 250 && corner[3] > 250, "{:?}", corner);
    }
}

#[test]
fn test_empty_plan_is_rejected_before_rendering() {
    initialize();
    let page = SvgPage::from_svg(1, &page_svg(100, 100)).unwrap();
    let region = PageRegion::new(
        &page,
        PageArea {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        },
    );
    let no_sizes = ExportSettings {
        custom_sizes: "abc, -5".to_string(),
        ..settings(&[], &[ExportFormat::Png])
    };
    assert!(export_region(&region, &no_sizes, &CancelFlag::new()).is_err());
    assert!(export_region(&region, &settings(&[64], &[]), &CancelFlag::new()).is_err());
}
