use std::path::PathBuf;

use genpdf::elements::Paragraph;
use genpdf::style::Style;
use image::{DynamicImage, ImageBuffer, Rgba};
use recmap_report::builder::DocumentBuilder;
use recmap_report::chart::PieChart;
use recmap_report::elements::{pt, Band, BandText};
use recmap_report::fonts;
use recmap_report::model::{ReportInput, StatusCount, StatusTable};
use recmap_report::theme::{StatusPalette, PRIMARY};
use recmap_report::{ReportCompositor, ReportOptions};

/// Returns `false` when rendering tests should be skipped.
///
/// Skipping is only allowed when no font directory was configured; with
/// `RECMAP_FONTS_DIR` set, a missing font family fails the test run.
fn fonts_ready() -> bool {
    if fonts::fonts_available() {
        return true;
    }
    assert!(
        std::env::var_os(fonts::FONTS_DIR_ENV).is_none(),
        "{} is set but no font family could be loaded from it",
        fonts::FONTS_DIR_ENV
    );
    eprintln!(
        "Skipping render: no font family found. Set {} or install Liberation/DejaVu fonts.",
        fonts::FONTS_DIR_ENV
    );
    false
}

fn compositor(options: ReportOptions) -> ReportCompositor {
    ReportCompositor::new(options.with_logo_path(None::<PathBuf>))
}

fn render(input: &ReportInput, options: ReportOptions) -> Option<Vec<u8>> {
    if !fonts_ready() {
        return None;
    }

    let bytes = compositor(options)
        .generate(input)
        .expect("render report pdf");
    Some(bytes)
}

fn page_count(bytes: &[u8]) -> usize {
    let document = lopdf::Document::load_mem(bytes).expect("output parses as PDF");
    document.get_pages().len()
}

#[test]
fn sample_renders_well_formed_pdf() {
    let Some(bytes) = render(&ReportInput::sample(), ReportOptions::default()) else {
        return;
    };
    assert!(bytes.starts_with(b"%PDF"), "missing PDF signature");
    assert_eq!(page_count(&bytes), 1);
}

#[test]
fn zero_total_renders() {
    let input = ReportInput::new(0)
        .with_status("VALIDADA", 0)
        .with_status("PENDENTE", 0);
    let Some(bytes) = render(&input, ReportOptions::default()) else {
        return;
    };
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn empty_status_list_renders_empty_chart() {
    let input = ReportInput::new(12);
    let Some(bytes) = render(&input, ReportOptions::default()) else {
        return;
    };
    assert!(page_count(&bytes) >= 1);
}

#[test]
fn long_status_list_paginates() {
    let statuses = (0..80).map(|index| StatusCount::new(format!("STATUS_{index}"), index));
    let input = ReportInput::new(3160).with_statuses(statuses);
    let Some(bytes) = render(&input, ReportOptions::default()) else {
        return;
    };
    assert!(page_count(&bytes) > 1, "expected the table to overflow");
}

#[test]
fn footer_band_fills_reserved_space() {
    if !fonts_ready() {
        return;
    }

    let footer = Band::new(PRIMARY, pt(30.0))
        .with_line(BandText::new("Footer", Style::new(), pt(20.0)).left(pt(50.0)));
    let mut document = DocumentBuilder::new()
        .with_margins(genpdf::Margins::trbl(pt(80.0), pt(50.0), pt(40.0), pt(50.0)))
        .with_footer(pt(30.0), move |_| footer.clone())
        .build()
        .expect("build document");
    document.push(Paragraph::new("Body"));

    let mut bytes = Vec::new();
    document.render(&mut bytes).expect("footer fits its band");
    assert_eq!(page_count(&bytes), 1);
}

#[test]
fn legend_longer_than_chart_box_renders() {
    let statuses = (0..12).map(|index| StatusCount::new(format!("STATUS_{index}"), index + 1));
    let input = ReportInput::new(78).with_statuses(statuses);
    let Some(bytes) = render(&input, ReportOptions::default()) else {
        return;
    };
    assert!(page_count(&bytes) >= 1);
}

#[test]
fn legend_continues_across_pages() {
    let statuses = (0..200).map(|index| StatusCount::new(format!("S{index}"), 1));
    let input = ReportInput::new(200).with_statuses(statuses);
    let Some(bytes) = render(&input, ReportOptions::default()) else {
        return;
    };
    assert!(page_count(&bytes) > 2);
}

#[test]
fn long_status_label_renders() {
    let label = "AGUARDANDO VISTORIA TECNICA DA SECRETARIA MUNICIPAL DE MEIO AMBIENTE";
    let input = ReportInput::new(10)
        .with_status(label, 7)
        .with_status("VALIDADA", 3);
    let Some(bytes) = render(&input, ReportOptions::default()) else {
        return;
    };
    assert_eq!(page_count(&bytes), 1);
}

#[test]
fn kpi_cards_can_be_restored() {
    let Some(bytes) = render(
        &ReportInput::sample(),
        ReportOptions::default().with_kpi_cards(true),
    ) else {
        return;
    };
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn logo_with_alpha_channel_is_embedded() {
    if !fonts_ready() {
        return;
    }

    let logo_path = std::env::temp_dir().join(format!("recmap_logo_{}.png", std::process::id()));
    let logo = ImageBuffer::from_fn(32, 32, |x, y| Rgba([20, 61, 96, ((x + y) * 4) as u8]));
    DynamicImage::ImageRgba8(logo)
        .save(&logo_path)
        .expect("write logo");

    let result = ReportCompositor::new(ReportOptions::default().with_logo_path(Some(&logo_path)))
        .generate(&ReportInput::sample());
    let _ = std::fs::remove_file(&logo_path);

    let bytes = result.expect("render with logo");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn identical_input_yields_identical_content() {
    let input = ReportInput::sample();
    assert_eq!(
        StatusTable::from_input(&input),
        StatusTable::from_input(&input.clone())
    );

    let palette = StatusPalette::default();
    let first = PieChart::from_statuses(input.denuncias_por_status(), &palette);
    let second = PieChart::from_statuses(input.denuncias_por_status(), &palette);
    assert_eq!(first.labels(), second.labels());

    let (Some(a), Some(b)) = (
        render(&input, ReportOptions::default()),
        render(&input, ReportOptions::default()),
    ) else {
        return;
    };
    assert_eq!(page_count(&a), page_count(&b));
}
