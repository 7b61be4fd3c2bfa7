//! The report compositor: turns a [`ReportInput`] into PDF bytes.
//!
//! Layout, top to bottom: page chrome on every page (header band with logo,
//! title, subtitle and generation date; footer band), then the body flow:
//! main title, subtitle, the status table and the pie chart.  Pagination is
//! left to `genpdf`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::{Alignment, Element, Margins, Position, Size};
use log::{debug, warn};

use crate::builder::DocumentBuilder;
use crate::chart::{ChartLayout, PieChart};
use crate::elements::{
    self, pt, Band, BandLogo, BandText, CellPadding, ChartFigure, ChartStyles, KpiCard, ShadedCell,
};
use crate::error::ReportError;
use crate::fonts;
use crate::model::{kpi_figures, ReportInput, StatusTable};
use crate::theme::{Palette, ReportStyles, StatusPalette};

/// File name used for downloads and for the standalone invocation mode.
pub const REPORT_FILENAME: &str = "relatorio_infografico.pdf";
/// Default location of the header logo, relative to the working directory.
pub const DEFAULT_LOGO_PATH: &str = "logo.png";

pub const HEADER_TITLE: &str = "Relatório Infográfico RecMap";
pub const HEADER_SUBTITLE: &str = "Gestão de Resíduos Sólidos Urbanos";
pub const FOOTER_ORGANIZATION: &str = "RecMap - Cidadania Ativa e Sustentabilidade";
pub const FOOTER_DOCUMENT_TYPE: &str = "Relatório Gerencial";
pub const BODY_TITLE: &str = "Relatório Gerencial de Impacto";
pub const BODY_SUBTITLE: &str =
    "Análise de Denúncias e Pontos de Coleta para orgãos governamentais";
pub const TABLE_HEADING: &str = "1. Detalhe: Denúncias por Status";
pub const CHART_HEADING: &str = "2. Infográfico: Distribuição de Denúncias";

// Page geometry in points (US Letter).
const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;
const MARGIN_LEFT: f64 = 50.0;
const MARGIN_RIGHT: f64 = 50.0;
const MARGIN_TOP: f64 = 80.0;
const MARGIN_BOTTOM: f64 = 40.0;
const HEADER_HEIGHT: f64 = 70.0;
const FOOTER_HEIGHT: f64 = 30.0;
const TABLE_WIDTH: f64 = 400.0;
const FOOTER_RIGHT_INSET: f64 = 100.0;
const BASE_LINE_HEIGHT: f64 = 12.0;

/// Formats the generation date stamp, `DD/MM/YYYY`.
pub fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn today() -> String {
    format_date(chrono::Local::now().date_naive())
}

/// Vertical space expressed in points.
fn spacer(points: f64) -> Break {
    Break::new(points / BASE_LINE_HEIGHT)
}

/// Settings of the compositor.
#[derive(Clone, Debug)]
pub struct ReportOptions {
    logo_path: Option<PathBuf>,
    kpi_cards: bool,
    palette: Palette,
    status_palette: StatusPalette,
    chart_layout: ChartLayout,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            logo_path: Some(PathBuf::from(DEFAULT_LOGO_PATH)),
            kpi_cards: false,
            palette: Palette::default(),
            status_palette: StatusPalette::default(),
            chart_layout: ChartLayout::default(),
        }
    }
}

impl ReportOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logo path (or disables the logo) and returns the updated options.
    pub fn with_logo_path(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.logo_path = path.map(Into::into);
        self
    }

    /// Adds the KPI card row below the subtitle when `enabled`.
    ///
    /// Off by default; the standard report does not show KPI cards.
    pub fn with_kpi_cards(mut self, enabled: bool) -> Self {
        self.kpi_cards = enabled;
        self
    }

    /// Replaces the status color mapping and returns the updated options.
    pub fn with_status_palette(mut self, status_palette: StatusPalette) -> Self {
        self.status_palette = status_palette;
        self
    }

    /// Returns the configured logo path.
    pub fn logo_path(&self) -> Option<&Path> {
        self.logo_path.as_deref()
    }

    /// Whether the KPI card row is rendered.
    pub fn kpi_cards(&self) -> bool {
        self.kpi_cards
    }

    /// Returns the status color mapping.
    pub fn status_palette(&self) -> &StatusPalette {
        &self.status_palette
    }
}

/// Renders infographic reports.
///
/// Each call builds its own document, styles and chart, so a single instance
/// can serve concurrent callers.  The font family is loaded on first use and
/// reused by later renders.
#[derive(Clone, Debug, Default)]
pub struct ReportCompositor {
    options: ReportOptions,
    fonts: OnceLock<FontFamily<FontData>>,
}

impl ReportCompositor {
    /// Creates a compositor with the given options.
    pub fn new(options: ReportOptions) -> Self {
        Self {
            options,
            fonts: OnceLock::new(),
        }
    }

    /// Returns the compositor options.
    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Renders `input` using the first font family found on this machine.
    pub fn generate(&self, input: &ReportInput) -> Result<Vec<u8>, ReportError> {
        let family = self.font_family()?;
        self.generate_with_fonts(input, family)
    }

    fn font_family(&self) -> Result<FontFamily<FontData>, ReportError> {
        if let Some(family) = self.fonts.get() {
            return Ok(family.clone());
        }
        let family = fonts::default_font_family().map_err(ReportError::FontLoad)?;
        Ok(self.fonts.get_or_init(|| family).clone())
    }

    /// Renders `input` with an already loaded font family.
    pub fn generate_with_fonts(
        &self,
        input: &ReportInput,
        font_family: FontFamily<FontData>,
    ) -> Result<Vec<u8>, ReportError> {
        debug!(
            "Rendering report: total={}, statuses={}",
            input.total_denuncias(),
            input.denuncias_por_status().len()
        );

        let palette = self.options.palette;
        let styles = ReportStyles::new(&palette);
        let header = self.header_band(&palette, &styles, &today());
        let footer = footer_band(&palette, &styles);

        let mut document = DocumentBuilder::new()
            .with_title(HEADER_TITLE)
            .with_paper_size(Size::new(pt(PAGE_WIDTH), pt(PAGE_HEIGHT)))
            .with_margins(Margins::trbl(
                pt(MARGIN_TOP),
                pt(MARGIN_RIGHT),
                pt(MARGIN_BOTTOM),
                pt(MARGIN_LEFT),
            ))
            .with_font_size(10)
            .with_font_family(font_family)
            .with_header(move |_| header.clone())
            .with_footer(pt(FOOTER_HEIGHT), move |_| footer.clone())
            .build()?;

        document.push(
            Paragraph::new(BODY_TITLE)
                .aligned(Alignment::Center)
                .styled(styles.title),
        );
        document.push(spacer(12.0));
        document.push(
            Paragraph::new(BODY_SUBTITLE)
                .aligned(Alignment::Center)
                .styled(styles.subtitle),
        );
        document.push(spacer(24.0));

        if self.options.kpi_cards {
            document.push(kpi_row(input, &palette, &styles)?);
            document.push(spacer(24.0));
        }

        document.push(Paragraph::new(TABLE_HEADING).styled(styles.heading));
        document.push(spacer(6.0));
        document.push(status_table(input, &palette, &styles)?);
        document.push(spacer(24.0));

        document.push(Paragraph::new(CHART_HEADING).styled(styles.heading));
        document.push(spacer(6.0));
        let chart =
            PieChart::from_statuses(input.denuncias_por_status(), &self.options.status_palette);
        let layout = self.options.chart_layout;
        let png = chart.encode_png(&layout)?;
        document.push(ChartFigure::from_png(
            chart,
            layout,
            png,
            ChartStyles {
                title: styles.chart_title,
                label: styles.chart_label,
                legend: styles.chart_legend,
            },
        )?);
        document.push(spacer(24.0));

        let mut bytes = Vec::new();
        document.render(&mut bytes)?;
        debug!("Rendered report ({} bytes)", bytes.len());
        Ok(bytes)
    }

    fn load_logo(&self) -> Option<image::DynamicImage> {
        let path = self.options.logo_path.as_ref()?;
        match elements::decode_image_from_path(path) {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("Logo not found at {}: {}", path.display(), err);
                None
            }
        }
    }

    fn header_band(&self, palette: &Palette, styles: &ReportStyles, date: &str) -> Band {
        let logo = self.load_logo().map(|image| {
            BandLogo::new(
                image,
                Position::new(pt(20.0), 0),
                Size::new(pt(60.0), pt(60.0)),
            )
        });

        Band::new(palette.primary, pt(HEADER_HEIGHT))
            .with_logo(logo)
            .with_line(BandText::new(HEADER_TITLE, styles.band_title, pt(30.0)))
            .with_line(BandText::new(
                HEADER_SUBTITLE,
                styles.band_subtitle,
                pt(50.0),
            ))
            .with_line(
                BandText::new(format!("Gerado em: {date}"), styles.band_date, pt(60.0))
                    .right(pt(10.0)),
            )
    }
}

fn footer_band(palette: &Palette, styles: &ReportStyles) -> Band {
    Band::new(palette.primary, pt(FOOTER_HEIGHT))
        .with_line(
            BandText::new(FOOTER_ORGANIZATION, styles.footer, pt(20.0)).left(pt(MARGIN_LEFT)),
        )
        .with_line(
            BandText::new(FOOTER_DOCUMENT_TYPE, styles.footer, pt(20.0))
                .right(pt(FOOTER_RIGHT_INSET)),
        )
}

fn centered_padding(content_width: f64) -> Margins {
    let body_width = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let side = ((body_width - content_width) / 2.0).max(0.0);
    Margins::trbl(0, pt(side), 0, pt(side))
}

fn status_table(
    input: &ReportInput,
    palette: &Palette,
    styles: &ReportStyles,
) -> Result<impl Element, ReportError> {
    let table_data = StatusTable::from_input(input);
    let mut table = TableLayout::new(vec![2, 1, 1]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let header_padding = CellPadding {
        bottom: pt(12.0),
        ..CellPadding::default()
    };
    let [status, quantity, percentage] = StatusTable::HEADER.map(|text| {
        ShadedCell::new(text, styles.table_header)
            .with_background(palette.primary)
            .with_padding(header_padding)
    });
    table
        .row()
        .element(status)
        .element(quantity)
        .element(percentage)
        .push()?;

    for (index, row) in table_data.rows().iter().enumerate() {
        let background = if StatusTable::is_highlighted(index) {
            palette.highlight
        } else {
            crate::theme::WHITE
        };
        let [status, quantity, percentage] = row
            .cells()
            .map(|text| ShadedCell::new(text, styles.table_cell).with_background(background));
        table
            .row()
            .element(status)
            .element(quantity)
            .element(percentage)
            .push()?;
    }

    Ok(table.padded(centered_padding(TABLE_WIDTH)))
}

fn kpi_row(
    input: &ReportInput,
    palette: &Palette,
    styles: &ReportStyles,
) -> Result<impl Element, ReportError> {
    let accents = [
        palette.secondary,
        palette.primary,
        palette.highlight,
        palette.secondary,
    ];
    let cards = kpi_figures(input)
        .into_iter()
        .zip(accents)
        .map(|(figure, accent)| {
            KpiCard::new(
                figure.title(),
                figure.value(),
                accent,
                styles.kpi_title,
                styles.kpi_value,
            )
        });

    let mut table = TableLayout::new(vec![1, 1, 1, 1]);
    let mut row = table.row();
    for card in cards {
        row = row.element(card);
    }
    row.push()?;
    Ok(table)
}

/// Renders `input` with the default options.
pub fn generate(input: &ReportInput) -> Result<Vec<u8>, ReportError> {
    ReportCompositor::default().generate(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_stamp_is_day_month_year() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 7).expect("valid date");
        assert_eq!(format_date(date), "07/03/2024");
    }

    #[test]
    fn kpi_cards_are_off_by_default() {
        assert!(!ReportOptions::default().kpi_cards());
        assert!(ReportOptions::default().with_kpi_cards(true).kpi_cards());
    }

    #[test]
    fn default_logo_is_relative_logo_png() {
        let options = ReportOptions::default();
        assert_eq!(options.logo_path(), Some(Path::new(DEFAULT_LOGO_PATH)));
        let without = options.with_logo_path(None::<PathBuf>);
        assert!(without.logo_path().is_none());
    }

    #[test]
    fn font_family_is_loaded_once() {
        if !fonts::fonts_available() {
            return;
        }
        let compositor = ReportCompositor::default();
        assert!(compositor.fonts.get().is_none());
        compositor.font_family().expect("load fonts");
        assert!(compositor.fonts.get().is_some());
        compositor.font_family().expect("reuse fonts");
    }

    #[test]
    fn missing_logo_is_tolerated() {
        let compositor = ReportCompositor::new(
            ReportOptions::default().with_logo_path(Some("/__recmap_missing__/logo.png")),
        );
        assert!(compositor.load_logo().is_none());
    }
}
