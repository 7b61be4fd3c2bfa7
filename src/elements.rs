//! Element implementations built on top of `genpdf` primitives.
//!
//! `genpdf` only knows how to stroke lines, so every filled shape in the report
//! (bands, shaded table cells, KPI cards) is painted as a scaled single-color
//! image.  This module also hosts the helpers for decoding image data and the
//! chart figure that overlays vector text on the rasterized pie.

use std::borrow::Cow;
use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageBuffer};

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error, ErrorKind};
use genpdf::style::{Style, StyledString};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Scale, Size};
use log::warn;

use crate::chart::{ChartLayout, PieChart, CHART_TITLE, EMPTY_NOTE, LEGEND_TITLE};
use crate::theme::{RgbColor, BLACK, WHITE};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;
const FILL_PIXELS: u32 = 4;
// Keeps scaled fills from overshooting the target area through rounding.
const FILL_TOLERANCE: f64 = 0.999;
// Areas derived through offsets lose a few ulps of height.
const FIT_TOLERANCE_MM: f64 = 1e-6;
const ELLIPSIS: &str = "...";

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Whether content of height `needed` fits into `available`.
pub(crate) fn fits(needed: Mm, available: Mm) -> bool {
    mm_to_f64(needed) <= mm_to_f64(available) + FIT_TOLERANCE_MM
}

/// Shortens `text` with a trailing ellipsis until `measure` reports at most `max_width`.
pub(crate) fn truncate_to_width<'t>(
    text: &'t str,
    max_width: f64,
    measure: impl Fn(&str) -> f64,
) -> Cow<'t, str> {
    if measure(text) <= max_width {
        return Cow::Borrowed(text);
    }
    for (index, _) in text.char_indices().rev() {
        let candidate = format!("{}{}", text[..index].trim_end(), ELLIPSIS);
        if measure(&candidate) <= max_width {
            return Cow::Owned(candidate);
        }
    }
    Cow::Borrowed(ELLIPSIS)
}

/// Converts a length in PDF points into millimetres.
pub fn pt(value: f64) -> Mm {
    mm_from_f64(value * MM_PER_INCH / POINTS_PER_INCH)
}

fn estimated_image_size(image: &DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads an image from in-memory bytes using the [`image`] crate with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode image from provided bytes")
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// Builds a `genpdf` image scaled to exactly `target`.
///
/// Alpha channels are dropped since the PDF backend only embeds RGB data.
fn scaled_image(image: &DynamicImage, target: Size) -> Result<Image, Error> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let natural = estimated_image_size(&rgb, DEFAULT_IMAGE_DPI);
    let mut element = Image::from_dynamic_image(rgb)?;
    let natural_width = mm_to_f64(natural.width);
    let natural_height = mm_to_f64(natural.height);
    if natural_width > f64::EPSILON && natural_height > f64::EPSILON {
        element.set_scale(Scale::new(
            mm_to_f64(target.width) / natural_width,
            mm_to_f64(target.height) / natural_height,
        ));
    }
    element.set_alignment(Alignment::Left);
    Ok(element)
}

/// Paints a filled rectangle of `size` at the origin of `area`.
pub fn paint_rect(
    context: &genpdf::Context,
    area: render::Area<'_>,
    style: Style,
    color: RgbColor,
    size: Size,
) -> Result<(), Error> {
    let target = Size::new(
        mm_from_f64(mm_to_f64(size.width) * FILL_TOLERANCE),
        mm_from_f64(mm_to_f64(size.height) * FILL_TOLERANCE),
    );
    let swatch = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
        FILL_PIXELS,
        FILL_PIXELS,
        color.to_pixel(),
    ));
    scaled_image(&swatch, target)?.render(context, area, style)?;
    Ok(())
}

/// Prints a single line of text with its top-left corner at `position`.
///
/// Returns `false` if the line does not fit into `area` at that position.
fn print_at(
    context: &genpdf::Context,
    area: &render::Area<'_>,
    position: Position,
    text: &str,
    style: Style,
) -> Result<bool, Error> {
    match area.text_section(&context.font_cache, position, style) {
        Some(mut section) => {
            section.print_str(text, style)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Like [`print_at`], but logs lines that do not fit instead of dropping them silently.
fn print_or_warn(
    context: &genpdf::Context,
    area: &render::Area<'_>,
    position: Position,
    text: &str,
    style: Style,
) -> Result<(), Error> {
    if !print_at(context, area, position, text, style)? {
        warn!("Text {:?} does not fit its area and was skipped", text);
    }
    Ok(())
}

fn text_width(context: &genpdf::Context, text: &str, style: Style) -> Mm {
    StyledString::new(text.to_owned(), style).width(&context.font_cache)
}

fn fit_text<'t>(
    context: &genpdf::Context,
    text: &'t str,
    style: Style,
    max_width: Mm,
) -> Cow<'t, str> {
    truncate_to_width(text, mm_to_f64(max_width), |candidate| {
        mm_to_f64(text_width(context, candidate, style))
    })
}

fn glyph_height(context: &genpdf::Context, style: Style) -> Mm {
    style
        .font(&context.font_cache)
        .glyph_height(style.font_size())
}

/// A single line of text placed inside a [`Band`].
#[derive(Clone, Debug)]
pub struct BandText {
    text: String,
    style: Style,
    alignment: Alignment,
    baseline: Mm,
    inset: Mm,
}

impl BandText {
    /// Creates a line whose baseline sits `baseline` below the top of the band.
    pub fn new(text: impl Into<String>, style: Style, baseline: Mm) -> Self {
        Self {
            text: text.into(),
            style,
            alignment: Alignment::Center,
            baseline,
            inset: Mm::default(),
        }
    }

    /// Aligns the line to the left edge, `inset` away from it.
    pub fn left(mut self, inset: Mm) -> Self {
        self.alignment = Alignment::Left;
        self.inset = inset;
        self
    }

    /// Aligns the line to the right edge, `inset` away from it.
    pub fn right(mut self, inset: Mm) -> Self {
        self.alignment = Alignment::Right;
        self.inset = inset;
        self
    }

    /// Returns the text of the line.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Placement of a logo inside a [`Band`].
#[derive(Clone, Debug)]
pub struct BandLogo {
    image: DynamicImage,
    position: Position,
    size: Size,
}

impl BandLogo {
    /// Places `image` at `position` (relative to the band) scaled to `size`.
    pub fn new(image: DynamicImage, position: Position, size: Size) -> Self {
        Self {
            image,
            position,
            size,
        }
    }
}

/// A full-width colored band with an optional logo and aligned text lines.
///
/// Used for the page header and footer.  Each render paints from scratch and
/// every line carries its own style, so nothing carries over between pages.
#[derive(Clone, Debug)]
pub struct Band {
    background: RgbColor,
    height: Mm,
    logo: Option<BandLogo>,
    lines: Vec<BandText>,
}

impl Band {
    /// Creates an empty band.
    pub fn new(background: RgbColor, height: Mm) -> Self {
        Self {
            background,
            height,
            logo: None,
            lines: Vec::new(),
        }
    }

    /// Returns the band height.
    pub fn height(&self) -> Mm {
        self.height
    }

    /// Returns the text lines of the band.
    pub fn lines(&self) -> &[BandText] {
        &self.lines
    }

    /// Whether the band carries a logo.
    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }

    /// Sets the logo and returns the updated band.
    pub fn with_logo(mut self, logo: impl Into<Option<BandLogo>>) -> Self {
        self.logo = logo.into();
        self
    }

    /// Appends a text line and returns the updated band.
    pub fn with_line(mut self, line: BandText) -> Self {
        self.lines.push(line);
        self
    }
}

impl Element for Band {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        if !fits(self.height, area.size().height) {
            result.has_more = true;
            return Ok(result);
        }

        let width = area.size().width;
        paint_rect(
            context,
            area.clone(),
            style,
            self.background,
            Size::new(width, self.height),
        )?;

        if let Some(logo) = &self.logo {
            let mut logo_area = area.clone();
            logo_area.add_offset(logo.position);
            scaled_image(&logo.image, logo.size)?.render(context, logo_area, style)?;
        }

        for line in &self.lines {
            let line_style = style.and(line.style);
            let line_width = text_width(context, &line.text, line_style);
            let x = match line.alignment {
                Alignment::Left => line.inset,
                Alignment::Center => (width - line_width) / 2.0,
                Alignment::Right => width - line_width - line.inset,
            };
            let top = line.baseline - glyph_height(context, line_style);
            print_or_warn(context, &area, Position::new(x, top), &line.text, line_style)?;
        }

        result.size = Size::new(width, self.height);
        Ok(result)
    }
}

/// Vertical and horizontal padding of a [`ShadedCell`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellPadding {
    pub top: Mm,
    pub bottom: Mm,
    pub horizontal: Mm,
}

impl Default for CellPadding {
    fn default() -> Self {
        Self {
            top: pt(3.0),
            bottom: pt(3.0),
            horizontal: pt(6.0),
        }
    }
}

/// A single-line table cell with an optional background fill.
#[derive(Clone, Debug)]
pub struct ShadedCell {
    text: String,
    style: Style,
    background: Option<RgbColor>,
    padding: CellPadding,
}

impl ShadedCell {
    /// Creates an unshaded cell.
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
            background: None,
            padding: CellPadding::default(),
        }
    }

    /// Sets the background and returns the updated cell.
    pub fn with_background(mut self, background: impl Into<Option<RgbColor>>) -> Self {
        self.background = background.into();
        self
    }

    /// Sets the padding and returns the updated cell.
    pub fn with_padding(mut self, padding: CellPadding) -> Self {
        self.padding = padding;
        self
    }

    /// Returns the cell text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the background fill, if any.
    pub fn background(&self) -> Option<RgbColor> {
        self.background
    }
}

impl Element for ShadedCell {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let cell_style = style.and(self.style);
        let height =
            self.padding.top + cell_style.line_height(&context.font_cache) + self.padding.bottom;
        let text_height = self.padding.top + glyph_height(context, cell_style);
        if !fits(height.max(text_height), area.size().height) {
            result.has_more = true;
            return Ok(result);
        }

        let width = area.size().width;
        let text = fit_text(
            context,
            &self.text,
            cell_style,
            width - self.padding.horizontal * 2.0,
        );

        if let Some(background) = self.background {
            paint_rect(
                context,
                area.clone(),
                style,
                background,
                Size::new(width, height),
            )?;
        }

        let position = Position::new(self.padding.horizontal, self.padding.top);
        if !print_at(context, &area, position, &text, cell_style)? {
            return Err(Error::new(
                format!("Table cell text {:?} does not fit its cell", self.text),
                ErrorKind::PageSizeExceeded,
            ));
        }

        result.size = Size::new(width, height);
        Ok(result)
    }
}

/// Styles used by [`ChartFigure`] for its text overlays.
#[derive(Clone, Copy, Debug)]
pub struct ChartStyles {
    pub title: Style,
    pub label: Style,
    pub legend: Style,
}

/// Picks black or white text, whichever reads better on `background`.
fn contrasting_text(background: RgbColor) -> RgbColor {
    let [r, g, b] = background.channels();
    let luminance = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    if luminance < 110.0 {
        WHITE
    } else {
        BLACK
    }
}

/// The pie chart laid out as a fixed-size, horizontally centered figure.
///
/// The wedges come from an in-memory PNG produced by [`PieChart::encode_png`];
/// the title, percentage labels and legend entries are printed on top of it.
/// Legend entries beyond [`ChartLayout::legend_capacity`] continue below the
/// box in rows of [`ChartLayout::legend_columns`], across pages if needed.
pub struct ChartFigure {
    chart: PieChart,
    layout: ChartLayout,
    raster: DynamicImage,
    styles: ChartStyles,
    box_drawn: bool,
    next_entry: usize,
}

impl ChartFigure {
    /// Builds the figure from the chart and its encoded raster.
    pub fn from_png(
        chart: PieChart,
        layout: ChartLayout,
        png: impl AsRef<[u8]>,
        styles: ChartStyles,
    ) -> Result<Self, Error> {
        let raster = decode_image_from_bytes(png)?;
        let next_entry = layout.legend_capacity().min(chart.wedges().len());
        Ok(Self {
            chart,
            layout,
            raster,
            styles,
            box_drawn: false,
            next_entry,
        })
    }

    /// Returns the displayed size of the chart box.
    pub fn display_size(&self) -> Size {
        Size::new(pt(self.layout.width), pt(self.layout.height))
    }

    fn print_centered(
        &self,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        center: (f64, f64),
        text: &str,
        style: Style,
    ) -> Result<(), Error> {
        let width = text_width(context, text, style);
        let height = style.line_height(&context.font_cache);
        let position = Position::new(pt(center.0) - width / 2.0, pt(center.1) - height / 2.0);
        print_or_warn(context, area, position, text, style)
    }

    /// Prints a legend label whose swatch has its top-left corner at `swatch` (points).
    fn print_legend_label(
        &self,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        swatch: (f64, f64),
        label: &str,
        max_width: Mm,
        style: Style,
    ) -> Result<(), Error> {
        let line = style.line_height(&context.font_cache);
        let top = pt(swatch.1 + self.layout.swatch_size / 2.0) - line / 2.0;
        let left = pt(swatch.0 + self.layout.swatch_size + 6.0);
        let label = fit_text(context, label, style, max_width);
        print_or_warn(context, area, Position::new(left, top), &label, style)
    }

    fn render_box(
        &self,
        context: &genpdf::Context,
        figure: &render::Area<'_>,
        style: Style,
    ) -> Result<(), Error> {
        let layout = self.layout;
        scaled_image(&self.raster, self.display_size())?.render(
            context,
            figure.clone(),
            style,
        )?;

        let title_style = style.and(self.styles.title);
        self.print_centered(
            context,
            figure,
            (layout.center.0, 16.0),
            CHART_TITLE,
            title_style,
        )?;

        if self.chart.is_empty() {
            let note_style = style.and(self.styles.label);
            self.print_centered(context, figure, layout.center, EMPTY_NOTE, note_style)?;
        }

        for wedge in self.chart.wedges().iter().filter(|wedge| wedge.is_visible()) {
            let label_style = style
                .and(self.styles.label)
                .with_color(contrasting_text(wedge.color()).to_pdf());
            self.print_centered(
                context,
                figure,
                layout.label_anchor(wedge),
                &wedge.percentage_label(),
                label_style,
            )?;
        }

        let legend_style = style.and(self.styles.legend);
        print_or_warn(
            context,
            figure,
            Position::new(pt(layout.legend_origin.0), pt(layout.legend_origin.1)),
            LEGEND_TITLE,
            legend_style.bold(),
        )?;
        let label_width = pt(layout.width - layout.legend_origin.0 - layout.swatch_size - 6.0);
        let beside = layout.legend_capacity();
        for (index, wedge) in self.chart.wedges().iter().take(beside).enumerate() {
            self.print_legend_label(
                context,
                figure,
                layout.legend_swatch(index),
                wedge.label(),
                label_width,
                legend_style,
            )?;
        }
        Ok(())
    }

    /// Prints one row of legend entries below the chart box, starting at `first`.
    fn render_legend_row(
        &self,
        context: &genpdf::Context,
        row: &render::Area<'_>,
        style: Style,
        first: usize,
        last: usize,
    ) -> Result<(), Error> {
        let layout = self.layout;
        let legend_style = style.and(self.styles.legend);
        let column_width = layout.width / layout.legend_columns.max(1) as f64;
        let label_width = pt(column_width - layout.swatch_size - 12.0);
        let swatch_top = (layout.legend_row_height - layout.swatch_size) / 2.0;
        let edge = layout.edge_width;

        for (column, wedge) in self.chart.wedges()[first..last].iter().enumerate() {
            let swatch = (column as f64 * column_width, swatch_top);
            let mut swatch_area = row.clone();
            swatch_area.add_offset(Position::new(pt(swatch.0), pt(swatch.1)));
            let outer = pt(layout.swatch_size);
            paint_rect(context, swatch_area.clone(), style, BLACK, Size::new(outer, outer))?;
            swatch_area.add_offset(Position::new(pt(edge), pt(edge)));
            let inner = pt(layout.swatch_size - 2.0 * edge);
            paint_rect(context, swatch_area, style, wedge.color(), Size::new(inner, inner))?;

            self.print_legend_label(
                context,
                row,
                swatch,
                wedge.label(),
                label_width,
                legend_style,
            )?;
        }
        Ok(())
    }
}

impl Element for ChartFigure {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let size = self.display_size();
        let full_width = area.size().width;
        if !fits(size.width, full_width) {
            return Err(Error::new(
                "Chart is wider than the page body",
                ErrorKind::PageSizeExceeded,
            ));
        }

        let mut figure = area;
        figure.add_offset(Position::new((full_width - size.width) / 2.0, 0));
        let mut used = Mm::default();

        if !self.box_drawn {
            if !fits(size.height, figure.size().height) {
                result.has_more = true;
                return Ok(result);
            }
            self.render_box(context, &figure, style)?;
            self.box_drawn = true;
            used = size.height;
        }

        let entries = self.chart.wedges().len();
        let row_height = pt(self.layout.legend_row_height);
        let columns = self.layout.legend_columns.max(1);
        while self.next_entry < entries {
            if !fits(used + row_height, figure.size().height) {
                result.has_more = true;
                break;
            }
            let mut row = figure.clone();
            row.add_offset(Position::new(0, used));
            let last = (self.next_entry + columns).min(entries);
            self.render_legend_row(context, &row, style, self.next_entry, last)?;
            self.next_entry = last;
            used += row_height;
        }

        result.size = Size::new(full_width, used);
        Ok(result)
    }
}

/// A small card showing a labelled metric over a colored frame with a white inset.
#[derive(Clone, Debug)]
pub struct KpiCard {
    title: String,
    value: String,
    accent: RgbColor,
    title_style: Style,
    value_style: Style,
    size: Size,
}

impl KpiCard {
    /// Creates a 150×60 pt card.
    pub fn new(
        title: impl Into<String>,
        value: impl Into<String>,
        accent: RgbColor,
        title_style: Style,
        value_style: Style,
    ) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            accent,
            title_style,
            value_style,
            size: Size::new(pt(150.0), pt(60.0)),
        }
    }

    /// Returns the card title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the displayed value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Element for KpiCard {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        if !fits(self.size.height, area.size().height) {
            result.has_more = true;
            return Ok(result);
        }

        let width = if self.size.width > area.size().width {
            area.size().width
        } else {
            self.size.width
        };
        let height = self.size.height;
        paint_rect(
            context,
            area.clone(),
            style,
            self.accent,
            Size::new(width, height),
        )?;

        let mut inset = area.clone();
        inset.add_offset(Position::new(pt(5.0), pt(5.0)));
        paint_rect(
            context,
            inset,
            style,
            WHITE,
            Size::new(width - pt(10.0), height - pt(10.0)),
        )?;

        let title_style = style.and(self.title_style);
        let title_top = pt(20.0) - glyph_height(context, title_style);
        print_or_warn(
            context,
            &area,
            Position::new(pt(10.0), title_top),
            &self.title,
            title_style,
        )?;

        let value_style = style.and(self.value_style);
        let value_top = pt(45.0) - glyph_height(context, value_style);
        print_or_warn(
            context,
            &area,
            Position::new(pt(10.0), value_top),
            &self.value,
            value_style,
        )?;

        result.size = Size::new(width, height);
        Ok(result)
    }
}
