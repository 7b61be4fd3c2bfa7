//! Colors, status color mapping and text styles used by the report.
//!
//! Nothing in this module is global: every render constructs its own
//! [`ReportStyles`] from a [`Palette`], so concurrent renders never share
//! mutable style state.

use genpdf::style::{Color, Style};

/// An opaque RGB color usable both in the PDF and in raster images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RgbColor {
    /// Creates a color from its channels.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Returns the channels as an array.
    pub fn channels(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }

    /// Returns the `#RRGGBB` representation.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }

    /// Converts the color for use in `genpdf` styles.
    pub fn to_pdf(self) -> Color {
        Color::Rgb(self.red, self.green, self.blue)
    }

    /// Converts the color into an `image` pixel.
    pub fn to_pixel(self) -> image::Rgb<u8> {
        image::Rgb(self.channels())
    }
}

impl From<RgbColor> for Color {
    fn from(color: RgbColor) -> Self {
        color.to_pdf()
    }
}

/// Dark blue used for bands, table headers and headings.
pub const PRIMARY: RgbColor = RgbColor::new(0x14, 0x3D, 0x60);
/// Light green.
pub const SECONDARY: RgbColor = RgbColor::new(0xA0, 0xC8, 0x78);
/// Yellow-green used for alternating table rows.
pub const HIGHLIGHT: RgbColor = RgbColor::new(0xDD, 0xEB, 0x9D);
/// Body text.
pub const TEXT: RgbColor = RgbColor::new(0x33, 0x33, 0x33);
/// Neutral gray for unknown statuses.
pub const FALLBACK: RgbColor = RgbColor::new(0xCC, 0xCC, 0xCC);
pub const WHITE: RgbColor = RgbColor::new(0xFF, 0xFF, 0xFF);
pub const BLACK: RgbColor = RgbColor::new(0x00, 0x00, 0x00);

/// Brand colors of a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub primary: RgbColor,
    pub secondary: RgbColor,
    pub highlight: RgbColor,
    pub text: RgbColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: PRIMARY,
            secondary: SECONDARY,
            highlight: HIGHLIGHT,
            text: TEXT,
        }
    }
}

/// Explicit mapping from status labels to chart colors.
///
/// Lookups are case-insensitive.  Labels without an entry resolve to the
/// default entry instead of relying on a missing-key fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusPalette {
    entries: Vec<(String, RgbColor)>,
    default_entry: RgbColor,
}

impl StatusPalette {
    /// Key of the default entry.
    pub const DEFAULT_KEY: &'static str = "OUTRO";

    /// Creates an empty mapping that resolves every label to `default_entry`.
    pub fn new(default_entry: RgbColor) -> Self {
        Self {
            entries: Vec::new(),
            default_entry,
        }
    }

    /// Adds (or replaces) the color for `status` and returns the updated mapping.
    pub fn with_entry(mut self, status: &str, color: RgbColor) -> Self {
        let key = status.to_uppercase();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = color,
            None => self.entries.push((key, color)),
        }
        self
    }

    /// Returns the color of the default entry.
    pub fn default_color(&self) -> RgbColor {
        self.default_entry
    }

    /// Resolves the color for a status label.
    pub fn color_for(&self, status: &str) -> RgbColor {
        let key = status.to_uppercase();
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, color)| *color)
            .unwrap_or(self.default_entry)
    }
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self::new(FALLBACK)
            .with_entry("VALIDADA", SECONDARY)
            .with_entry("PENDENTE", PRIMARY)
            .with_entry("REJEITADA", HIGHLIGHT)
    }
}

/// Text styles for a single render.
#[derive(Clone, Copy, Debug)]
pub struct ReportStyles {
    pub base: Style,
    pub title: Style,
    pub subtitle: Style,
    pub heading: Style,
    pub table_header: Style,
    pub table_cell: Style,
    pub band_title: Style,
    pub band_subtitle: Style,
    pub band_date: Style,
    pub footer: Style,
    pub chart_title: Style,
    pub chart_label: Style,
    pub chart_legend: Style,
    pub kpi_title: Style,
    pub kpi_value: Style,
}

impl ReportStyles {
    /// Builds a fresh style set for `palette`.
    ///
    /// Every style carries an explicit color so that nothing depends on the
    /// color left behind by a previous drawing operation.
    pub fn new(palette: &Palette) -> Self {
        let text = palette.text.to_pdf();
        let primary = palette.primary.to_pdf();
        let white = WHITE.to_pdf();
        let black = BLACK.to_pdf();

        Self {
            base: Style::new().with_font_size(10).with_color(text),
            title: Style::new().bold().with_font_size(28).with_color(primary),
            subtitle: Style::new().with_font_size(12).with_color(text),
            heading: Style::new().bold().with_font_size(14).with_color(text),
            table_header: Style::new().bold().with_font_size(12).with_color(white),
            table_cell: Style::new().with_font_size(10).with_color(black),
            band_title: Style::new().bold().with_font_size(20).with_color(white),
            band_subtitle: Style::new().with_font_size(12).with_color(white),
            band_date: Style::new().with_font_size(10).with_color(white),
            footer: Style::new().with_font_size(8).with_color(white),
            chart_title: Style::new().bold().with_font_size(14).with_color(black),
            chart_label: Style::new().with_font_size(9).with_color(black),
            chart_legend: Style::new().with_font_size(9).with_color(black),
            kpi_title: Style::new().with_font_size(10).with_color(text),
            kpi_value: Style::new().bold().with_font_size(20).with_color(primary),
        }
    }
}

impl Default for ReportStyles {
    fn default() -> Self {
        Self::new(&Palette::default())
    }
}
