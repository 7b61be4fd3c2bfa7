//! Pie chart of complaints per status.
//!
//! The chart is split in two parts: [`PieChart`] holds the wedge geometry and
//! labels derived from the status counts, and [`PieChart::encode_png`]
//! rasterizes the wedges and legend swatches into an in-memory PNG.  Text
//! (title, percentage labels, legend entries) is not rasterized; it is laid
//! over the image by [`crate::elements::ChartFigure`] using the document fonts.

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageOutputFormat, RgbImage};

use crate::model::StatusCount;
use crate::theme::{RgbColor, StatusPalette, BLACK, WHITE};

/// Title drawn above the chart.
pub const CHART_TITLE: &str = "Denúncias por Status";
/// Title of the legend block.
pub const LEGEND_TITLE: &str = "Status";
/// Note shown when there is nothing to draw.
pub const EMPTY_NOTE: &str = "Sem dados";

/// One slice of the pie.
#[derive(Clone, Debug, PartialEq)]
pub struct Wedge {
    label: String,
    count: u64,
    fraction: f64,
    start: f64,
    color: RgbColor,
}

impl Wedge {
    /// Returns the status label of the wedge.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the raw count behind the wedge.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Share of the whole pie in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Returns the fill color.
    pub fn color(&self) -> RgbColor {
        self.color
    }

    /// Whether the wedge occupies any area.
    pub fn is_visible(&self) -> bool {
        self.fraction > 0.0
    }

    /// Percentage label with one decimal place, e.g. `66.7%`.
    pub fn percentage_label(&self) -> String {
        format!("{:.1}%", self.fraction * 100.0)
    }

    /// Start angle in degrees, counter-clockwise from 12 o'clock.
    pub fn start_degrees(&self) -> f64 {
        self.start * 360.0
    }

    /// Sweep in degrees.
    pub fn sweep_degrees(&self) -> f64 {
        self.fraction * 360.0
    }

    /// Angle of the wedge bisector in standard math orientation (radians,
    /// counter-clockwise from 3 o'clock).
    pub fn mid_angle(&self) -> f64 {
        (90.0 + self.start_degrees() + self.sweep_degrees() / 2.0).to_radians()
    }
}

/// Geometry of the chart box, in points, with the origin at the top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub center: (f64, f64),
    pub radius: f64,
    pub legend_origin: (f64, f64),
    pub legend_row_height: f64,
    /// Columns of the legend continuation printed below the chart box.
    pub legend_columns: usize,
    pub swatch_size: f64,
    pub edge_width: f64,
    pub label_radius: f64,
    pub pixels_per_point: f64,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 300.0,
            center: (150.0, 168.0),
            radius: 108.0,
            legend_origin: (285.0, 120.0),
            legend_row_height: 18.0,
            legend_columns: 3,
            swatch_size: 10.0,
            edge_width: 0.5,
            label_radius: 0.6,
            pixels_per_point: 1.5,
        }
    }
}

impl ChartLayout {
    /// Raster dimensions in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixels_per_point).round() as u32,
            (self.height * self.pixels_per_point).round() as u32,
        )
    }

    /// Anchor point (center) of the percentage label of `wedge`.
    pub fn label_anchor(&self, wedge: &Wedge) -> (f64, f64) {
        let angle = wedge.mid_angle();
        let distance = self.radius * self.label_radius;
        (
            self.center.0 + distance * angle.cos(),
            self.center.1 - distance * angle.sin(),
        )
    }

    /// Number of legend entries that fit beside the pie, below the legend title.
    pub fn legend_capacity(&self) -> usize {
        let rows = ((self.height - self.legend_origin.1) / self.legend_row_height).floor();
        (rows.max(1.0) as usize) - 1
    }

    /// Rows needed below the chart box for the entries past [`Self::legend_capacity`].
    pub fn legend_overflow_rows(&self, entries: usize) -> usize {
        let overflow = entries.saturating_sub(self.legend_capacity());
        let columns = self.legend_columns.max(1);
        (overflow + columns - 1) / columns
    }

    /// Top-left corner of the legend swatch at `index`.
    ///
    /// Row zero is taken by the legend title.
    pub fn legend_swatch(&self, index: usize) -> (f64, f64) {
        (
            self.legend_origin.0,
            self.legend_origin.1 + self.legend_row_height * (index + 1) as f64,
        )
    }
}

/// Pie chart derived from the status counts.
#[derive(Clone, Debug, PartialEq)]
pub struct PieChart {
    wedges: Vec<Wedge>,
}

impl PieChart {
    /// Builds one wedge per status entry, in input order.
    ///
    /// Wedge sizes are proportional to the counts.  An empty sequence, or one
    /// whose counts are all zero, yields a chart without visible wedges.
    pub fn from_statuses(statuses: &[StatusCount], palette: &StatusPalette) -> Self {
        let total: u64 = statuses.iter().map(StatusCount::count).sum();
        let mut start = 0.0;
        let wedges = statuses
            .iter()
            .map(|entry| {
                let fraction = if total == 0 {
                    0.0
                } else {
                    entry.count() as f64 / total as f64
                };
                let wedge = Wedge {
                    label: entry.status().to_owned(),
                    count: entry.count(),
                    fraction,
                    start,
                    color: palette.color_for(entry.status()),
                };
                start += fraction;
                wedge
            })
            .collect();
        Self { wedges }
    }

    /// Returns all wedges, including zero-sized ones.
    pub fn wedges(&self) -> &[Wedge] {
        &self.wedges
    }

    /// Returns the legend labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.wedges.iter().map(Wedge::label).collect()
    }

    /// Whether the chart has no visible wedge.
    pub fn is_empty(&self) -> bool {
        !self.wedges.iter().any(Wedge::is_visible)
    }

    fn wedge_at(&self, position: f64) -> Option<&Wedge> {
        self.wedges
            .iter()
            .filter(|wedge| wedge.is_visible())
            .find(|wedge| position >= wedge.start && position < wedge.start + wedge.fraction)
            .or_else(|| self.wedges.iter().rev().find(|wedge| wedge.is_visible()))
    }

    /// Rasterizes the wedges and legend swatches.
    pub fn rasterize(&self, layout: &ChartLayout) -> RgbImage {
        let (width, height) = layout.pixel_size();
        let scale = layout.pixels_per_point;
        let half_edge = layout.edge_width / 2.0;
        let boundaries: Vec<f64> = self
            .wedges
            .iter()
            .filter(|wedge| wedge.is_visible())
            .map(|wedge| (90.0 + wedge.start_degrees()).to_radians())
            .collect();
        let swatches: Vec<((f64, f64), RgbColor)> = self
            .wedges
            .iter()
            .take(layout.legend_capacity())
            .enumerate()
            .map(|(index, wedge)| (layout.legend_swatch(index), wedge.color))
            .collect();

        ImageBuffer::from_fn(width, height, |px, py| {
            let x = (px as f64 + 0.5) / scale;
            let y = (py as f64 + 0.5) / scale;

            for ((sx, sy), color) in &swatches {
                let size = layout.swatch_size;
                if x >= *sx && x <= sx + size && y >= *sy && y <= sy + size {
                    let border = x - sx < half_edge * 2.0
                        || sx + size - x < half_edge * 2.0
                        || y - sy < half_edge * 2.0
                        || sy + size - y < half_edge * 2.0;
                    let fill = if border { BLACK } else { *color };
                    return fill.to_pixel();
                }
            }

            if self.is_empty() {
                return WHITE.to_pixel();
            }

            let dx = x - layout.center.0;
            let dy = layout.center.1 - y;
            let distance = dx.hypot(dy);
            if distance > layout.radius + half_edge {
                return WHITE.to_pixel();
            }
            if (distance - layout.radius).abs() <= half_edge {
                return BLACK.to_pixel();
            }

            let angle = dy.atan2(dx);
            let on_boundary = boundaries.iter().any(|boundary| {
                let delta = angle - boundary;
                delta.cos() > 0.0 && (distance * delta.sin()).abs() <= half_edge
            });
            if on_boundary {
                return BLACK.to_pixel();
            }

            let position = ((angle.to_degrees() - 90.0).rem_euclid(360.0)) / 360.0;
            self.wedge_at(position)
                .map(|wedge| wedge.color)
                .unwrap_or(WHITE)
                .to_pixel()
        })
    }

    /// Rasterizes the chart and encodes it as PNG in memory.
    pub fn encode_png(&self, layout: &ChartLayout) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(self.rasterize(layout))
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(bytes)
    }
}
