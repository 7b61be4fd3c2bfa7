//! Errors raised while composing a report.

use std::fmt;

/// Errors that can occur while rendering a report to PDF bytes.
#[derive(Debug)]
pub enum ReportError {
    /// No usable font family could be loaded.
    FontLoad(genpdf::error::Error),
    /// The chart raster could not be encoded.
    Chart(image::ImageError),
    /// The layout engine failed to build or render the document.
    Render(genpdf::error::Error),
}

impl ReportError {
    /// Whether the error comes from the machine setup rather than the input.
    pub fn is_font_error(&self) -> bool {
        matches!(self, Self::FontLoad(_))
    }
}

impl From<image::ImageError> for ReportError {
    fn from(err: image::ImageError) -> Self {
        Self::Chart(err)
    }
}

impl From<genpdf::error::Error> for ReportError {
    fn from(err: genpdf::error::Error) -> Self {
        Self::Render(err)
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontLoad(err) => write!(f, "Failed to load fonts: {err}"),
            Self::Chart(err) => write!(f, "Failed to encode chart image: {err}"),
            Self::Render(err) => write!(f, "Failed to render PDF: {err}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FontLoad(err) | Self::Render(err) => Some(err),
            Self::Chart(err) => Some(err),
        }
    }
}
