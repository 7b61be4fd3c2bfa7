//! Core entry point for the recmap_report crate.
//!
//! Renders the RecMap infographic report (status table and pie chart) as PDF
//! bytes.  Start with [`report::ReportCompositor`] or the [`generate`]
//! shortcut.

pub mod builder;
pub mod chart;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod model;
pub mod report;
pub mod theme;

pub use error::ReportError;
pub use model::{ReportInput, StatusCount};
pub use report::{generate, ReportCompositor, ReportOptions};
