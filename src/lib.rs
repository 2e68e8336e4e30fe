//! officeview - office documents as compact HTML
//!
//! Resolves the layered styling of XLSX workbooks and DOCX documents into
//! flat style records, then renders them as HTML with deduplicated CSS:
//! - Theme colors with tint, indexed and ARGB colors
//! - Cell styles, table header/stripe banding, merged cells
//! - Sparse sheets materialized into dense grids
//! - Number formats (General, built-ins, custom codes, dates)
//! - Paragraphs, headings, runs and tables in document order
//!
//! # Usage
//!
//! ```no_run
//! use officeview::{xlsx_to_html, RenderOptions};
//!
//! let file = std::fs::File::open("report.xlsx")?;
//! let html = xlsx_to_html(file, &RenderOptions::default())?;
//! # Ok::<(), officeview::ConvertError>(())
//! ```

// Package reading
pub mod cell_ref;
pub mod error;
pub mod parser;
pub mod rich_text;
pub mod xml_helpers;

// Resolution
pub mod banding;
pub mod color;
pub mod document_styles;
pub mod geometry;
pub mod numfmt;
pub mod styles;

// Model and output
pub mod builder;
pub mod dedup;
pub mod render;
pub mod types;

use std::io::{Read, Seek};

pub use error::{ConvertError, Result};
pub use render::RenderOptions;
pub use types::*;

/// Convert an XLSX package to an HTML document.
///
/// # Errors
/// Returns an error if the container or a required part (workbook,
/// worksheet) cannot be read. Problems in optional parts only degrade the
/// output.
pub fn xlsx_to_html<R: Read + Seek>(reader: R, options: &RenderOptions) -> Result<String> {
    let raw = parser::parse_workbook(reader)?;
    let model = builder::build_workbook(&raw);
    Ok(render::render_workbook(&model, *options))
}

/// Convert a DOCX package to an HTML document.
///
/// # Errors
/// Returns an error if the container or the main document part cannot be
/// read.
pub fn docx_to_html<R: Read + Seek>(reader: R, options: &RenderOptions) -> Result<String> {
    let raw = parser::parse_document(reader)?;
    let model = builder::build_document(&raw);
    Ok(render::render_document(&model, *options))
}

/// Get the library version
#[must_use]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
