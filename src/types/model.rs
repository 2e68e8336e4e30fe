//! Render-ready intermediate representation.
//!
//! Built once by [`crate::builder`], then read by the deduplicator and the
//! HTML renderer. Serializes to the `--json` dump of the CLI.

use serde::Serialize;

use super::{DocProperties, ParagraphStyle, RunStyle, StyleRecord};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookModel {
    pub sheets: Vec<SheetModel>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetModel {
    pub name: String,
    /// Pixel width per column; length is the sheet's column count.
    pub col_widths: Vec<f64>,
    pub col_hidden: Vec<bool>,
    /// Dense, indexed by absolute 0-based row number.
    pub rows: Vec<RowModel>,
}

impl SheetModel {
    pub fn col_count(&self) -> usize {
        self.col_widths.len()
    }

    pub fn total_width(&self) -> f64 {
        self.col_widths.iter().sum()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowModel {
    pub height_px: f64,
    pub hidden: bool,
    /// Exactly `col_count` slots.
    pub cells: Vec<CellSlot>,
}

/// One grid position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CellSlot {
    /// No physical cell.
    Empty,
    /// Inside a merge, rendered by the master.
    #[serde(rename_all = "camelCase")]
    Covered { master_row: u32, master_col: u32 },
    Cell(RenderCell),
}

impl CellSlot {
    pub const fn as_cell(&self) -> Option<&RenderCell> {
        match self {
            Self::Cell(cell) => Some(cell),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderCell {
    /// A1-style reference.
    pub reference: String,
    /// Formatted text; empty when `runs` is used.
    pub value: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<RenderRun>,
    pub style: StyleRecord,
    pub col_span: u32,
    pub row_span: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRun {
    pub text: String,
    pub style: RunStyle,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentModel {
    pub properties: DocProperties,
    /// Document-wide run defaults (`rPrDefault`).
    pub default_run_style: RunStyle,
    pub blocks: Vec<Block>,
}

/// A top-level body element; order matches the source body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "block", rename_all = "camelCase")]
pub enum Block {
    Paragraph(RenderParagraph),
    Table(RenderTable),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderParagraph {
    pub runs: Vec<RenderRun>,
    pub style: ParagraphStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTable {
    pub rows: Vec<RenderTableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTableRow {
    pub cells: Vec<RenderTableCell>,
    /// `None` means auto height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_px: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTableCell {
    pub paragraphs: Vec<RenderParagraph>,
    pub col_span: u32,
    pub row_span: u32,
    /// `None` means auto width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_px: Option<f64>,
    /// Background and vertical alignment only.
    pub style: StyleRecord,
}
