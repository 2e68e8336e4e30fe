//! Raw spreadsheet object graph as read from the package.
//!
//! Nothing here is resolved: colors are still references, styles are still
//! indices into the stylesheet tables.

use std::collections::HashMap;

use super::{ColorRef, Theme};

/// A parsed workbook before style resolution.
#[derive(Debug, Clone, Default)]
pub struct RawWorkbook {
    pub sheets: Vec<RawSheet>,
    pub shared_strings: Vec<SharedString>,
    pub stylesheet: StyleSheet,
    pub theme: Option<Theme>,
    /// Dates count from 1904-01-01 instead of 1899-12-30.
    pub date1904: bool,
}

/// One worksheet in workbook order.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Rows in document order; indices may be sparse or unordered.
    pub rows: Vec<RawRow>,
    /// `mergeCell@ref` values, unvalidated.
    pub merge_refs: Vec<String>,
    pub tables: Vec<RawTable>,
}

/// A `<col>` span. `min`/`max` are 1-based and inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnDef {
    pub min: u32,
    pub max: u32,
    pub width: Option<f64>,
    pub custom_width: bool,
    pub hidden: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RawRow {
    /// 0-based row index.
    pub index: u32,
    /// Height in points, meaningful only with `custom_height`.
    pub height: Option<f64>,
    pub custom_height: bool,
    pub hidden: bool,
    pub cells: Vec<RawCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub row: u32,
    pub col: u32,
    pub style_id: Option<u32>,
    pub content: CellContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Empty,
    Number(f64),
    /// Index into the shared string table.
    SharedString(usize),
    InlineString(SharedString),
    /// Formula string result (`t="str"`).
    Text(String),
    Bool(bool),
    Error(String),
}

/// A shared-string or inline-string item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedString {
    /// Concatenated plain text.
    pub text: String,
    /// Formatted runs; empty for plain `<t>` items.
    pub runs: Vec<RawRun>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRun {
    pub text: String,
    pub props: Option<RawFont>,
}

/// Font / run character properties, shared by `styles.xml` fonts, rich text
/// `rPr` and word-processing run properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFont {
    pub name: Option<String>,
    /// `major` / `minor` theme font scheme.
    pub scheme: Option<String>,
    pub size: Option<f64>,
    pub color: Option<ColorRef>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
    pub vert_align: Option<String>,
}

impl RawFont {
    /// Properties set in `other` replace ours.
    pub fn overlay(&mut self, other: &Self) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field.clone_from(&other.$field);
                })*
            };
        }
        take!(name, scheme, size, color, bold, italic, underline, strike, vert_align);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFill {
    pub pattern_type: Option<String>,
    pub fg_color: Option<ColorRef>,
    pub bg_color: Option<ColorRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBorder {
    pub left_style: Option<String>,
    pub left_color: Option<ColorRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAlignment {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap_text: Option<bool>,
    pub indent: Option<u32>,
}

/// A `cellXfs/xf` record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellXf {
    pub num_fmt_id: u32,
    pub font_id: Option<u32>,
    pub fill_id: Option<u32>,
    pub border_id: Option<u32>,
    /// `None` when the xf carries no `<alignment>` element.
    pub alignment: Option<RawAlignment>,
}

/// Differential format; only the fill is used (table style elements).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dxf {
    pub fill: Option<RawFill>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStyleElement {
    /// `headerRow`, `firstRowStripe`, `secondRowStripe`, ...
    pub kind: String,
    pub dxf_id: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStyleDef {
    pub name: String,
    pub elements: Vec<TableStyleElement>,
}

/// Shared style tables from `xl/styles.xml`.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    pub num_fmts: HashMap<u32, String>,
    pub fonts: Vec<RawFont>,
    pub fills: Vec<RawFill>,
    pub borders: Vec<RawBorder>,
    pub cell_xfs: Vec<CellXf>,
    pub dxfs: Vec<Dxf>,
    pub table_styles: Vec<TableStyleDef>,
    /// `tableStyles@defaultTableStyle`, present when the workbook relies on a
    /// built-in table style.
    pub default_table_style: Option<String>,
}

impl StyleSheet {
    pub fn cell_xf(&self, id: u32) -> Option<&CellXf> {
        self.cell_xfs.get(usize::try_from(id).ok()?)
    }

    pub fn font(&self, id: u32) -> Option<&RawFont> {
        self.fonts.get(usize::try_from(id).ok()?)
    }

    pub fn fill(&self, id: u32) -> Option<&RawFill> {
        self.fills.get(usize::try_from(id).ok()?)
    }

    pub fn border(&self, id: u32) -> Option<&RawBorder> {
        self.borders.get(usize::try_from(id).ok()?)
    }

    pub fn dxf(&self, id: u32) -> Option<&Dxf> {
        self.dxfs.get(usize::try_from(id).ok()?)
    }

    pub fn table_style(&self, name: &str) -> Option<&TableStyleDef> {
        self.table_styles.iter().find(|s| s.name == name)
    }
}

/// A table part (`xl/tables/tableN.xml`) attached to a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Range such as `A1:D10`.
    pub reference: String,
    pub style_name: Option<String>,
    pub show_row_stripes: bool,
    pub data_dxf_id: Option<u32>,
}
