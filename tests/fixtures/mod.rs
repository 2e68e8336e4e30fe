//! Test fixtures for generating valid XLSX and DOCX files in memory.
//!
//! # Example
//!
//! ```rust
//! use fixtures::{SheetBuilder, StyleBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Sheet1")
//!             .cell("A1", "Hello", Some(StyleBuilder::new().bold()))
//!             .merge("A1:B2"),
//!     )
//!     .build();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Colors
// ============================================================================

/// A color as written into `styles.xml` or `sharedStrings.xml`.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// `rgb="..."`, written verbatim (6 or 8 digits).
    Rgb(String),
    /// `theme="n"` with an optional `tint`.
    Theme(u32, Option<f64>),
    /// `indexed="n"`.
    Indexed(u32),
}

impl Color {
    pub fn rgb(value: &str) -> Self {
        Self::Rgb(value.to_string())
    }

    fn attrs(&self) -> String {
        match self {
            Self::Rgb(v) => format!(r#"rgb="{v}""#),
            Self::Theme(i, Some(t)) => format!(r#"theme="{i}" tint="{t}""#),
            Self::Theme(i, None) => format!(r#"theme="{i}""#),
            Self::Indexed(i) => format!(r#"indexed="{i}""#),
        }
    }
}

// ============================================================================
// Style Builder
// ============================================================================

/// Builder for creating cell styles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBuilder {
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub font_color: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,

    pub bg_color: Option<Color>,
    pub pattern_type: Option<String>,
    pub border_color: Option<Color>,

    pub align_horizontal: Option<String>,
    pub align_vertical: Option<String>,
    pub wrap_text: bool,
    pub indent: Option<u32>,

    pub number_format: Option<String>,
}

impl StyleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn font_name(mut self, name: &str) -> Self {
        self.font_name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    #[must_use]
    pub fn font_color(mut self, color: Color) -> Self {
        self.font_color = Some(color);
        self
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    #[must_use]
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    #[must_use]
    pub fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    /// Solid fill with the given foreground color.
    #[must_use]
    pub fn bg_color(mut self, color: Color) -> Self {
        self.bg_color = Some(color);
        if self.pattern_type.is_none() {
            self.pattern_type = Some("solid".to_string());
        }
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern_type: &str) -> Self {
        self.pattern_type = Some(pattern_type.to_string());
        self
    }

    /// Thin border on every side in the given color.
    #[must_use]
    pub fn border_color(mut self, color: Color) -> Self {
        self.border_color = Some(color);
        self
    }

    #[must_use]
    pub fn align_horizontal(mut self, align: &str) -> Self {
        self.align_horizontal = Some(align.to_string());
        self
    }

    #[must_use]
    pub fn align_vertical(mut self, align: &str) -> Self {
        self.align_vertical = Some(align.to_string());
        self
    }

    #[must_use]
    pub fn wrap_text(mut self) -> Self {
        self.wrap_text = true;
        self
    }

    #[must_use]
    pub fn indent(mut self, level: u32) -> Self {
        self.indent = Some(level);
        self
    }

    #[must_use]
    pub fn number_format(mut self, format: &str) -> Self {
        self.number_format = Some(format.to_string());
        self
    }

    fn has_alignment(&self) -> bool {
        self.align_horizontal.is_some()
            || self.align_vertical.is_some()
            || self.wrap_text
            || self.indent.is_some()
    }
}

// ============================================================================
// Cell Value
// ============================================================================

/// A formatted run inside a rich shared string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub font_size: Option<f64>,
    pub color: Option<Color>,
    pub font_name: Option<String>,
}

impl RichRun {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    #[must_use]
    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }
}

/// Represents a cell value that can be added to a sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Shared string.
    String(String),
    /// Shared string with formatted runs.
    Rich(Vec<RichRun>),
    Number(f64),
    Boolean(bool),
    /// An error value (e.g., "#DIV/0!").
    Error(String),
    /// An inline string (not shared).
    InlineString(String),
    /// An empty cell (style only).
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<Vec<RichRun>> for CellValue {
    fn from(runs: Vec<RichRun>) -> Self {
        CellValue::Rich(runs)
    }
}

// ============================================================================
// Table Builder
// ============================================================================

/// A table part attached to a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBuilder {
    pub range: String,
    pub style_name: Option<String>,
    pub show_row_stripes: bool,
    /// Fill of the table's data-area differential format.
    pub data_fill: Option<String>,
}

impl TableBuilder {
    pub fn new(range: &str) -> Self {
        Self {
            range: range.to_string(),
            style_name: None,
            show_row_stripes: true,
            data_fill: None,
        }
    }

    #[must_use]
    pub fn style(mut self, name: &str) -> Self {
        self.style_name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn row_stripes(mut self, show: bool) -> Self {
        self.show_row_stripes = show;
        self
    }

    #[must_use]
    pub fn data_fill(mut self, rgb: &str) -> Self {
        self.data_fill = Some(rgb.to_string());
        self
    }
}

/// A custom table style definition in `styles.xml`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStyleDef {
    pub name: String,
    pub header: Option<String>,
    pub stripe1: Option<String>,
    pub stripe2: Option<String>,
    pub stripe_size: Option<u32>,
}

impl TableStyleDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            header: None,
            stripe1: None,
            stripe2: None,
            stripe_size: None,
        }
    }

    #[must_use]
    pub fn header(mut self, rgb: &str) -> Self {
        self.header = Some(rgb.to_string());
        self
    }

    #[must_use]
    pub fn stripe1(mut self, rgb: &str) -> Self {
        self.stripe1 = Some(rgb.to_string());
        self
    }

    #[must_use]
    pub fn stripe2(mut self, rgb: &str) -> Self {
        self.stripe2 = Some(rgb.to_string());
        self
    }

    #[must_use]
    pub fn stripe_size(mut self, size: u32) -> Self {
        self.stripe_size = Some(size);
        self
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<StyleBuilder>,
}

#[derive(Debug, Clone)]
pub struct ColumnWidth {
    pub min: u32,
    pub max: u32,
    pub width: Option<f64>,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct RowHeight {
    /// 1-based, as in the `r` attribute.
    pub row: u32,
    pub height: Option<f64>,
    pub hidden: bool,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub col_widths: Vec<ColumnWidth>,
    pub row_heights: Vec<RowHeight>,
    pub tables: Vec<TableBuilder>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a cell with a value and optional style.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    /// Add an empty cell with only a style.
    #[must_use]
    pub fn styled_cell(self, cell_ref: &str, style: StyleBuilder) -> Self {
        self.cell(cell_ref, CellValue::Empty, Some(style))
    }

    /// Add a merge range (e.g., "A1:B2"). The range is written verbatim.
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    /// Custom width in characters for 1-based columns `min..=max`.
    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push(ColumnWidth {
            min,
            max,
            width: Some(width),
            hidden: false,
        });
        self
    }

    #[must_use]
    pub fn hide_cols(mut self, min: u32, max: u32) -> Self {
        self.col_widths.push(ColumnWidth {
            min,
            max,
            width: None,
            hidden: true,
        });
        self
    }

    /// Custom height in points for a 1-based row.
    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push(RowHeight {
            row,
            height: Some(height),
            hidden: false,
        });
        self
    }

    #[must_use]
    pub fn hide_row(mut self, row: u32) -> Self {
        self.row_heights.push(RowHeight {
            row,
            height: None,
            hidden: true,
        });
        self
    }

    #[must_use]
    pub fn table(mut self, table: TableBuilder) -> Self {
        self.tables.push(table);
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for complete XLSX packages.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    theme_colors: Option<Vec<String>>,
    table_styles: Vec<TableStyleDef>,
    default_table_style: Option<String>,
    date1904: bool,
    omit_styles: bool,
    omit_theme: bool,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Replace the 12 theme colors (dk1, lt1, dk2, lt2, accent1-6, hlink, folHlink).
    #[must_use]
    pub fn theme_colors(mut self, colors: &[&str]) -> Self {
        self.theme_colors = Some(colors.iter().map(|c| (*c).to_string()).collect());
        self
    }

    #[must_use]
    pub fn table_style(mut self, style: TableStyleDef) -> Self {
        self.table_styles.push(style);
        self
    }

    /// Sets `tableStyles@defaultTableStyle`.
    #[must_use]
    pub fn default_table_style(mut self, name: &str) -> Self {
        self.default_table_style = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Leave `xl/styles.xml` out of the package.
    #[must_use]
    pub fn without_styles(mut self) -> Self {
        self.omit_styles = true;
        self
    }

    /// Leave the theme part out of the package.
    #[must_use]
    pub fn without_theme(mut self) -> Self {
        self.omit_theme = true;
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut styles = StylesCollector::new();
        let mut shared: Vec<CellValue> = Vec::new();

        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let Some(ref style) = cell.style {
                    styles.add_style(style);
                }
                if matches!(cell.value, CellValue::String(_) | CellValue::Rich(_))
                    && !shared.contains(&cell.value)
                {
                    shared.push(cell.value.clone());
                }
            }
        }

        // Differential formats: table style elements first, then table data fills.
        let mut dxfs: Vec<String> = Vec::new();
        let mut style_elements: Vec<Vec<(&str, usize, Option<u32>)>> = Vec::new();
        for style in &self.table_styles {
            let mut elements = Vec::new();
            for (kind, fill, size) in [
                ("headerRow", &style.header, None),
                ("firstRowStripe", &style.stripe1, style.stripe_size),
                ("secondRowStripe", &style.stripe2, None),
            ] {
                if let Some(rgb) = fill {
                    dxfs.push(format!(
                        r#"<dxf><fill><patternFill patternType="solid"><bgColor rgb="FF{rgb}"/></patternFill></fill></dxf>"#
                    ));
                    elements.push((kind, dxfs.len() - 1, size));
                }
            }
            style_elements.push(elements);
        }

        let mut table_parts: Vec<Vec<(usize, Option<usize>)>> = Vec::new();
        let mut table_count = 0usize;
        for sheet in &self.sheets {
            let mut parts = Vec::new();
            for table in &sheet.tables {
                table_count += 1;
                let data_dxf = table.data_fill.as_ref().map(|rgb| {
                    dxfs.push(format!(
                        r#"<dxf><fill><patternFill patternType="solid"><fgColor rgb="FF{rgb}"/></patternFill></fill></dxf>"#
                    ));
                    dxfs.len() - 1
                });
                parts.push((table_count, data_dxf));
            }
            table_parts.push(parts);
        }

        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, path: &str, body: &str| {
            zip.start_file(path, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        put(&mut zip, "[Content_Types].xml", &generate_content_types(self.sheets.len(), table_count));
        put(&mut zip, "_rels/.rels", &generate_rels("xl/workbook.xml"));
        put(
            &mut zip,
            "xl/_rels/workbook.xml.rels",
            &generate_workbook_rels(self.sheets.len(), !shared.is_empty()),
        );
        put(&mut zip, "xl/workbook.xml", &generate_workbook(&self.sheets, self.date1904));
        if !self.omit_styles {
            put(
                &mut zip,
                "xl/styles.xml",
                &styles.generate_styles_xml(
                    &dxfs,
                    &self.table_styles,
                    &style_elements,
                    self.default_table_style.as_deref(),
                ),
            );
        }
        if !shared.is_empty() {
            put(&mut zip, "xl/sharedStrings.xml", &generate_shared_strings(&shared));
        }
        if !self.omit_theme {
            put(&mut zip, "xl/theme/theme1.xml", &generate_theme(self.theme_colors.as_deref()));
        }

        for (i, sheet) in self.sheets.iter().enumerate() {
            let parts = &table_parts[i];
            put(
                &mut zip,
                &format!("xl/worksheets/sheet{}.xml", i + 1),
                &generate_sheet_xml(sheet, &shared, &styles, parts.len()),
            );
            if !parts.is_empty() {
                put(
                    &mut zip,
                    &format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1),
                    &generate_sheet_rels(parts),
                );
            }
            for (table, (id, data_dxf)) in sheet.tables.iter().zip(parts) {
                put(
                    &mut zip,
                    &format!("xl/tables/table{id}.xml"),
                    &generate_table(table, *id, *data_dxf),
                );
            }
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

// ============================================================================
// Styles Collector
// ============================================================================

/// Collects and deduplicates styles for the XLSX file. Index 0 of every
/// table is the workbook default.
#[derive(Debug)]
struct StylesCollector {
    fonts: Vec<String>,
    fills: Vec<String>,
    borders: Vec<String>,
    num_fmts: Vec<(u32, String)>,
    cell_xfs: Vec<String>,
    style_map: Vec<(StyleBuilder, u32)>,
}

impl StylesCollector {
    fn new() -> Self {
        Self {
            fonts: vec![r#"<font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>"#.to_string()],
            fills: vec![
                r#"<fill><patternFill patternType="none"/></fill>"#.to_string(),
                r#"<fill><patternFill patternType="gray125"/></fill>"#.to_string(),
            ],
            borders: vec!["<border><left/><right/><top/><bottom/><diagonal/></border>".to_string()],
            num_fmts: Vec::new(),
            cell_xfs: vec![r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#.to_string()],
            style_map: Vec::new(),
        }
    }

    fn intern(list: &mut Vec<String>, xml: String) -> usize {
        if let Some(pos) = list.iter().position(|x| *x == xml) {
            pos
        } else {
            list.push(xml);
            list.len() - 1
        }
    }

    fn add_style(&mut self, style: &StyleBuilder) -> u32 {
        if let Some((_, id)) = self.style_map.iter().find(|(s, _)| s == style) {
            return *id;
        }

        let mut font = String::from("<font>");
        if style.bold {
            font.push_str("<b/>");
        }
        if style.italic {
            font.push_str("<i/>");
        }
        if style.underline {
            font.push_str("<u/>");
        }
        if style.strikethrough {
            font.push_str("<strike/>");
        }
        let _ = write!(font, r#"<sz val="{}"/>"#, style.font_size.unwrap_or(11.0));
        if let Some(ref color) = style.font_color {
            let _ = write!(font, "<color {}/>", color.attrs());
        }
        let _ = write!(
            font,
            r#"<name val="{}"/></font>"#,
            escape_xml(style.font_name.as_deref().unwrap_or("Calibri"))
        );
        let font_id = Self::intern(&mut self.fonts, font);

        let fill_id = match (&style.pattern_type, &style.bg_color) {
            (Some(pattern), Some(color)) => Self::intern(
                &mut self.fills,
                format!(
                    r#"<fill><patternFill patternType="{pattern}"><fgColor {}/><bgColor indexed="64"/></patternFill></fill>"#,
                    color.attrs()
                ),
            ),
            (Some(pattern), None) => Self::intern(
                &mut self.fills,
                format!(r#"<fill><patternFill patternType="{pattern}"/></fill>"#),
            ),
            _ => 0,
        };

        let border_id = style.border_color.as_ref().map_or(0, |color| {
            let side = |name: &str| format!(r#"<{name} style="thin"><color {}/></{name}>"#, color.attrs());
            Self::intern(
                &mut self.borders,
                format!(
                    "<border>{}{}{}{}<diagonal/></border>",
                    side("left"),
                    side("right"),
                    side("top"),
                    side("bottom")
                ),
            )
        });

        let num_fmt_id = style.number_format.as_ref().map_or(0, |code| {
            if let Some(id) = builtin_format_id(code) {
                return id;
            }
            if let Some((id, _)) = self.num_fmts.iter().find(|(_, c)| c == code) {
                return *id;
            }
            let id = 164 + u32::try_from(self.num_fmts.len()).unwrap();
            self.num_fmts.push((id, code.clone()));
            id
        });

        let mut xf = format!(
            r#"<xf numFmtId="{num_fmt_id}" fontId="{font_id}" fillId="{fill_id}" borderId="{border_id}" xfId="0""#
        );
        if style.has_alignment() {
            xf.push_str(r#" applyAlignment="1"><alignment"#);
            if let Some(ref h) = style.align_horizontal {
                let _ = write!(xf, r#" horizontal="{h}""#);
            }
            if let Some(ref v) = style.align_vertical {
                let _ = write!(xf, r#" vertical="{v}""#);
            }
            if style.wrap_text {
                xf.push_str(r#" wrapText="1""#);
            }
            if let Some(indent) = style.indent {
                let _ = write!(xf, r#" indent="{indent}""#);
            }
            xf.push_str("/></xf>");
        } else {
            xf.push_str("/>");
        }
        self.cell_xfs.push(xf);
        let id = u32::try_from(self.cell_xfs.len() - 1).unwrap();
        self.style_map.push((style.clone(), id));
        id
    }

    fn style_id(&self, style: &StyleBuilder) -> Option<u32> {
        self.style_map.iter().find(|(s, _)| s == style).map(|(_, id)| *id)
    }

    fn generate_styles_xml(
        &self,
        dxfs: &[String],
        table_styles: &[TableStyleDef],
        style_elements: &[Vec<(&str, usize, Option<u32>)>],
        default_table_style: Option<&str>,
    ) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        if !self.num_fmts.is_empty() {
            let _ = write!(xml, r#"<numFmts count="{}">"#, self.num_fmts.len());
            for (id, code) in &self.num_fmts {
                let _ = write!(xml, r#"<numFmt numFmtId="{id}" formatCode="{}"/>"#, escape_xml(code));
            }
            xml.push_str("</numFmts>");
        }
        let section = |xml: &mut String, tag: &str, items: &[String]| {
            let _ = write!(xml, r#"<{tag} count="{}">{}</{tag}>"#, items.len(), items.concat());
        };
        section(&mut xml, "fonts", &self.fonts);
        section(&mut xml, "fills", &self.fills);
        section(&mut xml, "borders", &self.borders);
        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
        section(&mut xml, "cellXfs", &self.cell_xfs);
        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        section(&mut xml, "dxfs", dxfs);

        let _ = write!(xml, r#"<tableStyles count="{}""#, table_styles.len());
        if let Some(name) = default_table_style {
            let _ = write!(xml, r#" defaultTableStyle="{name}""#);
        }
        xml.push('>');
        for (style, elements) in table_styles.iter().zip(style_elements) {
            let _ = write!(
                xml,
                r#"<tableStyle name="{}" pivot="0" count="{}">"#,
                escape_xml(&style.name),
                elements.len()
            );
            for (kind, dxf, size) in elements {
                let _ = write!(xml, r#"<tableStyleElement type="{kind}" dxfId="{dxf}""#);
                if let Some(size) = size {
                    let _ = write!(xml, r#" size="{size}""#);
                }
                xml.push_str("/>");
            }
            xml.push_str("</tableStyle>");
        }
        xml.push_str("</tableStyles></styleSheet>");
        xml
    }
}

fn builtin_format_id(code: &str) -> Option<u32> {
    match code {
        "General" => Some(0),
        "0" => Some(1),
        "0.00" => Some(2),
        "#,##0" => Some(3),
        "#,##0.00" => Some(4),
        "0%" => Some(9),
        "0.00%" => Some(10),
        "mm-dd-yy" => Some(14),
        "d-mmm-yy" => Some(15),
        "h:mm" => Some(20),
        "m/d/yy h:mm" => Some(22),
        _ => None,
    }
}

// ============================================================================
// XLSX Part Generators
// ============================================================================

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn generate_content_types(sheet_count: usize, table_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        );
    }
    for i in 1..=table_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/xl/tables/table{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml"/>"#
        );
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels(main_part: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="{main_part}"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#
    )
}

fn generate_workbook_rels(sheet_count: usize, has_shared_strings: bool) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        );
    }
    let next = sheet_count + 1;
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{next}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
    );
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>"#,
        next + 1
    );
    if has_shared_strings {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
            next + 2
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder], date1904: bool) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    if date1904 {
        xml.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        );
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn rich_run_xml(run: &RichRun) -> String {
    let mut xml = String::from("<r>");
    let has_props = run.bold || run.italic || run.font_size.is_some() || run.color.is_some() || run.font_name.is_some();
    if has_props {
        xml.push_str("<rPr>");
        if run.bold {
            xml.push_str("<b/>");
        }
        if run.italic {
            xml.push_str("<i/>");
        }
        if let Some(size) = run.font_size {
            let _ = write!(xml, r#"<sz val="{size}"/>"#);
        }
        if let Some(ref color) = run.color {
            let _ = write!(xml, "<color {}/>", color.attrs());
        }
        if let Some(ref name) = run.font_name {
            let _ = write!(xml, r#"<rFont val="{}"/>"#, escape_xml(name));
        }
        xml.push_str("</rPr>");
    }
    let _ = write!(xml, r#"<t xml:space="preserve">{}</t></r>"#, escape_xml(&run.text));
    xml
}

fn generate_shared_strings(strings: &[CellValue]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for item in strings {
        match item {
            CellValue::String(s) => {
                let _ = write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(s));
            }
            CellValue::Rich(runs) => {
                xml.push_str("<si>");
                for run in runs {
                    xml.push_str(&rich_run_xml(run));
                }
                xml.push_str("</si>");
            }
            _ => {}
        }
    }
    xml.push_str("</sst>");
    xml
}

/// Office 2013+ default palette.
pub const DEFAULT_THEME_COLORS: [&str; 12] = [
    "000000", "FFFFFF", "44546A", "E7E6E6", "4472C4", "ED7D31", "A5A5A5", "FFC000", "5B9BD5",
    "70AD47", "0563C1", "954F72",
];

fn generate_theme(colors: Option<&[String]>) -> String {
    let names = [
        "dk1", "lt1", "dk2", "lt2", "accent1", "accent2", "accent3", "accent4", "accent5",
        "accent6", "hlink", "folHlink",
    ];
    let mut scheme = String::new();
    for (i, name) in names.iter().enumerate() {
        let color = colors
            .and_then(|c| c.get(i).cloned())
            .unwrap_or_else(|| DEFAULT_THEME_COLORS[i].to_string());
        if i < 2 {
            let sys = if i == 0 { "windowText" } else { "window" };
            let _ = write!(scheme, r#"<a:{name}><a:sysClr val="{sys}" lastClr="{color}"/></a:{name}>"#);
        } else {
            let _ = write!(scheme, r#"<a:{name}><a:srgbClr val="{color}"/></a:{name}>"#);
        }
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">
<a:themeElements>
<a:clrScheme name="Office">{scheme}</a:clrScheme>
<a:fontScheme name="Office">
<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>
<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>
</a:fontScheme>
</a:themeElements>
</a:theme>"#
    )
}

/// Parse an A1 reference into (0-based col, 1-based row).
fn parse_cell_ref(cell_ref: &str) -> (u32, u32) {
    let letters: String = cell_ref.chars().take_while(char::is_ascii_alphabetic).collect();
    let digits: String = cell_ref.chars().skip_while(char::is_ascii_alphabetic).collect();
    let col = letters
        .bytes()
        .fold(0u32, |acc, b| acc * 26 + u32::from(b.to_ascii_uppercase() - b'A' + 1))
        - 1;
    (col, digits.parse().unwrap())
}

fn generate_sheet_xml(
    sheet: &SheetBuilder,
    shared: &[CellValue],
    styles: &StylesCollector,
    table_count: usize,
) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for col in &sheet.col_widths {
            let _ = write!(xml, r#"<col min="{}" max="{}""#, col.min, col.max);
            match col.width {
                Some(w) => {
                    let _ = write!(xml, r#" width="{w}" customWidth="1""#);
                }
                None => xml.push_str(r#" width="9.140625""#),
            }
            if col.hidden {
                xml.push_str(r#" hidden="1""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</cols>");
    }

    // Rows in ascending order, cells in ascending column order.
    let mut rows: Vec<u32> = sheet
        .cells
        .iter()
        .map(|c| parse_cell_ref(&c.cell_ref).1)
        .chain(sheet.row_heights.iter().map(|r| r.row))
        .collect();
    rows.sort_unstable();
    rows.dedup();

    xml.push_str("<sheetData>");
    for row in rows {
        let _ = write!(xml, r#"<row r="{row}""#);
        for attrs in sheet.row_heights.iter().filter(|r| r.row == row) {
            if let Some(h) = attrs.height {
                let _ = write!(xml, r#" ht="{h}" customHeight="1""#);
            }
            if attrs.hidden {
                xml.push_str(r#" hidden="1""#);
            }
        }
        xml.push('>');

        let mut cells: Vec<&CellEntry> = sheet
            .cells
            .iter()
            .filter(|c| parse_cell_ref(&c.cell_ref).1 == row)
            .collect();
        cells.sort_by_key(|c| parse_cell_ref(&c.cell_ref).0);

        for cell in cells {
            let style = cell
                .style
                .as_ref()
                .and_then(|s| styles.style_id(s))
                .map(|id| format!(r#" s="{id}""#))
                .unwrap_or_default();
            let r = &cell.cell_ref;
            match &cell.value {
                CellValue::String(_) | CellValue::Rich(_) => {
                    let idx = shared.iter().position(|s| *s == cell.value).unwrap();
                    let _ = write!(xml, r#"<c r="{r}"{style} t="s"><v>{idx}</v></c>"#);
                }
                CellValue::Number(n) => {
                    let _ = write!(xml, r#"<c r="{r}"{style}><v>{n}</v></c>"#);
                }
                CellValue::Boolean(b) => {
                    let _ = write!(xml, r#"<c r="{r}"{style} t="b"><v>{}</v></c>"#, u8::from(*b));
                }
                CellValue::Error(e) => {
                    let _ = write!(xml, r#"<c r="{r}"{style} t="e"><v>{}</v></c>"#, escape_xml(e));
                }
                CellValue::InlineString(s) => {
                    let _ = write!(
                        xml,
                        r#"<c r="{r}"{style} t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    );
                }
                CellValue::Empty => {
                    let _ = write!(xml, r#"<c r="{r}"{style}/>"#);
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        let _ = write!(xml, r#"<mergeCells count="{}">"#, sheet.merges.len());
        for range in &sheet.merges {
            let _ = write!(xml, r#"<mergeCell ref="{}"/>"#, escape_xml(range));
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str(r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#);

    if table_count > 0 {
        let _ = write!(xml, r#"<tableParts count="{table_count}">"#);
        for i in 1..=table_count {
            let _ = write!(xml, r#"<tablePart r:id="rId{i}"/>"#);
        }
        xml.push_str("</tableParts>");
    }

    xml.push_str("</worksheet>");
    xml
}

fn generate_sheet_rels(parts: &[(usize, Option<usize>)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (i, (id, _)) in parts.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/table" Target="../tables/table{id}.xml"/>"#,
            i + 1
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn generate_table(table: &TableBuilder, id: usize, data_dxf: Option<usize>) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<table xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" id="{id}" name="Table{id}" displayName="Table{id}" ref="{}""#,
        table.range
    );
    if let Some(dxf) = data_dxf {
        let _ = write!(xml, r#" dataDxfId="{dxf}""#);
    }
    let _ = write!(
        xml,
        r#"><autoFilter ref="{}"/><tableColumns count="1"><tableColumn id="1" name="Column1"/></tableColumns>"#,
        table.range
    );
    let _ = write!(
        xml,
        r#"<tableStyleInfo name="{}" showFirstColumn="0" showLastColumn="0" showRowStripes="{}" showColumnStripes="0"/></table>"#,
        table.style_name.as_deref().map(escape_xml).unwrap_or_default(),
        u8::from(table.show_row_stripes)
    );
    xml
}

// ============================================================================
// DOCX Builders
// ============================================================================

/// A `w:r` run.
#[derive(Debug, Clone, Default)]
pub struct RunBuilder {
    pub text: String,
    pub style: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub color: Option<String>,
    pub theme_color: Option<(String, Option<String>)>,
    /// Points; written as half-points.
    pub size: Option<f64>,
    pub font: Option<String>,
    pub vert_align: Option<String>,
}

impl RunBuilder {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn style(mut self, id: &str) -> Self {
        self.style = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    #[must_use]
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    #[must_use]
    pub fn strike(mut self) -> Self {
        self.strike = true;
        self
    }

    #[must_use]
    pub fn color(mut self, rgb: &str) -> Self {
        self.color = Some(rgb.to_string());
        self
    }

    /// `w:themeColor` with an optional `w:themeTint` hex byte.
    #[must_use]
    pub fn theme_color(mut self, name: &str, tint: Option<&str>) -> Self {
        self.theme_color = Some((name.to_string(), tint.map(str::to_string)));
        self
    }

    #[must_use]
    pub fn size(mut self, points: f64) -> Self {
        self.size = Some(points);
        self
    }

    #[must_use]
    pub fn font(mut self, name: &str) -> Self {
        self.font = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn superscript(mut self) -> Self {
        self.vert_align = Some("superscript".to_string());
        self
    }

    fn xml(&self) -> String {
        let mut props = String::new();
        if let Some(ref id) = self.style {
            let _ = write!(props, r#"<w:rStyle w:val="{id}"/>"#);
        }
        if let Some(ref font) = self.font {
            let font = escape_xml(font);
            let _ = write!(props, r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}"/>"#);
        }
        if self.bold {
            props.push_str("<w:b/>");
        }
        if self.italic {
            props.push_str("<w:i/>");
        }
        if self.strike {
            props.push_str("<w:strike/>");
        }
        match (&self.color, &self.theme_color) {
            (Some(rgb), _) => {
                let _ = write!(props, r#"<w:color w:val="{rgb}"/>"#);
            }
            (None, Some((name, tint))) => {
                let _ = write!(props, r#"<w:color w:val="auto" w:themeColor="{name}""#);
                if let Some(t) = tint {
                    let _ = write!(props, r#" w:themeTint="{t}""#);
                }
                props.push_str("/>");
            }
            (None, None) => {}
        }
        if let Some(size) = self.size {
            let _ = write!(props, r#"<w:sz w:val="{}"/>"#, (size * 2.0).round());
        }
        if self.underline {
            props.push_str(r#"<w:u w:val="single"/>"#);
        }
        if let Some(ref v) = self.vert_align {
            let _ = write!(props, r#"<w:vertAlign w:val="{v}"/>"#);
        }

        let mut xml = String::from("<w:r>");
        if !props.is_empty() {
            let _ = write!(xml, "<w:rPr>{props}</w:rPr>");
        }
        for (i, line) in self.text.split('\n').enumerate() {
            if i > 0 {
                xml.push_str("<w:br/>");
            }
            let _ = write!(xml, r#"<w:t xml:space="preserve">{}</w:t>"#, escape_xml(line));
        }
        xml.push_str("</w:r>");
        xml
    }
}

/// A `w:p` paragraph.
#[derive(Debug, Clone, Default)]
pub struct ParagraphBuilder {
    pub style: Option<String>,
    pub align: Option<String>,
    pub space_before: Option<u32>,
    pub space_after: Option<u32>,
    pub indent_left: Option<u32>,
    pub runs: Vec<RunBuilder>,
}

impl ParagraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paragraph with a single plain run.
    pub fn text(text: &str) -> Self {
        Self::new().run(RunBuilder::new(text))
    }

    #[must_use]
    pub fn style(mut self, id: &str) -> Self {
        self.style = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn align(mut self, jc: &str) -> Self {
        self.align = Some(jc.to_string());
        self
    }

    /// Spacing in twips.
    #[must_use]
    pub fn spacing(mut self, before: u32, after: u32) -> Self {
        self.space_before = Some(before);
        self.space_after = Some(after);
        self
    }

    /// Left indent in twips.
    #[must_use]
    pub fn indent_left(mut self, twips: u32) -> Self {
        self.indent_left = Some(twips);
        self
    }

    #[must_use]
    pub fn run(mut self, run: RunBuilder) -> Self {
        self.runs.push(run);
        self
    }

    fn xml(&self) -> String {
        let mut props = String::new();
        if let Some(ref id) = self.style {
            let _ = write!(props, r#"<w:pStyle w:val="{id}"/>"#);
        }
        if self.space_before.is_some() || self.space_after.is_some() {
            props.push_str("<w:spacing");
            if let Some(b) = self.space_before {
                let _ = write!(props, r#" w:before="{b}""#);
            }
            if let Some(a) = self.space_after {
                let _ = write!(props, r#" w:after="{a}""#);
            }
            props.push_str("/>");
        }
        if let Some(left) = self.indent_left {
            let _ = write!(props, r#"<w:ind w:left="{left}"/>"#);
        }
        if let Some(ref jc) = self.align {
            let _ = write!(props, r#"<w:jc w:val="{jc}"/>"#);
        }

        let mut xml = String::from("<w:p>");
        if !props.is_empty() {
            let _ = write!(xml, "<w:pPr>{props}</w:pPr>");
        }
        for run in &self.runs {
            xml.push_str(&run.xml());
        }
        xml.push_str("</w:p>");
        xml
    }
}

/// A `w:tc` table cell.
#[derive(Debug, Clone)]
pub struct DocCellBuilder {
    pub paragraphs: Vec<ParagraphBuilder>,
    pub grid_span: u32,
    pub v_merge: Option<String>,
    pub shading: Option<String>,
    pub v_align: Option<String>,
    /// Twips.
    pub width: Option<u32>,
}

impl DocCellBuilder {
    pub fn new(text: &str) -> Self {
        Self {
            paragraphs: vec![ParagraphBuilder::text(text)],
            grid_span: 1,
            v_merge: None,
            shading: None,
            v_align: None,
            width: None,
        }
    }

    /// A cell holding one empty paragraph.
    pub fn empty() -> Self {
        Self {
            paragraphs: vec![ParagraphBuilder::new()],
            ..Self::new("")
        }
    }

    #[must_use]
    pub fn span(mut self, columns: u32) -> Self {
        self.grid_span = columns;
        self
    }

    #[must_use]
    pub fn merge_restart(mut self) -> Self {
        self.v_merge = Some("restart".to_string());
        self
    }

    #[must_use]
    pub fn merge_continue(mut self) -> Self {
        self.v_merge = Some(String::new());
        self
    }

    #[must_use]
    pub fn shading(mut self, fill: &str) -> Self {
        self.shading = Some(fill.to_string());
        self
    }

    #[must_use]
    pub fn v_align(mut self, value: &str) -> Self {
        self.v_align = Some(value.to_string());
        self
    }

    #[must_use]
    pub fn width(mut self, twips: u32) -> Self {
        self.width = Some(twips);
        self
    }

    fn xml(&self) -> String {
        let mut props = String::new();
        if let Some(w) = self.width {
            let _ = write!(props, r#"<w:tcW w:w="{w}" w:type="dxa"/>"#);
        }
        if self.grid_span > 1 {
            let _ = write!(props, r#"<w:gridSpan w:val="{}"/>"#, self.grid_span);
        }
        match self.v_merge.as_deref() {
            Some("") => props.push_str("<w:vMerge/>"),
            Some(v) => {
                let _ = write!(props, r#"<w:vMerge w:val="{v}"/>"#);
            }
            None => {}
        }
        if let Some(ref fill) = self.shading {
            let _ = write!(props, r#"<w:shd w:val="clear" w:color="auto" w:fill="{fill}"/>"#);
        }
        if let Some(ref v) = self.v_align {
            let _ = write!(props, r#"<w:vAlign w:val="{v}"/>"#);
        }

        let mut xml = String::from("<w:tc>");
        if !props.is_empty() {
            let _ = write!(xml, "<w:tcPr>{props}</w:tcPr>");
        }
        for p in &self.paragraphs {
            xml.push_str(&p.xml());
        }
        xml.push_str("</w:tc>");
        xml
    }
}

/// A `w:tbl` table.
#[derive(Debug, Clone, Default)]
pub struct DocTableBuilder {
    pub rows: Vec<(Option<u32>, Vec<DocCellBuilder>)>,
}

impl DocTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn row(mut self, cells: Vec<DocCellBuilder>) -> Self {
        self.rows.push((None, cells));
        self
    }

    /// Row with a `w:trHeight` in twips.
    #[must_use]
    pub fn row_with_height(mut self, height: u32, cells: Vec<DocCellBuilder>) -> Self {
        self.rows.push((Some(height), cells));
        self
    }

    fn xml(&self) -> String {
        let columns = self
            .rows
            .iter()
            .map(|(_, cells)| cells.iter().map(|c| c.grid_span).sum::<u32>())
            .max()
            .unwrap_or(0);
        let mut xml = String::from(
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid>"#,
        );
        for _ in 0..columns {
            xml.push_str(r#"<w:gridCol w:w="2000"/>"#);
        }
        xml.push_str("</w:tblGrid>");
        for (height, cells) in &self.rows {
            xml.push_str("<w:tr>");
            if let Some(h) = height {
                let _ = write!(xml, r#"<w:trPr><w:trHeight w:val="{h}"/></w:trPr>"#);
            }
            for cell in cells {
                xml.push_str(&cell.xml());
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        xml
    }
}

/// Builder for complete DOCX packages.
#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    body: Vec<String>,
    styles: Vec<String>,
    default_font: Option<(String, f64)>,
    title: Option<String>,
    author: Option<String>,
    omit_document: bool,
    theme: bool,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self {
            theme: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn paragraph(mut self, paragraph: ParagraphBuilder) -> Self {
        self.body.push(paragraph.xml());
        self
    }

    #[must_use]
    pub fn table(mut self, table: DocTableBuilder) -> Self {
        self.body.push(table.xml());
        self
    }

    /// Raw body XML inserted verbatim.
    #[must_use]
    pub fn raw_body(mut self, xml: &str) -> Self {
        self.body.push(xml.to_string());
        self
    }

    /// `docDefaults` run font and size in points.
    #[must_use]
    pub fn default_font(mut self, name: &str, size: f64) -> Self {
        self.default_font = Some((name.to_string(), size));
        self
    }

    /// Paragraph style `id` named `name`, with run size in points and an
    /// optional `basedOn`.
    #[must_use]
    pub fn paragraph_style(mut self, id: &str, name: &str, based_on: Option<&str>, size: Option<f64>) -> Self {
        let mut xml = format!(r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{}"/>"#, escape_xml(name));
        if let Some(base) = based_on {
            let _ = write!(xml, r#"<w:basedOn w:val="{base}"/>"#);
        }
        if let Some(size) = size {
            let _ = write!(xml, r#"<w:rPr><w:sz w:val="{}"/></w:rPr>"#, (size * 2.0).round());
        }
        xml.push_str("</w:style>");
        self.styles.push(xml);
        self
    }

    /// Raw `w:style` XML.
    #[must_use]
    pub fn style_xml(mut self, xml: &str) -> Self {
        self.styles.push(xml.to_string());
        self
    }

    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    #[must_use]
    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    /// Leave `word/document.xml` out of the package.
    #[must_use]
    pub fn without_document(mut self) -> Self {
        self.omit_document = true;
        self
    }

    #[must_use]
    pub fn without_theme(mut self) -> Self {
        self.theme = false;
        self
    }

    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, path: &str, body: &str| {
            zip.start_file(path, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        put(
            &mut zip,
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#,
        );
        put(&mut zip, "_rels/.rels", &generate_rels("word/document.xml"));
        put(
            &mut zip,
            "word/_rels/document.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>
</Relationships>"#,
        );

        if !self.omit_document {
            let document = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#,
                self.body.concat()
            );
            put(&mut zip, "word/document.xml", &document);
        }

        let mut styles = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr>"#,
        );
        if let Some((ref name, size)) = self.default_font {
            let name = escape_xml(name);
            let _ = write!(
                styles,
                r#"<w:rFonts w:ascii="{name}" w:hAnsi="{name}"/><w:sz w:val="{}"/>"#,
                (size * 2.0).round()
            );
        }
        styles.push_str(r#"</w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults>"#);
        styles.push_str(r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#);
        for style in &self.styles {
            styles.push_str(style);
        }
        styles.push_str("</w:styles>");
        put(&mut zip, "word/styles.xml", &styles);

        if self.theme {
            put(&mut zip, "word/theme/theme1.xml", &generate_theme(None));
        }

        if self.title.is_some() || self.author.is_some() {
            let mut core = String::from(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            );
            if let Some(ref title) = self.title {
                let _ = write!(core, "<dc:title>{}</dc:title>", escape_xml(title));
            }
            if let Some(ref author) = self.author {
                let _ = write!(core, "<dc:creator>{}</dc:creator>", escape_xml(author));
            }
            core.push_str("</cp:coreProperties>");
            put(&mut zip, "docProps/core.xml", &core);
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}
