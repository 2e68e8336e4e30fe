//! Document markup: paragraphs and tables in body order.

use std::fmt::Write as _;

use super::{
    debug_attr, escape_multiline, escape_text, record_css, run_css, set_properties, CellResets,
    RenderOptions,
};
use crate::dedup::StyleTable;
use crate::types::{
    Block, DocumentModel, HAlign, ParagraphStyle, RenderParagraph, RenderRun, RenderTable,
    RenderTableCell,
};

/// Class prefix for deduplicated table cell styles.
pub const TABLE_CELL_CLASS_PREFIX: &str = "tdstyle";

const RESETS: CellResets = CellResets {
    border: "border:1px solid #333;",
    padding: "padding:4px;",
    vertical_align: "vertical-align:top;",
    white_space: "white-space:normal;",
};

pub fn render_document(model: &DocumentModel, options: RenderOptions) -> String {
    let styles = StyleTable::build(
        model
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Table(table) => Some(table),
                Block::Paragraph(_) => None,
            })
            .flat_map(|table| table.rows.iter())
            .flat_map(|row| row.cells.iter())
            .map(|cell| &cell.style),
        TABLE_CELL_CLASS_PREFIX,
    );

    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\n");
    if let Some(ref title) = model.properties.title {
        let _ = writeln!(out, "<title>{}</title>", escape_text(title));
    }
    write_style_block(&mut out, model, &styles);
    out.push_str("</head><body>\n<div class=\"document\">\n");

    for block in &model.blocks {
        match block {
            Block::Paragraph(paragraph) => write_paragraph(&mut out, paragraph, options),
            Block::Table(table) => write_table(&mut out, table, &styles, options),
        }
    }

    out.push_str("</div>\n</body></html>\n");
    out
}

fn write_style_block(out: &mut String, model: &DocumentModel, styles: &StyleTable) {
    out.push_str("<style>\n");
    let _ = writeln!(out, ".document{{{}}}", run_css(&model.default_run_style));
    out.push_str(".document p,.document h1,.document h2,.document h3,.document h4,.document h5,.document h6{margin:0}\n");
    out.push_str(".document table{border-collapse:collapse}\n");
    let _ = writeln!(
        out,
        ".document td{{border:1px solid #333;padding:4px;vertical-align:top}}"
    );

    let defaults = styles.defaults();
    let default_css = record_css(defaults, &set_properties(defaults), &RESETS);
    if !default_css.is_empty() {
        let _ = writeln!(out, ".document td{{{default_css}}}");
    }
    for class in styles.classes() {
        let properties: Vec<_> = class.overrides.iter().map(|(p, _)| *p).collect();
        let css = record_css(&class.record, &properties, &RESETS);
        if !css.is_empty() {
            let _ = writeln!(out, ".document td.{}{{{css}}}", class.name);
        }
    }
    out.push_str("</style>\n");
}

fn paragraph_css(style: &ParagraphStyle) -> String {
    let mut css = String::new();
    match style.alignment {
        Some(align @ (HAlign::Center | HAlign::Right | HAlign::Justify)) => {
            let _ = write!(css, "text-align:{};", align.as_css());
        }
        _ => {}
    }
    if let Some(before) = style.space_before.filter(|v| v.get() > 0.0) {
        let _ = write!(css, "margin-top:{:.0}pt;", before.get());
    }
    if let Some(after) = style.space_after.filter(|v| v.get() > 0.0) {
        let _ = write!(css, "margin-bottom:{:.0}pt;", after.get());
    }
    if let Some(line) = style.line_height.filter(|v| v.get() > 0.0) {
        let _ = write!(css, "line-height:{:.0}pt;", line.get());
    }
    if let Some(left) = style.indent_left.filter(|v| v.get() > 0.0) {
        let _ = write!(css, "padding-left:{:.0}px;", left.get());
    }
    if let Some(right) = style.indent_right.filter(|v| v.get() > 0.0) {
        let _ = write!(css, "padding-right:{:.0}px;", right.get());
    }
    css
}

fn write_paragraph(out: &mut String, paragraph: &RenderParagraph, options: RenderOptions) {
    let tag = match paragraph.style.heading_level {
        Some(level @ 1..=6) => format!("h{level}"),
        _ => "p".to_string(),
    };
    let css = paragraph_css(&paragraph.style);

    let _ = write!(out, "<{tag}");
    if !css.is_empty() {
        let _ = write!(out, " style=\"{css}\"");
    }
    out.push_str(&debug_attr(options, "data-para-style", &paragraph.style));
    out.push('>');
    write_runs(out, &paragraph.runs, options);
    let _ = writeln!(out, "</{tag}>");
}

fn write_runs(out: &mut String, runs: &[RenderRun], options: RenderOptions) {
    for run in runs {
        let css = run_css(&run.style);
        out.push_str("<span");
        if !css.is_empty() {
            let _ = write!(out, " style=\"{css}\"");
        }
        out.push_str(&debug_attr(options, "data-run-style", &run.style));
        let _ = write!(out, ">{}</span>", escape_multiline(&run.text));
    }
}

fn write_table(out: &mut String, table: &RenderTable, styles: &StyleTable, options: RenderOptions) {
    out.push_str("<table>\n");
    for row in &table.rows {
        match row.height_px {
            Some(height) => {
                let _ = write!(out, "<tr style=\"height:{height:.0}px\">");
            }
            None => out.push_str("<tr>"),
        }
        for cell in &row.cells {
            write_table_cell(out, cell, styles, options);
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

fn write_table_cell(
    out: &mut String,
    cell: &RenderTableCell,
    styles: &StyleTable,
    options: RenderOptions,
) {
    out.push_str("<td");
    if let Some(class) = styles.class_name(&cell.style) {
        let _ = write!(out, " class=\"{class}\"");
    }
    if cell.col_span > 1 {
        let _ = write!(out, " colspan=\"{}\"", cell.col_span);
    }
    if cell.row_span > 1 {
        let _ = write!(out, " rowspan=\"{}\"", cell.row_span);
    }
    if let Some(width) = cell.width_px {
        let _ = write!(out, " style=\"width:{width:.0}px\"");
    }
    out.push_str(&debug_attr(options, "data-cell-style", &cell.style));
    out.push('>');

    if cell.paragraphs.is_empty() {
        out.push_str("&nbsp;");
    } else {
        out.push('\n');
        for paragraph in &cell.paragraphs {
            write_paragraph(out, paragraph, options);
        }
    }
    out.push_str("</td>");
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::types::{DocProperties, Pt, Px, RenderTableRow, RunStyle, StyleRecord};

    fn paragraph(text: &str, style: ParagraphStyle) -> RenderParagraph {
        RenderParagraph {
            runs: vec![RenderRun {
                text: text.to_string(),
                style: RunStyle::default(),
            }],
            style,
        }
    }

    fn shaded(color: &str) -> StyleRecord {
        StyleRecord {
            background_color: Some(color.to_string()),
            ..StyleRecord::default()
        }
    }

    fn table_cell(style: StyleRecord, text: Option<&str>) -> RenderTableCell {
        RenderTableCell {
            paragraphs: text
                .map(|t| vec![paragraph(t, ParagraphStyle::default())])
                .unwrap_or_default(),
            col_span: 1,
            row_span: 1,
            width_px: None,
            style,
        }
    }

    fn model() -> DocumentModel {
        DocumentModel {
            properties: DocProperties {
                title: Some("Report & notes".to_string()),
                ..DocProperties::default()
            },
            default_run_style: RunStyle {
                font_family: Some("Calibri".to_string()),
                font_size: Some(Pt(11.0)),
                ..RunStyle::default()
            },
            blocks: vec![
                Block::Paragraph(paragraph(
                    "Heading",
                    ParagraphStyle {
                        heading_level: Some(2),
                        space_before: Some(Pt(12.0)),
                        ..ParagraphStyle::default()
                    },
                )),
                Block::Table(RenderTable {
                    rows: vec![RenderTableRow {
                        height_px: Some(24.0),
                        cells: vec![
                            RenderTableCell {
                                col_span: 2,
                                row_span: 3,
                                width_px: Some(96.0),
                                ..table_cell(shaded("FFEEDD"), Some("a"))
                            },
                            table_cell(shaded("FFEEDD"), None),
                            table_cell(shaded("nope;}"), Some("b")),
                        ],
                    }],
                }),
                Block::Paragraph(paragraph(
                    "Body",
                    ParagraphStyle {
                        alignment: Some(HAlign::Justify),
                        indent_left: Some(Px(48.0)),
                        ..ParagraphStyle::default()
                    },
                )),
            ],
        }
    }

    #[test]
    fn test_blocks_keep_order() {
        let html = render_document(&model(), RenderOptions::default());
        let heading = html.find("<h2").unwrap();
        let table = html.find("<table>").unwrap();
        let body = html.find(">Body<").unwrap();
        assert!(heading < table && table < body);
        assert!(html.contains("<title>Report &amp; notes</title>"));
        assert!(html.contains(".document{font-family:'Calibri';font-size:11.0pt;}"));
    }

    #[test]
    fn test_paragraph_css() {
        let html = render_document(&model(), RenderOptions::default());
        assert!(html.contains("<h2 style=\"margin-top:12pt;\"><span>Heading</span></h2>"));
        assert!(html.contains(
            "<p style=\"text-align:justify;padding-left:48px;\"><span>Body</span></p>"
        ));
    }

    #[test]
    fn test_table_cells() {
        let html = render_document(&model(), RenderOptions::default());
        // Two of three cells share the shading, so it becomes the default.
        assert!(html.contains(".document td{background-color:#FFEEDD;}"));
        assert!(html.contains("<tr style=\"height:24px\">"));
        assert!(html.contains("<td colspan=\"2\" rowspan=\"3\" style=\"width:96px\">"));
        assert!(html.contains("<td>&nbsp;</td>"));
        // The unsafe color is dropped, so the class only clears the default.
        assert!(html.contains(".document td.tdstyle1{background-color:transparent;}"));
        assert!(html.contains("<td class=\"tdstyle1\">"));
        assert!(!html.contains("nope"));
    }

    #[test]
    fn test_debug_mode() {
        let html = render_document(&model(), RenderOptions::default().debug(true));
        assert!(html.contains("data-para-style=\"{&quot;spaceBefore&quot;:12.0,&quot;headingLevel&quot;:2}\""));
        assert!(html.contains("data-cell-style="));
    }
}
