//! Workbook markup: one `<style>` block shared by every sheet, then one
//! table per sheet.

use std::fmt::Write as _;

use super::{
    debug_attr, escape_multiline, escape_text, record_css, run_css, set_properties, CellResets,
    RenderOptions,
};
use crate::dedup::StyleTable;
use crate::types::{CellSlot, RenderCell, SheetModel, WorkbookModel};

/// Class prefix for deduplicated cell styles.
pub const CELL_CLASS_PREFIX: &str = "cellstyle";

const BASE_CELL_CSS: &str = "padding:4px 8px;border:1px solid #333;white-space:nowrap;overflow:hidden;vertical-align:bottom;text-align:left;";

const RESETS: CellResets = CellResets {
    border: "border:1px solid #333;",
    padding: "padding:4px 8px;",
    vertical_align: "vertical-align:bottom;",
    white_space: "white-space:nowrap;overflow:hidden;",
};

pub fn render_workbook(model: &WorkbookModel, options: RenderOptions) -> String {
    let styles = StyleTable::build(
        model
            .sheets
            .iter()
            .flat_map(|sheet| sheet.rows.iter())
            .flat_map(|row| row.cells.iter())
            .filter_map(CellSlot::as_cell)
            .map(|cell| &cell.style),
        CELL_CLASS_PREFIX,
    );

    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\n");
    write_style_block(&mut out, &styles);
    out.push_str("</head><body>\n");
    for sheet in &model.sheets {
        write_sheet(&mut out, sheet, &styles, options);
    }
    out.push_str("</body></html>\n");
    out
}

fn write_style_block(out: &mut String, styles: &StyleTable) {
    out.push_str("<style>\n");
    out.push_str(".table{border-collapse:collapse;table-layout:fixed}\n");
    let _ = writeln!(out, ".table td{{{BASE_CELL_CSS}}}");

    let defaults = styles.defaults();
    let default_css = record_css(defaults, &set_properties(defaults), &RESETS);
    if !default_css.is_empty() {
        let _ = writeln!(out, ".table td{{{default_css}}}");
    }
    out.push_str(".sheet{margin-bottom:2em}\n");

    for class in styles.classes() {
        let properties: Vec<_> = class.overrides.iter().map(|(p, _)| *p).collect();
        let css = record_css(&class.record, &properties, &RESETS);
        if !css.is_empty() {
            let _ = writeln!(out, ".table td.{}{{{css}}}", class.name);
        }
    }
    out.push_str("</style>\n");
}

fn write_sheet(out: &mut String, sheet: &SheetModel, styles: &StyleTable, options: RenderOptions) {
    let _ = writeln!(
        out,
        "<div class=\"sheet\" data-name=\"{}\">",
        escape_text(&sheet.name)
    );
    let _ = writeln!(
        out,
        "<table class=\"table\" style=\"width:{:.0}px\">",
        sheet.total_width()
    );

    out.push_str("<colgroup>");
    for (width, hidden) in sheet.col_widths.iter().zip(&sheet.col_hidden) {
        if *hidden {
            out.push_str("<col style=\"display:none\">");
        } else {
            let _ = write!(out, "<col style=\"width:{width:.0}px\">");
        }
    }
    out.push_str("</colgroup>\n");

    for row in &sheet.rows {
        let hidden = if row.hidden { "display:none;" } else { "" };
        let _ = write!(out, "<tr style=\"height:{:.0}px;{hidden}\">", row.height_px);
        for slot in &row.cells {
            match slot {
                CellSlot::Empty => out.push_str("<td></td>"),
                CellSlot::Covered { .. } => {}
                CellSlot::Cell(cell) => write_cell(out, cell, styles, options),
            }
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</table>\n</div>\n");
}

fn write_cell(out: &mut String, cell: &RenderCell, styles: &StyleTable, options: RenderOptions) {
    let _ = write!(out, "<td data-cell=\"{}\"", escape_text(&cell.reference));
    if let Some(class) = styles.class_name(&cell.style) {
        let _ = write!(out, " class=\"{class}\"");
    }
    if cell.col_span > 1 {
        let _ = write!(out, " colspan=\"{}\"", cell.col_span);
    }
    if cell.row_span > 1 {
        let _ = write!(out, " rowspan=\"{}\"", cell.row_span);
    }
    out.push_str(&debug_attr(options, "data-style", &cell.style));
    out.push('>');

    if cell.runs.is_empty() {
        out.push_str(&escape_multiline(&cell.value));
    } else {
        for run in &cell.runs {
            let css = run_css(&run.style);
            out.push_str("<span");
            if !css.is_empty() {
                let _ = write!(out, " style=\"{css}\"");
            }
            out.push_str(&debug_attr(options, "data-run-style", &run.style));
            let _ = write!(out, ">{}</span>", escape_multiline(&run.text));
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
    use crate::types::{Pt, RenderRun, RowModel, RunStyle, StyleRecord};

    fn text_cell(reference: &str, value: &str, style: StyleRecord) -> CellSlot {
        CellSlot::Cell(RenderCell {
            reference: reference.to_string(),
            value: value.to_string(),
            runs: Vec::new(),
            style,
            col_span: 1,
            row_span: 1,
        })
    }

    fn calibri() -> StyleRecord {
        StyleRecord {
            font_family: Some("Calibri".to_string()),
            font_size: Some(Pt(11.0)),
            ..StyleRecord::default()
        }
    }

    fn model() -> WorkbookModel {
        let bold = StyleRecord {
            bold: Some(true),
            ..calibri()
        };
        WorkbookModel {
            sheets: vec![SheetModel {
                name: "Q1 <draft>".to_string(),
                col_widths: vec![70.0, 100.0, 50.0],
                col_hidden: vec![false, false, true],
                rows: vec![
                    RowModel {
                        height_px: 20.0,
                        hidden: false,
                        cells: vec![
                            CellSlot::Cell(RenderCell {
                                reference: "A1".to_string(),
                                value: "Title".to_string(),
                                runs: Vec::new(),
                                style: bold,
                                col_span: 2,
                                row_span: 1,
                            }),
                            CellSlot::Covered {
                                master_row: 0,
                                master_col: 0,
                            },
                            CellSlot::Empty,
                        ],
                    },
                    RowModel {
                        height_px: 20.0,
                        hidden: true,
                        cells: vec![
                            text_cell("A2", "a & b\nc", calibri()),
                            CellSlot::Cell(RenderCell {
                                reference: "B2".to_string(),
                                value: String::new(),
                                runs: vec![
                                    RenderRun {
                                        text: "x".to_string(),
                                        style: RunStyle {
                                            italic: Some(true),
                                            ..RunStyle::default()
                                        },
                                    },
                                    RenderRun {
                                        text: "<y>".to_string(),
                                        style: RunStyle::default(),
                                    },
                                ],
                                style: calibri(),
                                col_span: 1,
                                row_span: 1,
                            }),
                            text_cell("C2", "", calibri()),
                        ],
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_style_block_defaults_and_classes() {
        let html = render_workbook(&model(), RenderOptions::default());
        assert!(html.contains(".table td{font-family:'Calibri';font-size:11.0pt;}"));
        assert!(html.contains(".table td.cellstyle1{font-weight:bold;}"));
        assert!(!html.contains("cellstyle2"));
    }

    #[test]
    fn test_sheet_markup() {
        let html = render_workbook(&model(), RenderOptions::default());
        assert!(html.contains("<div class=\"sheet\" data-name=\"Q1 &lt;draft&gt;\">"));
        assert!(html.contains("<table class=\"table\" style=\"width:220px\">"));
        assert!(html.contains(
            "<colgroup><col style=\"width:70px\"><col style=\"width:100px\"><col style=\"display:none\"></colgroup>"
        ));
        assert!(html.contains(
            "<tr style=\"height:20px;\"><td data-cell=\"A1\" class=\"cellstyle1\" colspan=\"2\">Title</td><td></td></tr>"
        ));
        assert!(html.contains("<tr style=\"height:20px;display:none;\">"));
        assert!(html.contains("<td data-cell=\"A2\">a &amp; b<br>c</td>"));
        assert!(html.contains(
            "<td data-cell=\"B2\"><span style=\"font-style:italic;\">x</span><span>&lt;y&gt;</span></td>"
        ));
    }

    #[test]
    fn test_debug_attributes() {
        let plain = render_workbook(&model(), RenderOptions::default());
        assert!(!plain.contains("data-style"));

        let debug = render_workbook(&model(), RenderOptions::default().debug(true));
        assert!(debug.contains("data-style=\"{&quot;fontFamily&quot;:&quot;Calibri&quot;"));
        assert!(debug.contains("data-run-style=\"{&quot;italic&quot;:true}\""));
    }

    #[test]
    fn test_empty_workbook() {
        let html = render_workbook(&WorkbookModel::default(), RenderOptions::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(".table td{padding:4px 8px;"));
        assert!(html.ends_with("</body></html>\n"));
    }
}
