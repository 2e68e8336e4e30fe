//! IR builder: turns the raw package graphs into the render-ready model.
//!
//! Sheets become dense grids indexed by absolute row and column; documents
//! become an ordered list of paragraph and table blocks.

use std::collections::{HashMap, HashSet};

use crate::banding::{band_fill, resolve_table_bands, TableBandRegion};
use crate::cell_ref::cell_name;
use crate::document_styles::{table_cell_style, twips_to_px, DocumentStyleResolver};
use crate::geometry::{column_count, column_layout, row_count, row_layout, MergeMap};
use crate::numfmt::{builtin_format, format_general, NumberFormat};
use crate::styles::StyleResolver;
use crate::types::{
    Block, CellContent, CellSlot, DocumentModel, RawBlock, RawCell, RawDocTable, RawDocument,
    RawParagraph, RawRow, RawSheet, RawWorkbook, RenderCell, RenderParagraph, RenderRun,
    RenderTable, RenderTableCell, RenderTableRow, RowModel, SharedString, SheetModel, StyleSheet,
    VMerge, WorkbookModel,
};

/// Upper bound on materialized grid positions per sheet. Beyond it trailing
/// rows are dropped.
pub const MAX_GRID_CELLS: u64 = 20_000_000;

/// Build the workbook model. Isolated bad references degrade to unset
/// properties; this never fails.
pub fn build_workbook(workbook: &RawWorkbook) -> WorkbookModel {
    let resolver = StyleResolver::new(&workbook.stylesheet, workbook.theme.as_ref());
    let formats = compile_formats(&workbook.stylesheet);

    let sheets = workbook
        .sheets
        .iter()
        .map(|sheet| {
            SheetBuilder {
                workbook,
                resolver: &resolver,
                formats: &formats,
            }
            .build(sheet)
        })
        .collect();

    WorkbookModel { sheets }
}

/// One compiled number format per `cellXfs` entry.
fn compile_formats(stylesheet: &StyleSheet) -> Vec<NumberFormat> {
    let mut by_id: HashMap<u32, NumberFormat> = HashMap::new();
    stylesheet
        .cell_xfs
        .iter()
        .map(|xf| {
            by_id
                .entry(xf.num_fmt_id)
                .or_insert_with(|| {
                    let code = stylesheet
                        .num_fmts
                        .get(&xf.num_fmt_id)
                        .map(String::as_str)
                        .or_else(|| builtin_format(xf.num_fmt_id));
                    match code {
                        Some(code) => NumberFormat::compile(code),
                        None => {
                            log::debug!("unknown number format id {}", xf.num_fmt_id);
                            NumberFormat::General
                        }
                    }
                })
                .clone()
        })
        .collect()
}

struct SheetBuilder<'w, 'r> {
    workbook: &'w RawWorkbook,
    resolver: &'r StyleResolver<'w>,
    formats: &'r [NumberFormat],
}

impl SheetBuilder<'_, '_> {
    fn build(&self, sheet: &RawSheet) -> SheetModel {
        let merges = MergeMap::build(&sheet.merge_refs);
        let cols = column_count(sheet, &merges);
        let rows = clamp_rows(&sheet.name, row_count(sheet, &merges), cols);
        let (col_widths, col_hidden) = column_layout(&sheet.columns, cols);
        let bands = resolve_table_bands(
            &sheet.tables,
            &self.workbook.stylesheet,
            self.resolver.palette(),
        );

        // Later duplicates of a row index win for row attributes; their
        // cells are all kept.
        let mut row_index: HashMap<u32, &RawRow> = HashMap::new();
        for row in &sheet.rows {
            row_index.insert(row.index, row);
        }

        let width = usize::try_from(cols).unwrap_or(0);
        let mut grid: Vec<RowModel> = (0..rows)
            .map(|r| {
                let (height_px, hidden) = row_layout(row_index.get(&r).copied());
                RowModel {
                    height_px,
                    hidden,
                    cells: vec![CellSlot::Empty; width],
                }
            })
            .collect();

        for span in merges.spans() {
            for r in span.row..=span.end_row() {
                for c in span.col..=span.end_col() {
                    if (r, c) != (span.row, span.col) {
                        set_slot(
                            &mut grid,
                            r,
                            c,
                            CellSlot::Covered {
                                master_row: span.row,
                                master_col: span.col,
                            },
                        );
                    }
                }
            }
        }

        for cell in sheet.rows.iter().flat_map(|row| row.cells.iter()) {
            if merges.covered_by(cell.row, cell.col).is_some() {
                log::debug!("{}: {} is covered by a merge", sheet.name, cell_name(cell.row, cell.col));
                continue;
            }
            let built = self.build_cell(cell, &merges, &bands);
            set_slot(&mut grid, cell.row, cell.col, CellSlot::Cell(built));
        }

        // A master needs a cell to carry its spans even when the source has none.
        for span in merges.spans() {
            let missing = matches!(slot(&grid, span.row, span.col), Some(CellSlot::Empty));
            if missing {
                let cell = RenderCell {
                    reference: cell_name(span.row, span.col),
                    value: String::new(),
                    runs: Vec::new(),
                    style: self
                        .resolver
                        .resolve_cell(None, band_fill(&bands, span.row, span.col)),
                    col_span: span.col_span,
                    row_span: span.row_span,
                };
                set_slot(&mut grid, span.row, span.col, CellSlot::Cell(cell));
            }
        }

        SheetModel {
            name: sheet.name.clone(),
            col_widths,
            col_hidden,
            rows: grid,
        }
    }

    fn build_cell(&self, cell: &RawCell, merges: &MergeMap, bands: &[TableBandRegion]) -> RenderCell {
        let style = self
            .resolver
            .resolve_cell(cell.style_id, band_fill(bands, cell.row, cell.col));
        let (row_span, col_span) = merges
            .master_at(cell.row, cell.col)
            .map_or((1, 1), |span| (span.row_span, span.col_span));

        let (value, runs) = match &cell.content {
            CellContent::Empty => (String::new(), Vec::new()),
            CellContent::Number(n) => (self.format_number(*n, cell.style_id), Vec::new()),
            CellContent::SharedString(idx) => match self.workbook.shared_strings.get(*idx) {
                Some(item) => self.string_value(item),
                None => {
                    log::debug!("shared string {idx} out of range");
                    (String::new(), Vec::new())
                }
            },
            CellContent::InlineString(item) => self.string_value(item),
            CellContent::Text(s) | CellContent::Error(s) => (s.clone(), Vec::new()),
            CellContent::Bool(b) => (if *b { "TRUE" } else { "FALSE" }.to_string(), Vec::new()),
        };

        RenderCell {
            reference: cell_name(cell.row, cell.col),
            value,
            runs,
            style,
            col_span,
            row_span,
        }
    }

    fn format_number(&self, value: f64, style_id: Option<u32>) -> String {
        match style_id
            .and_then(|id| usize::try_from(id).ok())
            .and_then(|i| self.formats.get(i))
        {
            Some(format) => format.format(value, self.workbook.date1904),
            None => format_general(value),
        }
    }

    /// Rich items render as runs with an empty value; plain ones as text.
    fn string_value(&self, item: &SharedString) -> (String, Vec<RenderRun>) {
        if item.runs.is_empty() {
            return (item.text.clone(), Vec::new());
        }
        let runs = item
            .runs
            .iter()
            .map(|run| RenderRun {
                text: run.text.clone(),
                style: self.resolver.resolve_run(run.props.as_ref()),
            })
            .collect();
        (String::new(), runs)
    }
}

/// Rows that fit the position budget. An empty row still costs one slot.
fn clamp_rows(sheet: &str, rows: u32, cols: u32) -> u32 {
    let per_row = u64::from(cols.max(1));
    if u64::from(rows) * per_row <= MAX_GRID_CELLS {
        return rows;
    }
    let allowed = u32::try_from(MAX_GRID_CELLS / per_row).unwrap_or(u32::MAX);
    log::warn!("{sheet}: {rows}x{cols} grid exceeds {MAX_GRID_CELLS} positions, keeping {allowed} rows");
    allowed
}

fn slot(grid: &[RowModel], row: u32, col: u32) -> Option<&CellSlot> {
    let row = grid.get(usize::try_from(row).ok()?)?;
    row.cells.get(usize::try_from(col).ok()?)
}

fn set_slot(grid: &mut [RowModel], row: u32, col: u32, value: CellSlot) {
    let target = usize::try_from(row)
        .ok()
        .and_then(|r| grid.get_mut(r))
        .and_then(|r| usize::try_from(col).ok().and_then(|c| r.cells.get_mut(c)));
    if let Some(target) = target {
        *target = value;
    }
}

/// Build the document model: one block per body paragraph or table, in
/// source order.
pub fn build_document(document: &RawDocument) -> DocumentModel {
    let resolver = DocumentStyleResolver::new(&document.styles, document.theme.as_ref());

    let blocks = document
        .body
        .iter()
        .map(|block| match block {
            RawBlock::Paragraph(p) => Block::Paragraph(build_paragraph(&resolver, p)),
            RawBlock::Table(t) => Block::Table(build_table(&resolver, t)),
        })
        .collect();

    DocumentModel {
        properties: document.properties.clone(),
        default_run_style: resolver.default_run_style(),
        blocks,
    }
}

fn build_paragraph(resolver: &DocumentStyleResolver<'_>, paragraph: &RawParagraph) -> RenderParagraph {
    let runs = paragraph
        .runs
        .iter()
        .map(|run| RenderRun {
            text: run.text.clone(),
            style: resolver.resolve_run(&paragraph.props, run.style_id.as_deref(), &run.font),
        })
        .collect();
    RenderParagraph {
        runs,
        style: resolver.resolve_paragraph(&paragraph.props),
    }
}

/// Vertical merges collapse into `row_span` on the restart cell; the
/// continuation cells it covers are dropped.
fn build_table(resolver: &DocumentStyleResolver<'_>, table: &RawDocTable) -> RenderTable {
    // Grid column where each cell starts.
    let starts: Vec<Vec<u32>> = table
        .rows
        .iter()
        .map(|row| {
            let mut col = 0u32;
            row.cells
                .iter()
                .map(|cell| {
                    let start = col;
                    col = col.saturating_add(cell.grid_span.max(1));
                    start
                })
                .collect()
        })
        .collect();

    let continues_at = |row: usize, col: u32| -> bool {
        let (Some(raw), Some(cols)) = (table.rows.get(row), starts.get(row)) else {
            return false;
        };
        raw.cells
            .iter()
            .zip(cols)
            .any(|(cell, start)| *start == col && cell.v_merge == Some(VMerge::Continue))
    };

    let mut covered: HashSet<(usize, u32)> = HashSet::new();
    let mut rows = Vec::with_capacity(table.rows.len());

    for (ri, (row, cols)) in table.rows.iter().zip(&starts).enumerate() {
        let mut cells = Vec::with_capacity(row.cells.len());
        for (cell, start) in row.cells.iter().zip(cols) {
            if covered.contains(&(ri, *start)) {
                continue;
            }
            let mut row_span = 1u32;
            if cell.v_merge == Some(VMerge::Restart) {
                let mut below = ri + 1;
                while continues_at(below, *start) {
                    covered.insert((below, *start));
                    row_span = row_span.saturating_add(1);
                    below += 1;
                }
            }
            cells.push(RenderTableCell {
                paragraphs: cell
                    .paragraphs
                    .iter()
                    .map(|p| build_paragraph(resolver, p))
                    .collect(),
                col_span: cell.grid_span.max(1),
                row_span,
                width_px: cell.width.filter(|w| *w > 0).map(|w| twips_to_px(w).get()),
                style: table_cell_style(cell),
            });
        }
        rows.push(RenderTableRow {
            cells,
            height_px: row.height.filter(|h| *h > 0).map(|h| twips_to_px(h).get()),
        });
    }

    RenderTable { rows }
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
    use crate::types::{
        CellXf, ColorRef, RawDocCell, RawDocRow, RawDocRun, RawFill, RawFont, RawRun, RawTable,
    };

    fn cell(row: u32, col: u32, content: CellContent) -> RawCell {
        RawCell {
            row,
            col,
            style_id: None,
            content,
        }
    }

    fn row(index: u32, cells: Vec<RawCell>) -> RawRow {
        RawRow {
            index,
            cells,
            ..RawRow::default()
        }
    }

    fn workbook(sheet: RawSheet) -> RawWorkbook {
        RawWorkbook {
            sheets: vec![sheet],
            stylesheet: StyleSheet {
                fonts: vec![RawFont {
                    name: Some("Calibri".to_string()),
                    size: Some(11.0),
                    ..RawFont::default()
                }],
                fills: vec![
                    RawFill::default(),
                    RawFill {
                        pattern_type: Some("solid".to_string()),
                        fg_color: Some(ColorRef::Rgb("FFFFFF00".to_string())),
                        bg_color: None,
                    },
                ],
                cell_xfs: vec![
                    CellXf {
                        font_id: Some(0),
                        fill_id: Some(0),
                        ..CellXf::default()
                    },
                    CellXf {
                        num_fmt_id: 10,
                        font_id: Some(0),
                        ..CellXf::default()
                    },
                    CellXf {
                        font_id: Some(0),
                        fill_id: Some(1),
                        ..CellXf::default()
                    },
                ],
                ..StyleSheet::default()
            },
            ..RawWorkbook::default()
        }
    }

    #[test]
    fn test_row_budget_holds_for_empty_rows() {
        assert_eq!(clamp_rows("S", u32::MAX, 0), 20_000_000);
        assert_eq!(clamp_rows("S", 10, 0), 10);
        assert_eq!(clamp_rows("S", 3_000_000, 10), 2_000_000);
    }

    #[test]
    fn test_far_column_does_not_drop_the_sheet() {
        let sheet = RawSheet {
            name: "S".to_string(),
            rows: vec![row(
                0,
                vec![
                    cell(0, 0, CellContent::Text("kept".to_string())),
                    cell(0, 25_000_000, CellContent::Text("far".to_string())),
                ],
            )],
            ..RawSheet::default()
        };
        let model = build_workbook(&workbook(sheet));
        let sheet = &model.sheets[0];
        assert_eq!(sheet.col_widths.len(), 16_384);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].cells[0].as_cell().unwrap().value, "kept");
    }

    #[test]
    fn test_sparse_rows_materialize() {
        let sheet = RawSheet {
            name: "S".to_string(),
            rows: vec![
                row(4, vec![cell(4, 1, CellContent::Text("late".to_string()))]),
                row(0, vec![cell(0, 0, CellContent::Text("first".to_string()))]),
            ],
            ..RawSheet::default()
        };
        let model = build_workbook(&workbook(sheet));
        let sheet = &model.sheets[0];
        assert_eq!(sheet.rows.len(), 5);
        assert_eq!(sheet.col_count(), 2);
        for r in &sheet.rows {
            assert_eq!(r.cells.len(), 2);
        }
        assert_eq!(sheet.rows[0].cells[0].as_cell().unwrap().value, "first");
        assert_eq!(sheet.rows[4].cells[1].as_cell().unwrap().reference, "B5");
        assert_eq!(sheet.rows[2].cells[0], CellSlot::Empty);
        assert!((sheet.rows[2].height_px - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_merge_master_and_covered() {
        let sheet = RawSheet {
            name: "S".to_string(),
            rows: vec![row(
                0,
                vec![
                    cell(0, 0, CellContent::Text("m".to_string())),
                    cell(0, 1, CellContent::Text("hidden".to_string())),
                ],
            )],
            merge_refs: vec!["A1:B2".to_string()],
            ..RawSheet::default()
        };
        let model = build_workbook(&workbook(sheet));
        let rows = &model.sheets[0].rows;
        let master = rows[0].cells[0].as_cell().unwrap();
        assert_eq!((master.row_span, master.col_span), (2, 2));
        for (r, c) in [(0, 1), (1, 0), (1, 1)] {
            assert_eq!(
                rows[r].cells[c],
                CellSlot::Covered {
                    master_row: 0,
                    master_col: 0
                }
            );
        }
    }

    #[test]
    fn test_merge_master_synthesized() {
        let sheet = RawSheet {
            name: "S".to_string(),
            merge_refs: vec!["B2:C3".to_string()],
            ..RawSheet::default()
        };
        let model = build_workbook(&workbook(sheet));
        let sheet = &model.sheets[0];
        assert_eq!(sheet.rows.len(), 3);
        let master = sheet.rows[1].cells[1].as_cell().unwrap();
        assert_eq!(master.value, "");
        assert_eq!(master.style.font_family.as_deref(), Some("Calibri"));
        assert_eq!((master.row_span, master.col_span), (2, 2));
    }

    #[test]
    fn test_values_and_formats() {
        let mut numbered = cell(0, 0, CellContent::Number(0.256));
        numbered.style_id = Some(1);
        let sheet = RawSheet {
            name: "S".to_string(),
            rows: vec![row(
                0,
                vec![
                    numbered,
                    cell(0, 1, CellContent::Number(1234.5)),
                    cell(0, 2, CellContent::Bool(true)),
                    cell(0, 3, CellContent::Error("#DIV/0!".to_string())),
                    cell(0, 4, CellContent::SharedString(0)),
                    cell(0, 5, CellContent::SharedString(9)),
                ],
            )],
            ..RawSheet::default()
        };
        let mut wb = workbook(sheet);
        wb.shared_strings.push(SharedString {
            text: "plain".to_string(),
            runs: Vec::new(),
        });
        let model = build_workbook(&wb);
        let values: Vec<String> = model.sheets[0].rows[0]
            .cells
            .iter()
            .map(|c| c.as_cell().unwrap().value.clone())
            .collect();
        assert_eq!(values, vec!["25.60%", "1234.5", "TRUE", "#DIV/0!", "plain", ""]);
    }

    #[test]
    fn test_rich_text_uses_runs() {
        let mut wb = workbook(RawSheet {
            name: "S".to_string(),
            rows: vec![row(0, vec![cell(0, 0, CellContent::SharedString(0))])],
            ..RawSheet::default()
        });
        wb.shared_strings.push(SharedString {
            text: "ab".to_string(),
            runs: vec![
                RawRun {
                    text: "a".to_string(),
                    props: Some(RawFont {
                        bold: Some(true),
                        ..RawFont::default()
                    }),
                },
                RawRun {
                    text: "b".to_string(),
                    props: None,
                },
            ],
        });
        let model = build_workbook(&wb);
        let cell = model.sheets[0].rows[0].cells[0].as_cell().unwrap();
        assert!(cell.value.is_empty());
        assert_eq!(cell.runs.len(), 2);
        assert_eq!(cell.runs[0].style.bold, Some(true));
        assert_eq!(cell.runs[1].style.bold, None);
    }

    #[test]
    fn test_band_fill_respects_own_background() {
        let mut own = cell(2, 0, CellContent::Text("own".to_string()));
        own.style_id = Some(2);
        let mut wb = workbook(RawSheet {
            name: "S".to_string(),
            rows: vec![
                row(0, vec![cell(0, 0, CellContent::Text("h".to_string()))]),
                row(1, vec![cell(1, 0, CellContent::Text("x".to_string()))]),
                row(2, vec![own]),
            ],
            tables: vec![RawTable {
                reference: "A1:A3".to_string(),
                style_name: Some("TableStyleMedium2".to_string()),
                show_row_stripes: true,
                data_dxf_id: None,
            }],
            ..RawSheet::default()
        });
        wb.stylesheet.default_table_style = Some("TableStyleMedium2".to_string());
        let model = build_workbook(&wb);
        let rows = &model.sheets[0].rows;
        let bg = |r: usize| rows[r].cells[0].as_cell().unwrap().style.background_color.clone();
        assert_eq!(bg(0).as_deref(), Some("D9D9D9"));
        assert_eq!(bg(1).as_deref(), Some("F2F2F2"));
        assert_eq!(bg(2).as_deref(), Some("FFFF00"));
    }

    #[test]
    fn test_grid_cap() {
        assert_eq!(clamp_rows("S", 10, 10), 10);
        assert_eq!(clamp_rows("S", 1_048_576, 16_384), 1220);
        assert_eq!(clamp_rows("S", 5, 0), 5);
    }

    fn para(text: &str) -> RawBlock {
        RawBlock::Paragraph(RawParagraph {
            runs: vec![RawDocRun {
                text: text.to_string(),
                ..RawDocRun::default()
            }],
            ..RawParagraph::default()
        })
    }

    fn doc_cell(v_merge: Option<VMerge>, grid_span: u32) -> RawDocCell {
        RawDocCell {
            v_merge,
            grid_span,
            width: Some(1440),
            ..RawDocCell::default()
        }
    }

    #[test]
    fn test_document_block_order() {
        let document = RawDocument {
            body: vec![
                para("one"),
                RawBlock::Table(RawDocTable::default()),
                para("two"),
            ],
            ..RawDocument::default()
        };
        let model = build_document(&document);
        assert_eq!(model.blocks.len(), 3);
        assert!(matches!(model.blocks[0], Block::Paragraph(ref p) if p.runs[0].text == "one"));
        assert!(matches!(model.blocks[1], Block::Table(_)));
        assert!(matches!(model.blocks[2], Block::Paragraph(ref p) if p.runs[0].text == "two"));
    }

    #[test]
    fn test_vertical_merge_becomes_row_span() {
        let table = RawDocTable {
            rows: vec![
                RawDocRow {
                    height: Some(300),
                    cells: vec![doc_cell(Some(VMerge::Restart), 1), doc_cell(None, 2)],
                },
                RawDocRow {
                    height: None,
                    cells: vec![doc_cell(Some(VMerge::Continue), 1), doc_cell(None, 1), doc_cell(None, 1)],
                },
                RawDocRow {
                    height: None,
                    cells: vec![doc_cell(Some(VMerge::Continue), 1), doc_cell(None, 2)],
                },
            ],
        };
        let document = RawDocument {
            body: vec![RawBlock::Table(table)],
            ..RawDocument::default()
        };
        let model = build_document(&document);
        let Block::Table(ref table) = model.blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[0].cells[0].row_span, 3);
        assert_eq!(table.rows[0].cells[1].col_span, 2);
        assert_eq!(table.rows[0].cells[0].width_px, Some(96.0));
        assert_eq!(table.rows[0].height_px, Some(20.0));
        assert_eq!(table.rows[1].cells.len(), 2);
        assert_eq!(table.rows[2].cells.len(), 1);
        assert_eq!(table.rows[1].height_px, None);
    }

    #[test]
    fn test_stray_continue_is_kept() {
        let table = RawDocTable {
            rows: vec![RawDocRow {
                height: None,
                cells: vec![doc_cell(Some(VMerge::Continue), 1)],
            }],
        };
        let model = build_document(&RawDocument {
            body: vec![RawBlock::Table(table)],
            ..RawDocument::default()
        });
        let Block::Table(ref table) = model.blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows[0].cells.len(), 1);
        assert_eq!(table.rows[0].cells[0].row_span, 1);
    }
}
