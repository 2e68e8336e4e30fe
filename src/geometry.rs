//! Sheet geometry: column count, column widths, row heights and merges.
//!
//! Sizes are the usual spreadsheet approximations, kept as named constants
//! so the rendered grid matches what desktop viewers show.

use std::collections::HashMap;

use crate::cell_ref::parse_cell_range;
use crate::types::{ColumnDef, RawRow, RawSheet};

/// Pixels per character of column width.
pub const PX_PER_CHAR: f64 = 8.3;
/// Column width in characters when no custom width is set.
pub const DEFAULT_COL_WIDTH_CHARS: f64 = 8.43;
/// Pixels per point of row height.
pub const PX_PER_PT: f64 = 1.333;
/// Row height in points when no custom height is set.
pub const DEFAULT_ROW_HEIGHT_PT: f64 = 15.0;

pub const DEFAULT_COL_WIDTH_PX: f64 = DEFAULT_COL_WIDTH_CHARS * PX_PER_CHAR;
pub const DEFAULT_ROW_HEIGHT_PX: f64 = DEFAULT_ROW_HEIGHT_PT * PX_PER_PT;

/// Widest sheet the format allows (`XFD`).
pub const MAX_COLUMNS: u32 = 16_384;
/// Tallest sheet the format allows.
pub const MAX_ROWS: u32 = 1_048_576;

/// Upper bound on the number of grid positions all merges of one sheet may
/// cover. Larger declarations are ignored.
pub const MAX_MERGED_CELLS: u64 = 1_000_000;

/// A merged rectangle: master position plus spans (both at least 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSpan {
    pub row: u32,
    pub col: u32,
    pub row_span: u32,
    pub col_span: u32,
}

impl MergeSpan {
    pub const fn end_row(&self) -> u32 {
        self.row + self.row_span - 1
    }

    pub const fn end_col(&self) -> u32 {
        self.col + self.col_span - 1
    }

    pub fn area(&self) -> u64 {
        u64::from(self.row_span) * u64::from(self.col_span)
    }

    fn positions(self) -> impl Iterator<Item = (u32, u32)> {
        (self.row..=self.end_row()).flat_map(move |r| (self.col..=self.end_col()).map(move |c| (r, c)))
    }
}

/// Merge lookup for one sheet.
#[derive(Debug, Clone, Default)]
pub struct MergeMap {
    /// Accepted spans in declaration order.
    spans: Vec<MergeSpan>,
    /// Master position -> index into `spans`.
    masters: HashMap<(u32, u32), usize>,
    /// Covered (non-master) position -> master position.
    covered: HashMap<(u32, u32), (u32, u32)>,
}

impl MergeMap {
    /// Build from `mergeCell@ref` values.
    ///
    /// Malformed references, reversed ranges and single-cell ranges are
    /// skipped. A range overlapping an earlier accepted one, or one that would
    /// push the sheet past [`MAX_MERGED_CELLS`], is ignored with a warning.
    pub fn build(refs: &[String]) -> Self {
        let mut map = Self::default();
        let mut total_cells: u64 = 0;

        for reference in refs {
            let Some((start_row, start_col, end_row, end_col)) = parse_cell_range(reference) else {
                log::debug!("ignoring malformed merge range {reference:?}");
                continue;
            };
            if end_row < start_row || end_col < start_col {
                log::debug!("ignoring reversed merge range {reference:?}");
                continue;
            }
            let span = MergeSpan {
                row: start_row,
                col: start_col,
                row_span: end_row - start_row + 1,
                col_span: end_col - start_col + 1,
            };
            if span.area() == 1 {
                continue;
            }
            if total_cells + span.area() > MAX_MERGED_CELLS {
                log::warn!("ignoring merge range {reference}: too many merged cells");
                continue;
            }
            if map.overlaps(&span) {
                log::warn!("ignoring merge range {reference}: overlaps an earlier merge");
                continue;
            }

            total_cells += span.area();
            let master = (span.row, span.col);
            map.masters.insert(master, map.spans.len());
            for position in span.positions().skip(1) {
                map.covered.insert(position, master);
            }
            map.spans.push(span);
        }

        map
    }

    fn overlaps(&self, span: &MergeSpan) -> bool {
        self.spans.iter().any(|other| {
            span.row <= other.end_row()
                && other.row <= span.end_row()
                && span.col <= other.end_col()
                && other.col <= span.end_col()
        })
    }

    /// The span whose master sits at (row, col).
    pub fn master_at(&self, row: u32, col: u32) -> Option<&MergeSpan> {
        self.masters.get(&(row, col)).and_then(|&i| self.spans.get(i))
    }

    /// Master position of the merge covering (row, col), excluding masters.
    pub fn covered_by(&self, row: u32, col: u32) -> Option<(u32, u32)> {
        self.covered.get(&(row, col)).copied()
    }

    pub fn spans(&self) -> &[MergeSpan] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Exclusive row bound of all merges.
    pub fn row_extent(&self) -> u32 {
        self.spans.iter().map(|s| s.end_row() + 1).max().unwrap_or(0)
    }

    /// Exclusive column bound of all merges.
    pub fn col_extent(&self) -> u32 {
        self.spans.iter().map(|s| s.end_col() + 1).max().unwrap_or(0)
    }
}

/// Number of columns: one past the highest occupied column, widened to
/// cover every merge.
pub fn column_count(sheet: &RawSheet, merges: &MergeMap) -> u32 {
    let occupied = sheet
        .rows
        .iter()
        .flat_map(|row| row.cells.iter())
        .map(|cell| cell.col.saturating_add(1))
        .max()
        .unwrap_or(0);
    let count = occupied.max(merges.col_extent());
    if count > MAX_COLUMNS {
        log::warn!("{}: {count} columns exceed {MAX_COLUMNS}, extra columns dropped", sheet.name);
        return MAX_COLUMNS;
    }
    count
}

/// Number of rows: one past the highest declared row or merge.
pub fn row_count(sheet: &RawSheet, merges: &MergeMap) -> u32 {
    let declared = sheet
        .rows
        .iter()
        .map(|row| row.index.saturating_add(1))
        .max()
        .unwrap_or(0);
    let count = declared.max(merges.row_extent());
    if count > MAX_ROWS {
        log::warn!("{}: {count} rows exceed {MAX_ROWS}, extra rows dropped", sheet.name);
        return MAX_ROWS;
    }
    count
}

/// Pixel widths and hidden flags for the first `count` columns.
///
/// Later `<col>` spans override earlier ones for the columns they share.
pub fn column_layout(columns: &[ColumnDef], count: u32) -> (Vec<f64>, Vec<bool>) {
    let len = usize::try_from(count).unwrap_or(0);
    let mut widths = vec![DEFAULT_COL_WIDTH_PX; len];
    let mut hidden = vec![false; len];

    for def in columns {
        let width = match def.width {
            Some(w) if def.custom_width && w.is_finite() && w >= 0.0 => w * PX_PER_CHAR,
            _ => DEFAULT_COL_WIDTH_PX,
        };
        // min/max are 1-based.
        let first = def.min.saturating_sub(1);
        let last = def.max.min(count);
        for col in first..last {
            let Ok(i) = usize::try_from(col) else { break };
            if let Some(slot) = widths.get_mut(i) {
                *slot = width;
            }
            if let Some(slot) = hidden.get_mut(i) {
                *slot = def.hidden;
            }
        }
    }

    (widths, hidden)
}

/// Pixel height and hidden flag of a row; `None` is a materialized gap row.
pub fn row_layout(row: Option<&RawRow>) -> (f64, bool) {
    let Some(row) = row else {
        return (DEFAULT_ROW_HEIGHT_PX, false);
    };
    let height = match row.height {
        Some(ht) if row.custom_height && ht.is_finite() && ht >= 0.0 => ht * PX_PER_PT,
        _ => DEFAULT_ROW_HEIGHT_PX,
    };
    (height, row.hidden)
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
    use crate::types::{CellContent, RawCell};

    fn refs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_two_by_two_merge() {
        let map = MergeMap::build(&refs(&["A1:B2"]));
        let span = map.master_at(0, 0).unwrap();
        assert_eq!((span.row_span, span.col_span), (2, 2));
        for (r, c) in [(0, 1), (1, 0), (1, 1)] {
            assert_eq!(map.covered_by(r, c), Some((0, 0)));
            assert!(map.master_at(r, c).is_none());
        }
        assert_eq!(map.covered_by(0, 0), None);
        assert_eq!(map.covered_by(2, 2), None);
    }

    #[test]
    fn test_malformed_and_degenerate_merges_ignored() {
        let map = MergeMap::build(&refs(&["", "A1:", "1A:B2", "C3:A1", "D4:D4", "B1:C1"]));
        assert_eq!(map.spans().len(), 1);
        assert_eq!(map.spans()[0], MergeSpan { row: 0, col: 1, row_span: 1, col_span: 2 });
    }

    #[test]
    fn test_overlapping_merge_ignored() {
        let map = MergeMap::build(&refs(&["A1:B2", "B2:C3", "C1:C2"]));
        assert_eq!(map.spans().len(), 2);
        assert!(map.master_at(1, 1).is_none());
        assert!(map.master_at(0, 2).is_some());
    }

    #[test]
    fn test_oversized_merge_ignored() {
        let map = MergeMap::build(&refs(&["A1:XFD1048576", "A1:A2"]));
        assert_eq!(map.spans().len(), 1);
        assert_eq!(map.spans()[0].row_span, 2);
    }

    #[test]
    fn test_every_covered_position_maps_to_one_master() {
        let map = MergeMap::build(&refs(&["B2:D4", "F1:F3"]));
        for span in map.spans() {
            let covered = (span.row..=span.end_row())
                .flat_map(|r| (span.col..=span.end_col()).map(move |c| (r, c)))
                .filter(|&(r, c)| map.covered_by(r, c) == Some((span.row, span.col)))
                .count();
            assert_eq!(u64::try_from(covered).unwrap() + 1, span.area());
        }
    }

    #[test]
    fn test_column_layout() {
        let cols = vec![
            ColumnDef { min: 1, max: 1, width: Some(20.0), custom_width: true, hidden: false },
            ColumnDef { min: 2, max: 3, width: Some(30.0), custom_width: false, hidden: true },
            ColumnDef { min: 3, max: 100, width: Some(10.0), custom_width: true, hidden: false },
        ];
        let (widths, hidden) = column_layout(&cols, 4);
        assert_eq!(widths.len(), 4);
        assert!((widths[0] - 166.0).abs() < 1e-9);
        assert!((widths[1] - DEFAULT_COL_WIDTH_PX).abs() < 1e-9);
        assert!((widths[2] - 83.0).abs() < 1e-9);
        assert!((widths[3] - 83.0).abs() < 1e-9);
        assert_eq!(hidden, vec![false, true, false, false]);
    }

    #[test]
    fn test_row_layout() {
        let (h, hidden) = row_layout(None);
        assert!((h - 19.995).abs() < 1e-9);
        assert!(!hidden);

        let row = RawRow { index: 0, height: Some(30.0), custom_height: true, hidden: true, cells: vec![] };
        let (h, hidden) = row_layout(Some(&row));
        assert!((h - 39.99).abs() < 1e-9);
        assert!(hidden);

        let row = RawRow { height: Some(30.0), custom_height: false, ..row };
        assert!((row_layout(Some(&row)).0 - DEFAULT_ROW_HEIGHT_PX).abs() < 1e-9);
    }

    #[test]
    fn test_counts_include_merges() {
        let sheet = RawSheet {
            rows: vec![RawRow {
                index: 4,
                cells: vec![RawCell { row: 4, col: 2, style_id: None, content: CellContent::Number(1.0) }],
                ..RawRow::default()
            }],
            ..RawSheet::default()
        };
        let merges = MergeMap::build(&refs(&["E7:F8"]));
        assert_eq!(column_count(&sheet, &merges), 6);
        assert_eq!(row_count(&sheet, &merges), 8);
        assert_eq!(column_count(&sheet, &MergeMap::default()), 3);
    }

    #[test]
    fn test_counts_capped_at_sheet_limits() {
        let sheet = RawSheet {
            name: "S".to_string(),
            rows: vec![
                RawRow { index: u32::MAX, ..RawRow::default() },
                RawRow {
                    index: 0,
                    cells: vec![RawCell { row: 0, col: 25_000_000, style_id: None, content: CellContent::Empty }],
                    ..RawRow::default()
                },
            ],
            ..RawSheet::default()
        };
        assert_eq!(column_count(&sheet, &MergeMap::default()), MAX_COLUMNS);
        assert_eq!(row_count(&sheet, &MergeMap::default()), MAX_ROWS);
    }
}
