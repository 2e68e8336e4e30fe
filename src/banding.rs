//! Table header and row-stripe fills.
//!
//! Each table part on a sheet becomes a [`TableBandRegion`] before any row
//! is built; the style resolver then asks [`band_fill`] for the fill of a
//! cell and applies it only when the cell has no background of its own.

use crate::cell_ref::parse_cell_range;
use crate::color::resolve_color;
use crate::types::{RawFill, RawTable, StyleSheet, ThemePalette};

/// Header fill used for built-in table styles, whose definitions are not
/// stored in the package.
pub const BUILTIN_HEADER_FILL: &str = "D9D9D9";
/// First stripe fill used for built-in table styles.
pub const BUILTIN_STRIPE_FILL: &str = "F2F2F2";

/// Resolved banding for one table range. Bounds are 0-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBandRegion {
    pub start_row: u32,
    pub end_row: u32,
    pub start_col: u32,
    pub end_col: u32,
    pub header: Option<String>,
    pub stripe1: Option<String>,
    pub stripe2: Option<String>,
    /// Rows per stripe, at least 1.
    pub stripe_size: u32,
}

impl TableBandRegion {
    pub const fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    /// Fill for a row inside the region: header on the first row, then
    /// alternating stripes of `stripe_size` rows.
    pub fn fill_for_row(&self, row: u32) -> Option<&str> {
        if row == self.start_row {
            return self.header.as_deref();
        }
        let offset = row.checked_sub(self.start_row)?.checked_sub(1)?;
        let band = (offset / self.stripe_size.max(1)) % 2;
        if band == 0 {
            self.stripe1.as_deref()
        } else {
            self.stripe2.as_deref()
        }
    }
}

/// Resolve every table on a sheet. Tables with an unparsable range are
/// skipped.
pub fn resolve_table_bands(
    tables: &[RawTable],
    stylesheet: &StyleSheet,
    palette: Option<&ThemePalette>,
) -> Vec<TableBandRegion> {
    tables
        .iter()
        .filter_map(|table| {
            let Some((start_row, start_col, end_row, end_col)) =
                parse_cell_range(&table.reference)
            else {
                log::debug!("ignoring table with malformed range {:?}", table.reference);
                return None;
            };
            let mut region = TableBandRegion {
                start_row: start_row.min(end_row),
                end_row: start_row.max(end_row),
                start_col: start_col.min(end_col),
                end_col: start_col.max(end_col),
                header: None,
                stripe1: None,
                stripe2: None,
                stripe_size: 1,
            };
            apply_table_style(&mut region, table, stylesheet, palette);
            Some(region)
        })
        .collect()
}

fn apply_table_style(
    region: &mut TableBandRegion,
    table: &RawTable,
    stylesheet: &StyleSheet,
    palette: Option<&ThemePalette>,
) {
    if let Some(ref name) = table.style_name {
        // Built-in styles are not embedded; approximate them.
        if stylesheet.default_table_style.is_some() {
            region.header = Some(BUILTIN_HEADER_FILL.to_string());
            region.stripe1 = Some(BUILTIN_STRIPE_FILL.to_string());
            region.stripe_size = 1;
        }

        // An embedded definition with the same name overrides per element.
        if let Some(style) = stylesheet.table_style(name) {
            for element in &style.elements {
                let Some(color) = element
                    .dxf_id
                    .and_then(|id| stylesheet.dxf(id))
                    .and_then(|dxf| dxf.fill.as_ref())
                    .and_then(|fill| element_fill_color(fill, palette))
                else {
                    continue;
                };
                match element.kind.as_str() {
                    "headerRow" => region.header = Some(color),
                    "firstRowStripe" => {
                        region.stripe1 = Some(color);
                        if let Some(size) = element.size.filter(|s| *s > 0) {
                            region.stripe_size = size;
                        }
                    }
                    "secondRowStripe" => region.stripe2 = Some(color),
                    _ => {}
                }
            }
        }
    }

    // Without any stripe color, "show row stripes" falls back to the
    // table's data-area format.
    if region.stripe1.is_none() && table.show_row_stripes {
        region.stripe1 = table
            .data_dxf_id
            .and_then(|id| stylesheet.dxf(id))
            .and_then(|dxf| dxf.fill.as_ref())
            .and_then(|fill| fill.fg_color.as_ref())
            .and_then(|c| resolve_color(c, palette));
    }
}

/// Table style element fills put the visible color in `bgColor`; some
/// writers only fill `fgColor`.
fn element_fill_color(fill: &RawFill, palette: Option<&ThemePalette>) -> Option<String> {
    fill.bg_color
        .as_ref()
        .and_then(|c| resolve_color(c, palette))
        .or_else(|| fill.fg_color.as_ref().and_then(|c| resolve_color(c, palette)))
}

/// Band fill for (row, col) from the first region containing it.
pub fn band_fill(regions: &[TableBandRegion], row: u32, col: u32) -> Option<&str> {
    regions
        .iter()
        .find(|r| r.contains(row, col))
        .and_then(|r| r.fill_for_row(row))
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
    use crate::types::{ColorRef, Dxf, TableStyleDef, TableStyleElement};
    use test_case::test_case;

    fn table(reference: &str, style: Option<&str>) -> RawTable {
        RawTable {
            reference: reference.to_string(),
            style_name: style.map(str::to_string),
            show_row_stripes: true,
            data_dxf_id: None,
        }
    }

    fn builtin_sheet() -> StyleSheet {
        StyleSheet {
            default_table_style: Some("TableStyleMedium2".to_string()),
            ..StyleSheet::default()
        }
    }

    fn dxf(color: &str) -> Dxf {
        Dxf {
            fill: Some(RawFill {
                pattern_type: None,
                fg_color: None,
                bg_color: Some(ColorRef::Rgb(color.to_string())),
            }),
        }
    }

    #[test_case(5, Some("D9D9D9") ; "header row")]
    #[test_case(6, Some("F2F2F2") ; "first stripe")]
    #[test_case(7, None ; "second stripe unset")]
    #[test_case(8, Some("F2F2F2") ; "third band")]
    #[test_case(9, None ; "fourth band")]
    #[test_case(10, Some("F2F2F2") ; "last row")]
    #[test_case(11, None ; "below the table")]
    fn test_builtin_banding(row: u32, expected: Option<&str>) {
        // Rows 6-11 in A1 notation are 5-10 zero-based.
        let regions = resolve_table_bands(&[table("A6:C11", Some("TableStyleMedium2"))], &builtin_sheet(), None);
        assert_eq!(band_fill(&regions, row, 1), expected);
    }

    #[test]
    fn test_outside_columns() {
        let regions = resolve_table_bands(&[table("B2:C4", Some("X"))], &builtin_sheet(), None);
        assert_eq!(band_fill(&regions, 1, 0), None);
        assert_eq!(band_fill(&regions, 1, 3), None);
        assert_eq!(band_fill(&regions, 1, 2), Some(BUILTIN_HEADER_FILL));
    }

    #[test]
    fn test_named_style_overrides_builtin() {
        let sheet = StyleSheet {
            dxfs: vec![dxf("FF112233"), dxf("FF445566"), dxf("FF778899")],
            table_styles: vec![TableStyleDef {
                name: "Custom".to_string(),
                elements: vec![
                    TableStyleElement { kind: "headerRow".to_string(), dxf_id: Some(0), size: None },
                    TableStyleElement { kind: "firstRowStripe".to_string(), dxf_id: Some(1), size: Some(2) },
                    TableStyleElement { kind: "secondRowStripe".to_string(), dxf_id: Some(2), size: None },
                    TableStyleElement { kind: "wholeTable".to_string(), dxf_id: Some(0), size: None },
                ],
            }],
            ..builtin_sheet()
        };
        let regions = resolve_table_bands(&[table("A1:A10", Some("Custom"))], &sheet, None);
        let region = &regions[0];
        assert_eq!(region.header.as_deref(), Some("112233"));
        assert_eq!(region.stripe_size, 2);
        let fills: Vec<Option<&str>> = (0..7).map(|r| region.fill_for_row(r)).collect();
        assert_eq!(
            fills,
            vec![
                Some("112233"),
                Some("445566"),
                Some("445566"),
                Some("778899"),
                Some("778899"),
                Some("445566"),
                Some("445566"),
            ]
        );
    }

    #[test]
    fn test_unknown_style_without_builtin_default() {
        let regions = resolve_table_bands(&[table("A1:B3", Some("Missing"))], &StyleSheet::default(), None);
        assert_eq!(regions[0].header, None);
        assert_eq!(regions[0].stripe1, None);
    }

    #[test]
    fn test_row_stripes_fall_back_to_data_dxf() {
        let sheet = StyleSheet {
            dxfs: vec![Dxf {
                fill: Some(RawFill {
                    pattern_type: Some("solid".to_string()),
                    fg_color: Some(ColorRef::Rgb("FFDDEBF7".to_string())),
                    bg_color: None,
                }),
            }],
            ..StyleSheet::default()
        };
        let mut raw = table("A1:B5", None);
        raw.data_dxf_id = Some(0);
        let regions = resolve_table_bands(&[raw.clone()], &sheet, None);
        assert_eq!(regions[0].stripe1.as_deref(), Some("DDEBF7"));
        assert_eq!(band_fill(&regions, 1, 0), Some("DDEBF7"));

        raw.show_row_stripes = false;
        let regions = resolve_table_bands(&[raw], &sheet, None);
        assert_eq!(regions[0].stripe1, None);
    }

    #[test]
    fn test_first_region_wins_and_bad_ranges_skipped() {
        let regions = resolve_table_bands(
            &[table("nonsense", Some("X")), table("A1:C3", Some("X")), table("B2:D4", Some("X"))],
            &builtin_sheet(),
            None,
        );
        assert_eq!(regions.len(), 2);
        // (1,1) is a stripe row of the first table, not the header of the second.
        assert_eq!(band_fill(&regions, 1, 1), Some(BUILTIN_STRIPE_FILL));
        assert_eq!(band_fill(&regions, 1, 3), Some(BUILTIN_HEADER_FILL));
    }
}
