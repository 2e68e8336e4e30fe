//! Worksheet parsing - reads one sheet part into a [`RawSheet`].
//!
//! Nothing is resolved here: style ids stay ids, merge references stay
//! strings. Rows and cells are kept in document order.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::rich_text::{parse_string_item, read_text_content, skip_element};
use crate::types::{CellContent, ColumnDef, RawCell, RawRow, RawSheet};
use crate::xml_helpers::{attr_bool_default, attr_f64, attr_string, attr_u32};

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Number,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Number,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    seen.then_some(num)
}

/// Sheet contents plus the relationship ids of its table parts.
#[derive(Debug, Default)]
pub(super) struct ParsedSheet {
    pub sheet: RawSheet,
    pub table_part_ids: Vec<String>,
}

/// Parse a single worksheet
#[allow(clippy::too_many_lines)]
pub(super) fn parse_sheet<R: BufRead>(reader: R, name: &str) -> Result<ParsedSheet> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut parsed = ParsedSheet {
        sheet: RawSheet {
            name: name.to_string(),
            ..RawSheet::default()
        },
        table_part_ids: Vec::new(),
    };
    let sheet = &mut parsed.sheet;

    let mut buf = Vec::new();
    let mut current_row: Option<RawRow> = None;
    let mut next_row_index: u32 = 0;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"col" => {
                        let min = attr_u32(e, b"min").unwrap_or(0);
                        let max = attr_u32(e, b"max").unwrap_or(min);
                        if min == 0 || max < min {
                            log::debug!("{name}: ignoring <col> with min={min} max={max}");
                        } else {
                            sheet.columns.push(ColumnDef {
                                min,
                                max,
                                width: attr_f64(e, b"width"),
                                custom_width: attr_bool_default(e, b"customWidth", false),
                                hidden: attr_bool_default(e, b"hidden", false),
                            });
                        }
                    }

                    b"row" => {
                        // `r` is 1-based and optional; without it rows follow on.
                        let index = attr_u32(e, b"r")
                            .and_then(|r| r.checked_sub(1))
                            .unwrap_or(next_row_index);
                        next_row_index = index.saturating_add(1);

                        let row = RawRow {
                            index,
                            height: attr_f64(e, b"ht"),
                            custom_height: attr_bool_default(e, b"customHeight", false),
                            hidden: attr_bool_default(e, b"hidden", false),
                            cells: Vec::new(),
                        };
                        if is_start_event {
                            current_row = Some(row);
                        } else {
                            sheet.rows.push(row);
                        }
                    }

                    b"c" => {
                        if let Some(ref mut row) = current_row {
                            let cell = parse_cell(&mut xml, e, row, is_start_event);
                            row.cells.push(cell);
                        }
                    }

                    b"mergeCell" => {
                        if let Some(reference) = attr_string(e, b"ref") {
                            sheet.merge_refs.push(reference);
                        }
                    }

                    b"tablePart" => {
                        for attr in e.attributes().flatten() {
                            // r:id attribute (namespace prefixed)
                            if attr.key.local_name().as_ref() == b"id" {
                                if let Ok(id) = std::str::from_utf8(&attr.value) {
                                    parsed.table_part_ids.push(id.to_string());
                                }
                            }
                        }
                    }

                    _ => {}
                }
            }

            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"row" {
                    if let Some(row) = current_row.take() {
                        sheet.rows.push(row);
                    }
                }
            }

            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(parsed)
}

/// Read one `<c>` element, consuming its children when it is a start tag.
fn parse_cell<R: BufRead>(
    xml: &mut Reader<R>,
    e: &BytesStart,
    row: &RawRow,
    is_start_event: bool,
) -> RawCell {
    let mut position: Option<(u32, u32)> = None;
    let mut cell_type = CellTypeTag::Number;
    let mut style_id: Option<u32> = None;

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"r" => position = parse_cell_ref_bytes(&attr.value),
            b"t" => cell_type = parse_cell_type_tag(&attr.value),
            b"s" => style_id = parse_u32_bytes(&attr.value),
            _ => {}
        }
    }

    // Cells without a usable reference follow the previous one in the row.
    let col = match position {
        Some((col, _)) => col,
        None => row
            .cells
            .last()
            .map_or(0, |prev| prev.col.saturating_add(1)),
    };

    let mut value: Option<String> = None;
    let mut inline = None;

    // Self-closing cells like <c r="A1" s="3"/> have no children.
    if is_start_event {
        let mut cell_buf = Vec::new();
        loop {
            match xml.read_event_into(&mut cell_buf) {
                Ok(Event::Start(ref inner)) => match inner.local_name().as_ref() {
                    b"v" => value = Some(read_text_content(xml)),
                    b"is" => inline = Some(parse_string_item(xml, b"is")),
                    b"f" => skip_element(xml, b"f"),
                    _ => {}
                },
                Ok(Event::End(ref inner)) if inner.local_name().as_ref() == b"c" => break,
                Ok(Event::Eof) | Err(_) => break,
                _ => {}
            }
            cell_buf.clear();
        }
    }

    let content = match (cell_type, value) {
        (CellTypeTag::Inline, _) => inline.map_or(CellContent::Empty, CellContent::InlineString),
        (_, None) => CellContent::Empty,
        (CellTypeTag::Shared, Some(v)) => match v.trim().parse::<usize>() {
            Ok(idx) => CellContent::SharedString(idx),
            Err(_) => {
                log::debug!("row {}: bad shared string index {v:?}", row.index + 1);
                CellContent::Empty
            }
        },
        (CellTypeTag::Bool, Some(v)) => CellContent::Bool(matches!(v.trim(), "1" | "true")),
        (CellTypeTag::Error, Some(v)) => CellContent::Error(v),
        (CellTypeTag::Str | CellTypeTag::Date, Some(v)) => CellContent::Text(v),
        (CellTypeTag::Number, Some(v)) => match v.trim().parse::<f64>() {
            Ok(n) => CellContent::Number(n),
            Err(_) => CellContent::Text(v),
        },
    };

    RawCell {
        row: row.index,
        col,
        style_id,
        content,
    }
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

    fn parse(body: &str) -> ParsedSheet {
        let xml = format!(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{body}</worksheet>"#
        );
        parse_sheet(xml.as_bytes(), "Sheet1").unwrap()
    }

    #[test]
    fn test_columns_and_rows() {
        let parsed = parse(concat!(
            r#"<cols><col min="1" max="2" width="20" customWidth="1"/><col min="4" max="4" width="5" hidden="1"/></cols>"#,
            r#"<sheetData><row r="3" ht="30" customHeight="1" hidden="1"><c r="B3"><v>1</v></c></row></sheetData>"#
        ));
        let sheet = parsed.sheet;
        assert_eq!(sheet.columns.len(), 2);
        assert!(sheet.columns[0].custom_width);
        assert_eq!(sheet.columns[0].width, Some(20.0));
        assert!(sheet.columns[1].hidden);
        assert!(!sheet.columns[1].custom_width);

        assert_eq!(sheet.rows.len(), 1);
        let row = &sheet.rows[0];
        assert_eq!(row.index, 2);
        assert_eq!(row.height, Some(30.0));
        assert!(row.custom_height && row.hidden);
        assert_eq!(row.cells[0].col, 1);
        assert_eq!(row.cells[0].row, 2);
    }

    #[test]
    fn test_cell_types() {
        let parsed = parse(concat!(
            "<sheetData><row r=\"1\">",
            r#"<c r="A1" t="s" s="2"><v>0</v></c>"#,
            r#"<c r="B1"><v>3.5</v></c>"#,
            r#"<c r="C1" t="b"><v>1</v></c>"#,
            r#"<c r="D1" t="e"><v>#DIV/0!</v></c>"#,
            r#"<c r="E1" t="str"><f>A1&amp;"x"</f><v>hi x</v></c>"#,
            r#"<c r="F1" t="inlineStr"><is><t>inline</t></is></c>"#,
            r#"<c r="G1" s="4"/>"#,
            "</row></sheetData>"
        ));
        let cells = &parsed.sheet.rows[0].cells;
        assert_eq!(cells.len(), 7);
        assert_eq!(cells[0].content, CellContent::SharedString(0));
        assert_eq!(cells[0].style_id, Some(2));
        assert_eq!(cells[1].content, CellContent::Number(3.5));
        assert_eq!(cells[2].content, CellContent::Bool(true));
        assert_eq!(cells[3].content, CellContent::Error("#DIV/0!".to_string()));
        assert_eq!(cells[4].content, CellContent::Text("hi x".to_string()));
        match &cells[5].content {
            CellContent::InlineString(s) => assert_eq!(s.text, "inline"),
            other => panic!("expected inline string, got {other:?}"),
        }
        assert_eq!(cells[6].content, CellContent::Empty);
        assert_eq!(cells[6].style_id, Some(4));
    }

    #[test]
    fn test_rows_without_reference_follow_on() {
        let parsed = parse(
            "<sheetData><row r=\"5\"><c><v>1</v></c><c><v>2</v></c></row><row><c r=\"C6\"><v>3</v></c></row></sheetData>",
        );
        let rows = &parsed.sheet.rows;
        assert_eq!(rows[0].index, 4);
        assert_eq!(rows[0].cells[0].col, 0);
        assert_eq!(rows[0].cells[1].col, 1);
        assert_eq!(rows[1].index, 5);
        assert_eq!(rows[1].cells[0].col, 2);
    }

    #[test]
    fn test_merges_and_table_parts() {
        let parsed = parse(concat!(
            "<sheetData/>",
            r#"<mergeCells count="2"><mergeCell ref="A1:B2"/><mergeCell ref="bogus"/></mergeCells>"#,
            r#"<tableParts count="1"><tablePart r:id="rId3"/></tableParts>"#
        ));
        assert_eq!(parsed.sheet.merge_refs, vec!["A1:B2", "bogus"]);
        assert_eq!(parsed.table_part_ids, vec!["rId3"]);
    }

    #[test]
    fn test_truncated_sheet_is_an_error() {
        assert!(parse_sheet("<worksheet><sheetData><row r=\"1\"></worksheet>".as_bytes(), "S").is_err());
    }
}
