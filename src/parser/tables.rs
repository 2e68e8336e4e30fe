//! Table part parsing (`xl/tables/tableN.xml`).

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;

use crate::types::RawTable;
use crate::xml_helpers::{attr_bool_default, attr_string, attr_u32};

/// Parse one table definition. Returns `None` for a part without a range or
/// with broken XML; the table then simply contributes no banding.
pub(super) fn parse_table<R: BufRead>(reader: R, path: &str) -> Option<RawTable> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut table: Option<RawTable> = None;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"table" => {
                    let Some(reference) = attr_string(e, b"ref") else {
                        log::debug!("{path}: table without ref");
                        return None;
                    };
                    table = Some(RawTable {
                        reference,
                        style_name: None,
                        show_row_stripes: false,
                        data_dxf_id: attr_u32(e, b"dataDxfId"),
                    });
                }
                b"tableStyleInfo" => {
                    if let Some(ref mut t) = table {
                        t.style_name = attr_string(e, b"name").filter(|n| !n.is_empty());
                        t.show_row_stripes = attr_bool_default(e, b"showRowStripes", false);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("{path}: {e}; table ignored");
                return None;
            }
            _ => {}
        }
        buf.clear();
    }

    table
}
