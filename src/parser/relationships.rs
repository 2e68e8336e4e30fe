//! Relationship parsing - package relationships, workbook sheet list,
//! shared strings and theme.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::{ConvertError, Result};
use crate::rich_text::parse_string_item;
use crate::types::{SharedString, Theme, ThemePalette};
use crate::xml_helpers::attr_string;

/// A single `<Relationship>` with its target resolved to a package path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Full package path, e.g. "xl/worksheets/sheet1.xml".
    pub target: String,
}

/// Workbook relationships parsed from xl/_rels/workbook.xml.rels
#[derive(Default, Debug)]
pub(super) struct WorkbookRelationships {
    /// rId -> full path for worksheet relationships
    pub worksheets: HashMap<String, String>,
    pub shared_strings: Option<String>,
    pub styles: Option<String>,
    pub theme: Option<String>,
}

/// Sheet metadata from workbook.xml
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Path of the relationships part belonging to `part`:
/// "xl/worksheets/sheet1.xml" -> "xl/worksheets/_rels/sheet1.xml.rels".
pub(super) fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub(super) fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Parse a relationships part. The part is optional; a missing or broken
/// file yields no relationships.
pub(super) fn parse_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    rels_path: &str,
    base_dir: &str,
) -> Vec<Relationship> {
    let mut rels = Vec::new();

    let Ok(file) = archive.by_name(rels_path) else {
        return rels;
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    // External targets (hyperlinks) never point into the package.
                    let external = attr_string(e, b"TargetMode").as_deref() == Some("External");
                    let id = attr_string(e, b"Id").unwrap_or_default();
                    let rel_type = attr_string(e, b"Type").unwrap_or_default();
                    let target = attr_string(e, b"Target").unwrap_or_default();
                    if !external && !id.is_empty() && !target.is_empty() {
                        rels.push(Relationship {
                            id,
                            rel_type,
                            target: resolve_target(base_dir, &target),
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("{rels_path}: {e}; ignoring remaining relationships");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// Parse workbook relationships from xl/_rels/workbook.xml.rels
pub(super) fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> WorkbookRelationships {
    let mut rels = WorkbookRelationships::default();

    for rel in parse_relationships(archive, "xl/_rels/workbook.xml.rels", "xl") {
        // Categorize by relationship type
        if rel.rel_type.ends_with("/worksheet") {
            rels.worksheets.insert(rel.id, rel.target);
        } else if rel.rel_type.ends_with("/sharedStrings") {
            rels.shared_strings = Some(rel.target);
        } else if rel.rel_type.ends_with("/styles") {
            rels.styles = Some(rel.target);
        } else if rel.rel_type.ends_with("/theme") {
            rels.theme = Some(rel.target);
        }
    }

    rels
}

/// Get sheet names and paths from xl/workbook.xml, plus the date1904 flag.
///
/// The workbook part is required.
pub(super) fn get_sheet_info<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    relationships: &HashMap<String, String>,
) -> Result<(Vec<SheetInfo>, bool)> {
    let file = archive
        .by_name("xl/workbook.xml")
        .map_err(|_| ConvertError::MissingPart("xl/workbook.xml".to_string()))?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut sheets = Vec::new();
    let mut date1904 = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    if let Some(val) = attr_string(e, b"date1904") {
                        date1904 = val == "1" || val.eq_ignore_ascii_case("true");
                    }
                }
                b"sheet" => {
                    let mut name = String::new();
                    let mut r_id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => {
                                name = attr
                                    .unescape_value()
                                    .map(|v| v.into_owned())
                                    .unwrap_or_default();
                            }
                            // r:id attribute (namespace prefixed)
                            key if key.ends_with(b":id") => {
                                r_id = std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                            }
                            _ => {}
                        }
                    }

                    if !name.is_empty() {
                        let path = relationships.get(&r_id).cloned().unwrap_or_else(|| {
                            let idx = sheets.len() + 1;
                            format!("xl/worksheets/sheet{idx}.xml")
                        });
                        sheets.push(SheetInfo { name, path });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, date1904))
}

/// Color scheme element names in palette slot order.
const SCHEME_SLOTS: [&[u8]; 12] = [
    b"dk1", b"lt1", b"dk2", b"lt2", b"accent1", b"accent2", b"accent3", b"accent4", b"accent5",
    b"accent6", b"hlink", b"folHlink",
];

/// Parse theme colors and fonts from a theme part.
///
/// Returns `None` when the part is absent; slots that the part does not
/// define stay unset.
pub(crate) fn parse_theme<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Option<Theme> {
    let Ok(file) = archive.by_name(path) else {
        log::debug!("no theme part at {path}");
        return None;
    };
    Some(parse_theme_xml(BufReader::new(file)))
}

pub(crate) fn parse_theme_xml<B: std::io::BufRead>(reader: B) -> Theme {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut theme = Theme {
        palette: ThemePalette::default(),
        major_font: None,
        minor_font: None,
    };
    let mut buf = Vec::new();
    let mut slot: Option<usize> = None;
    let mut in_clr_scheme = false;
    let mut in_major_font = false;
    let mut in_minor_font = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
                let local_name = e.local_name();
                let name = local_name.as_ref();

                match name {
                    b"clrScheme" => in_clr_scheme = true,
                    b"majorFont" => in_major_font = true,
                    b"minorFont" => in_minor_font = true,
                    _ => {}
                }

                if in_clr_scheme {
                    if let Some(idx) = SCHEME_SLOTS.iter().position(|s| *s == name) {
                        slot = Some(idx);
                    }
                    let value = match name {
                        b"srgbClr" => attr_string(e, b"val"),
                        b"sysClr" => attr_string(e, b"lastClr"),
                        _ => None,
                    };
                    if let (Some(idx), Some(value)) = (slot, value) {
                        if let Some(entry) = theme.palette.slots.get_mut(idx) {
                            if entry.is_none() {
                                *entry = Some(value);
                            }
                        }
                    }
                }

                // Font typeface from the latin element
                if name == b"latin" {
                    let typeface = attr_string(e, b"typeface").filter(|t| !t.is_empty());
                    if in_major_font && theme.major_font.is_none() {
                        theme.major_font = typeface;
                    } else if in_minor_font && theme.minor_font.is_none() {
                        theme.minor_font = typeface;
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"clrScheme" => in_clr_scheme = false,
                b"majorFont" => in_major_font = false,
                b"minorFont" => in_minor_font = false,
                name if SCHEME_SLOTS.iter().any(|s| *s == name) => slot = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("theme: {e}; keeping colors parsed so far");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    theme
}

/// Parse shared strings. The part is optional.
pub(super) fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<SharedString> {
    let sst_path = path.unwrap_or("xl/sharedStrings.xml");
    let Ok(file) = archive.by_name(sst_path) else {
        return Vec::new();
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(parse_string_item(&mut xml, b"si"));
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(SharedString::default());
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("{sst_path}: {e}; {} strings recovered", strings.len());
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    strings
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(
            resolve_target("xl/worksheets", "../tables/table1.xml"),
            "xl/tables/table1.xml"
        );
        assert_eq!(resolve_target("xl", "/xl/styles.xml"), "xl/styles.xml");
        assert_eq!(resolve_target("word", "./theme/theme1.xml"), "word/theme/theme1.xml");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("xl/worksheets/sheet2.xml"),
            "xl/worksheets/_rels/sheet2.xml.rels"
        );
        assert_eq!(rels_path_for("word/document.xml"), "word/_rels/document.xml.rels");
    }

    #[test]
    fn test_theme_slots_follow_scheme_order() {
        let xml = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
          <a:themeElements>
            <a:clrScheme name="Office">
              <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
              <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
              <a:dk2><a:srgbClr val="44546A"/></a:dk2>
              <a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>
              <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
              <a:folHlink><a:srgbClr val="954F72"/></a:folHlink>
            </a:clrScheme>
            <a:fontScheme name="Office">
              <a:majorFont><a:latin typeface="Calibri Light"/></a:majorFont>
              <a:minorFont><a:latin typeface="Calibri"/></a:minorFont>
            </a:fontScheme>
          </a:themeElements>
        </a:theme>"#;
        let theme = parse_theme_xml(xml.as_bytes());
        assert_eq!(theme.palette.slot(0), Some("000000"));
        assert_eq!(theme.palette.slot(1), Some("FFFFFF"));
        assert_eq!(theme.palette.slot(2), Some("44546A"));
        assert_eq!(theme.palette.slot(4), Some("4472C4"));
        assert_eq!(theme.palette.slot(5), None);
        assert_eq!(theme.palette.slot(11), Some("954F72"));
        assert_eq!(theme.major_font.as_deref(), Some("Calibri Light"));
        assert_eq!(theme.minor_font.as_deref(), Some("Calibri"));
    }
}
