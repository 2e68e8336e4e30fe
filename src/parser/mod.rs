//! Package readers for XLSX and DOCX.
//!
//! Orchestrates the parsing of all parts from the ZIP archive into the raw
//! object graphs in [`crate::types`]. Required parts fail the conversion;
//! optional ones degrade to empty tables.

mod document;
mod document_styles;
mod relationships;
pub(crate) mod styles;
mod tables;
mod worksheet;

use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::{ConvertError, Result};
use crate::types::{DocProperties, DocStyles, RawDocument, RawSheet, RawWorkbook, StyleSheet};

use relationships::{
    get_sheet_info, parse_relationships, parse_shared_strings, parse_theme,
    parse_workbook_relationships, rels_path_for,
};

const DEFAULT_WORKBOOK_THEME: &str = "xl/theme/theme1.xml";
const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";
const DEFAULT_DOCUMENT_THEME: &str = "word/theme/theme1.xml";
const DEFAULT_DOCUMENT_STYLES: &str = "word/styles.xml";
const CORE_PROPERTIES: &str = "docProps/core.xml";

/// Directory part of a package path ("xl/worksheets/sheet1.xml" -> "xl/worksheets").
fn part_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Parse an XLSX package into a [`RawWorkbook`].
pub fn parse_workbook<R: Read + Seek>(reader: R) -> Result<RawWorkbook> {
    let mut archive = ZipArchive::new(reader)?;

    // Parse workbook relationships first to get actual file paths
    let relationships = parse_workbook_relationships(&mut archive);

    let theme_path = relationships
        .theme
        .as_deref()
        .unwrap_or(DEFAULT_WORKBOOK_THEME);
    let theme = parse_theme(&mut archive, theme_path);

    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());

    let stylesheet = read_stylesheet(&mut archive, relationships.styles.as_deref());

    let (sheet_info, date1904) = get_sheet_info(&mut archive, &relationships.worksheets)?;

    let mut sheets = Vec::with_capacity(sheet_info.len());
    for info in sheet_info {
        sheets.push(read_sheet(&mut archive, &info.name, &info.path)?);
    }

    log::debug!(
        "parsed workbook: {} sheets, {} shared strings, {} cell formats",
        sheets.len(),
        shared_strings.len(),
        stylesheet.cell_xfs.len()
    );

    Ok(RawWorkbook {
        sheets,
        shared_strings,
        stylesheet,
        theme,
        date1904,
    })
}

fn read_stylesheet<R: Read + Seek>(archive: &mut ZipArchive<R>, path: Option<&str>) -> StyleSheet {
    let path = path.unwrap_or("xl/styles.xml");
    let Ok(file) = archive.by_name(path) else {
        log::warn!("no stylesheet at {path}; cells render unstyled");
        return StyleSheet::default();
    };
    match styles::parse_styles(BufReader::new(file)) {
        Ok(stylesheet) => stylesheet,
        Err(e) => {
            log::warn!("{path}: {e}; cells render unstyled");
            StyleSheet::default()
        }
    }
}

fn read_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    path: &str,
) -> Result<RawSheet> {
    let parsed = {
        let file = archive
            .by_name(path)
            .map_err(|_| ConvertError::MissingPart(path.to_string()))?;
        worksheet::parse_sheet(BufReader::new(file), name)?
    };
    let mut sheet = parsed.sheet;

    if !parsed.table_part_ids.is_empty() {
        let rels = parse_relationships(archive, &rels_path_for(path), part_dir(path));
        for id in &parsed.table_part_ids {
            let Some(rel) = rels.iter().find(|r| &r.id == id) else {
                log::debug!("{name}: table part {id} has no relationship");
                continue;
            };
            let Ok(file) = archive.by_name(&rel.target) else {
                log::warn!("{name}: table part {} is missing", rel.target);
                continue;
            };
            if let Some(table) = tables::parse_table(BufReader::new(file), &rel.target) {
                sheet.tables.push(table);
            }
        }
    }

    Ok(sheet)
}

/// Parse a DOCX package into a [`RawDocument`].
pub fn parse_document<R: Read + Seek>(reader: R) -> Result<RawDocument> {
    let mut archive = ZipArchive::new(reader)?;

    let document_path = parse_relationships(&mut archive, "_rels/.rels", "")
        .into_iter()
        .find(|r| r.rel_type.ends_with("/officeDocument"))
        .map_or_else(|| DEFAULT_DOCUMENT_PART.to_string(), |r| r.target);

    let rels = parse_relationships(
        &mut archive,
        &rels_path_for(&document_path),
        part_dir(&document_path),
    );
    let related = |suffix: &str, default: &str| {
        rels.iter()
            .find(|r| r.rel_type.ends_with(suffix))
            .map_or_else(|| default.to_string(), |r| r.target.clone())
    };
    let styles_path = related("/styles", DEFAULT_DOCUMENT_STYLES);
    let theme_path = related("/theme", DEFAULT_DOCUMENT_THEME);

    let body = {
        let file = archive
            .by_name(&document_path)
            .map_err(|_| ConvertError::MissingPart(document_path.clone()))?;
        document::parse_body(BufReader::new(file))?
    };

    let styles = match archive.by_name(&styles_path) {
        Ok(file) => document_styles::parse_document_styles(BufReader::new(file)),
        Err(_) => {
            log::warn!("no styles part at {styles_path}; using built-in defaults");
            DocStyles::default()
        }
    };

    let theme = parse_theme(&mut archive, &theme_path);

    let properties = match archive.by_name(CORE_PROPERTIES) {
        Ok(file) => document::parse_core_properties(BufReader::new(file)),
        Err(_) => {
            log::debug!("no core properties");
            DocProperties::default()
        }
    };

    log::debug!(
        "parsed document: {} blocks, {} styles",
        body.len(),
        styles.styles.len()
    );

    Ok(RawDocument {
        properties,
        styles,
        theme,
        body,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_part_dir() {
        assert_eq!(part_dir("xl/worksheets/sheet1.xml"), "xl/worksheets");
        assert_eq!(part_dir("document.xml"), "");
    }

    #[test]
    fn test_not_a_zip() {
        let err = parse_workbook(std::io::Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert!(matches!(err, ConvertError::Zip(_)));
        assert!(parse_document(std::io::Cursor::new(Vec::new())).is_err());
    }
}
