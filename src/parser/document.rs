//! `word/document.xml` body and `docProps/core.xml` parsing.
//!
//! The body is read with a small recursive descent: each reader consumes
//! events up to its own end tag, so paragraphs and tables come out in the
//! order they appear.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;

use super::document_styles::{parse_paragraph_props, parse_word_run_props};
use crate::error::Result;
use crate::rich_text::{read_text_content, skip_element};
use crate::types::{
    DocProperties, RawBlock, RawDocCell, RawDocRow, RawDocRun, RawDocTable, RawParagraph, VMerge,
};
use crate::xml_helpers::{attr_i64_local, attr_string_local, w_val};

/// Parse the main document part into body blocks.
pub(super) fn parse_body<R: BufRead>(reader: R) -> Result<Vec<RawBlock>> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut blocks = Vec::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => blocks.push(RawBlock::Paragraph(parse_paragraph(&mut xml)?)),
                b"tbl" => blocks.push(RawBlock::Table(parse_table(&mut xml)?)),
                b"sectPr" => skip_element(&mut xml, b"sectPr"),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"p" => {
                blocks.push(RawBlock::Paragraph(RawParagraph::default()));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(blocks)
}

/// Read a `w:p` up to its end tag. Runs nested in hyperlinks, insertions
/// and smart tags are picked up because those wrappers are not consumed.
fn parse_paragraph<R: BufRead>(xml: &mut Reader<R>) -> Result<RawParagraph> {
    let mut paragraph = RawParagraph::default();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"pPr" => paragraph.props = parse_paragraph_props(xml)?,
                b"r" => {
                    let run = parse_run(xml)?;
                    if !run.text.is_empty() {
                        paragraph.runs.push(run);
                    }
                }
                // Deleted text and moved-away content are not displayed.
                b"del" => skip_element(xml, b"del"),
                b"moveFrom" => skip_element(xml, b"moveFrom"),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"p" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraph)
}

fn parse_run<R: BufRead>(xml: &mut Reader<R>) -> Result<RawDocRun> {
    let mut run = RawDocRun::default();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"rPr" => {
                    let (font, style_id) = parse_word_run_props(xml)?;
                    run.font = font;
                    run.style_id = style_id;
                }
                b"t" => run.text.push_str(&read_text_content(xml)),
                b"instrText" => skip_element(xml, b"instrText"),
                b"delText" => skip_element(xml, b"delText"),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => run.text.push('\t'),
                b"br" | b"cr" => run.text.push('\n'),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"r" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(run)
}

fn parse_table<R: BufRead>(xml: &mut Reader<R>) -> Result<RawDocTable> {
    let mut table = RawDocTable::default();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"tr" => table.rows.push(parse_table_row(xml)?),
                b"tblPr" => skip_element(xml, b"tblPr"),
                b"tblGrid" => skip_element(xml, b"tblGrid"),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"tbl" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(table)
}

fn parse_table_row<R: BufRead>(xml: &mut Reader<R>) -> Result<RawDocRow> {
    let mut row = RawDocRow::default();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"tc" => {
                row.cells.push(parse_table_cell(xml)?);
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"tblPrEx" => {
                skip_element(xml, b"tblPrEx");
            }
            Ok(Event::Start(ref e) | Event::Empty(ref e))
                if e.local_name().as_ref() == b"trHeight" =>
            {
                row.height = attr_i64_local(e, b"val");
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"tr" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(row)
}

fn parse_table_cell<R: BufRead>(xml: &mut Reader<R>) -> Result<RawDocCell> {
    let mut cell = RawDocCell::default();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"p" => {
                cell.paragraphs.push(parse_paragraph(xml)?);
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"tbl" => {
                log::debug!("skipping nested table");
                skip_element(xml, b"tbl");
            }
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"p" => cell.paragraphs.push(RawParagraph::default()),
                b"gridSpan" => {
                    cell.grid_span = attr_i64_local(e, b"val")
                        .and_then(|v| u32::try_from(v).ok())
                        .filter(|v| *v > 0)
                        .unwrap_or(1);
                }
                b"vMerge" => {
                    cell.v_merge = Some(if w_val(e).as_deref() == Some("restart") {
                        VMerge::Restart
                    } else {
                        VMerge::Continue
                    });
                }
                b"shd" => {
                    cell.shading = attr_string_local(e, b"fill")
                        .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case("auto"));
                }
                b"vAlign" => cell.v_align = w_val(e),
                b"tcW" => {
                    let is_dxa = attr_string_local(e, b"type").map_or(true, |t| t == "dxa");
                    cell.width = if is_dxa { attr_i64_local(e, b"w") } else { None };
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"tc" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(cell)
}

/// Parse `docProps/core.xml`. Broken XML keeps what was read.
pub(super) fn parse_core_properties<R: BufRead>(reader: R) -> DocProperties {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut props = DocProperties::default();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let slot = match e.local_name().as_ref() {
                    b"title" => Some(&mut props.title),
                    b"subject" => Some(&mut props.subject),
                    b"creator" => Some(&mut props.author),
                    b"keywords" => Some(&mut props.keywords),
                    b"description" => Some(&mut props.description),
                    b"created" => Some(&mut props.created),
                    b"modified" => Some(&mut props.modified),
                    _ => None,
                };
                if let Some(slot) = slot {
                    let text = read_text_content(&mut xml);
                    let text = text.trim();
                    if !text.is_empty() {
                        *slot = Some(text.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("core properties: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    props
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

    fn body(inner: &str) -> Vec<RawBlock> {
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{inner}<w:sectPr><w:pgSz w:w="12240"/></w:sectPr></w:body></w:document>"#
        );
        parse_body(xml.as_bytes()).unwrap()
    }

    fn paragraph(block: &RawBlock) -> &RawParagraph {
        match block {
            RawBlock::Paragraph(p) => p,
            RawBlock::Table(_) => panic!("expected paragraph"),
        }
    }

    #[test]
    fn test_blocks_keep_document_order() {
        let blocks = body(concat!(
            "<w:p><w:r><w:t>one</w:t></w:r></w:p>",
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
            "<w:p/>",
            "<w:p><w:r><w:t>two</w:t></w:r></w:p>",
        ));
        assert_eq!(blocks.len(), 4);
        assert_eq!(paragraph(&blocks[0]).runs[0].text, "one");
        assert!(matches!(blocks[1], RawBlock::Table(_)));
        assert!(paragraph(&blocks[2]).runs.is_empty());
        assert_eq!(paragraph(&blocks[3]).runs[0].text, "two");
    }

    #[test]
    fn test_run_text_and_wrappers() {
        let blocks = body(concat!(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading2\"/></w:pPr>",
            "<w:r><w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">Hello </w:t></w:r>",
            "<w:hyperlink w:anchor=\"x\"><w:r><w:t>link</w:t></w:r></w:hyperlink>",
            "<w:ins w:id=\"1\"><w:r><w:tab/><w:t>new</w:t><w:br/></w:r></w:ins>",
            "<w:del w:id=\"2\"><w:r><w:delText>gone</w:delText></w:r></w:del>",
            "</w:p>",
        ));
        let p = paragraph(&blocks[0]);
        assert_eq!(p.props.style_id.as_deref(), Some("Heading2"));
        let texts: Vec<&str> = p.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello ", "link", "\tnew\n"]);
        assert_eq!(p.runs[0].font.bold, Some(true));
    }

    #[test]
    fn test_table_cells() {
        let blocks = body(concat!(
            "<w:tbl><w:tblPr><w:tblStyle w:val=\"TableGrid\"/></w:tblPr>",
            "<w:tblGrid><w:gridCol w:w=\"2000\"/></w:tblGrid>",
            "<w:tr><w:trPr><w:trHeight w:val=\"400\"/></w:trPr>",
            "<w:tc><w:tcPr><w:tcW w:w=\"3000\" w:type=\"dxa\"/><w:gridSpan w:val=\"2\"/>",
            "<w:vMerge w:val=\"restart\"/><w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"FFC000\"/>",
            "<w:vAlign w:val=\"center\"/></w:tcPr><w:p/></w:tc>",
            "</w:tr>",
            "<w:tr><w:tc><w:tcPr><w:vMerge/><w:shd w:fill=\"auto\"/><w:tcW w:w=\"50\" w:type=\"pct\"/></w:tcPr>",
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>nested</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
            "<w:p/></w:tc></w:tr>",
            "</w:tbl>",
        ));
        let RawBlock::Table(ref table) = blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].height, Some(400));
        let first = &table.rows[0].cells[0];
        assert_eq!(first.grid_span, 2);
        assert_eq!(first.v_merge, Some(VMerge::Restart));
        assert_eq!(first.shading.as_deref(), Some("FFC000"));
        assert_eq!(first.v_align.as_deref(), Some("center"));
        assert_eq!(first.width, Some(3000));
        assert_eq!(first.paragraphs.len(), 1);

        let second = &table.rows[1].cells[0];
        assert_eq!(second.v_merge, Some(VMerge::Continue));
        assert_eq!(second.shading, None);
        assert_eq!(second.width, None);
        // Nested table content is dropped.
        assert_eq!(second.paragraphs.len(), 1);
        assert!(second.paragraphs[0].runs.is_empty());
    }

    #[test]
    fn test_broken_body_is_an_error() {
        let xml = "<w:document xmlns:w=\"w\"><w:body><w:p><w:r></w:p></w:body></w:document>";
        assert!(parse_body(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_core_properties() {
        let xml = r#"<cp:coreProperties xmlns:cp="cp" xmlns:dc="dc" xmlns:dcterms="dcterms">
            <dc:title>Quarterly report</dc:title>
            <dc:creator>Finance</dc:creator>
            <cp:keywords></cp:keywords>
            <dcterms:created>2024-01-02T03:04:05Z</dcterms:created>
        </cp:coreProperties>"#;
        let props = parse_core_properties(xml.as_bytes());
        assert_eq!(props.title.as_deref(), Some("Quarterly report"));
        assert_eq!(props.author.as_deref(), Some("Finance"));
        assert_eq!(props.keywords, None);
        assert_eq!(props.created.as_deref(), Some("2024-01-02T03:04:05Z"));
        assert_eq!(props.subject, None);
    }
}
