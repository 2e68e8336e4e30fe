//! Rich text parsing: shared-string items, inline strings and their runs.
//!
//! Run properties are kept raw (colors as references); the style resolver
//! turns them into [`crate::types::RunStyle`] later.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

use crate::types::{RawFont, RawRun, SharedString};
use crate::xml_helpers::{attr_string_local, attr_val, attr_val_f64, on_off, parse_color_attrs};

/// Parse a shared string item (`<si>`) or inline string (`<is>`), consuming
/// events up to the matching end tag.
///
/// ```xml
/// <si>
///   <t>Plain text</t>  -- OR --
///   <r><rPr>...</rPr><t>Styled</t></r>
///   <r><t>Normal</t></r>
/// </si>
/// ```
pub fn parse_string_item<R: BufRead>(xml: &mut Reader<R>, end_tag: &[u8]) -> SharedString {
    let mut buf = Vec::new();
    let mut plain_text = String::new();
    let mut runs: Vec<RawRun> = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => plain_text.push_str(&read_text_content(xml)),
                b"r" => runs.push(parse_rich_text_run(xml)),
                // Phonetic runs carry furigana, not display text.
                b"rPh" => skip_element(xml, b"rPh"),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == end_tag => break,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    if runs.is_empty() {
        SharedString {
            text: plain_text,
            runs,
        }
    } else {
        SharedString {
            text: rich_text_to_plain(&runs),
            runs,
        }
    }
}

/// Parse a single rich text run (`<r>`), consuming up to `</r>`.
pub fn parse_rich_text_run<R: BufRead>(xml: &mut Reader<R>) -> RawRun {
    let mut buf = Vec::new();
    let mut run = RawRun::default();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"rPr" => run.props = Some(parse_run_properties(xml)),
                b"t" => run.text.push_str(&read_text_content(xml)),
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"r" => break,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    run
}

/// Parse run properties (`<rPr>`), consuming up to `</rPr>`.
pub fn parse_run_properties<R: BufRead>(xml: &mut Reader<R>) -> RawFont {
    let mut buf = Vec::new();
    let mut font = RawFont::default();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => apply_font_property(&mut font, e),
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"rPr" => break,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    font
}

/// Apply one SpreadsheetML font child (`<b/>`, `<sz val>`, ...) to `font`.
///
/// Shared by `rPr` runs and `styles.xml` fonts, which use the same
/// vocabulary except for `rFont` vs `name`.
pub fn apply_font_property(font: &mut RawFont, e: &BytesStart) {
    match e.local_name().as_ref() {
        b"rFont" | b"name" => font.name = attr_val(e),
        b"scheme" => font.scheme = attr_val(e),
        b"sz" => font.size = attr_val_f64(e),
        b"color" => font.color = parse_color_attrs(e),
        b"b" => font.bold = Some(on_off(e)),
        b"i" => font.italic = Some(on_off(e)),
        b"u" => font.underline = Some(on_off(e)),
        b"strike" => font.strike = Some(on_off(e)),
        b"vertAlign" => font.vert_align = attr_string_local(e, b"val"),
        _ => {}
    }
}

/// Extract plain text from rich text runs
pub fn rich_text_to_plain(runs: &[RawRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// Read text content from inside an element until its end tag.
pub(crate) fn read_text_content<R: BufRead>(xml: &mut Reader<R>) -> String {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Text(ref e)) => {
                if let Ok(t) = e.unescape() {
                    text.push_str(&t);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Ok(t) = std::str::from_utf8(e.as_ref()) {
                    text.push_str(t);
                }
            }
            Ok(Event::End(_) | Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    text
}

/// Skip everything up to and including the end tag `name`.
pub(crate) fn skip_element<R: BufRead>(xml: &mut Reader<R>, name: &[u8]) {
    let mut buf = Vec::new();
    let mut depth = 0usize;
    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == name => depth += 1,
            Ok(Event::End(ref e)) if e.local_name().as_ref() == name => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
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
    use crate::types::ColorRef;

    fn parse_si(xml: &str) -> SharedString {
        let mut reader = Reader::from_reader(xml.as_bytes());
        reader.trim_text(false);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"si" => {
                    return parse_string_item(&mut reader, b"si");
                }
                Ok(Event::Eof) => panic!("no <si> in input"),
                _ => {}
            }
            buf.clear();
        }
    }

    #[test]
    fn test_plain_item() {
        let item = parse_si("<si><t>Hello &amp; welcome</t></si>");
        assert_eq!(item.text, "Hello & welcome");
        assert!(item.runs.is_empty());
    }

    #[test]
    fn test_rich_item_keeps_whitespace_and_props() {
        let item = parse_si(concat!(
            "<si>",
            r#"<r><rPr><b/><sz val="14"/><color rgb="FFFF0000"/><rFont val="Arial"/></rPr><t xml:space="preserve">Bold </t></r>"#,
            r#"<r><rPr><i val="0"/><vertAlign val="superscript"/><color theme="4" tint="0.5"/></rPr><t>sup</t></r>"#,
            "<r><t>plain</t></r>",
            "</si>"
        ));
        assert_eq!(item.text, "Bold supplain");
        assert_eq!(item.runs.len(), 3);

        let first = item.runs[0].props.as_ref().unwrap();
        assert_eq!(item.runs[0].text, "Bold ");
        assert_eq!(first.bold, Some(true));
        assert_eq!(first.size, Some(14.0));
        assert_eq!(first.name.as_deref(), Some("Arial"));
        assert_eq!(first.color, Some(ColorRef::Rgb("FFFF0000".to_string())));

        let second = item.runs[1].props.as_ref().unwrap();
        assert_eq!(second.italic, Some(false));
        assert_eq!(second.vert_align.as_deref(), Some("superscript"));
        assert_eq!(
            second.color,
            Some(ColorRef::Theme {
                index: 4,
                tint: Some(0.5)
            })
        );

        assert!(item.runs[2].props.is_none());
    }

    #[test]
    fn test_phonetic_runs_are_skipped() {
        let item = parse_si("<si><t>漢字</t><rPh sb=\"0\" eb=\"2\"><t>かんじ</t></rPh></si>");
        assert_eq!(item.text, "漢字");
    }

    #[test]
    fn test_single_run_is_still_rich() {
        let item = parse_si("<si><r><t>only</t></r></si>");
        assert_eq!(item.runs.len(), 1);
        assert_eq!(item.text, "only");
    }
}
