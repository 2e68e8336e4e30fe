//! WordprocessingML property parsing: `w:pPr`, `w:rPr` and `word/styles.xml`.
//!
//! The same `pPr`/`rPr` readers serve style definitions and body content.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

use crate::color::{theme_slot_for_name, word_theme_tint};
use crate::error::Result;
use crate::rich_text::skip_element;
use crate::types::{ColorRef, DocStyleDef, DocStyles, RawFont, RawParagraphProps};
use crate::xml_helpers::{attr_i64_local, attr_string_local, on_off, w_val};

/// Children of `pPr`/`rPr` whose content must not leak into the parent.
const NESTED_PROPERTY_ELEMENTS: [&[u8]; 5] = [b"rPr", b"pPrChange", b"rPrChange", b"sectPr", b"numPr"];

fn nested_property_element(name: &[u8]) -> Option<&'static [u8]> {
    NESTED_PROPERTY_ELEMENTS.iter().copied().find(|n| *n == name)
}

/// Read a `w:pPr` element up to its end tag.
pub(super) fn parse_paragraph_props<R: BufRead>(xml: &mut Reader<R>) -> Result<RawParagraphProps> {
    let mut props = RawParagraphProps::default();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if nested_property_element(e.local_name().as_ref()).is_some() => {
                if let Some(name) = nested_property_element(e.local_name().as_ref()) {
                    skip_element(xml, name);
                }
            }
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => apply_paragraph_property(&mut props, e),
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"pPr" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(props)
}

fn apply_paragraph_property(props: &mut RawParagraphProps, e: &BytesStart) {
    match e.local_name().as_ref() {
        b"pStyle" => props.style_id = w_val(e),
        b"jc" => props.alignment = w_val(e),
        b"spacing" => {
            props.space_before = attr_i64_local(e, b"before");
            props.space_after = attr_i64_local(e, b"after");
            props.line = attr_i64_local(e, b"line");
            props.line_rule = attr_string_local(e, b"lineRule");
        }
        b"ind" => {
            props.indent_left = attr_i64_local(e, b"left").or_else(|| attr_i64_local(e, b"start"));
            props.indent_right = attr_i64_local(e, b"right").or_else(|| attr_i64_local(e, b"end"));
        }
        b"outlineLvl" => props.outline_level = w_val(e).and_then(|v| v.trim().parse().ok()),
        _ => {}
    }
}

/// Read a `w:rPr` element up to its end tag. Returns the character
/// properties and the `w:rStyle` reference, if any.
pub(super) fn parse_word_run_props<R: BufRead>(
    xml: &mut Reader<R>,
) -> Result<(RawFont, Option<String>)> {
    let mut font = RawFont::default();
    let mut style_id = None;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"rPrChange" => {
                skip_element(xml, b"rPrChange");
            }
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"rStyle" {
                    style_id = w_val(e);
                } else {
                    apply_word_run_property(&mut font, e);
                }
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"rPr" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok((font, style_id))
}

/// Apply one WordprocessingML run property element to `font`.
fn apply_word_run_property(font: &mut RawFont, e: &BytesStart) {
    match e.local_name().as_ref() {
        b"rFonts" => {
            font.name = attr_string_local(e, b"ascii").or_else(|| attr_string_local(e, b"hAnsi"));
            if font.name.is_none() {
                // asciiTheme="minorHAnsi" and friends name a theme font slot.
                font.scheme = attr_string_local(e, b"asciiTheme").and_then(|t| {
                    if t.starts_with("major") {
                        Some("major".to_string())
                    } else if t.starts_with("minor") {
                        Some("minor".to_string())
                    } else {
                        None
                    }
                });
            }
        }
        // Half-points.
        b"sz" => font.size = attr_i64_local(e, b"val").map(half_points),
        b"color" => font.color = parse_word_color(e),
        b"b" => font.bold = Some(on_off(e)),
        b"i" => font.italic = Some(on_off(e)),
        b"u" => font.underline = Some(on_off(e)),
        b"strike" | b"dstrike" => font.strike = Some(on_off(e)),
        b"vertAlign" => font.vert_align = w_val(e),
        _ => {}
    }
}

#[allow(clippy::cast_precision_loss)]
fn half_points(value: i64) -> f64 {
    value as f64 / 2.0
}

/// `w:color`. The literal `w:val` wins because Word always writes the
/// computed color next to `w:themeColor`; the theme reference is only used
/// when the literal is missing or `auto`.
fn parse_word_color(e: &BytesStart) -> Option<ColorRef> {
    let val = w_val(e).filter(|v| !v.is_empty());
    if let Some(ref v) = val {
        if !v.eq_ignore_ascii_case("auto") {
            return Some(ColorRef::Rgb(v.clone()));
        }
    }
    let theme = attr_string_local(e, b"themeColor")
        .and_then(|name| theme_slot_for_name(&name))
        .map(|index| ColorRef::Theme {
            index,
            tint: word_theme_tint(
                attr_string_local(e, b"themeTint").as_deref(),
                attr_string_local(e, b"themeShade").as_deref(),
            ),
        });
    theme.or(val.map(|_| ColorRef::Auto))
}

/// Parse `word/styles.xml`. XML errors degrade to whatever was read so far.
pub(super) fn parse_document_styles<R: BufRead>(reader: R) -> DocStyles {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut styles = DocStyles::default();
    let mut buf = Vec::new();
    let mut in_run_default = false;
    let mut in_paragraph_default = false;
    let mut current: Option<DocStyleDef> = None;

    loop {
        let result = match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"rPrDefault" => {
                    in_run_default = true;
                    Ok(())
                }
                b"pPrDefault" => {
                    in_paragraph_default = true;
                    Ok(())
                }
                b"style" => {
                    let id = attr_string_local(e, b"styleId").unwrap_or_default();
                    let is_default = matches!(
                        attr_string_local(e, b"default").as_deref(),
                        Some("1" | "true" | "on")
                    );
                    if is_default
                        && attr_string_local(e, b"type").as_deref() == Some("paragraph")
                        && !id.is_empty()
                    {
                        styles.default_paragraph_style = Some(id.clone());
                    }
                    current = Some(DocStyleDef {
                        id,
                        ..DocStyleDef::default()
                    });
                    Ok(())
                }
                b"rPr" => parse_word_run_props(&mut xml).map(|(font, _)| {
                    if let Some(ref mut style) = current {
                        style.run = font;
                    } else if in_run_default {
                        styles.default_run = font;
                    }
                }),
                b"pPr" => parse_paragraph_props(&mut xml).map(|props| {
                    if let Some(ref mut style) = current {
                        style.paragraph = props;
                    } else if in_paragraph_default {
                        styles.default_paragraph = props;
                    }
                }),
                // Table style conditional formats carry their own pPr/rPr.
                b"tblStylePr" => {
                    skip_element(&mut xml, b"tblStylePr");
                    Ok(())
                }
                _ => Ok(()),
            },
            Ok(Event::Empty(ref e)) => {
                if let Some(ref mut style) = current {
                    match e.local_name().as_ref() {
                        b"name" => style.name = w_val(e),
                        b"basedOn" => style.based_on = w_val(e),
                        _ => {}
                    }
                }
                Ok(())
            }
            Ok(Event::End(ref e)) => {
                match e.local_name().as_ref() {
                    b"rPrDefault" => in_run_default = false,
                    b"pPrDefault" => in_paragraph_default = false,
                    b"style" => {
                        if let Some(style) = current.take() {
                            if !style.id.is_empty() {
                                styles.styles.insert(style.id.clone(), style);
                            }
                        }
                    }
                    _ => {}
                }
                Ok(())
            }
            Ok(Event::Eof) => break,
            Err(e) => Err(e.into()),
            _ => Ok(()),
        };
        if let Err(e) = result {
            log::warn!("word styles: {e}; {} styles recovered", styles.styles.len());
            break;
        }
        buf.clear();
    }

    styles
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

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="0"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:color w:val="2F5496" w:themeColor="accent1" w:themeShade="BF"/><w:sz w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="table" w:styleId="TableGrid">
    <w:name w:val="Table Grid"/>
    <w:tblStylePr w:type="firstRow"><w:rPr><w:b/></w:rPr></w:tblStylePr>
  </w:style>
</w:styles>"#;

    #[test]
    fn test_doc_defaults() {
        let styles = parse_document_styles(STYLES.as_bytes());
        assert_eq!(styles.default_run.name.as_deref(), Some("Calibri"));
        assert_eq!(styles.default_run.size, Some(11.0));
        assert_eq!(styles.default_paragraph.space_after, Some(160));
        assert_eq!(styles.default_paragraph.line_rule.as_deref(), Some("auto"));
    }

    #[test]
    fn test_style_definitions() {
        let styles = parse_document_styles(STYLES.as_bytes());
        assert_eq!(styles.styles.len(), 3);
        assert_eq!(styles.default_paragraph_style.as_deref(), Some("Normal"));

        let heading = &styles.styles["Heading1"];
        assert_eq!(heading.name.as_deref(), Some("heading 1"));
        assert_eq!(heading.based_on.as_deref(), Some("Normal"));
        assert_eq!(heading.paragraph.space_before, Some(240));
        assert_eq!(heading.paragraph.outline_level, Some(0));
        assert_eq!(heading.run.size, Some(16.0));
        assert_eq!(heading.run.color, Some(ColorRef::Rgb("2F5496".to_string())));

        // Conditional table formatting does not leak into the style.
        assert_eq!(styles.styles["TableGrid"].run.bold, None);
    }

    #[test]
    fn test_run_props() {
        let xml = r#"<w:rPr xmlns:w="w"><w:rStyle w:val="Strong"/><w:b/><w:i w:val="0"/><w:u w:val="none"/><w:dstrike/><w:vertAlign w:val="superscript"/><w:color w:val="auto" w:themeColor="accent2" w:themeTint="99"/></w:rPr>"#;
        let mut reader = Reader::from_str(xml);
        reader.read_event().unwrap();
        let (font, style) = parse_word_run_props(&mut reader).unwrap();
        assert_eq!(style.as_deref(), Some("Strong"));
        assert_eq!(font.bold, Some(true));
        assert_eq!(font.italic, Some(false));
        assert_eq!(font.underline, Some(false));
        assert_eq!(font.strike, Some(true));
        assert_eq!(font.vert_align.as_deref(), Some("superscript"));
        match font.color {
            Some(ColorRef::Theme { index, tint }) => {
                assert_eq!(index, 5);
                assert!((tint.unwrap() - (1.0 - 153.0 / 255.0)).abs() < 1e-9);
            }
            other => panic!("expected theme color, got {other:?}"),
        }
    }

    #[test]
    fn test_auto_color() {
        let xml = r#"<w:rPr xmlns:w="w"><w:color w:val="auto"/></w:rPr>"#;
        let mut reader = Reader::from_str(xml);
        reader.read_event().unwrap();
        let (font, _) = parse_word_run_props(&mut reader).unwrap();
        assert_eq!(font.color, Some(ColorRef::Auto));
    }

    #[test]
    fn test_paragraph_props_skip_mark_run() {
        let xml = r#"<w:pPr xmlns:w="w"><w:pStyle w:val="Title"/><w:jc w:val="center"/><w:ind w:start="720" w:end="360"/><w:rPr><w:b/></w:rPr></w:pPr>"#;
        let mut reader = Reader::from_str(xml);
        reader.read_event().unwrap();
        let props = parse_paragraph_props(&mut reader).unwrap();
        assert_eq!(props.style_id.as_deref(), Some("Title"));
        assert_eq!(props.alignment.as_deref(), Some("center"));
        assert_eq!(props.indent_left, Some(720));
        assert_eq!(props.indent_right, Some(360));
    }
}
