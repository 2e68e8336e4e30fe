//! Parsing of xl/styles.xml
//!
//! Number formats, fonts, fills, borders, cell formats (`cellXfs`),
//! differential formats and table style definitions.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;

use crate::error::Result;
use crate::rich_text::apply_font_property;
use crate::types::{
    CellXf, Dxf, RawAlignment, RawBorder, RawFill, RawFont, StyleSheet, TableStyleDef,
    TableStyleElement,
};
use crate::xml_helpers::{attr_bool, attr_string, attr_u32, parse_color_attrs};

/// Parse styles.xml content
#[allow(clippy::too_many_lines)]
pub fn parse_styles<R: BufRead>(reader: R) -> Result<StyleSheet> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut stylesheet = StyleSheet::default();
    let mut buf = Vec::new();

    // State tracking
    let mut in_num_fmts = false;
    let mut in_fonts = false;
    let mut in_fills = false;
    let mut in_borders = false;
    let mut in_cell_xfs = false;
    let mut in_dxfs = false;

    let mut current_font: Option<RawFont> = None;
    let mut current_fill: Option<RawFill> = None;
    let mut current_border: Option<RawBorder> = None;
    let mut in_left_border = false;
    let mut current_xf: Option<CellXf> = None;
    let mut current_dxf: Option<Dxf> = None;
    let mut current_table_style: Option<TableStyleDef> = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.local_name();

                match name.as_ref() {
                    b"numFmts" => in_num_fmts = !is_empty,
                    b"fonts" => in_fonts = !is_empty,
                    b"fills" => in_fills = !is_empty,
                    b"borders" => in_borders = !is_empty,
                    b"cellXfs" => in_cell_xfs = !is_empty,
                    b"dxfs" => in_dxfs = !is_empty,

                    b"numFmt" if in_num_fmts => {
                        if let (Some(id), Some(code)) =
                            (attr_u32(e, b"numFmtId"), attr_string(e, b"formatCode"))
                        {
                            stylesheet.num_fmts.insert(id, code);
                        }
                    }

                    b"dxf" if in_dxfs => {
                        if is_empty {
                            stylesheet.dxfs.push(Dxf::default());
                        } else {
                            current_dxf = Some(Dxf::default());
                        }
                    }

                    b"font" if in_fonts => {
                        if is_empty {
                            stylesheet.fonts.push(RawFont::default());
                        } else {
                            current_font = Some(RawFont::default());
                        }
                    }

                    b"fill" if in_fills || current_dxf.is_some() => {
                        if is_empty {
                            if current_dxf.is_none() {
                                stylesheet.fills.push(RawFill::default());
                            }
                        } else {
                            current_fill = Some(RawFill::default());
                        }
                    }

                    b"patternFill" => {
                        if let Some(ref mut fill) = current_fill {
                            fill.pattern_type = attr_string(e, b"patternType");
                        }
                    }

                    b"fgColor" => {
                        if let Some(ref mut fill) = current_fill {
                            fill.fg_color = parse_color_attrs(e);
                        }
                    }

                    b"bgColor" => {
                        if let Some(ref mut fill) = current_fill {
                            fill.bg_color = parse_color_attrs(e);
                        }
                    }

                    b"border" if in_borders => {
                        if is_empty {
                            stylesheet.borders.push(RawBorder::default());
                        } else {
                            current_border = Some(RawBorder::default());
                        }
                    }

                    b"left" | b"start" => {
                        if let Some(ref mut border) = current_border {
                            border.left_style = attr_string(e, b"style");
                            in_left_border = !is_empty;
                        }
                    }

                    b"color" if in_left_border => {
                        if let Some(ref mut border) = current_border {
                            border.left_color = parse_color_attrs(e);
                        }
                    }

                    // Font children; dxf fonts are read but not kept.
                    _ if current_font.is_some() => {
                        if let Some(ref mut font) = current_font {
                            apply_font_property(font, e);
                        }
                    }

                    b"xf" if in_cell_xfs => {
                        let xf = CellXf {
                            num_fmt_id: attr_u32(e, b"numFmtId").unwrap_or(0),
                            font_id: attr_u32(e, b"fontId"),
                            fill_id: attr_u32(e, b"fillId"),
                            border_id: attr_u32(e, b"borderId"),
                            alignment: None,
                        };

                        // Self-closing <xf/> has no End event.
                        if is_empty {
                            stylesheet.cell_xfs.push(xf);
                        } else {
                            current_xf = Some(xf);
                        }
                    }

                    b"alignment" => {
                        if let Some(ref mut xf) = current_xf {
                            xf.alignment = Some(RawAlignment {
                                horizontal: attr_string(e, b"horizontal"),
                                vertical: attr_string(e, b"vertical"),
                                wrap_text: attr_bool(e, b"wrapText"),
                                indent: attr_u32(e, b"indent"),
                            });
                        }
                    }

                    b"tableStyles" => {
                        stylesheet.default_table_style = attr_string(e, b"defaultTableStyle");
                    }

                    b"tableStyle" => {
                        let def = TableStyleDef {
                            name: attr_string(e, b"name").unwrap_or_default(),
                            elements: Vec::new(),
                        };
                        if is_empty {
                            stylesheet.table_styles.push(def);
                        } else {
                            current_table_style = Some(def);
                        }
                    }

                    b"tableStyleElement" => {
                        if let Some(ref mut def) = current_table_style {
                            def.elements.push(TableStyleElement {
                                kind: attr_string(e, b"type").unwrap_or_default(),
                                dxf_id: attr_u32(e, b"dxfId"),
                                size: attr_u32(e, b"size"),
                            });
                        }
                    }

                    _ => {}
                }
            }

            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"numFmts" => in_num_fmts = false,
                b"fonts" => in_fonts = false,
                b"fills" => in_fills = false,
                b"borders" => in_borders = false,
                b"cellXfs" => in_cell_xfs = false,
                b"dxfs" => in_dxfs = false,

                b"font" => {
                    if let Some(font) = current_font.take() {
                        if in_fonts && current_dxf.is_none() {
                            stylesheet.fonts.push(font);
                        }
                    }
                }

                b"fill" => {
                    if let Some(fill) = current_fill.take() {
                        match current_dxf {
                            Some(ref mut dxf) => dxf.fill = Some(fill),
                            None => stylesheet.fills.push(fill),
                        }
                    }
                }

                b"left" | b"start" => in_left_border = false,

                b"border" => {
                    if let Some(border) = current_border.take() {
                        stylesheet.borders.push(border);
                    }
                }

                b"xf" => {
                    if let Some(xf) = current_xf.take() {
                        stylesheet.cell_xfs.push(xf);
                    }
                }

                b"dxf" => {
                    if let Some(dxf) = current_dxf.take() {
                        stylesheet.dxfs.push(dxf);
                    }
                }

                b"tableStyle" => {
                    if let Some(def) = current_table_style.take() {
                        stylesheet.table_styles.push(def);
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

    Ok(stylesheet)
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

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="0.000"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/><scheme val="minor"/></font>
    <font><b/><i/><u/><strike/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor theme="4" tint="0.5"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left style="thin"><color rgb="FF00FF00"/></left><right style="thin"><color rgb="FF0000FF"/></right></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="164" fontId="1" fillId="2" borderId="1" xfId="0" applyAlignment="1">
      <alignment horizontal="centerContinuous" vertical="center" wrapText="1" indent="2"/>
    </xf>
  </cellXfs>
  <dxfs count="2">
    <dxf><font><b/></font><fill><patternFill><bgColor rgb="FFD9D9D9"/></patternFill></fill></dxf>
    <dxf><fill><patternFill patternType="solid"><fgColor theme="5"/></patternFill></fill></dxf>
  </dxfs>
  <tableStyles count="1" defaultTableStyle="TableStyleMedium2" defaultPivotStyle="PivotStyleLight16">
    <tableStyle name="Custom" pivot="0" count="2">
      <tableStyleElement type="headerRow" dxfId="0"/>
      <tableStyleElement type="firstRowStripe" dxfId="1" size="2"/>
    </tableStyle>
  </tableStyles>
</styleSheet>"#;

    #[test]
    fn test_parse_full_stylesheet() {
        let sheet = parse_styles(STYLES.as_bytes()).unwrap();

        assert_eq!(sheet.num_fmts.get(&164).map(String::as_str), Some("0.000"));

        assert_eq!(sheet.fonts.len(), 2);
        assert_eq!(sheet.fonts[0].name.as_deref(), Some("Calibri"));
        assert_eq!(sheet.fonts[0].scheme.as_deref(), Some("minor"));
        assert_eq!(sheet.fonts[1].bold, Some(true));
        assert_eq!(sheet.fonts[1].strike, Some(true));
        assert_eq!(sheet.fonts[1].size, Some(14.0));

        assert_eq!(sheet.fills.len(), 3);
        assert_eq!(sheet.fills[0].pattern_type.as_deref(), Some("none"));
        assert_eq!(
            sheet.fills[2].fg_color,
            Some(ColorRef::Theme {
                index: 4,
                tint: Some(0.5)
            })
        );

        assert_eq!(sheet.borders.len(), 2);
        assert_eq!(sheet.borders[0].left_color, None);
        assert_eq!(
            sheet.borders[1].left_color,
            Some(ColorRef::Rgb("FF00FF00".to_string()))
        );

        // cellStyleXfs are not cell formats.
        assert_eq!(sheet.cell_xfs.len(), 2);
        let xf = &sheet.cell_xfs[1];
        assert_eq!(xf.num_fmt_id, 164);
        assert_eq!(xf.fill_id, Some(2));
        let align = xf.alignment.as_ref().unwrap();
        assert_eq!(align.horizontal.as_deref(), Some("centerContinuous"));
        assert_eq!(align.wrap_text, Some(true));
        assert_eq!(align.indent, Some(2));
        assert!(sheet.cell_xfs[0].alignment.is_none());
    }

    #[test]
    fn test_dxfs_and_table_styles() {
        let sheet = parse_styles(STYLES.as_bytes()).unwrap();

        // dxf fonts don't leak into the font table
        assert_eq!(sheet.fonts.len(), 2);
        assert_eq!(sheet.fills.len(), 3);

        assert_eq!(sheet.dxfs.len(), 2);
        let header_fill = sheet.dxfs[0].fill.as_ref().unwrap();
        assert_eq!(header_fill.bg_color, Some(ColorRef::Rgb("FFD9D9D9".to_string())));

        assert_eq!(sheet.default_table_style.as_deref(), Some("TableStyleMedium2"));
        let custom = sheet.table_style("Custom").unwrap();
        assert_eq!(custom.elements.len(), 2);
        assert_eq!(custom.elements[1].kind, "firstRowStripe");
        assert_eq!(custom.elements[1].size, Some(2));
        assert!(sheet.table_style("Missing").is_none());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(parse_styles("<styleSheet><fonts></styleSheet>".as_bytes()).is_err());
    }
}
