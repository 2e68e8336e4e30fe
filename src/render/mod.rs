//! HTML rendering of the workbook and document models.
//!
//! Renderers are pure string writers. Every text node and attribute value
//! goes through [`escape_text`]; colors and font names from the package go
//! through [`sanitize_color`] / [`sanitize_font_family`] before they reach a
//! style declaration.

mod document;
mod workbook;

pub use document::render_document;
pub use workbook::render_workbook;

use quick_xml::escape::escape;
use serde::Serialize;

use crate::types::{HAlign, PropertyValue, RunStyle, RunVerticalAlign, StyleProperty, StyleRecord};

/// Rendering switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Attach the resolved style of each element as a JSON `data-*` attribute.
    pub debug: bool,
}

impl RenderOptions {
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Escape text for element content or a quoted attribute value.
pub fn escape_text(text: &str) -> String {
    escape(text).into_owned()
}

/// Escaped text with line breaks turned into `<br>`.
pub(crate) fn escape_multiline(text: &str) -> String {
    escape_text(text).replace('\n', "<br>")
}

/// A 3- or 6-digit hex color, or nothing.
pub fn sanitize_color(color: &str) -> Option<&str> {
    let valid = matches!(color.len(), 3 | 6) && color.bytes().all(|b| b.is_ascii_hexdigit());
    valid.then_some(color)
}

/// Font family with every character outside `[A-Za-z0-9 ,_-]` removed.
pub fn sanitize_font_family(family: &str) -> String {
    family
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | ',' | '_' | '-'))
        .collect()
}

/// ` name="json"` for debug output, empty otherwise.
pub(crate) fn debug_attr<T: Serialize>(options: RenderOptions, name: &str, value: &T) -> String {
    if !options.debug {
        return String::new();
    }
    let json = serde_json::to_string(value).unwrap_or_default();
    format!(" {name}=\"{}\"", escape_text(&json))
}

fn text_decoration(underline: bool, strike: bool) -> &'static str {
    match (underline, strike) {
        (true, true) => "underline line-through",
        (true, false) => "underline",
        (false, true) => "line-through",
        (false, false) => "none",
    }
}

/// Inline CSS for a run. Only set properties are written.
pub(crate) fn run_css(style: &RunStyle) -> String {
    let mut css = String::new();
    if let Some(ref family) = style.font_family {
        let family = sanitize_font_family(family);
        if !family.is_empty() {
            css.push_str(&format!("font-family:'{family}';"));
        }
    }
    if let Some(size) = style.font_size {
        css.push_str(&format!("font-size:{:.1}pt;", size.get()));
    }
    if let Some(color) = style.font_color.as_deref().and_then(sanitize_color) {
        css.push_str(&format!("color:#{color};"));
    }
    if style.bold == Some(true) {
        css.push_str("font-weight:bold;");
    }
    if style.italic == Some(true) {
        css.push_str("font-style:italic;");
    }
    let underline = style.underline == Some(true);
    let strike = style.strike == Some(true);
    if underline || strike {
        css.push_str(&format!("text-decoration:{};", text_decoration(underline, strike)));
    }
    match style.vertical_align {
        Some(RunVerticalAlign::Superscript) => css.push_str("vertical-align:super;"),
        Some(RunVerticalAlign::Subscript) => css.push_str("vertical-align:sub;"),
        _ => {}
    }
    css
}

/// Declarations for `properties` of a record's effective style.
///
/// A property the record leaves unset is written as its reset value, which
/// undoes whatever the default rule set. `reset` holds those base values.
/// The indent side follows the alignment, so a changed alignment rewrites
/// the padding too.
pub(crate) fn record_css(
    effective: &StyleRecord,
    properties: &[StyleProperty],
    reset: &CellResets,
) -> String {
    let mut css = String::new();
    let mut decoration_done = false;
    let realign = properties.contains(&StyleProperty::HorizontalAlign);

    for property in properties {
        match property {
            StyleProperty::Underline | StyleProperty::Strike => {
                if !decoration_done {
                    decoration_done = true;
                    let underline = effective.underline == Some(true);
                    let strike = effective.strike == Some(true);
                    css.push_str(&format!("text-decoration:{};", text_decoration(underline, strike)));
                }
            }
            StyleProperty::Indent => push_indent(&mut css, effective, realign, reset),
            StyleProperty::HorizontalAlign => {
                push_value(&mut css, effective, *property, reset);
                if effective.indent.is_some() && !properties.contains(&StyleProperty::Indent) {
                    push_indent(&mut css, effective, true, reset);
                }
            }
            _ => push_value(&mut css, effective, *property, reset),
        }
    }

    css
}

fn push_value(css: &mut String, effective: &StyleRecord, property: StyleProperty, reset: &CellResets) {
    // Values rejected by sanitizing count as unset.
    let declaration = effective
        .get(property)
        .map(|value| property_css(property, &value))
        .filter(|d| !d.is_empty());
    match declaration {
        Some(d) => css.push_str(&d),
        None => css.push_str(reset.value(property)),
    }
}

/// Indent as padding on the aligned side. With `realign` the padding is
/// reset first so an indent the default rule put on the other side goes away.
fn push_indent(css: &mut String, effective: &StyleRecord, realign: bool, reset: &CellResets) {
    let side = if effective.horizontal_align == Some(HAlign::Right) {
        "right"
    } else {
        "left"
    };
    match effective.indent {
        Some(px) => {
            if realign {
                css.push_str(reset.padding);
            }
            css.push_str(&format!("padding-{side}:{:.0}px;", px.get()));
        }
        None => css.push_str(reset.padding),
    }
}

fn property_css(property: StyleProperty, value: &PropertyValue) -> String {
    match (property, value) {
        (StyleProperty::FontFamily, PropertyValue::Text(family)) => {
            let family = sanitize_font_family(family);
            if family.is_empty() {
                String::new()
            } else {
                format!("font-family:'{family}';")
            }
        }
        (StyleProperty::FontSize, PropertyValue::Points(size)) => {
            format!("font-size:{:.1}pt;", size.get())
        }
        (StyleProperty::FontColor, PropertyValue::Text(color)) => sanitize_color(color)
            .map(|c| format!("color:#{c};"))
            .unwrap_or_default(),
        (StyleProperty::BackgroundColor, PropertyValue::Text(color)) => sanitize_color(color)
            .map(|c| format!("background-color:#{c};"))
            .unwrap_or_default(),
        (StyleProperty::BorderColor, PropertyValue::Text(color)) => sanitize_color(color)
            .map(|c| format!("border:1px solid #{c};"))
            .unwrap_or_default(),
        (StyleProperty::HorizontalAlign, PropertyValue::Horizontal(align)) => {
            format!("text-align:{};", align.as_css())
        }
        (StyleProperty::VerticalAlign, PropertyValue::Vertical(align)) => {
            format!("vertical-align:{};", align.as_css())
        }
        (StyleProperty::WrapText, PropertyValue::Flag(true)) => "white-space:normal;".to_string(),
        (StyleProperty::WrapText, PropertyValue::Flag(false)) => {
            "white-space:nowrap;overflow:hidden;".to_string()
        }
        (StyleProperty::Bold, PropertyValue::Flag(bold)) => {
            format!("font-weight:{};", if *bold { "bold" } else { "normal" })
        }
        (StyleProperty::Italic, PropertyValue::Flag(italic)) => {
            format!("font-style:{};", if *italic { "italic" } else { "normal" })
        }
        _ => String::new(),
    }
}

/// Base values a class falls back to when it clears a default property.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CellResets {
    pub border: &'static str,
    pub padding: &'static str,
    pub vertical_align: &'static str,
    pub white_space: &'static str,
}

impl CellResets {
    fn value(&self, property: StyleProperty) -> &'static str {
        match property {
            StyleProperty::FontFamily => "font-family:inherit;",
            StyleProperty::FontSize => "font-size:inherit;",
            StyleProperty::FontColor => "color:inherit;",
            StyleProperty::BackgroundColor => "background-color:transparent;",
            StyleProperty::BorderColor => self.border,
            StyleProperty::HorizontalAlign => "text-align:left;",
            StyleProperty::VerticalAlign => self.vertical_align,
            StyleProperty::WrapText => self.white_space,
            StyleProperty::Indent => self.padding,
            StyleProperty::Bold => "font-weight:normal;",
            StyleProperty::Italic => "font-style:normal;",
            StyleProperty::Underline | StyleProperty::Strike => "text-decoration:none;",
        }
    }
}

/// Properties set on a record, in canonical order.
pub(crate) fn set_properties(record: &StyleRecord) -> Vec<StyleProperty> {
    StyleProperty::ALL
        .iter()
        .copied()
        .filter(|p| record.get(*p).is_some())
        .collect()
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
    use crate::types::{Pt, Px};
    use test_case::test_case;

    const RESETS: CellResets = CellResets {
        border: "border:1px solid #333;",
        padding: "padding:4px 8px;",
        vertical_align: "vertical-align:bottom;",
        white_space: "white-space:nowrap;overflow:hidden;",
    };

    #[test_case("FF0000", Some("FF0000"))]
    #[test_case("abc", Some("abc"))]
    #[test_case("FF00000", None)]
    #[test_case("red", None)]
    #[test_case("000;}body{", None)]
    #[test_case("", None)]
    fn test_sanitize_color(input: &str, expected: Option<&str>) {
        assert_eq!(sanitize_color(input), expected);
    }

    #[test]
    fn test_sanitize_font_family() {
        assert_eq!(sanitize_font_family("Calibri Light"), "Calibri Light");
        assert_eq!(sanitize_font_family("Evil';}body{x:y"), "Evilbodyxy");
        assert_eq!(sanitize_font_family("Noto_Sans-CJK, serif"), "Noto_Sans-CJK, serif");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(
            escape_text(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &apos;Jerry&apos;&lt;/b&gt;"
        );
        assert_eq!(escape_multiline("a\nb<"), "a<br>b&lt;");
    }

    #[test]
    fn test_run_css() {
        let style = RunStyle {
            font_family: Some("Arial".to_string()),
            font_size: Some(Pt(9.0)),
            font_color: Some("not-a-color".to_string()),
            bold: Some(true),
            italic: Some(false),
            underline: Some(true),
            strike: Some(true),
            vertical_align: Some(RunVerticalAlign::Superscript),
        };
        assert_eq!(
            run_css(&style),
            "font-family:'Arial';font-size:9.0pt;font-weight:bold;text-decoration:underline line-through;vertical-align:super;"
        );
        assert_eq!(run_css(&RunStyle::default()), "");
    }

    #[test]
    fn test_record_css_resets_and_indent() {
        let record = StyleRecord {
            horizontal_align: Some(HAlign::Right),
            indent: Some(Px(16.0)),
            ..StyleRecord::default()
        };
        let css = record_css(
            &record,
            &[
                StyleProperty::FontFamily,
                StyleProperty::HorizontalAlign,
                StyleProperty::Indent,
                StyleProperty::Underline,
                StyleProperty::Strike,
            ],
            &RESETS,
        );
        assert_eq!(
            css,
            "font-family:inherit;text-align:right;padding:4px 8px;padding-right:16px;text-decoration:none;"
        );
    }

    #[test]
    fn test_alignment_change_moves_inherited_indent() {
        let record = StyleRecord {
            horizontal_align: Some(HAlign::Right),
            indent: Some(Px(16.0)),
            ..StyleRecord::default()
        };
        let css = record_css(&record, &[StyleProperty::HorizontalAlign], &RESETS);
        assert_eq!(css, "text-align:right;padding:4px 8px;padding-right:16px;");

        let plain = StyleRecord {
            horizontal_align: Some(HAlign::Center),
            ..StyleRecord::default()
        };
        assert_eq!(
            record_css(&plain, &[StyleProperty::HorizontalAlign], &RESETS),
            "text-align:center;"
        );
    }

    #[test]
    fn test_debug_attr() {
        let style = RunStyle {
            bold: Some(true),
            ..RunStyle::default()
        };
        assert_eq!(debug_attr(RenderOptions::default(), "data-run-style", &style), "");
        assert_eq!(
            debug_attr(RenderOptions::default().debug(true), "data-run-style", &style),
            " data-run-style=\"{&quot;bold&quot;:true}\""
        );
    }
}
