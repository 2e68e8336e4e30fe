//! Shared XML attribute parsing utilities for the OOXML readers.
//!
//! Word-processing parts prefix every attribute with `w:`, spreadsheet
//! parts mostly don't, so both exact-key and local-name lookups exist.

use quick_xml::events::BytesStart;

use crate::types::ColorRef;

/// Extract a string attribute value by key.
///
/// Entities are decoded. Returns `None` if the attribute is missing or
/// its value cannot be unescaped.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Extract a string attribute by local name (ignoring namespace prefix).
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.parse().ok())
}

/// Extract an `f64` attribute value by key.
pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.parse().ok())
}

/// Extract a boolean attribute value by key.
///
/// Recognizes `"1"` and `"true"` as true, anything else present as false.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

/// Extract a boolean attribute with a default value.
pub fn attr_bool_default(e: &BytesStart, key: &[u8], default: bool) -> bool {
    attr_bool(e, key).unwrap_or(default)
}

/// Extract the `val` attribute as a string. Very common in SpreadsheetML.
pub fn attr_val(e: &BytesStart) -> Option<String> {
    attr_string(e, b"val")
}

/// Extract the `val` attribute as `f64`.
pub fn attr_val_f64(e: &BytesStart) -> Option<f64> {
    attr_f64(e, b"val")
}

/// `w:val` (or any prefixed `val`) of a WordprocessingML element.
pub fn w_val(e: &BytesStart) -> Option<String> {
    attr_string_local(e, b"val")
}

/// Integer-valued local-name attribute such as `w:before` or `w:sz`.
pub fn attr_i64_local(e: &BytesStart, key: &[u8]) -> Option<i64> {
    attr_string_local(e, key).and_then(|s| s.trim().parse().ok())
}

/// Toggle property (`<b/>`, `<w:i w:val="0"/>`): present without a value
/// means on.
pub fn on_off(e: &BytesStart) -> bool {
    !matches!(
        attr_string_local(e, b"val").as_deref(),
        Some("0" | "false" | "off" | "none")
    )
}

/// Parse SpreadsheetML color attributes into a [`ColorRef`].
///
/// Precedence is `rgb`, then `theme`, then `indexed`, then `auto`. An
/// element with none of them yields `None`.
pub fn parse_color_attrs(e: &BytesStart) -> Option<ColorRef> {
    if let Some(rgb) = attr_string(e, b"rgb") {
        return Some(ColorRef::Rgb(rgb));
    }
    if let Some(index) = attr_u32(e, b"theme") {
        return Some(ColorRef::Theme {
            index,
            tint: attr_f64(e, b"tint"),
        });
    }
    if let Some(index) = attr_u32(e, b"indexed") {
        return Some(ColorRef::Indexed(index));
    }
    if attr_bool_default(e, b"auto", false) {
        return Some(ColorRef::Auto);
    }
    None
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

    fn make_start(xml: &str) -> BytesStart<'_> {
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string_and_numbers() {
        let e = make_start(r#"<foo name="hello" count="42" size="10.5" />"#);
        assert_eq!(attr_string(&e, b"name"), Some("hello".to_string()));
        assert_eq!(attr_string(&e, b"missing"), None);
        assert_eq!(attr_u32(&e, b"count"), Some(42));
        assert_eq!(attr_f64(&e, b"size"), Some(10.5));
    }

    #[test]
    fn test_attr_string_decodes_entities() {
        let e = make_start(r#"<name val="Arial &amp; Co" alt="it&apos;s &quot;x&quot;" />"#);
        assert_eq!(attr_val(&e), Some("Arial & Co".to_string()));
        assert_eq!(attr_string(&e, b"alt"), Some("it's \"x\"".to_string()));

        let w = make_start(r#"<w:rFonts w:ascii="A &lt;B&gt;" />"#);
        assert_eq!(attr_string_local(&w, b"ascii"), Some("A <B>".to_string()));
    }

    #[test]
    fn test_attr_bool() {
        let e = make_start(r#"<foo a="1" b="0" c="true" />"#);
        assert_eq!(attr_bool(&e, b"a"), Some(true));
        assert_eq!(attr_bool(&e, b"b"), Some(false));
        assert_eq!(attr_bool(&e, b"c"), Some(true));
        assert_eq!(attr_bool(&e, b"missing"), None);
        assert!(attr_bool_default(&e, b"missing", true));
    }

    #[test]
    fn test_local_name_lookup() {
        let e = make_start(r#"<w:spacing w:before="240" w:after="120" />"#);
        assert_eq!(attr_i64_local(&e, b"before"), Some(240));
        assert_eq!(attr_i64_local(&e, b"after"), Some(120));
        assert_eq!(attr_string(&e, b"before"), None);
    }

    #[test]
    fn test_on_off() {
        assert!(on_off(&make_start("<w:b/>")));
        assert!(on_off(&make_start(r#"<w:b w:val="1"/>"#)));
        assert!(!on_off(&make_start(r#"<w:b w:val="0"/>"#)));
        assert!(!on_off(&make_start(r#"<w:u w:val="none"/>"#)));
        assert!(on_off(&make_start(r#"<w:u w:val="single"/>"#)));
    }

    #[test]
    fn test_parse_color_attrs() {
        let rgb = parse_color_attrs(&make_start(r#"<color rgb="FFFF0000" theme="1"/>"#));
        assert_eq!(rgb, Some(ColorRef::Rgb("FFFF0000".to_string())));

        let theme = parse_color_attrs(&make_start(r#"<color theme="4" tint="-0.25"/>"#));
        assert_eq!(
            theme,
            Some(ColorRef::Theme {
                index: 4,
                tint: Some(-0.25)
            })
        );

        let indexed = parse_color_attrs(&make_start(r#"<color indexed="10"/>"#));
        assert_eq!(indexed, Some(ColorRef::Indexed(10)));

        let auto = parse_color_attrs(&make_start(r#"<color auto="1"/>"#));
        assert_eq!(auto, Some(ColorRef::Auto));

        assert_eq!(parse_color_attrs(&make_start("<color/>")), None);
    }
}
