use serde::{Serialize, Serializer};
use std::hash::{Hash, Hasher};

/// A color reference as it appears in the source document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorRef {
    /// Direct `RRGGBB` or `AARRGGBB` hex value.
    Rgb(String),
    /// Theme palette slot with an optional tint in `[-1, 1]`.
    Theme { index: u32, tint: Option<f64> },
    /// Legacy indexed palette entry.
    Indexed(u32),
    /// Application-defined automatic color.
    Auto,
}

/// The 12-slot theme color scheme.
///
/// Slot order: dk1, lt1, dk2, lt2, accent1-6, hlink, folHlink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemePalette {
    pub slots: [Option<String>; 12],
}

impl ThemePalette {
    /// Base `RRGGBB` value for a slot, if the slot exists and was defined.
    pub fn slot(&self, index: u32) -> Option<&str> {
        let idx = usize::try_from(index).ok()?;
        self.slots.get(idx)?.as_deref()
    }
}

/// Theme data shared by workbooks and documents.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub palette: ThemePalette,
    pub major_font: Option<String>,
    pub minor_font: Option<String>,
}

macro_rules! float_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialOrd)]
        pub struct $name(pub f64);

        impl $name {
            #[must_use]
            pub const fn get(self) -> f64 {
                self.0
            }
        }

        // Bitwise identity so the value can key hash maps.
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.to_bits() == other.0.to_bits()
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.to_bits().hash(state);
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_f64(self.0)
            }
        }
    };
}

float_key!(
    /// A length in typographic points.
    Pt
);
float_key!(
    /// A length in CSS pixels.
    Px
);

/// Horizontal alignment after mapping (`general` renders as left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl HAlign {
    /// Map a raw OOXML horizontal alignment value.
    pub fn from_ooxml(value: &str) -> Self {
        match value {
            "center" | "centerContinuous" | "distributed" => Self::Center,
            "right" | "end" => Self::Right,
            "justify" | "both" => Self::Justify,
            _ => Self::Left,
        }
    }

    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

impl VAlign {
    /// Map a raw OOXML vertical alignment value; anything unknown is bottom.
    pub fn from_ooxml(value: &str) -> Self {
        match value {
            "top" => Self::Top,
            "center" => Self::Middle,
            _ => Self::Bottom,
        }
    }

    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        }
    }
}

/// Superscript / subscript positioning of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunVerticalAlign {
    Baseline,
    Superscript,
    Subscript,
}

impl RunVerticalAlign {
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "superscript" => Some(Self::Superscript),
            "subscript" => Some(Self::Subscript),
            "baseline" => Some(Self::Baseline),
            _ => None,
        }
    }
}

/// Canonical resolved formatting for one renderable unit.
///
/// `None` means unset (inherit), never a sentinel. Equality over all fields
/// is the deduplication key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Pt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_align: Option<HAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<Px>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike: Option<bool>,
}

/// One property slot of a [`StyleRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleProperty {
    FontFamily,
    FontSize,
    FontColor,
    BackgroundColor,
    BorderColor,
    HorizontalAlign,
    VerticalAlign,
    WrapText,
    Indent,
    Bold,
    Italic,
    Underline,
    Strike,
}

impl StyleProperty {
    pub const ALL: [Self; 13] = [
        Self::FontFamily,
        Self::FontSize,
        Self::FontColor,
        Self::BackgroundColor,
        Self::BorderColor,
        Self::HorizontalAlign,
        Self::VerticalAlign,
        Self::WrapText,
        Self::Indent,
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Strike,
    ];
}

/// A single property value, typed by the property it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Points(Pt),
    Pixels(Px),
    Flag(bool),
    Horizontal(HAlign),
    Vertical(VAlign),
}

impl StyleRecord {
    /// True when no property is set.
    pub fn is_empty(&self) -> bool {
        StyleProperty::ALL.iter().all(|p| self.get(*p).is_none())
    }

    pub fn get(&self, property: StyleProperty) -> Option<PropertyValue> {
        match property {
            StyleProperty::FontFamily => self.font_family.clone().map(PropertyValue::Text),
            StyleProperty::FontSize => self.font_size.map(PropertyValue::Points),
            StyleProperty::FontColor => self.font_color.clone().map(PropertyValue::Text),
            StyleProperty::BackgroundColor => {
                self.background_color.clone().map(PropertyValue::Text)
            }
            StyleProperty::BorderColor => self.border_color.clone().map(PropertyValue::Text),
            StyleProperty::HorizontalAlign => self.horizontal_align.map(PropertyValue::Horizontal),
            StyleProperty::VerticalAlign => self.vertical_align.map(PropertyValue::Vertical),
            StyleProperty::WrapText => self.wrap_text.map(PropertyValue::Flag),
            StyleProperty::Indent => self.indent.map(PropertyValue::Pixels),
            StyleProperty::Bold => self.bold.map(PropertyValue::Flag),
            StyleProperty::Italic => self.italic.map(PropertyValue::Flag),
            StyleProperty::Underline => self.underline.map(PropertyValue::Flag),
            StyleProperty::Strike => self.strike.map(PropertyValue::Flag),
        }
    }

    /// Set or clear a property. A value of the wrong kind clears the slot.
    pub fn set(&mut self, property: StyleProperty, value: Option<PropertyValue>) {
        match property {
            StyleProperty::FontFamily => self.font_family = value.and_then(PropertyValue::text),
            StyleProperty::FontSize => {
                self.font_size = match value {
                    Some(PropertyValue::Points(v)) => Some(v),
                    _ => None,
                };
            }
            StyleProperty::FontColor => self.font_color = value.and_then(PropertyValue::text),
            StyleProperty::BackgroundColor => {
                self.background_color = value.and_then(PropertyValue::text);
            }
            StyleProperty::BorderColor => self.border_color = value.and_then(PropertyValue::text),
            StyleProperty::HorizontalAlign => {
                self.horizontal_align = match value {
                    Some(PropertyValue::Horizontal(v)) => Some(v),
                    _ => None,
                };
            }
            StyleProperty::VerticalAlign => {
                self.vertical_align = match value {
                    Some(PropertyValue::Vertical(v)) => Some(v),
                    _ => None,
                };
            }
            StyleProperty::WrapText => self.wrap_text = value.and_then(PropertyValue::flag),
            StyleProperty::Indent => {
                self.indent = match value {
                    Some(PropertyValue::Pixels(v)) => Some(v),
                    _ => None,
                };
            }
            StyleProperty::Bold => self.bold = value.and_then(PropertyValue::flag),
            StyleProperty::Italic => self.italic = value.and_then(PropertyValue::flag),
            StyleProperty::Underline => self.underline = value.and_then(PropertyValue::flag),
            StyleProperty::Strike => self.strike = value.and_then(PropertyValue::flag),
        }
    }

    /// Ordered merge: every property `other` sets replaces ours, the rest stay.
    pub fn overlay(&mut self, other: &Self) {
        for property in StyleProperty::ALL {
            if let Some(value) = other.get(property) {
                self.set(property, Some(value));
            }
        }
    }
}

impl PropertyValue {
    fn text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    fn flag(self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(b),
            _ => None,
        }
    }
}

/// Inline character formatting of a text run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Pt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<RunVerticalAlign>,
}

/// Paragraph-level formatting of a word-processing paragraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<HAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_before: Option<Pt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_after: Option<Pt>,
    /// Exact or minimum line height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<Pt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_left: Option<Px>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_right: Option<Px>,
    /// 1-6 for headings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,
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
    use std::collections::HashSet;

    #[test]
    fn test_overlay_only_replaces_set_properties() {
        let mut base = StyleRecord {
            font_family: Some("Calibri".to_string()),
            font_size: Some(Pt(11.0)),
            ..StyleRecord::default()
        };
        let over = StyleRecord {
            font_size: Some(Pt(14.0)),
            bold: Some(true),
            ..StyleRecord::default()
        };
        base.overlay(&over);
        assert_eq!(base.font_family.as_deref(), Some("Calibri"));
        assert_eq!(base.font_size, Some(Pt(14.0)));
        assert_eq!(base.bold, Some(true));
    }

    #[test]
    fn test_get_set_cover_every_property() {
        let record = StyleRecord {
            font_family: Some("Arial".to_string()),
            font_size: Some(Pt(10.0)),
            font_color: Some("FF0000".to_string()),
            background_color: Some("00FF00".to_string()),
            border_color: Some("0000FF".to_string()),
            horizontal_align: Some(HAlign::Right),
            vertical_align: Some(VAlign::Top),
            wrap_text: Some(true),
            indent: Some(Px(16.0)),
            bold: Some(true),
            italic: Some(false),
            underline: Some(true),
            strike: Some(false),
        };
        let mut copy = StyleRecord::default();
        for property in StyleProperty::ALL {
            copy.set(property, record.get(property));
        }
        assert_eq!(copy, record);

        for property in StyleProperty::ALL {
            copy.set(property, None);
        }
        assert!(copy.is_empty());
    }

    #[test]
    fn test_float_keys_hash_by_bits() {
        let mut set = HashSet::new();
        set.insert(StyleRecord {
            font_size: Some(Pt(11.0)),
            ..StyleRecord::default()
        });
        assert!(set.contains(&StyleRecord {
            font_size: Some(Pt(11.0)),
            ..StyleRecord::default()
        }));
        assert!(!set.contains(&StyleRecord {
            font_size: Some(Pt(11.5)),
            ..StyleRecord::default()
        }));
    }

    #[test]
    fn test_palette_slot_bounds() {
        let mut palette = ThemePalette::default();
        palette.slots[4] = Some("4472C4".to_string());
        assert_eq!(palette.slot(4), Some("4472C4"));
        assert_eq!(palette.slot(5), None);
        assert_eq!(palette.slot(12), None);
    }
}
