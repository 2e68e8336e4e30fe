//! Spreadsheet style resolution.
//!
//! Every `cellXfs` record is resolved once up front into a [`StyleRecord`];
//! cells then combine, in order, the sheet default (`cellXfs[0]`), their own
//! record and any table band fill. Later sources only replace the
//! properties they set.

use crate::color::{resolve_color, resolve_font_color};
use crate::types::{
    CellXf, HAlign, Pt, Px, RawFont, RunStyle, RunVerticalAlign, StyleRecord, StyleSheet, Theme,
    ThemePalette, VAlign,
};

/// Pixels of indent per `alignment@indent` level.
pub const INDENT_PX_PER_LEVEL: f64 = 8.0;

/// Resolves style ids and run properties against one workbook's style tables.
#[derive(Debug)]
pub struct StyleResolver<'a> {
    stylesheet: &'a StyleSheet,
    theme: Option<&'a Theme>,
    /// Resolved `cellXfs`, indexed by style id.
    records: Vec<StyleRecord>,
    default_record: StyleRecord,
}

impl<'a> StyleResolver<'a> {
    pub fn new(stylesheet: &'a StyleSheet, theme: Option<&'a Theme>) -> Self {
        let mut resolver = Self {
            stylesheet,
            theme,
            records: Vec::new(),
            default_record: StyleRecord::default(),
        };
        resolver.records = stylesheet
            .cell_xfs
            .iter()
            .map(|xf| resolver.resolve_xf(xf))
            .collect();
        resolver.default_record = resolver.records.first().cloned().unwrap_or_default();
        resolver
    }

    pub fn palette(&self) -> Option<&'a ThemePalette> {
        self.theme.map(|t| &t.palette)
    }

    /// The sheet default every cell starts from.
    pub fn default_style(&self) -> &StyleRecord {
        &self.default_record
    }

    /// Style of one cell: default, then the cell's own record, then the
    /// table band fill when the cell has no background of its own.
    pub fn resolve_cell(&self, style_id: Option<u32>, band_fill: Option<&str>) -> StyleRecord {
        let mut style = self.default_record.clone();

        if let Some(id) = style_id {
            match usize::try_from(id).ok().and_then(|i| self.records.get(i)) {
                Some(record) => style.overlay(record),
                None => log::debug!("unknown cell style id {id}"),
            }
        }

        if style.background_color.is_none() {
            if let Some(fill) = band_fill {
                style.background_color = Some(fill.to_string());
            }
        }

        style
    }

    /// Inline style of a rich text run.
    pub fn resolve_run(&self, font: Option<&RawFont>) -> RunStyle {
        font.map_or_else(RunStyle::default, |f| {
            run_style(f, self.theme, ColorMode::SpreadsheetFont)
        })
    }

    fn resolve_xf(&self, xf: &CellXf) -> StyleRecord {
        let mut style = StyleRecord::default();
        let palette = self.palette();

        if let Some(font) = xf.font_id.and_then(|id| self.stylesheet.font(id)) {
            style.font_family = font_family(font, self.theme);
            style.font_size = font_size(font.size);
            style.font_color = font
                .color
                .as_ref()
                .and_then(|c| resolve_font_color(c, palette));
            style.bold = font.bold;
            style.italic = font.italic;
            style.underline = font.underline;
            style.strike = font.strike;
        }

        if let Some(fill) = xf.fill_id.and_then(|id| self.stylesheet.fill(id)) {
            if fill.pattern_type.as_deref() != Some("none") {
                style.background_color = fill
                    .fg_color
                    .as_ref()
                    .and_then(|c| resolve_color(c, palette));
            }
        }

        if let Some(border) = xf.border_id.and_then(|id| self.stylesheet.border(id)) {
            style.border_color = border
                .left_color
                .as_ref()
                .and_then(|c| resolve_color(c, palette));
        }

        if let Some(ref alignment) = xf.alignment {
            style.horizontal_align = alignment.horizontal.as_deref().map(HAlign::from_ooxml);
            style.vertical_align = Some(VAlign::from_ooxml(
                alignment.vertical.as_deref().unwrap_or("bottom"),
            ));
            style.wrap_text = alignment.wrap_text;
            style.indent = alignment
                .indent
                .filter(|level| *level > 0)
                .map(|level| Px(f64::from(level) * INDENT_PX_PER_LEVEL));
        }

        style
    }
}

/// How run colors on the automatic text slot are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorMode {
    /// Theme slot 1 means "automatic" and stays unset.
    SpreadsheetFont,
    /// Every slot resolves.
    Plain,
}

/// Font family, falling back from a `major`/`minor` scheme to the theme's
/// latin typeface and then to the literal name.
pub(crate) fn font_family(font: &RawFont, theme: Option<&Theme>) -> Option<String> {
    let scheme_font = match (font.scheme.as_deref(), theme) {
        (Some("minor"), Some(t)) => t.minor_font.as_ref(),
        (Some("major"), Some(t)) => t.major_font.as_ref(),
        _ => None,
    };
    scheme_font.or(font.name.as_ref()).cloned()
}

fn font_size(size: Option<f64>) -> Option<Pt> {
    size.filter(|s| s.is_finite() && *s > 0.0).map(Pt)
}

pub(crate) fn run_style(font: &RawFont, theme: Option<&Theme>, mode: ColorMode) -> RunStyle {
    let palette = theme.map(|t| &t.palette);
    let font_color = font.color.as_ref().and_then(|c| match mode {
        ColorMode::SpreadsheetFont => resolve_font_color(c, palette),
        ColorMode::Plain => resolve_color(c, palette),
    });
    RunStyle {
        font_family: font_family(font, theme),
        font_size: font_size(font.size),
        font_color,
        bold: font.bold,
        italic: font.italic,
        underline: font.underline,
        strike: font.strike,
        vertical_align: font
            .vert_align
            .as_deref()
            .and_then(RunVerticalAlign::from_ooxml),
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
    use crate::types::{ColorRef, RawAlignment, RawBorder, RawFill};

    fn theme() -> Theme {
        let mut theme = Theme::default();
        theme.palette.slots[0] = Some("000000".to_string());
        theme.palette.slots[1] = Some("FFFFFF".to_string());
        theme.palette.slots[4] = Some("4472C4".to_string());
        theme.minor_font = Some("Calibri".to_string());
        theme.major_font = Some("Calibri Light".to_string());
        theme
    }

    fn stylesheet() -> StyleSheet {
        StyleSheet {
            fonts: vec![
                RawFont {
                    name: Some("Arial".to_string()),
                    scheme: Some("minor".to_string()),
                    size: Some(11.0),
                    color: Some(ColorRef::Theme { index: 1, tint: None }),
                    ..RawFont::default()
                },
                RawFont {
                    name: Some("Georgia".to_string()),
                    size: Some(14.0),
                    color: Some(ColorRef::Rgb("FFFF0000".to_string())),
                    bold: Some(true),
                    ..RawFont::default()
                },
            ],
            fills: vec![
                RawFill { pattern_type: Some("none".to_string()), ..RawFill::default() },
                RawFill {
                    pattern_type: Some("solid".to_string()),
                    fg_color: Some(ColorRef::Theme { index: 4, tint: Some(0.5) }),
                    bg_color: Some(ColorRef::Indexed(64)),
                },
            ],
            borders: vec![
                RawBorder::default(),
                RawBorder {
                    left_style: Some("thin".to_string()),
                    left_color: Some(ColorRef::Rgb("FF333333".to_string())),
                },
            ],
            cell_xfs: vec![
                CellXf { font_id: Some(0), fill_id: Some(0), border_id: Some(0), ..CellXf::default() },
                CellXf {
                    font_id: Some(1),
                    fill_id: Some(1),
                    border_id: Some(1),
                    alignment: Some(RawAlignment {
                        horizontal: Some("centerContinuous".to_string()),
                        vertical: Some("center".to_string()),
                        wrap_text: Some(true),
                        indent: Some(2),
                    }),
                    ..CellXf::default()
                },
                CellXf {
                    font_id: Some(0),
                    fill_id: Some(0),
                    alignment: Some(RawAlignment {
                        horizontal: Some("general".to_string()),
                        ..RawAlignment::default()
                    }),
                    ..CellXf::default()
                },
            ],
            ..StyleSheet::default()
        }
    }

    #[test]
    fn test_default_style_from_first_xf() {
        let sheet = stylesheet();
        let theme = theme();
        let resolver = StyleResolver::new(&sheet, Some(&theme));
        let default = resolver.default_style();
        // Scheme font wins over the literal name.
        assert_eq!(default.font_family.as_deref(), Some("Calibri"));
        assert_eq!(default.font_size, Some(Pt(11.0)));
        // Theme slot 1 on a font is the automatic color.
        assert_eq!(default.font_color, None);
        assert_eq!(default.background_color, None);
        assert_eq!(resolver.resolve_cell(None, None), *default);
    }

    #[test]
    fn test_cell_record_overrides_default() {
        let sheet = stylesheet();
        let theme = theme();
        let resolver = StyleResolver::new(&sheet, Some(&theme));
        let style = resolver.resolve_cell(Some(1), None);
        assert_eq!(style.font_family.as_deref(), Some("Georgia"));
        assert_eq!(style.font_size, Some(Pt(14.0)));
        assert_eq!(style.font_color.as_deref(), Some("FF0000"));
        assert_eq!(style.bold, Some(true));
        assert_eq!(style.background_color.as_deref(), Some("A2B9E2"));
        assert_eq!(style.border_color.as_deref(), Some("333333"));
        assert_eq!(style.horizontal_align, Some(HAlign::Center));
        assert_eq!(style.vertical_align, Some(VAlign::Middle));
        assert_eq!(style.wrap_text, Some(true));
        assert_eq!(style.indent, Some(Px(16.0)));
    }

    #[test]
    fn test_general_alignment_is_left_and_vertical_defaults_to_bottom() {
        let sheet = stylesheet();
        let resolver = StyleResolver::new(&sheet, None);
        let style = resolver.resolve_cell(Some(2), None);
        assert_eq!(style.horizontal_align, Some(HAlign::Left));
        assert_eq!(style.vertical_align, Some(VAlign::Bottom));
        // No theme: the scheme font falls back to the literal name.
        assert_eq!(style.font_family.as_deref(), Some("Arial"));
    }

    #[test]
    fn test_band_fill_only_without_own_background() {
        let sheet = stylesheet();
        let theme = theme();
        let resolver = StyleResolver::new(&sheet, Some(&theme));
        let banded = resolver.resolve_cell(Some(0), Some("F2F2F2"));
        assert_eq!(banded.background_color.as_deref(), Some("F2F2F2"));
        let own = resolver.resolve_cell(Some(1), Some("F2F2F2"));
        assert_eq!(own.background_color.as_deref(), Some("A2B9E2"));
    }

    #[test]
    fn test_unknown_style_id_falls_back_to_default() {
        let sheet = stylesheet();
        let resolver = StyleResolver::new(&sheet, None);
        assert_eq!(resolver.resolve_cell(Some(99), None), *resolver.default_style());
    }

    #[test]
    fn test_empty_stylesheet() {
        let sheet = StyleSheet::default();
        let resolver = StyleResolver::new(&sheet, None);
        assert!(resolver.default_style().is_empty());
        assert!(resolver.resolve_cell(Some(0), None).is_empty());
    }

    #[test]
    fn test_run_style() {
        let sheet = StyleSheet::default();
        let theme = theme();
        let resolver = StyleResolver::new(&sheet, Some(&theme));
        let font = RawFont {
            name: Some("Consolas".to_string()),
            size: Some(9.0),
            color: Some(ColorRef::Theme { index: 4, tint: None }),
            italic: Some(true),
            vert_align: Some("subscript".to_string()),
            ..RawFont::default()
        };
        let run = resolver.resolve_run(Some(&font));
        assert_eq!(run.font_family.as_deref(), Some("Consolas"));
        assert_eq!(run.font_size, Some(Pt(9.0)));
        assert_eq!(run.font_color.as_deref(), Some("4472C4"));
        assert_eq!(run.italic, Some(true));
        assert_eq!(run.bold, None);
        assert_eq!(run.vertical_align, Some(RunVerticalAlign::Subscript));
        assert_eq!(resolver.resolve_run(None), RunStyle::default());

        let automatic = RawFont { color: Some(ColorRef::Theme { index: 1, tint: None }), ..RawFont::default() };
        assert_eq!(resolver.resolve_run(Some(&automatic)).font_color, None);
        assert_eq!(
            run_style(&automatic, Some(&theme), ColorMode::Plain).font_color.as_deref(),
            Some("FFFFFF")
        );
    }
}
