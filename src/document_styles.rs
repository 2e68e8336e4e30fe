//! Word-processing style resolution.
//!
//! Paragraphs combine `pPrDefault`, the `basedOn` chain of their style (root
//! first) and their direct `pPr`. Runs combine the paragraph style chain's
//! `rPr`, their own `rStyle` chain and their direct `rPr`. The document-wide
//! `rPrDefault` is not folded into runs; it is emitted once as document CSS.

use std::collections::HashSet;

use crate::styles::{run_style, ColorMode};
use crate::types::{
    DocStyleDef, DocStyles, HAlign, ParagraphStyle, Pt, Px, RawDocCell, RawFont,
    RawParagraphProps, RunStyle, StyleRecord, Theme, VAlign,
};

/// Twentieths of a point per point.
pub const TWIPS_PER_PT: f64 = 20.0;
/// Twips per CSS pixel at 96 dpi.
pub const TWIPS_PER_PX: f64 = 15.0;

const MAX_HEADING_LEVEL: u8 = 6;

#[allow(clippy::cast_precision_loss)]
pub fn twips_to_pt(twips: i64) -> Pt {
    Pt(twips as f64 / TWIPS_PER_PT)
}

#[allow(clippy::cast_precision_loss)]
pub fn twips_to_px(twips: i64) -> Px {
    Px(twips as f64 / TWIPS_PER_PX)
}

#[derive(Debug)]
pub struct DocumentStyleResolver<'a> {
    styles: &'a DocStyles,
    theme: Option<&'a Theme>,
}

impl<'a> DocumentStyleResolver<'a> {
    pub fn new(styles: &'a DocStyles, theme: Option<&'a Theme>) -> Self {
        Self { styles, theme }
    }

    /// The `rPrDefault` run style.
    pub fn default_run_style(&self) -> RunStyle {
        run_style(&self.styles.default_run, self.theme, ColorMode::Plain)
    }

    /// Style id a paragraph resolves against: its own `pStyle`, else the
    /// document's default paragraph style.
    fn paragraph_style_id<'p>(&'p self, props: &'p RawParagraphProps) -> Option<&'p str> {
        props
            .style_id
            .as_deref()
            .or(self.styles.default_paragraph_style.as_deref())
    }

    pub fn resolve_paragraph(&self, props: &RawParagraphProps) -> ParagraphStyle {
        let chain = self.style_chain(self.paragraph_style_id(props));

        let mut merged = self.styles.default_paragraph.clone();
        for style in &chain {
            merged.overlay(&style.paragraph);
        }
        merged.overlay(props);

        let line_height = match merged.line_rule.as_deref() {
            Some("exact" | "atLeast") => merged.line.filter(|l| *l > 0).map(twips_to_pt),
            _ => None,
        };

        let heading_level = chain
            .iter()
            .rev()
            .find_map(|style| heading_level_of(style))
            .or_else(|| {
                merged
                    .outline_level
                    .filter(|level| *level < 9)
                    .map(|level| level.saturating_add(1))
            })
            .map(|level| level.clamp(1, MAX_HEADING_LEVEL));

        ParagraphStyle {
            alignment: merged.alignment.as_deref().map(HAlign::from_ooxml),
            space_before: merged.space_before.map(twips_to_pt),
            space_after: merged.space_after.map(twips_to_pt),
            line_height,
            indent_left: merged.indent_left.filter(|v| *v != 0).map(twips_to_px),
            indent_right: merged.indent_right.filter(|v| *v != 0).map(twips_to_px),
            heading_level,
        }
    }

    /// Run style inside a paragraph with the given properties.
    pub fn resolve_run(
        &self,
        paragraph: &RawParagraphProps,
        run_style_id: Option<&str>,
        direct: &RawFont,
    ) -> RunStyle {
        let mut font = RawFont::default();
        for style in self.style_chain(self.paragraph_style_id(paragraph)) {
            font.overlay(&style.run);
        }
        for style in self.style_chain(run_style_id) {
            font.overlay(&style.run);
        }
        font.overlay(direct);
        run_style(&font, self.theme, ColorMode::Plain)
    }

    /// `basedOn` chain for a style id, root first. Unknown ids end the chain
    /// and a repeated id cuts it.
    pub fn style_chain(&self, id: Option<&str>) -> Vec<&'a DocStyleDef> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = id;

        while let Some(current) = next {
            if !seen.insert(current) {
                log::debug!("basedOn cycle at style {current}");
                break;
            }
            let Some(style) = self.styles.styles.get(current) else {
                break;
            };
            chain.push(style);
            next = style.based_on.as_deref();
        }

        chain.reverse();
        chain
    }
}

/// Cell shading and vertical alignment of a document table cell.
pub fn table_cell_style(cell: &RawDocCell) -> StyleRecord {
    StyleRecord {
        background_color: cell.shading.clone(),
        vertical_align: cell.v_align.as_deref().and_then(|v| match v {
            "top" => Some(VAlign::Top),
            "center" => Some(VAlign::Middle),
            "bottom" => Some(VAlign::Bottom),
            _ => None,
        }),
        ..StyleRecord::default()
    }
}

fn heading_level_of(style: &DocStyleDef) -> Option<u8> {
    if let Some(level) = style
        .name
        .as_deref()
        .and_then(|name| name.to_ascii_lowercase().strip_prefix("heading ").map(str::to_string))
        .and_then(|n| n.trim().parse::<u8>().ok())
    {
        return Some(level);
    }
    if let Some(level) = style
        .id
        .strip_prefix("Heading")
        .and_then(|n| n.parse::<u8>().ok())
    {
        return Some(level);
    }
    let is_title = style.id == "Title" || style.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case("title"));
    is_title.then_some(1)
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

    fn style(id: &str, name: &str, based_on: Option<&str>) -> DocStyleDef {
        DocStyleDef {
            id: id.to_string(),
            name: Some(name.to_string()),
            based_on: based_on.map(str::to_string),
            ..DocStyleDef::default()
        }
    }

    fn styles() -> DocStyles {
        let mut normal = style("Normal", "Normal", None);
        normal.paragraph.space_after = Some(160);
        normal.run.name = Some("Calibri".to_string());

        let mut heading = style("Heading2", "heading 2", Some("Normal"));
        heading.paragraph.space_before = Some(40);
        heading.run.size = Some(13.0);
        heading.run.color = Some(ColorRef::Theme {
            index: 4,
            tint: None,
        });

        let mut strong = style("Strong", "Strong", None);
        strong.run.bold = Some(true);

        let mut docs = DocStyles {
            default_run: RawFont {
                name: Some("Times New Roman".to_string()),
                size: Some(12.0),
                ..RawFont::default()
            },
            default_paragraph: RawParagraphProps {
                space_after: Some(200),
                line: Some(276),
                line_rule: Some("auto".to_string()),
                ..RawParagraphProps::default()
            },
            default_paragraph_style: Some("Normal".to_string()),
            ..DocStyles::default()
        };
        for s in [normal, heading, strong] {
            docs.styles.insert(s.id.clone(), s);
        }
        docs
    }

    fn theme() -> Theme {
        let mut theme = Theme::default();
        theme.palette.slots[4] = Some("4472C4".to_string());
        theme
    }

    #[test]
    fn test_paragraph_chain_root_first() {
        let docs = styles();
        let resolver = DocumentStyleResolver::new(&docs, None);
        let props = RawParagraphProps {
            style_id: Some("Heading2".to_string()),
            alignment: Some("center".to_string()),
            ..RawParagraphProps::default()
        };
        let para = resolver.resolve_paragraph(&props);
        assert_eq!(para.space_before, Some(Pt(2.0)));
        // Normal overrides pPrDefault.
        assert_eq!(para.space_after, Some(Pt(8.0)));
        assert_eq!(para.alignment, Some(HAlign::Center));
        assert_eq!(para.heading_level, Some(2));
        // lineRule auto gives no fixed line height.
        assert_eq!(para.line_height, None);
    }

    #[test]
    fn test_default_paragraph_style_applies() {
        let docs = styles();
        let resolver = DocumentStyleResolver::new(&docs, None);
        let para = resolver.resolve_paragraph(&RawParagraphProps::default());
        assert_eq!(para.space_after, Some(Pt(8.0)));
        assert_eq!(para.heading_level, None);
    }

    #[test]
    fn test_run_chain_order() {
        let docs = styles();
        let theme = theme();
        let resolver = DocumentStyleResolver::new(&docs, Some(&theme));
        let paragraph = RawParagraphProps {
            style_id: Some("Heading2".to_string()),
            ..RawParagraphProps::default()
        };
        let direct = RawFont {
            italic: Some(true),
            ..RawFont::default()
        };
        let run = resolver.resolve_run(&paragraph, Some("Strong"), &direct);
        assert_eq!(run.font_family.as_deref(), Some("Calibri"));
        assert_eq!(run.font_size, Some(Pt(13.0)));
        assert_eq!(run.font_color.as_deref(), Some("4472C4"));
        assert_eq!(run.bold, Some(true));
        assert_eq!(run.italic, Some(true));

        // rPrDefault stays out of runs.
        let plain = resolver.resolve_run(&RawParagraphProps::default(), None, &RawFont::default());
        assert_eq!(plain.font_size, None);
        assert_eq!(resolver.default_run_style().font_size, Some(Pt(12.0)));
    }

    #[test]
    fn test_theme_slot_one_resolves_in_documents() {
        let mut theme = theme();
        theme.palette.slots[1] = Some("FFFFFF".to_string());
        let docs = DocStyles::default();
        let resolver = DocumentStyleResolver::new(&docs, Some(&theme));
        let direct = RawFont {
            color: Some(ColorRef::Theme {
                index: 1,
                tint: None,
            }),
            ..RawFont::default()
        };
        let run = resolver.resolve_run(&RawParagraphProps::default(), None, &direct);
        assert_eq!(run.font_color.as_deref(), Some("FFFFFF"));
    }

    #[test]
    fn test_cycle_is_cut() {
        let mut docs = DocStyles::default();
        docs.styles.insert("A".to_string(), style("A", "A", Some("B")));
        docs.styles.insert("B".to_string(), style("B", "B", Some("A")));
        let resolver = DocumentStyleResolver::new(&docs, None);
        let chain = resolver.style_chain(Some("A"));
        let ids: Vec<&str> = chain.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(heading_level_of(&style("Heading3", "heading 3", None)), Some(3));
        assert_eq!(heading_level_of(&style("Custom", "Heading 4", None)), Some(4));
        assert_eq!(heading_level_of(&style("Heading1", "Kop 1", None)), Some(1));
        assert_eq!(heading_level_of(&style("Title", "Title", None)), Some(1));
        assert_eq!(heading_level_of(&style("Quote", "Quote", None)), None);

        let docs = DocStyles::default();
        let resolver = DocumentStyleResolver::new(&docs, None);
        let deep = RawParagraphProps {
            outline_level: Some(7),
            ..RawParagraphProps::default()
        };
        assert_eq!(resolver.resolve_paragraph(&deep).heading_level, Some(6));
        let body = RawParagraphProps {
            outline_level: Some(9),
            ..RawParagraphProps::default()
        };
        assert_eq!(resolver.resolve_paragraph(&body).heading_level, None);
    }

    #[test]
    fn test_exact_line_height_and_indent() {
        let docs = DocStyles::default();
        let resolver = DocumentStyleResolver::new(&docs, None);
        let props = RawParagraphProps {
            line: Some(360),
            line_rule: Some("exact".to_string()),
            indent_left: Some(720),
            ..RawParagraphProps::default()
        };
        let para = resolver.resolve_paragraph(&props);
        assert_eq!(para.line_height, Some(Pt(18.0)));
        assert_eq!(para.indent_left, Some(Px(48.0)));
        assert_eq!(para.indent_right, None);
    }

    #[test]
    fn test_table_cell_style() {
        let cell = RawDocCell {
            shading: Some("FFEEDD".to_string()),
            v_align: Some("center".to_string()),
            ..RawDocCell::default()
        };
        let style = table_cell_style(&cell);
        assert_eq!(style.background_color.as_deref(), Some("FFEEDD"));
        assert_eq!(style.vertical_align, Some(VAlign::Middle));
        assert!(table_cell_style(&RawDocCell::default()).is_empty());
    }
}
