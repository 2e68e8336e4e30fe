//! Raw word-processing object graph as read from the package.

use serde::Serialize;
use std::collections::HashMap;

use super::{RawFont, Theme};

/// Core document properties from `docProps/core.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// W3CDTF timestamp, kept as written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawDocument {
    pub properties: DocProperties,
    pub styles: DocStyles,
    pub theme: Option<Theme>,
    /// Body blocks in document order.
    pub body: Vec<RawBlock>,
}

/// `word/styles.xml`.
#[derive(Debug, Clone, Default)]
pub struct DocStyles {
    /// `docDefaults/rPrDefault/rPr`.
    pub default_run: RawFont,
    /// `docDefaults/pPrDefault/pPr`.
    pub default_paragraph: RawParagraphProps,
    /// Paragraph style marked `w:default="1"`, used when a paragraph names none.
    pub default_paragraph_style: Option<String>,
    pub styles: HashMap<String, DocStyleDef>,
}

#[derive(Debug, Clone, Default)]
pub struct DocStyleDef {
    pub id: String,
    pub name: Option<String>,
    pub based_on: Option<String>,
    pub paragraph: RawParagraphProps,
    pub run: RawFont,
}

/// Paragraph properties (`w:pPr`); lengths in twips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParagraphProps {
    pub style_id: Option<String>,
    pub alignment: Option<String>,
    pub space_before: Option<i64>,
    pub space_after: Option<i64>,
    pub line: Option<i64>,
    pub line_rule: Option<String>,
    pub indent_left: Option<i64>,
    pub indent_right: Option<i64>,
    pub outline_level: Option<u8>,
}

impl RawParagraphProps {
    /// Properties set in `other` replace ours. The style id is not inherited.
    pub fn overlay(&mut self, other: &Self) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field.clone_from(&other.$field);
                })*
            };
        }
        take!(
            alignment,
            space_before,
            space_after,
            line,
            line_rule,
            indent_left,
            indent_right,
            outline_level
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawBlock {
    Paragraph(RawParagraph),
    Table(RawDocTable),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParagraph {
    pub props: RawParagraphProps,
    pub runs: Vec<RawDocRun>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDocRun {
    pub text: String,
    /// `w:rStyle`.
    pub style_id: Option<String>,
    pub font: RawFont,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDocTable {
    pub rows: Vec<RawDocRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDocRow {
    pub height: Option<i64>,
    pub cells: Vec<RawDocCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMerge {
    Restart,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawDocCell {
    pub grid_span: u32,
    pub v_merge: Option<VMerge>,
    /// `w:shd@w:fill`, `auto` already removed.
    pub shading: Option<String>,
    pub v_align: Option<String>,
    /// `w:tcW` in twips (`dxa` only).
    pub width: Option<i64>,
    pub paragraphs: Vec<RawParagraph>,
}

impl Default for RawDocCell {
    fn default() -> Self {
        Self {
            grid_span: 1,
            v_merge: None,
            shading: None,
            v_align: None,
            width: None,
            paragraphs: Vec::new(),
        }
    }
}
