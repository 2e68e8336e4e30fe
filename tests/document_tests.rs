//! DOCX conversion: block order, style chains, headings, tables and metadata.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;

use std::io::Cursor;

use fixtures::{
    DocCellBuilder, DocTableBuilder, DocxBuilder, ParagraphBuilder, RunBuilder,
};
use officeview::{
    builder, docx_to_html, parser, Block, ConvertError, DocumentModel, RenderOptions,
    RenderParagraph, RenderTable, VAlign,
};

fn model(docx: Vec<u8>) -> DocumentModel {
    let raw = parser::parse_document(Cursor::new(docx)).expect("document parses");
    builder::build_document(&raw)
}

fn html(docx: Vec<u8>) -> String {
    docx_to_html(Cursor::new(docx), &RenderOptions::default()).expect("conversion succeeds")
}

fn paragraph(block: &Block) -> &RenderParagraph {
    match block {
        Block::Paragraph(p) => p,
        Block::Table(_) => panic!("expected a paragraph"),
    }
}

fn table(block: &Block) -> &RenderTable {
    match block {
        Block::Table(t) => t,
        Block::Paragraph(_) => panic!("expected a table"),
    }
}

fn headings() -> DocxBuilder {
    DocxBuilder::new()
        .paragraph_style("Heading1", "heading 1", None, Some(16.0))
        .paragraph_style("Heading2", "heading 2", Some("Heading1"), None)
}

#[test]
fn test_blocks_keep_document_order() {
    let model = model(
        DocxBuilder::new()
            .paragraph(ParagraphBuilder::text("before"))
            .table(DocTableBuilder::new().row(vec![DocCellBuilder::new("cell")]))
            .paragraph(ParagraphBuilder::text("after"))
            .build(),
    );

    assert_eq!(model.blocks.len(), 3);
    assert_eq!(paragraph(&model.blocks[0]).runs[0].text, "before");
    assert_eq!(table(&model.blocks[1]).rows.len(), 1);
    assert_eq!(paragraph(&model.blocks[2]).runs[0].text, "after");

    let html = html(
        DocxBuilder::new()
            .paragraph(ParagraphBuilder::text("before"))
            .table(DocTableBuilder::new().row(vec![DocCellBuilder::new("cell")]))
            .paragraph(ParagraphBuilder::text("after"))
            .build(),
    );
    let before = html.find(">before<").unwrap();
    let table_at = html.find("<table>").unwrap();
    let after = html.find(">after<").unwrap();
    assert!(before < table_at && table_at < after);
}

#[test]
fn test_heading_levels_from_style_names() {
    let model = model(
        headings()
            .paragraph(ParagraphBuilder::text("Title").style("Heading1"))
            .paragraph(ParagraphBuilder::text("Section").style("Heading2"))
            .paragraph(ParagraphBuilder::text("Body"))
            .build(),
    );

    assert_eq!(paragraph(&model.blocks[0]).style.heading_level, Some(1));
    assert_eq!(paragraph(&model.blocks[1]).style.heading_level, Some(2));
    assert_eq!(paragraph(&model.blocks[2]).style.heading_level, None);
}

#[test]
fn test_based_on_chain_inherits_run_properties() {
    let model = model(
        headings()
            .paragraph(ParagraphBuilder::text("Section").style("Heading2"))
            .paragraph(
                ParagraphBuilder::new()
                    .style("Heading2")
                    .run(RunBuilder::new("small").size(9.0)),
            )
            .build(),
    );

    let inherited = &paragraph(&model.blocks[0]).runs[0].style;
    assert_eq!(inherited.font_size.map(|s| s.get()), Some(16.0));
    let direct = &paragraph(&model.blocks[1]).runs[0].style;
    assert_eq!(direct.font_size.map(|s| s.get()), Some(9.0));
}

#[test]
fn test_style_cycle_terminates() {
    let model = model(
        DocxBuilder::new()
            .paragraph_style("A", "Loop A", Some("B"), Some(10.0))
            .paragraph_style("B", "Loop B", Some("A"), Some(12.0))
            .paragraph(ParagraphBuilder::text("x").style("A"))
            .build(),
    );
    // Chain is B then A; A's own size wins.
    let run = &paragraph(&model.blocks[0]).runs[0].style;
    assert_eq!(run.font_size.map(|s| s.get()), Some(10.0));
}

#[test]
fn test_heading_markup() {
    let html = html(
        headings()
            .paragraph(ParagraphBuilder::text("Title").style("Heading1"))
            .paragraph(ParagraphBuilder::text("Section").style("Heading2"))
            .build(),
    );

    assert!(html.contains("<h1 style=\"margin-bottom:8pt;\"><span style=\"font-size:16.0pt;\">Title</span></h1>"));
    assert!(html.contains("<h2 style=\"margin-bottom:8pt;\"><span style=\"font-size:16.0pt;\">Section</span></h2>"));
}

#[test]
fn test_paragraph_spacing_indent_and_alignment() {
    let html = html(
        DocxBuilder::new()
            .paragraph(ParagraphBuilder::text("spaced").spacing(240, 120))
            .paragraph(ParagraphBuilder::text("indented").indent_left(720))
            .paragraph(ParagraphBuilder::text("centered").align("center"))
            .build(),
    );

    assert!(html.contains("<p style=\"margin-top:12pt;margin-bottom:6pt;\"><span>spaced</span></p>"));
    assert!(html.contains(
        "<p style=\"margin-bottom:8pt;padding-left:48px;\"><span>indented</span></p>"
    ));
    assert!(html.contains(
        "<p style=\"text-align:center;margin-bottom:8pt;\"><span>centered</span></p>"
    ));
}

#[test]
fn test_run_formatting() {
    let html = html(
        DocxBuilder::new()
            .paragraph(
                ParagraphBuilder::new()
                    .run(RunBuilder::new("bold red").bold().color("FF0000"))
                    .run(RunBuilder::new("both").underline().strike())
                    .run(RunBuilder::new("2").superscript())
                    .run(RunBuilder::new("serif").font("Georgia").italic()),
            )
            .build(),
    );

    assert!(html.contains("<span style=\"color:#FF0000;font-weight:bold;\">bold red</span>"));
    assert!(html.contains("<span style=\"text-decoration:underline line-through;\">both</span>"));
    assert!(html.contains("<span style=\"vertical-align:super;\">2</span>"));
    assert!(html.contains("<span style=\"font-family:'Georgia';font-style:italic;\">serif</span>"));
}

#[test]
fn test_line_breaks_and_escaping() {
    let html = html(
        DocxBuilder::new()
            .paragraph(ParagraphBuilder::new().run(RunBuilder::new("a < b\nc & d")))
            .build(),
    );
    assert!(html.contains("<span>a &lt; b<br>c &amp; d</span>"));
}

#[test]
fn test_theme_colors_resolve_in_documents() {
    let model = model(
        DocxBuilder::new()
            .paragraph(
                ParagraphBuilder::new()
                    .run(RunBuilder::new("accent").theme_color("accent1", None))
                    .run(RunBuilder::new("light").theme_color("accent1", Some("99")))
                    .run(RunBuilder::new("text").theme_color("text1", None)),
            )
            .build(),
    );

    let runs = &paragraph(&model.blocks[0]).runs;
    assert_eq!(runs[0].style.font_color.as_deref(), Some("4472C4"));
    assert_eq!(runs[1].style.font_color.as_deref(), Some("8FAADC"));
    assert_eq!(runs[2].style.font_color.as_deref(), Some("000000"));
}

#[test]
fn test_theme_colors_without_theme_part() {
    let model = model(
        DocxBuilder::new()
            .without_theme()
            .paragraph(
                ParagraphBuilder::new().run(RunBuilder::new("accent").theme_color("accent1", None)),
            )
            .build(),
    );
    assert_eq!(paragraph(&model.blocks[0]).runs[0].style.font_color, None);
}

#[test]
fn test_default_font_becomes_document_css() {
    let docx = DocxBuilder::new()
        .default_font("Cambria", 12.0)
        .paragraph(ParagraphBuilder::text("body"))
        .build();

    let model = model(docx.clone());
    assert_eq!(model.default_run_style.font_family.as_deref(), Some("Cambria"));
    // Runs only carry what differs from the document default.
    assert_eq!(paragraph(&model.blocks[0]).runs[0].style.font_family, None);

    let html = html(docx);
    assert!(html.contains(".document{font-family:'Cambria';font-size:12.0pt;}"));
}

#[test]
fn test_vertical_merge_collapses_into_row_span() {
    let model = model(
        DocxBuilder::new()
            .table(
                DocTableBuilder::new()
                    .row(vec![DocCellBuilder::new("tall").merge_restart(), DocCellBuilder::new("b")])
                    .row(vec![DocCellBuilder::empty().merge_continue(), DocCellBuilder::new("c")])
                    .row(vec![DocCellBuilder::empty().merge_continue(), DocCellBuilder::new("d")])
                    .row(vec![DocCellBuilder::new("e"), DocCellBuilder::new("f")]),
            )
            .build(),
    );

    let rows = &table(&model.blocks[0]).rows;
    assert_eq!(rows[0].cells.len(), 2);
    assert_eq!(rows[0].cells[0].row_span, 3);
    assert_eq!(rows[1].cells.len(), 1);
    assert_eq!(rows[1].cells[0].paragraphs[0].runs[0].text, "c");
    assert_eq!(rows[2].cells.len(), 1);
    assert_eq!(rows[3].cells.len(), 2);
    assert_eq!(rows[3].cells[0].row_span, 1);
}

#[test]
fn test_grid_span_and_cell_properties() {
    let model = model(
        DocxBuilder::new()
            .table(
                DocTableBuilder::new()
                    .row_with_height(
                        360,
                        vec![DocCellBuilder::new("wide")
                            .span(2)
                            .width(1440)
                            .shading("FFEEDD")
                            .v_align("center")],
                    )
                    .row(vec![DocCellBuilder::new("x"), DocCellBuilder::new("y").shading("auto")]),
            )
            .build(),
    );

    let rows = &table(&model.blocks[0]).rows;
    let wide = &rows[0].cells[0];
    assert_eq!(wide.col_span, 2);
    assert_eq!(wide.width_px, Some(96.0));
    assert_eq!(wide.style.background_color.as_deref(), Some("FFEEDD"));
    assert_eq!(wide.style.vertical_align, Some(VAlign::Middle));
    assert_eq!(rows[0].height_px, Some(24.0));
    assert_eq!(rows[1].height_px, None);
    assert_eq!(rows[1].cells[1].style.background_color, None);
}

#[test]
fn test_table_markup() {
    let html = html(
        DocxBuilder::new()
            .table(
                DocTableBuilder::new()
                    .row(vec![
                        DocCellBuilder::new("a").span(2).merge_restart().shading("FFEEDD"),
                    ])
                    .row(vec![DocCellBuilder::empty().span(2).merge_continue()]),
            )
            .build(),
    );

    assert!(html.contains(".document td{background-color:#FFEEDD;}"));
    assert!(html.contains("<td colspan=\"2\" rowspan=\"2\">"));
    assert!(html.contains("<tr></tr>"));
}

#[test]
fn test_core_properties() {
    let docx = DocxBuilder::new()
        .title("Quarterly <Report>")
        .author("Finance")
        .paragraph(ParagraphBuilder::text("x"))
        .build();

    let model = model(docx.clone());
    assert_eq!(model.properties.title.as_deref(), Some("Quarterly <Report>"));
    assert_eq!(model.properties.author.as_deref(), Some("Finance"));

    let html = html(docx);
    assert!(html.contains("<title>Quarterly &lt;Report&gt;</title>"));
}

#[test]
fn test_missing_document_part_is_an_error() {
    let docx = DocxBuilder::new().without_document().build();
    let err = parser::parse_document(Cursor::new(docx)).unwrap_err();
    match err {
        ConvertError::MissingPart(part) => assert_eq!(part, "word/document.xml"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_debug_mode_attaches_paragraph_styles() {
    let docx = headings()
        .paragraph(ParagraphBuilder::text("Title").style("Heading1"))
        .build();
    let html = docx_to_html(Cursor::new(docx), &RenderOptions::default().debug(true)).unwrap();
    assert!(html.contains("data-para-style=\"{"));
    assert!(html.contains("&quot;headingLevel&quot;:1"));
    assert!(html.contains("data-run-style=\"{&quot;fontSize&quot;:16.0}\""));
}
