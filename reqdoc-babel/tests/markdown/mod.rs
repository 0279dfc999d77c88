//! Markdown target tests
//!
//! Generated documents are parsed back with comrak to check that links and the Markdown
//! inside table cells survive.

use crate::common::{convert, options, single_document_options};
use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, Options};
use proptest::prelude::*;
use reqdoc_babel::formats::markdown::{create_diagram_link, create_heading};
use reqdoc_babel::formats::MarkdownConverter;
use reqdoc_babel::markup::{parse_markdown, Block, Inline};
use reqdoc_babel::render::render_markdown;
use reqdoc_babel::{AttributeNames, ConvertError, Converter, Record};

fn link_urls<'a>(node: &'a AstNode<'a>, urls: &mut Vec<String>) {
    if let NodeValue::Link(link) = &node.data.borrow().value {
        urls.push(link.url.clone());
    }
    for child in node.children() {
        link_urls(child, urls);
    }
}

fn has_strong<'a>(node: &'a AstNode<'a>) -> bool {
    matches!(node.data.borrow().value, NodeValue::Strong) || node.children().any(has_strong)
}

#[test]
fn test_record_heading_anchor_and_table() {
    let md = convert(&MarkdownConverter::new(), &options(), "system.md");
    assert!(md.starts_with(
        "# System\n\n### sys\\_top \\(Requirement\\)\n\n<a id=\"sys_top\"></a>\n"
    ));
    assert!(md.contains("<tr><th>Attribute Name</th><th>Attribute Value</th></tr>"));
    assert!(md.contains("<td>\n\nThe system **shall** boot.\n\n- fast\n- safe\n\n</td>"));
    assert!(md.contains("<td>\n\nApproved\n\n</td>"));
    assert!(md.contains("<td>\n\nN/A\n\n</td>"));
    assert!(md.ends_with("</table>\n\nSource: `specs/system.trlc:3`\n"));
}

#[test]
fn test_references_link_to_bare_name_anchor() {
    let md = convert(&MarkdownConverter::new(), &options(), "software.md");
    assert!(md.contains("[Sys\\.sys\\_top](#sys_top)"));
    assert!(md.contains("<td>\n\ntiming, boot\n\n</td>"));

    let arena = Arena::new();
    let root = parse_document(&arena, &md, &Options::default());
    let mut urls = Vec::new();
    link_urls(root, &mut urls);
    assert_eq!(urls, vec!["#sys_top".to_string()]);
}

#[test]
fn test_markdown_in_cells_still_renders() {
    let md = convert(&MarkdownConverter::new(), &options(), "system.md");
    let arena = Arena::new();
    let root = parse_document(&arena, &md, &Options::default());
    assert!(has_strong(root));
}

#[test]
fn test_unflagged_attribute_is_escaped() {
    let md = convert(&MarkdownConverter::new(), &Default::default(), "system.md");
    assert!(md.contains("The system \\*\\*shall\\*\\* boot\\.  \n  \n\\- fast  \n\\- safe"));
}

#[test]
fn test_single_document_levels() {
    let outputs = MarkdownConverter::new()
        .convert(&crate::common::records(), &single_document_options())
        .unwrap();
    assert_eq!(outputs.len(), 1);
    let md = outputs[0].text().unwrap();
    assert!(md.starts_with(
        "# Specification\n\n## System\n\n#### sys\\_top \\(Requirement\\)\n"
    ));
    assert!(md.contains("### sw\\_boot \\(Requirement\\)\n"));
}

#[test]
fn test_project_handler_replaces_table() {
    let converter =
        MarkdownConverter::new().with_handler("Requirement", |writer, record: &Record, level| {
            let title = writer.field_text(record, "description").unwrap_or_default();
            writer.write_block(&create_heading(&title, level));
            Ok(())
        });
    let md = convert(&converter, &options(), "software.md");
    assert_eq!(md, "## Boot in 100 ms\n");
}

#[test]
fn test_project_handler_translates_attribute_names() {
    let converter =
        MarkdownConverter::new().with_handler("Requirement", |writer, record: &Record, level| {
            let names = AttributeNames::from([
                ("description".to_string(), "Description".to_string()),
                ("derived_from".to_string(), "Derived From".to_string()),
            ]);
            writer.write_block(&create_heading(&record.name, level));
            let table = writer.record_table(record, Some(&names));
            writer.write_block(&table);
            Ok(())
        });
    let md = convert(&converter, &options(), "software.md");
    assert!(md.starts_with("## sw\\_boot\n"));
    assert!(md.contains("<td>\n\nDescription\n\n</td>"));
    assert!(md.contains("<td>\n\nDerived From\n\n</td>"));
    assert!(md.contains("<td>\n\ntags\n\n</td>"));
    assert!(!md.contains("derived\\_from"));
}

#[test]
fn test_project_handler_failure_aborts() {
    let converter =
        MarkdownConverter::new().with_handler("Requirement", |writer, record: &Record, _| {
            let diagram = writer
                .settings()
                .locate_resource(format!("{}.puml", record.name))?;
            writer.write_block(&create_diagram_link(&diagram.display().to_string(), "Diagram"));
            Ok(())
        });
    let result = converter.convert(&crate::common::records(), &options());
    assert!(matches!(result, Err(ConvertError::MissingResource(_))));
}

#[test]
fn test_strong_span() {
    let blocks = vec![Block::Paragraph(vec![Inline::Strong(vec![Inline::Text(
        "text".into(),
    )])])];
    assert_eq!(render_markdown(&blocks), "**text**\n");
}

#[test]
fn test_nested_list_markers_differ() {
    let md = render_markdown(&parse_markdown("- a\n  - b\n"));
    assert!(md.starts_with("- a\n"));
    assert!(md.contains("  * b\n"));
}

fn paragraph() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 1..6).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn plain_markup_renders_as_its_text(paragraphs in prop::collection::vec(paragraph(), 1..5)) {
        let source = paragraphs.join("\n\n");
        let rendered = render_markdown(&parse_markdown(&source));
        prop_assert!(!rendered.contains('*'));
        prop_assert_eq!(rendered, format!("{source}\n"));
    }
}
