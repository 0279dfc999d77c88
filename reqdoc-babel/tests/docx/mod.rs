//! Rich-document target tests
//!
//! The generated `.docx` archive is reopened with the zip crate and each part is parsed with
//! roxmltree.

use crate::common::{options, output, records};
use reqdoc_babel::formats::DocxConverter;
use reqdoc_babel::model::{Field, FieldValue, Item, Record, SourceFile, SourceLocation};
use reqdoc_babel::{ConvertError, ConvertOptions, Converter, RecordSet};
use roxmltree::{Document, Node};
use std::io::{Cursor, Read};
use zip::ZipArchive;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Convert `records` and return the bytes of the document called `file_name`.
fn package(records: &RecordSet, options: &ConvertOptions, file_name: &str) -> Vec<u8> {
    let outputs = DocxConverter::new()
        .convert(records, options)
        .expect("conversion succeeds");
    output(&outputs, file_name).content.clone().into_bytes()
}

fn read_part(package: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(package)).expect("a zip archive");
    let mut xml = String::new();
    archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing part {name}"))
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

fn w_attributes<'a>(node: Node<'a, '_>, tag: &str, attribute: &str) -> Vec<&'a str> {
    node.descendants()
        .filter(|node| node.has_tag_name((W_NS, tag)))
        .filter_map(|node| node.attribute((W_NS, attribute)))
        .collect()
}

/// Paragraph texts with their style ids.
fn paragraphs<'a>(node: Node<'a, '_>) -> Vec<(String, Option<&'a str>)> {
    node.descendants()
        .filter(|node| node.has_tag_name((W_NS, "p")))
        .map(|paragraph| {
            let text: String = paragraph
                .descendants()
                .filter(|node| node.has_tag_name((W_NS, "t")))
                .filter_map(|node| node.text())
                .collect();
            let style = paragraph
                .descendants()
                .find(|node| node.has_tag_name((W_NS, "pStyle")))
                .and_then(|node| node.attribute((W_NS, "val")));
            (text, style)
        })
        .collect()
}

#[test]
fn test_package_is_a_docx_archive() {
    let outputs = DocxConverter::new().convert(&records(), &options()).unwrap();
    let names: Vec<_> = outputs.iter().map(|output| output.file_name.as_str()).collect();
    assert_eq!(names, vec!["system.docx", "software.docx"]);

    let bytes = output(&outputs, "system.docx").content.clone().into_bytes();
    assert!(bytes.starts_with(b"PK\x03\x04"));
    let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    let mut parts: Vec<_> = archive.file_names().collect();
    parts.sort_unstable();
    assert_eq!(
        parts,
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "word/_rels/document.xml.rels",
            "word/document.xml",
            "word/styles.xml",
        ]
    );

    let xml = read_part(&bytes, "[Content_Types].xml");
    let types = Document::parse(&xml).unwrap();
    let defaults: Vec<_> = types
        .descendants()
        .filter(|node| node.has_tag_name((CONTENT_TYPES_NS, "Default")))
        .filter_map(|node| node.attribute("Extension"))
        .collect();
    assert_eq!(defaults, vec!["rels", "xml"]);

    let xml = read_part(&bytes, "_rels/.rels");
    let rels = Document::parse(&xml).unwrap();
    assert!(rels
        .descendants()
        .any(|node| node.attribute("Target") == Some("word/document.xml")));
}

#[test]
fn test_record_heading_bookmark_and_table() {
    let bytes = package(&records(), &options(), "system.docx");
    let xml = read_part(&bytes, "word/document.xml");
    let document = Document::parse(&xml).unwrap();
    let document = document.root();

    assert_eq!(w_attributes(document, "bookmarkStart", "name"), vec!["sys_top"]);
    assert_eq!(w_attributes(document, "tblStyle", "val"), vec!["TableGrid"]);
    let header_rows = document
        .descendants()
        .filter(|node| node.has_tag_name((W_NS, "tblHeader")))
        .count();
    assert_eq!(header_rows, 1);

    let paragraphs = paragraphs(document);
    assert_eq!(paragraphs[0], ("System".to_string(), Some("Heading1")));
    assert_eq!(
        paragraphs[1],
        ("sys_top (Requirement)".to_string(), Some("Heading3"))
    );
    assert_eq!(paragraphs[2].0, "Element");
    assert_eq!(paragraphs[3].0, "Value");
    assert!(paragraphs.contains(&("The system shall boot.".to_string(), None)));
    assert!(paragraphs.contains(&("fast".to_string(), Some("ListBullet"))));
    assert!(paragraphs.contains(&("Approved".to_string(), None)));
    assert!(paragraphs.contains(&("N/A".to_string(), None)));
    assert_eq!(
        paragraphs.last(),
        Some(&("Source: specs/system.trlc:3".to_string(), Some("Caption")))
    );
}

#[test]
fn test_strong_is_one_bold_run() {
    let bytes = package(&records(), &options(), "system.docx");
    let xml = read_part(&bytes, "word/document.xml");
    let document = Document::parse(&xml).unwrap();
    let bold: Vec<_> = document
        .descendants()
        .filter(|node| node.has_tag_name((W_NS, "r")))
        .filter(|run| run.descendants().any(|node| node.has_tag_name((W_NS, "b"))))
        .filter_map(|run| {
            run.descendants()
                .find(|node| node.has_tag_name((W_NS, "t")))
                .and_then(|node| node.text())
        })
        .collect();
    assert!(bold.contains(&"shall"));
    assert!(!bold.contains(&"The system "));
}

#[test]
fn test_references_and_array_bullets() {
    let bytes = package(&records(), &options(), "software.docx");
    let xml = read_part(&bytes, "word/document.xml");
    let document = Document::parse(&xml).unwrap();
    let document = document.root();

    assert_eq!(w_attributes(document, "hyperlink", "anchor"), vec!["sys_top"]);
    let paragraphs = paragraphs(document);
    assert!(paragraphs.contains(&("Sys.sys_top".to_string(), Some("ListBullet"))));
    assert!(paragraphs.contains(&("timing".to_string(), Some("ListBullet"))));
    assert!(paragraphs.contains(&("boot".to_string(), Some("ListBullet"))));

    let xml = read_part(&bytes, "word/styles.xml");
    let styles = Document::parse(&xml).unwrap();
    let ids = w_attributes(styles.root(), "style", "styleId");
    for expected in ["Heading2", "ListBullet", "Hyperlink", "TableGrid", "Caption"] {
        assert!(ids.contains(&expected), "missing style {expected}");
    }
}

fn record_with_link() -> RecordSet {
    RecordSet {
        files: vec![SourceFile {
            name: "links.trlc".into(),
            items: vec![Item::Record {
                record: Record {
                    name: "link_req".into(),
                    type_name: "Requirement".into(),
                    package: "Web".into(),
                    fields: vec![Field::new(
                        "description",
                        FieldValue::String("See [the docs](https://example.com/docs).".into()),
                    )],
                    location: SourceLocation {
                        file: "links.trlc".into(),
                        line: 1,
                    },
                },
                level: 0,
            }],
        }],
    }
}

#[test]
fn test_external_link_relationship() {
    let bytes = package(&record_with_link(), &options(), "links.docx");

    let xml = read_part(&bytes, "word/_rels/document.xml.rels");
    let rels = Document::parse(&xml).unwrap();
    let link = rels
        .descendants()
        .find(|node| node.attribute("Target") == Some("https://example.com/docs"))
        .expect("hyperlink relationship");
    assert_eq!(link.attribute("TargetMode"), Some("External"));

    let xml = read_part(&bytes, "word/document.xml");
    let document = Document::parse(&xml).unwrap();
    let id = link.attribute("Id").unwrap();
    assert!(document
        .descendants()
        .any(|node| node.attribute((R_NS, "id")) == Some(id)));
}

#[test]
fn test_template_styles_win() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("styles.xml");
    std::fs::write(
        &template,
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="{W_NS}"><w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblInd w:w="42"/></w:tblPr></w:style></w:styles>"#
        ),
    )
    .unwrap();

    let mut options = options();
    options.docx.template = Some(template);
    let bytes = package(&records(), &options, "system.docx");
    let xml = read_part(&bytes, "word/styles.xml");
    let styles = Document::parse(&xml).unwrap();
    let styles = styles.root();

    let ids = w_attributes(styles, "style", "styleId");
    assert_eq!(ids.iter().filter(|id| **id == "TableGrid").count(), 1);
    assert!(ids.contains(&"Heading3"));
    assert_eq!(w_attributes(styles, "tblInd", "w"), vec!["42"]);
}

#[test]
fn test_malformed_template_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("styles.xml");
    std::fs::write(&template, "<w:styles><unclosed>").unwrap();

    let mut options = options();
    options.docx.template = Some(template);
    let result = DocxConverter::new().convert(&records(), &options);
    assert!(matches!(result, Err(ConvertError::Template(_))));
}

#[test]
fn test_custom_table_style_and_code_font() {
    let mut options = options();
    options.docx.table_style = "Light List".into();
    options.docx.code_font = "Courier New".into();
    let mut records = record_with_link();
    if let Item::Record { record, .. } = &mut records.files[0].items[0] {
        record.fields[0].value = FieldValue::String("Call `boot()`".into());
    }

    let bytes = package(&records, &options, "links.docx");
    let xml = read_part(&bytes, "word/document.xml");
    let document = Document::parse(&xml).unwrap();
    let document = document.root();
    assert_eq!(w_attributes(document, "tblStyle", "val"), vec!["LightList"]);
    assert!(w_attributes(document, "rFonts", "ascii").contains(&"Courier New"));
}
