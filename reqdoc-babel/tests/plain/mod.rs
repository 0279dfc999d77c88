//! Plain text target tests

use crate::common::{convert, options, single_document_options};
use insta::assert_snapshot;
use reqdoc_babel::formats::PlainConverter;
use reqdoc_babel::Converter;

#[test]
fn test_record_table() {
    let text = convert(&PlainConverter::new(), &options(), "software.txt");
    assert_snapshot!(text, @r"
    sw_boot (Requirement)
    description   Boot in 100 ms
    derived_from  Sys.sys_top
    tags          timing, boot

    Source: specs/software.trlc:1
    ");
}

#[test]
fn test_markdown_flattened_and_placeholder() {
    let text = convert(&PlainConverter::new(), &options(), "system.txt");
    assert_eq!(
        text,
        "System\n======\n\nsys_top (Requirement)\n\
         description  The system shall boot.\n\
         \n\
         \x20            fast\n\
         \x20            safe\n\
         status       Approved\n\
         note         N/A\n\
         \n\
         Source: specs/system.trlc:3\n"
    );
}

#[test]
fn test_single_document() {
    let outputs = PlainConverter::new()
        .convert(&crate::common::records(), &single_document_options())
        .unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].file_name, "output.txt");
    let text = outputs[0].text().unwrap();
    assert!(text.starts_with("Specification\n=============\n\nSystem\n------\n"));
    assert!(text.ends_with("tags          timing, boot\n\nSource: specs/software.trlc:1\n"));
}

#[test]
fn test_custom_placeholder() {
    let mut options = options();
    options.empty_placeholder = "-".into();
    let text = convert(&PlainConverter::new(), &options, "system.txt");
    assert!(text.contains("note         -\n"));
}
