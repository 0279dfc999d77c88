//! reStructuredText target tests

use crate::common::{convert, options, records, single_document_options};
use insta::assert_snapshot;
use reqdoc_babel::formats::RstConverter;
use reqdoc_babel::markup::{parse_markdown, Block, Inline};
use reqdoc_babel::render::render_rst;
use reqdoc_babel::{AttributeNames, Converter, Record};

#[test]
fn test_record_admonition_with_grid_table() {
    let rst = convert(&RstConverter::new(), &options(), "system.rst");
    assert!(rst.starts_with(".. _system:\n\nSystem\n======\n\n.. _sys_top:\n\n"));
    assert!(rst.contains(".. admonition:: sys\\_top \\(Requirement\\)\n\n    +"));
    assert!(rst.contains("    | Attribute Name | Attribute Value"));
    assert!(rst.contains("| description    | The system **shall** boot."));
    assert!(rst.contains("|                | * fast"));
    assert!(rst.contains("| note           | N/A"));
    assert!(rst.ends_with("+\n\n    Source: ``specs/system.trlc:3``\n"));
}

#[test]
fn test_project_handler_translates_attribute_names() {
    let converter = RstConverter::new().with_handler("Requirement", |writer, record: &Record, _| {
        let names = AttributeNames::from([("derived_from".to_string(), "Derived From".to_string())]);
        let table = writer.record_table(record, Some(&names));
        writer.write_block(&table);
        Ok(())
    });
    let rst = convert(&converter, &options(), "software.rst");
    assert!(rst.contains("    | Derived From   | "));
    assert!(rst.contains("    | tags           | "));
    assert!(!rst.contains("derived\\_from"));
    assert!(!rst.contains("Source:"));
}

#[test]
fn test_reference_is_ref_role() {
    let rst = convert(&RstConverter::new(), &options(), "software.rst");
    assert!(rst.contains(":ref:`Sys\\.sys\\_top <sys_top>`"));
    assert!(rst.contains("| Boot in *100* ms"));
    assert!(rst.contains("| timing, boot"));
}

#[test]
fn test_single_document_heading_levels() {
    let outputs = RstConverter::new()
        .convert(&records(), &single_document_options())
        .unwrap();
    assert_eq!(outputs[0].file_name, "output.rst");
    assert!(outputs[0].text().unwrap().starts_with(
        ".. _specification:\n\nSpecification\n=============\n\n.. _system:\n\nSystem\n------\n"
    ));
}

#[test]
fn test_rst_attributes_pass_through() {
    let mut options = options();
    options.render_config = reqdoc_babel::RenderConfig::from_json(
        r#"{"renderCfg": [{"attribute": "description", "format": "rst"}]}"#,
    )
    .unwrap();
    let rst = convert(&RstConverter::new(), &options, "system.rst");
    assert!(rst.contains("The system **shall** boot."));
    assert!(rst.contains("- fast"));
    assert!(!rst.contains("\\- fast"));
}

#[test]
fn test_deep_headings_use_dash() {
    let blocks = vec![Block::Heading {
        level: 7,
        content: vec![Inline::Text("Deep".into())],
    }];
    assert_snapshot!(render_rst(&blocks), @r"
    Deep
    ----
    ");
}

#[test]
fn test_nested_list_markers_differ() {
    let rst = render_rst(&parse_markdown("- a\n  - b\n"));
    assert!(rst.starts_with("* a\n"));
    assert!(rst.contains("  - b\n"));
}
