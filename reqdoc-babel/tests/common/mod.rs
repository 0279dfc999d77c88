//! Shared fixtures for the conversion tests.

use reqdoc_babel::{ConvertOptions, ConvertedOutput, Converter, RecordSet, RenderConfig};

pub const RECORDS: &str = include_str!("../fixtures/records.json");
pub const RENDER_CONFIG: &str = include_str!("../fixtures/render.json");

pub fn records() -> RecordSet {
    RecordSet::from_json(RECORDS).expect("fixture records parse")
}

/// Default options with the fixture rules: every `description` is Markdown.
pub fn options() -> ConvertOptions {
    ConvertOptions {
        render_config: RenderConfig::from_json(RENDER_CONFIG).expect("fixture rules parse"),
        ..ConvertOptions::default()
    }
}

pub fn single_document_options() -> ConvertOptions {
    ConvertOptions {
        single_document: true,
        ..options()
    }
}

/// Convert the fixture and return the output called `file_name`.
pub fn convert(converter: &dyn Converter, options: &ConvertOptions, file_name: &str) -> String {
    let outputs = converter
        .convert(&records(), options)
        .expect("conversion succeeds");
    find(&outputs, file_name)
}

pub fn find(outputs: &[ConvertedOutput], file_name: &str) -> String {
    output(outputs, file_name)
        .text()
        .unwrap_or_else(|| panic!("{file_name} is not a text document"))
        .to_string()
}

pub fn output<'a>(outputs: &'a [ConvertedOutput], file_name: &str) -> &'a ConvertedOutput {
    outputs
        .iter()
        .find(|output| output.file_name == file_name)
        .unwrap_or_else(|| panic!("no output named {file_name}"))
}
