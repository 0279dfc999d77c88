//! Plain text target.
//!
//! No markup at all: headings are underlined, records are `name (type)` followed by an
//! aligned two-column table, and Markdown attributes are flattened to their text.

use super::common::{
    convert_with, display_name, AttributeNames, DocumentWriter, HandlerTable, WriterSettings,
};
use crate::dispatch::{walk, ValueHandler};
use crate::error::ConvertError;
use crate::format::{ConvertOptions, ConvertedOutput, Converter, SerializedDocument};
use crate::markup::{parse_markdown, plain_text};
use crate::model::{FieldValue, Record, RecordRef, RecordSet};
use crate::render_config::FormatSpecifier;
use unicode_width::UnicodeWidthStr;

/// Space between the name and value columns.
const GUTTER: usize = 2;

struct PlainValues<'a> {
    settings: &'a WriterSettings,
    record: &'a Record,
    attribute: &'a str,
}

impl ValueHandler for PlainValues<'_> {
    type Artifact = String;

    fn null(&mut self) -> Option<String> {
        Some(self.settings.empty_placeholder.clone())
    }

    fn reference(&mut self, target: &RecordRef) -> Option<String> {
        Some(target.qualified_name())
    }

    fn string(&mut self, text: &str) -> Option<String> {
        let format = self.settings.render_config.resolve(
            &self.record.package,
            &self.record.type_name,
            self.attribute,
        );
        match format {
            Some(FormatSpecifier::Markdown) => Some(plain_text(&parse_markdown(text))),
            _ => Some(text.to_string()),
        }
    }

    fn other(&mut self, value: &FieldValue) -> String {
        match value {
            FieldValue::Other(expression) => expression.to_string(),
            _ => String::new(),
        }
    }
}

/// Two aligned columns; continuation lines of a value stay in the value column.
pub fn create_table(rows: &[(String, String)]) -> String {
    let width = rows
        .iter()
        .map(|(name, _)| UnicodeWidthStr::width(name.as_str()))
        .max()
        .unwrap_or(0);

    let mut table = String::new();
    for (name, value) in rows {
        let padding = width - UnicodeWidthStr::width(name.as_str()) + GUTTER;
        table.push_str(name);
        let mut lines = value.lines();
        if let Some(first) = lines.next() {
            table.push_str(&" ".repeat(padding));
            table.push_str(first);
        }
        table.push('\n');
        for line in lines {
            if !line.is_empty() {
                table.push_str(&" ".repeat(width + GUTTER));
                table.push_str(line);
            }
            table.push('\n');
        }
    }
    table
}

/// A heading underlined with `=` at the top level and `-` below.
pub fn create_heading(text: &str, level: usize) -> String {
    let underline = if level <= 1 { '=' } else { '-' };
    let width = UnicodeWidthStr::width(text).max(1);
    format!("{text}\n{}\n", underline.to_string().repeat(width))
}

/// Builds one plain text document.
pub struct PlainWriter {
    output: String,
    settings: WriterSettings,
}

impl PlainWriter {
    pub fn new(settings: WriterSettings) -> Self {
        Self {
            output: String::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    /// Append a block, separated from the previous one by one empty line.
    pub fn write_block(&mut self, text: &str) {
        let text = text.trim_end_matches('\n');
        if text.is_empty() {
            return;
        }
        if !self.output.is_empty() {
            self.output.push('\n');
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    pub fn field_value(&self, record: &Record, attribute: &str, value: &FieldValue) -> String {
        let mut values = PlainValues {
            settings: &self.settings,
            record,
            attribute,
        };
        walk(&mut values, value).into_leaves().join(", ")
    }

    /// The aligned attribute table of a record, attribute names optionally translated.
    pub fn record_table(&self, record: &Record, names: Option<&AttributeNames>) -> String {
        let rows: Vec<(String, String)> = record
            .fields
            .iter()
            .map(|field| {
                (
                    display_name(names, &field.name).to_string(),
                    self.field_value(record, &field.name, &field.value),
                )
            })
            .collect();
        create_table(&rows)
    }
}

impl DocumentWriter for PlainWriter {
    fn heading(&mut self, title: &str, level: usize) -> Result<(), ConvertError> {
        let heading = create_heading(title, level);
        self.write_block(&heading);
        Ok(())
    }

    fn record(&mut self, record: &Record, _level: usize) -> Result<(), ConvertError> {
        let block = format!(
            "{} ({})\n{}",
            record.name,
            record.type_name,
            self.record_table(record, None)
        );
        self.write_block(&block);
        self.write_block(&format!("Source: {}", record.location));
        Ok(())
    }

    fn finish(self) -> Result<SerializedDocument, ConvertError> {
        Ok(SerializedDocument::Text(self.output))
    }
}

/// Converts records to plain text documents.
#[derive(Default)]
pub struct PlainConverter {
    handlers: HandlerTable<PlainWriter>,
}

impl PlainConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler<F>(mut self, type_name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut PlainWriter, &Record, usize) -> Result<(), ConvertError> + Send + Sync + 'static,
    {
        self.handlers.insert(type_name, handler);
        self
    }
}

impl Converter for PlainConverter {
    fn name(&self) -> &str {
        "plain"
    }

    fn description(&self) -> &str {
        "Plain text with aligned attribute tables"
    }

    fn file_extension(&self) -> &str {
        "txt"
    }

    fn convert(
        &self,
        records: &RecordSet,
        options: &ConvertOptions,
    ) -> Result<Vec<ConvertedOutput>, ConvertError> {
        let settings = WriterSettings::from_options(options);
        convert_with(records, options, self.file_extension(), &self.handlers, || {
            Ok(PlainWriter::new(settings.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        let rows = vec![
            ("id".to_string(), "7".to_string()),
            ("description".to_string(), "first\n\nsecond".to_string()),
        ];
        assert_eq!(
            create_table(&rows),
            "id           7\ndescription  first\n\n             second\n"
        );
    }

    #[test]
    fn test_empty_value() {
        let rows = vec![("note".to_string(), String::new())];
        assert_eq!(create_table(&rows), "note\n");
    }

    #[test]
    fn test_record_names_translated_and_source_footer() {
        use crate::model::{Field, SourceLocation};

        let record = Record {
            name: "tc_1".into(),
            type_name: "TestCase".into(),
            package: "Tests".into(),
            fields: vec![
                Field::new("desc", FieldValue::String("Boots".into())),
                Field::new("note", FieldValue::Null),
            ],
            location: SourceLocation {
                file: "tests.trlc".into(),
                line: 12,
            },
        };
        let names = AttributeNames::from([("desc".to_string(), "Description".to_string())]);

        let mut writer = PlainWriter::new(WriterSettings::from_options(&ConvertOptions::default()));
        let table = writer.record_table(&record, Some(&names));
        assert_eq!(table, "Description  Boots\nnote         N/A\n");

        writer.record(&record, 1).unwrap();
        let text = match writer.finish().unwrap() {
            SerializedDocument::Text(text) => text,
            other => panic!("Expected text, got {other:?}"),
        };
        assert!(text.ends_with("note  N/A\n\nSource: tests.trlc:12\n"));
    }

    #[test]
    fn test_heading() {
        assert_eq!(create_heading("Top", 1), "Top\n===\n");
        assert_eq!(create_heading("Sub", 3), "Sub\n---\n");
    }
}
