//! reStructuredText target.
//!
//! Every heading and record gets a label so `:ref:` links resolve across documents. A record
//! is an admonition wrapping a grid table of its attributes; grid tables allow multi-line
//! cells, which rendered Markdown attributes need.

use super::common::{
    convert_with, display_name, AttributeNames, DocumentWriter, HandlerTable, WriterSettings,
};
use crate::dispatch::{walk, ValueHandler};
use crate::error::ConvertError;
use crate::format::{ConvertOptions, ConvertedOutput, Converter, SerializedDocument};
use crate::markup::parse_markdown;
use crate::model::{FieldValue, Record, RecordRef, RecordSet};
use crate::render::rst::underline_char;
use crate::render::render_rst;
use crate::render_config::FormatSpecifier;
use unicode_width::UnicodeWidthStr;

const COLUMN_TITLES: [&str; 2] = ["Attribute Name", "Attribute Value"];
const TABLE_INDENT: &str = "    ";

/// Escape text so reStructuredText shows it literally.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '`'
                | '*'
                | '_'
                | '{'
                | '}'
                | '['
                | ']'
                | '<'
                | '>'
                | '('
                | ')'
                | '#'
                | '+'
                | '-'
                | '.'
                | '!'
                | '|'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Label name derived from heading text: lower case, spaces as dashes.
pub fn label_for(text: &str) -> String {
    text.trim().to_lowercase().replace(' ', "-")
}

/// An explicit target label line.
pub fn create_label(name: &str) -> String {
    format!(".. _{name}:\n")
}

/// A labelled heading. The underline matches the display width of the escaped text.
pub fn create_heading(text: &str, level: usize) -> String {
    let title = escape(text);
    let level = u8::try_from(level).unwrap_or(u8::MAX);
    let width = UnicodeWidthStr::width(title.as_str()).max(1);
    format!(
        "{}\n{title}\n{}\n",
        create_label(&label_for(text)),
        underline_char(level).to_string().repeat(width)
    )
}

/// A cross reference to a label.
pub fn create_link(text: &str, target: &str) -> String {
    format!(":ref:`{} <{target}>`", escape(text))
}

/// Cross reference to the label of a referenced record.
pub fn create_reference_link(target: &RecordRef) -> String {
    create_link(&target.qualified_name(), target.anchor())
}

/// An image directive for a generated diagram.
pub fn create_diagram_link(file_name: &str, caption: &str) -> String {
    format!(".. image:: {file_name}\n   :alt: {}\n", escape(caption))
}

/// A grid table. Cells may span several lines; every line is prefixed with `indent`.
pub fn create_grid_table(titles: &[&str], rows: &[Vec<String>], indent: &str) -> String {
    let columns = titles.len();
    let mut widths: Vec<usize> = titles
        .iter()
        .map(|title| UnicodeWidthStr::width(*title))
        .collect();
    for row in rows {
        for (column, cell) in row.iter().enumerate().take(columns) {
            for line in cell.lines() {
                widths[column] = widths[column].max(UnicodeWidthStr::width(line));
            }
        }
    }

    let border = |fill: char| -> String {
        let mut line = format!("{indent}+");
        for width in &widths {
            line.push_str(&fill.to_string().repeat(width + 2));
            line.push('+');
        }
        line.push('\n');
        line
    };

    let titles: Vec<String> = titles.iter().map(|title| title.to_string()).collect();
    let mut table = border('-');
    table.push_str(&grid_row(&titles, &widths, indent));
    table.push_str(&border('='));
    for row in rows {
        table.push_str(&grid_row(row, &widths, indent));
        table.push_str(&border('-'));
    }
    table
}

fn grid_row(cells: &[String], widths: &[usize], indent: &str) -> String {
    let cell_lines: Vec<Vec<&str>> = widths
        .iter()
        .enumerate()
        .map(|(column, _)| {
            cells
                .get(column)
                .map(|cell| cell.lines().collect())
                .unwrap_or_default()
        })
        .collect();
    let height = cell_lines.iter().map(Vec::len).max().unwrap_or(0).max(1);

    let mut output = String::new();
    for index in 0..height {
        output.push_str(indent);
        output.push('|');
        for (column, width) in widths.iter().enumerate() {
            let line = cell_lines[column].get(index).copied().unwrap_or("");
            let padding = width - UnicodeWidthStr::width(line);
            output.push(' ');
            output.push_str(line);
            output.push_str(&" ".repeat(padding + 1));
            output.push('|');
        }
        output.push('\n');
    }
    output
}

/// Renders field values as RST fragments.
struct RstValues<'a> {
    settings: &'a WriterSettings,
    record: &'a Record,
    attribute: &'a str,
}

impl ValueHandler for RstValues<'_> {
    type Artifact = String;

    fn null(&mut self) -> Option<String> {
        Some(escape(&self.settings.empty_placeholder))
    }

    fn reference(&mut self, target: &RecordRef) -> Option<String> {
        Some(create_reference_link(target))
    }

    fn string(&mut self, text: &str) -> Option<String> {
        let format = self.settings.render_config.resolve(
            &self.record.package,
            &self.record.type_name,
            self.attribute,
        );
        let rendered = match format {
            Some(FormatSpecifier::Markdown) => render_rst(&parse_markdown(text)),
            Some(FormatSpecifier::Rst) => text.to_string(),
            _ => escape(text),
        };
        Some(rendered.trim_end_matches('\n').to_string())
    }

    fn other(&mut self, value: &FieldValue) -> String {
        match value {
            FieldValue::Other(expression) => escape(&expression.to_string()),
            _ => String::new(),
        }
    }
}

/// Builds one reStructuredText document.
pub struct RstWriter {
    output: String,
    settings: WriterSettings,
}

impl RstWriter {
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
    pub fn write_block(&mut self, rst: &str) {
        let rst = rst.trim_end_matches('\n');
        if rst.is_empty() {
            return;
        }
        if !self.output.is_empty() {
            self.output.push('\n');
        }
        self.output.push_str(rst);
        self.output.push('\n');
    }

    /// The rendered value of a record field.
    pub fn field_value(&self, record: &Record, attribute: &str, value: &FieldValue) -> String {
        let mut values = RstValues {
            settings: &self.settings,
            record,
            attribute,
        };
        walk(&mut values, value).into_leaves().join(", ")
    }

    /// The indented attribute table of a record, attribute names optionally translated.
    pub fn record_table(&self, record: &Record, names: Option<&AttributeNames>) -> String {
        let rows: Vec<Vec<String>> = record
            .fields
            .iter()
            .map(|field| {
                vec![
                    escape(display_name(names, &field.name)),
                    self.field_value(record, &field.name, &field.value),
                ]
            })
            .collect();
        create_grid_table(&COLUMN_TITLES, &rows, TABLE_INDENT)
    }
}

impl DocumentWriter for RstWriter {
    fn heading(&mut self, title: &str, level: usize) -> Result<(), ConvertError> {
        let heading = create_heading(title, level);
        self.write_block(&heading);
        Ok(())
    }

    fn record(&mut self, record: &Record, _level: usize) -> Result<(), ConvertError> {
        self.write_block(&create_label(&record.name));
        self.write_block(&format!(
            ".. admonition:: {} ({})",
            escape(&record.name),
            escape(&record.type_name)
        ));
        let table = self.record_table(record, None);
        self.write_block(&table);
        self.write_block(&format!("{TABLE_INDENT}Source: ``{}``", record.location));
        Ok(())
    }

    fn finish(self) -> Result<SerializedDocument, ConvertError> {
        Ok(SerializedDocument::Text(self.output))
    }
}

/// Converts records to reStructuredText documents.
#[derive(Default)]
pub struct RstConverter {
    handlers: HandlerTable<RstWriter>,
}

impl RstConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert records of `type_name` with `handler` instead of the default admonition.
    pub fn with_handler<F>(mut self, type_name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut RstWriter, &Record, usize) -> Result<(), ConvertError> + Send + Sync + 'static,
    {
        self.handlers.insert(type_name, handler);
        self
    }
}

impl Converter for RstConverter {
    fn name(&self) -> &str {
        "rst"
    }

    fn description(&self) -> &str {
        "reStructuredText documents with grid tables"
    }

    fn file_extension(&self) -> &str {
        "rst"
    }

    fn convert(
        &self,
        records: &RecordSet,
        options: &ConvertOptions,
    ) -> Result<Vec<ConvertedOutput>, ConvertError> {
        let settings = WriterSettings::from_options(options);
        convert_with(records, options, self.file_extension(), &self.handlers, || {
            Ok(RstWriter::new(settings.clone()))
        })
    }
}
