//! Markdown target.
//!
//! Records become a heading, an HTML anchor carrying the record name and an HTML table of
//! attributes. Value cells are padded with blank lines so the Markdown inside them still
//! renders. References link to the anchor of their target.

use super::common::{
    convert_with, display_name, AttributeNames, DocumentWriter, HandlerTable, WriterSettings,
};
use crate::dispatch::{walk, ValueHandler};
use crate::error::ConvertError;
use crate::format::{ConvertOptions, ConvertedOutput, Converter, SerializedDocument};
use crate::markup::{parse_markdown, plain_text};
use crate::model::{FieldValue, Record, RecordRef, RecordSet};
use crate::render::render_markdown;
use crate::render_config::FormatSpecifier;

const COLUMN_TITLES: [&str; 2] = ["Attribute Name", "Attribute Value"];

/// Deepest heading Markdown has.
const MAX_HEADING: usize = 6;

/// Escape text so Markdown shows it literally.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '`' | '*' | '_' | '{' | '}' | '[' | ']' | '(' | ')' | '#' | '+' | '-' | '.' | '!'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape text for use inside raw HTML.
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A heading line. Markdown has six levels; any other level yields an empty string.
pub fn create_heading(text: &str, level: usize) -> String {
    if (1..=6).contains(&level) {
        format!("{} {}\n", "#".repeat(level), escape(text))
    } else {
        String::new()
    }
}

/// An inline link. `text` is escaped, `target` is used as given.
pub fn create_link(text: &str, target: &str) -> String {
    format!("[{}]({target})", escape(text))
}

/// An unordered list, one escaped item per line.
pub fn create_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {}\n", escape(item)))
        .collect()
}

/// An image link to a generated diagram.
pub fn create_diagram_link(file_name: &str, caption: &str) -> String {
    format!("![{}]({file_name})\n", escape(caption))
}

/// Turn line feeds into hard line breaks so they survive rendering.
pub fn lf2soft_return(text: &str) -> String {
    text.replace('\n', "  \n")
}

/// Link from a reference to the anchor of its target record.
pub fn create_reference_link(target: &RecordRef) -> String {
    create_link(&target.qualified_name(), &format!("#{}", target.anchor()))
}

/// Start of an HTML attribute table.
pub fn create_table_head(titles: &[&str]) -> String {
    let mut head = String::from("<table>\n<thead>\n<tr>");
    for title in titles {
        head.push_str(&format!("<th>{}</th>", html_escape(title)));
    }
    head.push_str("</tr>\n</thead>\n<tbody>\n");
    head
}

/// One table row. Cells hold Markdown and are padded with blank lines.
pub fn append_table_row(cells: &[String]) -> String {
    let mut row = String::from("<tr>\n");
    for cell in cells {
        row.push_str("<td>\n\n");
        row.push_str(cell.trim_end_matches('\n'));
        row.push_str("\n\n</td>\n");
    }
    row.push_str("</tr>\n");
    row
}

pub fn create_table_end() -> String {
    "</tbody>\n</table>\n".to_string()
}

/// Renders field values as Markdown fragments.
struct MarkdownValues<'a> {
    settings: &'a WriterSettings,
    record: &'a Record,
    attribute: &'a str,
}

impl ValueHandler for MarkdownValues<'_> {
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
        // RST attributes have no Markdown rendering and are shown as text.
        let rendered = match format {
            Some(FormatSpecifier::Markdown) => render_markdown(&parse_markdown(text)),
            _ => lf2soft_return(&escape(text)),
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

/// Builds one Markdown document.
pub struct MarkdownWriter {
    output: String,
    settings: WriterSettings,
}

impl MarkdownWriter {
    pub fn new(settings: WriterSettings) -> Self {
        Self {
            output: String::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    /// Append a block of Markdown, separated from the previous one by one empty line.
    pub fn write_block(&mut self, markdown: &str) {
        let markdown = markdown.trim_end_matches('\n');
        if markdown.is_empty() {
            return;
        }
        if !self.output.is_empty() {
            self.output.push('\n');
        }
        self.output.push_str(markdown);
        self.output.push('\n');
    }

    /// The rendered value of a record field.
    pub fn field_value(&self, record: &Record, attribute: &str, value: &FieldValue) -> String {
        let mut values = MarkdownValues {
            settings: &self.settings,
            record,
            attribute,
        };
        walk(&mut values, value).into_leaves().join(", ")
    }

    /// Plain text of a field, with any Markdown markup removed.
    pub fn field_text(&self, record: &Record, attribute: &str) -> Option<String> {
        let text = record.string_field(attribute)?;
        if self
            .settings
            .render_config
            .is_format_markdown(&record.package, &record.type_name, attribute)
        {
            Some(plain_text(&parse_markdown(text)))
        } else {
            Some(text.to_string())
        }
    }

    /// The attribute table of a record, attribute names optionally translated.
    pub fn record_table(&self, record: &Record, names: Option<&AttributeNames>) -> String {
        let mut table = create_table_head(&COLUMN_TITLES);
        for field in &record.fields {
            table.push_str(&append_table_row(&[
                escape(display_name(names, &field.name)),
                self.field_value(record, &field.name, &field.value),
            ]));
        }
        table.push_str(&create_table_end());
        table
    }
}

impl DocumentWriter for MarkdownWriter {
    fn heading(&mut self, title: &str, level: usize) -> Result<(), ConvertError> {
        let heading = create_heading(title, level.clamp(1, MAX_HEADING));
        self.write_block(&heading);
        Ok(())
    }

    fn record(&mut self, record: &Record, level: usize) -> Result<(), ConvertError> {
        let title = format!("{} ({})", record.name, record.type_name);
        let heading = create_heading(&title, level.clamp(1, MAX_HEADING));
        self.write_block(&heading);
        self.write_block(&format!("<a id=\"{}\"></a>", html_escape(&record.name)));
        let table = self.record_table(record, None);
        self.write_block(&table);
        self.write_block(&format!("Source: `{}`", record.location));
        Ok(())
    }

    fn finish(self) -> Result<SerializedDocument, ConvertError> {
        Ok(SerializedDocument::Text(self.output))
    }
}

/// Converts records to Markdown documents.
#[derive(Default)]
pub struct MarkdownConverter {
    handlers: HandlerTable<MarkdownWriter>,
}

impl MarkdownConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert records of `type_name` with `handler` instead of the default table.
    pub fn with_handler<F>(mut self, type_name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut MarkdownWriter, &Record, usize) -> Result<(), ConvertError>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert(type_name, handler);
        self
    }
}

impl Converter for MarkdownConverter {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "Markdown documents with HTML attribute tables"
    }

    fn file_extension(&self) -> &str {
        "md"
    }

    fn convert(
        &self,
        records: &RecordSet,
        options: &ConvertOptions,
    ) -> Result<Vec<ConvertedOutput>, ConvertError> {
        let settings = WriterSettings::from_options(options);
        convert_with(records, options, self.file_extension(), &self.handlers, || {
            Ok(MarkdownWriter::new(settings.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a_b*c"), "a\\_b\\*c");
        assert_eq!(escape("v1.0 (draft)!"), "v1\\.0 \\(draft\\)\\!");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_create_heading() {
        assert_eq!(create_heading("Title", 1), "# Title\n");
        assert_eq!(create_heading("Deep", 6), "###### Deep\n");
        assert_eq!(create_heading("Too deep", 7), "");
        assert_eq!(create_heading("Zero", 0), "");
    }

    #[test]
    fn test_links_and_lists() {
        assert_eq!(create_link("a_b", "#a_b"), "[a\\_b](#a_b)");
        assert_eq!(create_list(&["one", "two"]), "- one\n- two\n");
        assert_eq!(
            create_diagram_link("out/diagram.png", "Flow"),
            "![Flow](out/diagram.png)\n"
        );
        assert_eq!(lf2soft_return("a\nb"), "a  \nb");
        assert_eq!(
            create_reference_link(&RecordRef::new("Sys", "top")),
            "[Sys\\.top](#top)"
        );
    }

    #[test]
    fn test_table_row_pads_cells() {
        let row = append_table_row(&["name".to_string(), "**x**\n".to_string()]);
        assert_eq!(
            row,
            "<tr>\n<td>\n\nname\n\n</td>\n<td>\n\n**x**\n\n</td>\n</tr>\n"
        );
    }

    #[test]
    fn test_write_block_separates() {
        let mut writer = MarkdownWriter::new(WriterSettings::from_options(
            &ConvertOptions::default(),
        ));
        writer.write_block("# A\n");
        writer.write_block("");
        writer.write_block("text");
        assert_eq!(
            writer.finish().unwrap(),
            SerializedDocument::Text("# A\n\ntext\n".into())
        );
    }

    #[test]
    fn test_deep_levels_clamp_to_six() {
        use crate::model::SourceLocation;

        let mut writer = MarkdownWriter::new(WriterSettings::from_options(
            &ConvertOptions::default(),
        ));
        let record = Record {
            name: "deep_req".into(),
            type_name: "Requirement".into(),
            package: "Sys".into(),
            fields: Vec::new(),
            location: SourceLocation {
                file: "deep.trlc".into(),
                line: 9,
            },
        };
        writer.heading("Deep section", 8).unwrap();
        writer.record(&record, 7).unwrap();

        let md = writer.finish().unwrap();
        let md = md.as_text().unwrap();
        assert!(md.starts_with(
            "###### Deep section\n\n###### deep\\_req \\(Requirement\\)\n\n<a id=\"deep_req\"></a>\n"
        ));
        assert!(md.ends_with("Source: `deep.trlc:9`\n"));
    }
}
