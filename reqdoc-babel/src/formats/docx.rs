//! Rich-document target.
//!
//!     Each writer builds a [`DocxDocument`] and serializes it as a `.docx` package when finished.
//!     A record is a bookmarked heading `name (type)` followed by an `Element`/`Value` table
//!     and a `Caption` paragraph naming the source line.
//!     Every value cell gets its own render session, so list depth and emphasis never carry
//!     over from one attribute to the next.
//!
//!     Array items become `List Bullet` paragraphs, one level deeper per nested array.

use super::common::{
    convert_with, display_name, AttributeNames, DocumentWriter, HandlerTable, WriterSettings,
};
use crate::dispatch::{walk, ValueHandler, Walked};
use crate::docx::{
    to_docx, BlockContainer, BlockItem, DocxDocument, Hyperlink, LinkTarget, Paragraph,
    ParagraphItem, Run, Table, TableCell, TableRow,
};
use crate::error::ConvertError;
use crate::format::{ConvertOptions, ConvertedOutput, Converter, DocxOptions, SerializedDocument};
use crate::markup::parse_markdown;
use crate::model::{FieldValue, Record, RecordRef, RecordSet};
use crate::render::docx::heading_style;
use crate::render::DocxSession;
use crate::render_config::FormatSpecifier;
use tracing::debug;

const COLUMN_TITLES: [&str; 2] = ["Element", "Value"];
const SOURCE_STYLE: &str = "Caption";

/// Bullet style of an array nested `depth` levels deep.
fn bullet_style(depth: usize) -> String {
    if depth > 1 {
        format!("List Bullet {depth}")
    } else {
        "List Bullet".to_string()
    }
}

/// Writes field values into one table cell.
struct DocxValues<'a, 'c> {
    session: DocxSession<'c>,
    settings: &'a WriterSettings,
    record: &'a Record,
    attribute: &'a str,
    /// Block count at the start of the current item, one entry per open array
    item_starts: Vec<usize>,
}

impl DocxValues<'_, '_> {
    fn text_paragraph(&mut self, text: &str) {
        let mut items = Vec::new();
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                items.push(ParagraphItem::Run(Run::line_break()));
            }
            if !line.is_empty() {
                items.push(ParagraphItem::Run(self.session.run(line)));
            }
        }
        self.session.paragraph(items);
    }
}

impl ValueHandler for DocxValues<'_, '_> {
    type Artifact = ();

    fn null(&mut self) -> Option<()> {
        let placeholder = self.settings.empty_placeholder.clone();
        self.text_paragraph(&placeholder);
        Some(())
    }

    fn reference(&mut self, target: &RecordRef) -> Option<()> {
        let link = Hyperlink {
            target: LinkTarget::Anchor(target.anchor().to_string()),
            runs: vec![self.session.run(target.qualified_name())],
        };
        self.session.paragraph(vec![ParagraphItem::Hyperlink(link)]);
        Some(())
    }

    fn string(&mut self, text: &str) -> Option<()> {
        let format = self.settings.render_config.resolve(
            &self.record.package,
            &self.record.type_name,
            self.attribute,
        );
        match format {
            Some(FormatSpecifier::Markdown) => self.session.render(&parse_markdown(text)),
            _ => self.text_paragraph(text),
        }
        Some(())
    }

    fn array_begin(&mut self, _items: &[FieldValue]) {
        self.item_starts.push(self.session.block_count());
    }

    fn list_item(&mut self, _index: usize, walked: Walked<()>) -> Walked<()> {
        let depth = self.item_starts.len();
        let count = self.session.block_count();
        if let Some(start) = self.item_starts.last_mut() {
            self.session.restyle_from(*start, &bullet_style(depth));
            *start = count;
        }
        walked
    }

    fn array_end(&mut self, _items: &[FieldValue]) {
        self.item_starts.pop();
    }

    fn other(&mut self, value: &FieldValue) {
        if let FieldValue::Other(expression) = value {
            self.text_paragraph(&expression.to_string());
        }
    }
}

/// Builds one rich document.
pub struct DocxWriter {
    document: DocxDocument,
    settings: WriterSettings,
    options: DocxOptions,
    /// Contents of the styles template, read once per conversion
    template: Option<String>,
    next_bookmark: u32,
}

impl DocxWriter {
    pub fn new(settings: WriterSettings, options: DocxOptions, template: Option<String>) -> Self {
        Self {
            document: DocxDocument::new(),
            settings,
            options,
            template,
            next_bookmark: 0,
        }
    }

    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    pub fn document(&self) -> &DocxDocument {
        &self.document
    }

    /// A render session writing into the document body.
    pub fn session(&mut self) -> DocxSession<'_> {
        DocxSession::new(&mut self.document).with_code_font(self.options.code_font.clone())
    }

    pub fn add_paragraph(&mut self, text: &str, style: Option<&str>) {
        let paragraph = Paragraph {
            style: style.map(str::to_string),
            ..Paragraph::new()
        };
        self.document
            .push_block(BlockItem::Paragraph(paragraph.with_run(Run::new(text))));
    }

    /// A heading, optionally wrapped in a bookmark that references can link to.
    pub fn add_heading(&mut self, text: &str, level: usize, bookmark: Option<&str>) {
        let level = u8::try_from(level).unwrap_or(u8::MAX);
        let mut paragraph = Paragraph::styled(heading_style(level));
        match bookmark {
            Some(name) => {
                let id = self.next_bookmark;
                self.next_bookmark += 1;
                paragraph.push(ParagraphItem::BookmarkStart {
                    id,
                    name: name.to_string(),
                });
                paragraph.push(ParagraphItem::Run(Run::new(text)));
                paragraph.push(ParagraphItem::BookmarkEnd { id });
            }
            None => paragraph.push(ParagraphItem::Run(Run::new(text))),
        }
        self.document.push_block(BlockItem::Paragraph(paragraph));
    }

    pub fn add_table(&mut self, table: Table) {
        self.document.push_block(BlockItem::Table(table));
    }

    /// A table cell holding the rendered value of a record field.
    pub fn field_cell(&self, record: &Record, attribute: &str, value: &FieldValue) -> TableCell {
        let mut cell = TableCell::new();
        let mut values = DocxValues {
            session: DocxSession::new(&mut cell).with_code_font(self.options.code_font.clone()),
            settings: &self.settings,
            record,
            attribute,
            item_starts: Vec::new(),
        };
        walk(&mut values, value);
        cell
    }

    /// The `Element`/`Value` table of a record, attribute names optionally translated.
    pub fn record_table(&self, record: &Record, names: Option<&AttributeNames>) -> Table {
        let mut table = Table::new(Some(self.options.table_style.clone()));
        table.rows.push(TableRow {
            cells: COLUMN_TITLES
                .iter()
                .map(|title| TableCell::with_run(Run::new(*title).bold()))
                .collect(),
            header: true,
        });
        for field in &record.fields {
            table.rows.push(TableRow {
                cells: vec![
                    TableCell::with_run(Run::new(display_name(names, &field.name))),
                    self.field_cell(record, &field.name, &field.value),
                ],
                header: false,
            });
        }
        table
    }
}

impl DocumentWriter for DocxWriter {
    fn heading(&mut self, title: &str, level: usize) -> Result<(), ConvertError> {
        self.add_heading(title, level, None);
        Ok(())
    }

    fn record(&mut self, record: &Record, level: usize) -> Result<(), ConvertError> {
        let title = format!("{} ({})", record.name, record.type_name);
        self.add_heading(&title, level, Some(&record.name));
        let table = self.record_table(record, None);
        self.add_table(table);
        self.add_paragraph(&format!("Source: {}", record.location), Some(SOURCE_STYLE));
        Ok(())
    }

    fn finish(self) -> Result<SerializedDocument, ConvertError> {
        let package = to_docx(&self.document, self.template.as_deref())?;
        Ok(SerializedDocument::Binary(package))
    }
}

/// Converts records to WordprocessingML documents.
#[derive(Default)]
pub struct DocxConverter {
    handlers: HandlerTable<DocxWriter>,
}

impl DocxConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert records of `type_name` with `handler` instead of the default table.
    pub fn with_handler<F>(mut self, type_name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut DocxWriter, &Record, usize) -> Result<(), ConvertError> + Send + Sync + 'static,
    {
        self.handlers.insert(type_name, handler);
        self
    }
}

impl Converter for DocxConverter {
    fn name(&self) -> &str {
        "docx"
    }

    fn description(&self) -> &str {
        "Word documents (.docx)"
    }

    fn file_extension(&self) -> &str {
        "docx"
    }

    fn convert(
        &self,
        records: &RecordSet,
        options: &ConvertOptions,
    ) -> Result<Vec<ConvertedOutput>, ConvertError> {
        let template = match &options.docx.template {
            Some(path) => {
                debug!(template = %path.display(), "reading styles template");
                Some(std::fs::read_to_string(path)?)
            }
            None => None,
        };
        let settings = WriterSettings::from_options(options);
        convert_with(records, options, self.file_extension(), &self.handlers, || {
            Ok(DocxWriter::new(
                settings.clone(),
                options.docx.clone(),
                template.clone(),
            ))
        })
    }
}
