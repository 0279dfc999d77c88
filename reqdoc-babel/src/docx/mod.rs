//! In-memory WordprocessingML document.
//!
//!     The rich-document target builds a [`DocxDocument`] first and serializes it once at the
//!     end (see [`package`]). The model covers what the converters emit and nothing more:
//!     paragraphs of runs, hyperlinks and bookmarks, and tables whose cells hold paragraphs.
//!
//!     Both the document body and a table cell are [`BlockContainer`]s, so renderers write into
//!     either without knowing which one they got.

pub mod package;

pub use package::to_docx;

/// Something block items can be appended to.
pub trait BlockContainer {
    fn push_block(&mut self, block: BlockItem);

    fn blocks(&self) -> &[BlockItem];

    /// Mutable access to the items already pushed. Items cannot be added through this slice.
    fn blocks_mut(&mut self) -> &mut [BlockItem];

    /// Number of blocks pushed so far, not counting placeholders.
    fn content_len(&self) -> usize {
        self.blocks().len()
    }
}

/// A whole document: its body, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxDocument {
    pub body: Vec<BlockItem>,
}

impl DocxDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// All paragraphs of the document, including those nested in table cells.
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        let mut paragraphs = Vec::new();
        collect_paragraphs(&self.body, &mut paragraphs);
        paragraphs
    }
}

fn collect_paragraphs<'a>(blocks: &'a [BlockItem], paragraphs: &mut Vec<&'a Paragraph>) {
    for block in blocks {
        match block {
            BlockItem::Paragraph(paragraph) => paragraphs.push(paragraph),
            BlockItem::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        collect_paragraphs(&cell.blocks, paragraphs);
                    }
                }
            }
        }
    }
}

impl BlockContainer for DocxDocument {
    fn push_block(&mut self, block: BlockItem) {
        self.body.push(block);
    }

    fn blocks(&self) -> &[BlockItem] {
        &self.body
    }

    fn blocks_mut(&mut self) -> &mut [BlockItem] {
        &mut self.body
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    /// Style name as shown to the user, e.g. `List Bullet 2`
    pub style: Option<String>,
    pub items: Vec<ParagraphItem>,
    pub border_bottom: bool,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styled(style: impl Into<String>) -> Self {
        Self {
            style: Some(style.into()),
            ..Self::default()
        }
    }

    pub fn with_run(mut self, run: Run) -> Self {
        self.items.push(ParagraphItem::Run(run));
        self
    }

    pub fn push(&mut self, item: ParagraphItem) {
        self.items.push(item);
    }

    /// Visible text of the paragraph, hyperlink text included.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for item in &self.items {
            match item {
                ParagraphItem::Run(run) => text.push_str(&run.text),
                ParagraphItem::Hyperlink(link) => {
                    for run in &link.runs {
                        text.push_str(&run.text);
                    }
                }
                ParagraphItem::BookmarkStart { .. } | ParagraphItem::BookmarkEnd { .. } => {}
            }
        }
        text
    }

    /// All runs, hyperlink runs included, in order.
    pub fn runs(&self) -> Vec<&Run> {
        let mut runs = Vec::new();
        for item in &self.items {
            match item {
                ParagraphItem::Run(run) => runs.push(run),
                ParagraphItem::Hyperlink(link) => runs.extend(link.runs.iter()),
                ParagraphItem::BookmarkStart { .. } | ParagraphItem::BookmarkEnd { .. } => {}
            }
        }
        runs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParagraphItem {
    Run(Run),
    Hyperlink(Hyperlink),
    BookmarkStart { id: u32, name: String },
    BookmarkEnd { id: u32 },
}

/// A span of uniformly formatted text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub font: Option<String>,
    /// The run is a line break, `text` is ignored
    pub line_break: bool,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn line_break() -> Self {
        Self {
            line_break: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkTarget {
    /// Bookmark inside the document
    Anchor(String),
    /// Absolute URL, serialized as an external relationship
    External(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hyperlink {
    pub target: LinkTarget,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub style: Option<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn new(style: Option<String>) -> Self {
        Self {
            style,
            rows: Vec::new(),
        }
    }

    /// Widest row, in cells.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    /// Repeat the row at the top of every page
    pub header: bool,
}

/// A table cell.
///
/// A cell must always contain a paragraph, so a fresh cell holds one empty paragraph. The
/// first block pushed into the cell replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub blocks: Vec<BlockItem>,
    placeholder: bool,
}

impl TableCell {
    pub fn new() -> Self {
        Self {
            blocks: vec![BlockItem::Paragraph(Paragraph::new())],
            placeholder: true,
        }
    }

    /// A cell holding one paragraph with one run.
    pub fn with_run(run: Run) -> Self {
        let mut cell = Self::new();
        cell.push_block(BlockItem::Paragraph(Paragraph::new().with_run(run)));
        cell
    }
}

impl Default for TableCell {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockContainer for TableCell {
    fn push_block(&mut self, block: BlockItem) {
        if self.placeholder {
            self.blocks.clear();
            self.placeholder = false;
        }
        self.blocks.push(block);
    }

    fn blocks(&self) -> &[BlockItem] {
        &self.blocks
    }

    fn blocks_mut(&mut self) -> &mut [BlockItem] {
        &mut self.blocks
    }

    fn content_len(&self) -> usize {
        if self.placeholder {
            0
        } else {
            self.blocks.len()
        }
    }
}
