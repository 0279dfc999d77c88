//! Markup tree → WordprocessingML blocks.
//!
//! A [`DocxSession`] renders one attribute (or one record) into a borrowed container. Style
//! state lives in the session and dies with it, so two conversions never see each other's
//! list depth or emphasis.

use crate::docx::{
    BlockContainer, BlockItem, Hyperlink, LinkTarget, Paragraph, ParagraphItem, Run,
};
use crate::markup::{inline_text, Block, Inline, ListItem};

pub const DEFAULT_CODE_FONT: &str = "Consolas";

/// Highest heading style Word defines.
const MAX_HEADING: u8 = 9;

/// Render state for one conversion.
pub struct DocxSession<'c> {
    container: &'c mut dyn BlockContainer,
    /// Paragraph style names, innermost last
    styles: Vec<String>,
    list_depth: usize,
    bold: bool,
    italic: bool,
    underline: bool,
    code_font: String,
}

impl<'c> DocxSession<'c> {
    pub fn new(container: &'c mut dyn BlockContainer) -> Self {
        Self {
            container,
            styles: Vec::new(),
            list_depth: 0,
            bold: false,
            italic: false,
            underline: false,
            code_font: DEFAULT_CODE_FONT.to_string(),
        }
    }

    pub fn with_code_font(mut self, font: impl Into<String>) -> Self {
        self.code_font = font.into();
        self
    }

    /// Start with `style` as the active paragraph style, e.g. to render inside a list item.
    pub fn with_base_style(mut self, style: impl Into<String>) -> Self {
        self.styles.push(style.into());
        self
    }

    /// Render blocks into the container.
    pub fn render(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.block(block);
        }
    }

    /// Append one paragraph made of `items`, carrying the active style.
    pub fn paragraph(&mut self, items: Vec<ParagraphItem>) {
        let paragraph = Paragraph {
            style: self.styles.last().cloned(),
            items,
            border_bottom: false,
        };
        self.container.push_block(BlockItem::Paragraph(paragraph));
    }

    /// Number of content blocks in the container.
    pub fn block_count(&self) -> usize {
        self.container.content_len()
    }

    /// Give every unstyled paragraph from block `start` on the paragraph style `style`.
    pub fn restyle_from(&mut self, start: usize, style: &str) {
        for block in self.container.blocks_mut().iter_mut().skip(start) {
            if let BlockItem::Paragraph(paragraph) = block {
                if paragraph.style.is_none() {
                    paragraph.style = Some(style.to_string());
                }
            }
        }
    }

    /// A run of `text` with the current emphasis flags.
    pub fn run(&self, text: impl Into<String>) -> Run {
        Run {
            text: text.into(),
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            font: None,
            line_break: false,
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(content) => {
                let items = self.inlines(content);
                self.paragraph(items);
            }
            Block::Heading { level, content } => {
                let items = self.inlines(content);
                let style = heading_style(*level);
                self.container.push_block(BlockItem::Paragraph(Paragraph {
                    style: Some(style),
                    items,
                    border_bottom: false,
                }));
            }
            Block::List { ordered, items, .. } => self.list(*ordered, items),
            Block::Quote(children) => {
                self.styles.push("Quote".to_string());
                self.render(children);
                self.styles.pop();
            }
            Block::FencedCode { text, .. } => {
                let mut run = self.run(text.trim_end_matches('\n'));
                run.font = Some(self.code_font.clone());
                self.container.push_block(BlockItem::Paragraph(
                    Paragraph::styled("Code").with_run(run),
                ));
            }
            Block::ThematicBreak => {
                self.container.push_block(BlockItem::Paragraph(Paragraph {
                    style: None,
                    items: Vec::new(),
                    border_bottom: true,
                }));
            }
            Block::BlankLine => self.paragraph(Vec::new()),
            Block::HtmlBlock(html) => {
                let run = self.run(html.trim_end_matches('\n'));
                self.paragraph(vec![ParagraphItem::Run(run)]);
            }
            Block::LinkRefDef { .. } => {}
        }
    }

    fn list(&mut self, ordered: bool, items: &[ListItem]) {
        self.list_depth += 1;
        let base = if ordered { "List Number" } else { "List Bullet" };
        let style = if self.list_depth > 1 {
            format!("{base} {}", self.list_depth)
        } else {
            base.to_string()
        };

        self.styles.push(style);
        for item in items {
            if item.children.is_empty() {
                self.paragraph(Vec::new());
            }
            self.render(&item.children);
        }
        self.styles.pop();
        self.list_depth -= 1;
    }

    fn inlines(&mut self, inlines: &[Inline]) -> Vec<ParagraphItem> {
        let mut items = Vec::new();
        for inline in inlines {
            self.inline(inline, &mut items);
        }
        items
    }

    fn inline(&mut self, inline: &Inline, items: &mut Vec<ParagraphItem>) {
        match inline {
            Inline::Text(text) | Inline::Literal(text) | Inline::InlineHtml(text) => {
                items.push(ParagraphItem::Run(self.run(text.as_str())))
            }
            Inline::Emphasis(children) => {
                let previous = std::mem::replace(&mut self.italic, true);
                for child in children {
                    self.inline(child, items);
                }
                self.italic = previous;
            }
            Inline::Strong(children) => {
                let previous = std::mem::replace(&mut self.bold, true);
                for child in children {
                    self.inline(child, items);
                }
                self.bold = previous;
            }
            Inline::Link {
                dest,
                title,
                children,
            } => {
                let mut nested = Vec::new();
                for child in children {
                    self.inline(child, &mut nested);
                }
                // Word does not nest hyperlinks, so an inner image link gives up its target.
                let mut runs: Vec<Run> = Vec::new();
                for item in nested {
                    match item {
                        ParagraphItem::Run(run) => runs.push(run),
                        ParagraphItem::Hyperlink(inner) => runs.extend(inner.runs),
                        ParagraphItem::BookmarkStart { .. } | ParagraphItem::BookmarkEnd { .. } => {}
                    }
                }
                if runs.is_empty() {
                    runs.push(self.run(dest.as_str()));
                }
                items.push(ParagraphItem::Hyperlink(Hyperlink {
                    target: link_target(dest),
                    runs,
                }));
                if let Some(title) = title.as_deref().filter(|title| !title.is_empty()) {
                    items.push(ParagraphItem::Run(self.run(format!(" ({title})"))));
                }
            }
            Inline::AutoLink(url) => items.push(ParagraphItem::Hyperlink(Hyperlink {
                target: link_target(url),
                runs: vec![self.run(url.as_str())],
            })),
            Inline::Image { dest, alt, .. } => {
                let mut text = inline_text(alt);
                if text.is_empty() {
                    text = dest.clone();
                }
                items.push(ParagraphItem::Hyperlink(Hyperlink {
                    target: link_target(dest),
                    runs: vec![self.run(text)],
                }));
            }
            Inline::LineBreak { soft: true } => items.push(ParagraphItem::Run(self.run(" "))),
            Inline::LineBreak { soft: false } => items.push(ParagraphItem::Run(Run::line_break())),
            Inline::CodeSpan(code) => {
                let mut run = self.run(code.as_str());
                run.font = Some(self.code_font.clone());
                items.push(ParagraphItem::Run(run));
            }
        }
    }
}

/// Paragraph style of a heading level, clamped to `Heading 1`..`Heading 9`.
pub fn heading_style(level: u8) -> String {
    format!("Heading {}", level.clamp(1, MAX_HEADING))
}

/// Absolute URLs link out of the document; anything else names a bookmark.
pub fn link_target(dest: &str) -> LinkTarget {
    match url::Url::parse(dest) {
        Ok(_) => LinkTarget::External(dest.to_string()),
        Err(_) => LinkTarget::Anchor(dest.trim_start_matches('#').to_string()),
    }
}
