//! Markup tree for rich-text attributes.
//!
//! Attributes flagged as Markdown are parsed into this tree (see [`parse`]) and then handed
//! to a renderer. The tree is read-only once built; renderers never mutate it.

pub mod parse;

pub use parse::parse_markdown;

/// Block-level markup node.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    List {
        ordered: bool,
        start: usize,
        items: Vec<ListItem>,
    },
    Quote(Vec<Block>),
    FencedCode {
        lang: Option<String>,
        text: String,
    },
    ThematicBreak,
    /// Extra vertical space the author left between two blocks
    BlankLine,
    HtmlBlock(String),
    LinkRefDef {
        label: String,
        dest: String,
        title: Option<String>,
    },
}

/// One item of a [`Block::List`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListItem {
    pub children: Vec<Block>,
}

/// Inline markup node.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Link {
        dest: String,
        title: Option<String>,
        children: Vec<Inline>,
    },
    AutoLink(String),
    Image {
        dest: String,
        title: Option<String>,
        alt: Vec<Inline>,
    },
    /// Text that must be emitted exactly as written
    Literal(String),
    LineBreak {
        soft: bool,
    },
    CodeSpan(String),
    InlineHtml(String),
}

/// Concatenated text of inline nodes, without any decoration.
pub fn inline_text(inlines: &[Inline]) -> String {
    let mut text = String::new();
    push_inline_text(inlines, &mut text);
    text
}

fn push_inline_text(inlines: &[Inline], text: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(value)
            | Inline::Literal(value)
            | Inline::CodeSpan(value)
            | Inline::InlineHtml(value)
            | Inline::AutoLink(value) => text.push_str(value),
            Inline::Emphasis(children) | Inline::Strong(children) => {
                push_inline_text(children, text)
            }
            Inline::Link { children, .. } => push_inline_text(children, text),
            Inline::Image { alt, .. } => push_inline_text(alt, text),
            Inline::LineBreak { soft: true } => text.push(' '),
            Inline::LineBreak { soft: false } => text.push('\n'),
        }
    }
}

/// Flatten blocks to plain text: one line group per block, blocks separated by a blank line.
pub fn plain_text(blocks: &[Block]) -> String {
    let parts: Vec<String> = blocks
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph(content) | Block::Heading { content, .. } => {
                Some(inline_text(content))
            }
            Block::List { items, .. } => Some(
                items
                    .iter()
                    .map(|item| plain_text(&item.children))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Block::Quote(children) => Some(plain_text(children)),
            Block::FencedCode { text, .. } => Some(text.trim_end_matches('\n').to_string()),
            Block::HtmlBlock(html) => Some(html.trim_end_matches('\n').to_string()),
            Block::ThematicBreak | Block::BlankLine | Block::LinkRefDef { .. } => None,
        })
        .collect();
    parts.join("\n\n")
}
