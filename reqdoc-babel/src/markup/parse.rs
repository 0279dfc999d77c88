//! Markdown attribute text → markup tree.
//!
//! Parsing itself is done by `comrak`; this module only adapts the comrak AST to
//! [`Block`]/[`Inline`]. Node kinds the markup tree has no place for (tables, footnotes,
//! front matter) degrade to a paragraph holding their text.

use super::{Block, Inline, ListItem};
use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena, ComrakOptions};

/// Parse Markdown text into markup blocks.
pub fn parse_markdown(source: &str) -> Vec<Block> {
    let arena = Arena::new();
    let options = default_comrak_options();
    let root = parse_document(&arena, source, &options);
    collect_blocks(root)
}

fn default_comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options
}

/// Convert the block children of `parent`.
///
/// Runs of two or more blank source lines between siblings become a [`Block::BlankLine`], at
/// the top level as well as inside list items and quotes. A single blank line is the ordinary
/// block separator and is not kept.
fn collect_blocks<'a>(parent: &'a AstNode<'a>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut previous_end: Option<usize> = None;

    for child in parent.children() {
        let (start, end) = {
            let data = child.data.borrow();
            (data.sourcepos.start.line, data.sourcepos.end.line)
        };

        if let Some(previous_end) = previous_end {
            if start > previous_end + 2 {
                blocks.push(Block::BlankLine);
            }
        }
        previous_end = Some(end);

        if let Some(block) = convert_block(child) {
            blocks.push(block);
        }
    }

    blocks
}

fn convert_block<'a>(node: &'a AstNode<'a>) -> Option<Block> {
    let value = node.data.borrow().value.clone();

    let block = match value {
        NodeValue::Paragraph => Block::Paragraph(collect_inlines(node)),
        NodeValue::Heading(heading) => Block::Heading {
            level: heading.level,
            content: collect_inlines(node),
        },
        NodeValue::List(list) => Block::List {
            ordered: matches!(list.list_type, ListType::Ordered),
            start: list.start,
            items: node
                .children()
                .map(|item| ListItem {
                    children: collect_blocks(item),
                })
                .collect(),
        },
        NodeValue::BlockQuote | NodeValue::MultilineBlockQuote(_) => {
            Block::Quote(collect_blocks(node))
        }
        NodeValue::CodeBlock(code) => {
            let lang = code
                .info
                .split_whitespace()
                .next()
                .map(|lang| lang.to_string());
            Block::FencedCode {
                lang,
                text: code.literal,
            }
        }
        NodeValue::HtmlBlock(html) => Block::HtmlBlock(html.literal),
        NodeValue::ThematicBreak => Block::ThematicBreak,
        NodeValue::Document => return None,
        _ => {
            // No dedicated node kind: keep the text so nothing is silently dropped.
            let mut text = String::new();
            collect_text(node, &mut text);
            let text = text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Block::Paragraph(vec![Inline::Text(text)])
        }
    };

    Some(block)
}

fn collect_inlines<'a>(parent: &'a AstNode<'a>) -> Vec<Inline> {
    let mut inlines = Vec::new();
    for child in parent.children() {
        convert_inline(child, &mut inlines);
    }
    inlines
}

fn convert_inline<'a>(node: &'a AstNode<'a>, inlines: &mut Vec<Inline>) {
    let value = node.data.borrow().value.clone();

    match value {
        NodeValue::Text(text) => push_text(inlines, text),
        NodeValue::Emph => inlines.push(Inline::Emphasis(collect_inlines(node))),
        NodeValue::Strong => inlines.push(Inline::Strong(collect_inlines(node))),
        NodeValue::Code(code) => inlines.push(Inline::CodeSpan(code.literal)),
        NodeValue::HtmlInline(html) => inlines.push(Inline::InlineHtml(html)),
        NodeValue::SoftBreak => inlines.push(Inline::LineBreak { soft: true }),
        NodeValue::LineBreak => inlines.push(Inline::LineBreak { soft: false }),
        NodeValue::Link(link) => {
            let children = collect_inlines(node);
            if is_autolink(&link.url, &children) {
                inlines.push(Inline::AutoLink(link.url));
            } else {
                inlines.push(Inline::Link {
                    dest: link.url,
                    title: non_empty(link.title),
                    children,
                });
            }
        }
        NodeValue::Image(link) => inlines.push(Inline::Image {
            dest: link.url,
            title: non_empty(link.title),
            alt: collect_inlines(node),
        }),
        _ => {
            // Strikethrough, superscript and friends: keep their content undecorated.
            for child in node.children() {
                convert_inline(child, inlines);
            }
        }
    }
}

/// Merge adjacent text nodes; comrak splits text around every special character.
fn push_text(inlines: &mut Vec<Inline>, text: String) {
    if let Some(Inline::Text(previous)) = inlines.last_mut() {
        previous.push_str(&text);
    } else {
        inlines.push(Inline::Text(text));
    }
}

fn is_autolink(url: &str, children: &[Inline]) -> bool {
    match children {
        [Inline::Text(text)] => {
            text == url || url.strip_prefix("mailto:") == Some(text.as_str())
        }
        _ => false,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn collect_text<'a>(node: &'a AstNode<'a>, output: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(text) => output.push_str(text),
        NodeValue::Code(code) => output.push_str(&code.literal),
        NodeValue::SoftBreak | NodeValue::LineBreak => output.push(' '),
        NodeValue::TableCell => {
            for child in node.children() {
                collect_text(child, output);
            }
            output.push(' ');
            return;
        }
        NodeValue::TableRow(_) => {
            for child in node.children() {
                collect_text(child, output);
            }
            output.push('\n');
            return;
        }
        _ => {}
    }

    for child in node.children() {
        collect_text(child, output);
    }
}
