//! Markup tree → reStructuredText.
//!
//! RST has no nested inline markup, so emphasis, strong and link bodies are flattened to their
//! text before decoration. Images cannot live inside a paragraph and are lifted out into
//! `.. image::` directives between the surrounding paragraph fragments.

use super::{finish_text, hang, indent_lines, join_blocks};
use crate::markup::{inline_text, Block, Inline, ListItem};
use unicode_width::UnicodeWidthStr;

const BULLETS: [&str; 3] = ["*", "-", "+"];
const UNDERLINES: [char; 6] = ['=', '-', '~', '^', '"', '\''];

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    list_depth: usize,
}

impl Context {
    fn nested(self) -> Self {
        Self {
            list_depth: self.list_depth + 1,
        }
    }
}

/// Render markup blocks as reStructuredText ending in a single newline.
pub fn render_rst(blocks: &[Block]) -> String {
    finish_text(render_blocks(blocks, Context::default()))
}

fn render_blocks(blocks: &[Block], context: Context) -> String {
    // Link reference definitions are resolved by the parser and have no RST counterpart.
    let blocks = blocks
        .iter()
        .filter(|block| !matches!(block, Block::LinkRefDef { .. }));
    join_blocks(blocks, |block| render_block(block, context))
}

fn render_block(block: &Block, context: Context) -> String {
    match block {
        Block::Paragraph(content) => render_paragraph(content),
        Block::Heading { level, content } => {
            let title = render_inlines(content).replace('\n', " ");
            let underline = underline_char(*level);
            let width = UnicodeWidthStr::width(title.as_str()).max(1);
            format!("{title}\n{}\n", underline.to_string().repeat(width))
        }
        Block::List {
            ordered, items, ..
        } => render_list(*ordered, items, context),
        Block::Quote(children) => indent_lines(&render_blocks(children, context), "  "),
        Block::FencedCode { lang, text } => {
            let mut output = match lang.as_deref() {
                Some(lang) if !lang.is_empty() => format!(".. code-block:: {lang}\n\n"),
                _ => ".. code-block::\n\n".to_string(),
            };
            output.push_str(&indent_lines(text, "    "));
            output
        }
        Block::HtmlBlock(html) => format!("::\n\n{}", indent_lines(html, "    ")),
        Block::ThematicBreak => "----\n".to_string(),
        Block::BlankLine => "\n".to_string(),
        Block::LinkRefDef { .. } => String::new(),
    }
}

/// Underline character of a heading level; anything past the sixth level shares `-`.
pub fn underline_char(level: u8) -> char {
    match level {
        1..=6 => UNDERLINES[level as usize - 1],
        _ => '-',
    }
}

fn render_list(ordered: bool, items: &[ListItem], context: Context) -> String {
    let marker = if ordered {
        "#."
    } else {
        BULLETS[context.list_depth % BULLETS.len()]
    };
    // Items holding more than one block need blank lines around them, otherwise a nested
    // list ends with an unexpected unindent.
    let loose = items.iter().any(|item| item.children.len() > 1);

    let mut output = String::new();
    for (index, item) in items.iter().enumerate() {
        if loose && index > 0 {
            output.push('\n');
        }
        let body = render_blocks(&item.children, context.nested());
        output.push_str(&hang(&body, marker));
    }
    output
}

fn render_paragraph(content: &[Inline]) -> String {
    let mut fragments: Vec<String> = Vec::new();
    let mut pending: Vec<&Inline> = Vec::new();

    for inline in content {
        if let Inline::Image { dest, alt, .. } = inline {
            flush_fragment(&mut pending, &mut fragments);
            let mut directive = format!(".. image:: {dest}\n");
            let alt = inline_text(alt);
            if !alt.is_empty() {
                directive.push_str(&format!("   :alt: {alt}\n"));
            }
            fragments.push(directive);
        } else {
            pending.push(inline);
        }
    }
    flush_fragment(&mut pending, &mut fragments);

    fragments.join("\n")
}

fn flush_fragment(pending: &mut Vec<&Inline>, fragments: &mut Vec<String>) {
    let text: String = pending.drain(..).map(render_inline).collect();
    let text = text.trim();
    if !text.is_empty() {
        fragments.push(format!("{text}\n"));
    }
}

fn render_inlines(inlines: &[Inline]) -> String {
    inlines.iter().map(render_inline).collect()
}

fn render_inline(inline: &Inline) -> String {
    match inline {
        Inline::Text(text) => escape_text(text),
        Inline::Emphasis(children) => format!("*{}*", escape_text(&inline_text(children))),
        Inline::Strong(children) => format!("**{}**", escape_text(&inline_text(children))),
        Inline::Link {
            dest,
            title,
            children,
        } => {
            let body = inline_text(children);
            let link = if body.is_empty() || body == *dest {
                format!("`<{dest}>`_")
            } else {
                format!("`{body} <{dest}>`_")
            };
            match title {
                Some(title) => format!("{link} ({title})"),
                None => link,
            }
        }
        Inline::AutoLink(url) => url.clone(),
        // Only reached for images nested in other inline nodes.
        Inline::Image { alt, .. } => inline_text(alt),
        Inline::Literal(text) | Inline::InlineHtml(text) => text.clone(),
        Inline::LineBreak { .. } => "\n".to_string(),
        Inline::CodeSpan(code) => format!("``{code}``"),
    }
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '`' | '_' | '|') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
