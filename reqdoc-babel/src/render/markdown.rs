//! Markup tree → Markdown text.

use super::{finish_text, hang, join_blocks};
use crate::markup::{inline_text, Block, Inline, ListItem};

const BULLETS: [&str; 3] = ["-", "*", "+"];

/// State threaded through one render. Copied, never shared.
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

/// Render markup blocks as CommonMark text ending in a single newline.
pub fn render_markdown(blocks: &[Block]) -> String {
    finish_text(render_blocks(blocks, Context::default()))
}

fn render_blocks(blocks: &[Block], context: Context) -> String {
    join_blocks(blocks, |block| render_block(block, context))
}

fn render_block(block: &Block, context: Context) -> String {
    match block {
        Block::Paragraph(content) => format!("{}\n", render_inlines(content)),
        Block::Heading { level, content } => {
            let level = (*level).clamp(1, 6) as usize;
            format!("{} {}\n", "#".repeat(level), render_inlines(content))
        }
        Block::List {
            ordered,
            start,
            items,
        } => render_list(*ordered, *start, items, context),
        Block::Quote(children) => {
            let body = render_blocks(children, context);
            let mut output = String::new();
            for line in body.lines() {
                if line.is_empty() {
                    output.push_str(">\n");
                } else {
                    output.push_str("> ");
                    output.push_str(line);
                    output.push('\n');
                }
            }
            output
        }
        Block::FencedCode { lang, text } => {
            let fence = fence_for(text);
            let mut output = format!("{fence}{}\n", lang.as_deref().unwrap_or(""));
            output.push_str(text);
            if !text.is_empty() && !text.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&fence);
            output.push('\n');
            output
        }
        Block::ThematicBreak => "---\n".to_string(),
        Block::BlankLine => "\n".to_string(),
        Block::HtmlBlock(html) => {
            let mut output = html.trim_end_matches('\n').to_string();
            output.push('\n');
            output
        }
        Block::LinkRefDef { label, dest, title } => match title {
            Some(title) => format!("[{label}]: {dest} \"{title}\"\n"),
            None => format!("[{label}]: {dest}\n"),
        },
    }
}

fn render_list(ordered: bool, start: usize, items: &[ListItem], context: Context) -> String {
    let bullet = BULLETS[context.list_depth % BULLETS.len()];
    let mut output = String::new();

    for (index, item) in items.iter().enumerate() {
        let marker = if ordered {
            format!("{}.", start + index)
        } else {
            bullet.to_string()
        };
        let body = render_blocks(&item.children, context.nested());
        output.push_str(&hang(&body, &marker));
    }

    output
}

/// A backtick fence longer than any backtick run inside the code.
fn fence_for(text: &str) -> String {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

fn render_inlines(inlines: &[Inline]) -> String {
    inlines.iter().map(render_inline).collect()
}

fn render_inline(inline: &Inline) -> String {
    match inline {
        Inline::Text(text) => escape_text(text),
        Inline::Emphasis(children) => format!("*{}*", render_inlines(children)),
        Inline::Strong(children) => format!("**{}**", render_inlines(children)),
        Inline::Link {
            dest,
            title,
            children,
        } => format!("[{}]({})", render_inlines(children), destination(dest, title)),
        Inline::AutoLink(url) => format!("<{url}>"),
        Inline::Image { dest, title, alt } => {
            format!("![{}]({})", inline_text(alt), destination(dest, title))
        }
        Inline::Literal(text) | Inline::InlineHtml(text) => text.clone(),
        Inline::LineBreak { soft: true } => "\n".to_string(),
        Inline::LineBreak { soft: false } => "\\\n".to_string(),
        Inline::CodeSpan(code) => {
            if code.contains('`') {
                format!("`` {code} ``")
            } else {
                format!("`{code}`")
            }
        }
    }
}

fn destination(dest: &str, title: &Option<String>) -> String {
    match title {
        Some(title) => format!("{dest} \"{}\"", title.replace('"', "\\\"")),
        None => dest.to_string(),
    }
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
