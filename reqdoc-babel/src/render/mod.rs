//! Markup renderers.
//!
//!     Every renderer consumes the same [`Block`](crate::markup::Block) tree and differs only in
//!     what it produces:
//!
//!     - [`markdown`] and [`rst`] are functional: each node renders to a `String` from the node
//!       and a small copyable context carrying list depth.
//!     - [`docx`] emits into a WordprocessingML container through a [`DocxSession`] that owns
//!       the style state for exactly one conversion.
//!
//!     The text renderers share one block sequencing rule: every rendered block ends with a
//!     newline, consecutive blocks are separated by one empty line, and an explicit
//!     `BlankLine` adds one more.

pub mod docx;
pub mod markdown;
pub mod rst;

pub use docx::DocxSession;
pub use markdown::render_markdown;
pub use rst::render_rst;

use crate::markup::Block;

/// Render `blocks` one by one and sequence them.
pub(crate) fn join_blocks<'b>(
    blocks: impl IntoIterator<Item = &'b Block>,
    mut render: impl FnMut(&'b Block) -> String,
) -> String {
    let mut output = String::new();
    let mut previous_blank = true;

    for block in blocks {
        if !previous_blank {
            output.push('\n');
        }
        output.push_str(&render(block));
        previous_blank = matches!(block, Block::BlankLine);
    }

    output
}

/// Normalise a finished text document to end with exactly one newline.
pub(crate) fn finish_text(mut output: String) -> String {
    let trimmed = output.trim_end_matches('\n').len();
    output.truncate(trimmed);
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

/// Prefix the first line with `marker` and indent continuation lines to line up under it.
pub(crate) fn hang(body: &str, marker: &str) -> String {
    let indent = " ".repeat(marker.chars().count() + 1);
    let mut output = String::new();

    for (index, line) in body.lines().enumerate() {
        if index == 0 {
            output.push_str(marker);
            if !line.is_empty() {
                output.push(' ');
                output.push_str(line);
            }
        } else if !line.is_empty() {
            output.push_str(&indent);
            output.push_str(line);
        }
        output.push('\n');
    }

    if output.is_empty() {
        output.push_str(marker);
        output.push('\n');
    }

    output
}

/// Prefix every non-empty line with `prefix`, leaving empty lines empty.
pub(crate) fn indent_lines(body: &str, prefix: &str) -> String {
    let mut output = String::new();
    for line in body.lines() {
        if !line.is_empty() {
            output.push_str(prefix);
            output.push_str(line);
        }
        output.push('\n');
    }
    output
}
