//! Converter implementations
//!
//! One module per output target. They share the conversion driver in [`common`] and differ in
//! how a heading and a record are written.

pub mod common;
pub mod docx;
pub mod markdown;
pub mod plain;
pub mod rst;

pub use docx::{DocxConverter, DocxWriter};
pub use markdown::{MarkdownConverter, MarkdownWriter};
pub use plain::{PlainConverter, PlainWriter};
pub use rst::{RstConverter, RstWriter};
