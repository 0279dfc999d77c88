//! Converter trait definition
//!
//! Every output target implements [`Converter`]. A converter turns a whole [`RecordSet`] into
//! one or more named output documents; writing them anywhere is the caller's business (see
//! [`crate::publish`]).

use crate::error::ConvertError;
use crate::model::RecordSet;
use crate::render_config::RenderConfig;
use std::path::PathBuf;

pub const DEFAULT_EMPTY_PLACEHOLDER: &str = "N/A";
pub const DEFAULT_TOP_LEVEL: &str = "Specification";
pub const DEFAULT_TABLE_STYLE: &str = "Table Grid";

/// Serialized document content.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedDocument {
    /// UTF-8 text output (plain, Markdown, reStructuredText)
    Text(String),
    /// Binary output (docx packages)
    Binary(Vec<u8>),
}

impl SerializedDocument {
    /// Consume the serialized output and return the underlying bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            SerializedDocument::Text(text) => text.into_bytes(),
            SerializedDocument::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SerializedDocument::Text(text) => Some(text),
            SerializedDocument::Binary(_) => None,
        }
    }
}

/// One generated document.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedOutput {
    /// File name without directory, e.g. `req.md`
    pub file_name: String,
    pub content: SerializedDocument,
}

impl ConvertedOutput {
    /// A text document.
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: SerializedDocument::Text(content.into()),
        }
    }

    pub fn binary(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content: SerializedDocument::Binary(content),
        }
    }

    /// The content of a text document.
    pub fn text(&self) -> Option<&str> {
        self.content.as_text()
    }
}

/// Settings shared by all converters.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Text written for `Null` values
    pub empty_placeholder: String,
    /// Emit one document for all source files instead of one per file
    pub single_document: bool,
    /// Top-level heading of a single document
    pub top_level: String,
    /// File name of a single document. Defaults to `output.<extension>`.
    pub document_name: Option<String>,
    /// Source files under any of these paths are skipped
    pub excluded_paths: Vec<PathBuf>,
    /// Roots searched by [`crate::locate_resource`]
    pub sources: Vec<PathBuf>,
    pub render_config: RenderConfig,
    pub docx: DocxOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            empty_placeholder: DEFAULT_EMPTY_PLACEHOLDER.to_string(),
            single_document: false,
            top_level: DEFAULT_TOP_LEVEL.to_string(),
            document_name: None,
            excluded_paths: Vec::new(),
            sources: Vec::new(),
            render_config: RenderConfig::new(),
            docx: DocxOptions::default(),
        }
    }
}

/// Settings only the rich-document target reads.
#[derive(Debug, Clone)]
pub struct DocxOptions {
    pub table_style: String,
    pub code_font: String,
    /// A `styles.xml` part replacing the generated styles
    pub template: Option<PathBuf>,
}

impl Default for DocxOptions {
    fn default() -> Self {
        Self {
            table_style: DEFAULT_TABLE_STYLE.to_string(),
            code_font: crate::render::docx::DEFAULT_CODE_FONT.to_string(),
            template: None,
        }
    }
}

/// Trait for output targets
///
/// # Examples
///
/// ```ignore
/// struct Count;
///
/// impl Converter for Count {
///     fn name(&self) -> &str {
///         "count"
///     }
///
///     fn file_extension(&self) -> &str {
///         "txt"
///     }
///
///     fn convert(
///         &self,
///         records: &RecordSet,
///         _options: &ConvertOptions,
///     ) -> Result<Vec<ConvertedOutput>, ConvertError> {
///         let count = records.records().count();
///         Ok(vec![ConvertedOutput::new("count.txt", count.to_string())])
///     }
/// }
/// ```
pub trait Converter: Send + Sync {
    /// The name the converter is selected by (e.g. "markdown", "docx")
    fn name(&self) -> &str;

    /// Optional description of this converter
    fn description(&self) -> &str {
        ""
    }

    /// Extension of the generated files, without the leading dot
    fn file_extension(&self) -> &str;

    /// Convert all records.
    fn convert(
        &self,
        records: &RecordSet,
        options: &ConvertOptions,
    ) -> Result<Vec<ConvertedOutput>, ConvertError>;
}
