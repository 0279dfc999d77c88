//! Error types for conversion operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading inputs or converting records
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Converter not found in registry
    #[error("Converter '{0}' not found")]
    ConverterNotFound(String),
    /// A render rule carries a pattern that is not a valid regex
    #[error("Invalid render rule pattern '{pattern}': {source}")]
    InvalidRulePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// The record set could not be read
    #[error("Input error: {0}")]
    Input(#[from] serde_json::Error),
    /// Error while producing the output document
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// A file referenced by a record could not be found
    #[error("Resource '{}' not found", .0.display())]
    MissingResource(PathBuf),
    /// The rich-document template is unreadable or not a styles part
    #[error("Invalid template: {0}")]
    Template(String),
    /// A project-specific record handler gave up
    #[error("Handler for record type '{record_type}' failed: {message}")]
    Handler {
        record_type: String,
        message: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    /// The `.docx` archive could not be written
    #[error("Package error: {0}")]
    Package(#[from] zip::result::ZipError),
}

impl ConvertError {
    /// Convenience constructor for handler failures.
    pub fn handler(record_type: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Handler {
            record_type: record_type.into(),
            message: message.into(),
        }
    }
}
