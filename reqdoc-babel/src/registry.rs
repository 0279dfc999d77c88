//! Converter registry for target discovery and selection
//!
//! Converters are registered and retrieved by name.

use crate::error::ConvertError;
use crate::format::{ConvertOptions, ConvertedOutput, Converter};
use crate::model::RecordSet;
use std::collections::HashMap;

/// Registry of output converters
///
/// # Examples
///
/// ```ignore
/// let mut registry = ConverterRegistry::with_defaults();
/// registry.register(MarkdownConverter::new().with_handler("Diagram", write_diagram));
///
/// let outputs = registry.convert(&records, "markdown", &ConvertOptions::default())?;
/// ```
pub struct ConverterRegistry {
    converters: HashMap<String, Box<dyn Converter>>,
}

impl ConverterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ConverterRegistry {
            converters: HashMap::new(),
        }
    }

    /// Register a converter
    ///
    /// If a converter with the same name already exists, it will be replaced.
    pub fn register<C: Converter + 'static>(&mut self, converter: C) {
        self.converters
            .insert(converter.name().to_string(), Box::new(converter));
    }

    /// Get a converter by name
    pub fn get(&self, name: &str) -> Result<&dyn Converter, ConvertError> {
        self.converters
            .get(name)
            .map(|c| c.as_ref())
            .ok_or_else(|| ConvertError::ConverterNotFound(name.to_string()))
    }

    /// Check if a converter exists
    pub fn has(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    /// List all available converter names (sorted)
    pub fn list_converters(&self) -> Vec<String> {
        let mut names: Vec<_> = self.converters.keys().cloned().collect();
        names.sort();
        names
    }

    /// Convert records with the named converter
    pub fn convert(
        &self,
        records: &RecordSet,
        name: &str,
        options: &ConvertOptions,
    ) -> Result<Vec<ConvertedOutput>, ConvertError> {
        self.get(name)?.convert(records, options)
    }

    /// Create a registry with the built-in converters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(crate::formats::plain::PlainConverter::new());
        registry.register(crate::formats::markdown::MarkdownConverter::new());
        registry.register(crate::formats::rst::RstConverter::new());
        registry.register(crate::formats::docx::DocxConverter::new());

        registry
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
