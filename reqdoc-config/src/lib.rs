//! Shared configuration loader for the reqdoc tools.
//!
//! `defaults/reqdoc.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`ReqdocConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use reqdoc_babel::format::DocxOptions;
use reqdoc_babel::{ConvertError, ConvertOptions, RenderConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/reqdoc.default.toml");

/// Top-level configuration consumed by reqdoc applications.
#[derive(Debug, Clone, Deserialize)]
pub struct ReqdocConfig {
    pub convert: ConvertConfig,
}

impl ReqdocConfig {
    /// Conversion options with the rule document loaded.
    ///
    /// A missing or malformed rule document leaves the options without rules; an invalid
    /// pattern in a readable one is an error.
    pub fn convert_options(&self) -> Result<ConvertOptions, ConvertError> {
        let mut options = ConvertOptions::from(&self.convert);
        if let Some(path) = &self.convert.render_config {
            options.render_config = RenderConfig::load(path)?;
        }
        Ok(options)
    }
}

/// Knobs shared by all converters.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub empty_placeholder: String,
    pub single_document: bool,
    pub top_level: String,
    pub document_name: Option<String>,
    pub excluded_paths: Vec<PathBuf>,
    pub sources: Vec<PathBuf>,
    pub render_config: Option<PathBuf>,
    pub docx: DocxConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocxConfig {
    pub table_style: String,
    pub code_font: String,
    pub template: Option<PathBuf>,
}

impl From<&DocxConfig> for DocxOptions {
    fn from(config: &DocxConfig) -> Self {
        DocxOptions {
            table_style: config.table_style.clone(),
            code_font: config.code_font.clone(),
            template: config.template.clone(),
        }
    }
}

/// Everything except the rule document, which needs I/O; see [`ReqdocConfig::convert_options`].
impl From<&ConvertConfig> for ConvertOptions {
    fn from(config: &ConvertConfig) -> Self {
        ConvertOptions {
            empty_placeholder: config.empty_placeholder.clone(),
            single_document: config.single_document,
            top_level: config.top_level.clone(),
            document_name: config.document_name.clone(),
            excluded_paths: config.excluded_paths.clone(),
            sources: config.sources.clone(),
            render_config: RenderConfig::new(),
            docx: DocxOptions::from(&config.docx),
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<ReqdocConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<ReqdocConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqdoc_babel::FormatSpecifier;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.convert.empty_placeholder, "N/A");
        assert!(!config.convert.single_document);
        assert_eq!(config.convert.top_level, "Specification");
        assert_eq!(config.convert.document_name, None);
        assert!(config.convert.excluded_paths.is_empty());
        assert_eq!(config.convert.render_config, None);
        assert_eq!(config.convert.docx.table_style, "Table Grid");
        assert_eq!(config.convert.docx.code_font, "Consolas");
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("convert.single_document", true)
            .expect("override to apply")
            .set_override("convert.document_name", "all.md")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert!(config.convert.single_document);
        assert_eq!(config.convert.document_name.as_deref(), Some("all.md"));
    }

    #[test]
    fn layers_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reqdoc.toml");
        std::fs::write(
            &path,
            "[convert]\nempty_placeholder = \"-\"\nexcluded_paths = [\"vendor\"]\n\n[convert.docx]\ncode_font = \"Courier New\"\n",
        )
        .unwrap();

        let config = Loader::new().with_file(&path).build().expect("config to build");
        assert_eq!(config.convert.empty_placeholder, "-");
        assert_eq!(config.convert.excluded_paths, vec![PathBuf::from("vendor")]);
        assert_eq!(config.convert.docx.code_font, "Courier New");
        assert_eq!(config.convert.docx.table_style, "Table Grid");
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = Loader::new().with_file("does/not/exist.toml").build();
        assert!(result.is_err());

        let config = Loader::new()
            .with_optional_file("does/not/exist.toml")
            .build()
            .expect("optional file to be skipped");
        assert_eq!(config.convert.top_level, "Specification");
    }

    #[test]
    fn converts_to_options_with_rules() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("render.json");
        std::fs::write(
            &rules,
            r#"{"renderCfg": [{"attribute": "description", "format": "md"}]}"#,
        )
        .unwrap();

        let config = Loader::new()
            .set_override("convert.render_config", rules.display().to_string())
            .expect("override to apply")
            .set_override("convert.empty_placeholder", "none")
            .expect("override to apply")
            .build()
            .expect("config to build");
        let options = config.convert_options().expect("options");

        assert_eq!(options.empty_placeholder, "none");
        assert_eq!(
            options.render_config.resolve("P", "T", "description"),
            Some(&FormatSpecifier::Markdown)
        );

        let plain = ConvertOptions::from(&config.convert);
        assert!(!plain.render_config.is_loaded());
    }
}
