//! Conversion publishing pipeline.
//!
//! Runs a converter and either hands the generated documents back or writes them into an
//! output directory. This is the one call the CLI needs; for more control use
//! [`ConverterRegistry`] directly.

use crate::error::ConvertError;
use crate::format::{ConvertOptions, ConvertedOutput};
use crate::model::RecordSet;
use crate::registry::ConverterRegistry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Specifies how to publish a record set.
///
/// ```ignore
/// let spec = PublishSpec::new(&records, "markdown").with_output_dir("out");
/// ```
///
/// Without an output directory the documents are returned in memory.
#[derive(Debug)]
pub struct PublishSpec<'a> {
    pub records: &'a RecordSet,
    /// Converter name, e.g. `markdown`
    pub format: &'a str,
    pub output_dir: Option<PathBuf>,
    pub options: ConvertOptions,
}

impl<'a> PublishSpec<'a> {
    pub fn new(records: &'a RecordSet, format: &'a str) -> Self {
        Self {
            records,
            format,
            output_dir: None,
            options: ConvertOptions::default(),
        }
    }

    /// Write the documents into `dir`, creating it when needed.
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }
}

/// One published document.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishArtifact {
    InMemory(ConvertedOutput),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    pub artifacts: Vec<PublishArtifact>,
}

/// Publish with the default converters.
pub fn publish(spec: PublishSpec<'_>) -> Result<PublishResult, ConvertError> {
    publish_with(&ConverterRegistry::with_defaults(), spec)
}

/// Publish with converters from `registry`, e.g. ones carrying project handlers.
pub fn publish_with(
    registry: &ConverterRegistry,
    spec: PublishSpec<'_>,
) -> Result<PublishResult, ConvertError> {
    let outputs = registry.convert(spec.records, spec.format, &spec.options)?;

    let artifacts = match spec.output_dir {
        Some(dir) => {
            fs::create_dir_all(&dir)?;
            outputs
                .into_iter()
                .map(|output| write_output(&dir, output))
                .collect::<Result<Vec<_>, _>>()?
        }
        None => outputs.into_iter().map(PublishArtifact::InMemory).collect(),
    };

    Ok(PublishResult { artifacts })
}

fn write_output(dir: &Path, output: ConvertedOutput) -> Result<PublishArtifact, ConvertError> {
    let path = dir.join(&output.file_name);
    fs::write(&path, output.content.into_bytes())?;
    info!(path = %path.display(), "wrote document");
    Ok(PublishArtifact::File(path))
}
