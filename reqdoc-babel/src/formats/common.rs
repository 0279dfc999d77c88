//! Shared conversion driver.
//!
//!     All built-in converters walk a record set the same way and differ only in their
//!     [`DocumentWriter`]:
//!
//!     - Source files under an excluded path are skipped.
//!     - Multiple document mode opens one writer per source file, named after the file stem.
//!     - Single document mode opens one writer, writes the top-level heading at level 1 and
//!       shifts every other heading down by one.
//!     - Sections become headings at `base + level`, records at `base + level + 1`.
//!     - A record whose type name has a registered handler goes to the handler instead of the
//!       writer's default table. A handler error aborts the whole run.

use crate::error::ConvertError;
use crate::format::{ConvertOptions, ConvertedOutput, SerializedDocument};
use crate::model::{Item, Record, RecordSet, SourceFile};
use crate::render_config::RenderConfig;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A per-document output builder.
pub trait DocumentWriter {
    /// Write a heading at an absolute level (1 is the top).
    fn heading(&mut self, title: &str, level: usize) -> Result<(), ConvertError>;

    /// Write a record with its default layout; `level` is the level of its heading.
    fn record(&mut self, record: &Record, level: usize) -> Result<(), ConvertError>;

    /// Produce the finished document.
    fn finish(self) -> Result<SerializedDocument, ConvertError>;
}

/// Display names of attributes, keyed by attribute name.
pub type AttributeNames = HashMap<String, String>;

/// The name `attribute` is shown under in a record table.
pub fn display_name<'a>(names: Option<&'a AttributeNames>, attribute: &'a str) -> &'a str {
    names
        .and_then(|names| names.get(attribute))
        .map_or(attribute, String::as_str)
}

/// Project specific conversion of one record type.
pub type RecordHandler<W> =
    Box<dyn Fn(&mut W, &Record, usize) -> Result<(), ConvertError> + Send + Sync>;

/// Record handlers keyed by record type name.
pub struct HandlerTable<W> {
    handlers: HashMap<String, RecordHandler<W>>,
}

impl<W> HandlerTable<W> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for records of `type_name`, replacing any previous one.
    pub fn insert<F>(&mut self, type_name: impl Into<String>, handler: F)
    where
        F: Fn(&mut W, &Record, usize) -> Result<(), ConvertError> + Send + Sync + 'static,
    {
        self.handlers.insert(type_name.into(), Box::new(handler));
    }

    pub fn get(&self, type_name: &str) -> Option<&RecordHandler<W>> {
        self.handlers.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<W> Default for HandlerTable<W> {
    fn default() -> Self {
        Self::new()
    }
}

/// What a writer needs from [`ConvertOptions`], owned so handlers can reach it.
#[derive(Debug, Clone)]
pub struct WriterSettings {
    pub empty_placeholder: String,
    pub render_config: RenderConfig,
    pub sources: Vec<PathBuf>,
}

impl WriterSettings {
    pub fn from_options(options: &ConvertOptions) -> Self {
        Self {
            empty_placeholder: options.empty_placeholder.clone(),
            render_config: options.render_config.clone(),
            sources: options.sources.clone(),
        }
    }

    /// Resolve `path` against the source roots, see [`locate_resource`].
    pub fn locate_resource(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConvertError> {
        locate_resource(path, &self.sources)
    }
}

/// Find a resource a record refers to.
///
/// `path` is used as is when it names an existing file; otherwise it is tried relative to each
/// source directory in order. A resource found nowhere is an error.
pub fn locate_resource(
    path: impl AsRef<Path>,
    sources: &[PathBuf],
) -> Result<PathBuf, ConvertError> {
    let path = path.as_ref();
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    sources
        .iter()
        .filter(|source| source.is_dir())
        .map(|source| source.join(path))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ConvertError::MissingResource(path.to_path_buf()))
}

/// Whether `file` lies under one of `excluded`, compared component by component.
pub fn is_excluded(file: &str, excluded: &[PathBuf]) -> bool {
    let file = Path::new(file);
    excluded.iter().any(|path| file.starts_with(path))
}

/// Output names that more than one document was given, in first-seen order.
///
/// Publishing such outputs into one directory keeps only the last of them.
pub fn duplicate_names(outputs: &[ConvertedOutput]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for output in outputs {
        let name = output.file_name.as_str();
        if !seen.insert(name) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    duplicates
}

/// Output name of a source file in multiple document mode.
pub fn output_name(source: &str, extension: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("output");
    format!("{stem}.{extension}")
}

/// Run a conversion with fresh writers from `open`.
pub fn convert_with<W, F>(
    records: &RecordSet,
    options: &ConvertOptions,
    extension: &str,
    handlers: &HandlerTable<W>,
    mut open: F,
) -> Result<Vec<ConvertedOutput>, ConvertError>
where
    W: DocumentWriter,
    F: FnMut() -> Result<W, ConvertError>,
{
    let files: Vec<&SourceFile> = records
        .files
        .iter()
        .filter(|file| {
            let excluded = is_excluded(&file.name, &options.excluded_paths);
            if excluded {
                debug!(file = %file.name, "skipping excluded file");
            }
            !excluded
        })
        .collect();

    let mut outputs = Vec::new();

    if options.single_document {
        debug!("single document mode");
        let name = options
            .document_name
            .clone()
            .unwrap_or_else(|| format!("output.{extension}"));

        let mut writer = open()?;
        writer.heading(&options.top_level, 1)?;
        for file in files {
            debug!(file = %file.name, "converting");
            write_items(&mut writer, file, 2, handlers)?;
        }
        info!(output = %name, "generated document");
        outputs.push(ConvertedOutput {
            file_name: name,
            content: writer.finish()?,
        });
    } else {
        debug!("multiple document mode");
        for file in files {
            debug!(file = %file.name, "converting");
            let name = output_name(&file.name, extension);
            let mut writer = open()?;
            write_items(&mut writer, file, 1, handlers)?;
            info!(output = %name, "generated document");
            outputs.push(ConvertedOutput {
                file_name: name,
                content: writer.finish()?,
            });
        }
        for name in duplicate_names(&outputs) {
            warn!(output = %name, "several source files share this output name");
        }
    }

    Ok(outputs)
}

fn write_items<W: DocumentWriter>(
    writer: &mut W,
    file: &SourceFile,
    base: usize,
    handlers: &HandlerTable<W>,
) -> Result<(), ConvertError> {
    for item in &file.items {
        match item {
            Item::Section { title, level } => writer.heading(title, base + level)?,
            Item::Record { record, level } => {
                let heading = base + level + 1;
                match handlers.get(&record.type_name) {
                    Some(handler) => {
                        debug!(record = %record.qualified_name(), "using project handler");
                        handler(writer, record, heading)?
                    }
                    None => writer.record(record, heading)?,
                }
            }
        }
    }
    Ok(())
}
