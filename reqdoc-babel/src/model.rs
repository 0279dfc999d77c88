//! Record model consumed by the converters.
//!
//!     The requirement parser is an external collaborator. What reaches this crate is its
//!     output: source files, each holding an ordered sequence of sections and records. The
//!     types here mirror that output and are read-only to the pipeline. They deserialize from
//!     the JSON the parser writes, which is how the CLI receives them.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All records of one conversion run, grouped by the file they were declared in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub files: Vec<SourceFile>,
}

impl RecordSet {
    /// Read a record set from its JSON representation.
    pub fn from_json(source: &str) -> Result<Self, ConvertError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Iterate every record across all files, in declaration order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.files.iter().flat_map(|file| {
            file.items.iter().filter_map(|item| match item {
                Item::Record { record, .. } => Some(record),
                Item::Section { .. } => None,
            })
        })
    }
}

/// One source file and its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// A section heading or a record, each with its nesting level inside the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Section { title: String, level: usize },
    Record { record: Record, level: usize },
}

/// A typed, named requirement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub type_name: String,
    pub package: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    pub location: SourceLocation,
}

impl Record {
    /// Look up a field value by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    /// The string value of a field, if the field exists and holds a string.
    pub fn string_field(&self, name: &str) -> Option<&str> {
        match self.field(name) {
            Some(FieldValue::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Fully qualified name, `package.name`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }
}

/// Where a record was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A named field of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// The value of a record field.
///
/// `Array` is the only container kind and may nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Reference(RecordRef),
    String(String),
    Array(Vec<FieldValue>),
    Other(Expression),
}

/// Target of a record reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    pub package: String,
    pub name: String,
}

impl RecordRef {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Visible text of a reference: `package.name`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    /// Anchor the reference points at. This is the bare record name, so records with the
    /// same name in different packages share an anchor.
    pub fn anchor(&self) -> &str {
        &self.name
    }
}

/// Scalar expressions that are neither strings nor references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expression {
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    /// Enumeration literal, e.g. `Priority.High`
    Enum(String),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Integer(value) => write!(f, "{value}"),
            Expression::Decimal(value) => write!(f, "{value}"),
            Expression::Boolean(value) => write!(f, "{value}"),
            Expression::Enum(literal) => f.write_str(literal),
        }
    }
}
