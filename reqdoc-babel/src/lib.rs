//! Requirement records to documents
//!
//!     This crate converts a set of requirement records into plain text, Markdown,
//!     reStructuredText and WordprocessingML documents.
//!
//!     This is a pure lib, that is, it powers reqdoc-cli but is shell agnostic: no code here
//!     prints to stdout or reads environment variables.
//!
//! Architecture
//!
//!     Records arrive already parsed (see [`model`]). Every attribute value then takes one of two
//!     roads:
//!
//!     - The format selector ([`render_config`]) decides per `(package, type, attribute)` whether
//!       a string is Markdown. Markdown is parsed into the markup tree ([`markup`]) and handed
//!       to the renderer of the target ([`render`]).
//!     - Everything else goes through the generic dispatch engine ([`dispatch`]), which walks a
//!       field value and calls per-kind hooks. Each target implements those hooks once.
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── model.rs                # Records, fields, values
//!     ├── render_config.rs        # Format selector
//!     ├── dispatch.rs             # Generic dispatch engine
//!     ├── markup                  # Markup tree and the comrak adapter
//!     ├── render                  # Markup tree -> Markdown / RST / docx blocks
//!     ├── docx                    # WordprocessingML model and .docx package writer
//!     ├── format.rs               # Converter trait and options
//!     ├── registry.rs             # ConverterRegistry for discovery and selection
//!     ├── formats
//!     │   ├── common.rs           # Shared conversion driver
//!     │   └── <target>.rs         # Writer and converter of one target
//!     └── publish.rs              # Convert and write to disk
//!
//! Testing
//!     tests
//!     └── <target>
//!         └── mod.rs
//!
//!     Rust does not discover tests in subdirectories, so tests/lib.rs includes them.
//!
//! Documents and Levels
//!
//!     In multiple document mode every source file becomes one document. In single document
//!     mode all files go into one document under a top-level heading. Sections are headings at
//!     `base + level`, records are headings one level deeper.
//!
//!     References render as `package.name` and link to an anchor named after the bare record
//!     name, in every target.
//!
//! Library Choices
//!
//!     Markdown is parsed with comrak; we never write a Markdown parser. The rich document is
//!     a small in-memory model serialized with quick-xml and packed into a `.docx` archive with
//!     zip. Style templates are read with roxmltree.

pub mod dispatch;
pub mod docx;
pub mod error;
pub mod format;
pub mod formats;
pub mod markup;
pub mod model;
pub mod publish;
pub mod registry;
pub mod render;
pub mod render_config;

pub use dispatch::{walk, ValueHandler, Walked};
pub use error::ConvertError;
pub use format::{ConvertOptions, ConvertedOutput, Converter, DocxOptions, SerializedDocument};
pub use formats::common::{
    display_name, locate_resource, AttributeNames, DocumentWriter, WriterSettings,
};
pub use model::{Field, FieldValue, Item, Record, RecordRef, RecordSet, SourceFile};
pub use registry::ConverterRegistry;
pub use render_config::{FormatRule, FormatSpecifier, RenderConfig};
