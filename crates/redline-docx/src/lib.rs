#![doc = r#"
⚠️ INTERNAL CRATE – NOT A STABLE API

DOCX package plumbing for the redline engine: zip I/O, the XML tree, block
extraction and revision markup.

Do NOT depend on this crate directly.
Use `redline-io` instead.
"#]

pub mod builder;
pub mod document;
pub mod error;
pub mod extract;
pub mod package;
pub mod redline;
pub mod xml;

mod names;

pub use document::DocxDocument;
pub use error::{PackageError, RenderError, XmlError};
pub use redline::{RedlineOptions, Redliner, ReplaceMode};
