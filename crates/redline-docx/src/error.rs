use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },
    #[error("closing tag without matching opening tag at byte {0}")]
    Unbalanced(u64),
    #[error("document has no root element")]
    MissingRoot,
    #[error("unclosed element <{0}>")]
    Unclosed(String),
}

/// Structural failures. Any of these aborts the whole operation.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("not a zip package: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("package I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("package has no part '{0}'")]
    MissingPart(String),
    #[error("part '{part}' is not UTF-8")]
    Encoding { part: String },
    #[error("part '{part}' is not well-formed: {source}")]
    Xml {
        part: String,
        #[source]
        source: XmlError,
    },
    #[error("part '{part}' has unexpected structure: {message}")]
    Structure { part: String, message: String },
}

/// A markup operation that could not be rendered for one block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("target not found")]
    TargetNotFound,
    #[error("block location is stale")]
    StaleAnchor,
    /// The block's element is queued for removal by an earlier plain delete.
    #[error("target deleted earlier in batch")]
    TargetRemoved,
}
