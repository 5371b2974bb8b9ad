use std::io;
use std::path::PathBuf;

use redline_docx::PackageError;
use redline_patch::{ApplyError, MergeError, ParseError};
use redline_reader::PageError;

use crate::batch_json::BatchJsonError;

/// Failures of the boundary operations.
#[derive(Debug, thiserror::Error)]
pub enum RedlineError {
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {source}")]
    BatchJson {
        path: PathBuf,
        #[source]
        source: BatchJsonError,
    },
    #[error("{path}: {} authoring error(s), first at line {}: {}", .errors.len(), first_line(.errors), first_message(.errors))]
    Authoring {
        path: PathBuf,
        errors: Vec<ParseError>,
    },
    #[error("cannot serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn first_line(errors: &[ParseError]) -> usize {
    errors.first().map(|e| e.line).unwrap_or_default()
}

fn first_message(errors: &[ParseError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or_default()
}
