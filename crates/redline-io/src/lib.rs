//! `redline-io` is the single supported public entrypoint for the redline
//! engine: block extraction, paging, edit batch validation, application and
//! merging, and the exchanged wire types.
//!
//! This crate contains no drafting logic. Deciding *which* edits to write
//! belongs to higher layers. `redline-io` focuses on:
//! - stable types
//! - boundary operations over files
//! - canonical JSON

// -----------------------------------------------------------------------------
// Public API contract
// -----------------------------------------------------------------------------
//
// Consumers SHOULD import from `redline_io::prelude::*`.
// Anything not re-exported via the prelude is considered internal and may change
// without notice.

#[doc(hidden)]
pub mod core {
    pub use redline_core::diff::{DiffSpan, word_diff};
    pub use redline_core::model::{Attachment, Block, BlockId, BlockKind, BlockModel, OutlineEntry};
}

#[doc(hidden)]
pub mod docx {
    pub use redline_docx::builder::DocxBuilder;
    pub use redline_docx::{DocxDocument, PackageError};
}

#[doc(hidden)]
pub mod reader {
    pub use redline_reader::serialize::{to_minified_json, to_pretty_json};
    pub use redline_reader::{Page, PageError, PageOptions, Stats, stats};
}

#[doc(hidden)]
pub mod batch {
    pub use redline_patch::apply::{ApplyWarning, InsertedBlock, SkippedRecord};
    pub use redline_patch::checks::{CheckContext, CheckSet};
    pub use redline_patch::merge::SourcedRecord;
    pub use redline_patch::validate::validate_with_checks;
    pub use redline_patch::*;
}

/// Parsing edit batch JSON with actionable diagnostics.
pub mod batch_json;

/// Deterministic JSON canonicalization.
pub mod canonical_json;

/// Boundary operations over files.
pub mod engine;

pub mod error;

/// Version constants for conformance and CI gating.
pub mod version;

pub use engine::{
    BatchFormat, LoadedBatch, apply_to_path, extract, load_batch, open_document, parse_batch,
    read_page, render_batch,
};
pub use error::RedlineError;

/// Convenience prelude for consumers.
///
/// This is the **only supported** import surface for external users.
pub mod prelude {
    pub use crate::batch::{
        AdvisoryCheck, ApplyError, ApplyOptions, ApplyResult, EditBatch, EditRecord, IssueCode,
        MergeConflict, MergeError, MergeOutcome, MergePolicy, Operation, Severity, ValidateOptions,
        ValidationIssue, ValidationReport, apply, merge, validate,
    };
    pub use crate::core::{Attachment, Block, BlockId, BlockKind, BlockModel, OutlineEntry};
    pub use crate::docx::DocxDocument;
    pub use crate::engine::{BatchFormat, LoadedBatch};
    pub use crate::error::RedlineError;
    pub use crate::reader::{Page, PageOptions, Stats};
    pub use crate::{canonical_json, engine};
}
