//! Boundary operations: each one is independently invocable and owns its I/O.

use std::fs;
use std::path::Path;

use redline_core::model::BlockModel;
use redline_docx::DocxDocument;
use redline_patch::{ApplyOptions, ApplyResult, EditBatch, parse_markdown, to_markdown};
use redline_reader::{Page, PageOptions};

use crate::batch_json::parse_batch_json_str;
use crate::canonical_json::to_canonical_json_string;
use crate::error::RedlineError;

/// Surface syntax of an edit batch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    Json,
    /// The markdown authoring syntax.
    Markdown,
}

impl BatchFormat {
    /// `.md` and `.markdown` are authoring syntax; anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown") => {
                BatchFormat::Markdown
            }
            _ => BatchFormat::Json,
        }
    }
}

/// A batch read from disk, plus non-fatal authoring warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedBatch {
    pub batch: EditBatch,
    pub warnings: Vec<String>,
}

pub fn open_document(path: &Path) -> Result<DocxDocument, RedlineError> {
    let doc = DocxDocument::open(path)?;
    tracing::debug!(path = %path.display(), blocks = doc.model().len(), "opened document");
    Ok(doc)
}

pub fn extract(path: &Path) -> Result<BlockModel, RedlineError> {
    Ok(open_document(path)?.into_model())
}

pub fn read_page(
    model: &BlockModel,
    index: usize,
    opts: PageOptions,
) -> Result<Page<'_>, RedlineError> {
    Ok(redline_reader::page(model, index, opts)?)
}

pub fn load_batch(path: &Path) -> Result<LoadedBatch, RedlineError> {
    let src = fs::read_to_string(path).map_err(|source| RedlineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_batch(&src, BatchFormat::from_path(path), path)
}

/// Parse batch source text. `origin` is only used in error messages.
pub fn parse_batch(src: &str, format: BatchFormat, origin: &Path) -> Result<LoadedBatch, RedlineError> {
    match format {
        BatchFormat::Json => {
            let batch = parse_batch_json_str(src).map_err(|source| RedlineError::BatchJson {
                path: origin.to_path_buf(),
                source,
            })?;
            Ok(LoadedBatch {
                batch,
                warnings: Vec::new(),
            })
        }
        BatchFormat::Markdown => {
            let parsed = parse_markdown(src);
            if !parsed.is_clean() {
                return Err(RedlineError::Authoring {
                    path: origin.to_path_buf(),
                    errors: parsed.errors,
                });
            }
            for warning in &parsed.warnings {
                tracing::warn!(path = %origin.display(), "{warning}");
            }
            Ok(LoadedBatch {
                batch: parsed.batch,
                warnings: parsed.warnings,
            })
        }
    }
}

/// Render a batch in either surface syntax. `canonical` only affects JSON.
pub fn render_batch(batch: &EditBatch, format: BatchFormat, canonical: bool) -> Result<String, RedlineError> {
    Ok(match format {
        BatchFormat::Markdown => to_markdown(batch),
        BatchFormat::Json if canonical => to_canonical_json_string(batch)?,
        BatchFormat::Json => serde_json::to_string_pretty(batch)?,
    })
}

/// Apply a batch to the package at `input` and write the result to `output`.
///
/// Nothing is written unless every record resolved: rejected batches and
/// package failures leave `output` untouched, and the write itself is an
/// atomic replace. `output` may equal `input`.
pub fn apply_to_path(
    input: &Path,
    batch: &EditBatch,
    opts: &ApplyOptions,
    output: &Path,
) -> Result<ApplyResult, RedlineError> {
    let mut doc = open_document(input)?;
    let result = redline_patch::apply(&mut doc, batch, opts)?;
    doc.save(output)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        applied = result.applied,
        skipped = result.skipped.len(),
        "wrote redlined document"
    );
    Ok(result)
}
