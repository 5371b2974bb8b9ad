use std::collections::BTreeMap;

use redline_core::model::BlockId;
use redline_docx::{DocxDocument, PackageError, RedlineOptions, ReplaceMode};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{IssueCode, ValidationIssue};
use crate::schema::{EditBatch, Operation};
use crate::validate::{DEFAULT_MAX_REDUCTION, ValidateOptions, validate};

pub const DEFAULT_AUTHOR: &str = "Redline";

pub const REASON_TARGET_NOT_FOUND: &str = "target not found";

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOptions {
    /// Promote advisory issues to fatal; any of them aborts the batch.
    pub strict: bool,
    /// Skip records with fatal issues instead of rejecting the batch.
    pub skip_invalid: bool,
    /// Emit revision markup. When false, edits are written directly.
    pub track_changes: bool,
    pub author_name: String,
    pub author_email: Option<String>,
    /// Revision timestamp; defaults to now.
    pub date: Option<String>,
    pub max_reduction: f64,
    pub suppress: Vec<String>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            strict: false,
            skip_invalid: false,
            track_changes: true,
            author_name: DEFAULT_AUTHOR.to_string(),
            author_email: None,
            date: None,
            max_reduction: DEFAULT_MAX_REDUCTION,
            suppress: Vec::new(),
        }
    }
}

impl ApplyOptions {
    pub fn validate_options(&self) -> ValidateOptions {
        ValidateOptions {
            strict: self.strict,
            max_reduction: self.max_reduction,
            suppress: self.suppress.clone(),
        }
    }

    fn redline_options(&self) -> RedlineOptions {
        let mut opts = RedlineOptions::new(
            &self.author_name,
            self.author_email.as_deref(),
            self.date.clone(),
        );
        opts.track_changes = self.track_changes;
        opts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub block_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyWarning {
    pub index: usize,
    pub block_id: String,
    pub warning: String,
}

/// A block created by an `insert`. The id is for this report only; it is not
/// addressable and re-extraction numbers blocks afresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedBlock {
    pub id: String,
    pub after: String,
}

/// What happened to every record of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub applied: usize,
    pub skipped: Vec<SkippedRecord>,
    pub warnings: Vec<ApplyWarning>,
    pub inserted: Vec<InsertedBlock>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// The batch cannot be applied at all. Nothing was rendered.
    #[error("edit batch rejected: {}", summarize(.issues))]
    Rejected { issues: Vec<ValidationIssue> },
    #[error(transparent)]
    Package(#[from] PackageError),
}

impl ApplyResult {
    fn skip(&mut self, index: usize, block_id: &str, reason: String) {
        tracing::warn!(index, block = block_id, %reason, "skipping edit");
        self.skipped.push(SkippedRecord {
            index,
            block_id: block_id.to_string(),
            reason,
        });
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    match issues {
        [] => "no issues".to_string(),
        [one] => one.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

/// Apply a batch to an opened document.
///
/// Semantics:
/// - records apply in declared order
/// - unknown targets are skipped with reason `target not found`
/// - a block takes one content edit; a second is a `conflicting_operation`
/// - without tracked changes, a comment on a paragraph removed earlier in the
///   batch is skipped with [`redline_docx::RenderError::TargetRemoved`] as reason
/// - inserts anchor on the extracted model, never on earlier inserts
///
/// Safety:
/// - Calls [`validate`] first; batch-level issues, escalated advisories and
///   (without `skip_invalid`) record-level fatal issues reject the batch
///   before anything is rendered.
/// - The document is only changed in memory. Callers persist it.
pub fn apply(
    doc: &mut DocxDocument,
    batch: &EditBatch,
    opts: &ApplyOptions,
) -> Result<ApplyResult, ApplyError> {
    let report = validate(doc.model(), batch, &opts.validate_options());

    let rejecting: Vec<ValidationIssue> = report
        .fatal()
        .filter(|i| {
            i.code.is_batch_level()
                || i.code.is_heuristic()
                || (!opts.skip_invalid && i.code != IssueCode::UnknownBlockId)
        })
        .cloned()
        .collect();
    if !rejecting.is_empty() {
        tracing::warn!(issues = rejecting.len(), "edit batch rejected");
        return Err(ApplyError::Rejected { issues: rejecting });
    }

    let mut result = ApplyResult::default();

    let mut skip: BTreeMap<usize, String> = BTreeMap::new();
    for issue in report.fatal() {
        if let Some(index) = issue.record_index {
            let reason = match issue.code {
                IssueCode::UnknownBlockId => REASON_TARGET_NOT_FOUND.to_string(),
                _ => issue.message.clone(),
            };
            skip.entry(index).or_insert(reason);
        }
    }
    for issue in report.advisories() {
        if let (Some(index), Some(block_id)) = (issue.record_index, issue.block_id.as_ref()) {
            result.warnings.push(ApplyWarning {
                index,
                block_id: block_id.clone(),
                warning: issue.message.clone(),
            });
        }
    }

    let targets: Vec<Option<BlockId>> = batch
        .edits
        .iter()
        .map(|rec| doc.model().resolve(&rec.block_id).map(|b| b.id))
        .collect();

    let mut redliner = doc.redliner(opts.redline_options());

    for (index, (rec, target)) in batch.edits.iter().zip(targets).enumerate() {
        if let Some(reason) = skip.remove(&index) {
            result.skip(index, &rec.block_id, reason);
            continue;
        }
        let Some(id) = target else {
            result.skip(index, &rec.block_id, REASON_TARGET_NOT_FOUND.to_string());
            continue;
        };
        let text = rec.text.as_deref().unwrap_or_default();

        let outcome = match rec.op {
            Operation::Replace => {
                let mode = if rec.diff_mode() {
                    ReplaceMode::Diff
                } else {
                    ReplaceMode::Whole
                };
                redliner.replace_block(id, text, mode).map(|warnings| {
                    result
                        .warnings
                        .extend(warnings.into_iter().map(|warning| ApplyWarning {
                            index,
                            block_id: rec.block_id.clone(),
                            warning,
                        }));
                })
            }
            Operation::Delete => redliner.delete_block(id),
            Operation::Comment => redliner.comment_block(id, text),
            Operation::Insert => redliner.insert_after(id, text).map(|placed| {
                result.inserted.push(InsertedBlock {
                    id: placed,
                    after: id.to_string(),
                });
            }),
        };

        match outcome {
            Ok(()) => {
                tracing::debug!(index, op = %rec.op, block = %id, "applied edit");
                result.applied += 1;
            }
            Err(err) => result.skip(index, &rec.block_id, err.to_string()),
        }
    }

    redliner.finish()?;

    tracing::info!(
        applied = result.applied,
        skipped = result.skipped.len(),
        warnings = result.warnings.len(),
        inserted = result.inserted.len(),
        "applied edit batch"
    );
    Ok(result)
}
