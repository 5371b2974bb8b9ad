use std::collections::BTreeSet;

use redline_core::model::{BlockId, BlockModel};

use crate::checks::{CheckContext, CheckSet};
use crate::diagnostics::{IssueCode, Severity, ValidationIssue, ValidationReport};
use crate::schema::{BATCH_VERSION, EditBatch, EditRecord, Operation, OperationClass};

pub const DEFAULT_MAX_REDUCTION: f64 = 0.5;

/// Validator configuration options.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidateOptions {
    /// Promote advisory issues to fatal.
    pub strict: bool,
    /// Largest tolerated fractional shrink of a replaced block (0.5 = half).
    pub max_reduction: f64,
    /// Advisory check names to skip, e.g. `unterminated_quote`.
    pub suppress: Vec<String>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_reduction: DEFAULT_MAX_REDUCTION,
            suppress: Vec::new(),
        }
    }
}

/// Validate a batch against a model with the built-in checks.
pub fn validate(model: &BlockModel, batch: &EditBatch, opts: &ValidateOptions) -> ValidationReport {
    validate_with_checks(model, batch, opts, &CheckSet::builtin())
}

/// Validate a batch against a model.
///
/// Rules:
/// - batch version must be supported
/// - a fingerprint, when present, must match the model
/// - every record's block id must resolve
/// - required fields must be present per op, and no others
/// - a block takes at most one content edit (`replace` or `delete`)
/// - advisory checks run on records with no fatal issue
///
/// Pure: the same inputs always yield the same report, with issues ordered by
/// record index, then rule order.
pub fn validate_with_checks(
    model: &BlockModel,
    batch: &EditBatch,
    opts: &ValidateOptions,
    checks: &CheckSet,
) -> ValidationReport {
    let mut issues = Vec::new();

    if batch.v != BATCH_VERSION {
        issues.push(ValidationIssue::batch(
            IssueCode::UnsupportedBatchVersion,
            "v",
            format!("unsupported edit batch version {}", batch.v),
        ));
    }

    if let Some(expected) = batch.fingerprint.as_deref() {
        if !expected.trim().eq_ignore_ascii_case(model.fingerprint()) {
            issues.push(ValidationIssue::batch(
                IssueCode::FingerprintMismatch,
                "fingerprint",
                format!(
                    "batch fingerprint mismatch (expected '{}', got '{}')",
                    expected.trim(),
                    model.fingerprint()
                ),
            ));
        }
    }

    let mut content: BTreeSet<BlockId> = BTreeSet::new();

    for (i, rec) in batch.edits.iter().enumerate() {
        let issue = |code: IssueCode, field: &str, message: String| ValidationIssue {
            severity: Severity::Fatal,
            code,
            path: Some(format!("edits[{i}].{field}")),
            record_index: Some(i),
            op: Some(rec.op),
            block_id: Some(rec.block_id.clone()),
            message,
        };
        let before = issues.len();

        let block = model.resolve(&rec.block_id);
        if block.is_none() {
            issues.push(issue(
                IssueCode::UnknownBlockId,
                "block_id",
                format!("edits[{i}] references unknown block_id '{}'", rec.block_id),
            ));
        }

        field_issues(i, rec, &mut |code, field, message| {
            issues.push(issue(code, field, message))
        });

        if let Some(block) = block {
            if rec.op.class() == OperationClass::Content && !content.insert(block.id) {
                issues.push(issue(
                    IssueCode::ConflictingOperation,
                    "op",
                    format!(
                        "edits[{i}] ({}) targets block '{}' which an earlier record already replaces or deletes",
                        rec.op, block.id
                    ),
                ));
            }
        }

        if issues.len() > before {
            continue;
        }

        let Some(payload) = rec.text.as_deref() else {
            continue;
        };
        let ctx = CheckContext {
            op: rec.op,
            payload,
            original: match rec.op {
                Operation::Insert => None,
                _ => block.map(|b| b.text.as_str()),
            },
            max_reduction: opts.max_reduction,
        };
        for (code, message) in checks.run(&ctx, &opts.suppress) {
            let mut advisory = issue(code, "text", format!("edits[{i}] ({}) {message}", rec.op));
            advisory.severity = if opts.strict {
                Severity::Fatal
            } else {
                Severity::Advisory
            };
            issues.push(advisory);
        }
    }

    let report = ValidationReport::from_issues(issues);
    tracing::debug!(
        records = batch.edits.len(),
        issues = report.issues.len(),
        valid = report.valid,
        "validated edit batch"
    );
    report
}

fn field_issues(i: usize, rec: &EditRecord, push: &mut dyn FnMut(IssueCode, &str, String)) {
    let op = rec.op;

    match (op.takes_text(), rec.text.as_deref()) {
        (true, None) => push(
            IssueCode::MissingField,
            "text",
            format!("edits[{i}] ({op}) missing text"),
        ),
        (true, Some(text)) if text.trim().is_empty() => push(
            IssueCode::EmptyPayload,
            "text",
            format!("edits[{i}] ({op}) text is empty"),
        ),
        (false, Some(_)) => push(
            IssueCode::UnexpectedField,
            "text",
            format!("edits[{i}] ({op}) unexpected text (delete takes no payload)"),
        ),
        _ => {}
    }

    if rec.diff.is_some() && op != Operation::Replace {
        push(
            IssueCode::UnexpectedField,
            "diff",
            format!("edits[{i}] ({op}) unexpected diff (only valid for replace)"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_core::model::BlockKind;

    fn model() -> BlockModel {
        let mut b = BlockModel::builder("abc123");
        b.push(BlockKind::Heading, Some(1), "Terms");
        b.push(
            BlockKind::Paragraph,
            None,
            "The supplier delivers the goods within ten business days.",
        );
        b.finish()
    }

    fn codes(report: &ValidationReport) -> Vec<IssueCode> {
        report.issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn clean_batch_is_valid() {
        let batch = EditBatch::new("a")
            .with_fingerprint("ABC123")
            .with_edit(EditRecord::replace("b2", "The supplier delivers the goods within five business days."))
            .with_edit(EditRecord::comment("b1", "ok"))
            .with_edit(EditRecord::insert("b00002", "New clause."))
            .with_edit(EditRecord::delete("B1"));
        let report = validate(&model(), &batch, &ValidateOptions::default());
        assert!(report.valid, "{report:?}");
        assert!(report.issues.is_empty());
    }

    #[test]
    fn all_issues_are_collected() {
        let mut batch = EditBatch::new("a")
            .with_fingerprint("other")
            .with_edit(EditRecord::replace("b9", "x"))
            .with_edit(EditRecord::delete("b2").with_diff(false))
            .with_edit(EditRecord::insert("b1", "  "));
        batch.v = 2;
        batch.edits.push(EditRecord {
            text: None,
            ..EditRecord::comment("b1", "")
        });

        let report = validate(&model(), &batch, &ValidateOptions::default());
        assert!(!report.valid);
        assert_eq!(
            codes(&report),
            [
                IssueCode::UnsupportedBatchVersion,
                IssueCode::FingerprintMismatch,
                IssueCode::UnknownBlockId,
                IssueCode::UnexpectedField,
                IssueCode::EmptyPayload,
                IssueCode::MissingField,
            ]
        );
        assert_eq!(report.issues[2].path.as_deref(), Some("edits[0].block_id"));
        assert_eq!(report.issues[3].path.as_deref(), Some("edits[1].diff"));
        assert_eq!(report.issues[5].record_index, Some(3));
    }

    #[test]
    fn second_replace_of_a_block_conflicts() {
        let batch = EditBatch::new("a")
            .with_edit(EditRecord::replace("b1", "One"))
            .with_edit(EditRecord::replace("b00001", "Two"));
        let report = validate(&model(), &batch, &ValidateOptions::default());
        assert_eq!(codes(&report), [IssueCode::ConflictingOperation]);
        assert_eq!(report.issues[0].record_index, Some(1));
    }

    #[test]
    fn replace_and_delete_of_one_block_conflict_in_either_order() {
        let opts = ValidateOptions::default();
        let replace_then_delete = EditBatch::new("a")
            .with_edit(EditRecord::replace("b1", "One"))
            .with_edit(EditRecord::delete("b00001"));
        let delete_then_replace = EditBatch::new("a")
            .with_edit(EditRecord::delete("b1"))
            .with_edit(EditRecord::replace("b1", "One"));

        for batch in [replace_then_delete, delete_then_replace] {
            let report = validate(&model(), &batch, &opts);
            assert!(!report.valid);
            assert_eq!(codes(&report), [IssueCode::ConflictingOperation]);
            assert_eq!(report.issues[0].record_index, Some(1));
        }
    }

    #[test]
    fn comment_coexists_with_a_content_edit() {
        let batch = EditBatch::new("a")
            .with_edit(EditRecord::delete("b1"))
            .with_edit(EditRecord::comment("b1", "Why remove this?"));
        assert!(validate(&model(), &batch, &ValidateOptions::default()).valid);
    }

    #[test]
    fn advisories_do_not_invalidate_unless_strict() {
        let batch = EditBatch::new("a").with_edit(EditRecord::replace("b2", "The supplier..."));
        let report = validate(&model(), &batch, &ValidateOptions::default());
        assert!(report.valid);
        assert_eq!(
            codes(&report),
            [IssueCode::TrailingEllipsis, IssueCode::LargeReduction]
        );
        assert!(report.issues.iter().all(|i| i.severity == Severity::Advisory));

        let strict = ValidateOptions {
            strict: true,
            ..ValidateOptions::default()
        };
        let report = validate(&model(), &batch, &strict);
        assert!(!report.valid);
        assert_eq!(report.fatal().count(), 2);

        let suppressed = ValidateOptions {
            strict: true,
            suppress: vec!["trailing_ellipsis".into(), "large_reduction".into()],
            ..ValidateOptions::default()
        };
        assert!(validate(&model(), &batch, &suppressed).valid);
    }

    #[test]
    fn validation_is_repeatable() {
        let batch = EditBatch::new("a")
            .with_edit(EditRecord::replace("b2", "x \"y"))
            .with_edit(EditRecord::delete("b7"));
        let opts = ValidateOptions::default();
        assert_eq!(
            validate(&model(), &batch, &opts),
            validate(&model(), &batch, &opts)
        );
    }
}
