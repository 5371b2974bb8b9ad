use serde::{Deserialize, Serialize};

use crate::schema::Operation;

/// Stable, machine-readable issue codes.
///
/// These codes are intended for programmatic handling (CI, tooling, UI), while
/// `message` remains human-oriented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    UnsupportedBatchVersion,
    FingerprintMismatch,
    UnknownBlockId,
    MissingField,
    UnexpectedField,
    EmptyPayload,
    /// A block is replaced twice, or deleted twice, within one batch.
    ConflictingOperation,
    UnterminatedQuote,
    TrailingEllipsis,
    LargeReduction,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::UnsupportedBatchVersion => "unsupported_batch_version",
            IssueCode::FingerprintMismatch => "fingerprint_mismatch",
            IssueCode::UnknownBlockId => "unknown_block_id",
            IssueCode::MissingField => "missing_field",
            IssueCode::UnexpectedField => "unexpected_field",
            IssueCode::EmptyPayload => "empty_payload",
            IssueCode::ConflictingOperation => "conflicting_operation",
            IssueCode::UnterminatedQuote => "unterminated_quote",
            IssueCode::TrailingEllipsis => "trailing_ellipsis",
            IssueCode::LargeReduction => "large_reduction",
        }
    }

    /// Issues about the batch as a whole rather than one record.
    pub fn is_batch_level(self) -> bool {
        matches!(
            self,
            IssueCode::UnsupportedBatchVersion | IssueCode::FingerprintMismatch
        )
    }

    /// Codes produced by heuristic checks.
    pub fn is_heuristic(self) -> bool {
        matches!(
            self,
            IssueCode::UnterminatedQuote | IssueCode::TrailingEllipsis | IssueCode::LargeReduction
        )
    }
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Fatal,
    Advisory,
}

/// A single validation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    /// JSON-ish path such as `v`, `fingerprint`, `edits[3].text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn batch(code: IssueCode, path: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            code,
            path: Some(path.to_string()),
            record_index: None,
            op: None,
            block_id: None,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

/// Every issue found in one validation pass. Never short-circuits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: !issues.iter().any(ValidationIssue::is_fatal),
            issues,
        }
    }

    pub fn fatal(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_fatal())
    }

    pub fn advisories(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_fatal())
    }

    /// Issues attached to one record, in check order.
    pub fn for_record(&self, index: usize) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(move |i| i.record_index == Some(index))
    }
}
