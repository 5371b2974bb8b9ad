use std::fmt;
use std::str::FromStr;

use redline_core::model::BlockId;
use serde::{Deserialize, Serialize};

/// The only edit batch version this engine reads and writes.
pub const BATCH_VERSION: u32 = 1;

/// An ordered set of edits from one authoring source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBatch {
    /// Schema version. Producers must always populate it.
    pub v: u32,
    #[serde(default)]
    pub source: String,
    /// Optional binding to a block model fingerprint.
    ///
    /// When present, validators reject the batch if the model's fingerprint
    /// differs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub edits: Vec<EditRecord>,
}

impl EditBatch {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            v: BATCH_VERSION,
            source: source.into(),
            fingerprint: None,
            edits: Vec::new(),
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn with_edit(mut self, record: EditRecord) -> Self {
        self.edits.push(record);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Replace,
    Delete,
    Insert,
    Comment,
}

/// Which operations compete for the same block when batches are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    /// `replace` and `delete`: they change the block's text.
    Content,
    Comment,
    Insert,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Replace,
        Operation::Delete,
        Operation::Insert,
        Operation::Comment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Replace => "replace",
            Operation::Delete => "delete",
            Operation::Insert => "insert",
            Operation::Comment => "comment",
        }
    }

    pub fn class(self) -> OperationClass {
        match self {
            Operation::Replace | Operation::Delete => OperationClass::Content,
            Operation::Comment => OperationClass::Comment,
            Operation::Insert => OperationClass::Insert,
        }
    }

    /// Whether the operation carries a text payload.
    pub fn takes_text(self) -> bool {
        !matches!(self, Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown operation '{s}'"))
    }
}

/// A single declared edit.
///
/// Field naming:
/// - Canonical JSON field is `block_id`.
/// - `blockId`, `targetId` and `afterId` are accepted on input.
/// - For `insert`, `block_id` is the anchor the new block follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditRecord {
    pub op: Operation,

    #[serde(
        rename = "block_id",
        alias = "blockId",
        alias = "targetId",
        alias = "afterId"
    )]
    pub block_id: String,

    /// New text (replace), inserted text (insert) or comment body (comment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Word-level diff rendering, replace only. Absent means `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<bool>,

    /// Author rationale; never written into the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EditRecord {
    fn new(op: Operation, block_id: impl Into<String>, text: Option<String>) -> Self {
        Self {
            op,
            block_id: block_id.into(),
            text,
            diff: None,
            note: None,
        }
    }

    pub fn replace(block_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Operation::Replace, block_id, Some(text.into()))
    }

    pub fn delete(block_id: impl Into<String>) -> Self {
        Self::new(Operation::Delete, block_id, None)
    }

    pub fn insert(after: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Operation::Insert, after, Some(text.into()))
    }

    pub fn comment(block_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Operation::Comment, block_id, Some(text.into()))
    }

    pub fn with_diff(mut self, diff: bool) -> Self {
        self.diff = Some(diff);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn diff_mode(&self) -> bool {
        self.diff.unwrap_or(true)
    }

    /// Block reference in canonical form when it parses as a block id,
    /// otherwise trimmed as written.
    pub fn target_key(&self) -> String {
        normalize_ref(&self.block_id)
    }
}

pub fn normalize_ref(raw: &str) -> String {
    match BlockId::parse(raw) {
        Some(id) => id.to_string(),
        None => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_aliases_are_accepted() {
        for key in ["block_id", "blockId", "targetId", "afterId"] {
            let json = format!(r#"{{"op":"insert","{key}":"b7","text":"x"}}"#);
            let rec: EditRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(rec.block_id, "b7");
            assert_eq!(rec.target_key(), "b00007");
        }
    }

    #[test]
    fn canonical_json_omits_absent_fields() {
        let rec = EditRecord::delete("b00002");
        assert_eq!(
            serde_json::to_string(&rec).unwrap(),
            r#"{"op":"delete","block_id":"b00002"}"#
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let json = r#"{"op":"delete","block_id":"b1","before":"x"}"#;
        assert!(serde_json::from_str::<EditRecord>(json).is_err());
    }

    #[test]
    fn version_is_required() {
        assert!(serde_json::from_str::<EditBatch>(r#"{"edits":[]}"#).is_err());
        let batch: EditBatch = serde_json::from_str(r#"{"v":1}"#).unwrap();
        assert_eq!(batch, EditBatch::new(""));
    }

    #[test]
    fn operations_parse_case_insensitively() {
        assert_eq!("Replace".parse::<Operation>(), Ok(Operation::Replace));
        assert!("rewrite".parse::<Operation>().is_err());
        assert_eq!(Operation::Delete.class(), Operation::Replace.class());
    }
}
