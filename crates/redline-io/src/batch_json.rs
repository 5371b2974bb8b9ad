//! Parsing edit batch JSON with actionable diagnostics.
//!
//! serde's "missing field `v`" is correct but says nothing about why the
//! field matters. Batches written by hand or by generators most often forget
//! the version, so it gets a dedicated message. Strictness is unchanged.

use std::fmt;

use redline_patch::EditBatch;
use serde::de::Error as _;
use serde_json::Value;

const REQUIRED_TOP_LEVEL_FIELDS: &[&str] = &["v"];

#[derive(Debug)]
pub enum BatchJsonError {
    /// Not JSON at all.
    InvalidJson(serde_json::Error),
    MissingRequiredTopLevelFields { missing: Vec<&'static str> },
    /// JSON, but not shaped like an edit batch (unknown op, unknown field, ...).
    InvalidBatchShape(serde_json::Error),
}

impl fmt::Display for BatchJsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchJsonError::InvalidJson(e) => write!(f, "invalid JSON: {e}"),
            BatchJsonError::MissingRequiredTopLevelFields { missing } => write!(
                f,
                "invalid edit batch: missing required top-level field(s): {}. \
                 Producers must always populate the batch version (\"v\": {}).",
                missing.join(", "),
                redline_patch::BATCH_VERSION
            ),
            BatchJsonError::InvalidBatchShape(e) => write!(f, "invalid edit batch: {e}"),
        }
    }
}

impl std::error::Error for BatchJsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchJsonError::InvalidJson(e) | BatchJsonError::InvalidBatchShape(e) => Some(e),
            BatchJsonError::MissingRequiredTopLevelFields { .. } => None,
        }
    }
}

pub fn parse_batch_json_str(s: &str) -> Result<EditBatch, BatchJsonError> {
    let v: Value = serde_json::from_str(s).map_err(BatchJsonError::InvalidJson)?;
    parse_batch_json_value(v)
}

pub fn parse_batch_json_value(v: Value) -> Result<EditBatch, BatchJsonError> {
    let obj = v.as_object().ok_or_else(|| {
        BatchJsonError::InvalidBatchShape(serde_json::Error::custom("expected a JSON object"))
    })?;

    let missing: Vec<&'static str> = REQUIRED_TOP_LEVEL_FIELDS
        .iter()
        .copied()
        .filter(|k| !obj.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        return Err(BatchJsonError::MissingRequiredTopLevelFields { missing });
    }

    serde_json::from_value(v).map_err(BatchJsonError::InvalidBatchShape)
}
