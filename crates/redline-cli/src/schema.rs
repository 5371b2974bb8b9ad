//! Edit batch JSON Schema gate, applied before deserialization.

use anyhow::{Result, anyhow, bail};
use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde_json::Value;

use redline_io::version::EDIT_BATCH_SCHEMA;

static BATCH_SCHEMA: Lazy<Result<Validator, String>> = Lazy::new(|| {
    let schema_json: Value = serde_json::from_str(EDIT_BATCH_SCHEMA)
        .map_err(|e| format!("invalid edit-batch schema JSON: {e}"))?;

    Validator::new(&schema_json).map_err(|e| format!("compile edit-batch schema: {e}"))
});

/// Fail with every schema violation, one per line.
pub fn check_batch(instance: &Value) -> Result<()> {
    let schema = BATCH_SCHEMA.as_ref().map_err(|e| anyhow!("{e}"))?;
    let msgs: Vec<String> = schema
        .iter_errors(instance)
        .map(|e| format!("- {e}"))
        .collect();
    if !msgs.is_empty() {
        bail!("edit batch does not match schema v1:\n{}", msgs.join("\n"));
    }
    Ok(())
}
