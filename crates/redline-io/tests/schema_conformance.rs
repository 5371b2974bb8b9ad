use anyhow::Result;
use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde_json::{Value, json};

use redline_io::prelude::*;
use redline_io::version::{EDIT_BATCH_SCHEMA, EDIT_BATCH_V};

static BATCH_SCHEMA: Lazy<Result<Validator, String>> = Lazy::new(|| {
    let schema_json: Value = serde_json::from_str(EDIT_BATCH_SCHEMA)
        .map_err(|e| format!("invalid edit-batch schema JSON: {e}"))?;

    Validator::new(&schema_json).map_err(|e| format!("compile edit-batch schema: {e}"))
});

fn batch_schema() -> &'static Validator {
    BATCH_SCHEMA.as_ref().unwrap()
}

fn errors(instance: &Value) -> Vec<String> {
    batch_schema().iter_errors(instance).map(|e| e.to_string()).collect()
}

fn assert_valid(instance: &Value) {
    let msgs = errors(instance);
    assert!(msgs.is_empty(), "schema validation failed:\n{}", msgs.join("\n"));
}

#[test]
fn current_wire_types_conform_to_the_schema() -> Result<()> {
    let batch = EditBatch::new("reviewer-a")
        .with_fingerprint("ab".repeat(32))
        .with_edit(EditRecord::replace("b00003", "New text.").with_diff(false))
        .with_edit(EditRecord::delete("b00004").with_note("duplicate"))
        .with_edit(EditRecord::insert("b00004", "Inserted."))
        .with_edit(EditRecord::comment("b00001", "Check."));
    assert_eq!(batch.v, EDIT_BATCH_V);

    assert_valid(&serde_json::to_value(&batch)?);
    Ok(())
}

#[test]
fn input_aliases_conform_to_the_schema() {
    assert_valid(&json!({
        "v": 1,
        "edits": [
            {"op": "insert", "afterId": "b2", "text": "x"},
            {"op": "comment", "targetId": "b2", "text": "y"}
        ]
    }));
    // Unknown versions are the validator's call, not the schema's.
    assert_valid(&json!({"v": 300}));
}

#[test]
fn schema_rejects_malformed_batches() {
    assert!(!errors(&json!({"edits": []})).is_empty(), "v is required");
    assert!(!errors(&json!({"v": 1, "extra": true})).is_empty());
    assert!(!errors(&json!({"v": -1})).is_empty());
    assert!(!errors(&json!({"v": 1, "edits": [{"op": "rewrite", "block_id": "b1"}]})).is_empty());
    assert!(!errors(&json!({"v": 1, "edits": [{"op": "delete"}]})).is_empty());
    assert!(!errors(&json!({"v": 1, "edits": [{"op": "delete", "block_id": "b1", "before": "x"}]})).is_empty());
}

#[test]
fn schema_and_deserializer_agree_on_unknown_fields() {
    let instance = json!({"v": 1, "edits": [{"op": "delete", "block_id": "b1", "before": "x"}]});
    assert!(!errors(&instance).is_empty());
    assert!(serde_json::from_value::<EditBatch>(instance).is_err());
}
