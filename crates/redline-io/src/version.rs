//! Format versions, for conformance checks and CI gating.

/// Edit batch wire format version (the `v` field).
pub const EDIT_BATCH_V: u32 = redline_patch::BATCH_VERSION;

/// Version of the JSON Schema bundle under `schemas/`.
///
/// Bump this if the schema constraints change, even if `v` stays the same.
pub const SCHEMA_BUNDLE_V: u8 = 1;

/// Embedded JSON Schema for edit batches.
pub const EDIT_BATCH_SCHEMA: &str = include_str!("../schemas/edit-batch.v1.schema.json");

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
