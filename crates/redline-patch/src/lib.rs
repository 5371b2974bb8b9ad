#![doc = r#"
⚠️ INTERNAL CRATE – NOT A STABLE API

Edit batches: schema, authoring syntax, validation, application and merging.

Do NOT depend on this crate directly.
Use `redline-io` instead.
"#]

pub mod apply;
pub mod checks;
pub mod diagnostics;
pub mod markdown;
pub mod merge;
pub mod schema;
pub mod validate;

pub use apply::{ApplyError, ApplyOptions, ApplyResult, apply};
pub use checks::{AdvisoryCheck, CheckSet};
pub use diagnostics::{IssueCode, Severity, ValidationIssue, ValidationReport};
pub use markdown::{ParseError, Parsed, parse_markdown, to_markdown};
pub use merge::{MergeConflict, MergeError, MergeOutcome, MergePolicy, merge};
pub use schema::{BATCH_VERSION, EditBatch, EditRecord, Operation, OperationClass};
pub use validate::{ValidateOptions, validate};
