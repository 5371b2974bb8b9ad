#![doc = r#"
⚠️ INTERNAL CRATE – NOT A STABLE API

Block-model views for readers: size stats and budgeted pages.

Do NOT depend on this crate directly.
Use `redline-io` instead.
"#]

pub mod paginate;
pub mod schema;
pub mod serialize;

pub use paginate::{PageError, PageOptions, page, paginate, stats};
pub use schema::{Page, Stats};
