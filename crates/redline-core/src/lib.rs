#![doc = r#"
⚠️ INTERNAL CRATE – NOT A STABLE API

This crate is an internal implementation detail of the redline engine.

Do NOT depend on this crate directly.
Use `redline-io` instead.
"#]

pub mod diff;
pub mod hash;
pub mod model;
