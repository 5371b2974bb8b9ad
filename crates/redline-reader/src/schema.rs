use serde::Serialize;

use redline_core::model::{Block, OutlineEntry};

/// Size summary of a block model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub block_count: usize,
    /// Sum of per-block size estimates, in token-like units.
    pub estimated_size: usize,
    /// Number of pages [`crate::page`] serves under the same options.
    pub recommended_page_count: usize,
}

/// One page of blocks plus the full outline.
#[derive(Debug, Clone, Serialize)]
pub struct Page<'a> {
    pub page: usize,
    pub pages: usize,
    pub blocks: Vec<&'a Block>,
    pub outline: &'a [OutlineEntry],
    pub has_more: bool,
}
