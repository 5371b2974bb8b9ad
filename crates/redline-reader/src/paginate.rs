//! Greedy pagination under a size budget.
//!
//! Sizes are estimated, not tokenized: `ceil(chars / 4)` plus a fixed
//! per-block overhead for the id, kind and hash that travel with each block.

use std::ops::Range;

use redline_core::model::{Block, BlockModel};

use crate::schema::{Page, Stats};

/// Characters per estimated unit.
pub const CHARS_PER_UNIT: usize = 4;

/// Fixed estimate added per block.
pub const BLOCK_OVERHEAD: usize = 8;

pub const DEFAULT_PAGE_BUDGET: usize = 25_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub page_budget: usize,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            page_budget: DEFAULT_PAGE_BUDGET,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("page {index} is out of range (document has {pages} page(s))")]
    PageOutOfRange { index: usize, pages: usize },
}

pub fn estimate(block: &Block) -> usize {
    block.char_len().div_ceil(CHARS_PER_UNIT) + BLOCK_OVERHEAD
}

/// Block index ranges for each page. Always at least one (possibly empty) page.
pub fn paginate(model: &BlockModel, opts: PageOptions) -> Vec<Range<usize>> {
    let mut pages = Vec::new();
    let mut start = 0;
    let mut used = 0;

    for (i, block) in model.iter().enumerate() {
        let size = estimate(block);
        if i > start && used + size > opts.page_budget {
            pages.push(start..i);
            start = i;
            used = 0;
        }
        used += size;
    }
    pages.push(start..model.len());
    pages
}

pub fn stats(model: &BlockModel, opts: PageOptions) -> Stats {
    Stats {
        block_count: model.len(),
        estimated_size: model.iter().map(estimate).sum(),
        recommended_page_count: paginate(model, opts).len(),
    }
}

pub fn page(model: &BlockModel, index: usize, opts: PageOptions) -> Result<Page<'_>, PageError> {
    let ranges = paginate(model, opts);
    let pages = ranges.len();
    let range = ranges
        .get(index)
        .cloned()
        .ok_or(PageError::PageOutOfRange { index, pages })?;

    tracing::debug!(page = index, pages, blocks = range.len(), "serving page");
    Ok(Page {
        page: index,
        pages,
        blocks: model.iter().skip(range.start).take(range.len()).collect(),
        outline: model.outline(),
        has_more: index + 1 < pages,
    })
}
