//! Word-level difference between two block texts.
//!
//! Tokens are maximal runs of whitespace or non-whitespace, so concatenating
//! them reproduces the input exactly. Alignment is a plain LCS table over the
//! tokens that remain after trimming the common prefix and suffix. The table
//! is capped at [`MAX_ALIGNMENT_CELLS`]; past that the middle is one deletion
//! and one insertion.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Largest LCS table (token pairs) aligned word by word, about 16 MB.
pub const MAX_ALIGNMENT_CELLS: usize = 4_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DiffSpan {
    /// Unchanged text, spelled as in the old text.
    Equal(String),
    Delete(String),
    Insert(String),
}

impl DiffSpan {
    pub fn text(&self) -> &str {
        match self {
            DiffSpan::Equal(s) | DiffSpan::Delete(s) | DiffSpan::Insert(s) => s,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, DiffSpan::Equal(_))
    }
}

/// Split text into alternating whitespace / non-whitespace tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0usize;
    let mut prev_ws: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let ws = c.is_whitespace();
        if prev_ws.is_some_and(|p| p != ws) {
            tokens.push(&text[start..i]);
            start = i;
        }
        prev_ws = Some(ws);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Equal,
    Delete,
    Insert,
    /// Unchanged whitespace folded into a surrounding change.
    Gap,
}

/// Compute the word-level difference from `old` to `new`.
///
/// Guarantees:
/// - `Equal` + `Delete` spans concatenate to `old`
/// - `Equal` + `Insert` spans concatenate to `new` (up to NFC normalization of
///   unchanged words, which keep the old spelling)
/// - adjacent spans never share a kind; inside a change run deletions precede insertions
pub fn word_diff(old: &str, new: &str) -> Vec<DiffSpan> {
    diff_within(old, new, MAX_ALIGNMENT_CELLS).0
}

/// Like [`word_diff`], but `None` when the untrimmed middle needs an alignment
/// table larger than `max_cells`.
pub fn word_diff_bounded(old: &str, new: &str, max_cells: usize) -> Option<Vec<DiffSpan>> {
    let (spans, aligned) = diff_within(old, new, max_cells);
    aligned.then_some(spans)
}

fn diff_within(old: &str, new: &str, max_cells: usize) -> (Vec<DiffSpan>, bool) {
    let a = tokenize(old);
    let b = tokenize(new);
    let ka: Vec<String> = a.iter().map(|t| t.nfc().collect()).collect();
    let kb: Vec<String> = b.iter().map(|t| t.nfc().collect()).collect();

    let n = a.len();
    let m = b.len();

    let mut prefix = 0usize;
    while prefix < n && prefix < m && ka[prefix] == kb[prefix] {
        prefix += 1;
    }
    let mut suffix = 0usize;
    while suffix < n - prefix
        && suffix < m - prefix
        && ka[n - 1 - suffix] == kb[m - 1 - suffix]
    {
        suffix += 1;
    }

    let mut steps: Vec<(Step, &str)> = Vec::with_capacity(n.max(m));
    steps.extend(a[..prefix].iter().map(|t| (Step::Equal, *t)));

    let (a_mid, b_mid) = (&a[prefix..n - suffix], &b[prefix..m - suffix]);
    let (ka_mid, kb_mid) = (&ka[prefix..n - suffix], &kb[prefix..m - suffix]);
    let cells = (a_mid.len() + 1).saturating_mul(b_mid.len() + 1);
    let aligned = cells <= max_cells;
    if aligned {
        for (step, idx) in lcs_steps(ka_mid, kb_mid) {
            let token = match step {
                Step::Insert => b_mid[idx],
                _ => a_mid[idx],
            };
            steps.push((step, token));
        }
    } else {
        steps.extend(a_mid.iter().map(|t| (Step::Delete, *t)));
        steps.extend(b_mid.iter().map(|t| (Step::Insert, *t)));
    }

    steps.extend(a[n - suffix..].iter().map(|t| (Step::Equal, *t)));

    fold_whitespace_gaps(&mut steps);
    (coalesce(&steps), aligned)
}

/// LCS walk over the middle section. Ties prefer deletion so output is stable.
///
/// Returns steps with the index into `a` (equal/delete) or `b` (insert).
fn lcs_steps(a: &[String], b: &[String]) -> Vec<(Step, usize)> {
    let n = a.len();
    let m = b.len();
    let width = m + 1;

    // dp[i][j] = LCS length of a[i..] and b[j..]
    let mut dp = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            dp[i * width + j] = if a[i] == b[j] {
                1 + dp[(i + 1) * width + j + 1]
            } else {
                dp[(i + 1) * width + j].max(dp[i * width + j + 1])
            };
        }
    }

    let mut out = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0usize, 0usize);
    while i < n && j < m {
        if a[i] == b[j] {
            out.push((Step::Equal, i));
            i += 1;
            j += 1;
        } else if dp[(i + 1) * width + j] >= dp[i * width + j + 1] {
            out.push((Step::Delete, i));
            i += 1;
        } else {
            out.push((Step::Insert, j));
            j += 1;
        }
    }
    out.extend((i..n).map(|i| (Step::Delete, i)));
    out.extend((j..m).map(|j| (Step::Insert, j)));
    out
}

/// Whitespace-only equal tokens sandwiched between changes become part of the
/// change on both sides.
fn fold_whitespace_gaps(steps: &mut [(Step, &str)]) {
    for k in 1..steps.len().saturating_sub(1) {
        let (step, token) = steps[k];
        if step == Step::Equal
            && token.chars().all(char::is_whitespace)
            && steps[k - 1].0 != Step::Equal
            && steps[k + 1].0 != Step::Equal
        {
            steps[k].0 = Step::Gap;
        }
    }
}

fn coalesce(steps: &[(Step, &str)]) -> Vec<DiffSpan> {
    let mut out = Vec::new();
    let mut k = 0usize;

    while k < steps.len() {
        if steps[k].0 == Step::Equal {
            let mut text = String::new();
            while k < steps.len() && steps[k].0 == Step::Equal {
                text.push_str(steps[k].1);
                k += 1;
            }
            out.push(DiffSpan::Equal(text));
            continue;
        }

        let mut deleted = String::new();
        let mut inserted = String::new();
        while k < steps.len() && steps[k].0 != Step::Equal {
            let (step, token) = steps[k];
            match step {
                Step::Delete => deleted.push_str(token),
                Step::Insert => inserted.push_str(token),
                Step::Gap => {
                    deleted.push_str(token);
                    inserted.push_str(token);
                }
                Step::Equal => {}
            }
            k += 1;
        }
        if !deleted.is_empty() {
            out.push(DiffSpan::Delete(deleted));
        }
        if !inserted.is_empty() {
            out.push(DiffSpan::Insert(inserted));
        }
    }

    out
}

/// Concatenation of the old-side spans.
pub fn old_text(spans: &[DiffSpan]) -> String {
    spans
        .iter()
        .filter(|s| !matches!(s, DiffSpan::Insert(_)))
        .map(DiffSpan::text)
        .collect()
}

/// Concatenation of the new-side spans.
pub fn new_text(spans: &[DiffSpan]) -> String {
    spans
        .iter()
        .filter(|s| !matches!(s, DiffSpan::Delete(_)))
        .map(DiffSpan::text)
        .collect()
}

pub fn has_changes(spans: &[DiffSpan]) -> bool {
    spans.iter().any(DiffSpan::is_change)
}
