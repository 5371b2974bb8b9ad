use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::{BATCH_VERSION, EditBatch, EditRecord, Operation, OperationClass};

/// How competing content edits from different sources are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Any conflict fails the merge.
    #[default]
    Error,
    /// The earliest source wins.
    First,
    /// The latest source wins.
    Last,
    /// Comments are concatenated; content conflicts resolve like `First`
    /// but keep every source's note.
    Combine,
}

impl MergePolicy {
    pub const ALL: [MergePolicy; 4] = [
        MergePolicy::Error,
        MergePolicy::First,
        MergePolicy::Last,
        MergePolicy::Combine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MergePolicy::Error => "error",
            MergePolicy::First => "first",
            MergePolicy::Last => "last",
            MergePolicy::Combine => "combine",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown merge policy '{s}' (expected error, first, last or combine)"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedRecord {
    pub source: String,
    pub record: EditRecord,
}

/// Competing content edits on one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConflict {
    pub block_id: String,
    /// Source whose records survived; `None` under the `error` policy.
    pub kept: Option<String>,
    pub records: Vec<SourcedRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub merged: Option<EditBatch>,
    pub conflicts: Vec<MergeConflict>,
}

impl MergeOutcome {
    /// True when conflicts prevented a merged batch.
    pub fn is_fatal(&self) -> bool {
        self.merged.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("nothing to merge")]
    Empty,
    #[error("batches are bound to different documents ('{first}' vs '{other}')")]
    FingerprintMismatch { first: String, other: String },
    #[error("batch {batch} has unsupported version {v}")]
    UnsupportedVersion { batch: usize, v: u32 },
}

pub const NOTE_SEPARATOR: &str = "; ";
pub const COMMENT_SEPARATOR: &str = "\n\n";

/// One record of the flattened input, in source order then record order.
struct Entry<'a> {
    batch: usize,
    record: &'a EditRecord,
    key: String,
}

/// Combine independently authored batches into one.
///
/// Pure: the output depends only on the batch order, their contents and the
/// policy. Records that do not compete are always kept from every source.
pub fn merge(batches: &[EditBatch], policy: MergePolicy) -> Result<MergeOutcome, MergeError> {
    if batches.is_empty() {
        return Err(MergeError::Empty);
    }
    if let Some((batch, b)) = batches.iter().enumerate().find(|(_, b)| b.v != BATCH_VERSION) {
        return Err(MergeError::UnsupportedVersion { batch, v: b.v });
    }
    let fingerprint = common_fingerprint(batches)?;

    let sources: Vec<String> = batches
        .iter()
        .enumerate()
        .map(|(i, b)| match b.source.trim() {
            "" => format!("batch{}", i + 1),
            s => s.to_string(),
        })
        .collect();

    let entries: Vec<Entry<'_>> = batches
        .iter()
        .enumerate()
        .flat_map(|(batch, b)| {
            b.edits.iter().map(move |record| Entry {
                batch,
                record,
                key: record.target_key(),
            })
        })
        .collect();

    let content = groups(&entries, OperationClass::Content);
    let mut dropped: BTreeSet<usize> = BTreeSet::new();
    let mut notes: BTreeMap<usize, String> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for (key, members) in &content {
        let distinct: BTreeSet<usize> = members.iter().map(|&i| entries[i].batch).collect();
        if distinct.len() < 2 {
            continue;
        }
        let winner = match policy {
            MergePolicy::Last => distinct.last().copied(),
            MergePolicy::Error => None,
            _ => distinct.first().copied(),
        };
        let records = members
            .iter()
            .map(|&i| SourcedRecord {
                source: sources[entries[i].batch].clone(),
                record: entries[i].record.clone(),
            })
            .collect();
        tracing::debug!(block = %key, policy = %policy, "merge conflict");
        conflicts.push(MergeConflict {
            block_id: key.clone(),
            kept: winner.map(|w| sources[w].clone()),
            records,
        });

        let Some(winner) = winner else {
            continue;
        };
        dropped.extend(members.iter().copied().filter(|&i| entries[i].batch != winner));
        if policy == MergePolicy::Combine {
            let joined = join_notes(members.iter().map(|&i| entries[i].record), NOTE_SEPARATOR);
            let first_kept = members.iter().copied().find(|&i| entries[i].batch == winner);
            if let (Some(first), Some(joined)) = (first_kept, joined) {
                notes.insert(first, joined);
            }
        }
    }

    if policy == MergePolicy::Error && !conflicts.is_empty() {
        tracing::warn!(conflicts = conflicts.len(), "merge failed on conflicts");
        return Ok(MergeOutcome {
            merged: None,
            conflicts,
        });
    }

    let mut combined: BTreeMap<usize, EditRecord> = BTreeMap::new();
    if policy == MergePolicy::Combine {
        for members in groups(&entries, OperationClass::Comment).values() {
            let distinct: BTreeSet<usize> = members.iter().map(|&i| entries[i].batch).collect();
            let [first, rest @ ..] = members.as_slice() else {
                continue;
            };
            if distinct.len() < 2 {
                continue;
            }
            combined.insert(*first, combine_comments(members.iter().map(|&i| entries[i].record)));
            dropped.extend(rest.iter().copied());
        }
    }

    let mut edits = Vec::with_capacity(entries.len() - dropped.len());
    for (i, entry) in entries.iter().enumerate() {
        if dropped.contains(&i) {
            continue;
        }
        let mut record = combined
            .remove(&i)
            .unwrap_or_else(|| entry.record.clone());
        if let Some(note) = notes.remove(&i) {
            record.note = Some(note);
        }
        edits.push(record);
    }

    let merged = EditBatch {
        v: BATCH_VERSION,
        source: sources.join("+"),
        fingerprint,
        edits,
    };
    tracing::info!(
        batches = batches.len(),
        records = merged.edits.len(),
        conflicts = conflicts.len(),
        policy = %policy,
        "merged edit batches"
    );
    Ok(MergeOutcome {
        merged: Some(merged),
        conflicts,
    })
}

fn common_fingerprint(batches: &[EditBatch]) -> Result<Option<String>, MergeError> {
    let mut seen: Option<&str> = None;
    for fp in batches.iter().filter_map(|b| b.fingerprint.as_deref()) {
        let fp = fp.trim();
        match seen {
            None => seen = Some(fp),
            Some(first) if !first.eq_ignore_ascii_case(fp) => {
                return Err(MergeError::FingerprintMismatch {
                    first: first.to_string(),
                    other: fp.to_string(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(seen.map(str::to_string))
}

/// Entry indices per target block for one operation class, keyed in block order.
fn groups(entries: &[Entry<'_>], class: OperationClass) -> BTreeMap<String, Vec<usize>> {
    let mut out: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, entry) in entries.iter().enumerate() {
        if entry.record.op.class() == class {
            out.entry(entry.key.clone()).or_default().push(i);
        }
    }
    out
}

fn join_notes<'a>(records: impl Iterator<Item = &'a EditRecord>, sep: &str) -> Option<String> {
    let notes: Vec<&str> = records
        .filter_map(|r| r.note.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();
    (!notes.is_empty()).then(|| notes.join(sep))
}

fn combine_comments<'a>(records: impl Iterator<Item = &'a EditRecord> + Clone) -> EditRecord {
    let text: Vec<&str> = records
        .clone()
        .filter_map(|r| r.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    let first = records.clone().next();
    EditRecord {
        op: Operation::Comment,
        block_id: first.map(|r| r.block_id.clone()).unwrap_or_default(),
        text: Some(text.join(COMMENT_SEPARATOR)),
        diff: None,
        note: join_notes(records, COMMENT_SEPARATOR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(source: &str, edits: Vec<EditRecord>) -> EditBatch {
        EditBatch {
            edits,
            ..EditBatch::new(source)
        }
    }

    #[test]
    fn policy_parses_and_displays() {
        assert_eq!("Combine".parse::<MergePolicy>(), Ok(MergePolicy::Combine));
        assert!("newest".parse::<MergePolicy>().is_err());
        assert_eq!(MergePolicy::default().to_string(), "error");
    }

    #[test]
    fn same_source_duplicates_are_not_merge_conflicts() {
        let a = batch(
            "a",
            vec![EditRecord::replace("b1", "x"), EditRecord::delete("b00001")],
        );
        let out = merge(&[a], MergePolicy::Error).unwrap();
        assert!(out.conflicts.is_empty());
        assert_eq!(out.merged.unwrap().edits.len(), 2);
    }

    #[test]
    fn references_are_compared_canonically() {
        let a = batch("a", vec![EditRecord::replace("b1", "x")]);
        let b = batch("b", vec![EditRecord::delete("B00001")]);
        let out = merge(&[a, b], MergePolicy::Error).unwrap();
        assert!(out.is_fatal());
        assert_eq!(out.conflicts[0].block_id, "b00001");
        assert_eq!(out.conflicts[0].kept, None);
    }

    #[test]
    fn blank_sources_get_placeholders() {
        let out = merge(&[batch("", vec![]), batch(" ", vec![])], MergePolicy::First).unwrap();
        assert_eq!(out.merged.unwrap().source, "batch1+batch2");
    }

    #[test]
    fn version_and_fingerprint_are_checked() {
        let mut old = batch("a", vec![]);
        old.v = 0;
        assert_eq!(
            merge(&[batch("b", vec![]), old], MergePolicy::First),
            Err(MergeError::UnsupportedVersion { batch: 1, v: 0 })
        );

        let x = batch("a", vec![]).with_fingerprint("aa");
        let y = batch("b", vec![]);
        let z = batch("c", vec![]).with_fingerprint("bb");
        assert!(matches!(
            merge(&[x.clone(), y.clone(), z], MergePolicy::First),
            Err(MergeError::FingerprintMismatch { .. })
        ));
        let out = merge(&[x, y], MergePolicy::First).unwrap();
        assert_eq!(out.merged.unwrap().fingerprint.as_deref(), Some("aa"));

        assert_eq!(merge(&[], MergePolicy::First), Err(MergeError::Empty));
    }
}
