use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::text_hash;

/// Leading letter of every block id.
pub const ID_PREFIX: char = 'b';

/// Zero-padded width of the ordinal part of a block id.
///
/// Ids sort lexicographically in document order up to 99,999 blocks.
pub const ID_WIDTH: usize = 5;

/// A stable identifier for a block.
///
/// Ordinals are assigned once, in document order, starting at 1. The textual
/// form is `b00001`; parsing is lenient about padding and case (`B12` is `b00012`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(u32);

impl BlockId {
    pub const fn from_ordinal(ordinal: u32) -> Self {
        Self(ordinal)
    }

    pub const fn ordinal(self) -> u32 {
        self.0
    }

    /// Parse a block reference, returning `None` when it is not a block id.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut chars = raw.chars();
        let first = chars.next()?;
        if !first.eq_ignore_ascii_case(&ID_PREFIX) {
            return None;
        }
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match digits.parse::<u32>() {
            Ok(0) | Err(_) => None,
            Ok(n) => Some(Self(n)),
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ID_PREFIX}{:0width$}", self.0, width = ID_WIDTH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid block id '{0}'")]
pub struct BlockIdError(pub String);

impl FromStr for BlockId {
    type Err = BlockIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| BlockIdError(s.to_string()))
    }
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Paragraph,
    TableCell,
}

/// Non-text content carried along with a block. Never an edit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attachment {
    Image,
    PageBreak,
    SectionBreak,
    NestedTable,
}

/// A single addressable unit of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Outline depth, headings only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    pub text: String,
    #[serde(default)]
    pub text_hash: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind, level: Option<u8>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id,
            kind,
            level: if kind == BlockKind::Heading { level } else { None },
            text_hash: text_hash(&text),
            text,
            attachments: Vec::new(),
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One navigation entry of the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub id: BlockId,
    pub level: u8,
    pub text: String,
}

/// Ordered, stably-identified projection of a document.
///
/// Blocks live in an arena keyed by ordinal, so iteration order is document
/// order and ids are never renumbered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockModel {
    fingerprint: String,
    blocks: BTreeMap<BlockId, Block>,
    outline: Vec<OutlineEntry>,
}

impl BlockModel {
    pub fn builder(fingerprint: impl Into<String>) -> BlockModelBuilder {
        BlockModelBuilder {
            fingerprint: fingerprint.into(),
            blocks: BTreeMap::new(),
            next: 1,
            pending: Vec::new(),
        }
    }

    /// Content fingerprint of the package this model was extracted from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// Look up a block from a textual reference such as `b00012` or `b12`.
    pub fn resolve(&self, raw: &str) -> Option<&Block> {
        BlockId::parse(raw).and_then(|id| self.blocks.get(&id))
    }

    /// Blocks in document order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Block> + ExactSizeIterator {
        self.blocks.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.keys().copied()
    }

    /// Heading navigation view. Derived at build time; never persisted on its own.
    pub fn outline(&self) -> &[OutlineEntry] {
        &self.outline
    }

    /// Total characters of current text over all blocks.
    pub fn text_len(&self) -> usize {
        self.blocks.values().map(Block::char_len).sum()
    }
}

impl Serialize for BlockModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            fingerprint: &'a str,
            blocks: Vec<&'a Block>,
            outline: &'a [OutlineEntry],
        }

        View {
            fingerprint: &self.fingerprint,
            blocks: self.blocks.values().collect(),
            outline: &self.outline,
        }
        .serialize(serializer)
    }
}

/// Assigns ordinals in push order and routes attachments to the nearest block.
#[derive(Debug)]
pub struct BlockModelBuilder {
    fingerprint: String,
    blocks: BTreeMap<BlockId, Block>,
    next: u32,
    pending: Vec<Attachment>,
}

impl BlockModelBuilder {
    pub fn push(&mut self, kind: BlockKind, level: Option<u8>, text: impl Into<String>) -> BlockId {
        let id = BlockId::from_ordinal(self.next);
        self.next += 1;

        let mut block = Block::new(id, kind, level, text);
        block.attachments.append(&mut self.pending);
        self.blocks.insert(id, block);
        id
    }

    /// Attach opaque content to the last block, or to the next one pushed if
    /// no block exists yet.
    pub fn attach(&mut self, attachment: Attachment) {
        match self.blocks.values_mut().next_back() {
            Some(last) => last.attachments.push(attachment),
            None => self.pending.push(attachment),
        }
    }

    pub fn finish(self) -> BlockModel {
        let outline = self
            .blocks
            .values()
            .filter(|b| b.kind == BlockKind::Heading)
            .map(|b| OutlineEntry {
                id: b.id,
                level: b.level.unwrap_or(1),
                text: b.text.clone(),
            })
            .collect();

        BlockModel {
            fingerprint: self.fingerprint,
            blocks: self.blocks,
            outline,
        }
    }
}
