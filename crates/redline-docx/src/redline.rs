//! Revision and comment markup.
//!
//! A [`Redliner`] borrows a [`DocxDocument`] and renders one block-level change
//! at a time. Changes inside a block happen immediately; structural changes
//! (new paragraphs, removed paragraphs) are queued and materialized by
//! [`Redliner::finish`] in reverse document order, so every anchor resolves
//! against the tree as it was extracted.

use std::collections::{BTreeMap, BTreeSet};

use redline_core::diff::{DiffSpan, MAX_ALIGNMENT_CELLS, has_changes, word_diff_bounded};
use redline_core::model::{BlockId, BlockKind};

use crate::document::DocxDocument;
use crate::error::{PackageError, RenderError};
use crate::extract::visible_text;
use crate::names;
use crate::xml::{XmlDocument, XmlElement, XmlNode};

/// Warning recorded when diff rendering is not possible for a block.
pub const DIFF_FALLBACK_WARNING: &str = "diff fallback: complex block structure";
pub const DIFF_TOO_LARGE_WARNING: &str = "diff fallback: block too large to align";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedlineOptions {
    /// Emit `w:ins` / `w:del` markup. When false, edits are written directly.
    pub track_changes: bool,
    /// Revision author as shown by the word processor.
    pub author: String,
    pub initials: String,
    /// RFC 3339 timestamp attached to every revision and comment.
    pub date: String,
}

impl RedlineOptions {
    pub fn new(author_name: &str, author_email: Option<&str>, date: Option<String>) -> Self {
        let author = match author_email.filter(|e| !e.trim().is_empty()) {
            Some(email) => format!("{author_name} <{}>", email.trim()),
            None => author_name.to_string(),
        };
        Self {
            track_changes: true,
            initials: initials(author_name),
            author,
            date: date.unwrap_or_else(now_rfc3339),
        }
    }
}

impl Default for RedlineOptions {
    fn default() -> Self {
        Self::new("Redline", None, None)
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Delete everything, insert the new text.
    Whole,
    /// Mark only the differing word spans.
    Diff,
}

/// Hands out revision ids and stamps author/date.
#[derive(Debug)]
struct Stamper {
    next_id: u64,
    author: String,
    date: String,
}

impl Stamper {
    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn mark(&mut self, name: &str) -> XmlElement {
        let id = self.next();
        XmlElement::new(name)
            .with_attr(names::A_ID, id.to_string())
            .with_attr(names::A_AUTHOR, self.author.as_str())
            .with_attr(names::A_DATE, self.date.as_str())
    }
}

pub struct Redliner<'a> {
    doc: &'a mut DocxDocument,
    track: bool,
    initials: String,
    stamp: Stamper,
    comments: Vec<XmlElement>,
    inserts: BTreeMap<BlockId, Vec<XmlElement>>,
    removals: BTreeSet<BlockId>,
    dirty: bool,
}

impl<'a> Redliner<'a> {
    pub(crate) fn new(doc: &'a mut DocxDocument, opts: RedlineOptions) -> Self {
        let next_id = doc.max_markup_id() + 1;
        Self {
            doc,
            track: opts.track_changes,
            initials: opts.initials,
            stamp: Stamper {
                next_id,
                author: opts.author,
                date: opts.date,
            },
            comments: Vec::new(),
            inserts: BTreeMap::new(),
            removals: BTreeSet::new(),
            dirty: false,
        }
    }

    /// Mark the whole block deleted.
    pub fn delete_block(&mut self, id: BlockId) -> Result<(), RenderError> {
        let kind = self.doc.anchor_kind(id)?;
        self.dirty = true;

        if !self.track {
            match kind {
                BlockKind::TableCell => {
                    let tc = self.doc.block_element_mut(id)?;
                    for p in tc.elements_mut().filter(|e| e.is(names::P)) {
                        strip_text(p);
                    }
                }
                _ => {
                    // Paragraphs holding section properties or comment anchors stay.
                    let p = self.doc.block_element_mut(id)?;
                    let sect = p.child(names::PPR).and_then(|ppr| ppr.child(names::SECT_PR));
                    if sect.is_some() || !comment_ids_in(p).is_empty() {
                        strip_text(p);
                    } else {
                        self.removals.insert(id);
                    }
                }
            }
            return Ok(());
        }

        let el = self.doc.block_element_mut(id)?;
        match kind {
            BlockKind::TableCell => {
                for p in el.elements_mut().filter(|e| e.is(names::P)) {
                    wrap_deleted(p, &mut self.stamp);
                }
            }
            _ => {
                wrap_deleted(el, &mut self.stamp);
                let mark = self.stamp.mark(names::DEL);
                mark_paragraph(el, mark);
            }
        }
        Ok(())
    }

    /// Replace the block's text. Returns warnings (e.g. diff fallback).
    pub fn replace_block(
        &mut self,
        id: BlockId,
        new_text: &str,
        mode: ReplaceMode,
    ) -> Result<Vec<String>, RenderError> {
        let kind = self.doc.anchor_kind(id)?;
        let mut warnings = Vec::new();
        self.dirty = true;

        let el = self.doc.block_element_mut(id)?;
        let paragraph: &mut XmlElement = match kind {
            BlockKind::TableCell => {
                let count = el.elements().filter(|e| e.is(names::P)).count();
                if count != 1 {
                    if mode == ReplaceMode::Diff {
                        warnings.push(DIFF_FALLBACK_WARNING.to_string());
                    }
                    replace_cell_whole(el, new_text, self.track, &mut self.stamp);
                    return Ok(warnings);
                }
                el.elements_mut()
                    .find(|e| e.is(names::P))
                    .ok_or(RenderError::StaleAnchor)?
            }
            _ => el,
        };

        match mode {
            ReplaceMode::Whole => replace_whole(paragraph, new_text, self.track, &mut self.stamp),
            ReplaceMode::Diff => {
                let layout = Layout::of(paragraph);
                if !layout.simple {
                    warnings.push(DIFF_FALLBACK_WARNING.to_string());
                    replace_whole(paragraph, new_text, self.track, &mut self.stamp);
                } else {
                    match word_diff_bounded(&layout.text(), new_text, MAX_ALIGNMENT_CELLS) {
                        Some(spans) => {
                            if has_changes(&spans) {
                                rebuild_with_diff(paragraph, layout, &spans, self.track, &mut self.stamp);
                            }
                        }
                        None => {
                            tracing::warn!(block = %id, "block too large to align; replacing whole");
                            warnings.push(DIFF_TOO_LARGE_WARNING.to_string());
                            replace_whole(paragraph, new_text, self.track, &mut self.stamp);
                        }
                    }
                }
            }
        }
        Ok(warnings)
    }

    /// Anchor a comment around the whole block.
    pub fn comment_block(&mut self, id: BlockId, text: &str) -> Result<(), RenderError> {
        let kind = self.doc.anchor_kind(id)?;
        if self.removals.contains(&id) {
            return Err(RenderError::TargetRemoved);
        }
        let cid = self.stamp.next().to_string();
        self.dirty = true;

        let el = self.doc.block_element_mut(id)?;
        match kind {
            BlockKind::TableCell => {
                if !el.elements().any(|e| e.is(names::P)) {
                    el.children.push(XmlNode::Element(XmlElement::new(names::P)));
                }
                let mut paragraphs = el.elements_mut().filter(|e| e.is(names::P));
                // Checked non-empty above.
                if let Some(first) = paragraphs.next() {
                    match paragraphs.last() {
                        Some(last) => {
                            open_comment_range(first, &cid);
                            close_comment_range(last, &cid);
                        }
                        None => {
                            open_comment_range(first, &cid);
                            close_comment_range(first, &cid);
                        }
                    }
                }
            }
            _ => {
                open_comment_range(el, &cid);
                close_comment_range(el, &cid);
            }
        }

        let mut comment = XmlElement::new(names::COMMENT)
            .with_attr(names::A_ID, cid.as_str())
            .with_attr(names::A_AUTHOR, self.stamp.author.as_str())
            .with_attr(names::A_DATE, self.stamp.date.as_str())
            .with_attr(names::A_INITIALS, self.initials.as_str());
        for line in text.split('\n') {
            let line = line.trim_end_matches('\r');
            comment.children.push(XmlNode::Element(
                XmlElement::new(names::P).with_child(text_run(None, line, false)),
            ));
        }
        self.comments.push(comment);
        Ok(())
    }

    /// Queue a new block after `anchor`. Returns its placement-only id.
    pub fn insert_after(&mut self, anchor: BlockId, text: &str) -> Result<String, RenderError> {
        let kind = self.doc.anchor_kind(anchor)?;
        let el = self.doc.block_element(anchor)?;
        let template = match kind {
            BlockKind::TableCell => el.elements().filter(|e| e.is(names::P)).last(),
            _ => Some(el),
        };

        let mut ppr = template
            .and_then(|p| p.child(names::PPR))
            .cloned()
            .map(|ppr| clean_paragraph_properties(ppr, kind == BlockKind::Heading))
            .unwrap_or_else(|| XmlElement::new(names::PPR));
        let rpr = template
            .and_then(first_run_properties)
            .map(clean_run_properties);

        let mut p = XmlElement::new(names::P);
        let run = text_run(rpr.as_ref(), text, false);
        if self.track {
            let mark = self.stamp.mark(names::INS);
            mark_paragraph_properties(&mut ppr, mark);
            p.children.push(XmlNode::Element(ppr));
            let mut ins = self.stamp.mark(names::INS);
            ins.children.push(XmlNode::Element(run));
            p.children.push(XmlNode::Element(ins));
        } else {
            if !ppr.children.is_empty() {
                p.children.push(XmlNode::Element(ppr));
            }
            p.children.push(XmlNode::Element(run));
        }

        let queued = self.inserts.entry(anchor).or_default();
        queued.push(p);
        self.dirty = true;

        Ok(match queued.len() {
            1 => format!("{anchor}_ins"),
            n => format!("{anchor}_ins{n}"),
        })
    }

    /// Materialize queued structure, the comments part, and the main part.
    pub fn finish(self) -> Result<(), PackageError> {
        let Redliner {
            doc,
            comments,
            mut inserts,
            removals,
            dirty,
            ..
        } = self;

        if !dirty {
            return Ok(());
        }

        let touched: BTreeSet<BlockId> = inserts.keys().chain(removals.iter()).copied().collect();
        for id in touched.into_iter().rev() {
            let queued = inserts.remove(&id).unwrap_or_default();
            doc.restructure(id, queued, removals.contains(&id))?;
        }

        if !comments.is_empty() {
            doc.append_comments(comments)?;
        }
        doc.store_main_part();
        Ok(())
    }
}

/// Wrap every text-bearing run under `el` in its own `w:del`.
fn wrap_deleted(el: &mut XmlElement, stamp: &mut Stamper) {
    let children = std::mem::take(&mut el.children);
    for child in children {
        match child {
            XmlNode::Element(mut c) if c.is(names::R) => {
                if visible_text(&c).is_empty() {
                    el.children.push(XmlNode::Element(c));
                    continue;
                }
                to_deleted_run(&mut c);
                let mut del = stamp.mark(names::DEL);
                del.children.push(XmlNode::Element(c));
                el.children.push(XmlNode::Element(del));
            }
            XmlNode::Element(c)
                if c.is(names::DEL)
                    || c.is(names::MOVE_FROM)
                    || c.is(names::PPR)
                    || c.is(names::TBL)
                    || c.is(names::DRAWING)
                    || c.is(names::PICT) =>
            {
                el.children.push(XmlNode::Element(c));
            }
            XmlNode::Element(mut c) => {
                wrap_deleted(&mut c, stamp);
                el.children.push(XmlNode::Element(c));
            }
            other => el.children.push(other),
        }
    }
}

/// `w:t` becomes `w:delText`, `w:instrText` becomes `w:delInstrText`.
fn to_deleted_run(el: &mut XmlElement) {
    for child in el.elements_mut() {
        if child.is(names::T) {
            child.name = names::DEL_TEXT.to_string();
        } else if child.is(names::INSTR_TEXT) {
            child.name = names::DEL_INSTR_TEXT.to_string();
        } else {
            to_deleted_run(child);
        }
    }
}

/// Remove text-bearing content, keeping properties and opaque content.
fn strip_text(p: &mut XmlElement) {
    p.children.retain(|n| match n {
        XmlNode::Element(e) => e.is(names::PPR) || visible_text(e).is_empty(),
        _ => true,
    });
}

/// Put a revision mark on the paragraph mark (`w:pPr/w:rPr`).
fn mark_paragraph_properties(ppr: &mut XmlElement, mark: XmlElement) {
    match ppr.child_mut(names::RPR) {
        Some(rpr) => rpr.children.insert(0, XmlNode::Element(mark)),
        None => {
            // rPr precedes sectPr and pPrChange.
            let at = ppr
                .children
                .iter()
                .position(|n| {
                    matches!(n, XmlNode::Element(e) if e.is(names::SECT_PR) || e.is("w:pPrChange"))
                })
                .unwrap_or(ppr.children.len());
            ppr.children.insert(
                at,
                XmlNode::Element(XmlElement::new(names::RPR).with_child(mark)),
            );
        }
    }
}

/// Record a revision on the paragraph mark itself.
fn mark_paragraph(p: &mut XmlElement, mark: XmlElement) {
    if p.child(names::PPR).is_none() {
        p.children.insert(0, XmlNode::Element(XmlElement::new(names::PPR)));
    }
    if let Some(ppr) = p.child_mut(names::PPR) {
        mark_paragraph_properties(ppr, mark);
    }
}

/// A run carrying `text`; tabs and newlines become `w:tab` / `w:br`.
fn text_run(rpr: Option<&XmlElement>, text: &str, deleted: bool) -> XmlElement {
    let mut r = XmlElement::new(names::R);
    if let Some(rpr) = rpr {
        r.children.push(XmlNode::Element(rpr.clone()));
    }

    let text_name = if deleted { names::DEL_TEXT } else { names::T };
    let mut buf = String::new();
    let flush = |buf: &mut String, r: &mut XmlElement| {
        if !buf.is_empty() {
            r.children.push(XmlNode::Element(
                XmlElement::new(text_name)
                    .with_attr(names::XML_SPACE, "preserve")
                    .with_text(std::mem::take(buf)),
            ));
        }
    };
    for c in text.chars() {
        match c {
            '\t' => {
                flush(&mut buf, &mut r);
                r.children.push(XmlNode::Element(XmlElement::new(names::TAB)));
            }
            '\n' => {
                flush(&mut buf, &mut r);
                r.children.push(XmlNode::Element(XmlElement::new(names::BR)));
            }
            '\r' => {}
            _ => buf.push(c),
        }
    }
    flush(&mut buf, &mut r);
    r
}

/// Properties of the first run that carries text, searched depth first.
fn first_run_properties(el: &XmlElement) -> Option<&XmlElement> {
    for child in el.elements() {
        if child.is(names::DEL) || child.is(names::PPR) {
            continue;
        }
        if child.is(names::R) {
            if !visible_text(child).is_empty() {
                return child.child(names::RPR);
            }
            continue;
        }
        if let Some(found) = first_run_properties(child) {
            return Some(found);
        }
    }
    None
}

fn clean_run_properties(rpr: &XmlElement) -> XmlElement {
    let mut rpr = rpr.clone();
    rpr.children.retain(|n| {
        !matches!(n, XmlNode::Element(e) if e.is("w:rPrChange") || e.is(names::INS) || e.is(names::DEL))
    });
    rpr
}

/// Paragraph properties suitable for a new sibling paragraph.
fn clean_paragraph_properties(mut ppr: XmlElement, drop_heading_style: bool) -> XmlElement {
    ppr.children.retain(|n| match n {
        XmlNode::Element(e) => {
            !(e.is(names::SECT_PR)
                || e.is("w:pPrChange")
                || (drop_heading_style && (e.is(names::PSTYLE) || e.is(names::OUTLINE_LVL))))
        }
        _ => true,
    });
    if let Some(rpr) = ppr.child_mut(names::RPR) {
        rpr.children.retain(|n| {
            !matches!(n, XmlNode::Element(e) if e.is(names::INS) || e.is(names::DEL) || e.is("w:moveFrom") || e.is("w:moveTo"))
        });
    }
    ppr
}

fn replace_whole(p: &mut XmlElement, new_text: &str, track: bool, stamp: &mut Stamper) {
    let rpr = first_run_properties(p).map(clean_run_properties);

    if track {
        wrap_deleted(p, stamp);
        if !new_text.is_empty() {
            let mut ins = stamp.mark(names::INS);
            ins.children.push(XmlNode::Element(text_run(rpr.as_ref(), new_text, false)));
            let at = content_end(p);
            p.children.insert(at, XmlNode::Element(ins));
        }
        return;
    }

    let first_text = p.children.iter().position(|n| match n {
        XmlNode::Element(e) => !e.is(names::PPR) && !visible_text(e).is_empty(),
        _ => false,
    });
    strip_text(p);
    let at = match first_text {
        Some(i) => i.min(p.children.len()),
        None => content_end(p),
    };
    if !new_text.is_empty() {
        p.children.insert(at, XmlNode::Element(text_run(rpr.as_ref(), new_text, false)));
    }
}

/// Multi-paragraph (or empty) cell: everything out, new text in the last paragraph.
fn replace_cell_whole(tc: &mut XmlElement, new_text: &str, track: bool, stamp: &mut Stamper) {
    if !tc.elements().any(|e| e.is(names::P)) {
        tc.children.push(XmlNode::Element(XmlElement::new(names::P)));
    }
    let count = tc.elements().filter(|e| e.is(names::P)).count();

    if !track {
        let mut seen = 0usize;
        tc.children.retain(|n| match n {
            XmlNode::Element(e) if e.is(names::P) => {
                seen += 1;
                seen == 1
            }
            _ => true,
        });
        if let Some(p) = tc.child_mut(names::P) {
            replace_whole(p, new_text, false, stamp);
        }
        return;
    }

    let mut index = 0usize;
    for p in tc.elements_mut().filter(|e| e.is(names::P)) {
        index += 1;
        if index < count {
            wrap_deleted(p, stamp);
            let mark = stamp.mark(names::DEL);
            mark_paragraph(p, mark);
        } else {
            replace_whole(p, new_text, true, stamp);
        }
    }
}

enum Piece {
    /// A direct run holding only text-like content.
    Text { text: String, rpr: Option<XmlElement> },
    /// Anything else, kept verbatim at its position.
    Opaque(XmlNode),
}

/// Flattened view of a paragraph's direct children.
struct Layout {
    ppr: Option<XmlNode>,
    pieces: Vec<Piece>,
    /// True when all visible text sits in plain direct runs.
    simple: bool,
}

const TEXT_RUN_CHILDREN: &[&str] = &[
    names::RPR,
    names::T,
    names::TAB,
    names::CR,
    names::NO_BREAK_HYPHEN,
    names::SOFT_HYPHEN,
    names::LAST_RENDERED_PAGE_BREAK,
];

fn is_plain_text_run(run: &XmlElement) -> bool {
    run.is(names::R)
        && run.elements().all(|e| {
            TEXT_RUN_CHILDREN.contains(&e.name.as_str())
                || (e.is(names::BR) && e.attr(names::A_TYPE).is_none_or(|t| t == "textWrapping"))
        })
}

impl Layout {
    fn of(p: &XmlElement) -> Self {
        let mut ppr = None;
        let mut pieces = Vec::new();
        let mut simple = true;

        for child in &p.children {
            match child {
                XmlNode::Element(e) if e.is(names::PPR) && ppr.is_none() => {
                    ppr = Some(child.clone());
                }
                XmlNode::Element(e) if is_plain_text_run(e) => pieces.push(Piece::Text {
                    text: visible_text(e),
                    rpr: e.child(names::RPR).cloned(),
                }),
                XmlNode::Element(e) => {
                    if !visible_text(e).is_empty() {
                        simple = false;
                    }
                    pieces.push(Piece::Opaque(child.clone()));
                }
                other => pieces.push(Piece::Opaque(other.clone())),
            }
        }

        Self { ppr, pieces, simple }
    }

    fn text(&self) -> String {
        self.pieces
            .iter()
            .filter_map(|p| match p {
                Piece::Text { text, .. } => Some(text.as_str()),
                Piece::Opaque(_) => None,
            })
            .collect()
    }
}

/// Re-emit a simple paragraph following the diff spans.
fn rebuild_with_diff(
    p: &mut XmlElement,
    layout: Layout,
    spans: &[DiffSpan],
    track: bool,
    stamp: &mut Stamper,
) {
    let Layout { ppr, pieces, .. } = layout;
    let fallback_rpr = pieces.iter().find_map(|p| match p {
        Piece::Text { rpr, .. } => Some(rpr.clone()),
        Piece::Opaque(_) => None,
    });

    let mut out: Vec<XmlNode> = Vec::new();
    if let Some(ppr) = ppr {
        out.push(ppr);
    }

    let mut cursor = PieceCursor {
        pieces: &pieces,
        index: 0,
        offset: 0,
        last_rpr: fallback_rpr.flatten(),
    };

    for span in spans {
        match span {
            DiffSpan::Equal(text) => cursor.emit(text.len(), &mut out, Emit::Keep, stamp),
            DiffSpan::Delete(text) => {
                let how = if track { Emit::Delete } else { Emit::Drop };
                cursor.emit(text.len(), &mut out, how, stamp);
            }
            DiffSpan::Insert(text) => {
                let run = text_run(cursor.last_rpr.as_ref(), text, false);
                if track {
                    let mut ins = stamp.mark(names::INS);
                    ins.children.push(XmlNode::Element(run));
                    out.push(XmlNode::Element(ins));
                } else {
                    out.push(XmlNode::Element(run));
                }
            }
        }
    }
    cursor.flush_opaque(&mut out);

    p.children = out;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
    Keep,
    Delete,
    Drop,
}

struct PieceCursor<'p> {
    pieces: &'p [Piece],
    index: usize,
    /// Byte offset inside the current text piece.
    offset: usize,
    last_rpr: Option<XmlElement>,
}

impl PieceCursor<'_> {
    /// Consume `len` bytes of old text, emitting runs as directed.
    fn emit(&mut self, mut len: usize, out: &mut Vec<XmlNode>, how: Emit, stamp: &mut Stamper) {
        let pieces = self.pieces;
        let mut del: Option<XmlElement> = None;

        while len > 0 && self.index < pieces.len() {
            match &pieces[self.index] {
                Piece::Opaque(node) => {
                    if let Some(d) = del.take() {
                        out.push(XmlNode::Element(d));
                    }
                    out.push(node.clone());
                    self.index += 1;
                }
                Piece::Text { text, rpr } => {
                    let available = text.len() - self.offset;
                    let take = available.min(len);
                    let slice = &text[self.offset..self.offset + take];
                    self.last_rpr = rpr.clone();

                    match how {
                        Emit::Keep => out.push(XmlNode::Element(text_run(rpr.as_ref(), slice, false))),
                        Emit::Delete => del
                            .get_or_insert_with(|| stamp.mark(names::DEL))
                            .children
                            .push(XmlNode::Element(text_run(rpr.as_ref(), slice, true))),
                        Emit::Drop => {}
                    }

                    len -= take;
                    self.offset += take;
                    if self.offset == text.len() {
                        self.index += 1;
                        self.offset = 0;
                    }
                }
            }
        }

        if let Some(d) = del {
            out.push(XmlNode::Element(d));
        }
    }

    fn flush_opaque(&mut self, out: &mut Vec<XmlNode>) {
        let pieces = self.pieces;
        while self.index < pieces.len() {
            if let Piece::Opaque(node) = &pieces[self.index] {
                out.push(node.clone());
            }
            self.index += 1;
        }
    }
}

fn open_comment_range(p: &mut XmlElement, cid: &str) {
    let at = match p.children.first() {
        Some(XmlNode::Element(e)) if e.is(names::PPR) => 1,
        _ => 0,
    };
    p.children.insert(
        at,
        XmlNode::Element(XmlElement::new(names::COMMENT_RANGE_START).with_attr(names::A_ID, cid)),
    );
}

fn close_comment_range(p: &mut XmlElement, cid: &str) {
    p.children.push(XmlNode::Element(
        XmlElement::new(names::COMMENT_RANGE_END).with_attr(names::A_ID, cid),
    ));
    p.children.push(XmlNode::Element(
        XmlElement::new(names::R)
            .with_child(XmlElement::new(names::COMMENT_REFERENCE).with_attr(names::A_ID, cid)),
    ));
}

/// Where new content goes: before the first comment range end, so comments
/// anchored on the block keep covering it.
fn content_end(p: &XmlElement) -> usize {
    p.children
        .iter()
        .position(|n| matches!(n, XmlNode::Element(e) if e.is(names::COMMENT_RANGE_END)))
        .unwrap_or(p.children.len())
}

fn comment_ids_in(el: &XmlElement) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    el.walk(&mut |e: &XmlElement| {
        if e.is(names::COMMENT_RANGE_START) {
            if let Some(id) = e.attr(names::A_ID) {
                ids.insert(id.to_string());
            }
        }
    });
    ids
}

/// Empty comments part with the namespaces Word expects.
pub(crate) fn new_comments_part() -> XmlDocument {
    XmlDocument::new(
        XmlElement::new(names::COMMENTS)
            .with_attr("xmlns:w", names::NS_W)
            .with_attr("xmlns:r", names::NS_R),
    )
}
