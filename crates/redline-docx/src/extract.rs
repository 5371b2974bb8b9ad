//! Block extraction from `word/document.xml`.
//!
//! Walks the body in document order. Paragraphs with visible text become
//! heading/paragraph blocks, table cells become table-cell blocks, and blank
//! paragraphs only contribute their opaque content to the nearest block.

use std::collections::BTreeMap;

use redline_core::model::{Attachment, BlockId, BlockKind, BlockModel, BlockModelBuilder};

use crate::error::PackageError;
use crate::names;
use crate::xml::{XmlDocument, XmlElement, XmlNode};

/// Where a block lives in the XML tree: child indices from the root element
/// to the `w:p` (paragraph, heading) or `w:tc` (table cell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub path: Vec<usize>,
    pub kind: BlockKind,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub model: BlockModel,
    pub anchors: BTreeMap<BlockId, Anchor>,
}

pub fn extract(doc: &XmlDocument, fingerprint: String) -> Result<Extraction, PackageError> {
    let structure = |message: &str| PackageError::Structure {
        part: names::PART_DOCUMENT.to_string(),
        message: message.to_string(),
    };

    if !doc.root.is(names::DOCUMENT) {
        return Err(structure("root element is not w:document"));
    }
    let body_index = doc
        .root
        .children
        .iter()
        .position(|n| matches!(n, XmlNode::Element(e) if e.is(names::BODY)))
        .ok_or_else(|| structure("missing w:body"))?;

    let mut walker = Walker {
        builder: BlockModel::builder(fingerprint),
        anchors: BTreeMap::new(),
    };
    if let Some(XmlNode::Element(body)) = doc.root.children.get(body_index) {
        walker.container(body, &mut vec![body_index]);
    }

    let model = walker.builder.finish();
    tracing::debug!(
        blocks = model.len(),
        headings = model.outline().len(),
        "extracted block model"
    );
    Ok(Extraction {
        model,
        anchors: walker.anchors,
    })
}

struct Walker {
    builder: BlockModelBuilder,
    anchors: BTreeMap<BlockId, Anchor>,
}

impl Walker {
    fn container(&mut self, el: &XmlElement, path: &mut Vec<usize>) {
        for (i, child) in el.children.iter().enumerate() {
            let XmlNode::Element(child) = child else {
                continue;
            };
            path.push(i);
            match child.name.as_str() {
                names::P => self.paragraph(child, path),
                names::TBL => self.table(child, path),
                names::SDT => {
                    if let Some(j) = child_index(child, names::SDT_CONTENT) {
                        path.push(j);
                        if let Some(XmlNode::Element(content)) = child.children.get(j) {
                            self.container(content, path);
                        }
                        path.pop();
                    }
                }
                _ => {}
            }
            path.pop();
        }
    }

    fn paragraph(&mut self, p: &XmlElement, path: &[usize]) {
        let text = visible_text(p);
        let mut found = Vec::new();
        collect_attachments(p, &mut found);

        if text.trim().is_empty() {
            for a in found {
                self.builder.attach(a);
            }
            return;
        }

        let (kind, level) = paragraph_kind(p);
        let id = self.builder.push(kind, level, text);
        for a in found {
            self.builder.attach(a);
        }
        self.anchors.insert(
            id,
            Anchor {
                path: path.to_vec(),
                kind,
            },
        );
    }

    fn table(&mut self, tbl: &XmlElement, path: &mut Vec<usize>) {
        for (ri, row) in tbl.children.iter().enumerate() {
            let XmlNode::Element(row) = row else { continue };
            if !row.is(names::TR) {
                continue;
            }
            path.push(ri);
            for (ci, cell) in row.children.iter().enumerate() {
                let XmlNode::Element(cell) = cell else { continue };
                if !cell.is(names::TC) {
                    continue;
                }
                path.push(ci);
                self.cell(cell, path);
                path.pop();
            }
            path.pop();
        }
    }

    fn cell(&mut self, tc: &XmlElement, path: &[usize]) {
        let text = cell_text(tc);
        let mut found = Vec::new();
        for child in tc.elements() {
            if child.is(names::TBL) {
                found.push(Attachment::NestedTable);
            } else if child.is(names::P) {
                collect_attachments(child, &mut found);
            }
        }

        let id = self.builder.push(BlockKind::TableCell, None, text);
        for a in found {
            self.builder.attach(a);
        }
        self.anchors.insert(
            id,
            Anchor {
                path: path.to_vec(),
                kind: BlockKind::TableCell,
            },
        );
    }
}

fn child_index(el: &XmlElement, name: &str) -> Option<usize> {
    el.children
        .iter()
        .position(|n| matches!(n, XmlNode::Element(e) if e.is(name)))
}

/// Text of a table cell: its direct paragraphs joined by `\n`. A paragraph
/// whose mark is deleted runs into the next one.
pub fn cell_text(tc: &XmlElement) -> String {
    let mut out = String::new();
    let mut joined = true;
    for p in tc.elements().filter(|e| e.is(names::P)) {
        if !joined {
            out.push('\n');
        }
        out.push_str(&visible_text(p));
        joined = paragraph_mark_deleted(p);
    }
    out
}

fn paragraph_mark_deleted(p: &XmlElement) -> bool {
    p.child(names::PPR)
        .and_then(|ppr| ppr.child(names::RPR))
        .is_some_and(|rpr| rpr.child(names::DEL).is_some())
}

/// Current text of an element: inserted content counts, deleted content does not.
pub fn visible_text(el: &XmlElement) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    out
}

fn collect_text(el: &XmlElement, out: &mut String) {
    for child in el.elements() {
        match child.name.as_str() {
            names::T => out.push_str(&child.text()),
            names::TAB => out.push('\t'),
            names::BR => {
                if child
                    .attr(names::A_TYPE)
                    .is_none_or(|t| t == "textWrapping")
                {
                    out.push('\n');
                }
            }
            names::CR => out.push('\n'),
            names::NO_BREAK_HYPHEN => out.push('-'),
            names::DEL
            | names::MOVE_FROM
            | names::PPR
            | names::RPR
            | names::DRAWING
            | names::PICT
            | names::TBL => {}
            _ => collect_text(child, out),
        }
    }
}

fn collect_attachments(el: &XmlElement, out: &mut Vec<Attachment>) {
    for child in el.elements() {
        match child.name.as_str() {
            names::DRAWING | names::PICT => out.push(Attachment::Image),
            names::BR if child.attr(names::A_TYPE) == Some("page") => {
                out.push(Attachment::PageBreak)
            }
            names::PPR => {
                if child.child(names::SECT_PR).is_some() {
                    out.push(Attachment::SectionBreak);
                }
            }
            names::DEL | names::MOVE_FROM => {}
            _ => collect_attachments(child, out),
        }
    }
}

fn paragraph_kind(p: &XmlElement) -> (BlockKind, Option<u8>) {
    let ppr = p.child(names::PPR);

    let from_style = ppr
        .and_then(|ppr| ppr.child(names::PSTYLE))
        .and_then(|s| s.attr(names::A_VAL))
        .and_then(heading_level_from_style);
    if let Some(level) = from_style {
        return (BlockKind::Heading, Some(level));
    }

    let from_outline = ppr
        .and_then(|ppr| ppr.child(names::OUTLINE_LVL))
        .and_then(|o| o.attr(names::A_VAL))
        .and_then(|v| v.parse::<u8>().ok())
        .filter(|lvl| *lvl < 9);
    if let Some(lvl) = from_outline {
        return (BlockKind::Heading, Some(lvl + 1));
    }

    (BlockKind::Paragraph, None)
}

/// `Title` is level 1; `Heading3` / `heading 3` is level 3.
fn heading_level_from_style(style: &str) -> Option<u8> {
    let lower = style.to_ascii_lowercase();
    if lower == "title" {
        return Some(1);
    }
    let rest = lower.strip_prefix("heading")?.trim_start();
    rest.parse::<u8>().ok().filter(|l| (1..=9).contains(l))
}
