use std::collections::BTreeMap;
use std::path::Path;

use redline_core::hash::sha256_hex;
use redline_core::model::{BlockId, BlockKind, BlockModel};

use crate::error::{PackageError, RenderError};
use crate::extract::{Anchor, extract};
use crate::names;
use crate::package::{Package, write_atomic};
use crate::redline::{RedlineOptions, Redliner, new_comments_part};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

/// An opened word-processing package with its extracted block model.
///
/// The model and the element tree share anchors: every block id maps to the
/// element it was extracted from. Once a [`Redliner`] has finished, the tree
/// no longer matches the model and further rendering is refused.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    package: Package,
    tree: XmlDocument,
    model: BlockModel,
    anchors: BTreeMap<BlockId, Anchor>,
    revised: bool,
}

impl DocxDocument {
    pub fn open(path: &Path) -> Result<Self, PackageError> {
        Self::from_package(Package::read(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PackageError> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    pub fn from_package(package: Package) -> Result<Self, PackageError> {
        let raw = package
            .part(names::PART_DOCUMENT)
            .ok_or_else(|| PackageError::MissingPart(names::PART_DOCUMENT.to_string()))?;
        let fingerprint = sha256_hex(raw);
        let tree = package.xml_part(names::PART_DOCUMENT)?;
        let extraction = extract(&tree, fingerprint)?;

        Ok(Self {
            package,
            tree,
            model: extraction.model,
            anchors: extraction.anchors,
            revised: false,
        })
    }

    pub fn model(&self) -> &BlockModel {
        &self.model
    }

    pub fn into_model(self) -> BlockModel {
        self.model
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PackageError> {
        self.package.to_bytes()
    }

    /// Serialize and write atomically to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PackageError> {
        write_atomic(path, &self.to_bytes()?)
    }

    pub fn redliner(&mut self, opts: RedlineOptions) -> Redliner<'_> {
        Redliner::new(self, opts)
    }

    /// Highest numeric `w:id` used in the main and comments parts.
    pub(crate) fn max_markup_id(&self) -> u64 {
        let mut max = max_id(&self.tree.root);
        if self.package.has_part(names::PART_COMMENTS) {
            match self.package.xml_part(names::PART_COMMENTS) {
                Ok(comments) => max = max.max(max_id(&comments.root)),
                Err(err) => tracing::warn!(%err, "ignoring unreadable comments part"),
            }
        }
        max
    }

    pub(crate) fn anchor_kind(&self, id: BlockId) -> Result<BlockKind, RenderError> {
        if self.revised {
            return Err(RenderError::StaleAnchor);
        }
        self.anchors
            .get(&id)
            .map(|a| a.kind)
            .ok_or(RenderError::TargetNotFound)
    }

    pub(crate) fn block_element(&self, id: BlockId) -> Result<&XmlElement, RenderError> {
        let anchor = self.anchors.get(&id).ok_or(RenderError::TargetNotFound)?;
        self.tree
            .root
            .at_path(&anchor.path)
            .ok_or(RenderError::StaleAnchor)
    }

    pub(crate) fn block_element_mut(&mut self, id: BlockId) -> Result<&mut XmlElement, RenderError> {
        let anchor = self.anchors.get(&id).ok_or(RenderError::TargetNotFound)?;
        self.tree
            .root
            .at_path_mut(&anchor.path)
            .ok_or(RenderError::StaleAnchor)
    }

    /// Insert `after` behind the block (inside it, for cells) and optionally
    /// remove the block itself.
    pub(crate) fn restructure(
        &mut self,
        id: BlockId,
        after: Vec<XmlElement>,
        remove: bool,
    ) -> Result<(), PackageError> {
        let stale = || PackageError::Structure {
            part: names::PART_DOCUMENT.to_string(),
            message: format!("anchor for {id} no longer resolves"),
        };
        let anchor = self.anchors.get(&id).ok_or_else(stale)?;

        if anchor.kind == BlockKind::TableCell {
            let tc = self.tree.root.at_path_mut(&anchor.path).ok_or_else(stale)?;
            tc.children.extend(after.into_iter().map(XmlNode::Element));
            return Ok(());
        }

        let (&index, parent_path) = anchor.path.split_last().ok_or_else(stale)?;
        let parent = self.tree.root.at_path_mut(parent_path).ok_or_else(stale)?;
        if index >= parent.children.len() {
            return Err(stale());
        }
        let count = after.len();
        parent.children.splice(
            index + 1..index + 1,
            after.into_iter().map(XmlNode::Element),
        );
        tracing::debug!(block = %id, inserted = count, remove, "restructured block");

        if remove {
            if !matches!(parent.children.get(index), Some(XmlNode::Element(_))) {
                return Err(stale());
            }
            parent.children.remove(index);
        }
        Ok(())
    }

    pub(crate) fn append_comments(&mut self, comments: Vec<XmlElement>) -> Result<(), PackageError> {
        let mut part = if self.package.has_part(names::PART_COMMENTS) {
            self.package.xml_part(names::PART_COMMENTS)?
        } else {
            new_comments_part()
        };
        let count = comments.len();
        part.root
            .children
            .extend(comments.into_iter().map(XmlNode::Element));
        self.package.set_xml_part(names::PART_COMMENTS, &part);

        self.package
            .ensure_relationship(names::PART_DOCUMENT_RELS, names::REL_COMMENTS, "comments.xml")?;
        self.package
            .ensure_override(names::PART_COMMENTS, names::CT_COMMENTS)?;
        tracing::debug!(comments = count, "wrote comments part");
        Ok(())
    }

    /// Write the element tree back into the package.
    pub(crate) fn store_main_part(&mut self) {
        self.package.set_xml_part(names::PART_DOCUMENT, &self.tree);
        self.revised = true;
    }
}

fn max_id(root: &XmlElement) -> u64 {
    let mut max = 0;
    root.walk(&mut |e: &XmlElement| {
        if let Some(id) = e.attr(names::A_ID).and_then(|v| v.parse::<u64>().ok()) {
            max = max.max(id);
        }
    });
    max
}
