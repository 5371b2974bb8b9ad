//! Minimal `.docx` writer for fixtures.
//!
//! Produces the four parts a word processor needs to open a document:
//! content types, package relationships, the main part and its (empty)
//! relationships. Used by tests so that no binary fixtures are checked in.

use std::path::Path;

use crate::error::PackageError;
use crate::names;
use crate::package::{Package, write_atomic};
use crate::xml::{XmlDocument, XmlElement};

#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    body: Vec<XmlElement>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(self, text: &str) -> Self {
        self.styled("Title", text)
    }

    pub fn heading(self, level: u8, text: &str) -> Self {
        self.styled(&format!("Heading{level}"), text)
    }

    pub fn paragraph(self, text: &str) -> Self {
        self.element(XmlElement::new(names::P).with_child(run(text, false)))
    }

    /// A paragraph made of several runs; `true` marks a bold run.
    pub fn runs(self, runs: &[(&str, bool)]) -> Self {
        let p = runs
            .iter()
            .fold(XmlElement::new(names::P), |p, (text, bold)| {
                p.with_child(run(text, *bold))
            });
        self.element(p)
    }

    pub fn page_break(self) -> Self {
        self.element(XmlElement::new(names::P).with_child(
            XmlElement::new(names::R).with_child(XmlElement::new(names::BR).with_attr(names::A_TYPE, "page")),
        ))
    }

    pub fn image(self) -> Self {
        self.element(
            XmlElement::new(names::P)
                .with_child(XmlElement::new(names::R).with_child(XmlElement::new(names::DRAWING))),
        )
    }

    /// A table with one paragraph per cell; `\n` in a cell starts a new paragraph.
    pub fn table(self, rows: &[&[&str]]) -> Self {
        let mut tbl = XmlElement::new(names::TBL);
        for row in rows {
            let mut tr = XmlElement::new(names::TR);
            for cell in row.iter() {
                let tc = cell.split('\n').fold(XmlElement::new(names::TC), |tc, line| {
                    tc.with_child(XmlElement::new(names::P).with_child(run(line, false)))
                });
                tr = tr.with_child(tc);
            }
            tbl = tbl.with_child(tr);
        }
        self.element(tbl)
    }

    /// Any body-level element, e.g. parsed from a snippet.
    pub fn element(mut self, el: XmlElement) -> Self {
        self.body.push(el);
        self
    }

    pub fn document_xml(&self) -> String {
        let body = self
            .body
            .iter()
            .cloned()
            .fold(XmlElement::new(names::BODY), XmlElement::with_child)
            .with_child(XmlElement::new(names::SECT_PR));
        let root = XmlElement::new(names::DOCUMENT)
            .with_attr("xmlns:w", names::NS_W)
            .with_attr("xmlns:r", names::NS_R)
            .with_child(body);
        XmlDocument::new(root).to_xml_string()
    }

    pub fn package(&self) -> Package {
        let mut pkg = Package::new();

        let types = XmlElement::new("Types")
            .with_attr("xmlns", names::NS_CONTENT_TYPES)
            .with_child(
                XmlElement::new("Default")
                    .with_attr("Extension", "rels")
                    .with_attr("ContentType", names::CT_RELS),
            )
            .with_child(
                XmlElement::new("Default")
                    .with_attr("Extension", "xml")
                    .with_attr("ContentType", "application/xml"),
            )
            .with_child(
                XmlElement::new("Override")
                    .with_attr("PartName", format!("/{}", names::PART_DOCUMENT))
                    .with_attr("ContentType", names::CT_DOCUMENT),
            );
        pkg.set_xml_part(names::PART_CONTENT_TYPES, &XmlDocument::new(types));

        let root_rels = XmlElement::new("Relationships")
            .with_attr("xmlns", names::NS_PACKAGE_RELS)
            .with_child(
                XmlElement::new("Relationship")
                    .with_attr("Id", "rId1")
                    .with_attr("Type", names::REL_OFFICE_DOCUMENT)
                    .with_attr("Target", names::PART_DOCUMENT),
            );
        pkg.set_xml_part(names::PART_ROOT_RELS, &XmlDocument::new(root_rels));

        pkg.set_part(names::PART_DOCUMENT, self.document_xml().into_bytes());
        pkg.set_xml_part(
            names::PART_DOCUMENT_RELS,
            &XmlDocument::new(XmlElement::new("Relationships").with_attr("xmlns", names::NS_PACKAGE_RELS)),
        );
        pkg
    }

    pub fn build(&self) -> Result<Vec<u8>, PackageError> {
        self.package().to_bytes()
    }

    pub fn write(&self, path: &Path) -> Result<(), PackageError> {
        write_atomic(path, &self.build()?)
    }

    fn styled(self, style: &str, text: &str) -> Self {
        let ppr = XmlElement::new(names::PPR)
            .with_child(XmlElement::new(names::PSTYLE).with_attr(names::A_VAL, style));
        self.element(
            XmlElement::new(names::P)
                .with_child(ppr)
                .with_child(run(text, false)),
        )
    }
}

fn run(text: &str, bold: bool) -> XmlElement {
    let mut r = XmlElement::new(names::R);
    if bold {
        r = r.with_child(XmlElement::new(names::RPR).with_child(XmlElement::new("w:b")));
    }
    r.with_child(
        XmlElement::new(names::T)
            .with_attr(names::XML_SPACE, "preserve")
            .with_text(text),
    )
}
