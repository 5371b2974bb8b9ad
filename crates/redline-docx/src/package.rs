//! Zip package I/O.
//!
//! Parts are held in memory in archive order and written back in the same
//! order. Only parts that were replaced through [`Package::set_part`] change;
//! everything else round-trips byte-for-byte.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::PackageError;
use crate::names;
use crate::xml::{XmlDocument, XmlElement};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    name: String,
    data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(path: &Path) -> Result<Self, PackageError> {
        let bytes = fs::read(path).map_err(|source| PackageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PackageError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push(Part { name, data });
        }

        tracing::debug!(parts = parts.len(), "read package");
        Ok(Self { parts })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PackageError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            writer.start_file(part.name.as_str(), options)?;
            writer.write_all(&part.data)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Replace a part in place, or append it when new.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    pub fn xml_part(&self, name: &str) -> Result<XmlDocument, PackageError> {
        let bytes = self
            .part(name)
            .ok_or_else(|| PackageError::MissingPart(name.to_string()))?;
        let text = std::str::from_utf8(strip_bom(bytes)).map_err(|_| PackageError::Encoding {
            part: name.to_string(),
        })?;
        XmlDocument::parse(text).map_err(|source| PackageError::Xml {
            part: name.to_string(),
            source,
        })
    }

    pub fn set_xml_part(&mut self, name: &str, doc: &XmlDocument) {
        self.set_part(name, doc.to_xml_string().into_bytes());
    }

    /// Ensure `[Content_Types].xml` declares `content_type` for `part_name`.
    pub fn ensure_override(&mut self, part_name: &str, content_type: &str) -> Result<(), PackageError> {
        let mut types = self.xml_part(names::PART_CONTENT_TYPES)?;
        let absolute = format!("/{part_name}");
        let present = types
            .root
            .elements()
            .any(|e| e.is("Override") && e.attr("PartName") == Some(absolute.as_str()));
        if !present {
            types.root.children.push(crate::xml::XmlNode::Element(
                XmlElement::new("Override")
                    .with_attr("PartName", absolute)
                    .with_attr("ContentType", content_type),
            ));
            self.set_xml_part(names::PART_CONTENT_TYPES, &types);
        }
        Ok(())
    }

    /// Ensure a relationship of `rel_type` to `target` exists in `rels_part`
    /// (created when absent). Returns its id.
    pub fn ensure_relationship(
        &mut self,
        rels_part: &str,
        rel_type: &str,
        target: &str,
    ) -> Result<String, PackageError> {
        let mut rels = if self.has_part(rels_part) {
            self.xml_part(rels_part)?
        } else {
            XmlDocument::new(XmlElement::new("Relationships").with_attr("xmlns", names::NS_PACKAGE_RELS))
        };

        if let Some(existing) = rels
            .root
            .elements()
            .find(|e| e.attr("Type") == Some(rel_type) && e.attr("Target") == Some(target))
        {
            return Ok(existing.attr("Id").unwrap_or_default().to_string());
        }

        let next = rels
            .root
            .elements()
            .filter_map(|e| e.attr("Id"))
            .filter_map(|id| id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{next}");
        rels.root.children.push(crate::xml::XmlNode::Element(
            XmlElement::new("Relationship")
                .with_attr("Id", id.as_str())
                .with_attr("Type", rel_type)
                .with_attr("Target", target),
        ));
        self.set_xml_part(rels_part, &rels);
        Ok(id)
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes)
}

/// Write `bytes` to `path` through a sibling temp file and a rename, so a
/// failed write never leaves a partial file behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PackageError> {
    let write_err = |source| PackageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote package");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_round_trip_in_order() {
        let mut pkg = Package::new();
        pkg.set_part("a.xml", b"<a/>".to_vec());
        pkg.set_part("b/c.bin", vec![0, 1, 2]);
        pkg.set_part("a.xml", b"<a x=\"1\"/>".to_vec());

        let bytes = pkg.to_bytes().unwrap();
        let back = Package::from_bytes(&bytes).unwrap();
        assert_eq!(back, pkg);
        assert_eq!(back.part_names().collect::<Vec<_>>(), ["a.xml", "b/c.bin"]);
    }

    #[test]
    fn garbage_is_not_a_package() {
        assert!(matches!(
            Package::from_bytes(b"definitely not a zip"),
            Err(PackageError::Zip(_))
        ));
    }

    #[test]
    fn relationships_get_fresh_ids_and_are_not_duplicated() {
        let mut pkg = Package::new();
        let rels = r#"<Relationships xmlns="x"><Relationship Id="rId3" Type="t1" Target="a.xml"/></Relationships>"#;
        pkg.set_part("word/_rels/document.xml.rels", rels.as_bytes().to_vec());

        let id = pkg
            .ensure_relationship("word/_rels/document.xml.rels", "t2", "comments.xml")
            .unwrap();
        assert_eq!(id, "rId4");
        let again = pkg
            .ensure_relationship("word/_rels/document.xml.rels", "t2", "comments.xml")
            .unwrap();
        assert_eq!(again, "rId4");
    }

    #[test]
    fn write_atomic_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
