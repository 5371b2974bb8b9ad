//! Owned XML element tree.
//!
//! Tokenizing is done by `quick-xml`; the tree keeps qualified names, attribute
//! order and every text node (including whitespace) so an unmodified tree
//! serializes back to equivalent markup.

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use crate::error::XmlError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    /// Raw comment body, written back verbatim.
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    /// Child elements, skipping text and comment nodes.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(name))
    }

    /// Concatenated text nodes directly under this element.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) | XmlNode::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Element reached by following child indices from `self`.
    pub fn at_path(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut cur = self;
        for &i in path {
            cur = match cur.children.get(i)? {
                XmlNode::Element(e) => e,
                _ => return None,
            };
        }
        Some(cur)
    }

    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut cur = self;
        for &i in path {
            cur = match cur.children.get_mut(i)? {
                XmlNode::Element(e) => e,
                _ => return None,
            };
        }
        Some(cur)
    }

    /// Visit this element and all descendants, depth first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a XmlElement)) {
        f(self);
        for e in self.elements() {
            e.walk(f);
        }
    }

    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            let _ = write!(out, " {k}=\"{}\"", escape(v.as_str()));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_to(out),
                XmlNode::Text(t) => out.push_str(&escape(t.as_str())),
                XmlNode::CData(t) => {
                    out.push_str("<![CDATA[");
                    out.push_str(t);
                    out.push_str("]]>");
                }
                XmlNode::Comment(c) => {
                    out.push_str("<!--");
                    out.push_str(c);
                    out.push_str("-->");
                }
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| XmlError::Malformed {
                position: reader.buffer_position() as u64,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(start) => stack.push(element_from_start(&start, &reader)?),
                Event::Empty(start) => {
                    let el = element_from_start(&start, &reader)?;
                    attach(&mut stack, &mut root, el);
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or(XmlError::Unbalanced(reader.buffer_position() as u64))?;
                    attach(&mut stack, &mut root, el);
                }
                Event::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        let value = text.unescape().map_err(|e| XmlError::Malformed {
                            position: reader.buffer_position() as u64,
                            message: e.to_string(),
                        })?;
                        top.children.push(XmlNode::Text(value.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        top.children
                            .push(XmlNode::CData(String::from_utf8_lossy(&data).into_owned()));
                    }
                }
                Event::Comment(comment) => {
                    if let Some(top) = stack.last_mut() {
                        top.children.push(XmlNode::Comment(
                            String::from_utf8_lossy(&comment).into_owned(),
                        ));
                    }
                }
                Event::Eof => break,
                // Declaration, processing instructions and doctype are regenerated or dropped.
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.name));
        }
        root.map(Self::new).ok_or(XmlError::MissingRoot)
    }

    pub fn to_xml_string(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push_str("\r\n");
        self.root.write_to(&mut out);
        out
    }
}

fn element_from_start(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<XmlElement, XmlError> {
    let malformed = |message: String| XmlError::Malformed {
        position: reader.buffer_position() as u64,
        message,
    };

    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| malformed(e.to_string()))?
        .to_string();
    let mut el = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| malformed(e.to_string()))?
            .into_owned();
        el.attrs.push((key, value));
    }
    Ok(el)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, el: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(el)),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}
