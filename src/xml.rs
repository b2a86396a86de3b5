//! A small owned XML element tree.
//!
//! `roxmltree` gives a fast read-only view; diagrams have to be edited in
//! place and written back, so parsed documents are copied into this owned
//! tree. Only elements and text are kept. Comments and processing
//! instructions are dropped, which draw.io never emits inside a model.

use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::A2dlError;

/// A node inside an [`XmlElement`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with ordered attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(name, _)| *name == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(name, _)| name == key)?;
        Some(self.attributes.remove(idx).1)
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Iterate over direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|child| match child {
            XmlNode::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    /// Concatenated text content of direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Collect this element and all descendant elements in document order
    /// whose name is one of `names`.
    pub fn find_all<'a>(&'a self, names: &[&str], out: &mut Vec<&'a XmlElement>) {
        if names.contains(&self.name.as_str()) {
            out.push(self);
        }
        for element in self.elements() {
            element.find_all(names, out);
        }
    }

    /// Visit this element and all descendants in document order.
    pub fn visit_mut(&mut self, visit: &mut dyn FnMut(&mut XmlElement)) {
        visit(self);
        for child in &mut self.children {
            if let XmlNode::Element(element) = child {
                element.visit_mut(visit);
            }
        }
    }

    /// Serialize without an XML declaration and without added whitespace.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write_to(out),
                XmlNode::Text(text) => out.push_str(&escape_text(text)),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// Parse an XML string into an owned root element.
///
/// `path` only provides error context.
pub fn parse_element(xml: &str, path: &Path) -> Result<XmlElement, A2dlError> {
    let document = Document::parse(xml).map_err(|source| A2dlError::XmlParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;
    Ok(convert(document.root_element()))
}

fn convert(node: Node<'_, '_>) -> XmlElement {
    let mut element = XmlElement::new(node.tag_name().name());
    element.attributes = node
        .attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect();
    for child in node.children() {
        if child.is_element() {
            element.children.push(XmlNode::Element(convert(child)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                // Indentation between elements carries no meaning in a model.
                if !text.trim().is_empty() {
                    element.children.push(XmlNode::Text(text.to_string()));
                }
            }
        }
    }
    element
}

/// Escape text content.
pub fn escape_text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value. Newlines and tabs are written as character
/// references so parsers do not normalise them to spaces.
pub fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#xa;"),
            '\r' => out.push_str("&#xd;"),
            '\t' => out.push_str("&#x9;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_attribute_order_and_nesting() {
        let xml = r#"<object id="a" label="L" name="X"><mxCell style="s" vertex="1"><mxGeometry x="1" as="geometry"/></mxCell></object>"#;
        let root = parse_element(xml, Path::new("<memory>")).expect("parse");
        assert_eq!(root.name, "object");
        let keys: Vec<_> = root.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["id", "label", "name"]);
        let cell = root.child("mxCell").expect("cell");
        assert_eq!(cell.attr("style"), Some("s"));
        assert_eq!(cell.child("mxGeometry").and_then(|g| g.attr("x")), Some("1"));
    }

    #[test]
    fn serialize_then_parse_preserves_multiline_attributes() {
        let element = XmlElement::new("object")
            .with_attr("text", "line one\nline \"two\" & <three>")
            .with_child(XmlElement::new("mxCell"));
        let xml = element.to_xml_string();
        assert!(xml.contains("&#xa;"));
        let parsed = parse_element(&xml, Path::new("<memory>")).expect("parse");
        assert_eq!(parsed, element);
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut element = XmlElement::new("a").with_attr("x", "1").with_attr("y", "2");
        element.set_attr("x", "3");
        assert_eq!(
            element.attributes,
            vec![
                ("x".to_string(), "3".to_string()),
                ("y".to_string(), "2".to_string())
            ]
        );
        assert_eq!(element.remove_attr("y"), Some("2".to_string()));
        assert_eq!(element.remove_attr("y"), None);
    }

    #[test]
    fn find_all_walks_in_document_order() {
        let xml = r#"<root><object name="a"/><g><object name="b"/></g><UserObject name="c"/></root>"#;
        let root = parse_element(xml, Path::new("<memory>")).expect("parse");
        let mut found = Vec::new();
        root.find_all(&["object", "UserObject"], &mut found);
        let names: Vec<_> = found.iter().filter_map(|e| e.attr("name")).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn malformed_xml_reports_path() {
        let err = parse_element("<a><b></a>", Path::new("broken.drawio")).unwrap_err();
        match err {
            A2dlError::XmlParse { path, .. } => assert_eq!(path, Path::new("broken.drawio")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
