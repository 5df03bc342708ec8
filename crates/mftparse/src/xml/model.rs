//! Parsed XML tree
//!
//! Only what extraction needs is kept: element names, attributes in source
//! order, and text with entities and CDATA resolved. Comments and processing
//! instructions are dropped while parsing.

use indexmap::IndexMap;

/// A well-formed document with exactly one root element
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Decoded attribute values keyed by name, in source order
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Content>,
}

impl Drop for Element {
    // nested elements are released from a work list so deep trees do not recurse
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(content) = pending.pop() {
            if let Content::Element(mut element) = content {
                pending.append(&mut element.children);
            }
        }
    }
}

/// Child node of an element; adjacent text and CDATA are merged
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Element(Element),
    Text(String),
}

impl Content {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }
}

impl Element {
    /// Attribute value by exact name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Direct child elements in document order, skipping text
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(Content::as_element)
    }

    /// Direct child elements with the given tag name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> {
        self.child_elements().filter(move |child| child.name == name)
    }

    /// Concatenated direct text content
    pub fn text(&self) -> String {
        self.children.iter().filter_map(Content::as_text).collect()
    }
}
