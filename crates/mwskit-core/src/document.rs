//! Owned, namespace-free XML element tree for querying MWS response bodies.

use crate::error::DocumentError;

/// Parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

/// One element with its local name, attributes, direct text and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlDocument {
    /// Parses `input`, dropping namespace prefixes from element and attribute names.
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        let document =
            roxmltree::Document::parse(input).map_err(|e| DocumentError::new(e.to_string()))?;
        Ok(Self {
            root: XmlElement::from_node(document.root_element()),
        })
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// First element named `name`, searching the root and all descendants.
    pub fn descendant(&self, name: &str) -> Option<&XmlElement> {
        if self.root.name == name {
            return Some(&self.root);
        }
        self.root.descendant(name)
    }

    /// Follows a space-separated descendant path, e.g. `"Error Message"`.
    pub fn at(&self, path: &str) -> Option<&XmlElement> {
        let mut segments = path.split_whitespace();
        let first = segments.next()?;
        segments.try_fold(self.descendant(first)?, |element, segment| {
            element.descendant(segment)
        })
    }
}

impl XmlElement {
    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|attribute| (attribute.name().to_owned(), attribute.value().to_owned()))
            .collect();

        let mut text = String::new();
        let mut children = Vec::new();
        for child in node.children() {
            if child.is_element() {
                children.push(Self::from_node(child));
            } else if child.is_text() {
                text.push_str(child.text().unwrap_or_default());
            }
        }

        Self {
            name: node.tag_name().name().to_owned(),
            attributes,
            text: text.trim().to_owned(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct text content, trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Depth-first search below this element.
    pub fn descendant(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.descendant(name)
            }
        })
    }

    /// Every element named `name` below this element, in document order.
    pub fn descendants(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }
}
