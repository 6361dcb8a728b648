//! XML element tree with a fluent builder API and indented output.

use std::fmt::Write;

use crate::attributes::{AttributeValue, Attributes, escape_xml};

const INDENT: &str = "  ";

/// An XML element with attributes and either children or text.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    tag: String,
    attrs: Attributes,
    children: Vec<XmlElement>,
    text_content: Option<String>,
}

impl XmlElement {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attributes::new(),
            children: Vec::new(),
            text_content: None,
        }
    }

    /// An element that holds only text, e.g. `<name>CRM</name>`.
    #[must_use]
    pub fn text_element(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(tag).content(text)
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attrs = self.attrs.set(name, value);
        self
    }

    #[must_use]
    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    #[must_use]
    pub fn child(mut self, elem: XmlElement) -> Self {
        self.children.push(elem);
        self
    }

    #[must_use]
    pub fn children<I: IntoIterator<Item = XmlElement>>(mut self, elems: I) -> Self {
        self.children.extend(elems);
        self
    }

    pub fn push(&mut self, elem: XmlElement) {
        self.children.push(elem);
    }

    /// Render without a trailing newline.
    #[must_use]
    pub fn render(&self) -> String {
        let mut output = String::with_capacity(256);
        self.write_to_string(&mut output, 0);
        output
    }

    /// Write at `depth` levels of two-space indentation.
    ///
    /// Children go on their own lines; a text-only element stays on one line
    /// and an element with neither is self-closed.
    pub fn write_to_string(&self, output: &mut String, depth: usize) {
        for _ in 0..depth {
            output.push_str(INDENT);
        }
        let _ = write!(output, "<{}", self.tag);
        output.push_str(&self.attrs.render());

        if self.children.is_empty() {
            match &self.text_content {
                Some(text) => {
                    let _ = write!(output, ">{}</{}>", escape_xml(text), self.tag);
                }
                None => output.push_str("/>"),
            }
            return;
        }

        output.push('>');
        if let Some(text) = &self.text_content {
            output.push_str(&escape_xml(text));
        }
        for child in &self.children {
            output.push('\n');
            child.write_to_string(output, depth + 1);
        }
        output.push('\n');
        for _ in 0..depth {
            output.push_str(INDENT);
        }
        let _ = write!(output, "</{}>", self.tag);
    }
}
