//! Complete XML documents: declaration plus one root element.

use std::fmt;

use crate::element::XmlElement;

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    #[must_use]
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Declaration, newline, indented root. The output ends with the root's
    /// closing tag and no trailing newline.
    pub fn write_to_string(&self, output: &mut String) {
        output.push_str(XML_DECLARATION);
        output.push('\n');
        self.root.write_to_string(output, 0);
    }
}

impl fmt::Display for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut output = String::with_capacity(4096);
        self.write_to_string(&mut output);
        f.write_str(&output)
    }
}
