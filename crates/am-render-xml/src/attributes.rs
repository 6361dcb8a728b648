//! XML attributes with escaping.

use std::fmt::{self, Write};

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(&escape_xml(s)),
            Self::Integer(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<&String> for AttributeValue {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<usize> for AttributeValue {
    fn from(n: usize) -> Self {
        Self::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

/// Ordered attribute list; setting a name twice replaces the first value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    attrs: Vec<Attribute>,
}

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self { attrs: Vec::new() }
    }

    #[must_use]
    pub fn set<K: Into<String>, V: Into<AttributeValue>>(mut self, name: K, value: V) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.attrs.iter_mut().find(|attr| attr.name == name) {
            existing.value = value;
        } else {
            self.attrs.push(Attribute { name, value });
        }
        self
    }

    /// Render as ` name="value"` pairs in insertion order.
    #[must_use]
    pub fn render(&self) -> String {
        let mut result = String::new();
        for attr in &self.attrs {
            let _ = write!(result, " {}=\"{}\"", attr.name, attr.value);
        }
        result
    }
}

/// Escape the five XML special characters.
///
/// Used for attribute values and text content alike. Control characters
/// that XML 1.0 cannot carry are dropped.
#[must_use]
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            '\t' | '\n' | '\r' => result.push(c),
            c if c.is_control() => {}
            _ => result.push(c),
        }
    }
    result
}
