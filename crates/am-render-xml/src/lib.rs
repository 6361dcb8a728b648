#![forbid(unsafe_code)]

//! XML serializers for extracted architecture models.
//!
//! [`serialize_exchange`] writes the Open Group exchange format read by
//! ArchiMate tools. [`render_drawio`] writes the three migration diagrams
//! (and a combined multi-tab file) for draw.io. Both share the grid from
//! `am-layout` and the escaping element builder in this crate.

pub mod attributes;
pub mod document;
pub mod drawio;
pub mod element;
pub mod exchange;
pub mod theme;

pub use attributes::{Attribute, AttributeValue, Attributes, escape_xml};
pub use document::{XML_DECLARATION, XmlDocument};
pub use drawio::{
    DiagramKind, DrawioExport, diagram_element, render_drawio, serialize_combined,
    serialize_diagram,
};
pub use element::XmlElement;
pub use exchange::{ARCHIMATE_NAMESPACE, exchange_document, serialize_exchange};
pub use theme::{Palette, Style};
