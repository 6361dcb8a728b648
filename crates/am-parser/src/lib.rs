#![forbid(unsafe_code)]

//! Primitive parsers over Markdown documents.
//!
//! Every function here is total: arbitrary text goes in, a (possibly empty)
//! structure comes out.

mod front_matter;
mod mermaid_parser;
mod table;

use serde::{Deserialize, Serialize};

pub use front_matter::{FrontMatter, parse_front_matter, split_front_matter_block};
pub use mermaid_parser::{GraphEdge, GraphNode, ParsedGraph, parse_flow_graph, parse_graphs};
pub use table::{Column, ParsedTable, TableRow, parse_tables};

/// Everything the extractor needs from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub front_matter: FrontMatter,
    pub tables: Vec<ParsedTable>,
    pub graphs: Vec<ParsedGraph>,
}

/// Run all three primitive parsers over one document.
#[must_use]
pub fn parse_document(content: &str) -> ParsedDocument {
    let (body, _) = split_front_matter_block(content);
    ParsedDocument {
        front_matter: parse_front_matter(content),
        tables: parse_tables(body),
        graphs: parse_graphs(body),
    }
}
