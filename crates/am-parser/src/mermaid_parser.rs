use chumsky::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::table::is_fence;

/// Edge operators, compared longest-first.
const FLOW_OPERATORS: [&str; 11] = [
    "<-->", "-.->", "-.-", "==>", "===", "-->", "---", "--o", "--x", "o--o", "x--x",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    /// Display text; the id when no label was declared.
    pub label: String,
    pub subgraph: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

/// Nodes and edges of one fenced flow diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl ParsedGraph {
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// Extract every ```` ```mermaid ```` flow diagram from a Markdown document.
///
/// Fences whose first statement is not `graph`/`flowchart` are skipped.
#[must_use]
pub fn parse_graphs(input: &str) -> Vec<ParsedGraph> {
    let mut graphs = Vec::new();
    let mut lines = input.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if !is_fence(trimmed) {
            continue;
        }
        let is_mermaid = trimmed
            .trim_start_matches(['`', '~'])
            .split_whitespace()
            .next()
            .is_some_and(|tag| tag.eq_ignore_ascii_case("mermaid"));

        let mut body = String::new();
        for inner in lines.by_ref() {
            if is_fence(inner.trim()) {
                break;
            }
            body.push_str(inner);
            body.push('\n');
        }

        if is_mermaid {
            if let Some(graph) = parse_flow_graph(&body) {
                graphs.push(graph);
            }
        }
    }

    graphs
}

/// Parse the body of one diagram block; `None` for non-flow diagram kinds.
#[must_use]
pub fn parse_flow_graph(input: &str) -> Option<ParsedGraph> {
    let header = first_significant_line(input)?;
    if !is_flowchart_header(header) {
        return None;
    }

    let mut builder = GraphBuilder::default();
    let mut open_subgraphs: Vec<String> = Vec::new();
    let mut header_seen = false;

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        if !header_seen && is_flowchart_header(trimmed) {
            header_seen = true;
            // `graph LR; A --> B` keeps statements after the header.
            let Some((_, rest)) = trimmed.split_once(';') else {
                continue;
            };
            parse_line(rest, &mut builder, &mut open_subgraphs);
            continue;
        }
        parse_line(trimmed, &mut builder, &mut open_subgraphs);
    }

    Some(builder.finish())
}

fn parse_line(line: &str, builder: &mut GraphBuilder, open_subgraphs: &mut Vec<String>) {
    let uncommented = strip_flowchart_inline_comment(line);
    for statement in split_statements(uncommented) {
        if let Some((key, title)) = parse_subgraph_statement(statement) {
            open_subgraphs.push(title.unwrap_or(key));
            continue;
        }
        if statement == "end" {
            open_subgraphs.pop();
            continue;
        }
        if is_non_graph_statement(statement) {
            continue;
        }

        let subgraph = open_subgraphs.last().map(String::as_str);
        let (ast, errors) = flow_statement_parser().parse(statement).into_output_errors();
        if errors.is_empty() {
            if let Some(ast) = ast {
                lower_flow_ast(ast, subgraph, builder);
                continue;
            }
        }

        // Chains written without spaces (`A-->B-->C`) and less common
        // operators go through the hand-written scanner.
        if parse_edge_chain(statement, subgraph, builder) {
            continue;
        }
        if let Some(node) = parse_node_token(statement) {
            builder.intern_node(&node.id, node.label.as_deref(), subgraph);
        }
    }
}

#[derive(Default)]
struct GraphBuilder {
    graph: ParsedGraph,
    node_index_by_id: FxHashMap<String, usize>,
}

impl GraphBuilder {
    fn intern_node(&mut self, id: &str, label: Option<&str>, subgraph: Option<&str>) -> Option<String> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }

        if let Some(&index) = self.node_index_by_id.get(id) {
            let node = &mut self.graph.nodes[index];
            if node.label == node.id {
                if let Some(label) = clean_label(label) {
                    node.label = label;
                }
            }
            if node.subgraph.is_none() {
                node.subgraph = subgraph.map(str::to_string);
            }
            return Some(node.id.clone());
        }

        self.node_index_by_id
            .insert(id.to_string(), self.graph.nodes.len());
        self.graph.nodes.push(GraphNode {
            id: id.to_string(),
            label: clean_label(label).unwrap_or_else(|| id.to_string()),
            subgraph: subgraph.map(str::to_string),
        });
        Some(id.to_string())
    }

    fn push_edge(&mut self, from: String, to: String, label: Option<&str>) {
        self.graph.edges.push(GraphEdge {
            from,
            to,
            label: clean_label(label),
        });
    }

    fn finish(self) -> ParsedGraph {
        self.graph
    }
}

#[derive(Debug, Clone)]
struct NodeToken {
    id: String,
    label: Option<String>,
}

#[derive(Debug, Clone)]
enum FlowAst {
    Node(NodeToken),
    Chain {
        head: NodeToken,
        links: Vec<(Option<String>, NodeToken)>,
    },
}

fn delimited<'a>(
    open: &'static str,
    close: &'static str,
) -> impl Parser<'a, &'a str, &'a str, extra::Err<Rich<'a, char>>> + Clone {
    just(open)
        .ignore_then(any().and_is(just(close).not()).repeated().to_slice())
        .then_ignore(just(close))
}

/// Chumsky parser for one `;`-free flowchart statement.
fn flow_statement_parser<'a>() -> impl Parser<'a, &'a str, FlowAst, extra::Err<Rich<'a, char>>> {
    let inline_ws = any()
        .filter(|c: &char| *c == ' ' || *c == '\t')
        .repeated()
        .to(());

    let ident = any()
        .filter(|c: &char| c.is_alphanumeric() || matches!(*c, '_' | '.' | '/'))
        .repeated()
        .at_least(1)
        .to_slice();

    // Two-character delimiters before one-character ones.
    let shape = choice((
        delimited("((", "))"),
        delimited("([", "])"),
        delimited("[(", ")]"),
        delimited("[[", "]]"),
        delimited("{{", "}}"),
        delimited("[", "]"),
        delimited("(", ")"),
        delimited("{", "}"),
        delimited(">", "]"),
    ));

    let node = ident
        .clone()
        .then(shape.or_not())
        .then_ignore(just(":::").then(ident).or_not())
        .map(|(id, label): (&str, Option<&str>)| NodeToken {
            id: id.to_string(),
            label: clean_label(label),
        });

    let arrow = choice((
        just("-.->"),
        just("==>"),
        just("-->"),
        just("---"),
        just("--o"),
        just("--x"),
    ));

    let pipe_label = just('|')
        .ignore_then(any().filter(|c: &char| *c != '|').repeated().to_slice())
        .then_ignore(just('|'))
        .map(|raw: &str| clean_label(Some(raw)));

    let link = inline_ws
        .clone()
        .ignore_then(arrow)
        .ignore_then(inline_ws.clone())
        .ignore_then(pipe_label.or_not())
        .then_ignore(inline_ws.clone())
        .then(node.clone())
        .map(|(label, target): (Option<Option<String>>, NodeToken)| (label.flatten(), target));

    let chain = node
        .clone()
        .then(link.repeated().at_least(1).collect::<Vec<_>>())
        .then_ignore(inline_ws.clone())
        .then_ignore(end())
        .map(|(head, links)| FlowAst::Chain { head, links });

    let single = node
        .then_ignore(inline_ws)
        .then_ignore(end())
        .map(FlowAst::Node);

    choice((chain, single))
}

fn lower_flow_ast(ast: FlowAst, subgraph: Option<&str>, builder: &mut GraphBuilder) {
    match ast {
        FlowAst::Node(node) => {
            builder.intern_node(&node.id, node.label.as_deref(), subgraph);
        }
        FlowAst::Chain { head, links } => {
            let Some(mut from) = builder.intern_node(&head.id, head.label.as_deref(), subgraph)
            else {
                return;
            };
            for (label, target) in links {
                let Some(to) = builder.intern_node(&target.id, target.label.as_deref(), subgraph)
                else {
                    return;
                };
                builder.push_edge(from, to.clone(), label.as_deref());
                from = to;
            }
        }
    }
}

fn parse_edge_chain(statement: &str, subgraph: Option<&str>, builder: &mut GraphBuilder) -> bool {
    let Some((first_index, first_operator)) = find_operator_from_index(statement, 0) else {
        return false;
    };
    let Some(left) = parse_node_token(&statement[..first_index]) else {
        return false;
    };
    let Some(mut from) = builder.intern_node(&left.id, left.label.as_deref(), subgraph) else {
        return false;
    };

    let mut operator_index = first_index;
    let mut operator = first_operator;
    let mut pushed = false;
    loop {
        let rhs_start = operator_index + operator.len();
        let next = find_operator_from_index(statement, rhs_start);
        let right_segment = match next {
            Some((next_index, _)) => &statement[rhs_start..next_index],
            None => &statement[rhs_start..],
        };

        let (label, right) = extract_pipe_label(right_segment);
        let Some(right_node) = parse_node_token(right) else {
            return pushed;
        };
        let Some(to) = builder.intern_node(&right_node.id, right_node.label.as_deref(), subgraph)
        else {
            return pushed;
        };
        builder.push_edge(from, to.clone(), label.as_deref());
        pushed = true;

        match next {
            Some((next_index, next_operator)) => {
                from = to;
                operator_index = next_index;
                operator = next_operator;
            }
            None => return true,
        }
    }
}

/// Next edge operator at or after `start_index`, ignoring text inside
/// quotes and node brackets.
fn find_operator_from_index(statement: &str, start_index: usize) -> Option<(usize, &'static str)> {
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0_usize;

    for (idx, ch) in statement.char_indices() {
        if idx < start_index {
            continue;
        }
        if let Some(quote) = in_quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => {
                in_quote = Some(ch);
                continue;
            }
            '[' | '(' | '{' => {
                depth = depth.saturating_add(1);
                continue;
            }
            ']' | ')' | '}' => {
                depth = depth.saturating_sub(1);
                continue;
            }
            _ => {}
        }
        if depth != 0 {
            continue;
        }

        let tail = &statement[idx..];
        let best = FLOW_OPERATORS
            .iter()
            .filter(|operator| tail.starts_with(**operator))
            .max_by_key(|operator| operator.len());
        if let Some(operator) = best {
            return Some((idx, *operator));
        }
    }

    None
}

fn extract_pipe_label(right_hand_side: &str) -> (Option<String>, &str) {
    let trimmed = right_hand_side.trim();
    let Some(after_open) = trimmed.strip_prefix('|') else {
        return (None, trimmed);
    };
    let Some(close_idx) = after_open.find('|') else {
        return (None, trimmed);
    };
    (
        clean_label(Some(&after_open[..close_idx])),
        after_open[close_idx + 1..].trim(),
    )
}

fn parse_node_token(raw: &str) -> Option<NodeToken> {
    let trimmed = raw.trim();
    let core = trimmed.split(":::").next().unwrap_or(trimmed).trim();
    if core.is_empty() {
        return None;
    }

    const WRAPPERS: [(&str, &str); 9] = [
        ("((", "))"),
        ("([", "])"),
        ("[(", ")]"),
        ("[[", "]]"),
        ("{{", "}}"),
        ("[", "]"),
        ("(", ")"),
        ("{", "}"),
        (">", "]"),
    ];
    if let Some(token) = WRAPPERS
        .iter()
        .find_map(|(open, close)| parse_wrapped(core, open, close))
    {
        return Some(token);
    }

    let id = normalize_identifier(core);
    if id.is_empty() {
        return None;
    }
    let label = clean_label(Some(core)).filter(|value| value != &id);
    Some(NodeToken { id, label })
}

fn parse_wrapped(raw: &str, open: &str, close: &str) -> Option<NodeToken> {
    let start = raw.find(open)?;
    if !raw.ends_with(close) {
        return None;
    }
    let inner_start = start + open.len();
    let end = raw.len().saturating_sub(close.len());
    if inner_start > end {
        return None;
    }

    let label_raw = raw[inner_start..end].trim();
    let mut id = normalize_identifier(&raw[..start]);
    if id.is_empty() {
        id = normalize_identifier(label_raw);
    }
    if id.is_empty() {
        return None;
    }
    Some(NodeToken {
        id,
        label: clean_label(Some(label_raw)),
    })
}

fn normalize_identifier(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim_matches('`')
        .trim();
    if cleaned.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(cleaned.len());
    for ch in cleaned.chars() {
        if ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | '/') {
            out.push(ch);
        } else if !out.is_empty() {
            break;
        }
    }
    if !out.is_empty() {
        return out;
    }

    let mut fallback = String::with_capacity(cleaned.len());
    for grapheme in cleaned.graphemes(true) {
        if grapheme
            .chars()
            .all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-'))
        {
            fallback.push_str(grapheme);
        } else {
            fallback.push('_');
        }
    }
    fallback.trim_matches('_').to_string()
}

fn clean_label(raw: Option<&str>) -> Option<String> {
    let cleaned = raw?
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim_matches('`')
        .trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn normalize_subgraph_title(raw: &str) -> Option<String> {
    let title = clean_label(Some(raw))?;
    let unwrapped = [('[', ']'), ('(', ')'), ('{', '}')]
        .iter()
        .find_map(|(open, close)| {
            title
                .strip_prefix(*open)
                .and_then(|value| value.strip_suffix(*close))
        })
        .map(str::trim)
        .unwrap_or(&title);
    clean_label(Some(unwrapped))
}

/// `subgraph id [Title]` and friends; returns `(id, title)`.
fn parse_subgraph_statement(statement: &str) -> Option<(String, Option<String>)> {
    let rest = statement.trim_start().strip_prefix("subgraph")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let body = rest.trim();
    if body.is_empty() {
        return None;
    }

    if body.starts_with(['"', '\'']) {
        let title = clean_label(Some(body))?;
        return Some((normalize_identifier(&title), Some(title)));
    }

    if let Some(split_index) = body.find(char::is_whitespace) {
        let (candidate_key, candidate_title) = body.split_at(split_index);
        let title_has_wrappers = candidate_title
            .trim_start()
            .starts_with(['[', '(', '{', '"', '\'', '`']);
        let key = normalize_identifier(candidate_key);
        if !key.is_empty() && title_has_wrappers && !candidate_key.contains(['[', '(', '{']) {
            return Some((key, normalize_subgraph_title(candidate_title)));
        }
    }

    if let Some(node) = parse_node_token(body) {
        if !node.id.is_empty() {
            return Some((node.id, node.label));
        }
    }
    None
}

fn split_statements(line: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0_usize;

    for (i, c) in line.char_indices() {
        if let Some(q) = in_quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                in_quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_quote = Some(c),
            '[' | '(' | '{' => depth = depth.saturating_add(1),
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                let segment = line[current_start..i].trim();
                if !segment.is_empty() {
                    statements.push(segment);
                }
                current_start = i + 1;
            }
            _ => {}
        }
    }

    let remainder = line[current_start..].trim();
    if !remainder.is_empty() {
        statements.push(remainder);
    }
    statements
}

fn strip_flowchart_inline_comment(line: &str) -> &str {
    let mut in_quote: Option<char> = None;
    let mut depth = 0_usize;

    for (idx, ch) in line.char_indices() {
        if let Some(quote) = in_quote {
            if ch == quote {
                in_quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => in_quote = Some(ch),
            '[' | '(' | '{' => depth = depth.saturating_add(1),
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            '%' if depth == 0 && line[idx..].starts_with("%%") => {
                let at_boundary = line[..idx]
                    .chars()
                    .next_back()
                    .is_none_or(char::is_whitespace);
                if at_boundary {
                    return line[..idx].trim_end();
                }
            }
            _ => {}
        }
    }

    line
}

fn first_significant_line(input: &str) -> Option<&str> {
    input
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !is_comment(line))
}

fn is_flowchart_header(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    let keyword = lower
        .split(|ch: char| ch.is_whitespace() || ch == ';')
        .next()
        .unwrap_or_default();
    keyword == "graph" || keyword == "flowchart" || keyword == "flowchart-elk"
}

fn is_non_graph_statement(statement: &str) -> bool {
    ["style ", "classDef ", "linkStyle ", "class ", "click ", "direction "]
        .iter()
        .any(|prefix| statement.starts_with(prefix))
}

fn is_comment(line: &str) -> bool {
    line.starts_with("%%")
}
