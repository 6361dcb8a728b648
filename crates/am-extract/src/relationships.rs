//! Relationship discovery, run after every document has been dispatched.

use am_core::{Layer, RelationshipOrigin, RelationshipType, contains_word_run, normalize_name};
use am_parser::ParsedGraph;
use tracing::{debug, trace};

use crate::builder::ModelBuilder;

/// Resolve the links recorded by the per-phase rules.
pub(crate) fn explicit_pass(builder: &mut ModelBuilder<'_>) -> usize {
    let mut created = 0;
    for link in builder.take_pending() {
        let (Some(source), Some(target)) = (builder.resolve(&link.source), builder.resolve(&link.target))
        else {
            trace!(?link, "dropped link with unresolved end");
            continue;
        };
        if builder
            .insert_relationship(
                link.relationship_type,
                &source,
                &target,
                RelationshipOrigin::Explicit,
                None,
            )
            .is_some()
        {
            created += 1;
        }
    }
    debug!(created, "explicit relationship pass");
    created
}

/// One `Association` per diagram edge whose ends both name known elements.
pub(crate) fn diagram_pass<'g>(
    builder: &mut ModelBuilder<'_>,
    graphs: impl IntoIterator<Item = &'g ParsedGraph>,
) -> usize {
    let mut created = 0;
    for graph in graphs {
        for edge in &graph.edges {
            let source = resolve_node(builder, graph, &edge.from);
            let target = resolve_node(builder, graph, &edge.to);
            let (Some(source), Some(target)) = (source, target) else {
                trace!(from = %edge.from, to = %edge.to, "dropped diagram edge with unknown endpoint");
                continue;
            };
            if builder
                .insert_relationship(
                    RelationshipType::Association,
                    &source,
                    &target,
                    RelationshipOrigin::Diagram,
                    edge.label.clone(),
                )
                .is_some()
            {
                created += 1;
            }
        }
    }
    debug!(created, "diagram relationship pass");
    created
}

/// Diagram nodes draw systems and actors, so core-layer elements win a name clash.
fn resolve_node(builder: &ModelBuilder<'_>, graph: &ParsedGraph, node_id: &str) -> Option<String> {
    let label = graph.node(node_id).map_or(node_id, |node| node.label.as_str());
    builder
        .find_by_name_preferring(label, Layer::is_core)
        .or_else(|| builder.find_by_name_preferring(node_id, Layer::is_core))
        .map(str::to_string)
}

/// Link same-named elements that sit on different core layers.
///
/// Names match when their normalized forms are equal, or when the shorter
/// one (at least `min_chars` long) is a run of whole words in the longer.
pub(crate) fn cross_layer_pass(builder: &mut ModelBuilder<'_>, min_chars: usize) -> usize {
    let candidates: Vec<(String, Layer, String)> = builder
        .elements()
        .iter()
        .filter(|element| element.layer.is_core())
        .map(|element| (element.id.clone(), element.layer, normalize_name(&element.name)))
        .collect();

    let mut created = 0;
    for (index, (source_id, source_layer, source_name)) in candidates.iter().enumerate() {
        for (target_id, target_layer, target_name) in &candidates[index + 1..] {
            if source_layer == target_layer
                || !names_overlap(source_name, target_name, min_chars)
                || builder.connected(source_id, target_id)
            {
                continue;
            }
            if builder
                .insert_relationship(
                    RelationshipType::Association,
                    source_id,
                    target_id,
                    RelationshipOrigin::CrossLayer,
                    None,
                )
                .is_some()
            {
                created += 1;
            }
        }
    }
    debug!(created, candidates = candidates.len(), "cross-layer relationship pass");
    created
}

pub(crate) fn names_overlap(a: &str, b: &str, min_chars: usize) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    shorter.chars().count() >= min_chars && contains_word_run(longer, shorter)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use am_core::{ElementType, IdGenerator};
    use am_parser::parse_graphs;

    use super::*;
    use crate::builder::LinkEnd;

    fn add(builder: &mut ModelBuilder<'_>, element_type: ElementType, name: &str) -> String {
        builder
            .add_element(element_type, name, "doc.md", BTreeMap::new(), None)
            .unwrap_or_default()
    }

    #[test]
    fn overlap_requires_whole_words_and_min_length() {
        assert!(names_overlap("api gateway", "api gateway", 4));
        assert!(names_overlap("crm", "crm", 4));
        assert!(names_overlap("orders", "orders service", 4));
        assert!(!names_overlap("crm", "crm database", 4));
        assert!(!names_overlap("order", "orders service", 4));
        assert!(!names_overlap("", "anything", 0));
    }

    #[test]
    fn explicit_links_resolve_by_id_or_name() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        let process = add(&mut builder, ElementType::BusinessProcess, "Invoice Handling");
        add(&mut builder, ElementType::BusinessActor, "Finance Team");
        builder.link(
            RelationshipType::Assignment,
            LinkEnd::Name("finance team".into()),
            LinkEnd::Id(process.clone()),
        );
        builder.link(
            RelationshipType::Assignment,
            LinkEnd::Name("Nobody".into()),
            LinkEnd::Id(process),
        );
        assert_eq!(explicit_pass(&mut builder), 1);
        let model = builder.finish("m");
        assert_eq!(model.relationships[0].id, "rel-exp-0001");
        assert_eq!(model.relationships[0].source_id, "el-0002");
    }

    #[test]
    fn diagram_edges_resolve_by_label_then_id() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        add(&mut builder, ElementType::ApplicationComponent, "Web Shop");
        add(&mut builder, ElementType::SystemSoftware, "Orders DB");
        let graphs = parse_graphs(
            "```mermaid\ngraph LR\n  shop[Web Shop] -->|reads| db[Orders DB]\n  shop --> ghost[Ghost]\n```\n",
        );
        assert_eq!(diagram_pass(&mut builder, &graphs), 1);
        let model = builder.finish("m");
        let relationship = &model.relationships[0];
        assert_eq!(relationship.id, "rel-dia-0001");
        assert_eq!(relationship.name.as_deref(), Some("reads"));
        assert_eq!(relationship.relationship_type, RelationshipType::Association);
    }

    #[test]
    fn diagram_edges_skip_same_named_motivation_elements() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        add(&mut builder, ElementType::Goal, "Mobile App");
        let app = add(&mut builder, ElementType::ApplicationComponent, "Mobile App");
        let api = add(&mut builder, ElementType::ApplicationInterface, "Public API");
        let graphs = parse_graphs("```mermaid\nflowchart LR\n  app[Mobile App] --> api[Public API]\n```\n");
        assert_eq!(diagram_pass(&mut builder, &graphs), 1);
        let model = builder.finish("m");
        assert_eq!(model.relationships[0].source_id, app);
        assert_eq!(model.relationships[0].target_id, api);
    }

    #[test]
    fn cross_layer_links_each_pair_once() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        let app = add(&mut builder, ElementType::ApplicationComponent, "API Gateway");
        let tech = add(&mut builder, ElementType::Node, "api-gateway");
        add(&mut builder, ElementType::ApplicationInterface, "API Gateway");
        add(&mut builder, ElementType::Goal, "API Gateway");
        let created = cross_layer_pass(&mut builder, 4);
        // component-node and interface-node; same-layer and motivation pairs are skipped
        assert_eq!(created, 2);
        assert!(builder.connected(&app, &tech));
        assert_eq!(cross_layer_pass(&mut builder, 4), 0);
    }

    #[test]
    fn cross_layer_skips_already_connected_pairs() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        let app = add(&mut builder, ElementType::ApplicationComponent, "Billing");
        let tech = add(&mut builder, ElementType::Node, "Billing");
        builder.insert_relationship(
            RelationshipType::Serving,
            &tech,
            &app,
            RelationshipOrigin::Explicit,
            None,
        );
        assert_eq!(cross_layer_pass(&mut builder, 4), 0);
    }
}
