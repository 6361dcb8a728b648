use std::collections::{BTreeMap, BTreeSet};

use am_core::{
    ArchiModel, ClassifiedModel, ElementType, Layer, RelationshipOrigin, StatusCounts,
};
use serde::{Deserialize, Serialize};

/// Element counts of the three filtered diagrams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramCounts {
    pub as_is: usize,
    pub target: usize,
    pub migration: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginCounts {
    pub explicit: usize,
    pub diagram: usize,
    pub cross_layer: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub total_elements: usize,
    pub total_relationships: usize,
    /// Every layer is present, zero when unused.
    pub by_layer: BTreeMap<Layer, usize>,
    pub by_type: BTreeMap<ElementType, usize>,
    pub by_migration_status: StatusCounts,
    pub diagrams: DiagramCounts,
    pub relationships_by_origin: OriginCounts,
    /// Distinct source documents, sorted.
    pub sources: Vec<String>,
}

#[must_use]
pub fn summarize(model: &ArchiModel, classified: &ClassifiedModel) -> ModelSummary {
    let mut by_layer: BTreeMap<Layer, usize> = Layer::ALL.iter().map(|layer| (*layer, 0)).collect();
    let mut by_type: BTreeMap<ElementType, usize> = BTreeMap::new();
    let mut sources = BTreeSet::new();
    for element in &model.elements {
        *by_layer.entry(element.layer).or_default() += 1;
        *by_type.entry(element.element_type).or_default() += 1;
        sources.insert(element.source.clone());
    }

    let mut relationships_by_origin = OriginCounts::default();
    for relationship in &model.relationships {
        match relationship.origin {
            RelationshipOrigin::Explicit => relationships_by_origin.explicit += 1,
            RelationshipOrigin::Diagram => relationships_by_origin.diagram += 1,
            RelationshipOrigin::CrossLayer => relationships_by_origin.cross_layer += 1,
        }
    }

    let by_migration_status = classified.element_counts();
    ModelSummary {
        total_elements: model.elements.len(),
        total_relationships: model.relationships.len(),
        by_layer,
        by_type,
        by_migration_status,
        diagrams: DiagramCounts {
            as_is: by_migration_status.keep + by_migration_status.remove,
            target: by_migration_status.keep + by_migration_status.add,
            migration: by_migration_status.total(),
        },
        relationships_by_origin,
        sources: sources.into_iter().collect(),
    }
}

/// Render a summary as Markdown tables.
#[must_use]
pub fn render_markdown(model_name: &str, summary: &ModelSummary) -> String {
    let title = if model_name.trim().is_empty() {
        "Architecture Model"
    } else {
        model_name.trim()
    };
    let mut lines = vec![
        format!("# {title}: model summary"),
        String::new(),
        "| Metric | Count |".to_string(),
        "|---|---:|".to_string(),
        format!("| Elements | {} |", summary.total_elements),
        format!("| Relationships | {} |", summary.total_relationships),
        format!("| Explicit relationships | {} |", summary.relationships_by_origin.explicit),
        format!("| Diagram relationships | {} |", summary.relationships_by_origin.diagram),
        format!(
            "| Cross-layer relationships | {} |",
            summary.relationships_by_origin.cross_layer
        ),
        String::new(),
        "## By layer".to_string(),
        String::new(),
        "| Layer | Elements |".to_string(),
        "|---|---:|".to_string(),
    ];
    for layer in Layer::ALL {
        let count = summary.by_layer.get(&layer).copied().unwrap_or(0);
        lines.push(format!("| {} | {count} |", layer.as_str()));
    }

    lines.extend([
        String::new(),
        "## By type".to_string(),
        String::new(),
    ]);
    if summary.by_type.is_empty() {
        lines.push("No elements.".to_string());
    } else {
        lines.push("| Type | Elements |".to_string());
        lines.push("|---|---:|".to_string());
        for (element_type, count) in &summary.by_type {
            lines.push(format!("| {} | {count} |", element_type.as_str()));
        }
    }

    let status = summary.by_migration_status;
    lines.extend([
        String::new(),
        "## Migration".to_string(),
        String::new(),
        "| Status | Elements |".to_string(),
        "|---|---:|".to_string(),
        format!("| keep | {} |", status.keep),
        format!("| add | {} |", status.add),
        format!("| remove | {} |", status.remove),
        String::new(),
        "| Diagram | Elements |".to_string(),
        "|---|---:|".to_string(),
        format!("| As-Is | {} |", summary.diagrams.as_is),
        format!("| Target | {} |", summary.diagrams.target),
        format!("| Migration | {} |", summary.diagrams.migration),
        String::new(),
        "## Sources".to_string(),
        String::new(),
    ]);
    if summary.sources.is_empty() {
        lines.push("No source documents contributed elements.".to_string());
    } else {
        lines.extend(summary.sources.iter().map(|source| format!("- {source}")));
    }
    lines.push(String::new());
    lines.join("\n")
}
