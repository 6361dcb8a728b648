//! Baseline/target classification of an extracted model.

use am_core::{
    ArchiModel, ClassifiedElement, ClassifiedModel, ClassifiedRelationship, Document, Element,
    ElementType, MigrationStatus, clean_cell_text, is_placeholder, normalize_name,
};
use am_parser::{Column, parse_tables, split_front_matter_block};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Tag every element and relationship of `model` as keep, add or remove.
///
/// Precedence per element: Gap elements are always `add`; a status recorded
/// at extraction comes next; then baseline/target signals from gap tables in
/// `documents`; everything else is `keep`. A relationship takes the dominant
/// status of its endpoints and its own recorded status.
#[must_use]
pub fn classify(model: &ArchiModel, documents: &[Document]) -> ClassifiedModel {
    let signals = gap_table_signals(documents);

    let elements: Vec<ClassifiedElement> = model
        .elements
        .iter()
        .map(|element| ClassifiedElement {
            status: element_status(element, &signals),
            element: element.clone(),
        })
        .collect();

    let by_id: FxHashMap<&str, MigrationStatus> = elements
        .iter()
        .map(|classified| (classified.element.id.as_str(), classified.status))
        .collect();

    let relationships = model
        .relationships
        .iter()
        .map(|relationship| {
            let endpoint = |id: &str| by_id.get(id).copied().unwrap_or_default();
            let status = endpoint(&relationship.source_id)
                .dominant(endpoint(&relationship.target_id))
                .dominant(relationship.migration_status.unwrap_or_default());
            ClassifiedRelationship {
                relationship: relationship.clone(),
                status,
            }
        })
        .collect();

    let classified = ClassifiedModel {
        name: model.name.clone(),
        elements,
        relationships,
    };
    let counts = classified.element_counts();
    debug!(
        keep = counts.keep,
        add = counts.add,
        remove = counts.remove,
        signals = signals.len(),
        "migration classification"
    );
    classified
}

fn element_status(element: &Element, signals: &FxHashMap<String, MigrationStatus>) -> MigrationStatus {
    if element.element_type == ElementType::Gap {
        return MigrationStatus::Add;
    }
    element
        .migration_status
        .or_else(|| signals.get(&normalize_name(&element.name)).copied())
        .unwrap_or_default()
}

/// Statuses implied by Baseline/Target columns, keyed by normalized name.
///
/// A name that only exists on the baseline side is being removed; a name
/// that only exists on the target side is being added.
fn gap_table_signals(documents: &[Document]) -> FxHashMap<String, MigrationStatus> {
    let mut signals: FxHashMap<String, MigrationStatus> = FxHashMap::default();
    for document in documents {
        let (body, _) = split_front_matter_block(&document.content);
        for table in parse_tables(body) {
            if !table.has(Column::Baseline) || !table.has(Column::Target) {
                continue;
            }
            for row in &table.rows {
                let baseline = clean_cell_text(row.get(Column::Baseline).unwrap_or_default());
                let target = clean_cell_text(row.get(Column::Target).unwrap_or_default());
                let signal = if !is_placeholder(&baseline)
                    && (is_placeholder(&target)
                        || MigrationStatus::from_marker(&target) == Some(MigrationStatus::Remove))
                {
                    Some((baseline, MigrationStatus::Remove))
                } else if is_placeholder(&baseline) && !is_placeholder(&target) {
                    Some((target, MigrationStatus::Add))
                } else {
                    None
                };
                if let Some((name, status)) = signal {
                    let key = normalize_name(&name);
                    if key.is_empty() {
                        continue;
                    }
                    signals
                        .entry(key)
                        .and_modify(|existing| *existing = existing.dominant(status))
                        .or_insert(status);
                }
            }
        }
    }
    signals
}
