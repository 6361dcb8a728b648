use am_core::{ArchiModel, Layer, View};
use rustc_hash::FxHashSet;

/// The fixed views: id, display name and the layers each one shows.
pub const VIEW_DEFINITIONS: [(&str, &str, &[Layer]); 5] = [
    ("view-layered", "Full Layered View", &Layer::ALL),
    (
        "view-business-motivation",
        "Business & Motivation",
        &[Layer::Motivation, Layer::Business],
    ),
    ("view-application", "Application", &[Layer::Application]),
    ("view-technology", "Technology", &[Layer::Technology]),
    (
        "view-implementation",
        "Implementation & Migration",
        &[Layer::Implementation],
    ),
];

/// Build the five fixed views over `model`, or none when it is empty.
///
/// Views only reference existing ids. A relationship is listed in a view
/// when both of its endpoints are.
#[must_use]
pub fn generate_views(model: &ArchiModel) -> Vec<View> {
    if model.is_empty() {
        return Vec::new();
    }
    VIEW_DEFINITIONS
        .iter()
        .map(|(id, name, layers)| {
            let element_refs: Vec<String> = model
                .elements
                .iter()
                .filter(|element| layers.contains(&element.layer))
                .map(|element| element.id.clone())
                .collect();
            let members: FxHashSet<&str> = element_refs.iter().map(String::as_str).collect();
            let relationship_refs = model
                .relationships
                .iter()
                .filter(|relationship| {
                    members.contains(relationship.source_id.as_str())
                        && members.contains(relationship.target_id.as_str())
                })
                .map(|relationship| relationship.id.clone())
                .collect();
            View {
                id: (*id).to_string(),
                name: (*name).to_string(),
                element_refs,
                relationship_refs,
            }
        })
        .collect()
}
