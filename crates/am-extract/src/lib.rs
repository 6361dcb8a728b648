#![forbid(unsafe_code)]

//! Phase-aware extraction of an [`ArchiModel`] from Markdown documents.
//!
//! Each document is parsed once, dispatched to the rules of its phase, and
//! the resulting elements are then linked by three relationship passes:
//! explicit table links, diagram edges and the cross-layer name heuristic.

mod builder;
mod migration;
mod phase;
mod relationships;
mod rules;
mod summary;
mod technology;
mod views;

use am_core::{ArchiModel, Document, IdGenerator, ModelMetadata};
use am_parser::parse_document;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use migration::classify;
pub use phase::{PHASE_KEYS, Phase};
pub use summary::{DiagramCounts, ModelSummary, OriginCounts, render_markdown, summarize};
pub use technology::{TECHNOLOGY_RULES, infer_technology_type};
pub use views::{VIEW_DEFINITIONS, generate_views};

use builder::ModelBuilder;

/// Version string recorded in model metadata.
pub const GENERATOR_VERSION: &str = concat!("archimodel ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub cross_layer_inference: bool,
    /// Shortest name the cross-layer pass matches inside a longer one.
    pub cross_layer_min_chars: usize,
    /// Stamped into the metadata; the caller owns the clock.
    #[serde(skip)]
    pub exported_at: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            cross_layer_inference: true,
            cross_layer_min_chars: 4,
            exported_at: None,
        }
    }
}

/// One extraction pipeline with its own id sequence.
///
/// Every call to [`Extractor::extract`] starts from fresh counters, so
/// repeated runs over the same documents yield identical ids. Separate
/// extractors share nothing.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    ids: IdGenerator,
    options: ExtractOptions,
}

impl Extractor {
    #[must_use]
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            ids: IdGenerator::new(),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn reset(&mut self) {
        self.ids.reset();
    }

    /// Build a model from `documents`. Never fails; unusable input yields an
    /// empty model with no views.
    pub fn extract(&mut self, documents: &[Document], model_name: &str) -> ArchiModel {
        self.reset();
        let options = &self.options;
        let mut builder = ModelBuilder::new(&mut self.ids);

        let parsed: Vec<_> = documents
            .iter()
            .map(|document| (document, parse_document(&document.content)))
            .collect();

        for (document, parsed) in &parsed {
            let before = builder.elements().len();
            match Phase::detect(&parsed.front_matter, &document.name) {
                Some(phase) => {
                    rules::apply_phase_rules(phase, parsed, &document.name, &mut builder);
                    debug!(
                        document = %document.name,
                        phase = phase.as_str(),
                        tables = parsed.tables.len(),
                        elements = builder.elements().len() - before,
                        "dispatched document"
                    );
                }
                None => debug!(document = %document.name, "no phase detected; diagrams only"),
            }
        }

        relationships::explicit_pass(&mut builder);
        relationships::diagram_pass(&mut builder, parsed.iter().flat_map(|(_, parsed)| &parsed.graphs));
        if options.cross_layer_inference {
            relationships::cross_layer_pass(&mut builder, options.cross_layer_min_chars);
        }
        debug!(
            elements = builder.elements().len(),
            relationships = builder.relationship_count(),
            "extraction finished"
        );

        let mut model = builder.finish(model_name);
        model.views = generate_views(&model);
        model.metadata = ModelMetadata {
            exported_at: options.exported_at.clone(),
            vault_file_count: documents.len(),
            generator_version: GENERATOR_VERSION.to_string(),
        };
        model
    }
}

/// Extract with default options and a throwaway [`Extractor`].
#[must_use]
pub fn extract(documents: &[Document], model_name: &str) -> ArchiModel {
    Extractor::default().extract(documents, model_name)
}

#[cfg(test)]
mod tests {
    use am_core::{ElementType, Layer, MigrationStatus, RelationshipOrigin, RelationshipType};
    use proptest::prelude::*;

    use super::*;

    fn doc(name: &str, content: &str) -> Document {
        Document::new(name, content)
    }

    fn find<'m>(model: &'m ArchiModel, element_type: ElementType, name: &str) -> Option<&'m am_core::Element> {
        model
            .elements
            .iter()
            .find(|element| element.element_type == element_type && element.name == name)
    }

    #[test]
    fn empty_input_yields_empty_model() {
        let model = extract(&[], "Empty");
        assert!(model.elements.is_empty());
        assert!(model.relationships.is_empty());
        assert!(model.views.is_empty());
        assert_eq!(model.metadata.vault_file_count, 0);
        assert_eq!(model.validate(), Ok(()));
    }

    #[test]
    fn technology_rows_infer_types() {
        let content = "---\nphase: D\n---\n| Component | Service | Environment | Notes |\n|---|---|---|---|\n| PostgreSQL Database | RDS | Production | primary |\n| Payment Gateway Node | EC2 | Production | |\n";
        let model = extract(&[doc("technology.md", content)], "Tech");
        let db = find(&model, ElementType::SystemSoftware, "PostgreSQL Database");
        assert!(db.is_some());
        assert_eq!(db.map(|element| element.layer), Some(Layer::Technology));
        assert_eq!(
            db.and_then(|element| element.properties.get("Environment")).map(String::as_str),
            Some("Production")
        );
        assert!(find(&model, ElementType::Node, "Payment Gateway Node").is_some());
    }

    #[test]
    fn gap_analysis_rows_become_added_gaps() {
        let content = "---\nphase: Business Architecture\n---\n## Gap Analysis\n\n| Baseline | Target | Gap | Action |\n|---|---|---|---|\n| Manual X | Automated X | No automation | Build Y |\n";
        let model = extract(&[doc("business.md", content)], "Biz");
        let gaps: Vec<_> = model
            .elements
            .iter()
            .filter(|element| element.element_type == ElementType::Gap)
            .collect();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].name, "No automation");
        assert_eq!(gaps[0].migration_status, Some(MigrationStatus::Add));
        assert_eq!(gaps[0].properties.get("Action").map(String::as_str), Some("Build Y"));
        let classified = classify(&model, &[doc("business.md", content)]);
        assert_eq!(classified.elements[0].status, MigrationStatus::Add);
    }

    #[test]
    fn api_gateway_in_two_layers_is_linked() {
        let application = "---\nphase: C\n---\n| Application | Interfaces |\n|---|---|\n| API Gateway | REST |\n";
        let technology = "---\nphase: D\n---\n| Component | Notes |\n|---|---|\n| API Gateway | edge |\n";
        let model = extract(
            &[doc("apps.md", application), doc("infra.md", technology)],
            "Vault",
        );
        let app = find(&model, ElementType::ApplicationComponent, "API Gateway").map(|element| element.id.clone());
        let node = find(&model, ElementType::Node, "API Gateway").map(|element| element.id.clone());
        let (Some(app), Some(node)) = (app, node) else {
            panic!("both gateway elements extracted: {:?}", model.elements);
        };
        assert!(model.relationships.iter().any(|relationship| {
            relationship.origin == RelationshipOrigin::CrossLayer
                && relationship.id.starts_with("rel-xl-")
                && [&relationship.source_id, &relationship.target_id].contains(&&app)
                && [&relationship.source_id, &relationship.target_id].contains(&&node)
        }));
        assert!(model.relationships.iter().any(|relationship| {
            relationship.relationship_type == RelationshipType::Composition && relationship.source_id == app
        }));
    }

    #[test]
    fn cross_layer_inference_can_be_disabled() {
        let application = "---\nphase: C\n---\n| Application |\n|---|\n| API Gateway |\n";
        let technology = "---\nphase: D\n---\n| Component |\n|---|\n| API Gateway |\n";
        let mut extractor = Extractor::new(ExtractOptions {
            cross_layer_inference: false,
            ..ExtractOptions::default()
        });
        let model = extractor.extract(&[doc("a.md", application), doc("t.md", technology)], "V");
        assert_eq!(model.elements.len(), 2);
        assert!(model.relationships.is_empty());
    }

    #[test]
    fn vision_stakeholders_spawn_linked_drivers() {
        let content = "---\nphase: A\n---\n| Stakeholder | Concerns |\n|---|---|\n| CFO | Cost, Compliance |\n| CIO | cost |\n";
        let model = extract(&[doc("vision.md", content)], "V");
        let drivers: Vec<&str> = model
            .elements
            .iter()
            .filter(|element| element.element_type == ElementType::Driver)
            .map(|element| element.name.as_str())
            .collect();
        assert_eq!(drivers, vec!["Cost", "Compliance"]);
        assert_eq!(model.relationships.len(), 3);
        assert!(model
            .relationships
            .iter()
            .all(|relationship| relationship.relationship_type == RelationshipType::Association));
    }

    #[test]
    fn opportunities_realize_their_abb_peer() {
        let content = "---\nphase: E\n---\n| ABB | SBB |\n|---|---|\n| FR-12 Payments | Stripe Integration |\n| Identity | Keycloak |\n";
        let model = extract(&[doc("opportunities.md", content)], "O");
        assert!(find(&model, ElementType::Requirement, "FR-12 Payments").is_some());
        assert!(find(&model, ElementType::Deliverable, "Identity").is_some());
        let realizations = model
            .relationships
            .iter()
            .filter(|relationship| relationship.relationship_type == RelationshipType::Realization)
            .count();
        assert_eq!(realizations, 2);
    }

    #[test]
    fn every_building_block_row_with_an_sbb_has_one_realization() {
        let content = "---\nphase: E\n---\n| ABB | SBB |\n|---|---|\n| Identity Service | Identity Service |\n| - | Keycloak |\n| Payments | Stripe |\n";
        let model = extract(&[doc("opportunities.md", content)], "O");
        assert_eq!(model.validate(), Ok(()));

        // the placeholder row yields no SBB at all
        assert!(model.elements.iter().all(|element| element.name != "Keycloak"));
        let sbbs: Vec<&str> = model
            .elements
            .iter()
            .filter(|element| element.element_type == ElementType::Deliverable)
            .filter(|element| element.properties.contains_key("ABB"))
            .map(|element| element.name.as_str())
            .collect();
        assert_eq!(sbbs, vec!["Identity Service", "Stripe"]);
        assert!(find(&model, ElementType::Requirement, "Identity Service").is_some());

        let realizations: Vec<_> = model
            .relationships
            .iter()
            .filter(|relationship| relationship.relationship_type == RelationshipType::Realization)
            .collect();
        assert_eq!(realizations.len(), sbbs.len());
        for relationship in realizations {
            assert_ne!(relationship.source_id, relationship.target_id);
        }
    }

    #[test]
    fn requirements_split_into_requirements_and_constraints() {
        let content = "---\ntype: requirements\n---\n| ID | Requirement | Type |\n|---|---|---|\n| FR-1 | Customers can pay online | Non-functional |\n| NFR-1 | 99.9% availability | |\n| R-3 | Audit trail | Quality |\n";
        let model = extract(&[doc("reqs.md", content)], "R");
        assert!(find(&model, ElementType::Requirement, "Customers can pay online").is_some());
        assert!(find(&model, ElementType::Constraint, "99.9% availability").is_some());
        assert!(find(&model, ElementType::Constraint, "Audit trail").is_some());
    }

    #[test]
    fn governance_rows_become_named_assessments() {
        let content = "| ID | Decision | Status |\n|---|---|---|\n| ADR-001 | Use PostgreSQL | Accepted |\n";
        let model = extract(&[doc("decisions/decision-log.md", content)], "G");
        assert!(find(&model, ElementType::Assessment, "ADR-001: Use PostgreSQL").is_some());
    }

    #[test]
    fn business_owners_are_assigned_and_diagrams_link() {
        let content = "---\nphase: B\n---\n| Actor |\n|---|\n| Finance Team |\n\n| Process | Owner | Status |\n|---|---|---|\n| Invoice Handling | Finance Team | Planned |\n\n```mermaid\nflowchart LR\n  f[Finance Team] -->|approves| i[Invoice Handling]\n```\n";
        let model = extract(&[doc("business.md", content)], "B");
        let process = find(&model, ElementType::BusinessProcess, "Invoice Handling");
        assert_eq!(process.and_then(|element| element.migration_status), Some(MigrationStatus::Add));
        let origins: Vec<RelationshipOrigin> =
            model.relationships.iter().map(|relationship| relationship.origin).collect();
        assert_eq!(origins, vec![RelationshipOrigin::Explicit, RelationshipOrigin::Diagram]);
        assert_eq!(model.relationships[0].relationship_type, RelationshipType::Assignment);
        assert_eq!(model.relationships[1].name.as_deref(), Some("approves"));
    }

    #[test]
    fn unphased_documents_still_contribute_diagram_edges() {
        let apps = "---\nphase: C\n---\n| Application |\n|---|\n| Web Shop |\n| Orders Service |\n";
        let notes = "```mermaid\ngraph TD\n  a[Web Shop] --> b[Orders Service]\n```\n";
        let model = extract(&[doc("apps.md", apps), doc("notes.md", notes)], "D");
        assert_eq!(model.relationships.len(), 1);
        assert_eq!(model.relationships[0].id, "rel-dia-0001");
    }

    #[test]
    fn repeated_runs_produce_identical_models() {
        let content = "---\nphase: D\n---\n| Component |\n|---|\n| Orders DB |\n| App Server |\n";
        let documents = vec![doc("tech.md", content)];
        let mut extractor = Extractor::default();
        let first = extractor.extract(&documents, "Same");
        let second = extractor.extract(&documents, "Same");
        assert_eq!(first, second);
        assert_eq!(first.elements[0].id, "el-0001");
        assert_eq!(first.views.len(), 5);
    }

    fn arb_document() -> impl Strategy<Value = Document> {
        let phase = prop_oneof![
            Just(""),
            Just("---\nphase: A\n---\n"),
            Just("---\nphase: B\n---\n"),
            Just("---\nphase: C\n---\n"),
            Just("---\nphase: D\n---\n"),
            Just("---\nphase: E\n---\n"),
            Just("---\nphase: F\n---\n"),
            Just("---\nphase: G\n---\n"),
        ];
        let header = prop_oneof![
            Just("| Stakeholder | Concerns |"),
            Just("| Process | Owner |"),
            Just("| Gap | Baseline |"),
            Just("| Application | Interfaces |"),
            Just("| Component | Depends On |"),
            Just("| ABB | SBB |"),
            Just("| Work Package | Deliverable |"),
            Just("| ID | Decision |"),
        ];
        let rows = proptest::collection::vec(("[A-Za-z &<>]{0,10}", "[A-Za-z ,]{0,16}"), 0..5);
        (phase, header, rows, "[a-z]{1,6}").prop_map(|(phase, header, rows, name)| {
            let mut content = format!("{phase}{header}\n|---|---|\n");
            for (first, second) in &rows {
                content.push_str(&format!("| {first} | {second} |\n"));
            }
            content.push_str("\n```mermaid\ngraph LR\n  A --> B\n```\n");
            Document::new(format!("{name}.md"), content)
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_extraction_upholds_model_invariants(documents in proptest::collection::vec(arb_document(), 0..5)) {
            let model = extract(&documents, "prop");
            prop_assert_eq!(model.validate(), Ok(()));
            for element in &model.elements {
                if element.element_type == ElementType::Gap {
                    prop_assert_eq!(element.migration_status, Some(MigrationStatus::Add));
                }
            }
            let classified = classify(&model, &documents);
            prop_assert_eq!(classified.element_counts().total(), model.elements.len());
            prop_assert_eq!(summarize(&model, &classified).by_migration_status.total(), model.elements.len());
        }
    }
}
