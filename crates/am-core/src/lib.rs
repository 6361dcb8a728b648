#![forbid(unsafe_code)]

//! Architecture model shared by every stage of the archimodel pipeline.
//!
//! Documents go in, an [`ArchiModel`] comes out of extraction, and a
//! [`ClassifiedModel`] comes out of migration classification. Both serializers
//! read only these types.

mod ids;
mod names;

pub use ids::{IdGenerator, IdNamespace};
pub use names::{clean_cell_text, contains_word_run, is_placeholder, normalize_name, split_list_cell};

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A Markdown file handed over by the vault loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub content: String,
}

impl Document {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Motivation,
    Business,
    Application,
    Technology,
    Implementation,
}

impl Layer {
    /// Layers in the order they are stacked on a layered diagram.
    pub const ALL: [Self; 5] = [
        Self::Motivation,
        Self::Business,
        Self::Application,
        Self::Technology,
        Self::Implementation,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Motivation => "Motivation",
            Self::Business => "Business",
            Self::Application => "Application",
            Self::Technology => "Technology",
            Self::Implementation => "Implementation",
        }
    }

    /// Business, Application and Technology: the layers the cross-layer pass compares.
    #[must_use]
    pub const fn is_core(self) -> bool {
        matches!(self, Self::Business | Self::Application | Self::Technology)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementType {
    Stakeholder,
    Driver,
    Goal,
    Principle,
    Requirement,
    Constraint,
    Assessment,
    BusinessActor,
    BusinessRole,
    BusinessProcess,
    BusinessService,
    BusinessObject,
    ApplicationComponent,
    ApplicationInterface,
    ApplicationService,
    DataObject,
    Node,
    Device,
    SystemSoftware,
    TechnologyService,
    CommunicationNetwork,
    Artifact,
    WorkPackage,
    Deliverable,
    Gap,
    Plateau,
}

impl ElementType {
    pub const ALL: [Self; 26] = [
        Self::Stakeholder,
        Self::Driver,
        Self::Goal,
        Self::Principle,
        Self::Requirement,
        Self::Constraint,
        Self::Assessment,
        Self::BusinessActor,
        Self::BusinessRole,
        Self::BusinessProcess,
        Self::BusinessService,
        Self::BusinessObject,
        Self::ApplicationComponent,
        Self::ApplicationInterface,
        Self::ApplicationService,
        Self::DataObject,
        Self::Node,
        Self::Device,
        Self::SystemSoftware,
        Self::TechnologyService,
        Self::CommunicationNetwork,
        Self::Artifact,
        Self::WorkPackage,
        Self::Deliverable,
        Self::Gap,
        Self::Plateau,
    ];

    /// Type name as used by the exchange format's `xsi:type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stakeholder => "Stakeholder",
            Self::Driver => "Driver",
            Self::Goal => "Goal",
            Self::Principle => "Principle",
            Self::Requirement => "Requirement",
            Self::Constraint => "Constraint",
            Self::Assessment => "Assessment",
            Self::BusinessActor => "BusinessActor",
            Self::BusinessRole => "BusinessRole",
            Self::BusinessProcess => "BusinessProcess",
            Self::BusinessService => "BusinessService",
            Self::BusinessObject => "BusinessObject",
            Self::ApplicationComponent => "ApplicationComponent",
            Self::ApplicationInterface => "ApplicationInterface",
            Self::ApplicationService => "ApplicationService",
            Self::DataObject => "DataObject",
            Self::Node => "Node",
            Self::Device => "Device",
            Self::SystemSoftware => "SystemSoftware",
            Self::TechnologyService => "TechnologyService",
            Self::CommunicationNetwork => "CommunicationNetwork",
            Self::Artifact => "Artifact",
            Self::WorkPackage => "WorkPackage",
            Self::Deliverable => "Deliverable",
            Self::Gap => "Gap",
            Self::Plateau => "Plateau",
        }
    }

    #[must_use]
    pub const fn layer(self) -> Layer {
        match self {
            Self::Stakeholder
            | Self::Driver
            | Self::Goal
            | Self::Principle
            | Self::Requirement
            | Self::Constraint
            | Self::Assessment => Layer::Motivation,
            Self::BusinessActor
            | Self::BusinessRole
            | Self::BusinessProcess
            | Self::BusinessService
            | Self::BusinessObject => Layer::Business,
            Self::ApplicationComponent
            | Self::ApplicationInterface
            | Self::ApplicationService
            | Self::DataObject => Layer::Application,
            Self::Node
            | Self::Device
            | Self::SystemSoftware
            | Self::TechnologyService
            | Self::CommunicationNetwork
            | Self::Artifact => Layer::Technology,
            Self::WorkPackage | Self::Deliverable | Self::Gap | Self::Plateau => {
                Layer::Implementation
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationshipType {
    #[serde(rename = "CompositionRelationship")]
    Composition,
    #[serde(rename = "AggregationRelationship")]
    Aggregation,
    #[serde(rename = "AssignmentRelationship")]
    Assignment,
    #[serde(rename = "RealizationRelationship")]
    Realization,
    #[serde(rename = "ServingRelationship")]
    Serving,
    #[serde(rename = "AccessRelationship")]
    Access,
    #[serde(rename = "InfluenceRelationship")]
    Influence,
    #[serde(rename = "TriggeringRelationship")]
    Triggering,
    #[serde(rename = "FlowRelationship")]
    Flow,
    #[serde(rename = "AssociationRelationship")]
    Association,
}

impl RelationshipType {
    /// Model-level name, e.g. `RealizationRelationship`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Composition => "CompositionRelationship",
            Self::Aggregation => "AggregationRelationship",
            Self::Assignment => "AssignmentRelationship",
            Self::Realization => "RealizationRelationship",
            Self::Serving => "ServingRelationship",
            Self::Access => "AccessRelationship",
            Self::Influence => "InfluenceRelationship",
            Self::Triggering => "TriggeringRelationship",
            Self::Flow => "FlowRelationship",
            Self::Association => "AssociationRelationship",
        }
    }

    /// Name used by the exchange format's `xsi:type`, e.g. `Realization`.
    #[must_use]
    pub const fn exchange_name(self) -> &'static str {
        match self {
            Self::Composition => "Composition",
            Self::Aggregation => "Aggregation",
            Self::Assignment => "Assignment",
            Self::Realization => "Realization",
            Self::Serving => "Serving",
            Self::Access => "Access",
            Self::Influence => "Influence",
            Self::Triggering => "Triggering",
            Self::Flow => "Flow",
            Self::Association => "Association",
        }
    }
}

/// How a relationship was discovered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipOrigin {
    Explicit,
    Diagram,
    CrossLayer,
}

impl RelationshipOrigin {
    #[must_use]
    pub const fn namespace(self) -> IdNamespace {
        match self {
            Self::Explicit => IdNamespace::ExplicitRelationship,
            Self::Diagram => IdNamespace::DiagramRelationship,
            Self::CrossLayer => IdNamespace::CrossLayerRelationship,
        }
    }
}

/// Baseline-to-target change tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    #[default]
    Keep,
    Add,
    Remove,
}

const ADD_MARKERS: [&str; 11] = [
    "new", "planned", "proposed", "add", "added", "to-be", "to be", "target", "build",
    "introduce", "future",
];

const REMOVE_MARKERS: [&str; 11] = [
    "retire",
    "retired",
    "retiring",
    "remove",
    "removed",
    "decommission",
    "decommissioned",
    "sunset",
    "deprecated",
    "phase out",
    "phased out",
];

impl MigrationStatus {
    pub const ALL: [Self; 3] = [Self::Keep, Self::Add, Self::Remove];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }

    /// Read an explicit status marker out of free text.
    ///
    /// Removal markers are checked first so that "planned retirement" reads as
    /// a removal. Markers match whole words of the normalized text.
    #[must_use]
    pub fn from_marker(text: &str) -> Option<Self> {
        let normalized = normalize_name(text);
        if normalized.is_empty() {
            return None;
        }
        let matches = |marker: &&str| contains_word_run(&normalized, &normalize_name(marker));
        if REMOVE_MARKERS.iter().any(matches) {
            Some(Self::Remove)
        } else if ADD_MARKERS.iter().any(matches) {
            Some(Self::Add)
        } else {
            None
        }
    }

    /// Combine two statuses: remove dominates add, add dominates keep.
    #[must_use]
    pub const fn dominant(self, other: Self) -> Self {
        match (self, other) {
            (Self::Remove, _) | (_, Self::Remove) => Self::Remove,
            (Self::Add, _) | (_, Self::Add) => Self::Add,
            _ => Self::Keep,
        }
    }

    /// Whether an element with this status belongs on the baseline diagram.
    #[must_use]
    pub const fn in_baseline(self) -> bool {
        matches!(self, Self::Keep | Self::Remove)
    }

    /// Whether an element with this status belongs on the target diagram.
    #[must_use]
    pub const fn in_target(self) -> bool {
        matches!(self, Self::Keep | Self::Add)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub name: String,
    pub layer: Layer,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    /// Name of the document the element was first extracted from.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_status: Option<MigrationStatus>,
}

impl Element {
    /// Build an element whose layer follows from its type.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        element_type: ElementType,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            element_type,
            name: name.into(),
            layer: element_type.layer(),
            properties: BTreeMap::new(),
            source: source.into(),
            migration_status: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub source_id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub origin: RelationshipOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_status: Option<MigrationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub id: String,
    pub name: String,
    pub element_refs: Vec<String>,
    /// Relationships whose endpoints are both referenced by this view.
    #[serde(default)]
    pub relationship_refs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    pub vault_file_count: usize,
    pub generator_version: String,
}

/// Aggregate root of one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArchiModel {
    pub name: String,
    pub elements: Vec<Element>,
    pub relationships: Vec<Relationship>,
    pub views: Vec<View>,
    pub metadata: ModelMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum ModelInvariantError {
    #[error("element id `{0}` is used more than once")]
    DuplicateElementId(String),
    #[error("relationship id `{0}` is used more than once")]
    DuplicateRelationshipId(String),
    #[error("relationship `{relationship}` references unknown element `{element}`")]
    DanglingRelationship {
        relationship: String,
        element: String,
    },
    #[error("view `{view}` references unknown id `{reference}`")]
    DanglingViewReference { view: String, reference: String },
    #[error("element `{element}` of type {element_type:?} sits on layer {layer:?}")]
    LayerMismatch {
        element: String,
        element_type: ElementType,
        layer: Layer,
    },
}

impl ArchiModel {
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.id == id)
    }

    #[must_use]
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|relationship| relationship.id == id)
    }

    pub fn elements_in_layer(&self, layer: Layer) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(move |element| element.layer == layer)
    }

    /// Check the structural invariants every extraction must uphold.
    pub fn validate(&self) -> Result<(), ModelInvariantError> {
        let mut element_ids = FxHashSet::default();
        for element in &self.elements {
            if !element_ids.insert(element.id.as_str()) {
                return Err(ModelInvariantError::DuplicateElementId(element.id.clone()));
            }
            if element.layer != element.element_type.layer() {
                return Err(ModelInvariantError::LayerMismatch {
                    element: element.id.clone(),
                    element_type: element.element_type,
                    layer: element.layer,
                });
            }
        }

        let mut relationship_ids = FxHashSet::default();
        for relationship in &self.relationships {
            if !relationship_ids.insert(relationship.id.as_str()) {
                return Err(ModelInvariantError::DuplicateRelationshipId(
                    relationship.id.clone(),
                ));
            }
            for endpoint in [&relationship.source_id, &relationship.target_id] {
                if !element_ids.contains(endpoint.as_str()) {
                    return Err(ModelInvariantError::DanglingRelationship {
                        relationship: relationship.id.clone(),
                        element: endpoint.clone(),
                    });
                }
            }
        }

        for view in &self.views {
            let dangling = view
                .element_refs
                .iter()
                .find(|reference| !element_ids.contains(reference.as_str()))
                .or_else(|| {
                    view.relationship_refs
                        .iter()
                        .find(|reference| !relationship_ids.contains(reference.as_str()))
                });
            if let Some(reference) = dangling {
                return Err(ModelInvariantError::DanglingViewReference {
                    view: view.id.clone(),
                    reference: reference.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedElement {
    #[serde(flatten)]
    pub element: Element,
    pub status: MigrationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedRelationship {
    #[serde(flatten)]
    pub relationship: Relationship,
    pub status: MigrationStatus,
}

/// Output of migration classification: every element and relationship tagged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedModel {
    pub name: String,
    pub elements: Vec<ClassifiedElement>,
    pub relationships: Vec<ClassifiedRelationship>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub keep: usize,
    pub add: usize,
    pub remove: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: MigrationStatus) {
        match status {
            MigrationStatus::Keep => self.keep += 1,
            MigrationStatus::Add => self.add += 1,
            MigrationStatus::Remove => self.remove += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.keep + self.add + self.remove
    }
}

impl ClassifiedModel {
    #[must_use]
    pub fn element_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for element in &self.elements {
            counts.record(element.status);
        }
        counts
    }

    #[must_use]
    pub fn relationship_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for relationship in &self.relationships {
            counts.record(relationship.status);
        }
        counts
    }
}
