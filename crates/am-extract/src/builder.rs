use std::collections::BTreeMap;

use am_core::{
    ArchiModel, Element, ElementType, IdGenerator, IdNamespace, Layer, MigrationStatus, Relationship,
    RelationshipOrigin, RelationshipType, clean_cell_text, is_placeholder, normalize_name,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

/// One end of a link recorded by the per-phase rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkEnd {
    Id(String),
    Name(String),
    /// A name that should resolve to an element on `Layer` when one carries it.
    NameIn(String, Layer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingLink {
    pub(crate) relationship_type: RelationshipType,
    pub(crate) source: LinkEnd,
    pub(crate) target: LinkEnd,
}

/// Accumulates elements and relationships for one extraction run.
///
/// Elements are deduplicated on (type, normalized name); the first insert
/// wins. Every relationship goes through [`ModelBuilder::insert_relationship`],
/// which refuses unknown endpoints, self-loops and repeats.
pub(crate) struct ModelBuilder<'ids> {
    ids: &'ids mut IdGenerator,
    elements: Vec<Element>,
    index_by_key: FxHashMap<(ElementType, String), usize>,
    index_by_id: FxHashMap<String, usize>,
    indices_by_name: FxHashMap<String, Vec<usize>>,
    relationships: Vec<Relationship>,
    relationship_keys: FxHashSet<(RelationshipType, String, String)>,
    connected_pairs: FxHashSet<(String, String)>,
    pending: Vec<PendingLink>,
}

impl<'ids> ModelBuilder<'ids> {
    pub(crate) fn new(ids: &'ids mut IdGenerator) -> Self {
        Self {
            ids,
            elements: Vec::new(),
            index_by_key: FxHashMap::default(),
            index_by_id: FxHashMap::default(),
            indices_by_name: FxHashMap::default(),
            relationships: Vec::new(),
            relationship_keys: FxHashSet::default(),
            connected_pairs: FxHashSet::default(),
            pending: Vec::new(),
        }
    }

    /// Add (or find) an element and return its id.
    ///
    /// `None` when the cleaned name is empty or a placeholder. A repeated
    /// element keeps its first name and source; it only picks up properties
    /// and a migration status it did not have yet.
    pub(crate) fn add_element(
        &mut self,
        element_type: ElementType,
        raw_name: &str,
        source: &str,
        properties: BTreeMap<String, String>,
        status: Option<MigrationStatus>,
    ) -> Option<String> {
        let name = clean_cell_text(raw_name);
        if is_placeholder(&name) {
            return None;
        }
        let normalized = normalize_name(&name);
        if normalized.is_empty() {
            return None;
        }
        let status = if element_type == ElementType::Gap {
            Some(MigrationStatus::Add)
        } else {
            status
        };

        if let Some(&index) = self.index_by_key.get(&(element_type, normalized.clone())) {
            let existing = &mut self.elements[index];
            for (key, value) in properties {
                existing.properties.entry(key).or_insert(value);
            }
            if existing.migration_status.is_none() {
                existing.migration_status = status;
            }
            return Some(existing.id.clone());
        }

        let id = self.ids.next_id(IdNamespace::Element);
        let mut element = Element::new(id.clone(), element_type, name, source);
        element.properties = properties;
        element.migration_status = status;

        let index = self.elements.len();
        self.elements.push(element);
        self.index_by_key.insert((element_type, normalized.clone()), index);
        self.index_by_id.insert(id.clone(), index);
        self.indices_by_name.entry(normalized).or_default().push(index);
        Some(id)
    }

    pub(crate) fn link(&mut self, relationship_type: RelationshipType, source: LinkEnd, target: LinkEnd) {
        self.pending.push(PendingLink {
            relationship_type,
            source,
            target,
        });
    }

    pub(crate) fn take_pending(&mut self) -> Vec<PendingLink> {
        std::mem::take(&mut self.pending)
    }

    /// Resolve a link end to an element id.
    pub(crate) fn resolve(&self, end: &LinkEnd) -> Option<String> {
        match end {
            LinkEnd::Id(id) => self.index_by_id.contains_key(id).then(|| id.clone()),
            LinkEnd::Name(name) => self.find_by_name(name).map(str::to_string),
            LinkEnd::NameIn(name, layer) => self
                .find_by_name_preferring(name, |candidate| candidate == *layer)
                .map(str::to_string),
        }
    }

    /// First-inserted element whose normalized name equals that of `name`.
    pub(crate) fn find_by_name(&self, name: &str) -> Option<&str> {
        self.find_by_name_preferring(name, |_| true)
    }

    /// Like [`ModelBuilder::find_by_name`], but an element on a layer
    /// accepted by `prefer` wins over an earlier one that is not.
    pub(crate) fn find_by_name_preferring(&self, name: &str, prefer: impl Fn(Layer) -> bool) -> Option<&str> {
        let normalized = normalize_name(&clean_cell_text(name));
        let indices = self.indices_by_name.get(&normalized)?;
        let index = indices
            .iter()
            .find(|index| prefer(self.elements[**index].layer))
            .or_else(|| indices.first())?;
        Some(self.elements[*index].id.as_str())
    }

    pub(crate) fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// True when any relationship joins `a` and `b`, in either direction.
    pub(crate) fn connected(&self, a: &str, b: &str) -> bool {
        self.connected_pairs.contains(&pair_key(a, b))
    }

    /// Guarded insertion shared by all relationship passes.
    pub(crate) fn insert_relationship(
        &mut self,
        relationship_type: RelationshipType,
        source_id: &str,
        target_id: &str,
        origin: RelationshipOrigin,
        name: Option<String>,
    ) -> Option<String> {
        if source_id == target_id {
            trace!(source_id, "refused self-loop relationship");
            return None;
        }
        if !self.index_by_id.contains_key(source_id) || !self.index_by_id.contains_key(target_id) {
            trace!(source_id, target_id, "refused relationship with unknown endpoint");
            return None;
        }
        let key = (
            relationship_type,
            source_id.to_string(),
            target_id.to_string(),
        );
        if self.relationship_keys.contains(&key) {
            return None;
        }

        let id = self.ids.next_id(origin.namespace());
        self.relationships.push(Relationship {
            id: id.clone(),
            relationship_type,
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            name: name.filter(|value| !value.trim().is_empty()),
            origin,
            migration_status: None,
        });
        self.relationship_keys.insert(key);
        self.connected_pairs.insert(pair_key(source_id, target_id));
        Some(id)
    }

    pub(crate) fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub(crate) fn finish(self, name: &str) -> ArchiModel {
        ArchiModel {
            name: name.to_string(),
            elements: self.elements,
            relationships: self.relationships,
            views: Vec::new(),
            metadata: Default::default(),
        }
    }
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(builder: &mut ModelBuilder<'_>, element_type: ElementType, name: &str) -> Option<String> {
        builder.add_element(element_type, name, "doc.md", BTreeMap::new(), None)
    }

    #[test]
    fn deduplicates_on_type_and_normalized_name() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        let first = add(&mut builder, ElementType::Node, "**Web Server**");
        let again = add(&mut builder, ElementType::Node, "web-server");
        let other_type = add(&mut builder, ElementType::ApplicationComponent, "Web Server");
        assert_eq!(first.as_deref(), Some("el-0001"));
        assert_eq!(again, first);
        assert_eq!(other_type.as_deref(), Some("el-0002"));
        assert_eq!(builder.elements()[0].name, "Web Server");
        assert_eq!(builder.find_by_name("WEB SERVER"), Some("el-0001"));
    }

    #[test]
    fn skips_placeholder_names() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        for name in ["", "-", "N/A", "TBD", "**none**", "***"] {
            assert_eq!(add(&mut builder, ElementType::Goal, name), None, "{name:?}");
        }
        assert!(builder.elements().is_empty());
    }

    #[test]
    fn gap_elements_are_always_added() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        builder.add_element(
            ElementType::Gap,
            "No automation",
            "doc.md",
            BTreeMap::new(),
            Some(MigrationStatus::Remove),
        );
        assert_eq!(builder.elements()[0].migration_status, Some(MigrationStatus::Add));
    }

    #[test]
    fn guarded_insert_refuses_bad_relationships() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        let a = add(&mut builder, ElementType::Node, "A").unwrap_or_default();
        let b = add(&mut builder, ElementType::Node, "B").unwrap_or_default();
        let origin = RelationshipOrigin::Explicit;

        assert!(builder.insert_relationship(RelationshipType::Serving, &a, &a, origin, None).is_none());
        assert!(builder.insert_relationship(RelationshipType::Serving, &a, "el-9999", origin, None).is_none());
        assert_eq!(
            builder
                .insert_relationship(RelationshipType::Serving, &a, &b, origin, None)
                .as_deref(),
            Some("rel-exp-0001")
        );
        assert!(builder.insert_relationship(RelationshipType::Serving, &a, &b, origin, None).is_none());
        assert!(builder.connected(&b, &a));
        assert_eq!(builder.relationship_count(), 1);
    }

    #[test]
    fn resolves_link_ends() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        let id = add(&mut builder, ElementType::BusinessActor, "Sales Team").unwrap_or_default();
        assert_eq!(builder.resolve(&LinkEnd::Id(id.clone())), Some(id.clone()));
        assert_eq!(builder.resolve(&LinkEnd::Name("sales team".into())), Some(id));
        assert_eq!(builder.resolve(&LinkEnd::Name("Marketing".into())), None);
        assert_eq!(builder.resolve(&LinkEnd::Id("el-0404".into())), None);
    }

    #[test]
    fn layer_hint_prefers_matching_element() {
        let mut ids = IdGenerator::new();
        let mut builder = ModelBuilder::new(&mut ids);
        let driver = add(&mut builder, ElementType::Driver, "Compliance").unwrap_or_default();
        let actor = add(&mut builder, ElementType::BusinessActor, "Compliance").unwrap_or_default();
        assert_eq!(builder.resolve(&LinkEnd::Name("compliance".into())), Some(driver.clone()));
        assert_eq!(
            builder.resolve(&LinkEnd::NameIn("compliance".into(), Layer::Business)),
            Some(actor.clone())
        );
        assert_eq!(builder.find_by_name_preferring("Compliance", Layer::is_core), Some(actor.as_str()));
        // no element on the hinted layer falls back to the first one
        assert_eq!(
            builder.resolve(&LinkEnd::NameIn("compliance".into(), Layer::Technology)),
            Some(driver)
        );
    }
}
