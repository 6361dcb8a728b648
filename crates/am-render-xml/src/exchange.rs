//! Open Group ArchiMate Model Exchange File Format writer.

use am_core::{ArchiModel, Element, Layer, Relationship, View};
use am_layout::{GridConfig, GridLayout, layout_grid};
use tracing::debug;

use crate::document::XmlDocument;
use crate::element::XmlElement;

pub const ARCHIMATE_NAMESPACE: &str = "http://www.opengroup.org/xsd/archimate/3.0/";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const SCHEMA_LOCATION: &str = "http://www.opengroup.org/xsd/archimate/3.0/ http://www.opengroup.org/xsd/archimate/3.1/archimate3_Diagram.xsd";

const DEFAULT_MODEL_NAME: &str = "Architecture Model";

/// Serialize `model` as an exchange-format document string.
#[must_use]
pub fn serialize_exchange(model: &ArchiModel, grid: &GridConfig) -> String {
    exchange_document(model, grid).to_string()
}

/// Build the exchange-format document tree for `model`.
///
/// `elements` and `relationships` are always present, even when empty.
/// `propertyDefinitions` only appears when some element has properties, and
/// `views` only when the model has views.
#[must_use]
pub fn exchange_document(model: &ArchiModel, grid: &GridConfig) -> XmlDocument {
    let mut definitions = PropertyDefinitions::default();

    let mut elements = XmlElement::new("elements");
    for element in &model.elements {
        elements.push(element_entry(element, &mut definitions));
    }

    let relationships = XmlElement::new("relationships")
        .children(model.relationships.iter().map(relationship_entry));

    let name = if model.name.trim().is_empty() {
        DEFAULT_MODEL_NAME
    } else {
        model.name.as_str()
    };
    let mut root = XmlElement::new("model")
        .attr("xmlns", ARCHIMATE_NAMESPACE)
        .attr("xmlns:xsi", XSI_NAMESPACE)
        .attr("xsi:schemaLocation", SCHEMA_LOCATION)
        .attr("identifier", "id-model")
        .child(lang_text("name", name))
        .child(lang_text("documentation", &documentation(model)))
        .child(elements)
        .child(relationships);

    if !definitions.is_empty() {
        root.push(definitions.into_element());
    }
    if !model.views.is_empty() {
        let diagrams = XmlElement::new("diagrams")
            .children(model.views.iter().map(|view| view_entry(model, view, grid)));
        root.push(XmlElement::new("views").child(diagrams));
    }

    debug!(
        elements = model.elements.len(),
        relationships = model.relationships.len(),
        views = model.views.len(),
        "exchange document built"
    );
    XmlDocument::new(root)
}

fn lang_text(tag: &str, text: &str) -> XmlElement {
    XmlElement::text_element(tag, text).attr("xml:lang", "en")
}

fn documentation(model: &ArchiModel) -> String {
    let generator = if model.metadata.generator_version.is_empty() {
        "archimodel"
    } else {
        model.metadata.generator_version.as_str()
    };
    let mut text = format!(
        "Generated by {generator} from {} vault files.",
        model.metadata.vault_file_count
    );
    if let Some(exported_at) = &model.metadata.exported_at {
        text.push_str(&format!(" Exported at {exported_at}."));
    }
    text
}

fn element_entry(element: &Element, definitions: &mut PropertyDefinitions) -> XmlElement {
    let mut entry = XmlElement::new("element")
        .attr("identifier", &element.id)
        .attr("xsi:type", element.element_type.as_str())
        .child(lang_text("name", &element.name));
    if !element.properties.is_empty() {
        let mut properties = XmlElement::new("properties");
        for (key, value) in &element.properties {
            properties.push(
                XmlElement::new("property")
                    .attr("propertyDefinitionRef", definitions.id_for(key))
                    .child(lang_text("value", value)),
            );
        }
        entry.push(properties);
    }
    entry
}

fn relationship_entry(relationship: &Relationship) -> XmlElement {
    let entry = XmlElement::new("relationship")
        .attr("identifier", &relationship.id)
        .attr("source", &relationship.source_id)
        .attr("target", &relationship.target_id)
        .attr("xsi:type", relationship.relationship_type.exchange_name());
    match &relationship.name {
        Some(name) => entry.child(lang_text("name", name)),
        None => entry,
    }
}

fn view_entry(model: &ArchiModel, view: &View, grid: &GridConfig) -> XmlElement {
    let members: Vec<&Element> = view
        .element_refs
        .iter()
        .filter_map(|id| model.element(id))
        .collect();
    let layout = layout_grid(
        members
            .iter()
            .map(|element| (element.id.as_str(), layer_band(element.layer))),
        grid,
    );

    let mut entry = XmlElement::new("view")
        .attr("identifier", &view.id)
        .attr("xsi:type", "Diagram")
        .child(lang_text("name", &view.name));
    for element in &members {
        if let Some(node) = view_node(view, element, &layout) {
            entry.push(node);
        }
    }
    for relationship_id in &view.relationship_refs {
        let Some(relationship) = model.relationship(relationship_id) else {
            continue;
        };
        if layout.node(&relationship.source_id).is_none() || layout.node(&relationship.target_id).is_none() {
            continue;
        }
        entry.push(
            XmlElement::new("connection")
                .attr("identifier", format!("{}-{}", view.id, relationship.id))
                .attr("relationshipRef", &relationship.id)
                .attr("xsi:type", "Relationship")
                .attr("source", format!("{}-{}", view.id, relationship.source_id))
                .attr("target", format!("{}-{}", view.id, relationship.target_id)),
        );
    }
    entry
}

fn view_node(view: &View, element: &Element, layout: &GridLayout) -> Option<XmlElement> {
    let placed = layout.node(&element.id)?;
    let bounds = placed.bounds;
    Some(
        XmlElement::new("node")
            .attr("identifier", format!("{}-{}", view.id, element.id))
            .attr("elementRef", &element.id)
            .attr("xsi:type", "Element")
            .attr("x", pixels(bounds.x))
            .attr("y", pixels(bounds.y))
            .attr("w", pixels(bounds.width))
            .attr("h", pixels(bounds.height)),
    )
}

/// Grid band of a layer: its position in [`Layer::ALL`].
pub(crate) fn layer_band(layer: Layer) -> usize {
    Layer::ALL.iter().position(|candidate| *candidate == layer).unwrap_or(0)
}

/// Exchange-format coordinates are non-negative integers.
pub(crate) fn pixels(value: f32) -> i64 {
    value.max(0.0).round() as i64
}

/// `propdef-NNNN` ids handed out in first-seen key order.
#[derive(Debug, Default)]
struct PropertyDefinitions {
    keys: Vec<String>,
}

impl PropertyDefinitions {
    fn id_for(&mut self, key: &str) -> String {
        let position = match self.keys.iter().position(|existing| existing == key) {
            Some(position) => position,
            None => {
                self.keys.push(key.to_string());
                self.keys.len() - 1
            }
        };
        format!("propdef-{:04}", position + 1)
    }

    fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn into_element(self) -> XmlElement {
        XmlElement::new("propertyDefinitions").children(self.keys.iter().enumerate().map(|(index, key)| {
            XmlElement::new("propertyDefinition")
                .attr("identifier", format!("propdef-{:04}", index + 1))
                .attr("type", "string")
                .child(lang_text("name", key))
        }))
    }
}

#[cfg(test)]
mod tests {
    use am_core::{ElementType, RelationshipOrigin, RelationshipType};

    use super::*;

    fn sample() -> ArchiModel {
        let mut model = ArchiModel::empty("R&D <Landscape>");
        let mut crm = Element::new("el-0001", ElementType::ApplicationComponent, "CRM & \"Sales\"", "apps.md");
        crm.properties.insert("Owner".into(), "Sales <EMEA>".into());
        crm.properties.insert("Status".into(), "Live".into());
        let mut host = Element::new("el-0002", ElementType::Node, "CRM Host", "infra.md");
        host.properties.insert("Owner".into(), "Ops".into());
        model.elements = vec![crm, host];
        model.relationships = vec![Relationship {
            id: "rel-xl-0001".into(),
            relationship_type: RelationshipType::Association,
            source_id: "el-0001".into(),
            target_id: "el-0002".into(),
            name: Some("runs on".into()),
            origin: RelationshipOrigin::CrossLayer,
            migration_status: None,
        }];
        model.views = vec![View {
            id: "view-layered".into(),
            name: "Full Layered View".into(),
            element_refs: vec!["el-0001".into(), "el-0002".into()],
            relationship_refs: vec!["rel-xl-0001".into()],
        }];
        model
    }

    #[test]
    fn empty_model_keeps_required_sections() {
        let xml = serialize_exchange(&ArchiModel::empty(""), &GridConfig::default());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<model"));
        assert!(xml.contains("xmlns=\"http://www.opengroup.org/xsd/archimate/3.0/\""));
        assert!(xml.contains("<name xml:lang=\"en\">Architecture Model</name>"));
        assert!(xml.contains("<elements/>"));
        assert!(xml.contains("<relationships/>"));
        assert!(!xml.contains("propertyDefinitions"));
        assert!(!xml.contains("<views>"));
        assert!(xml.ends_with("</model>"));
    }

    #[test]
    fn escapes_names_and_property_values() {
        let xml = serialize_exchange(&sample(), &GridConfig::default());
        assert!(xml.contains("R&amp;D &lt;Landscape&gt;"));
        assert!(xml.contains("CRM &amp; &quot;Sales&quot;"));
        assert!(xml.contains("Sales &lt;EMEA&gt;"));
        assert!(!xml.contains("<EMEA>"));
    }

    #[test]
    fn property_definitions_follow_first_seen_order() {
        let xml = serialize_exchange(&sample(), &GridConfig::default());
        let owner = xml.find("<name xml:lang=\"en\">Owner</name>");
        let status = xml.find("<name xml:lang=\"en\">Status</name>");
        assert!(owner.is_some() && status.is_some());
        assert!(owner < status);
        assert!(xml.contains("identifier=\"propdef-0001\" type=\"string\""));
        assert_eq!(xml.matches("propertyDefinitionRef=\"propdef-0001\"").count(), 2);
        let relationships_at = xml.find("<relationships>");
        let definitions_at = xml.find("<propertyDefinitions>");
        assert!(relationships_at < definitions_at);
    }

    #[test]
    fn relationships_use_bare_exchange_names() {
        let xml = serialize_exchange(&sample(), &GridConfig::default());
        assert!(xml.contains(
            "<relationship identifier=\"rel-xl-0001\" source=\"el-0001\" target=\"el-0002\" xsi:type=\"Association\">"
        ));
        assert!(xml.contains("<name xml:lang=\"en\">runs on</name>"));
    }

    #[test]
    fn views_place_nodes_on_the_grid() {
        let xml = serialize_exchange(&sample(), &GridConfig::default());
        assert!(xml.contains("<view identifier=\"view-layered\" xsi:type=\"Diagram\">"));
        assert!(xml.contains(
            "<node identifier=\"view-layered-el-0001\" elementRef=\"el-0001\" xsi:type=\"Element\" x=\"40\" y=\"40\" w=\"160\" h=\"60\"/>"
        ));
        assert!(xml.contains("y=\"140\""));
        assert!(xml.contains(
            "relationshipRef=\"rel-xl-0001\" xsi:type=\"Relationship\" source=\"view-layered-el-0001\" target=\"view-layered-el-0002\""
        ));
    }

    #[test]
    fn documentation_carries_metadata() {
        let mut model = sample();
        model.metadata.vault_file_count = 3;
        model.metadata.generator_version = "archimodel 0.1.0".into();
        model.metadata.exported_at = Some("2026-10-19T10:00:00Z".into());
        let xml = serialize_exchange(&model, &GridConfig::default());
        assert!(xml.contains(
            "Generated by archimodel 0.1.0 from 3 vault files. Exported at 2026-10-19T10:00:00Z."
        ));
    }
}
