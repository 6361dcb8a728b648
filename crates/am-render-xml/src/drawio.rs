//! draw.io (`mxfile`) diagrams of a classified model.
//!
//! Three filtered diagrams are produced: As-Is (keep + remove), Target
//! (keep + add) and Migration (everything, colored by status, with a
//! legend). The combined document holds all three as tabs.

use am_core::{ClassifiedElement, ClassifiedModel, ClassifiedRelationship, MigrationStatus};
use am_layout::{GridConfig, GridLayout, LayoutRect, layout_grid};
use tracing::debug;

use crate::document::XmlDocument;
use crate::element::XmlElement;
use crate::exchange::{layer_band, pixels};
use crate::theme::{Style, layer_palette, status_caption, status_palette};

const LEGEND_ID: &str = "migration-legend";
const LEGEND_WIDTH: f32 = 200.0;
const LEGEND_HEADER: f32 = 30.0;
const SWATCH_HEIGHT: f32 = 30.0;
const SWATCH_GAP: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    AsIs,
    Target,
    Migration,
}

impl DiagramKind {
    /// Tab order of the combined document.
    pub const ALL: [Self; 3] = [Self::AsIs, Self::Target, Self::Migration];

    /// Diagram id, also the prefix of every cell id on it.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::AsIs => "as-is",
            Self::Target => "target",
            Self::Migration => "migration",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::AsIs => "As-Is",
            Self::Target => "Target",
            Self::Migration => "Migration",
        }
    }

    #[must_use]
    pub const fn includes(self, status: MigrationStatus) -> bool {
        match self {
            Self::AsIs => status.in_baseline(),
            Self::Target => status.in_target(),
            Self::Migration => true,
        }
    }
}

/// The four draw.io documents of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawioExport {
    pub as_is: String,
    pub target: String,
    pub migration: String,
    pub combined: String,
}

#[must_use]
pub fn render_drawio(classified: &ClassifiedModel, grid: &GridConfig) -> DrawioExport {
    DrawioExport {
        as_is: serialize_diagram(classified, DiagramKind::AsIs, grid),
        target: serialize_diagram(classified, DiagramKind::Target, grid),
        migration: serialize_diagram(classified, DiagramKind::Migration, grid),
        combined: serialize_combined(classified, grid),
    }
}

/// One-tab `mxfile` holding the diagram of `kind`.
#[must_use]
pub fn serialize_diagram(classified: &ClassifiedModel, kind: DiagramKind, grid: &GridConfig) -> String {
    mxfile([diagram_element(classified, kind, grid)]).to_string()
}

/// One `mxfile` with As-Is, Target and Migration tabs, in that order.
#[must_use]
pub fn serialize_combined(classified: &ClassifiedModel, grid: &GridConfig) -> String {
    mxfile(
        DiagramKind::ALL
            .iter()
            .map(|kind| diagram_element(classified, *kind, grid)),
    )
    .to_string()
}

fn mxfile<I: IntoIterator<Item = XmlElement>>(diagrams: I) -> XmlDocument {
    XmlDocument::new(
        XmlElement::new("mxfile")
            .attr("host", "archimodel")
            .attr("type", "device")
            .children(diagrams),
    )
}

/// Build the `<diagram>` element of `kind`.
///
/// Edges are kept only when both endpoints are on the diagram, so a
/// filtered diagram never references a missing shape.
#[must_use]
pub fn diagram_element(classified: &ClassifiedModel, kind: DiagramKind, grid: &GridConfig) -> XmlElement {
    let shapes: Vec<&ClassifiedElement> = classified
        .elements
        .iter()
        .filter(|item| kind.includes(item.status))
        .collect();
    let layout = layout_grid(
        shapes
            .iter()
            .map(|item| (item.element.id.as_str(), layer_band(item.element.layer))),
        grid,
    );

    let mut root = XmlElement::new("root")
        .child(XmlElement::new("mxCell").attr("id", "0"))
        .child(XmlElement::new("mxCell").attr("id", "1").attr("parent", "0"));

    for item in &shapes {
        if let Some(placed) = layout.node(&item.element.id) {
            root.push(shape_cell(kind, item, placed.bounds));
        }
    }

    let mut edge_count = 0;
    for item in &classified.relationships {
        let relationship = &item.relationship;
        if !kind.includes(item.status)
            || layout.node(&relationship.source_id).is_none()
            || layout.node(&relationship.target_id).is_none()
        {
            continue;
        }
        root.push(edge_cell(kind, item));
        edge_count += 1;
    }

    let mut page_width = layout.bounds.width;
    let mut page_height = layout.bounds.height;
    if kind == DiagramKind::Migration {
        let legend = legend_bounds(&layout, grid);
        for cell in legend_cells(legend) {
            root.push(cell);
        }
        page_width = legend.right() + grid.margin;
        page_height = page_height.max(legend.bottom() + grid.margin);
    }
    debug!(
        diagram = kind.key(),
        shapes = layout.stats.node_count,
        edges = edge_count,
        "draw.io diagram built"
    );

    let graph_model = XmlElement::new("mxGraphModel")
        .attr("dx", pixels(page_width))
        .attr("dy", pixels(page_height))
        .attr("grid", "1")
        .attr("gridSize", "10")
        .attr("guides", "1")
        .attr("tooltips", "1")
        .attr("connect", "1")
        .attr("arrows", "1")
        .attr("fold", "1")
        .attr("page", "1")
        .attr("pageScale", "1")
        .attr("pageWidth", pixels(page_width))
        .attr("pageHeight", pixels(page_height))
        .attr("math", "0")
        .attr("shadow", "0")
        .child(root);

    XmlElement::new("diagram")
        .attr("id", kind.key())
        .attr("name", kind.title())
        .child(graph_model)
}

fn cell_id(kind: DiagramKind, id: &str) -> String {
    format!("{}-{id}", kind.key())
}

fn geometry(bounds: LayoutRect) -> XmlElement {
    XmlElement::new("mxGeometry")
        .attr("x", pixels(bounds.x))
        .attr("y", pixels(bounds.y))
        .attr("width", pixels(bounds.width))
        .attr("height", pixels(bounds.height))
        .attr("as", "geometry")
}

fn shape_cell(kind: DiagramKind, item: &ClassifiedElement, bounds: LayoutRect) -> XmlElement {
    let element = &item.element;
    let palette = match kind {
        DiagramKind::Migration => status_palette(item.status),
        DiagramKind::AsIs | DiagramKind::Target => layer_palette(element.layer),
    };
    XmlElement::new("object")
        .attr("id", cell_id(kind, &element.id))
        .attr("label", &element.name)
        .attr("archimateType", element.element_type.as_str())
        .attr("layer", element.layer.as_str())
        .attr("migrationStatus", item.status.as_str())
        .child(
            XmlElement::new("mxCell")
                .attr("style", Style::shape(palette).to_string())
                .attr("vertex", "1")
                .attr("parent", "1")
                .child(geometry(bounds)),
        )
}

fn edge_cell(kind: DiagramKind, item: &ClassifiedRelationship) -> XmlElement {
    let relationship = &item.relationship;
    let mut style = Style::edge(relationship.relationship_type);
    if kind == DiagramKind::Migration {
        style = style.set("strokeColor", status_palette(item.status).stroke);
        if item.status == MigrationStatus::Remove {
            style = style.set("dashed", "1");
        }
    }
    XmlElement::new("object")
        .attr("id", cell_id(kind, &relationship.id))
        .attr("label", relationship.name.as_deref().unwrap_or_default())
        .attr("archimateType", relationship.relationship_type.as_str())
        .attr("migrationStatus", item.status.as_str())
        .child(
            XmlElement::new("mxCell")
                .attr("style", style.to_string())
                .attr("edge", "1")
                .attr("parent", "1")
                .attr("source", cell_id(kind, &relationship.source_id))
                .attr("target", cell_id(kind, &relationship.target_id))
                .child(
                    XmlElement::new("mxGeometry")
                        .attr("relative", "1")
                        .attr("as", "geometry"),
                ),
        )
}

/// The legend sits right of the grid, aligned with its top margin.
fn legend_bounds(layout: &GridLayout, grid: &GridConfig) -> LayoutRect {
    let swatches = MigrationStatus::ALL.len() as f32;
    LayoutRect {
        x: layout.bounds.width,
        y: grid.margin,
        width: LEGEND_WIDTH,
        height: LEGEND_HEADER + swatches * (SWATCH_HEIGHT + SWATCH_GAP) + SWATCH_GAP,
    }
}

fn legend_cells(bounds: LayoutRect) -> Vec<XmlElement> {
    let container_style = Style::new()
        .set("shape", "swimlane")
        .set("startSize", format!("{}", pixels(LEGEND_HEADER)))
        .set("html", "0")
        .set("fillColor", "#ffffff")
        .set("strokeColor", "#666666");
    let mut cells = vec![
        XmlElement::new("object")
            .attr("id", LEGEND_ID)
            .attr("label", "Legend")
            .attr("legend", "container")
            .child(
                XmlElement::new("mxCell")
                    .attr("style", container_style.to_string())
                    .attr("vertex", "1")
                    .attr("parent", "1")
                    .child(geometry(bounds)),
            ),
    ];
    for (index, status) in MigrationStatus::ALL.iter().enumerate() {
        let swatch = LayoutRect {
            x: SWATCH_GAP,
            y: LEGEND_HEADER + SWATCH_GAP + index as f32 * (SWATCH_HEIGHT + SWATCH_GAP),
            width: LEGEND_WIDTH - 2.0 * SWATCH_GAP,
            height: SWATCH_HEIGHT,
        };
        let mut style = Style::shape(status_palette(*status));
        if *status == MigrationStatus::Remove {
            style = style.set("dashed", "1");
        }
        cells.push(
            XmlElement::new("object")
                .attr("id", format!("{LEGEND_ID}-{}", status.as_str()))
                .attr("label", status_caption(*status))
                .attr("legend", status.as_str())
                .child(
                    XmlElement::new("mxCell")
                        .attr("style", style.to_string())
                        .attr("vertex", "1")
                        .attr("parent", LEGEND_ID)
                        .child(geometry(swatch)),
                ),
        );
    }
    cells
}

#[cfg(test)]
mod tests {
    use am_core::{Element, ElementType, Relationship, RelationshipOrigin, RelationshipType};

    use super::*;

    fn classified_element(id: &str, name: &str, status: MigrationStatus) -> ClassifiedElement {
        ClassifiedElement {
            element: Element::new(id, ElementType::ApplicationComponent, name, "apps.md"),
            status,
        }
    }

    fn classified_relationship(id: &str, source: &str, target: &str, status: MigrationStatus) -> ClassifiedRelationship {
        ClassifiedRelationship {
            relationship: Relationship {
                id: id.into(),
                relationship_type: RelationshipType::Serving,
                source_id: source.into(),
                target_id: target.into(),
                name: None,
                origin: RelationshipOrigin::Explicit,
                migration_status: None,
            },
            status,
        }
    }

    fn sample() -> ClassifiedModel {
        ClassifiedModel {
            name: "Shop".into(),
            elements: vec![
                classified_element("el-0001", "Core <API>", MigrationStatus::Keep),
                classified_element("el-0002", "New & Shiny", MigrationStatus::Add),
                classified_element("el-0003", "Legacy \"Fax\"", MigrationStatus::Remove),
            ],
            relationships: vec![
                classified_relationship("rel-exp-0001", "el-0001", "el-0002", MigrationStatus::Add),
                classified_relationship("rel-exp-0002", "el-0003", "el-0001", MigrationStatus::Remove),
                classified_relationship("rel-exp-0003", "el-0002", "el-0003", MigrationStatus::Remove),
            ],
        }
    }

    #[test]
    fn empty_model_yields_valid_documents_without_shapes() {
        let export = render_drawio(&ClassifiedModel::default(), &GridConfig::default());
        for xml in [&export.as_is, &export.target, &export.migration, &export.combined] {
            assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<mxfile"));
            assert!(xml.ends_with("</mxfile>"));
            assert!(!xml.contains("archimateType"));
            assert!(xml.contains("<mxCell id=\"0\"/>"));
        }
        assert!(export.migration.contains("legend=\"container\""));
        assert!(!export.as_is.contains("legend="));
    }

    #[test]
    fn filtered_diagrams_respect_status() {
        let export = render_drawio(&sample(), &GridConfig::default());
        assert!(!export.as_is.contains("migrationStatus=\"add\""));
        assert!(export.as_is.contains("migrationStatus=\"remove\""));
        assert!(!export.target.contains("migrationStatus=\"remove\""));
        assert!(export.target.contains("migrationStatus=\"add\""));
        for status in ["keep", "add", "remove"] {
            assert!(export.migration.contains(&format!("migrationStatus=\"{status}\"")));
            assert!(export.migration.contains(&format!("legend=\"{status}\"")));
        }
    }

    #[test]
    fn edges_never_point_at_missing_shapes() {
        let export = render_drawio(&sample(), &GridConfig::default());
        // rel-exp-0003 joins an added and a removed element
        assert!(!export.as_is.contains("as-is-rel-exp-0003"));
        assert!(!export.target.contains("target-rel-exp-0003"));
        assert!(export.migration.contains("migration-rel-exp-0003"));
        assert!(export.as_is.contains("source=\"as-is-el-0003\" target=\"as-is-el-0001\""));
    }

    #[test]
    fn migration_colors_and_dashes_removed_relationships() {
        let export = render_drawio(&sample(), &GridConfig::default());
        assert!(export.migration.contains("fillColor=#d5e8d4;strokeColor=#82b366;"));
        assert!(export.migration.contains("fillColor=#f8cecc;strokeColor=#b85450;"));
        assert!(export.migration.contains("fillColor=#dae8fc;strokeColor=#6c8ebf;"));
        let removed_edge = export
            .migration
            .lines()
            .skip_while(|line| !line.contains("id=\"migration-rel-exp-0002\""))
            .nth(1)
            .unwrap_or_default();
        assert!(removed_edge.contains("dashed=1;"));
        assert!(!export.as_is.contains("dashed=1;"));
    }

    #[test]
    fn labels_are_escaped() {
        let export = render_drawio(&sample(), &GridConfig::default());
        for xml in [&export.as_is, &export.migration, &export.combined] {
            assert!(xml.contains("Core &lt;API&gt;"));
        }
        assert!(export.target.contains("New &amp; Shiny"));
        assert!(export.as_is.contains("Legacy &quot;Fax&quot;"));
    }

    #[test]
    fn combined_holds_three_tabs_in_order() {
        let combined = serialize_combined(&sample(), &GridConfig::default());
        let as_is = combined.find("<diagram id=\"as-is\" name=\"As-Is\">");
        let target = combined.find("<diagram id=\"target\" name=\"Target\">");
        let migration = combined.find("<diagram id=\"migration\" name=\"Migration\">");
        assert!(as_is.is_some() && target.is_some() && migration.is_some());
        assert!(as_is < target && target < migration);
        assert_eq!(combined.matches("<diagram ").count(), 3);
    }

    #[test]
    fn rendering_is_byte_identical() {
        let grid = GridConfig::default();
        assert_eq!(render_drawio(&sample(), &grid), render_drawio(&sample(), &grid));
    }

    #[test]
    fn legend_sits_right_of_the_grid() {
        let grid = GridConfig {
            columns: 2,
            ..GridConfig::default()
        };
        let diagram = diagram_element(&sample(), DiagramKind::Migration, &grid);
        let xml = diagram.render();
        // two columns of 160 with a 40 gap plus margins on both sides
        assert!(xml.contains("<mxGeometry x=\"440\" y=\"40\" width=\"200\""));
    }
}
