//! Per-phase table rules.
//!
//! Each phase looks at the columns of a table to decide what the rows
//! describe. Tables the phase does not recognize contribute nothing.

use std::collections::BTreeMap;

use am_core::{
    ElementType, Layer, MigrationStatus, RelationshipType, clean_cell_text, is_placeholder,
    normalize_name, split_list_cell,
};
use am_parser::{Column, ParsedDocument, ParsedTable, TableRow};
use tracing::trace;

use crate::builder::{LinkEnd, ModelBuilder};
use crate::phase::Phase;
use crate::technology::infer_technology_type;

const CONSTRAINT_MARKERS: [&str; 6] = [
    "non-functional",
    "non functional",
    "nonfunctional",
    "nfr",
    "quality",
    "constraint",
];

pub(crate) fn apply_phase_rules(
    phase: Phase,
    parsed: &ParsedDocument,
    source: &str,
    builder: &mut ModelBuilder<'_>,
) {
    for table in &parsed.tables {
        let mut rows = RowSink {
            builder: &mut *builder,
            source,
        };
        if is_gap_table(table) {
            rows.gaps(table);
            continue;
        }
        match phase {
            Phase::Preliminary => rows.preliminary(table),
            Phase::Vision => rows.vision(table),
            Phase::Business => rows.business(table),
            Phase::InformationSystems => rows.information_systems(table),
            Phase::Technology => rows.technology(table),
            Phase::Opportunities => rows.opportunities(table),
            Phase::Migration => rows.migration(table),
            Phase::Governance => rows.governance(table),
            Phase::Requirements => rows.requirements(table),
        }
    }
}

fn is_gap_table(table: &ParsedTable) -> bool {
    table.has(Column::Gap) || table.heading_mentions("gap analysis")
}

/// Turns the rows of one table into elements of one document.
struct RowSink<'b, 'ids, 's> {
    builder: &'b mut ModelBuilder<'ids>,
    source: &'s str,
}

impl RowSink<'_, '_, '_> {
    fn preliminary(&mut self, table: &ParsedTable) {
        if table.has(Column::Principle) {
            self.each_row(table, ElementType::Principle, Column::Principle);
        }
    }

    fn vision(&mut self, table: &ParsedTable) {
        let stakeholder_header = table.header_for(Column::Stakeholder);
        let named_stakeholders = stakeholder_header.is_some_and(|header| normalize_name(header) != "name");
        if named_stakeholders {
            self.stakeholders(table);
        } else if table.has(Column::Goal) {
            self.each_row(table, ElementType::Goal, Column::Goal);
        } else if table.has(Column::Driver) {
            self.each_row(table, ElementType::Driver, Column::Driver);
        } else if stakeholder_header.is_some() {
            self.stakeholders(table);
        }
    }

    fn stakeholders(&mut self, table: &ParsedTable) {
        for row in &table.rows {
            let Some(stakeholder) = self.row_element(ElementType::Stakeholder, row, Column::Stakeholder)
            else {
                continue;
            };
            for concern in row.value(Column::Concerns).map(split_list_cell).unwrap_or_default() {
                if let Some(driver) = self.named(ElementType::Driver, &concern) {
                    self.builder.link(
                        RelationshipType::Association,
                        LinkEnd::Id(stakeholder.clone()),
                        LinkEnd::Id(driver),
                    );
                }
            }
        }
    }

    fn business(&mut self, table: &ParsedTable) {
        if table.has(Column::Process) {
            for row in &table.rows {
                let Some(process) = self.row_element(ElementType::BusinessProcess, row, Column::Process)
                else {
                    continue;
                };
                for owner in row.value(Column::Owner).map(split_list_cell).unwrap_or_default() {
                    self.builder.link(
                        RelationshipType::Assignment,
                        LinkEnd::NameIn(owner, Layer::Business),
                        LinkEnd::Id(process.clone()),
                    );
                }
            }
        } else if table.has(Column::Actor) {
            self.each_row(table, ElementType::BusinessActor, Column::Actor);
        } else if table.has(Column::Service) {
            self.each_row(table, ElementType::BusinessService, Column::Service);
        } else if let Some(header) = header_named(table, &["role", "business role"]) {
            self.each_row_by_header(table, ElementType::BusinessRole, header);
        } else if let Some(header) = header_named(table, &["business object", "information object"]) {
            self.each_row_by_header(table, ElementType::BusinessObject, header);
        }
    }

    fn information_systems(&mut self, table: &ParsedTable) {
        if table.has(Column::DataEntity) {
            self.each_row(table, ElementType::DataObject, Column::DataEntity);
        } else if let Some(header) = header_named(table, &["application service", "app service"]) {
            self.each_row_by_header(table, ElementType::ApplicationService, header);
        } else if table.has(Column::Component) {
            for row in &table.rows {
                let Some(component) =
                    self.row_element(ElementType::ApplicationComponent, row, Column::Component)
                else {
                    continue;
                };
                for interface in row.value(Column::Interfaces).map(split_list_cell).unwrap_or_default() {
                    if let Some(interface) = self.named(ElementType::ApplicationInterface, &interface) {
                        self.builder.link(
                            RelationshipType::Composition,
                            LinkEnd::Id(component.clone()),
                            LinkEnd::Id(interface),
                        );
                    }
                }
            }
        }
    }

    fn technology(&mut self, table: &ParsedTable) {
        if !table.has(Column::Technology) {
            return;
        }
        for row in &table.rows {
            let Some(name) = row.value(Column::Technology) else {
                continue;
            };
            let element_type = infer_technology_type(&clean_cell_text(name));
            self.row_element(element_type, row, Column::Technology);
        }
    }

    fn opportunities(&mut self, table: &ParsedTable) {
        if table.has(Column::Sbb) && table.has(Column::Abb) {
            for row in &table.rows {
                self.building_block_pair(row);
            }
        } else if table.has(Column::WorkPackage) {
            self.each_row(table, ElementType::WorkPackage, Column::WorkPackage);
        } else if table.has(Column::Sbb) {
            self.each_row(table, ElementType::Deliverable, Column::Sbb);
        }
    }

    /// One SBB deliverable realizing its ABB peer per row.
    ///
    /// Rows without a usable ABB add nothing. An ABB named like its SBB is
    /// modeled as a Requirement so the two stay distinct elements.
    fn building_block_pair(&mut self, row: &TableRow) {
        let abb_name = row.value(Column::Abb).map(clean_cell_text).unwrap_or_default();
        if is_placeholder(&abb_name) || normalize_name(&abb_name).is_empty() {
            trace!(source = self.source, "skipped building block row without ABB");
            return;
        }
        let abb_header_says_requirement = row
            .header(Column::Abb)
            .is_some_and(|header| header.to_lowercase().contains("requirement"));
        let same_as_sbb = row
            .value(Column::Sbb)
            .is_some_and(|sbb| normalize_name(&clean_cell_text(sbb)) == normalize_name(&abb_name));
        let abb_type = if abb_header_says_requirement || same_as_sbb || is_requirement_id(&abb_name) {
            ElementType::Requirement
        } else {
            ElementType::Deliverable
        };

        let Some(sbb) = self.row_element(ElementType::Deliverable, row, Column::Sbb) else {
            return;
        };
        if let Some(abb) = self.named(abb_type, &abb_name) {
            self.builder.link(
                RelationshipType::Realization,
                LinkEnd::Id(sbb),
                LinkEnd::Id(abb),
            );
        }
    }

    fn migration(&mut self, table: &ParsedTable) {
        if table.has(Column::WorkPackage) {
            for row in &table.rows {
                let Some(package) = self.row_element(ElementType::WorkPackage, row, Column::WorkPackage)
                else {
                    continue;
                };
                for deliverable in row.value(Column::Deliverable).map(split_list_cell).unwrap_or_default() {
                    if let Some(deliverable) = self.named(ElementType::Deliverable, &deliverable) {
                        self.builder.link(
                            RelationshipType::Realization,
                            LinkEnd::Id(package.clone()),
                            LinkEnd::Id(deliverable),
                        );
                    }
                }
            }
        } else if table.has(Column::Plateau) {
            self.each_row(table, ElementType::Plateau, Column::Plateau);
        } else if table.has(Column::Risk) {
            self.assessments(table, Column::Risk);
        } else if table.has(Column::Deliverable) {
            self.each_row(table, ElementType::Deliverable, Column::Deliverable);
        }
    }

    fn governance(&mut self, table: &ParsedTable) {
        if table.has(Column::Decision) {
            self.assessments(table, Column::Decision);
        } else if table.has(Column::Risk) {
            self.assessments(table, Column::Risk);
        } else if table.has(Column::Id) && table.has(Column::Title) {
            self.assessments(table, Column::Title);
        }
    }

    /// One Assessment per row, named `"{id}: {title}"` when an id is present.
    fn assessments(&mut self, table: &ParsedTable, title_column: Column) {
        for row in &table.rows {
            let id = row.value(Column::Id).map(clean_cell_text).filter(|id| !is_placeholder(id));
            let title = row
                .value(title_column)
                .map(clean_cell_text)
                .filter(|title| !is_placeholder(title));
            let name = match (&id, &title) {
                (Some(id), Some(title)) => format!("{id}: {title}"),
                (None, Some(title)) => title.clone(),
                (Some(id), None) => id.clone(),
                (None, None) => continue,
            };
            let headers: Vec<&str> = [row.header(Column::Id), row.header(title_column)]
                .into_iter()
                .flatten()
                .collect();
            self.add_row_element(ElementType::Assessment, &name, row, &headers);
        }
    }

    fn requirements(&mut self, table: &ParsedTable) {
        if !table.has(Column::Id) && !table.has(Column::Title) {
            return;
        }
        let heading_says_constraint =
            table.heading_mentions("non-functional") || table.heading_mentions("non functional");
        for row in &table.rows {
            let id = row.value(Column::Id).map(clean_cell_text).unwrap_or_default();
            let (name, name_column) = match row.value(Column::Title) {
                Some(title) => (title, Column::Title),
                None if !id.is_empty() => (id.as_str(), Column::Id),
                None => continue,
            };
            let element_type = requirement_type(&id, row.value(Column::RequirementType), heading_says_constraint);
            let headers: Vec<&str> = row.header(name_column).into_iter().collect();
            self.add_row_element(element_type, name, row, &headers);
        }
    }

    /// One Gap per distinct gap cell; Baseline/Target/Action become properties.
    fn gaps(&mut self, table: &ParsedTable) {
        let column = if table.has(Column::Gap) {
            Column::Gap
        } else {
            Column::Name
        };
        self.each_row(table, ElementType::Gap, column);
    }

    fn each_row(&mut self, table: &ParsedTable, element_type: ElementType, column: Column) {
        for row in &table.rows {
            self.row_element(element_type, row, column);
        }
    }

    fn each_row_by_header(&mut self, table: &ParsedTable, element_type: ElementType, header: &str) {
        for row in &table.rows {
            if let Some(name) = row.cell(header).filter(|value| !value.trim().is_empty()) {
                self.add_row_element(element_type, name, row, &[header]);
            }
        }
    }

    fn row_element(&mut self, element_type: ElementType, row: &TableRow, column: Column) -> Option<String> {
        let name = row.value(column)?;
        let header = row.header(column)?;
        self.add_row_element(element_type, name, row, &[header])
    }

    /// Add an element for `row` and record its reference-column links.
    ///
    /// Cells under `name_headers` are the name; every other non-empty cell
    /// becomes a property.
    fn add_row_element(
        &mut self,
        element_type: ElementType,
        name: &str,
        row: &TableRow,
        name_headers: &[&str],
    ) -> Option<String> {
        let properties = row_properties(row, name_headers);
        let status = row.value(Column::Status).and_then(MigrationStatus::from_marker);
        let Some(id) = self
            .builder
            .add_element(element_type, name, self.source, properties, status)
        else {
            trace!(source = self.source, name, "skipped row without usable name");
            return None;
        };
        self.reference_links(row, &id);
        Some(id)
    }

    fn named(&mut self, element_type: ElementType, name: &str) -> Option<String> {
        self.builder
            .add_element(element_type, name, self.source, BTreeMap::new(), None)
    }

    fn reference_links(&mut self, row: &TableRow, id: &str) {
        let outgoing = [
            (Column::Realizes, RelationshipType::Realization),
            (Column::Serves, RelationshipType::Serving),
        ];
        for (column, relationship_type) in outgoing {
            for target in row.value(column).map(split_list_cell).unwrap_or_default() {
                self.builder.link(
                    relationship_type,
                    LinkEnd::Id(id.to_string()),
                    LinkEnd::Name(target),
                );
            }
        }
        for provider in row.value(Column::DependsOn).map(split_list_cell).unwrap_or_default() {
            self.builder.link(
                RelationshipType::Serving,
                LinkEnd::Name(provider),
                LinkEnd::Id(id.to_string()),
            );
        }
    }
}

fn row_properties(row: &TableRow, name_headers: &[&str]) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    for (header, value) in row.iter() {
        let header = header.trim();
        if header.is_empty() || name_headers.iter().any(|name| name.trim() == header) {
            continue;
        }
        let value = clean_cell_text(value);
        if !is_placeholder(&value) {
            properties.entry(header.to_string()).or_insert(value);
        }
    }
    properties
}

fn header_named<'t>(table: &'t ParsedTable, names: &[&str]) -> Option<&'t str> {
    table
        .headers
        .iter()
        .find(|header| names.contains(&normalize_name(header).as_str()))
        .map(String::as_str)
}

/// `FR-1`, `NFR 2`, `REQ-003`: a known prefix not followed by a letter.
pub(crate) fn has_id_prefix(text: &str, prefix: &str) -> bool {
    let upper = text.trim().to_uppercase();
    upper
        .strip_prefix(prefix)
        .is_some_and(|rest| !rest.starts_with(char::is_alphabetic))
}

fn is_requirement_id(text: &str) -> bool {
    ["FR", "NFR", "REQ"]
        .iter()
        .any(|prefix| has_id_prefix(text, prefix))
}

fn requirement_type(id: &str, kind: Option<&str>, heading_says_constraint: bool) -> ElementType {
    if has_id_prefix(id, "FR") {
        return ElementType::Requirement;
    }
    if has_id_prefix(id, "NFR") || heading_says_constraint {
        return ElementType::Constraint;
    }
    let kind = kind.map(str::to_lowercase).unwrap_or_default();
    let normalized_kind = normalize_name(&kind);
    let marked = CONSTRAINT_MARKERS.iter().any(|marker| {
        if marker.len() < 4 {
            am_core::contains_word_run(&normalized_kind, marker)
        } else {
            kind.contains(marker)
        }
    });
    if marked {
        ElementType::Constraint
    } else {
        ElementType::Requirement
    }
}
