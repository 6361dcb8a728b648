//! Colors and mxGraph styles for the draw.io diagrams.

use std::fmt;

use am_core::{Layer, MigrationStatus, RelationshipType};

/// Fill and stroke of one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub fill: &'static str,
    pub stroke: &'static str,
}

/// ArchiMate layer colors used on the As-Is and Target diagrams.
#[must_use]
pub const fn layer_palette(layer: Layer) -> Palette {
    match layer {
        Layer::Motivation => Palette {
            fill: "#ccccff",
            stroke: "#6c6cbf",
        },
        Layer::Business => Palette {
            fill: "#ffffb5",
            stroke: "#b3b35a",
        },
        Layer::Application => Palette {
            fill: "#b5ffff",
            stroke: "#4fb3b3",
        },
        Layer::Technology => Palette {
            fill: "#c9e7b7",
            stroke: "#6f9e55",
        },
        Layer::Implementation => Palette {
            fill: "#ffe0e0",
            stroke: "#c98a8a",
        },
    }
}

/// Migration diagram colors: keep blue, add green, remove red.
#[must_use]
pub const fn status_palette(status: MigrationStatus) -> Palette {
    match status {
        MigrationStatus::Keep => Palette {
            fill: "#dae8fc",
            stroke: "#6c8ebf",
        },
        MigrationStatus::Add => Palette {
            fill: "#d5e8d4",
            stroke: "#82b366",
        },
        MigrationStatus::Remove => Palette {
            fill: "#f8cecc",
            stroke: "#b85450",
        },
    }
}

/// Legend caption for a migration status.
#[must_use]
pub const fn status_caption(status: MigrationStatus) -> &'static str {
    match status {
        MigrationStatus::Keep => "Keep (unchanged)",
        MigrationStatus::Add => "Add (new in target)",
        MigrationStatus::Remove => "Remove (retired)",
    }
}

/// An mxGraph style string: ordered `key=value;` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    entries: Vec<(&'static str, String)>,
}

impl Style {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing an earlier value.
    #[must_use]
    pub fn set(mut self, key: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    #[cfg(test)]
    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Base style of an element shape.
    #[must_use]
    pub fn shape(palette: Palette) -> Self {
        Self::new()
            .set("rounded", "1")
            .set("whiteSpace", "wrap")
            .set("html", "0")
            .set("fillColor", palette.fill)
            .set("strokeColor", palette.stroke)
    }

    /// Base style of a relationship edge, following ArchiMate notation.
    #[must_use]
    pub fn edge(relationship_type: RelationshipType) -> Self {
        let base = Self::new()
            .set("edgeStyle", "orthogonalEdgeStyle")
            .set("html", "0")
            .set("strokeColor", "#4d4d4d");
        match relationship_type {
            RelationshipType::Composition => base
                .set("startArrow", "diamondThin")
                .set("startFill", "1")
                .set("endArrow", "none"),
            RelationshipType::Aggregation => base
                .set("startArrow", "diamondThin")
                .set("startFill", "0")
                .set("endArrow", "none"),
            RelationshipType::Assignment => base
                .set("startArrow", "oval")
                .set("startFill", "1")
                .set("endArrow", "block")
                .set("endFill", "1"),
            RelationshipType::Realization => base
                .set("endArrow", "block")
                .set("endFill", "0")
                .set("dashed", "1"),
            RelationshipType::Serving => base.set("endArrow", "open").set("endFill", "0"),
            RelationshipType::Access => base
                .set("endArrow", "open")
                .set("endSize", "4")
                .set("dashed", "1")
                .set("dashPattern", "1 4"),
            RelationshipType::Influence => base
                .set("endArrow", "open")
                .set("dashed", "1")
                .set("dashPattern", "6 4"),
            RelationshipType::Triggering => base.set("endArrow", "block").set("endFill", "1"),
            RelationshipType::Flow => base
                .set("endArrow", "block")
                .set("endFill", "1")
                .set("dashed", "1")
                .set("dashPattern", "6 4"),
            RelationshipType::Association => base.set("endArrow", "none"),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            write!(f, "{key}={value};")?;
        }
        Ok(())
    }
}
