#![forbid(unsafe_code)]

//! Deterministic grid placement shared by the XML serializers.
//!
//! Items are grouped into bands (one per architecture layer in practice).
//! Each band starts on a fresh row and wraps after [`GridConfig::columns`]
//! cells. Within a band, input order is preserved, so an unchanged model
//! always produces the same coordinates.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: usize,
    pub cell_width: f32,
    pub cell_height: f32,
    pub gap_x: f32,
    pub gap_y: f32,
    pub margin: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 6,
            cell_width: 160.0,
            cell_height: 60.0,
            gap_x: 40.0,
            gap_y: 40.0,
            margin: 40.0,
        }
    }
}

impl GridConfig {
    const fn effective_columns(&self) -> usize {
        if self.columns == 0 { 1 } else { self.columns }
    }

    fn cell_origin(&self, row: usize, column: usize) -> (f32, f32) {
        (
            self.margin + column as f32 * (self.cell_width + self.gap_x),
            self.margin + row as f32 * (self.cell_height + self.gap_y),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutRect {
    #[must_use]
    pub fn right(self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNodeBox {
    /// Position of the item in the input sequence.
    pub node_index: usize,
    pub key: String,
    pub band: usize,
    pub row: usize,
    pub column: usize,
    pub bounds: LayoutRect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBandBox {
    pub band: usize,
    pub first_row: usize,
    pub row_count: usize,
    pub bounds: LayoutRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridStats {
    pub node_count: usize,
    pub band_count: usize,
    pub row_count: usize,
    pub column_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Boxes in input order.
    pub nodes: Vec<LayoutNodeBox>,
    pub bands: Vec<LayoutBandBox>,
    /// Extent of all cells plus the margin on every side.
    pub bounds: LayoutRect,
    pub stats: GridStats,
    #[serde(skip)]
    index_by_key: BTreeMap<String, usize>,
}

impl GridLayout {
    #[must_use]
    pub fn node(&self, key: &str) -> Option<&LayoutNodeBox> {
        self.index_by_key
            .get(key)
            .and_then(|index| self.nodes.get(*index))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Place `(key, band)` items on the grid.
///
/// Bands are laid out in ascending order; empty bands take no space. A key
/// that appears twice keeps its first placement.
#[must_use]
pub fn layout_grid<'a, I>(items: I, config: &GridConfig) -> GridLayout
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let columns = config.effective_columns();
    let mut by_band: BTreeMap<usize, Vec<(usize, &'a str)>> = BTreeMap::new();
    let mut seen: BTreeSet<&'a str> = BTreeSet::new();
    let mut total = 0_usize;
    for (key, band) in items {
        if !seen.insert(key) {
            continue;
        }
        by_band.entry(band).or_default().push((total, key));
        total += 1;
    }

    let mut placed: Vec<Option<LayoutNodeBox>> = vec![None; total];
    let mut bands = Vec::with_capacity(by_band.len());
    let mut next_row = 0_usize;
    let mut widest = 0_usize;

    for (band, members) in &by_band {
        let first_row = next_row;
        let row_count = members.len().div_ceil(columns);
        let band_columns = members.len().min(columns);
        widest = widest.max(band_columns);

        for (position, (node_index, key)) in members.iter().enumerate() {
            let row = first_row + position / columns;
            let column = position % columns;
            let (x, y) = config.cell_origin(row, column);
            placed[*node_index] = Some(LayoutNodeBox {
                node_index: *node_index,
                key: (*key).to_string(),
                band: *band,
                row,
                column,
                bounds: LayoutRect {
                    x,
                    y,
                    width: config.cell_width,
                    height: config.cell_height,
                },
            });
        }

        let (x, y) = config.cell_origin(first_row, 0);
        bands.push(LayoutBandBox {
            band: *band,
            first_row,
            row_count,
            bounds: LayoutRect {
                x,
                y,
                width: span(band_columns, config.cell_width, config.gap_x),
                height: span(row_count, config.cell_height, config.gap_y),
            },
        });
        next_row += row_count;
    }

    let nodes: Vec<LayoutNodeBox> = placed.into_iter().flatten().collect();
    let index_by_key = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.key.clone(), index))
        .collect();
    let bounds = LayoutRect {
        x: 0.0,
        y: 0.0,
        width: span(widest, config.cell_width, config.gap_x) + 2.0 * config.margin,
        height: span(next_row, config.cell_height, config.gap_y) + 2.0 * config.margin,
    };
    let stats = GridStats {
        node_count: nodes.len(),
        band_count: bands.len(),
        row_count: next_row,
        column_count: widest,
    };
    debug!(
        nodes = stats.node_count,
        bands = stats.band_count,
        rows = stats.row_count,
        "grid layout computed"
    );

    GridLayout {
        nodes,
        bands,
        bounds,
        stats,
        index_by_key,
    }
}

fn span(count: usize, cell: f32, gap: f32) -> f32 {
    if count == 0 {
        0.0
    } else {
        count as f32 * cell + (count - 1) as f32 * gap
    }
}
