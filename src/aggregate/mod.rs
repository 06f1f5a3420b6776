// @file mod.rs
// @brief spatial aggregation of pixel-space points into grid cells and hexagons

mod grid;
mod hexbin;

pub use grid::GridAggregator;
pub use hexbin::{HexBinAggregator, HexGeometry};

use crate::data::{Coord, DataPoint, Geometry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub fn new(x: f64, y: f64) -> Offset {
        Offset { x, y }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bin {
    pub key: String,
    pub i: Option<i64>,
    pub j: Option<i64>,
    /// grid: screen origin of the cell; hexagon: center before offset
    pub x: f64,
    pub y: f64,
    pub count: f64,
    /// indices into the aggregated point sequence
    pub members: Vec<usize>,
}

/// Bins in first-assignment order with lookup by key.
#[derive(Clone, Debug, Default)]
pub struct Bins {
    bins: Vec<Bin>,
    index: HashMap<String, usize>,
}

impl Bins {
    fn from_vec(bins: Vec<Bin>) -> Bins {
        let mut index = HashMap::with_capacity(bins.len());
        for (i, bin) in bins.iter().enumerate() {
            index.entry(bin.key.clone()).or_insert(i);
        }
        Bins { bins, index }
    }

    pub fn get(&self, key: &str) -> Option<&Bin> {
        self.index.get(key).map(|&i| &self.bins[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bin> {
        self.bins.iter()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total_count(&self) -> f64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn count_range(&self) -> Option<(f64, f64)> {
        self.bins.iter().fold(None, |acc, b| match acc {
            None => Some((b.count, b.count)),
            Some((lo, hi)) => Some((lo.min(b.count), hi.max(b.count))),
        })
    }
}

impl<'a> IntoIterator for &'a Bins {
    type Item = &'a Bin;
    type IntoIter = std::slice::Iter<'a, Bin>;

    fn into_iter(self) -> Self::IntoIter {
        self.bins.iter()
    }
}

/// Accumulates bins keyed by integer cell address in first-seen order.
struct CellAccumulator {
    bins: Vec<Bin>,
    cells: HashMap<(i64, i64), usize>,
}

impl CellAccumulator {
    fn new() -> CellAccumulator {
        CellAccumulator {
            bins: Vec::new(),
            cells: HashMap::new(),
        }
    }

    fn add<F>(&mut self, cell: (i64, i64), member: usize, weight: f64, make: F)
    where
        F: FnOnce() -> Bin,
    {
        let index = *self.cells.entry(cell).or_insert_with(|| {
            self.bins.push(make());
            self.bins.len() - 1
        });
        let bin = &mut self.bins[index];
        bin.count += weight;
        bin.members.push(member);
    }

    fn finish(self) -> Bins {
        Bins::from_vec(self.bins)
    }
}

/// Pixel position of a point record; records without geometry are skipped
/// silently, other geometry types with a warning.
fn point_position(point: &DataPoint, aggregator: &str) -> Option<Coord> {
    match point.pixel_geometry()? {
        Geometry::Point(c) => Some(*c),
        g => {
            log::warn!("{aggregator}: unsupported geometry type {}, skipped", g.kind());
            None
        }
    }
}
