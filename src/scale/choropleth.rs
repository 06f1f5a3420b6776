use crate::color::{DEFAULT_PALETTE, Rgba};
use crate::data::{DataPoint, count_range};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BINS: usize = 7;

/// Half-open `[start, end)`; a missing bound is unbounded on that side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethRange<V> {
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
    pub value: V,
}

impl<V> ChoroplethRange<V> {
    pub fn contains(&self, x: f64) -> bool {
        self.start.is_none_or(|s| x >= s) && self.end.is_none_or(|e| x < e)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoroplethMap<V> {
    ranges: Vec<ChoroplethRange<V>>,
}

impl<V> Default for ChoroplethMap<V> {
    fn default() -> ChoroplethMap<V> {
        ChoroplethMap { ranges: Vec::new() }
    }
}

impl<V: Clone> ChoroplethMap<V> {
    pub fn new(ranges: Vec<ChoroplethRange<V>>) -> ChoroplethMap<V> {
        ChoroplethMap { ranges }
    }

    pub fn ranges(&self) -> &[ChoroplethRange<V>] {
        &self.ranges
    }

    /// First range in stored order containing `x`; overlapping ranges are
    /// resolved by that order.
    pub fn get(&self, x: f64) -> Option<&V> {
        self.ranges.iter().find(|r| r.contains(x)).map(|r| &r.value)
    }

    /// `num_bins` equal-width ranges from `min`, values taken from `palette` in
    /// order (cycled). Starts accumulate the floating step, so the last `end`
    /// may land slightly off `max`.
    pub fn generate_equal_bins_with(&mut self, min: f64, max: f64, num_bins: usize, palette: &[V]) {
        self.ranges.clear();
        if num_bins == 0 || palette.is_empty() || !(max > min) {
            log::warn!("no choropleth bins for [{min}, {max}) x {num_bins}");
            return;
        }
        let step = (max - min) / num_bins as f64;
        let mut start = min;
        for k in 0..num_bins {
            self.ranges.push(ChoroplethRange {
                start: Some(start),
                end: Some(start + step),
                value: palette[k % palette.len()].clone(),
            });
            start += step;
        }
    }
}

impl ChoroplethMap<Rgba> {
    pub fn generate_equal_bins(&mut self, min: f64, max: f64, num_bins: usize) {
        self.generate_equal_bins_with(min, max, num_bins, &DEFAULT_PALETTE);
    }

    pub fn generate_from_dataset(&mut self, points: &[DataPoint]) {
        match count_range(points) {
            Some((min, max)) => self.generate_equal_bins(min, max, DEFAULT_BINS),
            None => self.ranges.clear(),
        }
    }
}
