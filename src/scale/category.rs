use crate::color::{DEFAULT_PALETTE, Rgba};
use crate::data::DataPoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const OTHER: &str = "other";
/// Key of points without a count.
pub const NO_COUNT: &str = "none";

/// Exact-key lookup with a fallback value for everything else.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryMap<V> {
    entries: HashMap<String, V>,
    other: V,
}

impl Default for CategoryMap<Rgba> {
    fn default() -> CategoryMap<Rgba> {
        CategoryMap::new(DEFAULT_PALETTE[DEFAULT_PALETTE.len() - 1])
    }
}

impl<V: Clone> CategoryMap<V> {
    pub fn new(other: V) -> CategoryMap<V> {
        CategoryMap {
            entries: HashMap::new(),
            other,
        }
    }

    pub fn insert(&mut self, key: &str, value: V) {
        if key == OTHER {
            self.other = value;
        } else {
            self.entries.insert(key.to_string(), value);
        }
    }

    pub fn set_other(&mut self, value: V) {
        self.other = value;
    }

    pub fn get(&self, key: &str) -> &V {
        self.entries.get(key).unwrap_or(&self.other)
    }

    pub fn other(&self) -> &V {
        &self.other
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assigns palette entries to keys in first-seen order, keeping the last
    /// entry for "other". Once `palette.len() - 1` keys are taken every later
    /// key falls back to "other"; the outcome depends on input order.
    pub fn generate_from_keys<I, S>(&mut self, keys: I, palette: &[V])
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(other) = palette.last() else {
            log::warn!("empty palette; category map left unchanged");
            return;
        };
        self.entries.clear();
        for key in keys {
            let assigned = self.entries.len();
            if assigned >= palette.len() - 1 {
                break;
            }
            let key = key.as_ref();
            if key != OTHER && !self.entries.contains_key(key) {
                self.entries.insert(key.to_string(), palette[assigned].clone());
            }
        }
        self.other = other.clone();
    }

    pub fn generate_from_dataset(&mut self, points: &[DataPoint], palette: &[V]) {
        self.generate_from_keys(points.iter().map(category_key), palette);
    }
}

/// Key a point is looked up by: the display form of its count, or
/// `NO_COUNT`, which takes a palette slot like any other key.
pub fn category_key(point: &DataPoint) -> String {
    point.count.map_or_else(|| NO_COUNT.to_string(), |c| c.to_string())
}
