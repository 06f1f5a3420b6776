// @file mod.rs
// @brief value-to-paint mappers: intensity ramp, categories and choropleth ranges

mod category;
mod choropleth;
mod intensity;

pub use category::{CategoryMap, NO_COUNT, OTHER, category_key};
pub use choropleth::{ChoroplethMap, ChoroplethRange, DEFAULT_BINS};
pub use intensity::{IntensityConfig, IntensityMap};
