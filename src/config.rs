// @file config.rs
// @brief render configuration: surface, background, view and the layer stack

use crate::color::Rgba;
use crate::data::{Coord, DataSet, PointSource, Viewport};
use crate::layer::LayerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// lng, lat
    pub center: Coord,
    pub zoom: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub background: Rgba,
    /// fixed map view; fitted to the data when missing
    pub view: Option<ViewConfig>,
    /// input coordinates are already device pixels
    pub pixel_coordinates: bool,
    pub layers: Vec<LayerConfig>,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            width: 800,
            height: 600,
            background: Rgba::WHITE,
            view: None,
            pixel_coordinates: false,
            layers: vec![LayerConfig::default()],
        }
    }
}

impl RenderConfig {
    pub fn from_yaml_str(s: &str) -> Result<RenderConfig> {
        let config: RenderConfig = serde_yaml::from_str(s)?;
        log::debug!("render config: {}x{}, {} layers", config.width, config.height, config.layers.len());
        Ok(config)
    }

    pub fn load(path: &str) -> Result<RenderConfig> {
        let s = std::fs::read_to_string(path).with_context(|| format!("failed to read config {path}"))?;
        RenderConfig::from_yaml_str(&s).with_context(|| format!("failed to parse config {path}"))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Projection for `data`: `None` in pixel mode or when nothing can be fitted.
    pub fn viewport(&self, data: &DataSet) -> Option<Viewport> {
        if self.pixel_coordinates {
            return None;
        }
        match self.view {
            Some(view) => Some(Viewport {
                center: view.center,
                zoom: view.zoom,
                width: self.width,
                height: self.height,
            }),
            None => Viewport::fit(data.as_point_sequence(), self.width, self.height),
        }
    }
}
