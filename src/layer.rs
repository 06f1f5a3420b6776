// @file layer.rs
// @brief layer configuration (`draw:` selector plus options) and the renderer that turns it into drawables

use crate::aggregate::{GridAggregator, HexBinAggregator, Offset};
use crate::cluster::{ClusterIndex, ClusterOptions};
use crate::color::{DEFAULT_PALETTE, Rgba};
use crate::config::RenderConfig;
use crate::data::{DataSet, PointSource, Viewport};
use crate::density::DensityFieldAccumulator;
use crate::draw::{ClusterLayer, FillMode, GridLayer, HeatmapLayer, HeatmapOptions, HoneycombLayer, IconLayer, SimpleLayer, TextLayer};
use crate::image_cache::ImageCache;
use crate::scale::{CategoryMap, ChoroplethMap, DEFAULT_BINS, IntensityConfig, IntensityMap};
use crate::style::PaintStyle;
use anyhow::Result;
use clap::ValueEnum;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    #[default]
    Simple,
    Intensity,
    Bubble,
    Category,
    Choropleth,
    Text,
    Icon,
    Grid,
    Honeycomb,
    Heatmap,
    Cluster,
}

/// Options of one layer. Which fields are read depends on `draw`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub draw: DrawMode,
    pub style: PaintStyle,
    /// intensity, bubble, grid and honeycomb
    pub intensity: IntensityConfig,
    /// category: explicit key colors; generated from the data when empty
    pub categories: BTreeMap<String, Rgba>,
    /// choropleth: explicit ranges; equal bins over the data when empty
    pub choropleth: ChoroplethMap<Rgba>,
    pub bins: usize,
    /// grid cell or hexagon size in pixels
    pub size: f64,
    pub offset: Offset,
    pub pre_aggregated: bool,
    /// label color for grid, honeycomb and cluster counts
    pub label: Option<Rgba>,
    pub icon: Option<String>,
    pub heatmap: HeatmapOptions,
    pub cluster: ClusterOptions,
}

impl Default for LayerConfig {
    fn default() -> LayerConfig {
        LayerConfig {
            draw: DrawMode::Simple,
            style: PaintStyle::default(),
            intensity: IntensityConfig::default(),
            categories: BTreeMap::new(),
            choropleth: ChoroplethMap::default(),
            bins: DEFAULT_BINS,
            size: 50.0,
            offset: Offset::default(),
            pre_aggregated: false,
            label: None,
            icon: None,
            heatmap: HeatmapOptions::default(),
            cluster: ClusterOptions::default(),
        }
    }
}

impl LayerConfig {
    pub fn new(draw: DrawMode) -> LayerConfig {
        LayerConfig {
            draw,
            ..Default::default()
        }
    }

    /// Value mapping for the fill-mode encodings; data-derived maps are built from `data`.
    pub fn fill_mode(&self, data: &DataSet) -> FillMode {
        match self.draw {
            DrawMode::Intensity => FillMode::Intensity(IntensityMap::new(&self.intensity)),
            DrawMode::Bubble => FillMode::Bubble(IntensityMap::new(&self.intensity)),
            DrawMode::Category => {
                let mut map = CategoryMap::default();
                if self.categories.is_empty() {
                    map.generate_from_dataset(data.as_point_sequence(), &DEFAULT_PALETTE);
                } else {
                    for (key, color) in &self.categories {
                        map.insert(key, *color);
                    }
                }
                FillMode::Category(map)
            }
            DrawMode::Choropleth => {
                let mut map = self.choropleth.clone();
                if map.ranges().is_empty() {
                    if let Some((min, max)) = data.count_range() {
                        map.generate_equal_bins(min, max, self.bins);
                    }
                }
                FillMode::Choropleth(map)
            }
            _ => FillMode::Fixed,
        }
    }
}

/// Draws a layer stack. Keeps the density stamp between frames.
#[derive(Debug, Default)]
pub struct Renderer {
    accumulator: DensityFieldAccumulator,
}

impl Renderer {
    pub fn new() -> Renderer {
        Renderer::default()
    }

    pub fn render<DB>(&mut self, root: &DrawingArea<DB, Shift>, config: &RenderConfig, data: &DataSet, images: &ImageCache) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&config.background.to_plotters())?;
        let viewport = config.viewport(data);
        let projected = match &viewport {
            Some(vp) => data.project(vp),
            None => data.clone(),
        };
        log::info!(
            "rendering {} points in {} layers onto {}x{}",
            data.len(),
            config.layers.len(),
            config.width,
            config.height
        );
        for layer in &config.layers {
            self.draw_layer(root, layer, data, &projected, viewport.as_ref(), images)?;
        }
        root.present()?;
        Ok(())
    }

    fn draw_layer<DB>(
        &mut self,
        root: &DrawingArea<DB, Shift>,
        layer: &LayerConfig,
        data: &DataSet,
        projected: &DataSet,
        viewport: Option<&Viewport>,
        images: &ImageCache,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let points = projected.as_point_sequence();
        let style = layer.style.clone();
        match layer.draw {
            DrawMode::Simple | DrawMode::Intensity | DrawMode::Bubble | DrawMode::Category | DrawMode::Choropleth => {
                root.draw(&SimpleLayer::new(points, style, layer.fill_mode(data)))?;
            }
            DrawMode::Text => root.draw(&TextLayer::new(points, style, layer.offset))?,
            DrawMode::Icon => root.draw(&IconLayer::new(points, images, layer.icon.clone(), style))?,
            DrawMode::Grid => {
                let aggregator = GridAggregator::new(layer.size, layer.offset).pre_aggregated(layer.pre_aggregated);
                let bins = aggregator.aggregate(projected);
                let intensity = IntensityMap::new(&layer.intensity);
                let grid = GridLayer::new(&bins, layer.size, &intensity, style);
                match layer.label {
                    Some(color) => root.draw(&grid.with_labels(color))?,
                    None => root.draw(&grid)?,
                }
            }
            DrawMode::Honeycomb => {
                let aggregator = HexBinAggregator::new(layer.size, layer.offset);
                let bins = aggregator.aggregate(projected);
                let intensity = IntensityMap::new(&layer.intensity);
                let honeycomb = HoneycombLayer::new(&bins, &aggregator, &intensity, style);
                match layer.label {
                    Some(color) => root.draw(&honeycomb.with_labels(color))?,
                    None => root.draw(&honeycomb)?,
                }
            }
            DrawMode::Heatmap => {
                let surface = root.dim_in_pixel();
                root.draw(&HeatmapLayer::new(projected, &mut self.accumulator, surface, &layer.heatmap))?;
            }
            DrawMode::Cluster => {
                let Some(viewport) = viewport else {
                    log::warn!("cluster layer needs geographic coordinates, skipped");
                    return Ok(());
                };
                let mut index = ClusterIndex::new(layer.cluster)?;
                index.load(data);
                let clusters = ClusterLayer::new(&index, viewport.bounds(), viewport.zoom, viewport, style);
                let clusters = match layer.label {
                    Some(color) => clusters.with_label_color(color),
                    None => clusters,
                };
                root.draw(&clusters)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataPoint;
    use crate::draw::FillMode;

    fn counted(counts: &[f64]) -> DataSet {
        DataSet::new(counts.iter().map(|&c| DataPoint::point(0.0, 0.0).with_count(c)).collect())
    }

    #[test]
    fn category_mode_generates_from_data_when_unconfigured() {
        let data = counted(&[3.0, 5.0]);
        let FillMode::Category(map) = LayerConfig::new(DrawMode::Category).fill_mode(&data) else {
            panic!("expected a category map");
        };
        assert_eq!(*map.get("3"), DEFAULT_PALETTE[0]);
        assert_eq!(*map.get("5"), DEFAULT_PALETTE[1]);

        let mut layer = LayerConfig::new(DrawMode::Category);
        layer.categories.insert("5".to_string(), Rgba::BLACK);
        let FillMode::Category(map) = layer.fill_mode(&data) else {
            panic!("expected a category map");
        };
        assert_eq!(*map.get("5"), Rgba::BLACK);
        assert_eq!(*map.get("3"), DEFAULT_PALETTE[6]);
    }

    #[test]
    fn choropleth_mode_bins_the_count_range() {
        let data = counted(&[0.0, 70.0]);
        let FillMode::Choropleth(map) = LayerConfig::new(DrawMode::Choropleth).fill_mode(&data) else {
            panic!("expected a choropleth map");
        };
        assert_eq!(map.ranges().len(), DEFAULT_BINS);
        assert_eq!(map.get(15.0), Some(&DEFAULT_PALETTE[1]));
    }

    #[test]
    fn plain_modes_have_fixed_fill() {
        assert!(matches!(LayerConfig::new(DrawMode::Grid).fill_mode(&DataSet::default()), FillMode::Fixed));
        assert!(matches!(LayerConfig::new(DrawMode::Bubble).fill_mode(&DataSet::default()), FillMode::Bubble(_)));
    }

    #[test]
    fn draw_modes_parse_lowercase() {
        let layer: LayerConfig = serde_yaml::from_str("draw: honeycomb\nsize: 12\n").unwrap();
        assert_eq!(layer.draw, DrawMode::Honeycomb);
        assert_eq!(layer.size, 12.0);
        assert_eq!(layer.bins, DEFAULT_BINS);
        assert_eq!(DrawMode::from_str("heatmap", true), Ok(DrawMode::Heatmap));
    }
}
