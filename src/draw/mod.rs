// @file mod.rs
// @brief drawables for every encoding; each one is anchored at the top left corner of its area

mod cluster;
mod grid;
mod heatmap;
mod honeycomb;
mod icon;
mod simple;
mod text;

pub use cluster::ClusterLayer;
pub use grid::GridLayer;
pub use heatmap::{HeatmapLayer, HeatmapOptions};
pub use honeycomb::HoneycombLayer;
pub use icon::{IconLayer, request_missing};
pub use simple::SimpleLayer;
pub use text::TextLayer;

use crate::color::Rgba;
use crate::data::{Coord, DataPoint};
use crate::scale::{CategoryMap, ChoroplethMap, IntensityMap, category_key};
use crate::style::PaintStyle;
use plotters::prelude::*;
use plotters_backend::{BackendCoord, DrawingErrorKind};

/// How a value-driven layer derives per-point paint from `count`.
#[derive(Clone, Debug, Default)]
pub enum FillMode {
    #[default]
    Fixed,
    Intensity(IntensityMap),
    Bubble(IntensityMap),
    Category(CategoryMap<Rgba>),
    Choropleth(ChoroplethMap<Rgba>),
}

impl FillMode {
    /// Layer style, then the mode's value mapping, then the point's own overrides.
    pub fn apply(&self, base: &PaintStyle, point: &DataPoint) -> PaintStyle {
        let mut style = base.clone();
        let count = point.weight();
        match self {
            FillMode::Fixed => {}
            FillMode::Intensity(m) => style.fill_style = Some(m.color_for(count)),
            FillMode::Bubble(m) => style.size = m.size_for(count),
            FillMode::Category(m) => style.fill_style = Some(*m.get(&category_key(point))),
            FillMode::Choropleth(m) => {
                if let Some(c) = m.get(count) {
                    style.fill_style = Some(*c);
                }
            }
        }
        style.resolve(&point.style)
    }
}

/// Bin label: negative counts keep two decimals, others are truncated.
pub fn count_label(count: f64) -> String {
    if count < 0.0 {
        format!("{count:.2}")
    } else {
        format!("{}", count.trunc() as i64)
    }
}

fn shift(pos: BackendCoord, c: Coord) -> BackendCoord {
    (pos.0 + c[0].round() as i32, pos.1 + c[1].round() as i32)
}

fn draw_label<DB>(backend: &mut DB, pos: BackendCoord, style: &PaintStyle, color: Rgba, text: &str) -> Result<(), DrawingErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    let text_style = style.text_style(color);
    backend.draw_text(text, &text_style, pos)
}

/// Filled ring plus an optional closed outline.
fn draw_ring<DB>(backend: &mut DB, ring: &[BackendCoord], fill: Option<ShapeStyle>, stroke: Option<ShapeStyle>) -> Result<(), DrawingErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    if ring.len() < 3 {
        return Ok(());
    }
    if let Some(fill) = fill {
        backend.fill_polygon(ring.iter().copied(), &fill)?;
    }
    if let Some(stroke) = stroke {
        backend.draw_path(ring.iter().chain(ring.first()).copied(), &stroke)?;
    }
    Ok(())
}
