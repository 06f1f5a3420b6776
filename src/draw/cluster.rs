use crate::cluster::{ClusterIndex, ClusterNode};
use crate::color::Rgba;
use crate::data::Projector;
use crate::draw::{draw_label, shift};
use crate::scale::{IntensityConfig, IntensityMap};
use crate::style::PaintStyle;
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::DrawingErrorKind;

pub const CLUSTER_MIN_SIZE: f64 = 8.0;
pub const CLUSTER_MAX_SIZE: f64 = 30.0;

/// One zoom level of a cluster index: clusters as labeled circles sized by
/// weight, unclustered points as plain markers.
pub struct ClusterLayer<'a> {
    nodes: Vec<&'a ClusterNode>,
    projector: &'a dyn Projector,
    sizes: IntensityMap,
    style: PaintStyle,
    label_color: Rgba,
}

impl<'a> ClusterLayer<'a> {
    pub fn new(index: &'a ClusterIndex, bbox: [f64; 4], zoom: f64, projector: &'a dyn Projector, style: PaintStyle) -> ClusterLayer<'a> {
        let (min, max) = index.level(zoom).map_or((0.0, 0.0), |l| (l.min_weight as f64, l.max_weight as f64));
        let sizes = IntensityMap::new(&IntensityConfig {
            min,
            max,
            min_size: CLUSTER_MIN_SIZE,
            max_size: CLUSTER_MAX_SIZE,
            ..Default::default()
        });
        let nodes = index.clusters(bbox, zoom);
        log::debug!("cluster layer: {} nodes at zoom {zoom}", nodes.len());
        ClusterLayer {
            nodes,
            projector,
            sizes,
            style,
            label_color: Rgba::WHITE,
        }
    }

    pub fn with_label_color(self, label_color: Rgba) -> ClusterLayer<'a> {
        ClusterLayer { label_color, ..self }
    }

    pub fn nodes(&self) -> &[&'a ClusterNode] {
        &self.nodes
    }

    pub fn radius_of(&self, node: &ClusterNode) -> f64 {
        if node.is_leaf {
            self.style.size
        } else {
            self.sizes.size_for(node.weight as f64)
        }
    }
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a ClusterLayer<'_> {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for ClusterLayer<'_>
where
    DB: DrawingBackend,
{
    fn draw<I>(&self, pos: I, backend: &mut DB, _: (u32, u32)) -> Result<(), DrawingErrorKind<DB::ErrorType>>
    where
        I: Iterator<Item = (i32, i32)>,
    {
        let mut pos = pos;
        let pos = pos.next().unwrap_or((0, 0));
        let (fill, stroke) = (self.style.fill(), self.style.stroke());
        for node in &self.nodes {
            let center = shift(pos, self.projector.project(node.lng_lat()));
            let radius = self.radius_of(node).max(0.0).round() as u32;
            if let Some(fill) = &fill {
                backend.draw_circle(center, radius, fill, true)?;
            }
            if let Some(stroke) = &stroke {
                backend.draw_circle(center, radius, stroke, false)?;
            }
            if !node.is_leaf {
                draw_label(backend, center, &self.style, self.label_color, &node.weight.to_string())?;
            }
        }
        Ok(())
    }
}
