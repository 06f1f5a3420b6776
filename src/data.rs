// @file data.rs
// @brief data points, datasets and coordinate projection

use crate::style::StyleOverrides;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub type Coord = [f64; 2];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    pub fn map_coords<P: Projector + ?Sized>(&self, projector: &P) -> Geometry {
        let ring = |v: &Vec<Coord>| v.iter().map(|&c| projector.project(c)).collect::<Vec<_>>();
        match self {
            Geometry::Point(c) => Geometry::Point(projector.project(*c)),
            Geometry::LineString(v) => Geometry::LineString(ring(v)),
            Geometry::Polygon(rings) => Geometry::Polygon(rings.iter().map(ring).collect()),
            Geometry::MultiPolygon(polys) => {
                Geometry::MultiPolygon(polys.iter().map(|p| p.iter().map(ring).collect()).collect())
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPoint {
    pub geometry: Option<Geometry>,
    /// device-pixel version of `geometry`, filled by a projector
    #[serde(skip)]
    pub projected: Option<Geometry>,
    pub count: Option<f64>,
    pub text: Option<String>,
    pub icon: Option<String>,
    #[serde(flatten)]
    pub style: StyleOverrides,
}

impl DataPoint {
    pub fn point(x: f64, y: f64) -> DataPoint {
        DataPoint {
            geometry: Some(Geometry::Point([x, y])),
            ..Default::default()
        }
    }

    pub fn with_count(self, count: f64) -> DataPoint {
        DataPoint {
            count: Some(count),
            ..self
        }
    }

    pub fn weight(&self) -> f64 {
        self.count.unwrap_or(1.0)
    }

    /// Geometry in pixel space: the projected one when present.
    pub fn pixel_geometry(&self) -> Option<&Geometry> {
        self.projected.as_ref().or(self.geometry.as_ref())
    }

    pub fn pixel(&self) -> Option<Coord> {
        match self.pixel_geometry()? {
            Geometry::Point(c) => Some(*c),
            _ => None,
        }
    }
}

/// Ordered, read-only view over data points; lets components accept both
/// datasets and plain slices.
pub trait PointSource {
    fn as_point_sequence(&self) -> &[DataPoint];
}

impl PointSource for [DataPoint] {
    fn as_point_sequence(&self) -> &[DataPoint] {
        self
    }
}

impl PointSource for Vec<DataPoint> {
    fn as_point_sequence(&self) -> &[DataPoint] {
        self
    }
}

impl<const N: usize> PointSource for [DataPoint; N] {
    fn as_point_sequence(&self) -> &[DataPoint] {
        self
    }
}

impl PointSource for DataSet {
    fn as_point_sequence(&self) -> &[DataPoint] {
        &self.points
    }
}

#[derive(Clone, Debug, Default)]
pub struct DataSet {
    points: Vec<DataPoint>,
}

impl DataSet {
    pub fn new(points: Vec<DataPoint>) -> DataSet {
        DataSet { points }
    }

    /// Builds a dataset from a YAML document holding either one point (a mapping)
    /// or a list of points. Any other payload is a construction error.
    pub fn from_yaml_str(s: &str) -> Result<DataSet> {
        let value: serde_yaml::Value = serde_yaml::from_str(s)?;
        let points = match value {
            serde_yaml::Value::Sequence(_) => serde_yaml::from_value::<Vec<DataPoint>>(value)?,
            serde_yaml::Value::Mapping(_) => vec![serde_yaml::from_value::<DataPoint>(value)?],
            other => {
                return Err(anyhow!(
                    "dataset payload must be a point or a list of points, got {}",
                    yaml_kind(&other)
                ));
            }
        };
        log::debug!("loaded {} points from yaml", points.len());
        Ok(DataSet { points })
    }

    pub fn add(&mut self, point: DataPoint) {
        self.points.push(point);
    }

    pub fn extend<I: IntoIterator<Item = DataPoint>>(&mut self, points: I) {
        self.points.extend(points);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Snapshot of the points passing `filter`, in dataset order.
    pub fn get(&self, filter: Option<&dyn Fn(&DataPoint) -> bool>) -> Vec<DataPoint> {
        match filter {
            Some(f) => self.points.iter().filter(|p| f(p)).cloned().collect(),
            None => self.points.clone(),
        }
    }

    pub fn count_range(&self) -> Option<(f64, f64)> {
        count_range(&self.points)
    }

    /// Copy of the dataset with pixel coordinates filled in by `projector`.
    pub fn project<P: Projector + ?Sized>(&self, projector: &P) -> DataSet {
        let points = self
            .points
            .iter()
            .map(|p| DataPoint {
                projected: p.geometry.as_ref().map(|g| g.map_coords(projector)),
                ..p.clone()
            })
            .collect();
        DataSet { points }
    }
}

pub fn count_range(points: &[DataPoint]) -> Option<(f64, f64)> {
    points.iter().filter_map(|p| p.count).fold(None, |acc, c| match acc {
        None => Some((c, c)),
        Some((lo, hi)) => Some((lo.min(c), hi.max(c))),
    })
}

fn yaml_kind(v: &serde_yaml::Value) -> &'static str {
    match v {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

/// Geographic-to-pixel transform supplied by the host.
pub trait Projector {
    fn project(&self, c: Coord) -> Coord;
}

impl<F> Projector for F
where
    F: Fn(Coord) -> Coord,
{
    fn project(&self, c: Coord) -> Coord {
        self(c)
    }
}

pub fn lng_to_world(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

pub fn lat_to_world(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

pub fn world_to_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

pub fn world_to_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Web-Mercator view of `width` x `height` pixels centered on a lng/lat.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Coord,
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const TILE_SIZE: f64 = 256.0;

    fn scale(&self) -> f64 {
        Viewport::TILE_SIZE * self.zoom.exp2()
    }

    pub fn world_to_pixel(&self, w: Coord) -> Coord {
        let scale = self.scale();
        let cx = lng_to_world(self.center[0]);
        let cy = lat_to_world(self.center[1]);
        [
            (w[0] - cx) * scale + self.width as f64 / 2.0,
            (w[1] - cy) * scale + self.height as f64 / 2.0,
        ]
    }

    /// (west, south, east, north) in degrees.
    pub fn bounds(&self) -> [f64; 4] {
        let scale = self.scale();
        let cx = lng_to_world(self.center[0]);
        let cy = lat_to_world(self.center[1]);
        let half_w = self.width as f64 / 2.0 / scale;
        let half_h = self.height as f64 / 2.0 / scale;
        [
            world_to_lng(cx - half_w),
            world_to_lat((cy + half_h).min(1.0)),
            world_to_lng(cx + half_w),
            world_to_lat((cy - half_h).max(0.0)),
        ]
    }

    /// Smallest integer zoom showing every point, centered on their bounding box.
    pub fn fit(points: &[DataPoint], width: u32, height: u32) -> Option<Viewport> {
        let mut bbox: Option<[f64; 4]> = None;
        for p in points {
            let Some(Geometry::Point([lng, lat])) = p.geometry else {
                continue;
            };
            let (x, y) = (lng_to_world(lng), lat_to_world(lat));
            bbox = Some(match bbox {
                None => [x, y, x, y],
                Some(b) => [b[0].min(x), b[1].min(y), b[2].max(x), b[3].max(y)],
            });
        }
        let b = bbox?;
        let span = ((b[2] - b[0]) / width.max(1) as f64).max((b[3] - b[1]) / height.max(1) as f64);
        let zoom = if span > 0.0 {
            (1.0 / (span * Viewport::TILE_SIZE)).log2().floor().clamp(0.0, 22.0)
        } else {
            12.0
        };
        Some(Viewport {
            center: [world_to_lng((b[0] + b[2]) / 2.0), world_to_lat((b[1] + b[3]) / 2.0)],
            zoom,
            width,
            height,
        })
    }
}

impl Projector for Viewport {
    fn project(&self, c: Coord) -> Coord {
        self.world_to_pixel([lng_to_world(c[0]), lat_to_world(c[1])])
    }
}
