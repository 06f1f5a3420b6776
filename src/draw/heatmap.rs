use crate::color::Gradient;
use crate::data::PointSource;
use crate::density::{ColorField, ColorizeOptions, DensityFieldAccumulator, colorize};
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::{BackendColor, DrawingErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapOptions {
    /// stamp radius in pixels
    pub size: f64,
    pub min: f64,
    pub max: f64,
    pub gradient: Gradient,
    pub range: Option<(f64, f64)>,
    pub min_opacity: f64,
    pub max_opacity: f64,
    pub absolute: bool,
}

impl Default for HeatmapOptions {
    fn default() -> HeatmapOptions {
        HeatmapOptions {
            size: 13.0,
            min: 0.0,
            max: 100.0,
            gradient: Gradient::default(),
            range: None,
            min_opacity: 0.0,
            max_opacity: 0.8,
            absolute: false,
        }
    }
}

impl HeatmapOptions {
    pub fn colorize_options(&self) -> ColorizeOptions {
        ColorizeOptions {
            min: self.min,
            max: self.max,
            range: self.range,
            min_opacity: self.min_opacity,
            max_opacity: self.max_opacity,
            absolute: self.absolute,
        }
    }
}

/// Density field of the points at a fixed surface size, colorized once at construction.
pub struct HeatmapLayer {
    field: Option<ColorField>,
}

impl HeatmapLayer {
    pub fn new<S>(points: &S, accumulator: &mut DensityFieldAccumulator, surface: (u32, u32), options: &HeatmapOptions) -> HeatmapLayer
    where
        S: PointSource + ?Sized,
    {
        let field = accumulator
            .accumulate(points, surface, options.size, options.max)
            .map(|alpha| colorize(&alpha, &options.gradient.to_ramp(), &options.colorize_options()));
        HeatmapLayer { field }
    }

    pub fn field(&self) -> Option<&ColorField> {
        self.field.as_ref()
    }
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a HeatmapLayer {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for HeatmapLayer
where
    DB: DrawingBackend,
{
    fn draw<I>(&self, pos: I, backend: &mut DB, _: (u32, u32)) -> Result<(), DrawingErrorKind<DB::ErrorType>>
    where
        I: Iterator<Item = (i32, i32)>,
    {
        let mut pos = pos;
        let pos = pos.next().unwrap_or((0, 0));
        let Some(field) = &self.field else {
            return Ok(());
        };
        for y in 0..field.height {
            for x in 0..field.width {
                let c = field.get(x, y);
                if c.a == 0 {
                    continue;
                }
                let color = BackendColor {
                    alpha: c.alpha(),
                    rgb: (c.r, c.g, c.b),
                };
                backend.draw_pixel((pos.0 + x as i32, pos.1 + y as i32), color)?;
            }
        }
        Ok(())
    }
}
