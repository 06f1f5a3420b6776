use crate::data::{Coord, DataPoint, Geometry};
use crate::draw::{FillMode, draw_ring, shift};
use crate::style::PaintStyle;
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::{BackendCoord, DrawingErrorKind};

/// Points as circles, lines as paths and polygons as filled rings.
pub struct SimpleLayer<'a> {
    points: &'a [DataPoint],
    style: PaintStyle,
    fill: FillMode,
}

impl<'a> SimpleLayer<'a> {
    pub fn new(points: &'a [DataPoint], style: PaintStyle, fill: FillMode) -> SimpleLayer<'a> {
        SimpleLayer { points, style, fill }
    }

    fn draw_geometry<DB>(&self, pos: BackendCoord, backend: &mut DB, geometry: &Geometry, style: &PaintStyle) -> Result<(), DrawingErrorKind<DB::ErrorType>>
    where
        DB: DrawingBackend,
    {
        match geometry {
            Geometry::Point(c) => {
                let center = shift(pos, *c);
                let radius = style.size.max(0.0).round() as u32;
                if let Some(fill) = style.fill() {
                    backend.draw_circle(center, radius, &fill, true)?;
                }
                if let Some(stroke) = style.stroke() {
                    backend.draw_circle(center, radius, &stroke, false)?;
                }
            }
            Geometry::LineString(line) => {
                // lines fall back to the fill color when no stroke is configured
                let stroke = style
                    .stroke()
                    .or_else(|| style.fill_style.map(|c| c.to_plotters().stroke_width(style.line_width.max(1))));
                if let Some(stroke) = stroke {
                    backend.draw_path(line.iter().map(|&c| shift(pos, c)), &stroke)?;
                }
            }
            Geometry::Polygon(rings) => draw_polygon(pos, backend, rings, style)?,
            Geometry::MultiPolygon(polygons) => {
                for rings in polygons {
                    draw_polygon(pos, backend, rings, style)?;
                }
            }
        }
        Ok(())
    }
}

// holes are filled over, not cut out
fn draw_polygon<DB>(pos: BackendCoord, backend: &mut DB, rings: &[Vec<Coord>], style: &PaintStyle) -> Result<(), DrawingErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    for ring in rings {
        let ring = ring.iter().map(|&c| shift(pos, c)).collect::<Vec<_>>();
        draw_ring(backend, &ring, style.fill(), style.stroke())?;
    }
    Ok(())
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a SimpleLayer<'_> {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for SimpleLayer<'_>
where
    DB: DrawingBackend,
{
    fn draw<I>(&self, pos: I, backend: &mut DB, _: (u32, u32)) -> Result<(), DrawingErrorKind<DB::ErrorType>>
    where
        I: Iterator<Item = (i32, i32)>,
    {
        let mut pos = pos;
        let pos = pos.next().unwrap_or((0, 0));
        for point in self.points {
            let Some(geometry) = point.pixel_geometry() else {
                continue;
            };
            let style = self.fill.apply(&self.style, point);
            self.draw_geometry(pos, backend, geometry, &style)?;
        }
        Ok(())
    }
}
