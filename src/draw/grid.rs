use crate::aggregate::Bins;
use crate::color::Rgba;
use crate::draw::{count_label, draw_label, shift};
use crate::scale::IntensityMap;
use crate::style::PaintStyle;
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::DrawingErrorKind;

/// Square cells colored by count.
pub struct GridLayer<'a> {
    bins: &'a Bins,
    cell_size: f64,
    intensity: &'a IntensityMap,
    style: PaintStyle,
    label_color: Option<Rgba>,
}

impl<'a> GridLayer<'a> {
    pub fn new(bins: &'a Bins, cell_size: f64, intensity: &'a IntensityMap, style: PaintStyle) -> GridLayer<'a> {
        GridLayer {
            bins,
            cell_size,
            intensity,
            style,
            label_color: None,
        }
    }

    /// Writes each cell's count at its center in `color`.
    pub fn with_labels(self, color: Rgba) -> GridLayer<'a> {
        GridLayer {
            label_color: Some(color),
            ..self
        }
    }
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a GridLayer<'_> {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for GridLayer<'_>
where
    DB: DrawingBackend,
{
    fn draw<I>(&self, pos: I, backend: &mut DB, _: (u32, u32)) -> Result<(), DrawingErrorKind<DB::ErrorType>>
    where
        I: Iterator<Item = (i32, i32)>,
    {
        let mut pos = pos;
        let pos = pos.next().unwrap_or((0, 0));
        let stroke = self.style.stroke();
        for bin in self.bins {
            let upper_left = shift(pos, [bin.x, bin.y]);
            let far = shift(pos, [bin.x + self.cell_size, bin.y + self.cell_size]);
            let bottom_right = (far.0 - 1, far.1 - 1);

            let fill = self.intensity.color_for(bin.count).to_plotters().filled();
            backend.draw_rect(upper_left, bottom_right, &fill, true)?;
            if let Some(stroke) = &stroke {
                backend.draw_rect(upper_left, bottom_right, stroke, false)?;
            }
            if let Some(color) = self.label_color {
                let half = self.cell_size / 2.0;
                let center = shift(pos, [bin.x + half, bin.y + half]);
                draw_label(backend, center, &self.style, color, &count_label(bin.count))?;
            }
        }
        Ok(())
    }
}
