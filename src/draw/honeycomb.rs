use crate::aggregate::{Bins, HexBinAggregator};
use crate::color::Rgba;
use crate::draw::{count_label, draw_label, draw_ring, shift};
use crate::scale::IntensityMap;
use crate::style::PaintStyle;
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::DrawingErrorKind;

/// Hexagonal bins colored by count.
pub struct HoneycombLayer<'a> {
    bins: &'a Bins,
    aggregator: &'a HexBinAggregator,
    intensity: &'a IntensityMap,
    style: PaintStyle,
    label_color: Option<Rgba>,
}

impl<'a> HoneycombLayer<'a> {
    pub fn new(bins: &'a Bins, aggregator: &'a HexBinAggregator, intensity: &'a IntensityMap, style: PaintStyle) -> HoneycombLayer<'a> {
        HoneycombLayer {
            bins,
            aggregator,
            intensity,
            style,
            label_color: None,
        }
    }

    pub fn with_labels(self, color: Rgba) -> HoneycombLayer<'a> {
        HoneycombLayer {
            label_color: Some(color),
            ..self
        }
    }
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a HoneycombLayer<'_> {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for HoneycombLayer<'_>
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
            let ring = self.aggregator.corners(bin).map(|c| shift(pos, c));
            let fill = self.intensity.color_for(bin.count).to_plotters().filled();
            draw_ring(backend, &ring, Some(fill), stroke)?;
            if let Some(color) = self.label_color {
                let center = shift(pos, self.aggregator.screen_center(bin));
                draw_label(backend, center, &self.style, color, &count_label(bin.count))?;
            }
        }
        Ok(())
    }
}
