use crate::aggregate::Offset;
use crate::color::Rgba;
use crate::data::DataPoint;
use crate::draw::{draw_label, shift};
use crate::style::PaintStyle;
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::DrawingErrorKind;

/// The `text` field of each Point record, drawn at its pixel.
pub struct TextLayer<'a> {
    points: &'a [DataPoint],
    style: PaintStyle,
    offset: Offset,
}

impl<'a> TextLayer<'a> {
    pub fn new(points: &'a [DataPoint], style: PaintStyle, offset: Offset) -> TextLayer<'a> {
        TextLayer { points, style, offset }
    }
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a TextLayer<'_> {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for TextLayer<'_>
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
            let (Some(text), Some([x, y])) = (&point.text, point.pixel()) else {
                continue;
            };
            let style = self.style.resolve(&point.style);
            let color = style.fill_style.unwrap_or(Rgba::BLACK);
            let at = shift(pos, [x + self.offset.x, y + self.offset.y]);
            draw_label(backend, at, &style, color, text)?;
        }
        Ok(())
    }
}
