use crate::data::{DataPoint, PointSource};
use crate::draw::shift;
use crate::image_cache::{Bitmap, ImageCache, ImageFetcher, ImageState};
use crate::style::PaintStyle;
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::{BackendColor, BackendCoord, DrawingErrorKind};

fn icon_url<'p>(point: &'p DataPoint, default_icon: Option<&'p str>) -> Option<&'p str> {
    point.icon.as_deref().or(default_icon)
}

/// Starts loading every icon not yet cached or pending. Returns the number of
/// fetches issued.
pub fn request_missing<S>(points: &S, default_icon: Option<&str>, cache: &mut ImageCache, fetcher: &mut dyn ImageFetcher) -> usize
where
    S: PointSource + ?Sized,
{
    let mut issued = 0;
    for point in points.as_point_sequence() {
        let Some(url) = icon_url(point, default_icon) else {
            continue;
        };
        if cache.get(url).is_none() && !cache.is_pending(url) {
            cache.request(url, fetcher, |_| {});
            issued += 1;
        }
    }
    issued
}

/// Cached bitmaps centered on their points. Icons that failed to load are
/// replaced by a circle marker; icons still loading are left out of this frame.
pub struct IconLayer<'a> {
    points: &'a [DataPoint],
    cache: &'a ImageCache,
    default_icon: Option<String>,
    style: PaintStyle,
}

impl<'a> IconLayer<'a> {
    pub fn new(points: &'a [DataPoint], cache: &'a ImageCache, default_icon: Option<String>, style: PaintStyle) -> IconLayer<'a> {
        IconLayer {
            points,
            cache,
            default_icon,
            style,
        }
    }
}

fn blit<DB>(backend: &mut DB, center: BackendCoord, bitmap: &Bitmap) -> Result<(), DrawingErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    let x0 = center.0 - bitmap.width as i32 / 2;
    let y0 = center.1 - bitmap.height as i32 / 2;
    for y in 0..bitmap.height {
        for x in 0..bitmap.width {
            let c = bitmap.pixel(x, y);
            if c.a == 0 {
                continue;
            }
            let color = BackendColor {
                alpha: c.alpha(),
                rgb: (c.r, c.g, c.b),
            };
            backend.draw_pixel((x0 + x as i32, y0 + y as i32), color)?;
        }
    }
    Ok(())
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a IconLayer<'_> {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for IconLayer<'_>
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
            let (Some(url), Some(c)) = (icon_url(point, self.default_icon.as_deref()), point.pixel()) else {
                continue;
            };
            let center = shift(pos, c);
            match self.cache.get(url) {
                Some(ImageState::Loaded(bitmap)) => blit(backend, center, bitmap)?,
                Some(ImageState::Failed) => {
                    let style = self.style.resolve(&point.style);
                    if let Some(fill) = style.fill() {
                        backend.draw_circle(center, style.size.max(0.0).round() as u32, &fill, true)?;
                    }
                }
                None => {}
            }
        }
        Ok(())
    }
}
