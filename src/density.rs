// @file density.rs
// @brief heatmap density field: blurred alpha stamps accumulated per point, then colorized through a ramp

use crate::color::{GradientRamp, Rgba};
use crate::data::{Coord, Geometry, PointSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Blurred disc used for every point of one size.
#[derive(Clone, Debug)]
pub struct CircleStamp {
    size: f64,
    side: usize,
    alpha: Vec<f32>,
}

impl CircleStamp {
    /// Disc of radius `size` with a shadow blur of `size / 2`, drawn on a
    /// `2 * (size + blur)` square canvas.
    pub fn new(size: f64) -> CircleStamp {
        let blur = size / 2.0;
        let side = (2.0 * (size + blur)).ceil().max(1.0) as usize;
        let center = side as f64 / 2.0;

        let mut alpha = vec![0f32; side * side];
        for y in 0..side {
            for x in 0..side {
                let dx = x as f64 + 0.5 - center;
                let dy = y as f64 + 0.5 - center;
                if dx * dx + dy * dy <= size * size {
                    alpha[y * side + x] = 1.0;
                }
            }
        }
        let alpha = gaussian_blur(&alpha, side, blur / 2.0);
        CircleStamp { size, side, alpha }
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.alpha[y * self.side + x]
    }
}

fn gaussian_kernel(sigma: f64) -> Vec<f32> {
    let half = (3.0 * sigma).ceil() as i64;
    let mut kernel = (-half..=half)
        .map(|d| (-(d * d) as f64 / (2.0 * sigma * sigma)).exp() as f32)
        .collect::<Vec<_>>();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// Separable blur over a square buffer; pixels beyond the border count as zero.
fn gaussian_blur(src: &[f32], side: usize, sigma: f64) -> Vec<f32> {
    if !(sigma > 0.0) {
        return src.to_vec();
    }
    let kernel = gaussian_kernel(sigma);
    let half = (kernel.len() / 2) as i64;
    let pass = |src: &[f32], horizontal: bool| {
        let mut dst = vec![0f32; side * side];
        for y in 0..side {
            for x in 0..side {
                let mut acc = 0f32;
                for (k, w) in kernel.iter().enumerate() {
                    let d = k as i64 - half;
                    let (sx, sy) = if horizontal { (x as i64 + d, y as i64) } else { (x as i64, y as i64 + d) };
                    if sx < 0 || sy < 0 || sx >= side as i64 || sy >= side as i64 {
                        continue;
                    }
                    acc += w * src[sy as usize * side + sx as usize];
                }
                dst[y * side + x] = acc;
            }
        }
        dst
    };
    pass(&pass(src, true), false)
}

/// Grayscale coverage of the surface, one alpha byte per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct AlphaField {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl AlphaField {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.alpha[(y * self.width + x) as usize]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.alpha
    }

    pub fn max_alpha(&self) -> u8 {
        self.alpha.iter().copied().max().unwrap_or(0)
    }
}

/// Source-over compositing target while stamps are drawn.
struct Canvas {
    width: usize,
    height: usize,
    alpha: Vec<f32>,
}

impl Canvas {
    fn blend(&mut self, x: i64, y: i64, src: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 || src <= 0.0 {
            return;
        }
        let dst = &mut self.alpha[y as usize * self.width + x as usize];
        *dst = src + *dst * (1.0 - src);
    }

    fn stamp(&mut self, stamp: &CircleStamp, at: Coord, alpha: f32) {
        let half = stamp.side() as f64 / 2.0;
        let x0 = (at[0] - half).round() as i64;
        let y0 = (at[1] - half).round() as i64;
        for sy in 0..stamp.side() {
            for sx in 0..stamp.side() {
                self.blend(x0 + sx as i64, y0 + sy as i64, stamp.get(sx, sy) * alpha);
            }
        }
    }

    /// One-pixel polyline; each pixel is composited once per line.
    fn stroke(&mut self, line: &[Coord], alpha: f32) {
        let mut covered = Vec::new();
        for w in line.windows(2) {
            let (dx, dy) = (w[1][0] - w[0][0], w[1][1] - w[0][1]);
            let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
            for s in 0..=steps {
                let t = s as f64 / steps as f64;
                covered.push(((w[0][0] + dx * t).floor() as i64, (w[0][1] + dy * t).floor() as i64));
            }
        }
        covered.sort_unstable();
        covered.dedup();
        for (x, y) in covered {
            self.blend(x, y, alpha);
        }
    }

    fn finish(self) -> AlphaField {
        AlphaField {
            width: self.width as u32,
            height: self.height as u32,
            alpha: self.alpha.iter().map(|a| (a.clamp(0.0, 1.0) * 255.0).round() as u8).collect(),
        }
    }
}

/// Builds alpha fields, keeping the stamp of the last size used.
#[derive(Debug, Default)]
pub struct DensityFieldAccumulator {
    stamp: Option<CircleStamp>,
}

impl DensityFieldAccumulator {
    pub fn new() -> DensityFieldAccumulator {
        DensityFieldAccumulator::default()
    }

    pub fn stamp(&mut self, size: f64) -> &CircleStamp {
        if self.stamp.as_ref().is_none_or(|s| s.size() != size) {
            log::debug!("density: building stamp for size {size}");
            self.stamp = Some(CircleStamp::new(size));
        }
        self.stamp.get_or_insert_with(|| CircleStamp::new(size))
    }

    /// Draws every point at alpha `count / max`, lowest alpha first. Returns
    /// `None` when the surface has no area.
    pub fn accumulate<S: PointSource + ?Sized>(
        &mut self,
        points: &S,
        surface: (u32, u32),
        size: f64,
        max: f64,
    ) -> Option<AlphaField> {
        let (width, height) = surface;
        if width == 0 || height == 0 {
            log::debug!("density: empty surface {width}x{height}, nothing drawn");
            return None;
        }
        let points = points.as_point_sequence();

        // buckets keyed by alpha in hundredths, drawn in ascending order; each
        // geometry keeps its exact alpha
        let mut buckets: BTreeMap<i64, Vec<(f32, &Geometry)>> = BTreeMap::new();
        for point in points {
            let Some(geometry) = point.pixel_geometry() else {
                continue;
            };
            let alpha = if max > 0.0 { (point.weight() / max).clamp(0.0, 1.0) } else { 1.0 };
            let alpha = if alpha.is_nan() { 0.0 } else { alpha };
            buckets.entry((alpha * 100.0).round() as i64).or_default().push((alpha as f32, geometry));
        }

        let stamp = self.stamp(size).clone();
        let mut canvas = Canvas {
            width: width as usize,
            height: height as usize,
            alpha: vec![0.0; width as usize * height as usize],
        };
        for geometries in buckets.values() {
            for &(alpha, geometry) in geometries {
                match geometry {
                    Geometry::Point(c) => canvas.stamp(&stamp, *c, alpha),
                    Geometry::LineString(line) => canvas.stroke(line, alpha),
                    g => log::warn!("density: unsupported geometry type {}, skipped", g.kind()),
                }
            }
        }
        log::debug!("density: {} points in {} alpha buckets", points.len(), buckets.len());
        Some(canvas.finish())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorizeOptions {
    pub min: f64,
    pub max: f64,
    /// visible value window within `[min, max]`
    pub range: Option<(f64, f64)>,
    pub min_opacity: f64,
    pub max_opacity: f64,
    /// keep the gray field instead of mapping it through the ramp
    pub absolute: bool,
}

impl Default for ColorizeOptions {
    fn default() -> ColorizeOptions {
        ColorizeOptions {
            min: 0.0,
            max: 100.0,
            range: None,
            min_opacity: 0.0,
            max_opacity: 0.8,
            absolute: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColorField {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba>,
}

impl ColorField {
    pub fn get(&self, x: u32, y: u32) -> Rgba {
        self.pixels[(y * self.width + x) as usize]
    }
}

fn opacity_byte(opacity: f64) -> f64 {
    if opacity.is_nan() {
        return 0.0;
    }
    (256.0 * opacity).round().clamp(0.0, 255.0)
}

pub fn colorize(field: &AlphaField, ramp: &GradientRamp, opts: &ColorizeOptions) -> ColorField {
    let (j_min, j_max) = match opts.range {
        Some((lo, hi)) if opts.max > opts.min => {
            let diff = opts.max - opts.min;
            ((lo - opts.min) / diff * 1024.0, (hi - opts.min) / diff * 1024.0)
        }
        _ => (0.0, 1024.0),
    };
    let (lo_alpha, hi_alpha) = (opacity_byte(opts.min_opacity), opacity_byte(opts.max_opacity));

    let pixels = field
        .as_slice()
        .iter()
        .map(|&a| {
            if opts.absolute {
                return Rgba::new(0, 0, 0, a);
            }
            let j = a as f64 * 4.0;
            if a == 0 || j < j_min || j > j_max {
                return Rgba::TRANSPARENT;
            }
            let alpha = (a as f64).clamp(lo_alpha.min(hi_alpha), hi_alpha) as u8;
            let c = ramp.sample(a as usize);
            Rgba::new(c.r, c.g, c.b, alpha)
        })
        .collect();

    ColorField {
        width: field.width,
        height: field.height,
        pixels,
    }
}
