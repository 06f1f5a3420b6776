use crate::aggregate::{Bin, Bins, CellAccumulator, Offset, point_position};
use crate::data::{Coord, PointSource};
use std::f64::consts::FRAC_PI_3;

/// Pointy-top hexagon lattice derived from the requested cell width.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HexGeometry {
    pub radius: f64,
    pub dx: f64,
    pub dy: f64,
}

impl HexGeometry {
    pub fn new(hex_size: f64) -> HexGeometry {
        let radius = hex_size / (2.0 * FRAC_PI_3.sin());
        HexGeometry {
            radius,
            dx: radius * 2.0 * FRAC_PI_3.sin(),
            dy: radius * 1.5,
        }
    }
}

/// Rounds half up like the browser's `Math.round`; `f64::round` goes away from zero.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn is_odd(j: f64) -> bool {
    (j as i64).rem_euclid(2) == 1
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HexBinAggregator {
    hex_size: f64,
    offset: Offset,
    geometry: HexGeometry,
}

impl HexBinAggregator {
    pub fn new(hex_size: f64, offset: Offset) -> HexBinAggregator {
        HexBinAggregator {
            hex_size,
            offset,
            geometry: HexGeometry::new(hex_size),
        }
    }

    pub fn hex_size(&self) -> f64 {
        self.hex_size
    }

    pub fn set_hex_size(&mut self, hex_size: f64) {
        self.hex_size = hex_size;
        self.geometry = HexGeometry::new(hex_size);
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn geometry(&self) -> &HexGeometry {
        &self.geometry
    }

    /// Lattice address of the hexagon containing `c` (pixel space, offset applied).
    ///
    /// Rounds to the nearest row and column first; when the point lies in the
    /// upper or lower third of the row band, the diagonal neighbour is tried and
    /// kept if closer in lattice units.
    pub fn locate(&self, c: Coord) -> (i64, i64) {
        let g = &self.geometry;
        let py = (c[1] - self.offset.y) / g.dy;
        let mut pj = round_half_up(py);
        let px = (c[0] - self.offset.x) / g.dx - if is_odd(pj) { 0.5 } else { 0.0 };
        let mut pi = round_half_up(px);
        let py1 = py - pj;

        if py1.abs() * 3.0 > 1.0 {
            let px1 = px - pi;
            let pi2 = pi + if px < pi { -0.5 } else { 0.5 };
            let pj2 = pj + if py < pj { -1.0 } else { 1.0 };
            let px2 = px - pi2;
            let py2 = py - pj2;
            if px1 * px1 + py1 * py1 > px2 * px2 + py2 * py2 {
                pi = pi2 + if is_odd(pj) { 0.5 } else { -0.5 };
                pj = pj2;
            }
        }
        (pi as i64, pj as i64)
    }

    /// Hexagon center in lattice space, without the offset.
    pub fn center_of(&self, i: i64, j: i64) -> Coord {
        let shift = if j.rem_euclid(2) == 1 { 0.5 } else { 0.0 };
        [(i as f64 + shift) * self.geometry.dx, j as f64 * self.geometry.dy]
    }

    pub fn aggregate<S: PointSource + ?Sized>(&self, points: &S) -> Bins {
        let points = points.as_point_sequence();
        if !(self.hex_size > 0.0) || !self.hex_size.is_finite() {
            log::warn!("hexbin: invalid hexagon size {}, nothing aggregated", self.hex_size);
            return Bins::default();
        }

        let mut acc = CellAccumulator::new();
        for (idx, point) in points.iter().enumerate() {
            let Some(c) = point_position(point, "hexbin") else {
                continue;
            };
            let (i, j) = self.locate(c);
            acc.add((i, j), idx, point.weight(), || {
                let [x, y] = self.center_of(i, j);
                Bin {
                    key: format!("{i}-{j}"),
                    i: Some(i),
                    j: Some(j),
                    x,
                    y,
                    count: 0.0,
                    members: Vec::new(),
                }
            });
        }
        let bins = acc.finish();
        log::debug!("hexbin: {} points into {} hexagons", points.len(), bins.len());
        bins
    }

    pub fn screen_center(&self, bin: &Bin) -> Coord {
        [bin.x + self.offset.x, bin.y + self.offset.y]
    }

    /// Six screen-space corners, clockwise from the lower right.
    pub fn corners(&self, bin: &Bin) -> [Coord; 6] {
        let [cx, cy] = self.screen_center(bin);
        let r = self.geometry.radius;
        std::array::from_fn(|k| {
            let angle = FRAC_PI_3 * k as f64 + FRAC_PI_3 / 2.0;
            [cx + r * angle.cos(), cy + r * angle.sin()]
        })
    }
}
