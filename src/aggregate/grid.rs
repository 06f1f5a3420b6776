use crate::aggregate::{Bin, Bins, CellAccumulator, Offset, point_position};
use crate::data::{Coord, DataPoint, PointSource};

/// Square-cell aggregation in pixel space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridAggregator {
    cell_size: f64,
    offset: Offset,
    pre_aggregated: bool,
}

impl GridAggregator {
    pub fn new(cell_size: f64, offset: Offset) -> GridAggregator {
        GridAggregator {
            cell_size,
            offset,
            pre_aggregated: false,
        }
    }

    /// Treat every point as an already-computed cell: no bucketing.
    pub fn pre_aggregated(self, pre_aggregated: bool) -> GridAggregator {
        GridAggregator { pre_aggregated, ..self }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn is_pre_aggregated(&self) -> bool {
        self.pre_aggregated
    }

    pub fn cell_of(&self, c: Coord) -> (i64, i64) {
        (
            ((c[0] - self.offset.x) / self.cell_size).floor() as i64,
            ((c[1] - self.offset.y) / self.cell_size).floor() as i64,
        )
    }

    pub fn aggregate<S: PointSource + ?Sized>(&self, points: &S) -> Bins {
        let points = points.as_point_sequence();
        if self.pre_aggregated {
            return self.pass_through(points);
        }
        if !(self.cell_size > 0.0) || !self.cell_size.is_finite() {
            log::warn!("grid: invalid cell size {}, nothing aggregated", self.cell_size);
            return Bins::default();
        }

        let mut acc = CellAccumulator::new();
        for (idx, point) in points.iter().enumerate() {
            let Some(c) = point_position(point, "grid") else {
                continue;
            };
            let (i, j) = self.cell_of(c);
            // integer part only; pre-aggregated counts are kept as they are
            let weight = point.weight().trunc();
            acc.add((i, j), idx, weight, || Bin {
                key: format!("{i},{j}"),
                i: Some(i),
                j: Some(j),
                x: i as f64 * self.cell_size + self.offset.x,
                y: j as f64 * self.cell_size + self.offset.y,
                count: 0.0,
                members: Vec::new(),
            });
        }
        let bins = acc.finish();
        log::debug!("grid: {} points into {} cells", points.len(), bins.len());
        bins
    }

    fn pass_through(&self, points: &[DataPoint]) -> Bins {
        let bins = points
            .iter()
            .enumerate()
            .filter_map(|(idx, point)| {
                let [x, y] = point_position(point, "grid")?;
                Some(Bin {
                    key: format!("{x},{y}"),
                    i: None,
                    j: None,
                    x,
                    y,
                    count: point.weight(),
                    members: vec![idx],
                })
            })
            .collect::<Vec<_>>();
        Bins::from_vec(bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataSet, Geometry};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn same_cell_sums_weights() {
        let points = vec![DataPoint::point(5.0, 5.0), DataPoint::point(5.0, 5.0).with_count(3.0)];
        let bins = GridAggregator::new(50.0, Offset::default()).aggregate(&points);
        assert_eq!(bins.len(), 1);
        let bin = bins.get("0,0").unwrap();
        assert_eq!(bin.count, 4.0);
        assert_eq!(bin.members, vec![0, 1]);
    }

    #[test]
    fn keys_floor_and_position_uses_offset() {
        let points = vec![DataPoint::point(-1.0, 120.0), DataPoint::point(14.0, 9.0)];
        let agg = GridAggregator::new(50.0, Offset::new(10.0, 10.0));
        let bins = agg.aggregate(&points);
        let a = bins.get("-1,2").unwrap();
        assert_eq!((a.x, a.y), (-40.0, 110.0));
        let b = bins.get("0,-1").unwrap();
        assert_eq!((b.i, b.j), (Some(0), Some(-1)));
        assert_eq!((b.x, b.y), (10.0, -40.0));
    }

    #[test]
    fn bucketed_weights_are_truncated() {
        let points = vec![DataPoint::point(1.0, 1.0).with_count(2.9), DataPoint::point(2.0, 2.0).with_count(0.5)];
        let bins = GridAggregator::new(10.0, Offset::default()).aggregate(&points);
        assert_eq!(bins.get("0,0").unwrap().count, 2.0);
    }

    #[test]
    fn pre_aggregated_passes_counts_through() {
        let points = vec![DataPoint::point(25.0, 25.0).with_count(2.9), DataPoint::point(75.0, 25.0)];
        let bins = GridAggregator::new(50.0, Offset::default()).pre_aggregated(true).aggregate(&points);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins.get("25,25").unwrap().count, 2.9);
        assert_eq!(bins.get("75,25").unwrap().count, 1.0);
        assert_eq!(bins.get("75,25").unwrap().i, None);
    }

    #[test]
    fn malformed_and_unsupported_points_are_skipped() {
        let line = DataPoint {
            geometry: Some(Geometry::LineString(vec![[0.0, 0.0], [1.0, 1.0]])),
            ..Default::default()
        };
        let points = vec![DataPoint::default(), line, DataPoint::point(1.0, 1.0)];
        let bins = GridAggregator::new(10.0, Offset::default()).aggregate(&points);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins.get("0,0").unwrap().members, vec![2]);
    }

    #[test]
    fn invalid_cell_size_gives_nothing() {
        let points = vec![DataPoint::point(1.0, 1.0)];
        assert!(GridAggregator::new(0.0, Offset::default()).aggregate(&points).is_empty());
        assert!(GridAggregator::new(f64::NAN, Offset::default()).aggregate(&points).is_empty());
    }

    #[test]
    fn random_points_fill_at_most_a_ten_by_ten_grid() {
        let mut rng = StdRng::seed_from_u64(7);
        let ds = DataSet::new(
            (0..1000)
                .map(|_| DataPoint::point(rng.random_range(0.0..1000.0), rng.random_range(0.0..1000.0)))
                .collect(),
        );
        let bins = GridAggregator::new(100.0, Offset::default()).aggregate(&ds);
        assert!(bins.len() <= 100);
        assert_eq!(bins.total_count(), 1000.0);
        assert_eq!(bins.iter().map(|b| b.members.len()).sum::<usize>(), 1000);
    }
}
