// @file cluster.rs
// @brief multi-zoom greedy point clustering, one R-tree per zoom level

use crate::data::{Coord, DataPoint, Geometry, PointSource, lat_to_world, lng_to_world, world_to_lat, world_to_lng};
use anyhow::{Result, anyhow};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};
use serde::{Deserialize, Serialize};

type Entry = GeomWithData<[f64; 2], usize>;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    pub min_zoom: i32,
    pub max_zoom: i32,
    /// minimum summed weight to form a cluster
    pub min_points: usize,
    /// cluster radius in pixels of a tile of `extent` pixels
    pub radius: f64,
    pub extent: f64,
}

impl Default for ClusterOptions {
    fn default() -> ClusterOptions {
        ClusterOptions {
            min_zoom: 0,
            max_zoom: 16,
            min_points: 2,
            radius: 40.0,
            extent: 512.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterNode {
    pub id: usize,
    pub is_leaf: bool,
    /// normalized Web-Mercator world coordinate
    pub coordinate: Coord,
    /// number of leaves below this node
    pub weight: usize,
    pub child_ids: Vec<usize>,
    pub point_index: Option<usize>,
    /// zoom the node was created at; leaves sit one above `max_zoom`
    pub level: i32,
    pub parent_id: Option<usize>,
}

impl ClusterNode {
    pub fn lng_lat(&self) -> Coord {
        [world_to_lng(self.coordinate[0]), world_to_lat(self.coordinate[1])]
    }
}

pub struct ClusterTreeLevel {
    pub level: i32,
    pub node_ids: Vec<usize>,
    pub min_weight: usize,
    pub max_weight: usize,
    tree: RTree<Entry>,
}

impl ClusterTreeLevel {
    fn new(level: i32, node_ids: Vec<usize>, nodes: &[ClusterNode]) -> ClusterTreeLevel {
        let entries = node_ids.iter().map(|&id| Entry::new(nodes[id].coordinate, id)).collect();
        let (min_weight, max_weight) = node_ids.iter().map(|&id| nodes[id].weight).fold((usize::MAX, 0), |(lo, hi), w| {
            (lo.min(w), hi.max(w))
        });
        ClusterTreeLevel {
            level,
            min_weight: if node_ids.is_empty() { 0 } else { min_weight },
            max_weight,
            node_ids,
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.node_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    fn within(&self, c: Coord, r: f64) -> Vec<usize> {
        let mut ids = self.tree.locate_within_distance(c, r * r).map(|e| e.data).collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    fn in_box(&self, lo: Coord, hi: Coord) -> Vec<usize> {
        let mut ids = self
            .tree
            .locate_in_envelope(&AABB::from_corners(lo, hi))
            .map(|e| e.data)
            .collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }
}

/// Cluster hierarchy over the Point records of a dataset. Rebuilt from
/// scratch by `load`; queried per frame.
pub struct ClusterIndex {
    options: ClusterOptions,
    points: Vec<DataPoint>,
    nodes: Vec<ClusterNode>,
    levels: Vec<ClusterTreeLevel>,
}

impl ClusterIndex {
    pub fn new(options: ClusterOptions) -> Result<ClusterIndex> {
        if options.min_zoom > options.max_zoom {
            return Err(anyhow!("min_zoom {} is above max_zoom {}", options.min_zoom, options.max_zoom));
        }
        if !(options.radius > 0.0) || !(options.extent > 0.0) {
            return Err(anyhow!("cluster radius and extent must be positive"));
        }
        Ok(ClusterIndex {
            options,
            points: Vec::new(),
            nodes: Vec::new(),
            levels: Vec::new(),
        })
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    pub fn load<S: PointSource + ?Sized>(&mut self, points: &S) {
        let points = points.as_point_sequence();
        self.points = points.to_vec();
        self.nodes.clear();
        self.levels.clear();

        let leaf_level = self.options.max_zoom + 1;
        for (index, point) in points.iter().enumerate() {
            match &point.geometry {
                Some(Geometry::Point([lng, lat])) => {
                    let id = self.nodes.len();
                    self.nodes.push(ClusterNode {
                        id,
                        is_leaf: true,
                        coordinate: [lng_to_world(*lng), lat_to_world(*lat)],
                        weight: 1,
                        child_ids: Vec::new(),
                        point_index: Some(index),
                        level: leaf_level,
                        parent_id: None,
                    });
                }
                Some(g) => log::warn!("cluster: unsupported geometry type {}, skipped", g.kind()),
                None => {}
            }
        }

        // zoom each node was last visited at; unvisited nodes carry i32::MAX
        let mut marks = vec![i32::MAX; self.nodes.len()];
        let mut levels = vec![ClusterTreeLevel::new(leaf_level, (0..self.nodes.len()).collect(), &self.nodes)];
        for zoom in (self.options.min_zoom..=self.options.max_zoom).rev() {
            let Some(prev) = levels.last() else {
                break;
            };
            let node_ids = self.cluster_level(prev, zoom, &mut marks);
            levels.push(ClusterTreeLevel::new(zoom, node_ids, &self.nodes));
        }
        levels.reverse();
        self.levels = levels;

        log::info!(
            "cluster: {} leaves, {} nodes over zoom {}..={}",
            leaf_level_len(&self.levels),
            self.nodes.len(),
            self.options.min_zoom,
            leaf_level
        );
    }

    fn cluster_level(&mut self, prev: &ClusterTreeLevel, zoom: i32, marks: &mut Vec<i32>) -> Vec<usize> {
        let r = self.options.radius / (self.options.extent * (zoom as f64).exp2());
        let mut next = Vec::with_capacity(prev.len());

        for &id in &prev.node_ids {
            if marks[id] <= zoom {
                continue;
            }
            marks[id] = zoom;

            let center = self.nodes[id].coordinate;
            let neighbors = prev.within(center, r);
            let origin = self.nodes[id].weight;
            let total = origin
                + neighbors
                    .iter()
                    .filter(|&&n| marks[n] > zoom)
                    .map(|&n| self.nodes[n].weight)
                    .sum::<usize>();

            if total > origin && total >= self.options.min_points {
                let cluster_id = self.nodes.len();
                let mut wx = center[0] * origin as f64;
                let mut wy = center[1] * origin as f64;
                let mut child_ids = vec![id];
                for n in neighbors {
                    if marks[n] <= zoom {
                        continue;
                    }
                    marks[n] = zoom;
                    let node = &mut self.nodes[n];
                    wx += node.coordinate[0] * node.weight as f64;
                    wy += node.coordinate[1] * node.weight as f64;
                    node.parent_id = Some(cluster_id);
                    child_ids.push(n);
                }
                self.nodes[id].parent_id = Some(cluster_id);
                self.nodes.push(ClusterNode {
                    id: cluster_id,
                    is_leaf: false,
                    coordinate: [wx / total as f64, wy / total as f64],
                    weight: total,
                    child_ids,
                    point_index: None,
                    level: zoom,
                    parent_id: None,
                });
                marks.push(i32::MAX);
                next.push(cluster_id);
            } else {
                next.push(id);
                if total > origin {
                    for n in neighbors {
                        if marks[n] > zoom {
                            marks[n] = zoom;
                            next.push(n);
                        }
                    }
                }
            }
        }
        next
    }

    fn limit_zoom(&self, zoom: f64) -> i32 {
        // saturating cast; NaN lands on zero
        (zoom.floor() as i32).clamp(self.options.min_zoom, self.options.max_zoom + 1)
    }

    /// Nodes of zoom level `zoom` (clamped to the built range), `None` before `load`.
    pub fn level(&self, zoom: f64) -> Option<&ClusterTreeLevel> {
        let z = self.limit_zoom(zoom);
        self.levels.get((z - self.options.min_zoom) as usize)
    }

    pub fn node(&self, id: usize) -> Result<&ClusterNode> {
        self.nodes.get(id).ok_or_else(|| anyhow!("no cluster node with id {id}"))
    }

    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Nodes at `zoom` inside `[west, south, east, north]` (degrees). A box
    /// crossing the antimeridian is split in two.
    pub fn clusters(&self, bbox: [f64; 4], zoom: f64) -> Vec<&ClusterNode> {
        let wrap = |lng: f64| ((lng + 180.0) % 360.0 + 360.0) % 360.0 - 180.0;
        let mut min_lng = wrap(bbox[0]);
        let min_lat = bbox[1].clamp(-90.0, 90.0);
        let mut max_lng = if bbox[2] == 180.0 { 180.0 } else { wrap(bbox[2]) };
        let max_lat = bbox[3].clamp(-90.0, 90.0);

        if bbox[2] - bbox[0] >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut nodes = self.clusters([min_lng, min_lat, 180.0, max_lat], zoom);
            nodes.extend(self.clusters([-180.0, min_lat, max_lng, max_lat], zoom));
            return nodes;
        }

        let Some(level) = self.level(zoom) else {
            return Vec::new();
        };
        level
            .in_box(
                [lng_to_world(min_lng), lat_to_world(max_lat)],
                [lng_to_world(max_lng), lat_to_world(min_lat)],
            )
            .into_iter()
            .map(|id| &self.nodes[id])
            .collect()
    }

    pub fn children(&self, id: usize) -> Result<Vec<&ClusterNode>> {
        let node = self.node(id)?;
        Ok(node.child_ids.iter().map(|&c| &self.nodes[c]).collect())
    }

    /// Every input point under the node, in child order.
    pub fn points_in_cluster(&self, id: usize) -> Result<Vec<&DataPoint>> {
        self.node(id)?;
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if let Some(index) = node.point_index {
                out.push(&self.points[index]);
            }
            // child ids are always older than their parent, so this terminates
            stack.extend(node.child_ids.iter().rev());
        }
        Ok(out)
    }

    /// Lowest zoom at which the node's children no longer collapse into a single node.
    pub fn expansion_zoom(&self, id: usize) -> Result<i32> {
        let mut node = self.node(id)?;
        let mut zoom = node.level;
        while zoom <= self.options.max_zoom {
            zoom += 1;
            if node.child_ids.len() != 1 {
                break;
            }
            node = &self.nodes[node.child_ids[0]];
            if node.is_leaf {
                break;
            }
        }
        Ok(zoom)
    }
}

fn leaf_level_len(levels: &[ClusterTreeLevel]) -> usize {
    levels.last().map_or(0, |l| l.len())
}
