mod build;
mod cache;
mod dijkstra;
mod simplify;
mod types;


// ============================================================================
// PUBLIC API
// ============================================================================

pub use build::{build_graph, GraphBuildConfig};
pub use simplify::simplify_path;
pub use types::{
    Connectivity, Direction, NodeId, NodeKind, RoadNode, RoadSegment, SegmentId,
    DEFAULT_SPATIAL_CELL_SIZE, MAX_SCAN_RADIUS, PATH_CACHE_CAPACITY,
};

use std::fmt;
use std::sync::Mutex;

use rustc_hash::FxHashMap;

use crate::math::{FixedNum, GridPos};
use crate::spatial_hash::NodeSpatialHash;

use cache::PathCache;
use dijkstra::shortest_node_route;

/// Immutable road network: nodes, segments, a spatial index for nearest-node
/// queries, and a bounded path cache.
///
/// A graph is never mutated after construction; rebuilding terrain produces a
/// new instance, so sessions holding an `Arc` to a stale graph keep operating
/// consistently until they adopt the new one. All queries are safe for
/// concurrent readers; the path cache is the single interior-mutable cell and
/// sits behind its own lock.
pub struct RoadGraph {
    nodes: Vec<RoadNode>,
    segments: Vec<RoadSegment>,
    nodes_by_pos: FxHashMap<GridPos, NodeId>,
    spatial: NodeSpatialHash,
    cache: Mutex<PathCache>,
}

impl RoadGraph {
    pub(crate) fn assemble(
        nodes: Vec<RoadNode>,
        segments: Vec<RoadSegment>,
        nodes_by_pos: FxHashMap<GridPos, NodeId>,
        spatial: NodeSpatialHash,
    ) -> Self {
        Self {
            nodes,
            segments,
            nodes_by_pos,
            spatial,
            cache: Mutex::new(PathCache::new(PATH_CACHE_CAPACITY)),
        }
    }

    /// A graph with no nodes or segments. Every query on it reports
    /// "no route".
    pub fn empty() -> Self {
        Self::assemble(
            Vec::new(),
            Vec::new(),
            FxHashMap::default(),
            NodeSpatialHash::new(GridPos::ZERO, GridPos::ZERO, DEFAULT_SPATIAL_CELL_SIZE),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn node(&self, id: NodeId) -> &RoadNode {
        &self.nodes[id.0 as usize]
    }

    pub fn segment(&self, id: SegmentId) -> &RoadSegment {
        &self.segments[id.0 as usize]
    }

    pub fn nodes(&self) -> &[RoadNode] {
        &self.nodes
    }

    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    pub fn node_at(&self, pos: GridPos) -> Option<&RoadNode> {
        self.nodes_by_pos.get(&pos).map(|&id| self.node(id))
    }

    pub fn nearest_node(&self, pos: GridPos) -> Option<&RoadNode> {
        self.spatial.find_nearest(pos).map(|id| self.node(id))
    }

    pub fn nearest_node_within(&self, pos: GridPos, max_radius: FixedNum) -> Option<&RoadNode> {
        self.spatial
            .find_nearest_within(pos, max_radius)
            .map(|id| self.node(id))
    }

    /// Shortest road path from `start` to `end` by segment arc length.
    ///
    /// Returns the full polyline: the raw `start`, the traversed segment
    /// polylines oriented to the walking direction, and the raw `end`. An
    /// unreachable target, an empty graph, or endpoints that resolve to no
    /// node all yield an empty vector — "no route" is a value, not an error.
    pub fn find_path(&self, start: GridPos, end: GridPos) -> Vec<GridPos> {
        if self.nodes.is_empty() {
            return Vec::new();
        }

        let key = (start, end);
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(key) {
                return hit;
            }
        }

        let path = self.compute_path(start, end);

        if !path.is_empty() {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(key, path.clone());
            }
        }
        path
    }

    fn compute_path(&self, start: GridPos, end: GridPos) -> Vec<GridPos> {
        let Some(start_id) = self.spatial.find_nearest(start) else {
            return Vec::new();
        };
        let Some(end_id) = self.spatial.find_nearest(end) else {
            return Vec::new();
        };

        let mut points: Vec<GridPos> = Vec::new();
        points.push(start);

        if start_id == end_id {
            // Both endpoints snap to the same node; the path is just the
            // detour through it.
            push_dedup(&mut points, self.node(start_id).pos);
            push_dedup(&mut points, end);
            return points;
        }

        let Some(route) = shortest_node_route(self, start_id, end_id) else {
            return Vec::new();
        };

        for (hop, &seg_id) in route.segments.iter().enumerate() {
            let from = route.nodes[hop];
            for pos in self.segment(seg_id).polyline_from(from) {
                push_dedup(&mut points, pos);
            }
        }
        push_dedup(&mut points, end);
        points
    }

    /// Settled shortest-path cost between two nodes, for diagnostics and
    /// tests. `None` when disconnected.
    pub fn node_distance(&self, a: NodeId, b: NodeId) -> Option<FixedNum> {
        if a == b {
            return Some(FixedNum::ZERO);
        }
        shortest_node_route(self, a, b).map(|route| route.cost)
    }

    pub(crate) fn cached_path_count(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Human-readable summary counts for HUD/diagnostics.
    pub fn stats(&self) -> GraphStats {
        let intersection_count = self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Intersection)
            .count();

        GraphStats {
            node_count: self.nodes.len(),
            segment_count: self.segments.len(),
            intersection_count,
            endpoint_count: self.nodes.len() - intersection_count,
            total_length: self
                .segments
                .iter()
                .fold(FixedNum::ZERO, |acc, s| acc + s.length),
        }
    }
}

impl fmt::Debug for RoadGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoadGraph")
            .field("nodes", &self.node_count())
            .field("segments", &self.segment_count())
            .finish()
    }
}

fn push_dedup(points: &mut Vec<GridPos>, pos: GridPos) {
    if points.last() != Some(&pos) {
        points.push(pos);
    }
}

/// Statistics about the road graph (for debugging/UI).
#[derive(Debug, Clone, Copy)]
pub struct GraphStats {
    pub node_count: usize,
    pub segment_count: usize,
    pub intersection_count: usize,
    pub endpoint_count: usize,
    pub total_length: FixedNum,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes ({} intersections, {} endpoints), {} segments, {:.1} units of road",
            self.node_count,
            self.intersection_count,
            self.endpoint_count,
            self.segment_count,
            self.total_length.to_num::<f32>()
        )
    }
}
