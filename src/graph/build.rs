use bevy::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::classifier::TerrainClassifier;
use crate::math::GridPos;
use crate::spatial_hash::NodeSpatialHash;

use super::types::{
    Connectivity, NodeId, NodeKind, RoadNode, RoadSegment, SegmentId, DEFAULT_SPATIAL_CELL_SIZE,
    MAX_SCAN_RADIUS,
};
use super::RoadGraph;

use serde::{Deserialize, Serialize};

/// Parameters for one graph build: the square region to scan and the
/// neighbor model to scan it with.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GraphBuildConfig {
    pub center: GridPos,
    /// Half-extent of the square scan region, capped at [`MAX_SCAN_RADIUS`].
    pub radius: i32,
    pub connectivity: Connectivity,
    pub spatial_cell_size: i32,
}

impl Default for GraphBuildConfig {
    fn default() -> Self {
        Self {
            center: GridPos::ZERO,
            radius: MAX_SCAN_RADIUS,
            connectivity: Connectivity::Four,
            spatial_cell_size: DEFAULT_SPATIAL_CELL_SIZE,
        }
    }
}

impl GraphBuildConfig {
    pub fn around(center: GridPos, radius: i32) -> Self {
        Self { center, radius, ..Self::default() }
    }
}

/// Scan a classified region and construct an immutable [`RoadGraph`].
///
/// Node placement follows road-cell degree: ≥3 neighbors makes an
/// intersection, exactly 1 an endpoint, and degree-2 cells get no node, so
/// node count tracks topological complexity rather than raw cell count.
/// Segments are traced outward from each node per direction, always stepping
/// to the single unvisited road neighbor, until another node is reached.
///
/// Never fails: degenerate or disconnected terrain yields a smaller or empty
/// graph, which callers read as "no route". A closed loop of degree-2 cells
/// contains no node and therefore contributes no nodes or segments.
pub fn build_graph(classifier: &dyn TerrainClassifier, config: &GraphBuildConfig) -> RoadGraph {
    let start_time = std::time::Instant::now();
    let radius = config.radius.clamp(0, MAX_SCAN_RADIUS);
    let center = config.center;

    // Phase 1: collect the road-cell set in deterministic scan order.
    let mut road_cells: Vec<GridPos> = Vec::new();
    let mut road_set: FxHashSet<GridPos> = FxHashSet::default();
    for z in (center.z - radius)..=(center.z + radius) {
        for x in (center.x - radius)..=(center.x + radius) {
            if classifier.is_road_surface(x, z) {
                let pos = GridPos::new(x, z);
                road_cells.push(pos);
                road_set.insert(pos);
            }
        }
    }

    // Phase 2: place nodes at topologically significant cells.
    let mut nodes: Vec<RoadNode> = Vec::new();
    let mut nodes_by_pos: FxHashMap<GridPos, NodeId> = FxHashMap::default();
    for &pos in &road_cells {
        let kind = match road_degree(pos, &road_set, config.connectivity) {
            1 => NodeKind::Endpoint,
            d if d >= 3 => NodeKind::Intersection,
            _ => continue,
        };
        let id = NodeId(nodes.len() as u32);
        nodes.push(RoadNode { id, pos, kind, segments: SmallVec::new() });
        nodes_by_pos.insert(pos, id);
    }

    // Phase 3: trace segments between nodes. Each polyline is recorded once;
    // the trace arriving from the opposite end reproduces the same canonical
    // polyline and is skipped.
    let mut segments: Vec<RoadSegment> = Vec::new();
    let mut seen: FxHashSet<Vec<GridPos>> = FxHashSet::default();
    let max_steps = road_cells.len() + 1;

    for origin_idx in 0..nodes.len() {
        let origin = nodes[origin_idx].pos;
        for &dir in config.connectivity.directions() {
            let (dx, dz) = dir.offset();
            let first = origin.offset(dx, dz);
            if !road_set.contains(&first) {
                continue;
            }

            let Some(polyline) =
                trace_segment(origin, first, &road_set, &nodes_by_pos, config.connectivity, max_steps)
            else {
                continue;
            };

            if !seen.insert(canonical(&polyline)) {
                continue;
            }

            let Some(&end_id) = polyline.last().and_then(|pos| nodes_by_pos.get(pos)) else {
                continue;
            };
            let start_id = nodes[origin_idx].id;
            let seg_id = SegmentId(segments.len() as u32);
            segments.push(RoadSegment::new(seg_id, [start_id, end_id], polyline));

            nodes[origin_idx].segments.push(seg_id);
            if end_id != start_id {
                nodes[end_id.0 as usize].segments.push(seg_id);
            }
        }
    }

    // Phase 4: spatial index over the scanned bounds.
    let min = GridPos::new(center.x - radius, center.z - radius);
    let max = GridPos::new(center.x + radius, center.z + radius);
    let mut spatial = NodeSpatialHash::new(min, max, config.spatial_cell_size);
    for node in &nodes {
        spatial.insert(node.id, node.pos);
    }

    let graph = RoadGraph::assemble(nodes, segments, nodes_by_pos, spatial);
    info!(
        "[GRAPH BUILD] {} road cells -> {} in {:?}",
        road_cells.len(),
        graph.stats(),
        start_time.elapsed()
    );
    graph
}

fn road_degree(pos: GridPos, road_set: &FxHashSet<GridPos>, connectivity: Connectivity) -> usize {
    connectivity
        .directions()
        .iter()
        .filter(|dir| {
            let (dx, dz) = dir.offset();
            road_set.contains(&pos.offset(dx, dz))
        })
        .count()
}

/// Walk from `origin` through `first` along degree-2 cells until another
/// node is reached. Neighbor candidates are tried in the fixed
/// [`super::types::Direction`] enumeration order, which makes the walk
/// deterministic even with ambiguous diagonal connectivity.
fn trace_segment(
    origin: GridPos,
    first: GridPos,
    road_set: &FxHashSet<GridPos>,
    nodes_by_pos: &FxHashMap<GridPos, NodeId>,
    connectivity: Connectivity,
    max_steps: usize,
) -> Option<Vec<GridPos>> {
    let mut polyline = vec![origin, first];
    let mut prev = origin;
    let mut current = first;
    let mut steps = 0;

    while !nodes_by_pos.contains_key(&current) {
        steps += 1;
        if steps > max_steps {
            warn!(
                "[GRAPH BUILD] Segment trace from {:?} exceeded {} steps without reaching a node",
                origin, max_steps
            );
            return None;
        }

        let mut next = None;
        for &dir in connectivity.directions() {
            let (dx, dz) = dir.offset();
            let candidate = current.offset(dx, dz);
            if candidate != prev && road_set.contains(&candidate) {
                next = Some(candidate);
                break;
            }
        }

        match next {
            Some(candidate) => {
                polyline.push(candidate);
                prev = current;
                current = candidate;
            }
            // Degree-1 cells are endpoint nodes, so a walk only dead-ends
            // when it entered an unclaimed loop; drop the partial trace.
            None => return None,
        }
    }

    Some(polyline)
}

/// Orientation-independent key for duplicate-segment detection.
fn canonical(polyline: &[GridPos]) -> Vec<GridPos> {
    let mut forward = polyline.to_vec();
    let mut backward = forward.clone();
    backward.reverse();
    if backward < forward {
        forward = backward;
    }
    forward
}
