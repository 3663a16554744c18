use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use crate::math::FixedNum;

use super::types::{NodeId, SegmentId};
use super::RoadGraph;

/// A settled node-level route: the node chain, the segment taken for each
/// hop, and the total arc-length cost.
pub(super) struct NodeRoute {
    pub nodes: Vec<NodeId>,
    pub segments: Vec<SegmentId>,
    pub cost: FixedNum,
}

/// Dijkstra over graph nodes with segment arc length as the edge weight.
/// Terminates as soon as `end` is settled. Returns `None` when `end` is
/// unreachable from `start`.
pub(super) fn shortest_node_route(
    graph: &RoadGraph,
    start: NodeId,
    end: NodeId,
) -> Option<NodeRoute> {
    let mut distances: BTreeMap<NodeId, FixedNum> = BTreeMap::new();
    let mut came_from: BTreeMap<NodeId, (NodeId, SegmentId)> = BTreeMap::new();
    let mut heap: BinaryHeap<Reverse<(FixedNum, NodeId)>> = BinaryHeap::new();

    distances.insert(start, FixedNum::ZERO);
    heap.push(Reverse((FixedNum::ZERO, start)));

    while let Some(Reverse((cost, current))) = heap.pop() {
        // Skip if we've already settled a better path.
        if let Some(&best) = distances.get(&current) {
            if cost > best {
                continue;
            }
        }

        if current == end {
            return Some(reconstruct(came_from, start, end, cost));
        }

        for &seg_id in &graph.node(current).segments {
            let segment = graph.segment(seg_id);
            let neighbor = segment.other_end(current);
            let new_cost = cost + segment.length;

            let improves = distances
                .get(&neighbor)
                .map_or(true, |&old| new_cost < old);
            if improves {
                distances.insert(neighbor, new_cost);
                came_from.insert(neighbor, (current, seg_id));
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    None
}

fn reconstruct(
    came_from: BTreeMap<NodeId, (NodeId, SegmentId)>,
    start: NodeId,
    end: NodeId,
    cost: FixedNum,
) -> NodeRoute {
    let mut nodes = vec![end];
    let mut segments = Vec::new();
    let mut current = end;

    while current != start {
        let (prev, seg) = came_from[&current];
        segments.push(seg);
        nodes.push(prev);
        current = prev;
    }

    nodes.reverse();
    segments.reverse();
    NodeRoute { nodes, segments, cost }
}
