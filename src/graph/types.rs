use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::math::{polyline_length, FixedNum, GridPos};

/// Spatial hash cell size in world units. 32 keeps the 3×3 neighborhood of a
/// nearest-node query under ~100×100 units of road.
pub const DEFAULT_SPATIAL_CELL_SIZE: i32 = 32;

/// Hard cap on the scan radius. At 150 the square region is ~90,000 cells,
/// which is the upper bound of what a background build should chew through.
pub const MAX_SCAN_RADIUS: i32 = 150;

/// Bounded LRU capacity for the per-graph path cache.
pub const PATH_CACHE_CAPACITY: usize = 100;

/// Neighbor model used for node detection and segment tracing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connectivity {
    Four,
    Eight,
}

impl Connectivity {
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Connectivity::Four => &Direction::ALL[..4],
            Connectivity::Eight => &Direction::ALL[..],
        }
    }
}

/// Neighbor directions in their fixed enumeration order.
///
/// The order of [`Direction::ALL`] (cardinals before diagonals) is the
/// deterministic tie-break for segment tracing: scans and walks always try
/// neighbors in this order, so repeated builds over the same terrain produce
/// identical graphs.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    South = 1,
    East = 2,
    West = 3,
    NorthEast = 4,
    NorthWest = 5,
    SouthEast = 6,
    SouthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// Grid offset, north = +z.
    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, 1),
            Direction::NorthWest => (-1, 1),
            Direction::SouthEast => (1, -1),
            Direction::SouthWest => (-1, -1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

/// Node placement rule: a road cell becomes a node only when it is
/// topologically significant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// ≥3 road neighbors.
    Intersection,
    /// Exactly 1 road neighbor.
    Endpoint,
}

/// Graph vertex at a fixed position. The segment list is exactly the
/// incident segments, built incrementally during graph construction.
#[derive(Clone, Debug)]
pub struct RoadNode {
    pub id: NodeId,
    pub pos: GridPos,
    pub kind: NodeKind,
    pub segments: SmallVec<[SegmentId; 4]>,
}

/// Edge between two nodes carrying its full polyline (inclusive of both
/// endpoint positions) and precomputed arc length. Immutable once built.
#[derive(Clone, Debug)]
pub struct RoadSegment {
    pub id: SegmentId,
    pub ends: [NodeId; 2],
    pub polyline: Vec<GridPos>,
    pub length: FixedNum,
}

impl RoadSegment {
    pub(crate) fn new(id: SegmentId, ends: [NodeId; 2], polyline: Vec<GridPos>) -> Self {
        let length = polyline_length(&polyline);
        Self { id, ends, polyline, length }
    }

    /// The opposite end from `node`. For a self-loop both ends coincide.
    pub fn other_end(&self, node: NodeId) -> NodeId {
        if self.ends[0] == node {
            self.ends[1]
        } else {
            self.ends[0]
        }
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.ends[0] == node || self.ends[1] == node
    }

    /// The polyline oriented to start at `from`. Reverses the stored order
    /// when the segment is walked backward.
    pub fn polyline_from(&self, from: NodeId) -> Vec<GridPos> {
        if self.ends[0] == from {
            self.polyline.clone()
        } else {
            let mut points = self.polyline.clone();
            points.reverse();
            points
        }
    }
}
