use crate::graph::NodeId;
use crate::math::{FixedNum, GridPos};

use super::NodeSpatialHash;

impl NodeSpatialHash {
    /// Nearest node to `pos`, or `None` for an empty index.
    ///
    /// Inspects the 3×3 cell neighborhood around the query cell, widens to
    /// 5×5 if that holds no nodes, and only then falls back to scanning every
    /// cell. The fallback keeps the contract total (a graph with exactly one
    /// node always returns it) while the neighborhood passes bound the common
    /// case to physically nearby candidates.
    pub fn find_nearest(&self, pos: GridPos) -> Option<NodeId> {
        self.find_nearest_impl(pos, None)
    }

    /// Nearest node within `max_radius` world units of `pos`.
    pub fn find_nearest_within(&self, pos: GridPos, max_radius: FixedNum) -> Option<NodeId> {
        self.find_nearest_impl(pos, Some(max_radius * max_radius))
    }

    fn find_nearest_impl(&self, pos: GridPos, max_radius_sq: Option<FixedNum>) -> Option<NodeId> {
        let (id, d_sq) = self
            .scan_neighborhood(pos, 1)
            .or_else(|| self.scan_neighborhood(pos, 2))
            .or_else(|| self.scan_all(pos))?;

        if let Some(limit) = max_radius_sq {
            if d_sq > limit {
                return None;
            }
        }
        Some(id)
    }

    /// Best candidate within `ring` cells of the query cell, by squared
    /// distance with node id as the deterministic tie-break.
    fn scan_neighborhood(&self, pos: GridPos, ring: usize) -> Option<(NodeId, FixedNum)> {
        let (col, row) = self.query_cell(pos);

        let min_col = col.saturating_sub(ring);
        let max_col = (col + ring).min(self.cols - 1);
        let min_row = row.saturating_sub(ring);
        let max_row = (row + ring).min(self.rows - 1);

        let mut best: Option<(NodeId, FixedNum)> = None;
        for r in min_row..=max_row {
            for c in min_col..=max_col {
                self.scan_cell(r * self.cols + c, pos, &mut best);
            }
        }
        best
    }

    fn scan_all(&self, pos: GridPos) -> Option<(NodeId, FixedNum)> {
        let mut best: Option<(NodeId, FixedNum)> = None;
        for idx in 0..self.cells().len() {
            self.scan_cell(idx, pos, &mut best);
        }
        best
    }

    fn scan_cell(&self, idx: usize, pos: GridPos, best: &mut Option<(NodeId, FixedNum)>) {
        for &(id, node_pos) in &self.cells()[idx] {
            let d_sq = pos.distance_squared(node_pos);
            let closer = match *best {
                None => true,
                Some((best_id, best_sq)) => d_sq < best_sq || (d_sq == best_sq && id < best_id),
            };
            if closer {
                *best = Some((id, d_sq));
            }
        }
    }
}
