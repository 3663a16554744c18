use bevy::prelude::*;

use crate::graph::NodeId;
use crate::math::GridPos;

mod query;
#[cfg(test)]
mod tests;

/// Fixed-cell spatial partitioning grid over graph nodes.
///
/// The scanned region is divided into square cells (default 32 units); each
/// cell holds the nodes whose position falls inside it. Nearest-node queries
/// inspect the 3×3 cell neighborhood around the query cell and widen to 5×5
/// before falling back to a full scan, so the candidate set stays bounded to
/// physically nearby nodes instead of every node in the graph.
///
/// # Performance
///
/// - **Insert:** O(1) amortized
/// - **Query:** O(k) where k = nodes in nearby cells (typically << N)
///
/// Built once per graph and immutable afterwards, so reads need no locking.
pub struct NodeSpatialHash {
    cell_size: i32,
    cols: usize,
    rows: usize,
    min: GridPos,
    cells: Vec<Vec<(NodeId, GridPos)>>,
}

impl NodeSpatialHash {
    /// Grid covering the inclusive world bounds `min..=max`.
    pub fn new(min: GridPos, max: GridPos, cell_size: i32) -> Self {
        let cell_size = cell_size.max(1);
        let cols = ((max.x - min.x).max(0) / cell_size) as usize + 1;
        let rows = ((max.z - min.z).max(0) / cell_size) as usize + 1;

        Self {
            cell_size,
            cols,
            rows,
            min,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    pub fn insert(&mut self, id: NodeId, pos: GridPos) {
        match self.cell_idx(pos) {
            Some(idx) => self.cells[idx].push((id, pos)),
            None => {
                warn!("[SPATIAL_HASH] Node {:?} at {:?} is outside the indexed bounds", id, pos);
            }
        }
    }

    fn cell_idx(&self, pos: GridPos) -> Option<usize> {
        let col = (pos.x - self.min.x).div_euclid(self.cell_size);
        let row = (pos.z - self.min.z).div_euclid(self.cell_size);

        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return None;
        }

        Some(row as usize * self.cols + col as usize)
    }

    /// Cell coordinates for a query point, clamped into the grid so that
    /// points outside the scanned region still resolve to the nearest border
    /// cell.
    pub(crate) fn query_cell(&self, pos: GridPos) -> (usize, usize) {
        let col = (pos.x - self.min.x).div_euclid(self.cell_size);
        let row = (pos.z - self.min.z).div_euclid(self.cell_size);

        let col = col.clamp(0, self.cols as i32 - 1) as usize;
        let row = row.clamp(0, self.rows as i32 - 1) as usize;
        (col, row)
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total node entries across all cells.
    pub fn total_entries(&self) -> usize {
        self.cells.iter().map(|cell| cell.len()).sum()
    }

    pub(crate) fn cells(&self) -> &[Vec<(NodeId, GridPos)>] {
        &self.cells
    }
}
