//! Terrain surface classification boundary.
//!
//! The graph builder only ever asks one question of the terrain: "is this
//! cell road surface?". [`TerrainClassifier`] is that boundary. The shipped
//! implementation, [`SurfaceClassifier`], answers it from a configurable
//! allow-list of surface identifiers over any [`TerrainSampler`].

use bevy::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::math::GridPos;

/// Answers whether a grid cell is road surface. The only terrain interface
/// the navigation engine consumes.
pub trait TerrainClassifier: Send + Sync {
    fn is_road_surface(&self, x: i32, z: i32) -> bool;
}

/// Supplies the surface identifier at a cell, if the cell has a surface at
/// all. Implemented by the host world; kept separate from the classifier so
/// the allow-list logic is testable without a live world.
pub trait TerrainSampler: Send + Sync {
    fn surface_at(&self, x: i32, z: i32) -> Option<&str>;
}

/// Surfaces treated as road when the configured allow-list is empty.
pub const DEFAULT_ROAD_SURFACES: &[&str] = &[
    "asphalt",
    "cobblestone",
    "gravel",
    "paved_stone",
    "dirt_path",
];

/// RON-loadable allow-list of road surface identifiers.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SurfaceConfig {
    pub road_surfaces: Vec<String>,
}

impl SurfaceConfig {
    /// Parse from a RON string, falling back to defaults on error.
    pub fn from_ron_str(contents: &str) -> Self {
        match ron::from_str::<SurfaceConfig>(contents) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to parse surface config: {}", e);
                error!("Using default SurfaceConfig");
                SurfaceConfig::default()
            }
        }
    }

    /// The effective allow-list: the configured surfaces, or the hard-coded
    /// fallback when the configuration is empty.
    pub fn effective_surfaces(&self) -> FxHashSet<String> {
        if self.road_surfaces.is_empty() {
            DEFAULT_ROAD_SURFACES.iter().map(|s| s.to_string()).collect()
        } else {
            self.road_surfaces.iter().cloned().collect()
        }
    }
}

/// [`TerrainClassifier`] over a sampler plus an allow-list.
pub struct SurfaceClassifier<S> {
    sampler: S,
    allowed: FxHashSet<String>,
}

impl<S: TerrainSampler> SurfaceClassifier<S> {
    pub fn new(sampler: S, config: &SurfaceConfig) -> Self {
        Self { sampler, allowed: config.effective_surfaces() }
    }
}

impl<S: TerrainSampler> TerrainClassifier for SurfaceClassifier<S> {
    fn is_road_surface(&self, x: i32, z: i32) -> bool {
        match self.sampler.surface_at(x, z) {
            Some(surface) => self.allowed.contains(surface),
            None => false,
        }
    }
}

/// In-memory road-cell set. Used by tests and small demos where the terrain
/// is known up front rather than sampled from a live world.
#[derive(Clone, Debug, Default)]
pub struct RoadCellSet {
    cells: FxHashSet<GridPos>,
}

impl RoadCellSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: impl IntoIterator<Item = GridPos>) -> Self {
        Self { cells: cells.into_iter().collect() }
    }

    pub fn insert(&mut self, pos: GridPos) {
        self.cells.insert(pos);
    }

    /// Insert the straight run of cells from `from` to `to`. The run must be
    /// axis-aligned or exactly diagonal.
    pub fn insert_line(&mut self, from: GridPos, to: GridPos) {
        let (sx, sz) = from.step_sign(to);
        let steps = (to.x - from.x).abs().max((to.z - from.z).abs());
        for i in 0..=steps {
            self.cells.insert(from.offset(sx * i, sz * i));
        }
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.cells.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl TerrainClassifier for RoadCellSet {
    fn is_road_surface(&self, x: i32, z: i32) -> bool {
        self.cells.contains(&GridPos::new(x, z))
    }
}
