//! Navigation targets and the agent-registry boundary.
//!
//! A session navigates toward a [`NavigationTarget`]: a fixed point, a named
//! point of interest, or a live agent resolved through an [`AgentRegistry`].
//! The target caches the last position it resolved to, so a mobile target
//! that despawns mid-route degrades to its last known position instead of
//! invalidating the whole session.

use bevy::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::math::{FixedNum, GridPos};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

/// Point-in-time view of one agent as the registry knows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentSnapshot {
    pub pos: GridPos,
    pub alive: bool,
}

/// External agent registry boundary: resolve an agent id to a live snapshot.
pub trait AgentRegistry {
    fn resolve(&self, id: AgentId) -> Option<AgentSnapshot>;
}

/// Host-maintained agent snapshots, usable both as a bevy resource (kept in
/// sync by the plugin) and as a plain registry in tests.
#[derive(Resource, Clone, Debug, Default)]
pub struct AgentIndex {
    agents: FxHashMap<AgentId, AgentSnapshot>,
}

impl AgentIndex {
    pub fn upsert(&mut self, id: AgentId, pos: GridPos) {
        self.agents.insert(id, AgentSnapshot { pos, alive: true });
    }

    pub fn remove(&mut self, id: AgentId) {
        self.agents.remove(&id);
    }

    /// Mark every known agent dead; a following round of `upsert` calls
    /// revives the ones still present. Entries for vanished agents keep
    /// their last position, which is what last-known fallback reads.
    pub fn mark_all_dead(&mut self) {
        for snapshot in self.agents.values_mut() {
            snapshot.alive = false;
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl AgentRegistry for AgentIndex {
    fn resolve(&self, id: AgentId) -> Option<AgentSnapshot> {
        self.agents.get(&id).copied()
    }
}

/// What a session is navigating toward.
#[derive(Clone, Debug)]
pub enum TargetKind {
    /// A fixed point.
    Static { pos: GridPos },
    /// A live agent, resolved through the registry each time.
    Agent { id: AgentId },
    /// A fixed point with identity, for equality and display.
    NamedPoint { id: u32, pos: GridPos },
}

/// Uniform handle over heterogeneous target kinds, carrying the last-known
/// position cache and its staleness timestamp.
#[derive(Clone, Debug)]
pub struct NavigationTarget {
    kind: TargetKind,
    label: String,
    last_known: Option<GridPos>,
    last_resolved_at: Option<f64>,
}

impl NavigationTarget {
    pub fn fixed(pos: GridPos, label: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Static { pos },
            label: label.into(),
            last_known: Some(pos),
            last_resolved_at: None,
        }
    }

    pub fn agent(id: AgentId, label: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Agent { id },
            label: label.into(),
            last_known: None,
            last_resolved_at: None,
        }
    }

    pub fn named_point(id: u32, pos: GridPos, label: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::NamedPoint { id, pos },
            label: label.into(),
            last_known: Some(pos),
            last_resolved_at: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &TargetKind {
        &self.kind
    }

    pub fn is_mobile(&self) -> bool {
        matches!(self.kind, TargetKind::Agent { .. })
    }

    /// Timestamp of the last successful live resolution, if any.
    pub fn last_resolved_at(&self) -> Option<f64> {
        self.last_resolved_at
    }

    /// Current position of the target.
    ///
    /// Static and named targets always resolve. An agent target resolves to
    /// its live position while the agent exists, refreshing the last-known
    /// cache; once the agent is gone it falls back to the cached position,
    /// or `None` if it was never seen.
    pub fn current_position(&mut self, registry: &dyn AgentRegistry, now: f64) -> Option<GridPos> {
        match self.kind {
            TargetKind::Static { pos } | TargetKind::NamedPoint { pos, .. } => Some(pos),
            TargetKind::Agent { id } => match registry.resolve(id) {
                Some(snapshot) if snapshot.alive => {
                    self.last_known = Some(snapshot.pos);
                    self.last_resolved_at = Some(now);
                    Some(snapshot.pos)
                }
                _ => self.last_known,
            },
        }
    }

    /// False once a referenced mobile agent no longer resolves to a live
    /// handle. Static and named targets are always valid.
    pub fn is_valid(&self, registry: &dyn AgentRegistry) -> bool {
        match self.kind {
            TargetKind::Static { .. } | TargetKind::NamedPoint { .. } => true,
            TargetKind::Agent { id } => registry
                .resolve(id)
                .map_or(false, |snapshot| snapshot.alive),
        }
    }

    /// Whether the target's current position is more than `threshold` away
    /// from `reference`. Meaningful only for mobile targets; fixed targets
    /// never report movement.
    pub fn has_moved_significantly(
        &mut self,
        registry: &dyn AgentRegistry,
        reference: GridPos,
        threshold: FixedNum,
        now: f64,
    ) -> bool {
        if !self.is_mobile() {
            return false;
        }
        match self.current_position(registry, now) {
            Some(pos) => pos.distance(reference) > threshold,
            None => false,
        }
    }
}

impl PartialEq for NavigationTarget {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (TargetKind::Static { pos: a }, TargetKind::Static { pos: b }) => a == b,
            (TargetKind::Agent { id: a }, TargetKind::Agent { id: b }) => a == b,
            (TargetKind::NamedPoint { id: a, .. }, TargetKind::NamedPoint { id: b, .. }) => a == b,
            _ => false,
        }
    }
}
