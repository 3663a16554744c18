//! Live navigation sessions.
//!
//! A [`NavigationSession`] owns one active navigation's lifecycle: start,
//! throttled re-routes as agent and target move, monotone progress tracking,
//! arrival detection, and listener notification. The session shares its
//! [`RoadGraph`] read-only; all mutation is confined to session state.

use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::graph::{simplify_path, RoadGraph};
use crate::math::{polyline_length, FixedNum, GridPos};
use crate::target::{AgentRegistry, NavigationTarget};

#[cfg(test)]
mod tests;

/// Thresholds and cadences for one session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Distance to the target at which navigation completes.
    pub arrival_distance: FixedNum,
    /// Agent drift from the anchor that forces a re-route.
    pub agent_move_threshold: FixedNum,
    /// Mobile-target drift from its routed position that forces a re-route.
    pub target_move_threshold: FixedNum,
    /// Minimum seconds between re-route computations.
    pub reroute_interval: f64,
    /// Distance at which a path point counts as reached by the agent.
    pub waypoint_advance_distance: FixedNum,
    /// How many path points past the current index a progress scan may look.
    pub forward_scan_window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            arrival_distance: FixedNum::from_num(3),
            agent_move_threshold: FixedNum::from_num(10),
            target_move_threshold: FixedNum::from_num(10),
            reroute_interval: 1.0,
            waypoint_advance_distance: FixedNum::from_num(2),
            forward_scan_window: 8,
        }
    }
}

/// Discrete lifecycle notifications. "Still computing" (a deferred start) is
/// distinguishable from "no route" ([`NavigationEvent::PathNotFound`])
/// because deferral emits nothing until the graph arrives.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    NavigationStarted { label: String, path_points: usize },
    PathUpdated { path_points: usize },
    PathNotFound { label: String },
    DestinationReached { label: String },
    NavigationStopped,
}

/// Receives every event a session emits. A listener error is logged and
/// never interrupts dispatch to the remaining listeners.
pub trait NavigationListener: Send + Sync {
    fn on_event(&mut self, event: &NavigationEvent) -> Result<(), NavError>;
}

/// One agent's navigation lifecycle: Inactive until a start succeeds, Active
/// until arrival or an explicit stop.
pub struct NavigationSession {
    graph: Option<Arc<RoadGraph>>,
    target: Option<NavigationTarget>,
    /// Start request queued while no graph exists yet.
    pending: Option<NavigationTarget>,
    path: Vec<GridPos>,
    simplified: Vec<GridPos>,
    progress: usize,
    simplified_progress: usize,
    active: bool,
    /// Agent position the current path was computed from.
    anchor: Option<GridPos>,
    /// Target position the current path was computed to.
    target_anchor: Option<GridPos>,
    last_reroute: f64,
    config: SessionConfig,
    listeners: Vec<Box<dyn NavigationListener>>,
}

impl NavigationSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            graph: None,
            target: None,
            pending: None,
            path: Vec::new(),
            simplified: Vec::new(),
            progress: 0,
            simplified_progress: 0,
            active: false,
            anchor: None,
            target_anchor: None,
            last_reroute: 0.0,
            config,
            listeners: Vec::new(),
        }
    }

    pub fn with_graph(graph: Arc<RoadGraph>, config: SessionConfig) -> Self {
        let mut session = Self::new(config);
        session.graph = Some(graph);
        session
    }

    pub fn add_listener(&mut self, listener: Box<dyn NavigationListener>) {
        self.listeners.push(listener);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Begin navigating toward `target`. Returns `true` when the session
    /// became active. With no graph available the request is queued and
    /// replayed by [`Self::adopt_graph`]; that deferral returns `false`
    /// without emitting `PathNotFound`.
    pub fn start(
        &mut self,
        target: NavigationTarget,
        agent_pos: GridPos,
        now: f64,
        registry: &dyn AgentRegistry,
        events: &mut Vec<NavigationEvent>,
    ) -> bool {
        self.try_start(target, agent_pos, now, registry, events).is_ok()
    }

    /// [`Self::start`] with the failure reason made explicit.
    pub fn try_start(
        &mut self,
        mut target: NavigationTarget,
        agent_pos: GridPos,
        now: f64,
        registry: &dyn AgentRegistry,
        events: &mut Vec<NavigationEvent>,
    ) -> Result<(), NavError> {
        if !target.is_valid(registry) {
            warn!("[NAV] Rejecting start toward invalid target '{}'", target.label());
            return Err(NavError::InvalidTarget(target.label().to_string()));
        }

        let Some(graph) = self.graph.clone() else {
            info!("[NAV] No graph yet; deferring navigation to '{}'", target.label());
            self.pending = Some(target);
            return Err(NavError::GraphUnavailable);
        };

        let Some(target_pos) = target.current_position(registry, now) else {
            warn!("[NAV] Target '{}' does not resolve to a position", target.label());
            return Err(NavError::InvalidTarget(target.label().to_string()));
        };

        let label = target.label().to_string();
        let path = graph.find_path(agent_pos, target_pos);
        if path.is_empty() {
            self.emit(NavigationEvent::PathNotFound { label: label.clone() }, events);
            return Err(NavError::NoPathFound(label));
        }

        self.install_path(path, agent_pos, target_pos, now);
        self.target = Some(target);
        self.active = true;
        self.emit(
            NavigationEvent::NavigationStarted { label, path_points: self.path.len() },
            events,
        );
        Ok(())
    }

    /// Explicitly end the session.
    pub fn stop(&mut self, events: &mut Vec<NavigationEvent>) {
        if !self.active && self.pending.is_none() {
            return;
        }
        self.pending = None;
        self.deactivate();
        self.emit(NavigationEvent::NavigationStopped, events);
    }

    /// Deliver a freshly built graph. Replays a queued start request; an
    /// already-active session keeps its current path and picks the new graph
    /// up on its next re-route.
    pub fn adopt_graph(
        &mut self,
        graph: Arc<RoadGraph>,
        agent_pos: GridPos,
        now: f64,
        registry: &dyn AgentRegistry,
        events: &mut Vec<NavigationEvent>,
    ) {
        self.graph = Some(graph);
        if let Some(target) = self.pending.take() {
            let _ = self.try_start(target, agent_pos, now, registry, events);
        }
    }

    /// Periodic update; the caller invokes this at a fixed cadence.
    ///
    /// Normal cycles only advance progress with a bounded forward scan. The
    /// throttled re-route branch is the single place a full path is
    /// recomputed.
    pub fn update(
        &mut self,
        agent_pos: GridPos,
        now: f64,
        registry: &dyn AgentRegistry,
        events: &mut Vec<NavigationEvent>,
    ) {
        if !self.active {
            return;
        }
        let Some(mut target) = self.target.take() else {
            return;
        };

        let target_pos = target.current_position(registry, now);

        // Arrival check against the live target position.
        if let Some(target_pos) = target_pos {
            if agent_pos.distance(target_pos) <= self.config.arrival_distance {
                let label = target.label().to_string();
                self.deactivate();
                self.emit(NavigationEvent::DestinationReached { label }, events);
                return;
            }
        }

        if self.reroute_due(agent_pos, &mut target, registry, now) {
            self.last_reroute = now;
            if let (Some(graph), Some(target_pos)) = (self.graph.clone(), target_pos) {
                let path = graph.find_path(agent_pos, target_pos);
                if path.is_empty() {
                    // Keep the stale path rather than stranding the agent;
                    // surface the failure so the HUD can show it.
                    self.emit(
                        NavigationEvent::PathNotFound { label: target.label().to_string() },
                        events,
                    );
                } else {
                    self.install_path(path, agent_pos, target_pos, now);
                    self.emit(
                        NavigationEvent::PathUpdated { path_points: self.path.len() },
                        events,
                    );
                }
            }
        }

        self.advance_progress(agent_pos);
        self.target = Some(target);
    }

    // ========================================================================
    // Read surface
    // ========================================================================

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn has_pending_start(&self) -> bool {
        self.pending.is_some()
    }

    pub fn current_path(&self) -> &[GridPos] {
        &self.path
    }

    pub fn simplified_path(&self) -> &[GridPos] {
        &self.simplified
    }

    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn simplified_progress(&self) -> usize {
        self.simplified_progress
    }

    pub fn anchor(&self) -> Option<GridPos> {
        self.anchor
    }

    pub fn target_position(&self) -> Option<GridPos> {
        self.target_anchor
    }

    pub fn graph(&self) -> Option<&Arc<RoadGraph>> {
        self.graph.as_ref()
    }

    /// Arc length of the path still ahead of the agent.
    pub fn remaining_distance(&self) -> FixedNum {
        if self.path.is_empty() {
            return FixedNum::ZERO;
        }
        polyline_length(&self.path[self.progress..])
    }

    /// Bearing in degrees from the current path point toward the next
    /// simplified waypoint, for HUD compasses.
    pub fn direction_to_next_waypoint(&self) -> Option<f32> {
        let from = *self.path.get(self.progress)?;
        let to = *self
            .simplified
            .get(self.simplified_progress + 1)
            .or_else(|| self.simplified.last())?;
        if from == to {
            return None;
        }
        Some(from.bearing_to(to))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn install_path(&mut self, path: Vec<GridPos>, agent_pos: GridPos, target_pos: GridPos, now: f64) {
        self.simplified = simplify_path(&path);
        self.path = path;
        self.progress = 0;
        self.simplified_progress = 0;
        self.anchor = Some(agent_pos);
        self.target_anchor = Some(target_pos);
        self.last_reroute = now;
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.target = None;
        self.path.clear();
        self.simplified.clear();
        self.progress = 0;
        self.simplified_progress = 0;
        self.anchor = None;
        self.target_anchor = None;
    }

    fn reroute_due(
        &mut self,
        agent_pos: GridPos,
        target: &mut NavigationTarget,
        registry: &dyn AgentRegistry,
        now: f64,
    ) -> bool {
        if now - self.last_reroute < self.config.reroute_interval {
            return false;
        }

        let agent_moved = self
            .anchor
            .map_or(false, |anchor| agent_pos.distance(anchor) > self.config.agent_move_threshold);
        if agent_moved {
            return true;
        }

        match self.target_anchor {
            Some(routed_to) => target.has_moved_significantly(
                registry,
                routed_to,
                self.config.target_move_threshold,
                now,
            ),
            None => false,
        }
    }

    /// Scan forward from the current index for the path point nearest the
    /// agent and advance to it when close enough. Never moves backward.
    fn advance_progress(&mut self, agent_pos: GridPos) {
        self.progress = scan_forward(
            &self.path,
            self.progress,
            agent_pos,
            self.config.forward_scan_window,
            self.config.waypoint_advance_distance,
        );
        self.simplified_progress = scan_forward(
            &self.simplified,
            self.simplified_progress,
            agent_pos,
            self.config.forward_scan_window,
            self.config.waypoint_advance_distance,
        );
    }

    fn emit(&mut self, event: NavigationEvent, events: &mut Vec<NavigationEvent>) {
        for listener in &mut self.listeners {
            if let Err(e) = listener.on_event(&event) {
                // One listener's failure must not starve the rest or touch
                // session state.
                warn!("[NAV] Listener failed on {:?}: {}", event, e);
            }
        }
        events.push(event);
    }
}

fn scan_forward(
    path: &[GridPos],
    from: usize,
    agent_pos: GridPos,
    window: usize,
    advance_distance: FixedNum,
) -> usize {
    if path.is_empty() || from >= path.len() {
        return from;
    }

    let end = (from + window + 1).min(path.len());
    let mut best = from;
    let mut best_d = agent_pos.distance_squared(path[from]);
    for (offset, &point) in path[from..end].iter().enumerate() {
        let d = agent_pos.distance_squared(point);
        if d < best_d {
            best_d = d;
            best = from + offset;
        }
    }

    if best_d <= advance_distance * advance_distance {
        best
    } else {
        from
    }
}
