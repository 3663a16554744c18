use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::classifier::RoadCellSet;
use crate::error::NavError;
use crate::graph::{build_graph, GraphBuildConfig};
use crate::target::{AgentId, AgentIndex, NavigationTarget};

fn p(x: i32, z: i32) -> GridPos {
    GridPos::new(x, z)
}

/// Straight road along z from (0,0) to (0,60).
fn road_graph() -> Arc<RoadGraph> {
    let mut cells = RoadCellSet::new();
    cells.insert_line(p(0, 0), p(0, 60));
    Arc::new(build_graph(&cells, &GraphBuildConfig::around(GridPos::ZERO, 80)))
}

fn session() -> NavigationSession {
    NavigationSession::with_graph(road_graph(), SessionConfig::default())
}

fn count_path_updated(events: &[NavigationEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, NavigationEvent::PathUpdated { .. }))
        .count()
}

#[test]
fn start_toward_fixed_target_activates() {
    let registry = AgentIndex::default();
    let mut session = session();
    let mut events = Vec::new();

    let ok = session.start(
        NavigationTarget::fixed(p(0, 60), "camp"),
        p(0, 0),
        0.0,
        &registry,
        &mut events,
    );

    assert!(ok);
    assert!(session.is_active());
    assert_eq!(session.progress(), 0);
    assert_eq!(session.anchor(), Some(p(0, 0)));
    assert_eq!(session.current_path().first(), Some(&p(0, 0)));
    assert_eq!(session.current_path().last(), Some(&p(0, 60)));
    assert!(matches!(events[0], NavigationEvent::NavigationStarted { .. }));

    // Straight road: the simplified path is just the two ends.
    assert_eq!(session.simplified_path().len(), 2);
}

#[test]
fn start_without_graph_defers_until_adoption() {
    let registry = AgentIndex::default();
    let mut session = NavigationSession::new(SessionConfig::default());
    let mut events = Vec::new();

    let result = session.try_start(
        NavigationTarget::fixed(p(0, 40), "camp"),
        p(0, 0),
        0.0,
        &registry,
        &mut events,
    );

    assert!(matches!(result, Err(NavError::GraphUnavailable)));
    assert!(!session.is_active());
    assert!(session.has_pending_start());
    // Deferral is silent; "still computing" is not "no route".
    assert!(events.is_empty());

    session.adopt_graph(road_graph(), p(0, 0), 1.0, &registry, &mut events);
    assert!(session.is_active());
    assert!(!session.has_pending_start());
    assert!(matches!(events[0], NavigationEvent::NavigationStarted { .. }));
}

#[test]
fn unreachable_target_emits_path_not_found() {
    let registry = AgentIndex::default();
    let mut events = Vec::new();

    // Nearest-node snapping reaches anything in the region, so unreachable
    // means a target on a disconnected island.
    let mut cells = RoadCellSet::new();
    cells.insert_line(p(0, 0), p(0, 10));
    cells.insert_line(p(40, 0), p(40, 10));
    let graph = Arc::new(build_graph(&cells, &GraphBuildConfig::around(GridPos::ZERO, 60)));
    let mut session = NavigationSession::with_graph(graph, SessionConfig::default());

    let result = session.try_start(
        NavigationTarget::fixed(p(40, 10), "island"),
        p(0, 0),
        0.0,
        &registry,
        &mut events,
    );

    assert!(matches!(result, Err(NavError::NoPathFound(_))));
    assert!(!session.is_active());
    assert!(matches!(events[0], NavigationEvent::PathNotFound { .. }));
}

#[test]
fn dead_agent_target_is_invalid() {
    let registry = AgentIndex::default();
    let mut session = session();
    let mut events = Vec::new();

    let result = session.try_start(
        NavigationTarget::agent(AgentId(9), "ghost"),
        p(0, 0),
        0.0,
        &registry,
        &mut events,
    );

    assert!(matches!(result, Err(NavError::InvalidTarget(_))));
    assert!(events.is_empty());
}

#[test]
fn arrival_deactivates_and_notifies() {
    let registry = AgentIndex::default();
    let mut session = session();
    let mut events = Vec::new();

    session.start(NavigationTarget::fixed(p(0, 40), "camp"), p(0, 0), 0.0, &registry, &mut events);
    events.clear();

    session.update(p(0, 39), 0.1, &registry, &mut events);

    assert!(!session.is_active());
    assert!(matches!(events[0], NavigationEvent::DestinationReached { .. }));
    assert!(session.current_path().is_empty());
}

#[test]
fn progress_never_decreases_and_tracks_the_agent() {
    let registry = AgentIndex::default();
    // Disable re-routing: a re-route legitimately resets the index, and this
    // test pins the within-one-path guarantee.
    let config = SessionConfig {
        reroute_interval: 1_000.0,
        ..SessionConfig::default()
    };
    let mut session = NavigationSession::with_graph(road_graph(), config);
    let mut events = Vec::new();

    session.start(NavigationTarget::fixed(p(0, 60), "far"), p(0, 0), 0.0, &registry, &mut events);

    let mut last_progress = 0;
    let mut now = 0.0;
    for z in 0..30 {
        now += 0.1;
        session.update(p(0, z), now, &registry, &mut events);
        let progress = session.progress();
        assert!(progress >= last_progress, "progress went backward at z={}", z);
        last_progress = progress;
    }
    assert!(last_progress > 0);

    // Walking the agent backward must not rewind the index.
    session.update(p(0, 5), now + 0.05, &registry, &mut events);
    assert!(session.progress() >= last_progress);
}

#[test]
fn remaining_distance_shrinks_as_the_agent_advances() {
    let registry = AgentIndex::default();
    let mut session = session();
    let mut events = Vec::new();

    session.start(NavigationTarget::fixed(p(0, 60), "far"), p(0, 0), 0.0, &registry, &mut events);
    let initial = session.remaining_distance();
    assert_eq!(initial, FixedNum::from_num(60));

    session.update(p(0, 5), 0.1, &registry, &mut events);
    session.update(p(0, 10), 0.2, &registry, &mut events);
    assert!(session.remaining_distance() < initial);
}

#[test]
fn mobile_target_jump_triggers_exactly_one_reroute() {
    let id = AgentId(1);
    let mut registry = AgentIndex::default();
    registry.upsert(id, p(0, 30));

    let mut session = session();
    let mut events = Vec::new();
    session.start(NavigationTarget::agent(id, "trader"), p(0, 0), 0.0, &registry, &mut events);
    events.clear();

    // Target jumps 30 units (threshold 10) along the road.
    registry.upsert(id, p(0, 60));

    // Within the throttle interval: no recompute yet.
    session.update(p(0, 1), 0.5, &registry, &mut events);
    assert_eq!(count_path_updated(&events), 0);

    // First qualifying update re-routes once.
    session.update(p(0, 1), 1.1, &registry, &mut events);
    assert_eq!(count_path_updated(&events), 1);
    assert_eq!(session.current_path().last(), Some(&p(0, 60)));
    assert_eq!(session.progress(), 0, "re-route resets progress");

    // Target has not moved since; later updates stay quiet.
    session.update(p(0, 1), 2.2, &registry, &mut events);
    session.update(p(0, 1), 3.3, &registry, &mut events);
    assert_eq!(count_path_updated(&events), 1);
}

#[test]
fn agent_drift_from_anchor_triggers_reroute() {
    let registry = AgentIndex::default();
    let mut session = session();
    let mut events = Vec::new();

    session.start(NavigationTarget::fixed(p(0, 60), "far"), p(0, 0), 0.0, &registry, &mut events);
    events.clear();

    // Drift 15 units from the anchor (threshold 10).
    session.update(p(0, 15), 1.5, &registry, &mut events);
    assert_eq!(count_path_updated(&events), 1);
    assert_eq!(session.anchor(), Some(p(0, 15)));
}

#[test]
fn failed_reroute_keeps_the_stale_path() {
    let id = AgentId(1);
    let mut registry = AgentIndex::default();
    registry.upsert(id, p(0, 30));

    // Road plus a disconnected island the target will teleport to.
    let mut cells = RoadCellSet::new();
    cells.insert_line(p(0, 0), p(0, 60));
    cells.insert_line(p(50, 0), p(50, 10));
    let graph = Arc::new(build_graph(&cells, &GraphBuildConfig::around(GridPos::ZERO, 80)));
    let mut session = NavigationSession::with_graph(graph, SessionConfig::default());

    let mut events = Vec::new();
    session.start(NavigationTarget::agent(id, "trader"), p(0, 0), 0.0, &registry, &mut events);
    let stale = session.current_path().to_vec();
    events.clear();

    registry.upsert(id, p(50, 10));
    session.update(p(0, 1), 1.5, &registry, &mut events);

    assert!(matches!(events[0], NavigationEvent::PathNotFound { .. }));
    assert!(session.is_active(), "session keeps running on the stale path");
    assert_eq!(session.current_path(), stale.as_slice());
}

#[test]
fn stop_clears_state_and_notifies() {
    let registry = AgentIndex::default();
    let mut session = session();
    let mut events = Vec::new();

    session.start(NavigationTarget::fixed(p(0, 40), "camp"), p(0, 0), 0.0, &registry, &mut events);
    events.clear();

    session.stop(&mut events);
    assert!(!session.is_active());
    assert!(session.current_path().is_empty());
    assert_eq!(events, vec![NavigationEvent::NavigationStopped]);

    // Stopping an idle session is a no-op.
    events.clear();
    session.stop(&mut events);
    assert!(events.is_empty());
}

struct CountingListener(Arc<AtomicUsize>);

impl NavigationListener for CountingListener {
    fn on_event(&mut self, _event: &NavigationEvent) -> Result<(), NavError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingListener;

impl NavigationListener for FailingListener {
    fn on_event(&mut self, _event: &NavigationEvent) -> Result<(), NavError> {
        Err(NavError::Listener("listener exploded".into()))
    }
}

#[test]
fn listener_failure_does_not_stop_dispatch() {
    let registry = AgentIndex::default();
    let mut session = session();
    let seen = Arc::new(AtomicUsize::new(0));

    session.add_listener(Box::new(FailingListener));
    session.add_listener(Box::new(CountingListener(seen.clone())));

    let mut events = Vec::new();
    let ok = session.start(
        NavigationTarget::fixed(p(0, 40), "camp"),
        p(0, 0),
        0.0,
        &registry,
        &mut events,
    );

    assert!(ok, "failing listener must not corrupt session state");
    assert!(session.is_active());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(events.len(), 1);
}

#[test]
fn direction_to_next_waypoint_points_along_the_road() {
    let registry = AgentIndex::default();
    let mut session = session();
    let mut events = Vec::new();

    session.start(NavigationTarget::fixed(p(0, 40), "camp"), p(0, 0), 0.0, &registry, &mut events);

    // Road runs toward +z: bearing 0 degrees.
    assert_eq!(session.direction_to_next_waypoint(), Some(0.0));
}
