//! Bevy integration.
//!
//! Hosts attach [`NavAgent`]/[`NavPosition`] to entities the registry should
//! track and a [`Navigator`] to entities that route. [`NavigationPlugin`]
//! runs the fixed-step pipeline: advance the clock, refresh the agent index,
//! deliver finished graph builds, then update every session. Session events
//! are re-published as [`NavigationMessage`]s.

use bevy::prelude::*;

use crate::math::GridPos;
use crate::session::{NavigationEvent, NavigationSession};
use crate::target::{AgentId, AgentIndex};
use crate::worker::GraphBuilderHandle;

/// Makes an entity visible to the agent registry, so it can serve as a
/// mobile navigation target.
#[derive(Component, Debug, Clone, Copy)]
pub struct NavAgent {
    pub id: AgentId,
}

/// The entity's position on the road grid.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavPosition(pub GridPos);

/// Attaches a navigation session to an entity.
#[derive(Component)]
pub struct Navigator(pub NavigationSession);

/// Monotone simulation clock in seconds, advanced each fixed tick. Sessions
/// take timestamps from here rather than wall time, so re-route throttling
/// stays deterministic under replays.
#[derive(Resource, Default)]
pub struct NavClock {
    pub seconds: f64,
}

/// A session event tagged with the navigator entity that emitted it.
#[derive(Event, Message, Debug, Clone)]
pub struct NavigationMessage {
    pub entity: Entity,
    pub event: NavigationEvent,
}

pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavClock>();
        app.init_resource::<AgentIndex>();
        app.init_resource::<GraphBuilderHandle>();
        app.add_message::<NavigationMessage>();
        app.add_systems(
            FixedUpdate,
            (advance_clock, sync_agent_index, deliver_graph_builds, update_navigators).chain(),
        );
    }
}

fn advance_clock(mut clock: ResMut<NavClock>, time: Res<Time<Fixed>>) {
    clock.seconds += time.delta_secs_f64();
}

/// Refresh the registry from live agent entities. Despawned agents stay in
/// the index flagged dead, which is what keeps last-known-position routing
/// working after a target vanishes.
fn sync_agent_index(mut index: ResMut<AgentIndex>, agents: Query<(&NavAgent, &NavPosition)>) {
    index.mark_all_dead();
    for (agent, pos) in &agents {
        index.upsert(agent.id, pos.0);
    }
}

/// Hand a freshly finished graph to every navigator. Sessions with a queued
/// start replay it; active sessions pick the new graph up on their next
/// re-route.
fn deliver_graph_builds(
    mut builder: ResMut<GraphBuilderHandle>,
    clock: Res<NavClock>,
    index: Res<AgentIndex>,
    mut navigators: Query<(Entity, &NavPosition, &mut Navigator)>,
    mut messages: MessageWriter<NavigationMessage>,
) {
    let Some(graph) = builder.poll() else {
        return;
    };

    let mut events = Vec::new();
    for (entity, pos, mut navigator) in &mut navigators {
        navigator
            .0
            .adopt_graph(graph.clone(), pos.0, clock.seconds, &*index, &mut events);
        for event in events.drain(..) {
            messages.write(NavigationMessage { entity, event });
        }
    }
}

fn update_navigators(
    clock: Res<NavClock>,
    index: Res<AgentIndex>,
    mut navigators: Query<(Entity, &NavPosition, &mut Navigator)>,
    mut messages: MessageWriter<NavigationMessage>,
) {
    let mut events = Vec::new();
    for (entity, pos, mut navigator) in &mut navigators {
        navigator.0.update(pos.0, clock.seconds, &*index, &mut events);
        for event in events.drain(..) {
            messages.write(NavigationMessage { entity, event });
        }
    }
}
