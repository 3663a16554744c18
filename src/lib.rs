//! Road-network navigation engine.
//!
//! Scans classified terrain to build an immutable road graph, indexes the
//! graph for fast nearest-node queries, answers shortest-path queries over
//! segment arc length, and runs live self-correcting navigation sessions
//! toward static or mobile targets.
//!
//! The core (graph, spatial hash, sessions, targets) is plain Rust and can be
//! driven programmatically. [`NavigationPlugin`] wires the core into a bevy
//! host: background graph builds on the compute task pool, per-agent session
//! components, and buffered [`NavigationMessage`]s for rendering/HUD.

pub mod classifier;
pub mod error;
pub mod graph;
pub mod math;
pub mod plugin;
pub mod session;
pub mod spatial_hash;
pub mod target;
pub mod worker;

pub use classifier::{RoadCellSet, SurfaceClassifier, SurfaceConfig, TerrainClassifier, TerrainSampler};
pub use error::NavError;
pub use graph::{
    build_graph, simplify_path, Connectivity, GraphBuildConfig, GraphStats, NodeId, NodeKind,
    RoadGraph, RoadNode, RoadSegment, SegmentId,
};
pub use math::{polyline_length, FixedNum, GridPos};
pub use plugin::{NavAgent, NavClock, NavPosition, NavigationMessage, NavigationPlugin, Navigator};
pub use session::{NavigationEvent, NavigationListener, NavigationSession, SessionConfig};
pub use spatial_hash::NodeSpatialHash;
pub use target::{AgentId, AgentIndex, AgentRegistry, AgentSnapshot, NavigationTarget, TargetKind};
pub use worker::{GraphBuildState, GraphBuilderHandle};
