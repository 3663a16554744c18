//! Background road-graph construction.
//!
//! Scanning a 300x300 region and tracing segments is too slow for a frame,
//! so [`GraphBuilderHandle`] runs [`build_graph`] on the async compute pool
//! and hands the finished [`RoadGraph`] back through [`GraphBuilderHandle::poll`].
//! The graph is immutable once built; delivery is a pointer swap.

use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future, AsyncComputeTaskPool, Task, TaskPool};

use crate::classifier::TerrainClassifier;
use crate::error::NavError;
use crate::graph::{build_graph, GraphBuildConfig, RoadGraph, MAX_SCAN_RADIUS};

/// Where the builder currently stands. `Ready` keeps reporting the latest
/// finished graph until a newer build supersedes it.
#[derive(Debug, Clone)]
pub enum GraphBuildState {
    NotStarted,
    InProgress,
    Ready(Arc<RoadGraph>),
    Failed(NavError),
}

/// Owns the in-flight build task and the latest finished graph.
///
/// Requesting a new build while one is in flight cancels the old task; only
/// the newest request ever completes. Finished graphs are retained, so a
/// failed or superseded request never takes a working graph away.
#[derive(Resource, Default)]
pub struct GraphBuilderHandle {
    task: Option<Task<RoadGraph>>,
    latest: Option<Arc<RoadGraph>>,
    failure: Option<NavError>,
    generation: u64,
}

impl GraphBuilderHandle {
    /// Kick off a build over `config`'s scan region. Returns immediately;
    /// the result arrives through [`Self::poll`].
    pub fn request_build(
        &mut self,
        classifier: Arc<dyn TerrainClassifier>,
        config: GraphBuildConfig,
    ) -> Result<(), NavError> {
        if config.radius <= 0 || config.radius > MAX_SCAN_RADIUS {
            let reason = format!(
                "scan radius {} outside 1..={}",
                config.radius, MAX_SCAN_RADIUS
            );
            warn!("[GRAPH BUILD] Rejecting request: {}", reason);
            let err = NavError::BuildFailed(reason);
            self.failure = Some(err.clone());
            return Err(err);
        }

        if self.task.is_some() {
            info!("[GRAPH BUILD] Superseding in-flight build");
        }

        let pool = AsyncComputeTaskPool::get_or_init(TaskPool::default);
        // Dropping the previous task cancels it.
        self.task = Some(pool.spawn(async move { build_graph(classifier.as_ref(), &config) }));
        self.failure = None;
        Ok(())
    }

    /// Non-blocking check on the in-flight task. Returns the finished graph
    /// exactly once, on the call that observes completion.
    pub fn poll(&mut self) -> Option<Arc<RoadGraph>> {
        let task = self.task.as_mut()?;
        let graph = block_on(future::poll_once(task))?;
        self.task = None;

        let graph = Arc::new(graph);
        self.latest = Some(graph.clone());
        self.generation += 1;
        info!(
            "[GRAPH BUILD] Generation {} ready: {}",
            self.generation,
            graph.stats()
        );
        Some(graph)
    }

    /// Latest finished graph, if any build has completed.
    pub fn graph(&self) -> Option<Arc<RoadGraph>> {
        self.latest.clone()
    }

    /// Bumped each time a build finishes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> GraphBuildState {
        if self.task.is_some() {
            return GraphBuildState::InProgress;
        }
        if let Some(graph) = &self.latest {
            return GraphBuildState::Ready(graph.clone());
        }
        if let Some(err) = &self.failure {
            return GraphBuildState::Failed(err.clone());
        }
        GraphBuildState::NotStarted
    }
}
