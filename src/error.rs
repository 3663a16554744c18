use thiserror::Error;

/// Navigation error taxonomy.
///
/// Expected outcomes (no route, graph still building, arrival) are return
/// values or [`crate::session::NavigationEvent`]s, never `Err`. This enum
/// covers the fallible API surface: `try_start`, build-request validation,
/// and listener failure reporting.
#[derive(Debug, Clone, Error)]
pub enum NavError {
    #[error("no road graph available yet")]
    GraphUnavailable,

    #[error("no path found to target '{0}'")]
    NoPathFound(String),

    #[error("invalid navigation target: {0}")]
    InvalidTarget(String),

    #[error("graph build failed: {0}")]
    BuildFailed(String),

    #[error("navigation listener failed: {0}")]
    Listener(String),
}
