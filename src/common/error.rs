//! Error types for hybrid_astar

use thiserror::Error;

/// Main error type for the planner and its collaborators
#[derive(Debug, Error)]
pub enum RoboticsError {
    /// Path planning failed
    #[error("Planning error: {0}")]
    PlanningError(String),
    /// Invalid parameter, rejected before any search work
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Visualization error
    #[error("Visualization error: {0}")]
    VisualizationError(String),
}

/// Result type alias for robotics operations
pub type RoboticsResult<T> = Result<T, RoboticsError>;
