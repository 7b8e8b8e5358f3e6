//! hybrid_astar - Hybrid A* path planning for car-like vehicles
//!
//! This crate plans kinematically feasible, collision-free paths for a
//! bicycle-model vehicle through a bounded 2D workspace with rectangular
//! obstacles.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod path_planning;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, Path2D, Obstacle, Polygon};
pub use common::{CollisionChecker, MotionModel};
pub use common::{RoboticsError, RoboticsResult};
