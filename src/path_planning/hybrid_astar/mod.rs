//! Hybrid A* Planner Module
//!
//! This module implements Hybrid A* path planning for a car-like vehicle.
//! The search runs over continuous poses, prunes duplicates on a
//! (cell, heading) lattice and closes the path with a Dubins connection
//! once one is collision-free.
//!
//! # Components
//!
//! - `vehicle_model`: Bicycle kinematic model and body footprint
//! - `dubins_path`: Dubins connections and swept-footprint safety checks
//! - `grid_search`: Memoized grid distance used as heuristic
//! - `hybrid_astar_planner`: Main planner
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hybrid_astar::common::{Obstacle, Pose2D};
//! use hybrid_astar::path_planning::hybrid_astar::{HeuristicMode, HybridAStarPlanner};
//! use hybrid_astar::utils::Environment;
//!
//! let env = Environment::new(10.0, 10.0, vec![Obstacle::new(4.5, 4.0, 1.0, 2.0)]).unwrap();
//! let mut planner = HybridAStarPlanner::with_defaults(
//!     Arc::new(env),
//!     Pose2D::new(1.0, 5.0, 0.0),
//!     Pose2D::new(9.0, 5.0, 0.0),
//! )
//! .unwrap();
//!
//! let report = planner.search_path(HeuristicMode::GridSearch, false);
//! if let Some(path) = report.path() {
//!     println!("length: {:.2} m", path.total_length());
//! }
//! ```
//!
//! # References
//!
//! - "Practical Search Techniques in Path Planning for Autonomous Driving"
//! - "Classification of the Dubins set"

pub mod vehicle_model;
pub mod dubins_path;
pub mod grid_search;
pub mod hybrid_astar_planner;

// Re-exports
pub use vehicle_model::{TurnDirection, TurningParams, VehicleConfig, VehicleModel};
pub use dubins_path::{DubinsCandidate, DubinsPathSolver, DubinsWord, PathSegment, SegmentKind};
pub use grid_search::GridSearch;
pub use hybrid_astar_planner::{
    DiscreteState, ExploredBranch, HeuristicMode, HybridAStarConfig, HybridAStarPlanner,
    HybridPath, SearchOutcome, SearchReport, Waypoint,
};
