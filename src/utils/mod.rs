//! Utility modules for hybrid_astar

pub mod environment;
pub mod grid_map;
pub mod visualization;

pub use environment::*;
pub use grid_map::*;
pub use visualization::{Visualizer, PathStyle, PointStyle, colors};
