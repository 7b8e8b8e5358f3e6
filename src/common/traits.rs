//! Common traits defining the seams between the planner and its collaborators

use crate::common::types::*;

/// Trait for anything that can tell whether a vehicle footprint is in collision
pub trait CollisionChecker {
    /// True if the polygon touches an obstacle or leaves the workspace
    fn is_collision(&self, footprint: &Polygon) -> bool;
}

/// Trait for vehicle/robot motion models
pub trait MotionModel {
    /// State type
    type State;
    /// Control type
    type Control;

    /// Propagate state forward by one increment
    fn propagate(&self, state: &Self::State, control: &Self::Control, dt: f64) -> Self::State;
}
