//! Common types, traits, and error definitions for hybrid_astar
//!
//! This module provides the foundational building blocks shared by the
//! workspace model, the vehicle model and the planner.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
