//! Static planning workspace
//!
//! A rectangular workspace [0, width] x [0, height] holding axis-aligned
//! rectangular obstacles. Immutable once built.

use crate::common::{CollisionChecker, Obstacle, Point2D, Polygon, RoboticsError, RoboticsResult};

#[derive(Debug, Clone)]
pub struct Environment {
    width: f64,
    height: f64,
    obstacles: Vec<Obstacle>,
    safety_margin: f64,
    /// Obstacles grown by the safety margin, cached for collision queries
    inflated: Vec<Polygon>,
}

impl Environment {
    pub fn new(width: f64, height: f64, obstacles: Vec<Obstacle>) -> RoboticsResult<Self> {
        if !(width > 0.0 && height > 0.0) {
            return Err(RoboticsError::InvalidParameter(format!(
                "workspace size must be positive, got {} x {}",
                width, height
            )));
        }
        if let Some(ob) = obstacles.iter().find(|o| o.width < 0.0 || o.height < 0.0) {
            return Err(RoboticsError::InvalidParameter(format!(
                "obstacle with negative size: {:?}",
                ob
            )));
        }

        let mut env = Self {
            width,
            height,
            obstacles,
            safety_margin: 0.0,
            inflated: Vec::new(),
        };
        env.rebuild_inflated();
        Ok(env)
    }

    /// Keep footprints at least `margin` away from every obstacle
    pub fn with_safety_margin(mut self, margin: f64) -> RoboticsResult<Self> {
        if margin < 0.0 {
            return Err(RoboticsError::InvalidParameter(format!(
                "safety margin must be non-negative, got {}",
                margin
            )));
        }
        self.safety_margin = margin;
        self.rebuild_inflated();
        Ok(self)
    }

    fn rebuild_inflated(&mut self) {
        self.inflated = self
            .obstacles
            .iter()
            .map(|o| o.inflated(self.safety_margin).to_polygon())
            .collect();
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn safety_margin(&self) -> f64 {
        self.safety_margin
    }

    pub fn in_bounds(&self, p: &Point2D) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }
}

impl CollisionChecker for Environment {
    fn is_collision(&self, footprint: &Polygon) -> bool {
        if footprint.vertices.iter().any(|p| !self.in_bounds(p)) {
            return true;
        }
        self.inflated.iter().any(|ob| ob.intersects(footprint))
    }
}
