//! Common types used throughout hybrid_astar

use nalgebra::Vector2;
use std::f64::consts::PI;

/// Wrap an angle into [0, 2*pi)
pub fn mod2pi(angle: f64) -> f64 {
    let v = angle.rem_euclid(2.0 * PI);
    // rem_euclid can round up to exactly 2*pi for tiny negative inputs
    if v >= 2.0 * PI - 1e-12 {
        0.0
    } else {
        v
    }
}

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// 2D pose (position + orientation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Same pose with yaw wrapped into [0, 2*pi)
    pub fn normalized(self) -> Self {
        Self {
            yaw: mod2pi(self.yaw),
            ..self
        }
    }

    /// Euclidean distance between the two positions, heading ignored
    pub fn distance(&self, other: &Pose2D) -> f64 {
        self.position().distance(&other.position())
    }

    /// True if both position and heading agree within `tolerance`
    pub fn coincides_with(&self, other: &Pose2D, tolerance: f64) -> bool {
        let dyaw = mod2pi(self.yaw - other.yaw);
        self.distance(other) <= tolerance && dyaw.min(2.0 * PI - dyaw) <= tolerance
    }
}

/// Convex polygon given by its vertices in order
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point2D>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point2D>) -> Self {
        Self { vertices }
    }

    /// Edge normals, used as separating-axis candidates
    fn axes(&self) -> impl Iterator<Item = Vector2<f64>> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| {
            let a = self.vertices[i].to_vector();
            let b = self.vertices[(i + 1) % n].to_vector();
            let edge = b - a;
            Vector2::new(-edge.y, edge.x)
        })
    }

    fn project(&self, axis: &Vector2<f64>) -> (f64, f64) {
        self.vertices
            .iter()
            .map(|p| p.to_vector().dot(axis))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Separating axis test between two convex polygons. Touching counts as
    /// intersecting.
    pub fn intersects(&self, other: &Polygon) -> bool {
        if self.vertices.is_empty() || other.vertices.is_empty() {
            return false;
        }
        for axis in self.axes().chain(other.axes()) {
            if axis.norm_squared() == 0.0 {
                continue;
            }
            let (a_min, a_max) = self.project(&axis);
            let (b_min, b_max) = other.project(&axis);
            if a_max < b_min || b_max < a_min {
                return false;
            }
        }
        true
    }
}

/// Axis-aligned rectangular obstacle, (x, y) being the lower-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Obstacle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle grown by `margin` on every side
    pub fn inflated(&self, margin: f64) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(vec![
            Point2D::new(self.x, self.y),
            Point2D::new(self.x + self.width, self.y),
            Point2D::new(self.x + self.width, self.y + self.height),
            Point2D::new(self.x, self.y + self.height),
        ])
    }
}

impl From<[f64; 4]> for Obstacle {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Path represented as a sequence of 2D points
#[derive(Debug, Clone)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

impl Path2D {
    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn total_length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points.windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

/// Cell index on a uniform grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridIndex {
    pub x: i32,
    pub y: i32,
}

impl GridIndex {
    pub fn new(x: i32, y: i32) -> Self {
        GridIndex { x, y }
    }
}
