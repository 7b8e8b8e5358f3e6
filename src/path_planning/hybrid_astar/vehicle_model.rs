//! Vehicle model for the Hybrid A* planner
//!
//! Implements a bicycle kinematic model driven at unit speed, the turning
//! geometry of a constant steering input and the rectangular body footprint.
//! Based on the state lattice motion model.

use std::f64::consts::PI;

use nalgebra::{Isometry2, Point2, Vector2};

use crate::common::{MotionModel, Point2D, Polygon, Pose2D, RoboticsError, RoboticsResult};

/// Vehicle geometry and steering limits
#[derive(Debug, Clone)]
pub struct VehicleConfig {
    /// Wheelbase length [m]
    pub wheelbase: f64,
    /// Maximum steering angle [rad], strictly below pi/2
    pub max_steer: f64,
    /// Body length [m]
    pub body_length: f64,
    /// Body width [m]
    pub body_width: f64,
    /// Distance from the rear axle to the rear bumper [m]
    pub rear_overhang: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        let wheelbase = 0.5;
        Self {
            wheelbase,
            max_steer: PI / 5.0,
            body_length: 1.6 * wheelbase,
            body_width: 0.8 * wheelbase,
            rear_overhang: 0.3 * wheelbase,
        }
    }
}

/// Side the vehicle turns towards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// +1 for counter-clockwise, -1 for clockwise
    pub fn sign(&self) -> f64 {
        match self {
            TurnDirection::Left => 1.0,
            TurnDirection::Right => -1.0,
        }
    }
}

/// Circle followed under a constant non-zero steering input
#[derive(Debug, Clone, Copy)]
pub struct TurningParams {
    pub direction: TurnDirection,
    pub center: Point2D,
    pub radius: f64,
}

/// Bicycle kinematic model, reference point on the rear axle
#[derive(Debug, Clone)]
pub struct VehicleModel {
    config: VehicleConfig,
}

impl VehicleModel {
    pub fn new(config: VehicleConfig) -> RoboticsResult<Self> {
        if !(config.wheelbase > 0.0) {
            return Err(RoboticsError::InvalidParameter(format!(
                "wheelbase must be positive, got {}",
                config.wheelbase
            )));
        }
        if !(config.max_steer > 0.0 && config.max_steer < PI / 2.0) {
            return Err(RoboticsError::InvalidParameter(format!(
                "max steering angle must be in (0, pi/2), got {}",
                config.max_steer
            )));
        }
        if !(config.body_length > 0.0 && config.body_width > 0.0) || config.rear_overhang < 0.0 {
            return Err(RoboticsError::InvalidParameter(format!(
                "invalid body dimensions {} x {} with overhang {}",
                config.body_length, config.body_width, config.rear_overhang
            )));
        }
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: VehicleConfig::default(),
        }
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn wheelbase(&self) -> f64 {
        self.config.wheelbase
    }

    pub fn max_steer(&self) -> f64 {
        self.config.max_steer
    }

    /// Sampled steering inputs: full right, straight, full left
    pub fn steering_inputs(&self) -> [f64; 3] {
        [-self.config.max_steer, 0.0, self.config.max_steer]
    }

    /// Radius of the tightest turn; positive thanks to the steering limit
    pub fn min_turning_radius(&self) -> f64 {
        self.config.wheelbase / self.config.max_steer.tan()
    }

    /// Advance `pose` by `dt` metres of travel under steering angle `phi`
    pub fn step(&self, pose: &Pose2D, phi: f64, dt: f64) -> Pose2D {
        Pose2D::new(
            pose.x + dt * pose.yaw.cos(),
            pose.y + dt * pose.yaw.sin(),
            pose.yaw + dt * phi.tan() / self.config.wheelbase,
        )
        .normalized()
    }

    /// Turning circle for steering angle `phi`, `None` when driving straight
    pub fn turning_params(&self, pose: &Pose2D, phi: f64) -> Option<TurningParams> {
        if phi == 0.0 {
            return None;
        }
        let radius = self.config.wheelbase / phi.abs().tan();
        let direction = if phi > 0.0 {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        };
        Some(TurningParams {
            direction,
            center: turning_center(pose, direction, radius),
            radius,
        })
    }

    /// Body rectangle at `pose`
    pub fn footprint(&self, pose: &Pose2D) -> Polygon {
        let rear = -self.config.rear_overhang;
        let front = self.config.body_length - self.config.rear_overhang;
        let half_w = self.config.body_width / 2.0;

        let iso = Isometry2::new(Vector2::new(pose.x, pose.y), pose.yaw);
        let corners = [
            Point2::new(rear, -half_w),
            Point2::new(front, -half_w),
            Point2::new(front, half_w),
            Point2::new(rear, half_w),
        ];
        Polygon::new(
            corners
                .iter()
                .map(|c| {
                    let p = iso.transform_point(c);
                    Point2D::new(p.x, p.y)
                })
                .collect(),
        )
    }
}

impl MotionModel for VehicleModel {
    type State = Pose2D;
    type Control = f64;

    fn propagate(&self, state: &Pose2D, control: &f64, dt: f64) -> Pose2D {
        self.step(state, *control, dt)
    }
}

/// Centre of the circle of `radius` tangent to `pose` on the `direction` side
pub fn turning_center(pose: &Pose2D, direction: TurnDirection, radius: f64) -> Point2D {
    let s = direction.sign();
    Point2D::new(
        pose.x - s * radius * pose.yaw.sin(),
        pose.y + s * radius * pose.yaw.cos(),
    )
}

/// Pose on a turning circle once the heading has become `yaw`
pub fn pose_on_circle(center: &Point2D, direction: TurnDirection, radius: f64, yaw: f64) -> Pose2D {
    let s = direction.sign();
    Pose2D::new(
        center.x + s * radius * yaw.sin(),
        center.y - s * radius * yaw.cos(),
        yaw,
    )
    .normalized()
}
