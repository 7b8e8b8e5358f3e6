//! Dubins path solver
//!
//! Shortest forward-only connections between two oriented poses for a vehicle
//! with a bounded turning radius. Every connection is a sequence of at most
//! three primitives, each a left arc (L), a straight line (S) or a right arc
//! (R). Segments of zero length are dropped, so the six canonical words also
//! cover the degenerate S, LS, SR, ... connections.
//!
//! The solver also certifies connections against a [`CollisionChecker`] by
//! sampling the vehicle footprint along the curve at a fixed arc-length step.
//!
//! Reference: Shkel, A. M., & Lumelsky, V. (2001). "Classification of the
//! Dubins set"

use std::f64::consts::PI;
use std::sync::Arc;

use itertools::Itertools;
use log::trace;

use crate::common::{mod2pi, CollisionChecker, Point2D, Pose2D, RoboticsError, RoboticsResult};
use crate::utils::Environment;

use super::vehicle_model::{pose_on_circle, turning_center, TurnDirection, VehicleModel};

/// Poses closer than this (position and heading) are treated as identical
pub const COINCIDENT_TOLERANCE: f64 = 1e-9;

/// Segments shorter than this are dropped from a connection [m]
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Motion primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Left,
    Straight,
    Right,
}

impl SegmentKind {
    pub fn turn_direction(&self) -> Option<TurnDirection> {
        match self {
            SegmentKind::Left => Some(TurnDirection::Left),
            SegmentKind::Straight => None,
            SegmentKind::Right => Some(TurnDirection::Right),
        }
    }

    /// Steering input that drives this primitive at full lock
    pub fn steering(&self, max_steer: f64) -> f64 {
        match self {
            SegmentKind::Left => max_steer,
            SegmentKind::Straight => 0.0,
            SegmentKind::Right => -max_steer,
        }
    }

    fn symbol(&self) -> char {
        match self {
            SegmentKind::Left => 'L',
            SegmentKind::Straight => 'S',
            SegmentKind::Right => 'R',
        }
    }
}

/// The six canonical Dubins words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DubinsWord {
    LSL,
    RSR,
    LSR,
    RSL,
    RLR,
    LRL,
}

impl DubinsWord {
    pub const ALL: [DubinsWord; 6] = [
        DubinsWord::LSL,
        DubinsWord::RSR,
        DubinsWord::LSR,
        DubinsWord::RSL,
        DubinsWord::RLR,
        DubinsWord::LRL,
    ];

    pub fn kinds(&self) -> [SegmentKind; 3] {
        use SegmentKind::*;
        match self {
            DubinsWord::LSL => [Left, Straight, Left],
            DubinsWord::RSR => [Right, Straight, Right],
            DubinsWord::LSR => [Left, Straight, Right],
            DubinsWord::RSL => [Right, Straight, Left],
            DubinsWord::RLR => [Right, Left, Right],
            DubinsWord::LRL => [Left, Right, Left],
        }
    }
}

/// Quantities shared by every word, in a frame where the goal lies on the
/// x axis and distances are divided by the turning radius
#[derive(Clone, Copy)]
struct Intermediate {
    alpha: f64,
    beta: f64,
    d: f64,
    sa: f64,
    sb: f64,
    ca: f64,
    cb: f64,
    c_ab: f64,
    d_sq: f64,
}

impl Intermediate {
    fn new(start: &Pose2D, goal: &Pose2D, radius: f64) -> Self {
        let dx = goal.x - start.x;
        let dy = goal.y - start.y;
        let d = (dx * dx + dy * dy).sqrt() / radius;
        let theta = if d > 0.0 { mod2pi(dy.atan2(dx)) } else { 0.0 };
        let alpha = mod2pi(start.yaw - theta);
        let beta = mod2pi(goal.yaw - theta);

        Self {
            alpha,
            beta,
            d,
            sa: alpha.sin(),
            sb: beta.sin(),
            ca: alpha.cos(),
            cb: beta.cos(),
            c_ab: (alpha - beta).cos(),
            d_sq: d * d,
        }
    }

    /// Normalized segment lengths (t, p, q) of `word`, `None` if infeasible
    fn params(&self, word: DubinsWord) -> Option<[f64; 3]> {
        let Intermediate { alpha, beta, d, sa, sb, ca, cb, c_ab, d_sq } = *self;
        match word {
            DubinsWord::LSL => {
                let p_sq = 2.0 + d_sq - 2.0 * c_ab + 2.0 * d * (sa - sb);
                if p_sq < 0.0 {
                    return None;
                }
                let tmp = (cb - ca).atan2(d + sa - sb);
                Some([mod2pi(tmp - alpha), p_sq.sqrt(), mod2pi(beta - tmp)])
            }
            DubinsWord::RSR => {
                let p_sq = 2.0 + d_sq - 2.0 * c_ab + 2.0 * d * (sb - sa);
                if p_sq < 0.0 {
                    return None;
                }
                let tmp = (ca - cb).atan2(d - sa + sb);
                Some([mod2pi(alpha - tmp), p_sq.sqrt(), mod2pi(tmp - beta)])
            }
            DubinsWord::LSR => {
                let p_sq = -2.0 + d_sq + 2.0 * c_ab + 2.0 * d * (sa + sb);
                if p_sq < 0.0 {
                    return None;
                }
                let p = p_sq.sqrt();
                let tmp = (-ca - cb).atan2(d + sa + sb) - (-2.0_f64).atan2(p);
                Some([mod2pi(tmp - alpha), p, mod2pi(tmp - beta)])
            }
            DubinsWord::RSL => {
                let p_sq = -2.0 + d_sq + 2.0 * c_ab - 2.0 * d * (sa + sb);
                if p_sq < 0.0 {
                    return None;
                }
                let p = p_sq.sqrt();
                let tmp = (ca + cb).atan2(d - sa - sb) - (2.0_f64).atan2(p);
                Some([mod2pi(alpha - tmp), p, mod2pi(beta - tmp)])
            }
            DubinsWord::RLR => {
                let tmp = (6.0 - d_sq + 2.0 * c_ab + 2.0 * d * (sa - sb)) / 8.0;
                if tmp.abs() > 1.0 {
                    return None;
                }
                let phi = (ca - cb).atan2(d - sa + sb);
                let p = mod2pi(2.0 * PI - tmp.acos());
                let t = mod2pi(alpha - phi + p / 2.0);
                Some([t, p, mod2pi(alpha - beta - t + p)])
            }
            DubinsWord::LRL => {
                let tmp = (6.0 - d_sq + 2.0 * c_ab + 2.0 * d * (sb - sa)) / 8.0;
                if tmp.abs() > 1.0 {
                    return None;
                }
                let phi = (ca - cb).atan2(d + sa - sb);
                let p = mod2pi(2.0 * PI - tmp.acos());
                let t = mod2pi(-alpha - phi + p / 2.0);
                Some([t, p, mod2pi(beta - alpha - t + p)])
            }
        }
    }
}

/// One primitive of a connection, in world coordinates
#[derive(Debug, Clone)]
pub struct PathSegment {
    pub kind: SegmentKind,
    pub start: Pose2D,
    pub end: Pose2D,
    /// Arc length [m]
    pub length: f64,
    /// Turning centre, `None` for straight segments
    pub center: Option<Point2D>,
    pub radius: f64,
}

impl PathSegment {
    fn new(start: Pose2D, kind: SegmentKind, length: f64, radius: f64) -> Self {
        let center = kind
            .turn_direction()
            .map(|direction| turning_center(&start, direction, radius));
        let mut segment = Self {
            kind,
            start,
            end: start,
            length,
            center,
            radius,
        };
        segment.end = segment.pose_at(length);
        segment
    }

    /// Pose after travelling `s` metres along the segment
    pub fn pose_at(&self, s: f64) -> Pose2D {
        let s = s.clamp(0.0, self.length);
        match (self.kind.turn_direction(), self.center) {
            (Some(direction), Some(center)) => {
                let yaw = self.start.yaw + direction.sign() * s / self.radius;
                pose_on_circle(&center, direction, self.radius, yaw)
            }
            _ => Pose2D::new(
                self.start.x + s * self.start.yaw.cos(),
                self.start.y + s * self.start.yaw.sin(),
                self.start.yaw,
            ),
        }
    }

    /// Poses every `step` metres (last one shortened), start excluded, end included
    pub fn interpolate(&self, step: f64) -> Vec<Pose2D> {
        let n = ((self.length / step).ceil() as usize).max(1);
        (1..=n)
            .map(|i| self.pose_at(self.length * i as f64 / n as f64))
            .collect()
    }
}

/// A complete connection of one word
#[derive(Debug, Clone)]
pub struct DubinsCandidate {
    /// `None` for the empty connection between coincident poses
    pub word: Option<DubinsWord>,
    pub start: Pose2D,
    pub segments: Vec<PathSegment>,
    /// Total arc length [m]
    pub length: f64,
}

impl DubinsCandidate {
    /// Connection of a pose to itself
    pub fn empty(start: Pose2D) -> Self {
        Self {
            word: None,
            start,
            segments: Vec::new(),
            length: 0.0,
        }
    }

    /// Primitive sequence after dropping zero-length segments, e.g. "LSR"
    pub fn label(&self) -> String {
        self.segments.iter().map(|s| s.kind.symbol()).collect()
    }

    pub fn end(&self) -> Pose2D {
        self.segments.last().map(|s| s.end).unwrap_or(self.start)
    }

    /// Pose after travelling `s` metres along the whole connection
    pub fn pose_at(&self, s: f64) -> Pose2D {
        let mut remaining = s.max(0.0);
        for seg in &self.segments {
            if remaining <= seg.length {
                return seg.pose_at(remaining);
            }
            remaining -= seg.length;
        }
        self.end()
    }
}

/// Dubins connections certified against a collision checker
pub struct DubinsPathSolver<C = Environment> {
    checker: Arc<C>,
    vehicle: VehicleModel,
    radius: f64,
    collision_step: f64,
}

impl<C: CollisionChecker> DubinsPathSolver<C> {
    /// `collision_step` is the arc-length spacing of footprint samples [m]
    pub fn new(checker: Arc<C>, vehicle: VehicleModel, collision_step: f64) -> RoboticsResult<Self> {
        if !(collision_step > 0.0) {
            return Err(RoboticsError::InvalidParameter(format!(
                "collision step must be positive, got {}",
                collision_step
            )));
        }
        let radius = vehicle.min_turning_radius();
        Ok(Self {
            checker,
            vehicle,
            radius,
            collision_step,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn collision_step(&self) -> f64 {
        self.collision_step
    }

    /// Every feasible Dubins connection from `start` to `goal`
    pub fn find_tangents(&self, start: &Pose2D, goal: &Pose2D) -> Vec<DubinsCandidate> {
        let start = start.normalized();
        let goal = goal.normalized();

        if start.coincides_with(&goal, COINCIDENT_TOLERANCE) {
            return vec![DubinsCandidate::empty(start)];
        }

        let inter = Intermediate::new(&start, &goal, self.radius);
        DubinsWord::ALL
            .iter()
            .filter_map(|&word| {
                let params = inter.params(word)?;
                Some(self.build_candidate(start, word, params))
            })
            .collect()
    }

    fn build_candidate(&self, start: Pose2D, word: DubinsWord, params: [f64; 3]) -> DubinsCandidate {
        let mut pose = start;
        let mut segments = Vec::with_capacity(3);
        for (kind, param) in word.kinds().iter().zip(params.iter()) {
            let length = param * self.radius;
            if length < MIN_SEGMENT_LENGTH {
                continue;
            }
            let segment = PathSegment::new(pose, *kind, length, self.radius);
            pose = segment.end;
            segments.push(segment);
        }
        let length = segments.iter().map(|s| s.length).sum();
        DubinsCandidate {
            word: Some(word),
            start,
            segments,
            length,
        }
    }

    /// Shortest candidate whose swept footprint is collision-free
    pub fn select_best(&self, candidates: &[DubinsCandidate]) -> Option<DubinsCandidate> {
        candidates
            .iter()
            .sorted_by(|a, b| a.length.total_cmp(&b.length))
            .find(|c| {
                let safe = self.is_candidate_safe(c);
                if !safe {
                    trace!("[Dubins] {} ({:.2} m) rejected: collision", c.label(), c.length);
                }
                safe
            })
            .cloned()
    }

    /// `select_best(find_tangents(start, goal))`
    pub fn shortest_safe(&self, start: &Pose2D, goal: &Pose2D) -> Option<DubinsCandidate> {
        let candidates = self.find_tangents(start, goal);
        self.select_best(&candidates)
    }

    pub fn is_candidate_safe(&self, candidate: &DubinsCandidate) -> bool {
        if candidate.segments.is_empty() {
            return self.is_pose_safe(&candidate.start);
        }
        candidate.segments.iter().all(|seg| {
            match (seg.kind.turn_direction(), seg.center) {
                (Some(direction), Some(center)) => {
                    self.is_arc_safe(&seg.start, direction, &center, seg.radius, seg.length / seg.radius)
                }
                _ => self.is_straight_segment_safe(&seg.start, &seg.end),
            }
        })
    }

    pub fn is_pose_safe(&self, pose: &Pose2D) -> bool {
        !self.checker.is_collision(&self.vehicle.footprint(pose))
    }

    /// Footprint sampled every `collision_step` along the line from `a` to `b`
    pub fn is_straight_segment_safe(&self, a: &Pose2D, b: &Pose2D) -> bool {
        let n = ((a.distance(b) / self.collision_step).ceil() as usize).max(1);
        (0..=n).all(|i| {
            let t = i as f64 / n as f64;
            let pose = Pose2D::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y), a.yaw);
            self.is_pose_safe(&pose)
        })
    }

    /// Footprint sampled every `collision_step` of arc length along the
    /// circle from `a` to `b`
    pub fn is_turning_segment_safe(
        &self,
        a: &Pose2D,
        b: &Pose2D,
        direction: TurnDirection,
        center: &Point2D,
        radius: f64,
    ) -> bool {
        let sweep = mod2pi(direction.sign() * (b.yaw - a.yaw));
        self.is_arc_safe(a, direction, center, radius, sweep)
    }

    fn is_arc_safe(
        &self,
        a: &Pose2D,
        direction: TurnDirection,
        center: &Point2D,
        radius: f64,
        sweep: f64,
    ) -> bool {
        let n = ((sweep * radius / self.collision_step).ceil() as usize).max(1);
        let d_yaw = sweep / n as f64;
        (0..=n).all(|i| {
            let yaw = a.yaw + direction.sign() * d_yaw * i as f64;
            self.is_pose_safe(&pose_on_circle(center, direction, radius, yaw))
        })
    }
}
