//! Hybrid A* planner
//!
//! Searches over continuous poses while using a discretized state
//! (cell, heading bucket) for duplicate detection. Each expansion drives one
//! arc under a sampled steering input; every arc is certified collision-free
//! with the Dubins solver's swept-footprint checks. Periodically the planner
//! tries a direct Dubins connection to the goal and stops at the first one that
//! is collision-free, after comparing it against the best few open nodes.
//!
//! Reference: Dolgov, D., Thrun, S., Montemerlo, M., & Diebel, J. (2008).
//! "Practical Search Techniques in Path Planning for Autonomous Driving"

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::f64::consts::{PI, SQRT_2};
use std::sync::Arc;

use log::{debug, info, trace, warn};
use ordered_float::OrderedFloat;

use crate::common::{mod2pi, MotionModel, Path2D, Point2D, Pose2D, RoboticsError, RoboticsResult};
use crate::utils::{Environment, GridMap};

use super::dubins_path::{DubinsCandidate, DubinsPathSolver, COINCIDENT_TOLERANCE};
use super::grid_search::GridSearch;
use super::vehicle_model::VehicleModel;

/// Heuristic used to order the open set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicMode {
    /// Euclidean distance to the goal
    StraightLine,
    /// Blend of the grid search distance and the Euclidean distance
    GridSearch,
}

/// Configuration for the Hybrid A* planner
#[derive(Debug, Clone)]
pub struct HybridAStarConfig {
    /// Grid cell size [m]
    pub cell_size: f64,
    /// Number of heading buckets over a full turn
    pub heading_buckets: usize,
    /// Integration step of the vehicle model [m]
    pub dt: f64,
    /// Try a direct Dubins shot every this many iterations
    pub shortcut_interval: usize,
    /// Number of best open nodes compared against the first valid shot
    pub refinement_window: usize,
    /// Weight of the grid search distance (w1)
    pub grid_heuristic_weight: f64,
    /// Weight of the Euclidean distance in grid search mode (w2)
    pub euclidean_weight: f64,
    /// Extra cost per metre when the steering input changes (w3)
    pub steer_change_weight: f64,
    /// Extra cost per metre while turning (w4)
    pub turning_weight: f64,
    /// Arc-length spacing of footprint collision samples [m]
    pub collision_step: f64,
    /// Stop after this many iterations, `None` for an exhaustive search
    pub max_iterations: Option<usize>,
}

impl Default for HybridAStarConfig {
    fn default() -> Self {
        Self {
            cell_size: GridMap::DEFAULT_CELL_SIZE,
            heading_buckets: 24,
            dt: 1e-2,
            shortcut_interval: 1,
            refinement_window: 10,
            grid_heuristic_weight: 0.95,
            euclidean_weight: 0.05,
            steer_change_weight: 0.40,
            turning_weight: 0.20,
            collision_step: 0.05,
            max_iterations: None,
        }
    }
}

impl HybridAStarConfig {
    fn validate(&self) -> RoboticsResult<()> {
        let invalid = |msg: String| Err(RoboticsError::InvalidParameter(msg));
        if !(self.cell_size > 0.0) {
            return invalid(format!("cell size must be positive, got {}", self.cell_size));
        }
        if !(self.dt > 0.0) {
            return invalid(format!("dt must be positive, got {}", self.dt));
        }
        if self.heading_buckets == 0 {
            return invalid("heading_buckets must be at least 1".to_string());
        }
        if self.shortcut_interval == 0 {
            return invalid("shortcut_interval must be at least 1".to_string());
        }
        let weights = [
            self.grid_heuristic_weight,
            self.euclidean_weight,
            self.steer_change_weight,
            self.turning_weight,
        ];
        if weights.iter().any(|w| !(*w >= 0.0)) {
            return invalid(format!("heuristic and cost weights must be non-negative, got {:?}", weights));
        }
        Ok(())
    }
}

/// Search identity of a pose: equality and hashing use only this triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscreteState {
    pub cell_x: i32,
    pub cell_y: i32,
    pub heading_bucket: usize,
}

/// Node of the search tree, stored in a per-search arena
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub pose: Pose2D,
    pub state: DiscreteState,
    /// Accumulated search cost, penalties included
    pub g: f64,
    /// Accumulated physical arc length [m]
    pub arc_length: f64,
    pub f: f64,
    /// Steering input that produced this node
    pub steer: f64,
    pub parent: Option<usize>,
    /// Sub-trajectory from the parent, diagnostics only
    pub branch: Vec<Point2D>,
}

/// Pose paired with the steering input used to reach it
#[derive(Debug, Clone, Copy)]
pub struct Waypoint {
    pub pose: Pose2D,
    pub steer: f64,
}

/// Final trajectory
#[derive(Debug, Clone)]
pub struct HybridPath {
    /// One entry per search arc and per Dubins segment
    pub route: Vec<Waypoint>,
    /// The route re-sampled every `dt` metres, starting at the start pose
    pub waypoints: Vec<Waypoint>,
    /// Arc length covered by the tree search [m]
    pub search_length: f64,
    /// The closing Dubins connection
    pub shortcut: DubinsCandidate,
}

impl HybridPath {
    pub fn total_length(&self) -> f64 {
        self.search_length + self.shortcut.length
    }

    pub fn shortcut_length(&self) -> f64 {
        self.shortcut.length
    }

    pub fn to_path2d(&self) -> Path2D {
        Path2D::from_points(self.waypoints.iter().map(|w| w.pose.position()).collect())
    }
}

/// Sub-trajectory of an expanded node, for plotting the search tree
#[derive(Debug, Clone)]
pub struct ExploredBranch {
    pub pose: Pose2D,
    pub points: Vec<Point2D>,
}

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Found(HybridPath),
    /// Open set exhausted without a collision-free shot to the goal
    NoPath,
    /// `max_iterations` reached before the search finished
    BudgetExhausted { iterations: usize },
}

#[derive(Debug, Clone)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub iterations: usize,
    /// One entry per closed node
    pub explored: Vec<ExploredBranch>,
}

impl SearchReport {
    pub fn path(&self) -> Option<&HybridPath> {
        match &self.outcome {
            SearchOutcome::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn into_result(self) -> RoboticsResult<HybridPath> {
        match self.outcome {
            SearchOutcome::Found(path) => Ok(path),
            SearchOutcome::NoPath => Err(RoboticsError::PlanningError(format!(
                "No path found after {} iterations",
                self.iterations
            ))),
            SearchOutcome::BudgetExhausted { iterations } => Err(RoboticsError::PlanningError(
                format!("No path within the budget of {} iterations", iterations),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Inserted,
    Replaced,
    RejectedClosed,
    RejectedWorse,
}

/// Open set: min-heap on (f, arena index) with lazy deletion, plus the index
/// of the live node for every open DiscreteState
struct OpenSet {
    heap: BinaryHeap<Reverse<(OrderedFloat<f64>, usize)>>,
    entries: HashMap<DiscreteState, usize>,
}

impl OpenSet {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            entries: HashMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, index: usize, nodes: &[SearchNode]) {
        let node = &nodes[index];
        self.entries.insert(node.state, index);
        self.heap.push(Reverse((OrderedFloat(node.f), index)));
    }

    fn admission(
        &self,
        node: &SearchNode,
        nodes: &[SearchNode],
        closed: &HashSet<DiscreteState>,
    ) -> Admission {
        if closed.contains(&node.state) {
            return Admission::RejectedClosed;
        }
        match self.entries.get(&node.state) {
            None => Admission::Inserted,
            Some(&existing) if nodes[existing].g <= node.g => Admission::RejectedWorse,
            Some(_) => Admission::Replaced,
        }
    }

    /// Lowest f; ties go to the node inserted first
    fn pop(&mut self, nodes: &[SearchNode]) -> Option<usize> {
        while let Some(Reverse((_, index))) = self.heap.pop() {
            let state = nodes[index].state;
            if self.entries.get(&state) == Some(&index) {
                self.entries.remove(&state);
                return Some(index);
            }
        }
        None
    }

    /// Up to `n` lowest-f nodes, left in the set
    fn best(&mut self, n: usize, nodes: &[SearchNode]) -> Vec<usize> {
        let picked: Vec<usize> = (0..n).map_while(|_| self.pop(nodes)).collect();
        for &index in &picked {
            self.push(index, nodes);
        }
        picked
    }

    fn remove(&mut self, state: &DiscreteState) {
        self.entries.remove(state);
    }
}

/// Hybrid A* planner for a fixed start, goal and workspace
pub struct HybridAStarPlanner {
    env: Arc<Environment>,
    grid: Arc<GridMap>,
    vehicle: VehicleModel,
    solver: DubinsPathSolver,
    grid_search: GridSearch,
    config: HybridAStarConfig,
    start: Pose2D,
    goal: Pose2D,
    /// Vehicle model steps per arc
    drive_steps: usize,
    /// Length of one arc [m]
    arc: f64,
    heading_resolution: f64,
}

impl HybridAStarPlanner {
    pub fn new(
        env: Arc<Environment>,
        vehicle: VehicleModel,
        start: Pose2D,
        goal: Pose2D,
        config: HybridAStarConfig,
    ) -> RoboticsResult<Self> {
        config.validate()?;
        let grid = Arc::new(GridMap::new(&env, config.cell_size)?);
        let solver = DubinsPathSolver::new(env.clone(), vehicle.clone(), config.collision_step)?;

        let start = start.normalized();
        let goal = goal.normalized();
        if !solver.is_pose_safe(&start) {
            return Err(RoboticsError::InvalidParameter(format!(
                "start pose {:?} is in collision",
                start
            )));
        }
        if !solver.is_pose_safe(&goal) {
            return Err(RoboticsError::InvalidParameter(format!(
                "goal pose {:?} is in collision",
                goal
            )));
        }

        // One arc is slightly longer than a cell diagonal, so every child
        // leaves its parent's cell
        let drive_steps = (SQRT_2 * config.cell_size / config.dt).floor() as usize + 1;
        let arc = drive_steps as f64 * config.dt;
        let heading_resolution = 2.0 * PI / config.heading_buckets as f64;
        let grid_search = GridSearch::new(grid.clone(), &goal.position());

        debug!(
            "[HybridA*] grid {}x{}, arc {:.3} m ({} steps), turning radius {:.3} m",
            grid.x_width,
            grid.y_width,
            arc,
            drive_steps,
            solver.radius()
        );

        Ok(Self {
            env,
            grid,
            vehicle,
            solver,
            grid_search,
            config,
            start,
            goal,
            drive_steps,
            arc,
            heading_resolution,
        })
    }

    pub fn with_defaults(env: Arc<Environment>, start: Pose2D, goal: Pose2D) -> RoboticsResult<Self> {
        Self::new(env, VehicleModel::with_defaults(), start, goal, HybridAStarConfig::default())
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn vehicle(&self) -> &VehicleModel {
        &self.vehicle
    }

    pub fn config(&self) -> &HybridAStarConfig {
        &self.config
    }

    pub fn start(&self) -> Pose2D {
        self.start
    }

    pub fn goal(&self) -> Pose2D {
        self.goal
    }

    /// Length of one expansion arc [m]
    pub fn arc_length(&self) -> f64 {
        self.arc
    }

    pub fn drive_steps(&self) -> usize {
        self.drive_steps
    }

    pub fn discretize(&self, pose: &Pose2D) -> DiscreteState {
        let cell = self.grid.to_cell_id(&pose.position());
        let bucket = (mod2pi(pose.yaw) / self.heading_resolution).round() as usize
            % self.config.heading_buckets;
        DiscreteState {
            cell_x: cell.x,
            cell_y: cell.y,
            heading_bucket: bucket,
        }
    }

    fn heuristic(&mut self, pose: &Pose2D, mode: HeuristicMode) -> f64 {
        let euclidean = pose.distance(&self.goal);
        match mode {
            HeuristicMode::StraightLine => euclidean,
            HeuristicMode::GridSearch => {
                let cells = self.grid_search.distance_to_goal(&pose.position());
                self.config.grid_heuristic_weight * cells * self.config.cell_size
                    + self.config.euclidean_weight * euclidean
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn make_node(
        &mut self,
        pose: Pose2D,
        g: f64,
        arc_length: f64,
        steer: f64,
        parent: Option<usize>,
        branch: Vec<Point2D>,
        mode: HeuristicMode,
    ) -> SearchNode {
        let f = g + self.heuristic(&pose, mode);
        SearchNode {
            pose,
            state: self.discretize(&pose),
            g,
            arc_length,
            f,
            steer,
            parent,
            branch,
        }
    }

    /// Collision-free children of `nodes[index]`, one per steering input
    fn expand(
        &mut self,
        index: usize,
        nodes: &[SearchNode],
        mode: HeuristicMode,
        extra_cost: bool,
    ) -> Vec<SearchNode> {
        let parent = &nodes[index];
        let mut children = Vec::with_capacity(3);

        for phi in self.vehicle.steering_inputs() {
            let mut pose = parent.pose;
            let mut branch = Vec::with_capacity(self.drive_steps + 1);
            branch.push(pose.position());
            for _ in 0..self.drive_steps {
                pose = self.vehicle.propagate(&pose, &phi, self.config.dt);
                branch.push(pose.position());
            }

            // Checked on the exact turning circle; the integrated end pose
            // stays within about a millimetre of it
            let safe = match self.vehicle.turning_params(&parent.pose, phi) {
                None => self.solver.is_straight_segment_safe(&parent.pose, &pose),
                Some(turn) => self.solver.is_turning_segment_safe(
                    &parent.pose,
                    &pose,
                    turn.direction,
                    &turn.center,
                    turn.radius,
                ),
            };
            if !safe {
                trace!("[HybridA*] arc with steer {:.3} from {:?} collides", phi, parent.pose);
                continue;
            }

            let mut g = parent.g + self.arc;
            if extra_cost {
                if phi != parent.steer {
                    g += self.config.steer_change_weight * self.arc;
                }
                if phi != 0.0 {
                    g += self.config.turning_weight * self.arc;
                }
            }
            let arc_length = parent.arc_length + self.arc;
            children.push(self.make_node(pose, g, arc_length, phi, Some(index), branch, mode));
        }

        children
    }

    /// Among the first valid shot and the shots from the best open nodes, the
    /// one with the shortest total length
    fn refine_final_shot(
        &self,
        current: usize,
        shot: DubinsCandidate,
        open: &mut OpenSet,
        nodes: &[SearchNode],
    ) -> (usize, DubinsCandidate) {
        let mut best = current;
        let mut best_total = shot.length + nodes[current].arc_length;
        let mut best_shot = shot;

        for index in open.best(self.config.refinement_window, nodes) {
            let node = &nodes[index];
            if let Some(candidate) = self.solver.shortest_safe(&node.pose, &self.goal) {
                let total = candidate.length + node.arc_length;
                if total < best_total {
                    best = index;
                    best_total = total;
                    best_shot = candidate;
                }
            }
        }

        (best, best_shot)
    }

    /// Refine the first valid shot and move the chosen node from Open to Closed
    fn accept_final_shot(
        &self,
        current: usize,
        shot: DubinsCandidate,
        open: &mut OpenSet,
        closed: &mut HashSet<DiscreteState>,
        closed_order: &mut Vec<usize>,
        nodes: &[SearchNode],
    ) -> (usize, DubinsCandidate) {
        let (best, shot) = self.refine_final_shot(current, shot, open, nodes);
        if best != current {
            trace!(
                "[HybridA*] open node {} gives a shorter total than node {}",
                best,
                current
            );
            open.remove(&nodes[best].state);
            closed.insert(nodes[best].state);
            closed_order.push(best);
        }
        (best, shot)
    }

    /// Run the search
    pub fn search_path(&mut self, mode: HeuristicMode, extra_cost: bool) -> SearchReport {
        let mut nodes: Vec<SearchNode> = Vec::new();
        let mut open = OpenSet::new();
        let mut closed: HashSet<DiscreteState> = HashSet::new();
        let mut closed_order: Vec<usize> = Vec::new();

        let root = self.make_node(self.start, 0.0, 0.0, 0.0, None, Vec::new(), mode);
        nodes.push(root);

        if self.start.coincides_with(&self.goal, COINCIDENT_TOLERANCE) {
            info!("[HybridA*] start and goal coincide");
            let shot = DubinsCandidate::empty(self.start);
            return SearchReport {
                outcome: SearchOutcome::Found(self.build_path(0, shot, &nodes)),
                iterations: 0,
                explored: Vec::new(),
            };
        }

        open.push(0, &nodes);
        let mut iterations = 0;

        loop {
            if open.is_empty() {
                break;
            }
            if let Some(max) = self.config.max_iterations {
                if iterations >= max {
                    warn!("[HybridA*] iteration budget of {} exhausted", max);
                    return SearchReport {
                        outcome: SearchOutcome::BudgetExhausted { iterations },
                        iterations,
                        explored: Self::explored(&closed_order, &nodes),
                    };
                }
            }

            let Some(current) = open.pop(&nodes) else {
                break;
            };
            iterations += 1;
            closed.insert(nodes[current].state);
            closed_order.push(current);

            if iterations % 100 == 0 {
                debug!(
                    "[HybridA*] Iteration: {}, Open set size: {}, Closed set size: {}",
                    iterations,
                    open.len(),
                    closed.len()
                );
            }

            if iterations % self.config.shortcut_interval == 0 {
                if let Some(shot) = self.solver.shortest_safe(&nodes[current].pose, &self.goal) {
                    let (best, shot) = self.accept_final_shot(
                        current,
                        shot,
                        &mut open,
                        &mut closed,
                        &mut closed_order,
                        &nodes,
                    );
                    let path = self.build_path(best, shot, &nodes);
                    info!(
                        "[HybridA*] Find goal after {} iterations! path length {:.2} m ({} closing)",
                        iterations,
                        path.total_length(),
                        path.shortcut.label()
                    );
                    return SearchReport {
                        outcome: SearchOutcome::Found(path),
                        iterations,
                        explored: Self::explored(&closed_order, &nodes),
                    };
                }
            }

            for child in self.expand(current, &nodes, mode, extra_cost) {
                match open.admission(&child, &nodes, &closed) {
                    Admission::Inserted | Admission::Replaced => {
                        nodes.push(child);
                        open.push(nodes.len() - 1, &nodes);
                    }
                    Admission::RejectedClosed | Admission::RejectedWorse => {}
                }
            }
        }

        warn!("[HybridA*] Open set is empty after {} iterations", iterations);
        SearchReport {
            outcome: SearchOutcome::NoPath,
            iterations,
            explored: Self::explored(&closed_order, &nodes),
        }
    }

    fn explored(closed_order: &[usize], nodes: &[SearchNode]) -> Vec<ExploredBranch> {
        closed_order
            .iter()
            .map(|&i| ExploredBranch {
                pose: nodes[i].pose,
                points: nodes[i].branch.clone(),
            })
            .collect()
    }

    /// Backtrack from `terminal`, append the Dubins shot and re-sample
    fn build_path(&self, terminal: usize, shot: DubinsCandidate, nodes: &[SearchNode]) -> HybridPath {
        let mut chain = Vec::new();
        let mut cursor = Some(terminal);
        while let Some(index) = cursor {
            chain.push(index);
            cursor = nodes[index].parent;
        }
        chain.reverse();

        let mut route = Vec::new();
        let mut waypoints = vec![Waypoint {
            pose: self.start,
            steer: 0.0,
        }];

        // Replay every arc exactly as it was expanded
        for pair in chain.windows(2) {
            let (parent, node) = (&nodes[pair[0]], &nodes[pair[1]]);
            let mut pose = parent.pose;
            for _ in 0..self.drive_steps {
                pose = self.vehicle.propagate(&pose, &node.steer, self.config.dt);
                waypoints.push(Waypoint {
                    pose,
                    steer: node.steer,
                });
            }
            route.push(Waypoint {
                pose: node.pose,
                steer: node.steer,
            });
        }

        let max_steer = self.vehicle.max_steer();
        for segment in &shot.segments {
            let steer = segment.kind.steering(max_steer);
            waypoints.extend(
                segment
                    .interpolate(self.config.dt)
                    .into_iter()
                    .map(|pose| Waypoint { pose, steer }),
            );
            route.push(Waypoint {
                pose: segment.end,
                steer,
            });
        }

        HybridPath {
            route,
            waypoints,
            search_length: nodes[terminal].arc_length,
            shortcut: shot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CollisionChecker, Obstacle};

    fn planner(obstacles: Vec<Obstacle>, start: Pose2D, goal: Pose2D) -> HybridAStarPlanner {
        let env = Arc::new(Environment::new(10.0, 10.0, obstacles).unwrap());
        HybridAStarPlanner::with_defaults(env, start, goal).unwrap()
    }

    fn root(p: &mut HybridAStarPlanner, mode: HeuristicMode) -> SearchNode {
        let start = p.start();
        p.make_node(start, 0.0, 0.0, 0.0, None, Vec::new(), mode)
    }

    fn assert_collision_free(env: &Environment, vehicle: &VehicleModel, path: &HybridPath) {
        for w in &path.waypoints {
            assert!(
                !env.is_collision(&vehicle.footprint(&w.pose)),
                "waypoint {:?} collides",
                w.pose
            );
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let env = Arc::new(Environment::new(10.0, 10.0, vec![]).unwrap());
        let start = Pose2D::new(1.0, 1.0, 0.0);
        let goal = Pose2D::new(8.0, 8.0, 0.0);

        for config in [
            HybridAStarConfig { cell_size: 0.0, ..Default::default() },
            HybridAStarConfig { heading_buckets: 0, ..Default::default() },
            HybridAStarConfig { shortcut_interval: 0, ..Default::default() },
            HybridAStarConfig { turning_weight: -1.0, ..Default::default() },
            HybridAStarConfig { collision_step: 0.0, ..Default::default() },
        ] {
            let result = HybridAStarPlanner::new(env.clone(), VehicleModel::with_defaults(), start, goal, config);
            assert!(matches!(result, Err(RoboticsError::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_rejects_start_in_collision() {
        let env = Arc::new(Environment::new(10.0, 10.0, vec![Obstacle::new(0.5, 0.5, 1.0, 1.0)]).unwrap());
        let result = HybridAStarPlanner::with_defaults(env, Pose2D::new(1.0, 1.0, 0.0), Pose2D::new(8.0, 8.0, 0.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_arc_is_longer_than_cell_diagonal() {
        let p = planner(vec![], Pose2D::new(1.0, 1.0, 0.0), Pose2D::new(8.0, 8.0, 0.0));
        assert_eq!(p.drive_steps(), 15);
        assert!(p.arc_length() > SQRT_2 * p.config().cell_size);
        let last_bucket = p.discretize(&Pose2D::new(1.0, 1.0, 2.0 * PI - PI / 12.0));
        assert_eq!(last_bucket.heading_bucket, 23);
        let wrapped = p.discretize(&Pose2D::new(1.0, 1.0, 2.0 * PI - 1e-3));
        assert_eq!(wrapped.heading_bucket, 0);
    }

    #[test]
    fn test_same_cell_and_bucket_share_state() {
        let p = planner(vec![], Pose2D::new(1.0, 1.0, 0.0), Pose2D::new(8.0, 8.0, 0.0));
        let a = p.discretize(&Pose2D::new(2.01, 3.02, 0.01));
        let b = p.discretize(&Pose2D::new(2.09, 3.08, 2.0 * PI - 0.01));
        let c = p.discretize(&Pose2D::new(2.01, 3.02, PI / 12.0));
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_child_arc_length_increments_by_one_arc() {
        let mut p = planner(vec![], Pose2D::new(5.0, 5.0, 0.0), Pose2D::new(8.0, 8.0, 0.0));
        let arc = p.arc_length();

        for extra in [false, true] {
            let nodes = vec![root(&mut p, HeuristicMode::GridSearch)];
            let children = p.expand(0, &nodes, HeuristicMode::GridSearch, extra);
            assert_eq!(children.len(), 3);

            let chain = [nodes[0].clone(), children[1].clone()];
            let grandchildren = p.expand(1, &chain, HeuristicMode::GridSearch, extra);
            assert_eq!(grandchildren.len(), 3);
            for gc in &grandchildren {
                assert!((gc.arc_length - 2.0 * arc).abs() < 1e-12);
                assert_eq!(gc.parent, Some(1));
            }

            for child in &children {
                assert_eq!(child.arc_length, nodes[0].arc_length + arc);
                assert!(child.g >= child.arc_length);
                assert!(child.f >= child.g);
                assert_eq!(child.parent, Some(0));
                assert_eq!(child.branch.len(), p.drive_steps() + 1);
            }

            if extra {
                // Straight child keeps the root's steering; turning children pay both penalties
                let straight = children.iter().find(|c| c.steer == 0.0).unwrap();
                assert!((straight.g - arc).abs() < 1e-12);
                let left = children.iter().find(|c| c.steer > 0.0).unwrap();
                assert!((left.g - arc * (1.0 + 0.4 + 0.2)).abs() < 1e-12);
            } else {
                assert!(children.iter().all(|c| c.g == arc));
            }
        }
    }

    #[test]
    fn test_blocked_arcs_are_discarded() {
        // Wall right in front of the start
        let mut p = planner(
            vec![Obstacle::new(1.7, 0.0, 0.2, 10.0)],
            Pose2D::new(1.0, 5.0, 0.0),
            Pose2D::new(8.0, 5.0, 0.0),
        );
        let nodes = vec![root(&mut p, HeuristicMode::StraightLine)];
        assert!(p.expand(0, &nodes, HeuristicMode::StraightLine, false).is_empty());
    }

    #[test]
    fn test_open_set_admission() {
        let mut p = planner(vec![], Pose2D::new(5.0, 5.0, 0.0), Pose2D::new(8.0, 8.0, 0.0));
        let mut nodes = vec![root(&mut p, HeuristicMode::StraightLine)];
        let mut open = OpenSet::new();
        let mut closed = HashSet::new();

        let child = p.expand(0, &nodes, HeuristicMode::StraightLine, false).remove(1);
        assert_eq!(open.admission(&child, &nodes, &closed), Admission::Inserted);
        nodes.push(child.clone());
        open.push(1, &nodes);

        let mut worse = child.clone();
        worse.g += 1.0;
        worse.f += 1.0;
        assert_eq!(open.admission(&worse, &nodes, &closed), Admission::RejectedWorse);

        let mut equal = child.clone();
        equal.pose.x += 0.01;
        assert_eq!(open.admission(&equal, &nodes, &closed), Admission::RejectedWorse);

        let mut better = child.clone();
        better.g -= 0.05;
        better.f -= 0.05;
        assert_eq!(open.admission(&better, &nodes, &closed), Admission::Replaced);
        nodes.push(better);
        open.push(2, &nodes);
        assert_eq!(open.len(), 1);
        assert_eq!(open.pop(&nodes), Some(2));
        assert_eq!(open.pop(&nodes), None);

        // Once closed, even a cheaper duplicate is discarded
        closed.insert(child.state);
        let mut cheaper = child;
        cheaper.g = 0.0;
        assert_eq!(open.admission(&cheaper, &nodes, &closed), Admission::RejectedClosed);
    }

    #[test]
    fn test_open_set_best_keeps_nodes() {
        let mut p = planner(vec![], Pose2D::new(5.0, 5.0, 0.0), Pose2D::new(8.0, 8.0, 0.0));
        let mut nodes = vec![root(&mut p, HeuristicMode::StraightLine)];
        let children = p.expand(0, &nodes, HeuristicMode::StraightLine, false);
        let mut open = OpenSet::new();
        for child in children {
            nodes.push(child);
            open.push(nodes.len() - 1, &nodes);
        }

        let best = open.best(2, &nodes);
        assert_eq!(best.len(), 2);
        assert!(nodes[best[0]].f <= nodes[best[1]].f);
        assert_eq!(open.len(), 3);
        assert_eq!(open.best(10, &nodes).len(), 3);
        assert_eq!(open.pop(&nodes), Some(best[0]));
    }

    #[test]
    fn test_scenario_a_direct_shot_turns_towards_goal_and_back() {
        let start = Pose2D::new(1.0, 1.0, 0.0);
        let goal = Pose2D::new(8.0, 8.0, 0.0);
        let mut p = planner(vec![], start, goal);

        let report = p.search_path(HeuristicMode::GridSearch, false);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.explored.len(), 1);

        let path = report.path().unwrap();
        assert_eq!(path.search_length, 0.0);
        // Aligned headings with a lateral offset: turn towards the goal,
        // drive straight, turn back
        assert_eq!(path.shortcut.label(), "LSR");
        assert_eq!(path.route.len(), path.shortcut.segments.len());
        let euclid = start.distance(&goal);
        assert!(path.total_length() >= euclid);
        assert!(path.total_length() < euclid + 1.5);
        assert_collision_free(p.environment(), p.vehicle(), path);

        let last = path.waypoints.last().unwrap().pose;
        assert!(last.distance(&goal) < 1e-6);
    }

    #[test]
    fn test_aligned_straight_path_matches_euclidean() {
        let start = Pose2D::new(1.0, 5.0, 0.0);
        let goal = Pose2D::new(8.0, 5.0, 0.0);
        let mut p = planner(vec![], start, goal);

        let path = p.search_path(HeuristicMode::StraightLine, false).into_result().unwrap();
        assert!((path.total_length() - 7.0).abs() < 1e-6);
        assert!((path.to_path2d().total_length() - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_scenario_b_routes_around_obstacle() {
        let obstacle = Obstacle::new(4.5, 4.0, 1.0, 2.0);
        let start = Pose2D::new(1.0, 5.0, 0.0);
        let goal = Pose2D::new(9.0, 5.0, 0.0);

        // The margin covers the sweep between two collision samples, so the
        // path can be verified against the bare obstacle at every waypoint
        let env = Arc::new(
            Environment::new(10.0, 10.0, vec![obstacle])
                .unwrap()
                .with_safety_margin(0.1)
                .unwrap(),
        );
        let config = HybridAStarConfig {
            max_iterations: Some(50_000),
            ..Default::default()
        };
        let mut p = HybridAStarPlanner::new(env, VehicleModel::with_defaults(), start, goal, config).unwrap();

        let report = p.search_path(HeuristicMode::GridSearch, false);
        assert!(report.iterations > 1);
        let path = report.path().unwrap();
        assert!(path.total_length() > start.distance(&goal));

        let bare = Environment::new(10.0, 10.0, vec![obstacle]).unwrap();
        assert_collision_free(&bare, p.vehicle(), path);

        // Fixed-step re-sampling
        for pair in path.waypoints.windows(2) {
            assert!(pair[0].pose.distance(&pair[1].pose) <= p.config().dt + 1e-9);
        }

        // Parent chain: costs grow along the route
        assert!(path.search_length > 0.0);
        let n_arcs = (path.search_length / p.arc_length()).round() as usize;
        assert_eq!(path.route.len(), n_arcs + path.shortcut.segments.len());

        // Cells behind the obstacle are farther than the straight line
        let grid = Arc::new(GridMap::new(&bare, 0.1).unwrap());
        let mut gs = GridSearch::new(grid, &goal.position());
        let behind = Point2D::new(3.0, 5.0);
        assert!(gs.distance_to_goal(&behind) * 0.1 > behind.distance(&goal.position()) + 0.1);
    }

    #[test]
    fn test_extra_cost_mode_finds_path() {
        let mut p = planner(
            vec![Obstacle::new(4.5, 4.0, 1.0, 2.0)],
            Pose2D::new(1.0, 5.0, 0.0),
            Pose2D::new(9.0, 5.0, 0.0),
        );
        let report = p.search_path(HeuristicMode::GridSearch, true);
        assert!(report.path().is_some());
    }

    #[test]
    fn test_scenario_c_start_equals_goal() {
        let pose = Pose2D::new(3.0, 3.0, 1.0);
        let mut p = planner(vec![], pose, pose);
        let report = p.search_path(HeuristicMode::GridSearch, false);
        let path = report.into_result().unwrap();
        assert_eq!(path.total_length(), 0.0);
        assert!(path.route.is_empty());
        assert_eq!(path.waypoints.len(), 1);
    }

    fn enclosed_goal_planner(max_iterations: Option<usize>) -> HybridAStarPlanner {
        let walls = vec![
            Obstacle::new(2.2, 2.5, 1.7, 0.05),
            Obstacle::new(2.2, 3.45, 1.7, 0.05),
            Obstacle::new(2.2, 2.5, 0.05, 1.0),
            Obstacle::new(3.85, 2.5, 0.05, 1.0),
        ];
        let env = Arc::new(Environment::new(4.0, 4.0, walls).unwrap());
        let config = HybridAStarConfig {
            cell_size: 0.25,
            shortcut_interval: 10,
            max_iterations,
            ..Default::default()
        };
        HybridAStarPlanner::new(
            env,
            VehicleModel::with_defaults(),
            Pose2D::new(0.8, 0.8, 0.0),
            Pose2D::new(3.0, 3.0, 0.0),
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_scenario_d_enclosed_goal() {
        let mut p = enclosed_goal_planner(None);
        let report = p.search_path(HeuristicMode::GridSearch, false);
        assert!(matches!(report.outcome, SearchOutcome::NoPath));
        assert!(report.iterations > 1);
        assert_eq!(report.explored.len(), report.iterations);

        // Every closed state is distinct
        let states: HashSet<DiscreteState> = report.explored.iter().map(|b| p.discretize(&b.pose)).collect();
        assert_eq!(states.len(), report.iterations);

        assert!(matches!(report.into_result(), Err(RoboticsError::PlanningError(_))));
    }

    #[test]
    fn test_iteration_budget() {
        let config = HybridAStarConfig {
            max_iterations: Some(3),
            ..Default::default()
        };
        let env = Arc::new(Environment::new(10.0, 10.0, vec![Obstacle::new(4.5, 4.0, 1.0, 2.0)]).unwrap());
        let mut p = HybridAStarPlanner::new(
            env,
            VehicleModel::with_defaults(),
            Pose2D::new(1.0, 5.0, 0.0),
            Pose2D::new(9.0, 5.0, 0.0),
            config,
        )
        .unwrap();

        let report = p.search_path(HeuristicMode::GridSearch, false);
        assert!(matches!(report.outcome, SearchOutcome::BudgetExhausted { iterations: 3 }));
        assert!(report.into_result().is_err());
    }

    #[test]
    fn test_budget_matching_exhaustive_search_reports_no_path() {
        let unlimited = enclosed_goal_planner(None).search_path(HeuristicMode::GridSearch, false);
        assert!(matches!(unlimited.outcome, SearchOutcome::NoPath));
        let n = unlimited.iterations;

        // Open runs dry on the last allowed iteration
        let exact = enclosed_goal_planner(Some(n)).search_path(HeuristicMode::GridSearch, false);
        assert!(matches!(exact.outcome, SearchOutcome::NoPath));
        assert_eq!(exact.iterations, n);

        let short = enclosed_goal_planner(Some(n - 1)).search_path(HeuristicMode::GridSearch, false);
        assert!(matches!(short.outcome, SearchOutcome::BudgetExhausted { iterations } if iterations == n - 1));
    }

    #[test]
    fn test_final_shot_moves_to_open_node_with_shorter_total() {
        let mode = HeuristicMode::StraightLine;
        let mut p = planner(vec![], Pose2D::new(1.0, 5.0, 0.0), Pose2D::new(8.0, 5.0, 0.0));

        // Totals (arc so far + straight shot): 5 + 7, 3 + 6.5, 1 + 6
        let mut current = root(&mut p, mode);
        current.arc_length = 5.0;
        let mut detour = p.make_node(Pose2D::new(1.5, 5.0, 0.0), 3.0, 3.0, 0.0, Some(0), Vec::new(), mode);
        detour.f = 1.0;
        let mut shorter = p.make_node(Pose2D::new(2.0, 5.0, 0.0), 1.0, 1.0, 0.0, Some(0), Vec::new(), mode);
        shorter.f = 100.0;
        let nodes = vec![current, detour, shorter];

        let mut open = OpenSet::new();
        open.push(1, &nodes);
        open.push(2, &nodes);
        let mut closed: HashSet<DiscreteState> = [nodes[0].state].into_iter().collect();
        let mut closed_order = vec![0];

        let shot = p.solver.shortest_safe(&nodes[0].pose, &p.goal()).unwrap();
        assert!((shot.length - 7.0).abs() < 1e-9);

        let (best, shot) = p.accept_final_shot(0, shot, &mut open, &mut closed, &mut closed_order, &nodes);
        assert_eq!(best, 2);
        assert!((shot.length - 6.0).abs() < 1e-9);
        assert!((shot.start.x - 2.0).abs() < 1e-12);

        // The chosen node left Open for Closed; the other one is still open
        assert!(closed.contains(&nodes[2].state));
        assert_eq!(closed_order, vec![0, 2]);
        assert_eq!(open.len(), 1);
        assert_eq!(open.pop(&nodes), Some(1));

        let path = p.build_path(best, shot, &nodes);
        assert!((path.total_length() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_final_shot_keeps_current_node_on_equal_total() {
        let mode = HeuristicMode::StraightLine;
        let mut p = planner(vec![], Pose2D::new(1.0, 5.0, 0.0), Pose2D::new(8.0, 5.0, 0.0));

        let current = root(&mut p, mode);
        let mut twin = root(&mut p, mode);
        twin.f = 0.0;
        let nodes = vec![current, twin];

        let mut open = OpenSet::new();
        open.push(1, &nodes);
        let mut closed: HashSet<DiscreteState> = HashSet::new();
        let mut closed_order = vec![0];

        let shot = p.solver.shortest_safe(&nodes[0].pose, &p.goal()).unwrap();
        let (best, _) = p.accept_final_shot(0, shot, &mut open, &mut closed, &mut closed_order, &nodes);
        assert_eq!(best, 0);
        assert!(closed.is_empty());
        assert_eq!(closed_order, vec![0]);
        assert_eq!(open.len(), 1);
    }

    #[test]
    fn test_shot_only_tried_every_k_iterations() {
        let env = Arc::new(Environment::new(10.0, 10.0, vec![]).unwrap());
        let config = HybridAStarConfig {
            shortcut_interval: 3,
            ..Default::default()
        };
        let mut p = HybridAStarPlanner::new(
            env,
            VehicleModel::with_defaults(),
            Pose2D::new(1.0, 1.0, 0.0),
            Pose2D::new(8.0, 8.0, 0.0),
            config,
        )
        .unwrap();
        // A free shot exists from the root, but the first try is at iteration 3
        let report = p.search_path(HeuristicMode::GridSearch, false);
        assert_eq!(report.iterations, 3);
        assert!(report.path().unwrap().search_length > 0.0);

        let env = Arc::new(Environment::new(10.0, 10.0, vec![Obstacle::new(4.5, 4.0, 1.0, 2.0)]).unwrap());
        let config = HybridAStarConfig {
            shortcut_interval: 4,
            ..Default::default()
        };
        let mut p = HybridAStarPlanner::new(
            env,
            VehicleModel::with_defaults(),
            Pose2D::new(1.0, 5.0, 0.0),
            Pose2D::new(9.0, 5.0, 0.0),
            config,
        )
        .unwrap();
        let report = p.search_path(HeuristicMode::GridSearch, false);
        assert!(report.path().is_some());
        assert_eq!(report.iterations % 4, 0);
    }
}
