// Hybrid A* path planning
//
// Runs two built-in scenarios and saves each result as a PNG under
// img/path_planning/. Set RUST_LOG=debug to follow the search.

use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Instant;

use hybrid_astar::common::{Obstacle, Pose2D, RoboticsError, RoboticsResult};
use hybrid_astar::path_planning::hybrid_astar::{
    HeuristicMode, HybridAStarConfig, HybridAStarPlanner, VehicleModel,
};
use hybrid_astar::utils::{colors, Environment, PathStyle, Visualizer};

struct Scenario {
    name: &'static str,
    width: f64,
    height: f64,
    start: Pose2D,
    goal: Pose2D,
    obstacles: Vec<[f64; 4]>,
}

fn corridor_scenario() -> Scenario {
    Scenario {
        name: "corridor",
        width: 10.0,
        height: 10.0,
        start: Pose2D::new(4.6, 2.4, 0.0),
        goal: Pose2D::new(1.6, 8.0, -PI / 2.0),
        obstacles: vec![
            [2.0, 3.0, 6.0, 0.1],
            [2.0, 3.0, 0.1, 1.5],
            [4.3, 0.0, 0.1, 1.8],
            [6.5, 1.5, 0.1, 1.5],
            [0.0, 6.0, 3.5, 0.1],
            [5.0, 6.0, 5.0, 0.1],
        ],
    }
}

fn lab_scenario() -> Scenario {
    Scenario {
        name: "lab",
        width: 5.0,
        height: 4.0,
        start: Pose2D::new(1.0, 2.0, 0.0),
        goal: Pose2D::new(4.7, 2.5, -PI / 2.0),
        obstacles: vec![
            [0.55, 0.55, 1.6, 0.04],
            [0.55, 0.55, 0.04, 1.1],
            [0.55, 2.35, 0.04, 1.1],
            [0.55, 3.45, 1.6, 0.04],
            [2.85, 0.55, 1.6, 0.04],
            [4.45, 0.55, 0.04, 1.1],
            [4.45, 2.35, 0.04, 1.1],
            [2.85, 3.45, 1.6, 0.04],
            [0.9, 0.9, 1.25, 0.75],
            [0.9, 2.35, 1.25, 0.75],
            [2.85, 0.9, 1.25, 0.75],
            [2.85, 2.35, 1.25, 0.75],
        ],
    }
}

fn run(scenario: &Scenario) -> RoboticsResult<()> {
    println!("Scenario {} start!!", scenario.name);

    let obstacles: Vec<Obstacle> = scenario.obstacles.iter().copied().map(Obstacle::from).collect();
    let env = Arc::new(Environment::new(scenario.width, scenario.height, obstacles)?);
    let vehicle = VehicleModel::with_defaults();

    let mut planner = HybridAStarPlanner::new(
        env.clone(),
        vehicle.clone(),
        scenario.start,
        scenario.goal,
        HybridAStarConfig::default(),
    )?;

    let timer = Instant::now();
    let report = planner.search_path(HeuristicMode::GridSearch, true);
    println!(
        "Search finished in {:.2?} after {} iterations",
        timer.elapsed(),
        report.iterations
    );

    let mut vis = Visualizer::new();
    vis.set_title(&format!("Hybrid A* ({})", scenario.name))
        .set_x_range(0.0, scenario.width)
        .set_y_range(0.0, scenario.height)
        .plot_bounds(scenario.width, scenario.height)
        .plot_obstacles(env.obstacles())
        .plot_branches(report.explored.iter().map(|b| b.points.as_slice()));

    if let Some(path) = report.path() {
        println!(
            "Path found: {:.2} m searched + {:.2} m {} shot = {:.2} m, {} waypoints",
            path.search_length,
            path.shortcut_length(),
            path.shortcut.label(),
            path.total_length(),
            path.waypoints.len()
        );
        for waypoint in path.waypoints.iter().step_by(40) {
            vis.plot_footprint(&vehicle.footprint(&waypoint.pose));
        }
        let caption = format!("Path ({:.2} m)", path.total_length());
        vis.plot_path(&path.to_path2d(), &PathStyle::new(colors::PATH, &caption));
    }
    vis.plot_start(&scenario.start).plot_goal(&scenario.goal);

    std::fs::create_dir_all("img/path_planning")
        .map_err(|e| RoboticsError::VisualizationError(e.to_string()))?;
    let output = format!("img/path_planning/hybrid_astar_{}.png", scenario.name);
    vis.save_png(&output, 800, 800)?;
    println!("Plot saved to {}", output);

    report.into_result().map(|_| ())
}

fn main() {
    env_logger::init();
    println!("Hybrid A* path planner start!!");

    for scenario in [corridor_scenario(), lab_scenario()] {
        if let Err(e) = run(&scenario) {
            println!("Scenario {} failed: {}", scenario.name, e);
        }
    }

    println!("Hybrid A* path planner finish!!");
}
