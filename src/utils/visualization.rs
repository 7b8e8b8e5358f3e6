//! Visualization utilities for hybrid_astar
//!
//! Collects layers (lines and points) and renders them into a single gnuplot
//! axes when the plot is saved.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PlotOption, PointSize, PointSymbol};

use crate::common::{Obstacle, Path2D, Point2D, Polygon, Pose2D, RoboticsError, RoboticsResult};

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const BOUNDARY: &str = GRAY;
    pub const START: &str = GREEN;
    pub const GOAL: &str = BLUE;
    pub const PATH: &str = RED;
    pub const EXPLORED: &str = "#9EC9E2";
    pub const FOOTPRINT: &str = "#35C788";
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Lines {
        x: Vec<f64>,
        y: Vec<f64>,
        color: String,
        width: f64,
        caption: Option<String>,
    },
    Points {
        x: Vec<f64>,
        y: Vec<f64>,
        style: PointStyle,
    },
}

/// Closed outline of a polygon, first vertex repeated at the end
fn outline(vertices: &[Point2D]) -> (Vec<f64>, Vec<f64>) {
    vertices
        .iter()
        .chain(vertices.first())
        .map(|p| (p.x, p.y))
        .unzip()
}

/// Main visualizer struct
pub struct Visualizer {
    layers: Vec<Layer>,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            x_range: None,
            y_range: None,
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Number of layers queued for rendering
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn push_lines(&mut self, x: Vec<f64>, y: Vec<f64>, color: &str, width: f64, caption: Option<&str>) {
        self.layers.push(Layer::Lines {
            x,
            y,
            color: color.to_string(),
            width,
            caption: caption.map(str::to_string),
        });
    }

    /// Plot a path
    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.push_lines(
            path.x_coords(),
            path.y_coords(),
            &style.color,
            style.line_width,
            Some(&style.caption),
        );
        self
    }

    /// Workspace boundary [0, width] x [0, height]
    pub fn plot_bounds(&mut self, width: f64, height: f64) -> &mut Self {
        self.push_lines(
            vec![0.0, width, width, 0.0, 0.0],
            vec![0.0, 0.0, height, height, 0.0],
            colors::BOUNDARY,
            1.0,
            None,
        );
        self
    }

    /// Rectangle outlines, captioned once
    pub fn plot_obstacles(&mut self, obstacles: &[Obstacle]) -> &mut Self {
        for (i, obstacle) in obstacles.iter().enumerate() {
            let (x, y) = outline(&obstacle.to_polygon().vertices);
            let caption = if i == 0 { Some("Obstacles") } else { None };
            self.push_lines(x, y, colors::OBSTACLE, 2.0, caption);
        }
        self
    }

    /// Sub-trajectories of the search tree
    pub fn plot_branches<'a, I>(&mut self, branches: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a [Point2D]>,
    {
        for branch in branches {
            if branch.len() < 2 {
                continue;
            }
            let (x, y) = branch.iter().map(|p| (p.x, p.y)).unzip();
            self.push_lines(x, y, colors::EXPLORED, 1.0, None);
        }
        self
    }

    /// Vehicle body outline
    pub fn plot_footprint(&mut self, footprint: &Polygon) -> &mut Self {
        let (x, y) = outline(&footprint.vertices);
        self.push_lines(x, y, colors::FOOTPRINT, 1.0, None);
        self
    }

    /// Plot a single point (start, goal, etc.)
    pub fn plot_point(&mut self, point: Point2D, style: &PointStyle) -> &mut Self {
        self.layers.push(Layer::Points {
            x: vec![point.x],
            y: vec![point.y],
            style: style.clone(),
        });
        self
    }

    /// Pose marker with a heading tick of length `size`
    pub fn plot_pose(&mut self, pose: &Pose2D, size: f64, style: &PointStyle) -> &mut Self {
        self.plot_point(pose.position(), style);
        self.push_lines(
            vec![pose.x, pose.x + size * pose.yaw.cos()],
            vec![pose.y, pose.y + size * pose.yaw.sin()],
            &style.color,
            2.0,
            None,
        );
        self
    }

    pub fn plot_start(&mut self, pose: &Pose2D) -> &mut Self {
        self.plot_pose(pose, 0.3, &PointStyle::new(colors::START, "Start").with_size(1.5))
    }

    pub fn plot_goal(&mut self, pose: &Pose2D) -> &mut Self {
        self.plot_pose(pose, 0.3, &PointStyle::new(colors::GOAL, "Goal").with_size(1.5))
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();

        for layer in &self.layers {
            match layer {
                Layer::Lines { x, y, color, width, caption } => {
                    let mut options: Vec<PlotOption<&str>> =
                        vec![Color(color.as_str()), LineWidth(*width)];
                    if let Some(caption) = caption {
                        options.push(Caption(caption.as_str()));
                    }
                    axes.lines(x, y, &options);
                }
                Layer::Points { x, y, style } => {
                    axes.points(
                        x,
                        y,
                        &[
                            Caption(style.caption.as_str()),
                            Color(style.color.as_str()),
                            PointSymbol(style.symbol),
                            PointSize(style.size),
                        ],
                    );
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);
        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        axes.set_aspect_ratio(AutoOption::Fix(1.0));

        figure
    }

    /// Save plot to PNG file
    pub fn save_png(&self, path: &str, width: u32, height: u32) -> RoboticsResult<()> {
        self.render()
            .save_to_png(path, width, height)
            .map_err(|e| RoboticsError::VisualizationError(e.to_string()))
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
