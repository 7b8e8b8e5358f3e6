// Occupancy grid over the planning workspace
// Based on the PythonRobotics grid map, with rectangles rasterized instead of
// point obstacles.

use crate::common::{GridIndex, Point2D, RoboticsError, RoboticsResult};
use crate::utils::Environment;

pub struct GridMap {
    pub resolution: f64,
    pub x_width: i32,
    pub y_width: i32,
    obstacle_map: Vec<Vec<bool>>,
}

impl GridMap {
    pub const DEFAULT_CELL_SIZE: f64 = 0.1;

    pub fn new(env: &Environment, resolution: f64) -> RoboticsResult<Self> {
        if !(resolution > 0.0) {
            return Err(RoboticsError::InvalidParameter(format!(
                "cell size must be positive, got {}",
                resolution
            )));
        }

        let x_width = ((env.width() / resolution).ceil() as i32).max(1);
        let y_width = ((env.height() / resolution).ceil() as i32).max(1);

        let mut obstacle_map = vec![vec![false; y_width as usize]; x_width as usize];

        // Mark every cell an (inflated) obstacle overlaps
        for ob in env.obstacles() {
            let ob = ob.inflated(env.safety_margin());
            let ix0 = Self::clamp_index((ob.x / resolution).floor() as i32, x_width);
            let ix1 = Self::clamp_index(((ob.x + ob.width) / resolution).floor() as i32, x_width);
            let iy0 = Self::clamp_index((ob.y / resolution).floor() as i32, y_width);
            let iy1 = Self::clamp_index(((ob.y + ob.height) / resolution).floor() as i32, y_width);
            for column in &mut obstacle_map[ix0 as usize..=ix1 as usize] {
                for cell in &mut column[iy0 as usize..=iy1 as usize] {
                    *cell = true;
                }
            }
        }

        Ok(GridMap {
            resolution,
            x_width,
            y_width,
            obstacle_map,
        })
    }

    fn clamp_index(index: i32, width: i32) -> i32 {
        index.clamp(0, width - 1)
    }

    /// Cell containing `p`, clamped to the grid
    pub fn to_cell_id(&self, p: &Point2D) -> GridIndex {
        GridIndex::new(
            Self::clamp_index((p.x / self.resolution).floor() as i32, self.x_width),
            Self::clamp_index((p.y / self.resolution).floor() as i32, self.y_width),
        )
    }

    pub fn cell_center(&self, index: GridIndex) -> Point2D {
        Point2D::new(
            (index.x as f64 + 0.5) * self.resolution,
            (index.y as f64 + 0.5) * self.resolution,
        )
    }

    pub fn in_grid(&self, ix: i32, iy: i32) -> bool {
        ix >= 0 && ix < self.x_width && iy >= 0 && iy < self.y_width
    }

    /// Out-of-grid indices count as obstacles
    pub fn is_obstacle_cell(&self, ix: i32, iy: i32) -> bool {
        if !self.in_grid(ix, iy) {
            return true;
        }
        self.obstacle_map[ix as usize][iy as usize]
    }
}
