//! Obstacle-aware heuristic for Hybrid A*
//!
//! Dijkstra search on the 8-connected cell graph, rooted at the goal cell and
//! resumed lazily: a query returns the memoized distance of a cell if it is
//! already finalized, otherwise the search continues until that cell is popped
//! or the frontier runs dry. Finalized cells are never reopened.
//!
//! Blocked cells are reachable but never expanded, so a pose whose reference
//! point sits in a cell touching an obstacle still gets a finite estimate while
//! the search cannot leak through walls.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use itertools::iproduct;
use log::trace;
use ordered_float::OrderedFloat;

use crate::common::{GridIndex, Point2D};
use crate::utils::GridMap;

type FrontierEntry = Reverse<(OrderedFloat<f64>, i32, i32)>;

pub struct GridSearch {
    grid: Arc<GridMap>,
    goal: GridIndex,
    /// Settled distances in cell units
    finalized: HashMap<GridIndex, f64>,
    tentative: HashMap<GridIndex, f64>,
    frontier: BinaryHeap<FrontierEntry>,
}

impl GridSearch {
    pub fn new(grid: Arc<GridMap>, goal: &Point2D) -> Self {
        let goal = grid.to_cell_id(goal);
        let mut frontier = BinaryHeap::new();
        frontier.push(Reverse((OrderedFloat(0.0), goal.x, goal.y)));
        let mut tentative = HashMap::new();
        tentative.insert(goal, 0.0);

        Self {
            grid,
            goal,
            finalized: HashMap::new(),
            tentative,
            frontier,
        }
    }

    pub fn goal_cell(&self) -> GridIndex {
        self.goal
    }

    /// Number of cells whose distance is settled
    pub fn finalized_count(&self) -> usize {
        self.finalized.len()
    }

    /// Free-space travel distance from the cell containing `p` to the goal
    /// cell, in cells; `f64::INFINITY` when unreachable
    pub fn distance_to_goal(&mut self, p: &Point2D) -> f64 {
        let cell = self.grid.to_cell_id(p);
        self.cell_distance(cell)
    }

    pub fn cell_distance(&mut self, target: GridIndex) -> f64 {
        if let Some(&d) = self.finalized.get(&target) {
            return d;
        }
        if !self.grid.in_grid(target.x, target.y) {
            return f64::INFINITY;
        }

        trace!(
            "[GridSearch] resume for ({},{}), frontier {}",
            target.x,
            target.y,
            self.frontier.len()
        );

        while let Some(Reverse((OrderedFloat(d), x, y))) = self.frontier.pop() {
            let cell = GridIndex::new(x, y);
            if self.finalized.contains_key(&cell) {
                continue;
            }
            self.finalized.insert(cell, d);

            if cell == self.goal || !self.grid.is_obstacle_cell(x, y) {
                self.relax_neighbors(cell, d);
            }
            if cell == target {
                return d;
            }
        }

        f64::INFINITY
    }

    fn relax_neighbors(&mut self, cell: GridIndex, d: f64) {
        for (dx, dy) in iproduct!(-1..=1, -1..=1) {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (nx, ny) = (cell.x + dx, cell.y + dy);
            if !self.grid.in_grid(nx, ny) {
                continue;
            }
            let diagonal = dx != 0 && dy != 0;
            // No corner cutting between two blocked cells
            if diagonal
                && (self.grid.is_obstacle_cell(cell.x + dx, cell.y)
                    || self.grid.is_obstacle_cell(cell.x, cell.y + dy))
            {
                continue;
            }

            let next = GridIndex::new(nx, ny);
            if self.finalized.contains_key(&next) {
                continue;
            }
            let cost = if diagonal { std::f64::consts::SQRT_2 } else { 1.0 };
            let new_d = d + cost;
            let current = self.tentative.get(&next).copied().unwrap_or(f64::INFINITY);
            if new_d < current {
                self.tentative.insert(next, new_d);
                self.frontier.push(Reverse((OrderedFloat(new_d), nx, ny)));
            }
        }
    }
}
