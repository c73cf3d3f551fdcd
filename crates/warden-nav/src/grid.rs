//! Uniform walkable grid on the XY plane at a fixed floor height.
//!
//! Used as the reference navigation backend in tests, benches and the CLI simulator: it answers
//! projection, reachability, path and raycast queries deterministically (fixed neighbour order,
//! FIFO tie-breaking).

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use warden_core::{DeterministicRng, Vec3};

use crate::{NavPath, NavRaycastHit, NavigationOracle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Cell {
    x: i32,
    y: i32,
}

/// Open-set entry ordered by `(f, g, insertion)` so equal costs pop first-in first-out.
type OpenEntry = Reverse<(u32, u32, u64, usize)>;

#[derive(Debug, Clone)]
pub struct NavGrid {
    width: i32,
    height: i32,
    cell_size: f32,
    floor_z: f32,
    blocked: Vec<bool>,
}

impl NavGrid {
    pub fn new(width: u32, height: u32, cell_size: f32) -> Self {
        assert!(width > 0 && height > 0, "grid must be non-empty");
        assert!(cell_size > 0.0, "cell_size must be > 0");
        let width = width as i32;
        let height = height as i32;
        Self {
            width,
            height,
            cell_size,
            floor_z: 0.0,
            blocked: vec![false; (width * height) as usize],
        }
    }

    pub fn with_floor(mut self, floor_z: f32) -> Self {
        self.floor_z = floor_z;
        self
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn floor_z(&self) -> f32 {
        self.floor_z
    }

    /// World-space size of the grid along X and Y.
    pub fn extent(&self) -> (f32, f32) {
        (
            self.width as f32 * self.cell_size,
            self.height as f32 * self.cell_size,
        )
    }

    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) {
        if let Some(idx) = self.idx(Cell { x, y }) {
            self.blocked[idx] = blocked;
        }
    }

    /// Block every cell whose center falls inside the axis-aligned rectangle.
    pub fn block_rect(&mut self, min: Vec3, max: Vec3) {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.cell_center(Cell { x, y });
                if c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y {
                    self.set_blocked(x, y, true);
                }
            }
        }
    }

    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.idx(Cell { x, y })
            .map(|idx| self.blocked[idx])
            .unwrap_or(true)
    }

    /// Whether `p` lies over a walkable cell (height is ignored).
    pub fn is_walkable(&self, p: Vec3) -> bool {
        self.world_to_cell(p)
            .and_then(|cell| self.idx(cell))
            .map(|idx| !self.blocked[idx])
            .unwrap_or(false)
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn idx(&self, cell: Cell) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        Some((cell.y * self.width + cell.x) as usize)
    }

    fn walkable_cell(&self, cell: Cell) -> bool {
        self.idx(cell).map(|idx| !self.blocked[idx]).unwrap_or(false)
    }

    fn world_to_cell(&self, p: Vec3) -> Option<Cell> {
        let cell = Cell {
            x: (p.x / self.cell_size).floor() as i32,
            y: (p.y / self.cell_size).floor() as i32,
        };
        self.in_bounds(cell).then_some(cell)
    }

    fn cell_center(&self, cell: Cell) -> Vec3 {
        Vec3::new(
            (cell.x as f32 + 0.5) * self.cell_size,
            (cell.y as f32 + 0.5) * self.cell_size,
            self.floor_z,
        )
    }

    fn heuristic(&self, a: Cell, b: Cell) -> u32 {
        ((a.x - b.x).abs() + (a.y - b.y).abs()) as u32
    }

    /// Walkable 4-neighbours of `cell` as indices, always in N, E, S, W order.
    fn open_neighbors(&self, cell: Cell) -> impl Iterator<Item = (Cell, usize)> + '_ {
        const STEPS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
        STEPS.into_iter().filter_map(move |(dx, dy)| {
            let n = Cell {
                x: cell.x + dx,
                y: cell.y + dy,
            };
            let idx = self.idx(n)?;
            (!self.blocked[idx]).then_some((n, idx))
        })
    }

    fn cell_at(&self, idx: usize) -> Cell {
        let idx = idx as i32;
        Cell {
            x: idx % self.width,
            y: idx / self.width,
        }
    }

    /// Walkable cell nearest to `p` among the cells overlapping `p ± (half_x, half_y)`.
    fn nearest_walkable(&self, p: Vec3, half_x: f32, half_y: f32) -> Option<Cell> {
        let min_x = ((p.x - half_x) / self.cell_size).floor() as i32;
        let max_x = ((p.x + half_x) / self.cell_size).floor() as i32;
        let min_y = ((p.y - half_y) / self.cell_size).floor() as i32;
        let max_y = ((p.y + half_y) / self.cell_size).floor() as i32;

        let mut best: Option<(f32, Cell)> = None;
        for y in min_y.max(0)..=max_y.min(self.height - 1) {
            for x in min_x.max(0)..=max_x.min(self.width - 1) {
                let cell = Cell { x, y };
                if !self.walkable_cell(cell) {
                    continue;
                }
                let d = self.cell_center(cell).distance_2d(p);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, cell));
                }
            }
        }
        best.map(|(_, cell)| cell)
    }

    /// Walkable cells reachable from `start` whose centers lie within `radius` of `center`,
    /// in breadth-first order.
    fn reachable_within(&self, start: Cell, center: Vec3, radius: f32) -> Vec<Cell> {
        let Some(start_idx) = self.idx(start) else {
            return Vec::new();
        };
        let mut seen = vec![false; self.blocked.len()];
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();
        seen[start_idx] = true;

        while let Some(cell) = queue.pop_front() {
            out.push(cell);
            for (n, n_idx) in self.open_neighbors(cell) {
                if std::mem::replace(&mut seen[n_idx], true) {
                    continue;
                }
                if self.cell_center(n).distance_2d(center) <= radius {
                    queue.push_back(n);
                }
            }
        }
        out
    }

    /// Shortest 4-connected cell path from `start` to `goal`, both inclusive.
    fn a_star(&self, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
        let start_idx = self.idx(start)?;
        let goal_idx = self.idx(goal)?;
        if self.blocked[start_idx] || self.blocked[goal_idx] {
            return None;
        }

        let cells = self.blocked.len();
        let mut best_g = vec![u32::MAX; cells];
        let mut parent: Vec<Option<usize>> = vec![None; cells];
        let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
        let mut pushed: u64 = 0;

        best_g[start_idx] = 0;
        open.push(Reverse((self.heuristic(start, goal), 0, pushed, start_idx)));

        while let Some(Reverse((_, g, _, idx))) = open.pop() {
            if idx == goal_idx {
                let mut path = vec![goal];
                let mut at = goal_idx;
                while let Some(prev) = parent[at] {
                    path.push(self.cell_at(prev));
                    at = prev;
                }
                path.reverse();
                return Some(path);
            }
            if g > best_g[idx] {
                continue;
            }

            let cell = self.cell_at(idx);
            for (n, n_idx) in self.open_neighbors(cell) {
                let g_next = g + 1;
                if g_next >= best_g[n_idx] {
                    continue;
                }
                best_g[n_idx] = g_next;
                parent[n_idx] = Some(idx);
                pushed += 1;
                open.push(Reverse((g_next + self.heuristic(n, goal), g_next, pushed, n_idx)));
            }
        }

        None
    }
}

impl NavigationOracle for NavGrid {
    fn project_to_navigable(&self, point: Vec3, extent: Vec3) -> Option<Vec3> {
        if (point.z - self.floor_z).abs() > extent.z {
            return None;
        }
        if self.is_walkable(point) {
            return Some(Vec3::new(point.x, point.y, self.floor_z));
        }
        self.nearest_walkable(point, extent.x, extent.y)
            .map(|cell| self.cell_center(cell))
    }

    fn random_reachable_point(
        &self,
        center: Vec3,
        radius: f32,
        rng: &mut dyn DeterministicRng,
    ) -> Option<Vec3> {
        let start = match self.world_to_cell(center) {
            Some(cell) if self.walkable_cell(cell) => cell,
            _ => self.nearest_walkable(center, radius, radius)?,
        };
        if self.cell_center(start).distance_2d(center) > radius {
            return None;
        }
        let cells = self.reachable_within(start, center, radius);
        if cells.is_empty() {
            return None;
        }
        let cell = cells[rng.next_index(cells.len())];
        Some(self.cell_center(cell))
    }

    fn find_path(&self, start: Vec3, goal: Vec3) -> Option<NavPath> {
        let start_cell = self.world_to_cell(start)?;
        let goal_cell = self.world_to_cell(goal)?;
        let cells = self.a_star(start_cell, goal_cell)?;

        // Preserve exact endpoints for nicer movement.
        let inner_len = cells.len().saturating_sub(2);
        let mut points = Vec::with_capacity(cells.len().saturating_add(1));
        points.push(Vec3::new(start.x, start.y, self.floor_z));
        if cells.len() >= 2 {
            for cell in cells.into_iter().skip(1).take(inner_len) {
                points.push(self.cell_center(cell));
            }
        }
        points.push(Vec3::new(goal.x, goal.y, self.floor_z));
        Some(NavPath::new(points))
    }

    fn raycast(&self, start: Vec3, end: Vec3) -> Option<NavRaycastHit> {
        let delta = (end - start).flat();
        let len = delta.length();
        let step = self.cell_size * 0.25;
        let steps = (len / step).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let p = start + delta * (i as f32 / steps as f32);
            if !self.is_walkable(p) {
                return Some(NavRaycastHit {
                    point: Vec3::new(p.x, p.y, self.floor_z),
                });
            }
        }
        None
    }
}
