//! Reachability of active cells from the start cell.

use fixedbitset::FixedBitSet;
use ndarray::Array2;
use std::collections::VecDeque;

use super::common::Neighbour;
use crate::{Cell, Direction};

/// Reachability over the generated half of a grid from a fixed start cell.
///
/// Uncollapsed cells are assumed to be able to link up with anything still
/// compatible, so a failed check means some part of the maze can never join
/// the rest.
pub struct ConnectivityGraph<'a> {
    cells: &'a Array2<Cell>,
    neighbours: &'a Array2<Vec<Neighbour>>,
    start: (usize, usize),
}

/// Whether a passage can still run from `from` into `to`, one step away in `dir`.
fn traversable(from: &Cell, to: &Cell, dir: Direction) -> bool {
    match (from.tile(), to.tile()) {
        (Some(a), Some(b)) => a.shared_edge_with_neighbour(b, dir),
        (Some(a), None) => a.has_connection(dir),
        (None, Some(b)) => b.has_connection(dir.opposite()),
        (None, None) => true,
    }
}

impl<'a> ConnectivityGraph<'a> {
    /// `start` is an array index `(y, x)` inside the area covered by `neighbours`.
    pub fn new(cells: &'a Array2<Cell>, neighbours: &'a Array2<Vec<Neighbour>>, start: (usize, usize)) -> Self {
        debug_assert!(
            start.0 < neighbours.nrows() && start.1 < neighbours.ncols(),
            "Start cell {start:?} is outside the generated area"
        );
        Self {
            cells,
            neighbours,
            start,
        }
    }

    fn index(&self, (y, x): (usize, usize)) -> usize {
        y * self.neighbours.ncols() + x
    }

    /// Active cells reachable from the start, as bits indexed `y * width + x`.
    pub fn reachable(&self) -> FixedBitSet {
        let mut visited = FixedBitSet::with_capacity(self.neighbours.len());
        if !self.cells[self.start].is_active() {
            return visited;
        }

        let mut queue = VecDeque::from([self.start]);
        visited.insert(self.index(self.start));

        while let Some(pos) = queue.pop_front() {
            let cell = &self.cells[pos];
            for neighbour in &self.neighbours[pos] {
                let index = self.index(neighbour.pos);
                if visited.contains(index) {
                    continue;
                }
                let next = &self.cells[neighbour.pos];
                if next.is_active() && traversable(cell, next, neighbour.dir) {
                    visited.insert(index);
                    queue.push_back(neighbour.pos);
                }
            }
        }

        visited
    }

    /// Number of active cells in the generated area.
    pub fn active_count(&self) -> usize {
        self.active_cells().count()
    }

    fn active_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (height, width) = self.neighbours.dim();
        (0..height)
            .flat_map(move |y| (0..width).map(move |x| (y, x)))
            .filter(move |&pos| self.cells[pos].is_active())
    }

    /// True when every active cell can be reached from the start.
    pub fn is_valid(&self) -> bool {
        self.reachable().count_ones(..) == self.active_count()
    }

    /// Active cells the start can no longer reach.
    pub fn unreachable(&self) -> Vec<(usize, usize)> {
        let visited = self.reachable();
        self.active_cells()
            .filter(|&pos| !visited.contains(self.index(pos)))
            .collect()
    }
}
