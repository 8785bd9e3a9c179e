//! Neighbour tables and constraint propagation.

use fixedbitset::FixedBitSet;
use ndarray::Array2;

use crate::{ALL_DIRECTIONS, Cell, Direction};

/// A cell next to another, with the directions between them.
#[derive(Clone, Debug)]
pub struct Neighbour {
    /// Array index `(y, x)` of the neighbour.
    pub pos: (usize, usize),
    /// From the cell towards the neighbour.
    pub dir: Direction,
    /// From the neighbour back towards the cell.
    pub opp_dir: Direction,
}

/// Neighbours of every cell in a `height` x `width` area, indexed `(y, x)`.
pub fn calculate_neighbours(height: usize, width: usize) -> Array2<Vec<Neighbour>> {
    Array2::from_shape_fn((height, width), |(y, x)| {
        ALL_DIRECTIONS
            .into_iter()
            .filter_map(|dir| {
                let (nx, ny) = dir.step((x, y), width, height)?;
                Some(Neighbour {
                    pos: (ny, nx),
                    dir,
                    opp_dir: dir.opposite(),
                })
            })
            .collect()
    })
}

/// Constrains outwards from every cell on `stack` until nothing shrinks.
///
/// Cells are popped depth first; a neighbour whose candidates shrink is pushed
/// in turn. Returns the cells that changed, in the order they first changed.
pub fn propagate(
    cells: &mut Array2<Cell>,
    neighbours: &Array2<Vec<Neighbour>>,
    mut stack: Vec<(usize, usize)>,
) -> Vec<(usize, usize)> {
    let width = neighbours.ncols();
    let mut seen = FixedBitSet::with_capacity(neighbours.len());
    let mut changed = Vec::new();

    while let Some(pos) = stack.pop() {
        let possible = cells[pos].possible_tiles().to_vec();
        for neighbour in &neighbours[pos] {
            if !cells[neighbour.pos].try_constrain(&possible, neighbour.opp_dir) {
                continue;
            }
            let (y, x) = neighbour.pos;
            if !seen.put(y * width + x) {
                changed.push(neighbour.pos);
            }
            stack.push(neighbour.pos);
        }
    }

    changed
}
