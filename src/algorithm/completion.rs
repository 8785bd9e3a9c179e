//! Passes that finish a collapsed grid: mirroring, outlining and ghost box borders.

use log::warn;

use crate::{ALL_DIRECTIONS, Direction, Directions, DoubleEdgeRules, GenerationError, GhostBoxDecoration, Grid, Tileset};

/// Copies generated column `x` onto its mirror column, swapping each tile for
/// its mirror counterpart.
///
/// Returns the `(y, x)` indices written.
pub fn mirror_column(grid: &mut Grid, tileset: &Tileset, x: usize) -> Vec<(usize, usize)> {
    debug_assert!(x < grid.gen_width(), "Column {x} is not generated");
    let z = grid.width() - 1 - x;
    (0..grid.height())
        .filter_map(|y| {
            let mirrored = tileset.mirrored(grid.cell_at((y, x)).tile()?);
            grid.cell_at_mut((y, z)).set_tile(mirrored, false);
            Some((y, z))
        })
        .collect()
}

/// Whether the cell at `(x, y)` belongs to the maze region that gets outlined.
pub fn is_inside(grid: &Grid, tileset: &Tileset, x: usize, y: usize) -> bool {
    grid.tile(x, y)
        .is_some_and(|tile| !tile.is_empty() && !tileset.is_tunnel(tile))
}

/// One cell on the outline and the directions in which it faces outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineVisit {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Edges of the cell that border the outside.
    pub outside: Directions,
}

/// Follows the outer boundary of a region, keeping the outside on the right.
///
/// At each cell the walk turns right if it can, otherwise goes straight, turns
/// left, or as a last resort turns back. It stops once it is about to repeat
/// its first move.
#[derive(Debug, Clone)]
pub struct OutlineWalk {
    width: usize,
    height: usize,
    start: (usize, usize),
    position: (usize, usize),
    heading: Direction,
    first_heading: Option<Direction>,
    steps: usize,
    max_steps: usize,
    finished: bool,
}

impl OutlineWalk {
    /// Starts at the first boundary cell found scanning rows upwards and each
    /// row left to right. `None` if nothing is inside.
    pub fn new(width: usize, height: usize, inside: impl Fn(usize, usize) -> bool) -> Option<Self> {
        let start = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .find(|&(x, y)| inside(x, y) && !outside(x, y, width, height, &inside).is_empty())?;
        let facing = outside(start.0, start.1, width, height, &inside)
            .directions()
            .next()?;

        Some(Self {
            width,
            height,
            start,
            position: start,
            heading: facing.turn_left(),
            first_heading: None,
            steps: 0,
            max_steps: 4 * width * height + 4,
            finished: false,
        })
    }

    /// Cells visited so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// True once the walk is back where it started.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn next_heading(&self, inside: &impl Fn(usize, usize) -> bool) -> Option<Direction> {
        let h = self.heading;
        [h.turn_right(), h, h.turn_left(), h.opposite()]
            .into_iter()
            .find(|dir| {
                dir.step(self.position, self.width, self.height)
                    .is_some_and(|(x, y)| inside(x, y))
            })
    }

    /// Visits the current cell and moves on. `Ok(None)` once the outline has
    /// closed.
    pub fn step(&mut self, inside: impl Fn(usize, usize) -> bool) -> Result<Option<OutlineVisit>, GenerationError> {
        if self.finished {
            return Ok(None);
        }
        let next = self.next_heading(&inside);
        if self.steps > 0 && self.position == self.start && next == self.first_heading {
            self.finished = true;
            return Ok(None);
        }
        if self.steps >= self.max_steps {
            return Err(GenerationError::OutlineDiverged { steps: self.steps });
        }

        let (x, y) = self.position;
        let visit = OutlineVisit {
            x,
            y,
            outside: outside(x, y, self.width, self.height, &inside),
        };

        if self.steps == 0 {
            self.first_heading = next;
        }
        match next.and_then(|dir| Some((dir, dir.step(self.position, self.width, self.height)?))) {
            Some((dir, position)) => {
                self.heading = dir;
                self.position = position;
            }
            None => self.finished = true,
        }
        self.steps += 1;
        Ok(Some(visit))
    }
}

/// Directions from `(x, y)` that lead off the grid or out of the region.
fn outside(x: usize, y: usize, width: usize, height: usize, inside: &impl Fn(usize, usize) -> bool) -> Directions {
    ALL_DIRECTIONS
        .into_iter()
        .filter(|dir| {
            dir.step((x, y), width, height)
                .is_none_or(|(nx, ny)| !inside(nx, ny))
        })
        .fold(Directions::empty(), |mask, dir| mask | Directions::from(dir))
}

/// Upgrades the borders of a visited cell that face outside.
pub fn apply_outline(grid: &mut Grid, visit: OutlineVisit, rules: &DoubleEdgeRules) {
    if let Some(tile) = grid.cell_at_mut((visit.y, visit.x)).tile_mut() {
        tile.add_double_edges(visit.outside, rules);
    }
}

/// Applies the hand-placed ghost box borders around `(gen_width, middle)`.
///
/// Returns the `(y, x)` indices decorated.
pub fn decorate_ghost_box(grid: &mut Grid, decorations: &[GhostBoxDecoration]) -> Vec<(usize, usize)> {
    let anchor = (grid.gen_width(), grid.middle());
    let (width, height) = (grid.width(), grid.height());
    let mut decorated = Vec::new();
    for decoration in decorations {
        let Some((x, y)) = decoration.position(anchor, width, height) else {
            warn!("Skipping ghost box decoration {decoration:?} outside the {width}x{height} grid");
            continue;
        };
        if let Some(tile) = grid.cell_at_mut((y, x)).tile_mut() {
            tile.add_double_edge(decoration.section);
            decorated.push((y, x));
        }
    }
    decorated
}
