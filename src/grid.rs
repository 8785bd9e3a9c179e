use ndarray::Array2;
use rand::Rng;
use std::fmt::{Display, Formatter};

use crate::{
    Cell, Directions, GeneratorConfig, Tile, Tileset,
    algorithm::{
        common::{Neighbour, calculate_neighbours, propagate},
        connectivity::ConnectivityGraph,
    },
};

/// Rows tall enough to keep the cells above and below the tunnel empty.
const TUNNEL_CLEARANCE_HEIGHT: usize = 7;

/// Directions a generated cell at `(x, y)` may connect through.
///
/// The right edge of the generated half always stays open because the
/// mirrored half continues it.
fn valid_directions(x: usize, y: usize, height: usize) -> Directions {
    let mut valid = Directions::RIGHT;
    if y > 0 {
        valid |= Directions::DOWN;
    }
    if y + 1 < height {
        valid |= Directions::UP;
    }
    if x > 0 {
        valid |= Directions::LEFT;
    }
    valid
}

/// The full grid of cells. Only the left `gen_width` columns are collapsed;
/// the right half is filled in by mirroring.
///
/// Cells are stored and addressed internally by array index `(y, x)`.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Array2<Cell>,
    neighbours: Array2<Vec<Neighbour>>,
    candidates: Vec<Tile>,
    restrictions: Vec<((usize, usize), Vec<Tile>)>,
    start: (usize, usize),
    gen_width: usize,
    middle: usize,
    non_empty: usize,
}

impl Grid {
    /// An unconstrained grid sized by `config`. Mirrored columns start empty.
    pub fn new(config: &GeneratorConfig, tileset: &Tileset) -> Self {
        let (height, width) = (config.height, config.width());
        let gen_width = config.gen_width();
        let middle = config.middle();
        let candidates = tileset.candidates();

        let cells = Array2::from_shape_fn((height, width), |(y, x)| {
            if x < gen_width {
                Cell::new(x, y, valid_directions(x, y, height), &candidates)
            } else {
                Cell::new(x, y, Directions::empty(), &[])
            }
        });

        Self {
            cells,
            neighbours: calculate_neighbours(height, gen_width),
            candidates,
            restrictions: Vec::new(),
            start: (middle + 1, gen_width - 1),
            gen_width,
            middle,
            non_empty: 0,
        }
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    /// Columns across both halves.
    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    /// Columns in the generated left half.
    pub fn gen_width(&self) -> usize {
        self.gen_width
    }

    /// The tunnel row.
    pub fn middle(&self) -> usize {
        self.middle
    }

    /// `(x, y)` of the cell connectivity is checked from, directly above the
    /// ghost box.
    pub fn start(&self) -> (usize, usize) {
        (self.start.1, self.start.0)
    }

    /// Collapsed cells holding a non-empty tile since the last reset.
    pub fn non_empty_count(&self) -> usize {
        self.non_empty
    }

    /// Cell at column `x`, row `y`.
    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        debug_assert!(x < self.width() && y < self.height(), "Cell ({x}, {y}) is outside the grid");
        &self.cells[(y, x)]
    }

    /// The collapsed tile at `(x, y)`, if any.
    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        self.cell(x, y).tile()
    }

    pub(crate) fn cell_at(&self, pos: (usize, usize)) -> &Cell {
        &self.cells[pos]
    }

    pub(crate) fn cell_at_mut(&mut self, pos: (usize, usize)) -> &mut Cell {
        &mut self.cells[pos]
    }

    /// Generated cells still waiting to collapse.
    pub fn uncollapsed_count(&self) -> usize {
        self.generated().filter(|&pos| !self.cells[pos].is_collapsed()).count()
    }

    /// True once every cell, mirrored half included, holds a tile.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Cell::is_collapsed)
    }

    fn generated(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let gen_width = self.gen_width;
        (0..self.height()).flat_map(move |y| (0..gen_width).map(move |x| (y, x)))
    }

    fn connectivity(&self) -> ConnectivityGraph<'_> {
        ConnectivityGraph::new(&self.cells, &self.neighbours, self.start)
    }

    /// Whether every active generated cell can still reach the start.
    pub fn is_valid(&self) -> bool {
        self.connectivity().is_valid()
    }

    /// Active generated cells cut off from the start, as `(y, x)` indices.
    pub(crate) fn unreachable(&self) -> Vec<(usize, usize)> {
        self.connectivity().unreachable()
    }

    /// Pins the tunnel to the two leftmost cells of the middle row, with
    /// empty cells above and below when the grid is tall enough.
    ///
    /// Returns every cell that changed.
    pub fn place_tunnel(&mut self, tileset: &Tileset) -> Vec<(usize, usize)> {
        let mut placed = Vec::new();
        for x in 0..2 {
            self.cells[(self.middle, x)].set_tile(tileset.tunnel_tile(), true);
            placed.push((self.middle, x));
        }
        if self.height() >= TUNNEL_CLEARANCE_HEIGHT {
            for x in 0..2 {
                for y in [self.middle - 1, self.middle + 1] {
                    self.cells[(y, x)].set_tile(tileset.empty_tile(), true);
                    placed.push((y, x));
                }
            }
        }
        placed.extend(self.settle());
        placed
    }

    /// Pins the ghost spawn tile at the end of the middle row and narrows the
    /// cells above, below and beside it to their box sets.
    ///
    /// Returns every cell that changed.
    pub fn place_ghost_box(&mut self, tileset: &Tileset) -> Vec<(usize, usize)> {
        let (y, x) = (self.middle, self.gen_width - 1);
        self.cells[(y, x)].set_tile(tileset.ghost_spawn_tile(), true);

        self.restrictions = vec![
            ((y + 1, x), tileset.above_box()),
            ((y - 1, x), tileset.below_box()),
            ((y, x - 1), tileset.side_box()),
        ];
        self.start = (y + 1, x);
        self.apply_restrictions();

        let mut placed = vec![(y, x)];
        placed.extend(self.restrictions.iter().map(|(pos, _)| *pos));
        for pos in self.settle() {
            if !placed.contains(&pos) {
                placed.push(pos);
            }
        }
        placed
    }

    fn apply_restrictions(&mut self) {
        for (pos, tiles) in &self.restrictions {
            self.cells[*pos].reset(tiles);
        }
    }

    /// Propagates from every pinned and restricted cell.
    fn settle(&mut self) -> Vec<(usize, usize)> {
        let stack: Vec<_> = self
            .generated()
            .filter(|&pos| self.cells[pos].is_pinned())
            .chain(self.restrictions.iter().map(|(pos, _)| *pos))
            .collect();
        propagate(&mut self.cells, &self.neighbours, stack)
    }

    /// The uncollapsed generated cell with the fewest candidates, ties broken
    /// uniformly. `None` once every generated cell has collapsed.
    pub(crate) fn lowest_entropy<R: Rng>(&self, rng: &mut R) -> Option<(usize, usize)> {
        let mut lowest = usize::MAX;
        let mut ties = Vec::new();
        for pos in self.generated() {
            let cell = &self.cells[pos];
            if cell.is_collapsed() {
                continue;
            }
            let entropy = cell.entropy();
            if entropy < lowest {
                lowest = entropy;
                ties.clear();
            }
            if entropy == lowest {
                ties.push(pos);
            }
        }
        if ties.is_empty() {
            None
        } else {
            Some(ties[rng.random_range(0..ties.len())])
        }
    }

    /// Collapses the cell at `pos`, returning the connections it lost.
    pub(crate) fn collapse<R: Rng>(&mut self, pos: (usize, usize), rng: &mut R) -> Option<Directions> {
        let lost = self.cells[pos].try_collapse(rng)?;
        if self.cells[pos].tile().is_some_and(|tile| !tile.is_empty()) {
            self.non_empty += 1;
        }
        Some(lost)
    }

    /// Constrains outwards from `pos`, returning the cells that shrank.
    pub(crate) fn propagate(&mut self, pos: (usize, usize)) -> Vec<(usize, usize)> {
        propagate(&mut self.cells, &self.neighbours, vec![pos])
    }

    /// Puts every unpinned generated cell back to its full candidate set and
    /// re-applies the restrictions that feature placement set up.
    pub fn reset(&mut self) {
        for pos in self.generated() {
            let cell = &mut self.cells[pos];
            if !cell.is_pinned() {
                cell.reset(&self.candidates);
            }
        }
        self.non_empty = 0;
        self.apply_restrictions();
        self.settle();
    }

    /// Snapshot of the committed tiles, with `filler` wherever a cell has not
    /// collapsed.
    pub fn to_level(&self, filler: &Tile) -> Level {
        debug_assert!(self.is_complete(), "Level taken from an incomplete grid");
        Level {
            tiles: self.cells.map(|cell| cell.tile().unwrap_or(filler).clone()),
        }
    }
}

/// A finished level: one tile per cell across the full width.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    tiles: Array2<Tile>,
}

impl Level {
    /// Rows.
    pub fn height(&self) -> usize {
        self.tiles.nrows()
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.tiles.ncols()
    }

    /// Tile at column `x`, row `y`; row 0 is the bottom.
    pub fn tile(&self, x: usize, y: usize) -> &Tile {
        &self.tiles[(y, x)]
    }

    /// Tile names row by row, bottom row first.
    pub fn names(&self) -> Vec<Vec<&str>> {
        self.tiles
            .rows()
            .into_iter()
            .map(|row| row.into_iter().map(Tile::name).collect())
            .collect()
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        for y in (0..self.height()).rev() {
            for part_row in (0..3).rev() {
                let line: String = (0..self.width())
                    .flat_map(|x| {
                        let parts = self.tile(x, y).sprite_parts();
                        (0..3).map(move |column| parts[part_row * 3 + column].glyph())
                    })
                    .collect();
                writeln!(f, "{}", line.trim_end())?;
            }
        }
        Ok(())
    }
}
