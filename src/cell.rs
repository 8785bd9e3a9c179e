use rand::Rng;
use std::fmt::{Display, Formatter};

use crate::{Direction, Directions, Tile};

/// One grid position during generation.
///
/// An uncollapsed cell holds the tiles it may still become; a collapsed cell
/// holds exactly one committed tile and no candidates.
#[derive(Debug, Clone)]
pub struct Cell {
    x: usize,
    y: usize,
    tile: Option<Tile>,
    candidates: Vec<Tile>,
    valid_directions: Directions,
    pinned: bool,
}

/// Tiles from `tiles` that only connect through `valid_directions`.
fn allowed(tiles: &[Tile], valid_directions: Directions) -> Vec<Tile> {
    tiles
        .iter()
        .filter(|tile| valid_directions.contains(tile.connections()))
        .cloned()
        .collect()
}

impl Cell {
    /// Creates an uncollapsed cell whose candidates are the tiles of `tiles`
    /// that never connect outside `valid_directions`.
    pub fn new(x: usize, y: usize, valid_directions: Directions, tiles: &[Tile]) -> Self {
        Self {
            x,
            y,
            tile: None,
            candidates: allowed(tiles, valid_directions),
            valid_directions,
            pinned: false,
        }
    }

    /// Column.
    pub fn x(&self) -> usize {
        self.x
    }

    /// Row, counted from the bottom.
    pub fn y(&self) -> usize {
        self.y
    }

    /// True once a tile is committed.
    pub fn is_collapsed(&self) -> bool {
        self.tile.is_some()
    }

    /// Set by force placement; pinned cells survive resets.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Directions that stay inside the generated region.
    pub fn valid_directions(&self) -> Directions {
        self.valid_directions
    }

    /// The committed tile.
    pub fn tile(&self) -> Option<&Tile> {
        self.tile.as_ref()
    }

    pub(crate) fn tile_mut(&mut self) -> Option<&mut Tile> {
        self.tile.as_mut()
    }

    /// Remaining candidates; empty once collapsed.
    pub fn candidates(&self) -> &[Tile] {
        &self.candidates
    }

    /// The committed tile if collapsed, the candidates otherwise.
    pub fn possible_tiles(&self) -> &[Tile] {
        match &self.tile {
            Some(tile) => std::slice::from_ref(tile),
            None => &self.candidates,
        }
    }

    /// Number of remaining candidates, zero once collapsed.
    pub fn entropy(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the cell is, or may still become, part of the maze.
    pub fn is_active(&self) -> bool {
        match &self.tile {
            Some(tile) => !tile.is_empty(),
            None => self
                .candidates
                .iter()
                .any(|tile| !tile.connections().is_empty()),
        }
    }

    /// Commits to a uniformly chosen candidate.
    ///
    /// Returns the connections some candidate offered but the chosen tile
    /// does not, or `None` when there is nothing left to choose from.
    pub fn try_collapse<R: Rng>(&mut self, rng: &mut R) -> Option<Directions> {
        debug_assert!(!self.is_collapsed(), "Cell ({}, {}) is already collapsed", self.x, self.y);
        if self.candidates.is_empty() {
            return None;
        }

        let possible = self
            .candidates
            .iter()
            .fold(Directions::empty(), |mask, tile| mask | tile.connections());
        let chosen = self.candidates.swap_remove(rng.random_range(0..self.candidates.len()));
        let lost = possible - chosen.connections();

        self.candidates.clear();
        self.tile = Some(chosen);
        Some(lost)
    }

    /// Drops every candidate that cannot sit next to any of `neighbour`,
    /// the tiles possible in the cell one step away in `direction`.
    ///
    /// Returns whether any candidate was removed. Collapsed cells never change.
    pub fn try_constrain(&mut self, neighbour: &[Tile], direction: Direction) -> bool {
        if self.is_collapsed() {
            return false;
        }
        let before = self.candidates.len();
        self.candidates
            .retain(|tile| neighbour.iter().any(|other| tile.can_connect_to_neighbour(other, direction)));
        self.candidates.len() < before
    }

    /// Restores an uncollapsed, unpinned cell with candidates drawn from `tiles`.
    pub fn reset(&mut self, tiles: &[Tile]) {
        self.tile = None;
        self.pinned = false;
        self.candidates = allowed(tiles, self.valid_directions);
    }

    /// Collapses straight to `tile`, skipping the random choice.
    pub fn set_tile(&mut self, tile: Tile, pinned: bool) {
        self.candidates.clear();
        self.tile = Some(tile);
        self.pinned = pinned;
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.tile {
            Some(tile) => write!(f, "({}, {}) {tile}", self.x, self.y),
            None => write!(f, "({}, {}) {} candidates", self.x, self.y, self.candidates.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tileset;
    use rand::{SeedableRng, rngs::StdRng};

    fn interior(tileset: &Tileset) -> Cell {
        Cell::new(2, 2, Directions::all(), &tileset.candidates())
    }

    #[test]
    fn test_new_filters_by_valid_directions() {
        let tileset = Tileset::pacman();
        let corner = Cell::new(0, 0, Directions::UP | Directions::RIGHT, &tileset.candidates());
        assert!(corner.candidates().iter().all(|t| !t.has_connection(Direction::Left)));
        assert!(corner.candidates().iter().all(|t| !t.has_connection(Direction::Down)));
        assert!(corner.candidates().iter().any(|t| t.is_empty()));
        assert_eq!(interior(&tileset).entropy(), tileset.len());
    }

    #[test]
    fn test_collapse_is_exclusive() {
        let tileset = Tileset::pacman();
        let mut rng = StdRng::seed_from_u64(7);
        let mut cell = interior(&tileset);

        let lost = cell.try_collapse(&mut rng).unwrap();
        let tile = cell.tile().unwrap().clone();

        assert!(cell.is_collapsed());
        assert_eq!(cell.entropy(), 0);
        assert_eq!(lost, Directions::all() - tile.connections());
        assert!(!cell.try_constrain(&[Tile::empty("blank")], Direction::Up));
        assert!(!cell.try_constrain(&tileset.candidates(), Direction::Left));
        assert_eq!(cell.tile(), Some(&tile));
        assert_eq!(cell.possible_tiles(), std::slice::from_ref(&tile));
    }

    #[test]
    fn test_collapse_fails_without_candidates() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut cell = Cell::new(0, 0, Directions::all(), &[]);
        assert_eq!(cell.try_collapse(&mut rng), None);
        assert!(!cell.is_collapsed());
    }

    #[test]
    fn test_constrain_is_monotone() {
        let tileset = Tileset::pacman();
        let mut cell = interior(&tileset);
        let vertical = [tileset.get("tile_vertical").unwrap().clone()];
        let horizontal = [tileset.get("tile_horizontal").unwrap().clone()];

        assert!(cell.try_constrain(&vertical, Direction::Up));
        let after_first: Vec<Tile> = cell.candidates().to_vec();
        assert!(after_first.iter().all(|t| t.has_connection(Direction::Up)));

        assert!(!cell.try_constrain(&vertical, Direction::Up));
        assert_eq!(cell.candidates(), after_first.as_slice());

        cell.try_constrain(&horizontal, Direction::Right);
        assert!(cell.candidates().iter().all(|t| after_first.contains(t)));
        assert!(cell.candidates().iter().all(|t| t.has_connection(Direction::Right)));
    }

    #[test]
    fn test_constrain_may_empty_the_domain() {
        let tileset = Tileset::pacman();
        let mut cell = Cell::new(0, 0, Directions::RIGHT, &tileset.candidates());
        let vertical = [tileset.get("tile_vertical").unwrap().clone()];

        assert!(cell.try_constrain(&vertical, Direction::Up));
        assert_eq!(cell.entropy(), 0);
        assert!(!cell.is_active());
    }

    #[test]
    fn test_reset_restores_candidates() {
        let tileset = Tileset::pacman();
        let mut rng = StdRng::seed_from_u64(3);
        let mut cell = interior(&tileset);
        cell.try_collapse(&mut rng);
        cell.reset(&tileset.candidates());
        assert!(!cell.is_collapsed());
        assert_eq!(cell.entropy(), tileset.len());

        cell.set_tile(tileset.tunnel_tile(), true);
        assert!(cell.is_pinned());
        assert!(cell.is_active());
        cell.reset(&tileset.candidates());
        assert!(!cell.is_pinned());
    }

    #[test]
    fn test_activity() {
        let tileset = Tileset::pacman();
        let mut cell = interior(&tileset);
        assert!(cell.is_active());
        cell.set_tile(tileset.empty_tile(), true);
        assert!(!cell.is_active());
    }
}
