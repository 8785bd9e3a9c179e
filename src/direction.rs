use bitflags::bitflags;
use std::fmt::{Display, Formatter};

/// Iteration order used by every pass that looks around a cell.
pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

/// A single compass direction on the grid.
///
/// Row 0 is the bottom of the grid, so `Up` increases `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the last row.
    Up,
    /// Towards row zero.
    Down,
    /// Towards column zero.
    Left,
    /// Towards the last column.
    Right,
}

bitflags! {
    /// A set of directions, such as the edges a tile connects through.
    ///
    /// The empty set stands for "no connection".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Directions: u8 {
        /// Connects to the cell on the right.
        const RIGHT = 1 << 0;
        /// Connects to the cell below.
        const DOWN = 1 << 1;
        /// Connects to the cell on the left.
        const LEFT = 1 << 2;
        /// Connects to the cell above.
        const UP = 1 << 3;
    }
}

impl Direction {
    /// The direction pointing the other way.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Quarter turn clockwise.
    pub fn turn_right(self) -> Self {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
        }
    }

    /// Quarter turn anticlockwise.
    pub fn turn_left(self) -> Self {
        match self {
            Direction::Right => Direction::Up,
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
        }
    }

    /// Unit grid offset `(dx, dy)` of a step in this direction.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Up => (0, 1),
        }
    }

    /// Position one step away, if it stays inside a `width` x `height` area.
    pub fn step(self, (x, y): (usize, usize), width: usize, height: usize) -> Option<(usize, usize)> {
        let (dx, dy) = self.offset();
        let nx = x.checked_add_signed(dx).filter(|&nx| nx < width)?;
        let ny = y.checked_add_signed(dy).filter(|&ny| ny < height)?;
        Some((nx, ny))
    }
}

impl From<Direction> for Directions {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => Directions::UP,
            Direction::Down => Directions::DOWN,
            Direction::Left => Directions::LEFT,
            Direction::Right => Directions::RIGHT,
        }
    }
}

impl TryFrom<Directions> for Direction {
    type Error = Directions;

    /// Only masks holding exactly one direction convert.
    fn try_from(mask: Directions) -> Result<Self, Self::Error> {
        ALL_DIRECTIONS
            .into_iter()
            .find(|&d| Directions::from(d) == mask)
            .ok_or(mask)
    }
}

impl Directions {
    /// True if `direction` is part of the set.
    pub fn has(self, direction: Direction) -> bool {
        self.contains(Directions::from(direction))
    }

    /// The mask reflected about a vertical axis: left and right swap.
    pub fn mirrored(self) -> Self {
        let mut mirrored = self - (Directions::LEFT | Directions::RIGHT);
        if self.contains(Directions::LEFT) {
            mirrored |= Directions::RIGHT;
        }
        if self.contains(Directions::RIGHT) {
            mirrored |= Directions::LEFT;
        }
        mirrored
    }

    /// Directions of the set, in `ALL_DIRECTIONS` order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        ALL_DIRECTIONS.into_iter().filter(move |&d| self.has(d))
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        write!(f, "{name}")
    }
}
