use log::warn;
use serde::Deserialize;
use std::{
    fmt::{Display, Formatter},
    hash::{Hash, Hasher},
};

use crate::{ALL_DIRECTIONS, Direction, Directions, DoubleEdgeRules};

/// One of the nine wall-outline pieces a tile is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpritePart {
    /// Nothing drawn.
    #[default]
    Empty,
    /// Wall along the left side.
    LeftEdge,
    /// Wall along the right side.
    RightEdge,
    /// Wall along the top.
    TopEdge,
    /// Wall along the bottom.
    BottomEdge,
    /// Outer corner where the top and left walls meet.
    TopLeftCorner,
    /// Outer corner where the top and right walls meet.
    TopRightCorner,
    /// Outer corner where the bottom and left walls meet.
    BottomLeftCorner,
    /// Outer corner where the bottom and right walls meet.
    BottomRightCorner,
    /// Inner corner between paths leaving down and left.
    InnerBottomLeft,
    /// Inner corner between paths leaving down and right.
    InnerBottomRight,
    /// Inner corner between paths leaving up and left.
    InnerTopLeft,
    /// Inner corner between paths leaving up and right.
    InnerTopRight,
    /// Double-line left edge.
    DoubleLeftEdge,
    /// Double-line right edge.
    DoubleRightEdge,
    /// Double-line top edge.
    DoubleTopEdge,
    /// Double-line bottom edge.
    DoubleBottomEdge,
    /// Double-line top left corner.
    DoubleTopLeftCorner,
    /// Double-line bottom left corner.
    DoubleBottomLeftCorner,
    /// Double-line top right corner.
    DoubleTopRightCorner,
    /// Double-line bottom right corner.
    DoubleBottomRightCorner,
    /// Double bottom-left corner meeting a single left edge.
    DoubleBottomLeftLeftEdge,
    /// Double bottom-left corner meeting a single bottom edge.
    DoubleBottomLeftBottomEdge,
    /// Double top-right corner meeting a single right edge.
    DoubleTopRightRightEdge,
    /// Double top-right corner meeting a single top edge.
    DoubleTopRightTopEdge,
    /// Double top-left corner meeting a single left edge.
    DoubleTopLeftLeftEdge,
    /// Double top-left corner meeting a single top edge.
    DoubleTopLeftTopEdge,
    /// Double bottom-right corner meeting a single right edge.
    DoubleBottomRightRightEdge,
    /// Double bottom-right corner meeting a single bottom edge.
    DoubleBottomRightBottomEdge,
    /// Ghost box top left.
    GhostTopLeft,
    /// Ghost box top right.
    GhostTopRight,
    /// Ghost box bottom left.
    GhostBottomLeft,
    /// Ghost box bottom right.
    GhostBottomRight,
    /// Ghost box left entrance.
    GhostLeftEntrance,
    /// Ghost box right entrance.
    GhostRightEntrance,
    /// The ghost box door.
    GhostDoor,
}

impl SpritePart {
    /// Character used when printing a level to a terminal.
    pub fn glyph(self) -> char {
        use SpritePart as P;
        match self {
            P::Empty => ' ',
            P::LeftEdge | P::RightEdge => '│',
            P::TopEdge | P::BottomEdge => '─',
            P::TopLeftCorner | P::InnerBottomRight => '┌',
            P::TopRightCorner | P::InnerBottomLeft => '┐',
            P::BottomLeftCorner | P::InnerTopRight => '└',
            P::BottomRightCorner | P::InnerTopLeft => '┘',
            P::DoubleLeftEdge | P::DoubleRightEdge => '║',
            P::DoubleTopEdge | P::DoubleBottomEdge => '═',
            P::DoubleTopLeftCorner => '╔',
            P::DoubleTopRightCorner => '╗',
            P::DoubleBottomLeftCorner => '╚',
            P::DoubleBottomRightCorner => '╝',
            P::DoubleTopLeftTopEdge => '╒',
            P::DoubleTopLeftLeftEdge => '╓',
            P::DoubleTopRightTopEdge => '╕',
            P::DoubleTopRightRightEdge => '╖',
            P::DoubleBottomLeftBottomEdge => '╘',
            P::DoubleBottomLeftLeftEdge => '╙',
            P::DoubleBottomRightBottomEdge => '╛',
            P::DoubleBottomRightRightEdge => '╜',
            P::GhostTopLeft => '╔',
            P::GhostTopRight => '╗',
            P::GhostBottomLeft => '╚',
            P::GhostBottomRight => '╝',
            P::GhostLeftEntrance => '╡',
            P::GhostRightEntrance => '╞',
            P::GhostDoor => '-',
        }
    }
}

/// Hand-authored regions of a tile that can be swapped for a double edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpriteSection {
    /// No section.
    Empty,
    /// The whole left edge.
    LeftSide,
    /// The whole top edge.
    TopSide,
    /// The whole right edge.
    RightSide,
    /// The whole bottom edge.
    BottomSide,
    /// Bottom-left slot.
    BottomLeft,
    /// Top-left slot.
    TopLeft,
    /// Top-right slot.
    TopRight,
    /// Bottom-right slot.
    BottomRight,
    /// Outer top-left corner.
    TopLeftCorner,
    /// Outer top-right corner.
    TopRightCorner,
    /// Outer bottom-left corner.
    BottomLeftCorner,
    /// Outer bottom-right corner.
    BottomRightCorner,
    /// Left half of the ghost box door.
    GhostLeftEntrance,
    /// Right half of the ghost box door.
    GhostRightEntrance,
    /// Top-left corner of the ghost box.
    GhostTopLeft,
    /// Top-right corner of the ghost box.
    GhostTopRight,
    /// Bottom-left corner of the ghost box.
    GhostBottomLeft,
    /// Bottom-right corner of the ghost box.
    GhostBottomRight,
}

/// The nine parts of a tile, bottom row first: index = row * 3 + column.
pub type SpriteParts = [SpritePart; 9];

/// Slot indices into [`SpriteParts`].
pub mod slot {
    /// Bottom left.
    pub const BOTTOM_LEFT: usize = 0;
    /// Bottom middle.
    pub const BOTTOM_MIDDLE: usize = 1;
    /// Bottom right.
    pub const BOTTOM_RIGHT: usize = 2;
    /// Middle left.
    pub const MIDDLE_LEFT: usize = 3;
    /// Centre.
    pub const MIDDLE: usize = 4;
    /// Middle right.
    pub const MIDDLE_RIGHT: usize = 5;
    /// Top left.
    pub const TOP_LEFT: usize = 6;
    /// Top middle.
    pub const TOP_MIDDLE: usize = 7;
    /// Top right.
    pub const TOP_RIGHT: usize = 8;
}

const LEFT_EDGE_SLOTS: [usize; 3] = [slot::BOTTOM_LEFT, slot::MIDDLE_LEFT, slot::TOP_LEFT];
const TOP_EDGE_SLOTS: [usize; 3] = [slot::TOP_LEFT, slot::TOP_MIDDLE, slot::TOP_RIGHT];
const RIGHT_EDGE_SLOTS: [usize; 3] = [slot::BOTTOM_RIGHT, slot::MIDDLE_RIGHT, slot::TOP_RIGHT];
const BOTTOM_EDGE_SLOTS: [usize; 3] = [slot::BOTTOM_LEFT, slot::BOTTOM_MIDDLE, slot::BOTTOM_RIGHT];

fn edge_slots(direction: Direction) -> [usize; 3] {
    match direction {
        Direction::Right => RIGHT_EDGE_SLOTS,
        Direction::Down => BOTTOM_EDGE_SLOTS,
        Direction::Left => LEFT_EDGE_SLOTS,
        Direction::Up => TOP_EDGE_SLOTS,
    }
}

/// Wall outline implied by a connection mask.
///
/// Edge middles are open where the tile connects, corners turn, continue or
/// become inner corners depending on the two edges they join.
pub fn outline(connections: Directions) -> SpriteParts {
    use SpritePart as P;

    let up = connections.has(Direction::Up);
    let down = connections.has(Direction::Down);
    let left = connections.has(Direction::Left);
    let right = connections.has(Direction::Right);

    let corner = |vertical: bool, horizontal: bool, outer, inner, side, cap| match (vertical, horizontal) {
        (false, false) => outer,
        (true, true) => inner,
        (true, false) => side,
        (false, true) => cap,
    };

    let mut parts = [P::Empty; 9];
    parts[slot::BOTTOM_LEFT] = corner(down, left, P::BottomLeftCorner, P::InnerBottomLeft, P::LeftEdge, P::BottomEdge);
    parts[slot::BOTTOM_MIDDLE] = if down { P::Empty } else { P::BottomEdge };
    parts[slot::BOTTOM_RIGHT] = corner(down, right, P::BottomRightCorner, P::InnerBottomRight, P::RightEdge, P::BottomEdge);
    parts[slot::MIDDLE_LEFT] = if left { P::Empty } else { P::LeftEdge };
    parts[slot::MIDDLE_RIGHT] = if right { P::Empty } else { P::RightEdge };
    parts[slot::TOP_LEFT] = corner(up, left, P::TopLeftCorner, P::InnerTopLeft, P::LeftEdge, P::TopEdge);
    parts[slot::TOP_MIDDLE] = if up { P::Empty } else { P::TopEdge };
    parts[slot::TOP_RIGHT] = corner(up, right, P::TopRightCorner, P::InnerTopRight, P::RightEdge, P::TopEdge);
    parts
}

/// A tile template: which edges it connects through and how it is drawn.
///
/// Tiles compare equal by name. Grids hold their own copies so that sprite
/// upgrades on one cell never reach another.
#[derive(Debug, Clone)]
pub struct Tile {
    name: String,
    connections: Directions,
    sprite_parts: SpriteParts,
    empty: bool,
    mirrored: Option<String>,
}

impl Tile {
    /// A path tile drawn with the outline implied by its connections.
    pub fn new(name: impl Into<String>, connections: Directions) -> Self {
        Self {
            name: name.into(),
            connections,
            sprite_parts: outline(connections),
            empty: false,
            mirrored: None,
        }
    }

    /// A filler tile: no connections, nothing drawn, never part of the maze.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connections: Directions::empty(),
            sprite_parts: [SpritePart::Empty; 9],
            empty: true,
            mirrored: None,
        }
    }

    /// Replaces the drawn parts.
    pub fn with_sprite_parts(mut self, sprite_parts: SpriteParts) -> Self {
        self.sprite_parts = sprite_parts;
        self
    }

    /// Names the tile used in its place on the mirrored half of the grid.
    pub fn with_mirror(mut self, name: impl Into<String>) -> Self {
        self.mirrored = Some(name.into());
        self
    }

    /// Unique name within a catalog.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Edges a path leaves through.
    pub fn connections(&self) -> Directions {
        self.connections
    }

    /// The nine parts currently drawn, including any upgrades.
    pub fn sprite_parts(&self) -> &SpriteParts {
        &self.sprite_parts
    }

    /// Filler tiles are excluded from connectivity and from the maze outline.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Name of the tile drawn in its place on the mirrored half.
    pub fn mirrored(&self) -> Option<&str> {
        self.mirrored.as_deref()
    }

    /// Whether the tile connects towards `direction`.
    pub fn has_connection(&self, direction: Direction) -> bool {
        self.connections.has(direction)
    }

    /// Whether `other` may sit next to this tile in `direction`.
    ///
    /// Both sides have to agree: either both open onto the shared edge or
    /// neither does.
    pub fn can_connect_to_neighbour(&self, other: &Tile, direction: Direction) -> bool {
        self.has_connection(direction) == other.has_connection(direction.opposite())
    }

    /// Whether a passage actually crosses the edge shared with `other`.
    pub fn shared_edge_with_neighbour(&self, other: &Tile, direction: Direction) -> bool {
        self.has_connection(direction) && other.has_connection(direction.opposite())
    }

    /// Upgrades the border parts facing each direction in `outside`.
    pub fn add_double_edges(&mut self, outside: Directions, rules: &DoubleEdgeRules) {
        for direction in ALL_DIRECTIONS {
            if !outside.has(direction) {
                continue;
            }
            for index in edge_slots(direction) {
                if let Some(upgraded) = rules.try_upgrade(self.sprite_parts[index], direction) {
                    self.sprite_parts[index] = upgraded;
                }
            }
        }
    }

    /// Fixed substitutions used to outline the ghost box.
    pub fn add_double_edge(&mut self, section: SpriteSection) {
        use SpritePart as P;
        let parts = &mut self.sprite_parts;
        match section {
            SpriteSection::LeftSide => {
                LEFT_EDGE_SLOTS.iter().for_each(|&i| parts[i] = P::DoubleLeftEdge);
            }
            SpriteSection::TopSide => {
                TOP_EDGE_SLOTS.iter().for_each(|&i| parts[i] = P::DoubleTopEdge);
            }
            SpriteSection::RightSide => {
                RIGHT_EDGE_SLOTS.iter().for_each(|&i| parts[i] = P::DoubleRightEdge);
            }
            SpriteSection::BottomSide => {
                BOTTOM_EDGE_SLOTS.iter().for_each(|&i| parts[i] = P::DoubleBottomEdge);
            }
            SpriteSection::GhostLeftEntrance => {
                parts[slot::BOTTOM_LEFT] = P::DoubleBottomEdge;
                parts[slot::BOTTOM_MIDDLE] = P::GhostLeftEntrance;
                parts[slot::BOTTOM_RIGHT] = P::GhostDoor;
            }
            SpriteSection::GhostRightEntrance => {
                parts[slot::BOTTOM_LEFT] = P::GhostDoor;
                parts[slot::BOTTOM_MIDDLE] = P::GhostRightEntrance;
                parts[slot::BOTTOM_RIGHT] = P::DoubleBottomEdge;
            }
            SpriteSection::GhostTopLeft => parts[slot::BOTTOM_RIGHT] = P::GhostTopLeft,
            SpriteSection::GhostTopRight => parts[slot::BOTTOM_LEFT] = P::GhostTopRight,
            SpriteSection::GhostBottomLeft => parts[slot::TOP_RIGHT] = P::GhostBottomLeft,
            SpriteSection::GhostBottomRight => parts[slot::TOP_LEFT] = P::GhostBottomRight,
            other => warn!("No double edge defined for section {other:?} on {}", self.name),
        }
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tile {}

impl Hash for Tile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Display for Tile {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
