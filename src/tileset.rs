use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::{path::Path, str::FromStr};

use crate::{Directions, SpritePart, SpriteParts, Tile, TilesetBuilder};

const PACMAN_TILESET: &str = include_str!("../assets/pacman_tiles.yaml");

/// Reads a list of direction names such as `[UP, LEFT]` into a mask.
pub(crate) fn direction_names<'de, D>(deserializer: D) -> Result<Directions, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    names.iter().try_fold(Directions::empty(), |mask, name| {
        Directions::from_name(&name.to_uppercase())
            .map(|direction| mask | direction)
            .ok_or_else(|| <D::Error as serde::de::Error>::custom(format!("unknown direction `{name}`")))
    })
}

#[derive(Debug, Deserialize)]
struct TileEntry {
    name: String,
    #[serde(default, deserialize_with = "direction_names")]
    connections: Directions,
    #[serde(default)]
    empty: bool,
    #[serde(default)]
    mirrored: Option<String>,
    #[serde(default)]
    sprite_parts: Option<Vec<SpritePart>>,
}

impl TileEntry {
    fn into_tile(self) -> Result<Tile> {
        let mut tile = if self.empty {
            Tile::empty(&self.name)
        } else {
            Tile::new(&self.name, self.connections)
        };
        if let Some(parts) = self.sprite_parts {
            let parts: SpriteParts = parts.try_into().map_err(|parts: Vec<SpritePart>| {
                anyhow::anyhow!("Tile `{}` lists {} sprite parts, expected 9", self.name, parts.len())
            })?;
            tile = tile.with_sprite_parts(parts);
        }
        if let Some(mirror) = self.mirrored {
            tile = tile.with_mirror(mirror);
        }
        Ok(tile)
    }
}

#[derive(Debug, Deserialize)]
struct TilesetFile {
    tiles: Vec<TileEntry>,
    candidates: Vec<String>,
    empty_tile: String,
    tunnel_tile: String,
    ghost_spawn_tile: String,
    above_box: Vec<String>,
    below_box: Vec<String>,
    side_box: Vec<String>,
}

/// Every tile a level can be built from, plus the named subsets the generator
/// places around the tunnel and the ghost box.
///
/// Accessors hand out fresh clones so each grid can decorate its own tiles.
#[derive(Debug, Clone)]
pub struct Tileset {
    tiles: Vec<Tile>,
    candidates: Vec<usize>,
    empty_tile: usize,
    tunnel_tile: usize,
    ghost_spawn_tile: usize,
    above_box: Vec<usize>,
    below_box: Vec<usize>,
    side_box: Vec<usize>,
}

impl Tileset {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        tiles: Vec<Tile>,
        candidates: Vec<usize>,
        empty_tile: usize,
        tunnel_tile: usize,
        ghost_spawn_tile: usize,
        above_box: Vec<usize>,
        below_box: Vec<usize>,
        side_box: Vec<usize>,
    ) -> Self {
        debug_assert!(!candidates.is_empty(), "Tileset must offer at least one candidate");
        Self {
            tiles,
            candidates,
            empty_tile,
            tunnel_tile,
            ghost_spawn_tile,
            above_box,
            below_box,
            side_box,
        }
    }

    /// The maze tiles bundled with the crate.
    pub fn pacman() -> Self {
        PACMAN_TILESET
            .parse()
            .unwrap_or_else(|e| panic!("Bundled tileset is invalid: {e:#}"))
    }

    /// Reads a catalog from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tileset {}", path.display()))?;
        data.parse()
            .with_context(|| format!("Failed to parse tileset {}", path.display()))
    }

    /// Number of tiles a freshly reset cell may become.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// True when no tile is left to choose from.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// All templates, including the special tiles.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Looks a template up by name.
    pub fn get(&self, name: &str) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.name() == name)
    }

    fn clone_all(&self, indices: &[usize]) -> Vec<Tile> {
        indices.iter().map(|&i| self.tiles[i].clone()).collect()
    }

    /// The full candidate set for an unconstrained cell.
    pub fn candidates(&self) -> Vec<Tile> {
        self.clone_all(&self.candidates)
    }

    /// Filler for unused space.
    pub fn empty_tile(&self) -> Tile {
        self.tiles[self.empty_tile].clone()
    }

    /// Tile pinned along the tunnel row.
    pub fn tunnel_tile(&self) -> Tile {
        self.tiles[self.tunnel_tile].clone()
    }

    /// Tile pinned inside the ghost box.
    pub fn ghost_spawn_tile(&self) -> Tile {
        self.tiles[self.ghost_spawn_tile].clone()
    }

    /// Tiles allowed directly above the ghost box.
    pub fn above_box(&self) -> Vec<Tile> {
        self.clone_all(&self.above_box)
    }

    /// Tiles allowed directly below the ghost box.
    pub fn below_box(&self) -> Vec<Tile> {
        self.clone_all(&self.below_box)
    }

    /// Tiles allowed beside the ghost box.
    pub fn side_box(&self) -> Vec<Tile> {
        self.clone_all(&self.side_box)
    }

    /// Whether `tile` is the catalog's tunnel tile.
    pub fn is_tunnel(&self, tile: &Tile) -> bool {
        *tile == self.tiles[self.tunnel_tile]
    }

    /// The tile drawn in place of `tile` on the mirrored half.
    ///
    /// Tiles without a mirror counterpart are symmetric and copy across.
    pub fn mirrored(&self, tile: &Tile) -> Tile {
        tile.mirrored()
            .and_then(|name| self.get(name))
            .unwrap_or(tile)
            .clone()
    }
}

impl FromStr for Tileset {
    type Err = anyhow::Error;

    fn from_str(data: &str) -> Result<Self> {
        let file: TilesetFile = serde_yaml::from_str(data)?;

        let mut builder = TilesetBuilder::new();
        for entry in file.tiles {
            builder = builder.add_tile(entry.into_tile()?);
        }
        builder
            .candidates(file.candidates)
            .empty_tile(file.empty_tile)
            .tunnel_tile(file.tunnel_tile)
            .ghost_spawn_tile(file.ghost_spawn_tile)
            .above_box(file.above_box)
            .below_box(file.below_box)
            .side_box(file.side_box)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, SpriteSection};

    #[test]
    fn test_bundled_tileset() {
        let tileset = Tileset::pacman();
        assert_eq!(tileset.len(), 12);
        assert!(tileset.empty_tile().is_empty());
        assert!(tileset.ghost_spawn_tile().is_empty());
        assert!(!tileset.tunnel_tile().is_empty());
        assert!(tileset.candidates().iter().all(|t| *t != tileset.tunnel_tile()));
    }

    #[test]
    fn test_bundled_candidates_have_no_dead_ends() {
        let tileset = Tileset::pacman();
        for tile in tileset.candidates().iter().filter(|t| !t.is_empty()) {
            assert!(tile.connections().bits().count_ones() >= 2, "{tile}");
        }
    }

    #[test]
    fn test_box_subsets_never_open_onto_the_box() {
        let tileset = Tileset::pacman();
        assert!(tileset.above_box().iter().all(|t| !t.has_connection(Direction::Down)));
        assert!(tileset.below_box().iter().all(|t| !t.has_connection(Direction::Up)));
        assert!(tileset.side_box().iter().all(|t| !t.has_connection(Direction::Right)));
    }

    #[test]
    fn test_mirror_round_trip() {
        let tileset = Tileset::pacman();
        for tile in tileset.tiles() {
            let mirror = tileset.mirrored(tile);
            assert_eq!(mirror.connections(), tile.connections().mirrored(), "{tile}");
            let back = tileset.mirrored(&mirror);
            assert_eq!(back, *tile);
            assert_eq!(back.connections(), mirror.connections().mirrored());
        }
    }

    #[test]
    fn test_accessors_return_independent_copies() {
        let tileset = Tileset::pacman();
        let mut first = tileset.above_box();
        first[0].add_double_edge(SpriteSection::TopSide);
        let second = tileset.above_box();
        assert_ne!(first[0].sprite_parts(), second[0].sprite_parts());
        assert_eq!(
            second[0].sprite_parts(),
            tileset.get(second[0].name()).unwrap().sprite_parts()
        );
    }

    #[test]
    fn test_explicit_sprite_parts() {
        let yaml = "
tiles:
  - name: blank
    empty: true
  - name: door
    connections: [LEFT, RIGHT]
    sprite_parts: [GHOST_DOOR, GHOST_DOOR, GHOST_DOOR, EMPTY, EMPTY, EMPTY, TOP_EDGE, TOP_EDGE, TOP_EDGE]
candidates: [blank, door]
empty_tile: blank
tunnel_tile: door
ghost_spawn_tile: blank
above_box: [door]
below_box: [door]
side_box: [blank]
";
        let tileset: Tileset = yaml.parse().unwrap();
        let door = tileset.get("door").unwrap();
        assert_eq!(door.sprite_parts()[0], SpritePart::GhostDoor);
        assert_eq!(door.connections(), Directions::LEFT | Directions::RIGHT);
    }

    #[test]
    fn test_wrong_sprite_part_count_is_rejected() {
        let yaml = "
tiles:
  - name: blank
    empty: true
    sprite_parts: [EMPTY, EMPTY]
candidates: [blank]
empty_tile: blank
tunnel_tile: blank
ghost_spawn_tile: blank
above_box: [blank]
below_box: [blank]
side_box: [blank]
";
        let error = yaml.parse::<Tileset>().unwrap_err();
        assert!(format!("{error:#}").contains("expected 9"));
    }

    #[test]
    fn test_unknown_subset_member_is_rejected() {
        let yaml = "
tiles:
  - name: blank
    empty: true
candidates: [blank, missing]
empty_tile: blank
tunnel_tile: blank
ghost_spawn_tile: blank
above_box: [blank]
below_box: [blank]
side_box: [blank]
";
        let error = yaml.parse::<Tileset>().unwrap_err();
        assert!(format!("{error:#}").contains("missing"));
    }
}
