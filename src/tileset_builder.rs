use anyhow::{Result, bail, ensure};
use std::collections::HashSet;

use crate::{Tile, Tileset};

/// Assembles a [`Tileset`] from tiles and the names of its special subsets.
///
/// Names are resolved and checked when the set is built, so tiles and subsets
/// can be given in any order.
#[derive(Debug, Default)]
pub struct TilesetBuilder {
    tiles: Vec<Tile>,
    candidates: Vec<String>,
    empty_tile: Option<String>,
    tunnel_tile: Option<String>,
    ghost_spawn_tile: Option<String>,
    above_box: Vec<String>,
    below_box: Vec<String>,
    side_box: Vec<String>,
}

fn names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Vec<String> {
    names.into_iter().map(Into::into).collect()
}

impl TilesetBuilder {
    /// A builder with no tiles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tiles added so far.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Number of tiles added so far.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True before any tile is added.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Adds one template.
    pub fn add_tile(mut self, tile: Tile) -> Self {
        self.tiles.push(tile);
        self
    }

    /// Adds several templates.
    pub fn add_tiles(mut self, tiles: impl IntoIterator<Item = Tile>) -> Self {
        self.tiles.extend(tiles);
        self
    }

    /// Tiles an unconstrained cell may become.
    pub fn candidates<S: Into<String>>(mut self, tiles: impl IntoIterator<Item = S>) -> Self {
        self.candidates = names(tiles);
        self
    }

    /// Names the filler tile.
    pub fn empty_tile(mut self, name: impl Into<String>) -> Self {
        self.empty_tile = Some(name.into());
        self
    }

    /// Names the tile pinned along the tunnel row.
    pub fn tunnel_tile(mut self, name: impl Into<String>) -> Self {
        self.tunnel_tile = Some(name.into());
        self
    }

    /// Names the tile pinned inside the ghost box.
    pub fn ghost_spawn_tile(mut self, name: impl Into<String>) -> Self {
        self.ghost_spawn_tile = Some(name.into());
        self
    }

    /// Tiles allowed directly above the ghost box.
    pub fn above_box<S: Into<String>>(mut self, tiles: impl IntoIterator<Item = S>) -> Self {
        self.above_box = names(tiles);
        self
    }

    /// Tiles allowed directly below the ghost box.
    pub fn below_box<S: Into<String>>(mut self, tiles: impl IntoIterator<Item = S>) -> Self {
        self.below_box = names(tiles);
        self
    }

    /// Tiles allowed beside the ghost box.
    pub fn side_box<S: Into<String>>(mut self, tiles: impl IntoIterator<Item = S>) -> Self {
        self.side_box = names(tiles);
        self
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        match self.tiles.iter().position(|tile| tile.name() == name) {
            Some(index) => Ok(index),
            None => bail!("Unknown tile `{name}`"),
        }
    }

    fn subset(&self, label: &str, names: &[String]) -> Result<Vec<usize>> {
        ensure!(!names.is_empty(), "Subset `{label}` is empty");
        names.iter().map(|name| self.index_of(name)).collect()
    }

    fn single(&self, label: &str, name: Option<&String>) -> Result<usize> {
        match name {
            Some(name) => self.index_of(name),
            None => bail!("No `{label}` given"),
        }
    }

    fn validate_tiles(&self) -> Result<()> {
        ensure!(!self.tiles.is_empty(), "Tileset must contain at least one tile");

        let mut seen = HashSet::new();
        for tile in &self.tiles {
            ensure!(seen.insert(tile.name()), "Duplicate tile `{tile}`");
            ensure!(
                tile.is_empty() || !tile.connections().is_empty(),
                "Tile `{tile}` is not empty but connects nowhere"
            );
        }

        for tile in &self.tiles {
            let Some(mirror_name) = tile.mirrored() else {
                continue;
            };
            let mirror = &self.tiles[self.index_of(mirror_name)?];
            ensure!(
                mirror.connections() == tile.connections().mirrored(),
                "Tile `{tile}` names `{mirror}` as its mirror but their connections do not reflect"
            );
        }
        Ok(())
    }

    /// Resolves every name and checks the catalog is usable.
    pub fn build(self) -> Result<Tileset> {
        self.validate_tiles()?;

        let candidates = self.subset("candidates", &self.candidates)?;
        let empty_tile = self.single("empty_tile", self.empty_tile.as_ref())?;
        let tunnel_tile = self.single("tunnel_tile", self.tunnel_tile.as_ref())?;
        let ghost_spawn_tile = self.single("ghost_spawn_tile", self.ghost_spawn_tile.as_ref())?;
        let above_box = self.subset("above_box", &self.above_box)?;
        let below_box = self.subset("below_box", &self.below_box)?;
        let side_box = self.subset("side_box", &self.side_box)?;

        ensure!(
            self.tiles[empty_tile].connections().is_empty(),
            "Empty tile `{}` must not connect anywhere",
            self.tiles[empty_tile]
        );

        Ok(Tileset::new(
            self.tiles,
            candidates,
            empty_tile,
            tunnel_tile,
            ghost_spawn_tile,
            above_box,
            below_box,
            side_box,
        ))
    }
}
