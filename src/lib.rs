//! # `pacman-wfc`
//!
//! `pacman-wfc` generates symmetric Pacman-style mazes with wave function
//! collapse: the left half is collapsed cell by cell under tile connection
//! rules and a connectivity check, then mirrored and outlined.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod algorithm;
mod cell;
mod config;
mod direction;
mod error;
mod grid;
mod rules;
mod tile;
mod tileset;
mod tileset_builder;

pub use algorithm::{CellSnapshot, GenerationProgress, Generator, Update, WaveStatus, generate_levels};
pub use cell::Cell;
pub use config::{DelayTimings, GeneratorConfig, GhostBoxDecoration, MIN_HEIGHT, MIN_WIDTH};
pub use direction::{ALL_DIRECTIONS, Direction, Directions};
pub use error::GenerationError;
pub use grid::{Grid, Level};
pub use rules::DoubleEdgeRules;
pub use tile::{SpritePart, SpriteParts, SpriteSection, Tile, outline, slot};
pub use tileset::Tileset;
pub use tileset_builder::TilesetBuilder;
