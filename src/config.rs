use anyhow::{Context, Result};
use serde::Deserialize;
use std::{path::Path, time::Duration};

use crate::{GenerationError, SpriteSection};

/// Smallest grid that fits the tunnel rows and the ghost box.
pub const MIN_HEIGHT: usize = 3;
/// Smallest full width: tunnel columns plus the box and its side neighbour.
pub const MIN_WIDTH: usize = 8;

fn default_attempts() -> usize {
    20
}

fn default_column_batch_height() -> usize {
    20
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or_default()
}

/// Pause suggested after each kind of progress event, in seconds.
///
/// Only presentation uses these; generation itself never waits.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DelayTimings {
    /// After placing features and each collapse step.
    pub generating: f32,
    /// After each mirrored cell and each outline step.
    pub completing: f32,
    /// After a reset.
    pub reset: f32,
}

impl DelayTimings {
    /// Paced for watching small grids.
    pub fn normal() -> Self {
        Self {
            generating: 0.05,
            completing: 0.02,
            reset: 0.5,
        }
    }

    /// For mid-sized grids.
    pub fn fast() -> Self {
        Self {
            generating: 0.01,
            completing: 0.005,
            reset: 0.2,
        }
    }

    /// For large grids.
    pub fn ultra() -> Self {
        Self {
            generating: 0.002,
            completing: 0.001,
            reset: 0.05,
        }
    }

    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            generating: 0.0,
            completing: 0.0,
            reset: 0.0,
        }
    }

    /// Picks a preset by the number of generated cells so large grids finish
    /// in reasonable time.
    pub fn for_cell_count(cells: usize) -> Self {
        match cells {
            0..=120 => Self::normal(),
            121..=500 => Self::fast(),
            501..=1000 => Self::ultra(),
            _ => Self::none(),
        }
    }

    /// Rejects delays that cannot become a [`Duration`].
    pub fn validate(&self) -> Result<(), GenerationError> {
        for (kind, value) in [
            ("generating", self.generating),
            ("completing", self.completing),
            ("reset", self.reset),
        ] {
            if Duration::try_from_secs_f32(value).is_err() {
                return Err(GenerationError::InvalidDelay { kind });
            }
        }
        Ok(())
    }

    /// Pause after placement and collapse events. Unrepresentable values give zero.
    pub fn generating_delay(&self) -> Duration {
        seconds(self.generating)
    }

    /// Pause after mirror and outline events.
    pub fn completing_delay(&self) -> Duration {
        seconds(self.completing)
    }

    /// Pause after a reset.
    pub fn reset_delay(&self) -> Duration {
        seconds(self.reset)
    }
}

impl Default for DelayTimings {
    fn default() -> Self {
        Self::none()
    }
}

/// A border upgrade applied to one cell around the ghost box, positioned
/// relative to the first mirrored column on the middle row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GhostBoxDecoration {
    /// Column offset from the anchor.
    pub dx: isize,
    /// Row offset from the anchor.
    pub dy: isize,
    /// Border drawn on the cell.
    pub section: SpriteSection,
}

impl GhostBoxDecoration {
    /// Draws `section` at offset `(dx, dy)`.
    pub fn new(dx: isize, dy: isize, section: SpriteSection) -> Self {
        Self { dx, dy, section }
    }

    /// Decorations outlining the two-cell ghost box with its door on top.
    pub fn pacman() -> Vec<Self> {
        use SpriteSection as S;
        vec![
            Self::new(-1, 1, S::GhostLeftEntrance),
            Self::new(0, 1, S::GhostRightEntrance),
            Self::new(-2, 1, S::GhostTopLeft),
            Self::new(1, 1, S::GhostTopRight),
            Self::new(-2, 0, S::RightSide),
            Self::new(-2, -1, S::GhostBottomLeft),
            Self::new(1, -1, S::GhostBottomRight),
            Self::new(1, 0, S::LeftSide),
            Self::new(-1, -1, S::TopSide),
            Self::new(0, -1, S::TopSide),
        ]
    }

    /// Grid position for a box anchored at `(anchor_x, anchor_y)`, if it lies
    /// inside a `width` x `height` grid.
    pub fn position(&self, (anchor_x, anchor_y): (usize, usize), width: usize, height: usize) -> Option<(usize, usize)> {
        let x = anchor_x.checked_add_signed(self.dx).filter(|&x| x < width)?;
        let y = anchor_y.checked_add_signed(self.dy).filter(|&y| y < height)?;
        Some((x, y))
    }
}

/// Everything the generator needs besides the tiles.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratorConfig {
    /// Rows.
    pub height: usize,
    /// Requested columns, rounded up to even by [`GeneratorConfig::width`].
    #[serde(rename = "width")]
    pub requested_width: usize,
    /// Fresh grids tried before giving up.
    #[serde(default = "default_attempts")]
    pub max_grid_attempts: usize,
    /// Collapse cycles tried on one grid before starting a fresh one.
    #[serde(default = "default_attempts")]
    pub max_collapse_attempts: usize,
    /// Taller grids mirror a whole column per progress event.
    #[serde(default = "default_column_batch_height")]
    pub column_batch_height: usize,
    /// Pauses suggested to whoever animates the events.
    #[serde(default)]
    pub timings: DelayTimings,
    /// Borders drawn around the ghost box once the level is complete.
    #[serde(default = "GhostBoxDecoration::pacman")]
    pub ghost_box: Vec<GhostBoxDecoration>,
}

impl GeneratorConfig {
    /// Configuration with default limits, timings picked by size and the
    /// standard ghost box.
    pub fn new(height: usize, width: usize) -> Result<Self, GenerationError> {
        let config = Self {
            height,
            requested_width: width,
            max_grid_attempts: default_attempts(),
            max_collapse_attempts: default_attempts(),
            column_batch_height: default_column_batch_height(),
            timings: DelayTimings::for_cell_count(height * (width.div_ceil(2))),
            ghost_box: GhostBoxDecoration::pacman(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a YAML configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read generator config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse generator config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the timings.
    pub fn with_timings(mut self, timings: DelayTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Replaces both retry limits.
    pub fn with_attempts(mut self, max_grid_attempts: usize, max_collapse_attempts: usize) -> Self {
        self.max_grid_attempts = max_grid_attempts;
        self.max_collapse_attempts = max_collapse_attempts;
        self
    }

    /// Checks the grid size and the timings.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.height < MIN_HEIGHT || self.width() < MIN_WIDTH {
            return Err(GenerationError::GridTooSmall {
                height: self.height,
                width: self.width(),
            });
        }
        self.timings.validate()
    }

    /// Columns, always even.
    pub fn width(&self) -> usize {
        self.requested_width + self.requested_width % 2
    }

    /// Columns produced by collapsing; the rest are mirrored.
    pub fn gen_width(&self) -> usize {
        self.width() / 2
    }

    /// Row holding the tunnel and the ghost box.
    pub fn middle(&self) -> usize {
        self.height / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_is_rounded_up_to_even() {
        let config = GeneratorConfig::new(7, 9).unwrap();
        assert_eq!(config.width(), 10);
        assert_eq!(config.gen_width(), 5);
        assert_eq!(config.middle(), 3);
    }

    #[test]
    fn test_small_grids_are_rejected() {
        assert_eq!(
            GeneratorConfig::new(2, 8),
            Err(GenerationError::GridTooSmall { height: 2, width: 8 })
        );
        assert_eq!(
            GeneratorConfig::new(5, 5),
            Err(GenerationError::GridTooSmall { height: 5, width: 6 })
        );
        assert!(GeneratorConfig::new(3, 7).is_ok());
    }

    #[test]
    fn test_timings_follow_cell_count() {
        assert_eq!(DelayTimings::for_cell_count(120), DelayTimings::normal());
        assert_eq!(DelayTimings::for_cell_count(121), DelayTimings::fast());
        assert_eq!(DelayTimings::for_cell_count(1000), DelayTimings::ultra());
        assert_eq!(DelayTimings::for_cell_count(1001), DelayTimings::none());
        assert_eq!(DelayTimings::none().reset_delay(), Duration::ZERO);
    }

    #[test]
    fn test_decoration_position_bounds() {
        let decoration = GhostBoxDecoration::new(-2, 1, SpriteSection::GhostTopLeft);
        assert_eq!(decoration.position((4, 3), 8, 7), Some((2, 4)));
        assert_eq!(decoration.position((1, 3), 8, 7), None);
        assert_eq!(decoration.position((4, 6), 8, 7), None);
    }

    #[test]
    fn test_config_from_yaml() {
        let config: GeneratorConfig = serde_yaml::from_str(
            "
height: 11
width: 15
max_grid_attempts: 5
timings: { generating: 0.1 }
",
        )
        .unwrap();
        assert_eq!(config.width(), 16);
        assert_eq!(config.max_grid_attempts, 5);
        assert_eq!(config.max_collapse_attempts, 20);
        assert!((config.timings.generating - 0.1).abs() < f32::EPSILON);
        assert!(config.timings.reset.abs() < f32::EPSILON);
        assert_eq!(config.ghost_box, GhostBoxDecoration::pacman());
    }

    #[test]
    fn test_unusable_delays_are_rejected() {
        let config: GeneratorConfig = serde_yaml::from_str(
            "
height: 9
width: 12
timings: { generating: -0.5 }
",
        )
        .unwrap();
        assert_eq!(
            config.validate(),
            Err(GenerationError::InvalidDelay { kind: "generating" })
        );

        let base = GeneratorConfig::new(9, 12).unwrap();
        let nan = DelayTimings {
            completing: f32::NAN,
            ..DelayTimings::normal()
        };
        assert_eq!(
            base.clone().with_timings(nan).validate(),
            Err(GenerationError::InvalidDelay { kind: "completing" })
        );
        let huge = DelayTimings {
            reset: f32::MAX,
            ..DelayTimings::normal()
        };
        assert_eq!(
            base.with_timings(huge).validate(),
            Err(GenerationError::InvalidDelay { kind: "reset" })
        );
        assert_eq!(huge.reset_delay(), Duration::ZERO);
        assert!(DelayTimings::normal().validate().is_ok());
    }
}
