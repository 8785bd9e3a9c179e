//! The step-by-step level generator and the events it reports.

use log::{debug, info, warn};
use rand::Rng;
use std::{collections::VecDeque, time::Duration};

use super::completion::{OutlineWalk, apply_outline, decorate_ghost_box, is_inside, mirror_column};
use crate::{Cell, DoubleEdgeRules, GenerationError, GeneratorConfig, Grid, Level, SpriteParts, Tile, Tileset};

/// Outcome of the most recent collapse step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveStatus {
    /// Nothing collapsed yet.
    NotStarted,
    /// Collapsing.
    Running,
    /// Every generated cell collapsed.
    Finished,
    /// A cell ran out of candidates.
    Error,
    /// Part of the maze can no longer reach the start.
    Invalid,
}

/// What a renderer needs to redraw one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSnapshot {
    /// Column.
    pub x: usize,
    /// Row, counted from the bottom.
    pub y: usize,
    /// Remaining candidates, zero once collapsed.
    pub entropy: usize,
    /// Whether a tile has been committed.
    pub collapsed: bool,
    /// Parts of the committed tile, once there is one.
    pub sprite_parts: Option<SpriteParts>,
}

impl From<&Cell> for CellSnapshot {
    fn from(cell: &Cell) -> Self {
        Self {
            x: cell.x(),
            y: cell.y(),
            entropy: cell.entropy(),
            collapsed: cell.is_collapsed(),
            sprite_parts: cell.tile().map(|tile| *tile.sprite_parts()),
        }
    }
}

/// The change a progress event reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// A single cell changed.
    Cell(CellSnapshot),
    /// Several cells changed in one step, such as a mirrored column.
    Cells(Vec<CellSnapshot>),
    /// Every unpinned cell went back to its full candidate set, or a fresh
    /// grid was started.
    Reset,
    /// The level is finished.
    Complete,
}

/// One progress event and how long a viewer should pause after showing it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationProgress {
    /// What changed.
    pub update: Update,
    /// Suggested pause, taken from the configured timings.
    pub delay: Duration,
}

#[derive(Debug)]
enum Phase {
    PlaceTunnel,
    PlaceGhostBox,
    Collapse,
    /// Columns still to mirror, working from the middle outwards.
    Mirror(usize),
    Outline(OutlineWalk),
    Decorate,
    Complete,
    Done,
    Failed(GenerationError),
}

/// Generates one level, one progress event at a time.
///
/// Drive it with [`Generator::advance`] to watch it work, or call
/// [`Generator::run`] to go straight to the finished [`Level`].
pub struct Generator<R: Rng> {
    tileset: Tileset,
    rules: DoubleEdgeRules,
    config: GeneratorConfig,
    rng: R,
    grid: Grid,
    phase: Phase,
    status: WaveStatus,
    message: String,
    pending: VecDeque<GenerationProgress>,
    last: Option<GenerationProgress>,
    grid_attempt: usize,
    collapse_attempt: usize,
}

impl<R: Rng> Generator<R> {
    /// Validates `config` and prepares an empty grid. Nothing is placed until
    /// the first [`Generator::advance`].
    pub fn new(tileset: Tileset, rules: DoubleEdgeRules, config: GeneratorConfig, rng: R) -> Result<Self, GenerationError> {
        config.validate()?;
        let grid = Grid::new(&config, &tileset);
        Ok(Self {
            tileset,
            rules,
            config,
            rng,
            grid,
            phase: Phase::PlaceTunnel,
            status: WaveStatus::NotStarted,
            message: String::new(),
            pending: VecDeque::new(),
            last: None,
            grid_attempt: 1,
            collapse_attempt: 1,
        })
    }

    /// Settings the generator was built with.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The grid as it stands after the last event.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Outcome of the most recent collapse step.
    pub fn status(&self) -> WaveStatus {
        self.status
    }

    /// Latest human-readable status line.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The event returned by the last successful [`Generator::advance`].
    pub fn last_progress(&self) -> Option<&GenerationProgress> {
        self.last.as_ref()
    }

    /// `(grid attempt, collapse attempt on that grid)`, both counted from one.
    pub fn attempts(&self) -> (usize, usize) {
        (self.grid_attempt, self.collapse_attempt)
    }

    /// True once the level is finished and decorated.
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    /// Collapsed tile at `(x, y)`, if any.
    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        self.grid.tile(x, y)
    }

    /// Whether every active generated cell can still reach the start.
    pub fn is_valid(&self) -> bool {
        self.grid.is_valid()
    }

    /// The finished level, once there is one.
    pub fn level(&self) -> Option<Level> {
        self.is_complete()
            .then(|| self.grid.to_level(&self.tileset.empty_tile()))
    }

    /// Runs until the next progress event.
    ///
    /// Returns `Ok(false)` once the level is complete. Running out of attempts
    /// is an error, and stays one on every later call.
    pub fn advance(&mut self) -> Result<bool, GenerationError> {
        loop {
            if let Some(progress) = self.pending.pop_front() {
                self.last = Some(progress);
                return Ok(true);
            }
            match &self.phase {
                Phase::Done => return Ok(false),
                Phase::Failed(error) => return Err(error.clone()),
                _ => {}
            }
            if let Err(error) = self.step() {
                self.pending.clear();
                self.phase = Phase::Failed(error.clone());
                return Err(error);
            }
        }
    }

    /// Advances to the end and returns the level.
    pub fn run(mut self) -> Result<Level, GenerationError> {
        while self.advance()? {}
        Ok(self.grid.to_level(&self.tileset.empty_tile()))
    }

    fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    fn push(&mut self, update: Update, delay: Duration) {
        self.pending.push_back(GenerationProgress { update, delay });
    }

    fn push_cells(&mut self, positions: &[(usize, usize)], delay: Duration) {
        let mut snapshots: Vec<CellSnapshot> = positions
            .iter()
            .map(|&pos| CellSnapshot::from(self.grid.cell_at(pos)))
            .collect();
        match snapshots.len() {
            0 => {}
            1 => self.push(Update::Cell(snapshots.remove(0)), delay),
            _ => self.push(Update::Cells(snapshots), delay),
        }
    }

    fn step(&mut self) -> Result<(), GenerationError> {
        let timings = self.config.timings;
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::PlaceTunnel => {
                info!(
                    "Placing tunnel and ghost box (grid attempt {}/{})",
                    self.grid_attempt, self.config.max_grid_attempts
                );
                self.set_message("Placing tunnel and ghost box");
                let changed = self.grid.place_tunnel(&self.tileset);
                self.push_cells(&changed, timings.generating_delay());
                self.phase = Phase::PlaceGhostBox;
            }
            Phase::PlaceGhostBox => {
                let changed = self.grid.place_ghost_box(&self.tileset);
                self.push_cells(&changed, timings.generating_delay());
                self.set_message("Running wave function collapse");
                self.phase = Phase::Collapse;
            }
            Phase::Collapse => {
                self.phase = Phase::Collapse;
                self.collapse_step()?;
            }
            Phase::Mirror(0) => self.start_outline(),
            Phase::Mirror(remaining) => {
                let x = remaining - 1;
                let written = mirror_column(&mut self.grid, &self.tileset, x);
                if self.grid.height() > self.config.column_batch_height {
                    self.push_cells(&written, timings.completing_delay());
                } else {
                    for pos in written {
                        self.push_cells(&[pos], timings.completing_delay());
                    }
                }
                self.phase = Phase::Mirror(x);
            }
            Phase::Outline(mut walk) => {
                let (grid, tileset) = (&self.grid, &self.tileset);
                match walk.step(|x, y| is_inside(grid, tileset, x, y))? {
                    Some(visit) => {
                        apply_outline(&mut self.grid, visit, &self.rules);
                        self.push_cells(&[(visit.y, visit.x)], timings.completing_delay());
                        self.phase = Phase::Outline(walk);
                    }
                    None => {
                        debug!("Outline closed after {} cells", walk.steps());
                        self.phase = Phase::Decorate;
                    }
                }
            }
            Phase::Decorate => {
                let decorated = decorate_ghost_box(&mut self.grid, &self.config.ghost_box);
                self.push_cells(&decorated, timings.generating_delay());
                self.phase = Phase::Complete;
            }
            Phase::Complete => {
                info!(
                    "Level complete after {} grid attempt(s) and {} collapse attempt(s) on the last grid",
                    self.grid_attempt, self.collapse_attempt
                );
                self.set_message("Complete");
                self.push(Update::Complete, timings.generating_delay());
                self.phase = Phase::Done;
            }
            phase @ (Phase::Done | Phase::Failed(_)) => self.phase = phase,
        }
        Ok(())
    }

    /// One pass of select, collapse, check and propagate.
    fn collapse_step(&mut self) -> Result<(), GenerationError> {
        let Some(pos) = self.grid.lowest_entropy(&mut self.rng) else {
            return self.finish_collapse();
        };
        self.status = WaveStatus::Running;

        let Some(lost) = self.grid.collapse(pos, &mut self.rng) else {
            self.status = WaveStatus::Error;
            let (y, x) = pos;
            self.set_message(format!("Ran out of candidates at ({x}, {y})"));
            debug!(
                "Cell ({x}, {y}) has no candidates left, resetting (collapse attempt {})",
                self.collapse_attempt
            );
            return self.retry_collapse();
        };

        if !lost.is_empty() && !self.grid.is_valid() {
            self.status = WaveStatus::Invalid;
            self.set_message("Can no longer reach all cells");
            let mut failing = vec![pos];
            failing.extend(self.grid.unreachable());
            debug!(
                "Collapse at ({}, {}) cut off {} cell(s), resetting (collapse attempt {})",
                pos.1,
                pos.0,
                failing.len() - 1,
                self.collapse_attempt
            );
            self.push_cells(&failing, self.config.timings.reset_delay());
            return self.retry_collapse();
        }

        let mut changed = vec![pos];
        changed.extend(self.grid.propagate(pos));
        self.push_cells(&changed, self.config.timings.generating_delay());
        Ok(())
    }

    fn finish_collapse(&mut self) -> Result<(), GenerationError> {
        self.status = WaveStatus::Finished;
        self.set_message("Checking grid is valid");
        if self.grid.is_valid() {
            info!("Generated half is connected, completing grid");
            self.set_message("Completing grid");
            self.phase = Phase::Mirror(self.grid.gen_width());
            Ok(())
        } else {
            info!("Generated half is disconnected, restarting");
            self.set_message("Restarting");
            self.next_grid()
        }
    }

    /// Resets the current grid, or moves to a fresh one once its collapse
    /// attempts are used up.
    fn retry_collapse(&mut self) -> Result<(), GenerationError> {
        if self.collapse_attempt >= self.config.max_collapse_attempts {
            info!(
                "Giving up on grid after {} collapse attempts",
                self.collapse_attempt
            );
            return self.next_grid();
        }
        self.collapse_attempt += 1;
        self.grid.reset();
        self.phase = Phase::Collapse;
        self.push(Update::Reset, self.config.timings.reset_delay());
        Ok(())
    }

    fn next_grid(&mut self) -> Result<(), GenerationError> {
        if self.grid_attempt >= self.config.max_grid_attempts {
            warn!("Could not generate a valid grid after {} attempts", self.grid_attempt);
            self.set_message("Could not generate a valid grid");
            return Err(GenerationError::Exhausted {
                attempts: self.grid_attempt,
            });
        }
        self.grid_attempt += 1;
        self.collapse_attempt = 1;
        self.grid = Grid::new(&self.config, &self.tileset);
        self.status = WaveStatus::NotStarted;
        self.phase = Phase::PlaceTunnel;
        self.push(Update::Reset, self.config.timings.reset_delay());
        Ok(())
    }

    fn start_outline(&mut self) {
        let (width, height) = (self.grid.width(), self.grid.height());
        let (grid, tileset) = (&self.grid, &self.tileset);
        self.phase = match OutlineWalk::new(width, height, |x, y| is_inside(grid, tileset, x, y)) {
            Some(walk) => Phase::Outline(walk),
            None => Phase::Decorate,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DelayTimings;
    use rand::{SeedableRng, rngs::StdRng};

    fn generator(height: usize, width: usize, seed: u64) -> Generator<StdRng> {
        let config = GeneratorConfig::new(height, width).unwrap();
        Generator::new(
            Tileset::pacman(),
            DoubleEdgeRules::pacman(),
            config,
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    #[test]
    fn test_first_events_place_features() {
        let mut generator = generator(7, 8, 1);
        assert_eq!(generator.status(), WaveStatus::NotStarted);
        assert!(generator.last_progress().is_none());

        assert!(generator.advance().unwrap());
        let Update::Cells(cells) = &generator.last_progress().unwrap().update else {
            panic!("Tunnel placement should report several cells");
        };
        assert!(cells.iter().any(|c| (c.x, c.y) == (0, 3) && c.collapsed));
        assert_eq!(generator.message(), "Placing tunnel and ghost box");

        assert!(generator.advance().unwrap());
        assert!(generator.tile(3, 3).unwrap().is_empty());
        assert_eq!(generator.message(), "Running wave function collapse");
    }

    #[test]
    fn test_run_to_completion() {
        let mut generator = generator(9, 10, 42);
        let mut events = 0;
        loop {
            match generator.advance() {
                Ok(true) => events += 1,
                Ok(false) => break,
                Err(error) => panic!("Generation failed: {error}"),
            }
        }
        assert!(generator.is_complete());
        assert!(generator.grid().is_complete());
        assert!(generator.is_valid());
        assert_eq!(generator.last_progress().unwrap().update, Update::Complete);
        assert!(events > 9 * 5);
        assert!(!generator.advance().unwrap());
        assert!(generator.level().is_some());
    }

    #[test]
    fn test_exhausted_attempts_are_sticky() {
        let config = GeneratorConfig::new(7, 8).unwrap().with_attempts(1, 1);
        let tileset = crate::TilesetBuilder::new()
            .add_tiles([
                Tile::empty("blank"),
                Tile::new("horizontal", crate::Directions::LEFT | crate::Directions::RIGHT),
                Tile::new("dead_end", crate::Directions::RIGHT),
            ])
            .candidates(["horizontal"])
            .empty_tile("blank")
            .tunnel_tile("horizontal")
            .ghost_spawn_tile("blank")
            .above_box(["horizontal"])
            .below_box(["horizontal"])
            .side_box(["dead_end"])
            .build()
            .unwrap();
        let mut generator =
            Generator::new(tileset, DoubleEdgeRules::default(), config, StdRng::seed_from_u64(0)).unwrap();

        let error = loop {
            match generator.advance() {
                Ok(true) => {}
                Ok(false) => panic!("Generation should not succeed"),
                Err(error) => break error,
            }
        };
        assert_eq!(error, GenerationError::Exhausted { attempts: 1 });
        assert_eq!(generator.advance(), Err(GenerationError::Exhausted { attempts: 1 }));
        assert!(!generator.is_complete());
    }

    fn tileset_with_dead_ends() -> Tileset {
        use crate::Directions as D;
        let pacman = Tileset::pacman();
        let ends = ["end_up", "end_down", "end_left", "end_right"];
        let candidates: Vec<String> = pacman
            .candidates()
            .iter()
            .map(|tile| tile.name().to_owned())
            .chain(ends.map(String::from))
            .collect();
        crate::TilesetBuilder::new()
            .add_tiles(pacman.tiles().iter().cloned())
            .add_tiles([
                Tile::new("end_up", D::UP),
                Tile::new("end_down", D::DOWN),
                Tile::new("end_left", D::LEFT).with_mirror("end_right"),
                Tile::new("end_right", D::RIGHT).with_mirror("end_left"),
            ])
            .candidates(candidates)
            .empty_tile("tile_empty")
            .tunnel_tile("tile_tunnel")
            .ghost_spawn_tile("tile_ghost_spawn")
            .above_box(["tile_horizontal", "tile_t_up"])
            .below_box(["tile_horizontal", "tile_t_down"])
            .side_box(["tile_vertical", "tile_t_left"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_cut_off_cells_are_shown_before_the_reset() {
        let config = GeneratorConfig::new(7, 8).unwrap().with_timings(DelayTimings::normal());
        let reset_delay = config.timings.reset_delay();

        for seed in 0..20 {
            let mut generator = Generator::new(
                tileset_with_dead_ends(),
                DoubleEdgeRules::pacman(),
                config.clone(),
                StdRng::seed_from_u64(seed),
            )
            .unwrap();
            while let Ok(true) = generator.advance() {
                if generator.status() != WaveStatus::Invalid {
                    continue;
                }
                assert_eq!(generator.message(), "Can no longer reach all cells");
                let failing = generator.last_progress().unwrap().clone();
                assert_eq!(failing.delay, reset_delay);
                let collapsed = match &failing.update {
                    Update::Cell(cell) => cell,
                    Update::Cells(cells) => &cells[0],
                    update => panic!("Expected the failing cells, got {update:?}"),
                };
                assert!(collapsed.collapsed);
                assert!(collapsed.x < generator.grid().gen_width());

                assert!(generator.advance().unwrap());
                let reset = generator.last_progress().unwrap();
                assert_eq!(reset.update, Update::Reset);
                assert_eq!(reset.delay, reset_delay);
                return;
            }
        }
        panic!("No seed cut off part of the maze");
    }

    #[test]
    fn test_tall_grids_mirror_a_column_per_event() {
        let mut config = GeneratorConfig::new(7, 8).unwrap().with_timings(DelayTimings::normal());
        let completing = config.timings.completing_delay();
        let gen_width = config.gen_width();

        let mirrored_batches = |config: GeneratorConfig| {
            let mut generator = Generator::new(
                Tileset::pacman(),
                DoubleEdgeRules::pacman(),
                config,
                StdRng::seed_from_u64(3),
            )
            .unwrap();
            let mut batches = Vec::new();
            while generator.advance().unwrap() {
                let progress = generator.last_progress().unwrap();
                if let Update::Cells(cells) = &progress.update {
                    if progress.delay == completing {
                        batches.push(cells.iter().map(|cell| (cell.x, cell.y)).collect::<Vec<_>>());
                    }
                }
            }
            batches
        };

        assert!(mirrored_batches(config.clone()).is_empty());

        config.column_batch_height = 2;
        let batches = mirrored_batches(config);
        assert_eq!(batches.len(), gen_width);
        for (i, batch) in batches.iter().enumerate() {
            let expected: Vec<_> = (0..7).map(|y| (gen_width + i, y)).collect();
            assert_eq!(*batch, expected);
        }
    }

    #[test]
    fn test_unusable_delay_is_rejected() {
        let config = GeneratorConfig::new(7, 8).unwrap().with_timings(DelayTimings {
            reset: -1.0,
            ..DelayTimings::none()
        });
        let result = Generator::new(
            Tileset::pacman(),
            DoubleEdgeRules::pacman(),
            config,
            StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(GenerationError::InvalidDelay { kind: "reset" })));
    }

    #[test]
    fn test_too_small_grid_is_rejected() {
        let config = GeneratorConfig {
            height: 2,
            ..GeneratorConfig::new(3, 8).unwrap()
        };
        let result = Generator::new(
            Tileset::pacman(),
            DoubleEdgeRules::pacman(),
            config,
            StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(GenerationError::GridTooSmall { height: 2, width: 8 })));
    }
}
