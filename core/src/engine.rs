use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No game has been started yet.
    Empty,
    Playing,
    /// The win tile was reached; play may continue.
    Won,
    /// The grid is full and nothing can merge.
    Stalemate,
}

impl EngineState {
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    pub const fn has_won(self) -> bool {
        matches!(self, Self::Won)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Stalemate)
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Empty
    }
}

/// One cell whose value differs after a move, or that received a merged tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    pub index: CellIndex,
    pub old: Tile,
    pub new: Tile,
    pub was_merge: bool,
}

/// Everything a front end needs to animate a move attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    pub moved: bool,
    pub direction: Direction,
    pub changes: SmallVec<[CellChange; CELL_COUNT]>,
    pub score_delta: Score,
    pub spawned: Option<SpawnedTile>,
    pub is_win: bool,
    pub is_game_over: bool,
}

impl MoveResult {
    /// Changes that produced a merged tile, with the merged value in `new`.
    pub fn merges(&self) -> impl Iterator<Item = &CellChange> {
        self.changes.iter().filter(|change| change.was_merge)
    }
}

/// Candidate outcome of a move, computed without touching the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovePlan {
    base: Grid,
    grid: Grid,
    result: MoveResult,
}

impl MovePlan {
    pub fn moved(&self) -> bool {
        self.result.moved
    }

    pub fn direction(&self) -> Direction {
        self.result.direction
    }

    /// The grid the move would produce, before any tile is spawned.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn result(&self) -> &MoveResult {
        &self.result
    }

    pub fn into_result(self) -> MoveResult {
        self.result
    }
}

/// The single retained pre-move state used by undo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub grid: Grid,
    pub score: Score,
    state: EngineState,
}

#[derive(Clone, Debug)]
pub struct GridEngine {
    config: EngineConfig,
    grid: Grid,
    score: Score,
    best_score: Score,
    state: EngineState,
    snapshot: Option<Snapshot>,
    rng: SmallRng,
}

impl GridEngine {
    /// Creates an engine with an empty grid. Call [`GridEngine::new_game`] or
    /// [`GridEngine::restore`] to start playing.
    pub fn new(config: EngineConfig, seed: u64, best_score: Score) -> Self {
        Self {
            config,
            grid: Grid::EMPTY,
            score: 0,
            best_score,
            state: Default::default(),
            snapshot: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn best_score(&self) -> Score {
        self.best_score
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn can_undo(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn max_tile(&self) -> Tile {
        self.grid.max_tile()
    }

    pub fn empty_count(&self) -> usize {
        self.grid.empty_count()
    }

    /// Replaces the random source, so the next game plays out differently.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Clears the board, score and undo snapshot, then places two tiles.
    pub fn new_game(&mut self) -> [Option<SpawnedTile>; 2] {
        self.grid = Grid::EMPTY;
        self.score = 0;
        self.snapshot = None;
        self.state = EngineState::Empty;

        let spawned = [self.spawn_tile(), self.spawn_tile()];
        self.refresh_state();
        log::debug!("new game: {:?}", spawned);
        spawned
    }

    /// Computes what `direction` would do to the current grid.
    ///
    /// Each line is read in move order through [`Direction::line`], slid toward
    /// its front, and written back through the same indices.
    pub fn attempt_move(&self, direction: Direction) -> MovePlan {
        let mut grid = self.grid;
        let mut changes = SmallVec::new();
        let mut score_delta: Score = 0;

        for line in 0..SIDE {
            let before = self.grid.line(direction, line);
            let slide = slide_line(before);
            score_delta += slide.gained;

            for (step, index) in direction.line(line).into_iter().enumerate() {
                let (old, new) = (before[step], slide.cells[step]);
                let was_merge = slide.merged[step];
                if old != new || was_merge {
                    changes.push(CellChange {
                        index,
                        old,
                        new,
                        was_merge,
                    });
                }
            }
            grid.set_line(direction, line, slide.cells);
        }

        let moved = grid != self.grid;
        log::trace!("attempt {}: moved={} delta={}", direction, moved, score_delta);

        MovePlan {
            base: self.grid,
            grid,
            result: MoveResult {
                moved,
                direction,
                changes,
                score_delta,
                spawned: None,
                is_win: self.is_win(),
                is_game_over: self.is_game_over(),
            },
        }
    }

    pub fn can_move(&self, direction: Direction) -> bool {
        self.attempt_move(direction).moved()
    }

    pub fn legal_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL
            .into_iter()
            .filter(move |&direction| self.can_move(direction))
    }

    /// Stores the current grid and score as the undo point, replacing any earlier one.
    ///
    /// [`GridEngine::apply`] takes this snapshot itself before committing a move.
    pub fn snapshot(&mut self) {
        self.snapshot = Some(Snapshot {
            grid: self.grid,
            score: self.score,
            state: self.state,
        });
    }

    /// Commits a planned move: snapshots for undo, replaces the grid and adds
    /// the merge score.
    ///
    /// A plan computed against a grid that has since changed is recomputed
    /// for the current grid first. Plans that did not move are returned as is
    /// and leave the undo snapshot alone.
    pub fn apply(&mut self, plan: MovePlan) -> MoveResult {
        let plan = if plan.base == self.grid {
            plan
        } else {
            log::warn!("stale move plan for {}, recomputing", plan.direction());
            self.attempt_move(plan.direction())
        };

        if !plan.moved() {
            return plan.into_result();
        }

        self.snapshot();
        self.grid = plan.grid;
        self.score = self.score.saturating_add(plan.result.score_delta);
        if self.score > self.best_score {
            self.best_score = self.score;
        }
        plan.result
    }

    /// Places a new tile on a random empty cell. Does nothing on a full grid.
    pub fn spawn_tile(&mut self) -> Option<SpawnedTile> {
        let spawned = pick_spawn(&self.grid, self.config.spawn, &mut self.rng)?;
        self.grid[spawned.index] = spawned.value;
        log::debug!("spawned {} at {}", spawned.value, spawned.index);
        Some(spawned)
    }

    pub fn is_win(&self) -> bool {
        self.grid.contains(self.config.win_tile)
    }

    pub fn is_game_over(&self) -> bool {
        self.grid.is_full() && !self.grid.has_adjacent_pair()
    }

    /// Re-evaluates the engine state from the current grid. `Won` latches until
    /// a new game, an undo, or a stalemate.
    pub fn refresh_state(&mut self) -> EngineState {
        let next = if self.grid.is_empty() {
            EngineState::Empty
        } else if self.is_game_over() {
            EngineState::Stalemate
        } else if self.state.has_won() || self.is_win() {
            EngineState::Won
        } else {
            EngineState::Playing
        };

        if next != self.state {
            match next {
                EngineState::Won => log::info!("reached {}", self.config.win_tile),
                EngineState::Stalemate => log::info!("no moves left, final score {}", self.score),
                _ => {}
            }
            self.state = next;
        }
        next
    }

    /// Restores the grid and score from the snapshot and consumes it.
    ///
    /// Returns false, changing nothing, when there is no snapshot.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.snapshot.take() else {
            return false;
        };

        self.grid = snapshot.grid;
        self.score = snapshot.score;
        self.state = snapshot.state;
        log::debug!("undo to score {}", self.score);
        true
    }

    /// Replaces the whole game with `saved`, or leaves the engine untouched if it is malformed.
    pub fn restore(&mut self, saved: &SavedGame) -> Result<()> {
        let grid = saved.validate()?;

        self.grid = grid;
        self.score = saved.score;
        self.best_score = self.best_score.max(saved.best_score);
        self.snapshot = None;
        self.state = EngineState::Empty;
        self.refresh_state();
        Ok(())
    }

    pub fn to_saved(&self) -> SavedGame {
        SavedGame {
            grid: self.grid.cells().to_vec(),
            score: self.score,
            best_score: self.best_score,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_grid(&mut self, grid: Grid) {
        self.grid = grid;
        self.state = EngineState::Empty;
        self.refresh_state();
    }
}
