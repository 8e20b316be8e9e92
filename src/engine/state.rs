use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::board::{Grid, Move, Tile, SIZE};
use crate::error::EngineError;
use crate::save;

/// Where the engine is in the move protocol.
///
/// Between turns the engine normally sits in `MoveApplied`: the last turn stays
/// undoable until the next move replaces the baseline. Either phase accepts a
/// move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The baseline equals the current state, after a commit, rollback, reset
    /// or restore.
    Idle,
    /// A move (and its spawn) ran since the baseline was taken; a rollback
    /// undoes it.
    MoveApplied,
}

/// A full copy of the board and score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Snapshot {
    pub grid: Grid,
    pub score: u64,
}

/// Result of [`GridEngine::apply_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub changed: bool,
    pub score_delta: u64,
}

/// A tile placed by [`GridEngine::spawn_tile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    pub row: usize,
    pub col: usize,
    pub value: u32,
}

/// Report of a full turn run through [`GridEngine::make_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub outcome: MoveOutcome,
    pub spawn: Option<Spawn>,
}

/// Owns one game: the grid, the score and a single level of undo.
///
/// The expected calling protocol for each user action is
/// [`apply_move`](Self::apply_move), then [`spawn_tile`](Self::spawn_tile) if
/// the move changed the board, then [`commit`](Self::commit).
/// [`make_move`](Self::make_move) runs the move and the spawn only; it leaves
/// the turn uncommitted so it can still be rolled back.
///
/// ```
/// use merge_2048::engine::{GridEngine, Move};
/// let mut engine = GridEngine::seeded(7);
/// assert_eq!(engine.grid().count_empty(), 15);
/// let out = engine.apply_move(Move::Left).unwrap();
/// if out.changed {
///     engine.spawn_tile().unwrap();
/// }
/// engine.commit();
/// assert!(!engine.has_changed());
/// ```
#[derive(Debug, Clone)]
pub struct GridEngine<R = StdRng> {
    grid: Grid,
    score: u64,
    baseline: Snapshot,
    baseline_held: bool,
    phase: Phase,
    rng: R,
}

impl GridEngine<StdRng> {
    /// A fresh game seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A fresh game with a deterministic tile sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for GridEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> GridEngine<R> {
    /// A fresh game (one spawned tile) drawing randomness from `rng`.
    pub fn with_rng(rng: R) -> Self {
        let mut engine = GridEngine {
            grid: Grid::EMPTY,
            score: 0,
            baseline: Snapshot::default(),
            baseline_held: false,
            phase: Phase::Idle,
            rng,
        };
        engine.reset();
        engine
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Value at `(row, col)`; `0` when empty.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> u32 {
        self.grid.get(row, col)
    }

    /// The state a rollback would return to.
    #[inline]
    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot { grid: self.grid, score: self.score }
    }

    /// True if the cell differs from the undo baseline.
    pub fn cell_changed(&self, row: usize, col: usize) -> bool {
        self.grid.tile(row, col) != self.baseline.grid.tile(row, col)
    }

    /// True if any cell differs from the undo baseline.
    pub fn has_changed(&self) -> bool {
        self.grid != self.baseline.grid
    }

    /// Coordinates of every cell that differs from the undo baseline.
    pub fn changed_cells(&self) -> Vec<(usize, usize)> {
        (0..SIZE)
            .flat_map(|r| (0..SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.cell_changed(r, c))
            .collect()
    }

    pub fn highest_tile(&self) -> u32 {
        self.grid.highest_tile()
    }

    /// True if no move can change the board. Play is never blocked on this.
    pub fn is_game_over(&self) -> bool {
        self.grid.is_game_over()
    }

    /// Take the undo baseline now; the next [`apply_move`](Self::apply_move)
    /// will keep it instead of capturing its own.
    pub fn capture_baseline(&mut self) {
        self.baseline = self.snapshot();
        self.baseline_held = true;
    }

    /// Slide and merge toward `dir`, updating grid and score.
    ///
    /// On error (a merge beyond the tile ceiling) nothing is modified.
    pub fn apply_move(&mut self, dir: Move) -> Result<MoveOutcome, EngineError> {
        let shifted = self.grid.shift(dir)?;
        if !self.baseline_held {
            self.baseline = self.snapshot();
        }
        self.baseline_held = false;
        self.grid = shifted.grid;
        self.score += shifted.score_delta;
        self.phase = Phase::MoveApplied;
        debug!(
            "move {:?}: changed={} score_delta={} score={}",
            dir, shifted.changed, shifted.score_delta, self.score
        );
        Ok(MoveOutcome { changed: shifted.changed, score_delta: shifted.score_delta })
    }

    /// Place a 2 (3/4) or 4 (1/4) on a uniformly chosen empty cell.
    pub fn spawn_tile(&mut self) -> Result<Spawn, EngineError> {
        if self.grid.count_empty() == 0 {
            return Err(EngineError::NoEmptyCell);
        }
        let (row, col) = loop {
            let r = self.rng.gen_range(0..SIZE);
            let c = self.rng.gen_range(0..SIZE);
            if self.grid.tile(r, c).is_empty() {
                break (r, c);
            }
        };
        Ok(self.place(row, col))
    }

    /// Clear the board and score, spawn one tile and make that the baseline.
    pub fn reset(&mut self) -> Spawn {
        self.grid = Grid::EMPTY;
        self.score = 0;
        // every cell is empty, so the first sample always lands
        let row = self.rng.gen_range(0..SIZE);
        let col = self.rng.gen_range(0..SIZE);
        let spawn = self.place(row, col);
        self.commit();
        info!("new game: {} at ({}, {})", spawn.value, spawn.row, spawn.col);
        spawn
    }

    /// Restore grid and score from the undo baseline. Repeating it is a no-op.
    pub fn rollback(&mut self) {
        self.grid = self.baseline.grid;
        self.score = self.baseline.score;
        self.baseline_held = false;
        self.phase = Phase::Idle;
        info!("rolled back to score {}", self.score);
    }

    /// Fix the current state as the rollback target.
    pub fn commit(&mut self) {
        self.baseline = self.snapshot();
        self.baseline_held = false;
        self.phase = Phase::Idle;
    }

    /// Replace the game with `snapshot`. The state it replaces becomes the
    /// baseline, so a rollback undoes the restore.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.baseline = self.snapshot();
        self.baseline_held = false;
        self.grid = snapshot.grid;
        self.score = snapshot.score;
        self.phase = Phase::Idle;
        info!("restored game with score {}", self.score);
    }

    /// The save text for the current grid and score.
    pub fn serialize(&self) -> String {
        save::serialize(&self.snapshot())
    }

    /// Parse `text` and restore it. A corrupt text leaves the engine untouched.
    pub fn load_text(&mut self, text: &str) -> Result<(), EngineError> {
        let snapshot = save::deserialize(text)?;
        self.restore(snapshot);
        Ok(())
    }

    /// Run one turn: move, then spawn if the board changed.
    ///
    /// The turn is left uncommitted so [`rollback`](Self::rollback) can still
    /// undo it; the next move takes its own baseline.
    pub fn make_move(&mut self, dir: Move) -> Result<Turn, EngineError> {
        let outcome = self.apply_move(dir)?;
        let spawn = if outcome.changed { Some(self.spawn_tile()?) } else { None };
        Ok(Turn { outcome, spawn })
    }

    fn place(&mut self, row: usize, col: usize) -> Spawn {
        let tile = if self.rng.gen_range(0..4) < 3 { Tile::TWO } else { Tile::FOUR };
        self.grid.put(row, col, tile);
        debug!("spawned {} at ({}, {})", tile.value(), row, col);
        Spawn { row, col, value: tile.value() }
    }
}
