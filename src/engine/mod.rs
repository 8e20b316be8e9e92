//! The 4x4 board, move resolution and the single-game engine.

pub mod board;
pub mod state;

pub use board::{Grid, Move, Shifted, Tile, MAX_TILE, SIZE};
pub use state::{GridEngine, MoveOutcome, Phase, Snapshot, Spawn, Turn};

/// Highest score a save may carry.
pub const MAX_SCORE: u64 = 3_885_758;
