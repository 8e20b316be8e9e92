use std::io;

/// Why a save text was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    #[error("save is not valid UTF-8 text")]
    NotText,
    #[error("expected 4 board rows, found {0}")]
    RowCount(usize),
    #[error("row {row} has {found} values, expected 4")]
    ColumnCount { row: usize, found: usize },
    #[error("row {row}, column {col}: '{token}' is not an integer")]
    NotAnInteger { row: usize, col: usize, token: String },
    #[error("row {row}, column {col}: {value} is not a legal tile")]
    IllegalTile { row: usize, col: usize, value: u64 },
    #[error("missing or malformed score line")]
    ScoreLine,
    #[error("score {0} is out of range")]
    ScoreOutOfRange(u64),
    #[error("unexpected data after the score line")]
    TrailingData,
}

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("invalid tile value {0}: expected empty or a power of two up to 131072")]
    InvalidValue(u64),
    #[error("no empty cell to spawn a tile into")]
    NoEmptyCell,
    #[error("corrupt save: {0}")]
    CorruptSave(#[from] Corruption),
    #[error("save unavailable: {0}")]
    IoUnavailable(#[from] io::Error),
}
