use std::fmt;

use crate::error::EngineError;

/// Side length of the (square) board.
pub const SIZE: usize = 4;

/// Largest value a tile may hold (2^17).
pub const MAX_TILE: u32 = 1 << 17;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Board coordinates `(row, col)` of position `pos` on line `line`, where
    /// position 0 touches the edge this move slides toward.
    #[inline]
    fn cell(self, line: usize, pos: usize) -> (usize, usize) {
        match self {
            Move::Left => (line, pos),
            Move::Right => (line, SIZE - 1 - pos),
            Move::Up => (pos, line),
            Move::Down => (SIZE - 1 - pos, line),
        }
    }
}

/// A single cell: empty, or a power of two in `[2, MAX_TILE]`.
///
/// The only way to build a non-empty `Tile` is through [`Tile::new`], so a
/// `Tile` in hand always satisfies the value invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tile(u32);

impl Tile {
    pub const EMPTY: Tile = Tile(0);
    pub(crate) const TWO: Tile = Tile(2);
    pub(crate) const FOUR: Tile = Tile(4);

    /// Validate `value` as a tile. `0` means empty.
    pub fn new(value: u64) -> Result<Self, EngineError> {
        if value == 0 {
            return Ok(Tile::EMPTY);
        }
        if (2..=u64::from(MAX_TILE)).contains(&value) && value.is_power_of_two() {
            Ok(Tile(value as u32))
        } else {
            Err(EngineError::InvalidValue(value))
        }
    }

    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn doubled(self) -> Result<Tile, EngineError> {
        Tile::new(u64::from(self.0) * 2)
    }
}

/// Outcome of sliding a grid in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shifted {
    pub grid: Grid,
    pub score_delta: u64,
    pub changed: bool,
}

/// The 4x4 board, row-major: row 0 is the top, column 0 the left edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Grid([[Tile; SIZE]; SIZE]);

impl Grid {
    /// A constant empty board.
    pub const EMPTY: Grid = Grid([[Tile::EMPTY; SIZE]; SIZE]);

    /// Build a grid from plain values (`0` = empty), validating every cell.
    ///
    /// ```
    /// use merge_2048::engine::Grid;
    /// let g = Grid::from_values([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// assert_eq!(g.get(0, 2), 4);
    /// assert!(Grid::from_values([[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_err());
    /// ```
    pub fn from_values(values: [[u32; SIZE]; SIZE]) -> Result<Self, EngineError> {
        let mut grid = Grid::EMPTY;
        for (r, row) in values.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                grid.0[r][c] = Tile::new(u64::from(v))?;
            }
        }
        Ok(grid)
    }

    /// Plain values of every cell (`0` = empty).
    pub fn to_values(&self) -> [[u32; SIZE]; SIZE] {
        self.0.map(|row| row.map(Tile::value))
    }

    /// Value at `(row, col)`; `0` when empty. Panics if out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.0[row][col].value()
    }

    #[inline]
    pub fn tile(&self, row: usize, col: usize) -> Tile {
        self.0[row][col]
    }

    /// Set `(row, col)` to `value`, rejecting anything that is not a legal tile.
    /// The grid is unchanged on error.
    pub fn set(&mut self, row: usize, col: usize, value: u64) -> Result<(), EngineError> {
        self.0[row][col] = Tile::new(value)?;
        Ok(())
    }

    #[inline]
    pub(crate) fn put(&mut self, row: usize, col: usize, tile: Tile) {
        self.0[row][col] = tile;
    }

    /// Iterate `(row, col, value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        self.0
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, t)| (r, c, t.value())))
    }

    /// Count the number of empty cells.
    pub fn count_empty(&self) -> usize {
        self.cells().filter(|&(_, _, v)| v == 0).count()
    }

    /// Return the highest tile value present (0 on an empty board).
    pub fn highest_tile(&self) -> u32 {
        self.cells().map(|(_, _, v)| v).max().unwrap_or(0)
    }

    /// Slide and merge every line toward the edge named by `dir`. No randomness.
    ///
    /// Fails with [`EngineError::InvalidValue`] if a merge would exceed
    /// [`MAX_TILE`]; `self` is never modified.
    pub fn shift(&self, dir: Move) -> Result<Shifted, EngineError> {
        let mut out = *self;
        let mut score_delta = 0;
        for line_idx in 0..SIZE {
            let mut line = [Tile::EMPTY; SIZE];
            for (pos, slot) in line.iter_mut().enumerate() {
                let (r, c) = dir.cell(line_idx, pos);
                *slot = self.0[r][c];
            }
            score_delta += resolve_line(&mut line)?;
            for (pos, tile) in line.into_iter().enumerate() {
                let (r, c) = dir.cell(line_idx, pos);
                out.0[r][c] = tile;
            }
        }
        Ok(Shifted { grid: out, score_delta, changed: out != *self })
    }

    /// True if no move in any direction changes the board.
    ///
    /// A merge that would overflow [`MAX_TILE`] does not count as a legal move.
    pub fn is_game_over(&self) -> bool {
        Move::ALL
            .iter()
            .all(|&dir| !matches!(self.shift(dir), Ok(s) if s.changed))
    }
}

/// Resolve one line in place, position 0 being the target edge. Returns the
/// score gained.
///
/// Each `cur` slot pulls in the first tile behind it when empty, then either
/// merges with the next tile of equal value or packs a differing tile against
/// itself. Once `cur` has merged or been blocked it is final, so a tile merges
/// at most once per move.
fn resolve_line(line: &mut [Tile; SIZE]) -> Result<u64, EngineError> {
    let mut gained = 0;
    for cur in 0..SIZE - 1 {
        for next in cur + 1..SIZE {
            let incoming = line[next];
            if incoming.is_empty() {
                continue;
            }
            if line[cur].is_empty() {
                line[cur] = incoming;
                line[next] = Tile::EMPTY;
                continue;
            }
            if line[cur] == incoming {
                let merged = incoming.doubled()?;
                line[cur] = merged;
                line[next] = Tile::EMPTY;
                gained += u64::from(merged.value());
            } else if next > cur + 1 {
                line[cur + 1] = incoming;
                line[next] = Tile::EMPTY;
            }
            break;
        }
    }
    Ok(gained)
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grid({:?})", self.to_values())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.0.iter().enumerate() {
            if r > 0 {
                writeln!(f, "{}", "-".repeat(8 * SIZE - 1))?;
            }
            let cells: Vec<String> = row.iter().map(|t| format_val(*t)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(tile: Tile) -> String {
    if tile.is_empty() {
        " ".repeat(7)
    } else {
        format!("{:^7}", tile.value())
    }
}
