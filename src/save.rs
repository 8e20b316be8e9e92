//! Human-readable save format.
//!
//! Four lines of four space-separated integers (row-major, `1` marks an empty
//! cell), followed by a `score <N>` line:
//!
//! ```text
//! 2 1 1 4
//! 1 1 1 1
//! 1 8 1 1
//! 1 1 1 2
//! score 24
//! ```
//!
//! [`deserialize`] validates the whole text before returning, so a caller
//! never sees a partially applied save. [`read_save`] and [`write_save`] are
//! the file transport; writes go through a sibling temporary file that is
//! renamed over the target.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::Rng;

use crate::engine::{Grid, GridEngine, Snapshot, Tile, MAX_SCORE, SIZE};
use crate::error::{Corruption, EngineError};

/// How an empty cell is written in the save text.
pub const EMPTY_CODE: u64 = 1;

const SCORE_PREFIX: &str = "score ";

/// Render `snapshot` in the save format (newline-terminated).
pub fn serialize(snapshot: &Snapshot) -> String {
    let mut out = String::with_capacity(96);
    for row in 0..SIZE {
        let values: Vec<String> = (0..SIZE)
            .map(|col| match snapshot.grid.get(row, col) {
                0 => EMPTY_CODE.to_string(),
                v => v.to_string(),
            })
            .collect();
        out.push_str(&values.join(" "));
        out.push('\n');
    }
    out.push_str(SCORE_PREFIX);
    out.push_str(&snapshot.score.to_string());
    out.push('\n');
    out
}

/// Parse and fully validate a save text.
pub fn deserialize(text: &str) -> Result<Snapshot, EngineError> {
    parse(text).map_err(|reason| {
        warn!("rejected save: {reason}");
        EngineError::CorruptSave(reason)
    })
}

fn parse(text: &str) -> Result<Snapshot, Corruption> {
    let mut lines = text.lines();
    let mut grid = Grid::EMPTY;
    for row in 0..SIZE {
        let line = match lines.next() {
            Some(l) if !l.starts_with(SCORE_PREFIX.trim_end()) => l,
            _ => return Err(Corruption::RowCount(row)),
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != SIZE {
            return Err(Corruption::ColumnCount { row, found: tokens.len() });
        }
        for (col, token) in tokens.into_iter().enumerate() {
            let value: u64 = token.parse().map_err(|_| Corruption::NotAnInteger {
                row,
                col,
                token: token.to_string(),
            })?;
            let tile = decode_tile(value).ok_or(Corruption::IllegalTile { row, col, value })?;
            grid.put(row, col, tile);
        }
    }
    let score = parse_score(lines.next().ok_or(Corruption::ScoreLine)?)?;
    if lines.any(|l| !l.trim().is_empty()) {
        return Err(Corruption::TrailingData);
    }
    Ok(Snapshot { grid, score })
}

fn decode_tile(value: u64) -> Option<Tile> {
    match value {
        EMPTY_CODE => Some(Tile::EMPTY),
        // 0 is the in-memory empty marker, never a saved value
        0 => None,
        v => Tile::new(v).ok(),
    }
}

fn parse_score(line: &str) -> Result<u64, Corruption> {
    let digits = line.trim_end().strip_prefix(SCORE_PREFIX).ok_or(Corruption::ScoreLine)?;
    let score: u64 = digits.trim().parse().map_err(|_| Corruption::ScoreLine)?;
    if score > MAX_SCORE {
        return Err(Corruption::ScoreOutOfRange(score));
    }
    Ok(score)
}

/// Read and validate the save at `path`.
///
/// A missing or unreadable file is [`EngineError::IoUnavailable`]; bad content
/// is [`EngineError::CorruptSave`].
pub fn read_save<P: AsRef<Path>>(path: P) -> Result<Snapshot, EngineError> {
    let bytes = fs::read(path)?;
    let text = std::str::from_utf8(&bytes).map_err(|_| Corruption::NotText)?;
    deserialize(text)
}

/// Write `snapshot` to `path`, replacing any previous save in one step.
///
/// A score above [`MAX_SCORE`] could not be read back, so it is refused with
/// [`Corruption::ScoreOutOfRange`] before anything touches the disk.
pub fn write_save<P: AsRef<Path>>(path: P, snapshot: &Snapshot) -> Result<(), EngineError> {
    let path = path.as_ref();
    if snapshot.score > MAX_SCORE {
        warn!("refusing to save score {} to {}", snapshot.score, path.display());
        return Err(Corruption::ScoreOutOfRange(snapshot.score).into());
    }
    let tmp = temp_path(path)?;
    let data = serialize(snapshot);
    let mut f = fs::File::create(&tmp)?;
    f.write_all(data.as_bytes())?;
    f.sync_all()?;
    drop(f);
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "save path has no file name"))?;
    let mut tmp_name = OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

/// Save the engine's game to `path`. The saved state also becomes the undo
/// baseline.
pub fn save_game<R: Rng, P: AsRef<Path>>(
    engine: &mut GridEngine<R>,
    path: P,
) -> Result<(), EngineError> {
    write_save(&path, &engine.snapshot())?;
    engine.commit();
    info!("saved game to {}", path.as_ref().display());
    Ok(())
}

/// Load the game at `path` into the engine. On any error the engine is left
/// untouched; on success a rollback returns to the pre-load state.
pub fn load_game<R: Rng, P: AsRef<Path>>(
    engine: &mut GridEngine<R>,
    path: P,
) -> Result<(), EngineError> {
    let snapshot = read_save(&path)?;
    engine.restore(snapshot);
    info!("loaded game from {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "2 1 1 4\n1 1 1 1\n1 8 1 1\n1 1 1 131072\nscore 24\n";

    fn corruption(text: &str) -> Corruption {
        match deserialize(text) {
            Err(EngineError::CorruptSave(c)) => c,
            other => panic!("expected corrupt save, got {other:?}"),
        }
    }

    #[test]
    fn serialize_uses_one_for_empty() {
        let grid =
            Grid::from_values([[2, 0, 0, 4], [0; 4], [0, 8, 0, 0], [0, 0, 0, 131072]]).unwrap();
        assert_eq!(serialize(&Snapshot { grid, score: 24 }), SAMPLE);
    }

    #[test]
    fn deserialize_sample() {
        let snap = deserialize(SAMPLE).unwrap();
        assert_eq!(snap.score, 24);
        assert_eq!(snap.grid.to_values(), [[2, 0, 0, 4], [0; 4], [0, 8, 0, 0], [0, 0, 0, 131072]]);
    }

    #[test]
    fn accepts_missing_final_newline_and_crlf() {
        assert_eq!(deserialize(SAMPLE.trim_end()).unwrap(), deserialize(SAMPLE).unwrap());
        let crlf = SAMPLE.replace('\n', "\r\n");
        assert_eq!(deserialize(&crlf).unwrap(), deserialize(SAMPLE).unwrap());
    }

    #[test]
    fn round_trip_extremes() {
        let grid = Grid::from_values([[131072; 4], [65536; 4], [2; 4], [0; 4]]).unwrap();
        let snap = Snapshot { grid, score: MAX_SCORE };
        assert_eq!(deserialize(&serialize(&snap)).unwrap(), snap);
        assert_eq!(deserialize(&serialize(&Snapshot::default())).unwrap(), Snapshot::default());
    }

    #[test]
    fn rejects_structural_damage() {
        assert_eq!(corruption(""), Corruption::RowCount(0));
        assert_eq!(corruption("1 1 1 1\n1 1 1 1\nscore 0\n"), Corruption::RowCount(2));
        assert_eq!(
            corruption("1 1 1 1\n1 1 1\n1 1 1 1\n1 1 1 1\nscore 0\n"),
            Corruption::ColumnCount { row: 1, found: 3 }
        );
        assert_eq!(
            corruption("1 1 1 1 1\n1 1 1 1\n1 1 1 1\n1 1 1 1\nscore 0\n"),
            Corruption::ColumnCount { row: 0, found: 5 }
        );
        assert_eq!(
            corruption("1 1 1 1\n1 1 x 1\n1 1 1 1\n1 1 1 1\nscore 0\n"),
            Corruption::NotAnInteger { row: 1, col: 2, token: "x".to_string() }
        );
        assert_eq!(corruption("1 1 1 1\n1 1 1 1\n1 1 1 1\n1 1 1 1\n"), Corruption::ScoreLine);
        assert_eq!(
            corruption("1 1 1 1\n1 1 1 1\n1 1 1 1\n1 1 1 1\npoints 3\n"),
            Corruption::ScoreLine
        );
        assert_eq!(
            corruption("1 1 1 1\n1 1 1 1\n1 1 1 1\n1 1 1 1\nscore 0\n2 2 2 2\n"),
            Corruption::TrailingData
        );
    }

    #[test]
    fn rejects_illegal_values() {
        for bad in [0_u64, 3, 6, 262144] {
            let text = format!("1 1 1 1\n1 {bad} 1 1\n1 1 1 1\n1 1 1 1\nscore 0\n");
            assert_eq!(corruption(&text), Corruption::IllegalTile { row: 1, col: 1, value: bad });
        }
        assert_eq!(
            corruption("1 1 1 1\n1 1 1 1\n1 1 1 1\n1 1 1 1\nscore 3885759\n"),
            Corruption::ScoreOutOfRange(3_885_759)
        );
        assert_eq!(
            corruption("1 1 1 1\n1 1 1 1\n1 1 1 1\n1 1 1 1\nscore -1\n"),
            Corruption::ScoreLine
        );
    }

    #[test]
    fn file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("save2048.txt");
        let snap = deserialize(SAMPLE).unwrap();
        write_save(&path, &snap).unwrap();
        assert_eq!(read_save(&path).unwrap(), snap);
        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
        // no temporary left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_is_io_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = read_save(dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, EngineError::IoUnavailable(_)));
    }

    #[test]
    fn binary_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("save2048.txt");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x31]).unwrap();
        assert!(matches!(read_save(&path), Err(EngineError::CorruptSave(Corruption::NotText))));
    }

    #[test]
    fn save_then_load_game() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("save2048.txt");
        let mut engine = GridEngine::seeded(3);
        engine.make_move(crate::engine::Move::Left).unwrap();
        engine.apply_move(crate::engine::Move::Down).unwrap();
        save_game(&mut engine, &path).unwrap();
        assert!(!engine.has_changed());
        let saved = engine.snapshot();

        let mut other = GridEngine::seeded(4);
        let before = other.snapshot();
        load_game(&mut other, &path).unwrap();
        assert_eq!(other.snapshot(), saved);
        other.rollback();
        assert_eq!(other.snapshot(), before);
    }

    #[test]
    fn score_past_limit_is_not_saved_or_committed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("save2048.txt");
        let mut engine = GridEngine::seeded(8);
        let at_limit = deserialize("65536 65536 1 1\n1 1 1 1\n1 1 1 1\n1 1 1 1\nscore 3885758\n");
        engine.restore(at_limit.unwrap());
        engine.commit();
        let out = engine.apply_move(crate::engine::Move::Left).unwrap();
        assert_eq!(out.score_delta, 131072);
        assert_eq!(engine.score(), MAX_SCORE + 131072);
        let baseline = *engine.baseline();

        let err = save_game(&mut engine, &path).unwrap_err();
        assert!(matches!(
            err,
            EngineError::CorruptSave(Corruption::ScoreOutOfRange(s)) if s == MAX_SCORE + 131072
        ));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(*engine.baseline(), baseline);
        assert!(engine.has_changed());

        // an existing save is left as it was
        write_save(&path, &baseline).unwrap();
        assert!(save_game(&mut engine, &path).is_err());
        assert_eq!(read_save(&path).unwrap(), baseline);
    }

    #[test]
    fn failed_load_leaves_engine_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("save2048.txt");
        fs::write(&path, "garbage\n").unwrap();
        let mut engine = GridEngine::seeded(5);
        let before = engine.snapshot();
        let baseline = *engine.baseline();
        assert!(matches!(load_game(&mut engine, &path), Err(EngineError::CorruptSave(_))));
        let missing = load_game(&mut engine, dir.path().join("missing"));
        assert!(matches!(missing, Err(EngineError::IoUnavailable(_))));
        assert_eq!(engine.snapshot(), before);
        assert_eq!(*engine.baseline(), baseline);
    }
}
