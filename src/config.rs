use std::io::Read;
use std::path::{Path, PathBuf};

/// Launcher settings, read from a TOML file.
///
/// ```toml
/// save_path = "save2048.txt"
/// seed = 42
/// log_filter = "info"
/// highlight_changes = true
/// ```
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where `save`/`load` read and write the game.
    #[serde(default = "defaults::save_path")]
    pub save_path: PathBuf,

    /// Fixed RNG seed for reproducible sessions; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// `env_logger` filter used when `RUST_LOG` is unset.
    #[serde(default = "defaults::log_filter")]
    pub log_filter: String,

    /// Mark cells that changed since the last commit when printing the board.
    #[serde(default = "defaults::highlight_changes")]
    pub highlight_changes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            save_path: defaults::save_path(),
            seed: None,
            log_filter: defaults::log_filter(),
            highlight_changes: defaults::highlight_changes(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Config {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = std::fs::File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn save_path() -> PathBuf { PathBuf::from("save2048.txt") }
    pub fn log_filter() -> String { "warn".to_string() }
    pub fn highlight_changes() -> bool { true }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn reads_all_fields() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "save_path = \"/tmp/game.txt\"\nseed = 7").unwrap();
        writeln!(tmp, "log_filter = \"debug\"\nhighlight_changes = false").unwrap();
        let cfg = Config::from_toml(tmp.path()).unwrap();
        assert_eq!(cfg.save_path, PathBuf::from("/tmp/game.txt"));
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.log_filter, "debug");
        assert!(!cfg.highlight_changes);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_types() {
        assert!(matches!(Config::from_toml_str("grid_size = 5"), Err(ConfigError::Toml(_))));
        assert!(matches!(Config::from_toml_str("seed = \"abc\""), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(Config::from_toml("/definitely/not/here.toml"), Err(ConfigError::Io(_))));
    }
}
