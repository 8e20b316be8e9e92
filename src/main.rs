use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use merge_2048::config::Config;
use merge_2048::engine::{GridEngine, Move, SIZE};
use merge_2048::save;
use merge_2048::EngineError;

#[derive(Debug, Parser)]
#[command(name = "merge2048", about = "Play 2048 in the terminal")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible game (overrides the config)
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Save file used by `save` and `load` (overrides the config)
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Move(Move),
    Rollback,
    Reset,
    Save,
    Load,
    Help,
    Quit,
}

const HELP: &str =
    "w/a/s/d or up/left/down/right: move | u: undo last move | r: reset | save | load | q: quit";

fn parse_command(input: &str) -> Option<Command> {
    let cmd = match input.trim().to_ascii_lowercase().as_str() {
        "w" | "up" => Command::Move(Move::Up),
        "s" | "down" => Command::Move(Move::Down),
        "a" | "left" => Command::Move(Move::Left),
        "d" | "right" => Command::Move(Move::Right),
        "u" | "undo" | "redo" => Command::Rollback,
        "r" | "reset" => Command::Reset,
        "save" => Command::Save,
        "load" => Command::Load,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

/// Board table with cells changed since the last commit marked by `*`.
fn render(engine: &GridEngine, highlight: bool) -> String {
    let mut out = String::new();
    for row in 0..SIZE {
        if row > 0 {
            out.push_str(&"-".repeat(8 * SIZE - 1));
            out.push('\n');
        }
        let cells: Vec<String> = (0..SIZE)
            .map(|col| {
                let mark = if highlight && engine.cell_changed(row, col) { '*' } else { ' ' };
                match engine.cell(row, col) {
                    0 => format!("      {mark}"),
                    v => format!("{v:>6}{mark}"),
                }
            })
            .collect();
        out.push_str(&cells.join("|"));
        out.push('\n');
    }
    out.push_str(&format!("Score: {}\n", engine.score()));
    out
}

fn play_move(engine: &mut GridEngine, dir: Move, highlight: bool) {
    let outcome = match engine.apply_move(dir) {
        Ok(o) => o,
        Err(e) => {
            warn!("move {:?} rejected: {}", dir, e);
            println!("That move is not possible: {e}");
            return;
        }
    };
    if outcome.changed {
        if let Err(e) = engine.spawn_tile() {
            warn!("spawn after {:?} failed: {}", dir, e);
        }
    }
    print!("{}", render(engine, highlight));
    if engine.is_game_over() {
        println!("No moves left. Press r to reset or u to undo.");
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::from_toml(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(path) = args.save {
        config.save_path = path;
    }
    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_filter.as_str()))
        .init();

    let mut engine = match config.seed {
        Some(seed) => GridEngine::seeded(seed),
        None => GridEngine::new(),
    };
    info!("save file: {}", config.save_path.display());
    let highlight = config.highlight_changes;

    println!("Slide tiles to merge them. 2 + 2 = 4. Reach 2048.");
    println!("{HELP}");
    print!("{}", render(&engine, highlight));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("> ");
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line.context("reading input")?;
        match parse_command(&line) {
            Some(Command::Move(dir)) => play_move(&mut engine, dir, highlight),
            Some(Command::Rollback) => {
                engine.rollback();
                print!("{}", render(&engine, highlight));
            }
            Some(Command::Reset) => {
                engine.reset();
                print!("{}", render(&engine, highlight));
            }
            Some(Command::Save) => match save::save_game(&mut engine, &config.save_path) {
                Ok(()) => println!("Saved to {}", config.save_path.display()),
                Err(e) => println!("Could not save: {e}"),
            },
            Some(Command::Load) => {
                match save::load_game(&mut engine, &config.save_path) {
                    Ok(()) => {}
                    Err(EngineError::IoUnavailable(e)) => println!(
                        "No save found at {} ({e}). Use `save` to create one.",
                        config.save_path.display()
                    ),
                    Err(e) => println!("Invalid save file: {e}. Use `save` to overwrite it."),
                }
                print!("{}", render(&engine, highlight));
            }
            Some(Command::Help) => println!("{HELP}"),
            Some(Command::Quit) => break,
            None if line.trim().is_empty() => {}
            None => println!("Unknown command '{}'. {HELP}", line.trim()),
        }
        print!("> ");
        stdout.flush()?;
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use merge_2048::engine::{Grid, Snapshot};

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("w"), Some(Command::Move(Move::Up)));
        assert_eq!(parse_command("  LEFT "), Some(Command::Move(Move::Left)));
        assert_eq!(parse_command("d"), Some(Command::Move(Move::Right)));
        assert_eq!(parse_command("redo"), Some(Command::Rollback));
        assert_eq!(parse_command("save"), Some(Command::Save));
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("jump"), None);
    }

    #[test]
    fn render_marks_changed_cells() {
        let mut engine = GridEngine::seeded(11);
        let grid = Grid::from_values([[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]]).unwrap();
        engine.restore(Snapshot { grid, score: 0 });
        engine.commit();
        let quiet = render(&engine, true);
        assert!(!quiet.contains('*'));
        assert!(quiet.ends_with("Score: 0\n"));
        engine.apply_move(Move::Left).unwrap();
        assert_eq!(render(&engine, true).matches('*').count(), 2);
        assert!(!render(&engine, false).contains('*'));
    }
}
