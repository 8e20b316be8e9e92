//! merge-2048: a 4x4 tile-merging puzzle engine
//!
//! This crate provides:
//! - A `Grid` type with deterministic move resolution (`shift`, `is_game_over`, ...)
//! - A `GridEngine` owning one game: score, random spawns and a single level of undo
//! - A human-readable text save format and its file transport (`save` module)
//! - TOML settings for the terminal launcher (`config` module)
//!
//! Quick start:
//! ```
//! use merge_2048::engine::{GridEngine, Move};
//!
//! // Deterministic game with a seeded RNG
//! let mut engine = GridEngine::seeded(42);
//! let turn = engine.make_move(Move::Left).unwrap();
//! assert_eq!(turn.spawn.is_some(), turn.outcome.changed);
//!
//! // An uncommitted move can be rolled back
//! let before = engine.snapshot();
//! engine.apply_move(Move::Up).unwrap();
//! engine.rollback();
//! assert_eq!(engine.snapshot(), before);
//! ```
//!
//! Save text round trip:
//! ```
//! use merge_2048::engine::GridEngine;
//! use merge_2048::save;
//!
//! let engine = GridEngine::seeded(1);
//! let text = engine.serialize();
//! assert_eq!(save::deserialize(&text).unwrap(), engine.snapshot());
//! ```
//!
pub mod config;
pub mod engine;
pub mod error;
pub mod save;

pub use error::{Corruption, EngineError};
