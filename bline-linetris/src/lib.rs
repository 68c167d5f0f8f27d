//! # bline-linetris: a one-dimensional stacking game on an LED strip
//!
//! Drives a [`bline_core::LedStrip`] from a terminal: the keyboard
//! rotates the player's stack, the strip shows the game, and a small
//! ratatui view mirrors the strip with frame statistics.

pub mod app;
pub mod config;
pub mod game;
pub mod runner;
pub mod terminal;

pub use app::{App, GameEvent, UiEvent};
pub use config::LinetrisConfig;
pub use game::{Game, GameSettings, Move, Phase};
pub use runner::{SharedStrip, run_game};
