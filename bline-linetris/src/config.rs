//! Linetris configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::game::GameSettings;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinetrisConfig {
    /// Which strip to drive and how bright.
    pub strip: StripSettings,
    /// Game rules.
    pub game: GameConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Strip settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StripSettings {
    /// Segment layout file (JSON or TOML).
    pub config: PathBuf,
    /// Brightness level, 0 (black) to 255 (unchanged).
    pub brightness: i64,
}

/// Game rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Blocks in the stack at start.
    pub blocks: usize,
    /// Initial speed in pixels per second.
    pub speed: u32,
    /// Falling blocks change color at random.
    pub random_change: bool,
    /// Frame flush rate in Hz.
    pub draw_rate: u32,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Log file. The terminal belongs to the game, so logs never go there.
    pub file: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for StripSettings {
    fn default() -> Self {
        Self {
            config: PathBuf::from("config.json"),
            brightness: 255,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            blocks: 4,
            speed: 40,
            random_change: false,
            draw_rate: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: "bline-linetris.log".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl LinetrisConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Reject settings the game cannot start with.
    pub fn validate(&self) -> Result<(), String> {
        if self.game.speed == 0 {
            return Err("Speed must be greater than 0".into());
        }
        if self.game.blocks == 0 {
            return Err("Initial blocks must be greater than 0".into());
        }
        if self.game.draw_rate == 0 {
            return Err("Draw rate must be greater than 0".into());
        }
        Ok(())
    }

    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            blocks: self.game.blocks,
            speed: self.game.speed,
            random_change: self.game.random_change,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
