use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::scramble::DEFAULT_PUZZLE;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_puzzle")]
    pub default_puzzle: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_puzzle() -> String {
    DEFAULT_PUZZLE.to_string()
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_hold_ms() -> u64 {
    500
}
fn default_tick_ms() -> u64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_puzzle: default_puzzle(),
            theme: default_theme(),
            hold_ms: default_hold_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cubedr")
            .join("config.toml")
    }

    /// Clamp values a hand-edited config could push out of range. A hold
    /// threshold of zero would arm the timer on the key-down edge; a tick
    /// slower than the hold threshold would miss the arming window.
    pub fn normalize(&mut self, known_puzzles: &[&str]) {
        if !known_puzzles.contains(&self.default_puzzle.as_str()) {
            self.default_puzzle = default_puzzle();
        }
        self.hold_ms = self.hold_ms.clamp(100, 2000);
        self.tick_ms = self.tick_ms.clamp(10, self.hold_ms);
    }
}
