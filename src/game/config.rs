use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::state::Grid;

/// Configuration for the game and its host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,
    /// Milliseconds between two simulation steps
    pub tick_interval_ms: u64,
    /// Reroll food cells that land on the snake
    pub food_avoids_snake: bool,
    /// Where the high score is kept; in memory only when unset
    pub high_score_path: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 30,
            grid_height: 30,
            tick_interval_ms: 100,
            food_avoids_snake: false,
            high_score_path: None,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(5, 5)
    }

    /// Read a JSON config file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig =
            serde_json::from_str(&raw).with_context(|| format!("Invalid config in {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.grid_width >= 1 && self.grid_height >= 1,
            "grid must be at least 1x1, got {}x{}",
            self.grid_width,
            self.grid_height
        );
        ensure!(
            i32::try_from(self.grid_width).is_ok() && i32::try_from(self.grid_height).is_ok(),
            "grid {}x{} is too large",
            self.grid_width,
            self.grid_height
        );
        ensure!(self.tick_interval_ms > 0, "tick interval must be positive");
        Ok(())
    }

    /// Grid dimensions; saturates for sizes `validate` would reject
    pub fn grid(&self) -> Grid {
        let clamp = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
        Grid::new(clamp(self.grid_width), clamp(self.grid_height))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.grid_width, 30);
        assert_eq!(config.grid_height, 30);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert!(!config.food_avoids_snake);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = GameConfig::new(15, 12);
        assert_eq!(config.grid(), Grid::new(15, 12));
    }

    #[test]
    fn test_rejects_empty_grid() {
        assert!(GameConfig::new(0, 10).validate().is_err());
        assert!(GameConfig::new(10, 0).validate().is_err());
    }

    #[test]
    fn test_rejects_zero_tick() {
        let config = GameConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "grid_width": 12, "food_avoids_snake": true }}"#).unwrap();

        let config = GameConfig::load(file.path()).unwrap();

        assert_eq!(config.grid_width, 12);
        assert_eq!(config.grid_height, 30);
        assert!(config.food_avoids_snake);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "grid_height": 0 }}"#).unwrap();

        assert!(GameConfig::load(file.path()).is_err());
    }
}
