use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{Cell, Grid};
use crate::snake::{Direction, Snake};

/// Cells use signed coordinates, so neither side may exceed `i32::MAX`.
pub const MAX_GRID_SIDE: u32 = i32::MAX as u32;

/// Game rules and board setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    /// Head of the snake at the start of every game
    pub initial_head: Cell,
    pub initial_length: usize,
    pub initial_direction: Direction,
    /// Points added per food eaten
    pub food_reward: u32,
    pub initial_interval_ms: u64,
    /// How much faster the game gets per food eaten
    pub interval_step_ms: u64,
    /// The interval never drops below this
    pub min_interval_ms: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("grid {width}x{height} is too large, each side must be at most {max}")]
    GridTooLarge { width: u32, height: u32, max: u32 },
    #[error("the snake needs at least one segment")]
    EmptySnake,
    #[error("tick intervals must be positive")]
    ZeroInterval,
    #[error("minimum interval {min_ms}ms is above the initial interval {initial_ms}ms")]
    MinAboveInitial { min_ms: u64, initial_ms: u64 },
    #[error("starting snake segment ({x}, {y}) is outside the grid")]
    SnakeOutsideGrid { x: i32, y: i32 },
    #[error("a {length}-segment snake leaves no room for food on a {cells}-cell grid")]
    NoRoomForFood { length: usize, cells: usize },
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            grid_width: 20,
            grid_height: 20,
            initial_head: Cell::new(5, 10),
            initial_length: 3,
            initial_direction: Direction::Right,
            food_reward: 10,
            initial_interval_ms: 120,
            interval_step_ms: 2,
            min_interval_ms: 60,
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.grid_width, self.grid_height)
    }

    pub fn initial_snake(&self) -> Snake {
        Snake::new(self.initial_head, self.initial_length, self.initial_direction)
    }

    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn interval_step(&self) -> Duration {
        Duration::from_millis(self.interval_step_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::EmptyGrid { width: self.grid_width, height: self.grid_height });
        }
        if self.grid_width > MAX_GRID_SIDE || self.grid_height > MAX_GRID_SIDE {
            return Err(ConfigError::GridTooLarge {
                width: self.grid_width,
                height: self.grid_height,
                max: MAX_GRID_SIDE,
            });
        }
        if self.initial_length == 0 {
            return Err(ConfigError::EmptySnake);
        }
        if self.initial_interval_ms == 0 || self.min_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.min_interval_ms > self.initial_interval_ms {
            return Err(ConfigError::MinAboveInitial {
                min_ms: self.min_interval_ms,
                initial_ms: self.initial_interval_ms,
            });
        }

        let grid = self.grid();
        if self.initial_length >= grid.cell_count() {
            return Err(ConfigError::NoRoomForFood {
                length: self.initial_length,
                cells: grid.cell_count(),
            });
        }
        if let Some(cell) = self.initial_snake().body().iter().find(|c| !grid.contains(**c)) {
            return Err(ConfigError::SnakeOutsideGrid { x: cell.x, y: cell.y });
        }

        Ok(())
    }
}
