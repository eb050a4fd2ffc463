//! Game settings, loadable from a JSON file where every field is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::map::WallMapGenerator;
use crate::map::generator::DEFAULT_PAIRING_RANK;

pub const DEFAULT_ROWS: i32 = 25;
pub const DEFAULT_COLS: i32 = 49;
pub const DEFAULT_WALL_PERCENT: u32 = 3;
pub const DEFAULT_MAX_MOVES: u32 = 25;
pub const DEFAULT_MAX_GUESSES: u32 = 3;
pub const DEFAULT_CLEAR_RADIUS: i32 = 2;
pub const DEFAULT_START: (i32, i32) = (12, 16);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rows: i32,
    pub cols: i32,
    pub wall_percent: u32,
    pub pairing_rank: usize,
    pub max_moves: u32,
    pub max_guesses: u32,
    /// Walls within this many cells of the true start are hidden from the
    /// player-visible map.
    pub clear_radius: i32,
    pub seed: Option<u64>,
    /// Requested `(row, col)` start; a wall here means a random start.
    pub start: (i32, i32),
    pub prob_cmd: f32,
    pub prob_proximal: Vec<f32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            wall_percent: DEFAULT_WALL_PERCENT,
            pairing_rank: DEFAULT_PAIRING_RANK,
            max_moves: DEFAULT_MAX_MOVES,
            max_guesses: DEFAULT_MAX_GUESSES,
            clear_radius: DEFAULT_CLEAR_RADIUS,
            seed: None,
            start: DEFAULT_START,
            prob_cmd: 1.0,
            prob_proximal: vec![1.0],
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_size(mut self, rows: i32, cols: i32) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    #[must_use]
    pub fn with_wall_percent(mut self, wall_percent: u32) -> Self {
        self.wall_percent = wall_percent;
        self
    }

    #[must_use]
    pub fn with_start(mut self, row: i32, col: i32) -> Self {
        self.start = (row, col);
        self
    }

    #[must_use]
    pub fn with_budgets(mut self, max_moves: u32, max_guesses: u32) -> Self {
        self.max_moves = max_moves;
        self.max_guesses = max_guesses;
        self
    }

    pub fn generator(&self) -> WallMapGenerator {
        WallMapGenerator::new(self.rows, self.cols, self.wall_percent)
            .with_pairing_rank(self.pairing_rank)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generator()
            .validate()
            .map_err(|err| ConfigError::Invalid {
                field: "rows/cols/wall_percent",
                reason: err.to_string(),
            })?;
        if self.max_moves == 0 {
            return Err(invalid("max_moves", "must be at least 1"));
        }
        if self.max_guesses == 0 {
            return Err(invalid("max_guesses", "must be at least 1"));
        }
        if self.clear_radius < 0 {
            return Err(invalid("clear_radius", "must not be negative"));
        }
        let (row, col) = self.start;
        if row < 0 || row >= self.rows || col < 0 || col >= self.cols {
            return Err(invalid(
                "start",
                format!("({row}, {col}) is outside the {}x{} map", self.rows, self.cols),
            ));
        }
        if !(0.0..=1.0).contains(&self.prob_cmd) {
            return Err(invalid("prob_cmd", "must be between 0 and 1"));
        }
        if self.prob_proximal.is_empty() {
            return Err(invalid("prob_proximal", "needs at least one entry"));
        }
        if self.prob_proximal.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(invalid("prob_proximal", "entries must be between 0 and 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
