//! One round of the desert puzzle: the hidden robot, the player's guess
//! cursor, the move and guess budgets and the event log.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use chrono::Local;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, GameConfig};
use crate::map::{Cell, MapError, WallMap};
use crate::orientation::{OrientationError, OrientationMapper};
use crate::robot::{Direction, NoisyDrive, ProximitySensor, Robot, SensorFrame, SimError};

pub const LOG_MAX_ENTRIES: usize = 8;

/// Initial guesses are drawn from this far inside the border.
const GUESS_MARGIN: i32 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Victory,
    Crashed,
    OutOfMoves,
    OutOfGuesses,
    SensorsMalfunctioned,
}

impl Outcome {
    pub const fn message(self) -> &'static str {
        match self {
            Outcome::Victory => "Victory!",
            Outcome::Crashed => "Caught by a sand worm. Game over. Dunes shifting.",
            Outcome::OutOfMoves => "Ornithopter crashed. Too many moves. Dunes shifting.",
            Outcome::OutOfGuesses => {
                "Ornithopter crashed. Too many incorrect guesses. Dunes shifting."
            }
            Outcome::SensorsMalfunctioned => {
                "Sensors malfunctioned. Ornithopter crashed. Dunes shifting."
            }
        }
    }

    pub const fn is_victory(self) -> bool {
        matches!(self, Outcome::Victory)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Orientation(#[from] OrientationError),

    #[error("({row}, {col}) is off the map")]
    OutOfRange { row: i32, col: i32 },

    #[error("the game is over: {}", .0.message())]
    GameOver(Outcome),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Debug view of a session. The true start is only included once the game
/// has ended.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub taken_at: String,
    pub config: GameConfig,
    pub display_map: Vec<String>,
    pub cursor: (i32, i32),
    pub orientation: u8,
    pub display_frame: SensorFrame,
    pub moves_used: u32,
    pub guesses_used: u32,
    pub outcome: Option<Outcome>,
    pub reachable_from_cursor: usize,
    pub true_start: Option<(i32, i32)>,
    pub log: Vec<String>,
}

pub struct GameSession {
    config: GameConfig,
    rng: RandomNumberGenerator,
    truth: Rc<WallMap>,
    display_map: WallMap,
    robot: Robot,
    drive: NoisyDrive,
    sensor: ProximitySensor,
    mapper: OrientationMapper,
    true_start: (i32, i32),
    cursor: Point,
    last_frame: SensorFrame,
    moves_used: u32,
    guesses_used: u32,
    outcome: Option<Outcome>,
    log: Vec<String>,
}

impl GameSession {
    pub fn new(config: GameConfig) -> SessionResult<Self> {
        let rng = match config.seed {
            Some(seed) => RandomNumberGenerator::seeded(seed),
            None => RandomNumberGenerator::new(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: GameConfig, mut rng: RandomNumberGenerator) -> SessionResult<Self> {
        config.validate()?;

        let truth = Rc::new(config.generator().generate(&mut rng)?);
        let (start_row, start_col) = config.start;
        let robot = Robot::new(Rc::clone(&truth), start_row, start_col, &mut rng)?;
        let drive = NoisyDrive::new(config.prob_cmd)?;
        let sensor = ProximitySensor::new(config.prob_proximal.clone())?;
        let true_start = robot.position();

        let display_map = clear_around(&truth, true_start, config.clear_radius);
        let mapper = OrientationMapper::random(&mut rng);
        let cursor = initial_guess(&display_map, true_start, &mut rng);
        let last_frame = sensor.sense(&robot, &mut rng);

        info!(
            rows = config.rows,
            cols = config.cols,
            orientation = mapper.orientation(),
            "New desert puzzle"
        );

        let mut session = Self {
            config,
            rng,
            truth,
            display_map,
            robot,
            drive,
            sensor,
            mapper,
            true_start,
            cursor,
            last_frame,
            moves_used: 0,
            guesses_used: 0,
            outcome: None,
            log: Vec::new(),
        };
        session.push_log_entry(format!("First guess: ({}, {})", cursor.y, cursor.x));
        Ok(session)
    }

    fn ensure_running(&self) -> SessionResult<()> {
        match self.outcome {
            Some(outcome) => Err(SessionError::GameOver(outcome)),
            None => Ok(()),
        }
    }

    fn finish(&mut self, outcome: Outcome) -> Outcome {
        self.outcome = Some(outcome);
        info!(
            ?outcome,
            moves = self.moves_used,
            guesses = self.guesses_used,
            "Game finished"
        );
        self.push_log_entry(outcome.message());
        outcome
    }

    /// Moves the robot and the guess cursor by the same step.
    pub fn step(&mut self, direction: Direction) -> SessionResult<Option<Outcome>> {
        self.ensure_running()?;

        let (drow, dcol) = direction.delta();
        let state = self
            .drive
            .command(&mut self.robot, drow, dcol, &mut self.rng)?;
        if self.robot.is_crashed() {
            return Ok(Some(self.finish(Outcome::Crashed)));
        }
        self.last_frame = self.sensor.sense(&self.robot, &mut self.rng);

        let cursor = Point::new(self.cursor.x + dcol, self.cursor.y + drow);
        if !self.display_map.in_bounds(cursor.y, cursor.x) {
            return Ok(Some(self.finish(Outcome::SensorsMalfunctioned)));
        }
        self.cursor = cursor;

        self.moves_used += 1;
        debug!(?state, moves = self.moves_used, "Turn complete");
        if self.moves_used >= self.config.max_moves {
            return Ok(Some(self.finish(Outcome::OutOfMoves)));
        }
        self.push_log_entry(format!("Moves remaining: {}", self.moves_remaining()));
        Ok(None)
    }

    /// Moves the guess cursor without moving the robot. Returns `false` when
    /// the chosen cell hides a wall, leaving the cursor where it was.
    pub fn reposition(&mut self, row: i32, col: i32) -> SessionResult<bool> {
        self.ensure_running()?;
        self.check_in_range(row, col)?;

        if self.truth.is_wall(row, col) {
            self.push_log_entry("You found a worm!");
            return Ok(false);
        }
        self.cursor = Point::new(col, row);
        Ok(true)
    }

    pub fn rotate(&mut self, k: u8) -> SessionResult<u8> {
        self.ensure_running()?;
        let orientation = self.mapper.rotate(k)?;
        self.push_log_entry(format!("Sensor rotated {k} quarter turn(s)"));
        Ok(orientation)
    }

    pub fn guess_start(&mut self, row: i32, col: i32) -> SessionResult<Option<Outcome>> {
        self.ensure_running()?;
        self.check_in_range(row, col)?;

        if (row, col) == self.true_start {
            return Ok(Some(self.finish(Outcome::Victory)));
        }

        self.guesses_used += 1;
        if self.guesses_used >= self.config.max_guesses {
            return Ok(Some(self.finish(Outcome::OutOfGuesses)));
        }
        self.push_log_entry(format!(
            "Incorrect. Attempts remaining: {}",
            self.guesses_remaining()
        ));
        Ok(None)
    }

    fn check_in_range(&self, row: i32, col: i32) -> SessionResult<()> {
        if self.display_map.in_bounds(row, col) {
            Ok(())
        } else {
            Err(SessionError::OutOfRange { row, col })
        }
    }

    /// Latest readings, in display slot order.
    pub fn display_frame(&self) -> SensorFrame {
        self.mapper.apply(&self.last_frame)
    }

    /// Logs how many games the win took. Only a won session records it.
    pub fn record_win(&mut self, games_played: u64) -> bool {
        if self.outcome != Some(Outcome::Victory) {
            return false;
        }
        let plural = if games_played == 1 { "" } else { "s" };
        self.push_log_entry(format!("Won in {games_played} game{plural}."));
        true
    }

    pub fn push_log_entry<S: Into<String>>(&mut self, entry: S) {
        self.log.insert(0, entry.into());
        self.log.truncate(LOG_MAX_ENTRIES);
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn display_map(&self) -> &WallMap {
        &self.display_map
    }

    pub fn mapper(&self) -> &OrientationMapper {
        &self.mapper
    }

    pub const fn cursor(&self) -> Point {
        self.cursor
    }

    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub const fn moves_used(&self) -> u32 {
        self.moves_used
    }

    pub const fn guesses_used(&self) -> u32 {
        self.guesses_used
    }

    pub fn moves_remaining(&self) -> u32 {
        self.config.max_moves.saturating_sub(self.moves_used)
    }

    pub fn guesses_remaining(&self) -> u32 {
        self.config.max_guesses.saturating_sub(self.guesses_used)
    }

    /// The answer, once there is no longer anything to guess.
    pub fn revealed_start(&self) -> Option<(i32, i32)> {
        self.outcome.map(|_| self.true_start)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            taken_at: Local::now().to_rfc3339(),
            config: self.config.clone(),
            display_map: self.display_map.to_rows(),
            cursor: (self.cursor.y, self.cursor.x),
            orientation: self.mapper.orientation(),
            display_frame: self.display_frame(),
            moves_used: self.moves_used,
            guesses_used: self.guesses_used,
            outcome: self.outcome,
            reachable_from_cursor: self.display_map.reachable_from(self.cursor.y, self.cursor.x),
            true_start: self.revealed_start(),
            log: self.log.clone(),
        }
    }

    /// Writes the snapshot as pretty JSON into `dir` and returns its path.
    pub fn write_snapshot<P: AsRef<Path>>(&self, dir: P) -> SessionResult<PathBuf> {
        let name = format!(
            "dunesense-snapshot-{}.json",
            Local::now().format("%Y%m%d-%H%M%S%.3f")
        );
        let path = dir.as_ref().join(name);
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(&path, json).map_err(|source| SessionError::Snapshot {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "Wrote session snapshot");
        Ok(path)
    }

    #[cfg(test)]
    pub(crate) fn true_start(&self) -> (i32, i32) {
        self.true_start
    }

    #[cfg(test)]
    pub(crate) fn truth(&self) -> &WallMap {
        &self.truth
    }
}

/// Copy of `truth` with walls near `start` removed, staying clear of the
/// two outermost rings.
fn clear_around(truth: &WallMap, start: (i32, i32), radius: i32) -> WallMap {
    let mut display = truth.clone();
    let (start_row, start_col) = start;
    for drow in -radius..=radius {
        for dcol in -radius..=radius {
            let row = start_row + drow;
            let col = start_col + dcol;
            if row > 1 && row < truth.rows() - 2 && col > 1 && col < truth.cols() - 2 {
                display.set(row, col, Cell::Open);
            }
        }
    }
    display
}

/// An open cell sharing neither row nor column with the true start, drawn
/// from the band `GUESS_MARGIN` cells inside the border.
fn initial_guess(display: &WallMap, start: (i32, i32), rng: &mut RandomNumberGenerator) -> Point {
    let (start_row, start_col) = start;
    let mut candidates = Vec::new();
    for row in GUESS_MARGIN..display.rows() - GUESS_MARGIN - 1 {
        for col in GUESS_MARGIN..display.cols() - GUESS_MARGIN - 1 {
            if !display.is_wall(row, col) && row != start_row && col != start_col {
                candidates.push(Point::new(col, row));
            }
        }
    }

    if candidates.is_empty() {
        warn!("No cell in the guess band, falling back to any open cell");
        candidates = display
            .open_cells()
            .into_iter()
            .filter(|&cell| cell != start)
            .map(|(row, col)| Point::new(col, row))
            .collect();
    }

    rng.random_slice_entry(&candidates)
        .copied()
        .unwrap_or_else(|| Point::new(start_col, start_row))
}
