//! The hidden robot: true position, crash state and proximity sensing.

pub mod sensor;

use std::ops::Index;
use std::rc::Rc;

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::map::WallMap;

pub use sensor::{NoisyDrive, ProximitySensor};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Canonical sensor order.
    pub const CANONICAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// `(drow, dcol)` of one step in this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub const fn from_delta(drow: i32, dcol: i32) -> Option<Self> {
        match (drow, dcol) {
            (-1, 0) => Some(Direction::Up),
            (1, 0) => Some(Direction::Down),
            (0, -1) => Some(Direction::Left),
            (0, 1) => Some(Direction::Right),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Reading {
    NoWall,
    WallDetected,
}

impl Reading {
    pub const fn from_wall(wall: bool) -> Self {
        if wall {
            Reading::WallDetected
        } else {
            Reading::NoWall
        }
    }

    /// Display category shared with the renderer palette.
    pub const fn category(self) -> u8 {
        match self {
            Reading::NoWall => 2,
            Reading::WallDetected => 3,
        }
    }
}

/// Four readings in [`Direction::CANONICAL`] order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SensorFrame {
    pub readings: [Reading; 4],
}

impl SensorFrame {
    pub const fn new(readings: [Reading; 4]) -> Self {
        Self { readings }
    }

    pub fn walls(&self) -> usize {
        self.readings
            .iter()
            .filter(|reading| **reading == Reading::WallDetected)
            .count()
    }
}

impl Index<Direction> for SensorFrame {
    type Output = Reading;

    fn index(&self, direction: Direction) -> &Reading {
        &self.readings[direction.index()]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RobotState {
    Active,
    Crashed,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("({row}, {col}) is outside the {rows}x{cols} map")]
    OutOfBounds {
        row: i32,
        col: i32,
        rows: i32,
        cols: i32,
    },

    #[error("map has no open interior cell to start on")]
    NoOpenCell,

    #[error("bad delta ({drow}, {dcol}): must be one of the four unit steps")]
    BadDelta { drow: i32, dcol: i32 },

    #[error("robot has already crashed")]
    AlreadyCrashed,

    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f32),
}

pub type SimResult<T> = Result<T, SimError>;

#[derive(Clone, Debug)]
pub struct Robot {
    walls: Rc<WallMap>,
    row: i32,
    col: i32,
    state: RobotState,
}

impl Robot {
    /// Places the robot at `(row, col)`, or at a uniformly random open
    /// interior cell when that cell is a wall.
    pub fn new(
        walls: Rc<WallMap>,
        row: i32,
        col: i32,
        rng: &mut RandomNumberGenerator,
    ) -> SimResult<Self> {
        if !walls.in_bounds(row, col) {
            return Err(SimError::OutOfBounds {
                row,
                col,
                rows: walls.rows(),
                cols: walls.cols(),
            });
        }

        let (mut row, mut col) = (row, col);
        if walls.is_wall(row, col) {
            if walls.interior_open_count() == 0 {
                return Err(SimError::NoOpenCell);
            }
            while walls.is_wall(row, col) {
                row = rng.range(1, walls.rows() - 1);
                col = rng.range(1, walls.cols() - 1);
            }
            debug!(row, col, "Requested start is a wall, picked a random cell");
        }

        info!(row, col, "Robot placed");
        Ok(Self {
            walls,
            row,
            col,
            state: RobotState::Active,
        })
    }

    pub(crate) fn check_command(&self, drow: i32, dcol: i32) -> SimResult<()> {
        if (drow + dcol).abs() != 1 || (drow - dcol).abs() != 1 {
            return Err(SimError::BadDelta { drow, dcol });
        }
        if self.state == RobotState::Crashed {
            return Err(SimError::AlreadyCrashed);
        }
        Ok(())
    }

    /// Moves one unit step. Stepping into a wall crashes the robot and
    /// leaves it where it was.
    pub fn command(&mut self, drow: i32, dcol: i32) -> SimResult<RobotState> {
        self.check_command(drow, dcol)?;

        let row = self.row + drow;
        let col = self.col + dcol;
        if self.walls.is_wall(row, col) {
            self.state = RobotState::Crashed;
            info!(row = self.row, col = self.col, drow, dcol, "Robot crashed");
        } else {
            self.row = row;
            self.col = col;
            debug!(row, col, "Robot moved");
        }
        Ok(self.state)
    }

    pub fn step(&mut self, direction: Direction) -> SimResult<RobotState> {
        let (drow, dcol) = direction.delta();
        self.command(drow, dcol)
    }

    /// Exact distance-one wall readings from the true position.
    pub fn sense(&self) -> SensorFrame {
        SensorFrame::new(Direction::CANONICAL.map(|direction| {
            let (drow, dcol) = direction.delta();
            Reading::from_wall(self.walls.is_wall(self.row + drow, self.col + dcol))
        }))
    }

    /// True `(row, col)`. For scoring and debugging only.
    pub const fn position(&self) -> (i32, i32) {
        (self.row, self.col)
    }

    pub fn point(&self) -> Point {
        Point::new(self.col, self.row)
    }

    pub const fn state(&self) -> RobotState {
        self.state
    }

    pub fn is_crashed(&self) -> bool {
        self.state == RobotState::Crashed
    }

    pub fn walls(&self) -> &WallMap {
        &self.walls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_room() -> Rc<WallMap> {
        Rc::new(WallMap::bordered(7, 7).unwrap())
    }

    #[test]
    fn direction_deltas_round_trip() {
        for direction in Direction::CANONICAL {
            let (drow, dcol) = direction.delta();
            assert_eq!(Direction::from_delta(drow, dcol), Some(direction));
        }
        assert_eq!(Direction::from_delta(1, 1), None);
    }

    #[test]
    fn explicit_open_start_is_kept() {
        let mut rng = RandomNumberGenerator::seeded(1);
        let robot = Robot::new(open_room(), 3, 4, &mut rng).unwrap();
        assert_eq!(robot.position(), (3, 4));
        assert_eq!(robot.point(), Point::new(4, 3));
        assert_eq!(robot.state(), RobotState::Active);
    }

    #[test]
    fn wall_start_is_replaced_by_open_cell() {
        let walls = Rc::new(WallMap::from_rows(&["xxxxx", "xxxxx", "xxx x", "xxxxx"]).unwrap());
        let mut rng = RandomNumberGenerator::seeded(42);
        let robot = Robot::new(walls, 1, 1, &mut rng).unwrap();
        assert_eq!(robot.position(), (2, 3));
    }

    #[test]
    fn construction_rejects_bad_input() {
        let mut rng = RandomNumberGenerator::seeded(1);
        let err = Robot::new(open_room(), 7, 2, &mut rng).unwrap_err();
        assert_eq!(
            err,
            SimError::OutOfBounds {
                row: 7,
                col: 2,
                rows: 7,
                cols: 7
            }
        );

        let sealed = Rc::new(WallMap::from_rows(&["xxx", "xxx", "xxx"]).unwrap());
        assert_eq!(
            Robot::new(sealed, 1, 1, &mut rng).unwrap_err(),
            SimError::NoOpenCell
        );
    }

    #[test]
    fn malformed_deltas_are_rejected_without_moving() {
        let mut rng = RandomNumberGenerator::seeded(1);
        let mut robot = Robot::new(open_room(), 3, 3, &mut rng).unwrap();
        for (drow, dcol) in [(0, 0), (1, 1), (-1, 1), (2, 0), (0, -2)] {
            assert_eq!(
                robot.command(drow, dcol),
                Err(SimError::BadDelta { drow, dcol })
            );
        }
        assert_eq!(robot.position(), (3, 3));
        assert_eq!(robot.state(), RobotState::Active);
    }

    #[test]
    fn crashing_is_terminal_and_keeps_position() {
        let mut rng = RandomNumberGenerator::seeded(1);
        let mut robot = Robot::new(open_room(), 1, 1, &mut rng).unwrap();
        assert_eq!(robot.step(Direction::Left), Ok(RobotState::Crashed));
        assert_eq!(robot.position(), (1, 1));
        assert!(robot.is_crashed());
        assert_eq!(robot.step(Direction::Right), Err(SimError::AlreadyCrashed));
        assert_eq!(robot.position(), (1, 1));
    }

    #[test]
    fn sense_reports_adjacent_walls() {
        let mut rng = RandomNumberGenerator::seeded(1);
        let robot = Robot::new(open_room(), 1, 5, &mut rng).unwrap();
        let frame = robot.sense();
        assert_eq!(frame[Direction::Up], Reading::WallDetected);
        assert_eq!(frame[Direction::Down], Reading::NoWall);
        assert_eq!(frame[Direction::Left], Reading::NoWall);
        assert_eq!(frame[Direction::Right], Reading::WallDetected);
        assert_eq!(frame.walls(), 2);
    }

    #[test]
    fn reading_categories_match_palette() {
        assert_eq!(Reading::NoWall.category(), 2);
        assert_eq!(Reading::WallDetected.category(), 3);
    }
}
