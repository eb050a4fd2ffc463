//! Desert puzzle: deduce where a hidden ornithopter started from its wall
//! proximity readings, on a procedurally generated map of sand and walls.

pub mod config;
pub mod input;
pub mod map;
pub mod orientation;
pub mod render;
pub mod robot;
pub mod scripted_input;
pub mod session;

pub use config::{ConfigError, GameConfig};
pub use map::{Cell, MapError, WallMap, WallMapGenerator};
pub use orientation::{OrientationError, OrientationMapper};
pub use robot::{Direction, Reading, Robot, RobotState, SensorFrame, SimError};
pub use session::{GameSession, Outcome, SessionError};
