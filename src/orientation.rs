//! Rotated display of sensor readings.
//!
//! The player sees the four readings around the guess cursor, but the slot
//! each true direction lands in depends on the current orientation. Each
//! orientation step turns the displayed picture a further 90 degrees
//! clockwise.

use bracket_random::prelude::RandomNumberGenerator;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::robot::{Direction, SensorFrame};

/// `PERMUTATIONS[o][i]` is the display slot of canonical direction `i`
/// under orientation `o`. Readings are scattered into their slots, so under
/// orientation 1 the Up reading shows in the Right slot: a clockwise turn.
pub const PERMUTATIONS: [[usize; 4]; 4] = [[0, 1, 2, 3], [3, 2, 0, 1], [1, 0, 3, 2], [2, 3, 1, 0]];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OrientationError {
    #[error("rotation count must be 1, 2 or 3, got {0}")]
    InvalidRotation(u8),

    #[error("orientation must be between 0 and 3, got {0}")]
    InvalidOrientation(u8),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OrientationMapper {
    orientation: u8,
}

impl OrientationMapper {
    pub const fn new(orientation: u8) -> Result<Self, OrientationError> {
        if orientation > 3 {
            return Err(OrientationError::InvalidOrientation(orientation));
        }
        Ok(Self { orientation })
    }

    pub fn random(rng: &mut RandomNumberGenerator) -> Self {
        Self {
            orientation: rng.range(0, 4) as u8,
        }
    }

    pub const fn orientation(&self) -> u8 {
        self.orientation
    }

    /// `(orientation + k) mod 4`, for `k` in 1..=3.
    pub const fn rotated(orientation: u8, k: u8) -> Result<u8, OrientationError> {
        if orientation > 3 {
            return Err(OrientationError::InvalidOrientation(orientation));
        }
        if k < 1 || k > 3 {
            return Err(OrientationError::InvalidRotation(k));
        }
        Ok((orientation + k) % 4)
    }

    pub fn rotate(&mut self, k: u8) -> Result<u8, OrientationError> {
        self.orientation = Self::rotated(self.orientation, k)?;
        debug!(orientation = self.orientation, k, "Rotated sensor display");
        Ok(self.orientation)
    }

    pub fn apply_with(
        orientation: u8,
        frame: &SensorFrame,
    ) -> Result<SensorFrame, OrientationError> {
        if orientation > 3 {
            return Err(OrientationError::InvalidOrientation(orientation));
        }
        Ok(permute(PERMUTATIONS[orientation as usize], frame))
    }

    pub fn apply(&self, frame: &SensorFrame) -> SensorFrame {
        permute(PERMUTATIONS[self.orientation as usize], frame)
    }

    /// Display slot that canonical `direction` is drawn in.
    pub const fn display_slot(&self, direction: Direction) -> usize {
        PERMUTATIONS[self.orientation as usize][direction.index()]
    }
}

fn permute(permutation: [usize; 4], frame: &SensorFrame) -> SensorFrame {
    let mut readings = frame.readings;
    for (canonical, reading) in frame.readings.iter().enumerate() {
        readings[permutation[canonical]] = *reading;
    }
    SensorFrame::new(readings)
}
