//! Unreliable actuation and sensing on top of [`Robot`].
//!
//! Both default to certainty, in which case they behave exactly like
//! [`Robot::command`] and [`Robot::sense`] and draw nothing from the RNG.

use bracket_random::prelude::RandomNumberGenerator;
use tracing::debug;

use super::{Direction, Reading, Robot, RobotState, SensorFrame, SimError, SimResult};

fn check_probability(probability: f32) -> SimResult<f32> {
    if (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(SimError::InvalidProbability(probability))
    }
}

fn roll(rng: &mut RandomNumberGenerator, probability: f32) -> bool {
    if probability >= 1.0 {
        return true;
    }
    let roll = rng.range(0, 10_000) as f32 / 10_000.0;
    roll < probability
}

/// Executes each command with probability `prob_cmd`; a dropped command
/// leaves the robot where it is.
#[derive(Clone, Debug, PartialEq)]
pub struct NoisyDrive {
    prob_cmd: f32,
}

impl Default for NoisyDrive {
    fn default() -> Self {
        Self { prob_cmd: 1.0 }
    }
}

impl NoisyDrive {
    pub fn new(prob_cmd: f32) -> SimResult<Self> {
        Ok(Self {
            prob_cmd: check_probability(prob_cmd)?,
        })
    }

    pub fn command(
        &self,
        robot: &mut Robot,
        drow: i32,
        dcol: i32,
        rng: &mut RandomNumberGenerator,
    ) -> SimResult<RobotState> {
        robot.check_command(drow, dcol)?;
        if !roll(rng, self.prob_cmd) {
            debug!(drow, dcol, "Command dropped");
            return Ok(robot.state());
        }
        robot.command(drow, dcol)
    }
}

/// `prob_proximal[i]` is the chance the sensor fires for a wall at distance
/// `i + 1`. Each direction is scanned outward and stops at the first wall.
#[derive(Clone, Debug, PartialEq)]
pub struct ProximitySensor {
    prob_proximal: Vec<f32>,
}

impl Default for ProximitySensor {
    fn default() -> Self {
        Self {
            prob_proximal: vec![1.0],
        }
    }
}

impl ProximitySensor {
    pub fn new(prob_proximal: Vec<f32>) -> SimResult<Self> {
        for &probability in &prob_proximal {
            check_probability(probability)?;
        }
        Ok(Self { prob_proximal })
    }

    pub fn sense(&self, robot: &Robot, rng: &mut RandomNumberGenerator) -> SensorFrame {
        let (row, col) = robot.position();
        SensorFrame::new(Direction::CANONICAL.map(|direction| {
            let (drow, dcol) = direction.delta();
            let mut fired = false;
            for (idx, &probability) in self.prob_proximal.iter().enumerate() {
                let distance = idx as i32 + 1;
                if robot
                    .walls()
                    .is_wall(row + drow * distance, col + dcol * distance)
                {
                    fired = roll(rng, probability);
                    break;
                }
            }
            Reading::from_wall(fired)
        }))
    }
}
