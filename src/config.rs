//! Simulation parameters.

use crate::util::Interval;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The smallest grid that fits the intersection, its sidewalks and the light posts.
const MIN_GRID_SIZE: usize = 8;
/// The largest grid accepted.
const MAX_GRID_SIZE: usize = 4096;

/// The parameters of a simulation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// The number of tiles along each side of the square grid.
    pub grid_size: usize,
    /// The number of logical ticks per simulated second.
    pub ticks_per_second: u32,
    /// The duration of the green phase in s.
    pub green_secs: f64,
    /// The duration of the yellow phase in s.
    pub yellow_secs: f64,
    /// The duration of the red phase in s.
    pub red_secs: f64,
    /// A yellow light older than this, in s, holds its crosswalk as if red.
    pub late_yellow_secs: f64,
    /// The base vehicle speed in tiles per tick.
    pub base_speed: f64,
    /// The range civilian speed factors are drawn from.
    pub civilian_speed_factor: Interval<f64>,
    /// The speed factor of an emergency vehicle running code 3.
    pub code3_speed_factor: f64,
    /// The time a vehicle must wait at a four-way stop before it may be released, in s.
    pub four_way_dwell_secs: f64,
    /// The minimum number of ticks between two four-way releases.
    pub release_gap_ticks: u32,
    /// The number of ticks a colliding pair is ignored after being counted.
    pub collision_cooldown_ticks: u32,
    /// The probability that a vehicle spawns on a given tick.
    pub spawn_chance: f64,
    /// The probability that a spawned vehicle is an emergency vehicle.
    pub emergency_share: f64,
    /// The probability that a spawned emergency vehicle runs code 3.
    pub code3_share: f64,
    /// The random seed, or `None` to seed from entropy.
    pub seed: Option<u64>,
}

/// An invalid [SimulationConfig].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid size {size} must be even and at least 8")]
    GridTooSmall { size: usize },
    #[error("grid size {size} exceeds the maximum of 4096")]
    GridTooLarge { size: usize },
    #[error("tick rate must be non-zero")]
    ZeroTickRate,
    #[error("duration `{name}` must be positive and finite")]
    InvalidDuration { name: &'static str },
    #[error("probability `{name}` must lie in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("vehicle speeds must be positive and finite")]
    InvalidSpeed,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: 24,
            ticks_per_second: 60,
            green_secs: 10.0,
            yellow_secs: 3.0,
            red_secs: 13.0,
            late_yellow_secs: 0.8,
            base_speed: 0.2,
            civilian_speed_factor: Interval::new(0.3, 0.7),
            code3_speed_factor: 0.7,
            four_way_dwell_secs: 1.0,
            release_gap_ticks: 120,
            collision_cooldown_ticks: 60,
            spawn_chance: 0.03,
            emergency_share: 0.1,
            code3_share: 1.0,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Checks that the parameters describe a runnable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < MIN_GRID_SIZE || self.grid_size % 2 != 0 {
            return Err(ConfigError::GridTooSmall {
                size: self.grid_size,
            });
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::GridTooLarge {
                size: self.grid_size,
            });
        }
        if self.ticks_per_second == 0 {
            return Err(ConfigError::ZeroTickRate);
        }

        let durations = [
            ("green_secs", self.green_secs),
            ("yellow_secs", self.yellow_secs),
            ("red_secs", self.red_secs),
            ("four_way_dwell_secs", self.four_way_dwell_secs),
        ];
        for (name, secs) in durations {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::InvalidDuration { name });
            }
        }
        if !self.late_yellow_secs.is_finite() || self.late_yellow_secs < 0.0 {
            return Err(ConfigError::InvalidDuration {
                name: "late_yellow_secs",
            });
        }

        let probabilities = [
            ("spawn_chance", self.spawn_chance),
            ("emergency_share", self.emergency_share),
            ("code3_share", self.code3_share),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }

        let factors = self.civilian_speed_factor;
        let speeds = [
            self.base_speed,
            self.code3_speed_factor,
            factors.min,
            factors.max,
        ];
        if speeds.iter().any(|speed| !speed.is_finite() || *speed <= 0.0) || factors.is_empty() {
            return Err(ConfigError::InvalidSpeed);
        }

        Ok(())
    }

    /// Converts a duration in seconds into a whole number of ticks.
    pub fn ticks(&self, secs: f64) -> u32 {
        (secs * self.ticks_per_second as f64).round() as u32
    }

    /// The minimum four-way wait in ticks.
    pub fn dwell_ticks(&self) -> u32 {
        self.ticks(self.four_way_dwell_secs)
    }
}
