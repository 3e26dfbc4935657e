//! Aggregate counters read by scoreboards and reports.
//!
//! The simulation only ever increments these; rates and weightings are left
//! to whatever consumes them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counts gathered while emergency preemption was in one mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModeCounters {
    /// Vehicles of any kind that entered the simulation.
    pub vehicles: usize,
    /// Emergency vehicles that entered the simulation.
    pub emergency_vehicles: usize,
    pub collisions: usize,
}

/// The running totals of a simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Counters {
    /// All collisions regardless of mode.
    pub collisions: usize,
    pub preemption_off: ModeCounters,
    pub preemption_on: ModeCounters,
}

impl Counters {
    /// Gets the counters for the given preemption mode.
    pub fn mode(&self, preemption: bool) -> &ModeCounters {
        if preemption {
            &self.preemption_on
        } else {
            &self.preemption_off
        }
    }

    fn mode_mut(&mut self, preemption: bool) -> &mut ModeCounters {
        if preemption {
            &mut self.preemption_on
        } else {
            &mut self.preemption_off
        }
    }

    pub(crate) fn record_vehicle(&mut self, preemption: bool, emergency: bool) {
        let mode = self.mode_mut(preemption);
        mode.vehicles += 1;
        if emergency {
            mode.emergency_vehicles += 1;
        }
    }

    pub(crate) fn record_collisions(&mut self, preemption: bool, count: usize) {
        self.collisions += count;
        self.mode_mut(preemption).collisions += count;
    }
}
