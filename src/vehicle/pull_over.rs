use super::{Heading, MovementState, Vehicle};
use crate::grid::Grid;
use crate::math::{tile_of, Point2d};
use crate::util::Interval;
use crate::VehicleId;

/// How far behind (negative) or ahead (positive) of a vehicle, in tiles along
/// its heading, an emergency vehicle must be for the vehicle to yield to it.
const YIELD_WINDOW: Interval<f64> = Interval::new(-5.0, 2.0);

/// A snapshot of an emergency vehicle running code 3, taken at the start
/// of a frame so that every vehicle reacts to the same positions.
#[derive(Clone, Copy, Debug)]
pub struct Siren {
    pub id: VehicleId,
    pub heading: Heading,
    pub position: Point2d,
}

impl Siren {
    /// Takes a snapshot of the vehicle if it is running code 3.
    pub fn of(vehicle: &Vehicle) -> Option<Self> {
        vehicle.is_code3().then(|| Self {
            id: vehicle.id,
            heading: vehicle.heading,
            position: vehicle.pos,
        })
    }
}

impl Vehicle {
    /// Whether the vehicle should yield to the given siren.
    pub fn hears(&self, siren: &Siren) -> bool {
        if siren.id == self.id || siren.heading != self.heading {
            return false;
        }
        let offset = self.heading.progress(siren.position) - self.heading.progress(self.pos);
        YIELD_WINDOW.contains(offset)
    }

    /// Pulls over for, or merges back after, emergency vehicles on the same road.
    /// Emergency vehicles never yield to each other.
    pub(crate) fn yield_to_sirens(&mut self, sirens: &[Siren], grid: &mut Grid) {
        if self.is_emergency() {
            return;
        }
        let in_range = sirens.iter().any(|siren| self.hears(siren));
        match (self.pulled_over, in_range) {
            (false, true) => self.pull_over(grid),
            (true, false) => {
                self.merge(grid);
            }
            _ => {}
        }
    }

    /// Shifts onto the kerb and stops.
    fn pull_over(&mut self, grid: &mut Grid) {
        if self.in_intersection {
            return;
        }
        grid.vacate(self.tile(), self.id);
        self.pos += self.heading.kerb();
        self.pulled_over = true;
        self.movement = MovementState::Stopped;
        self.reset_four_way();
        grid.occupy(self.tile(), self.id);
        log::trace!("{:?} pulled over at {:?}", self.id, self.tile());
    }

    /// Moves back into the lane if it and the two tiles ahead of it are free,
    /// returning whether the vehicle merged.
    pub(crate) fn merge(&mut self, grid: &mut Grid) -> bool {
        let lane = self.pos - self.heading.kerb();
        let lane_tile = tile_of(lane);
        let blocked = (0..=2)
            .map(|n| self.heading.ahead(lane_tile, n))
            .any(|tile| grid.overlay(tile).is_occupied());
        if blocked {
            return false;
        }

        grid.vacate(self.tile(), self.id);
        self.pos = lane;
        self.pulled_over = false;
        self.movement = MovementState::Moving;
        grid.occupy(lane_tile, self.id);
        log::trace!("{:?} merged at {:?}", self.id, lane_tile);
        true
    }
}
