use crate::debug::debug_tile;
use crate::grid::Grid;
use crate::math::TileCoord;
use crate::vehicle::Vehicle;
use crate::{VehicleId, VehicleSet};
use arrayvec::ArrayVec;
use itertools::Itertools;

/// Counts collisions between vehicles crossing the intersection.
///
/// Only vehicles in the intersection core or on a crosswalk and travelling on
/// perpendicular headings can collide. Once a pair has been counted it is
/// ignored for a cooldown period, so that one physical collision spanning
/// several frames is counted once.
#[derive(Clone, Debug)]
pub struct CollisionDetector {
    /// The pairs recently counted.
    cooldowns: Vec<Cooldown>,
    /// The length of a cooldown in frames.
    cooldown_ticks: u32,
    /// The running total of collisions.
    count: usize,
}

#[derive(Clone, Copy, Debug)]
struct Cooldown {
    /// The vehicle pair, smallest ID first.
    pair: (VehicleId, VehicleId),
    /// The number of frames remaining.
    remaining: u32,
}

impl CollisionDetector {
    pub fn new(cooldown_ticks: u32) -> Self {
        Self {
            cooldowns: vec![],
            cooldown_ticks,
            count: 0,
        }
    }

    /// The running total of collisions.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Checks every pair of vehicles for a collision in the current frame,
    /// then ages the cooldowns. Returns the updated running total.
    pub fn detect(&mut self, vehicles: &VehicleSet, grid: &Grid) -> usize {
        let candidates = vehicles
            .values()
            .filter(|veh| grid.is_conflict_zone(veh.tile()))
            .collect::<Vec<_>>();

        for (a, b) in candidates.iter().tuple_combinations() {
            if !a.heading().is_perpendicular(b.heading()) {
                continue;
            }
            let footprint_b = footprint(b);
            let overlap = footprint(a).into_iter().find(|tile| footprint_b.contains(tile));
            let tile = match overlap {
                Some(tile) => tile,
                None => continue,
            };

            let pair = if a.id() < b.id() {
                (a.id(), b.id())
            } else {
                (b.id(), a.id())
            };
            if self.cooldowns.iter().any(|cooldown| cooldown.pair == pair) {
                continue;
            }

            self.count += 1;
            self.cooldowns.push(Cooldown {
                pair,
                remaining: self.cooldown_ticks,
            });
            log::debug!(
                "Collision between {:?} and {:?} at {:?}",
                pair.0,
                pair.1,
                tile
            );
            debug_tile("collision", tile);
        }

        for cooldown in &mut self.cooldowns {
            cooldown.remaining = cooldown.remaining.saturating_sub(1);
        }
        self.cooldowns.retain(|cooldown| cooldown.remaining > 0);

        self.count
    }
}

/// The tiles a vehicle is considered to cover: its own tile and the one behind,
/// which catches crossings that fall between two frames.
fn footprint(vehicle: &Vehicle) -> ArrayVec<TileCoord, 2> {
    let tile = vehicle.tile();
    ArrayVec::from([tile, vehicle.heading().ahead(tile, -1)])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point2d;
    use crate::vehicle::{Heading, VehicleAttributes, VehicleKind};

    fn add(vehicles: &mut VehicleSet, heading: Heading, x: f64, y: f64) -> VehicleId {
        let attributes = VehicleAttributes {
            kind: VehicleKind::Civilian,
            heading,
            position: Point2d::new(x, y),
            speed: 0.1,
            color: [0, 0, 0],
        };
        vehicles.insert_with_key(|id| Vehicle::new(id, &attributes))
    }

    #[test]
    fn overlap_counts_once_per_cooldown() {
        let grid = Grid::new(24);
        let mut vehicles = VehicleSet::with_key();
        add(&mut vehicles, Heading::East, 12.2, 12.0);
        add(&mut vehicles, Heading::North, 12.0, 12.5);
        let mut detector = CollisionDetector::new(60);

        for _ in 0..59 {
            assert_eq!(detector.detect(&vehicles, &grid), 1);
        }
        assert_eq!(detector.detect(&vehicles, &grid), 1);
        assert_eq!(detector.detect(&vehicles, &grid), 2);
    }

    #[test]
    fn trailing_tile_catches_a_crossing() {
        let grid = Grid::new(24);
        let mut vehicles = VehicleSet::with_key();
        // The eastbound vehicle has just left (11, 12) as the other enters it.
        add(&mut vehicles, Heading::East, 12.1, 12.0);
        add(&mut vehicles, Heading::South, 11.0, 12.3);
        let mut detector = CollisionDetector::new(60);
        assert_eq!(detector.detect(&vehicles, &grid), 1);
    }

    #[test]
    fn parallel_and_distant_vehicles_do_not_collide() {
        let grid = Grid::new(24);
        let mut vehicles = VehicleSet::with_key();
        add(&mut vehicles, Heading::East, 11.2, 12.0);
        add(&mut vehicles, Heading::East, 11.5, 12.0);
        add(&mut vehicles, Heading::North, 3.0, 3.0);
        add(&mut vehicles, Heading::West, 3.0, 3.0);
        let mut detector = CollisionDetector::new(60);
        assert_eq!(detector.detect(&vehicles, &grid), 0);
        assert_eq!(detector.count(), 0);
    }
}
