use crate::config::SimulationConfig;
use crate::debug::debug_tile;
use crate::grid::{Grid, Overlay};
use crate::light::{ApproachGroup, LightColor, LightState, LightTimings, TrafficLight};
use crate::math::TileCoord;
use crate::vehicle::FourWayState;
use crate::{TrafficLightId, VehicleId, VehicleSet};
use slotmap::SlotMap;
use std::cmp::Reverse;

/// Owns the traffic lights and translates their states into holds on the
/// crosswalk tiles of the grid.
///
/// With emergency preemption enabled, every light blinks as an all-way stop and
/// the coordinator releases queued vehicles into the intersection one at a time.
#[derive(Clone, Debug)]
pub struct IntersectionCoordinator {
    /// The traffic lights, one per approach lane.
    lights: SlotMap<TrafficLightId, TrafficLight>,
    /// Whether the all-way stop is in force.
    four_way_active: bool,
    /// The vehicles queued at the all-way stop as of the last frame.
    wait_queue: Vec<VehicleId>,
    /// The number of frames before the next vehicle may be released.
    release_buffer: u32,
    /// The value `release_buffer` is reset to after each release.
    release_gap: u32,
    /// A yellow light older than this, in s, holds its tiles.
    late_yellow_secs: f64,
    /// The minimum wait before a queued vehicle may be released, in frames.
    dwell_ticks: u32,
}

impl IntersectionCoordinator {
    /// Creates the coordinator and the lights for the intersection at the centre of `grid`.
    pub fn new(grid: &Grid, config: &SimulationConfig) -> Self {
        let timings = LightTimings {
            green: config.ticks(config.green_secs),
            yellow: config.ticks(config.yellow_secs),
            red: config.ticks(config.red_secs),
            ticks_per_second: config.ticks_per_second,
        };
        let mut lights = SlotMap::with_key();
        for (position, group, tile) in light_layout(grid.centre()) {
            lights.insert(TrafficLight::new(position, group, &[tile], timings));
        }
        Self {
            lights,
            four_way_active: false,
            wait_queue: vec![],
            release_buffer: 0,
            release_gap: config.release_gap_ticks,
            late_yellow_secs: config.late_yellow_secs,
            dwell_ticks: config.dwell_ticks(),
        }
    }

    /// Advances every traffic light by one frame.
    pub(crate) fn step_lights(&mut self) {
        for light in self.lights.values_mut() {
            light.step();
        }
    }

    /// Updates the crosswalk holds from the light states or, while the
    /// all-way stop is in force, releases the next queued vehicle if it is safe to.
    pub(crate) fn update_intersection(&mut self, grid: &mut Grid, vehicles: &mut VehicleSet) {
        if self.four_way_active {
            self.arbitrate(vehicles);
            return;
        }

        for (light_id, light) in &self.lights {
            let hold = Overlay::RedHold(light_id);
            let holding = light.is_holding(self.late_yellow_secs);
            for &tile in light.tiles() {
                if holding {
                    grid.hold(tile, hold);
                } else {
                    grid.release(tile, hold);
                }
            }
        }
    }

    /// Picks at most one queued vehicle to release into the intersection.
    ///
    /// The candidate is the eligible vehicle that has waited longest, ties going
    /// to whichever joined the queue first. It is held back, and no other vehicle
    /// considered, while an emergency vehicle running code 3 is on the crossing road.
    fn arbitrate(&mut self, vehicles: &mut VehicleSet) {
        self.wait_queue.clear();
        self.wait_queue.extend(
            vehicles
                .values()
                .filter(|veh| veh.four_way_state() == FourWayState::Waiting && !veh.pulled_over())
                .map(|veh| veh.id()),
        );

        self.release_buffer = self.release_buffer.saturating_sub(1);
        if self.release_buffer > 0 {
            return;
        }

        let candidate = self
            .wait_queue
            .iter()
            .map(|id| &vehicles[*id])
            .filter(|veh| veh.four_way_wait_ticks() >= self.dwell_ticks)
            .max_by_key(|veh| (veh.four_way_wait_ticks(), Reverse(veh.queued())))
            .map(|veh| veh.id());

        let candidate = match candidate {
            Some(id) => id,
            None => return,
        };

        if !vehicles[candidate].look_both_ways(vehicles.values()) {
            log::debug!(
                "{:?} held at all-way stop for cross traffic siren",
                candidate
            );
            return;
        }

        let vehicle = &mut vehicles[candidate];
        vehicle.release();
        self.release_buffer = self.release_gap;
        log::debug!("{:?} released from all-way stop", candidate);
        debug_tile("release", vehicle.tile());
    }

    /// Puts every light into the blinking all-way stop and holds every crosswalk.
    pub(crate) fn activate_four_way(&mut self, grid: &mut Grid) {
        self.four_way_active = true;
        self.release_buffer = 0;
        for light in self.lights.values_mut() {
            light.enter_four_way();
            for &tile in light.tiles() {
                grid.hold(tile, Overlay::FourWayHold);
            }
        }
    }

    /// Ends the all-way stop and resumes normal light cycling.
    ///
    /// Every vehicle forgets its place in the queue; the crosswalk holds are
    /// recomputed from the lights on the next frame.
    pub(crate) fn deactivate_four_way(&mut self, grid: &mut Grid, vehicles: &mut VehicleSet) {
        self.four_way_active = false;
        self.wait_queue.clear();
        self.release_buffer = 0;
        for light in self.lights.values_mut() {
            light.resume();
            for &tile in light.tiles() {
                grid.release(tile, Overlay::FourWayHold);
            }
        }
        for vehicle in vehicles.values_mut() {
            vehicle.reset_four_way();
        }
    }

    /// Puts every light in the approach group into the given state.
    pub(crate) fn force_group_state(&mut self, group: ApproachGroup, state: LightState) {
        for light in self.lights.values_mut().filter(|light| light.group() == group) {
            match state {
                LightState::FourWayBlink => light.enter_four_way(),
                state => light.force_state(state),
            }
        }
    }

    /// Whether the all-way stop is in force.
    pub fn is_four_way_active(&self) -> bool {
        self.four_way_active
    }

    /// The vehicles queued at the all-way stop as of the last frame.
    pub fn wait_queue(&self) -> &[VehicleId] {
        &self.wait_queue
    }

    /// The number of frames before the next all-way stop release.
    pub fn release_buffer(&self) -> u32 {
        self.release_buffer
    }

    /// Returns an iterator over the traffic lights.
    pub fn iter_lights(&self) -> impl Iterator<Item = (TrafficLightId, &TrafficLight)> {
        self.lights.iter()
    }

    /// Gets the colour shown by the light standing on the given tile,
    /// or red if there is no light there.
    pub fn light_color_at(&self, position: TileCoord) -> LightColor {
        self.lights
            .values()
            .find(|light| light.position() == position)
            .map(|light| light.color())
            .unwrap_or(LightColor::Red)
    }
}

/// Places the light posts around an intersection centred on `c`.
///
/// Each light stands on the sidewalk corner beside its approach and holds the
/// crosswalk tile of one lane, yielding the light's post, group and tile.
fn light_layout(c: i32) -> [(TileCoord, ApproachGroup, TileCoord); 8] {
    use ApproachGroup::*;
    let t = TileCoord::new;
    [
        (t(c - 3, c - 2), EastWest, t(c - 2, c - 1)),
        (t(c - 3, c + 1), EastWest, t(c - 2, c)),
        (t(c + 2, c - 2), EastWest, t(c + 1, c - 1)),
        (t(c + 2, c + 1), EastWest, t(c + 1, c)),
        (t(c - 2, c - 3), NorthSouth, t(c - 1, c - 2)),
        (t(c + 1, c - 3), NorthSouth, t(c, c - 2)),
        (t(c - 2, c + 2), NorthSouth, t(c - 1, c + 1)),
        (t(c + 1, c + 2), NorthSouth, t(c, c + 1)),
    ]
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grid::TileKind;
    use crate::math::Point2d;
    use crate::vehicle::{Heading, Vehicle, VehicleAttributes, VehicleKind};

    fn setup() -> (Grid, IntersectionCoordinator, VehicleSet) {
        let grid = Grid::new(24);
        let coordinator = IntersectionCoordinator::new(&grid, &SimulationConfig::default());
        (grid, coordinator, VehicleSet::with_key())
    }

    fn add(
        vehicles: &mut VehicleSet,
        grid: &mut Grid,
        kind: VehicleKind,
        heading: Heading,
        x: f64,
        y: f64,
    ) -> VehicleId {
        let attributes = VehicleAttributes {
            kind,
            heading,
            position: Point2d::new(x, y),
            speed: 0.1,
            color: [0, 0, 0],
        };
        let id = vehicles.insert_with_key(|id| Vehicle::new(id, &attributes));
        vehicles[id].place(grid);
        id
    }

    /// Runs one frame in the same order as the simulation loop.
    fn frame(
        grid: &mut Grid,
        coordinator: &mut IntersectionCoordinator,
        vehicles: &mut VehicleSet,
        seq: &mut usize,
    ) {
        coordinator.step_lights();
        coordinator.update_intersection(grid, vehicles);
        for vehicle in vehicles.values_mut() {
            vehicle.step(grid, seq);
        }
    }

    #[test]
    fn every_light_holds_one_crosswalk() {
        let (grid, coordinator, _) = setup();
        let mut tiles: Vec<_> = coordinator
            .iter_lights()
            .flat_map(|(_, light)| light.tiles().to_vec())
            .collect();
        assert_eq!(tiles.len(), 8);
        assert!(tiles.iter().all(|tile| grid.kind(*tile) == Some(TileKind::Crosswalk)));
        tiles.sort_by_key(|tile| (tile.x, tile.y));
        tiles.dedup();
        assert_eq!(tiles.len(), 8);
        assert!(coordinator
            .iter_lights()
            .all(|(_, light)| grid.kind(light.position()) == Some(TileKind::Sidewalk)));
    }

    #[test]
    fn red_lights_hold_their_crosswalks() {
        let (mut grid, mut coordinator, mut vehicles) = setup();
        coordinator.update_intersection(&mut grid, &mut vehicles);

        for (light_id, light) in coordinator.iter_lights() {
            for &tile in light.tiles() {
                match light.group() {
                    ApproachGroup::EastWest => assert_eq!(grid.held_by(tile), Some(light_id)),
                    ApproachGroup::NorthSouth => assert_eq!(grid.overlay(tile), Overlay::None),
                }
            }
        }

        coordinator.force_group_state(ApproachGroup::EastWest, LightState::Green);
        coordinator.update_intersection(&mut grid, &mut vehicles);
        assert!(grid.iter().all(|(_, tile)| tile.overlay == Overlay::None));
    }

    #[test]
    fn late_yellow_counts_as_red() {
        let (mut grid, mut coordinator, mut vehicles) = setup();
        coordinator.force_group_state(ApproachGroup::NorthSouth, LightState::Yellow);
        let tile = TileCoord::new(12, 13);

        for _ in 0..48 {
            coordinator.step_lights();
            coordinator.update_intersection(&mut grid, &mut vehicles);
        }
        assert_eq!(grid.overlay(tile), Overlay::None);

        coordinator.step_lights();
        coordinator.update_intersection(&mut grid, &mut vehicles);
        assert!(grid.held_by(tile).is_some());
    }

    #[test]
    fn four_way_round_trip() {
        let (mut grid, mut coordinator, mut vehicles) = setup();
        coordinator.update_intersection(&mut grid, &mut vehicles);
        coordinator.activate_four_way(&mut grid);

        assert!(coordinator.is_four_way_active());
        assert!(grid.crosswalks().all(|tile| grid.overlay(tile) == Overlay::FourWayHold));
        assert!(coordinator
            .iter_lights()
            .all(|(_, light)| light.state() == LightState::FourWayBlink));

        // Lights keep blinking and holds stay put while the stop is in force.
        for _ in 0..100 {
            coordinator.step_lights();
            coordinator.update_intersection(&mut grid, &mut vehicles);
        }
        assert!(grid.crosswalks().all(|tile| grid.overlay(tile) == Overlay::FourWayHold));

        coordinator.deactivate_four_way(&mut grid, &mut vehicles);
        assert!(!coordinator.is_four_way_active());
        assert!(grid.crosswalks().all(|tile| grid.overlay(tile) == Overlay::None));
        for (_, light) in coordinator.iter_lights() {
            assert_eq!(light.state(), light.group().resume_state());
            assert_eq!(light.since(), 0);
        }
    }

    #[test]
    fn releases_one_vehicle_per_gap() {
        let (mut grid, mut coordinator, mut vehicles) = setup();
        coordinator.activate_four_way(&mut grid);
        let mut seq = 0;
        let east = add(
            &mut vehicles,
            &mut grid,
            VehicleKind::Civilian,
            Heading::East,
            8.0,
            12.0,
        );
        let north = add(
            &mut vehicles,
            &mut grid,
            VehicleKind::Civilian,
            Heading::North,
            12.0,
            15.0,
        );

        frame(&mut grid, &mut coordinator, &mut vehicles, &mut seq);
        assert_eq!(vehicles[east].four_way_state(), FourWayState::Waiting);
        assert_eq!(vehicles[north].four_way_state(), FourWayState::Waiting);

        // Neither is released before it has waited the dwell time.
        for _ in 0..60 {
            frame(&mut grid, &mut coordinator, &mut vehicles, &mut seq);
        }
        assert_eq!(coordinator.wait_queue().len(), 2);
        assert_eq!(vehicles[east].four_way_state(), FourWayState::Waiting);

        frame(&mut grid, &mut coordinator, &mut vehicles, &mut seq);
        assert_eq!(vehicles[east].four_way_state(), FourWayState::Proceeding);
        assert_eq!(vehicles[north].four_way_state(), FourWayState::Waiting);
        assert_eq!(coordinator.release_buffer(), 120);

        for _ in 0..119 {
            frame(&mut grid, &mut coordinator, &mut vehicles, &mut seq);
            assert_eq!(vehicles[north].four_way_state(), FourWayState::Waiting);
        }
        frame(&mut grid, &mut coordinator, &mut vehicles, &mut seq);
        assert_eq!(vehicles[north].four_way_state(), FourWayState::Proceeding);
    }

    #[test]
    fn cross_traffic_siren_blocks_release() {
        let (mut grid, mut coordinator, mut vehicles) = setup();
        coordinator.activate_four_way(&mut grid);
        let mut seq = 0;
        let east = add(
            &mut vehicles,
            &mut grid,
            VehicleKind::Civilian,
            Heading::East,
            8.0,
            12.0,
        );
        let ev = add(
            &mut vehicles,
            &mut grid,
            VehicleKind::Emergency { code3: true },
            Heading::South,
            11.0,
            0.0,
        );

        for _ in 0..70 {
            frame(&mut grid, &mut coordinator, &mut vehicles, &mut seq);
            assert_eq!(vehicles[east].four_way_state(), FourWayState::Waiting);
        }
        assert!(vehicles[east].four_way_wait_ticks() > 60);
        assert_eq!(vehicles[ev].four_way_state(), FourWayState::Approaching);

        vehicles.remove(ev);
        frame(&mut grid, &mut coordinator, &mut vehicles, &mut seq);
        assert_eq!(vehicles[east].four_way_state(), FourWayState::Proceeding);
    }

    #[test]
    fn deactivating_clears_the_queue() {
        let (mut grid, mut coordinator, mut vehicles) = setup();
        coordinator.activate_four_way(&mut grid);
        let mut seq = 0;
        let east = add(
            &mut vehicles,
            &mut grid,
            VehicleKind::Civilian,
            Heading::East,
            8.0,
            12.0,
        );
        for _ in 0..3 {
            frame(&mut grid, &mut coordinator, &mut vehicles, &mut seq);
        }
        assert_eq!(coordinator.wait_queue(), &[east]);

        coordinator.deactivate_four_way(&mut grid, &mut vehicles);
        assert!(coordinator.wait_queue().is_empty());
        assert_eq!(vehicles[east].four_way_state(), FourWayState::Approaching);
        assert_eq!(vehicles[east].four_way_wait_ticks(), 0);
    }

    #[test]
    fn missing_light_shows_red() {
        let (_, mut coordinator, _) = setup();
        assert_eq!(
            coordinator.light_color_at(TileCoord::new(0, 0)),
            LightColor::Red
        );
        coordinator.force_group_state(ApproachGroup::NorthSouth, LightState::Green);
        assert_eq!(
            coordinator.light_color_at(TileCoord::new(10, 9)),
            LightColor::Green
        );
    }
}
