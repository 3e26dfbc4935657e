use crate::collision::CollisionDetector;
use crate::config::{ConfigError, SimulationConfig};
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::grid::Grid;
use crate::intersection::IntersectionCoordinator;
use crate::light::{ApproachGroup, LightState, TrafficLight};
use crate::math::tile_of;
use crate::spawn::{spawn_point, SpawnPolicy};
use crate::stats::Counters;
use crate::vehicle::{Heading, Siren, Vehicle, VehicleAttributes, VehicleKind};
use crate::{TrafficLightId, VehicleId, VehicleSet};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Emergency vehicles running code 3 change colour once per this many frames.
const FLASH_INTERVAL: usize = 10;

/// A simulation of a single signalised intersection.
///
/// Each call to [Simulation::step] advances one frame: the lights tick, the
/// intersection updates the crosswalk holds, vehicles yield and move,
/// collisions are counted, and vehicles leave and enter the grid.
pub struct Simulation {
    /// The parameters the simulation was created with.
    config: SimulationConfig,
    /// The tile grid.
    grid: Grid,
    /// The traffic lights and the all-way stop.
    intersection: IntersectionCoordinator,
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    /// The collision counter.
    collisions: CollisionDetector,
    /// The aggregate counters.
    counters: Counters,
    /// The random spawn policy.
    spawner: SpawnPolicy,
    rng: StdRng,
    /// The current frame of simulation.
    frame: usize,
    /// The next sequence number.
    seq: usize,
    /// Whether stepping is suspended.
    paused: bool,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::build(SimulationConfig::default())
    }
}

impl Simulation {
    /// Creates a new simulation with the default parameters.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a new simulation with the given parameters.
    pub fn with_config(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SimulationConfig) -> Self {
        let grid = Grid::new(config.grid_size);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            intersection: IntersectionCoordinator::new(&grid, &config),
            collisions: CollisionDetector::new(config.collision_cooldown_ticks),
            spawner: SpawnPolicy::new(&config),
            grid,
            vehicles: VehicleSet::with_key(),
            counters: Counters::default(),
            rng,
            frame: 0,
            seq: 0,
            paused: false,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
            config,
        }
    }

    /// Advances the simulation by one frame. Does nothing while paused.
    pub fn step(&mut self) {
        if self.paused {
            return;
        }

        self.intersection.step_lights();
        self.intersection
            .update_intersection(&mut self.grid, &mut self.vehicles);
        self.move_vehicles();
        self.detect_collisions();
        self.remove_departed();
        self.spawn_random();
        self.flash_emergency_lights();
        self.frame += 1;

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
    }

    /// Lets civilian vehicles yield to sirens, then moves every vehicle.
    fn move_vehicles(&mut self) {
        let sirens = self
            .vehicles
            .values()
            .filter_map(Siren::of)
            .collect::<Vec<_>>();
        for vehicle in self.vehicles.values_mut() {
            vehicle.yield_to_sirens(&sirens, &mut self.grid);
            vehicle.step(&mut self.grid, &mut self.seq);
        }
    }

    /// Counts new collisions against the current preemption mode.
    fn detect_collisions(&mut self) {
        let preemption = self.preemption_enabled();
        let before = self.collisions.count();
        let after = self.collisions.detect(&self.vehicles, &self.grid);
        self.counters.record_collisions(preemption, after - before);
    }

    /// Removes the vehicles that have driven off the grid.
    fn remove_departed(&mut self) {
        let size = self.grid.size();
        let departed = self
            .vehicles
            .values()
            .filter(|veh| veh.is_off_grid(size))
            .map(|veh| veh.id())
            .collect::<Vec<_>>();
        for vehicle_id in departed {
            self.remove_vehicle(vehicle_id);
        }
    }

    fn spawn_random(&mut self) {
        if let Some((heading, kind)) = self.spawner.sample(&mut self.rng) {
            self.spawn(heading, kind);
        }
    }

    fn flash_emergency_lights(&mut self) {
        if self.frame % FLASH_INTERVAL != 0 {
            return;
        }
        for vehicle in self.vehicles.values_mut() {
            vehicle.flash_lights();
        }
    }

    /// Spawns a vehicle at the entry point for `heading`, unless the entry tile is taken.
    fn spawn(&mut self, heading: Heading, kind: VehicleKind) -> Option<VehicleId> {
        let position = spawn_point(heading, self.grid.size());
        if self.grid.overlay(tile_of(position)).is_occupied() {
            log::debug!("Spawn point for {:?} is blocked", heading);
            return None;
        }
        let attributes = VehicleAttributes {
            kind,
            heading,
            position,
            speed: self.spawner.speed(kind, &mut self.rng),
            color: self.spawner.color(kind, &mut self.rng),
        };
        Some(self.add_vehicle(&attributes))
    }

    /// Spawns a civilian vehicle travelling in the given direction.
    /// Returns `None` if the entry tile is occupied.
    pub fn spawn_vehicle(&mut self, heading: Heading) -> Option<VehicleId> {
        self.spawn(heading, VehicleKind::Civilian)
    }

    /// Spawns an emergency vehicle travelling in the given direction.
    /// Returns `None` if the entry tile is occupied.
    pub fn spawn_emergency_vehicle(&mut self, heading: Heading, code3: bool) -> Option<VehicleId> {
        self.spawn(heading, VehicleKind::Emergency { code3 })
    }

    /// Adds a vehicle to the simulation.
    pub fn add_vehicle(&mut self, attributes: &VehicleAttributes) -> VehicleId {
        let vehicle_id = self.vehicles.insert_with_key(|id| Vehicle::new(id, attributes));
        self.vehicles[vehicle_id].place(&mut self.grid);
        let preemption = self.preemption_enabled();
        let emergency = self.vehicles[vehicle_id].is_emergency();
        self.counters.record_vehicle(preemption, emergency);
        log::debug!(
            "Added {:?} ({:?}) heading {:?}",
            vehicle_id,
            attributes.kind,
            attributes.heading
        );
        vehicle_id
    }

    /// Removes a vehicle from the simulation.
    pub fn remove_vehicle(&mut self, id: VehicleId) {
        if let Some(vehicle) = self.vehicles.remove(id) {
            vehicle.vacate(&mut self.grid);
        }
    }

    /// Switches emergency preemption on or off, returning the new setting.
    ///
    /// Enabling it turns the intersection into an all-way stop; disabling it
    /// resumes normal light cycling.
    pub fn toggle_preemption(&mut self) -> bool {
        if self.intersection.is_four_way_active() {
            self.intersection
                .deactivate_four_way(&mut self.grid, &mut self.vehicles);
        } else {
            self.intersection.activate_four_way(&mut self.grid);
        }
        let enabled = self.preemption_enabled();
        log::info!(
            "Emergency preemption {}",
            if enabled { "enabled" } else { "disabled" }
        );
        enabled
    }

    /// Whether emergency preemption is enabled.
    pub fn preemption_enabled(&self) -> bool {
        self.intersection.is_four_way_active()
    }

    /// Rebuilds the simulation from its parameters, discarding all vehicles
    /// and counters. Preemption ends up disabled and the simulation unpaused.
    pub fn reset(&mut self) {
        *self = Self::build(self.config.clone());
        log::info!("Simulation reset");
    }

    /// Suspends stepping.
    pub fn pause(&mut self) {
        self.paused = true;
        log::info!("Simulation paused at frame {}", self.frame);
    }

    /// Resumes stepping.
    pub fn resume(&mut self) {
        self.paused = false;
        log::info!("Simulation resumed at frame {}", self.frame);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Puts every light in an approach group into the given state,
    /// overriding the normal cycle. Intended for fault injection.
    pub fn force_light_state(&mut self, group: ApproachGroup, state: LightState) {
        self.intersection.force_group_state(group, state);
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// The parameters the simulation was created with.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Gets mutable access to the grid, for fault injection.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn intersection(&self) -> &IntersectionCoordinator {
        &self.intersection
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Returns an iterator over all the traffic lights in the simulation.
    pub fn iter_lights(&self) -> impl Iterator<Item = (TrafficLightId, &TrafficLight)> {
        self.intersection.iter_lights()
    }

    /// Gets a reference to the vehicle with the given ID, if it is still on the grid.
    pub fn get_vehicle(&self, vehicle_id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(vehicle_id)
    }

    /// The aggregate counters.
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// The running total of collisions.
    pub fn collision_count(&self) -> usize {
        self.collisions.count()
    }

    /// Gets the debugging information for the previously simulated frame as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }
}
