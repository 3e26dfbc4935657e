pub use cgmath;
pub use collision::CollisionDetector;
pub use config::{ConfigError, SimulationConfig};
pub use grid::{Grid, Overlay, Tile, TileKind};
pub use intersection::IntersectionCoordinator;
pub use light::{ApproachGroup, LightColor, LightState, LightTimings, TrafficLight};
pub use simulation::Simulation;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use stats::{Counters, ModeCounters};
pub use util::Interval;
pub use vehicle::{
    AheadResult, FourWayState, Heading, MovementState, Siren, Vehicle, VehicleAttributes,
    VehicleKind,
};

mod collision;
mod config;
mod debug;
mod grid;
mod intersection;
mod light;
pub mod math;
mod simulation;
pub mod spawn;
mod stats;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
    /// Unique ID of a [TrafficLight].
    pub struct TrafficLightId;
}

/// The vehicles in a simulation, keyed by ID.
pub type VehicleSet = SlotMap<VehicleId, Vehicle>;
