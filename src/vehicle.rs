pub use self::heading::Heading;
pub use self::pull_over::Siren;
use crate::grid::{Grid, Overlay};
use crate::math::{tile_of, Point2d, TileCoord};
use crate::VehicleId;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod heading;
mod pull_over;

/// The colours an emergency vehicle cycles through while running code 3.
const FLASH_COLORS: [[u8; 3]; 3] = [[255, 0, 0], [255, 255, 255], [0, 0, 255]];

/// A simulated vehicle.
///
/// Civilian and emergency vehicles share this type and differ by their
/// [VehicleKind]: an emergency vehicle running code 3 never stops, and
/// civilian vehicles pull over to let it pass.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID
    pub(crate) id: VehicleId,
    /// Whether the vehicle is a civilian or an emergency vehicle.
    kind: VehicleKind,
    /// The direction of travel.
    heading: Heading,
    /// The position of the vehicle's reference corner, in tiles.
    pos: Point2d,
    /// The distance travelled per frame, in tiles.
    speed: f64,
    /// The display colour.
    color: [u8; 3],
    /// Whether the vehicle moved on the last frame.
    movement: MovementState,
    /// Whether the vehicle is inside the intersection's bounding box.
    in_intersection: bool,
    /// Whether the vehicle has pulled onto the kerb for an emergency vehicle.
    pulled_over: bool,
    /// Progress through an all-way stop.
    four_way: FourWayState,
    /// The number of frames spent waiting at an all-way stop.
    wait_ticks: u32,
    /// The sequence number assigned on joining the all-way stop queue,
    /// which breaks ties between vehicles that arrived on the same frame.
    queued: Option<usize>,
}

/// The attributes of a simulated vehicle.
#[derive(Clone, Copy, Debug)]
pub struct VehicleAttributes {
    pub kind: VehicleKind,
    pub heading: Heading,
    /// The starting position in tiles.
    pub position: Point2d,
    /// The speed in tiles per frame.
    pub speed: f64,
    pub color: [u8; 3],
}

/// The kind of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VehicleKind {
    Civilian,
    /// An emergency vehicle; `code3` is set while running lights and siren.
    Emergency { code3: bool },
}

/// Whether a vehicle moved on the last frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MovementState {
    Moving,
    Stopped,
}

/// A vehicle's progress through an all-way stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FourWayState {
    Approaching,
    /// Queued at the stop line, waiting to be released.
    Waiting,
    /// Released by the intersection and crossing it.
    Proceeding,
}

/// The result of a [Vehicle::check_ahead] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AheadResult {
    Proceed,
    Stop,
}

impl Vehicle {
    /// Creates a new vehicle.
    pub(crate) fn new(id: VehicleId, attributes: &VehicleAttributes) -> Self {
        Self {
            id,
            kind: attributes.kind,
            heading: attributes.heading,
            pos: attributes.position,
            speed: attributes.speed,
            color: attributes.color,
            movement: MovementState::Moving,
            in_intersection: false,
            pulled_over: false,
            four_way: FourWayState::Approaching,
            wait_ticks: 0,
            queued: None,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn kind(&self) -> VehicleKind {
        self.kind
    }

    /// Whether this is an emergency vehicle, whether or not it runs code 3.
    pub fn is_emergency(&self) -> bool {
        matches!(self.kind, VehicleKind::Emergency { .. })
    }

    /// Whether this is an emergency vehicle running lights and siren.
    pub fn is_code3(&self) -> bool {
        matches!(self.kind, VehicleKind::Emergency { code3: true })
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// The position of the vehicle in tiles.
    pub fn position(&self) -> Point2d {
        self.pos
    }

    /// The tile the vehicle is on.
    pub fn tile(&self) -> TileCoord {
        tile_of(self.pos)
    }

    /// The vehicle's speed in tiles per frame.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    pub fn movement_state(&self) -> MovementState {
        self.movement
    }

    /// Whether the vehicle is stopped.
    pub fn has_stopped(&self) -> bool {
        self.movement == MovementState::Stopped
    }

    /// Whether the vehicle is inside the intersection's bounding box.
    pub fn in_intersection(&self) -> bool {
        self.in_intersection
    }

    /// Whether the vehicle is pulled over for an emergency vehicle.
    pub fn pulled_over(&self) -> bool {
        self.pulled_over
    }

    pub fn four_way_state(&self) -> FourWayState {
        self.four_way
    }

    /// The number of frames spent waiting at the all-way stop.
    pub fn four_way_wait_ticks(&self) -> u32 {
        self.wait_ticks
    }

    /// The queue sequence number, if the vehicle is waiting at the all-way stop.
    pub(crate) fn queued(&self) -> Option<usize> {
        self.queued
    }

    /// Whether the vehicle has driven off the edge of a grid of the given size.
    pub fn is_off_grid(&self, size: usize) -> bool {
        let size = size as f64;
        self.pos.x < 0.0 || self.pos.x >= size || self.pos.y < 0.0 || self.pos.y >= size
    }

    /// Registers the vehicle's tile with the grid after it has been created.
    pub(crate) fn place(&mut self, grid: &mut Grid) {
        let tile = self.tile();
        grid.occupy(tile, self.id);
        self.in_intersection = grid.in_intersection(tile);
    }

    /// Clears the vehicle's tile before it is removed.
    pub(crate) fn vacate(&self, grid: &mut Grid) {
        grid.vacate(self.tile(), self.id);
    }

    /// Decides whether the vehicle must stop before moving this frame.
    ///
    /// The vehicle stops if either of the two tiles ahead is occupied by
    /// another vehicle or held by a red light. Reaching an all-way stop
    /// queues the vehicle, which then waits until it is released. A vehicle
    /// inside the intersection never stops, nor does an emergency vehicle
    /// running code 3.
    ///
    /// # Parameters
    /// * `grid` - The grid the vehicle is on
    /// * `seq` - The next queue sequence number
    pub fn check_ahead(&mut self, grid: &Grid, seq: &mut usize) -> AheadResult {
        if self.is_code3() || self.in_intersection {
            return AheadResult::Proceed;
        }

        let tile = self.tile();
        let ahead = [1, 2].map(|n| grid.overlay(self.heading.ahead(tile, n)));

        let blocked = ahead.iter().any(|overlay| match overlay {
            Overlay::Occupied(id) => *id != self.id,
            Overlay::RedHold(_) => true,
            Overlay::None | Overlay::FourWayHold => false,
        });
        if blocked {
            return AheadResult::Stop;
        }

        if ahead.contains(&Overlay::FourWayHold) {
            match self.four_way {
                FourWayState::Proceeding => {}
                FourWayState::Waiting => return AheadResult::Stop,
                FourWayState::Approaching => {
                    *seq += 1;
                    self.four_way = FourWayState::Waiting;
                    self.wait_ticks = 0;
                    self.queued = Some(*seq);
                    log::trace!("{:?} queued at all-way stop ({})", self.id, *seq);
                    return AheadResult::Stop;
                }
            }
        }

        AheadResult::Proceed
    }

    /// Advances the vehicle by one frame.
    pub(crate) fn step(&mut self, grid: &mut Grid, seq: &mut usize) {
        if self.pulled_over {
            self.movement = MovementState::Stopped;
            return;
        }

        match self.four_way {
            FourWayState::Waiting => {
                self.wait_ticks += 1;
                self.hold_position(grid);
                return;
            }
            FourWayState::Proceeding
                if self.heading.is_past(self.tile(), grid.intersection_span()) =>
            {
                self.reset_four_way();
            }
            _ => {}
        }

        if self.check_ahead(grid, seq) == AheadResult::Stop {
            self.hold_position(grid);
            return;
        }

        self.movement = MovementState::Moving;
        let prev = self.tile();
        self.pos += self.heading.unit() * self.speed;
        let tile = self.tile();
        if tile != prev {
            grid.vacate(prev, self.id);
        }
        grid.occupy(tile, self.id);
        self.in_intersection = grid.in_intersection(tile);
    }

    /// Stays put, keeping the current tile marked as occupied.
    fn hold_position(&mut self, grid: &mut Grid) {
        self.movement = MovementState::Stopped;
        grid.occupy(self.tile(), self.id);
    }

    /// Checks for emergency vehicles running code 3 on the crossing road,
    /// returning `true` if it is safe to enter the intersection.
    pub fn look_both_ways<'a>(&self, others: impl IntoIterator<Item = &'a Vehicle>) -> bool {
        !others
            .into_iter()
            .any(|other| other.is_code3() && other.heading.is_perpendicular(self.heading))
    }

    /// Releases the vehicle from the all-way stop queue.
    pub(crate) fn release(&mut self) {
        if self.four_way == FourWayState::Waiting {
            self.four_way = FourWayState::Proceeding;
            self.wait_ticks = 0;
            self.queued = None;
        }
    }

    /// Forgets any all-way stop progress.
    pub(crate) fn reset_four_way(&mut self) {
        self.four_way = FourWayState::Approaching;
        self.wait_ticks = 0;
        self.queued = None;
    }

    /// Advances the colour cycle of an emergency vehicle running code 3.
    pub(crate) fn flash_lights(&mut self) {
        if !self.is_code3() {
            return;
        }
        let next = FLASH_COLORS
            .iter()
            .position(|color| *color == self.color)
            .map(|idx| (idx + 1) % FLASH_COLORS.len())
            .unwrap_or(0);
        self.color = FLASH_COLORS[next];
    }
}
