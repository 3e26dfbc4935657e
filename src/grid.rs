//! The tile lattice the intersection is laid out on, and the dynamic
//! occupancy overlays written on top of it every tick.

use crate::math::TileCoord;
use crate::util::Interval;
use crate::{TrafficLightId, VehicleId};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The static kind of a tile, fixed when the grid is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TileKind {
    Road,
    Sidewalk,
    Crosswalk,
    IntersectionCore,
    Block,
}

/// The dynamic state written over a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Overlay {
    #[default]
    None,
    /// The tile is occupied by the given vehicle.
    Occupied(VehicleId),
    /// The tile is held by a red (or late yellow) traffic light.
    RedHold(TrafficLightId),
    /// The tile is held by the all-way stop.
    FourWayHold,
}

impl Overlay {
    /// Whether the overlay was written by the intersection rather than a vehicle.
    pub fn is_hold(&self) -> bool {
        matches!(self, Overlay::RedHold(_) | Overlay::FourWayHold)
    }

    /// Whether the overlay marks the tile as occupied by any vehicle.
    pub fn is_occupied(&self) -> bool {
        matches!(self, Overlay::Occupied(_))
    }
}

/// A single grid tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tile {
    pub kind: TileKind,
    pub overlay: Overlay,
}

/// A square lattice of tiles with a single four-way intersection at its centre.
///
/// Two lanes run through the centre in each axis and are lined with sidewalks.
/// Where a lane crosses a sidewalk line there is a crosswalk, and the four
/// tiles shared by both roads form the intersection core.
///
/// All accessors bounds-check: reads outside the grid yield nothing and
/// writes outside the grid are ignored, since vehicles legitimately drive
/// off the edge before they are removed.
#[derive(Clone, Debug)]
pub struct Grid {
    size: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid with `size` tiles along each side.
    pub fn new(size: usize) -> Self {
        let mut grid = Self {
            size,
            tiles: Vec::with_capacity(size * size),
        };
        for y in 0..size as i32 {
            for x in 0..size as i32 {
                let kind = grid.layout(TileCoord::new(x, y));
                grid.tiles.push(Tile {
                    kind,
                    overlay: Overlay::None,
                });
            }
        }
        grid
    }

    /// Gets the number of tiles along each side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Gets the index of the higher-numbered lane in each axis.
    /// The lanes are at `centre() - 1` and `centre()`.
    pub fn centre(&self) -> i32 {
        (self.size / 2) as i32
    }

    /// The tile range, in either axis, spanned by the intersection
    /// including its crosswalks.
    pub fn intersection_span(&self) -> Interval<i32> {
        let c = self.centre();
        Interval::new(c - 2, c + 1)
    }

    /// The tile range, in either axis, spanned by the two lanes of a road.
    pub fn lane_span(&self) -> Interval<i32> {
        let c = self.centre();
        Interval::new(c - 1, c)
    }

    /// Whether the tile lies inside the grid.
    pub fn in_bounds(&self, tile: TileCoord) -> bool {
        let size = self.size as i32;
        (0..size).contains(&tile.x) && (0..size).contains(&tile.y)
    }

    /// Gets the tile at the given coordinates.
    pub fn get(&self, tile: TileCoord) -> Option<&Tile> {
        self.index(tile).map(|idx| &self.tiles[idx])
    }

    /// Gets the kind of the tile at the given coordinates.
    pub fn kind(&self, tile: TileCoord) -> Option<TileKind> {
        self.get(tile).map(|tile| tile.kind)
    }

    /// Gets the overlay of the tile at the given coordinates.
    /// Tiles outside the grid read as [Overlay::None].
    pub fn overlay(&self, tile: TileCoord) -> Overlay {
        self.get(tile).map(|tile| tile.overlay).unwrap_or_default()
    }

    /// Gets the light holding the tile red, if there is one.
    pub fn held_by(&self, tile: TileCoord) -> Option<TrafficLightId> {
        match self.overlay(tile) {
            Overlay::RedHold(light_id) => Some(light_id),
            _ => None,
        }
    }

    /// Whether the tile is in the intersection core or one of its crosswalks,
    /// i.e. somewhere perpendicular paths can meet.
    pub fn is_conflict_zone(&self, tile: TileCoord) -> bool {
        matches!(
            self.kind(tile),
            Some(TileKind::IntersectionCore | TileKind::Crosswalk)
        )
    }

    /// Whether the tile lies within the intersection's bounding box.
    pub fn in_intersection(&self, tile: TileCoord) -> bool {
        let span = self.intersection_span();
        span.contains(tile.x) && span.contains(tile.y)
    }

    /// The crosswalk tiles, which carry the light and four-way holds.
    pub fn crosswalks(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.iter()
            .filter(|(_, tile)| tile.kind == TileKind::Crosswalk)
            .map(|(coord, _)| coord)
    }

    /// Returns an iterator over all the tiles and their coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &Tile)> + '_ {
        let size = self.size;
        self.tiles.iter().enumerate().map(move |(idx, tile)| {
            let coord = TileCoord::new((idx % size) as i32, (idx / size) as i32);
            (coord, tile)
        })
    }

    /// Marks the tile as occupied by a vehicle. Holds take precedence over
    /// occupancy, so a held tile is left untouched.
    pub fn occupy(&mut self, tile: TileCoord, vehicle_id: VehicleId) {
        if let Some(tile) = self.get_mut(tile) {
            if !tile.overlay.is_hold() {
                tile.overlay = Overlay::Occupied(vehicle_id);
            }
        }
    }

    /// Clears the tile if, and only if, it is occupied by the given vehicle.
    pub fn vacate(&mut self, tile: TileCoord, vehicle_id: VehicleId) {
        if let Some(tile) = self.get_mut(tile) {
            if tile.overlay == Overlay::Occupied(vehicle_id) {
                tile.overlay = Overlay::None;
            }
        }
    }

    /// Places a hold on the tile, replacing any occupancy.
    pub fn hold(&mut self, tile: TileCoord, hold: Overlay) {
        debug_assert!(hold.is_hold());
        if let Some(tile) = self.get_mut(tile) {
            tile.overlay = hold;
        }
    }

    /// Removes a hold from the tile if it is exactly the given hold.
    pub fn release(&mut self, tile: TileCoord, hold: Overlay) {
        if let Some(tile) = self.get_mut(tile) {
            if tile.overlay == hold {
                tile.overlay = Overlay::None;
            }
        }
    }

    /// Overwrites the overlay of a tile unconditionally.
    pub fn set_overlay(&mut self, tile: TileCoord, overlay: Overlay) {
        if let Some(tile) = self.get_mut(tile) {
            tile.overlay = overlay;
        }
    }

    fn get_mut(&mut self, tile: TileCoord) -> Option<&mut Tile> {
        let idx = self.index(tile)?;
        self.tiles.get_mut(idx)
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        self.in_bounds(tile)
            .then(|| tile.y as usize * self.size + tile.x as usize)
    }

    /// Determines the static kind of a tile from its position.
    fn layout(&self, tile: TileCoord) -> TileKind {
        let c = self.centre();
        let lanes = self.lane_span();
        let is_sidewalk_line = |v: i32| v == c - 2 || v == c + 1;

        let x_lane = lanes.contains(tile.x);
        let y_lane = lanes.contains(tile.y);
        match (x_lane, y_lane) {
            (true, true) => TileKind::IntersectionCore,
            (true, false) if is_sidewalk_line(tile.y) => TileKind::Crosswalk,
            (false, true) if is_sidewalk_line(tile.x) => TileKind::Crosswalk,
            (true, false) | (false, true) => TileKind::Road,
            (false, false) if is_sidewalk_line(tile.x) || is_sidewalk_line(tile.y) => {
                TileKind::Sidewalk
            }
            (false, false) => TileKind::Block,
        }
    }
}
