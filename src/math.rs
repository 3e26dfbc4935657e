//! Mathematical types shared across the simulation.

use cgmath::{Point2, Vector2};

/// A 2D point in tile units.
pub type Point2d = Point2<f64>;

/// A 2D vector in tile units.
pub type Vector2d = Vector2<f64>;

/// The integer coordinates of a grid tile, `x` being the column and `y` the row.
pub type TileCoord = Point2<i32>;

/// Gets the tile containing the given point.
///
/// Coordinates are floored rather than truncated, so a point slightly left of
/// or above the grid does not alias tile zero.
pub fn tile_of(point: Point2d) -> TileCoord {
    TileCoord::new(point.x.floor() as i32, point.y.floor() as i32)
}
