use crate::light::ApproachGroup;
use crate::math::{Point2d, TileCoord, Vector2d};
use crate::util::Interval;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A compass heading. The grid's `y` axis points south.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Heading {
    North,
    South,
    East,
    West,
}

impl Heading {
    /// All four headings.
    pub const ALL: [Heading; 4] = [Heading::North, Heading::South, Heading::East, Heading::West];

    /// A unit vector pointing along the heading.
    pub fn unit(self) -> Vector2d {
        let (x, y) = self.delta();
        Vector2d::new(x as f64, y as f64)
    }

    /// A unit vector pointing to the right of the heading, towards the kerb.
    pub fn kerb(self) -> Vector2d {
        let (x, y) = self.delta();
        Vector2d::new(-y as f64, x as f64)
    }

    /// Gets the tile `n` tiles ahead of `tile`; negative `n` looks behind.
    pub fn ahead(self, tile: TileCoord, n: i32) -> TileCoord {
        let (x, y) = self.delta();
        TileCoord::new(tile.x + n * x, tile.y + n * y)
    }

    /// The approach group whose lights control traffic on this heading.
    pub fn group(self) -> ApproachGroup {
        match self {
            Heading::North | Heading::South => ApproachGroup::NorthSouth,
            Heading::East | Heading::West => ApproachGroup::EastWest,
        }
    }

    /// Whether this heading crosses the other at right angles.
    pub fn is_perpendicular(self, other: Heading) -> bool {
        self.group() != other.group()
    }

    /// The distance travelled along the heading to reach `point`,
    /// relative to an arbitrary fixed origin.
    pub fn progress(self, point: Point2d) -> f64 {
        let (x, y) = self.delta();
        x as f64 * point.x + y as f64 * point.y
    }

    /// Whether a vehicle on `tile` has driven out the far side of `span`.
    pub fn is_past(self, tile: TileCoord, span: Interval<i32>) -> bool {
        match self {
            Heading::North => span.is_below(tile.y),
            Heading::South => span.is_above(tile.y),
            Heading::East => span.is_above(tile.x),
            Heading::West => span.is_below(tile.x),
        }
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Heading::North => (0, -1),
            Heading::South => (0, 1),
            Heading::East => (1, 0),
            Heading::West => (-1, 0),
        }
    }
}
