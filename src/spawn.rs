//! Where vehicles enter the grid, and the random policy that decides when.

use crate::config::SimulationConfig;
use crate::math::Point2d;
use crate::vehicle::{Heading, VehicleKind};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// The display colour of an emergency vehicle that is not flashing.
pub const EMERGENCY_COLOR: [u8; 3] = [255, 255, 255];

/// Gets the point at which vehicles with the given heading enter a grid of the given size.
///
/// Vehicles drive on the right, so northbound traffic enters at the bottom
/// edge in the right-hand lane, and so on.
pub fn spawn_point(heading: Heading, size: usize) -> Point2d {
    let c = (size / 2) as f64;
    let edge = (size - 1) as f64;
    match heading {
        Heading::North => Point2d::new(c, edge),
        Heading::South => Point2d::new(c - 1.0, 0.0),
        Heading::East => Point2d::new(0.0, c),
        Heading::West => Point2d::new(edge, c - 1.0),
    }
}

/// Decides at random when, where and what kind of vehicle spawns.
#[derive(Clone, Debug)]
pub struct SpawnPolicy {
    spawn_chance: f64,
    emergency_share: f64,
    code3_share: f64,
    base_speed: f64,
    civilian_factor: Uniform<f64>,
    code3_factor: f64,
}

impl SpawnPolicy {
    /// Creates the policy from a validated config.
    pub fn new(config: &SimulationConfig) -> Self {
        let factor = config.civilian_speed_factor;
        Self {
            spawn_chance: config.spawn_chance,
            emergency_share: config.emergency_share,
            code3_share: config.code3_share,
            base_speed: config.base_speed,
            civilian_factor: Uniform::new_inclusive(factor.min, factor.max),
            code3_factor: config.code3_speed_factor,
        }
    }

    /// Rolls for a spawn this frame, returning the heading and kind of the new vehicle.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<(Heading, VehicleKind)> {
        if !rng.gen_bool(self.spawn_chance) {
            return None;
        }
        let heading = Heading::ALL[rng.gen_range(0..Heading::ALL.len())];
        let kind = if rng.gen_bool(self.emergency_share) {
            VehicleKind::Emergency {
                code3: rng.gen_bool(self.code3_share),
            }
        } else {
            VehicleKind::Civilian
        };
        Some((heading, kind))
    }

    /// Picks the speed of a new vehicle in tiles per frame.
    pub fn speed<R: Rng>(&self, kind: VehicleKind, rng: &mut R) -> f64 {
        match kind {
            VehicleKind::Civilian => self.base_speed * self.civilian_factor.sample(rng),
            VehicleKind::Emergency { code3: true } => self.base_speed * self.code3_factor,
            VehicleKind::Emergency { code3: false } => self.base_speed,
        }
    }

    /// Picks the colour of a new vehicle.
    pub fn color<R: Rng>(&self, kind: VehicleKind, rng: &mut R) -> [u8; 3] {
        match kind {
            VehicleKind::Civilian => rng.gen(),
            VehicleKind::Emergency { .. } => EMERGENCY_COLOR,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grid::{Grid, TileKind};
    use crate::math::tile_of;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spawn_points_are_on_the_right_lane() {
        let grid = Grid::new(24);
        assert_eq!(spawn_point(Heading::North, 24), Point2d::new(12.0, 23.0));
        assert_eq!(spawn_point(Heading::South, 24), Point2d::new(11.0, 0.0));
        assert_eq!(spawn_point(Heading::East, 24), Point2d::new(0.0, 12.0));
        assert_eq!(spawn_point(Heading::West, 24), Point2d::new(23.0, 11.0));
        for heading in Heading::ALL {
            let tile = tile_of(spawn_point(heading, 24));
            assert_eq!(grid.kind(tile), Some(TileKind::Road));
        }
    }

    #[test]
    fn speeds_follow_the_kind() {
        let config = SimulationConfig::default();
        let policy = SpawnPolicy::new(&config);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let speed = policy.speed(VehicleKind::Civilian, &mut rng);
            assert!((0.0599..=0.1401).contains(&speed), "{}", speed);
        }
        let code3 = policy.speed(VehicleKind::Emergency { code3: true }, &mut rng);
        assert!((code3 - 0.14).abs() < 1e-9);
        let calm = policy.speed(VehicleKind::Emergency { code3: false }, &mut rng);
        assert!((calm - 0.2).abs() < 1e-9);
        assert_eq!(
            policy.color(VehicleKind::Emergency { code3: true }, &mut rng),
            EMERGENCY_COLOR
        );
    }

    #[test]
    fn never_spawns_at_zero_chance() {
        let config = SimulationConfig {
            spawn_chance: 0.0,
            ..Default::default()
        };
        let policy = SpawnPolicy::new(&config);
        let mut rng = StdRng::seed_from_u64(1);
        assert!((0..1000).all(|_| policy.sample(&mut rng).is_none()));

        let always = SpawnPolicy::new(&SimulationConfig {
            spawn_chance: 1.0,
            emergency_share: 1.0,
            ..Default::default()
        });
        let (_, kind) = always.sample(&mut rng).unwrap();
        assert_eq!(kind, VehicleKind::Emergency { code3: true });
    }
}
